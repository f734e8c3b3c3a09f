//! Resolves a model identifier to a GGUF file on disk.
//!
//! Identifiers are either a path to a local `.gguf` file or a Hugging Face Hub
//! repository id. For repositories, the file listing is fetched and the
//! variant matching the requested precision/quantization is downloaded into
//! the cache (or reused from it).

use std::path::{Path, PathBuf};

use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Repo, RepoType};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::config::HubConfig;
use crate::error::{Error, Result};
use crate::gguf::is_gguf_file;
use crate::llm::{LoadConfig, Precision};

/// Matches the part number of split GGUF files, e.g. `-00002-of-00003.gguf`.
static SHARD_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)-(\d{5})-of-\d{5}\.gguf$").expect("valid shard regex"));

const FOUR_BIT: &[&str] = &["Q4_K_M", "Q4_K_S", "Q4_0", "Q4_1", "IQ4_XS", "IQ4_NL"];
const HALF: &[&str] = &["F16", "BF16"];
const FULL: &[&str] = &["F32"];

/// Quantization tags acceptable for a load configuration, most preferred first.
pub fn quantization_preferences(config: &LoadConfig) -> &'static [&'static str] {
    if config.load_in_4bit {
        FOUR_BIT
    } else {
        match config.precision {
            Precision::Half => HALF,
            Precision::Full => FULL,
        }
    }
}

/// True for the second and later parts of a split GGUF file.
fn is_secondary_shard(filename: &str) -> bool {
    SHARD_SUFFIX
        .captures(filename)
        .map(|caps| &caps[1] != "00001")
        .unwrap_or(false)
}

/// Whether `filename` carries `tag` as a whole token (`-Q4_K_M.gguf`, `.F16.`).
fn has_quant_tag(filename: &str, tag: &str) -> bool {
    let upper = filename.to_uppercase();
    upper
        .split(|c: char| c == '-' || c == '.' || c == '/')
        .any(|token| token == tag)
}

/// Picks the GGUF file matching `config` from a repository listing.
pub fn select_gguf_file<'a>(files: &'a [String], config: &LoadConfig) -> Option<&'a str> {
    let candidates: Vec<&str> = files
        .iter()
        .map(String::as_str)
        .filter(|f| f.to_lowercase().ends_with(".gguf") && !is_secondary_shard(f))
        .collect();

    quantization_preferences(config).iter().find_map(|tag| {
        candidates.iter().copied().find(|f| has_quant_tag(f, tag))
    })
}

/// Fetches model files from the Hub into a local cache.
#[derive(Debug, Clone)]
pub struct HubResolver {
    cache_dir: PathBuf,
    revision: String,
    token: Option<String>,
    progress: bool,
}

impl HubResolver {
    pub fn new(settings: &HubConfig) -> Self {
        Self {
            cache_dir: settings.cache_dir.clone(),
            revision: settings.revision.clone(),
            token: settings.token.clone().or_else(|| std::env::var("HF_TOKEN").ok()),
            progress: settings.progress,
        }
    }

    /// Returns the local path of the GGUF file for `model_name`.
    pub fn resolve(&self, model_name: &str, config: &LoadConfig) -> Result<PathBuf> {
        let local = Path::new(model_name);
        if local.is_file() {
            if !is_gguf_file(local) {
                return Err(Error::Resolve {
                    model: model_name.to_string(),
                    reason: "local file is not in GGUF format".to_string(),
                });
            }
            debug!(path = %local.display(), "Using local model file");
            return Ok(local.to_path_buf());
        }

        if !is_repo_id(model_name) {
            return Err(Error::Resolve {
                model: model_name.to_string(),
                reason: "not a local file and not an `owner/name` repository id".to_string(),
            });
        }

        let mut builder = ApiBuilder::new()
            .with_cache_dir(self.cache_dir.clone())
            .with_progress(self.progress);
        if let Some(token) = &self.token {
            builder = builder.with_token(Some(token.clone()));
        }
        let api = builder.build()?;
        let repo = api.repo(Repo::with_revision(
            model_name.to_string(),
            RepoType::Model,
            self.revision.clone(),
        ));

        info!(model = model_name, revision = %self.revision, "Fetching repository listing");
        let listing: Vec<String> = repo.info()?
            .siblings
            .into_iter()
            .map(|s| s.rfilename)
            .collect();

        let filename = select_gguf_file(&listing, config)
            .ok_or_else(|| no_matching_file(model_name, &listing, config))?;

        info!(model = model_name, file = filename, "Selected model file");
        let path = repo.get(filename)?;
        info!(path = %path.display(), "Model file available");
        Ok(path)
    }
}

fn no_matching_file(model_name: &str, listing: &[String], config: &LoadConfig) -> Error {
    let ggufs: Vec<&str> = listing
        .iter()
        .map(String::as_str)
        .filter(|f| f.to_lowercase().ends_with(".gguf"))
        .collect();
    Error::Resolve {
        model: model_name.to_string(),
        reason: format!(
            "no GGUF file matching {:?}; available: [{}]",
            quantization_preferences(config),
            ggufs.join(", ")
        ),
    }
}

fn is_repo_id(model_name: &str) -> bool {
    let mut parts = model_name.split('/');
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty()
    )
}
