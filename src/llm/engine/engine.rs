use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use llama_cpp::{LlamaModel, LlamaParams};
use tracing::{debug, info, warn};

use crate::config::{RuntimeConfig, Settings};
use crate::gguf::{file_type_label, is_four_bit_file_type, GGUFReader};
use crate::hub::HubResolver;
use crate::error::{Error, Result};
use crate::llm::{LlamaLanguageModel, LlamaTokenizer, LoadConfig, ModelInfo, ModelProvider};

/// Loads GGUF models through llama.cpp, fetching them from the Hub when needed.
pub struct LlamaProvider {
    resolver: HubResolver,
    runtime: RuntimeConfig,
}

impl LlamaProvider {
    pub fn new(settings: &Settings) -> Self {
        Self {
            resolver: HubResolver::new(&settings.hub),
            runtime: settings.runtime.clone(),
        }
    }

    fn load_weights(&self, path: &Path) -> Result<LlamaModel> {
        let llama_params = LlamaParams {
            n_gpu_layers: self.runtime.n_gpu_layers,
            use_mmap: self.runtime.use_mmap,
            use_mlock: self.runtime.use_mlock,
            ..Default::default()
        };
        info!(
            n_gpu_layers = self.runtime.n_gpu_layers,
            use_mmap = self.runtime.use_mmap,
            use_mlock = self.runtime.use_mlock,
            "Loading model via llama_cpp: {}",
            path.display()
        );

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb.set_message(format!("Loading weights from {}...", path.display()));

        let result = LlamaModel::load_from_file(path, llama_params);
        pb.finish_and_clear();

        result.map_err(|e| Error::Load {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Logs when the file on disk does not match what was asked for.
fn check_against_config(header: &GGUFReader, config: &LoadConfig) {
    if let Some(file_type) = header.file_type() {
        let four_bit = is_four_bit_file_type(file_type);
        if four_bit != config.load_in_4bit {
            warn!(
                file_type = file_type_label(file_type),
                load_in_4bit = config.load_in_4bit,
                "Model file quantization differs from the requested configuration"
            );
        }
    }

    if let Some(trained) = header.context_length() {
        if config.max_seq_length as u64 > trained {
            warn!(
                max_seq_length = config.max_seq_length,
                trained_context_length = trained,
                "max_seq_length exceeds the model's trained context length"
            );
        }
    }
}

impl ModelProvider for LlamaProvider {
    type Model = LlamaLanguageModel;
    type Tokenizer = LlamaTokenizer;

    fn from_pretrained(&self, model_name: &str, config: &LoadConfig) -> Result<(LlamaLanguageModel, LlamaTokenizer)> {
        let path = self.resolver.resolve(model_name, config)?;

        let header = GGUFReader::new(&path)?;
        check_against_config(&header, config);

        let llama_model = Arc::new(self.load_weights(&path)?);
        info!("Successfully loaded model via llama_cpp.");

        let info = ModelInfo {
            model_name: model_name.to_string(),
            display_name: header.name().map(str::to_string),
            architecture: header.architecture().map(str::to_string),
            file_type: header.file_type().map(|ft| file_type_label(ft).to_string()),
            path,
            trained_context_length: header.context_length(),
            load_config: *config,
            loaded_at: Utc::now(),
        };

        let add_space_prefix = header.adds_space_prefix();
        debug!(
            tokenizer_model = header.tokenizer_model().unwrap_or("unknown"),
            add_space_prefix,
            "Tokenizer vocabulary"
        );
        let tokenizer = LlamaTokenizer::new(Arc::clone(&llama_model), add_space_prefix);
        let model = LlamaLanguageModel::new(llama_model, info, self.runtime.clone());
        Ok((model, tokenizer))
    }
}
