use serde::Deserialize;
use std::path::{Path, PathBuf};
use config::{Config, ConfigError, Environment, File};

use crate::error::Result;
use crate::llm::{LoadConfig, Precision};

/// Which pretrained model to load and how
#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Hub repository id (`owner/name`) or a path to a local GGUF file
    pub name: String,
    /// Maximum sequence length (prompt plus generated tokens)
    pub max_seq_length: usize,
    /// Numeric precision of the weights when not quantized
    pub precision: Precision,
    /// Whether to load 4-bit quantized weights
    pub load_in_4bit: bool,
}

/// Configuration for fetching weights from the Hugging Face Hub
#[derive(Debug, Deserialize, Clone)]
pub struct HubConfig {
    /// Directory where downloaded model files are cached
    pub cache_dir: PathBuf,
    /// Git revision of the repository to fetch
    pub revision: String,
    /// Access token for gated repositories. Falls back to `HF_TOKEN`.
    #[serde(default)]
    pub token: Option<String>,
    /// Show a progress bar while downloading
    #[serde(default = "default_progress")]
    pub progress: bool,
}

fn default_progress() -> bool {
    true
}

/// llama.cpp runtime knobs
#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    /// Number of layers to offload to the accelerator
    pub n_gpu_layers: u32,
    /// Memory-map the weights instead of reading them
    pub use_mmap: bool,
    /// Lock the weights in RAM
    pub use_mlock: bool,
    /// Prompt evaluation batch size
    pub n_batch: u32,
    /// Worker threads for generation. llama.cpp picks when unset.
    #[serde(default)]
    pub n_threads: Option<u32>,
    /// Sampling seed. A random seed is drawn when unset.
    #[serde(default)]
    pub seed: Option<u32>,
}

/// Configuration for application logging
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Directory for the rolling log files
    pub directory: Option<PathBuf>,
}

/// Main settings struct that contains all configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub model: ModelConfig,
    pub hub: HubConfig,
    pub runtime: RuntimeConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Loads settings from `./config`.
    ///
    /// Sources in order of precedence (highest to lowest):
    /// 1. Environment variables prefixed with `GLMRUN_`, `__` between nested keys
    /// 2. Local config file (`local.toml`) if present
    /// 3. Default config file (`default.toml`)
    pub fn new() -> Result<Self> {
        let config_dir = std::env::current_dir()
            .map_err(|e| ConfigError::Message(
                format!("Failed to get current directory: {}", e)
            ))?
            .join("config");

        Self::from_dir(&config_dir)
    }

    /// Loads settings from an explicit configuration directory.
    pub fn from_dir(config_dir: &Path) -> Result<Self> {
        if !config_dir.exists() {
            return Err(ConfigError::Message(
                format!("Config directory not found at: {}", config_dir.display())
            ).into());
        }

        let default_config = config_dir.join("default.toml");
        if !default_config.exists() {
            return Err(ConfigError::Message(
                format!("Default configuration file not found at: {}", default_config.display())
            ).into());
        }
        let local_config = config_dir.join("local.toml");

        let default_config_path = default_config.to_string_lossy();
        let local_config_path = local_config.to_string_lossy();

        let settings = Config::builder()
            .add_source(File::with_name(&default_config_path))
            .add_source(File::with_name(&local_config_path).required(false))
            .add_source(
                Environment::with_prefix("GLMRUN")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;

        settings.validate()?;

        Ok(settings)
    }

    /// The load configuration handed to the model provider.
    pub fn load_config(&self) -> LoadConfig {
        LoadConfig {
            max_seq_length: self.model.max_seq_length,
            precision: self.model.precision,
            load_in_4bit: self.model.load_in_4bit,
        }
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.model.name.trim().is_empty() {
            return Err(ConfigError::Message("model.name must not be empty".to_string()));
        }

        if self.model.max_seq_length == 0 {
            return Err(ConfigError::Message(
                "model.max_seq_length must be greater than 0".to_string()
            ));
        }

        // llama.cpp takes the context size as a u32
        if u32::try_from(self.model.max_seq_length).is_err() {
            return Err(ConfigError::Message(format!(
                "model.max_seq_length must be at most {}", u32::MAX
            )));
        }

        if self.runtime.n_batch == 0 {
            return Err(ConfigError::Message(
                "runtime.n_batch must be greater than 0".to_string()
            ));
        }

        match self.logging.level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => Ok(()),
            _ => Err(ConfigError::Message(
                format!("Invalid logging level: {}. Must be one of: error, warn, info, debug, trace",
                    self.logging.level)
            )),
        }?;

        create_dir(&self.hub.cache_dir, "model cache")?;
        if let Some(log_dir) = &self.logging.directory {
            create_dir(log_dir, "log")?;
        }

        Ok(())
    }
}

fn create_dir(path: &Path, what: &str) -> std::result::Result<(), ConfigError> {
    if path.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(path).map_err(|e| {
        ConfigError::Message(format!(
            "Failed to create {} directory at {}: {}",
            what, path.display(), e
        ))
    })
}
