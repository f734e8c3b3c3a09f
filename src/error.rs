use thiserror::Error;

use crate::gguf::GGUFError;

/// Errors raised while loading a model or generating text.
///
/// None of these are recovered from; the binaries propagate them to the
/// process boundary.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("cannot resolve model '{model}': {reason}")]
    Resolve { model: String, reason: String },

    #[error("hub request failed: {0}")]
    Hub(#[from] hf_hub::api::sync::ApiError),

    #[error(transparent)]
    Gguf(#[from] GGUFError),

    #[error("failed to load model from {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("failed to create inference session: {0}")]
    Session(String),

    #[error("failed to tokenize prompt: {0}")]
    Tokenize(String),

    #[error("model is not in inference mode; call for_inference() first")]
    NotInInferenceMode,

    #[error("prompt is {prompt_tokens} tokens but the context window is {max_seq_length}")]
    ContextOverflow { prompt_tokens: usize, max_seq_length: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
