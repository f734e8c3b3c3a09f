//! # Model handles
//!
//! The traits here are the seam between the demo pipeline and whatever
//! actually runs the network. A [`ModelProvider`] hands out a paired
//! [`LanguageModel`] and [`Tokenizer`]; the pipeline only ever talks to those
//! two handles.
//!
//! The llama.cpp-backed implementation lives in the submodules:
//!
//! - `engine`: `LlamaProvider`, resolves and loads GGUF weights
//! - `session`: `LlamaLanguageModel`, inference mode and generation
//! - `tokenizer`: `LlamaTokenizer`, encode/decode with special-token filtering

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::error::{Error, Result};

pub mod engine;
pub mod session;
pub mod tokenizer;

pub use engine::LlamaProvider;
pub use session::LlamaLanguageModel;
pub use tokenizer::LlamaTokenizer;

/// Numeric token id
pub type TokenId = u32;

/// Numeric precision of unquantized weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// 16-bit floats
    Half,
    /// 32-bit floats
    Full,
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::Half => write!(f, "float16"),
            Precision::Full => write!(f, "float32"),
        }
    }
}

/// How a pretrained model should be loaded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadConfig {
    /// Context window: prompt plus generated tokens
    pub max_seq_length: usize,
    pub precision: Precision,
    pub load_in_4bit: bool,
}

/// Per-call generation settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    /// Upper bound on tokens appended to the prompt
    pub max_new_tokens: usize,
    /// Sampling temperature. `None` leaves the backend's default sampler in
    /// place; `Some(0.0)` decodes greedily.
    pub temperature: Option<f32>,
}

impl GenerationParams {
    pub fn new(max_new_tokens: usize) -> Self {
        Self { max_new_tokens, temperature: None }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn is_greedy(&self) -> bool {
        self.temperature == Some(0.0)
    }
}

/// Descriptive information about a loaded model
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Identifier the model was requested under
    pub model_name: String,
    /// `general.name` from the weights, when present
    pub display_name: Option<String>,
    pub architecture: Option<String>,
    /// Quantization or storage type label, e.g. `Q4_K_M`
    pub file_type: Option<String>,
    /// Where the weights were loaded from
    pub path: PathBuf,
    /// Context length the model was trained with
    pub trained_context_length: Option<u64>,
    pub load_config: LoadConfig,
    pub loaded_at: DateTime<Utc>,
}

/// Number of tokens a generation call may append.
///
/// A prompt that fills the context window on its own is rejected; otherwise
/// `max_new_tokens` is clamped to the room left after the prompt.
pub fn new_token_budget(prompt_tokens: usize, max_new_tokens: usize, max_seq_length: usize) -> Result<usize> {
    if prompt_tokens == 0 {
        return Err(Error::Tokenize("prompt encoded to zero tokens".to_string()));
    }
    if prompt_tokens >= max_seq_length {
        return Err(Error::ContextOverflow { prompt_tokens, max_seq_length });
    }

    let room = max_seq_length - prompt_tokens;
    if max_new_tokens > room {
        warn!(prompt_tokens, max_new_tokens, room, "Clamping max_new_tokens to the context window");
        Ok(room)
    } else {
        Ok(max_new_tokens)
    }
}

/// A loaded network that can extend token sequences.
pub trait LanguageModel {
    /// Switches the model into generation mode. Calling it again is a no-op.
    fn for_inference(&mut self) -> Result<()>;

    fn is_inference_mode(&self) -> bool;

    /// Extends `input` with up to `params.max_new_tokens` tokens and returns
    /// the whole sequence, prompt included.
    fn generate(&mut self, input: &[TokenId], params: &GenerationParams) -> Result<Vec<TokenId>>;

    fn info(&self) -> &ModelInfo;
}

/// Text to token ids and back, paired with one [`LanguageModel`].
pub trait Tokenizer {
    fn encode(&self, text: &str) -> Result<Vec<TokenId>>;

    fn decode(&self, tokens: &[TokenId], skip_special_tokens: bool) -> Result<String>;
}

/// Source of pretrained (model, tokenizer) pairs.
pub trait ModelProvider {
    type Model: LanguageModel;
    type Tokenizer: Tokenizer;

    /// Loads `model_name` with the given configuration. Either both handles
    /// are returned or an error is.
    fn from_pretrained(&self, model_name: &str, config: &LoadConfig) -> Result<(Self::Model, Self::Tokenizer)>;
}
