//! Deterministic in-memory model used to exercise the pipeline without weights.
#![allow(dead_code)]

use std::path::PathBuf;

use chrono::Utc;
use glmrun::llm::{
    new_token_budget, GenerationParams, LanguageModel, LoadConfig, ModelInfo, ModelProvider,
    TokenId, Tokenizer,
};
use glmrun::{Error, Result};

pub const MARKER: TokenId = 0;
pub const BOS: TokenId = 1;
pub const EOS: TokenId = 2;
const BYTE_OFFSET: TokenId = 3;

/// One token per byte, plus three special tokens.
#[derive(Debug, Clone)]
pub struct ByteTokenizer;

impl Tokenizer for ByteTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<TokenId>> {
        let mut tokens = vec![BOS];
        tokens.extend(text.bytes().map(|b| b as TokenId + BYTE_OFFSET));
        Ok(tokens)
    }

    fn decode(&self, tokens: &[TokenId], skip_special_tokens: bool) -> Result<String> {
        let mut bytes = Vec::new();
        for &id in tokens {
            match id {
                MARKER | BOS | EOS if skip_special_tokens => {}
                MARKER => bytes.extend_from_slice(b"<|endoftext|>"),
                BOS => bytes.extend_from_slice(b"<s>"),
                EOS => bytes.extend_from_slice(b"</s>"),
                id => bytes.push((id - BYTE_OFFSET) as u8),
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Emits pseudo-random lowercase words derived from the prompt and seed,
/// bracketed by the special tokens a real vocabulary would produce.
#[derive(Debug)]
pub struct EchoModel {
    info: ModelInfo,
    seed: u64,
    inference: bool,
    pub mode_switches: usize,
    pub generate_calls: usize,
}

impl EchoModel {
    pub fn new(name: &str, config: LoadConfig, seed: u64) -> Self {
        Self {
            info: ModelInfo {
                model_name: name.to_string(),
                display_name: Some("Echo".to_string()),
                architecture: Some("echo".to_string()),
                file_type: Some(if config.load_in_4bit { "Q4_K_M" } else { "F16" }.to_string()),
                path: PathBuf::from("memory"),
                trained_context_length: Some(4096),
                load_config: config,
                loaded_at: Utc::now(),
            },
            seed,
            inference: false,
            mode_switches: 0,
            generate_calls: 0,
        }
    }
}

impl LanguageModel for EchoModel {
    fn for_inference(&mut self) -> Result<()> {
        if !self.inference {
            self.inference = true;
            self.mode_switches += 1;
        }
        Ok(())
    }

    fn is_inference_mode(&self) -> bool {
        self.inference
    }

    fn generate(&mut self, input: &[TokenId], params: &GenerationParams) -> Result<Vec<TokenId>> {
        if !self.inference {
            return Err(Error::NotInInferenceMode);
        }
        let budget = new_token_budget(input.len(), params.max_new_tokens, self.info.load_config.max_seq_length)?;
        self.generate_calls += 1;

        // State depends only on this call's inputs.
        let mut state = input.iter().fold(self.seed ^ 0x9E37_79B9_7F4A_7C15, |acc, &t| {
            acc.rotate_left(5) ^ t as u64
        });
        if let Some(t) = params.temperature {
            state ^= t.to_bits() as u64;
        }

        let mut output = input.to_vec();
        if budget < 2 {
            return Ok(output);
        }
        output.push(MARKER);
        for i in 0..budget - 2 {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let byte = if i % 6 == 0 { b' ' } else { b'a' + (state % 26) as u8 };
            output.push(byte as TokenId + BYTE_OFFSET);
        }
        output.push(EOS);
        Ok(output)
    }

    fn info(&self) -> &ModelInfo {
        &self.info
    }
}

/// Knows a fixed set of model names; anything else fails to resolve.
pub struct EchoProvider {
    pub known: Vec<String>,
    pub seed: u64,
}

impl EchoProvider {
    pub fn new(known: &[&str]) -> Self {
        Self {
            known: known.iter().map(|s| s.to_string()).collect(),
            seed: 42,
        }
    }
}

impl ModelProvider for EchoProvider {
    type Model = EchoModel;
    type Tokenizer = ByteTokenizer;

    fn from_pretrained(&self, model_name: &str, config: &LoadConfig) -> Result<(EchoModel, ByteTokenizer)> {
        if !self.known.iter().any(|k| k == model_name) {
            return Err(Error::Resolve {
                model: model_name.to_string(),
                reason: "unknown model".to_string(),
            });
        }
        Ok((EchoModel::new(model_name, *config, self.seed), ByteTokenizer))
    }
}
