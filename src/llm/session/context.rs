use std::fmt;
use std::sync::Arc;

use llama_cpp::standard_sampler::{SamplerStage, StandardSampler};
use llama_cpp::{LlamaModel, SessionParams, Token};
use tracing::{debug, info};

use crate::config::RuntimeConfig;
use crate::error::{Error, Result};
use crate::llm::{new_token_budget, GenerationParams, LanguageModel, ModelInfo, TokenId};

/// Session parameters fixed by the switch into inference mode.
#[derive(Debug, Clone, Copy)]
struct InferenceSettings {
    n_ctx: u32,
    n_batch: u32,
    n_threads: Option<u32>,
    seed: u32,
}

impl InferenceSettings {
    fn session_params(&self) -> SessionParams {
        let mut params = SessionParams {
            seed: self.seed,
            n_ctx: self.n_ctx,
            n_batch: self.n_batch,
            ..Default::default()
        };
        if let Some(n_threads) = self.n_threads {
            params.n_threads = n_threads;
        }
        params
    }
}

/// A llama.cpp model handle.
///
/// Every [`generate`](LanguageModel::generate) call runs in a fresh session,
/// so the KV cache and sampler state of one prompt never reach the next.
pub struct LlamaLanguageModel {
    llama_model: Arc<LlamaModel>,
    info: ModelInfo,
    runtime: RuntimeConfig,
    inference: Option<InferenceSettings>,
}

impl fmt::Debug for LlamaLanguageModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlamaLanguageModel")
            .field("model_name", &self.info.model_name)
            .field("path", &self.info.path)
            .field("architecture", &self.info.architecture)
            .field("file_type", &self.info.file_type)
            .field("max_seq_length", &self.info.load_config.max_seq_length)
            .field("inference_mode", &self.inference.is_some())
            .finish()
    }
}

impl LlamaLanguageModel {
    pub fn new(llama_model: Arc<LlamaModel>, info: ModelInfo, runtime: RuntimeConfig) -> Self {
        Self {
            llama_model,
            info,
            runtime,
            inference: None,
        }
    }
}

/// Sampler for a generation call: backend defaults, greedy, or temperature sampling.
fn build_sampler(params: &GenerationParams) -> StandardSampler {
    match params.temperature {
        None => StandardSampler::default(),
        Some(t) if t <= 0.0 => StandardSampler::new_greedy(),
        Some(t) => StandardSampler::new_softmax(
            vec![
                SamplerStage::TopK(40),
                SamplerStage::TopP(0.95),
                SamplerStage::Temperature(t),
            ],
            1,
        ),
    }
}

/// Appends sampled tokens to `input`, stopping at EOS (not kept) or after
/// `budget` new tokens, whichever comes first.
fn collect_completion<I>(input: &[TokenId], sampled: I, eos: TokenId, budget: usize) -> Vec<TokenId>
where
    I: IntoIterator<Item = TokenId>,
{
    let mut output = input.to_vec();
    output.extend(sampled.into_iter().take_while(|&t| t != eos).take(budget));
    output
}

impl LanguageModel for LlamaLanguageModel {
    fn for_inference(&mut self) -> Result<()> {
        if self.inference.is_some() {
            debug!("Model already in inference mode");
            return Ok(());
        }

        let settings = InferenceSettings {
            n_ctx: u32::try_from(self.info.load_config.max_seq_length).map_err(|_| {
                Error::Session(format!(
                    "max_seq_length {} does not fit a llama.cpp context",
                    self.info.load_config.max_seq_length
                ))
            })?,
            n_batch: self.runtime.n_batch,
            n_threads: self.runtime.n_threads,
            seed: self.runtime.seed.unwrap_or_else(rand::random),
        };

        // Allocate once up front so an undersized device fails here rather
        // than halfway through the first prompt.
        self.llama_model
            .create_session(settings.session_params())
            .map_err(|e| Error::Session(e.to_string()))?;

        info!(
            n_ctx = settings.n_ctx,
            n_batch = settings.n_batch,
            seed = settings.seed,
            "Model switched to inference mode"
        );
        self.inference = Some(settings);
        Ok(())
    }

    fn is_inference_mode(&self) -> bool {
        self.inference.is_some()
    }

    fn generate(&mut self, input: &[TokenId], params: &GenerationParams) -> Result<Vec<TokenId>> {
        let settings = self.inference.ok_or(Error::NotInInferenceMode)?;
        let budget = new_token_budget(input.len(), params.max_new_tokens, self.info.load_config.max_seq_length)?;

        let mut session = self.llama_model
            .create_session(settings.session_params())
            .map_err(|e| Error::Session(e.to_string()))?;

        let prompt: Vec<Token> = input.iter().map(|&id| Token(id as i32)).collect();
        session.advance_context_with_tokens(&prompt)
            .map_err(|e| Error::Session(e.to_string()))?;
        debug!(prompt_tokens = prompt.len(), "Context advanced with prompt");

        let completions = session
            .start_completing_with(build_sampler(params), budget)
            .map_err(|e| Error::Session(e.to_string()))?;

        let eos = self.llama_model.eos().0 as TokenId;
        let sampled = completions.into_iter().map(|t| t.0 as TokenId);
        let output = collect_completion(input, sampled, eos, budget);

        info!(
            prompt_tokens = input.len(),
            new_tokens = output.len() - input.len(),
            "Completion finished"
        );
        Ok(output)
    }

    fn info(&self) -> &ModelInfo {
        &self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EOS: TokenId = 2;

    #[test]
    fn completion_stops_at_eos() {
        let output = collect_completion(&[1, 10, 11], vec![20, 21, EOS, 22, 23], EOS, 100);
        assert_eq!(output, vec![1, 10, 11, 20, 21]);
    }

    #[test]
    fn completion_stops_at_budget() {
        let output = collect_completion(&[1, 10], 20..1000, EOS, 5);
        assert_eq!(output, vec![1, 10, 20, 21, 22, 23, 24]);
    }

    #[test]
    fn immediate_eos_returns_the_prompt() {
        assert_eq!(collect_completion(&[1, 10], vec![EOS, 30], EOS, 10), vec![1, 10]);
    }

    #[test]
    fn budget_limits_how_much_is_pulled() {
        let mut pulled = 0;
        let sampled = std::iter::repeat(7).inspect(|_| pulled += 1);
        let output = collect_completion(&[], sampled, EOS, 3);
        assert_eq!(output, vec![7, 7, 7]);
        assert_eq!(pulled, 3);
    }
}
