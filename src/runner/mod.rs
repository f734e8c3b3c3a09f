//! Prompt runner: encode, generate, decode.
//!
//! Also holds the fixed prompt sets of the two demo binaries.

use std::io::Write;

use tracing::info;

use crate::error::Result;
use crate::llm::{GenerationParams, LanguageModel, Tokenizer};
use crate::report::Reporter;

/// Prompt used by `glm-setup` to smoke-test a freshly loaded model.
pub const SETUP_PROMPT: &str = "Hello! How are you?";

const CAPITAL_PROMPT: &str = "Olá! Qual é a capital do Brasil?";

const CHAT_PROMPT: &str = "Você é um assistente helpful. Responda em português.

Usuário: Como posso começar com Python?
Assistente: ";

const CODE_PROMPT: &str = "Escreva uma função em Python que calcula o fatorial de um número:

def fatorial(n):";

/// One hard-coded generation request and how to present its result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PromptJob {
    /// Section banner; `None` prints the result without one
    pub title: Option<&'static str>,
    pub prompt: &'static str,
    pub params: GenerationParams,
    /// Echo the prompt before the response
    pub show_prompt: bool,
    /// Icon and heading printed above the response
    pub response_icon: &'static str,
    pub response_label: &'static str,
}

/// The single request made by `glm-setup`.
pub fn setup_jobs() -> Vec<PromptJob> {
    vec![PromptJob {
        title: None,
        prompt: SETUP_PROMPT,
        params: GenerationParams::new(100),
        show_prompt: true,
        response_icon: "💬",
        response_label: "Response",
    }]
}

/// The three examples run by `glm-examples`, labelled in Portuguese like
/// their prompts.
pub fn example_jobs() -> Vec<PromptJob> {
    vec![
        PromptJob {
            title: Some("EXEMPLO 1: Geração de Texto Simples"),
            prompt: CAPITAL_PROMPT,
            params: GenerationParams::new(100).with_temperature(0.7),
            show_prompt: true,
            response_icon: "💬",
            response_label: "Resposta",
        },
        PromptJob {
            title: Some("EXEMPLO 2: Conversa Multi-turno"),
            prompt: CHAT_PROMPT,
            params: GenerationParams::new(200).with_temperature(0.7),
            show_prompt: false,
            response_icon: "💬",
            response_label: "Resposta",
        },
        PromptJob {
            title: Some("EXEMPLO 3: Geração de Código"),
            prompt: CODE_PROMPT,
            params: GenerationParams::new(100).with_temperature(0.3),
            show_prompt: false,
            response_icon: "💻",
            response_label: "Código Gerado",
        },
    ]
}

/// Encodes `prompt`, extends it with the model and decodes the whole
/// sequence with special tokens skipped. The result starts with the prompt.
pub fn generate_text<T, M>(tokenizer: &T, model: &mut M, prompt: &str, params: &GenerationParams) -> Result<String>
where
    T: Tokenizer,
    M: LanguageModel,
{
    let input = tokenizer.encode(prompt)?;
    let output = model.generate(&input, params)?;
    tokenizer.decode(&output, true)
}

/// Runs each job in order against one loaded model, reporting as it goes.
/// Returns the generated texts in job order.
pub fn run_jobs<T, M, W>(
    tokenizer: &T,
    model: &mut M,
    jobs: &[PromptJob],
    reporter: &mut Reporter<W>,
) -> Result<Vec<String>>
where
    T: Tokenizer,
    M: LanguageModel,
    W: Write,
{
    let mut responses = Vec::with_capacity(jobs.len());
    for (i, job) in jobs.iter().enumerate() {
        if let Some(title) = job.title {
            reporter.banner(title)?;
        }

        info!(job = i + 1, max_new_tokens = job.params.max_new_tokens, temperature = ?job.params.temperature, "Running prompt");
        let response = generate_text(tokenizer, model, job.prompt, &job.params)?;
        reporter.prompt_result(job, &response)?;
        responses.push(response);
    }
    Ok(responses)
}
