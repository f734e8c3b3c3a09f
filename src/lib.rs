//! Load a pretrained GGUF language model, switch it into inference mode and
//! run a fixed set of prompts against it.
//!
//! The pipeline is linear: [`llm::ModelProvider::from_pretrained`] →
//! [`llm::LanguageModel::for_inference`] → [`runner::generate_text`] per
//! prompt → [`report::Reporter`].

pub mod config;
pub mod error;
pub mod gguf;
pub mod hub;
pub mod llm;
pub mod logging;
pub mod report;
pub mod runner;

pub use error::{Error, Result};
