use anyhow::Context;
use clap::Parser;
use tracing::info;

use glmrun::config::Settings;
use glmrun::llm::{LanguageModel, LlamaProvider, ModelProvider};
use glmrun::report::Reporter;
use glmrun::{logging, runner};

/// Download a pretrained model, load it and check that it answers.
///
/// Takes no options: the model and its load configuration come from
/// `config/default.toml`, `config/local.toml` and `GLMRUN_*` variables.
#[derive(Parser)]
#[command(version, about)]
struct Cli {}

fn main() -> anyhow::Result<()> {
    Cli::parse();

    let settings = Settings::new().context("failed to load configuration")?;
    let _guard = logging::init(&settings.logging)
        .map_err(anyhow::Error::from_boxed)
        .context("failed to initialize logging")?;
    info!("glm-setup starting");

    let mut reporter = Reporter::stdout();
    let load_config = settings.load_config();
    reporter.info(&format!(
        "Downloading {} ({}{})...",
        settings.model.name,
        load_config.precision,
        if load_config.load_in_4bit { ", 4-bit quantized" } else { "" }
    ))?;

    let provider = LlamaProvider::new(&settings);
    let (mut model, tokenizer) = provider
        .from_pretrained(&settings.model.name, &load_config)
        .with_context(|| format!("failed to load {}", settings.model.name))?;

    reporter.success("Model loaded successfully!")?;
    reporter.info(&format!("Model: {:?}", model))?;
    reporter.info(&format!("Tokenizer: {:?}", tokenizer))?;

    model.for_inference().context("failed to switch the model into inference mode")?;

    runner::run_jobs(&tokenizer, &mut model, &runner::setup_jobs(), &mut reporter)
        .context("generation failed")?;

    info!("glm-setup finished");
    Ok(())
}
