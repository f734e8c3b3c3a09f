use anyhow::Context;
use clap::Parser;
use tracing::info;

use glmrun::config::Settings;
use glmrun::llm::{LanguageModel, LlamaProvider, ModelProvider};
use glmrun::report::Reporter;
use glmrun::{logging, runner};

/// Load a pretrained model and run the example prompts: plain text
/// generation, a chat-formatted turn and code completion.
///
/// Takes no options: the model and its load configuration come from
/// `config/default.toml`, `config/local.toml` and `GLMRUN_*` variables.
#[derive(Parser)]
#[command(version, about)]
struct Cli {}

fn main() -> anyhow::Result<()> {
    Cli::parse();

    let mut reporter = Reporter::stdout();
    reporter.banner("GLM com llama.cpp - Setup Completo")?;

    reporter.step(1, 3, "Inicializando bibliotecas e configuração...")?;
    let settings = Settings::new().context("failed to load configuration")?;
    let _guard = logging::init(&settings.logging)
        .map_err(anyhow::Error::from_boxed)
        .context("failed to initialize logging")?;
    info!("glm-examples starting");

    let load_config = settings.load_config();
    reporter.step(2, 3, &format!("Carregando modelo {}...", settings.model.name))?;
    let provider = LlamaProvider::new(&settings);
    let (mut model, tokenizer) = provider
        .from_pretrained(&settings.model.name, &load_config)
        .with_context(|| format!("failed to load {}", settings.model.name))?;

    reporter.success("Modelo carregado com sucesso!")?;
    reporter.model_summary(model.info())?;

    reporter.step(3, 3, "Configurando modo de inferência...")?;
    model.for_inference().context("failed to switch the model into inference mode")?;
    reporter.info("")?;

    runner::run_jobs(&tokenizer, &mut model, &runner::example_jobs(), &mut reporter)
        .context("generation failed")?;

    reporter.banner("✅ Exemplos completados com sucesso!")?;
    info!("glm-examples finished");
    Ok(())
}
