//! Console output for the demo binaries. Purely cosmetic.

use std::io::{self, Stdout, Write};

use colored::*;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};

use crate::llm::ModelInfo;
use crate::runner::PromptJob;

/// Width of the `=` rules framing each section
pub const BANNER_WIDTH: usize = 60;

/// Writes banners, progress steps and results to a console.
pub struct Reporter<W: Write> {
    out: W,
}

impl Reporter<Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn rule(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", "=".repeat(BANNER_WIDTH).bright_black())
    }

    /// A title framed by rules above and below
    pub fn banner(&mut self, title: &str) -> io::Result<()> {
        self.rule()?;
        writeln!(self.out, "{}", title.bold())?;
        self.rule()
    }

    /// `[step/total] message`
    pub fn step(&mut self, step: usize, total: usize, message: &str) -> io::Result<()> {
        writeln!(self.out, "\n{} {}", format!("[{}/{}]", step, total).cyan(), message)
    }

    pub fn info(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{}", message)
    }

    pub fn success(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{} {}", "✅".green(), message.green())
    }

    /// Table describing the loaded model and how it was loaded.
    pub fn model_summary(&mut self, info: &ModelInfo) -> io::Result<()> {
        writeln!(self.out, "{}", model_table(info))
    }

    /// Prompt (optionally) and response of one generation.
    pub fn prompt_result(&mut self, job: &PromptJob, response: &str) -> io::Result<()> {
        writeln!(self.out)?;
        if job.show_prompt {
            writeln!(self.out, "📝 {} {}", "Prompt:".cyan().bold(), job.prompt)?;
        }
        writeln!(
            self.out,
            "{} {}\n{}\n",
            job.response_icon,
            format!("{}:", job.response_label).cyan().bold(),
            response
        )?;
        self.out.flush()
    }
}

fn model_table(info: &ModelInfo) -> Table {
    let unknown = || "unknown".to_string();
    let rows = vec![
        ("Model", info.model_name.clone()),
        ("Name", info.display_name.clone().unwrap_or_else(unknown)),
        ("Architecture", info.architecture.clone().unwrap_or_else(unknown)),
        ("Quantization", info.file_type.clone().unwrap_or_else(unknown)),
        ("4-bit requested", info.load_config.load_in_4bit.to_string()),
        ("Precision", info.load_config.precision.to_string()),
        ("Max sequence length", info.load_config.max_seq_length.to_string()),
        (
            "Trained context",
            info.trained_context_length.map(|n| n.to_string()).unwrap_or_else(unknown),
        ),
        ("File", info.path.display().to_string()),
        ("Loaded at", info.loaded_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
    ];

    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Property").fg(comfy_table::Color::Cyan).add_attribute(Attribute::Bold),
            Cell::new("Value").fg(comfy_table::Color::Cyan).add_attribute(Attribute::Bold),
        ]);
    for (key, value) in rows {
        table.add_row(vec![
            Cell::new(key).fg(comfy_table::Color::Yellow),
            Cell::new(value),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{GenerationParams, LoadConfig, Precision};
    use chrono::Utc;
    use std::path::PathBuf;

    fn output(reporter: Reporter<Vec<u8>>) -> String {
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn banner_is_framed_by_rules() {
        colored::control::set_override(false);
        let mut reporter = Reporter::new(Vec::new());
        reporter.banner("EXEMPLO 1").unwrap();

        let text = output(reporter);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "=".repeat(BANNER_WIDTH));
        assert_eq!(lines[1], "EXEMPLO 1");
        assert_eq!(lines[2], lines[0]);
    }

    #[test]
    fn prompt_is_echoed_only_when_requested() {
        colored::control::set_override(false);
        let mut job = PromptJob {
            title: None,
            prompt: "Hello! How are you?",
            params: GenerationParams::new(10),
            show_prompt: true,
            response_icon: "💬",
            response_label: "Response",
        };

        let mut reporter = Reporter::new(Vec::new());
        reporter.prompt_result(&job, "Hello! How are you? Fine.").unwrap();
        let text = output(reporter);
        assert!(text.contains("Prompt: Hello! How are you?"));
        assert!(text.contains("Response:\nHello! How are you? Fine."));

        job.show_prompt = false;
        let mut reporter = Reporter::new(Vec::new());
        reporter.prompt_result(&job, "ok").unwrap();
        assert!(!output(reporter).contains("Prompt:"));
    }

    #[test]
    fn summary_lists_load_configuration() {
        let info = ModelInfo {
            model_name: "unsloth/glm-4-9b-gguf".into(),
            display_name: Some("GLM 4 9B".into()),
            architecture: Some("chatglm".into()),
            file_type: Some("Q4_K_M".into()),
            path: PathBuf::from("models/glm-4-9b-Q4_K_M.gguf"),
            trained_context_length: None,
            load_config: LoadConfig { max_seq_length: 2048, precision: Precision::Half, load_in_4bit: true },
            loaded_at: Utc::now(),
        };

        let table = model_table(&info).to_string();
        for expected in ["unsloth/glm-4-9b-gguf", "chatglm", "Q4_K_M", "float16", "2048", "unknown"] {
            assert!(table.contains(expected), "missing {expected}");
        }
    }
}
