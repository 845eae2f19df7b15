//! Command-line entry point: process one markdown template and write the
//! composed document to stdout.

use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use context_composer::frontmatter::inject_allowed_tools;
use context_composer::{load_config, TagCase};

#[derive(Debug, Parser)]
#[command(
    name = "context-composer",
    version,
    about = "Run the shell commands embedded in a markdown template and inline their output"
)]
struct Cli {
    /// Markdown file to process
    file: PathBuf,

    /// Casing convention for the generated wrapper tags
    #[arg(long, value_enum)]
    tag_case: Option<TagCase>,

    /// Indent width for generated command blocks, in spaces
    #[arg(long)]
    indent: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = load_config();
    if let Some(tag_case) = cli.tag_case {
        config.tag_case = tag_case;
    }
    if let Some(indent) = cli.indent {
        config.indent_spaces = Some(indent);
    }
    if config.indent_spaces.is_none() {
        // Indent for human eyes, stay flat when piped.
        config.indent_spaces = Some(if io::stdout().is_terminal() { 2 } else { 0 });
    }
    let composer = config.create_composer();

    let content = fs::read_to_string(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;

    // The allow-list is derived while the directives are still present;
    // replacement consumes them.
    let injected = inject_allowed_tools(&content);
    let output = composer.replace_embedded_commands(&injected)?;

    io::stdout().write_all(output.as_bytes())?;

    if io::stdout().is_terminal() {
        display_stats(&output);
    }

    Ok(())
}

fn display_stats(output: &str) {
    let banner = format!("📦 Context Composer v{}", env!("CARGO_PKG_VERSION"));
    let separator = "─".repeat(banner.chars().count());

    eprintln!();
    eprintln!();
    eprintln!("{}", banner);
    eprintln!("{}", separator);
    eprintln!("  Total Chars: {} chars", format_number(output.chars().count()));
    eprintln!("  Total Words: {} words", format_number(output.split_whitespace().count()));
}

fn format_number(value: usize) -> String {
    let digits = value.to_string();
    let mut formatted = String::new();
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(digit);
    }
    formatted
}
