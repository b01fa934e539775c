//! chatweave - Entry Point

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// chatweave - replay a streamed chat transcript in an interactive TUI
#[derive(Parser, Debug)]
#[command(name = "chatweave")]
#[command(version)]
#[command(about = "Replay streamed chat transcripts (JSONL) in an interactive terminal view")]
pub struct Args {
    /// Path to JSONL transcript (reads from stdin if not provided)
    pub file: Option<PathBuf>,

    /// Hide model reasoning (<think> blocks)
    #[arg(long)]
    pub hide_thinking: bool,

    /// Pause between replayed events, in milliseconds
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = chatweave::config::load_config_with_precedence(args.config.clone())?;
        let merged = chatweave::config::merge_config(config_file);
        let with_env = chatweave::config::apply_env_overrides(merged);

        // Flags only override when explicitly set
        let thinking_override = if args.hide_thinking { Some(false) } else { None };
        chatweave::config::apply_cli_overrides(with_env, thinking_override, args.delay_ms)
    };

    chatweave::logging::init(&config.log_file_path)?;

    info!(
        config = ?config,
        "Configuration loaded and resolved"
    );

    let input_source = chatweave::source::detect_input_source(args.file.clone())?;

    chatweave::view::run_with_source(input_source, &config)?;

    Ok(())
}
