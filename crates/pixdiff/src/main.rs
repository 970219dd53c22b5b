mod cli;
mod commands;
mod report;

use clap::Parser;
use pixdiff::config::{CliOverrides, HistoryConfig, ResolvedConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pixdiff=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    // Dropping the in-flight run kills any spawned git processes.
    let code = tokio::select! {
        code = run(cli.command) => code?,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted");
            130
        }
    };
    std::process::exit(code);
}

async fn run(command: cli::Command) -> anyhow::Result<i32> {
    match command {
        cli::Command::Init { force } => {
            commands::init(force)?;
            Ok(0)
        }
        cli::Command::History {
            file,
            repo,
            out,
            json,
            history,
            diff,
        } => {
            let config = ResolvedConfig::new(CliOverrides { diff, history })?;
            commands::history(config, &file, repo.as_deref(), out.as_deref(), json).await
        }
        cli::Command::Files {
            current,
            previous,
            out,
            json,
            diff,
        } => {
            let config = ResolvedConfig::new(CliOverrides {
                diff,
                history: HistoryConfig::default(),
            })?;
            commands::files(config, &current, &previous, out.as_deref(), json).await
        }
        cli::Command::Batch {
            patterns,
            repo,
            out,
            history,
            diff,
        } => {
            let config = ResolvedConfig::new(CliOverrides { diff, history })?;
            commands::batch(config, &patterns, repo.as_deref(), out.as_deref()).await
        }
    }
}
