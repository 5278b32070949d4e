// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use sqlsight_lsp::{EngineConfig, LspBackend};
use tower_lsp::{LspService, Server};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// SQLSight - SQL hover language server
#[derive(Parser, Debug)]
#[command(name = "sqlsight")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file with connections and dialect
    #[arg(long, env = "SQLSIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// Serve over stdio (the only transport; accepted for editor compatibility)
    #[arg(long)]
    stdio: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout carries the protocol; logs go to stderr
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => EngineConfig::default(),
    };

    tracing::info!(
        connections = config.connections.len(),
        stdio = args.stdio,
        "Starting SQLSight language server"
    );

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(move |client| LspBackend::with_config(client, config));
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_config_and_stdio() {
        let args = Args::try_parse_from(["sqlsight", "--stdio", "--config", "sqlsight.yml"]).unwrap();
        assert!(args.stdio);
        assert_eq!(args.config, Some(PathBuf::from("sqlsight.yml")));
    }

    #[test]
    fn test_rejects_unknown_arguments() {
        assert!(Args::try_parse_from(["sqlsight", "--tcp"]).is_err());
        assert!(Args::try_parse_from(["sqlsight", "--config"]).is_err());
    }
}
