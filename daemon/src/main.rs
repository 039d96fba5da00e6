//! KYC DAO daemon: entry point for running the governance node.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use kycdao_node::{init_logging, GovernanceNode, LogFormat, NodeConfig};
use kycdao_types::{Address, SystemClock};
use kycdao_utils::{format_duration, parse_duration};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Parser)]
#[command(name = "kycdao-daemon", about = "KYC DAO governance daemon")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "KYCDAO_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "KYCDAO_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "KYCDAO_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Snapshot file: loaded on start if present, written on exit.
    #[arg(long, env = "KYCDAO_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Address holding ADMIN_ROLE when bootstrapping a fresh state.
    #[arg(long, env = "KYCDAO_GENESIS_ADMIN")]
    genesis_admin: Option<Address>,

    /// Quorum as a percentage of total supply (1-100).
    #[arg(long, env = "KYCDAO_QUORUM_PERCENTAGE")]
    quorum_percentage: Option<u32>,

    /// Voting period, e.g. "604800", "90m", "7d".
    #[arg(long, env = "KYCDAO_VOTING_PERIOD", value_parser = parse_period)]
    voting_period: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Apply newline-delimited JSON requests from FILE ("-" for stdin),
    /// printing one JSON response per line.
    Replay {
        #[arg(default_value = "-")]
        input: String,
    },
    /// Print the effective configuration as TOML.
    Config,
}

fn parse_period(s: &str) -> Result<u64, String> {
    parse_duration(s).ok_or_else(|| format!("invalid duration {s:?}"))
}

/// File settings as the base, CLI flags and env vars on top.
fn effective_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => NodeConfig::default(),
    };
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(path) = &cli.snapshot {
        config.snapshot_path = Some(path.clone());
    }
    if let Some(admin) = &cli.genesis_admin {
        config.genesis_admin = admin.clone();
    }
    if let Some(pct) = cli.quorum_percentage {
        config.params.quorum_percentage = pct;
    }
    if let Some(secs) = cli.voting_period {
        config.params.voting_period_secs = secs;
    }
    config.validate()?;
    Ok(config)
}

async fn replay(node: &GovernanceNode, input: &str) -> anyhow::Result<(usize, usize)> {
    let reader: Box<dyn tokio::io::AsyncRead + Unpin> = if input == "-" {
        Box::new(tokio::io::stdin())
    } else {
        Box::new(
            tokio::fs::File::open(input)
                .await
                .with_context(|| format!("opening {input}"))?,
        )
    };
    let mut lines = BufReader::new(reader).lines();
    let mut stdout = tokio::io::stdout();
    let (mut applied, mut failed) = (0usize, 0usize);

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let response = node.handle_json(line).await;
        if response.is_ok() {
            applied += 1;
        } else {
            failed += 1;
        }
        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        stdout.write_all(&out).await?;
    }
    stdout.flush().await?;
    Ok((applied, failed))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = effective_config(&cli)?;

    match &cli.command {
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            return Ok(());
        }
        Command::Replay { input } => {
            init_logging(config.log_format, &config.log_level)?;
            tracing::info!(
                quorum = config.params.quorum_percentage,
                voting_period = %format_duration(config.params.voting_period_secs),
                vote_weight = ?config.params.vote_weight,
                "starting governance node"
            );

            let node = GovernanceNode::new(config, Arc::new(SystemClock)).await?;
            node.subscribe(Box::new(|event| {
                tracing::info!(event = event.name(), "governance event");
            }))
            .await;

            let (applied, failed) = replay(&node, input).await?;
            tracing::info!(applied, failed, "replay finished");

            if let Some(path) = node.save_snapshot().await? {
                tracing::info!("Snapshot written to {}", path.display());
            }
        }
    }
    Ok(())
}
