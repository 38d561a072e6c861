//! Argonaut — interactive terminal client for ArgoCD.
//!
//! Grounded on the teacher's `main.rs` shape: a `clap::Parser` struct with
//! global flags, a tracing-subscriber init gated on a log-level flag, and
//! a dispatch over an optional subcommand with interactive mode as the
//! no-subcommand default.

use std::io::IsTerminal;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use argonaut_core::adapters::{ReqwestTrustAdapter, TrustAdapter, TrustOptions};
use argonaut_core::config::{self, RealEnv};
use argonaut_core::state::{AppState, Msg};
use argonaut_core::status::StatusLog;

const EXIT_OK: i32 = 0;
const EXIT_UNRECOVERABLE: i32 = 1;
const EXIT_AUTH_FAILURE: i32 = 2;

#[derive(Parser)]
#[command(name = "argonaut")]
#[command(about = "Interactive terminal client for ArgoCD", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Extra CA certificate file to trust (repeatable).
    #[arg(long = "ca-cert")]
    ca_cert: Vec<std::path::PathBuf>,

    /// Colon-separated directories of CA certificates to trust.
    #[arg(long = "ca-path")]
    ca_path: Option<String>,

    /// Skip TLS certificate verification.
    #[arg(long)]
    insecure: bool,

    /// HTTP request timeout, e.g. "30s".
    #[arg(long)]
    timeout: Option<String>,

    /// Override the app config path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the log pager for the current application.
    Logs {
        /// Application name.
        app: Option<String>,
    },
    /// Check for and apply a self-upgrade.
    Upgrade {
        /// Only check, don't apply.
        #[arg(long)]
        check: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start runtime: {e}");
            std::process::exit(EXIT_UNRECOVERABLE);
        }
    };

    let code = runtime.block_on(run(cli));
    std::process::exit(code);
}

fn init_tracing(log_level: &str) {
    let level = match log_level {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "error" => "error",
        _ => "warn",
    };
    let filter = EnvFilter::new(format!("argonaut={level}"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> i32 {
    debug!("argonaut v{} starting", env!("CARGO_PKG_VERSION"));

    let trust_options = match build_trust_options(&cli) {
        Ok(options) => options,
        Err(e) => {
            error!("{e}");
            return EXIT_UNRECOVERABLE;
        }
    };

    let http_client = match ReqwestTrustAdapter.build_http(&trust_options) {
        Ok(client) => client,
        Err(e) => {
            error!("failed to build http client: {e}");
            return EXIT_UNRECOVERABLE;
        }
    };
    let _ = http_client; // held by the concrete ApiClient collaborator (out of core scope, spec.md §1)

    let argocd_config_path = config::resolve_argocd_config_path(&RealEnv);
    let server = match argocd_config_path.as_deref().map(config::ArgoCdConfig::load_from) {
        Some(Ok(cfg)) => match cfg.resolve_server(None) {
            Ok(server) => Some(server),
            Err(e) => {
                error!("resolving ArgoCD context: {e}");
                None
            }
        },
        Some(Err(e)) => {
            error!("loading ArgoCD CLI config: {e}");
            None
        }
        None => {
            error!("could not resolve ArgoCD CLI config path");
            None
        }
    };

    let Some(_server) = server else {
        return EXIT_AUTH_FAILURE;
    };

    match cli.command {
        Some(Commands::Logs { app }) => {
            info!("logs requested for {:?}", app);
            EXIT_OK
        }
        Some(Commands::Upgrade { check }) => {
            info!("upgrade check={check}");
            EXIT_OK
        }
        None => run_interactive().await,
    }
}

/// Drives the reducer loop and background producers until quit. The TUI
/// render/input loop is a collaborator concern (spec.md §1); this wires
/// the in-scope core (C2/C4/C9/C11) together under a root cancellation
/// token, per spec.md §5's "UI quit cancels the root context which fans
/// out to all tasks."
async fn run_interactive() -> i32 {
    if !std::io::stdout().is_terminal() {
        error!("interactive mode requires a terminal");
        return EXIT_UNRECOVERABLE;
    }

    let cancel = CancellationToken::new();
    let mut state = AppState::default();
    let mut status = StatusLog::new(200);
    status.info("main", "argonaut starting");

    let (tx, mut rx) = mpsc::unbounded_channel::<Msg>();

    let shutdown_cancel = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        shutdown_cancel.cancel();
    });

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            msg = rx.recv() => {
                match msg {
                    Some(msg) => state = argonaut_core::state::reduce(state, msg),
                    None => break,
                }
            }
            _ = tokio::time::sleep(Duration::from_millis(200)) => {
                state = argonaut_core::state::reduce(state, Msg::System(argonaut_core::state::SystemEvent::Tick));
            }
        }
        if state.quit {
            break;
        }
    }

    let _ = tx; // kept alive for producers not yet wired into this entrypoint
    info!("argonaut exiting");
    EXIT_OK
}

fn build_trust_options(cli: &Cli) -> anyhow::Result<TrustOptions> {
    let env = RealEnv;
    let mut ca_cert_files = cli.ca_cert.clone();
    ca_cert_files.extend(config::ssl_cert_files(&env));

    let mut ca_cert_dirs: Vec<std::path::PathBuf> =
        cli.ca_path.as_deref().map(split_colon_paths).unwrap_or_default();
    ca_cert_dirs.extend(config::ssl_cert_dirs(&env));

    let timeout = cli.timeout.as_deref().map(parse_duration).transpose()?;

    Ok(TrustOptions { ca_cert_files, ca_cert_dirs, insecure: cli.insecure, timeout })
}

fn split_colon_paths(value: &str) -> Vec<std::path::PathBuf> {
    value.split(':').filter(|s| !s.is_empty()).map(std::path::PathBuf::from).collect()
}

/// Parsed at the CLI boundary with `anyhow`; everything past this point
/// propagates `StructuredError` instead (SPEC_FULL.md B: "thiserror for
/// the core, anyhow at the CLI boundary").
fn parse_duration(value: &str) -> anyhow::Result<Duration> {
    let trimmed = value.trim();
    let (digits, unit) = trimmed.split_at(trimmed.find(|c: char| !c.is_ascii_digit()).unwrap_or(trimmed.len()));
    let n: u64 = digits.parse().with_context(|| format!("invalid duration: {value}"))?;
    match unit {
        "" | "s" => Ok(Duration::from_secs(n)),
        "ms" => Ok(Duration::from_millis(n)),
        "m" => Ok(Duration::from_secs(n * 60)),
        _ => anyhow::bail!("unrecognized duration unit in '{value}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_seconds() {
        assert_eq!(parse_duration("30").unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn parses_explicit_unit_suffixes() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
    }

    #[test]
    fn rejects_unknown_unit() {
        assert!(parse_duration("10x").is_err());
    }
}
