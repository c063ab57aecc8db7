//! clusterd - cluster resource coordinator
//!
//! CLI entry point for running the coordinator in the foreground.

use clap::Parser;
use eyre::{Context, Result};
use tracing::warn;

use clusterd::cli::{Cli, Command};
use clusterd::config::Config;
use clusterd::coordinator::{Coordinator, ShutdownToken};

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    match cli.command {
        Some(Command::Run { listen }) => cmd_run(config, listen).await,
        Some(Command::ShowConfig) => cmd_show_config(&config),
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

/// Run the coordinator in the foreground until a signal arrives
async fn cmd_run(mut config: Config, listen: Option<String>) -> Result<()> {
    if let Some(uri) = listen {
        config.coordinator.listen_uri = uri;
    }
    config.validate()?;

    let coordinator = Coordinator::new(config.coordinator.clone())?;
    let token = coordinator.shutdown_token();

    // Termination signals trip the token; the loop exits at its next
    // loop-top check.
    tokio::spawn(async move {
        wait_for_termination(&token).await;
    });

    let report = coordinator.run().await?;
    println!("coordinator stopped: {}", report.reason);
    Ok(())
}

/// Print the effective configuration as YAML
fn cmd_show_config(config: &Config) -> Result<()> {
    print!("{}", serde_yaml::to_string(config).context("Failed to render configuration")?);
    Ok(())
}

#[cfg(unix)]
async fn wait_for_termination(token: &ShutdownToken) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "failed to install SIGINT handler");
            return;
        }
    };
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "failed to install SIGTERM handler");
            return;
        }
    };

    tokio::select! {
        _ = sigint.recv() => {
            warn!("SIGINT received");
            token.trigger("SIGINT received");
        }
        _ = sigterm.recv() => {
            warn!("SIGTERM received");
            token.trigger("SIGTERM received");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_termination(token: &ShutdownToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("interrupt received");
        token.trigger("interrupt received");
    }
}
