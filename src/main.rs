use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use gamelog_agent::{
    AGENT_ASSET_NAME, Config, Error, LineParser, UNINSTALLER_ASSET_NAME, Updater,
    set_run_at_login, tail_file,
};

#[derive(Parser)]
#[command(name = "gamelog-agent")]
#[command(about = "Background agent that tails the game client log and extracts structured events")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tail the configured log file and report parsed events
    Run {
        /// Watch this file instead of the configured path
        #[arg(long)]
        log_path: Option<PathBuf>,
    },

    /// Download the latest release and register the agent
    Install,

    /// Remove the agent from login startup
    Uninstall,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("gamelog_agent=info".parse().unwrap()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { log_path } => run(log_path).await,
        Commands::Install => install().await,
        Commands::Uninstall => uninstall(),
    }
}

async fn run(log_path: Option<PathBuf>) -> Result<(), Error> {
    let config = Config::load()?;
    let log_path = log_path.unwrap_or(config.log_path);

    tracing::info!(path = %log_path.display(), "starting");

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    let mut lines = tail_file(&log_path, cancel);
    let parser = LineParser::new();

    while let Some(raw) = lines.next().await {
        if let Some(event) = parser.parse(&raw) {
            tracing::info!(
                time = %event.time,
                level = event.level.map(tracing::field::display),
                kind = event.kind.as_deref(),
                content = %event.content,
                "game event"
            );
        }
    }

    tracing::info!("shutting down");
    Ok(())
}

async fn install() -> Result<(), Error> {
    let config = Config::load()?;

    tracing::info!("starting installation");

    let updater = Updater::new(config.latest_release_url())?;
    let Some(bundle) = updater.check_for_update("").await? else {
        tracing::info!("already on the latest release");
        return Ok(());
    };

    std::fs::create_dir_all(&config.install_dir)?;

    let agent_path = config.install_dir.join(AGENT_ASSET_NAME);
    std::fs::write(&agent_path, &bundle.agent)?;

    if let Some(uninstaller) = &bundle.uninstaller {
        std::fs::write(config.install_dir.join(UNINSTALLER_ASSET_NAME), uninstaller)?;
    }

    set_run_at_login(&agent_path, true)?;

    tracing::info!(version = %bundle.version, "successfully installed");
    Ok(())
}

fn uninstall() -> Result<(), Error> {
    let config = Config::load()?;

    tracing::info!("starting uninstallation");

    let agent_path = config.install_dir.join(AGENT_ASSET_NAME);
    if let Err(error) = set_run_at_login(&agent_path, false) {
        // Leftover registry values do not block removal.
        tracing::error!(%error, "failed to disable run at login");
    }

    tracing::info!("successfully uninstalled");
    Ok(())
}
