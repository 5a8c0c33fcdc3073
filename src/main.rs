//! scribe - multi-host IRC logger.
//!
//! Usage: `scribe [config.toml]`

use slirc_scribe::config::Config;
use slirc_scribe::console::{AdminConsole, ConsoleWriter, StdoutWriter, spawn_stdin_reader};
use slirc_scribe::db::Database;
use slirc_scribe::error::StartupError;
use slirc_scribe::monitor::{MonitorContext, SessionOutcome};
use slirc_scribe::network::IrcConnector;
use slirc_scribe::state::EchoState;
use slirc_scribe::store::{HostDirectory, StaticDirectory};
use slirc_scribe::supervisor::Supervisor;
use slirc_scribe::telemetry;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing(std::env::var_os("SCRIBE_LOG_JSON").is_some());

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "scribe.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        StartupError::from(e)
    })?;

    info!(
        database = %config.database.path,
        standalone = config.standalone.is_some(),
        proxy = config.network.proxy.is_some(),
        "Starting slirc-scribe"
    );

    let db = Database::new(&config.database.path)
        .await
        .map_err(StartupError::Database)?;

    let directory: Arc<dyn HostDirectory> = match &config.standalone {
        Some(standalone) => Arc::new(
            StaticDirectory::new().with_host(standalone.host().clone(), standalone.rooms.clone()),
        ),
        None => Arc::new(db.clone()),
    };

    let hosts = directory.list_hosts().await.map_err(|e| {
        error!(error = %e, "Failed to read host directory");
        StartupError::Directory(e)
    })?;

    let echo = EchoState::new();
    let console: Arc<dyn ConsoleWriter> = Arc::new(StdoutWriter);
    let ctx = MonitorContext {
        connector: Arc::new(IrcConnector::new(&config.network)?),
        directory,
        sink: Arc::new(db),
        echo: echo.clone(),
        console: Arc::clone(&console),
        reconnect: config.reconnect.clone(),
        quit_grace: config.network.quit_grace(),
    };

    let supervisor = Supervisor::new(hosts, ctx).inspect_err(|e| error!(error = %e, "Cannot start"))?;

    if config.console.enabled {
        let input = spawn_stdin_reader()?;
        let admin = AdminConsole::new(supervisor.router(), echo, console, config.console.marker);
        tokio::spawn(admin.run(input));
    }

    let outcomes = supervisor.run().await;
    for (host, outcome) in &outcomes {
        match outcome {
            SessionOutcome::DisconnectedFinal => info!(host = %host, "Host finished"),
            other => warn!(host = %host, outcome = %other, "Host finished"),
        }
    }
    info!(hosts = outcomes.len(), "All monitors terminated");
    Ok(())
}
