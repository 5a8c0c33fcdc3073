//! Session supervisor: one monitor per host, wait for all of them.

use crate::error::StartupError;
use crate::monitor::{ConnectionMonitor, ControlRouter, MonitorContext, SessionOutcome};
use crate::state::HostConfig;
use crate::telemetry::spans;
use std::collections::{HashMap, HashSet};
use tokio::task::JoinSet;
use tracing::{Instrument, error, info};

/// Owns every monitor until it terminates.
pub struct Supervisor {
    monitors: Vec<ConnectionMonitor>,
    router: ControlRouter,
}

impl Supervisor {
    /// Build one monitor per host, in directory order.
    ///
    /// Fails on an empty directory or a host name listed twice; no monitor
    /// is started either way.
    pub fn new(hosts: Vec<HostConfig>, ctx: MonitorContext) -> Result<Self, StartupError> {
        if hosts.is_empty() {
            return Err(StartupError::NoHosts);
        }

        let mut seen = HashSet::new();
        if let Some(dup) = hosts.iter().find(|h| !seen.insert(h.name.as_str())) {
            return Err(StartupError::DuplicateHost(dup.name.clone()));
        }

        let mut builder = ControlRouter::builder();
        let monitors = hosts
            .into_iter()
            .map(|host| {
                let (monitor, commands) = ConnectionMonitor::new(host, ctx.clone());
                builder.register(&monitor.host().name, commands, monitor.subscribe());
                monitor
            })
            .collect();

        Ok(Self {
            monitors,
            router: builder.build(),
        })
    }

    /// Control plane handle for the console.
    pub fn router(&self) -> ControlRouter {
        self.router.clone()
    }

    /// Start every monitor and return once all have terminated.
    ///
    /// Outcomes are in completion order. Each monitor reports exactly once.
    pub async fn run(self) -> Vec<(String, SessionOutcome)> {
        let Self { monitors, router } = self;
        drop(router);

        info!(count = monitors.len(), "Starting monitors");
        let mut set = JoinSet::new();
        let mut names = HashMap::with_capacity(monitors.len());
        for monitor in monitors {
            let name = monitor.host().name.clone();
            let span = spans::monitor(&name);
            let task = set.spawn({
                let name = name.clone();
                async move { (name, monitor.run().await) }.instrument(span)
            });
            names.insert(task.id(), name);
        }

        let mut outcomes = Vec::with_capacity(names.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((name, outcome)) => {
                    info!(host = %name, outcome = %outcome, remaining = set.len(), "Monitor finished");
                    outcomes.push((name, outcome));
                }
                Err(e) => {
                    let name = names.remove(&e.id()).unwrap_or_default();
                    error!(host = %name, error = %e, "Monitor task panicked");
                    outcomes.push((name, SessionOutcome::Panicked));
                }
            }
        }
        outcomes
    }
}
