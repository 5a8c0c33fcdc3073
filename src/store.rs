//! Host directory and message sink abstractions.
//!
//! Monitors only see these traits. The SQLite [`Database`] implements both;
//! [`StaticDirectory`] serves single-host mode straight from the config.

use crate::db::{Database, DbError, SaveMessageParams};
use crate::state::{ChatEvent, HostConfig, RoomRef};
use async_trait::async_trait;
use std::collections::HashMap;

/// Read-only source of hosts and their rooms.
#[async_trait]
pub trait HostDirectory: Send + Sync {
    /// Every host to monitor. Failure here is fatal at startup.
    async fn list_hosts(&self) -> Result<Vec<HostConfig>, DbError>;

    /// Rooms to join on `host`. Callers treat failure as "no rooms".
    async fn list_rooms(&self, host: &str) -> Result<Vec<RoomRef>, DbError>;
}

/// Destination for observed chat lines.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Persist one event for `host`. Failures are reported, never fatal.
    async fn save(&self, host: &str, event: &ChatEvent) -> Result<(), DbError>;
}

#[async_trait]
impl HostDirectory for Database {
    async fn list_hosts(&self) -> Result<Vec<HostConfig>, DbError> {
        self.hosts().list_hosts().await
    }

    async fn list_rooms(&self, host: &str) -> Result<Vec<RoomRef>, DbError> {
        self.hosts().list_rooms(host).await
    }
}

#[async_trait]
impl MessageSink for Database {
    async fn save(&self, host: &str, event: &ChatEvent) -> Result<(), DbError> {
        self.messages()
            .save(SaveMessageParams {
                host,
                room: &event.room,
                author: &event.author,
                body: &event.body,
                kind: event.kind,
                timestamp: event.timestamp,
            })
            .await
    }
}

/// Host directory held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    hosts: Vec<HostConfig>,
    rooms: HashMap<String, Vec<RoomRef>>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a host and the rooms to join on it.
    pub fn with_host(mut self, host: HostConfig, rooms: Vec<RoomRef>) -> Self {
        self.rooms.insert(host.name.clone(), rooms);
        self.hosts.push(host);
        self
    }
}

#[async_trait]
impl HostDirectory for StaticDirectory {
    async fn list_hosts(&self) -> Result<Vec<HostConfig>, DbError> {
        Ok(self.hosts.clone())
    }

    async fn list_rooms(&self, host: &str) -> Result<Vec<RoomRef>, DbError> {
        Ok(self.rooms.get(host).cloned().unwrap_or_default())
    }
}
