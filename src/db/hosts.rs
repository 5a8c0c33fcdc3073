//! Host directory repository.
//!
//! Reads the hosts to monitor and the rooms to join on each of them.

use super::DbError;
use crate::state::{HostConfig, RoomRef};
use sqlx::SqlitePool;

/// Repository for `irc_host` / `irc_room`.
pub struct HostRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> HostRepository<'a> {
    /// Create a new host repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All configured hosts, in insertion order.
    pub async fn list_hosts(&self) -> Result<Vec<HostConfig>, DbError> {
        let rows = sqlx::query_as::<_, (String, String, i64, bool, String)>(
            r#"
            SELECT name, host, port, ssl, nick
            FROM irc_host
            ORDER BY id
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|(name, address, port, tls, nick)| {
                let port = u16::try_from(port)
                    .map_err(|_| DbError::InvalidRow(format!("host {name}: port {port}")))?;
                Ok(HostConfig {
                    name,
                    address,
                    port,
                    tls,
                    nick,
                })
            })
            .collect()
    }

    /// Rooms registered for `host_name`. Unknown hosts have no rooms.
    pub async fn list_rooms(&self, host_name: &str) -> Result<Vec<RoomRef>, DbError> {
        let names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT r.name
            FROM irc_room r JOIN irc_host h ON r.host_id = h.id
            WHERE h.name = ?
            ORDER BY r.id
            "#,
        )
        .bind(host_name)
        .fetch_all(self.pool)
        .await?;

        Ok(names.into_iter().map(RoomRef::new).collect())
    }

    /// Insert a host, returning its row id.
    pub async fn add_host(&self, host: &HostConfig) -> Result<i64, DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO irc_host (name, host, port, ssl, nick)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&host.name)
        .bind(&host.address)
        .bind(i64::from(host.port))
        .bind(host.tls)
        .bind(&host.nick)
        .execute(self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Register a room on an existing host, returning its row id.
    pub async fn add_room(&self, host_name: &str, room: &str) -> Result<i64, DbError> {
        let host_id: Option<i64> = sqlx::query_scalar("SELECT id FROM irc_host WHERE name = ?")
            .bind(host_name)
            .fetch_optional(self.pool)
            .await?;
        let host_id = host_id.ok_or_else(|| DbError::HostNotFound(host_name.to_string()))?;

        let result = sqlx::query("INSERT INTO irc_room (host_id, name) VALUES (?, ?)")
            .bind(host_id)
            .bind(room)
            .execute(self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }
}
