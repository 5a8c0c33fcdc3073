//! Message store repository.

use super::DbError;
use crate::state::{ChatKind, normalize_room};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Parameters for storing one chat line.
pub struct SaveMessageParams<'a> {
    pub host: &'a str,
    /// Room as received; normalized before storage.
    pub room: &'a str,
    pub author: &'a str,
    pub body: &'a str,
    pub kind: ChatKind,
    pub timestamp: DateTime<Utc>,
}

/// Stored message retrieved from database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub host: String,
    pub room: String,
    pub room_id: Option<i64>,
    pub nick: String,
    pub msg: String,
    pub typ: String,
    pub added_nanos: i64,
}

/// Repository for `irc_message`.
pub struct MessageRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MessageRepository<'a> {
    /// Create a new message repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a chat line.
    ///
    /// The room id is resolved by comparing normalized names, so a directory
    /// entry of `dev` matches an event on `#dev`. Rooms missing from the
    /// directory are stored with a NULL room id.
    pub async fn save(&self, params: SaveMessageParams<'_>) -> Result<(), DbError> {
        let room = normalize_room(params.room);
        let room_id = self.room_id(params.host, room).await?;
        let nanotime = params
            .timestamp
            .timestamp_nanos_opt()
            .unwrap_or_else(|| params.timestamp.timestamp_micros().saturating_mul(1_000));

        sqlx::query(
            r#"
            INSERT INTO irc_message (host, room, room_id, nick, msg, typ, added_nanos)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(params.host)
        .bind(room)
        .bind(room_id)
        .bind(params.author)
        .bind(params.body)
        .bind(params.kind.code())
        .bind(nanotime)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    async fn room_id(&self, host: &str, normalized_room: &str) -> Result<Option<i64>, DbError> {
        let rooms = sqlx::query_as::<_, (i64, String)>(
            r#"
            SELECT r.id, r.name
            FROM irc_room r JOIN irc_host h ON r.host_id = h.id
            WHERE h.name = ?
            "#,
        )
        .bind(host)
        .fetch_all(self.pool)
        .await?;

        Ok(rooms
            .into_iter()
            .find(|(_, name)| normalize_room(name) == normalized_room)
            .map(|(id, _)| id))
    }

    /// Messages stored for a host/room pair, oldest first.
    pub async fn list_for_room(
        &self,
        host: &str,
        room: &str,
    ) -> Result<Vec<StoredMessage>, DbError> {
        let rows = sqlx::query_as::<_, (String, String, Option<i64>, String, String, String, i64)>(
            r#"
            SELECT host, room, room_id, nick, msg, typ, added_nanos
            FROM irc_message
            WHERE host = ? AND room = ?
            ORDER BY added_nanos, id
            "#,
        )
        .bind(host)
        .bind(normalize_room(room))
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(host, room, room_id, nick, msg, typ, added_nanos)| StoredMessage {
                    host,
                    room,
                    room_id,
                    nick,
                    msg,
                    typ,
                    added_nanos,
                },
            )
            .collect())
    }

    /// Number of messages stored for a host/room pair.
    pub async fn count_for_room(&self, host: &str, room: &str) -> Result<i64, DbError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM irc_message WHERE host = ? AND room = ?")
                .bind(host)
                .bind(normalize_room(room))
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }
}
