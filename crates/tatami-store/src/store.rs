//! SQLite-backed append-only turn log.
//!
//! Turns are only ever inserted; chat summaries are computed at read
//! time with a GROUP BY over the log, so the listing always reflects
//! the latest persisted turn without any denormalized state.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::info;

use tatami_types::error::{GatewayError, Result};
use tatami_types::event::ChannelKind;
use tatami_types::turn::{ChatSummary, Turn};

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS turns (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    session_key TEXT NOT NULL,
    channel     TEXT NOT NULL,
    user_id     TEXT NOT NULL,
    user_text   TEXT NOT NULL,
    reply_text  TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_turns_session ON turns(session_key, id);
";

/// Filters and paging for the admin chat listing.
#[derive(Debug, Clone)]
pub struct ListChatsQuery {
    /// 1-based page number.
    pub page: i64,
    /// Rows per page.
    pub limit: i64,
    /// Substring match over session key and user id.
    pub search: Option<String>,
    /// Restrict to one channel.
    pub channel: Option<ChannelKind>,
}

impl Default for ListChatsQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            search: None,
            channel: None,
        }
    }
}

/// Handle to the turn log. Cheap to clone; all clones share one pool.
#[derive(Clone)]
pub struct TurnStore {
    pool: SqlitePool,
}

impl TurnStore {
    /// Open (creating if missing) the database at `database_url` and
    /// ensure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| GatewayError::Storage(e.to_string()))?
            .create_if_missing(true);

        // A single connection: one writer is plenty at this scale, and
        // it keeps `sqlite::memory:` databases coherent under test.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| GatewayError::Storage(e.to_string()))?;

        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| GatewayError::Storage(e.to_string()))?;

        info!(database_url, "turn store ready");
        Ok(Self { pool })
    }

    /// Append one completed turn to the log.
    pub async fn record(&self, turn: &Turn) -> Result<()> {
        sqlx::query(
            "INSERT INTO turns (session_key, channel, user_id, user_text, reply_text, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&turn.session_key)
        .bind(turn.channel.as_str())
        .bind(&turn.user_id)
        .bind(&turn.user_text)
        .bind(&turn.reply_text)
        .bind(turn.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| GatewayError::Storage(e.to_string()))?;
        Ok(())
    }

    /// List conversations, newest first, with the matching total count.
    pub async fn list_chats(&self, query: &ListChatsQuery) -> Result<(Vec<ChatSummary>, i64)> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT session_key, channel, user_id, \
             COUNT(*) AS total_turns, \
             MAX(created_at) AS updated_at, \
             (SELECT user_text FROM turns t2 \
              WHERE t2.session_key = turns.session_key \
              ORDER BY t2.id DESC LIMIT 1) AS last_message \
             FROM turns WHERE 1=1",
        );
        push_filters(&mut qb, query);
        qb.push(" GROUP BY session_key ORDER BY updated_at DESC LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind((query.page - 1) * query.limit);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| GatewayError::Storage(e.to_string()))?;
        let items = rows
            .iter()
            .map(summary_from_row)
            .collect::<Result<Vec<_>>>()?;

        let mut count_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(DISTINCT session_key) AS total FROM turns WHERE 1=1");
        push_filters(&mut count_qb, query);
        let total: i64 = count_qb
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| GatewayError::Storage(e.to_string()))?
            .try_get("total")
            .map_err(|e| GatewayError::Storage(e.to_string()))?;

        Ok((items, total))
    }

    /// Fetch the full turn history of one conversation, oldest first.
    pub async fn get_chat(&self, session_key: &str) -> Result<Vec<Turn>> {
        let rows = sqlx::query(
            "SELECT session_key, channel, user_id, user_text, reply_text, created_at \
             FROM turns WHERE session_key = ? ORDER BY id ASC",
        )
        .bind(session_key)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GatewayError::Storage(e.to_string()))?;

        if rows.is_empty() {
            return Err(GatewayError::NotFound(session_key.to_string()));
        }
        rows.iter().map(turn_from_row).collect()
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, query: &ListChatsQuery) {
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        qb.push(" AND (session_key LIKE ")
            .push_bind(pattern.clone())
            .push(" OR user_id LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(channel) = query.channel {
        qb.push(" AND channel = ").push_bind(channel.as_str());
    }
}

fn parse_channel(tag: &str) -> Result<ChannelKind> {
    tag.parse::<ChannelKind>()
        .map_err(|_| GatewayError::Storage(format!("unknown channel tag in turn log: {tag}")))
}

fn summary_from_row(row: &SqliteRow) -> Result<ChatSummary> {
    let storage = |e: sqlx::Error| GatewayError::Storage(e.to_string());
    Ok(ChatSummary {
        session_key: row.try_get("session_key").map_err(storage)?,
        channel: parse_channel(row.try_get::<String, _>("channel").map_err(storage)?.as_str())?,
        user_id: row.try_get("user_id").map_err(storage)?,
        last_message: row.try_get("last_message").map_err(storage)?,
        total_turns: row.try_get("total_turns").map_err(storage)?,
        updated_at: row
            .try_get::<DateTime<Utc>, _>("updated_at")
            .map_err(storage)?,
    })
}

fn turn_from_row(row: &SqliteRow) -> Result<Turn> {
    let storage = |e: sqlx::Error| GatewayError::Storage(e.to_string());
    Ok(Turn {
        session_key: row.try_get("session_key").map_err(storage)?,
        channel: parse_channel(row.try_get::<String, _>("channel").map_err(storage)?.as_str())?,
        user_id: row.try_get("user_id").map_err(storage)?,
        user_text: row.try_get("user_text").map_err(storage)?,
        reply_text: row.try_get("reply_text").map_err(storage)?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(storage)?,
    })
}
