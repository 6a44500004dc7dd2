use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use serde_json::Value;
use uuid::Uuid;

use arena_core::api::{ArenaStore, Chat, NewUser, NewVote, StoreError, User, Vote};

const SCHEMA: &str = "BEGIN;
CREATE TABLE IF NOT EXISTS users(
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    date TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS chats(
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    messages TEXT NOT NULL,
    date TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_chats_user_date ON chats(user_id, date);
CREATE TABLE IF NOT EXISTS votes(
    query_id TEXT PRIMARY KEY,
    model TEXT NOT NULL,
    vote TEXT NOT NULL,
    timestamp TEXT NOT NULL
);
COMMIT;";

/// Single-file store. rusqlite is blocking, so every statement runs on the
/// blocking pool against one shared connection.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::Backend(anyhow!("connection lock poisoned")))?;
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Backend(e.into()))?
    }
}

fn backend(e: rusqlite::Error) -> StoreError {
    StoreError::Backend(e.into())
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::ConstraintViolation)
}

/// Fixed-width so that `ORDER BY date` sorts chronologically.
fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| StoreError::Decode(e.into()))
}

struct UserRow {
    id: String,
    name: String,
    email: String,
    password_hash: String,
    date: String,
}

impl UserRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            date: row.get(4)?,
        })
    }

    fn into_user(self) -> Result<User, StoreError> {
        Ok(User {
            date: parse_ts(&self.date)?,
            id: self.id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
        })
    }
}

struct ChatRow {
    id: String,
    user_id: String,
    messages: String,
    date: String,
}

impl ChatRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            messages: row.get(2)?,
            date: row.get(3)?,
        })
    }

    fn into_chat(self) -> Result<Chat, StoreError> {
        let messages: Vec<Value> =
            serde_json::from_str(&self.messages).map_err(|e| StoreError::Decode(e.into()))?;
        Ok(Chat {
            date: parse_ts(&self.date)?,
            id: self.id,
            user: self.user_id,
            messages,
        })
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, date";
const CHAT_COLUMNS: &str = "id, user_id, messages, date";

#[async_trait]
impl ArenaStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let created = User {
            id: Uuid::new_v4().to_string(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            date: Utc::now(),
        };

        self.with_conn(move |conn| {
            let res = conn.execute(
                "INSERT INTO users(id, name, email, password_hash, date) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    created.id,
                    created.name,
                    created.email,
                    created.password_hash,
                    fmt_ts(&created.date)
                ],
            );
            match res {
                Ok(_) => Ok(created),
                Err(e) if is_unique_violation(&e) => Err(StoreError::Conflict {
                    entity: "user",
                    key: created.email,
                }),
                Err(e) => Err(backend(e)),
            }
        })
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = email.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                UserRow::from_row,
            )
            .optional()
            .map_err(backend)?
            .map(UserRow::into_user)
            .transpose()
        })
        .await
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                UserRow::from_row,
            )
            .optional()
            .map_err(backend)?
            .map(UserRow::into_user)
            .transpose()
        })
        .await
    }

    async fn save_chat(&self, user_id: &str, messages: Vec<Value>) -> Result<Chat, StoreError> {
        let chat = Chat {
            id: Uuid::new_v4().to_string(),
            user: user_id.to_string(),
            messages,
            date: Utc::now(),
        };
        let encoded =
            serde_json::to_string(&chat.messages).map_err(|e| StoreError::Decode(e.into()))?;

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO chats(id, user_id, messages, date) VALUES (?1, ?2, ?3, ?4)",
                params![chat.id, chat.user, encoded, fmt_ts(&chat.date)],
            )
            .map_err(backend)?;
            Ok(chat)
        })
        .await
    }

    async fn list_chats(&self, user_id: &str) -> Result<Vec<Chat>, StoreError> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {CHAT_COLUMNS} FROM chats WHERE user_id = ?1 ORDER BY date DESC, rowid DESC"
                ))
                .map_err(backend)?;
            let rows = stmt
                .query_map(params![user_id], ChatRow::from_row)
                .map_err(backend)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(backend)?;
            rows.into_iter().map(ChatRow::into_chat).collect()
        })
        .await
    }

    async fn get_chat(&self, user_id: &str, chat_id: &str) -> Result<Option<Chat>, StoreError> {
        let (user_id, chat_id) = (user_id.to_string(), chat_id.to_string());
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {CHAT_COLUMNS} FROM chats WHERE id = ?1 AND user_id = ?2"),
                params![chat_id, user_id],
                ChatRow::from_row,
            )
            .optional()
            .map_err(backend)?
            .map(ChatRow::into_chat)
            .transpose()
        })
        .await
    }

    async fn delete_chat(&self, user_id: &str, chat_id: &str) -> Result<bool, StoreError> {
        let (user_id, chat_id) = (user_id.to_string(), chat_id.to_string());
        self.with_conn(move |conn| {
            let n = conn
                .execute(
                    "DELETE FROM chats WHERE id = ?1 AND user_id = ?2",
                    params![chat_id, user_id],
                )
                .map_err(backend)?;
            Ok(n > 0)
        })
        .await
    }

    async fn record_vote(&self, vote: NewVote) -> Result<Vote, StoreError> {
        let stored = Vote {
            query_id: vote.query_id,
            model: vote.model,
            vote: vote.vote,
            timestamp: Utc::now(),
        };

        self.with_conn(move |conn| {
            let res = conn.execute(
                "INSERT INTO votes(query_id, model, vote, timestamp) VALUES (?1, ?2, ?3, ?4)",
                params![
                    stored.query_id,
                    stored.model,
                    stored.vote,
                    fmt_ts(&stored.timestamp)
                ],
            );
            match res {
                Ok(_) => Ok(stored),
                Err(e) if is_unique_violation(&e) => Err(StoreError::Conflict {
                    entity: "vote",
                    key: stored.query_id,
                }),
                Err(e) => Err(backend(e)),
            }
        })
        .await
    }
}
