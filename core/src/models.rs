use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// A saved conversation. Messages are kept as the UI sent them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: String,
    pub messages: Vec<Value>,
    pub date: DateTime<Utc>,
}

/// Which answer a user preferred for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub query_id: String,
    pub model: String,
    pub vote: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewVote {
    pub query_id: String,
    pub model: String,
    pub vote: String,
}
