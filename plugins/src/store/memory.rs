use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use arena_core::api::{ArenaStore, Chat, NewUser, NewVote, StoreError, User, Vote};

#[derive(Default)]
struct Inner {
    users: HashMap<String, User>,
    email_index: HashMap<String, String>,
    chats: Vec<Chat>,
    votes: HashMap<String, Vote>,
}

/// Process-local store; the default when no database is configured.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArenaStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.email_index.contains_key(&user.email) {
            return Err(StoreError::Conflict {
                entity: "user",
                key: user.email,
            });
        }

        let created = User {
            id: Uuid::new_v4().to_string(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            date: Utc::now(),
        };
        inner
            .email_index
            .insert(created.email.clone(), created.id.clone());
        inner.users.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .email_index
            .get(email)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }

    async fn save_chat(&self, user_id: &str, messages: Vec<Value>) -> Result<Chat, StoreError> {
        let chat = Chat {
            id: Uuid::new_v4().to_string(),
            user: user_id.to_string(),
            messages,
            date: Utc::now(),
        };
        self.inner.write().await.chats.push(chat.clone());
        Ok(chat)
    }

    async fn list_chats(&self, user_id: &str) -> Result<Vec<Chat>, StoreError> {
        let inner = self.inner.read().await;
        // Insertion order is chronological; walk it backwards for newest first.
        Ok(inner
            .chats
            .iter()
            .rev()
            .filter(|c| c.user == user_id)
            .cloned()
            .collect())
    }

    async fn get_chat(&self, user_id: &str, chat_id: &str) -> Result<Option<Chat>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .chats
            .iter()
            .find(|c| c.id == chat_id && c.user == user_id)
            .cloned())
    }

    async fn delete_chat(&self, user_id: &str, chat_id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.chats.len();
        inner
            .chats
            .retain(|c| !(c.id == chat_id && c.user == user_id));
        Ok(inner.chats.len() != before)
    }

    async fn record_vote(&self, vote: NewVote) -> Result<Vote, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.votes.contains_key(&vote.query_id) {
            return Err(StoreError::Conflict {
                entity: "vote",
                key: vote.query_id,
            });
        }
        let stored = Vote {
            query_id: vote.query_id,
            model: vote.model,
            vote: vote.vote,
            timestamp: Utc::now(),
        };
        inner
            .votes
            .insert(stored.query_id.clone(), stored.clone());
        Ok(stored)
    }
}
