//! Persistence seam for users, chats and votes.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;
use crate::models::{Chat, NewUser, NewVote, User, Vote};

#[async_trait]
pub trait ArenaStore: Send + Sync {
    fn name(&self) -> &str;

    /// Fails with [`StoreError::Conflict`] when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    async fn save_chat(&self, user_id: &str, messages: Vec<Value>) -> Result<Chat, StoreError>;

    /// Newest first.
    async fn list_chats(&self, user_id: &str) -> Result<Vec<Chat>, StoreError>;

    /// Only returns the chat if it belongs to `user_id`.
    async fn get_chat(&self, user_id: &str, chat_id: &str) -> Result<Option<Chat>, StoreError>;

    /// `false` if no chat with that id belongs to `user_id`.
    async fn delete_chat(&self, user_id: &str, chat_id: &str) -> Result<bool, StoreError>;

    /// `query_id` is unique; a second vote is a [`StoreError::Conflict`].
    async fn record_vote(&self, vote: NewVote) -> Result<Vote, StoreError>;
}
