use std::sync::Arc;

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::data::follow_repository::FollowRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::follow::Follow;
use crate::domain::user::User;

/// Maintains follow edges. Both operations are idempotent: repeating them
/// leaves the graph as the first call did.
#[derive(Clone)]
pub struct FollowService {
    follows: Arc<dyn FollowRepository>,
    users: Arc<dyn UserRepository>,
}

impl FollowService {
    pub fn new(follows: Arc<dyn FollowRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { follows, users }
    }

    async fn author(&self, username: &str) -> Result<User, DomainError> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))
    }

    /// Returns whether a new edge was written. Self follows and existing
    /// edges are no-ops.
    #[instrument(skip(self))]
    pub async fn follow(&self, user_id: Uuid, author_username: &str) -> Result<bool, DomainError> {
        let author = self.author(author_username).await?;
        if author.id == user_id {
            debug!(user_id = %user_id, "self follow ignored");
            return Ok(false);
        }
        if self.follows.exists(user_id, author.id).await? {
            return Ok(false);
        }
        self.follows.create(Follow::new(user_id, author.id)).await?;
        Ok(true)
    }

    /// Returns whether any edge was removed.
    #[instrument(skip(self))]
    pub async fn unfollow(
        &self,
        user_id: Uuid,
        author_username: &str,
    ) -> Result<bool, DomainError> {
        let author = self.author(author_username).await?;
        Ok(self.follows.delete(user_id, author.id).await? > 0)
    }
}
