use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
    pub text: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(author_id: Uuid, group_id: Option<Uuid>, text: String, image: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            group_id,
            text,
            image,
            created_at: Utc::now(),
        }
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }
}

/// Fields an author may change on an existing post. `created_at` and the
/// author are fixed at creation.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRef {
    pub slug: String,
    pub title: String,
}

/// A post together with the author and group display data every page shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostView {
    pub id: Uuid,
    pub text: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub author: String,
    pub group: Option<GroupRef>,
}

/// Which posts a listing selects. Every scope is ordered newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    All,
    Group(Uuid),
    Author(Uuid),
    /// Posts by every author the given user follows.
    FollowedBy(Uuid),
}
