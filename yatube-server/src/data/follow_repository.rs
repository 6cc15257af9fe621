use crate::domain::error::DomainError;
use crate::domain::follow::Follow;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

/// Storage for follow edges. Nothing here rejects duplicates or self edges;
/// `FollowService` decides whether an edge should be written.
#[async_trait]
pub trait FollowRepository: Send + Sync {
    async fn create(&self, follow: Follow) -> Result<Follow, DomainError>;
    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError>;
    /// Removes every edge from `user_id` to `author_id`, returning how many went.
    async fn delete(&self, user_id: Uuid, author_id: Uuid) -> Result<u64, DomainError>;
}

#[derive(Clone)]
pub struct PostgresFollowRepository {
    pool: PgPool,
}

impl PostgresFollowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FollowRepository for PostgresFollowRepository {
    async fn create(&self, follow: Follow) -> Result<Follow, DomainError> {
        sqlx::query("INSERT INTO follows (id, user_id, author_id) VALUES ($1, $2, $3)")
            .bind(follow.id)
            .bind(follow.user_id)
            .bind(follow.author_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("failed to create follow: {}", e);
                DomainError::Internal(format!("database error: {}", e))
            })?;

        info!(user_id = %follow.user_id, author_id = %follow.author_id, "follow created");
        Ok(follow)
    }

    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE user_id = $1 AND author_id = $2)",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to check follow: {}", e);
            DomainError::Internal(e.to_string())
        })
    }

    async fn delete(&self, user_id: Uuid, author_id: Uuid) -> Result<u64, DomainError> {
        let deleted = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("failed to delete follow: {}", e);
                DomainError::Internal(e.to_string())
            })?;

        if deleted.rows_affected() > 0 {
            info!(user_id = %user_id, author_id = %author_id, "follow deleted");
        }
        Ok(deleted.rows_affected())
    }
}
