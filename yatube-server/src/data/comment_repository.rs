use crate::domain::comment::{Comment, CommentView};
use crate::domain::error::DomainError;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: Comment) -> Result<Comment, DomainError>;
    /// Comments of a post in the order they were written.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, DomainError>;
}

#[derive(Clone)]
pub struct PostgresCommentRepository {
    pool: PgPool,
}

impl PostgresCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create(&self, comment: Comment) -> Result<Comment, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, post_id, author_id, text, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(comment.id)
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(&comment.text)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create comment: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        })?;

        info!(comment_id = %comment.id, post_id = %comment.post_id, "comment created");
        Ok(comment)
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, DomainError> {
        let rows: Vec<(Uuid, String, Option<String>, chrono::DateTime<chrono::Utc>)> =
            sqlx::query_as(
                r#"
                SELECT c.id, u.username, c.text, c.created_at
                FROM comments c
                JOIN users u ON u.id = c.author_id
                WHERE c.post_id = $1
                ORDER BY c.created_at
                "#,
            )
            .bind(post_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("failed to list comments for {}: {}", post_id, e);
                DomainError::Internal(e.to_string())
            })?;

        Ok(rows
            .into_iter()
            .map(|(id, author, text, created_at)| CommentView {
                id,
                author,
                text,
                created_at,
            })
            .collect())
    }
}
