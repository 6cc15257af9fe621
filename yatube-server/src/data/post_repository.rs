use crate::domain::error::DomainError;
use crate::domain::pagination::PageWindow;
use crate::domain::post::{GroupRef, Post, PostChanges, PostScope, PostView};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{error, info};
use uuid::Uuid;

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: Post) -> Result<Post, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, DomainError>;
    async fn find_view(&self, id: Uuid) -> Result<Option<PostView>, DomainError>;
    async fn update_post(&self, id: Uuid, changes: PostChanges)
    -> Result<Option<Post>, DomainError>;
    /// Removes the post and, through the deletion policy, its comments.
    async fn delete_post(&self, id: Uuid) -> Result<bool, DomainError>;
    async fn count(&self, scope: PostScope) -> Result<usize, DomainError>;
    /// Posts in `scope`, newest first, with author and group resolved.
    /// `None` returns the whole listing.
    async fn list(
        &self,
        scope: PostScope,
        window: Option<PageWindow>,
    ) -> Result<Vec<PostView>, DomainError>;
}

#[derive(Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const VIEW_SELECT: &str = r#"
    SELECT p.id, p.text, p.image, p.created_at, p.author_id,
           u.username AS author, g.slug AS group_slug, g.title AS group_title
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN post_groups g ON g.id = p.group_id
"#;

#[derive(sqlx::FromRow)]
struct PostViewRow {
    id: Uuid,
    text: String,
    image: Option<String>,
    created_at: DateTime<Utc>,
    author_id: Uuid,
    author: String,
    group_slug: Option<String>,
    group_title: Option<String>,
}

impl From<PostViewRow> for PostView {
    fn from(row: PostViewRow) -> Self {
        let group = match (row.group_slug, row.group_title) {
            (Some(slug), Some(title)) => Some(GroupRef { slug, title }),
            _ => None,
        };
        PostView {
            id: row.id,
            text: row.text,
            image: row.image,
            created_at: row.created_at,
            author_id: row.author_id,
            author: row.author,
            group,
        }
    }
}

fn push_scope(builder: &mut QueryBuilder<'_, Postgres>, scope: PostScope) {
    match scope {
        PostScope::All => {}
        PostScope::Group(group_id) => {
            builder.push(" WHERE p.group_id = ").push_bind(group_id);
        }
        PostScope::Author(author_id) => {
            builder.push(" WHERE p.author_id = ").push_bind(author_id);
        }
        PostScope::FollowedBy(user_id) => {
            // IN keeps a post single even if the edge is stored twice
            builder
                .push(" WHERE p.author_id IN (SELECT f.author_id FROM follows f WHERE f.user_id = ")
                .push_bind(user_id)
                .push(")");
        }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, post: Post) -> Result<Post, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, author_id, group_id, text, image, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(post.id)
        .bind(post.author_id)
        .bind(post.group_id)
        .bind(&post.text)
        .bind(&post.image)
        .bind(post.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create post: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        })?;

        info!(post_id = %post.id, author_id = %post.author_id, "post created");
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, DomainError> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, group_id, text, image, created_at
            FROM posts WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("db error find_by_id {}: {}", id, e);
            DomainError::Internal(e.to_string())
        })
    }

    async fn find_view(&self, id: Uuid) -> Result<Option<PostView>, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new(VIEW_SELECT);
        builder.push(" WHERE p.id = ").push_bind(id);
        let row = builder
            .build_query_as::<PostViewRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("db error find_view {}: {}", id, e);
                DomainError::Internal(e.to_string())
            })?;
        Ok(row.map(PostView::from))
    }

    async fn update_post(
        &self,
        id: Uuid,
        changes: PostChanges,
    ) -> Result<Option<Post>, DomainError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET text = $1, group_id = $2, image = $3
            WHERE id = $4
            RETURNING id, author_id, group_id, text, image, created_at
            "#,
        )
        .bind(&changes.text)
        .bind(changes.group_id)
        .bind(&changes.image)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to update post {}: {}", id, e);
            DomainError::Internal(e.to_string())
        })?;

        if post.is_some() {
            info!(post_id = %id, "post updated");
        }

        Ok(post)
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("failed to delete post {}: {}", id, e);
                DomainError::Internal(e.to_string())
            })?;

        let removed = deleted.rows_affected() > 0;
        if removed {
            info!(post_id = %id, "post deleted");
        }
        Ok(removed)
    }

    async fn count(&self, scope: PostScope) -> Result<usize, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p");
        push_scope(&mut builder, scope);
        let total: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("db error while counting posts: {}", e);
                DomainError::Internal(e.to_string())
            })?;
        Ok(total.max(0) as usize)
    }

    async fn list(
        &self,
        scope: PostScope,
        window: Option<PageWindow>,
    ) -> Result<Vec<PostView>, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new(VIEW_SELECT);
        push_scope(&mut builder, scope);
        builder.push(" ORDER BY p.created_at DESC, p.seq DESC");
        if let Some(window) = window {
            builder
                .push(" LIMIT ")
                .push_bind(window.limit as i64)
                .push(" OFFSET ")
                .push_bind(window.offset as i64);
        }

        let rows = builder
            .build_query_as::<PostViewRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("db error while fetching posts: {}", e);
                DomainError::Internal(e.to_string())
            })?;
        Ok(rows.into_iter().map(PostView::from).collect())
    }
}
