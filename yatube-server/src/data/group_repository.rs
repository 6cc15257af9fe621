use crate::domain::error::DomainError;
use crate::domain::group::Group;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};

#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn create(&self, group: Group) -> Result<Group, DomainError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, DomainError>;
    async fn list(&self) -> Result<Vec<Group>, DomainError>;
    /// Removes the group. Its posts stay, with their group cleared.
    async fn delete(&self, slug: &str) -> Result<bool, DomainError>;
}

#[derive(Clone)]
pub struct PostgresGroupRepository {
    pool: PgPool,
}

impl PostgresGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupRepository for PostgresGroupRepository {
    async fn create(&self, group: Group) -> Result<Group, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO post_groups (id, title, slug, description)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(group.id)
        .bind(&group.title)
        .bind(&group.slug)
        .bind(&group.description)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create group: {}", e);
            if e.as_database_error()
                .and_then(|db| db.constraint())
                .map(|c| c.contains("post_groups_slug"))
                == Some(true)
            {
                DomainError::GroupAlreadyExists(group.slug.clone())
            } else {
                DomainError::Internal(format!("database error: {}", e))
            }
        })?;

        info!(group_id = %group.id, slug = %group.slug, "group created");
        Ok(group)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, DomainError> {
        sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to find group {}: {}", slug, e);
            DomainError::Internal(e.to_string())
        })
    }

    async fn list(&self) -> Result<Vec<Group>, DomainError> {
        sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to list groups: {}", e);
            DomainError::Internal(e.to_string())
        })
    }

    async fn delete(&self, slug: &str) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM post_groups WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("failed to delete group {}: {}", slug, e);
                DomainError::Internal(e.to_string())
            })?;

        let removed = deleted.rows_affected() > 0;
        if removed {
            info!(slug = %slug, "group deleted");
        }
        Ok(removed)
    }
}
