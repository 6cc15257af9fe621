use crate::domain::error::DomainError;
use crate::domain::user::User;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `UserAlreadyExists` when the username or email is taken.
    async fn create(&self, user: User) -> Result<User, DomainError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;
    /// Removes the user together with their posts, comments and follow edges.
    async fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
}

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at";

#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, key: Lookup<'_>) -> Result<Option<User>, DomainError> {
        let column = match key {
            Lookup::Id(_) => "id",
            Lookup::Username(_) => "username",
        };
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let query = sqlx::query_as::<_, User>(&sql);
        let query = match key {
            Lookup::Id(id) => query.bind(id),
            Lookup::Username(username) => query.bind(username),
        };
        query.fetch_optional(&self.pool).await.map_err(|e| {
            error!(column, error = %e, "user lookup failed");
            DomainError::Internal(e.to_string())
        })
    }
}

#[derive(Clone, Copy)]
enum Lookup<'a> {
    Id(Uuid),
    Username(&'a str),
}

fn insert_error(e: sqlx::Error) -> DomainError {
    let constraint = e.as_database_error().and_then(|db| db.constraint());
    match constraint {
        Some("users_email_key") => {
            DomainError::UserAlreadyExists("email already registered".to_string())
        }
        Some("users_username_key") => {
            DomainError::UserAlreadyExists("username already taken".to_string())
        }
        _ => {
            error!(error = %e, "user insert failed");
            DomainError::Internal(e.to_string())
        }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        let sql = format!("INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5)");
        sqlx::query(&sql)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .execute(&self.pool)
            .await
            .map_err(insert_error)?;

        info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        self.find_one(Lookup::Username(username)).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        self.find_one(Lookup::Id(id)).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let done = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(user_id = %id, error = %e, "user delete failed");
                DomainError::Internal(e.to_string())
            })?;
        let removed = done.rows_affected() > 0;
        if removed {
            info!(user_id = %id, "user deleted");
        }
        Ok(removed)
    }
}
