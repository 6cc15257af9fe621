use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::data::user_repository::UserRepository;
use crate::domain::error::{DomainError, FieldErrors};
use crate::domain::user::User;
use crate::infrastructure::security::{JwtKeys, hash_password, verify_password};

const PASSWORD_MIN_LEN: usize = 8;

#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn UserRepository>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(repo: Arc<dyn UserRepository>, keys: JwtKeys) -> Self {
        Self { repo, keys }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(id.to_string()))
    }

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: String,
        email: String,
        password: String,
    ) -> Result<User, DomainError> {
        let username = username.trim().to_string();
        let email = email.trim().to_lowercase();

        let mut errors = FieldErrors::new();
        if username.is_empty() || !username.chars().all(is_username_char) {
            errors
                .entry("username".into())
                .or_default()
                .push("Letters, digits and @/./+/-/_ only.".into());
        }
        if !email.contains('@') {
            errors
                .entry("email".into())
                .or_default()
                .push("Enter a valid email address.".into());
        }
        if password.len() < PASSWORD_MIN_LEN {
            errors
                .entry("password".into())
                .or_default()
                .push(format!("Password must be at least {PASSWORD_MIN_LEN} characters."));
        }
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        let hash =
            hash_password(&password).map_err(|err| DomainError::Internal(err.to_string()))?;
        let user = User::new(username, email, hash);
        self.repo.create(user).await
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<String, DomainError> {
        let user = self
            .repo
            .find_by_username(username.trim())
            .await?
            .ok_or(DomainError::Unauthorized)?;

        let valid = verify_password(password, &user.password_hash)
            .map_err(|_| DomainError::Unauthorized)?;
        if !valid {
            return Err(DomainError::Unauthorized);
        }

        self.keys
            .generate_token(user.id)
            .map_err(|err| DomainError::Internal(err.to_string()))
    }

    /// Removes the account along with everything it authored.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, username: &str) -> Result<(), DomainError> {
        let user = self
            .repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))?;
        self.repo.delete(user.id).await?;
        Ok(())
    }
}

fn is_username_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::MemoryStore;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(MemoryStore::new()),
            JwtKeys::new("test-secret".into(), 3600),
        )
    }

    #[tokio::test]
    async fn register_then_login_issues_token_for_user() {
        let auth = service();
        let user = auth
            .register("leo".into(), "Leo@Example.com".into(), "password1".into())
            .await
            .unwrap();
        assert_eq!(user.email, "leo@example.com");

        let token = auth.login("leo", "password1").await.unwrap();
        let claims = auth.keys().verify_token(&token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let auth = service();
        auth.register("leo".into(), "leo@example.com".into(), "password1".into())
            .await
            .unwrap();
        assert!(matches!(
            auth.login("leo", "nope-nope").await,
            Err(DomainError::Unauthorized)
        ));
        assert!(matches!(
            auth.login("ghost", "password1").await,
            Err(DomainError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn register_reports_every_invalid_field() {
        let auth = service();
        match auth.register("bad name".into(), "nope".into(), "short".into()).await {
            Err(DomainError::Validation(errors)) => {
                assert!(errors.contains_key("username"));
                assert!(errors.contains_key("email"));
                assert!(errors.contains_key("password"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
