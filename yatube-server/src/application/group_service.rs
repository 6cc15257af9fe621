use std::sync::Arc;

use tracing::instrument;

use crate::data::group_repository::GroupRepository;
use crate::domain::error::{DomainError, FieldErrors};
use crate::domain::group::{Group, TITLE_MAX_LEN};

#[derive(Clone)]
pub struct GroupService {
    repo: Arc<dyn GroupRepository>,
}

impl GroupService {
    pub fn new(repo: Arc<dyn GroupRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<Group>, DomainError> {
        self.repo.list().await
    }

    #[instrument(skip(self, description))]
    pub async fn create(
        &self,
        title: String,
        slug: String,
        description: String,
    ) -> Result<Group, DomainError> {
        let title = title.trim().to_string();
        let slug = slug.trim().to_string();

        let mut errors = FieldErrors::new();
        if title.is_empty() || title.chars().count() > TITLE_MAX_LEN {
            errors.entry("title".into()).or_default().push(format!(
                "Title must be between 1 and {TITLE_MAX_LEN} characters."
            ));
        }
        if slug.is_empty() || !slug.chars().all(is_slug_char) {
            errors
                .entry("slug".into())
                .or_default()
                .push("Letters, numbers, underscores or hyphens only.".into());
        }
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        self.repo.create(Group::new(title, slug, description)).await
    }

    /// Posts of the group survive with their group cleared.
    #[instrument(skip(self))]
    pub async fn delete(&self, slug: &str) -> Result<(), DomainError> {
        if self.repo.delete(slug).await? {
            Ok(())
        } else {
            Err(DomainError::GroupNotFound(slug.to_string()))
        }
    }
}

fn is_slug_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::MemoryStore;

    #[tokio::test]
    async fn slug_must_be_url_safe_and_unique() {
        let service = GroupService::new(Arc::new(MemoryStore::new()));
        assert!(matches!(
            service
                .create("Cats".into(), "two words".into(), "".into())
                .await,
            Err(DomainError::Validation(_))
        ));
        service
            .create("Cats".into(), "cats".into(), "".into())
            .await
            .unwrap();
        assert!(matches!(
            service.create("Dogs".into(), "cats".into(), "".into()).await,
            Err(DomainError::GroupAlreadyExists(_))
        ));
        assert!(matches!(
            service.delete("dogs").await,
            Err(DomainError::GroupNotFound(_))
        ));
        service.delete("cats").await.unwrap();
        assert!(service.list().await.unwrap().is_empty());
    }
}
