use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::data::comment_repository::CommentRepository;
use crate::data::post_repository::PostRepository;
use crate::domain::comment::{Comment, CommentView};
use crate::domain::error::DomainError;

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { comments, posts }
    }

    pub async fn comments_for(&self, post_id: Uuid) -> Result<Vec<CommentView>, DomainError> {
        self.comments.list_for_post(post_id).await
    }

    /// Stores a comment on an existing post. Blank text is a field error even
    /// though storage itself would accept a comment without text.
    #[instrument(skip(self, text))]
    pub async fn add_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        text: Option<&str>,
    ) -> Result<Comment, DomainError> {
        if self.posts.find_by_id(post_id).await?.is_none() {
            return Err(DomainError::PostNotFound(post_id));
        }

        let text = text.unwrap_or_default();
        if text.trim().is_empty() {
            return Err(DomainError::invalid_field("text", "This field is required."));
        }

        self.comments
            .create(Comment::new(post_id, author_id, text.to_string()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::MemoryStore;
    use crate::data::user_repository::UserRepository;
    use crate::domain::post::Post;
    use crate::domain::user::User;

    #[tokio::test]
    async fn comment_requires_text_and_existing_post() {
        let store = Arc::new(MemoryStore::new());
        let service = CommentService::new(store.clone(), store.clone());
        let author = UserRepository::create(
            &*store,
            User::new("leo".into(), "leo@example.com".into(), "hash".into()),
        )
        .await
        .unwrap();
        let post = PostRepository::create(&*store, Post::new(author.id, None, "hi".into(), None))
            .await
            .unwrap();

        assert!(matches!(
            service.add_comment(post.id, author.id, Some("  ")).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            service.add_comment(post.id, author.id, None).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            service.add_comment(Uuid::new_v4(), author.id, Some("hey")).await,
            Err(DomainError::PostNotFound(_))
        ));
        assert!(service.comments_for(post.id).await.unwrap().is_empty());

        service
            .add_comment(post.id, author.id, Some("nice post"))
            .await
            .unwrap();
        let comments = service.comments_for(post.id).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text.as_deref(), Some("nice post"));
        assert_eq!(comments[0].author, "leo");
    }
}
