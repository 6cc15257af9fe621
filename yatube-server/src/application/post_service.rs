use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::authorization::can_edit;
use crate::data::follow_repository::FollowRepository;
use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::{DomainError, FieldErrors};
use crate::domain::group::Group;
use crate::domain::pagination::{PAGE_SIZE, Page, PageWindow};
use crate::domain::post::{Post, PostChanges, PostScope, PostView};
use crate::presentation::dto::PostForm;

#[derive(Debug, Serialize)]
pub struct GroupListing {
    pub group: Group,
    pub page: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileListing {
    pub author: AuthorSummary,
    pub count: usize,
    pub following: bool,
    pub page: Page<PostView>,
}

#[derive(Debug)]
pub enum EditOutcome {
    Updated(Post),
    /// The acting user is not the author; nothing was written.
    NotAuthor(Post),
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn GroupRepository>,
    follows: Arc<dyn FollowRepository>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        groups: Arc<dyn GroupRepository>,
        follows: Arc<dyn FollowRepository>,
    ) -> Self {
        Self {
            posts,
            users,
            groups,
            follows,
        }
    }

    pub async fn get_post(&self, id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    pub async fn get_view(&self, id: Uuid) -> Result<PostView, DomainError> {
        self.posts
            .find_view(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    pub async fn list_all(&self, page: usize) -> Result<Page<PostView>, DomainError> {
        self.paginate(PostScope::All, page).await
    }

    pub async fn list_by_group(&self, slug: &str, page: usize) -> Result<GroupListing, DomainError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::GroupNotFound(slug.to_string()))?;
        let page = self.paginate(PostScope::Group(group.id), page).await?;
        Ok(GroupListing { group, page })
    }

    pub async fn list_by_author(
        &self,
        username: &str,
        viewer: Option<Uuid>,
        page: usize,
    ) -> Result<ProfileListing, DomainError> {
        let author = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))?;
        let page = self.paginate(PostScope::Author(author.id), page).await?;
        let following = match viewer {
            Some(viewer) => self.follows.exists(viewer, author.id).await?,
            None => false,
        };
        Ok(ProfileListing {
            author: AuthorSummary {
                id: author.id,
                username: author.username,
            },
            count: page.count,
            following,
            page,
        })
    }

    /// Every post by an author `viewer` follows, newest first.
    pub async fn timeline(&self, viewer: Uuid) -> Result<Vec<PostView>, DomainError> {
        self.posts.list(PostScope::FollowedBy(viewer), None).await
    }

    pub async fn feed(&self, viewer: Uuid, page: usize) -> Result<Page<PostView>, DomainError> {
        self.paginate(PostScope::FollowedBy(viewer), page).await
    }

    async fn paginate(&self, scope: PostScope, page: usize) -> Result<Page<PostView>, DomainError> {
        let count = self.posts.count(scope).await?;
        let window = PageWindow::resolve(count, PAGE_SIZE, page);
        let items = self.posts.list(scope, Some(window)).await?;
        Ok(Page::new(items, window))
    }

    #[instrument(skip(self, form))]
    pub async fn create_post(&self, author_id: Uuid, form: &PostForm) -> Result<Post, DomainError> {
        let changes = self.validate(form).await?;
        let post = Post::new(author_id, changes.group_id, changes.text, changes.image);
        self.posts.create(post).await
    }

    #[instrument(skip(self, form))]
    pub async fn update_post(
        &self,
        acting_user: Uuid,
        post_id: Uuid,
        form: &PostForm,
    ) -> Result<EditOutcome, DomainError> {
        let post = self.get_post(post_id).await?;
        if !can_edit(acting_user, &post) {
            info!(post_id = %post_id, user_id = %acting_user, "edit by non-author ignored");
            return Ok(EditOutcome::NotAuthor(post));
        }

        let changes = self.validate(form).await?;
        match self.posts.update_post(post_id, changes).await? {
            Some(post) => Ok(EditOutcome::Updated(post)),
            None => Err(DomainError::PostNotFound(post_id)),
        }
    }

    /// Removes a post and its comments. Administrative only.
    #[instrument(skip(self))]
    pub async fn delete_post(&self, post_id: Uuid) -> Result<(), DomainError> {
        if self.posts.delete_post(post_id).await? {
            Ok(())
        } else {
            Err(DomainError::PostNotFound(post_id))
        }
    }

    async fn validate(&self, form: &PostForm) -> Result<PostChanges, DomainError> {
        let mut errors = FieldErrors::new();

        let text = form.text.trim();
        if text.is_empty() {
            errors
                .entry("text".into())
                .or_default()
                .push("This field is required.".into());
        }

        let slug = form.group.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let group_id = match slug {
            Some(slug) => match self.groups.find_by_slug(slug).await? {
                Some(group) => Some(group.id),
                None => {
                    errors
                        .entry("group".into())
                        .or_default()
                        .push("Select a valid choice.".into());
                    None
                }
            },
            None => None,
        };

        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        Ok(PostChanges {
            text: form.text.clone(),
            group_id,
            image: form
                .image
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::MemoryStore;
    use crate::domain::follow::Follow;
    use crate::domain::user::User;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: PostService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let service = PostService::new(store.clone(), store.clone(), store.clone(), store.clone());
        Fixture { store, service }
    }

    async fn user(store: &MemoryStore, name: &str) -> User {
        UserRepository::create(
            store,
            User::new(name.into(), format!("{name}@example.com"), "hash".into()),
        )
        .await
        .unwrap()
    }

    fn form(text: &str, group: Option<&str>) -> PostForm {
        PostForm {
            text: text.into(),
            group: group.map(str::to_owned),
            image: None,
        }
    }

    #[tokio::test]
    async fn group_listing_only_holds_group_posts() {
        let Fixture { store, service } = fixture();
        let author = user(&store, "leo").await;
        GroupRepository::create(&*store, Group::new("One".into(), "slug1".into(), "".into()))
            .await
            .unwrap();
        GroupRepository::create(&*store, Group::new("Two".into(), "slug2".into(), "".into()))
            .await
            .unwrap();
        let post = service
            .create_post(author.id, &form("in two", Some("slug2")))
            .await
            .unwrap();

        let empty = service.list_by_group("slug1", 1).await.unwrap();
        assert!(empty.page.items.is_empty());

        let listing = service.list_by_group("slug2", 1).await.unwrap();
        assert_eq!(listing.page.items.len(), 1);
        assert_eq!(listing.page.items[0].id, post.id);
        assert_eq!(listing.page.items[0].group.as_ref().unwrap().title, "Two");

        assert!(matches!(
            service.list_by_group("nope", 1).await,
            Err(DomainError::GroupNotFound(_))
        ));
    }

    #[tokio::test]
    async fn profile_reports_count_and_follow_state() {
        let Fixture { store, service } = fixture();
        let author = user(&store, "leo").await;
        let reader = user(&store, "mia").await;
        for n in 0..13 {
            service
                .create_post(author.id, &form(&format!("post {n}"), None))
                .await
                .unwrap();
        }

        let anonymous = service.list_by_author("leo", None, 2).await.unwrap();
        assert_eq!(anonymous.count, 13);
        assert_eq!(anonymous.page.items.len(), 3);
        assert!(!anonymous.following);

        FollowRepository::create(&*store, Follow::new(reader.id, author.id))
            .await
            .unwrap();
        let followed = service
            .list_by_author("leo", Some(reader.id), 1)
            .await
            .unwrap();
        assert!(followed.following);
        assert_eq!(followed.page.items.len(), 10);

        assert!(matches!(
            service.list_by_author("ghost", None, 1).await,
            Err(DomainError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn timeline_contains_followed_authors_only() {
        let Fixture { store, service } = fixture();
        let author = user(&store, "leo").await;
        let follower = user(&store, "mia").await;
        let post = service.create_post(author.id, &form("hello", None)).await.unwrap();
        service.create_post(follower.id, &form("own", None)).await.unwrap();
        FollowRepository::create(&*store, Follow::new(follower.id, author.id))
            .await
            .unwrap();

        let timeline = service.timeline(follower.id).await.unwrap();
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].id, post.id);

        assert!(service.timeline(author.id).await.unwrap().is_empty());
        assert!(service.feed(author.id, 1).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn non_author_edit_leaves_post_untouched() {
        let Fixture { store, service } = fixture();
        let author = user(&store, "leo").await;
        let stranger = user(&store, "mia").await;
        let post = service.create_post(author.id, &form("original", None)).await.unwrap();

        let outcome = service
            .update_post(stranger.id, post.id, &form("hijacked", None))
            .await
            .unwrap();
        assert!(matches!(outcome, EditOutcome::NotAuthor(_)));
        assert_eq!(service.get_post(post.id).await.unwrap().text, "original");

        let outcome = service
            .update_post(author.id, post.id, &form("edited", None))
            .await
            .unwrap();
        match outcome {
            EditOutcome::Updated(updated) => {
                assert_eq!(updated.text, "edited");
                assert_eq!(updated.created_at, post.created_at);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_text_and_unknown_group_are_field_errors() {
        let Fixture { store, service } = fixture();
        let author = user(&store, "leo").await;

        match service.create_post(author.id, &form("   ", Some("missing"))).await {
            Err(DomainError::Validation(errors)) => {
                assert!(errors.contains_key("text"));
                assert!(errors.contains_key("group"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(service.list_all(1).await.unwrap().count, 0);
    }
}
