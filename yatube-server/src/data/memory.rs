//! In-memory store used when no database is configured and by the test suite.
//!
//! All tables live behind one async `RwLock`, so every read sees a consistent
//! snapshot and every write is atomic. Removing a row applies
//! [`DELETION_POLICY`](crate::domain::relations::DELETION_POLICY) the same way
//! the Postgres foreign keys do.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{error, info};
use uuid::Uuid;

use crate::data::comment_repository::CommentRepository;
use crate::data::follow_repository::FollowRepository;
use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::comment::{Comment, CommentView};
use crate::domain::error::DomainError;
use crate::domain::follow::Follow;
use crate::domain::group::Group;
use crate::domain::pagination::PageWindow;
use crate::domain::post::{GroupRef, Post, PostChanges, PostScope, PostView};
use crate::domain::relations::{Entity, OnDelete, Reference, rules_for};
use crate::domain::user::User;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    groups: Vec<Group>,
    // insertion order, oldest first
    posts: Vec<Post>,
    comments: Vec<Comment>,
    follows: Vec<Follow>,
}

impl Tables {
    fn remove(&mut self, entity: Entity, id: Uuid) -> bool {
        let removed = match entity {
            Entity::User => remove_where(&mut self.users, |u| u.id == id),
            Entity::Group => remove_where(&mut self.groups, |g| g.id == id),
            Entity::Post => remove_where(&mut self.posts, |p| p.id == id),
            Entity::Comment => remove_where(&mut self.comments, |c| c.id == id),
            Entity::Follow => remove_where(&mut self.follows, |f| f.id == id),
        };
        if !removed {
            return false;
        }

        for rule in rules_for(entity) {
            let children = self.referencing(rule.reference, id);
            for child in children {
                match rule.on_delete {
                    OnDelete::Cascade => {
                        self.remove(rule.reference.child(), child);
                    }
                    OnDelete::SetNull => self.clear(rule.reference, child),
                }
            }
        }
        true
    }

    fn referencing(&self, reference: Reference, parent: Uuid) -> Vec<Uuid> {
        match reference {
            Reference::PostAuthor => ids(
                self.posts
                    .iter()
                    .filter(|p| p.author_id == parent)
                    .map(|p| p.id),
            ),
            Reference::PostGroup => ids(
                self.posts
                    .iter()
                    .filter(|p| p.group_id == Some(parent))
                    .map(|p| p.id),
            ),
            Reference::CommentPost => ids(
                self.comments
                    .iter()
                    .filter(|c| c.post_id == parent)
                    .map(|c| c.id),
            ),
            Reference::CommentAuthor => ids(
                self.comments
                    .iter()
                    .filter(|c| c.author_id == parent)
                    .map(|c| c.id),
            ),
            Reference::FollowUser => ids(
                self.follows
                    .iter()
                    .filter(|f| f.user_id == parent)
                    .map(|f| f.id),
            ),
            Reference::FollowAuthor => ids(
                self.follows
                    .iter()
                    .filter(|f| f.author_id == parent)
                    .map(|f| f.id),
            ),
        }
    }

    fn clear(&mut self, reference: Reference, child: Uuid) {
        match reference {
            Reference::PostGroup => {
                if let Some(post) = self.posts.iter_mut().find(|p| p.id == child) {
                    post.group_id = None;
                }
            }
            other => error!(reference = ?other, "reference is not nullable, left untouched"),
        }
    }

    fn in_scope(&self, post: &Post, scope: PostScope) -> bool {
        match scope {
            PostScope::All => true,
            PostScope::Group(group_id) => post.group_id == Some(group_id),
            PostScope::Author(author_id) => post.author_id == author_id,
            PostScope::FollowedBy(user_id) => self
                .follows
                .iter()
                .any(|f| f.user_id == user_id && f.author_id == post.author_id),
        }
    }

    /// Newest first; posts created in the same instant keep the newest
    /// insertion first.
    fn ordered(&self, scope: PostScope) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self
            .posts
            .iter()
            .rev()
            .filter(|post| self.in_scope(post, scope))
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts
    }

    fn view(&self, post: &Post) -> Option<PostView> {
        let author = self.users.iter().find(|u| u.id == post.author_id)?;
        let group = post
            .group_id
            .and_then(|id| self.groups.iter().find(|g| g.id == id))
            .map(|g| GroupRef {
                slug: g.slug.clone(),
                title: g.title.clone(),
            });
        Some(PostView {
            id: post.id,
            text: post.text.clone(),
            image: post.image.clone(),
            created_at: post.created_at,
            author_id: post.author_id,
            author: author.username.clone(),
            group,
        })
    }
}

fn remove_where<T>(rows: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> bool {
    let before = rows.len();
    rows.retain(|row| !matches(row));
    rows.len() != before
}

fn ids(iter: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    iter.collect()
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored edges from `user_id` to `author_id`, duplicates included.
    pub async fn follow_edges(&self, user_id: Uuid, author_id: Uuid) -> usize {
        self.tables
            .read()
            .await
            .follows
            .iter()
            .filter(|f| f.user_id == user_id && f.author_id == author_id)
            .count()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(DomainError::UserAlreadyExists(
                "email already registered".to_string(),
            ));
        }
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(DomainError::UserAlreadyExists(
                "username already taken".to_string(),
            ));
        }
        tables.users.push(user.clone());
        info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let removed = self.tables.write().await.remove(Entity::User, id);
        if removed {
            info!(user_id = %id, "user deleted");
        }
        Ok(removed)
    }
}

#[async_trait]
impl GroupRepository for MemoryStore {
    async fn create(&self, group: Group) -> Result<Group, DomainError> {
        let mut tables = self.tables.write().await;
        if tables.groups.iter().any(|g| g.slug == group.slug) {
            return Err(DomainError::GroupAlreadyExists(group.slug));
        }
        tables.groups.push(group.clone());
        info!(group_id = %group.id, slug = %group.slug, "group created");
        Ok(group)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn list(&self) -> Result<Vec<Group>, DomainError> {
        let tables = self.tables.read().await;
        let mut groups = tables.groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }

    async fn delete(&self, slug: &str) -> Result<bool, DomainError> {
        let mut tables = self.tables.write().await;
        let Some(id) = tables.groups.iter().find(|g| g.slug == slug).map(|g| g.id) else {
            return Ok(false);
        };
        let removed = tables.remove(Entity::Group, id);
        if removed {
            info!(slug = %slug, "group deleted");
        }
        Ok(removed)
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(&self, post: Post) -> Result<Post, DomainError> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|u| u.id == post.author_id) {
            return Err(DomainError::Internal(format!(
                "post author {} does not exist",
                post.author_id
            )));
        }
        tables.posts.push(post.clone());
        info!(post_id = %post.id, author_id = %post.author_id, "post created");
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn find_view(&self, id: Uuid) -> Result<Option<PostView>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .find(|p| p.id == id)
            .and_then(|post| tables.view(post)))
    }

    async fn update_post(
        &self,
        id: Uuid,
        changes: PostChanges,
    ) -> Result<Option<Post>, DomainError> {
        let mut tables = self.tables.write().await;
        let Some(post) = tables.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        post.text = changes.text;
        post.group_id = changes.group_id;
        post.image = changes.image;
        info!(post_id = %id, "post updated");
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, DomainError> {
        let removed = self.tables.write().await.remove(Entity::Post, id);
        if removed {
            info!(post_id = %id, "post deleted");
        }
        Ok(removed)
    }

    async fn count(&self, scope: PostScope) -> Result<usize, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .filter(|post| tables.in_scope(post, scope))
            .count())
    }

    async fn list(
        &self,
        scope: PostScope,
        window: Option<PageWindow>,
    ) -> Result<Vec<PostView>, DomainError> {
        let tables = self.tables.read().await;
        let (offset, limit) = window
            .map(|w| (w.offset, w.limit))
            .unwrap_or((0, usize::MAX));
        Ok(tables
            .ordered(scope)
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|post| tables.view(post))
            .collect())
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create(&self, comment: Comment) -> Result<Comment, DomainError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(DomainError::PostNotFound(comment.post_id));
        }
        tables.comments.push(comment.clone());
        info!(comment_id = %comment.id, post_id = %comment.post_id, "comment created");
        Ok(comment)
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, DomainError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<CommentView> = tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .filter_map(|c| {
                let author = tables.users.iter().find(|u| u.id == c.author_id)?;
                Some(CommentView {
                    id: c.id,
                    author: author.username.clone(),
                    text: c.text.clone(),
                    created_at: c.created_at,
                })
            })
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }
}

#[async_trait]
impl FollowRepository for MemoryStore {
    async fn create(&self, follow: Follow) -> Result<Follow, DomainError> {
        let mut tables = self.tables.write().await;
        tables.follows.push(follow.clone());
        info!(user_id = %follow.user_id, author_id = %follow.author_id, "follow created");
        Ok(follow)
    }

    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id))
    }

    async fn delete(&self, user_id: Uuid, author_id: Uuid) -> Result<u64, DomainError> {
        let mut tables = self.tables.write().await;
        let before = tables.follows.len();
        tables
            .follows
            .retain(|f| !(f.user_id == user_id && f.author_id == author_id));
        let removed = (before - tables.follows.len()) as u64;
        if removed > 0 {
            info!(user_id = %user_id, author_id = %author_id, "follow deleted");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn user(store: &MemoryStore, name: &str) -> User {
        UserRepository::create(
            store,
            User::new(name.into(), format!("{name}@example.com"), "hash".into()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn deleting_group_keeps_posts_without_group() {
        let store = MemoryStore::new();
        let author = user(&store, "leo").await;
        let group = GroupRepository::create(
            &store,
            Group::new("Cats".into(), "cats".into(), "about cats".into()),
        )
        .await
        .unwrap();
        let post = PostRepository::create(
            &store,
            Post::new(author.id, Some(group.id), "meow".into(), None),
        )
        .await
        .unwrap();

        assert!(GroupRepository::delete(&store, "cats").await.unwrap());

        let kept = PostRepository::find_by_id(&store, post.id).await.unwrap().unwrap();
        assert_eq!(kept.group_id, None);
        assert_eq!(kept.text, "meow");
        let view = store.find_view(post.id).await.unwrap().unwrap();
        assert!(view.group.is_none());
    }

    #[tokio::test]
    async fn deleting_post_removes_its_comments() {
        let store = MemoryStore::new();
        let author = user(&store, "leo").await;
        let post = PostRepository::create(&store, Post::new(author.id, None, "hi".into(), None))
            .await
            .unwrap();
        let other = PostRepository::create(&store, Post::new(author.id, None, "yo".into(), None))
            .await
            .unwrap();
        CommentRepository::create(&store, Comment::new(post.id, author.id, "first".into()))
            .await
            .unwrap();
        CommentRepository::create(&store, Comment::new(other.id, author.id, "kept".into()))
            .await
            .unwrap();

        assert!(store.delete_post(post.id).await.unwrap());

        assert!(store.list_for_post(post.id).await.unwrap().is_empty());
        assert_eq!(store.list_for_post(other.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deleting_user_cascades_to_posts_comments_and_follows() {
        let store = MemoryStore::new();
        let author = user(&store, "leo").await;
        let reader = user(&store, "mia").await;
        let post = PostRepository::create(&store, Post::new(author.id, None, "hi".into(), None))
            .await
            .unwrap();
        CommentRepository::create(&store, Comment::new(post.id, reader.id, "nice".into()))
            .await
            .unwrap();
        FollowRepository::create(&store, Follow::new(reader.id, author.id))
            .await
            .unwrap();

        assert!(UserRepository::delete(&store, author.id).await.unwrap());

        assert!(PostRepository::find_by_id(&store, post.id).await.unwrap().is_none());
        assert!(store.list_for_post(post.id).await.unwrap().is_empty());
        assert!(!store.exists(reader.id, author.id).await.unwrap());
        assert!(UserRepository::find_by_id(&store, reader.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn same_instant_posts_list_latest_insert_first() {
        let store = MemoryStore::new();
        let leo = user(&store, "leo").await;
        let instant = chrono::Utc::now();
        for text in ["first", "second", "third"] {
            let mut post = Post::new(leo.id, None, text.into(), None);
            post.created_at = instant;
            PostRepository::create(&store, post).await.unwrap();
        }

        let listed = PostRepository::list(&store, PostScope::All, None).await.unwrap();
        let texts: Vec<_> = listed.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["third", "second", "first"]);

        let window = PageWindow::resolve(3, 2, 2);
        let last = PostRepository::list(&store, PostScope::All, Some(window))
            .await
            .unwrap();
        assert_eq!(last[0].text, "first");
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_scoped() {
        let store = MemoryStore::new();
        let leo = user(&store, "leo").await;
        let mia = user(&store, "mia").await;
        for text in ["one", "two", "three"] {
            PostRepository::create(&store, Post::new(leo.id, None, text.into(), None))
                .await
                .unwrap();
        }
        PostRepository::create(&store, Post::new(mia.id, None, "mine".into(), None))
            .await
            .unwrap();

        let all = PostRepository::list(&store, PostScope::All, None).await.unwrap();
        let texts: Vec<_> = all.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["mine", "three", "two", "one"]);

        assert_eq!(store.count(PostScope::Author(leo.id)).await.unwrap(), 3);
        let window = PageWindow::resolve(3, 2, 2);
        let second = PostRepository::list(&store, PostScope::Author(leo.id), Some(window))
            .await
            .unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].text, "one");
        assert_eq!(second[0].author, "leo");
    }

    #[tokio::test]
    async fn duplicate_usernames_are_rejected() {
        let store = MemoryStore::new();
        user(&store, "leo").await;
        let err = UserRepository::create(
            &store,
            User::new("leo".into(), "other@example.com".into(), "hash".into()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DomainError::UserAlreadyExists(_)));
    }
}
