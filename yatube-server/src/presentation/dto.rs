use crate::domain::comment::CommentView;
use crate::domain::error::FieldErrors;
use crate::domain::group::Group;
use crate::domain::pagination::{Page, parse_page_number};
use crate::domain::post::{Post, PostView};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ======================= AUTH =======================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(rename = "token_type")]
    pub token_type: String, // "Bearer"
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginFormPage {
    pub fields: [&'static str; 2],
    pub next: Option<String>,
}

// ======================= POSTS =======================

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn number(&self) -> usize {
        parse_page_number(self.page.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: String,
    /// Group slug; empty or missing means no group.
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl PostForm {
    pub fn from_post(post: &Post, group_slug: Option<String>) -> Self {
        Self {
            text: post.text.clone(),
            group: group_slug,
            image: post.image.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupChoice {
    pub slug: String,
    pub title: String,
}

impl From<Group> for GroupChoice {
    fn from(group: Group) -> Self {
        Self {
            slug: group.slug,
            title: group.title,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostFormPage {
    pub form: PostForm,
    pub groups: Vec<GroupChoice>,
    pub is_edit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<Uuid>,
    pub errors: FieldErrors,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostDetailPage {
    pub post: PostView,
    pub comments: Vec<CommentView>,
    pub form: CommentForm,
    pub errors: FieldErrors,
    pub can_edit: bool,
}

#[derive(Debug, Serialize)]
pub struct IndexPage {
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct FollowPage {
    pub page_obj: Page<PostView>,
}

// ======================= ADMIN =======================

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

// ======================= Utils =======================

#[derive(Debug, Serialize)]
pub struct NotFoundPage<'a> {
    pub error: &'static str,
    pub path: &'a str,
}
