use crate::application::authorization::can_edit;
use crate::application::comment_service::CommentService;
use crate::application::group_service::GroupService;
use crate::application::post_service::{EditOutcome, PostService};
use crate::domain::error::{DomainError, FieldErrors};
use crate::infrastructure::cache::PageCache;
use crate::presentation::dto::{
    CommentForm, FollowPage, GroupChoice, IndexPage, PageQuery, PostDetailPage, PostForm,
    PostFormPage,
};
use crate::presentation::middleware::LoginRequired;
use crate::presentation::utils::{AuthenticatedUser, post_detail_url, profile_url, redirect, request_id};
use actix_web::http::header::ContentType;
use actix_web::web::Bytes;
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use tracing::{debug, info};
use uuid::Uuid;

/// All posts. The rendered body is served from the page cache while it is
/// fresh, so edits show up only after the entry expires or is cleared.
#[get("/")]
pub async fn index(
    req: HttpRequest,
    posts: web::Data<PostService>,
    cache: web::Data<PageCache>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let key = match req.query_string() {
        "" => req.path().to_string(),
        q => format!("{}?{}", req.path(), q),
    };
    if let Some(body) = cache.get(&key).await {
        return Ok(json_body(body));
    }

    let page_obj = posts.list_all(query.number()).await?;
    let body = serde_json::to_vec(&IndexPage { page_obj })
        .map(Bytes::from)
        .map_err(|e| DomainError::Internal(format!("render failed: {e}")))?;
    cache.insert(key, body.clone()).await;

    debug!(request_id = %request_id(&req), "index rendered");
    Ok(json_body(body))
}

fn json_body(body: Bytes) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(body)
}

#[get("/group/{slug}/")]
pub async fn group_posts(
    posts: web::Data<PostService>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let listing = posts.list_by_group(&path, query.number()).await?;
    Ok(HttpResponse::Ok().json(listing))
}

#[get("/profile/{username}/")]
pub async fn profile(
    viewer: Option<AuthenticatedUser>,
    posts: web::Data<PostService>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let listing = posts
        .list_by_author(&path, viewer.map(|v| v.id), query.number())
        .await?;
    Ok(HttpResponse::Ok().json(listing))
}

#[get("/posts/{id}/")]
pub async fn post_detail(
    viewer: Option<AuthenticatedUser>,
    posts: web::Data<PostService>,
    comments: web::Data<CommentService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let page = detail_page(
        &posts,
        &comments,
        path.into_inner(),
        viewer.as_ref(),
        CommentForm::default(),
        FieldErrors::new(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(page))
}

pub(crate) async fn detail_page(
    posts: &PostService,
    comments: &CommentService,
    post_id: Uuid,
    viewer: Option<&AuthenticatedUser>,
    form: CommentForm,
    errors: FieldErrors,
) -> Result<PostDetailPage, DomainError> {
    let post = posts.get_view(post_id).await?;
    let comments = comments.comments_for(post_id).await?;
    Ok(PostDetailPage {
        can_edit: viewer.is_some_and(|v| v.id == post.author_id),
        post,
        comments,
        form,
        errors,
    })
}

async fn form_page(
    groups: &GroupService,
    form: PostForm,
    post_id: Option<Uuid>,
    errors: FieldErrors,
) -> Result<PostFormPage, DomainError> {
    let groups = groups
        .list()
        .await?
        .into_iter()
        .map(GroupChoice::from)
        .collect();
    Ok(PostFormPage {
        form,
        groups,
        is_edit: post_id.is_some(),
        post_id,
        errors,
    })
}

#[get("/create/", wrap = "LoginRequired")]
pub async fn create_form(groups: web::Data<GroupService>) -> Result<HttpResponse, DomainError> {
    let page = form_page(&groups, PostForm::default(), None, FieldErrors::new()).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/create/", wrap = "LoginRequired")]
pub async fn create_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    groups: web::Data<GroupService>,
    payload: web::Json<PostForm>,
) -> Result<HttpResponse, DomainError> {
    let form = payload.into_inner();
    match posts.create_post(user.id, &form).await {
        Ok(post) => {
            info!(
                request_id = %request_id(&req),
                username = %user.username,
                post_id = %post.id,
                "post created"
            );
            Ok(redirect(&profile_url(&user.username)))
        }
        Err(DomainError::Validation(errors)) => {
            let page = form_page(&groups, form, None, errors).await?;
            Ok(HttpResponse::Ok().json(page))
        }
        Err(e) => Err(e),
    }
}

#[get("/posts/{id}/edit/", wrap = "LoginRequired")]
pub async fn edit_form(
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    groups: web::Data<GroupService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let post = posts.get_post(post_id).await?;
    if !can_edit(user.id, &post) {
        return Ok(redirect(&post_detail_url(post_id)));
    }

    let view = posts.get_view(post_id).await?;
    let form = PostForm::from_post(&post, view.group.map(|g| g.slug));
    let page = form_page(&groups, form, Some(post_id), FieldErrors::new()).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/posts/{id}/edit/", wrap = "LoginRequired")]
pub async fn edit_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    groups: web::Data<GroupService>,
    path: web::Path<Uuid>,
    payload: web::Json<PostForm>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let form = payload.into_inner();
    match posts.update_post(user.id, post_id, &form).await {
        Ok(EditOutcome::Updated(post)) => {
            info!(
                request_id = %request_id(&req),
                username = %user.username,
                post_id = %post.id,
                "post updated"
            );
            Ok(redirect(&post_detail_url(post_id)))
        }
        Ok(EditOutcome::NotAuthor(_)) => Ok(redirect(&post_detail_url(post_id))),
        Err(DomainError::Validation(errors)) => {
            let page = form_page(&groups, form, Some(post_id), errors).await?;
            Ok(HttpResponse::Ok().json(page))
        }
        Err(e) => Err(e),
    }
}

#[get("/follow/", wrap = "LoginRequired")]
pub async fn follow_index(
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let page_obj = posts.feed(user.id, query.number()).await?;
    Ok(HttpResponse::Ok().json(FollowPage { page_obj }))
}
