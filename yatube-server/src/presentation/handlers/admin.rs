use crate::application::auth_service::AuthService;
use crate::application::group_service::GroupService;
use crate::application::post_service::PostService;
use crate::domain::error::DomainError;
use crate::infrastructure::cache::PageCache;
use crate::presentation::dto::CreateGroupRequest;
use actix_web::{HttpResponse, delete, get, post, web};
use tracing::info;
use uuid::Uuid;

/// Registered under `/admin`, behind `AdminGuard`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_groups)
        .service(create_group)
        .service(delete_group)
        .service(delete_post)
        .service(delete_user)
        .service(clear_cache);
}

#[get("/groups/")]
async fn list_groups(groups: web::Data<GroupService>) -> Result<HttpResponse, DomainError> {
    Ok(HttpResponse::Ok().json(groups.list().await?))
}

#[post("/groups/")]
async fn create_group(
    groups: web::Data<GroupService>,
    payload: web::Json<CreateGroupRequest>,
) -> Result<HttpResponse, DomainError> {
    let CreateGroupRequest {
        title,
        slug,
        description,
    } = payload.into_inner();
    let group = groups.create(title, slug, description).await?;
    Ok(HttpResponse::Created().json(group))
}

#[delete("/groups/{slug}/")]
async fn delete_group(
    groups: web::Data<GroupService>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    groups.delete(&path).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[delete("/posts/{id}/")]
async fn delete_post(
    posts: web::Data<PostService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    posts.delete_post(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[delete("/users/{username}/")]
async fn delete_user(
    auth: web::Data<AuthService>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    auth.delete_user(&path).await?;
    info!(username = %path, "user deleted by admin");
    Ok(HttpResponse::NoContent().finish())
}

#[post("/cache/clear/")]
async fn clear_cache(cache: web::Data<PageCache>) -> HttpResponse {
    cache.clear();
    HttpResponse::NoContent().finish()
}
