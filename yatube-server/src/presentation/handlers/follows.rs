use crate::application::follow_service::FollowService;
use crate::domain::error::DomainError;
use crate::presentation::middleware::LoginRequired;
use crate::presentation::utils::{AuthenticatedUser, profile_url, redirect};
use actix_web::{HttpResponse, get, web};

#[get("/profile/{username}/follow/", wrap = "LoginRequired")]
pub async fn profile_follow(
    user: AuthenticatedUser,
    follows: web::Data<FollowService>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    follows.follow(user.id, &path).await?;
    Ok(redirect(&profile_url(&path)))
}

#[get("/profile/{username}/unfollow/", wrap = "LoginRequired")]
pub async fn profile_unfollow(
    user: AuthenticatedUser,
    follows: web::Data<FollowService>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    follows.unfollow(user.id, &path).await?;
    Ok(redirect(&profile_url(&path)))
}
