use crate::application::comment_service::CommentService;
use crate::application::post_service::PostService;
use crate::domain::error::DomainError;
use crate::presentation::dto::CommentForm;
use crate::presentation::handlers::posts::detail_page;
use crate::presentation::middleware::LoginRequired;
use crate::presentation::utils::{AuthenticatedUser, post_detail_url, redirect, request_id};
use actix_web::{HttpRequest, HttpResponse, post, web};
use tracing::info;
use uuid::Uuid;

#[post("/posts/{id}/comment/", wrap = "LoginRequired")]
pub async fn add_comment(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    comments: web::Data<CommentService>,
    path: web::Path<Uuid>,
    payload: web::Json<CommentForm>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let form = payload.into_inner();

    match comments
        .add_comment(post_id, user.id, form.text.as_deref())
        .await
    {
        Ok(comment) => {
            info!(
                request_id = %request_id(&req),
                username = %user.username,
                comment_id = %comment.id,
                "comment added"
            );
            Ok(redirect(&post_detail_url(post_id)))
        }
        Err(DomainError::Validation(errors)) => {
            let page = detail_page(&posts, &comments, post_id, Some(&user), form, errors).await?;
            Ok(HttpResponse::Ok().json(page))
        }
        Err(e) => Err(e),
    }
}
