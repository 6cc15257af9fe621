use actix_web::{HttpRequest, HttpResponse};

use crate::presentation::dto::NotFoundPage;

pub mod admin;
pub mod auth;
pub mod comments;
pub mod follows;
pub mod posts;

/// Fallback for every unmatched path.
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(NotFoundPage {
        error: "page not found",
        path: req.path(),
    })
}
