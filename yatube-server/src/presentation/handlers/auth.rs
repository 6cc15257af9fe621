use crate::application::auth_service::AuthService;
use crate::domain::error::DomainError;
use crate::presentation::dto::{AuthResponse, LoginFormPage, LoginQuery, LoginRequest, RegisterRequest};
use actix_web::{HttpResponse, Scope, get, post, web};
use tracing::info;

pub fn scope() -> Scope {
    web::scope("/auth")
        .service(signup)
        .service(login_form)
        .service(login)
}

#[post("/signup/")]
async fn signup(
    service: web::Data<AuthService>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, DomainError> {
    let RegisterRequest {
        username,
        email,
        password,
    } = payload.into_inner();

    let user = service.register(username, email, password.clone()).await?;
    info!(user_id = %user.id, username = %user.username, "user registered");

    let jwt = service.login(&user.username, &password).await?;

    Ok(HttpResponse::Created().json(AuthResponse {
        access_token: jwt,
        expires_in: service.keys().ttl_secs(),
        token_type: "Bearer".to_string(),
    }))
}

#[get("/login/")]
async fn login_form(query: web::Query<LoginQuery>) -> HttpResponse {
    HttpResponse::Ok().json(LoginFormPage {
        fields: ["username", "password"],
        next: query.into_inner().next,
    })
}

#[post("/login/")]
async fn login(
    service: web::Data<AuthService>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, DomainError> {
    let jwt = service.login(&payload.username, &payload.password).await?;

    info!(username = %payload.username, "user logged in");

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: jwt,
        expires_in: service.keys().ttl_secs(),
        token_type: "Bearer".to_string(),
    }))
}
