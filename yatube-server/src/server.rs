use crate::application::auth_service::AuthService;
use crate::application::comment_service::CommentService;
use crate::application::follow_service::FollowService;
use crate::application::group_service::GroupService;
use crate::application::post_service::PostService;
use crate::data::comment_repository::{CommentRepository, PostgresCommentRepository};
use crate::data::follow_repository::{FollowRepository, PostgresFollowRepository};
use crate::data::group_repository::{GroupRepository, PostgresGroupRepository};
use crate::data::memory::MemoryStore;
use crate::data::post_repository::{PostRepository, PostgresPostRepository};
use crate::data::user_repository::{PostgresUserRepository, UserRepository};
use crate::infrastructure::cache::PageCache;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::security::JwtKeys;
use crate::presentation::handlers;
use crate::presentation::middleware::{AdminGuard, IdentityMiddleware, RequestTrace};
use actix_cors::Cors;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

/// Everything the handlers pull out of app data.
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub posts: PostService,
    pub comments: CommentService,
    pub follows: FollowService,
    pub groups: GroupService,
    pub page_cache: PageCache,
}

impl Services {
    pub fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        groups: Arc<dyn GroupRepository>,
        comments: Arc<dyn CommentRepository>,
        follows: Arc<dyn FollowRepository>,
        keys: JwtKeys,
        page_cache: PageCache,
    ) -> Self {
        Self {
            auth: AuthService::new(Arc::clone(&users), keys),
            posts: PostService::new(
                Arc::clone(&posts),
                Arc::clone(&users),
                Arc::clone(&groups),
                Arc::clone(&follows),
            ),
            comments: CommentService::new(comments, Arc::clone(&posts)),
            follows: FollowService::new(follows, users),
            groups: GroupService::new(groups),
            page_cache,
        }
    }

    pub fn postgres(pool: PgPool, keys: JwtKeys, page_cache: PageCache) -> Self {
        Self::new(
            Arc::new(PostgresUserRepository::new(pool.clone())),
            Arc::new(PostgresPostRepository::new(pool.clone())),
            Arc::new(PostgresGroupRepository::new(pool.clone())),
            Arc::new(PostgresCommentRepository::new(pool.clone())),
            Arc::new(PostgresFollowRepository::new(pool)),
            keys,
            page_cache,
        )
    }

    pub fn in_memory(store: Arc<MemoryStore>, keys: JwtKeys, page_cache: PageCache) -> Self {
        Self::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            keys,
            page_cache,
        )
    }
}

/// Registers app data, every route and the not-found fallback.
pub fn configure(
    services: Services,
    admin_token: Option<String>,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(services.auth))
            .app_data(web::Data::new(services.posts))
            .app_data(web::Data::new(services.comments))
            .app_data(web::Data::new(services.follows))
            .app_data(web::Data::new(services.groups))
            .app_data(web::Data::new(services.page_cache))
            .route("/health", web::get().to(health))
            .service(handlers::auth::scope())
            .service(
                web::scope("/admin")
                    .wrap(AdminGuard::new(admin_token))
                    .configure(handlers::admin::configure),
            )
            .service(handlers::posts::index)
            .service(handlers::posts::group_posts)
            .service(handlers::posts::profile)
            .service(handlers::posts::post_detail)
            .service(handlers::posts::create_form)
            .service(handlers::posts::create_post)
            .service(handlers::posts::edit_form)
            .service(handlers::posts::edit_post)
            .service(handlers::posts::follow_index)
            .service(handlers::comments::add_comment)
            .service(handlers::follows::profile_follow)
            .service(handlers::follows::profile_unfollow)
            .default_service(web::to(handlers::not_found));
    }
}

pub async fn start_rest_server(config: AppConfig, services: Services) -> anyhow::Result<()> {
    let bind_address = (config.host.clone(), config.port);

    info!(
        host = %bind_address.0,
        port = bind_address.1,
        "HTTP server starting"
    );

    HttpServer::new(move || {
        let cors = build_cors(&config);

        App::new()
            .wrap(IdentityMiddleware::new(services.auth.clone()))
            .wrap(RequestTrace)
            .wrap(Logger::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("Referrer-Policy", "no-referrer"))
                    .add(("Permissions-Policy", "geolocation=()"))
                    .add(("Cross-Origin-Opener-Policy", "same-origin")),
            )
            .wrap(cors)
            .configure(configure(services.clone(), config.admin_token.clone()))
    })
    .bind(bind_address)?
    .run()
    .await
    .map_err(anyhow::Error::new)?;

    Ok(())
}

fn build_cors(config: &AppConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "DELETE"])
        .allowed_headers(vec![
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::AUTHORIZATION,
        ])
        .supports_credentials()
        .max_age(3600);

    for origin in &config.cors_origins {
        cors = if origin == "*" {
            cors.allow_any_origin()
        } else {
            cors.allowed_origin(origin)
        };
    }

    cors
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}
