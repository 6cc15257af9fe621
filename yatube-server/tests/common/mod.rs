#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use yatube_server::data::memory::MemoryStore;
use yatube_server::domain::group::Group;
use yatube_server::domain::post::Post;
use yatube_server::domain::user::User;
use yatube_server::infrastructure::cache::PageCache;
use yatube_server::infrastructure::security::JwtKeys;
use yatube_server::presentation::dto::PostForm;
use yatube_server::server::Services;

pub const ADMIN_TOKEN: &str = "admin-secret";

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub services: Services,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let services = Services::in_memory(
            store.clone(),
            JwtKeys::new("test-secret".into(), 3600),
            PageCache::new(Duration::from_secs(60)),
        );
        Self { store, services }
    }

    /// Registers a user and returns it with a bearer header value.
    pub async fn user(&self, name: &str) -> (User, String) {
        let user = self
            .services
            .auth
            .register(name.into(), format!("{name}@example.com"), "password123".into())
            .await
            .expect("register");
        let token = self
            .services
            .auth
            .login(name, "password123")
            .await
            .expect("login");
        (user, format!("Bearer {token}"))
    }

    pub async fn group(&self, title: &str, slug: &str) -> Group {
        self.services
            .groups
            .create(title.into(), slug.into(), "description".into())
            .await
            .expect("group")
    }

    pub async fn post(&self, author: &User, text: &str, group: Option<&str>) -> Post {
        self.services
            .posts
            .create_post(
                author.id,
                &PostForm {
                    text: text.into(),
                    group: group.map(str::to_owned),
                    image: None,
                },
            )
            .await
            .expect("post")
    }
}

/// Builds the full application over the harness services.
#[macro_export]
macro_rules! init_app {
    ($harness:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(yatube_server::presentation::middleware::IdentityMiddleware::new(
                    $harness.services.auth.clone(),
                ))
                .configure(yatube_server::server::configure(
                    $harness.services.clone(),
                    Some($crate::common::ADMIN_TOKEN.to_string()),
                )),
        )
        .await
    };
}

pub fn location(resp: &actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>) -> String {
    resp.headers()
        .get(actix_web::http::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
