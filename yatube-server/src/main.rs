use std::sync::Arc;

use tracing::{info, warn};
use yatube_server::data::memory::MemoryStore;
use yatube_server::infrastructure::cache::PageCache;
use yatube_server::infrastructure::config::AppConfig;
use yatube_server::infrastructure::database::{create_pool, run_migrations};
use yatube_server::infrastructure::logging::init_logging;
use yatube_server::infrastructure::security::JwtKeys;
use yatube_server::server::{Services, start_rest_server};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::from_env()?;
    let keys = JwtKeys::new(config.jwt_secret.clone(), config.token_ttl_secs);
    let page_cache = PageCache::new(config.page_cache_ttl);

    let services = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            run_migrations(&pool).await?;
            Services::postgres(pool, keys, page_cache)
        }
        None => {
            warn!("DATABASE_URL not set, using the in-memory store");
            Services::in_memory(Arc::new(MemoryStore::new()), keys, page_cache)
        }
    };

    if config.admin_token.is_none() {
        info!("ADMIN_TOKEN not set, admin endpoints are disabled");
    }

    start_rest_server(config, services).await
}
