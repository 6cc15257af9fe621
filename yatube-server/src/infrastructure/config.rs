use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Unset runs the server on the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub cors_origins: Vec<String>,
    pub page_cache_ttl: Duration,
    /// Unset disables the admin endpoints.
    pub admin_token: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".into());
        let port = lookup("PORT")
            .unwrap_or_else(|| "8080".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PORT: {}", e))?;
        let database_url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty());
        let jwt_secret = lookup("JWT_SECRET").ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set"))?;
        let token_ttl_secs = lookup("TOKEN_TTL_SECS")
            .unwrap_or_else(|| "3600".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid TOKEN_TTL_SECS: {}", e))?;
        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let page_cache_secs: u64 = lookup("PAGE_CACHE_TTL_SECS")
            .unwrap_or_else(|| "20".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PAGE_CACHE_TTL_SECS: {}", e))?;
        let admin_token = lookup("ADMIN_TOKEN").filter(|s| !s.is_empty());

        Ok(Self {
            host,
            port,
            database_url,
            jwt_secret,
            token_ttl_secs,
            cors_origins,
            page_cache_ttl: Duration::from_secs(page_cache_secs),
            admin_token,
        })
    }
}
