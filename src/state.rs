use std::sync::Arc;

use sqlx::PgPool;

use crate::config::cors::CorsConfig;
use crate::config::database::init_db_pool;
use crate::config::email::EmailConfig;
use crate::config::rate_limit::RateLimitConfig;
use crate::config::server::ServerConfig;
use crate::middleware::rate_limit::ClientRegistry;
use crate::utils::email::Mailer;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub env: String,
    pub mailer: Mailer,
    pub cors_config: CorsConfig,
    pub limiter: Arc<ClientRegistry>,
}

pub async fn init_app_state() -> AppState {
    let limiter = ClientRegistry::new(RateLimitConfig::from_env());
    limiter.spawn_eviction();

    AppState {
        db: init_db_pool().await,
        env: ServerConfig::from_env().env,
        mailer: Mailer::new(EmailConfig::from_env()),
        cors_config: CorsConfig::from_env(),
        limiter,
    }
}
