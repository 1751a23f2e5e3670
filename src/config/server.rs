use std::env;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub env: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 4000,
            env: "development".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4000),
            env: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }
}
