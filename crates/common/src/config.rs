use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Port the ingest API listens on (default: 3000)
    pub api_port: u16,

    /// Redis connection string; when unset, pending sets are held in memory
    pub redis_url: Option<String>,

    /// Webhook URL that due notifications are POSTed to
    pub delivery_webhook_url: Option<String>,

    /// Per-send timeout for webhook delivery, in seconds (default: 10)
    pub delivery_timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("API_PORT must be a valid u16"))?,
            redis_url: std::env::var("REDIS_URL").ok(),
            delivery_webhook_url: std::env::var("DELIVERY_WEBHOOK_URL").ok(),
            delivery_timeout_secs: std::env::var("DELIVERY_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DELIVERY_TIMEOUT_SECS must be a valid u64"))?,
        })
    }
}
