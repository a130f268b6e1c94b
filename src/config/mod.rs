use std::env;

/// Runtime configuration for sessions, pagination and the HTTP layer
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HMAC secret for access tokens (Required in production)
    pub access_token_secret: String,

    /// Access token lifetime in minutes (default: 15)
    pub access_token_expiry_minutes: i64,

    /// HMAC secret for refresh tokens, must differ from the access secret
    pub refresh_token_secret: String,

    /// Refresh token lifetime in days (default: 10)
    pub refresh_token_expiry_days: i64,

    /// Mark auth cookies `Secure` (default: true)
    pub cookie_secure: bool,

    /// Page size used when the client sends no `limit` (default: 10)
    pub default_page_size: u64,

    /// Upper bound for `limit` (default: 100)
    pub max_page_size: u64,

    /// Per-request deadline in seconds (default: 30)
    pub request_timeout_secs: u64,

    /// Allowed CORS Origins (comma separated)
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            access_token_secret: "access-secret".to_string(),
            access_token_expiry_minutes: 15,
            refresh_token_secret: "refresh-secret".to_string(),
            refresh_token_expiry_days: 10,
            cookie_secure: true,
            default_page_size: 10,
            max_page_size: 100,
            request_timeout_secs: 30,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(), // Vite default
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            access_token_secret: env::var("ACCESS_TOKEN_SECRET")
                .unwrap_or(default.access_token_secret), // dev fallback, enforced by production()
            access_token_expiry_minutes: parse_env(
                "ACCESS_TOKEN_EXPIRY_MINUTES",
                default.access_token_expiry_minutes,
            ),
            refresh_token_secret: env::var("REFRESH_TOKEN_SECRET")
                .unwrap_or(default.refresh_token_secret),
            refresh_token_expiry_days: parse_env(
                "REFRESH_TOKEN_EXPIRY_DAYS",
                default.refresh_token_expiry_days,
            ),
            cookie_secure: env::var("COOKIE_SECURE")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(default.cookie_secure),
            default_page_size: parse_env("DEFAULT_PAGE_SIZE", default.default_page_size),
            max_page_size: parse_env("MAX_PAGE_SIZE", default.max_page_size),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", default.request_timeout_secs),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),
        }
    }

    /// Create config for development and tests (plain-http cookies)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::default()
        }
    }

    /// Create config for production. Both secrets must be set and distinct.
    pub fn production() -> anyhow::Result<Self> {
        let access_token_secret = env::var("ACCESS_TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("CRITICAL: ACCESS_TOKEN_SECRET must be set"))?;
        let refresh_token_secret = env::var("REFRESH_TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("CRITICAL: REFRESH_TOKEN_SECRET must be set"))?;

        if access_token_secret == refresh_token_secret {
            anyhow::bail!("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ");
        }

        Ok(Self {
            access_token_secret,
            refresh_token_secret,
            cookie_secure: true,
            ..Self::from_env()
        })
    }
}
