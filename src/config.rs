use anyhow::Context;
use serde::Deserialize;

/// Admin session cookie settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub secure_cookie: bool,
}

/// Superuser created at startup when no account with this email exists.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub session: SessionConfig,
    pub admin_seed: Option<AdminSeed>,
}

/// Thirty days; longer admin sessions are cut down to this.
pub const MAX_SESSION_TTL_MINUTES: i64 = 60 * 24 * 30;

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let session = SessionConfig {
            secret: std::env::var("SESSION_SECRET").context("SESSION_SECRET must be set")?,
            issuer: std::env::var("SESSION_ISSUER").unwrap_or_else(|_| "userbase".into()),
            audience: std::env::var("SESSION_AUDIENCE").unwrap_or_else(|_| "userbase-admin".into()),
            ttl_minutes: std::env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(120)
                .clamp(1, MAX_SESSION_TTL_MINUTES),
            secure_cookie: std::env::var("SESSION_SECURE_COOKIE")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        };

        let admin_seed = match (std::env::var("ADMIN_EMAIL"), std::env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) if !email.trim().is_empty() => Some(AdminSeed { email, password }),
            _ => None,
        };

        Ok(Self {
            database_url,
            max_connections,
            session,
            admin_seed,
        })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
