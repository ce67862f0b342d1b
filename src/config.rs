use std::env;
use std::net::SocketAddr;
use anyhow::{Context, Result};
use zeroize::{Zeroize, Zeroizing};

/// Length in bytes of the token signing key.
pub const SIGNING_KEY_LEN: usize = 32;

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The key used to sign session tokens.
    pub signing_key: Zeroizing<Vec<u8>>,
    /// The URL of the Redis server. The in-memory store is used when unset.
    pub redis_url: Option<String>,
    /// The address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// The duration of a regular session in days.
    pub session_duration_days: i64,
    /// The duration of a "remember me" session in days.
    pub remember_me_duration_days: i64,
    /// The interval between activity refresh ticks, in seconds.
    pub activity_refresh_secs: u64,
    /// Artificial delay applied to mock backend calls, in milliseconds.
    pub mock_latency_ms: u64,
    /// Email of the seeded demo account.
    pub demo_email: String,
    /// Password of the seeded demo account.
    pub demo_password: Zeroizing<String>,
    /// Whether cookies are marked `Secure`.
    pub production: bool,
}

impl Config {
    /// Creates a `Config` with default settings around the given signing key.
    pub fn new(signing_key: Vec<u8>) -> Result<Self> {
        if signing_key.len() != SIGNING_KEY_LEN {
            anyhow::bail!("SIGNING_KEY must be exactly 32 bytes (64 hex characters)");
        }

        Ok(Self {
            signing_key: Zeroizing::new(signing_key),
            redis_url: None,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            session_duration_days: 1,
            remember_me_duration_days: 30,
            activity_refresh_secs: 300,
            mock_latency_ms: 1000,
            demo_email: "demo@example.com".to_string(),
            demo_password: Zeroizing::new("password123".to_string()),
            production: false,
        })
    }

    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let mut signing_key_hex = env::var("SIGNING_KEY")
            .context("SIGNING_KEY must be set (generate with: openssl rand -hex 32)")?;

        let signing_key_bytes = hex::decode(&signing_key_hex)
            .context("SIGNING_KEY must be valid hexadecimal")?;

        signing_key_hex.zeroize();

        let mut config = Self::new(signing_key_bytes)?;

        config.redis_url = env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty());
        config.bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .context("Invalid BIND_ADDR")?;
        config.session_duration_days = env::var("SESSION_DURATION_DAYS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .context("Invalid SESSION_DURATION_DAYS")?;
        config.remember_me_duration_days = env::var("REMEMBER_ME_DURATION_DAYS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("Invalid REMEMBER_ME_DURATION_DAYS")?;
        config.activity_refresh_secs = env::var("ACTIVITY_REFRESH_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .context("Invalid ACTIVITY_REFRESH_SECS")?;
        config.mock_latency_ms = env::var("MOCK_LATENCY_MS")
            .unwrap_or_else(|_| "1000".to_string())
            .parse()
            .context("Invalid MOCK_LATENCY_MS")?;

        if let Ok(email) = env::var("DEMO_EMAIL") {
            config.demo_email = email;
        }
        if let Ok(password) = env::var("DEMO_PASSWORD") {
            config.demo_password = Zeroizing::new(password);
        }

        config.production = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            == "production";

        if config.session_duration_days <= 0 || config.remember_me_duration_days <= 0 {
            anyhow::bail!("Session durations must be positive");
        }
        if config.activity_refresh_secs == 0 {
            anyhow::bail!("ACTIVITY_REFRESH_SECS must be greater than 0");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_signing_key() {
        assert!(Config::new(vec![0u8; 16]).is_err());
    }

    #[test]
    fn defaults_match_portal_durations() {
        let config = Config::new(vec![7u8; SIGNING_KEY_LEN]).unwrap();
        assert_eq!(config.session_duration_days, 1);
        assert_eq!(config.remember_me_duration_days, 30);
        assert_eq!(config.activity_refresh_secs, 300);
        assert_eq!(config.demo_email, "demo@example.com");
        assert!(config.redis_url.is_none());
    }
}
