use anyhow::{Context, Result};
use std::str::FromStr;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub github_api_url: String,
    pub port: u16,
    pub rust_log: String,
    pub sync: SyncSettings,
}

/// Upper bound for `SYNC_SINCE_OVERLAP_HOURS`: one year.
pub const MAX_SINCE_OVERLAP_HOURS: i64 = 24 * 365;

/// Knobs for the sync engine. Defaults match a single-user deployment.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Upper bound on pages (100 records each) fetched per provider list call.
    pub max_pages: u32,
    /// Commit detail fetches allowed in flight at once for one sync.
    pub detail_concurrency: usize,
    /// How far before `last_synced` the incremental commit window starts.
    pub since_overlap_hours: i64,
    /// Run syncs inside the request instead of on a background task.
    pub inline: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_pages: 10,
            detail_concurrency: 4,
            since_overlap_hours: 24,
            inline: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = SyncSettings::default();

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            github_api_url: std::env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| "https://api.github.com".to_string()),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            sync: SyncSettings {
                max_pages: parse_env("SYNC_MAX_PAGES", defaults.max_pages)?.max(1),
                detail_concurrency: parse_env(
                    "SYNC_DETAIL_CONCURRENCY",
                    defaults.detail_concurrency,
                )?
                .max(1),
                since_overlap_hours: parse_env(
                    "SYNC_SINCE_OVERLAP_HOURS",
                    defaults.since_overlap_hours,
                )?
                .clamp(0, MAX_SINCE_OVERLAP_HOURS),
                inline: parse_env("SYNC_INLINE", defaults.inline)?,
            },
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u32 = parse_env("DEVSCOPE_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("DEVSCOPE_TEST_BAD_PORT", "eighty");
        let err = parse_env::<u16>("DEVSCOPE_TEST_BAD_PORT", 8080).unwrap_err();
        assert!(err.to_string().contains("DEVSCOPE_TEST_BAD_PORT"));
    }

    #[test]
    fn test_parse_env_bool() {
        std::env::set_var("DEVSCOPE_TEST_INLINE", "true");
        assert!(parse_env("DEVSCOPE_TEST_INLINE", false).unwrap());
    }
}
