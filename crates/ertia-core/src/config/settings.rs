//! Tunables read from `settings.toml`.

use std::path::Path;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::dns::DEFAULT_DOMAIN;
use crate::node::MAX_NODE_RETRIES;
use crate::project::{DEFAULT_PROVIDER, RESERVE_GRACE_HOURS};
use crate::store::json::DEFAULT_LOCK_TIMEOUT;

/// Longest accepted reservation grace period: one year.
pub const MAX_GRACE_HOURS: i64 = 24 * 366;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Hours a reservation is held before the project may be reclaimed.
    pub grace_hours: i64,
    /// Retry cap for nodes; one more retry past it marks the node failing.
    pub max_node_retries: u32,
    pub default_provider: String,
    pub default_domain: String,
    /// Seconds to wait for the store lock.
    pub lock_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            grace_hours: RESERVE_GRACE_HOURS,
            max_node_retries: MAX_NODE_RETRIES,
            default_provider: DEFAULT_PROVIDER.to_string(),
            default_domain: DEFAULT_DOMAIN.to_string(),
            lock_timeout_secs: DEFAULT_LOCK_TIMEOUT.as_secs(),
        }
    }
}

impl Settings {
    /// Grace period for reservations. Out-of-range values are clamped so the
    /// conversion cannot overflow; [`validate`](Self::validate) rejects them.
    pub fn grace_time(&self) -> chrono::Duration {
        chrono::Duration::hours(self.grace_hours.clamp(-MAX_GRACE_HOURS, MAX_GRACE_HOURS))
    }

    pub fn lock_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.lock_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.grace_hours <= 0 {
            anyhow::bail!("grace_hours must be positive, got {}", self.grace_hours);
        }
        if self.grace_hours > MAX_GRACE_HOURS {
            anyhow::bail!(
                "grace_hours must be at most {MAX_GRACE_HOURS}, got {}",
                self.grace_hours
            );
        }
        if self.default_provider.trim().is_empty() {
            anyhow::bail!("default_provider must not be empty");
        }
        if self.default_domain.trim().is_empty() {
            anyhow::bail!("default_domain must not be empty");
        }
        if self.lock_timeout_secs == 0 {
            anyhow::bail!("lock_timeout_secs must be at least 1");
        }
        Ok(())
    }
}

/// Load settings, falling back to defaults when the file does not exist.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
    parse_settings_str(&content)
        .with_context(|| format!("Failed to parse settings file: {}", path.display()))
}

pub fn parse_settings_str(content: &str) -> Result<Settings> {
    let settings: Settings =
        toml::from_str(content).map_err(|e| anyhow::anyhow!("TOML parsing error: {}", e))?;
    settings.validate()?;
    Ok(settings)
}

pub fn to_toml(settings: &Settings) -> Result<String> {
    toml::to_string_pretty(settings).with_context(|| "Failed to serialize settings to TOML")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_empty_settings() {
        let settings = parse_settings_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.grace_time(), chrono::Duration::hours(4));
        assert_eq!(settings.max_node_retries, 10);
    }

    #[test]
    fn test_parse_overrides() {
        let settings = parse_settings_str(
            r#"
grace_hours = 2
max_node_retries = 3
default_provider = "HETZNER"
"#,
        )
        .unwrap();
        assert_eq!(settings.grace_hours, 2);
        assert_eq!(settings.max_node_retries, 3);
        assert_eq!(settings.default_provider, "HETZNER");
        assert_eq!(settings.default_domain, DEFAULT_DOMAIN);
    }

    #[test]
    fn test_invalid_settings() {
        assert!(parse_settings_str("grace_hours = 0").is_err());
        assert!(parse_settings_str("default_provider = \" \"").is_err());
        assert!(parse_settings_str("unknown_key = 1").is_err());
    }

    #[test]
    fn test_grace_hours_upper_bound() {
        assert!(parse_settings_str(&format!("grace_hours = {MAX_GRACE_HOURS}")).is_ok());
        assert!(parse_settings_str("grace_hours = 100000000000").is_err());

        let unchecked = Settings {
            grace_hours: i64::MAX,
            ..Settings::default()
        };
        assert_eq!(
            unchecked.grace_time(),
            chrono::Duration::hours(MAX_GRACE_HOURS)
        );
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = load_settings(&temp.path().join("settings.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_toml_roundtrip() {
        let settings = Settings {
            grace_hours: 8,
            ..Settings::default()
        };
        let content = to_toml(&settings).unwrap();
        assert_eq!(parse_settings_str(&content).unwrap(), settings);
    }
}
