//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (CENSUS_*, plus the legacy NOMIS_UID)
//! 2. TOML config file (if CENSUS_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod profile;
mod validation;

pub use profile::{DEFAULT_GEOGRAPHY_TYPES, TableSelection, YearProfile};
pub use validation::ConfigError;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API credential appended to data requests.
    ///
    /// Set via CENSUS_UID or NOMIS_UID. Required only for data requests.
    #[serde(default)]
    pub uid: Option<String>,

    /// Root of the remote API.
    ///
    /// Set via CENSUS_BASE_URL environment variable.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path to the SQLite response cache.
    ///
    /// Set via CENSUS_CACHE_DB_PATH environment variable.
    #[serde(default = "default_cache_db_path")]
    pub cache_db_path: PathBuf,

    /// Path to the SQLite census store.
    ///
    /// Set via CENSUS_CENSUS_DB_PATH environment variable.
    #[serde(default = "default_census_db_path")]
    pub census_db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes accepted per response.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Rows requested per data page.
    #[serde(default = "default_record_limit")]
    pub record_limit: u64,

    /// Per-year load profiles, processed in order.
    #[serde(default = "YearProfile::defaults")]
    pub profiles: Vec<YearProfile>,
}

fn default_base_url() -> String {
    "https://www.nomisweb.co.uk/api/v01".into()
}

fn default_cache_db_path() -> PathBuf {
    PathBuf::from("./cache/cache.db")
}

fn default_census_db_path() -> PathBuf {
    PathBuf::from("./big-census.db")
}

fn default_user_agent() -> String {
    "census-load/0.1".into()
}

fn default_timeout_ms() -> u64 {
    300_000
}

fn default_max_bytes() -> usize {
    256 * 1024 * 1024
}

fn default_record_limit() -> u64 {
    100_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            uid: None,
            base_url: default_base_url(),
            cache_db_path: default_cache_db_path(),
            census_db_path: default_census_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            record_limit: default_record_limit(),
            profiles: YearProfile::defaults(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `CENSUS_`
    /// 2. `NOMIS_UID` for the credential
    /// 3. TOML file from `CENSUS_CONFIG_FILE` (if set)
    /// 4. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be read, or
    /// validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("CENSUS_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment
            .merge(Env::raw().only(&["NOMIS_UID"]).map(|_| "uid".into()))
            .merge(
                Env::prefixed("CENSUS_")
                    .ignore(&["CONFIG_FILE"])
                    .map(|key| key.as_str().to_lowercase().into())
                    .split("__"),
            );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// The API credential, checked before any data request is issued.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no non-empty credential is set.
    pub fn require_uid(&self) -> Result<&str, ConfigError> {
        self.uid.as_deref().filter(|uid| !uid.trim().is_empty()).ok_or_else(|| ConfigError::Missing {
            field: "uid".into(),
            hint: "Set the NOMIS_UID (or CENSUS_UID) environment variable".into(),
        })
    }

    /// Profiles restricted to `years`; an empty filter keeps them all.
    pub fn profiles_for(&self, years: &[i32]) -> Vec<&YearProfile> {
        self.profiles
            .iter()
            .filter(|p| years.is_empty() || years.contains(&p.year))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.base_url, "https://www.nomisweb.co.uk/api/v01");
        assert_eq!(config.cache_db_path, PathBuf::from("./cache/cache.db"));
        assert_eq!(config.census_db_path, PathBuf::from("./big-census.db"));
        assert_eq!(config.record_limit, 100_000);
        assert_eq!(config.profiles.len(), 2);
        assert!(config.uid.is_none());
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(300_000));
    }

    #[test]
    fn test_require_uid_missing() {
        let config = AppConfig::default();
        assert!(matches!(config.require_uid(), Err(ConfigError::Missing { .. })));

        let blank = AppConfig { uid: Some("  ".into()), ..Default::default() };
        assert!(matches!(blank.require_uid(), Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_require_uid_present() {
        let config = AppConfig { uid: Some("0x1234".into()), ..Default::default() };
        assert_eq!(config.require_uid().unwrap(), "0x1234");
    }

    #[test]
    fn test_profiles_for() {
        let config = AppConfig::default();
        assert_eq!(config.profiles_for(&[]).len(), 2);
        let only = config.profiles_for(&[1991]);
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].year, 1991);
        assert!(config.profiles_for(&[2011]).is_empty());
    }

    #[test]
    fn test_load_layers() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "census.toml",
                r#"
                record_limit = 500
                [[profiles]]
                year = 2011
                chunk_size = 20
                "#,
            )?;
            jail.set_env("CENSUS_CONFIG_FILE", "census.toml");
            jail.set_env("NOMIS_UID", "legacy-uid");
            jail.set_env("CENSUS_CENSUS_DB_PATH", "out.db");

            let config = AppConfig::load().expect("config loads");
            assert_eq!(config.record_limit, 500);
            assert_eq!(config.profiles.len(), 1);
            assert_eq!(config.profiles[0].chunk_size, 20);
            assert_eq!(config.uid.as_deref(), Some("legacy-uid"));
            assert_eq!(config.census_db_path, PathBuf::from("out.db"));

            jail.set_env("CENSUS_UID", "preferred-uid");
            let config = AppConfig::load().expect("config loads");
            assert_eq!(config.uid.as_deref(), Some("preferred-uid"));
            Ok(())
        });
    }
}
