//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use std::collections::HashSet;

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `base_url` is not an http(s) URL
    /// - `max_bytes` is 0 or exceeds 1GB
    /// - `timeout_ms` is less than 100ms or exceeds 30 minutes
    /// - `user_agent` is empty
    /// - `record_limit` is 0
    /// - a profile has a zero chunk size, no shapes or no geography types
    /// - a qualifier shape has no pinned value, or a pin matches no qualifier shape
    /// - two profiles share a year
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(invalid("base_url", "must be an http(s) URL"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 1024 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 1GB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 1_800_000 {
            return Err(invalid("timeout_ms", "must not exceed 30 minutes (1800000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.record_limit == 0 {
            return Err(invalid("record_limit", "must be greater than 0"));
        }

        let mut years = HashSet::new();
        for profile in &self.profiles {
            let field = format!("profiles[{}]", profile.year);
            if !years.insert(profile.year) {
                return Err(invalid(field, "duplicate year"));
            }
            if profile.chunk_size == 0 {
                return Err(invalid(format!("{field}.chunk_size"), "must be greater than 0"));
            }
            if profile.shapes.is_empty() {
                return Err(invalid(format!("{field}.shapes"), "must list at least one shape"));
            }
            if profile.geography_types.trim().is_empty() {
                return Err(invalid(format!("{field}.geography_types"), "must not be empty"));
            }
            for qualifier in profile.shapes.iter().filter_map(|s| s.qualifier.as_deref()) {
                if profile.qualifier_pin(qualifier).is_none() {
                    return Err(invalid(
                        format!("{field}.extra_params"),
                        format!("qualifier {qualifier} needs a pinned value"),
                    ));
                }
            }
            for key in profile.extra_params.keys() {
                let pins_a_shape = profile
                    .shapes
                    .iter()
                    .filter_map(|s| s.qualifier.as_deref())
                    .any(|q| q.eq_ignore_ascii_case(key));
                if !pins_a_shape {
                    return Err(invalid(format!("{field}.extra_params.{key}"), "does not match any qualifier shape"));
                }
            }
        }

        if self.profiles.is_empty() {
            tracing::warn!("no year profiles configured; nothing will be loaded");
        }

        Ok(())
    }
}
