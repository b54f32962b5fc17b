// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, ScanError};
use crate::types::Quality;

/// Settings for a scan pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Quality used when a page request does not name one (0-100).
    pub default_quality: u8,
    /// Options handed to the default fetch collaborator.
    pub fetch: FetchConfig,
}

/// Options for the default image-fetch collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout for remote locators. `None` leaves the HTTP client's
    /// own policy in place.
    pub timeout_secs: Option<u64>,
    /// `User-Agent` sent with remote requests.
    pub user_agent: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            default_quality: Quality::MAX.value(),
            fetch: FetchConfig::default(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            user_agent: concat!("pagescan/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ScanConfig {
    /// Read a JSON configuration file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        info!(path = %path.display(), "scan config loaded");
        Ok(config)
    }

    /// Like [`ScanConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no scan config on disk, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Reject values no stage could honour.
    pub fn validate(&self) -> Result<()> {
        if self.default_quality > Quality::MAX.value() {
            return Err(ScanError::InvalidArgument(format!(
                "default_quality must be in 0..=100, got {}",
                self.default_quality
            )));
        }
        Ok(())
    }

    /// The configured default quality as a validated [`Quality`].
    pub fn default_quality(&self) -> Result<Quality> {
        Quality::new(i32::from(self.default_quality))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn defaults_are_full_quality_without_timeout() {
        let config = ScanConfig::default();
        assert_eq!(config.default_quality, 100);
        assert_eq!(config.fetch.timeout_secs, None);
        assert!(config.fetch.user_agent.starts_with("pagescan/"));
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        std::fs::write(&path, r#"{ "default_quality": 70 }"#).unwrap();

        let config = ScanConfig::load(&path).unwrap();
        assert_eq!(config.default_quality, 70);
        assert_eq!(config.fetch, FetchConfig::default());
    }

    #[test]
    fn out_of_range_quality_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        std::fs::write(&path, r#"{ "default_quality": 150 }"#).unwrap();

        let err = ScanConfig::load(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScanConfig::load_or_default(dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ScanConfig::default());
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = ScanConfig::load(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
