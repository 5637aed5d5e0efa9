// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CheckinError, Result};
use crate::types::{DEFAULT_SEARCH_REGIONS, ImageRegion};

/// Tunables for the document scan pipeline.
///
/// Every field has a default, so a JSON file only needs the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Barcode search regions tried after the full image, in priority order.
    pub regions: Vec<ImageRegion>,
    /// Contrast level for the last-chance contrast-stretched variant.
    pub contrast_level: f32,
    /// Accept records that fail the usability check instead of flagging
    /// them as rejected.
    pub accept_incomplete_records: bool,
    /// Repair birth dates written as `0YYY-MM-DD` to `1YYY-MM-DD` on review.
    pub repair_leading_zero_year: bool,
    /// Wall-clock limit for background scans (no limit when unset).
    pub timeout_secs: Option<u64>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            regions: DEFAULT_SEARCH_REGIONS.to_vec(),
            contrast_level: 1.5,
            accept_incomplete_records: true,
            repair_leading_zero_year: true,
            timeout_secs: None,
        }
    }
}

impl ScanConfig {
    /// Load a config from a JSON file, filling missing keys with defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the contrast formula blow up.
    ///
    /// The contrast factor divides by `259 - level`, so the level must stay
    /// inside `(-255, 259)`.
    pub fn validate(&self) -> Result<()> {
        if !self.contrast_level.is_finite()
            || self.contrast_level <= -255.0
            || self.contrast_level >= 259.0
        {
            return Err(CheckinError::Config(format!(
                "contrast_level must lie in (-255, 259), got {}",
                self.contrast_level
            )));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_layout() {
        let config = ScanConfig::default();
        assert_eq!(config.regions.len(), 4);
        assert_eq!(config.contrast_level, 1.5);
        assert!(config.accept_incomplete_records);
        assert!(config.timeout().is_none());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "accept_incomplete_records": false, "timeout_secs": 20 }}"#).unwrap();

        let config = ScanConfig::from_json_file(file.path()).unwrap();
        assert!(!config.accept_incomplete_records);
        assert_eq!(config.timeout(), Some(Duration::from_secs(20)));
        assert_eq!(config.regions.len(), 4);
        assert_eq!(config.contrast_level, 1.5);
    }

    #[test]
    fn out_of_range_contrast_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "contrast_level": 259.0 }}"#).unwrap();

        let err = ScanConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, CheckinError::Config(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ScanConfig::from_json_file("/nonexistent/scan-config.json").unwrap_err();
        assert!(matches!(err, CheckinError::Io(_)));
    }
}
