// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand implementations. Each returns data; printing and exit codes are
// decided in `main`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use checkin_core::error::Result;
use checkin_core::{IdentityFields, ScanConfig, ScanResult};
use checkin_scan::{
    DniScanner, ImageProcessor, NoTextRecognizer, Pdf417Decoder, RecordPolicy, RecordReview,
    ScanObserver, ScanStatus, ScanStrategy, TextRecognizer, scan_in_background,
};
use clap::ValueEnum;
use image::DynamicImage;
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Which side of the card a photograph shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Side {
    /// Printed data only.
    Front,
    /// Carries the PDF417 barcode.
    Back,
}

impl Side {
    pub fn strategy(self) -> ScanStrategy {
        match self {
            Self::Front => ScanStrategy::OcrOnly,
            Self::Back => ScanStrategy::Full,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub image: PathBuf,
    pub side: Side,
    pub config: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub models: Option<PathBuf>,
}

/// A reviewed record as printed by `review`.
#[derive(Debug, Serialize)]
pub struct ReviewReport {
    pub fields: IdentityFields,
    pub review: RecordReview,
}

pub fn load_config(path: Option<&Path>) -> Result<ScanConfig> {
    match path {
        Some(path) => ScanConfig::from_json_file(path),
        None => Ok(ScanConfig::default()),
    }
}

/// Load the photograph and scan it with a timeout from the flag or config.
#[instrument(skip_all, fields(image = %request.image.display(), side = ?request.side))]
pub async fn scan(request: &ScanRequest) -> Result<ScanResult> {
    let config = load_config(request.config.as_deref())?;
    let timeout = request
        .timeout_secs
        .map(Duration::from_secs)
        .or_else(|| config.timeout());
    let image = ImageProcessor::open(&request.image)?.into_dynamic();
    let strategy = request.side.strategy();

    #[cfg(feature = "ocr")]
    if let Some(engine) = load_ocr(request.models.as_deref()) {
        return Ok(run_scan(engine, &config, image, strategy, timeout).await);
    }

    #[cfg(not(feature = "ocr"))]
    if request.models.is_some() {
        warn!("Built without the `ocr` feature; ignoring --models");
    }

    if strategy == ScanStrategy::OcrOnly {
        warn!("No OCR engine available; the front of the card cannot be read");
    }
    Ok(run_scan(NoTextRecognizer, &config, image, strategy, timeout).await)
}

#[cfg(feature = "ocr")]
fn load_ocr(models: Option<&Path>) -> Option<checkin_scan::OcrEngine> {
    let loaded = match models {
        Some(dir) => checkin_scan::OcrEngine::from_model_dir(dir),
        None => checkin_scan::OcrEngine::with_defaults(),
    };
    match loaded {
        Ok(engine) => Some(engine),
        Err(err) => {
            warn!(error = %err, "OCR unavailable, falling back to barcode only");
            None
        }
    }
}

async fn run_scan<R>(
    recognizer: R,
    config: &ScanConfig,
    image: DynamicImage,
    strategy: ScanStrategy,
    timeout: Option<Duration>,
) -> ScanResult
where
    R: TextRecognizer + 'static,
{
    let scanner = Arc::new(DniScanner::with_config(Pdf417Decoder::new(), recognizer, config));
    let observer: Arc<dyn ScanObserver> = Arc::new(|status: ScanStatus| eprintln!("{status}"));
    let result = scan_in_background(scanner, image, strategy, observer, timeout).await;
    info!(success = result.is_success(), "Scan finished");
    result
}

/// Sanitize and review a stored `IdentityFields` JSON record.
#[instrument(skip_all, fields(record = %record.display()))]
pub fn review(record: &Path, config: Option<&Path>) -> Result<ReviewReport> {
    let config = load_config(config)?;
    let raw = std::fs::read_to_string(record)?;
    let fields: IdentityFields = serde_json::from_str(&raw)?;

    let policy = RecordPolicy::from_config(&config);
    let fields = policy.sanitize(fields);
    let review = policy.review(&fields);
    Ok(ReviewReport { fields, review })
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkin_core::{CheckinError, FailureReason};
    use image::{GrayImage, Luma};
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn sides_map_to_strategies() {
        assert_eq!(Side::Front.strategy(), ScanStrategy::OcrOnly);
        assert_eq!(Side::Back.strategy(), ScanStrategy::Full);
    }

    #[test]
    fn review_sanitizes_stored_record() {
        let dir = tempfile::tempdir().unwrap();
        let record = write_file(
            &dir,
            "guest.json",
            r#"{"documentNumber":" 30627652 ","lastName":"GARCIA","firstName":"JUAN","birthDate":"0990-01-15","address":"  "}"#,
        );

        let report = review(&record, None).unwrap();
        assert_eq!(report.fields.document_number.as_deref(), Some("30627652"));
        assert_eq!(report.fields.birth_date.as_deref(), Some("1990-01-15"));
        assert_eq!(report.fields.address, None);
        assert!(report.review.usable);
        assert!(report.review.accepted);
        assert_eq!(report.review.document_number_valid, Some(true));
    }

    #[test]
    fn strict_config_rejects_incomplete_record() {
        let dir = tempfile::tempdir().unwrap();
        let record = write_file(&dir, "guest.json", r#"{"lastName":"GARCIA"}"#);
        let config = write_file(&dir, "scan.json", r#"{"accept_incomplete_records": false}"#);

        let report = review(&record, Some(&config)).unwrap();
        assert!(!report.review.usable);
        assert!(!report.review.accepted);
    }

    #[test]
    fn malformed_record_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let record = write_file(&dir, "guest.json", "{not json");
        assert!(matches!(
            review(&record, None),
            Err(CheckinError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn missing_photo_is_an_invalid_image() {
        let request = ScanRequest {
            image: PathBuf::from("/nonexistent/dni-back.jpg"),
            side: Side::Back,
            config: None,
            timeout_secs: None,
            models: None,
        };
        assert!(matches!(
            scan(&request).await,
            Err(CheckinError::InvalidImage(_))
        ));
    }

    #[tokio::test]
    async fn blank_photo_extracts_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.png");
        GrayImage::from_pixel(240, 150, Luma([230u8]))
            .save(&path)
            .unwrap();

        let request = ScanRequest {
            image: path,
            side: Side::Back,
            config: None,
            timeout_secs: Some(60),
            models: Some(dir.path().join("no-models-here")),
        };
        let result = scan(&request).await.unwrap();
        assert_eq!(result, ScanResult::failure(FailureReason::NoDataExtracted));
    }
}
