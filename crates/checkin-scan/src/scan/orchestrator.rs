// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan orchestration: barcode search over image variants, then the OCR
// fallback on the full photograph.
//
// Every failure inside a stage (decoder errors, recognizer errors, panics in
// either primitive) is absorbed here and turned into the next fallback step.
// The caller only ever sees a `ScanResult`.

use std::panic::{AssertUnwindSafe, catch_unwind};

use checkin_core::error::{CheckinError, Result};
use checkin_core::{FailureReason, IdentityFields, ScanConfig, ScanId, ScanMethod, ScanResult};
use image::DynamicImage;
use tracing::{debug, info, instrument, warn};

use crate::parse::{parse_ocr_text, parse_payload};
use crate::scan::barcode::{BarcodeDecoder, Pdf417Decoder};
use crate::scan::status::{ProgressScaler, ScanObserver, ScanStatus};
use crate::scan::text::{NoTextRecognizer, TextRecognizer};
use crate::scan::variants::ImagePreprocessor;

/// Which decode paths a scan runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanStrategy {
    /// Barcode search first, OCR if it finds nothing usable. For the back of
    /// the card.
    #[default]
    Full,
    /// OCR only. For the front of the card, which carries no barcode.
    OcrOnly,
}

/// Reads identity fields from a photograph of an ID card.
///
/// Holds no state between scans, so one instance can be shared (for example
/// behind an `Arc`) and used for several photographs at once.
pub struct DniScanner<B = Pdf417Decoder, R = NoTextRecognizer> {
    decoder: B,
    recognizer: R,
    preprocessor: ImagePreprocessor,
}

impl DniScanner {
    /// Barcode-only scanner with the default search regions.
    pub fn barcode_only() -> Self {
        Self::new(Pdf417Decoder::new(), NoTextRecognizer)
    }
}

impl<B: BarcodeDecoder, R: TextRecognizer> DniScanner<B, R> {
    pub fn new(decoder: B, recognizer: R) -> Self {
        Self {
            decoder,
            recognizer,
            preprocessor: ImagePreprocessor::default(),
        }
    }

    pub fn with_config(decoder: B, recognizer: R, config: &ScanConfig) -> Self {
        Self {
            decoder,
            recognizer,
            preprocessor: ImagePreprocessor::from_config(config),
        }
    }

    pub fn preprocessor(&self) -> &ImagePreprocessor {
        &self.preprocessor
    }

    /// Scan with [`ScanStrategy::Full`].
    pub fn scan(&self, image: &DynamicImage, observer: &dyn ScanObserver) -> ScanResult {
        self.scan_with(image, ScanStrategy::Full, observer)
    }

    /// Run the decode paths selected by `strategy`.
    ///
    /// A decoded payload that fails to parse falls through to OCR exactly like
    /// an exhausted search. OCR always reads the full, unmodified photograph.
    #[instrument(skip_all, fields(
        scan_id = %ScanId::new(),
        strategy = ?strategy,
        width = image.width(),
        height = image.height(),
    ))]
    pub fn scan_with(
        &self,
        image: &DynamicImage,
        strategy: ScanStrategy,
        observer: &dyn ScanObserver,
    ) -> ScanResult {
        if image.width() == 0 || image.height() == 0 {
            warn!("Image has no pixels");
            observer.on_status(ScanStatus::Failed);
            return ScanResult::failure(FailureReason::InvalidInput(format!(
                "image is {}x{}",
                image.width(),
                image.height()
            )));
        }

        if strategy == ScanStrategy::Full {
            observer.on_status(ScanStatus::SearchingBarcode);
            if let Some(fields) = self.barcode_path(image) {
                return self.succeed(ScanMethod::Barcode, fields, observer);
            }
        }

        observer.on_status(ScanStatus::TryingOcr);
        if let Some(fields) = self.ocr_path(image, observer) {
            return self.succeed(ScanMethod::Ocr, fields, observer);
        }

        info!("No data extracted");
        observer.on_status(ScanStatus::Failed);
        ScanResult::failure(FailureReason::NoDataExtracted)
    }

    fn succeed(
        &self,
        method: ScanMethod,
        fields: IdentityFields,
        observer: &dyn ScanObserver,
    ) -> ScanResult {
        info!(%method, "Identity fields extracted");
        observer.on_status(ScanStatus::detected(method));
        ScanResult::success(method, fields)
    }

    /// Try each variant in order until one decodes, then parse that payload.
    fn barcode_path(&self, image: &DynamicImage) -> Option<IdentityFields> {
        let mut attempts = 0usize;
        let payload = self.preprocessor.variants(image).find_map(|variant| {
            attempts += 1;
            let outcome = contain(|| self.decoder.decode(&variant.image), CheckinError::Barcode);
            match outcome {
                Ok(Some(payload)) => {
                    debug!(stage = "barcode", index = variant.index, kind = %variant.kind, "Variant decoded");
                    Some(payload)
                }
                Ok(None) => {
                    debug!(stage = "barcode", index = variant.index, kind = %variant.kind, "Nothing found");
                    None
                }
                Err(err) => {
                    warn!(stage = "barcode", index = variant.index, error = %err, "Decoder failed, trying next variant");
                    None
                }
            }
        });

        let Some(payload) = payload else {
            info!(stage = "barcode", attempts, "Barcode search exhausted");
            return None;
        };

        let parsed = parse_payload(&payload);
        if parsed.is_none() {
            info!(stage = "payload", attempts, "Decoded payload did not parse, falling back to OCR");
        }
        parsed
    }

    /// Recognise the full photograph once and parse the text.
    ///
    /// A result counts only when it carries a document number.
    fn ocr_path(&self, image: &DynamicImage, observer: &dyn ScanObserver) -> Option<IdentityFields> {
        let mut scaler = ProgressScaler::new(observer);
        let recognized = contain(
            || self.recognizer.recognize(image, &mut |fraction| scaler.report(fraction)),
            CheckinError::Ocr,
        );

        let text = match recognized {
            Ok(text) => text,
            Err(err) => {
                warn!(stage = "ocr", error = %err, "Text recognition failed");
                return None;
            }
        };
        debug!(stage = "ocr", char_count = text.len(), "Text recognised");

        match parse_ocr_text(&text) {
            Some(fields) if fields.document_number.is_some() => Some(fields),
            Some(_) => {
                info!(stage = "ocr_text", "OCR text has no document number");
                None
            }
            None => None,
        }
    }
}

/// Run a stage primitive, turning a panic into an error of the stage's kind.
fn contain<T>(stage: impl FnOnce() -> Result<T>, error: fn(String) -> CheckinError) -> Result<T> {
    catch_unwind(AssertUnwindSafe(stage)).unwrap_or_else(|panic| {
        let detail = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".into());
        Err(error(format!("panicked: {detail}")))
    })
}
