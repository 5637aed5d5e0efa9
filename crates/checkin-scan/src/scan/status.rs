// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Guest-facing progress events emitted while a scan runs.

use checkin_core::ScanMethod;

/// A step of the scan pipeline, as the check-in form shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    /// Looking for the PDF417 symbol across image variants.
    SearchingBarcode,
    /// A barcode was decoded and parsed.
    BarcodeDetected,
    /// The barcode path gave up; falling back to text recognition.
    TryingOcr,
    /// Text recognition progress, 0..=100.
    Recognizing { percent: u8 },
    /// Text recognition produced usable fields.
    OcrExtracted,
    /// Nothing could be read automatically.
    Failed,
}

impl ScanStatus {
    /// The status reported when a scan succeeds by `method`.
    pub fn detected(method: ScanMethod) -> Self {
        match method {
            ScanMethod::Barcode => Self::BarcodeDetected,
            ScanMethod::Ocr => Self::OcrExtracted,
        }
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SearchingBarcode => f.write_str("Searching for PDF417 barcode..."),
            Self::BarcodeDetected => f.write_str("PDF417 barcode detected"),
            Self::TryingOcr => f.write_str("Trying text recognition..."),
            Self::Recognizing { percent } => write!(f, "Recognizing text... {percent}%"),
            Self::OcrExtracted => f.write_str("Data extracted with OCR"),
            Self::Failed => f.write_str("Could not read the document automatically"),
        }
    }
}

/// Receives progress updates during a scan.
///
/// Any `Fn(ScanStatus)` closure is an observer.
pub trait ScanObserver: Send + Sync {
    fn on_status(&self, status: ScanStatus);
}

impl<F> ScanObserver for F
where
    F: Fn(ScanStatus) + Send + Sync,
{
    fn on_status(&self, status: ScanStatus) {
        self(status)
    }
}

/// Observer that drops every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ScanObserver for NoopObserver {
    fn on_status(&self, _status: ScanStatus) {}
}

/// Turns raw recognizer progress fractions into monotonic percentages and
/// forwards only the ones that changed.
pub(crate) struct ProgressScaler<'a> {
    observer: &'a dyn ScanObserver,
    last_percent: Option<u8>,
}

impl<'a> ProgressScaler<'a> {
    pub(crate) fn new(observer: &'a dyn ScanObserver) -> Self {
        Self {
            observer,
            last_percent: None,
        }
    }

    pub(crate) fn report(&mut self, fraction: f32) {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let percent = (fraction * 100.0).round() as u8;
        if self.last_percent.is_some_and(|last| percent <= last) {
            return;
        }
        self.last_percent = Some(percent);
        self.observer.on_status(ScanStatus::Recognizing { percent });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn progress_is_clamped_and_monotonic() {
        let seen = Mutex::new(Vec::new());
        let observer = |status: ScanStatus| seen.lock().unwrap().push(status);
        let mut scaler = ProgressScaler::new(&observer);

        for fraction in [0.0, 0.25, 0.2, 0.25, 1.7, f32::NAN, 1.0] {
            scaler.report(fraction);
        }

        let percents: Vec<u8> = seen
            .lock()
            .unwrap()
            .iter()
            .map(|status| match status {
                ScanStatus::Recognizing { percent } => *percent,
                other => panic!("unexpected status {other:?}"),
            })
            .collect();
        assert_eq!(percents, vec![0, 25, 100]);
    }

    #[test]
    fn status_text_includes_percentage() {
        assert_eq!(
            ScanStatus::Recognizing { percent: 42 }.to_string(),
            "Recognizing text... 42%"
        );
        assert_eq!(ScanStatus::detected(ScanMethod::Ocr), ScanStatus::OcrExtracted);
    }
}
