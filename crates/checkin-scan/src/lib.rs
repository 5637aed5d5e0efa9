// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// checkin-scan: identity field extraction from photographs of national ID
// cards for the hotel check-in form.
//
// The back of the card carries a PDF417 barcode; the scanner searches a fixed
// list of image variants for it and parses the `@`-separated payload. When
// that fails, text recognition (feature `ocr`) reads the printed fields
// instead.

pub mod image;
pub mod parse;
pub mod review;
pub mod scan;

// Re-export the primary entry points so callers can use `checkin_scan::DniScanner` etc.
pub use crate::image::processor::ImageProcessor;
pub use parse::{parse_ocr_text, parse_payload};
pub use review::{RecordPolicy, RecordReview};
pub use scan::{
    BarcodeDecoder, DniScanner, ImagePreprocessor, NoTextRecognizer, NoopObserver, Pdf417Decoder,
    ScanObserver, ScanStatus, ScanStrategy, TextRecognizer, scan_in_background,
};

#[cfg(feature = "ocr")]
pub use scan::{OcrConfig, OcrEngine};
