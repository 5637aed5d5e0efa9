// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline: candidate variants, PDF417 decoding, OCR fallback and
// the orchestrator that sequences them.

pub mod background;
pub mod barcode;
pub mod orchestrator;
pub mod status;
pub mod text;
pub mod variants;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use background::scan_in_background;
pub use barcode::{BarcodeDecoder, Pdf417Decoder};
pub use orchestrator::{DniScanner, ScanStrategy};
pub use status::{NoopObserver, ScanObserver, ScanStatus};
pub use text::{NoTextRecognizer, TextRecognizer};
pub use variants::{ImagePreprocessor, Variant, VariantKind};

#[cfg(feature = "ocr")]
pub use ocr::{OcrConfig, OcrEngine};
