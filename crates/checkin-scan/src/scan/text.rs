// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text recognition seam used by the OCR fallback.

use checkin_core::error::Result;
use image::DynamicImage;

/// Extracts free text from a full document photograph.
///
/// Implementations report progress as fractions in `0.0..=1.0` through
/// `progress`; callers must tolerate out-of-range or repeated values.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &DynamicImage, progress: &mut dyn FnMut(f32)) -> Result<String>;
}

/// Recognizer used when no OCR engine is available: always reads nothing.
///
/// With it the scanner degrades to barcode-only, and a failed barcode search
/// ends in "no data extracted".
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTextRecognizer;

impl TextRecognizer for NoTextRecognizer {
    fn recognize(&self, _image: &DynamicImage, progress: &mut dyn FnMut(f32)) -> Result<String> {
        progress(1.0);
        Ok(String::new())
    }
}
