// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Field parsers: the barcode payload layout and free OCR text.

pub mod ocr_text;
pub mod payload;

pub use ocr_text::parse_ocr_text;
pub use payload::parse_payload;
