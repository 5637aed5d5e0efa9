// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the check-in scanner.

use thiserror::Error;

/// Top-level error type for all check-in scanner operations.
///
/// These never reach the guest directly: the scan orchestrator absorbs them
/// into its fallback chain and reports a `ScanResult::Failure` instead.
#[derive(Debug, Error)]
pub enum CheckinError {
    // -- Input --
    #[error("invalid image: {0}")]
    InvalidImage(String),

    // -- Decode stages --
    #[error("barcode decoder failed: {0}")]
    Barcode(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("scan timed out after {0:?}")]
    Timeout(std::time::Duration),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CheckinError>;
