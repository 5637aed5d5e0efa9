// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Running scans off the async executor, with an optional wall-clock limit.

use std::sync::Arc;
use std::time::Duration;

use checkin_core::{FailureReason, ScanResult};
use image::DynamicImage;
use tracing::{error, instrument, warn};

use crate::scan::barcode::BarcodeDecoder;
use crate::scan::orchestrator::{DniScanner, ScanStrategy};
use crate::scan::status::{ScanObserver, ScanStatus};
use crate::scan::text::TextRecognizer;

/// Run a scan on tokio's blocking pool.
///
/// When `timeout` elapses first the caller gets `FailureReason::TimedOut`
/// and a final `Failed` status. The blocking work itself cannot be
/// interrupted: it runs to completion in the background and its result is
/// discarded, so the observer may still see late progress events.
#[instrument(skip_all, fields(strategy = ?strategy, timeout = ?timeout))]
pub async fn scan_in_background<B, R>(
    scanner: Arc<DniScanner<B, R>>,
    image: DynamicImage,
    strategy: ScanStrategy,
    observer: Arc<dyn ScanObserver>,
    timeout: Option<Duration>,
) -> ScanResult
where
    B: BarcodeDecoder + 'static,
    R: TextRecognizer + 'static,
{
    let task_observer = Arc::clone(&observer);
    let task = tokio::task::spawn_blocking(move || {
        scanner.scan_with(&image, strategy, task_observer.as_ref())
    });

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, task).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!(?limit, "Scan timed out");
                observer.on_status(ScanStatus::Failed);
                return ScanResult::failure(FailureReason::TimedOut);
            }
        },
        None => task.await,
    };

    joined.unwrap_or_else(|err| {
        error!(error = %err, "Scan task did not complete");
        observer.on_status(ScanStatus::Failed);
        ScanResult::failure(FailureReason::NoDataExtracted)
    })
}
