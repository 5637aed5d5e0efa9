// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Guest-facing messages for scan failures.
//
// A failed scan never blocks check-in: every message ends by pointing the
// guest at manual entry. Severity decides whether the form offers a retake.

use crate::error::CheckinError;
use crate::types::FailureReason;

/// Severity of a scan problem from the guest's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Worth another photo (blur, glare, slow device).
    Transient,
    /// The guest must do something different (wrong file, empty photo).
    ActionRequired,
    /// Retaking will not help; type the data in.
    ManualEntry,
}

/// A plain-language message with a concrete next step.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Short summary (shown as a heading).
    pub message: String,
    /// What the guest should do next (shown as body text).
    pub suggestion: String,
    /// Whether the form should offer to take the photo again.
    pub retake_photo: bool,
    /// Severity level (drives icon/colour in the form).
    pub severity: Severity,
}

/// Explain a failed `ScanResult` to the guest.
pub fn humanize_failure(reason: &FailureReason) -> HumanError {
    match reason {
        FailureReason::InvalidInput(_) => HumanError {
            message: "We couldn't open that photo.".into(),
            suggestion: "Take the photo again, or fill in your details by hand.".into(),
            retake_photo: true,
            severity: Severity::ActionRequired,
        },
        FailureReason::NoDataExtracted => HumanError {
            message: "We couldn't read your document automatically.".into(),
            suggestion: "Try a sharper photo of the back of the card with the barcode fully visible, or fill in your details by hand.".into(),
            retake_photo: true,
            severity: Severity::Transient,
        },
        FailureReason::TimedOut => HumanError {
            message: "Reading your document took too long.".into(),
            suggestion: "Please fill in your details by hand.".into(),
            retake_photo: false,
            severity: Severity::ManualEntry,
        },
    }
}

/// Explain an internal error to the guest (used by tools outside `scan`).
pub fn humanize_error(err: &CheckinError) -> HumanError {
    match err {
        CheckinError::InvalidImage(_) => humanize_failure(&FailureReason::InvalidInput(String::new())),

        CheckinError::Barcode(_) | CheckinError::Ocr(_) => {
            humanize_failure(&FailureReason::NoDataExtracted)
        }

        CheckinError::Timeout(_) => humanize_failure(&FailureReason::TimedOut),

        CheckinError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => HumanError {
            message: "The file couldn't be found.".into(),
            suggestion: "It may have been moved or deleted. Choose the photo again.".into(),
            retake_photo: true,
            severity: Severity::ActionRequired,
        },

        CheckinError::Config(_) | CheckinError::Io(_) | CheckinError::Serialization(_) => {
            HumanError {
                message: "The scanner isn't available right now.".into(),
                suggestion: "Please fill in your details by hand.".into(),
                retake_photo: false,
                severity: Severity::ManualEntry,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_read_offers_retake() {
        let human = humanize_failure(&FailureReason::NoDataExtracted);
        assert_eq!(human.severity, Severity::Transient);
        assert!(human.retake_photo);
        assert!(human.suggestion.contains("by hand"));
    }

    #[test]
    fn timeout_goes_to_manual_entry() {
        let human = humanize_error(&CheckinError::Timeout(std::time::Duration::from_secs(30)));
        assert_eq!(human.severity, Severity::ManualEntry);
        assert!(!human.retake_photo);
    }

    #[test]
    fn missing_file_is_action_required() {
        let err = CheckinError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(humanize_error(&err).severity, Severity::ActionRequired);
    }

    #[test]
    fn every_message_allows_manual_entry() {
        for reason in [
            FailureReason::InvalidInput("zero-sized".into()),
            FailureReason::NoDataExtracted,
            FailureReason::TimedOut,
        ] {
            assert!(humanize_failure(&reason).suggestion.contains("by hand"));
        }
    }
}
