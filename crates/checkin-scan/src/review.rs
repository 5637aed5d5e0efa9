// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Record review: cleanup and acceptance checks applied to identity fields
// before the form layer stores them.
//
// Review never rejects a scan result on its own. It reports what is missing
// or suspicious, and the configured policy decides whether an incomplete
// record is accepted.

use checkin_core::{IdentityFields, ScanConfig, is_valid_document_number};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Date layout used by every extracted date.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// How the check-in flow treats reviewed records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordPolicy {
    /// Accept records that fail the usability check.
    pub accept_incomplete_records: bool,
    /// Rewrite a birth date `0YYY-MM-DD` to `1YYY-MM-DD`.
    pub repair_leading_zero_year: bool,
}

impl Default for RecordPolicy {
    fn default() -> Self {
        Self::from_config(&ScanConfig::default())
    }
}

/// Findings for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordReview {
    /// Names of the fields still empty, in form order.
    pub missing_fields: Vec<&'static str>,
    /// Document number present, or both names present.
    pub usable: bool,
    /// Whether the document number has the 7-8 digit shape (`None` when absent).
    pub document_number_valid: Option<bool>,
    /// Whether the birth date is a real calendar date (`None` when absent).
    pub birth_date_valid: Option<bool>,
    /// Whether the issue date is a real calendar date (`None` when absent).
    pub issue_date_valid: Option<bool>,
    /// Final verdict under the policy.
    pub accepted: bool,
}

impl RecordPolicy {
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            accept_incomplete_records: config.accept_incomplete_records,
            repair_leading_zero_year: config.repair_leading_zero_year,
        }
    }

    /// Trim every text field, drop the ones left empty and, when enabled,
    /// repair a birth year misread with a leading zero.
    pub fn sanitize(&self, fields: IdentityFields) -> IdentityFields {
        sanitize(fields, self.repair_leading_zero_year)
    }

    /// Inspect a (sanitized) record.
    ///
    /// Calendar checks are reported only: a date such as `2000-13-32` stays
    /// in the record exactly as extracted.
    #[instrument(skip_all)]
    pub fn review(&self, fields: &IdentityFields) -> RecordReview {
        let missing_fields: Vec<&'static str> = [
            ("documentNumber", fields.document_number.is_none()),
            ("lastName", fields.last_name.is_none()),
            ("firstName", fields.first_name.is_none()),
            ("sex", fields.sex.is_none()),
            ("birthDate", fields.birth_date.is_none()),
            ("issueDate", fields.issue_date.is_none()),
            ("address", fields.address.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, missing)| missing.then_some(name))
        .collect();

        let usable = fields.is_usable();
        let accepted = usable || self.accept_incomplete_records;

        let review = RecordReview {
            missing_fields,
            usable,
            document_number_valid: fields.document_number.as_deref().map(is_valid_document_number),
            birth_date_valid: fields.birth_date.as_deref().map(is_calendar_date),
            issue_date_valid: fields.issue_date.as_deref().map(is_calendar_date),
            accepted,
        };

        if usable {
            debug!(stage = "review", missing = review.missing_fields.len(), "Record reviewed");
        } else {
            info!(
                stage = "review",
                accepted,
                missing = review.missing_fields.len(),
                "Record lacks a document number and full name"
            );
        }
        review
    }
}

/// See [`RecordPolicy::sanitize`].
pub fn sanitize(mut fields: IdentityFields, repair_leading_zero_year: bool) -> IdentityFields {
    for slot in [
        &mut fields.document_number,
        &mut fields.last_name,
        &mut fields.first_name,
        &mut fields.birth_date,
        &mut fields.issue_date,
        &mut fields.address,
    ] {
        *slot = slot
            .take()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
    }

    if repair_leading_zero_year {
        if let Some(date) = fields.birth_date.as_mut() {
            if date.len() == 10 && date.starts_with('0') {
                date.replace_range(..1, "1");
                debug!(stage = "review", "Repaired leading-zero birth year");
            }
        }
    }
    fields
}

fn is_calendar_date(date: &str) -> bool {
    NaiveDate::parse_from_str(date, DATE_FORMAT).is_ok()
}
