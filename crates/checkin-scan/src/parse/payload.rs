// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Parser for the `@`-separated PDF417 payload on the back of the card.
//
// Field layout, by position:
//
// | index | field              |
// |-------|--------------------|
// | 0     | procedure number   |
// | 1     | last name          |
// | 2     | first name         |
// | 3     | sex (`M` / `F`)    |
// | 4     | document number    |
// | 5     | copy letter        |
// | 6     | birth date YYYYMMDD|
// | 7     | issue date YYYYMMDD|
//
// Only this fixed-position layout is recognised.

use checkin_core::{IdentityFields, Sex};
use tracing::{debug, instrument, trace};

const SEPARATOR: char = '@';
const MIN_FIELDS: usize = 8;

const LAST_NAME: usize = 1;
const FIRST_NAME: usize = 2;
const SEX: usize = 3;
const DOCUMENT_NUMBER: usize = 4;
const BIRTH_DATE: usize = 6;
const ISSUE_DATE: usize = 7;

/// Parse a decoded barcode payload into identity fields.
///
/// Returns `None` when the payload has no `@` separator, has fewer than
/// eight fields, or lacks any of document number, last name and first name.
#[instrument(skip_all, fields(payload_len = payload.len()))]
pub fn parse_payload(payload: &str) -> Option<IdentityFields> {
    let cleaned = strip_control_chars(payload);
    trace!(stage = "payload", %cleaned, "Cleaned payload");

    if !cleaned.contains(SEPARATOR) {
        debug!(stage = "payload", "No separator, unknown payload format");
        return None;
    }

    let fields: Vec<&str> = cleaned.split(SEPARATOR).map(str::trim).collect();
    if fields.len() < MIN_FIELDS {
        debug!(stage = "payload", field_count = fields.len(), "Too few fields");
        return None;
    }

    let text = |index: usize| Some(fields[index]).filter(|value| !value.is_empty()).map(String::from);

    let parsed = IdentityFields {
        document_number: text(DOCUMENT_NUMBER),
        last_name: text(LAST_NAME),
        first_name: text(FIRST_NAME),
        sex: Sex::from_code(fields[SEX]),
        birth_date: normalize_date(fields[BIRTH_DATE]),
        issue_date: normalize_date(fields[ISSUE_DATE]),
        address: None,
    };

    if parsed.document_number.is_none() || parsed.last_name.is_none() || parsed.first_name.is_none()
    {
        debug!(stage = "payload", "Missing document number or names");
        return None;
    }

    debug!(stage = "payload", field_count = fields.len(), "Payload parsed");
    Some(parsed)
}

/// Drop C0 and C1 control characters (U+0000..=U+001F, U+007F..=U+009F).
fn strip_control_chars(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(*c, '\u{0000}'..='\u{001F}' | '\u{007F}'..='\u{009F}'))
        .collect()
}

/// `YYYYMMDD` to `YYYY-MM-DD` by slicing. The digits are copied as-is, so a
/// month of `13` survives. Anything that is not exactly eight ASCII digits
/// yields `None`.
fn normalize_date(raw: &str) -> Option<String> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{}-{}-{}", &raw[0..4], &raw[4..6], &raw[6..8]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &str = "001@GARCIA@JUAN@M@30627652@A@19900115@20150101";

    #[test]
    fn reference_payload() {
        let fields = parse_payload(REFERENCE).unwrap();
        assert_eq!(fields.last_name.as_deref(), Some("GARCIA"));
        assert_eq!(fields.first_name.as_deref(), Some("JUAN"));
        assert_eq!(fields.sex, Some(Sex::Male));
        assert_eq!(fields.document_number.as_deref(), Some("30627652"));
        assert_eq!(fields.birth_date.as_deref(), Some("1990-01-15"));
        assert_eq!(fields.issue_date.as_deref(), Some("2015-01-01"));
        assert_eq!(fields.address, None);
    }

    #[test]
    fn dates_are_sliced_not_validated() {
        assert_eq!(normalize_date("19900115").as_deref(), Some("1990-01-15"));
        assert_eq!(normalize_date("20001332").as_deref(), Some("2000-13-32"));
        assert_eq!(normalize_date("1990115"), None);
        assert_eq!(normalize_date("1990O115"), None);
    }

    #[test]
    fn fewer_than_eight_fields_is_none() {
        assert!(parse_payload("001@GARCIA@JUAN@M@30627652@A@19900115").is_none());
    }

    #[test]
    fn no_separator_is_none() {
        assert!(parse_payload("GARCIA JUAN 30627652").is_none());
        assert!(parse_payload("").is_none());
    }

    #[test]
    fn required_fields_must_be_present() {
        assert!(parse_payload("001@GARCIA@ @M@30627652@A@19900115@20150101").is_none());
        assert!(parse_payload("001@@JUAN@M@30627652@A@19900115@20150101").is_none());
        assert!(parse_payload("001@GARCIA@JUAN@M@@A@19900115@20150101").is_none());
    }

    #[test]
    fn control_characters_are_stripped() {
        let noisy = "001@GAR\u{0000}CIA@JUAN\r\n@F@3062\u{0085}7652@A@19900115@20150101\u{001D}";
        let fields = parse_payload(noisy).unwrap();
        assert_eq!(fields.last_name.as_deref(), Some("GARCIA"));
        assert_eq!(fields.document_number.as_deref(), Some("30627652"));
        assert_eq!(fields.sex, Some(Sex::Female));
        assert_eq!(fields.issue_date.as_deref(), Some("2015-01-01"));
    }

    #[test]
    fn unknown_sex_and_bad_dates_are_dropped() {
        let fields = parse_payload("001@GARCIA@JUAN PEDRO@X@30627652@A@1990@@extra").unwrap();
        assert_eq!(fields.first_name.as_deref(), Some("JUAN PEDRO"));
        assert_eq!(fields.sex, None);
        assert_eq!(fields.birth_date, None);
        assert_eq!(fields.issue_date, None);
    }

    #[test]
    fn well_formed_payloads_keep_names_and_number() {
        for (last, first, number) in [
            ("PEREZ", "ANA", "4123456"),
            ("DE LA FUENTE", "MARIA JOSE", "35111222"),
            ("NUÑEZ", "IÑAKI", "28999000"),
        ] {
            let payload = format!("9@{last}@{first}@F@{number}@B@20000101@20200101@x@y");
            let fields = parse_payload(&payload).unwrap();
            assert_eq!(fields.last_name.as_deref(), Some(last));
            assert_eq!(fields.first_name.as_deref(), Some(first));
            assert_eq!(fields.document_number.as_deref(), Some(number));
        }
    }
}
