// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Heuristic field extraction from OCR text of a Spanish/English ID card.
//
// OCR output has no reliable line structure, so each field is found by an
// independent regex pass over the upper-cased, whitespace-collapsed text.

use std::sync::OnceLock;

use checkin_core::IdentityFields;
use regex::Regex;
use tracing::{debug, instrument, trace};

/// Printed label words that must never be taken as a value.
const LABEL_WORDS: &[&str] = &[
    "SURNAME",
    "APELLIDO",
    "APELLIDOS",
    "NAME",
    "NOMBRE",
    "NOMBRES",
    "SEXO",
    "SEX",
];

fn is_label(word: &str) -> bool {
    LABEL_WORDS.contains(&word)
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern compiles"))
}

// ASCII digits only: `\d` is Unicode-aware and would accept fullwidth digits.
fn eight_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\b([0-9]{8})\b")
}

fn seven_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\b([0-9]{7})\b")
}

fn grouped_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\b([0-9]{2}[.\s][0-9]{3}[.\s][0-9]{3})\b")
}

fn last_name_label() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\b(?:APELLIDOS\b|APELLIDO|SURNAME)")
}

fn first_name_label() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\b(?:NOMBRES?|NAME)\b")
}

fn last_name_value() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Up to 50 non-letters between the label and the value.
    regex(&RE, r"^\P{Lu}{0,50}(\p{Lu}{4,})")
}

fn first_name_value() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"^\P{Lu}{0,50}(\p{Lu}{3,})(?:\s+(\p{Lu}+))?")
}

/// `NACIMIENTO` / `BIRTH`, optional OCR junk, then day, month word(s), year.
fn labelled_birth_date() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(
        &RE,
        r"(?:NACIMIENTO|BIRTH)[:\s/7]*(?:[A-Z0-9]+\s+)?([0-9]{1,2})\s*([A-Z]{3,})(?:\s*/\s*([A-Z]{3,}))?\s*([0-9]{4})",
    )
}

/// A bare date with a known month abbreviation anywhere in the text.
fn bare_birth_date() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(
        &RE,
        r"\b([0-9]{1,2})\s*(ENE|FEB|MAR|ABR|MAY|JUN|JUL|AGO|SEP|OCT|NOV|DIC|JAN|APR|AUG|DEC)[A-Z]*(?:\s*/\s*([A-Z]{3,}))?\s*([0-9]{4})",
    )
}

/// Parse recognised card text into whatever fields can be found.
///
/// Returns `None` only when neither a document number nor a last name was
/// found. Any other subset of fields is returned as-is.
#[instrument(skip_all, fields(text_len = text.len()))]
pub fn parse_ocr_text(text: &str) -> Option<IdentityFields> {
    let normalized = normalize(text);
    trace!(stage = "ocr_text", %normalized, "Normalized OCR text");

    let fields = IdentityFields {
        document_number: find_document_number(&normalized),
        last_name: find_last_name(&normalized),
        first_name: find_first_name(&normalized),
        birth_date: find_birth_date(&normalized),
        ..Default::default()
    };

    if fields.document_number.is_none() && fields.last_name.is_none() {
        debug!(stage = "ocr_text", "Neither document number nor last name found");
        return None;
    }

    debug!(
        stage = "ocr_text",
        document_number = fields.document_number.is_some(),
        last_name = fields.last_name.is_some(),
        first_name = fields.first_name.is_some(),
        birth_date = fields.birth_date.is_some(),
        "OCR text parsed"
    );
    Some(fields)
}

/// Upper-case and collapse every whitespace run (line breaks included) to a
/// single space.
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Eight digits, else seven, else `NN.NNN.NNN` with the separators removed.
fn find_document_number(text: &str) -> Option<String> {
    if let Some(caps) = eight_digits().captures(text) {
        return Some(caps[1].to_string());
    }
    if let Some(caps) = seven_digits().captures(text) {
        return Some(caps[1].to_string());
    }
    grouped_digits()
        .captures(text)
        .map(|caps| caps[1].chars().filter(char::is_ascii_digit).collect())
}

/// First label occurrence followed by a 4+ letter word that is not itself a
/// label. A label echoed straight after another (`APELLIDO / SURNAME GARCIA`)
/// is skipped and the next occurrence tried.
fn find_last_name(text: &str) -> Option<String> {
    last_name_label().find_iter(text).find_map(|label| {
        let caps = last_name_value().captures(&text[label.end()..])?;
        let value = &caps[1];
        (!is_label(value)).then(|| value.to_string())
    })
}

/// Like [`find_last_name`] with a 3+ letter word, optionally followed by a
/// second word. A trailing word that is a label is dropped.
fn find_first_name(text: &str) -> Option<String> {
    first_name_label().find_iter(text).find_map(|label| {
        let caps = first_name_value().captures(&text[label.end()..])?;
        let first = caps.get(1)?.as_str();
        if is_label(first) {
            return None;
        }
        match caps.get(2).map(|m| m.as_str()) {
            Some(second) if !is_label(second) => Some(format!("{first} {second}")),
            _ => Some(first.to_string()),
        }
    })
}

fn find_birth_date(text: &str) -> Option<String> {
    [labelled_birth_date(), bare_birth_date()]
        .into_iter()
        .find_map(|re| {
            let caps = re.captures(text)?;
            let month = month_number(&caps[2])
                .or_else(|| caps.get(3).and_then(|alt| month_number(alt.as_str())))?;
            Some(format!("{}-{month}-{:0>2}", &caps[4], &caps[1]))
        })
}

/// Month number for a Spanish or English month word, by its first three
/// letters.
fn month_number(word: &str) -> Option<&'static str> {
    let prefix = word.get(..3)?;
    let month = match prefix {
        "ENE" | "JAN" => "01",
        "FEB" => "02",
        "MAR" => "03",
        "ABR" | "APR" => "04",
        "MAY" => "05",
        "JUN" => "06",
        "JUL" => "07",
        "AGO" | "AUG" => "08",
        "SEP" => "09",
        "OCT" => "10",
        "NOV" => "11",
        "DIC" | "DEC" => "12",
        _ => return None,
    };
    Some(month)
}
