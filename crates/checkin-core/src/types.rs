// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the check-in document scanner.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

/// Unique identifier for one scan attempt (correlates log events).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanId(pub Uuid);

impl ScanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScanId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sex as printed on the document. Anything other than `M`/`F` is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Sex {
    /// Parse the one-letter document code. Only an exact `M` or `F` is accepted.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "M" => Some(Self::Male),
            "F" => Some(Self::Female),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }
}

/// Identity fields extracted from a national ID card.
///
/// Every field is optional: extraction is allowed to be partial and the
/// guest completes the rest by hand. Dates are `YYYY-MM-DD` strings copied
/// digit-for-digit from the source and are not calendar-validated here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    /// Only the barcode path reads this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<String>,
    /// Neither decode path fills this in; the guest types it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl IdentityFields {
    /// A record is usable when it carries a document number, or both names.
    pub fn is_usable(&self) -> bool {
        self.document_number.is_some() || (self.last_name.is_some() && self.first_name.is_some())
    }

    /// True when no field at all was extracted.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Which decode path produced a successful result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMethod {
    Barcode,
    Ocr,
}

impl std::fmt::Display for ScanMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Barcode => f.write_str("barcode"),
            Self::Ocr => f.write_str("ocr"),
        }
    }
}

/// Why a scan produced nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The image could not be used at all (not loaded, zero-sized).
    InvalidInput(String),
    /// Both the barcode and the OCR path came up empty.
    NoDataExtracted,
    /// A caller-imposed wall-clock timeout elapsed.
    TimedOut,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(detail) => write!(f, "invalid input: {detail}"),
            Self::NoDataExtracted => f.write_str("no data extracted"),
            Self::TimedOut => f.write_str("scan timed out"),
        }
    }
}

/// Outcome of one scan attempt, handed straight to the form layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanResult {
    Success {
        method: ScanMethod,
        fields: IdentityFields,
    },
    Failure {
        reason: FailureReason,
    },
}

impl ScanResult {
    pub fn success(method: ScanMethod, fields: IdentityFields) -> Self {
        Self::Success { method, fields }
    }

    pub fn failure(reason: FailureReason) -> Self {
        Self::Failure { reason }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn method(&self) -> Option<ScanMethod> {
        match self {
            Self::Success { method, .. } => Some(*method),
            Self::Failure { .. } => None,
        }
    }

    pub fn fields(&self) -> Option<&IdentityFields> {
        match self {
            Self::Success { fields, .. } => Some(fields),
            Self::Failure { .. } => None,
        }
    }
}

// Wire shape: {"success":true,"method":..,"fields":..} | {"success":false,"reason":..}
impl Serialize for ScanResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Success { method, fields } => {
                let mut state = serializer.serialize_struct("ScanResult", 3)?;
                state.serialize_field("success", &true)?;
                state.serialize_field("method", method)?;
                state.serialize_field("fields", fields)?;
                state.end()
            }
            Self::Failure { reason } => {
                let mut state = serializer.serialize_struct("ScanResult", 2)?;
                state.serialize_field("success", &false)?;
                state.serialize_field("reason", &reason.to_string())?;
                state.end()
            }
        }
    }
}

/// A rectangle expressed as fractions (0.0..=1.0) of the source image size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A rectangle in whole pixels, guaranteed to lie inside the image it was
/// computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ImageRegion {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Resolve the region against an image of `image_width` x `image_height`.
    ///
    /// Fractional coordinates are floored and the result is clipped to the
    /// image. Returns `None` when nothing of the region is left.
    pub fn to_pixels(&self, image_width: u32, image_height: u32) -> Option<PixelRect> {
        let scale = |fraction: f64, dim: u32| -> u32 {
            let fraction = if fraction.is_finite() {
                fraction.clamp(0.0, 1.0)
            } else {
                0.0
            };
            (fraction * f64::from(dim)).floor() as u32
        };

        let x = scale(self.x, image_width).min(image_width);
        let y = scale(self.y, image_height).min(image_height);
        let width = scale(self.width, image_width).min(image_width - x);
        let height = scale(self.height, image_height).min(image_height - y);

        if width == 0 || height == 0 {
            return None;
        }
        Some(PixelRect {
            x,
            y,
            width,
            height,
        })
    }
}

/// Barcode search regions for the back of the card, in priority order.
///
/// The PDF417 symbol sits in the lower-right quadrant of the back side.
pub const DEFAULT_SEARCH_REGIONS: [ImageRegion; 4] = [
    // Lower-right corner, tight.
    ImageRegion::new(0.5, 0.65, 0.5, 0.35),
    // Lower-right corner, wider.
    ImageRegion::new(0.4, 0.6, 0.6, 0.4),
    // Full lower strip.
    ImageRegion::new(0.0, 0.6, 1.0, 0.4),
    // Lower half.
    ImageRegion::new(0.0, 0.5, 1.0, 0.5),
];

/// Whether `candidate` has the shape of a national ID number (7 or 8 digits).
pub fn is_valid_document_number(candidate: &str) -> bool {
    (7..=8).contains(&candidate.len()) && candidate.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tight_corner_region_on_1000x800() {
        let rect = DEFAULT_SEARCH_REGIONS[0].to_pixels(1000, 800).unwrap();
        assert_eq!(
            rect,
            PixelRect {
                x: 500,
                y: 520,
                width: 500,
                height: 280
            }
        );
    }

    #[test]
    fn regions_stay_inside_odd_sized_images() {
        for region in DEFAULT_SEARCH_REGIONS {
            let rect = region.to_pixels(333, 211).unwrap();
            assert!(rect.x + rect.width <= 333, "{rect:?}");
            assert!(rect.y + rect.height <= 211, "{rect:?}");
        }
    }

    #[test]
    fn region_collapsing_to_nothing_is_none() {
        assert!(DEFAULT_SEARCH_REGIONS[0].to_pixels(1, 1).is_none());
        assert!(ImageRegion::new(0.9, 0.9, 0.5, 0.5).to_pixels(10, 10).is_some());
        assert!(ImageRegion::new(1.0, 0.0, 1.0, 1.0).to_pixels(10, 10).is_none());
    }

    #[test]
    fn sex_accepts_exact_codes_only() {
        assert_eq!(Sex::from_code("M"), Some(Sex::Male));
        assert_eq!(Sex::from_code("F"), Some(Sex::Female));
        assert_eq!(Sex::from_code("X"), None);
        assert_eq!(Sex::from_code("m"), None);
        assert_eq!(Sex::from_code(""), None);
    }

    #[test]
    fn usability_needs_document_or_both_names() {
        let mut fields = IdentityFields {
            last_name: Some("GARCIA".into()),
            ..Default::default()
        };
        assert!(!fields.is_usable());
        fields.first_name = Some("JUAN".into());
        assert!(fields.is_usable());

        let only_number = IdentityFields {
            document_number: Some("30627652".into()),
            ..Default::default()
        };
        assert!(only_number.is_usable());
        assert!(IdentityFields::default().is_empty());
    }

    #[test]
    fn document_number_shape() {
        assert!(is_valid_document_number("30627652"));
        assert!(is_valid_document_number("4123456"));
        assert!(!is_valid_document_number("123456"));
        assert!(!is_valid_document_number("30.627.652"));
        assert!(!is_valid_document_number("306276521"));
    }

    #[test]
    fn scan_result_wire_shape() {
        let ok = ScanResult::success(
            ScanMethod::Ocr,
            IdentityFields {
                document_number: Some("30627652".into()),
                sex: Some(Sex::Female),
                ..Default::default()
            },
        );
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({
                "success": true,
                "method": "ocr",
                "fields": { "documentNumber": "30627652", "sex": "F" }
            })
        );

        let failed = ScanResult::failure(FailureReason::NoDataExtracted);
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            serde_json::json!({ "success": false, "reason": "no data extracted" })
        );
    }
}
