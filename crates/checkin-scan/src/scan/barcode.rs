// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF417 decoding of candidate rasters using `rxing`.

use std::collections::HashSet;

use checkin_core::error::{CheckinError, Result};
use image::DynamicImage;
use rxing::common::HybridBinarizer;
use rxing::{
    BarcodeFormat, BinaryBitmap, DecodeHintType, DecodeHintValue, DecodingHintDictionary,
    Exceptions, MultiFormatReader, RGBLuminanceSource, Reader,
};
use tracing::{debug, instrument, trace};

/// Reads the raw text payload of a barcode from one raster.
///
/// `Ok(None)` means no symbol was found (the expected outcome for most
/// variants). `Err` is reserved for the primitive itself failing.
pub trait BarcodeDecoder: Send + Sync {
    fn decode(&self, image: &DynamicImage) -> Result<Option<String>>;
}

/// PDF417-only decoder with the "try harder" search enabled.
///
/// Restricting the symbology keeps incidental QR codes or 1D barcodes in the
/// photograph from being mistaken for the ID payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct Pdf417Decoder;

impl Pdf417Decoder {
    pub fn new() -> Self {
        Self
    }

    fn hints() -> DecodingHintDictionary {
        let mut hints = DecodingHintDictionary::new();
        hints.insert(
            DecodeHintType::POSSIBLE_FORMATS,
            DecodeHintValue::PossibleFormats(HashSet::from([BarcodeFormat::PDF_417])),
        );
        hints.insert(DecodeHintType::TRY_HARDER, DecodeHintValue::TryHarder(true));
        hints
    }

    fn decode_luma(&self, image: &DynamicImage) -> Result<Option<String>> {
        let gray = image.to_luma8();
        let (width, height) = gray.dimensions();

        // Packed 0xAARRGGBB with the grey level repeated per channel.
        let pixels: Vec<u32> = gray
            .as_raw()
            .iter()
            .map(|&g| {
                let g = u32::from(g);
                0xFF00_0000 | (g << 16) | (g << 8) | g
            })
            .collect();

        let source =
            RGBLuminanceSource::new_with_width_height_pixels(width as usize, height as usize, &pixels);
        let mut bitmap = BinaryBitmap::new(HybridBinarizer::new(source));
        let mut reader = MultiFormatReader::default();

        match reader.decode_with_hints(&mut bitmap, &Self::hints()) {
            Ok(result) => Ok(Some(result.getText().to_string())),
            Err(
                Exceptions::NotFoundException(_)
                | Exceptions::FormatException(_)
                | Exceptions::ChecksumException(_),
            ) => Ok(None),
            Err(err) => Err(CheckinError::Barcode(err.to_string())),
        }
    }
}

impl BarcodeDecoder for Pdf417Decoder {
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn decode(&self, image: &DynamicImage) -> Result<Option<String>> {
        if image.width() == 0 || image.height() == 0 {
            return Ok(None);
        }

        let outcome = self.decode_luma(image);
        match &outcome {
            Ok(Some(payload)) => {
                debug!(stage = "barcode", payload_len = payload.len(), "PDF417 symbol decoded");
                trace!(stage = "barcode", %payload, "Raw payload");
            }
            Ok(None) => trace!(stage = "barcode", "No PDF417 symbol"),
            Err(err) => debug!(stage = "barcode", error = %err, "Decoder failed"),
        }
        outcome
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use rxing::Writer;
    use rxing::common::BitMatrix;
    use rxing::pdf417::PDF417Writer;
    use rxing::qrcode::QRCodeWriter;

    pub(crate) const REFERENCE_PAYLOAD: &str = "001@GARCIA@JUAN@M@30627652@A@19900115@20150101";

    fn rasterize(matrix: &BitMatrix) -> GrayImage {
        GrayImage::from_fn(matrix.getWidth(), matrix.getHeight(), |x, y| {
            Luma([if matrix.get(x, y) { 0 } else { 255 }])
        })
    }

    /// A printed PDF417 symbol carrying `payload`, quiet zone included.
    pub(crate) fn pdf417_raster(payload: &str) -> GrayImage {
        let matrix = PDF417Writer
            .encode(payload, &BarcodeFormat::PDF_417, 600, 200)
            .unwrap();
        rasterize(&matrix)
    }

    fn qr_raster(payload: &str) -> GrayImage {
        let matrix = QRCodeWriter
            .encode(payload, &BarcodeFormat::QR_CODE, 300, 300)
            .unwrap();
        rasterize(&matrix)
    }

    #[test]
    fn printed_symbol_decodes_to_payload() {
        let decoder = Pdf417Decoder::new();
        let symbol = DynamicImage::ImageLuma8(pdf417_raster(REFERENCE_PAYLOAD));
        assert_eq!(
            decoder.decode(&symbol).unwrap().as_deref(),
            Some(REFERENCE_PAYLOAD)
        );
    }

    #[test]
    fn qr_codes_are_ignored() {
        let decoder = Pdf417Decoder::new();
        let qr = DynamicImage::ImageLuma8(qr_raster(REFERENCE_PAYLOAD));
        assert!(decoder.decode(&qr).unwrap().is_none());
    }

    #[test]
    fn blank_image_has_no_symbol() {
        let decoder = Pdf417Decoder::new();
        let blank = DynamicImage::ImageLuma8(GrayImage::from_pixel(200, 120, Luma([255u8])));
        assert!(decoder.decode(&blank).unwrap().is_none());
    }

    #[test]
    fn noise_yields_no_payload() {
        let decoder = Pdf417Decoder::new();
        let noise = GrayImage::from_fn(160, 90, |x, y| {
            Luma([if (x * 7 + y * 13) % 5 < 2 { 0 } else { 255 }])
        });
        let outcome = decoder.decode(&DynamicImage::ImageLuma8(noise));
        assert!(!matches!(outcome, Ok(Some(_))), "got {outcome:?}");
    }

    #[test]
    fn empty_image_is_not_found() {
        let decoder = Pdf417Decoder::new();
        let empty = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        assert!(decoder.decode(&empty).unwrap().is_none());
    }
}
