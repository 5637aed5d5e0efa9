// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: loading, cropping and contrast stretching of document
// photographs. Operates on in-memory images using the `image` and `imageproc`
// crates.

use checkin_core::PixelRect;
use checkin_core::error::CheckinError;
use image::{DynamicImage, Rgba};
use imageproc::map::map_colors;
use tracing::{debug, info, instrument};

/// Image operations on a single in-memory photograph.
///
/// Transformations borrow `self` and return a new `ImageProcessor`, so the
/// source photograph stays available for the next candidate variant.
///
/// ```ignore
/// let photo = ImageProcessor::open("dni-back.jpg")?;
/// let corner = photo.crop(PixelRect { x: 500, y: 520, width: 500, height: 280 });
/// let stretched = photo.contrast_stretch(1.5);
/// ```
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, CheckinError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            CheckinError::InvalidImage(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(
            width = img.width(),
            height = img.height(),
            "Image loaded"
        );
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, CheckinError> {
        let img = image::load_from_memory(data).map_err(|err| {
            CheckinError::InvalidImage(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Crop a rectangular region from the image.
    ///
    /// The rectangle is clamped to the image bounds, so an oversized request
    /// yields whatever part of it overlaps the image.
    #[instrument(skip(self))]
    pub fn crop(&self, rect: PixelRect) -> Self {
        let img_w = self.image.width();
        let img_h = self.image.height();

        let safe_x = rect.x.min(img_w.saturating_sub(1));
        let safe_y = rect.y.min(img_h.saturating_sub(1));
        let safe_w = rect.width.min(img_w - safe_x);
        let safe_h = rect.height.min(img_h - safe_y);

        debug!(safe_x, safe_y, safe_w, safe_h, "Cropping image");

        Self {
            image: self.image.crop_imm(safe_x, safe_y, safe_w, safe_h),
        }
    }

    /// Stretch contrast around mid-grey.
    ///
    /// Each colour channel `c` becomes `factor * (c - 128) + 128` with
    /// `factor = 259 * (level + 255) / (255 * (259 - level))`. Results are
    /// rounded and clamped to `0..=255`; alpha is left alone.
    #[instrument(skip(self), fields(level))]
    pub fn contrast_stretch(&self, level: f32) -> Self {
        let factor = contrast_factor(level);
        debug!(factor, "Stretching contrast");

        let rgba = self.image.to_rgba8();
        let stretch = |channel: u8| -> u8 {
            let val = factor * (f32::from(channel) - 128.0) + 128.0;
            val.round().clamp(0.0, 255.0) as u8
        };
        let stretched = map_colors(&rgba, |Rgba([r, g, b, a])| {
            Rgba([stretch(r), stretch(g), stretch(b), a])
        });

        Self {
            image: DynamicImage::ImageRgba8(stretched),
        }
    }
}

/// Multiplier applied around mid-grey for a given contrast level.
pub fn contrast_factor(level: f32) -> f32 {
    (259.0 * (level + 255.0)) / (255.0 * (259.0 - level))
}
