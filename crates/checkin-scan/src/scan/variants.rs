// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Candidate raster generation for the barcode search.
//
// A phone photograph of the back of the card rarely decodes as-is: the
// symbol is small, off-centre and often washed out. The preprocessor offers
// the decoder a fixed, ordered list of candidates (full photo, cropped
// regions around where the PDF417 symbol sits, and a contrast-stretched copy).

use checkin_core::{ImageRegion, PixelRect, ScanConfig};
use image::DynamicImage;
use tracing::{debug, trace};

use crate::image::processor::ImageProcessor;

/// What a candidate raster was derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VariantKind {
    /// The photograph as supplied.
    Full,
    /// A crop of the photograph.
    Region { region: ImageRegion, rect: PixelRect },
    /// The full photograph with contrast stretched.
    Contrast { level: f32 },
}

impl std::fmt::Display for VariantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => f.write_str("full"),
            Self::Region { rect, .. } => write!(
                f,
                "region {}x{}+{}+{}",
                rect.width, rect.height, rect.x, rect.y
            ),
            Self::Contrast { level } => write!(f, "contrast {level}"),
        }
    }
}

/// One candidate raster offered to the barcode decoder.
#[derive(Debug, Clone)]
pub struct Variant {
    /// Position in the search order, starting at 0.
    pub index: usize,
    pub kind: VariantKind,
    pub image: DynamicImage,
}

/// Produces barcode search candidates for a photograph.
///
/// Holds only the search policy; each call to [`variants`](Self::variants)
/// starts a fresh, independent sequence.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    regions: Vec<ImageRegion>,
    contrast_level: f32,
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::from_config(&ScanConfig::default())
    }
}

impl ImagePreprocessor {
    pub fn new(regions: Vec<ImageRegion>, contrast_level: f32) -> Self {
        Self {
            regions,
            contrast_level,
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.regions.clone(), config.contrast_level)
    }

    /// Number of candidates a large enough photograph yields.
    pub fn max_variants(&self) -> usize {
        self.regions.len() + 2
    }

    /// Lazily generate the candidates for `image`, in priority order:
    /// the full image, each search region, then the contrast-stretched image.
    ///
    /// Regions that collapse to nothing on a tiny image are skipped. Each
    /// raster is only built when the iterator reaches it.
    pub fn variants<'a>(&'a self, image: &DynamicImage) -> Variants<'a> {
        Variants {
            preprocessor: self,
            source: ImageProcessor::from_dynamic(image.clone()),
            step: 0,
            emitted: 0,
        }
    }
}

/// Iterator returned by [`ImagePreprocessor::variants`].
pub struct Variants<'a> {
    preprocessor: &'a ImagePreprocessor,
    source: ImageProcessor,
    /// Next plan step: 0 = full, 1..=regions = crops, regions+1 = contrast.
    step: usize,
    emitted: usize,
}

impl Variants<'_> {
    fn emit(&mut self, kind: VariantKind, image: DynamicImage) -> Variant {
        let variant = Variant {
            index: self.emitted,
            kind,
            image,
        };
        self.emitted += 1;
        trace!(stage = "preprocess", index = variant.index, kind = %variant.kind, "Variant ready");
        variant
    }
}

impl Iterator for Variants<'_> {
    type Item = Variant;

    fn next(&mut self) -> Option<Variant> {
        let preprocessor = self.preprocessor;
        let regions = &preprocessor.regions;
        loop {
            let step = self.step;
            self.step += 1;

            if step == 0 {
                let full = self.source.as_dynamic().clone();
                return Some(self.emit(VariantKind::Full, full));
            }

            if let Some(region) = regions.get(step - 1) {
                let (width, height) = (self.source.width(), self.source.height());
                match region.to_pixels(width, height) {
                    Some(rect) => {
                        let cropped = self.source.crop(rect).into_dynamic();
                        return Some(self.emit(VariantKind::Region { region: *region, rect }, cropped));
                    }
                    None => {
                        debug!(stage = "preprocess", ?region, width, height, "Region empty on this image, skipping");
                        continue;
                    }
                }
            }

            if step == regions.len() + 1 {
                let level = preprocessor.contrast_level;
                let stretched = self.source.contrast_stretch(level).into_dynamic();
                return Some(self.emit(VariantKind::Contrast { level }, stretched));
            }

            return None;
        }
    }
}
