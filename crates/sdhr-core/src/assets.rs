//! Image asset table: 256 slots, each owning a decoded RGBA raster.

use crate::error::{CoreError, CoreResult};

/// Number of slots in the image asset table.
pub const ASSET_SLOT_COUNT: usize = 256;

/// A decoded image: 8-bit-per-channel RGBA, row-major, no padding.
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Error returned by an [`ImageDecoder`] when the input bytes don't form a
/// valid image.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct DecodeError(pub String);

/// The external image decoder contract. `sdhr-core` is generic over this so
/// tests can inject a decoder that fails deterministically without needing
/// real PNG bytes.
pub trait ImageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, DecodeError>;
}

/// Decodes PNG bytes via the `image` crate; the default decoder, matching
/// the contract's "expected input format is PNG".
#[derive(Default)]
pub struct PngDecoder;

impl ImageDecoder for PngDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
        let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
            .map_err(|e| DecodeError(e.to_string()))?;
        let rgba = img.to_rgba8();
        let (width, height) = (rgba.width(), rgba.height());
        Ok(DecodedImage {
            width,
            height,
            rgba: rgba.into_raw(),
        })
    }
}

/// One image asset slot: the decoded raster plus its dimensions, or empty.
#[derive(Default)]
pub struct ImageAsset {
    raster: Option<DecodedImage>,
}

impl ImageAsset {
    pub fn is_empty(&self) -> bool {
        self.raster.is_none()
    }

    pub fn width(&self) -> u32 {
        self.raster.as_ref().map_or(0, |r| r.width)
    }

    pub fn height(&self) -> u32 {
        self.raster.as_ref().map_or(0, |r| r.height)
    }

    /// Fetch the RGBA8888 pixel at `(x, y)`, or `None` past the image edge.
    pub fn pixel_rgba(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let raster = self.raster.as_ref()?;
        if x >= raster.width || y >= raster.height {
            return None;
        }
        let idx = (y as usize * raster.width as usize + x as usize) * 4;
        let slice = raster.rgba.get(idx..idx + 4)?;
        Some([slice[0], slice[1], slice[2], slice[3]])
    }

    fn set(&mut self, image: DecodedImage) {
        self.raster = Some(image);
    }

    fn clear(&mut self) {
        self.raster = None;
    }
}

/// The 256-slot image asset table.
pub struct ImageAssetTable {
    slots: Vec<ImageAsset>,
}

impl Default for ImageAssetTable {
    fn default() -> Self {
        let mut slots = Vec::with_capacity(ASSET_SLOT_COUNT);
        slots.resize_with(ASSET_SLOT_COUNT, ImageAsset::default);
        ImageAssetTable { slots }
    }
}

impl ImageAssetTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
    }

    pub fn get(&self, idx: u8) -> &ImageAsset {
        &self.slots[idx as usize]
    }

    /// Decode `bytes` and install the result into `idx`, releasing any
    /// prior raster first. On decode failure the slot is left empty and a
    /// typed error is returned; the caller is responsible for setting the
    /// sticky error state.
    pub fn define(
        &mut self,
        idx: u8,
        bytes: &[u8],
        decoder: &dyn ImageDecoder,
    ) -> CoreResult<()> {
        self.slots[idx as usize].clear();
        match decoder.decode(bytes) {
            Ok(image) => {
                self.slots[idx as usize].set(image);
                Ok(())
            }
            Err(e) => Err(CoreError::DecodeFailed {
                asset_idx: idx,
                message: e.0,
            }),
        }
    }
}
