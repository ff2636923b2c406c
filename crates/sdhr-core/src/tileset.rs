//! Tileset table: 256 slots, each an array of fixed-size tiles extracted
//! from one image asset into ARGB1555.

use crate::assets::ImageAssetTable;
use crate::error::{CoreError, CoreResult};
use crate::pixel::rgba8888_to_argb1555;

pub const TILESET_SLOT_COUNT: usize = 256;

/// One offset-table entry read ahead of each tile: `(xoffset, yoffset)`,
/// pre-multiplication by the tile dimensions.
#[derive(Clone, Copy, Debug)]
pub struct TileOffset {
    pub xoffset: u16,
    pub yoffset: u16,
}

/// One tileset slot.
#[derive(Default)]
pub struct Tileset {
    xdim: u8,
    ydim: u8,
    num_entries: u16,
    /// ARGB1555 pixels, `num_entries` tiles of `xdim*ydim` pixels each,
    /// row-major within each tile.
    tiles: Vec<u16>,
}

impl Tileset {
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn xdim(&self) -> u8 {
        self.xdim
    }

    pub fn ydim(&self) -> u8 {
        self.ydim
    }

    pub fn num_entries(&self) -> u16 {
        self.num_entries
    }

    /// Fetch the ARGB1555 pixel at `(x, y)` within tile `tile_idx`.
    pub fn tile_pixel(&self, tile_idx: u16, x: u8, y: u8) -> u16 {
        let tile_size = self.xdim as usize * self.ydim as usize;
        let base = tile_idx as usize * tile_size;
        let offset = y as usize * self.xdim as usize + x as usize;
        self.tiles[base + offset]
    }

    fn clear(&mut self) {
        self.tiles = Vec::new();
        self.xdim = 0;
        self.ydim = 0;
        self.num_entries = 0;
    }
}

/// The 256-slot tileset table.
pub struct TilesetTable {
    slots: Vec<Tileset>,
}

impl Default for TilesetTable {
    fn default() -> Self {
        let mut slots = Vec::with_capacity(TILESET_SLOT_COUNT);
        slots.resize_with(TILESET_SLOT_COUNT, Tileset::default);
        TilesetTable { slots }
    }
}

impl TilesetTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
    }

    pub fn get(&self, idx: u8) -> &Tileset {
        &self.slots[idx as usize]
    }

    /// Populate `tileset_idx` from `num_entries` `(xoffset, yoffset)` pairs,
    /// extracting each tile from `asset_idx` in `assets`.
    ///
    /// The Y asset coordinate is computed as `yoffset * xdim`, not `ydim` —
    /// a quirk of the source protocol preserved literally (see module docs
    /// in `lib.rs`). A mismatched `xdim`/`ydim` is logged once so the quirk
    /// is visible in traces without changing behavior.
    pub fn define(
        &mut self,
        tileset_idx: u8,
        num_entries: u16,
        xdim: u8,
        ydim: u8,
        asset_idx: u8,
        offsets: &[TileOffset],
        assets: &ImageAssetTable,
    ) -> CoreResult<()> {
        debug_assert_eq!(offsets.len(), num_entries as usize);
        if xdim != ydim {
            log::warn!(
                "tileset {tileset_idx}: xdim ({xdim}) != ydim ({ydim}); tile Y-offset \
                 is computed as yoffset*xdim, not yoffset*ydim"
            );
        }

        let asset = assets.get(asset_idx);
        let tile_size = xdim as usize * ydim as usize;
        let mut tiles = vec![0u16; tile_size * num_entries as usize];

        for (i, off) in offsets.iter().enumerate() {
            let asset_xoffset = off.xoffset as u64 * xdim as u64;
            let asset_yoffset = off.yoffset as u64 * xdim as u64;
            if asset_xoffset + xdim as u64 > asset.width() as u64
                || asset_yoffset + ydim as u64 > asset.height() as u64
            {
                return Err(CoreError::TileExtractionOutOfBounds { asset_idx });
            }
            let dest = &mut tiles[i * tile_size..(i + 1) * tile_size];
            for y in 0..ydim as u64 {
                for x in 0..xdim as u64 {
                    let [r, g, b, a] = asset
                        .pixel_rgba((asset_xoffset + x) as u32, (asset_yoffset + y) as u32)
                        .ok_or(CoreError::TileExtractionOutOfBounds { asset_idx })?;
                    dest[(y * xdim as u64 + x) as usize] = rgba8888_to_argb1555(r, g, b, a);
                }
            }
        }

        let slot = &mut self.slots[tileset_idx as usize];
        slot.xdim = xdim;
        slot.ydim = ydim;
        slot.num_entries = num_entries;
        slot.tiles = tiles;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{DecodedImage, ImageDecoder};

    struct Solid4x4Red;
    impl ImageDecoder for Solid4x4Red {
        fn decode(
            &self,
            _bytes: &[u8],
        ) -> Result<DecodedImage, crate::assets::DecodeError> {
            Ok(DecodedImage {
                width: 4,
                height: 4,
                rgba: vec![0xFF, 0x00, 0x00, 0xFF].repeat(16),
            })
        }
    }

    fn red_asset() -> ImageAssetTable {
        let mut assets = ImageAssetTable::new();
        assets.define(0, b"ignored", &Solid4x4Red).unwrap();
        assets
    }

    #[test]
    fn single_tile_extraction_round_trips_red() {
        let assets = red_asset();
        let mut table = TilesetTable::new();
        table
            .define(
                0,
                1,
                2,
                2,
                0,
                &[TileOffset { xoffset: 0, yoffset: 0 }],
                &assets,
            )
            .unwrap();
        let tile = table.get(0);
        assert!(!tile.is_empty());
        assert_eq!(tile.tile_pixel(0, 0, 0), 0x8000 | (0x1F << 10));
    }

    /// Q1: the Y asset offset uses `xdim`, so a non-square tile with a
    /// nonzero yoffset samples a different row than `ydim` would imply.
    #[test]
    fn y_offset_is_scaled_by_xdim_not_ydim() {
        let assets = red_asset();
        let mut table = TilesetTable::new();
        // xdim=1, ydim=2: yoffset=1 reaches asset row 1*xdim=1, still in
        // bounds for a 4x4 source; a ydim-scaled offset would reach row 2.
        table
            .define(
                0,
                1,
                1,
                2,
                0,
                &[TileOffset { xoffset: 0, yoffset: 1 }],
                &assets,
            )
            .expect("extraction within the (buggy) offset stays in bounds");
    }

    #[test]
    fn extraction_past_asset_bounds_is_an_error() {
        let assets = red_asset();
        let mut table = TilesetTable::new();
        let err = table
            .define(
                0,
                1,
                8,
                8,
                0,
                &[TileOffset { xoffset: 0, yoffset: 0 }],
                &assets,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::TileExtractionOutOfBounds { asset_idx: 0 }
        ));
    }

    #[test]
    fn reset_clears_slots() {
        let assets = red_asset();
        let mut table = TilesetTable::new();
        table
            .define(
                0,
                1,
                2,
                2,
                0,
                &[TileOffset { xoffset: 0, yoffset: 0 }],
                &assets,
            )
            .unwrap();
        table.reset();
        assert!(table.get(0).is_empty());
    }
}
