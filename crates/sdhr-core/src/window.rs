//! Window table: 256 slots, each a tile grid plus a viewport mapping grid
//! pixels to scan-out pixels.

use crate::error::{CoreError, CoreResult};
use crate::tileset::TilesetTable;

pub const WINDOW_SLOT_COUNT: usize = 256;

/// Maximum logical scan-out extent a window's visible area may cover (I1).
pub const MAX_SCREEN_WIDTH: u64 = 640;
pub const MAX_SCREEN_HEIGHT: u64 = 360;

/// One `(tileset_idx, tile_idx)` grid cell reference.
#[derive(Clone, Copy, Debug, Default)]
pub struct TileRef {
    pub tileset_idx: u8,
    pub tile_idx: u8,
}

/// One window slot.
pub struct Window {
    pub enabled: bool,
    pub black_or_wrap: bool,
    pub screen_xcount: u64,
    pub screen_ycount: u64,
    pub screen_xbegin: i64,
    pub screen_ybegin: i64,
    pub tile_xbegin: i64,
    pub tile_ybegin: i64,
    pub tile_xdim: u64,
    pub tile_ydim: u64,
    pub tile_xcount: u64,
    pub tile_ycount: u64,
    tilesets: Vec<u8>,
    tile_indexes: Vec<u8>,
}

impl Default for Window {
    fn default() -> Self {
        Window {
            enabled: false,
            black_or_wrap: false,
            screen_xcount: 0,
            screen_ycount: 0,
            screen_xbegin: 0,
            screen_ybegin: 0,
            tile_xbegin: 0,
            tile_ybegin: 0,
            tile_xdim: 0,
            tile_ydim: 0,
            tile_xcount: 0,
            tile_ycount: 0,
            tilesets: Vec::new(),
            tile_indexes: Vec::new(),
        }
    }
}

impl Window {
    pub fn is_empty_grid(&self) -> bool {
        self.tile_xcount == 0 || self.tile_ycount == 0
    }

    fn grid_len(&self) -> usize {
        (self.tile_xcount * self.tile_ycount) as usize
    }

    pub fn cell(&self, entry_index: usize) -> TileRef {
        TileRef {
            tileset_idx: self.tilesets[entry_index],
            tile_idx: self.tile_indexes[entry_index],
        }
    }
}

/// Definition parameters for `DEFINE_WINDOW`, matching the wire layout.
pub struct WindowDef {
    pub black_or_wrap: bool,
    pub screen_xcount: u64,
    pub screen_ycount: u64,
    pub screen_xbegin: i64,
    pub screen_ybegin: i64,
    pub tile_xbegin: i64,
    pub tile_ybegin: i64,
    pub tile_xdim: u64,
    pub tile_ydim: u64,
    pub tile_xcount: u64,
    pub tile_ycount: u64,
}

/// The 256-slot window table.
pub struct WindowTable {
    slots: Vec<Window>,
}

impl Default for WindowTable {
    fn default() -> Self {
        let mut slots = Vec::with_capacity(WINDOW_SLOT_COUNT);
        slots.resize_with(WINDOW_SLOT_COUNT, Window::default);
        WindowTable { slots }
    }
}

impl WindowTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            *slot = Window::default();
        }
    }

    pub fn get(&self, idx: u8) -> &Window {
        &self.slots[idx as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Window> {
        self.slots.iter()
    }

    /// `DEFINE_WINDOW`: validates I1 against the *incoming* definition
    /// (see Q4 in module docs), reallocates both grid arrays, clears
    /// `enabled`.
    pub fn define(&mut self, idx: u8, def: WindowDef) -> CoreResult<()> {
        if def.screen_xcount > MAX_SCREEN_WIDTH {
            return Err(CoreError::WindowExceedsResolution { axis: "x" });
        }
        if def.screen_ycount > MAX_SCREEN_HEIGHT {
            return Err(CoreError::WindowExceedsResolution { axis: "y" });
        }
        let grid_len = (def.tile_xcount * def.tile_ycount) as usize;
        let window = &mut self.slots[idx as usize];
        window.enabled = false;
        window.black_or_wrap = def.black_or_wrap;
        window.screen_xcount = def.screen_xcount;
        window.screen_ycount = def.screen_ycount;
        window.screen_xbegin = def.screen_xbegin;
        window.screen_ybegin = def.screen_ybegin;
        window.tile_xbegin = def.tile_xbegin;
        window.tile_ybegin = def.tile_ybegin;
        window.tile_xdim = def.tile_xdim;
        window.tile_ydim = def.tile_ydim;
        window.tile_xcount = def.tile_xcount;
        window.tile_ycount = def.tile_ycount;
        window.tilesets = vec![0u8; grid_len];
        window.tile_indexes = vec![0u8; grid_len];
        Ok(())
    }

    fn validate_cell(
        tilesets: &TilesetTable,
        tile_xdim: u64,
        tile_ydim: u64,
        tileset_idx: u8,
        tile_idx: u8,
    ) -> CoreResult<()> {
        let ts = tilesets.get(tileset_idx);
        if ts.xdim() as u64 != tile_xdim
            || ts.ydim() as u64 != tile_ydim
            || ts.num_entries() <= tile_idx as u16
        {
            return Err(CoreError::InvalidTileSpecification);
        }
        Ok(())
    }

    fn check_region(window: &Window, xbegin: i64, ybegin: i64, xcount: u64, ycount: u64) -> CoreResult<()> {
        if xbegin < 0 || ybegin < 0 {
            return Err(CoreError::TileRegionOutOfBounds);
        }
        if xbegin as u64 + xcount > window.tile_xcount || ybegin as u64 + ycount > window.tile_ycount {
            return Err(CoreError::TileRegionOutOfBounds);
        }
        Ok(())
    }

    /// `UPDATE_WINDOW_SET_BOTH` / `UPDATE_WINDOW_SET_UPLOAD`: write
    /// `(tileset_idx, tile_idx)` pairs over a rectangular sub-region.
    pub fn set_both(
        &mut self,
        idx: u8,
        xbegin: i64,
        ybegin: i64,
        xcount: u64,
        ycount: u64,
        pairs: &[(u8, u8)],
        tilesets: &TilesetTable,
    ) -> CoreResult<()> {
        {
            let window = &self.slots[idx as usize];
            Self::check_region(window, xbegin, ybegin, xcount, ycount)?;
        }
        let (tile_xdim, tile_ydim, tile_xcount) = {
            let window = &self.slots[idx as usize];
            (window.tile_xdim, window.tile_ydim, window.tile_xcount)
        };
        for (&(tileset_idx, tile_idx), flat) in pairs.iter().zip(0u64..) {
            Self::validate_cell(tilesets, tile_xdim, tile_ydim, tileset_idx, tile_idx)?;
            let tile_y = flat / xcount;
            let tile_x = flat % xcount;
            let entry = ((ybegin as u64 + tile_y) * tile_xcount + xbegin as u64 + tile_x) as usize;
            let window = &mut self.slots[idx as usize];
            window.tilesets[entry] = tileset_idx;
            window.tile_indexes[entry] = tile_idx;
        }
        Ok(())
    }

    /// `UPDATE_WINDOW_SINGLE_TILESET`: write only `tile_idx` per cell, all
    /// cells sharing one `tileset_idx`.
    pub fn set_single_tileset(
        &mut self,
        idx: u8,
        tileset_idx: u8,
        xbegin: i64,
        ybegin: i64,
        xcount: u64,
        ycount: u64,
        tile_indexes_in: &[u8],
        tilesets: &TilesetTable,
    ) -> CoreResult<()> {
        {
            let window = &self.slots[idx as usize];
            Self::check_region(window, xbegin, ybegin, xcount, ycount)?;
        }
        let (tile_xdim, tile_ydim, tile_xcount) = {
            let window = &self.slots[idx as usize];
            (window.tile_xdim, window.tile_ydim, window.tile_xcount)
        };
        for (&tile_idx, flat) in tile_indexes_in.iter().zip(0u64..) {
            Self::validate_cell(tilesets, tile_xdim, tile_ydim, tileset_idx, tile_idx)?;
            let tile_y = flat / xcount;
            let tile_x = flat % xcount;
            let entry = ((ybegin as u64 + tile_y) * tile_xcount + xbegin as u64 + tile_x) as usize;
            let window = &mut self.slots[idx as usize];
            window.tilesets[entry] = tileset_idx;
            window.tile_indexes[entry] = tile_idx;
        }
        Ok(())
    }

    /// `UPDATE_WINDOW_SHIFT_TILES`: shift the grid by one cell in X and/or
    /// Y. `y_dir = -1` and `y_dir = 1` reproduce the reference source's
    /// `tile_indexes[...] = tilesets[...]` mix-up (Q2) verbatim.
    pub fn shift_tiles(&mut self, idx: u8, x_dir: i8, y_dir: i8) -> CoreResult<()> {
        if !(-1..=1).contains(&x_dir) || !(-1..=1).contains(&y_dir) {
            return Err(CoreError::InvalidShiftDirection);
        }
        let window = &mut self.slots[idx as usize];
        if window.is_empty_grid() {
            return Err(CoreError::EmptyWindow);
        }
        let xcount = window.tile_xcount as usize;
        let ycount = window.tile_ycount as usize;

        if x_dir == -1 {
            for y in 0..ycount {
                let line = y * xcount;
                for x in 1..xcount {
                    window.tilesets[line + x - 1] = window.tilesets[line + x];
                    window.tile_indexes[line + x - 1] = window.tile_indexes[line + x];
                }
            }
        } else if x_dir == 1 {
            for y in 0..ycount {
                let line = y * xcount;
                for x in (1..xcount).rev() {
                    window.tilesets[line + x] = window.tilesets[line + x - 1];
                    window.tile_indexes[line + x] = window.tile_indexes[line + x - 1];
                }
            }
        }

        if y_dir == -1 {
            for y in 1..ycount {
                let line = y * xcount;
                let prev_line = line - xcount;
                for x in 0..xcount {
                    window.tilesets[prev_line + x] = window.tilesets[line + x];
                    log::debug!("shift_tiles y_dir=-1: tile_indexes mirrors tilesets, not tile_indexes");
                    window.tile_indexes[prev_line + x] = window.tilesets[line + x];
                }
            }
        } else if y_dir == 1 {
            for y in (1..ycount).rev() {
                let line = y * xcount;
                let prev_line = line - xcount;
                for x in 0..xcount {
                    window.tilesets[line + x] = window.tilesets[prev_line + x];
                    log::debug!("shift_tiles y_dir=1: tile_indexes mirrors tilesets, not tile_indexes");
                    window.tile_indexes[line + x] = window.tilesets[prev_line + x];
                }
            }
        }
        Ok(())
    }

    pub fn set_position(&mut self, idx: u8, screen_xbegin: i64, screen_ybegin: i64) {
        let window = &mut self.slots[idx as usize];
        window.screen_xbegin = screen_xbegin;
        window.screen_ybegin = screen_ybegin;
    }

    pub fn adjust_view(&mut self, idx: u8, tile_xbegin: i64, tile_ybegin: i64) {
        let window = &mut self.slots[idx as usize];
        window.tile_xbegin = tile_xbegin;
        window.tile_ybegin = tile_ybegin;
    }

    pub fn set_enabled(&mut self, idx: u8, enabled: bool) -> CoreResult<()> {
        let window = &mut self.slots[idx as usize];
        if enabled && window.is_empty_grid() {
            return Err(CoreError::EmptyWindow);
        }
        window.enabled = enabled;
        Ok(())
    }
}
