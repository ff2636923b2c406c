//! Tile compositor: draws all enabled windows, in ascending slot order,
//! into a [`FrameSink`]'s 3x-scaled ARGB8888 back buffer.

use sdhr_display::FrameSink;

use crate::pixel::argb1555_to_argb8888;
use crate::tileset::TilesetTable;
use crate::window::{Window, WindowTable};

/// Logical (pre-scale) scan-out extent the reference protocol targets.
pub const LOGICAL_WIDTH: i64 = 640;
pub const LOGICAL_HEIGHT: i64 = 360;

/// ARGB1555 value for opaque black, used for the black-outside-grid policy.
const OPAQUE_BLACK_1555: u16 = 0x8000;

/// The most recently composited frame, retained at logical (pre-3x-scale)
/// resolution in ARGB1555 for [`crate::Coprocessor::get_pixel`].
pub struct LogicalFrame {
    pub width: usize,
    pub height: usize,
    pixels: Vec<u16>,
}

impl Default for LogicalFrame {
    fn default() -> Self {
        LogicalFrame {
            width: LOGICAL_WIDTH as usize,
            height: LOGICAL_HEIGHT as usize,
            pixels: vec![0; LOGICAL_WIDTH as usize * LOGICAL_HEIGHT as usize],
        }
    }
}

impl LogicalFrame {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&mut self, x: i64, y: i64, pixel: u16) {
        self.pixels[y as usize * self.width + x as usize] = pixel;
    }

    pub fn get(&self, x: u32, y: u32) -> u16 {
        self.pixels[y as usize * self.width + x as usize]
    }
}

/// Composites every enabled window into `sink` and `frame`.
///
/// Preserves the reference source's logical bounds check, which compares
/// with `>` rather than `>=` against the 640x360 extent (Q3): a window
/// positioned exactly at the logical edge can write one row/column past
/// it. The *scaled* write is additionally clamped against the sink's real,
/// already-physical `width() x height()` extent (those already describe
/// the 3x-scaled back buffer, per the `FrameSink` contract) so a
/// pathological window position can never write outside the allocated
/// back buffer.
///
/// Tile-grid wrap indices use Euclidean division/remainder rather than the
/// reference source's truncating C integer division, which underflows to
/// an enormous unsigned value for negative tile coordinates; floor-based
/// wrapping is the only reading consistent with the documented wrap
/// scenario.
pub fn composite(
    windows: &WindowTable,
    tilesets: &TilesetTable,
    frame: &mut LogicalFrame,
    sink: &mut dyn FrameSink,
) {
    let sink_width = sink.width() as i64;
    let sink_height = sink.height() as i64;
    let stride = sink.stride() as i64;
    let map = sink.map_mut();

    for window in windows.iter().filter(|w| w.enabled) {
        for tile_y in window.tile_ybegin..window.tile_ybegin + window.screen_ycount as i64 {
            let tile_yindex_raw = tile_y.div_euclid(window.tile_ydim as i64);
            let tile_yoffset = tile_y.rem_euclid(window.tile_ydim as i64) as u8;

            for tile_x in window.tile_xbegin..window.tile_xbegin + window.screen_xcount as i64 {
                let tile_xindex_raw = tile_x.div_euclid(window.tile_xdim as i64);
                let tile_xoffset = tile_x.rem_euclid(window.tile_xdim as i64) as u8;

                let out_of_grid = tile_xindex_raw < 0
                    || tile_xindex_raw >= window.tile_xcount as i64
                    || tile_yindex_raw < 0
                    || tile_yindex_raw >= window.tile_ycount as i64;

                let pixel_1555 = if out_of_grid && !window.black_or_wrap {
                    OPAQUE_BLACK_1555
                } else {
                    let xcount = window.tile_xcount as i64;
                    let ycount = window.tile_ycount as i64;
                    let tile_xindex = tile_xindex_raw.rem_euclid(xcount) as u64;
                    let tile_yindex = tile_yindex_raw.rem_euclid(ycount) as u64;
                    let entry = (tile_yindex * window.tile_xcount + tile_xindex) as usize;
                    sample(window, tilesets, entry, tile_xoffset, tile_yoffset)
                };

                if pixel_1555 & 0x8000 == 0 {
                    continue;
                }

                let screen_x = tile_x + window.screen_xbegin - window.tile_xbegin;
                let screen_y = tile_y + window.screen_ybegin - window.tile_ybegin;
                // Q3: the reference source's bound is `>`, not `>=`.
                if screen_x < 0 || screen_y < 0 || screen_x > LOGICAL_WIDTH || screen_y > LOGICAL_HEIGHT {
                    continue;
                }
                if screen_x < LOGICAL_WIDTH && screen_y < LOGICAL_HEIGHT {
                    frame.set(screen_x, screen_y, pixel_1555);
                }

                let argb8888 = argb1555_to_argb8888(pixel_1555);
                write_scaled_block(map, stride, sink_width, sink_height, screen_x, screen_y, argb8888);
            }
        }
    }
}

/// Samples one grid cell's tile pixel, treating an undefined tileset slot
/// or an out-of-range tile index as fully transparent rather than
/// indexing into an empty or too-short raster. A window can be enabled
/// with grid cells that were never written by `UPDATE_WINDOW_SET_*`
/// (`set_enabled` only requires a non-empty grid, not a fully populated
/// one), so those cells keep their default `TileRef { tileset_idx: 0,
/// tile_idx: 0 }`, which may reference a tileset slot nothing has defined.
fn sample(
    window: &Window,
    tilesets: &TilesetTable,
    entry: usize,
    tile_xoffset: u8,
    tile_yoffset: u8,
) -> u16 {
    let cell = window.cell(entry);
    let tileset = tilesets.get(cell.tileset_idx);
    if tileset.is_empty() || cell.tile_idx as u16 >= tileset.num_entries() {
        return 0;
    }
    tileset.tile_pixel(cell.tile_idx as u16, tile_xoffset, tile_yoffset)
}

fn write_scaled_block(
    map: &mut [u8],
    stride: i64,
    sink_width: i64,
    sink_height: i64,
    screen_x: i64,
    screen_y: i64,
    argb8888: u32,
) {
    let bytes = argb8888.to_le_bytes();
    for i in 0..3i64 {
        let y = 3 * screen_y + i;
        if y < 0 || y >= sink_height {
            continue;
        }
        for j in 0..3i64 {
            let x = 3 * screen_x + j;
            if x < 0 || x >= sink_width {
                continue;
            }
            let offset = (y * stride + x * 4) as usize;
            if offset + 4 <= map.len() {
                map[offset..offset + 4].copy_from_slice(&bytes);
            }
        }
    }
}
