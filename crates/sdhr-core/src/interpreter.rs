//! Command interpreter: drains a command buffer one length-prefixed record
//! at a time, mutating the asset/tileset/window tables.

use sdhr_proto::{next_record, Cursor, Opcode};

use crate::assets::{ImageAssetTable, ImageDecoder};
use crate::error::{CoreError, CoreResult};
use crate::shadow_memory::ShadowMemory;
use crate::tileset::{TileOffset, TilesetTable};
use crate::upload_region::UploadRegion;
use crate::window::{WindowDef, WindowTable};

/// Interprets one `PROCESS` pulse's worth of buffered bytes against the
/// tables, in buffer order, aborting on the first error (I6).
pub struct Interpreter;

impl Interpreter {
    pub fn run(
        buffer: &[u8],
        shadow: &ShadowMemory,
        upload: &mut UploadRegion,
        assets: &mut ImageAssetTable,
        tilesets: &mut TilesetTable,
        windows: &mut WindowTable,
        decoder: &dyn ImageDecoder,
    ) -> CoreResult<()> {
        let mut cursor = Cursor::new(buffer);
        while let Some(record) = next_record(&mut cursor)? {
            let opcode = Opcode::try_from(record.opcode)?;
            if opcode.is_reserved_noop() {
                log::debug!("opcode {:?} is a reserved no-op", opcode);
                continue;
            }
            Self::dispatch(
                opcode,
                record.payload,
                shadow,
                upload,
                assets,
                tilesets,
                windows,
                decoder,
            )?;
            log::trace!("{:?}: success", opcode);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn dispatch(
        opcode: Opcode,
        payload: &[u8],
        shadow: &ShadowMemory,
        upload: &mut UploadRegion,
        assets: &mut ImageAssetTable,
        tilesets: &mut TilesetTable,
        windows: &mut WindowTable,
        decoder: &dyn ImageDecoder,
    ) -> CoreResult<()> {
        match opcode {
            Opcode::UploadData => Self::upload_data(payload, shadow, upload),
            Opcode::DefineImageAsset => Self::define_image_asset(payload, upload, assets, decoder),
            Opcode::DefineTileset => Self::define_tileset(payload, upload, assets, tilesets),
            Opcode::DefineTilesetImmediate => {
                Self::define_tileset_immediate(payload, assets, tilesets)
            }
            Opcode::DefineWindow => Self::define_window(payload, windows),
            Opcode::UpdateWindowSetBoth => Self::set_both(payload, windows, tilesets),
            Opcode::UpdateWindowSetUpload => Self::set_upload(payload, upload, windows, tilesets),
            Opcode::UpdateWindowSingleTileset => {
                Self::set_single_tileset(payload, windows, tilesets)
            }
            Opcode::UpdateWindowShiftTiles => Self::shift_tiles(payload, windows),
            Opcode::UpdateWindowSetWindowPosition => Self::set_window_position(payload, windows),
            Opcode::UpdateWindowAdjustWindowView => Self::adjust_window_view(payload, windows),
            Opcode::UpdateWindowEnable => Self::update_window_enable(payload, windows),
            Opcode::Ready => Ok(()),
            Opcode::DefineImageAssetFilename
            | Opcode::UploadDataFilename
            | Opcode::UpdateWindowSetBitmasks => unreachable!("reserved no-ops filtered earlier"),
        }
    }

    fn upload_data(payload: &[u8], shadow: &ShadowMemory, upload: &mut UploadRegion) -> CoreResult<()> {
        let mut c = Cursor::new(payload);
        let dest_med = c.read_u8()?;
        let dest_high = c.read_u8()?;
        let source_med = c.read_u8()?;
        let num_pages = c.read_u8()?;

        if num_pages as u16 > 256u16 - source_med as u16 {
            return Err(CoreError::UploadSourceOutOfRange);
        }
        let source_start = source_med as u16 as usize * 256;
        let data = shadow.read_slice(source_start as u16, num_pages as usize * 256);
        let dest_offset = UploadRegion::offset(0, dest_med, dest_high);
        upload.write_slice(dest_offset, data)
    }

    fn define_image_asset(
        payload: &[u8],
        upload: &UploadRegion,
        assets: &mut ImageAssetTable,
        decoder: &dyn ImageDecoder,
    ) -> CoreResult<()> {
        let mut c = Cursor::new(payload);
        let asset_idx = c.read_u8()?;
        let upload_med = c.read_u8()?;
        let upload_high = c.read_u8()?;
        let page_count = c.read_u16_le()?;

        let offset = UploadRegion::offset(0, upload_med, upload_high);
        let bytes = upload.read_slice(offset, page_count as u64 * 256)?;
        assets.define(asset_idx, bytes, decoder)
    }

    /// Reads the `(xoffset, yoffset)` table either from `upload` (for
    /// `DEFINE_TILESET`) or from inline `immediate` bytes (for
    /// `DEFINE_TILESET_IMMEDIATE`).
    fn read_tile_offsets(num_entries: u16, bytes: &[u8]) -> CoreResult<Vec<TileOffset>> {
        let mut c = Cursor::new(bytes);
        let mut offsets = Vec::with_capacity(num_entries as usize);
        for _ in 0..num_entries {
            let xoffset = c.read_u16_le()?;
            let yoffset = c.read_u16_le()?;
            offsets.push(TileOffset { xoffset, yoffset });
        }
        Ok(offsets)
    }

    fn define_tileset(
        payload: &[u8],
        upload: &UploadRegion,
        assets: &ImageAssetTable,
        tilesets: &mut TilesetTable,
    ) -> CoreResult<()> {
        let mut c = Cursor::new(payload);
        let tileset_idx = c.read_u8()?;
        let num_entries_raw = c.read_u8()?;
        let xdim = c.read_u8()?;
        let ydim = c.read_u8()?;
        let asset_idx = c.read_u8()?;
        let data_med = c.read_u8()?;
        let data_high = c.read_u8()?;

        let num_entries = if num_entries_raw == 0 {
            256
        } else {
            num_entries_raw as u16
        };
        let load_size = xdim as u64 * ydim as u64 * num_entries as u64 * 2;
        let offset = UploadRegion::offset(0, data_med, data_high);
        let bytes = upload.read_slice(offset, load_size)?;
        let offsets = Self::read_tile_offsets(num_entries, bytes)?;
        tilesets.define(tileset_idx, num_entries, xdim, ydim, asset_idx, &offsets, assets)
    }

    fn define_tileset_immediate(
        payload: &[u8],
        assets: &ImageAssetTable,
        tilesets: &mut TilesetTable,
    ) -> CoreResult<()> {
        let mut c = Cursor::new(payload);
        let tileset_idx = c.read_u8()?;
        let num_entries_raw = c.read_u8()?;
        let xdim = c.read_u8()?;
        let ydim = c.read_u8()?;
        let asset_idx = c.read_u8()?;

        let num_entries = if num_entries_raw == 0 {
            256
        } else {
            num_entries_raw as u16
        };
        let expected = num_entries as usize * 4;
        if c.remaining() != expected {
            return Err(CoreError::SizeMismatch {
                what: "DefineTilesetImmediate",
                declared: c.remaining() as u16,
                computed: expected as u16,
            });
        }
        let offsets = Self::read_tile_offsets(num_entries, c.read_bytes(expected)?)?;
        tilesets.define(tileset_idx, num_entries, xdim, ydim, asset_idx, &offsets, assets)
    }

    fn define_window(payload: &[u8], windows: &mut WindowTable) -> CoreResult<()> {
        let mut c = Cursor::new(payload);
        let window_idx = c.read_i8()? as u8;
        let black_or_wrap = c.read_u8()? != 0;
        let screen_xcount = c.read_u64_le()?;
        let screen_ycount = c.read_u64_le()?;
        let screen_xbegin = c.read_i64_le()?;
        let screen_ybegin = c.read_i64_le()?;
        let tile_xbegin = c.read_i64_le()?;
        let tile_ybegin = c.read_i64_le()?;
        let tile_xdim = c.read_u64_le()?;
        let tile_ydim = c.read_u64_le()?;
        let tile_xcount = c.read_u64_le()?;
        let tile_ycount = c.read_u64_le()?;

        windows.define(
            window_idx,
            WindowDef {
                black_or_wrap,
                screen_xcount,
                screen_ycount,
                screen_xbegin,
                screen_ybegin,
                tile_xbegin,
                tile_ybegin,
                tile_xdim,
                tile_ydim,
                tile_xcount,
                tile_ycount,
            },
        )
    }

    fn read_window_region_header(c: &mut Cursor<'_>) -> Result<(u8, i64, i64, u64, u64), CoreError> {
        let window_idx = c.read_i8()? as u8;
        let tile_xbegin = c.read_i64_le()?;
        let tile_ybegin = c.read_i64_le()?;
        let tile_xcount = c.read_u64_le()?;
        let tile_ycount = c.read_u64_le()?;
        Ok((window_idx, tile_xbegin, tile_ybegin, tile_xcount, tile_ycount))
    }

    fn set_both(payload: &[u8], windows: &mut WindowTable, tilesets: &TilesetTable) -> CoreResult<()> {
        let mut c = Cursor::new(payload);
        let (window_idx, xbegin, ybegin, xcount, ycount) = Self::read_window_region_header(&mut c)?;
        let expected = xcount as usize * ycount as usize * 2;
        if c.remaining() != expected {
            return Err(CoreError::SizeMismatch {
                what: "UpdateWindowSetBoth",
                declared: c.remaining() as u16,
                computed: expected as u16,
            });
        }
        let data = c.read_bytes(expected)?;
        let pairs: Vec<(u8, u8)> = data.chunks_exact(2).map(|p| (p[0], p[1])).collect();
        windows.set_both(window_idx, xbegin, ybegin, xcount, ycount, &pairs, tilesets)
    }

    fn set_upload(
        payload: &[u8],
        upload: &UploadRegion,
        windows: &mut WindowTable,
        tilesets: &TilesetTable,
    ) -> CoreResult<()> {
        let mut c = Cursor::new(payload);
        let (window_idx, xbegin, ybegin, xcount, ycount) = Self::read_window_region_header(&mut c)?;
        let upload_med = c.read_u8()?;
        let upload_high = c.read_u8()?;
        let data_size = xcount * ycount * 2;
        let offset = UploadRegion::offset(0, upload_med, upload_high);
        let data = upload.read_slice(offset, data_size)?;
        let pairs: Vec<(u8, u8)> = data.chunks_exact(2).map(|p| (p[0], p[1])).collect();
        windows.set_both(window_idx, xbegin, ybegin, xcount, ycount, &pairs, tilesets)
    }

    fn set_single_tileset(
        payload: &[u8],
        windows: &mut WindowTable,
        tilesets: &TilesetTable,
    ) -> CoreResult<()> {
        let mut c = Cursor::new(payload);
        let (window_idx, xbegin, ybegin, xcount, ycount) = Self::read_window_region_header(&mut c)?;
        let tileset_idx = c.read_u8()?;
        let expected = xcount as usize * ycount as usize;
        if c.remaining() != expected {
            return Err(CoreError::SizeMismatch {
                what: "UpdateWindowSingleTileset",
                declared: c.remaining() as u16,
                computed: expected as u16,
            });
        }
        let data = c.read_bytes(expected)?;
        windows.set_single_tileset(window_idx, tileset_idx, xbegin, ybegin, xcount, ycount, data, tilesets)
    }

    fn shift_tiles(payload: &[u8], windows: &mut WindowTable) -> CoreResult<()> {
        let mut c = Cursor::new(payload);
        let window_idx = c.read_i8()? as u8;
        let x_dir = c.read_i8()?;
        let y_dir = c.read_i8()?;
        windows.shift_tiles(window_idx, x_dir, y_dir)
    }

    fn set_window_position(payload: &[u8], windows: &mut WindowTable) -> CoreResult<()> {
        let mut c = Cursor::new(payload);
        let window_idx = c.read_i8()? as u8;
        let screen_xbegin = c.read_i64_le()?;
        let screen_ybegin = c.read_i64_le()?;
        windows.set_position(window_idx, screen_xbegin, screen_ybegin);
        Ok(())
    }

    fn adjust_window_view(payload: &[u8], windows: &mut WindowTable) -> CoreResult<()> {
        let mut c = Cursor::new(payload);
        let window_idx = c.read_i8()? as u8;
        let tile_xbegin = c.read_i64_le()?;
        let tile_ybegin = c.read_i64_le()?;
        windows.adjust_view(window_idx, tile_xbegin, tile_ybegin);
        Ok(())
    }

    fn update_window_enable(payload: &[u8], windows: &mut WindowTable) -> CoreResult<()> {
        let mut c = Cursor::new(payload);
        let window_idx = c.read_i8()? as u8;
        let enabled = c.read_u8()? != 0;
        windows.set_enabled(window_idx, enabled)
    }
}
