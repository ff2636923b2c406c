//! The emulated SDHR coprocessor: shadow memory, upload region, the
//! image/tileset/window resource tables, the command interpreter, and the
//! tile compositor.
//!
//! Two documented quirks of the reference protocol are preserved exactly
//! rather than "fixed", since other hosts on the wire depend on the
//! observed behavior:
//!
//! - tile extraction's Y asset offset is computed as `yoffset * xdim`, not
//!   `yoffset * ydim` (see [`tileset::TilesetTable::define`]);
//! - `UPDATE_WINDOW_SHIFT_TILES`'s `y_dir = ±1` branches copy the tileset
//!   row into both the `tilesets` and `tile_indexes` destination arrays
//!   (see [`window::WindowTable::shift_tiles`]).
//!
//! A third quirk — a logical bounds check using `>` rather than `>=` — is
//! preserved at the logical level but the scaled framebuffer write is
//! additionally clamped to the sink's real extent (see [`compositor`]).

pub mod assets;
pub mod compositor;
pub mod coprocessor;
pub mod error;
pub mod interpreter;
pub mod pixel;
pub mod shadow_memory;
pub mod tileset;
pub mod upload_region;
pub mod window;

pub use assets::{DecodedImage, DecodeError, ImageAssetTable, ImageDecoder, PngDecoder};
pub use compositor::LogicalFrame;
pub use coprocessor::{Coprocessor, PacketOutcome};
pub use error::{CoreError, CoreResult};
pub use shadow_memory::ShadowMemory;
pub use tileset::TilesetTable;
pub use upload_region::UploadRegion;
pub use window::WindowTable;
