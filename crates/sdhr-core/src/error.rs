use sdhr_proto::ProtoError;

/// Every way a `PROCESS` pulse can fail. Per the protocol, any failure here
/// is sticky for the duration of the pulse: it aborts interpretation of the
/// remaining command buffer, sets the error flag, and the buffer is still
/// cleared (I5/I6).
#[derive(Debug, Clone, thiserror::Error)]
pub enum CoreError {
    /// Malformed length prefix, truncated payload, or unknown opcode.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtoError),

    /// Declared record length doesn't match the header size plus the
    /// payload size computed from the record's own fields.
    #[error("{what} data size mismatch: declared length {declared}, computed {computed}")]
    SizeMismatch {
        what: &'static str,
        declared: u16,
        computed: u16,
    },

    /// `UPLOAD_DATA` source range runs past the top of shadow memory's
    /// 256-page main bank.
    #[error("UploadData attempting to load past top of memory")]
    UploadSourceOutOfRange,

    /// A read or write against the 16 MiB upload region fell outside its
    /// bounds (I4).
    #[error("data not bounded by uploaded data region")]
    UploadRegionOutOfBounds,

    /// The external image decoder rejected the bytes handed to it.
    #[error("image decode failed for asset {asset_idx}: {message}")]
    DecodeFailed { asset_idx: u8, message: String },

    /// Tile extraction read past the source image's bounds (I3).
    #[error("tile extraction out of bounds for asset {asset_idx}")]
    TileExtractionOutOfBounds { asset_idx: u8 },

    /// `DEFINE_WINDOW`'s incoming geometry failed the I1 bound.
    #[error("window exceeds max resolution: {axis}")]
    WindowExceedsResolution { axis: &'static str },

    /// A window-grid update addressed a cell outside the window's tile
    /// grid.
    #[error("tile update region exceeds tile dimensions")]
    TileRegionOutOfBounds,

    /// A cell referenced a tileset/tile-index pair violating I2.
    #[error("invalid tile specification")]
    InvalidTileSpecification,

    /// `UPDATE_WINDOW_SHIFT_TILES` direction outside {-1,0,1}.
    #[error("invalid tile shift direction")]
    InvalidShiftDirection,

    /// Shift or enable addressed a window with an empty tile grid.
    #[error("invalid window for operation: empty tile grid")]
    EmptyWindow,
}

pub type CoreResult<T> = Result<T, CoreError>;
