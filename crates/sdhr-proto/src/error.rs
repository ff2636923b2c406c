/// Errors that can occur while decoding the wire protocol.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ProtoError {
    /// Fewer bytes remain in the buffer than the read requires.
    #[error("insufficient buffer space: needed {needed}, had {available}")]
    Truncated { needed: usize, available: usize },

    /// A record's declared length is smaller than the 3-byte header it must
    /// at least contain (length prefix + opcode byte).
    #[error("record length {length} is smaller than the 3-byte header")]
    RecordTooShort { length: u16 },

    /// Byte did not correspond to a known opcode.
    #[error("unrecognized command opcode {0}")]
    UnknownOpcode(u8),

    /// Byte did not correspond to a known control pulse.
    #[error("unrecognized control pulse {0}")]
    UnknownControl(u8),
}
