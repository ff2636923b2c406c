//! Wire types for the SDHR coprocessor bus protocol.
//!
//! Covers the 4-byte address packet the bridge streams over TCP, the
//! control-pulse and opcode enumerations, and a bounds-checked cursor for
//! decoding the length-prefixed command records the interpreter parses out
//! of the command buffer. This crate does no I/O and holds no device state;
//! it is the shared vocabulary between the host-facing server and the
//! coprocessor core.

mod cursor;
mod error;
mod opcode;
mod packet;
mod record;

pub use cursor::Cursor;
pub use error::ProtoError;
pub use opcode::Opcode;
pub use packet::{AddressPacket, ControlPulse};
pub use record::{next_record, RawRecord};
