//! Top-level coprocessor: wires shadow memory, the upload region, the
//! resource tables, the interpreter, and the compositor behind the packet
//! demultiplexer described by the wire protocol.

use sdhr_display::FrameSink;
use sdhr_proto::{AddressPacket, ControlPulse};

use crate::assets::{ImageAssetTable, ImageDecoder, PngDecoder};
use crate::compositor::{self, LogicalFrame};
use crate::error::CoreError;
use crate::interpreter::Interpreter;
use crate::shadow_memory::ShadowMemory;
use crate::tileset::TilesetTable;
use crate::upload_region::UploadRegion;
use crate::window::WindowTable;

/// What the caller should do after handing a packet to [`Coprocessor::handle_packet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketOutcome {
    /// Nothing further required; the packet was a memory write, a buffered
    /// data byte, an enable/disable toggle, or an ignored low nibble.
    Nothing,
    /// A `RESET` pulse ran; the coprocessor's entire state was reinitialised.
    Reset,
    /// A `PROCESS` pulse was requested. Call [`Coprocessor::process`] next.
    ProcessRequested,
}

/// The emulated SDHR coprocessor. Generic over the image decoder so tests
/// can inject one that fails deterministically.
pub struct Coprocessor<D: ImageDecoder = PngDecoder> {
    shadow: ShadowMemory,
    upload: UploadRegion,
    assets: ImageAssetTable,
    tilesets: TilesetTable,
    windows: WindowTable,
    command_buffer: Vec<u8>,
    enabled: bool,
    last_error: Option<CoreError>,
    last_frame: LogicalFrame,
    decoder: D,
}

impl Coprocessor<PngDecoder> {
    pub fn new() -> Self {
        Self::with_decoder(PngDecoder)
    }
}

impl Default for Coprocessor<PngDecoder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: ImageDecoder> Coprocessor<D> {
    pub fn with_decoder(decoder: D) -> Self {
        Coprocessor {
            shadow: ShadowMemory::new(),
            upload: UploadRegion::new(),
            assets: ImageAssetTable::new(),
            tilesets: TilesetTable::new(),
            windows: WindowTable::new(),
            command_buffer: Vec::new(),
            enabled: false,
            last_error: None,
            last_frame: LogicalFrame::new(),
            decoder,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn last_error(&self) -> Option<&CoreError> {
        self.last_error.as_ref()
    }

    /// The reference source's `SDHRManager::GetPixel` accessor: the most
    /// recently composited frame's pixel, expanded to ARGB8888.
    pub fn get_pixel(&self, x: u32, y: u32) -> u32 {
        crate::pixel::argb1555_to_argb8888(self.last_frame.get(x, y))
    }

    /// Re-initialises every table, the shadow memory, the upload region,
    /// and clears the error flag and command buffer — the `RESET` control
    /// pulse.
    pub fn reset(&mut self) {
        self.shadow.reset();
        self.upload.reset();
        self.assets.reset();
        self.tilesets.reset();
        self.windows.reset();
        self.command_buffer.clear();
        self.enabled = false;
        self.last_error = None;
        self.last_frame = LogicalFrame::new();
    }

    /// Demultiplexes one 4-byte bus packet (see the stream demultiplexer
    /// module docs): memory writes update shadow memory, data-channel bytes
    /// append to the command buffer, and control-channel bytes decode to a
    /// [`ControlPulse`].
    pub fn handle_packet(&mut self, packet: AddressPacket) -> PacketOutcome {
        if packet.is_memory_write() {
            self.shadow.write(packet.addr, packet.data);
            return PacketOutcome::Nothing;
        }
        match packet.channel() {
            0x00 => match ControlPulse::try_from(packet.data) {
                Ok(ControlPulse::Disable) => {
                    self.enabled = false;
                    PacketOutcome::Nothing
                }
                Ok(ControlPulse::Enable) => {
                    self.enabled = true;
                    PacketOutcome::Nothing
                }
                Ok(ControlPulse::Reset) => {
                    self.reset();
                    PacketOutcome::Reset
                }
                Ok(ControlPulse::Process) => PacketOutcome::ProcessRequested,
                Err(e) => {
                    log::error!("unknown control pulse: {e}");
                    PacketOutcome::Nothing
                }
            },
            0x01 => {
                self.command_buffer.push(packet.data);
                PacketOutcome::Nothing
            }
            _ => PacketOutcome::Nothing,
        }
    }

    /// Drains and interprets the command buffer (the `PROCESS` pulse's
    /// effect on the command interpreter). The buffer is always cleared
    /// afterward (I5), regardless of outcome.
    pub fn process(&mut self) -> Result<(), CoreError> {
        self.last_error = None;
        let result = Interpreter::run(
            &self.command_buffer,
            &self.shadow,
            &mut self.upload,
            &mut self.assets,
            &mut self.tilesets,
            &mut self.windows,
            &self.decoder,
        );
        self.command_buffer.clear();
        if let Err(e) = &result {
            log::error!("PROCESS pulse failed: {e}");
            self.last_error = Some(e.clone());
        }
        result
    }

    /// Runs one composition pass into `sink` if enabled, matching the
    /// reference source's `DrawWindowsIntoBuffer` call site: only invoked
    /// by the caller after a successful [`Coprocessor::process`] while
    /// [`Coprocessor::is_enabled`].
    pub fn draw_into(&mut self, sink: &mut dyn FrameSink) {
        compositor::composite(&self.windows, &self.tilesets, &mut self.last_frame, sink);
    }
}
