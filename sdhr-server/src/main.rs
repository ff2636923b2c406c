//! TCP host for the SDHR coprocessor.
//!
//! Accepts one client at a time on the bus-packet socket, feeds its 4-byte
//! packets through [`sdhr_core::Coprocessor`], and drives a [`FrameSink`]
//! when a `PROCESS` pulse succeeds while the coprocessor is enabled.

use std::io::{ErrorKind, Read};
use std::net::{TcpListener, TcpStream};

use clap::Parser;
use sdhr_core::{Coprocessor, PacketOutcome};
use sdhr_display::{DrmFrameSink, FrameSink, MemoryFrameSink};
use sdhr_proto::AddressPacket;

/// Logical scan-out resolution (640x360) scaled 3x, used to size the
/// in-memory fallback sink.
const FAKE_DISPLAY_WIDTH: u32 = 1920;
const FAKE_DISPLAY_HEIGHT: u32 = 1080;

#[derive(Parser)]
#[command(name = "sdhr-server")]
#[command(about = "SDHR coprocessor host: bus-packet TCP server and compositor", long_about = None)]
struct Cli {
    /// TCP port to listen on for the bus-packet stream.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// DRM device node to scan out to, e.g. /dev/dri/card0.
    #[arg(long, default_value = "/dev/dri/card0")]
    drm_device: String,

    /// Use an in-memory framebuffer instead of a real DRM device.
    #[arg(long)]
    fake_display: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut sink = open_sink(&cli)?;

    let listener = TcpListener::bind(("0.0.0.0", cli.port))?;
    log::info!("sdhr-server: listening on port {}", cli.port);

    loop {
        let (stream, addr) = listener.accept()?;
        log::info!("accepted connection from {addr}");
        let mut core = Coprocessor::new();
        if let Err(e) = serve_client(stream, &mut core, sink.as_mut()) {
            log::error!("client {addr} disconnected: {e}");
        }
    }
}

fn open_sink(cli: &Cli) -> anyhow::Result<Box<dyn FrameSink>> {
    if cli.fake_display {
        log::info!("sdhr-server: using in-memory fake display");
        return Ok(Box::new(MemoryFrameSink::new(FAKE_DISPLAY_WIDTH, FAKE_DISPLAY_HEIGHT)));
    }
    log::info!("sdhr-server: opening DRM device {}", cli.drm_device);
    Ok(Box::new(DrmFrameSink::open(&cli.drm_device)?))
}

fn serve_client(
    mut stream: TcpStream,
    core: &mut Coprocessor,
    sink: &mut dyn FrameSink,
) -> std::io::Result<()> {
    let mut buf = [0u8; 4];
    loop {
        match stream.read_exact(&mut buf) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e),
        }
        let packet = AddressPacket::from_bytes(buf);
        match core.handle_packet(packet) {
            PacketOutcome::Nothing | PacketOutcome::Reset => {}
            PacketOutcome::ProcessRequested => {
                let succeeded = core.process().is_ok();
                if succeeded && core.is_enabled() {
                    core.draw_into(sink);
                    if let Err(e) = sink.present() {
                        log::error!("display present failed: {e}");
                    }
                }
            }
        }
    }
}
