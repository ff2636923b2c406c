//! End-to-end scenario tests (S1-S6): drives a [`Coprocessor`] purely
//! through the packet interface, the way a real bus bridge would.

use sdhr_core::assets::{DecodedImage, DecodeError, ImageDecoder};
use sdhr_core::{Coprocessor, PacketOutcome};
use sdhr_display::MemoryFrameSink;
use sdhr_proto::AddressPacket;

/// A decoder that ignores its input and always returns a solid 2x2 red
/// raster, so scenario tests don't need real PNG bytes.
struct Solid2x2Red;
impl ImageDecoder for Solid2x2Red {
    fn decode(&self, _bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
        Ok(DecodedImage {
            width: 2,
            height: 2,
            rgba: vec![0xFF, 0x00, 0x00, 0xFF].repeat(4),
        })
    }
}

fn mem(addr: u16, data: u8) -> AddressPacket {
    AddressPacket { addr, data, pad: 0 }
}

fn data_byte(data: u8) -> AddressPacket {
    AddressPacket { addr: 0x0001, data, pad: 0 }
}

fn control(value: u8) -> AddressPacket {
    AddressPacket { addr: 0x0000, data: value, pad: 0 }
}

fn push_record(core: &mut Coprocessor<Solid2x2Red>, opcode: u8, payload: &[u8]) {
    let length = (payload.len() + 3) as u16;
    for b in length.to_le_bytes() {
        core.handle_packet(data_byte(b));
    }
    core.handle_packet(data_byte(opcode));
    for &b in payload {
        core.handle_packet(data_byte(b));
    }
}

fn new_core() -> Coprocessor<Solid2x2Red> {
    Coprocessor::with_decoder(Solid2x2Red)
}

/// S1 - memory shadow.
#[test]
fn s1_memory_shadow() {
    let mut core = new_core();
    core.handle_packet(mem(0x0200, 0xAB));
    core.handle_packet(mem(0xBFFF, 0xCD));
    assert_eq!(core.get_pixel(0, 0), 0); // nothing composited yet, sanity check the accessor works
}

/// S2 - enable/process with an empty buffer.
#[test]
fn s2_enable_process_empty() {
    let mut core = new_core();
    core.handle_packet(control(1)); // ENABLE
    assert_eq!(core.handle_packet(control(2)), PacketOutcome::ProcessRequested); // PROCESS
    core.process().unwrap();
    assert!(core.last_error().is_none());
    assert!(core.is_enabled());
}

fn define_red_tile_window(core: &mut Coprocessor<Solid2x2Red>) {
    // (a)+(b): upload 256 bytes (only the leading 16 matter to a real
    // decoder; the fake decoder ignores all of it) and decode as asset 0.
    for i in 0..256u16 {
        core.handle_packet(mem(0x0300 + i, (i % 4 == 3) as u8 * 0xFF));
    }
    push_record(core, 1, &[0, 0, 3, 1]); // UPLOAD_DATA dest=(0,0) source_med=3 pages=1
    push_record(core, 2, &[0, 0, 0, 1, 0]); // DEFINE_IMAGE_ASSET asset=0 upload=(0,0) pages=1(u16 LE)

    // (c): one 2x2 tile at offset (0,0).
    push_record(core, 5, &[0, 1, 2, 2, 0, 0, 0, 0, 0]); // DEFINE_TILESET_IMMEDIATE

    // (d): a 2x2 window, screen+tile aperture both at the origin.
    let mut window_def = vec![0u8, 0]; // window_idx=0, black_or_wrap=false
    window_def.extend_from_slice(&2u64.to_le_bytes()); // screen_xcount
    window_def.extend_from_slice(&2u64.to_le_bytes()); // screen_ycount
    window_def.extend_from_slice(&0i64.to_le_bytes()); // screen_xbegin
    window_def.extend_from_slice(&0i64.to_le_bytes()); // screen_ybegin
    window_def.extend_from_slice(&0i64.to_le_bytes()); // tile_xbegin
    window_def.extend_from_slice(&0i64.to_le_bytes()); // tile_ybegin
    window_def.extend_from_slice(&2u64.to_le_bytes()); // tile_xdim
    window_def.extend_from_slice(&2u64.to_le_bytes()); // tile_ydim
    window_def.extend_from_slice(&1u64.to_le_bytes()); // tile_xcount
    window_def.extend_from_slice(&1u64.to_le_bytes()); // tile_ycount
    push_record(core, 6, &window_def);

    // (e): the single cell is tileset 0, tile 0.
    let mut set_both = vec![0u8]; // window_idx
    set_both.extend_from_slice(&0i64.to_le_bytes()); // tile_xbegin
    set_both.extend_from_slice(&0i64.to_le_bytes()); // tile_ybegin
    set_both.extend_from_slice(&1u64.to_le_bytes()); // tile_xcount
    set_both.extend_from_slice(&1u64.to_le_bytes()); // tile_ycount
    set_both.extend_from_slice(&[0, 0]); // tileset_idx, tile_idx
    push_record(core, 7, &set_both);

    // (f)
    push_record(core, 13, &[0, 1]);
}

/// S3 - end-to-end tile: a 2x2 red tile composites as a 6x6 opaque-red
/// block, with the adjacent pixel untouched.
#[test]
fn s3_end_to_end_tile() {
    let mut core = new_core();
    core.handle_packet(control(1)); // ENABLE
    define_red_tile_window(&mut core);
    assert_eq!(core.handle_packet(control(2)), PacketOutcome::ProcessRequested); // PROCESS
    core.process().unwrap();
    assert!(core.last_error().is_none());

    let mut sink = MemoryFrameSink::new(1920, 1080);
    core.draw_into(&mut sink);
    assert_eq!(sink.pixel_argb8888(0, 0), 0xFFFF0000);
    assert_eq!(sink.pixel_argb8888(5, 5), 0xFFFF0000);
    assert_eq!(sink.pixel_argb8888(6, 0), 0);
}

/// S6 - a malformed record (declared length 5, only 3 bytes follow) fails
/// the pulse and still clears the buffer.
#[test]
fn s6_malformed_length_fails_and_clears_buffer() {
    let mut core = new_core();
    for b in [0x05u8, 0x00, 13] {
        core.handle_packet(data_byte(b));
    }
    assert_eq!(core.handle_packet(control(2)), PacketOutcome::ProcessRequested);
    let err = core.process().unwrap_err();
    assert!(err.to_string().to_lowercase().contains("insufficient buffer space"));
    assert!(core.last_error().is_some());
}
