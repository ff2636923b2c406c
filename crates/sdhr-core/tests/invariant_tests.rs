//! Invariant/property tests (P1, P6, P7) exercised at the integration
//! level, complementing the per-module unit tests for P2-P5.

use sdhr_core::assets::ImageAssetTable;
use sdhr_core::interpreter::Interpreter;
use sdhr_core::tileset::TilesetTable;
use sdhr_core::upload_region::UploadRegion;
use sdhr_core::window::WindowTable;
use sdhr_core::{Coprocessor, PngDecoder, ShadowMemory};
use sdhr_proto::AddressPacket;

fn packet(addr: u16, data: u8) -> AddressPacket {
    AddressPacket { addr, data, pad: 0 }
}

/// P1: the last write to each address wins, and untouched addresses stay zero.
#[test]
fn p1_shadow_memory_last_write_wins() {
    let mut mem = ShadowMemory::new();
    mem.write(0x0200, 1);
    mem.write(0x0200, 2);
    mem.write(0xBFFF, 0xFF);
    assert_eq!(mem.read(0x0200), 2);
    assert_eq!(mem.read(0xBFFF), 0xFF);
    assert_eq!(mem.read(0x0201), 0);
    assert_eq!(mem.read(0x0000), 0);
}

/// P6: PROCESS clears the command buffer whether the interpreter succeeds
/// or fails.
#[test]
fn p6_process_clears_buffer_on_success_and_failure() {
    let mut core: Coprocessor<PngDecoder> = Coprocessor::new();
    core.handle_packet(packet(0x0000, 2)); // PROCESS, empty buffer
    core.process().unwrap();
    assert!(core.last_error().is_none());

    core.handle_packet(packet(0x0001, 0x05));
    core.handle_packet(packet(0x0001, 0x00));
    core.handle_packet(packet(0x0001, 0)); // unknown opcode, truncated record
    core.handle_packet(packet(0x0000, 2));
    assert!(core.process().is_err());
    assert!(core.last_error().is_some());
}

fn record(opcode: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = ((payload.len() + 3) as u16).to_le_bytes().to_vec();
    out.push(opcode);
    out.extend_from_slice(payload);
    out
}

fn define_window_record(window_idx: u8) -> Vec<u8> {
    let mut payload = vec![window_idx, 0];
    payload.extend_from_slice(&2u64.to_le_bytes()); // screen_xcount
    payload.extend_from_slice(&2u64.to_le_bytes()); // screen_ycount
    payload.extend_from_slice(&0i64.to_le_bytes()); // screen_xbegin
    payload.extend_from_slice(&0i64.to_le_bytes()); // screen_ybegin
    payload.extend_from_slice(&0i64.to_le_bytes()); // tile_xbegin
    payload.extend_from_slice(&0i64.to_le_bytes()); // tile_ybegin
    payload.extend_from_slice(&2u64.to_le_bytes()); // tile_xdim
    payload.extend_from_slice(&2u64.to_le_bytes()); // tile_ydim
    payload.extend_from_slice(&1u64.to_le_bytes()); // tile_xcount
    payload.extend_from_slice(&1u64.to_le_bytes()); // tile_ycount
    record(6, &payload)
}

/// P7: a failure in the middle of the buffer leaves earlier commands
/// applied and later commands unapplied (no rollback, no continuation).
#[test]
fn p7_mid_buffer_failure_neither_rolls_back_nor_continues() {
    let mut buffer = Vec::new();
    buffer.extend(define_window_record(0));
    buffer.extend(record(0, &[])); // opcode 0 does not exist
    buffer.extend(define_window_record(1));

    let shadow = ShadowMemory::new();
    let mut upload = UploadRegion::new();
    let mut assets = ImageAssetTable::new();
    let mut tilesets = TilesetTable::new();
    let mut windows = WindowTable::new();
    let decoder = sdhr_core::PngDecoder;

    let result = Interpreter::run(
        &buffer, &shadow, &mut upload, &mut assets, &mut tilesets, &mut windows, &decoder,
    );
    assert!(result.is_err());
    assert_eq!(windows.get(0).screen_xcount, 2); // applied before the failure
    assert_eq!(windows.get(1).screen_xcount, 0); // never reached
}
