//! Snapshot tests for Busylight wire frames.
//!
//! These lock in the exact 64-byte encoding of every frame the controller
//! emits, so a layout or checksum regression shows up as a diff.

use busylight_hid_kuando_protocol::{CommandBuffer, Instruction, Rgb, Ring};
use insta::assert_snapshot;

fn hex(instruction: Instruction) -> String {
    CommandBuffer::with_line0(instruction)
        .to_bytes()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[test]
fn test_snapshot_solid_red() {
    assert_snapshot!(hex(Instruction::solid(Rgb::new(255, 0, 0))), @"1000ff0000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000ffffff040c");
}

#[test]
fn test_snapshot_light_off() {
    assert_snapshot!(hex(Instruction::off()), @"1000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000ffffff030d");
}

#[test]
fn test_snapshot_keep_alive() {
    assert_snapshot!(hex(Instruction::keep_alive(15)), @"8f00000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000ffffff038c");
}

#[test]
fn test_snapshot_blink_red() {
    assert_snapshot!(hex(Instruction::blink(Rgb::new(255, 0, 0), 5, 5)), @"1000ff0000050500000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000ffffff0416");
}

#[test]
fn test_snapshot_ringtone_funky() {
    assert_snapshot!(hex(Instruction::ring(Ring::Funky, 7)), @"100100000000009f000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000ffffff03ad");
}

#[test]
fn test_snapshot_raw_color() {
    assert_snapshot!(hex(Instruction::solid(Rgb::new(10, 20, 30))), @"10000a141e000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000ffffff0349");
}

#[test]
fn test_snapshot_display() {
    assert_snapshot!(CommandBuffer::new().to_string(), @"CommandBuffer(value=0000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000ffffff0000)");
}
