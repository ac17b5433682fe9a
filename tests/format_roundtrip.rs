// Write-then-read invariants for every binary codec: stitch and color
// change counts survive, palettes round-trip where the format embeds one,
// and the first and last stitch positions agree.

use std::io::Cursor;
use stitchwise::formats::io::{readers, writers};
use stitchwise::prelude::*;

/// Sixteen color sections of five stitches each, all tracing the same
/// small square so every delta stays well inside each format's limits.
fn get_big_pattern() -> EmbPattern {
    let mut pattern = EmbPattern::new();
    for i in 0..16u32 {
        let thread = EmbThread::from_rgb((i * 16) as u8, (255 - i * 12) as u8, (40 + i * 9) as u8);
        pattern.add_thread_break(thread);
        pattern.stitch_abs(0.0, 0.0);
        pattern.stitch_abs(10.0, 0.0);
        pattern.stitch_abs(10.0, 10.0);
        pattern.stitch_abs(0.0, 10.0);
        pattern.stitch_abs(0.0, 0.0);
    }
    pattern
}

fn first_position(pattern: &EmbPattern) -> (f64, f64) {
    let first = pattern
        .stitches()
        .iter()
        .find(|s| s.command & COMMAND_MASK == STITCH)
        .expect("pattern has stitches");
    (first.x, first.y)
}

fn last_position(pattern: &EmbPattern) -> (f64, f64) {
    let last = pattern.stitches().last().expect("pattern has stitches");
    (last.x, last.y)
}

#[test]
fn dst_round_trip() {
    let mut buffer = Cursor::new(Vec::new());
    writers::dst::write(
        &mut buffer,
        &get_big_pattern(),
        &writers::dst::DstSettings::default(),
    )
    .unwrap();

    buffer.set_position(0);
    let loaded = readers::dst::read(&mut buffer, None).unwrap();
    assert_eq!(loaded.count_threads(), 0);
    assert_eq!(loaded.count_stitch_commands(COLOR_CHANGE), 15);
    assert_eq!(loaded.count_stitch_commands(STITCH), 5 * 16);
    assert_eq!(first_position(&loaded), last_position(&loaded));
}

#[test]
fn exp_round_trip() {
    let mut buffer = Cursor::new(Vec::new());
    writers::exp::write(&mut buffer, &get_big_pattern()).unwrap();

    buffer.set_position(0);
    let loaded = readers::exp::read(&mut buffer).unwrap();
    assert_eq!(loaded.count_threads(), 0);
    assert_eq!(loaded.count_stitch_commands(COLOR_CHANGE), 15);
    assert_eq!(loaded.count_stitch_commands(STITCH), 5 * 16);
    assert_eq!(first_position(&loaded), last_position(&loaded));
}

#[test]
fn jef_round_trip() {
    let mut buffer = Cursor::new(Vec::new());
    writers::jef::write(
        &mut buffer,
        &get_big_pattern(),
        &writers::jef::JefSettings {
            date: Some("20240101120000".to_string()),
            ..Default::default()
        },
    )
    .unwrap();

    buffer.set_position(0);
    let loaded = readers::jef::read(&mut buffer).unwrap();
    assert_eq!(
        loaded.count_threads(),
        loaded.count_stitch_commands(COLOR_CHANGE) + 1
    );
    assert_eq!(loaded.count_stitch_commands(COLOR_CHANGE), 15);
    assert_eq!(loaded.count_stitch_commands(STITCH), 5 * 16);
    assert_eq!(first_position(&loaded), last_position(&loaded));
}

#[test]
fn vp3_round_trip() {
    let mut buffer = Cursor::new(Vec::new());
    writers::vp3::write(&mut buffer, &get_big_pattern()).unwrap();

    buffer.set_position(0);
    let loaded = readers::vp3::read(&mut buffer).unwrap();
    assert_eq!(
        loaded.count_threads(),
        loaded.count_stitch_commands(COLOR_CHANGE) + 1
    );
    assert_eq!(loaded.count_stitch_commands(COLOR_CHANGE), 15);
    assert_eq!(loaded.count_stitch_commands(STITCH), 5 * 16);
    assert_eq!(first_position(&loaded), last_position(&loaded));
}

#[test]
fn pec_round_trip() {
    let mut buffer = Cursor::new(Vec::new());
    writers::pec::write(&mut buffer, &get_big_pattern()).unwrap();

    buffer.set_position(0);
    let loaded = readers::pec::read(&mut buffer).unwrap();
    assert_eq!(
        loaded.count_threads(),
        loaded.count_stitch_commands(COLOR_CHANGE) + 1
    );
    assert_eq!(loaded.count_stitch_commands(COLOR_CHANGE), 15);
    assert_eq!(loaded.count_stitch_commands(STITCH), 5 * 16);
    assert_eq!(first_position(&loaded), last_position(&loaded));
}

#[test]
fn pes_round_trip() {
    let mut buffer = Cursor::new(Vec::new());
    writers::pes::write(
        &mut buffer,
        &get_big_pattern(),
        &writers::pes::PesSettings::default(),
    )
    .unwrap();

    buffer.set_position(0);
    let loaded = readers::pes::read(&mut buffer).unwrap();
    assert_eq!(
        loaded.count_threads(),
        loaded.count_stitch_commands(COLOR_CHANGE) + 1
    );
    assert_eq!(loaded.count_stitch_commands(COLOR_CHANGE), 15);
    assert_eq!(loaded.count_stitch_commands(STITCH), 5 * 16);
    assert_eq!(first_position(&loaded), last_position(&loaded));
}

#[test]
fn pes_6t_round_trip_keeps_chart_colors() {
    let mut buffer = Cursor::new(Vec::new());
    writers::pes::write(
        &mut buffer,
        &get_big_pattern(),
        &writers::pes::PesSettings {
            version: "6t".to_string(),
        },
    )
    .unwrap();

    buffer.set_position(0);
    let loaded = readers::pes::read(&mut buffer).unwrap();
    assert_eq!(loaded.count_threads(), 16);
    assert_eq!(loaded.count_stitch_commands(COLOR_CHANGE), 15);
    // Chart mode carries the authored RGB values through exactly.
    let expected = get_big_pattern();
    for (loaded_thread, original_thread) in loaded.threads().iter().zip(expected.threads()) {
        assert_eq!(loaded_thread.color, original_thread.color);
    }
}

#[test]
fn xxx_round_trip() {
    let mut buffer = Cursor::new(Vec::new());
    writers::xxx::write(&mut buffer, &get_big_pattern()).unwrap();

    buffer.set_position(0);
    let loaded = readers::xxx::read(&mut buffer).unwrap();
    assert_eq!(
        loaded.count_threads(),
        loaded.count_stitch_commands(COLOR_CHANGE) + 1
    );
    assert_eq!(loaded.count_stitch_commands(COLOR_CHANGE), 15);
    assert_eq!(loaded.count_stitch_commands(STITCH), 5 * 16);
    assert_eq!(first_position(&loaded), last_position(&loaded));
}

#[test]
fn u01_round_trip() {
    let mut buffer = Vec::new();
    writers::u01::write(&mut buffer, &get_big_pattern()).unwrap();

    let loaded = readers::u01::read(&mut Cursor::new(buffer)).unwrap();
    assert_eq!(loaded.count_threads(), 0);
    assert_eq!(loaded.count_stitch_commands(NEEDLE_SET), 16);
    assert_eq!(loaded.count_stitch_commands(COLOR_CHANGE), 0);
    assert_eq!(loaded.count_stitch_commands(STITCH), 5 * 16);
    assert_eq!(first_position(&loaded), last_position(&loaded));
}

#[test]
fn write_dispatch_rejects_unwritable_extension() {
    let pattern = get_big_pattern();
    let result = stitchwise::formats::write(&pattern, "design.pdf");
    assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
}

#[test]
fn read_dispatch_missing_file() {
    let result = stitchwise::formats::read("nosuchfile.dst");
    assert!(matches!(result, Err(Error::Io(_))));
}
