//! Barudan U01 format writer
//!
//! Three-byte records `(ctrl, |dy|, |dx|)` with sign bits in the control
//! byte. U01 machines address needles directly, so the profile uses
//! NEEDLE_SET as the thread change command and keeps SLOW/FAST speeds.

use crate::core::constants::*;
use crate::core::encoder::{EncoderSettings, Transcoder};
use crate::core::pattern::EmbPattern;
use crate::formats::io::utils::WriteHelper;
use crate::utils::error::Result;
use crate::utils::functions::decode_embroidery_command;
use std::io::Write;

/// Encoder profile for the U01 format
pub fn default_settings() -> EncoderSettings {
    EncoderSettings {
        max_stitch: 127.0,
        max_jump: 127.0,
        round: true,
        thread_change_command: NEEDLE_SET,
        needle_count: 15,
        writes_speeds: true,
        ..Default::default()
    }
}

/// Write a U01 file to a stream
pub fn write<W: Write>(writer: &mut W, pattern: &EmbPattern) -> Result<()> {
    let normalized = Transcoder::with_settings(default_settings()).transcode(pattern);
    let mut helper = WriteHelper::new(writer);

    for _ in 0..0x80 {
        helper.write_u8(b'0')?;
    }

    let stitches = normalized.stitches();
    let (min_x, min_y, max_x, max_y) = normalized.bounds();

    helper.write_i16_le(min_x as i16)?;
    helper.write_i16_le(-(max_y as i16))?;
    helper.write_i16_le(max_x as i16)?;
    helper.write_i16_le(-(min_y as i16))?;
    helper.write_i32_le(0)?;
    helper.write_i32_le((stitches.len() + 1) as i32)?;

    let (last_x, last_y) = stitches
        .last()
        .map_or((0, 0), |s| (s.x as i16, -(s.y as i16)));
    helper.write_i16_le(last_x)?;
    helper.write_i16_le(last_y)?;

    while helper.bytes_written() < 0x100 {
        helper.write_u8(0)?;
    }

    let mut xx = 0.0;
    let mut yy = 0.0;
    let mut trigger_fast = false;
    let mut trigger_slow = false;

    for stitch in stitches {
        let data = stitch.command & COMMAND_MASK;
        let dx = (stitch.x - xx).round() as i32;
        let dy = (stitch.y - yy).round() as i32;

        if data == SLOW {
            trigger_slow = true;
            continue;
        }
        if data == FAST {
            trigger_fast = true;
            continue;
        }

        xx += dx as f64;
        yy += dy as f64;

        let mut cmd: u8 = 0x80;
        if dy >= 0 {
            cmd |= 0x40;
        }
        if dx <= 0 {
            cmd |= 0x20;
        }
        let delta_x = dx.unsigned_abs().min(0xFF) as u8;
        let delta_y = dy.unsigned_abs().min(0xFF) as u8;

        match data {
            STITCH | JUMP => {
                if data == JUMP {
                    cmd |= 0x01;
                }
                if trigger_fast {
                    trigger_fast = false;
                    cmd |= 0x02;
                }
                if trigger_slow {
                    trigger_slow = false;
                    cmd |= 0x04;
                }
                helper.write_bytes(&[cmd, delta_y, delta_x])?;
            },
            STOP => {
                cmd |= 0x08;
                helper.write_bytes(&[cmd, delta_y, delta_x])?;
            },
            TRIM => {
                cmd |= 0x07;
                helper.write_bytes(&[cmd, delta_y, delta_x])?;
            },
            NEEDLE_SET => {
                let (_, _, needle, _) = decode_embroidery_command(stitch.command);
                let mut needle = needle.unwrap_or(1);
                if needle == 0 || needle > 15 {
                    needle = ((needle as usize).wrapping_sub(1) % 15) as u8 + 1;
                }
                cmd |= 0x08 + needle;
                helper.write_bytes(&[cmd, delta_y, delta_x])?;
            },
            END => break,
            _ => {},
        }
    }

    helper.write_bytes(&[0xF8, 0x00, 0x00])?;
    Ok(())
}

/// Write a U01 file to a path
pub fn write_file(path: &str, pattern: &EmbPattern) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    write(&mut writer, pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_is_256_bytes() {
        let mut pattern = EmbPattern::new();
        pattern.add_thread(crate::core::thread::EmbThread::from_rgb(255, 0, 0));
        pattern.stitch_abs(0.0, 0.0);
        pattern.stitch_abs(100.0, 100.0);

        let mut buffer = Vec::new();
        write(&mut buffer, &pattern).unwrap();
        assert!(buffer.len() > 0x100);
        assert_eq!((buffer.len() - 0x100) % 3, 0);
        assert_eq!(&buffer[buffer.len() - 3..], &[0xF8, 0x00, 0x00]);
    }

    #[test]
    fn test_needle_set_emitted_per_section() {
        let mut pattern = EmbPattern::new();
        pattern.add_thread(crate::core::thread::EmbThread::from_rgb(255, 0, 0));
        pattern.add_thread(crate::core::thread::EmbThread::from_rgb(0, 0, 255));
        pattern.stitch_abs(0.0, 0.0);
        pattern.stitch_abs(10.0, 0.0);
        pattern.color_change(0.0, 0.0);
        pattern.stitch_abs(10.0, 10.0);

        let mut buffer = Vec::new();
        write(&mut buffer, &pattern).unwrap();
        let needle_records = buffer[0x100..]
            .chunks(3)
            .filter(|c| c[0] & 0x1F >= 0x09 && c[0] & 0x1F <= 0x17)
            .count();
        assert_eq!(needle_records, 2);
    }
}
