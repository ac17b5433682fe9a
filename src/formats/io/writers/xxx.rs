//! Singer XXX format writer
//!
//! 0x100-byte header with stitch count, color count and extents, two-byte
//! delta stitch records with a `0x7D` i16 long-form escape, `0x7F`-prefixed
//! controls, and a trailing 0RGB color table.

use crate::core::constants::*;
use crate::core::encoder::{EncoderSettings, Transcoder};
use crate::core::pattern::EmbPattern;
use crate::formats::io::utils::WriteHelper;
use crate::utils::error::Result;
use std::io::{Seek, SeekFrom, Write};

/// Encoder profile for the XXX format
pub fn default_settings() -> EncoderSettings {
    EncoderSettings {
        max_stitch: 124.0,
        max_jump: 124.0,
        round: true,
        writes_speeds: false,
        long_stitch_contingency: CONTINGENCY_LONG_STITCH_SEW_TO,
        ..Default::default()
    }
}

fn write_header<W: Write>(helper: &mut WriteHelper<W>, pattern: &EmbPattern) -> Result<()> {
    for _ in 0..0x17 {
        helper.write_u8(0)?;
    }

    let stitch_count = pattern
        .stitches()
        .iter()
        .filter(|s| s.command & COMMAND_MASK != END)
        .count();
    helper.write_u32_le(stitch_count as u32)?;

    for _ in 0..0x0C {
        helper.write_u8(0)?;
    }

    helper.write_u32_le(pattern.threads().len() as u32)?;
    helper.write_u16_le(0)?;

    let bounds = pattern.bounds();
    helper.write_u16_le((bounds.2 - bounds.0) as i16 as u16)?;
    helper.write_u16_le((bounds.3 - bounds.1) as i16 as u16)?;

    let (last_x, last_y) = pattern
        .stitches()
        .last()
        .map_or((0, 0), |s| (s.x as i16, -(s.y as i16)));
    helper.write_u16_le(last_x as u16)?;
    helper.write_u16_le(last_y as u16)?;

    helper.write_u16_le((-bounds.0) as i16 as u16)?;
    helper.write_u16_le(bounds.3 as i16 as u16)?;

    // Zero padding up to the end-of-stitches pointer at 0xFC.
    while helper.bytes_written() < 0xFC {
        helper.write_u8(0)?;
    }

    Ok(())
}

fn write_stitches<W: Write>(helper: &mut WriteHelper<W>, pattern: &EmbPattern) -> Result<()> {
    let mut xx = 0.0;
    let mut yy = 0.0;

    for stitch in pattern.stitches() {
        let command = stitch.command & COMMAND_MASK;
        let dx = (stitch.x - xx).round() as i32;
        let dy = (stitch.y - yy).round() as i32;
        xx += dx as f64;
        yy += dy as f64;

        match command {
            STITCH => {
                if (-124..124).contains(&dx) && (-124..124).contains(&dy) {
                    helper.write_i8(dx as i8)?;
                    helper.write_i8((-dy) as i8)?;
                } else {
                    helper.write_u8(0x7D)?;
                    helper.write_i16_le(dx as i16)?;
                    helper.write_i16_le((-dy) as i16)?;
                }
            },
            JUMP => {
                helper.write_bytes(&[0x7F, 0x01])?;
                helper.write_i8(dx as i8)?;
                helper.write_i8((-dy) as i8)?;
            },
            TRIM => {
                helper.write_bytes(&[0x7F, 0x03])?;
                helper.write_i8(dx as i8)?;
                helper.write_i8((-dy) as i8)?;
            },
            COLOR_CHANGE | STOP => {
                helper.write_bytes(&[0x7F, 0x08])?;
                helper.write_i8(dx as i8)?;
                helper.write_i8((-dy) as i8)?;
            },
            END => break,
            _ => {},
        }
    }

    Ok(())
}

fn write_colors<W: Write>(helper: &mut WriteHelper<W>, pattern: &EmbPattern) -> Result<()> {
    helper.write_bytes(&[0x00, 0x00])?;

    let threads = pattern.threads();
    for thread in threads {
        helper.write_u8(0)?;
        helper.write_u8(thread.red())?;
        helper.write_u8(thread.green())?;
        helper.write_u8(thread.blue())?;
    }
    for _ in threads.len()..21 {
        helper.write_u32_le(0)?;
    }

    helper.write_u32_le(0xFFFF_FF00)?;
    helper.write_u8(0)?;
    helper.write_u8(1)?;
    Ok(())
}

/// Write an XXX file to a stream
pub fn write<W: Write + Seek>(writer: &mut W, pattern: &EmbPattern) -> Result<()> {
    let normalized = Transcoder::with_settings(default_settings()).transcode(pattern);
    let mut helper = WriteHelper::new(writer);

    write_header(&mut helper, &normalized)?;

    // End-of-stitches pointer, backpatched once the stream is written.
    let pointer_position = helper.bytes_written();
    helper.write_u32_le(0)?;

    write_stitches(&mut helper, &normalized)?;

    let end_position = helper.bytes_written();
    helper.write_bytes(&[0x7F, 0x7F, 0x02, 0x14])?;
    let after_end = helper.bytes_written();

    helper.seek(SeekFrom::Start(pointer_position as u64))?;
    helper.write_u32_le(end_position as u32)?;
    helper.seek(SeekFrom::Start(after_end as u64))?;

    write_colors(&mut helper, &normalized)?;
    Ok(())
}

/// Write an XXX file to a path
pub fn write_file(path: &str, pattern: &EmbPattern) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    write(&mut writer, pattern)
}
