//! Husqvarna/Viking VP3 format writer
//!
//! Block-structured: a `%vsm%` signature, length-prefixed metadata
//! sections, then one length-prefixed `%xxs%` block per color carrying the
//! thread (RGB + name) and its delta stitches. Deltas wider than i8 use an
//! `0x80 0x01` escape with big-endian i16 coordinates.

use crate::core::constants::*;
use crate::core::encoder::{EncoderSettings, Transcoder};
use crate::core::pattern::EmbPattern;
use crate::core::thread::EmbThread;
use crate::formats::io::utils::WriteHelper;
use crate::utils::error::Result;
use std::io::Write;

const VP3_SIGNATURE: &[u8] = b"%vsm%";

/// Encoder profile for the VP3 format
pub fn default_settings() -> EncoderSettings {
    EncoderSettings {
        max_stitch: 3175.0,
        max_jump: 3175.0,
        round: true,
        writes_speeds: false,
        ..Default::default()
    }
}

fn write_metadata_section<W: Write>(
    helper: &mut WriteHelper<W>,
    pattern: &EmbPattern,
    key: &str,
    marker: &[u8],
) -> Result<()> {
    if let Some(value) = pattern.get_metadata(key) {
        helper.write_bytes(marker)?;
        let bytes = value.as_bytes();
        helper.write_u16_le((bytes.len() + 1) as u16)?;
        helper.write_bytes(bytes)?;
        helper.write_u8(0)?;
    }
    Ok(())
}

fn encode_block(thread: &EmbThread, stitches: &[(i32, i32, u32)]) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.push(thread.red());
    payload.push(thread.green());
    payload.push(thread.blue());

    let name = thread.description.as_deref().unwrap_or("");
    let name_bytes = &name.as_bytes()[..name.len().min(255)];
    payload.push(name_bytes.len() as u8);
    payload.extend_from_slice(name_bytes);

    for &(dx, dy, cmd) in stitches {
        match cmd {
            STITCH => {
                if (-127..=127).contains(&dx) && (-127..=127).contains(&dy) {
                    payload.push(dx as i8 as u8);
                    payload.push(dy as i8 as u8);
                } else {
                    payload.extend_from_slice(&[0x80, 0x01]);
                    payload.extend_from_slice(&(dx as i16).to_be_bytes());
                    payload.extend_from_slice(&(dy as i16).to_be_bytes());
                }
            },
            JUMP => {
                payload.extend_from_slice(&[0x80, 0x02]);
                payload.extend_from_slice(&(dx as i16).to_be_bytes());
                payload.extend_from_slice(&(dy as i16).to_be_bytes());
            },
            TRIM => payload.extend_from_slice(&[0x80, 0x03]),
            STOP => payload.extend_from_slice(&[0x80, 0x04]),
            _ => {},
        }
    }

    payload.extend_from_slice(&[0x80, 0x00]);
    payload
}

/// Write a VP3 file to a stream
pub fn write<W: Write>(writer: &mut W, pattern: &EmbPattern) -> Result<()> {
    let normalized = Transcoder::with_settings(default_settings()).transcode(pattern);
    let mut helper = WriteHelper::new(writer);

    helper.write_bytes(VP3_SIGNATURE)?;
    write_metadata_section(&mut helper, &normalized, "name", b"%nam%")?;
    write_metadata_section(&mut helper, &normalized, "author", b"%aut%")?;
    write_metadata_section(&mut helper, &normalized, "copyright", b"%cop%")?;
    write_metadata_section(&mut helper, &normalized, "comments", b"%com%")?;

    // Split the normalized stream into per-color delta blocks.
    let mut blocks: Vec<Vec<(i32, i32, u32)>> = vec![Vec::new()];
    let mut xx = 0.0;
    let mut yy = 0.0;
    for stitch in normalized.stitches() {
        let cmd = stitch.command & COMMAND_MASK;
        let dx = (stitch.x - xx).round() as i32;
        let dy = (stitch.y - yy).round() as i32;
        match cmd {
            STITCH | JUMP | TRIM | STOP => {
                xx += dx as f64;
                yy += dy as f64;
                if let Some(block) = blocks.last_mut() {
                    block.push((dx, dy, cmd));
                }
            },
            COLOR_CHANGE => blocks.push(Vec::new()),
            END => break,
            _ => {},
        }
    }

    helper.write_bytes(b"%emb%")?;
    helper.write_u16_le(blocks.len() as u16)?;

    for (i, block) in blocks.iter().enumerate() {
        let thread = normalized.get_thread_or_filler(i);
        let payload = encode_block(&thread, block);
        helper.write_bytes(b"%xxs%")?;
        helper.write_u32_le(payload.len() as u32)?;
        helper.write_bytes(&payload)?;
    }

    helper.write_bytes(b"%end%")?;
    Ok(())
}

/// Write a VP3 file to a path
pub fn write_file(path: &str, pattern: &EmbPattern) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    write(&mut writer, pattern)
}
