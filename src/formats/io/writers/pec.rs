//! Brother PEC format writer
//!
//! PEC carries an `LA:` label header, color indices into the 64-color
//! Brother palette, 7-bit delta records with a flagged 12-bit long form,
//! and per-color preview bitmaps for the machine LCD. A STOP is written as
//! a color change that repeats the current palette entry; readers fold the
//! repeat back into a STOP.

use crate::core::constants::*;
use crate::core::encoder::{EncoderSettings, Transcoder};
use crate::core::pattern::EmbPattern;
use crate::core::thread::EmbThread;
use crate::formats::io::utils::WriteHelper;
use crate::palettes::thread_pec::PEC_THREADS;
use crate::utils::error::Result;
use std::collections::HashMap;
use std::io::{Seek, SeekFrom, Write};

const MASK_07_BIT: i32 = 0b0111_1111;
const JUMP_CODE: u8 = 0b0001_0000;
const TRIM_CODE: u8 = 0b0010_0000;
const PEC_ICON_WIDTH: usize = 48;
const PEC_ICON_HEIGHT: usize = 38;
const PEC_ICON_STRIDE: usize = PEC_ICON_WIDTH / 8;

/// Encoder profile for the PEC format
pub fn default_settings() -> EncoderSettings {
    EncoderSettings {
        max_stitch: 2047.0,
        max_jump: 2047.0,
        round: true,
        writes_speeds: false,
        ..Default::default()
    }
}

/// Stream-ordered color list: one entry per section, repeated across STOPs
pub fn build_color_list(pattern: &EmbPattern) -> Vec<EmbThread> {
    let mut colors = Vec::new();
    let mut thread_index = 0usize;
    let mut opened = false;

    for stitch in pattern.stitches() {
        match stitch.command & COMMAND_MASK {
            STITCH | JUMP | SEQUIN_EJECT if !opened => {
                opened = true;
                colors.push(pattern.get_thread_or_filler(thread_index));
                thread_index += 1;
            },
            COLOR_CHANGE => {
                colors.push(pattern.get_thread_or_filler(thread_index));
                thread_index += 1;
            },
            STOP => {
                let current = colors
                    .last()
                    .cloned()
                    .unwrap_or_else(|| pattern.get_thread_or_filler(0));
                colors.push(current);
            },
            _ => {},
        }
    }

    if colors.is_empty() {
        colors.push(pattern.get_thread_or_filler(0));
    }
    colors
}

/// Map a color list to palette indices; equal colors share an index,
/// distinct colors never collide
fn build_pec_palette(colors: &[EmbThread]) -> Vec<u8> {
    let mut used = vec![false; PEC_THREADS.len()];
    let mut by_color: HashMap<u32, u8> = HashMap::new();
    let mut palette = Vec::with_capacity(colors.len());

    for thread in colors {
        let index = *by_color.entry(thread.color).or_insert_with(|| {
            let mut best = 0usize;
            let mut best_distance = f64::MAX;
            for (i, pec_thread) in PEC_THREADS.iter().enumerate() {
                if !used[i] {
                    let distance = thread.color_distance(pec_thread.color);
                    if distance < best_distance {
                        best_distance = distance;
                        best = i;
                    }
                }
            }
            used[best] = true;
            best as u8
        });
        palette.push(index);
    }

    palette
}

fn write_value<W: Write>(
    helper: &mut WriteHelper<W>,
    value: i32,
    long: bool,
    flag: u8,
) -> Result<()> {
    if !long && (-64..64).contains(&value) {
        helper.write_u8((value & MASK_07_BIT) as u8)?;
    } else {
        let mut val = (value & 0x0FFF) as u16;
        val |= 0b1000_0000_0000_0000;
        val |= (flag as u16) << 8;
        helper.write_u8((val >> 8) as u8)?;
        helper.write_u8((val & 0xFF) as u8)?;
    }
    Ok(())
}

fn write_header<W: Write>(
    helper: &mut WriteHelper<W>,
    pattern: &EmbPattern,
    palette: &[u8],
) -> Result<()> {
    let name = pattern
        .get_metadata("name")
        .map(|s| s.as_str())
        .unwrap_or("Untitled");
    let truncated: String = name.chars().take(8).collect();
    helper.write_string(&format!("LA:{:<16}\r", truncated))?;

    helper.write_bytes(&[0x20; 12])?;
    helper.write_u8(0xFF)?;
    helper.write_u8(0x00)?;
    helper.write_u8(PEC_ICON_STRIDE as u8)?;
    helper.write_u8(PEC_ICON_HEIGHT as u8)?;
    helper.write_bytes(&[0x20; 12])?;

    helper.write_u8((palette.len().saturating_sub(1)) as u8)?;
    helper.write_bytes(palette)?;

    // Pad so the stitch block always begins at byte 514.
    while helper.bytes_written() < 514 {
        helper.write_u8(0x20)?;
    }

    Ok(())
}

fn pec_encode<W: Write>(helper: &mut WriteHelper<W>, pattern: &EmbPattern) -> Result<()> {
    let mut color_two = true;
    let mut init = true;
    let mut xx = 0.0;
    let mut yy = 0.0;

    for stitch in pattern.stitches() {
        let data = stitch.command & COMMAND_MASK;
        let dx = (stitch.x - xx).round() as i32;
        let dy = (stitch.y - yy).round() as i32;
        xx += dx as f64;
        yy += dy as f64;

        match data {
            STITCH => {
                write_value(helper, dx, false, 0)?;
                write_value(helper, dy, false, 0)?;
                init = false;
            },
            JUMP => {
                let flag = if init { JUMP_CODE } else { TRIM_CODE | JUMP_CODE };
                write_value(helper, dx, true, flag)?;
                write_value(helper, dy, true, flag)?;
                init = false;
            },
            TRIM => {
                write_value(helper, 0, true, TRIM_CODE)?;
                write_value(helper, 0, true, TRIM_CODE)?;
            },
            COLOR_CHANGE | STOP => {
                helper.write_bytes(&[0xFE, 0xB0])?;
                helper.write_u8(if color_two { 0x02 } else { 0x01 })?;
                color_two = !color_two;
            },
            END => break,
            _ => {},
        }
    }

    helper.write_bytes(&[0xFF, 0x00])?;
    Ok(())
}

fn graphic_mark_bit(graphic: &mut [u8], x: i32, y: i32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= PEC_ICON_WIDTH || y >= PEC_ICON_HEIGHT {
        return;
    }
    graphic[y * PEC_ICON_STRIDE + x / 8] |= 1 << (x % 8);
}

/// Blank LCD icon: a one-pixel border around the drawing area
fn blank_graphic() -> Vec<u8> {
    let mut graphic = vec![0u8; PEC_ICON_STRIDE * PEC_ICON_HEIGHT];
    for x in 0..PEC_ICON_WIDTH as i32 {
        graphic_mark_bit(&mut graphic, x, 0);
        graphic_mark_bit(&mut graphic, x, PEC_ICON_HEIGHT as i32 - 1);
    }
    for y in 0..PEC_ICON_HEIGHT as i32 {
        graphic_mark_bit(&mut graphic, 0, y);
        graphic_mark_bit(&mut graphic, PEC_ICON_WIDTH as i32 - 1, y);
    }
    graphic
}

fn draw_scaled(bounds: (f64, f64, f64, f64), stitches: &[(f64, f64)], graphic: &mut [u8]) {
    let (left, top, right, bottom) = bounds;
    let width = (right - left).max(1.0);
    let height = (bottom - top).max(1.0);

    let scale_x = (PEC_ICON_WIDTH as f64 - 4.0) / width;
    let scale_y = (PEC_ICON_HEIGHT as f64 - 4.0) / height;
    let scale = scale_x.min(scale_y);

    let cx = (right + left) / 2.0;
    let cy = (bottom + top) / 2.0;
    let translate_x = -cx * scale + PEC_ICON_WIDTH as f64 / 2.0;
    let translate_y = -cy * scale + PEC_ICON_HEIGHT as f64 / 2.0;

    for &(x, y) in stitches {
        let px = (x * scale + translate_x).floor() as i32;
        let py = (y * scale + translate_y).floor() as i32;
        graphic_mark_bit(graphic, px, py);
    }
}

fn write_graphics<W: Write>(
    helper: &mut WriteHelper<W>,
    pattern: &EmbPattern,
    bounds: (f64, f64, f64, f64),
) -> Result<()> {
    let mut overall = blank_graphic();
    let all: Vec<(f64, f64)> = pattern
        .stitches()
        .iter()
        .filter(|s| s.command & COMMAND_MASK == STITCH)
        .map(|s| (s.x, s.y))
        .collect();
    draw_scaled(bounds, &all, &mut overall);
    helper.write_bytes(&overall)?;

    let mut current = Vec::new();
    for stitch in pattern.stitches() {
        match stitch.command & COMMAND_MASK {
            STITCH => current.push((stitch.x, stitch.y)),
            COLOR_CHANGE | STOP | END => {
                let mut graphic = blank_graphic();
                draw_scaled(bounds, &current, &mut graphic);
                helper.write_bytes(&graphic)?;
                current.clear();
            },
            _ => {},
        }
    }
    if !current.is_empty() {
        let mut graphic = blank_graphic();
        draw_scaled(bounds, &current, &mut graphic);
        helper.write_bytes(&graphic)?;
    }

    Ok(())
}

/// Write a PEC section; the pattern must already be normalized
///
/// The section may start anywhere in the stream (PES embeds it), so the
/// length backpatch seeks relative to the entry position.
pub fn write_pec_section<W: Write + Seek>(writer: &mut W, pattern: &EmbPattern) -> Result<()> {
    let base = writer.stream_position()?;
    let mut helper = WriteHelper::new(writer);

    let colors = build_color_list(pattern);
    let palette = build_pec_palette(&colors);
    write_header(&mut helper, pattern, &palette)?;

    let bounds = pattern.bounds();
    let width = (bounds.2 - bounds.0).round() as i16;
    let height = (bounds.3 - bounds.1).round() as i16;

    let length_position = helper.bytes_written();
    helper.write_bytes(&[0, 0, 0])?;

    helper.write_bytes(&[0x31, 0xFF, 0xF0])?;
    helper.write_i16_le(width)?;
    helper.write_i16_le(height)?;
    helper.write_i16_le(0x1E0)?;
    helper.write_i16_le(0x1B0)?;

    pec_encode(&mut helper, pattern)?;

    let end_position = helper.bytes_written();
    let block_length = end_position - length_position - 3;
    helper.seek(SeekFrom::Start(base + length_position as u64))?;
    helper.write_bytes(&[
        (block_length & 0xFF) as u8,
        ((block_length >> 8) & 0xFF) as u8,
        ((block_length >> 16) & 0xFF) as u8,
    ])?;
    helper.seek(SeekFrom::Start(base + end_position as u64))?;

    write_graphics(&mut helper, pattern, bounds)?;
    Ok(())
}

/// Write a standalone PEC file to a stream
pub fn write<W: Write + Seek>(writer: &mut W, pattern: &EmbPattern) -> Result<()> {
    let normalized = Transcoder::with_settings(default_settings()).transcode(pattern);
    writer.write_all(b"#PEC0001")?;
    write_pec_section(writer, &normalized)
}

/// Write a PEC file to a path
pub fn write_file(path: &str, pattern: &EmbPattern) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    write(&mut writer, pattern)
}
