//! Janome JEF format writer
//!
//! Fixed little-endian header with design bounds, hoop code and a palette
//! of indices into the 79-color Janome table, followed by two-byte delta
//! records. A STOP is written as a change to palette slot 0, the
//! placeholder the machine pauses on.

use crate::core::constants::*;
use crate::core::encoder::{EncoderSettings, Transcoder};
use crate::core::pattern::EmbPattern;
use crate::formats::io::utils::WriteHelper;
use crate::palettes::thread_jef::JEF_THREADS;
use crate::utils::error::Result;
use std::io::Write;

// Hoop codes
const HOOP_110X110: i32 = 0;
const HOOP_50X50: i32 = 1;
const HOOP_140X200: i32 = 2;
const HOOP_126X110: i32 = 3;
const HOOP_200X200: i32 = 4;

/// Writer options for JEF
#[derive(Debug, Clone)]
pub struct JefSettings {
    /// Expand TRIM commands into pause records
    pub trims: bool,
    /// Number of pause records per trim
    pub trim_at: usize,
    /// Header timestamp (YYYYMMDDHHmmss); current time when None
    pub date: Option<String>,
}

impl Default for JefSettings {
    fn default() -> Self {
        Self {
            trims: true,
            trim_at: 3,
            date: None,
        }
    }
}

/// Encoder profile for the JEF format
pub fn default_settings() -> EncoderSettings {
    EncoderSettings {
        max_stitch: 127.0,
        max_jump: 127.0,
        round: true,
        writes_speeds: false,
        ..Default::default()
    }
}

fn get_jef_hoop_size(width: i32, height: i32) -> i32 {
    if width < 500 && height < 500 {
        return HOOP_50X50;
    }
    if width < 1260 && height < 1100 {
        return HOOP_126X110;
    }
    if width < 1400 && height < 2000 {
        return HOOP_140X200;
    }
    if width < 2000 && height < 2000 {
        return HOOP_200X200;
    }
    HOOP_110X110
}

fn write_hoop_edge_distance<W: Write>(
    helper: &mut WriteHelper<W>,
    x_hoop_edge: i32,
    y_hoop_edge: i32,
) -> Result<()> {
    if x_hoop_edge.min(y_hoop_edge) >= 0 {
        helper.write_i32_le(x_hoop_edge)?;
        helper.write_i32_le(y_hoop_edge)?;
        helper.write_i32_le(x_hoop_edge)?;
        helper.write_i32_le(y_hoop_edge)?;
    } else {
        for _ in 0..4 {
            helper.write_i32_le(-1)?;
        }
    }
    Ok(())
}

/// Nearest Janome palette index for each color section, slot 0 for stops
fn build_palette(pattern: &EmbPattern) -> Vec<i32> {
    let mut palette = Vec::new();
    let mut available = vec![true; JEF_THREADS.len()];
    let mut thread_index = 0usize;

    let nearest = |color: u32, available: &[bool]| -> usize {
        let mut best = 1;
        let mut best_distance = f64::MAX;
        for (i, slot) in JEF_THREADS.iter().enumerate() {
            if let Some(jef_thread) = slot {
                if available[i] {
                    let distance =
                        crate::core::thread::color_distance(color, jef_thread.color) as f64;
                    if distance < best_distance {
                        best_distance = distance;
                        best = i;
                    }
                }
            }
        }
        best
    };

    let mut open_section = |palette: &mut Vec<i32>, thread_index: &mut usize| {
        let thread = pattern.get_thread_or_filler(*thread_index);
        *thread_index += 1;
        let index = nearest(thread.color, &available);
        available[index] = false;
        palette.push(index as i32);
    };

    let mut opened = false;
    for stitch in pattern.stitches() {
        match stitch.command & COMMAND_MASK {
            STITCH | JUMP if !opened => {
                opened = true;
                open_section(&mut palette, &mut thread_index);
            },
            COLOR_CHANGE => open_section(&mut palette, &mut thread_index),
            STOP => palette.push(0),
            _ => {},
        }
    }

    palette
}

fn count_points(pattern: &EmbPattern, settings: &JefSettings) -> i32 {
    let mut point_count = 1;
    for stitch in pattern.stitches() {
        match stitch.command & COMMAND_MASK {
            STITCH => point_count += 1,
            JUMP => point_count += 2,
            TRIM if settings.trims => point_count += 2 * settings.trim_at as i32,
            COLOR_CHANGE | STOP => point_count += 2,
            END => break,
            _ => {},
        }
    }
    point_count
}

/// Write a JEF file to a stream
pub fn write<W: Write>(writer: &mut W, pattern: &EmbPattern, settings: &JefSettings) -> Result<()> {
    let normalized = Transcoder::with_settings(default_settings()).transcode(pattern);
    let mut helper = WriteHelper::new(writer);

    let palette = build_palette(&normalized);
    let color_count = palette.len() as i32;

    let offsets = 0x74 + (color_count * 8);
    helper.write_i32_le(offsets)?;
    helper.write_i32_le(0x14)?;

    let date = settings
        .date
        .clone()
        .unwrap_or_else(|| chrono::Local::now().format("%Y%m%d%H%M%S").to_string());
    let date_bytes = date.as_bytes();
    let len = date_bytes.len().min(14);
    helper.write_bytes(&date_bytes[..len])?;
    for _ in len..14 {
        helper.write_u8(0)?;
    }
    helper.write_u8(0)?;
    helper.write_u8(0)?;

    helper.write_i32_le(color_count)?;
    helper.write_i32_le(count_points(&normalized, settings))?;

    let bounds = normalized.bounds();
    let design_width = (bounds.2 - bounds.0).round() as i32;
    let design_height = (bounds.3 - bounds.1).round() as i32;

    helper.write_i32_le(get_jef_hoop_size(design_width, design_height))?;

    let half_width = design_width / 2;
    let half_height = design_height / 2;

    helper.write_i32_le(half_width)?;
    helper.write_i32_le(half_height)?;
    helper.write_i32_le(half_width)?;
    helper.write_i32_le(half_height)?;

    write_hoop_edge_distance(&mut helper, 550 - half_width, 550 - half_height)?;
    write_hoop_edge_distance(&mut helper, 250 - half_width, 250 - half_height)?;
    write_hoop_edge_distance(&mut helper, 700 - half_width, 1000 - half_height)?;
    write_hoop_edge_distance(&mut helper, 700 - half_width, 1000 - half_height)?;

    for &entry in &palette {
        helper.write_i32_le(entry)?;
    }
    for _ in 0..color_count {
        helper.write_i32_le(0x0D)?;
    }

    let mut xx = 0.0;
    let mut yy = 0.0;

    for stitch in normalized.stitches() {
        let data = stitch.command & COMMAND_MASK;
        let dx = (stitch.x - xx).round() as i32;
        let dy = (stitch.y - yy).round() as i32;
        xx += dx as f64;
        yy += dy as f64;

        match data {
            STITCH => {
                helper.write_i8(dx as i8)?;
                helper.write_i8((-dy) as i8)?;
            },
            JUMP => {
                helper.write_bytes(&[0x80, 0x02])?;
                helper.write_i8(dx as i8)?;
                helper.write_i8((-dy) as i8)?;
            },
            COLOR_CHANGE | STOP => {
                helper.write_bytes(&[0x80, 0x01])?;
                helper.write_i8(dx as i8)?;
                helper.write_i8((-dy) as i8)?;
            },
            TRIM if settings.trims => {
                for _ in 0..settings.trim_at {
                    helper.write_bytes(&[0x80, 0x02, 0x00, 0x00])?;
                }
            },
            END => break,
            _ => {},
        }
    }

    helper.write_bytes(&[0x80, 0x10])?;
    Ok(())
}

/// Write a JEF file to a path
pub fn write_file(path: &str, pattern: &EmbPattern) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    write(&mut writer, pattern, &JefSettings::default())
}
