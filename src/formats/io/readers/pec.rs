//! Brother PEC format reader
//!
//! Decodes the `LA:` header, the palette index list, 7-bit/12-bit delta
//! records and the `0xFE 0xB0` color change records. Repeated palette
//! entries are folded back into STOP commands. When a PES wrapper supplies
//! a thread chart, chart threads replace the built-in palette colors.

use crate::core::pattern::EmbPattern;
use crate::core::thread::EmbThread;
use crate::formats::io::utils::ReadHelper;
use crate::palettes::thread_pec::PEC_THREADS;
use crate::utils::error::{Error, Result};
use std::collections::HashMap;
use std::io::Read;

const JUMP_CODE: u8 = 0x10;
const TRIM_CODE: u8 = 0x20;
const FLAG_LONG: u8 = 0x80;
const MAX_STITCHES: usize = 1_000_000;

fn signed12(b: u16) -> i32 {
    let b = b & 0xFFF;
    if b > 0x7FF {
        (b as i32) - 0x1000
    } else {
        b as i32
    }
}

fn signed7(b: u8) -> i32 {
    if b > 63 {
        (b as i32) - 128
    } else {
        b as i32
    }
}

fn process_pec_colors(color_bytes: &[u8], pattern: &mut EmbPattern) {
    for &byte in color_bytes {
        let idx = byte as usize % PEC_THREADS.len();
        pattern.add_thread(PEC_THREADS[idx].clone());
    }
}

/// Chart threads keyed by palette index; duplicate indices reuse the same
/// chart thread so STOP folding still works
fn process_pec_table(color_bytes: &[u8], pattern: &mut EmbPattern, chart: &mut Vec<EmbThread>) {
    let mut by_index: HashMap<usize, EmbThread> = HashMap::new();
    for &byte in color_bytes {
        let color_index = byte as usize % PEC_THREADS.len();
        let thread = by_index
            .entry(color_index)
            .or_insert_with(|| {
                if chart.is_empty() {
                    PEC_THREADS[color_index].clone()
                } else {
                    chart.remove(0)
                }
            })
            .clone();
        pattern.add_thread(thread);
    }
}

fn map_pec_colors(
    color_bytes: &[u8],
    pattern: &mut EmbPattern,
    pes_chart: Option<Vec<EmbThread>>,
) {
    match pes_chart {
        None => process_pec_colors(color_bytes, pattern),
        Some(mut chart) => {
            if chart.is_empty() {
                process_pec_colors(color_bytes, pattern);
            } else if chart.len() >= color_bytes.len() {
                for _ in 0..color_bytes.len() {
                    pattern.add_thread(chart.remove(0));
                }
            } else {
                process_pec_table(color_bytes, pattern, &mut chart);
            }
        },
    }
}

fn read_pec_stitches<R: Read>(helper: &mut ReadHelper<R>, pattern: &mut EmbPattern) -> Result<()> {
    let mut stitch_count = 0usize;

    loop {
        stitch_count += 1;
        if stitch_count > MAX_STITCHES {
            return Err(Error::Parse(format!(
                "PEC file exceeds maximum stitch count of {}",
                MAX_STITCHES
            )));
        }

        let val1 = match helper.read_u8() {
            Ok(v) => v,
            Err(_) => break,
        };
        let val2 = match helper.read_u8() {
            Ok(v) => v,
            Err(_) => break,
        };

        if val1 == 0xFF {
            break;
        }
        if val1 == 0xFE && val2 == 0xB0 {
            helper.read_u8()?;
            pattern.color_change(0.0, 0.0);
            continue;
        }

        let mut jump = false;
        let mut trim = false;

        let x = if val1 & FLAG_LONG != 0 {
            trim |= val1 & TRIM_CODE != 0;
            jump |= val1 & JUMP_CODE != 0;
            signed12(((val1 as u16) << 8) | val2 as u16)
        } else {
            signed7(val1)
        };

        let y_byte = if val1 & FLAG_LONG != 0 {
            match helper.read_u8() {
                Ok(v) => v,
                Err(_) => break,
            }
        } else {
            val2
        };

        let y = if y_byte & FLAG_LONG != 0 {
            trim |= y_byte & TRIM_CODE != 0;
            jump |= y_byte & JUMP_CODE != 0;
            let low = match helper.read_u8() {
                Ok(v) => v,
                Err(_) => break,
            };
            signed12(((y_byte as u16) << 8) | low as u16)
        } else {
            signed7(y_byte)
        };

        if jump {
            pattern.jump(x as f64, y as f64);
        } else if trim {
            pattern.trim();
            if x != 0 || y != 0 {
                pattern.jump(x as f64, y as f64);
            }
        } else {
            pattern.stitch(x as f64, y as f64);
        }
    }

    Ok(())
}

/// Read a PEC section into a pattern; `pes_chart` supplies PES-embedded
/// threads when present
pub fn read_pec<R: Read>(
    reader: &mut R,
    pattern: &mut EmbPattern,
    pes_chart: Option<Vec<EmbThread>>,
) -> Result<()> {
    let mut helper = ReadHelper::new(reader);

    helper.read_bytes(3)?;
    let label_bytes = helper.read_bytes(16)?;
    let label = String::from_utf8_lossy(&label_bytes);
    let label = label.trim_matches('\0').trim();
    if !label.is_empty() && pattern.get_metadata("name").is_none() {
        pattern.add_metadata("name", label);
    }

    helper.read_bytes(15)?;
    let graphic_stride = helper.read_u8()? as usize;
    let graphic_height = helper.read_u8()? as usize;
    helper.read_bytes(12)?;

    let color_changes = helper.read_u8()? as usize;
    let count_colors = color_changes + 1;
    let color_bytes = helper.read_bytes(count_colors)?;
    map_pec_colors(&color_bytes, pattern, pes_chart);

    // Pad bytes up to the fixed stitch-block offset.
    helper.read_bytes(0x1D0 - color_changes)?;

    let _block_length = {
        let b = helper.read_bytes(3)?;
        (b[0] as u32) | ((b[1] as u32) << 8) | ((b[2] as u32) << 16)
    };
    helper.read_bytes(11)?;

    read_pec_stitches(&mut helper, pattern)?;
    pattern.end();

    // Preview graphics trail the stitch block; decode is not needed, but a
    // well-formed file carries one bitmap per color plus an overview.
    let byte_size = graphic_stride * graphic_height;
    if byte_size > 0 {
        for _ in 0..count_colors + 1 {
            if helper.read_bytes(byte_size).is_err() {
                break;
            }
        }
    }

    Ok(())
}

/// Read a standalone PEC file from a stream
pub fn read<R: Read>(reader: &mut R) -> Result<EmbPattern> {
    let mut helper = ReadHelper::new(reader);
    let signature = helper.read_string(8)?;
    if signature != "#PEC0001" {
        return Err(Error::Parse(format!(
            "Invalid PEC header: expected '#PEC0001', got '{}'",
            signature
        )));
    }

    let mut pattern = EmbPattern::new();
    let mut reader = helper.into_inner();
    read_pec(&mut reader, &mut pattern, None)?;
    pattern.interpolate_duplicate_color_as_stop();
    Ok(pattern)
}

/// Read a PEC file from a path
pub fn read_file(path: &str) -> Result<EmbPattern> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    read(&mut reader)
}
