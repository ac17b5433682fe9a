//! Tajima DST format reader
//!
//! Parses the 512-byte ASCII `KEY:VALUE` header and the 3-byte ternary
//! stitch records. DST carries no embedded palette, so the threadlist stays
//! empty unless the header has `TC:` lines; color changes are counted from
//! the stream.

use crate::core::constants::*;
use crate::core::pattern::EmbPattern;
use crate::core::thread::EmbThread;
use crate::utils::error::{Error, Result};
use std::io::Read;

const DST_HEADER_SIZE: usize = 512;
const MAX_STITCHES: usize = 1_000_000;

/// Reader options for DST
#[derive(Debug, Clone, Default)]
pub struct DstReadSettings {
    /// Interpolate a TRIM before jump runs of at least this length
    pub trim_at: Option<usize>,
    /// Only interpolate when the run travels at least this far
    pub trim_distance: Option<f64>,
}

#[inline]
fn get_bit(b: u8, pos: u8) -> i32 {
    ((b >> pos) & 1) as i32
}

fn decode_dx(b0: u8, b1: u8, b2: u8) -> i32 {
    let mut x = 0;
    x += get_bit(b2, 2) * 81;
    x += get_bit(b2, 3) * -81;
    x += get_bit(b1, 2) * 27;
    x += get_bit(b1, 3) * -27;
    x += get_bit(b0, 2) * 9;
    x += get_bit(b0, 3) * -9;
    x += get_bit(b1, 0) * 3;
    x += get_bit(b1, 1) * -3;
    x += get_bit(b0, 0);
    x -= get_bit(b0, 1);
    x
}

fn decode_dy(b0: u8, b1: u8, b2: u8) -> i32 {
    let mut y = 0;
    y += get_bit(b2, 5) * 81;
    y += get_bit(b2, 4) * -81;
    y += get_bit(b1, 5) * 27;
    y += get_bit(b1, 4) * -27;
    y += get_bit(b0, 5) * 9;
    y += get_bit(b0, 4) * -9;
    y += get_bit(b1, 7) * 3;
    y += get_bit(b1, 6) * -3;
    y += get_bit(b0, 7);
    y -= get_bit(b0, 6);
    -y
}

fn process_header_line(pattern: &mut EmbPattern, prefix: &str, value: &str) {
    match prefix {
        "LA" => pattern.add_metadata("name", value),
        "AU" => pattern.add_metadata("author", value),
        "CP" => pattern.add_metadata("copyright", value),
        "TC" => {
            let parts: Vec<&str> = value.split(',').map(|s| s.trim()).collect();
            if parts.is_empty() {
                return;
            }
            let mut thread =
                EmbThread::from_string(parts[0]).unwrap_or_else(|_| EmbThread::new(0x000000));
            if parts.len() > 1 {
                thread = thread.with_description(parts[1]);
            }
            if parts.len() > 2 {
                thread = thread.with_catalog_number(parts[2]);
            }
            pattern.add_thread(thread);
        },
        _ => pattern.add_metadata(prefix, value),
    }
}

fn read_header<R: Read>(reader: &mut R, pattern: &mut EmbPattern) -> Result<()> {
    let mut header = vec![0u8; DST_HEADER_SIZE];
    reader.read_exact(&mut header).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::Parse(format!(
                "DST file too small: header must be {} bytes",
                DST_HEADER_SIZE
            ))
        } else {
            Error::from(e)
        }
    })?;

    let mut start = 0;
    for (i, &byte) in header.iter().enumerate() {
        if byte == b'\r' || byte == b'\n' {
            if i > start {
                if let Ok(line) = std::str::from_utf8(&header[start..i]) {
                    let line = line.trim();
                    if let (Some(prefix), Some(value)) = (line.get(0..2), line.get(3..)) {
                        process_header_line(pattern, prefix.trim(), value.trim());
                    }
                }
            }
            start = i + 1;
        }
    }

    Ok(())
}

fn read_stitches<R: Read>(reader: &mut R, pattern: &mut EmbPattern) -> Result<()> {
    let mut sequin_mode = false;
    let mut buffer = [0u8; 3];
    let mut stitch_count = 0usize;

    loop {
        match reader.read_exact(&mut buffer) {
            Ok(_) => {},
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(Error::from(e)),
        }

        stitch_count += 1;
        if stitch_count > MAX_STITCHES {
            return Err(Error::Parse(format!(
                "DST file exceeds maximum stitch count of {}",
                MAX_STITCHES
            )));
        }

        let dx = decode_dx(buffer[0], buffer[1], buffer[2]) as f64;
        let dy = decode_dy(buffer[0], buffer[1], buffer[2]) as f64;

        if buffer[2] & 0b1111_0011 == 0b1111_0011 {
            break;
        } else if buffer[2] & 0b1100_0011 == 0b1100_0011 {
            pattern.color_change(dx, dy);
        } else if buffer[2] & 0b0100_0011 == 0b0100_0011 {
            pattern.add_stitch_relative(dx, dy, SEQUIN_MODE);
            sequin_mode = !sequin_mode;
        } else if buffer[2] & 0b1000_0011 == 0b1000_0011 {
            if sequin_mode {
                pattern.add_stitch_relative(dx, dy, SEQUIN_EJECT);
            } else {
                pattern.jump(dx, dy);
            }
        } else {
            pattern.stitch(dx, dy);
        }
    }

    pattern.end();
    Ok(())
}

/// Read a DST file from a stream
pub fn read<R: Read>(reader: &mut R, settings: Option<&DstReadSettings>) -> Result<EmbPattern> {
    let mut pattern = EmbPattern::new();

    read_header(reader, &mut pattern)?;
    read_stitches(reader, &mut pattern)?;

    if let Some(settings) = settings {
        if let Some(trim_at) = settings.trim_at {
            pattern.interpolate_trims(trim_at, settings.trim_distance);
        }
    }

    Ok(pattern)
}

/// Read a DST file from a path
pub fn read_file(path: &str) -> Result<EmbPattern> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    read(&mut reader, None)
}
