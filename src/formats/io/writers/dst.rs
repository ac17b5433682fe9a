//! Tajima DST format writer
//!
//! Writes a 512-byte `KEY:VALUE` header followed by 3-byte stitch records
//! with ternary bit-encoded axis increments. The pattern is normalized to
//! the DST profile (121-unit limits, jump-needle long stitches) before
//! serialization.

use crate::core::constants::*;
use crate::core::encoder::{EncoderSettings, Transcoder};
use crate::core::pattern::EmbPattern;
use crate::formats::io::utils::WriteHelper;
use crate::utils::error::{Error, Result};
use std::io::Write;

const DST_HEADER_SIZE: usize = 512;

/// Writer options for DST
#[derive(Debug, Clone)]
pub struct DstSettings {
    /// Emit AU/CP/TC metadata lines after the fixed header fields
    pub extended_header: bool,
    /// Number of small jumps a TRIM expands into
    pub trim_at: usize,
}

impl Default for DstSettings {
    fn default() -> Self {
        Self {
            extended_header: false,
            trim_at: 3,
        }
    }
}

/// Encoder profile for the DST format
pub fn default_settings() -> EncoderSettings {
    EncoderSettings {
        max_stitch: 121.0,
        max_jump: 121.0,
        full_jump: true,
        round: true,
        writes_speeds: false,
        sequin_contingency: CONTINGENCY_SEQUIN_UTILIZE,
        ..Default::default()
    }
}

#[inline]
fn bit(b: u8) -> u8 {
    1 << b
}

/// Encode one DST record; the ternary digits place each delta in -121..121
fn encode_record(x: i32, y: i32, flags: u32) -> Result<[u8; 3]> {
    let mut y = -y;
    let mut x = x;
    let mut b0 = 0u8;
    let mut b1 = 0u8;
    let mut b2 = 0u8;

    if flags == JUMP || flags == SEQUIN_EJECT {
        b2 |= bit(7);
    }

    if flags == STITCH || flags == JUMP || flags == SEQUIN_EJECT {
        b2 |= bit(0) | bit(1);

        if x > 40 {
            b2 |= bit(2);
            x -= 81;
        }
        if x < -40 {
            b2 |= bit(3);
            x += 81;
        }
        if x > 13 {
            b1 |= bit(2);
            x -= 27;
        }
        if x < -13 {
            b1 |= bit(3);
            x += 27;
        }
        if x > 4 {
            b0 |= bit(2);
            x -= 9;
        }
        if x < -4 {
            b0 |= bit(3);
            x += 9;
        }
        if x > 1 {
            b1 |= bit(0);
            x -= 3;
        }
        if x < -1 {
            b1 |= bit(1);
            x += 3;
        }
        if x > 0 {
            b0 |= bit(0);
            x -= 1;
        }
        if x < 0 {
            b0 |= bit(1);
            x += 1;
        }
        if x != 0 {
            return Err(Error::Encoding(
                "DST delta exceeds the encodable X range".to_string(),
            ));
        }

        if y > 40 {
            b2 |= bit(5);
            y -= 81;
        }
        if y < -40 {
            b2 |= bit(4);
            y += 81;
        }
        if y > 13 {
            b1 |= bit(5);
            y -= 27;
        }
        if y < -13 {
            b1 |= bit(4);
            y += 27;
        }
        if y > 4 {
            b0 |= bit(5);
            y -= 9;
        }
        if y < -4 {
            b0 |= bit(4);
            y += 9;
        }
        if y > 1 {
            b1 |= bit(7);
            y -= 3;
        }
        if y < -1 {
            b1 |= bit(6);
            y += 3;
        }
        if y > 0 {
            b0 |= bit(7);
            y -= 1;
        }
        if y < 0 {
            b0 |= bit(6);
            y += 1;
        }
        if y != 0 {
            return Err(Error::Encoding(
                "DST delta exceeds the encodable Y range".to_string(),
            ));
        }
    } else if flags == COLOR_CHANGE || flags == STOP {
        b2 = 0b1100_0011;
    } else if flags == END {
        b2 = 0b1111_0011;
    } else if flags == SEQUIN_MODE {
        b2 = 0b0100_0011;
    }

    Ok([b0, b1, b2])
}

fn write_header<W: Write>(
    writer: &mut WriteHelper<W>,
    pattern: &EmbPattern,
    extended_header: bool,
) -> Result<()> {
    let name = pattern
        .get_metadata("name")
        .map(|s| s.as_str())
        .unwrap_or("Untitled");

    writer.write_string(&format!("LA:{:<16}\r", name))?;
    writer.write_string(&format!(
        "ST:{:>7}\r",
        pattern.count_stitch_commands(STITCH)
    ))?;
    writer.write_string(&format!(
        "CO:{:>3}\r",
        pattern.count_stitch_commands(COLOR_CHANGE)
    ))?;

    let bounds = pattern.bounds();
    writer.write_string(&format!("+X:{:>5}\r", bounds.2.abs() as i32))?;
    writer.write_string(&format!("-X:{:>5}\r", bounds.0.abs() as i32))?;
    writer.write_string(&format!("+Y:{:>5}\r", bounds.3.abs() as i32))?;
    writer.write_string(&format!("-Y:{:>5}\r", bounds.1.abs() as i32))?;

    let (ax, ay) = match pattern.stitches().last() {
        Some(last) => (last.x as i32, -(last.y as i32)),
        None => (0, 0),
    };
    if ax >= 0 {
        writer.write_string(&format!("AX:+{:>5}\r", ax))?;
    } else {
        writer.write_string(&format!("AX:-{:>5}\r", ax.abs()))?;
    }
    if ay >= 0 {
        writer.write_string(&format!("AY:+{:>5}\r", ay))?;
    } else {
        writer.write_string(&format!("AY:-{:>5}\r", ay.abs()))?;
    }

    writer.write_string(&format!("MX:+{:>5}\r", 0))?;
    writer.write_string(&format!("MY:+{:>5}\r", 0))?;
    writer.write_string(&format!("PD:{:>6}\r", "******"))?;

    if extended_header {
        if let Some(author) = pattern.get_metadata("author") {
            writer.write_string(&format!("AU:{}\r", author))?;
        }
        if let Some(copyright) = pattern.get_metadata("copyright") {
            writer.write_string(&format!("CP:{}\r", copyright))?;
        }
        for thread in pattern.threads() {
            let desc = thread.description.as_deref().unwrap_or("");
            let cat = thread.catalog_number.as_deref().unwrap_or("");
            writer.write_string(&format!("TC:{},{},{}\r", thread.hex_color(), desc, cat))?;
        }
    }

    writer.write_u8(0x1A)?;
    for _ in writer.bytes_written()..DST_HEADER_SIZE {
        writer.write_u8(0x20)?;
    }

    Ok(())
}

/// Write a DST file to a stream
pub fn write<W: Write>(writer: &mut W, pattern: &EmbPattern, settings: &DstSettings) -> Result<()> {
    let normalized = Transcoder::with_settings(default_settings()).transcode(pattern);
    let mut helper = WriteHelper::new(writer);

    write_header(&mut helper, &normalized, settings.extended_header)?;

    let mut xx = 0.0;
    let mut yy = 0.0;

    for stitch in normalized.stitches() {
        let data = stitch.command & COMMAND_MASK;
        let dx = (stitch.x - xx).round() as i32;
        let dy = (stitch.y - yy).round() as i32;
        xx += dx as f64;
        yy += dy as f64;

        if data == TRIM {
            // DST has no trim record; a short back-and-forth jump series
            // causes the machine to cut.
            let delta = -4;
            helper.write_bytes(&encode_record(-delta / 2, -delta / 2, JUMP)?)?;
            let mut delta = delta;
            for _ in 1..settings.trim_at.max(2) - 1 {
                helper.write_bytes(&encode_record(delta, delta, JUMP)?)?;
                delta = -delta;
            }
            helper.write_bytes(&encode_record(delta / 2, delta / 2, JUMP)?)?;
        } else {
            helper.write_bytes(&encode_record(dx, dy, data)?)?;
        }
    }

    Ok(())
}

/// Write a DST file to a path
pub fn write_file(path: &str, pattern: &EmbPattern) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    write(&mut writer, pattern, &DstSettings::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_end() {
        let record = encode_record(0, 0, END).unwrap();
        assert_eq!(record[2], 0b1111_0011);
    }

    #[test]
    fn test_encode_color_change() {
        let record = encode_record(0, 0, COLOR_CHANGE).unwrap();
        assert_eq!(record[2], 0b1100_0011);
    }

    #[test]
    fn test_encode_out_of_range() {
        assert!(encode_record(122, 0, STITCH).is_err());
        assert!(encode_record(0, -122, STITCH).is_err());
        assert!(encode_record(121, -121, STITCH).is_ok());
    }

    #[test]
    fn test_header_is_512_bytes() {
        let mut pattern = EmbPattern::new();
        pattern.add_thread(crate::core::thread::EmbThread::from_rgb(255, 0, 0));
        pattern.stitch_abs(0.0, 0.0);
        pattern.stitch_abs(10.0, 10.0);

        let mut buffer = Vec::new();
        write(&mut buffer, &pattern, &DstSettings::default()).unwrap();
        assert!(buffer.len() > DST_HEADER_SIZE);
        assert_eq!(buffer[DST_HEADER_SIZE..].len() % 3, 0);
    }
}
