//! Barudan U01 format reader
//!
//! Skips the 0x100-byte header and decodes three-byte records
//! `(ctrl, |dy|, |dx|)`. Needle changes are native (`C01`..`C15`) and come
//! back as NEEDLE_SET commands carrying the needle index; the threadlist
//! stays empty.

use crate::core::constants::*;
use crate::core::pattern::EmbPattern;
use crate::utils::error::{Error, Result};
use crate::utils::functions::encode_thread_change;
use std::io::Read;

const HEADER_SIZE: usize = 0x100;
const MAX_STITCHES: usize = 1_000_000;

/// Read a U01 file from a stream
pub fn read<R: Read>(reader: &mut R) -> Result<EmbPattern> {
    let mut pattern = EmbPattern::new();

    let mut header = vec![0u8; HEADER_SIZE];
    reader.read_exact(&mut header).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::Parse(format!(
                "U01 file too small: header must be {} bytes",
                HEADER_SIZE
            ))
        } else {
            Error::from(e)
        }
    })?;

    read_stitches(reader, &mut pattern)?;
    Ok(pattern)
}

fn read_stitches<R: Read>(reader: &mut R, pattern: &mut EmbPattern) -> Result<()> {
    let mut stitch_count = 0usize;
    let mut buf = [0u8; 3];

    loop {
        if reader.read_exact(&mut buf).is_err() {
            break;
        }

        stitch_count += 1;
        if stitch_count > MAX_STITCHES {
            return Err(Error::Parse(format!(
                "U01 file exceeds maximum stitch count of {}",
                MAX_STITCHES
            )));
        }

        let ctrl = buf[0];
        let mut dx = buf[2] as f64;
        let mut dy = buf[1] as f64;
        if ctrl & 0x20 != 0 {
            dx = -dx;
        }
        if ctrl & 0x40 == 0 {
            dy = -dy;
        }

        match ctrl & 0b11111 {
            0x00 => pattern.add_stitch_relative(dx, dy, STITCH),
            0x01 => pattern.add_stitch_relative(dx, dy, JUMP),
            0x02 | 0x04 => {
                let speed = if ctrl & 0b11111 == 0x02 { FAST } else { SLOW };
                pattern.add_stitch_relative(0.0, 0.0, speed);
                if dx != 0.0 || dy != 0.0 {
                    pattern.add_stitch_relative(dx, dy, STITCH);
                }
            },
            0x03 | 0x05 => {
                let speed = if ctrl & 0b11111 == 0x03 { FAST } else { SLOW };
                pattern.add_stitch_relative(0.0, 0.0, speed);
                if dx != 0.0 || dy != 0.0 {
                    pattern.add_stitch_relative(dx, dy, JUMP);
                }
            },
            0x06 | 0x07 => {
                pattern.add_stitch_relative(0.0, 0.0, TRIM);
                if dx != 0.0 || dy != 0.0 {
                    pattern.add_stitch_relative(dx, dy, JUMP);
                }
            },
            0x08 => {
                pattern.add_stitch_relative(0.0, 0.0, STOP);
                if dx != 0.0 || dy != 0.0 {
                    pattern.add_stitch_relative(dx, dy, JUMP);
                }
            },
            needle @ 0x09..=0x17 => {
                let needle = (needle - 0x08) as u8;
                pattern.add_stitch_relative(
                    0.0,
                    0.0,
                    encode_thread_change(NEEDLE_SET, None, Some(needle), None),
                );
                if dx != 0.0 || dy != 0.0 {
                    pattern.add_stitch_relative(dx, dy, JUMP);
                }
            },
            0x18 => break,
            _ => break,
        }
    }

    pattern.end();
    Ok(())
}

/// Read a U01 file from a path
pub fn read_file(path: &str) -> Result<EmbPattern> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    read(&mut reader)
}
