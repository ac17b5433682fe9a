//! Singer XXX format reader
//!
//! Reads the 0x100-byte header (color count at 0x27), the two-byte delta
//! records with the `0x7D` long-form escape and `0x7F` controls, then the
//! trailing 0RGB color table.

use crate::core::constants::*;
use crate::core::pattern::EmbPattern;
use crate::core::thread::EmbThread;
use crate::utils::error::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;

const MAX_COLORS: u16 = 1_000;
const MAX_STITCHES: usize = 1_000_000;

/// Read an XXX file from a stream
pub fn read<R: Read>(reader: &mut R) -> Result<EmbPattern> {
    let mut pattern = EmbPattern::new();

    let mut header = vec![0u8; 0x27];
    reader.read_exact(&mut header).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::Parse("XXX file too small for header".to_string())
        } else {
            Error::from(e)
        }
    })?;

    let num_colors = reader.read_u16::<LittleEndian>()?;
    if num_colors > MAX_COLORS {
        return Err(Error::Parse(format!(
            "XXX color count too large: {} (max {})",
            num_colors, MAX_COLORS
        )));
    }

    let mut skip = vec![0u8; 0x100 - 0x27 - 2];
    reader.read_exact(&mut skip)?;

    let mut stitch_count = 0usize;
    loop {
        stitch_count += 1;
        if stitch_count > MAX_STITCHES {
            return Err(Error::Parse(format!(
                "XXX file exceeds maximum stitch count of {}",
                MAX_STITCHES
            )));
        }

        let b1 = reader.read_u8()?;

        if b1 == 0x7D || b1 == 0x7E {
            let x = reader.read_i16::<LittleEndian>()? as f64;
            let y = reader.read_i16::<LittleEndian>()? as f64;
            pattern.add_stitch_relative(x, -y, STITCH);
            continue;
        }

        let b2 = reader.read_u8()?;

        if b1 != 0x7F {
            pattern.add_stitch_relative(b1 as i8 as f64, -(b2 as i8 as f64), STITCH);
            continue;
        }

        let b3 = reader.read_u8()?;
        let b4 = reader.read_u8()?;
        let dx = b3 as i8 as f64;
        let dy = -(b4 as i8 as f64);

        match b2 {
            0x01 => pattern.add_stitch_relative(dx, dy, JUMP),
            0x03 => pattern.add_stitch_relative(dx, dy, TRIM),
            0x08 | 0x0A..=0x17 => pattern.add_stitch_relative(dx, dy, COLOR_CHANGE),
            0x7F | 0x18 => break,
            _ => {},
        }
    }

    pattern.end();

    // Two filler bytes separate the end marker from the color table.
    let mut skip = [0u8; 2];
    reader.read_exact(&mut skip)?;

    for _ in 0..num_colors {
        let color = reader.read_u32::<byteorder::BigEndian>()?;
        pattern.add_thread(EmbThread::new(color & 0xFF_FFFF));
    }

    Ok(pattern)
}

/// Read an XXX file from a path
pub fn read_file(path: &str) -> Result<EmbPattern> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    read(&mut reader)
}
