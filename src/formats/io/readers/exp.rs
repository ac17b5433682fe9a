//! Melco EXP format reader
//!
//! Two-byte signed delta records; a leading 0x80 marks a control pair
//! (`0x01` color change, `0x02` stop/trim, `0x80` jump follows), itself
//! followed by a delta pair. EXP embeds no palette, so the threadlist is
//! always empty.

use crate::core::pattern::EmbPattern;
use crate::utils::error::{Error, Result};
use std::io::Read;

const MAX_STITCHES: usize = 1_000_000;

/// Read an EXP file from a stream
pub fn read<R: Read>(reader: &mut R) -> Result<EmbPattern> {
    let mut pattern = EmbPattern::new();
    let mut buffer = [0u8; 2];
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
                "EXP file exceeds maximum stitch count of {}",
                MAX_STITCHES
            )));
        }

        if buffer[0] != 0x80 {
            let dx = buffer[0] as i8 as f64;
            let dy = -(buffer[1] as i8 as f64);
            pattern.stitch(dx, dy);
            continue;
        }

        let control = buffer[1];

        match reader.read_exact(&mut buffer) {
            Ok(_) => {},
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(Error::from(e)),
        }
        let dx = buffer[0] as i8 as f64;
        let dy = -(buffer[1] as i8 as f64);

        match control {
            0x80 => {
                pattern.jump(dx, dy);
            },
            0x01 => {
                pattern.color_change(0.0, 0.0);
                if dx != 0.0 || dy != 0.0 {
                    pattern.jump(dx, dy);
                }
            },
            0x02 => {
                pattern.trim();
                if dx != 0.0 || dy != 0.0 {
                    pattern.jump(dx, dy);
                }
            },
            0x04 => {
                // Alternate jump control used by some emitters.
                pattern.jump(dx, dy);
            },
            _ => break,
        }
    }

    pattern.end();
    Ok(pattern)
}

/// Read an EXP file from a path
pub fn read_file(path: &str) -> Result<EmbPattern> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    read(&mut reader)
}
