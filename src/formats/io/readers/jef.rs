//! Janome JEF format reader
//!
//! Parses the binary header, resolves palette indices against the 79-color
//! Janome table (slot 0 entries mark stops) and decodes the two-byte delta
//! stitch records.

use crate::core::pattern::EmbPattern;
use crate::formats::io::utils::ReadHelper;
use crate::palettes::thread_jef::JEF_THREADS;
use crate::utils::error::{Error, Result};
use std::io::{Read, Seek, SeekFrom};

const MAX_COLORS: usize = 1_000;

fn read_stitches<R: Read>(
    reader: &mut R,
    pattern: &mut EmbPattern,
    palette: &[i32],
) -> Result<()> {
    // palette[0] is the opening color; each change record consumes the next
    // entry, pausing instead of changing when it is the placeholder.
    let mut change_index = 1usize;
    let mut buffer = [0u8; 2];

    loop {
        match reader.read_exact(&mut buffer) {
            Ok(_) => {},
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(Error::from(e)),
        }

        if buffer[0] != 0x80 {
            let dx = buffer[0] as i8 as f64;
            let dy = -(buffer[1] as i8 as f64);
            pattern.stitch(dx, dy);
            continue;
        }

        let ctrl = buffer[1];

        match reader.read_exact(&mut buffer) {
            Ok(_) => {},
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(Error::from(e)),
        }
        let dx = buffer[0] as i8 as f64;
        let dy = -(buffer[1] as i8 as f64);

        match ctrl {
            0x02 => {
                pattern.jump(dx, dy);
            },
            0x01 => {
                let is_stop = palette.get(change_index) == Some(&0);
                change_index += 1;
                if is_stop {
                    pattern.stop();
                } else {
                    pattern.color_change(0.0, 0.0);
                }
                if dx != 0.0 || dy != 0.0 {
                    pattern.jump(dx, dy);
                }
            },
            0x10 => break,
            _ => break,
        }
    }

    pattern.end();
    Ok(())
}

/// Read a JEF file from a stream
pub fn read<R: Read + Seek>(reader: &mut R) -> Result<EmbPattern> {
    let mut pattern = EmbPattern::new();
    let mut helper = ReadHelper::new(reader);

    let stitch_offset = helper.read_i32_le()?;
    helper.read_bytes(20)?;

    let count_colors = helper.read_i32_le()?.max(0) as usize;
    if count_colors > MAX_COLORS {
        return Err(Error::Parse(format!(
            "JEF color count too large: {} (max {})",
            count_colors, MAX_COLORS
        )));
    }

    helper.read_bytes(88)?;

    let mut palette = Vec::with_capacity(count_colors);
    for _ in 0..count_colors {
        let index = helper.read_i32_le()?.unsigned_abs() as i32;
        palette.push(index);
        if index != 0 {
            let slot = index as usize % JEF_THREADS.len();
            if let Some(thread) = &JEF_THREADS[slot] {
                pattern.add_thread(thread.clone());
            }
        }
    }

    let reader = helper.into_inner();
    reader.seek(SeekFrom::Start(stitch_offset.max(0) as u64))?;

    read_stitches(reader, &mut pattern, &palette)?;
    Ok(pattern)
}

/// Read a JEF file from a path
pub fn read_file(path: &str) -> Result<EmbPattern> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    read(&mut reader)
}
