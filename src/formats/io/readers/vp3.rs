//! Husqvarna/Viking VP3 format reader
//!
//! Walks the `%`-delimited sections: metadata strings, then the `%emb%`
//! block table with one length-prefixed `%xxs%` block per color. Each block
//! carries its thread (RGB + name), so the rebuilt pattern satisfies
//! `threads == color changes + 1`.

use crate::core::pattern::EmbPattern;
use crate::core::thread::EmbThread;
use crate::formats::io::utils::ReadHelper;
use crate::utils::error::{Error, Result};
use std::io::Read;

const VP3_SIGNATURE: &[u8] = b"%vsm%";
const MAX_BLOCK_SIZE: usize = 10_000_000;

/// Read a VP3 file from a stream
pub fn read<R: Read>(reader: &mut R) -> Result<EmbPattern> {
    let mut helper = ReadHelper::new(reader);
    let mut pattern = EmbPattern::new();

    let signature = helper.read_bytes(5)?;
    if signature != VP3_SIGNATURE {
        return Err(Error::Parse("Invalid VP3 signature".to_string()));
    }

    let mut blocks_remaining = 0usize;
    let mut blocks_read = 0usize;

    while let Ok(marker) = helper.read_bytes(5) {
        if !(marker.starts_with(b"%") && marker.ends_with(b"%")) {
            break;
        }
        match &marker[1..4] {
            b"nam" => read_string_section(&mut helper, &mut pattern, "name")?,
            b"aut" => read_string_section(&mut helper, &mut pattern, "author")?,
            b"cop" => read_string_section(&mut helper, &mut pattern, "copyright")?,
            b"com" => read_string_section(&mut helper, &mut pattern, "comments")?,
            b"emb" => {
                blocks_remaining = helper.read_u16_le()? as usize;
            },
            b"xxs" => {
                if blocks_read > 0 {
                    pattern.color_change(0.0, 0.0);
                }
                read_stitch_block(&mut helper, &mut pattern)?;
                blocks_read += 1;
                if blocks_remaining > 0 {
                    blocks_remaining -= 1;
                }
            },
            b"end" => break,
            _ => skip_section(&mut helper)?,
        }
    }

    pattern.end();
    Ok(pattern)
}

fn read_string_section<R: Read>(
    helper: &mut ReadHelper<R>,
    pattern: &mut EmbPattern,
    key: &str,
) -> Result<()> {
    let length = helper.read_u16_le()? as usize;
    if length > 0 && length < 10_000 {
        let bytes = helper.read_bytes(length)?;
        let text = String::from_utf8_lossy(&bytes);
        let text = text.trim_end_matches('\0').trim();
        if !text.is_empty() {
            pattern.add_metadata(key, text);
        }
    }
    Ok(())
}

fn skip_section<R: Read>(helper: &mut ReadHelper<R>) -> Result<()> {
    if let Ok(length) = helper.read_u16_le() {
        let length = length as usize;
        if length > 0 && length < 100_000 {
            let _ = helper.read_bytes(length);
        }
    }
    Ok(())
}

fn read_stitch_block<R: Read>(helper: &mut ReadHelper<R>, pattern: &mut EmbPattern) -> Result<()> {
    let payload_len = helper.read_u32_le()? as usize;
    if payload_len < 4 || payload_len > MAX_BLOCK_SIZE {
        return Err(Error::Parse(format!(
            "VP3 block size out of range: {}",
            payload_len
        )));
    }

    let payload = helper.read_bytes(payload_len)?;
    let mut pos = 0usize;

    let r = payload[pos];
    let g = payload[pos + 1];
    let b = payload[pos + 2];
    let name_len = payload[pos + 3] as usize;
    pos += 4;

    let mut thread = EmbThread::from_rgb(r, g, b);
    if pos + name_len <= payload.len() && name_len > 0 {
        let name = String::from_utf8_lossy(&payload[pos..pos + name_len]).to_string();
        thread = thread.with_description(name);
    }
    pos += name_len;
    pattern.add_thread(thread);

    while pos + 1 < payload.len() {
        let b0 = payload[pos];
        let b1 = payload[pos + 1];
        pos += 2;

        if b0 != 0x80 {
            pattern.stitch(b0 as i8 as f64, b1 as i8 as f64);
            continue;
        }

        match b1 {
            0x00 => break,
            0x01 | 0x02 => {
                if pos + 4 > payload.len() {
                    return Err(Error::Parse("Truncated VP3 escape record".to_string()));
                }
                let dx = i16::from_be_bytes([payload[pos], payload[pos + 1]]) as f64;
                let dy = i16::from_be_bytes([payload[pos + 2], payload[pos + 3]]) as f64;
                pos += 4;
                if b1 == 0x01 {
                    pattern.stitch(dx, dy);
                } else {
                    pattern.jump(dx, dy);
                }
            },
            0x03 => pattern.trim(),
            0x04 => pattern.stop(),
            _ => {
                return Err(Error::Parse(format!(
                    "Unknown VP3 block escape: 0x{:02x}",
                    b1
                )));
            },
        }
    }

    Ok(())
}

/// Read a VP3 file from a path
pub fn read_file(path: &str) -> Result<EmbPattern> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    read(&mut reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::*;
    use std::io::Cursor;

    #[test]
    fn test_invalid_signature() {
        let data = b"Invalid data";
        let mut cursor = Cursor::new(&data[..]);
        assert!(read(&mut cursor).is_err());
    }

    #[test]
    fn test_round_trip_embedded_threads() {
        let mut original = EmbPattern::new();
        original.set_metadata("name", "roundtrip");
        original.add_thread(EmbThread::from_rgb(255, 0, 0).with_description("Red"));
        original.add_thread(EmbThread::from_rgb(0, 0, 255).with_description("Blue"));
        original.stitch_abs(0.0, 0.0);
        original.stitch_abs(100.0, 100.0);
        original.color_change(0.0, 0.0);
        original.stitch_abs(200.0, 0.0);
        original.stitch_abs(0.0, 200.0);

        let mut buffer = Vec::new();
        crate::formats::io::writers::vp3::write(&mut buffer, &original).unwrap();

        let mut cursor = Cursor::new(buffer);
        let loaded = read(&mut cursor).unwrap();
        assert_eq!(loaded.count_threads(), 2);
        assert_eq!(loaded.count_stitch_commands(COLOR_CHANGE), 1);
        assert_eq!(loaded.count_stitch_commands(STITCH), 4);
        assert_eq!(loaded.threads()[0].color, 0xFF0000);
        assert_eq!(loaded.threads()[1].description.as_deref(), Some("Blue"));
        assert_eq!(loaded.get_metadata("name").map(|s| s.as_str()), Some("roundtrip"));
    }
}
