//! Melco EXP format writer
//!
//! EXP is a headerless stream of two-byte signed deltas. Control pairs:
//! `0x80 0x01` color change, `0x80 0x02` stop/trim, `0x80 0x80` jump
//! follows. Each control pair is followed by a delta pair.

use crate::core::constants::*;
use crate::core::encoder::{EncoderSettings, Transcoder};
use crate::core::pattern::EmbPattern;
use crate::formats::io::utils::WriteHelper;
use crate::utils::error::Result;
use std::io::Write;

/// Encoder profile for the EXP format
pub fn default_settings() -> EncoderSettings {
    EncoderSettings {
        max_stitch: 127.0,
        max_jump: 127.0,
        round: true,
        writes_speeds: false,
        ..Default::default()
    }
}

/// Write an EXP file to a stream
pub fn write<W: Write>(writer: &mut W, pattern: &EmbPattern) -> Result<()> {
    let normalized = Transcoder::with_settings(default_settings()).transcode(pattern);
    let mut helper = WriteHelper::new(writer);

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
            JUMP | SEQUIN_EJECT => {
                helper.write_bytes(&[0x80, 0x80])?;
                helper.write_i8(dx as i8)?;
                helper.write_i8((-dy) as i8)?;
            },
            COLOR_CHANGE => {
                helper.write_bytes(&[0x80, 0x01, 0x00, 0x00])?;
            },
            TRIM | STOP => {
                helper.write_bytes(&[0x80, 0x02, 0x00, 0x00])?;
            },
            END => break,
            _ => {},
        }
    }

    Ok(())
}

/// Write an EXP file to a path
pub fn write_file(path: &str, pattern: &EmbPattern) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    write(&mut writer, pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_stitches_are_two_bytes() {
        let mut pattern = EmbPattern::new();
        pattern.add_thread(crate::core::thread::EmbThread::from_rgb(255, 0, 0));
        pattern.stitch_abs(10.0, 20.0);
        pattern.stitch_abs(15.0, 30.0);

        let mut buffer = Vec::new();
        write(&mut buffer, &pattern).unwrap();
        // Two stitch records, END writes nothing.
        assert_eq!(buffer.len(), 4);
        assert_eq!(buffer[0] as i8, 10);
        assert_eq!(buffer[1] as i8, -20);
    }

    #[test]
    fn test_write_color_change_control() {
        let mut pattern = EmbPattern::new();
        pattern.add_thread(crate::core::thread::EmbThread::from_rgb(255, 0, 0));
        pattern.add_thread(crate::core::thread::EmbThread::from_rgb(0, 0, 255));
        pattern.stitch_abs(0.0, 0.0);
        pattern.color_change(0.0, 0.0);
        pattern.stitch_abs(5.0, 5.0);

        let mut buffer = Vec::new();
        write(&mut buffer, &pattern).unwrap();
        assert!(buffer.windows(2).any(|w| w == [0x80, 0x01]));
    }
}
