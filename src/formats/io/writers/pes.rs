//! Brother PES format writer
//!
//! PES wraps a PEC section behind a versioned header. Version `"1"` writes
//! the minimal `#PES0001` wrapper; version `"6t"` writes `#PES0060` with
//! metadata strings, hoop fields and an embedded thread chart. The chart
//! plus the repeated-palette-entry convention is what lets `"6t"` preserve
//! STOP commands across a round trip.

use crate::core::encoder::{EncoderSettings, Transcoder};
use crate::core::pattern::EmbPattern;
use crate::core::thread::EmbThread;
use crate::formats::io::utils::WriteHelper;
use crate::formats::io::writers::pec;
use crate::utils::error::{Error, Result};
use std::io::{Seek, SeekFrom, Write};

/// PES version 1 signature
pub const PES_VERSION_1_SIGNATURE: &str = "#PES0001";

/// PES version 6 signature
pub const PES_VERSION_6_SIGNATURE: &str = "#PES0060";

/// Writer options for PES
#[derive(Debug, Clone)]
pub struct PesSettings {
    /// Format version: `"1"` or `"6t"`
    pub version: String,
}

impl Default for PesSettings {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
        }
    }
}

/// Encoder profile for the PES format (shared with PEC)
pub fn default_settings() -> EncoderSettings {
    pec::default_settings()
}

fn write_pes_string_8<W: Write>(w: &mut WriteHelper<W>, s: Option<&String>) -> Result<()> {
    match s {
        None => w.write_u8(0)?,
        Some(string) => {
            let len = string.len().min(255);
            w.write_u8(len as u8)?;
            w.write_string(&string[..len])?;
        },
    }
    Ok(())
}

fn write_pes_thread<W: Write>(w: &mut WriteHelper<W>, thread: &EmbThread) -> Result<()> {
    write_pes_string_8(w, thread.catalog_number.as_ref())?;
    w.write_u8(thread.red())?;
    w.write_u8(thread.green())?;
    w.write_u8(thread.blue())?;
    w.write_u8(0)?;
    w.write_i32_le(0xA)?;
    write_pes_string_8(w, thread.description.as_ref())?;
    write_pes_string_8(w, thread.brand.as_ref())?;
    write_pes_string_8(w, thread.chart.as_ref())?;
    Ok(())
}

fn write_header_v6<W: Write>(w: &mut WriteHelper<W>, pattern: &EmbPattern) -> Result<()> {
    w.write_i16_le(0x01)?;
    w.write_bytes(b"02")?;

    write_pes_string_8(w, pattern.extras().get("name"))?;
    write_pes_string_8(w, pattern.extras().get("category"))?;
    write_pes_string_8(w, pattern.extras().get("author"))?;
    write_pes_string_8(w, pattern.extras().get("keywords"))?;
    write_pes_string_8(w, pattern.extras().get("comments"))?;

    w.write_i16_le(0)?; // optimize hoop change
    w.write_i16_le(0)?; // custom design page
    w.write_i16_le(0x64)?; // hoop width
    w.write_i16_le(0x64)?; // hoop height
    w.write_i16_le(0)?; // use existing design area
    w.write_i16_le(0xC8)?; // design width
    w.write_i16_le(0xC8)?; // design height

    let threads = pattern.threads();
    w.write_i16_le(threads.len() as i16)?;
    for thread in threads {
        write_pes_thread(w, thread)?;
    }

    w.write_i16_le(0)?; // distinct block objects
    Ok(())
}

/// Write a PES file to a stream
pub fn write<W: Write + Seek>(
    writer: &mut W,
    pattern: &EmbPattern,
    settings: &PesSettings,
) -> Result<()> {
    let normalized = Transcoder::with_settings(default_settings()).transcode(pattern);

    match settings.version.as_str() {
        "1" | "1t" => {
            let mut w = WriteHelper::new(writer);
            w.write_string(PES_VERSION_1_SIGNATURE)?;
            // PEC section begins at 0x16: signature + offset + 10 reserved.
            w.write_u32_le(0x16)?;
            w.write_bytes(&[0x00; 10])?;
            pec::write_pec_section(w.inner_mut(), &normalized)?;
        },
        "6" | "6t" => {
            let mut w = WriteHelper::new(writer);
            w.write_string(PES_VERSION_6_SIGNATURE)?;
            let offset_position = w.bytes_written();
            w.write_u32_le(0)?;
            write_header_v6(&mut w, &normalized)?;
            let pec_position = w.bytes_written();
            w.seek(SeekFrom::Start(offset_position as u64))?;
            w.write_u32_le(pec_position as u32)?;
            w.seek(SeekFrom::Start(pec_position as u64))?;
            pec::write_pec_section(w.inner_mut(), &normalized)?;
            w.inner_mut().write_all(&[0x00, 0x00])?;
        },
        other => {
            return Err(Error::UnsupportedFormat(format!(
                "Unknown PES version: {}",
                other
            )));
        },
    }

    Ok(())
}

/// Write a PES file to a path
pub fn write_file(path: &str, pattern: &EmbPattern) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    write(&mut writer, pattern, &PesSettings::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_v1_signature_and_offset() {
        let mut pattern = EmbPattern::new();
        pattern.add_thread(EmbThread::from_rgb(255, 0, 0));
        pattern.stitch_abs(0.0, 0.0);
        pattern.stitch_abs(10.0, 10.0);

        let mut buffer = Cursor::new(Vec::new());
        write(&mut buffer, &pattern, &PesSettings::default()).unwrap();
        let data = buffer.into_inner();
        assert_eq!(&data[0..8], b"#PES0001");
        assert_eq!(
            u32::from_le_bytes([data[8], data[9], data[10], data[11]]),
            0x16
        );
        assert_eq!(&data[0x16..0x19], b"LA:");
    }

    #[test]
    fn test_unknown_version_rejected() {
        let pattern = EmbPattern::new();
        let mut buffer = Cursor::new(Vec::new());
        let result = write(
            &mut buffer,
            &pattern,
            &PesSettings {
                version: "9z".to_string(),
            },
        );
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_mismatched_threads_still_write() {
        let mut pattern = EmbPattern::new();
        for _ in 0..3 {
            pattern.add_thread(EmbThread::from_string("red").unwrap());
        }
        pattern.stitch_abs(0.0, 0.0);
        pattern.stitch_abs(100.0, 100.0);
        pattern.color_change(0.0, 0.0);
        pattern.stitch_abs(100.0, 0.0);
        pattern.color_change(0.0, 0.0);
        pattern.stitch_abs(0.0, 100.0);
        pattern.color_change(0.0, 0.0);
        pattern.stitch_abs(0.0, 0.0);

        for version in ["1", "6t"] {
            let mut buffer = Cursor::new(Vec::new());
            write(
                &mut buffer,
                &pattern,
                &PesSettings {
                    version: version.to_string(),
                },
            )
            .unwrap();
            assert!(!buffer.into_inner().is_empty());
        }
    }
}
