//! Brother PES format reader
//!
//! Reads the version signature and PEC offset, parses the version-6 header
//! (metadata strings and the embedded thread chart) when present, then
//! hands the PEC section to the PEC reader. Repeated palette entries fold
//! back into STOP commands.

use crate::core::pattern::EmbPattern;
use crate::core::thread::EmbThread;
use crate::formats::io::readers::pec;
use crate::formats::io::utils::ReadHelper;
use crate::utils::error::{Error, Result};
use std::io::{Read, Seek, SeekFrom};

fn read_pes_string_8<R: Read>(helper: &mut ReadHelper<R>) -> Result<Option<String>> {
    let length = helper.read_u8()? as usize;
    if length == 0 {
        return Ok(None);
    }
    Ok(Some(helper.read_string(length)?))
}

fn read_pes_thread<R: Read>(helper: &mut ReadHelper<R>) -> Result<EmbThread> {
    let catalog_number = read_pes_string_8(helper)?;
    let r = helper.read_u8()?;
    let g = helper.read_u8()?;
    let b = helper.read_u8()?;
    helper.read_bytes(5)?;
    let description = read_pes_string_8(helper)?;
    let brand = read_pes_string_8(helper)?;
    let chart = read_pes_string_8(helper)?;

    let mut thread = EmbThread::from_rgb(r, g, b);
    if let Some(catalog) = catalog_number {
        thread = thread.with_catalog_number(catalog);
    }
    if let Some(description) = description {
        thread = thread.with_description(description);
    }
    if let Some(brand) = brand {
        thread = thread.with_brand(brand);
    }
    if let Some(chart) = chart {
        thread = thread.with_chart(chart);
    }
    Ok(thread)
}

fn read_header_v6<R: Read>(
    helper: &mut ReadHelper<R>,
    pattern: &mut EmbPattern,
) -> Result<Vec<EmbThread>> {
    helper.read_i16_le()?; // hoop indicator
    helper.read_bytes(2)?; // subversion digits

    for key in ["name", "category", "author", "keywords", "comments"] {
        if let Some(value) = read_pes_string_8(helper)? {
            if !value.is_empty() {
                pattern.add_metadata(key, value);
            }
        }
    }

    for _ in 0..7 {
        helper.read_i16_le()?;
    }

    let thread_count = helper.read_i16_le()?.max(0) as usize;
    let mut chart = Vec::with_capacity(thread_count);
    for _ in 0..thread_count {
        chart.push(read_pes_thread(helper)?);
    }

    helper.read_i16_le()?; // distinct block objects
    Ok(chart)
}

/// Read a PES file from a stream
pub fn read<R: Read + Seek>(reader: &mut R) -> Result<EmbPattern> {
    let mut pattern = EmbPattern::new();

    let mut helper = ReadHelper::new(&mut *reader);
    let signature = helper.read_string(8)?;
    if !signature.starts_with("#PES") {
        return Err(Error::Parse(format!(
            "Invalid PES header: got '{}'",
            signature
        )));
    }

    let pec_offset = helper.read_u32_le()? as u64;

    let chart = if signature == "#PES0001" {
        None
    } else {
        // Later versions carry a header block with the thread chart.
        match read_header_v6(&mut helper, &mut pattern) {
            Ok(chart) if !chart.is_empty() => Some(chart),
            _ => None,
        }
    };

    reader.seek(SeekFrom::Start(pec_offset))?;
    pec::read_pec(reader, &mut pattern, chart)?;
    pattern.interpolate_duplicate_color_as_stop();
    Ok(pattern)
}

/// Read a PES file from a path
pub fn read_file(path: &str) -> Result<EmbPattern> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    read(&mut reader)
}
