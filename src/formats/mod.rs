//! Format dispatch and the format catalog
//!
//! `read` and `write` dispatch on the lowercased file extension. A missing
//! file surfaces the underlying I/O error; an unrecognized extension fails
//! with `UnsupportedFormat`.

pub mod io;
pub mod registry;

pub use registry::{supported_formats, FormatCategory, FormatDescriptor};

use crate::core::pattern::EmbPattern;
use crate::utils::error::{Error, Result};
use std::path::Path;

fn extension_of(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Read a pattern from a path, dispatching on the file extension
pub fn read(path: &str) -> Result<EmbPattern> {
    let extension = extension_of(path)
        .ok_or_else(|| Error::UnsupportedFormat(format!("No file extension: {}", path)))?;

    match extension.as_str() {
        "dst" => io::readers::dst::read_file(path),
        "exp" => io::readers::exp::read_file(path),
        "jef" => io::readers::jef::read_file(path),
        "vp3" => io::readers::vp3::read_file(path),
        "pec" => io::readers::pec::read_file(path),
        "pes" => io::readers::pes::read_file(path),
        "xxx" => io::readers::xxx::read_file(path),
        "u01" => io::readers::u01::read_file(path),
        other => Err(Error::UnsupportedFormat(format!(
            "No reader for extension: {}",
            other
        ))),
    }
}

/// Write a pattern to a path, dispatching on the file extension
pub fn write(pattern: &EmbPattern, path: &str) -> Result<()> {
    let extension = extension_of(path)
        .ok_or_else(|| Error::UnsupportedFormat(format!("No file extension: {}", path)))?;

    match extension.as_str() {
        "dst" => io::writers::dst::write_file(path, pattern),
        "exp" => io::writers::exp::write_file(path, pattern),
        "jef" => io::writers::jef::write_file(path, pattern),
        "vp3" => io::writers::vp3::write_file(path, pattern),
        "pec" => io::writers::pec::write_file(path, pattern),
        "pes" => io::writers::pes::write_file(path, pattern),
        "xxx" => io::writers::xxx::write_file(path, pattern),
        "u01" => io::writers::u01::write_file(path, pattern),
        other => Err(Error::UnsupportedFormat(format!(
            "No writer for extension: {}",
            other
        ))),
    }
}
