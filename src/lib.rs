//! # stitchwise
//!
//! A Rust library for reading, writing and transcoding machine-embroidery
//! designs.
//!
//! Patterns are command streams: stitches, jumps, color changes, stops,
//! trims, sequins and frame ejects with absolute coordinates, plus a thread
//! palette and metadata. The normalizing encoder rewrites a loosely-authored
//! stream into the concrete, machine-valid form each output format requires.
//!
//! ## Quick start
//!
//! ```no_run
//! use stitchwise::prelude::*;
//!
//! let mut pattern = EmbPattern::new();
//! pattern.add_thread(EmbThread::from_string("red")?);
//! pattern.stitch_abs(0.0, 0.0);
//! pattern.stitch_abs(100.0, 100.0);
//!
//! stitchwise::formats::write(&pattern, "design.dst")?;
//! let loaded = stitchwise::formats::read("design.dst")?;
//! # Ok::<(), stitchwise::Error>(())
//! ```
//!
//! ## Supported formats
//!
//! DST (Tajima), EXP (Melco), JEF (Janome), VP3 (Husqvarna/Viking),
//! PEC and PES (Brother), XXX (Singer) and U01 (Barudan), each with a
//! bit-exact reader/writer pair. See [`formats::supported_formats`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod formats;
pub mod palettes;
pub mod utils;

pub use crate::core::encoder::{EncoderSettings, Transcoder};
pub use crate::core::matrix::EmbMatrix;
pub use crate::core::pattern::{EmbPattern, Stitch};
pub use crate::core::thread::EmbThread;
pub use crate::utils::error::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::constants::*;
    pub use crate::core::encoder::{EncoderSettings, Transcoder};
    pub use crate::core::matrix::EmbMatrix;
    pub use crate::core::pattern::{EmbPattern, Stitch};
    pub use crate::core::thread::EmbThread;
    pub use crate::utils::error::{Error, Result};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_pattern_creation() {
        let pattern = EmbPattern::new();
        assert_eq!(pattern.stitches().len(), 0);
    }
}
