//! Format catalog
//!
//! A read-only registry of the formats this crate understands: extensions,
//! aliases, human descriptions, category and reader/writer capability.

/// Broad category of a file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatCategory {
    /// Machine embroidery stitch formats
    Embroidery,
    /// Thread color list formats
    Color,
    /// Quilting machine formats
    Quilting,
    /// Utility and metadata formats
    Utility,
    /// Raster image output
    Image,
    /// Vector output
    Vector,
}

impl FormatCategory {
    /// Catalog key for this category
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatCategory::Embroidery => "embroidery",
            FormatCategory::Color => "color",
            FormatCategory::Quilting => "quilting",
            FormatCategory::Utility => "utility",
            FormatCategory::Image => "image",
            FormatCategory::Vector => "vector",
        }
    }
}

/// Descriptor for one supported format
#[derive(Debug, Clone)]
pub struct FormatDescriptor {
    /// Primary file extension
    pub extension: &'static str,
    /// All extensions including aliases
    pub extensions: &'static [&'static str],
    /// Human-readable description
    pub description: &'static str,
    /// Format category
    pub category: FormatCategory,
    /// Whether a reader exists
    pub reader: bool,
    /// Whether a writer exists
    pub writer: bool,
}

/// List all supported formats
pub fn supported_formats() -> Vec<FormatDescriptor> {
    vec![
        FormatDescriptor {
            extension: "dst",
            extensions: &["dst"],
            description: "Tajima Embroidery Format",
            category: FormatCategory::Embroidery,
            reader: true,
            writer: true,
        },
        FormatDescriptor {
            extension: "exp",
            extensions: &["exp"],
            description: "Melco Embroidery Format",
            category: FormatCategory::Embroidery,
            reader: true,
            writer: true,
        },
        FormatDescriptor {
            extension: "jef",
            extensions: &["jef"],
            description: "Janome Embroidery Format",
            category: FormatCategory::Embroidery,
            reader: true,
            writer: true,
        },
        FormatDescriptor {
            extension: "vp3",
            extensions: &["vp3"],
            description: "Husqvarna Viking Embroidery Format",
            category: FormatCategory::Embroidery,
            reader: true,
            writer: true,
        },
        FormatDescriptor {
            extension: "pec",
            extensions: &["pec"],
            description: "Brother Embroidery Format",
            category: FormatCategory::Embroidery,
            reader: true,
            writer: true,
        },
        FormatDescriptor {
            extension: "pes",
            extensions: &["pes"],
            description: "Brother Embroidery Format",
            category: FormatCategory::Embroidery,
            reader: true,
            writer: true,
        },
        FormatDescriptor {
            extension: "xxx",
            extensions: &["xxx"],
            description: "Singer Embroidery Format",
            category: FormatCategory::Embroidery,
            reader: true,
            writer: true,
        },
        FormatDescriptor {
            extension: "u01",
            extensions: &["u01"],
            description: "Barudan Embroidery Format",
            category: FormatCategory::Embroidery,
            reader: true,
            writer: true,
        },
    ]
}
