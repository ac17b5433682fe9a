//! Thread color management and color utilities
//!
//! Provides the `EmbThread` type for representing thread colors with RGB
//! values, catalog numbers and descriptions, plus named-color parsing and
//! perceptual color distance for palette lookup.

use crate::utils::error::{Error, Result};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Embroidery thread with color and metadata
///
/// Equality is defined by RGB only, so `"red"` and `"#F00"` compare equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbThread {
    /// Thread color in RGB format (0xRRGGBB)
    pub color: u32,

    /// Thread description/name
    pub description: Option<String>,

    /// Catalog/ID number
    pub catalog_number: Option<String>,

    /// Additional details
    pub details: Option<String>,

    /// Brand/manufacturer
    pub brand: Option<String>,

    /// Chart reference
    pub chart: Option<String>,

    /// Thread weight
    pub weight: Option<String>,
}

impl EmbThread {
    /// Create a new thread with a given color
    pub fn new(color: u32) -> Self {
        Self {
            color: color & 0xFF_FFFF,
            description: None,
            catalog_number: None,
            details: None,
            brand: None,
            chart: None,
            weight: None,
        }
    }

    /// Create a thread from a color string (hex, named color or `"random"`)
    ///
    /// # Example
    ///
    /// ```
    /// use stitchwise::core::thread::EmbThread;
    ///
    /// let t0 = EmbThread::from_string("red").unwrap();
    /// let t1 = EmbThread::from_string("#F00").unwrap();
    /// assert_eq!(t0, t1);
    /// ```
    pub fn from_string(color_str: &str) -> Result<Self> {
        Ok(Self::new(parse_color_string(color_str)?))
    }

    /// Create a thread from RGB components
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(color_rgb(r, g, b))
    }

    /// Create a thread with a pseudo-random color
    pub fn random() -> Self {
        Self::new(random_color())
    }

    /// Get color as a `#rrggbb` hex string
    pub fn hex_color(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red(), self.green(), self.blue())
    }

    /// Red component (0-255)
    pub fn red(&self) -> u8 {
        ((self.color >> 16) & 0xFF) as u8
    }

    /// Green component (0-255)
    pub fn green(&self) -> u8 {
        ((self.color >> 8) & 0xFF) as u8
    }

    /// Blue component (0-255)
    pub fn blue(&self) -> u8 {
        (self.color & 0xFF) as u8
    }

    /// Perceptual distance to another color
    pub fn color_distance(&self, other_color: u32) -> f64 {
        color_distance(self.color, other_color) as f64
    }

    /// Find the nearest color in a palette, returning its index
    pub fn find_nearest_color_index(&self, palette: &[EmbThread]) -> Option<usize> {
        find_nearest_color_index(self.color, palette)
    }

    /// Builder method: set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Builder method: set catalog number
    pub fn with_catalog_number(mut self, catalog: impl Into<String>) -> Self {
        self.catalog_number = Some(catalog.into());
        self
    }

    /// Builder method: set brand
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Builder method: set chart
    pub fn with_chart(mut self, chart: impl Into<String>) -> Self {
        self.chart = Some(chart.into());
        self
    }

    /// Builder method: set weight
    pub fn with_weight(mut self, weight: impl Into<String>) -> Self {
        self.weight = Some(weight.into());
        self
    }
}

impl Default for EmbThread {
    fn default() -> Self {
        Self::new(0x000000)
    }
}

impl PartialEq for EmbThread {
    fn eq(&self, other: &Self) -> bool {
        self.color == other.color
    }
}

impl Eq for EmbThread {}

impl std::fmt::Display for EmbThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.description {
            Some(ref desc) => write!(f, "EmbThread {} {}", desc, self.hex_color()),
            None => write!(f, "EmbThread {}", self.hex_color()),
        }
    }
}

// Color utility functions

/// Pack RGB components into a single u32 color value
pub fn color_rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

/// Parse a hex color string (with or without `#`, 3 or 6 digits)
pub fn parse_color_hex(hex_string: &str) -> Result<u32> {
    let h = hex_string.trim_start_matches('#');

    match h.len() {
        6 | 8 => u32::from_str_radix(&h[..6], 16)
            .map_err(|_| Error::InvalidColor(format!("Invalid hex color: {}", hex_string))),
        3 | 4 => {
            let chars: Vec<char> = h.chars().collect();
            let expanded = format!(
                "{}{}{}{}{}{}",
                chars[0], chars[0], chars[1], chars[1], chars[2], chars[2]
            );
            u32::from_str_radix(&expanded, 16)
                .map_err(|_| Error::InvalidColor(format!("Invalid hex color: {}", hex_string)))
        },
        _ => Err(Error::InvalidColor(format!(
            "Invalid hex color length: {}",
            hex_string
        ))),
    }
}

/// Parse a color string: hex, named color or `"random"`
pub fn parse_color_string(color: &str) -> Result<u32> {
    if color == "random" {
        return Ok(random_color());
    }

    if color.starts_with('#') {
        return parse_color_hex(color);
    }

    if (color.len() == 3 || color.len() == 6) && color.chars().all(|c| c.is_ascii_hexdigit()) {
        return parse_color_hex(color);
    }

    NAMED_COLORS
        .get(color.to_lowercase().as_str())
        .copied()
        .ok_or_else(|| Error::InvalidColor(format!("Unknown color name: {}", color)))
}

/// Produce a pseudo-random RGB value without a dedicated RNG dependency
fn random_color() -> u32 {
    use std::collections::hash_map::RandomState;
    use std::hash::BuildHasher;
    (RandomState::new().hash_one(std::time::SystemTime::now()) as u32) & 0xFF_FFFF
}

/// Perceptual color distance using the red-mean formula
///
/// See: <https://www.compuphase.com/cmetric.htm>
pub fn color_distance(color1: u32, color2: u32) -> u32 {
    let r1 = ((color1 >> 16) & 0xFF) as i32;
    let g1 = ((color1 >> 8) & 0xFF) as i32;
    let b1 = (color1 & 0xFF) as i32;
    let r2 = ((color2 >> 16) & 0xFF) as i32;
    let g2 = ((color2 >> 8) & 0xFF) as i32;
    let b2 = (color2 & 0xFF) as i32;

    let red_mean = (r1 + r2) / 2;
    let r = r1 - r2;
    let g = g1 - g2;
    let b = b1 - b2;

    let r_component = ((512 + red_mean) * r * r) >> 8;
    let g_component = 4 * g * g;
    let b_component = ((767 - red_mean) * b * b) >> 8;

    r_component
        .saturating_add(g_component)
        .saturating_add(b_component) as u32
}

/// Find the nearest color in a palette
pub fn find_nearest_color_index(color: u32, palette: &[EmbThread]) -> Option<usize> {
    if palette.is_empty() {
        return None;
    }

    let mut closest_index = 0;
    let mut closest_distance = u32::MAX;

    for (i, thread) in palette.iter().enumerate() {
        let dist = color_distance(color, thread.color);
        if dist < closest_distance {
            closest_distance = dist;
            closest_index = i;
            if dist == 0 {
                break;
            }
        }
    }

    Some(closest_index)
}

lazy_static! {
    /// Named colors recognized by `parse_color_string`
    static ref NAMED_COLORS: HashMap<&'static str, u32> = {
        let mut m = HashMap::new();
        m.insert("black", 0x000000);
        m.insert("white", 0xFFFFFF);
        m.insert("red", 0xFF0000);
        m.insert("lime", 0x00FF00);
        m.insert("green", 0x008000);
        m.insert("blue", 0x0000FF);
        m.insert("yellow", 0xFFFF00);
        m.insert("cyan", 0x00FFFF);
        m.insert("aqua", 0x00FFFF);
        m.insert("magenta", 0xFF00FF);
        m.insert("fuchsia", 0xFF00FF);
        m.insert("silver", 0xC0C0C0);
        m.insert("gray", 0x808080);
        m.insert("grey", 0x808080);
        m.insert("maroon", 0x800000);
        m.insert("olive", 0x808000);
        m.insert("purple", 0x800080);
        m.insert("teal", 0x008080);
        m.insert("navy", 0x000080);
        m.insert("orange", 0xFFA500);
        m.insert("pink", 0xFFC0CB);
        m.insert("brown", 0xA52A2A);
        m.insert("gold", 0xFFD700);
        m.insert("beige", 0xF5F5DC);
        m.insert("coral", 0xFF7F50);
        m.insert("crimson", 0xDC143C);
        m.insert("indigo", 0x4B0082);
        m.insert("ivory", 0xFFFFF0);
        m.insert("khaki", 0xF0E68C);
        m.insert("lavender", 0xE6E6FA);
        m.insert("plum", 0xDDA0DD);
        m.insert("salmon", 0xFA8072);
        m.insert("tan", 0xD2B48C);
        m.insert("turquoise", 0x40E0D0);
        m.insert("violet", 0xEE82EE);
        m
    };
}
