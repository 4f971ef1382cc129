use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Placement-independent metrics of one rasterized glyph, in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphMetrics {
    /// Unicode scalar value of the character.
    pub id: u32,
    /// Glyph index within the font.
    pub index: u32,
    pub ch: char,
    /// Left edge of the bitmap relative to the pen position.
    pub xoffset: f64,
    /// Top edge of the bitmap relative to the top of the line.
    pub yoffset: f64,
    pub xadvance: f64,
}

/// A rasterized distance-field glyph.
///
/// Blank glyphs (whitespace, or outlines the rasterizer left empty) have
/// zero width and height and carry no pixels.
#[derive(Debug, Clone)]
pub struct GlyphImage {
    pub pixels: Option<RgbaImage>,
    pub width: u32,
    pub height: u32,
    pub metrics: GlyphMetrics,
}

impl GlyphImage {
    pub fn blank(metrics: GlyphMetrics) -> Self {
        Self {
            pixels: None,
            width: 0,
            height: 0,
            metrics,
        }
    }

    pub fn new(pixels: RgbaImage, metrics: GlyphMetrics) -> Self {
        Self {
            width: pixels.width(),
            height: pixels.height(),
            pixels: Some(pixels),
            metrics,
        }
    }
}
