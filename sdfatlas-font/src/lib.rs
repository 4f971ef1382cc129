//! Font access and glyph shape extraction for the atlas generator.
//!
//! [`FontSource`] is the boundary to font parsing; [`OutlineFont`] implements
//! it over `skrifa` for outlines and metrics and `harfrust` for pair kerning.
//! [`ShapeExtractor`] turns an outline into contours and the shape
//! description consumed by the distance-field rasterizer.

pub mod contour;
pub mod font;
pub mod shape;

pub use contour::{Bounds, Contour, ContourTolerance, PathCommand};
pub use font::{FontError, FontSource, GlyphOutline, LineMetrics, OutlineFont};
pub use shape::{GlyphShape, ShapeExtractor};
