mod charset;
mod document;
mod field;
mod glyph;

pub use charset::{Charset, DEFAULT_CHARSET};
pub use document::{
    CharRecord, CommonBlock, DistanceField, FontDescriptor, InfoBlock, KerningPair,
};
pub use field::{FieldType, OutputFormat};
pub use glyph::{GlyphImage, GlyphMetrics};
