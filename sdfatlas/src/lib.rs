//! Distance-field font atlas generation.
//!
//! A run extracts glyph outlines from a [`FontSource`](sdfatlas_font::FontSource),
//! rasterizes them through a [`Rasterize`] backend with bounded concurrency,
//! packs the bitmaps into pages and assembles a BMFont-compatible descriptor.
//! Runs can be resumed from the [`ResumeSettings`] of a previous run, which
//! keeps every existing glyph where it was.

pub mod app;
pub mod compose;
pub mod config;
pub mod error;
pub mod format;
pub mod generator;
pub mod metadata;
pub mod progress;
pub mod raster;
pub mod telemetry;

pub use config::{AtlasOptions, OptionResolver, PartialOptions, TextureSize};
pub use error::{AtlasError, Result};
pub use generator::{AtlasGenerator, AtlasOutput, FontFile, GenerateRequest, PageFile, VectorFile};
pub use metadata::ResumeSettings;
pub use progress::{GlyphBar, GlyphProgress, PassEnd, QuietProgress};
pub use raster::{GlyphRasterizer, ProcessRasterizer, RasterRequest, Rasterize, RasterizedGlyph};
