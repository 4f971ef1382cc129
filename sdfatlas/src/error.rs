use std::time::Duration;

use sdfatlas_font::FontError;
use sdfatlas_packer::PackError;

#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Font(#[from] FontError),

    #[error("failed to launch rasterizer {program} for {ch:?}")]
    Spawn {
        ch: char,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("rasterizer failed for {ch:?}: {message}")]
    Rasterizer { ch: char, message: String },

    #[error("rasterizer timed out after {timeout:?} for {ch:?}")]
    Timeout { ch: char, timeout: Duration },

    #[error(
        "malformed rasterizer output for {ch:?}: {values} values do not fit a {width}x{height} bitmap"
    )]
    MalformedOutput {
        ch: char,
        values: usize,
        width: u32,
        height: u32,
    },

    #[error("failed to pack glyph {ch:?}")]
    Pack {
        ch: char,
        #[source]
        source: PackError,
    },

    #[error(transparent)]
    PackerState(#[from] PackError),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, AtlasError>;
