#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use sdfatlas::{
    AtlasError, AtlasOptions, GlyphProgress, PassEnd, RasterRequest, Rasterize, TextureSize,
};
use sdfatlas_font::{FontError, FontSource, GlyphOutline, LineMetrics, PathCommand};
use sdfatlas_types::{Charset, FieldType};

pub const UNITS_PER_EM: u16 = 1000;

/// Every glyph is a 500x500 unit box, except whitespace which has no outline.
#[derive(Default)]
pub struct BoxFont {
    pub kerning: HashMap<(char, char), f64>,
}

impl BoxFont {
    pub fn with_kerning(pairs: &[(char, char, f64)]) -> Self {
        Self {
            kerning: pairs.iter().map(|&(a, b, v)| ((a, b), v)).collect(),
        }
    }
}

impl FontSource for BoxFont {
    fn units_per_em(&self) -> u16 {
        UNITS_PER_EM
    }

    fn line_metrics(&self) -> LineMetrics {
        LineMetrics {
            ascender: 800.0,
            descender: -200.0,
            line_gap: 0.0,
        }
    }

    fn glyph(&self, ch: char) -> Result<GlyphOutline, FontError> {
        let commands = if ch.is_whitespace() {
            Vec::new()
        } else {
            vec![
                PathCommand::MoveTo { x: 0.0, y: 0.0 },
                PathCommand::LineTo { x: 500.0, y: 0.0 },
                PathCommand::LineTo { x: 500.0, y: 500.0 },
                PathCommand::LineTo { x: 0.0, y: 500.0 },
                PathCommand::Close,
            ]
        };
        Ok(GlyphOutline {
            index: ch as u32,
            advance: 600.0,
            commands,
        })
    }

    fn kerning(&self, first: char, second: char) -> f64 {
        self.kerning.get(&(first, second)).copied().unwrap_or(0.0)
    }
}

/// What the fake backend answers for a character.
#[derive(Clone, Copy)]
pub enum Reply {
    Fill(u8),
    Fail,
    Truncated,
}

/// In-process stand-in for msdfgen that fills the bitmap with one value.
pub struct FakeRasterizer {
    calls: AtomicUsize,
    replies: HashMap<char, Reply>,
}

impl FakeRasterizer {
    pub fn new() -> Arc<Self> {
        Self::with_replies(&[])
    }

    pub fn with_replies(replies: &[(char, Reply)]) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            replies: replies.iter().copied().collect(),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Rasterize for FakeRasterizer {
    async fn rasterize(&self, request: &RasterRequest<'_>) -> sdfatlas::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        let count = value_count(request);
        match self.replies.get(&request.ch).copied().unwrap_or(Reply::Fill(0x80)) {
            Reply::Fill(value) => Ok(filled(request, value)),
            Reply::Fail => Err(AtlasError::Rasterizer {
                ch: request.ch,
                message: "exit status: 1".to_string(),
            }),
            Reply::Truncated => Ok(vec!["ff"; count.saturating_sub(1)].join(" ")),
        }
    }
}

/// Number of hex values msdfgen prints for a request.
pub fn value_count(request: &RasterRequest<'_>) -> usize {
    let channels = if request.field_type == FieldType::Msdf { 3 } else { 1 };
    request.width as usize * request.height as usize * channels
}

pub fn filled(request: &RasterRequest<'_>, value: u8) -> String {
    vec![format!("{value:02x}"); value_count(request)].join(" ")
}

/// Progress observer that records every call.
#[derive(Default)]
pub struct RecordingProgress {
    pub total: Mutex<Option<usize>>,
    pub glyphs: Mutex<Vec<(char, usize)>>,
    pub ends: Mutex<Vec<PassEnd>>,
}

impl RecordingProgress {
    pub fn glyphs(&self) -> Vec<(char, usize)> {
        self.glyphs.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn ends(&self) -> Vec<PassEnd> {
        self.ends.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl GlyphProgress for RecordingProgress {
    fn begin(&self, total: usize) {
        if let Ok(mut slot) = self.total.lock() {
            *slot = Some(total);
        }
    }

    fn glyph_done(&self, ch: char, done: usize) {
        if let Ok(mut glyphs) = self.glyphs.lock() {
            glyphs.push((ch, done));
        }
    }

    fn finish(&self, end: PassEnd) {
        if let Ok(mut ends) = self.ends.lock() {
            ends.push(end);
        }
    }
}

pub fn options(charset: &str, field_type: FieldType, width: u32, height: u32) -> AtlasOptions {
    AtlasOptions {
        charset: Charset::from(charset),
        field_type,
        texture_size: TextureSize { width, height },
        ..Default::default()
    }
}
