use std::{path::Path, sync::Arc};

use harfrust::{Direction, Feature, ShaperData, Tag, UnicodeBuffer};
use skrifa::{
    GlyphId, MetadataProvider,
    instance::{LocationRef, Size},
    outline::{DrawSettings, OutlinePen},
    raw::TableProvider,
};

use tracing::warn;

use crate::contour::PathCommand;

#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("failed to read font file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse font: {0}")]
    Parse(String),

    #[error("font has no vector outlines (glyf, CFF or CFF2 table required)")]
    NotOutline,

    #[error("failed to draw glyph for {ch:?}: {reason}")]
    Draw { ch: char, reason: String },
}

/// Font-wide vertical metrics in font units. `descender` is negative.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineMetrics {
    pub ascender: f64,
    pub descender: f64,
    pub line_gap: f64,
}

/// Outline of one glyph in font units, y-up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphOutline {
    pub index: u32,
    pub advance: f64,
    pub commands: Vec<PathCommand>,
}

/// Read access to a parsed vector font.
pub trait FontSource: Send + Sync {
    fn units_per_em(&self) -> u16;

    fn line_metrics(&self) -> LineMetrics;

    /// Outline for `ch`; characters missing from the cmap resolve to `.notdef`.
    fn glyph(&self, ch: char) -> Result<GlyphOutline, FontError>;

    /// Raw kerning between an ordered pair, in font units.
    fn kerning(&self, first: char, second: char) -> f64;
}

/// A loaded TrueType/OpenType font with vector outlines.
///
/// The font data is reference-counted for cheap cloning.
#[derive(Clone)]
pub struct OutlineFont {
    data: Arc<Vec<u8>>,
    /// Index within font collection (0 for single-font files)
    index: u32,
    units_per_em: u16,
    line_metrics: LineMetrics,
}

impl OutlineFont {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FontError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(data)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self, FontError> {
        let index = 0;
        let (units_per_em, line_metrics) = {
            let font = skrifa::FontRef::from_index(&data, index)
                .map_err(|err| FontError::Parse(err.to_string()))?;
            if font.glyf().is_err() && font.cff().is_err() && font.cff2().is_err() {
                return Err(FontError::NotOutline);
            }
            let metrics = font.metrics(Size::unscaled(), LocationRef::default());
            (
                metrics.units_per_em,
                LineMetrics {
                    ascender: metrics.ascent as f64,
                    descender: metrics.descent as f64,
                    line_gap: metrics.leading as f64,
                },
            )
        };

        Ok(Self {
            data: Arc::new(data),
            index,
            units_per_em,
            line_metrics,
        })
    }

    /// Creates a skrifa FontRef for outline and metric queries.
    fn skrifa(&self) -> Result<skrifa::FontRef<'_>, FontError> {
        skrifa::FontRef::from_index(self.data.as_slice(), self.index)
            .map_err(|err| FontError::Parse(err.to_string()))
    }

    /// Shapes `first` followed by `second` and returns how far the pen moved
    /// past the first glyph's nominal advance, plus any placement shift of
    /// the second glyph.
    ///
    /// Covers GPOS pair adjustments and the legacy `kern` table. Pairs that
    /// shaping substitutes (ligatures, contextual forms) have no pair value.
    fn shaped_pair_kerning(&self, first: char, second: char) -> Result<f64, FontError> {
        let font = self.skrifa()?;
        let charmap = font.charmap();
        let (Some(left), Some(right)) = (charmap.map(first), charmap.map(second)) else {
            return Ok(0.0);
        };
        let nominal = font
            .glyph_metrics(Size::unscaled(), LocationRef::default())
            .advance_width(left)
            .unwrap_or_default() as f64;

        let shaping_font = harfrust::FontRef::from_index(self.data.as_slice(), self.index)
            .map_err(|err| FontError::Parse(err.to_string()))?;
        let shaper_data = ShaperData::new(&shaping_font);
        let shaper = shaper_data.shaper(&shaping_font).build();

        let mut buffer = UnicodeBuffer::new();
        buffer.push_str(&String::from_iter([first, second]));
        buffer.set_direction(Direction::LeftToRight);
        buffer.guess_segment_properties();
        let output = shaper.shape(buffer, &ligatures_off());

        let (infos, positions) = (output.glyph_infos(), output.glyph_positions());
        if infos.len() != 2 || infos[0].glyph_id != left.to_u32() || infos[1].glyph_id != right.to_u32()
        {
            return Ok(0.0);
        }
        Ok(positions[0].x_advance as f64 - nominal + positions[1].x_offset as f64)
    }
}

fn ligatures_off() -> [Feature; 3] {
    [b"liga", b"clig", b"dlig"].map(|tag| Feature::new(Tag::new(tag), 0, ..))
}

impl FontSource for OutlineFont {
    fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    fn line_metrics(&self) -> LineMetrics {
        self.line_metrics
    }

    fn glyph(&self, ch: char) -> Result<GlyphOutline, FontError> {
        let font = self.skrifa()?;
        let glyph_id = font.charmap().map(ch).unwrap_or(GlyphId::NOTDEF);
        let advance = font
            .glyph_metrics(Size::unscaled(), LocationRef::default())
            .advance_width(glyph_id)
            .unwrap_or_default();

        let mut pen = OutlineRecorder::default();
        if let Some(glyph) = font.outline_glyphs().get(glyph_id) {
            let settings = DrawSettings::unhinted(Size::unscaled(), LocationRef::default());
            glyph
                .draw(settings, &mut pen)
                .map_err(|err| FontError::Draw {
                    ch,
                    reason: err.to_string(),
                })?;
        }

        Ok(GlyphOutline {
            index: glyph_id.to_u32(),
            advance: advance as f64,
            commands: pen.commands,
        })
    }

    fn kerning(&self, first: char, second: char) -> f64 {
        self.shaped_pair_kerning(first, second).unwrap_or_else(|err| {
            warn!(?first, ?second, %err, "failed to shape kerning pair");
            0.0
        })
    }
}

/// Records skrifa pen callbacks as [`PathCommand`]s.
#[derive(Default)]
struct OutlineRecorder {
    commands: Vec<PathCommand>,
}

impl OutlinePen for OutlineRecorder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.commands.push(PathCommand::MoveTo {
            x: x as f64,
            y: y as f64,
        });
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.commands.push(PathCommand::LineTo {
            x: x as f64,
            y: y as f64,
        });
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.commands.push(PathCommand::QuadTo {
            cx: cx0 as f64,
            cy: cy0 as f64,
            x: x as f64,
            y: y as f64,
        });
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.commands.push(PathCommand::CurveTo {
            c1x: cx0 as f64,
            c1y: cy0 as f64,
            c2x: cx1 as f64,
            c2y: cy1 as f64,
            x: x as f64,
            y: y as f64,
        });
    }

    fn close(&mut self) {
        self.commands.push(PathCommand::Close);
    }
}
