use std::path::Path;

use rayon::prelude::*;
use sdfatlas_font::{FontSource, LineMetrics};
use sdfatlas_packer::{PackerState, Placement};
use sdfatlas_types::{
    CharRecord, Charset, CommonBlock, DistanceField, FontDescriptor, InfoBlock, KerningPair,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{AtlasOptions, PartialOptions};
use crate::error::Result;
use crate::raster::RasterizedGlyph;

/// Every BMFont channel.
const ALL_CHANNELS: u32 = 15;

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Nonzero kerning over every ordered pair of the charset, self-pairs
/// included, scaled to pixels. Pair order follows the charset.
pub fn kerning_pairs(font: &dyn FontSource, charset: &Charset, scale: f64) -> Vec<KerningPair> {
    let kernings: Vec<KerningPair> = charset
        .chars()
        .par_iter()
        .flat_map_iter(|&first| {
            charset.iter().filter_map(move |second| {
                let raw = font.kerning(first, second);
                (raw != 0.0).then(|| KerningPair {
                    first: first as u32,
                    second: second as u32,
                    amount: raw * scale,
                })
            })
        })
        .collect();
    debug!(pairs = kernings.len(), "collected kerning");
    kernings
}

/// Vertical layout values of the `common` block, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineLayout {
    pub line_height: f64,
    pub base: f64,
}

impl LineLayout {
    pub fn new(metrics: LineMetrics, scale: f64, pad: u32) -> Self {
        Self {
            line_height: (metrics.ascender - metrics.descender + metrics.line_gap) * scale,
            base: metrics.ascender * scale + pad as f64,
        }
    }
}

/// Everything the final document is built from.
pub struct DescriptorParts<'a> {
    pub face: &'a str,
    pub options: &'a AtlasOptions,
    pub layout: LineLayout,
    pub glyphs: &'a [RasterizedGlyph],
    pub placements: &'a [Option<Placement>],
    pub pages: &'a [String],
    /// Size of the first page.
    pub page_size: (u32, u32),
    pub kernings: Vec<KerningPair>,
}

pub fn assemble(parts: DescriptorParts<'_>) -> FontDescriptor {
    let options = parts.options;
    let chars = parts
        .glyphs
        .iter()
        .zip(parts.placements)
        .map(|(glyph, placement)| {
            let image = &glyph.image;
            let (x, y, page) = placement
                .map(|p| (p.x, p.y, p.page as u32))
                .unwrap_or_default();
            CharRecord {
                id: image.metrics.id,
                index: image.metrics.index,
                ch: image.metrics.ch.to_string(),
                width: image.width,
                height: image.height,
                xoffset: image.metrics.xoffset,
                yoffset: image.metrics.yoffset,
                xadvance: image.metrics.xadvance,
                chnl: ALL_CHANNELS,
                x,
                y,
                page,
            }
        })
        .collect();

    let mut descriptor = FontDescriptor {
        pages: parts.pages.to_vec(),
        chars,
        info: InfoBlock {
            face: parts.face.to_string(),
            size: options.font_size,
            bold: 0,
            italic: 0,
            charset: options.charset.clone(),
            unicode: 1,
            stretch_h: 100,
            smooth: 1,
            aa: 1,
            padding: [0; 4],
            spacing: [options.texture_padding; 2],
        },
        common: CommonBlock {
            line_height: parts.layout.line_height,
            base: parts.layout.base,
            scale_w: parts.page_size.0,
            scale_h: parts.page_size.1,
            pages: parts.pages.len() as u32,
            packed: 0,
            alpha_chnl: 0,
            red_chnl: 0,
            green_chnl: 0,
            blue_chnl: 0,
        },
        distance_field: DistanceField {
            field_type: options.field_type,
            distance_range: options.distance_range,
        },
        kernings: parts.kernings,
    };

    if let Some(decimals) = options.round_decimal {
        round_descriptor(&mut descriptor, decimals);
    }
    descriptor
}

/// Rounds every fractional field of the document.
pub fn round_descriptor(descriptor: &mut FontDescriptor, decimals: u32) {
    descriptor.info.size = round_to(descriptor.info.size, decimals);
    descriptor.common.line_height = round_to(descriptor.common.line_height, decimals);
    descriptor.common.base = round_to(descriptor.common.base, decimals);
    for record in &mut descriptor.chars {
        record.xoffset = round_to(record.xoffset, decimals);
        record.yoffset = round_to(record.yoffset, decimals);
        record.xadvance = round_to(record.xadvance, decimals);
    }
    for kerning in &mut descriptor.kernings {
        kerning.amount = round_to(kerning.amount, decimals);
    }
}

/// State carried between runs: the effective options, page file names and
/// the packer snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeSettings {
    pub opt: PartialOptions,
    pub pages: Vec<String>,
    pub packer: PackerState,
}

impl ResumeSettings {
    /// Reads a resume file, or `None` when it does not exist yet.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
