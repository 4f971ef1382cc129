use std::{path::PathBuf, sync::Arc};

use sdfatlas_font::FontSource;
use sdfatlas_packer::{AtlasPacker, PackError, PackItem};
use sdfatlas_types::FontDescriptor;
use tracing::{info, warn};

use crate::compose::{PageComposer, PagePlan, encode_png};
use crate::config::{AtlasOptions, PartialOptions};
use crate::error::{AtlasError, Result};
use crate::format;
use crate::metadata::{self, DescriptorParts, LineLayout, ResumeSettings};
use crate::progress::{GlyphProgress, QuietProgress};
use crate::raster::{GlyphRasterizer, Rasterize};

/// Inputs of one generation run.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub options: AtlasOptions,
    /// Font face name and fallback for the output base name.
    pub face: String,
    /// Settings of the run being extended, if any.
    pub resume: Option<ResumeSettings>,
    /// Directory holding page images of the run being extended.
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PageFile {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct FontFile {
    pub filename: String,
    pub data: String,
    pub descriptor: FontDescriptor,
    pub settings: ResumeSettings,
}

#[derive(Debug, Clone)]
pub struct VectorFile {
    pub filename: String,
    pub svg: String,
}

/// A complete atlas. Never produced partially.
#[derive(Debug, Clone)]
pub struct AtlasOutput {
    pub pages: Vec<PageFile>,
    pub font_file: FontFile,
    pub vectors: Vec<VectorFile>,
}

/// Runs the whole pipeline for one font.
pub struct AtlasGenerator {
    font: Arc<dyn FontSource>,
    backend: Arc<dyn Rasterize>,
    progress: Arc<dyn GlyphProgress>,
}

impl AtlasGenerator {
    pub fn new(font: Arc<dyn FontSource>, backend: Arc<dyn Rasterize>) -> Self {
        Self {
            font,
            backend,
            progress: Arc::new(QuietProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn GlyphProgress>) -> Self {
        self.progress = progress;
        self
    }

    pub async fn generate(&self, request: GenerateRequest) -> Result<AtlasOutput> {
        let GenerateRequest {
            options,
            face,
            resume,
            output_dir,
        } = request;
        options.validate()?;

        let name = options.filename.clone().unwrap_or_else(|| face.clone());
        let scale = options.font_size / self.font.units_per_em() as f64;
        let pad = options.pad();

        let packer_options = options.packer_options();
        let (mut packer, prior_pages) = match &resume {
            Some(settings) => (
                AtlasPacker::from_state(packer_options, &settings.packer)?,
                settings.pages.clone(),
            ),
            None => (AtlasPacker::new(packer_options), Vec::new()),
        };

        info!(
            face = %face,
            glyphs = options.charset.len(),
            field = %options.field_type,
            resumed = resume.is_some(),
            "generating atlas"
        );

        let kerning = tokio::task::spawn_blocking({
            let font = self.font.clone();
            let charset = options.charset.clone();
            move || metadata::kerning_pairs(font.as_ref(), &charset, scale)
        });

        let rasterizer = GlyphRasterizer::new(self.font.clone(), self.backend.clone(), &options);
        let glyphs = rasterizer
            .rasterize_all(&options.charset, options.concurrency, self.progress.as_ref())
            .await?;

        let items: Vec<PackItem> = glyphs
            .iter()
            .map(|glyph| PackItem {
                key: glyph.image.metrics.id,
                width: glyph.image.width,
                height: glyph.image.height,
            })
            .collect();
        let placements = packer.pack(&items).map_err(|err| match err {
            PackError::DoesNotFit { key, .. } => AtlasError::Pack {
                ch: char::from_u32(key).unwrap_or(char::REPLACEMENT_CHARACTER),
                source: err,
            },
            other => AtlasError::PackerState(other),
        })?;
        let reused = placements.iter().flatten().filter(|p| p.reused).count();

        let mut sizes = packer.page_sizes();
        if sizes.is_empty() {
            // nothing drawable; still emit one page
            sizes.push((options.texture_size.width, options.texture_size.height));
        }
        let filenames = page_filenames(&name, &prior_pages, sizes.len());
        if prior_pages.len() > sizes.len() {
            warn!(
                previous = prior_pages.len(),
                current = sizes.len(),
                "resumed state has fewer pages than the previous page list"
            );
        }

        let plans = filenames
            .iter()
            .zip(&sizes)
            .enumerate()
            .map(|(index, (filename, &(width, height)))| {
                let prior = (index < prior_pages.len()).then(|| output_dir.join(filename));
                PagePlan::new(filename.clone(), width, height, prior.as_deref())
            })
            .collect();
        let composed = PageComposer::new(options.field_type, options.vector).compose(
            plans,
            &glyphs,
            &placements,
        );

        let mut pages = Vec::with_capacity(composed.len());
        let mut vectors = Vec::new();
        for page in composed {
            if let Some(svg) = page.svg {
                vectors.push(VectorFile {
                    filename: svg_filename(&page.filename),
                    svg,
                });
            }
            pages.push(PageFile {
                png: encode_png(&page.image)?,
                width: page.image.width(),
                height: page.image.height(),
                filename: page.filename,
            });
        }

        let kernings = kerning.await?;
        let descriptor = metadata::assemble(DescriptorParts {
            face: &face,
            options: &options,
            layout: LineLayout::new(self.font.line_metrics(), scale, pad),
            glyphs: &glyphs,
            placements: &placements,
            pages: &filenames,
            page_size: sizes[0],
            kernings,
        });
        let data = format::serialize(&descriptor, options.output_type)?;

        let settings = ResumeSettings {
            opt: PartialOptions::from(&options),
            pages: filenames,
            packer: packer.state(),
        };

        info!(
            pages = pages.len(),
            reused,
            kernings = descriptor.kernings.len(),
            "atlas generated"
        );

        Ok(AtlasOutput {
            pages,
            font_file: FontFile {
                filename: format!("{name}.{}", options.output_type.extension()),
                data,
                descriptor,
                settings,
            },
            vectors,
        })
    }
}

/// Keeps previously written page names and names new pages after `name`:
/// `name.png` for a lone page, `name.<index>.png` otherwise.
pub fn page_filenames(name: &str, prior: &[String], count: usize) -> Vec<String> {
    (0..count)
        .map(|index| match prior.get(index) {
            Some(existing) => existing.clone(),
            None if count == 1 && prior.is_empty() => format!("{name}.png"),
            None => format!("{name}.{index}.png"),
        })
        .collect()
}

fn svg_filename(page: &str) -> String {
    match page.strip_suffix(".png") {
        Some(stem) => format!("{stem}.svg"),
        None => format!("{page}.svg"),
    }
}
