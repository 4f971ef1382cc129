use std::{path::PathBuf, process::Stdio, sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::{StreamExt, stream};
use image::RgbaImage;
use sdfatlas_font::{Bounds, Contour, ContourTolerance, FontSource, ShapeExtractor};
use sdfatlas_types::{Charset, FieldType, GlyphImage, GlyphMetrics};
use tracing::debug;

use crate::config::AtlasOptions;
use crate::error::{AtlasError, Result};
use crate::metadata::round_to;
use crate::progress::{GlyphProgress, PassEnd};

/// One distance-field rasterization job.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterRequest<'a> {
    pub ch: char,
    pub field_type: FieldType,
    pub width: u32,
    pub height: u32,
    pub translate: (f64, f64),
    pub range: u32,
    /// msdfgen shape description.
    pub shape: &'a str,
}

/// Backend producing distance-field bitmaps as hexadecimal text.
#[async_trait]
pub trait Rasterize: Send + Sync {
    async fn rasterize(&self, request: &RasterRequest<'_>) -> Result<String>;
}

/// Runs an msdfgen-compatible executable once per glyph.
#[derive(Debug, Clone)]
pub struct ProcessRasterizer {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessRasterizer {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout,
        }
    }

    /// Extra arguments placed before the generated ones.
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn from_options(options: &AtlasOptions) -> Self {
        Self::new(&options.rasterizer, Duration::from_secs(options.timeout_secs))
            .with_args(options.rasterizer_args.iter().cloned())
    }

    pub fn command_args(&self, request: &RasterRequest<'_>) -> Vec<String> {
        let mut args = self.args.clone();
        args.extend([
            format!("-{}", request.field_type),
            "-format".to_string(),
            "text".to_string(),
            "-stdout".to_string(),
            "-size".to_string(),
            request.width.to_string(),
            request.height.to_string(),
            "-translate".to_string(),
            request.translate.0.to_string(),
            request.translate.1.to_string(),
            "-pxrange".to_string(),
            request.range.to_string(),
            "-defineshape".to_string(),
            request.shape.to_string(),
        ]);
        args
    }
}

#[async_trait]
impl Rasterize for ProcessRasterizer {
    async fn rasterize(&self, request: &RasterRequest<'_>) -> Result<String> {
        let ch = request.ch;
        let child = tokio::process::Command::new(&self.program)
            .args(self.command_args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AtlasError::Spawn {
                ch,
                program: self.program.display().to_string(),
                source,
            })?;

        // dropping the wait future on timeout kills the child
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| AtlasError::Timeout {
                ch,
                timeout: self.timeout,
            })?
            .map_err(|err| AtlasError::Rasterizer {
                ch,
                message: err.to_string(),
            })?;

        if !output.status.success() {
            return Err(AtlasError::Rasterizer {
                ch,
                message: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Bitmap size, shape translation and placement-independent offsets of one
/// glyph, all in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphGeometry {
    pub width: u32,
    pub height: u32,
    pub translate: (f64, f64),
    pub xoffset: f64,
    pub yoffset: f64,
}

impl GlyphGeometry {
    /// `bounds` are y-up pixel bounds; `pad` is half the distance range.
    pub fn compute(bounds: &Bounds, pad: u32, ascender_px: f64, round_decimal: Option<u32>) -> Self {
        if bounds.is_empty() {
            return Self {
                width: 0,
                height: 0,
                translate: (0.0, 0.0),
                xoffset: 0.0,
                yoffset: 0.0,
            };
        }

        let pad_px = pad as f64;
        let round = |value: f64| match round_decimal {
            Some(decimals) => round_to(value, decimals),
            None => value,
        };
        // whole-pixel translation keeps the bitmap origin at -xoffset
        let translate = (
            round((-bounds.x_min).round() + pad_px),
            round((-bounds.y_min).round() + pad_px),
        );
        Self {
            width: bounds.width().round() as u32 + 2 * pad,
            height: bounds.height().round() as u32 + 2 * pad,
            translate,
            xoffset: -translate.0,
            yoffset: (ascender_px - bounds.y_max).round(),
        }
    }
}

/// Converts rasterizer text output into an RGBA bitmap.
///
/// Returns `None` when the output is empty or entirely zero.
pub fn decode_bitmap(
    ch: char,
    text: &str,
    width: u32,
    height: u32,
    field_type: FieldType,
) -> Result<Option<RgbaImage>> {
    let tokens: Vec<&str> = text
        .split(|c: char| !c.is_ascii_hexdigit())
        .filter(|token| !token.is_empty())
        .collect();
    let malformed = || AtlasError::MalformedOutput {
        ch,
        values: tokens.len(),
        width,
        height,
    };
    // every channel value is one byte
    let values = tokens
        .iter()
        .map(|token| u8::from_str_radix(token, 16).map_err(|_| malformed()))
        .collect::<Result<Vec<u8>>>()?;

    let pixels = width as usize * height as usize;
    if pixels == 0 || values.iter().all(|&value| value == 0) {
        return Ok(None);
    }

    if values.len() % pixels != 0 {
        return Err(malformed());
    }
    let channels = values.len() / pixels;

    let mut rgba = Vec::with_capacity(pixels * 4);
    for pixel in values.chunks_exact(channels) {
        match field_type {
            FieldType::Msdf if channels >= 3 => {
                rgba.extend_from_slice(&pixel[..3]);
                rgba.push(u8::MAX);
            }
            FieldType::Msdf => rgba.extend_from_slice(&[pixel[0], pixel[0], pixel[0], u8::MAX]),
            FieldType::Sdf | FieldType::Psdf => rgba.extend_from_slice(&[pixel[0]; 4]),
        }
    }

    RgbaImage::from_raw(width, height, rgba)
        .map(Some)
        .ok_or_else(malformed)
}

/// A rasterized glyph together with the contours it was drawn from.
#[derive(Debug, Clone)]
pub struct RasterizedGlyph {
    pub image: GlyphImage,
    pub contours: Vec<Contour>,
    pub translate: (f64, f64),
}

impl RasterizedGlyph {
    pub fn ch(&self) -> char {
        self.image.metrics.ch
    }
}

/// Turns characters into distance-field glyph images through a [`Rasterize`]
/// backend.
pub struct GlyphRasterizer {
    font: Arc<dyn FontSource>,
    backend: Arc<dyn Rasterize>,
    extractor: ShapeExtractor,
    field_type: FieldType,
    distance_range: u32,
    round_decimal: Option<u32>,
    ascender_px: f64,
}

impl GlyphRasterizer {
    pub fn new(font: Arc<dyn FontSource>, backend: Arc<dyn Rasterize>, options: &AtlasOptions) -> Self {
        let scale = options.font_size / font.units_per_em() as f64;
        let ascender_px = font.line_metrics().ascender * scale;
        Self {
            extractor: ShapeExtractor::new(scale, ContourTolerance::from_tolerance(options.tolerance)),
            font,
            backend,
            field_type: options.field_type,
            distance_range: options.distance_range,
            round_decimal: options.round_decimal,
            ascender_px,
        }
    }

    pub async fn rasterize_glyph(&self, ch: char) -> Result<RasterizedGlyph> {
        let outline = self.font.glyph(ch)?;
        let shape = self.extractor.extract(ch, &outline.commands);
        let geometry = GlyphGeometry::compute(
            &shape.bounds,
            self.distance_range / 2,
            self.ascender_px,
            self.round_decimal,
        );
        let metrics = GlyphMetrics {
            id: ch as u32,
            index: outline.index,
            ch,
            xoffset: geometry.xoffset,
            yoffset: geometry.yoffset,
            xadvance: outline.advance * self.extractor.scale(),
        };

        if shape.is_empty() {
            debug!(?ch, "glyph has no contours");
            return Ok(RasterizedGlyph {
                image: GlyphImage::blank(metrics),
                contours: Vec::new(),
                translate: geometry.translate,
            });
        }

        let request = RasterRequest {
            ch,
            field_type: self.field_type,
            width: geometry.width,
            height: geometry.height,
            translate: geometry.translate,
            range: self.distance_range,
            shape: &shape.descriptor,
        };
        let text = self.backend.rasterize(&request).await?;
        let image = match decode_bitmap(ch, &text, geometry.width, geometry.height, self.field_type)? {
            Some(pixels) => GlyphImage::new(pixels, metrics),
            None => GlyphImage::blank(metrics),
        };
        debug!(?ch, width = image.width, height = image.height, "rasterized glyph");

        Ok(RasterizedGlyph {
            image,
            contours: shape.contours,
            translate: geometry.translate,
        })
    }

    /// Rasterizes every character with at most `concurrency` jobs in flight.
    ///
    /// Results are in charset order. The first failure is returned and the
    /// remaining jobs are dropped; `progress` is finished in both cases.
    pub async fn rasterize_all(
        &self,
        charset: &Charset,
        concurrency: usize,
        progress: &dyn GlyphProgress,
    ) -> Result<Vec<RasterizedGlyph>> {
        progress.begin(charset.len());
        let collected = async {
            let mut results = std::pin::pin!(
                stream::iter(charset.iter())
                    .map(|ch| self.rasterize_glyph(ch))
                    .buffered(concurrency.max(1))
            );

            let mut glyphs = Vec::with_capacity(charset.len());
            while let Some(glyph) = results.next().await {
                let glyph = glyph?;
                progress.glyph_done(glyph.ch(), glyphs.len() + 1);
                glyphs.push(glyph);
            }
            Ok::<_, AtlasError>(glyphs)
        }
        .await;

        progress.finish(if collected.is_ok() {
            PassEnd::Completed
        } else {
            PassEnd::Aborted
        });
        collected
    }
}
