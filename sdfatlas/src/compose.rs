use std::{fmt::Write, io::Cursor, path::Path};

use image::{ImageFormat, Rgba, RgbaImage, imageops};
use sdfatlas_font::{Contour, PathCommand};
use sdfatlas_packer::Placement;
use sdfatlas_types::FieldType;
use tracing::warn;

use crate::error::Result;
use crate::raster::RasterizedGlyph;

/// Layout of one output page.
#[derive(Debug, Clone)]
pub struct PagePlan {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    /// Image from a previous run, drawn before the glyphs.
    pub existing: Option<RgbaImage>,
}

impl PagePlan {
    /// Plans a page, loading `prior` when given. An unreadable prior image
    /// is reported and the page starts fresh.
    pub fn new(filename: String, width: u32, height: u32, prior: Option<&Path>) -> Self {
        let existing = prior.and_then(|path| match image::open(path) {
            Ok(image) => Some(image.to_rgba8()),
            Err(err) => {
                warn!(path = %path.display(), "cannot load previous page, starting fresh: {err}");
                None
            }
        });
        Self {
            filename,
            width,
            height,
            existing,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComposedPage {
    pub filename: String,
    pub image: RgbaImage,
    /// SVG outline overlay when vector output is enabled.
    pub svg: Option<String>,
}

/// Draws packed glyph bitmaps onto atlas pages.
#[derive(Debug, Clone, Copy)]
pub struct PageComposer {
    field_type: FieldType,
    vector: bool,
}

impl PageComposer {
    pub fn new(field_type: FieldType, vector: bool) -> Self {
        Self { field_type, vector }
    }

    /// Opaque black for msdf, transparent otherwise.
    pub fn background(&self) -> Rgba<u8> {
        if self.field_type.is_multi_channel() {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    }

    pub fn compose(
        &self,
        plans: Vec<PagePlan>,
        glyphs: &[RasterizedGlyph],
        placements: &[Option<Placement>],
    ) -> Vec<ComposedPage> {
        plans
            .into_iter()
            .enumerate()
            .map(|(index, plan)| {
                let mut image = RgbaImage::from_pixel(plan.width, plan.height, self.background());
                if let Some(existing) = &plan.existing {
                    imageops::replace(&mut image, existing, 0, 0);
                }

                let mut svg = self.vector.then(|| svg_header(plan.width, plan.height));
                for (glyph, placement) in glyphs.iter().zip(placements) {
                    let Some(placement) = placement.filter(|p| p.page == index) else {
                        continue;
                    };
                    if let Some(pixels) = &glyph.image.pixels {
                        imageops::replace(&mut image, pixels, placement.x as i64, placement.y as i64);
                    }
                    if let Some(svg) = svg.as_mut() {
                        svg_glyph(svg, glyph, &placement);
                    }
                }

                ComposedPage {
                    filename: plan.filename,
                    image,
                    svg: svg.map(|mut svg| {
                        svg.push_str("</svg>\n");
                        svg
                    }),
                }
            })
            .collect()
    }
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

fn svg_header(width: u32, height: u32) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">\n"
    )
}

/// Appends the glyph outline in page coordinates. Shape space is y-up with
/// the bitmap's bottom-left at `-translate`, so y is flipped against the
/// bitmap height.
fn svg_glyph(svg: &mut String, glyph: &RasterizedGlyph, placement: &Placement) {
    if glyph.contours.is_empty() {
        return;
    }
    let (tx, ty) = glyph.translate;
    let left = placement.x as f64 + tx;
    let bottom = placement.y as f64 + glyph.image.height as f64 - ty;
    let point = |x: f64, y: f64| (left + x, bottom - y);

    let d = path_data(&glyph.contours, point);
    let _ = writeln!(
        svg,
        "  <path id=\"char-{}\" d=\"{d}\" fill=\"none\" stroke=\"red\" stroke-width=\"0.5\"/>",
        glyph.image.metrics.id
    );
}

fn path_data(contours: &[Contour], point: impl Fn(f64, f64) -> (f64, f64)) -> String {
    let mut d = String::new();
    for command in contours.iter().flat_map(|c| &c.commands) {
        let _ = match *command {
            PathCommand::MoveTo { x, y } => {
                let (x, y) = point(x, y);
                write!(d, "M{x} {y} ")
            }
            PathCommand::LineTo { x, y } => {
                let (x, y) = point(x, y);
                write!(d, "L{x} {y} ")
            }
            PathCommand::QuadTo { cx, cy, x, y } => {
                let (cx, cy) = point(cx, cy);
                let (x, y) = point(x, y);
                write!(d, "Q{cx} {cy} {x} {y} ")
            }
            PathCommand::CurveTo {
                c1x,
                c1y,
                c2x,
                c2y,
                x,
                y,
            } => {
                let (c1x, c1y) = point(c1x, c1y);
                let (c2x, c2y) = point(c2x, c2y);
                let (x, y) = point(x, y);
                write!(d, "C{c1x} {c1y} {c2x} {c2y} {x} {y} ")
            }
            PathCommand::Close => write!(d, "Z "),
        };
    }
    d.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdfatlas_types::{GlyphImage, GlyphMetrics};

    fn glyph(ch: char, width: u32, height: u32, value: u8) -> RasterizedGlyph {
        let metrics = GlyphMetrics {
            id: ch as u32,
            index: 1,
            ch,
            xoffset: 0.0,
            yoffset: 0.0,
            xadvance: 0.0,
        };
        RasterizedGlyph {
            image: GlyphImage::new(RgbaImage::from_pixel(width, height, Rgba([value; 4])), metrics),
            contours: vec![Contour {
                commands: vec![
                    PathCommand::MoveTo { x: 0.0, y: 0.0 },
                    PathCommand::LineTo { x: 2.0, y: 0.0 },
                    PathCommand::LineTo { x: 2.0, y: 2.0 },
                    PathCommand::Close,
                ],
            }],
            translate: (1.0, 1.0),
        }
    }

    fn placed(page: usize, x: u32, y: u32) -> Option<Placement> {
        Some(Placement {
            page,
            x,
            y,
            reused: false,
        })
    }

    fn plan(width: u32, height: u32) -> PagePlan {
        PagePlan {
            filename: "page.png".to_string(),
            width,
            height,
            existing: None,
        }
    }

    #[test]
    fn msdf_background_is_opaque_black() {
        let pages = PageComposer::new(FieldType::Msdf, false).compose(vec![plan(4, 4)], &[], &[]);
        assert_eq!(pages[0].image.get_pixel(3, 3).0, [0, 0, 0, 255]);
        assert!(pages[0].svg.is_none());
    }

    #[test]
    fn sdf_background_is_transparent() {
        let pages = PageComposer::new(FieldType::Sdf, false).compose(vec![plan(4, 4)], &[], &[]);
        assert_eq!(pages[0].image.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn glyphs_land_on_their_page() {
        let glyphs = [glyph('A', 2, 2, 200), glyph('B', 2, 2, 100)];
        let placements = [placed(0, 1, 1), placed(1, 0, 0)];
        let pages = PageComposer::new(FieldType::Sdf, false).compose(
            vec![plan(4, 4), plan(4, 4)],
            &glyphs,
            &placements,
        );
        assert_eq!(pages[0].image.get_pixel(1, 1).0, [200; 4]);
        assert_eq!(pages[0].image.get_pixel(0, 0).0, [0; 4]);
        assert_eq!(pages[1].image.get_pixel(1, 1).0, [100; 4]);
    }

    #[test]
    fn existing_page_is_kept_under_new_glyphs() {
        let mut existing = plan(4, 4);
        existing.existing = Some(RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255])));
        let pages = PageComposer::new(FieldType::Msdf, false).compose(
            vec![existing],
            &[glyph('A', 1, 1, 77)],
            &[placed(0, 3, 3)],
        );
        assert_eq!(pages[0].image.get_pixel(0, 0).0, [9, 9, 9, 255]);
        assert_eq!(pages[0].image.get_pixel(3, 3).0, [77; 4]);
    }

    #[test]
    fn svg_overlay_flips_y() {
        let pages = PageComposer::new(FieldType::Msdf, true).compose(
            vec![plan(8, 8)],
            &[glyph('A', 4, 4, 1)],
            &[placed(0, 2, 2)],
        );
        let svg = pages[0].svg.as_deref().unwrap_or_default();
        assert!(svg.starts_with("<svg"));
        // origin maps to (2 + 1, 2 + 4 - 1)
        assert!(svg.contains("d=\"M3 5 L5 5 L5 3 Z\""));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn missing_prior_page_starts_fresh() {
        let plan = PagePlan::new("x.png".to_string(), 2, 2, Some(Path::new("/nonexistent/x.png")));
        assert!(plan.existing.is_none());
    }

    #[test]
    fn png_encoding_has_signature() -> Result<()> {
        let bytes = encode_png(&RgbaImage::new(2, 2))?;
        assert_eq!(&bytes[..4], b"\x89PNG");
        Ok(())
    }
}
