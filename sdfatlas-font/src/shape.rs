use std::fmt::Write;

use tracing::{debug, warn};

use crate::contour::{Bounds, Contour, ContourTolerance, PathCommand, split_contours};

/// Scaled contours of one glyph plus the rasterizer shape description.
#[derive(Debug, Clone, Default)]
pub struct GlyphShape {
    pub contours: Vec<Contour>,
    /// msdfgen `-defineshape` syntax.
    pub descriptor: String,
    /// Bounds in pixels, y-up. Empty when the glyph draws nothing.
    pub bounds: Bounds,
    /// Number of contours removed by the tolerance filter.
    pub filtered: usize,
}

impl GlyphShape {
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }
}

/// Converts font-unit outlines into pixel-space contours.
#[derive(Debug, Clone, Copy)]
pub struct ShapeExtractor {
    scale: f64,
    tolerance: ContourTolerance,
}

impl ShapeExtractor {
    pub fn new(scale: f64, tolerance: ContourTolerance) -> Self {
        Self { scale, tolerance }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn extract(&self, ch: char, commands: &[PathCommand]) -> GlyphShape {
        let mut contours = split_contours(commands.iter().map(|c| c.scale(self.scale)));

        let mut filtered = 0;
        if self.tolerance.is_enabled() {
            let before = contours.len();
            contours.retain(|contour| !self.tolerance.is_insignificant(&contour.bounds()));
            filtered = before - contours.len();
            if filtered > 0 {
                debug!(?ch, filtered, "removed insignificant contours");
            }
        }

        if contours.iter().any(Contour::is_degenerate) {
            warn!(?ch, "glyph outline normalization failed: single-command contour");
        }

        let bounds = contours
            .iter()
            .fold(Bounds::EMPTY, |acc, contour| acc.union(&contour.bounds()));

        GlyphShape {
            descriptor: describe(&contours),
            contours,
            bounds,
            filtered,
        }
    }
}

/// Serializes contours into msdfgen shape-description syntax:
/// `{ x, y; (cx, cy); x, y; # }` per contour, `#` closing back to the start.
pub fn describe(contours: &[Contour]) -> String {
    let mut out = String::new();
    for contour in contours {
        out.push('{');
        let start = contour.start();
        let last_drawn = contour
            .commands
            .iter()
            .rposition(|c| !matches!(c, PathCommand::Close));

        for (i, command) in contour.commands.iter().enumerate() {
            // an explicit final segment back to the start is folded into `#`
            let closes_at_start = Some(i) == last_drawn && i > 0 && command.end_point() == start;
            match *command {
                PathCommand::MoveTo { x, y } | PathCommand::LineTo { x, y } => {
                    if !closes_at_start {
                        let _ = write!(out, " {}, {};", num(x), num(y));
                    }
                }
                PathCommand::QuadTo { cx, cy, x, y } => {
                    let _ = write!(out, " ({}, {});", num(cx), num(cy));
                    if !closes_at_start {
                        let _ = write!(out, " {}, {};", num(x), num(y));
                    }
                }
                PathCommand::CurveTo {
                    c1x,
                    c1y,
                    c2x,
                    c2y,
                    x,
                    y,
                } => {
                    let _ = write!(
                        out,
                        " ({}, {}; {}, {});",
                        num(c1x),
                        num(c1y),
                        num(c2x),
                        num(c2y)
                    );
                    if !closes_at_start {
                        let _ = write!(out, " {}, {};", num(x), num(y));
                    }
                }
                PathCommand::Close => {}
            }
        }
        out.push_str(" # }");
    }
    out
}

/// Formats with at most three decimals and no trailing zeros.
fn num(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    // avoid "-0"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    let text = format!("{rounded:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Vec<PathCommand> {
        vec![
            PathCommand::MoveTo { x, y },
            PathCommand::LineTo { x: x + size, y },
            PathCommand::LineTo {
                x: x + size,
                y: y + size,
            },
            PathCommand::LineTo { x, y: y + size },
            PathCommand::Close,
        ]
    }

    #[test]
    fn scales_and_bounds() {
        let shape = ShapeExtractor::new(0.5, ContourTolerance::default())
            .extract('A', &square(10.0, 20.0, 100.0));
        assert_eq!(shape.contours.len(), 1);
        assert_eq!(shape.bounds.x_min, 5.0);
        assert_eq!(shape.bounds.y_min, 10.0);
        assert_eq!(shape.bounds.width(), 50.0);
        assert_eq!(shape.filtered, 0);
    }

    #[test]
    fn describes_lines_and_closes() {
        let shape =
            ShapeExtractor::new(1.0, ContourTolerance::default()).extract('A', &square(0.0, 0.0, 2.5));
        assert_eq!(shape.descriptor, "{ 0, 0; 2.5, 0; 2.5, 2.5; 0, 2.5; # }");
    }

    #[test]
    fn folds_explicit_return_to_start() {
        let commands = vec![
            PathCommand::MoveTo { x: 0.0, y: 0.0 },
            PathCommand::LineTo { x: 4.0, y: 0.0 },
            PathCommand::QuadTo {
                cx: 2.0,
                cy: 3.0,
                x: 0.0,
                y: 0.0,
            },
            PathCommand::Close,
        ];
        let text = describe(&split_contours(commands));
        assert_eq!(text, "{ 0, 0; 4, 0; (2, 3); # }");
    }

    #[test]
    fn describes_cubic_controls() {
        let commands = vec![
            PathCommand::MoveTo { x: 0.0, y: 0.0 },
            PathCommand::CurveTo {
                c1x: 1.0,
                c1y: 2.0,
                c2x: 3.0,
                c2y: 2.0,
                x: 4.0,
                y: 0.0,
            },
            PathCommand::Close,
        ];
        let text = describe(&split_contours(commands));
        assert_eq!(text, "{ 0, 0; (1, 2; 3, 2); 4, 0; # }");
    }

    #[test]
    fn filters_specks_with_tolerance() {
        let mut commands = square(0.0, 0.0, 100.0);
        commands.extend(square(200.0, 200.0, 0.2));
        let extractor = ShapeExtractor::new(1.0, ContourTolerance::from_tolerance(1.0));
        let shape = extractor.extract('O', &commands);
        assert_eq!(shape.contours.len(), 1);
        assert_eq!(shape.filtered, 1);
        assert_eq!(shape.bounds.x_max, 100.0);
    }

    #[test]
    fn empty_outline_is_empty_shape() {
        let shape = ShapeExtractor::new(1.0, ContourTolerance::default()).extract(' ', &[]);
        assert!(shape.is_empty());
        assert!(shape.bounds.is_empty());
        assert_eq!(shape.descriptor, "");
    }

    #[test]
    fn number_formatting() {
        assert_eq!(num(1.23456), "1.235");
        assert_eq!(num(-0.0001), "0");
        assert_eq!(num(10.0), "10");
        assert_eq!(num(-2.5), "-2.5");
    }
}
