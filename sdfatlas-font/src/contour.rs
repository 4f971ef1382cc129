/// One outline drawing command with absolute coordinates (y-up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo {
        x: f64,
        y: f64,
    },
    LineTo {
        x: f64,
        y: f64,
    },
    QuadTo {
        cx: f64,
        cy: f64,
        x: f64,
        y: f64,
    },
    CurveTo {
        c1x: f64,
        c1y: f64,
        c2x: f64,
        c2y: f64,
        x: f64,
        y: f64,
    },
    Close,
}

impl PathCommand {
    pub fn scale(self, factor: f64) -> Self {
        match self {
            PathCommand::MoveTo { x, y } => PathCommand::MoveTo {
                x: x * factor,
                y: y * factor,
            },
            PathCommand::LineTo { x, y } => PathCommand::LineTo {
                x: x * factor,
                y: y * factor,
            },
            PathCommand::QuadTo { cx, cy, x, y } => PathCommand::QuadTo {
                cx: cx * factor,
                cy: cy * factor,
                x: x * factor,
                y: y * factor,
            },
            PathCommand::CurveTo {
                c1x,
                c1y,
                c2x,
                c2y,
                x,
                y,
            } => PathCommand::CurveTo {
                c1x: c1x * factor,
                c1y: c1y * factor,
                c2x: c2x * factor,
                c2y: c2y * factor,
                x: x * factor,
                y: y * factor,
            },
            PathCommand::Close => PathCommand::Close,
        }
    }

    /// End point of the command, `None` for [`PathCommand::Close`].
    pub fn end_point(&self) -> Option<(f64, f64)> {
        match *self {
            PathCommand::MoveTo { x, y }
            | PathCommand::LineTo { x, y }
            | PathCommand::QuadTo { x, y, .. }
            | PathCommand::CurveTo { x, y, .. } => Some((x, y)),
            PathCommand::Close => None,
        }
    }
}

/// Axis-aligned bounding box. Starts empty and grows with `include`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl Bounds {
    pub const EMPTY: Bounds = Bounds {
        x_min: f64::INFINITY,
        y_min: f64::INFINITY,
        x_max: f64::NEG_INFINITY,
        y_max: f64::NEG_INFINITY,
    };

    pub fn is_empty(&self) -> bool {
        self.x_min > self.x_max || self.y_min > self.y_max
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.x_max - self.x_min
        }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.y_max - self.y_min
        }
    }

    pub fn include(&mut self, x: f64, y: f64) {
        self.x_min = self.x_min.min(x);
        self.y_min = self.y_min.min(y);
        self.x_max = self.x_max.max(x);
        self.y_max = self.y_max.max(y);
    }

    pub fn union(mut self, other: &Bounds) -> Bounds {
        if !other.is_empty() {
            self.include(other.x_min, other.y_min);
            self.include(other.x_max, other.y_max);
        }
        self
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Size thresholds below which a contour counts as a rendering artifact.
///
/// A contour is dropped only when the shorter side of its bounding box is
/// under `small` and the longer side is under `large`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContourTolerance {
    pub small: f64,
    pub large: f64,
}

impl ContourTolerance {
    pub fn from_tolerance(tolerance: f64) -> Self {
        Self {
            small: tolerance,
            large: tolerance * 10.0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.small > 0.0
    }

    pub fn is_insignificant(&self, bounds: &Bounds) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let (w, h) = (bounds.width(), bounds.height());
        w.min(h) < self.small && w.max(h) < self.large
    }
}

/// A closed sub-path of a glyph outline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contour {
    pub commands: Vec<PathCommand>,
}

impl Contour {
    /// A single move with nothing drawn after it.
    pub fn is_degenerate(&self) -> bool {
        self.commands.len() == 1
    }

    pub fn start(&self) -> Option<(f64, f64)> {
        self.commands.first().and_then(PathCommand::end_point)
    }

    /// Exact bounds, including curve extrema.
    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::EMPTY;
        let mut current = (0.0, 0.0);
        for command in &self.commands {
            match *command {
                PathCommand::MoveTo { x, y } | PathCommand::LineTo { x, y } => {
                    bounds.include(x, y);
                }
                PathCommand::QuadTo { cx, cy, x, y } => {
                    bounds.include(x, y);
                    for t in quad_extrema(current.0, cx, x)
                        .into_iter()
                        .chain(quad_extrema(current.1, cy, y))
                        .flatten()
                    {
                        bounds.include(
                            quad_at(current.0, cx, x, t),
                            quad_at(current.1, cy, y, t),
                        );
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
                    bounds.include(x, y);
                    let roots = cubic_extrema(current.0, c1x, c2x, x)
                        .into_iter()
                        .chain(cubic_extrema(current.1, c1y, c2y, y))
                        .flatten();
                    for t in roots {
                        bounds.include(
                            cubic_at(current.0, c1x, c2x, x, t),
                            cubic_at(current.1, c1y, c2y, y, t),
                        );
                    }
                }
                PathCommand::Close => {}
            }
            if let Some(point) = command.end_point() {
                current = point;
            }
        }
        bounds
    }
}

/// Splits a command stream into contours at every move command.
pub fn split_contours(commands: impl IntoIterator<Item = PathCommand>) -> Vec<Contour> {
    let mut contours: Vec<Contour> = Vec::new();
    for command in commands {
        match command {
            PathCommand::MoveTo { .. } => contours.push(Contour {
                commands: vec![command],
            }),
            _ => match contours.last_mut() {
                Some(contour) => contour.commands.push(command),
                // drawing without a leading move starts at the origin
                None => contours.push(Contour {
                    commands: vec![PathCommand::MoveTo { x: 0.0, y: 0.0 }, command],
                }),
            },
        }
    }
    contours
}

fn in_unit_interval(t: f64) -> Option<f64> {
    (t > 0.0 && t < 1.0).then_some(t)
}

fn quad_extrema(p0: f64, p1: f64, p2: f64) -> [Option<f64>; 1] {
    let denom = p0 - 2.0 * p1 + p2;
    if denom.abs() < f64::EPSILON {
        return [None];
    }
    [in_unit_interval((p0 - p1) / denom)]
}

fn quad_at(p0: f64, p1: f64, p2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    mt * mt * p0 + 2.0 * mt * t * p1 + t * t * p2
}

fn cubic_extrema(p0: f64, p1: f64, p2: f64, p3: f64) -> [Option<f64>; 2] {
    let a = -p0 + 3.0 * p1 - 3.0 * p2 + p3;
    let b = 2.0 * (p0 - 2.0 * p1 + p2);
    let c = p1 - p0;
    if a.abs() < f64::EPSILON {
        if b.abs() < f64::EPSILON {
            return [None, None];
        }
        return [in_unit_interval(-c / b), None];
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return [None, None];
    }
    let sqrt = disc.sqrt();
    [
        in_unit_interval((-b + sqrt) / (2.0 * a)),
        in_unit_interval((-b - sqrt) / (2.0 * a)),
    ]
}

fn cubic_at(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    mt * mt * mt * p0 + 3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t * p3
}
