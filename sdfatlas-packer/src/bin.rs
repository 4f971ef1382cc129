use crate::packer::PackerOptions;
use crate::rect::{PlacedRect, Rect};

/// One atlas page using the MaxRects free-list.
///
/// Every placement reserves `width + padding` by `height + padding`, so two
/// rectangles on the same page are always at least `padding` apart.
#[derive(Debug, Clone)]
pub struct MaxRectsBin {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) max_width: u32,
    pub(crate) max_height: u32,
    pub(crate) free_rects: Vec<Rect>,
    pub(crate) rects: Vec<PlacedRect>,
    options: PackerOptions,
}

impl MaxRectsBin {
    pub fn new(options: PackerOptions) -> Self {
        let (width, height) = if options.smart {
            (0, 0)
        } else {
            (options.width, options.height)
        };
        let free = Rect::new(
            options.border,
            options.border,
            (options.width + options.padding).saturating_sub(options.border * 2),
            (options.height + options.padding).saturating_sub(options.border * 2),
        );
        Self {
            width,
            height,
            max_width: options.width,
            max_height: options.height,
            free_rects: vec![free],
            rects: Vec::new(),
            options,
        }
    }

    pub(crate) fn restore(
        options: PackerOptions,
        width: u32,
        height: u32,
        free_rects: Vec<Rect>,
        rects: Vec<PlacedRect>,
    ) -> Self {
        Self {
            width,
            height,
            max_width: options.width,
            max_height: options.height,
            free_rects,
            rects,
            options,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn free_rects(&self) -> &[Rect] {
        &self.free_rects
    }

    pub(crate) fn find(&self, key: u32) -> Option<&PlacedRect> {
        self.rects.iter().find(|placed| placed.key == key)
    }

    pub(crate) fn forget(&mut self, key: u32) {
        self.rects.retain(|placed| placed.key != key);
    }

    /// Places a rectangle, returning its top-left corner.
    pub fn place(&mut self, key: u32, width: u32, height: u32) -> Option<(u32, u32)> {
        let node = self.find_node(width + self.options.padding, height + self.options.padding)?;
        self.grow_to(&node);

        let mut kept = Vec::with_capacity(self.free_rects.len());
        let mut created = Vec::new();
        for free in self.free_rects.drain(..) {
            if free.collides(&node) {
                split(&free, &node, &mut created);
            } else {
                kept.push(free);
            }
        }
        kept.extend(created);
        self.free_rects = kept;
        self.prune();

        self.rects.push(PlacedRect {
            key,
            rect: Rect::new(node.x, node.y, width, height),
        });
        Some((node.x, node.y))
    }

    /// Best short side fit; ties keep the earliest free rectangle.
    fn find_node(&self, width: u32, height: u32) -> Option<Rect> {
        let mut best: Option<(u32, Rect)> = None;
        for free in &self.free_rects {
            if free.width < width || free.height < height {
                continue;
            }
            let score = (free.width - width).min(free.height - height);
            if best.is_none_or(|(best_score, _)| score < best_score) {
                best = Some((score, Rect::new(free.x, free.y, width, height)));
            }
        }
        best.map(|(_, node)| node)
    }

    fn grow_to(&mut self, node: &Rect) {
        if !self.options.smart {
            return;
        }
        let padding = self.options.padding;
        let border = self.options.border;
        let mut width = self.width.max(node.right().saturating_sub(padding) + border);
        let mut height = self
            .height
            .max(node.bottom().saturating_sub(padding) + border);
        if self.options.pot {
            width = width.next_power_of_two();
            height = height.next_power_of_two();
        }
        if self.options.square {
            width = width.max(height);
            height = width;
        }
        self.width = width.min(self.max_width);
        self.height = height.min(self.max_height);
    }

    fn prune(&mut self) {
        let mut i = 0;
        while i < self.free_rects.len() {
            let mut removed = false;
            let mut j = i + 1;
            while j < self.free_rects.len() {
                if self.free_rects[j].contains(&self.free_rects[i]) {
                    self.free_rects.remove(i);
                    removed = true;
                    break;
                }
                if self.free_rects[i].contains(&self.free_rects[j]) {
                    self.free_rects.remove(j);
                } else {
                    j += 1;
                }
            }
            if !removed {
                i += 1;
            }
        }
    }
}

/// Splits `free` around `used` into up to four maximal rectangles.
fn split(free: &Rect, used: &Rect, out: &mut Vec<Rect>) {
    if used.x < free.right() && used.right() > free.x {
        if used.y > free.y && used.y < free.bottom() {
            out.push(Rect::new(free.x, free.y, free.width, used.y - free.y));
        }
        if used.bottom() < free.bottom() {
            out.push(Rect::new(
                free.x,
                used.bottom(),
                free.width,
                free.bottom() - used.bottom(),
            ));
        }
    }
    if used.y < free.bottom() && used.bottom() > free.y {
        if used.x > free.x && used.x < free.right() {
            out.push(Rect::new(free.x, free.y, used.x - free.x, free.height));
        }
        if used.right() < free.right() {
            out.push(Rect::new(
                used.right(),
                free.y,
                free.right() - used.right(),
                free.height,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(width: u32, height: u32, padding: u32) -> PackerOptions {
        PackerOptions {
            width,
            height,
            padding,
            ..Default::default()
        }
    }

    #[test]
    fn first_rect_goes_top_left() {
        let mut bin = MaxRectsBin::new(options(64, 64, 0));
        assert_eq!(bin.place(1, 10, 10), Some((0, 0)));
        assert_eq!(bin.width(), 64);
    }

    #[test]
    fn fills_exactly_without_padding() {
        let mut bin = MaxRectsBin::new(options(20, 20, 0));
        for key in 0..4 {
            assert!(bin.place(key, 10, 10).is_some());
        }
        assert!(bin.place(4, 1, 1).is_none());
        assert!(bin.free_rects().is_empty());
    }

    #[test]
    fn padding_separates_neighbours() {
        let mut bin = MaxRectsBin::new(options(21, 10, 1));
        assert_eq!(bin.place(1, 10, 10), Some((0, 0)));
        assert_eq!(bin.place(2, 10, 10), Some((11, 0)));
        assert!(bin.place(3, 1, 1).is_none());
    }

    #[test]
    fn border_offsets_first_placement() {
        let mut bin = MaxRectsBin::new(PackerOptions {
            width: 32,
            height: 32,
            border: 2,
            ..Default::default()
        });
        assert_eq!(bin.place(1, 28, 28), Some((2, 2)));
        assert!(bin.place(2, 1, 1).is_none());
    }

    #[test]
    fn smart_size_tracks_used_extent() {
        let mut bin = MaxRectsBin::new(PackerOptions {
            width: 256,
            height: 256,
            smart: true,
            ..Default::default()
        });
        bin.place(1, 30, 12);
        assert_eq!((bin.width(), bin.height()), (30, 12));
    }

    #[test]
    fn smart_size_rounds_to_pot_and_square() {
        let mut bin = MaxRectsBin::new(PackerOptions {
            width: 256,
            height: 256,
            smart: true,
            pot: true,
            square: true,
            ..Default::default()
        });
        bin.place(1, 30, 12);
        assert_eq!((bin.width(), bin.height()), (32, 32));
    }

    #[test]
    fn prune_drops_contained_free_rects() {
        let mut bin = MaxRectsBin::new(options(100, 100, 0));
        bin.place(1, 50, 50);
        let free = bin.free_rects().to_vec();
        for (i, a) in free.iter().enumerate() {
            for (j, b) in free.iter().enumerate() {
                if i != j {
                    assert!(!a.contains(b), "{a:?} contains {b:?}");
                }
            }
        }
    }
}
