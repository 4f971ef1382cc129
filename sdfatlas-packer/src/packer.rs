use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bin::MaxRectsBin;
use crate::rect::Rect;
use crate::state::{BinState, PACKER_STATE_VERSION, PackerState};

#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("rectangle {key} ({width}x{height}) does not fit on a {page_width}x{page_height} page")]
    DoesNotFit {
        key: u32,
        width: u32,
        height: u32,
        page_width: u32,
        page_height: u32,
    },

    #[error("unsupported packer state version {found} (expected {PACKER_STATE_VERSION})")]
    UnsupportedVersion { found: u32 },

    #[error("packer state is incompatible with the current options: {0}")]
    IncompatibleState(String),
}

/// Page geometry and packing flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackerOptions {
    /// Maximum page width.
    pub width: u32,
    /// Maximum page height.
    pub height: u32,
    pub padding: u32,
    pub border: u32,
    /// Shrink pages to the smallest size holding their content.
    pub smart: bool,
    /// Round smart page sizes up to powers of two.
    pub pot: bool,
    /// Force smart pages to be square.
    pub square: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackItem {
    pub key: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub page: usize,
    pub x: u32,
    pub y: u32,
    /// Placement restored from a previous run's state.
    pub reused: bool,
}

/// Packs rectangles into as many pages as needed.
#[derive(Debug, Clone)]
pub struct AtlasPacker {
    options: PackerOptions,
    bins: Vec<MaxRectsBin>,
}

impl AtlasPacker {
    pub fn new(options: PackerOptions) -> Self {
        Self {
            options,
            bins: Vec::new(),
        }
    }

    /// Restores bins from a previous run. Fails when the state was produced
    /// with a different schema version or different page geometry.
    pub fn from_state(options: PackerOptions, state: &PackerState) -> Result<Self, PackError> {
        if state.version != PACKER_STATE_VERSION {
            return Err(PackError::UnsupportedVersion {
                found: state.version,
            });
        }
        check_compatible(&options, &state.options)?;

        let bins = state
            .bins
            .iter()
            .enumerate()
            .map(|(index, bin)| {
                if bin.max_width != options.width || bin.max_height != options.height {
                    return Err(PackError::IncompatibleState(format!(
                        "page {index} is {}x{}, expected {}x{}",
                        bin.max_width, bin.max_height, options.width, options.height
                    )));
                }
                Ok(MaxRectsBin::restore(
                    options,
                    bin.width,
                    bin.height,
                    bin.free_rects.clone(),
                    bin.rects.clone(),
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(pages = bins.len(), "restored packer state");
        Ok(Self { options, bins })
    }

    pub fn page_count(&self) -> usize {
        self.bins.len()
    }

    pub fn page_sizes(&self) -> Vec<(u32, u32)> {
        self.bins.iter().map(|bin| (bin.width(), bin.height())).collect()
    }

    /// Assigns a placement to every item with a non-zero area.
    ///
    /// Items whose key was already placed with the same size keep their
    /// previous placement. The remaining items are inserted longest side
    /// first (ties keep input order) into the first page with room, opening
    /// new pages as needed.
    pub fn pack(&mut self, items: &[PackItem]) -> Result<Vec<Option<Placement>>, PackError> {
        let mut placements = vec![None; items.len()];
        let mut pending = Vec::new();

        for (index, item) in items.iter().enumerate() {
            if item.width == 0 || item.height == 0 {
                continue;
            }
            match self.lookup(item.key) {
                Some((page, placed)) if placed.width == item.width && placed.height == item.height => {
                    placements[index] = Some(Placement {
                        page,
                        x: placed.x,
                        y: placed.y,
                        reused: true,
                    });
                }
                Some((page, _)) => {
                    warn!(
                        key = item.key,
                        page, "previously packed rectangle changed size, packing it again"
                    );
                    self.bins[page].forget(item.key);
                    pending.push(index);
                }
                None => pending.push(index),
            }
        }

        pending.sort_by_key(|&index| std::cmp::Reverse(items[index].width.max(items[index].height)));

        for index in pending {
            let item = items[index];
            placements[index] = Some(self.insert(item)?);
        }

        Ok(placements)
    }

    fn lookup(&self, key: u32) -> Option<(usize, Rect)> {
        self.bins
            .iter()
            .enumerate()
            .find_map(|(page, bin)| bin.find(key).map(|placed| (page, placed.rect)))
    }

    fn insert(&mut self, item: PackItem) -> Result<Placement, PackError> {
        let does_not_fit = || PackError::DoesNotFit {
            key: item.key,
            width: item.width,
            height: item.height,
            page_width: self.options.width,
            page_height: self.options.height,
        };

        let usable_width = self.options.width.saturating_sub(self.options.border * 2);
        let usable_height = self.options.height.saturating_sub(self.options.border * 2);
        if item.width > usable_width || item.height > usable_height {
            return Err(does_not_fit());
        }

        for (page, bin) in self.bins.iter_mut().enumerate() {
            if let Some((x, y)) = bin.place(item.key, item.width, item.height) {
                return Ok(Placement {
                    page,
                    x,
                    y,
                    reused: false,
                });
            }
        }

        let mut bin = MaxRectsBin::new(self.options);
        let (x, y) = bin
            .place(item.key, item.width, item.height)
            .ok_or_else(does_not_fit)?;
        self.bins.push(bin);
        debug!(page = self.bins.len() - 1, "opened new atlas page");
        Ok(Placement {
            page: self.bins.len() - 1,
            x,
            y,
            reused: false,
        })
    }

    /// Snapshot of the free-space bookkeeping for a later resume.
    pub fn state(&self) -> PackerState {
        PackerState {
            version: PACKER_STATE_VERSION,
            options: self.options,
            bins: self
                .bins
                .iter()
                .map(|bin| BinState {
                    width: bin.width,
                    height: bin.height,
                    max_width: bin.max_width,
                    max_height: bin.max_height,
                    free_rects: bin.free_rects.clone(),
                    rects: bin.rects.clone(),
                })
                .collect(),
        }
    }
}

fn check_compatible(current: &PackerOptions, stored: &PackerOptions) -> Result<(), PackError> {
    let mismatch = |field: &str, stored: &dyn std::fmt::Debug, current: &dyn std::fmt::Debug| {
        Err(PackError::IncompatibleState(format!(
            "{field} was {stored:?}, now {current:?}"
        )))
    };
    if (stored.width, stored.height) != (current.width, current.height) {
        return mismatch(
            "texture size",
            &(stored.width, stored.height),
            &(current.width, current.height),
        );
    }
    if stored.padding != current.padding {
        return mismatch("padding", &stored.padding, &current.padding);
    }
    if stored.border != current.border {
        return mismatch("border", &stored.border, &current.border);
    }
    if (stored.smart, stored.pot, stored.square) != (current.smart, current.pot, current.square) {
        return mismatch(
            "packing flags",
            &(stored.smart, stored.pot, stored.square),
            &(current.smart, current.pot, current.square),
        );
    }
    Ok(())
}
