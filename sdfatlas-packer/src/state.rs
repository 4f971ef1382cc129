use serde::{Deserialize, Serialize};

use crate::packer::PackerOptions;
use crate::rect::{PlacedRect, Rect};

/// Schema version written into every [`PackerState`].
pub const PACKER_STATE_VERSION: u32 = 1;

/// Persisted packer internals. Treated as an opaque blob by callers; only
/// [`AtlasPacker::from_state`](crate::AtlasPacker::from_state) interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackerState {
    #[serde(default)]
    pub version: u32,
    pub options: PackerOptions,
    pub bins: Vec<BinState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinState {
    pub width: u32,
    pub height: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub free_rects: Vec<Rect>,
    #[serde(default)]
    pub rects: Vec<PlacedRect>,
}

impl PackerState {
    pub fn page_count(&self) -> usize {
        self.bins.len()
    }
}
