//! Deterministic multi-page MaxRects packing with resumable state.
//!
//! Rectangles are placed with the best-short-side-fit heuristic into pages of
//! a fixed maximum size. The free-space bookkeeping of every page can be
//! snapshotted as a [`PackerState`] and restored later, so a subsequent run
//! appends new rectangles without moving the ones already placed.

mod bin;
mod packer;
mod rect;
mod state;

pub use bin::MaxRectsBin;
pub use packer::{AtlasPacker, PackError, PackItem, PackerOptions, Placement};
pub use rect::{PlacedRect, Rect};
pub use state::{BinState, PACKER_STATE_VERSION, PackerState};
