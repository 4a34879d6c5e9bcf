//! Mergefall: numbered blocks launch, fall, settle onto a grid and merge.
//!
//! Core modules:
//! - `block`: block entities and the registry that owns them
//! - `physics`: per-frame motion, landing and grid snap
//! - `merge`: overlap scan, merge resolution and score
//! - `animation`: merge animations for the renderer
//! - `game`: the aggregate state stepped once per frame

pub mod animation;
pub mod block;
pub mod game;
pub mod merge;
pub mod physics;

pub use game::{GameState, StepReport};
