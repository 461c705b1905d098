//! Multi-threaded, multi-pass tile rendering.
//!
//! [`RenderPool`] owns the threads, [`Synchronizer`] hands out tiles and keeps the
//! workers in lock-step between passes, and [`PassSet`] is the loop each worker runs.

mod pool;
mod sync;
mod tile;
mod worker;

pub use pool::RenderPool;
pub use sync::{Crossing, Synchronizer};
pub use tile::{build_tiles, Tile};
pub use worker::{PassSet, LEADER};
