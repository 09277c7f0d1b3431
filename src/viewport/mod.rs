//! Viewport math and synchronization with the external deep-zoom viewer.
//!
//! - [`ScreenTransform`]: screen pixel <-> world conversion, zoom and pan
//! - [`ViewportSyncController`]: keeps application viewport state and the
//!   viewer's animated pose reconciled without feedback loops
//! - [`Coalescer`]: latest-value-only debouncing of notifications

mod coalesce;
mod sync;
mod transform;

pub use coalesce::Coalescer;
pub use sync::{SyncPhase, ViewportRequest, ViewportState, ViewportSyncController};
pub use transform::ScreenTransform;
