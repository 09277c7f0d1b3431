//! IIIF View - deep-zoom viewer core
//!
//! Lays out IIIF canvases in a shared world coordinate space, hit tests
//! annotations under the pointer, negotiates thumbnail requests against
//! IIIF Image API services and keeps an external deep-zoom viewer in sync
//! with application viewport state.

pub mod annotation;
pub mod config;
pub mod constants;
pub mod error;
pub mod thumbnail;
pub mod viewer;
pub mod viewport;
pub mod world;

pub use annotation::{AnnotationLayers, AnnotationList, AnnotationResource, HitTester, HoverTracker, Selector};
pub use config::{LogLevel, ViewerConfig};
pub use error::{Result, ViewerError};
pub use thumbnail::{SizeConstraints, Thumbnail, ThumbnailResolver};
pub use viewer::{Notification, ViewerCommand, ViewerEvent, ViewerSession};
pub use viewport::{ScreenTransform, ViewportState, ViewportSyncController};
pub use world::{CanvasWorld, LayerUpdate, WorldOptions};

pub use iiif_resource;
