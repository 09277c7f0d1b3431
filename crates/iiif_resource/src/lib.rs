//! iiif_resource - IIIF resource graph primitives
//!
//! This crate provides the normalized resource graph (images, canvases,
//! manifests, collections) that the viewer core lays out and resolves
//! thumbnails from, plus the small geometry and fragment helpers shared by
//! everything that deals with canvas coordinates.

mod error;
mod geometry;
mod one_or_many;
mod resource;
mod service;

pub use error::{ResourceError, Result};
pub use geometry::{parse_xywh, split_target, Point, Rect, Size};
pub use one_or_many::{one_or_many, OneOrMany};
pub use resource::{Canvas, Collection, ImageResource, Manifest, Reference, ResourceNode, ViewingDirection};
pub use service::{ComplianceLevel, ImageService, ProfileEntry};
