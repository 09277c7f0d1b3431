//! Annotation model and hit testing.
//!
//! This module provides:
//! - Annotation resources parsed from annotation lists / search results
//! - SVG selector geometry
//! - Point-in-shape testing, click disambiguation and hover tracking

mod hit_test;
mod model;
mod svg;

pub use hit_test::{HitTestOptions, HitTester, HoverTracker, disambiguate, locality_score};
pub use model::{
    AnnotationId, AnnotationKind, AnnotationLayers, AnnotationList, AnnotationResource, Selector,
};
pub use svg::SvgShape;
