//! Annotation resources and lists.
//!
//! Annotations are read from Presentation 2 annotation lists (`resources`,
//! `on`, `oa:Choice` selectors) and Presentation 3 annotation pages
//! (`items`, `target`, `source`). Only what hit testing and selection need
//! is kept: the id, the target canvas and one selector.

use iiif_resource::{one_or_many, parse_xywh, split_target, Point, Rect};
use serde::Deserialize;

use super::svg::SvgShape;
use crate::error::{Result, ViewerError};

/// Unique identifier for an annotation.
pub type AnnotationId = String;

/// Where on its canvas an annotation sits, in canvas-local pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Axis-aligned `xywh` rectangle.
    Fragment(Rect),
    /// Arbitrary SVG geometry.
    Svg(SvgShape),
}

impl Selector {
    /// Boundary-inclusive for rectangles, even-odd fill for paths.
    pub fn contains(&self, local: Point) -> bool {
        match self {
            Selector::Fragment(rect) => rect.contains(local),
            Selector::Svg(shape) => shape.contains(local),
        }
    }

    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Selector::Fragment(rect) => Some(*rect),
            Selector::Svg(shape) => shape.bounds(),
        }
    }
}

/// A single annotation targeting one canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationResource {
    pub id: AnnotationId,
    /// Canvas id, without fragment.
    pub target_id: String,
    /// `None` when the target carried no usable selector; such annotations
    /// are never hit.
    pub selector: Option<Selector>,
}

impl AnnotationResource {
    pub fn new(id: impl Into<String>, target_id: impl Into<String>, selector: Selector) -> Self {
        Self {
            id: id.into(),
            target_id: target_id.into(),
            selector: Some(selector),
        }
    }

    /// Test a canvas-local point against the selector.
    pub fn contains(&self, local: Point) -> bool {
        self.selector.as_ref().is_some_and(|selector| selector.contains(local))
    }

    /// Parse one annotation from its JSON form.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let raw = RawAnnotation::deserialize(value)?;
        let id = raw
            .id
            .ok_or_else(|| ViewerError::invalid_annotation("annotation without id"))?;
        let target = raw
            .target
            .into_iter()
            .next()
            .ok_or_else(|| ViewerError::invalid_annotation(format!("annotation '{}' has no target", id)))?;

        let (target_id, selector) = match target {
            RawTarget::Uri(uri) | RawTarget::Resource { id: uri } => {
                let (base, fragment) = split_target(&uri);
                let selector = fragment.and_then(|fragment| fragment_selector(&id, fragment));
                (base.to_string(), selector)
            }
            RawTarget::Specific { source, selector } => {
                let mut flat = Vec::new();
                for raw_selector in &selector {
                    raw_selector.flatten_into(&mut flat);
                }
                (source.into_id(), pick_selector(&id, &flat))
            }
        };

        Ok(Self {
            id,
            target_id,
            selector,
        })
    }
}

fn fragment_selector(id: &str, fragment: &str) -> Option<Selector> {
    match parse_xywh(fragment) {
        Ok(rect) => Some(Selector::Fragment(rect)),
        Err(e) => {
            log::warn!("Annotation '{}': {}", id, e);
            None
        }
    }
}

/// SVG geometry wins over a rectangle when both are offered.
fn pick_selector(id: &str, selectors: &[&RawSelector]) -> Option<Selector> {
    let svg = selectors
        .iter()
        .find(|s| s.kind.ends_with("SvgSelector"))
        .and_then(|s| s.value.as_deref());
    if let Some(value) = svg {
        return Some(Selector::Svg(SvgShape::parse_lossy(id, value)));
    }

    selectors
        .iter()
        .find(|s| s.kind.ends_with("FragmentSelector"))
        .and_then(|s| s.value.as_deref())
        .and_then(|value| fragment_selector(id, value))
}

#[derive(Deserialize)]
struct RawAnnotation {
    #[serde(alias = "@id", default)]
    id: Option<String>,
    #[serde(alias = "on", default, deserialize_with = "one_or_many")]
    target: Vec<RawTarget>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTarget {
    Uri(String),
    Specific {
        #[serde(alias = "full")]
        source: RawSource,
        #[serde(default, deserialize_with = "one_or_many")]
        selector: Vec<RawSelector>,
    },
    Resource {
        #[serde(alias = "@id")]
        id: String,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSource {
    Uri(String),
    Object {
        #[serde(alias = "@id")]
        id: String,
    },
}

impl RawSource {
    fn into_id(self) -> String {
        match self {
            RawSource::Uri(uri) => split_target(&uri).0.to_string(),
            RawSource::Object { id } => id,
        }
    }
}

/// A selector, possibly an `oa:Choice` wrapping alternatives.
#[derive(Deserialize)]
struct RawSelector {
    #[serde(rename = "type", alias = "@type", default)]
    kind: String,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    default: Option<Box<RawSelector>>,
    #[serde(default, deserialize_with = "one_or_many")]
    item: Vec<RawSelector>,
}

impl RawSelector {
    fn flatten_into<'a>(&'a self, out: &mut Vec<&'a RawSelector>) {
        out.push(self);
        if let Some(default) = &self.default {
            default.flatten_into(out);
        }
        for item in &self.item {
            item.flatten_into(out);
        }
    }
}

/// An ordered list of annotations (an annotation list / page, or one page
/// of search results).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnnotationList {
    pub id: String,
    pub resources: Vec<AnnotationResource>,
}

#[derive(Deserialize)]
struct RawList {
    #[serde(alias = "@id", default)]
    id: String,
    #[serde(alias = "items", default)]
    resources: Vec<serde_json::Value>,
}

impl AnnotationList {
    pub fn new(id: impl Into<String>, resources: Vec<AnnotationResource>) -> Self {
        Self {
            id: id.into(),
            resources,
        }
    }

    /// Parse a list, skipping annotations that cannot be used.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawList = serde_json::from_str(json)?;
        let resources = raw
            .resources
            .iter()
            .filter_map(|value| match AnnotationResource::from_value(value) {
                Ok(resource) => Some(resource),
                Err(e) => {
                    log::warn!("Skipping annotation in list '{}': {}", raw.id, e);
                    None
                }
            })
            .collect();
        Ok(Self {
            id: raw.id,
            resources,
        })
    }
}

/// Which collection an annotation came from. Both behave identically for
/// hit testing; only the rendering palette differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    Standard,
    Search,
}

/// The two parallel annotation collections of a window.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnnotationLayers {
    pub standard: Vec<AnnotationList>,
    pub search: Vec<AnnotationList>,
}

impl AnnotationLayers {
    pub fn new(standard: Vec<AnnotationList>, search: Vec<AnnotationList>) -> Self {
        Self { standard, search }
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Every annotation, standard lists first, in list order.
    pub fn iter(&self) -> impl Iterator<Item = (AnnotationKind, &AnnotationResource)> {
        let standard = self
            .standard
            .iter()
            .flat_map(|list| list.resources.iter().map(|r| (AnnotationKind::Standard, r)));
        let search = self
            .search
            .iter()
            .flat_map(|list| list.resources.iter().map(|r| (AnnotationKind::Search, r)));
        standard.chain(search)
    }

    /// Annotations targeting one canvas.
    pub fn on_canvas<'s, 'c>(
        &'s self,
        canvas_id: &'c str,
    ) -> impl Iterator<Item = (AnnotationKind, &'s AnnotationResource)> + use<'s, 'c> {
        self.iter().filter(move |(_, resource)| resource.target_id == canvas_id)
    }
}
