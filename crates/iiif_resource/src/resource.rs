//! The normalized IIIF resource graph.
//!
//! Manifest parsing proper (Presentation 2/3 JSON-LD, labels, metadata) is
//! done upstream; this module models the normalized graph it produces:
//! every node carries a `type` discriminant and an `id` (or `@id`), canvases
//! list their image layers bottom-first in `items`, manifests list canvases
//! and collections list member resources.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::{parse_xywh, split_target, Rect};
use crate::one_or_many::one_or_many;
use crate::service::ImageService;

/// Order in which a manifest's canvases are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewingDirection {
    #[default]
    LeftToRight,
    RightToLeft,
    TopToBottom,
    BottomToTop,
}

impl ViewingDirection {
    /// Unit step along the layout axis as `(dx, dy)`.
    pub fn step(&self) -> (i8, i8) {
        match self {
            ViewingDirection::LeftToRight => (1, 0),
            ViewingDirection::RightToLeft => (-1, 0),
            ViewingDirection::TopToBottom => (0, 1),
            ViewingDirection::BottomToTop => (0, -1),
        }
    }

    pub fn is_horizontal(&self) -> bool {
        self.step().1 == 0
    }
}

/// A reference to another resource, either as a bare id or as an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    Id(String),
    Object {
        #[serde(alias = "@id")]
        id: String,
    },
}

impl Reference {
    pub fn id(&self) -> &str {
        match self {
            Reference::Id(id) | Reference::Object { id } => id,
        }
    }
}

/// An image content resource (a painting layer or a thumbnail).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageResource {
    #[serde(alias = "@id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<ImageService>,
    /// Where the image is painted, e.g. `canvas#xywh=0,0,500,800`.
    #[serde(default, alias = "on", skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl ImageResource {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_service(mut self, service: ImageService) -> Self {
        self.service.push(service);
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// First attached IIIF Image API service.
    pub fn image_service(&self) -> Option<&ImageService> {
        self.service.iter().find(|service| service.is_image_service())
    }

    /// Canvas region this image is painted onto, when it does not cover
    /// the whole canvas.
    pub fn target_fragment(&self) -> Option<Rect> {
        let (_, fragment) = split_target(self.target.as_deref()?);
        match parse_xywh(fragment?) {
            Ok(rect) => Some(rect),
            Err(e) => {
                log::warn!("Ignoring image target of '{}': {}", self.id, e);
                None
            }
        }
    }
}

/// A single page/surface.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Canvas {
    #[serde(alias = "@id")]
    pub id: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub thumbnail: Vec<ImageResource>,
    /// Image layers, bottom-most first.
    #[serde(default)]
    pub items: Vec<ImageResource>,
}

impl Canvas {
    pub fn new(id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_image(mut self, image: ImageResource) -> Self {
        self.items.push(image);
        self
    }

    pub fn with_thumbnail(mut self, image: ImageResource) -> Self {
        self.thumbnail.push(image);
        self
    }

    /// Width over height, `None` for degenerate canvases.
    pub fn aspect_ratio(&self) -> Option<f64> {
        (self.width > 0 && self.height > 0).then(|| self.width as f64 / self.height as f64)
    }

    /// First image carrying an image service, else the first image.
    pub fn preferred_image(&self) -> Option<&ImageResource> {
        self.items
            .iter()
            .find(|image| image.image_service().is_some())
            .or_else(|| self.items.first())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(alias = "@id")]
    pub id: String,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub thumbnail: Vec<ImageResource>,
    #[serde(default)]
    pub items: Vec<Canvas>,
    #[serde(default, alias = "startCanvas", skip_serializing_if = "Option::is_none")]
    pub start: Option<Reference>,
    #[serde(default)]
    pub viewing_direction: ViewingDirection,
}

impl Manifest {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_canvas(mut self, canvas: Canvas) -> Self {
        self.items.push(canvas);
        self
    }

    /// The declared start canvas, when it exists in `items`.
    pub fn start_canvas(&self) -> Option<&Canvas> {
        let start = self.start.as_ref()?;
        let canvas = self.items.iter().find(|canvas| canvas.id == start.id());
        if canvas.is_none() {
            log::debug!("Start canvas '{}' not found in manifest '{}'", start.id(), self.id);
        }
        canvas
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Collection {
    #[serde(alias = "@id")]
    pub id: String,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub thumbnail: Vec<ImageResource>,
    #[serde(default)]
    pub items: Vec<ResourceNode>,
}

impl Collection {
    /// First member that is a manifest (nested collections are skipped).
    pub fn first_manifest(&self) -> Option<&Manifest> {
        self.items.iter().find_map(|item| match item {
            ResourceNode::Manifest(manifest) => Some(manifest),
            _ => None,
        })
    }
}

/// Any node of the resource graph that can be asked for a preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResourceNode {
    Image(ImageResource),
    Canvas(Canvas),
    Manifest(Manifest),
    Collection(Collection),
}

impl ResourceNode {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn id(&self) -> &str {
        match self {
            ResourceNode::Image(image) => &image.id,
            ResourceNode::Canvas(canvas) => &canvas.id,
            ResourceNode::Manifest(manifest) => &manifest.id,
            ResourceNode::Collection(collection) => &collection.id,
        }
    }

    /// The explicit `thumbnail` property. Image resources have none.
    pub fn thumbnail(&self) -> &[ImageResource] {
        match self {
            ResourceNode::Image(_) => &[],
            ResourceNode::Canvas(canvas) => &canvas.thumbnail,
            ResourceNode::Manifest(manifest) => &manifest.thumbnail,
            ResourceNode::Collection(collection) => &collection.thumbnail,
        }
    }
}
