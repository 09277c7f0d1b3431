//! Thumbnail negotiation.
//!
//! Given any node of the resource graph and optional size constraints,
//! pick a representative image and build the IIIF Image API request for a
//! preview of it:
//!
//! ```text
//! {service}/full/{size}/0/default.jpg
//! ```
//!
//! Small requests are clamped up to a shared floor so that different
//! callers asking for small previews end up requesting the same asset.

use std::fmt;

use iiif_resource::{Canvas, ComplianceLevel, ImageResource, Manifest, ResourceNode};
use serde::{Deserialize, Serialize};

use crate::constants;

/// Requested bounds for a preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeConstraints {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

impl SizeConstraints {
    pub fn new(max_width: Option<u32>, max_height: Option<u32>) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    pub fn width(max_width: u32) -> Self {
        Self::new(Some(max_width), None)
    }

    pub fn height(max_height: u32) -> Self {
        Self::new(None, Some(max_height))
    }

    pub fn is_empty(&self) -> bool {
        self.max_width.is_none() && self.max_height.is_none()
    }
}

/// A renderable preview. Dimensions are `None` when they cannot be known
/// ahead of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Thumbnail {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// The `size` segment of an Image API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeParam {
    /// `w,`
    Width(u32),
    /// `,h`
    Height(u32),
    /// `!w,h`: largest size fitting inside the box.
    BestFit(u32, u32),
}

impl fmt::Display for SizeParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeParam::Width(w) => write!(f, "{},", w),
            SizeParam::Height(h) => write!(f, ",{}", h),
            SizeParam::BestFit(w, h) => write!(f, "!{},{}", w, h),
        }
    }
}

impl SizeParam {
    /// Output dimensions for a source of the given size, if known.
    pub fn resolve(&self, original: Option<(u32, u32)>) -> (Option<u32>, Option<u32>) {
        let Some((ow, oh)) = original else {
            return match *self {
                SizeParam::Width(w) => (Some(w), None),
                SizeParam::Height(h) => (None, Some(h)),
                SizeParam::BestFit(..) => (None, None),
            };
        };
        let (ow, oh) = (ow as f64, oh as f64);
        match *self {
            SizeParam::Width(w) => (Some(w), Some(round(w as f64 * oh / ow))),
            SizeParam::Height(h) => (Some(round(h as f64 * ow / oh)), Some(h)),
            SizeParam::BestFit(w, h) => {
                let scale = (w as f64 / ow).min(h as f64 / oh);
                (Some(round(scale * ow)), Some(round(scale * oh)))
            }
        }
    }
}

fn round(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

/// Resolves preview images for resource nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailResolver {
    min_size: u32,
    default_height: u32,
}

impl Default for ThumbnailResolver {
    fn default() -> Self {
        Self::new(constants::thumbnail::MIN_SIZE, constants::thumbnail::DEFAULT_HEIGHT)
    }
}

impl ThumbnailResolver {
    pub fn new(min_size: u32, default_height: u32) -> Self {
        Self {
            min_size,
            default_height,
        }
    }

    /// Preview for `node`, or `None` when nothing renderable can be found.
    pub fn resolve(&self, node: &ResourceNode, constraints: SizeConstraints) -> Option<Thumbnail> {
        let Some(image) = representative_image(node) else {
            log::debug!("No preview image for '{}'", node.id());
            return None;
        };
        Some(self.resolve_image(image, constraints))
    }

    /// Preview for a single image resource.
    pub fn resolve_image(&self, image: &ImageResource, constraints: SizeConstraints) -> Thumbnail {
        let Some(service) = image.image_service() else {
            return static_thumbnail(image);
        };

        match service.compliance_level() {
            None => {
                log::warn!(
                    "Unrecognized image service profile on '{}', using it as a static image",
                    image.id
                );
                static_thumbnail(image)
            }
            Some(ComplianceLevel::Level0) => Thumbnail {
                url: service.base_id().to_string(),
                width: None,
                height: None,
            },
            Some(ComplianceLevel::Level1 | ComplianceLevel::Level2) => {
                let original = match (service.width.or(image.width), service.height.or(image.height)) {
                    (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
                    _ => None,
                };
                let size = self.size_param(constraints, original);
                let (width, height) = size.resolve(original);
                Thumbnail {
                    url: format!("{}/full/{}/0/default.jpg", service.base_id(), size),
                    width,
                    height,
                }
            }
        }
    }

    /// Size segment for the given constraints, floor applied.
    ///
    /// The floor replaces the request with `!min,min` when the size it
    /// would produce is below `min_size` in both dimensions. Without a
    /// known original size the constraints themselves are compared.
    pub fn size_param(&self, constraints: SizeConstraints, original: Option<(u32, u32)>) -> SizeParam {
        let requested = match (constraints.max_width, constraints.max_height) {
            (Some(w), Some(h)) => SizeParam::BestFit(w, h),
            (Some(w), None) => SizeParam::Width(w),
            (None, Some(h)) => SizeParam::Height(h),
            (None, None) => return SizeParam::Height(self.default_height),
        };

        let below_floor = |value: Option<u32>| value.is_none_or(|v| v < self.min_size);
        let too_small = match original {
            Some(_) => {
                let (width, height) = requested.resolve(original);
                below_floor(width) && below_floor(height)
            }
            None => below_floor(constraints.max_width) && below_floor(constraints.max_height),
        };

        if too_small {
            log::trace!("Requested {} is below the {}px floor", requested, self.min_size);
            SizeParam::BestFit(self.min_size, self.min_size)
        } else {
            requested
        }
    }
}

fn static_thumbnail(image: &ImageResource) -> Thumbnail {
    Thumbnail {
        url: image.id.clone(),
        width: image.width,
        height: image.height,
    }
}

/// The explicit thumbnail if there is one, otherwise a member's image.
fn representative_image(node: &ResourceNode) -> Option<&ImageResource> {
    match node {
        ResourceNode::Image(image) => Some(image),
        ResourceNode::Canvas(canvas) => canvas_image(canvas),
        ResourceNode::Manifest(manifest) => manifest_image(manifest),
        ResourceNode::Collection(collection) => collection
            .thumbnail
            .first()
            .or_else(|| collection.first_manifest().and_then(manifest_image)),
    }
}

fn manifest_image(manifest: &Manifest) -> Option<&ImageResource> {
    manifest.thumbnail.first().or_else(|| {
        manifest
            .start_canvas()
            .or_else(|| manifest.items.first())
            .and_then(canvas_image)
    })
}

fn canvas_image(canvas: &Canvas) -> Option<&ImageResource> {
    canvas.thumbnail.first().or_else(|| canvas.preferred_image())
}
