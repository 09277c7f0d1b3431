//! Composite world layout.
//!
//! A world is the single coordinate space spanning every canvas shown
//! together (a book spread, a strip of pages, or a stack of overlaid
//! canvases). Canvases are normalized to a shared extent across the layout
//! axis: in a horizontal layout every canvas gets the height of the
//! shortest one, in a vertical layout the width of the narrowest. Each
//! canvas therefore carries an offset and a scale:
//!
//! ```text
//! world = offset + local * scale
//! ```
//!
//! All queries are pure. Only layer order/opacity is mutated in place; any
//! change to the canvas set means building a new world.

use iiif_resource::{Canvas, ImageResource, Manifest, Point, Rect, ViewingDirection};

use crate::error::{Result, ViewerError};

/// Layout options for a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorldOptions {
    pub direction: ViewingDirection,
    /// Stack every canvas at the origin instead of laying them side by side.
    pub overlay: bool,
}

/// An image layer painted on a canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub resource: ImageResource,
    /// In `[0, 1]`.
    pub opacity: f64,
    pub visible: bool,
}

impl Layer {
    fn new(resource: ImageResource) -> Self {
        Self {
            resource,
            opacity: 1.0,
            visible: true,
        }
    }

    /// Opacity the renderer should use.
    pub fn effective_opacity(&self) -> f64 {
        if self.visible { self.opacity } else { 0.0 }
    }
}

/// Partial update applied to one layer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayerUpdate {
    /// New paint position (0 = bottom).
    pub index: Option<usize>,
    pub opacity: Option<f64>,
    pub visible: Option<bool>,
}

/// A canvas placed in the world.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldCanvas {
    pub id: String,
    /// Intrinsic canvas size.
    pub width: u32,
    pub height: u32,
    /// Top-left corner in world coordinates.
    pub offset: Point,
    /// World units per canvas unit; 0 for degenerate canvases.
    pub scale: f64,
    /// Paint order, bottom first. The position is the layer index.
    layers: Vec<Layer>,
}

impl WorldCanvas {
    /// Canvas bounds in world coordinates.
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.offset.x,
            self.offset.y,
            self.width as f64 * self.scale,
            self.height as f64 * self.scale,
        )
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    fn is_degenerate(&self) -> bool {
        self.scale <= 0.0 || self.width == 0 || self.height == 0
    }

    /// World point to canvas-local pixels.
    pub fn to_local(&self, world: Point) -> Option<Point> {
        if self.is_degenerate() {
            return None;
        }
        let delta = world.offset_from(self.offset);
        Some(Point::new(delta.x / self.scale, delta.y / self.scale))
    }

    /// Canvas-local pixels to a world point.
    pub fn to_world(&self, local: Point) -> Point {
        Point::new(
            self.offset.x + local.x * self.scale,
            self.offset.y + local.y * self.scale,
        )
    }

    fn layer_position(&self, resource_id: &str) -> Option<usize> {
        self.layers.iter().position(|layer| layer.resource.id == resource_id)
    }
}

/// The composite coordinate space of one window.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CanvasWorld {
    canvases: Vec<WorldCanvas>,
    options: WorldOptions,
}

impl CanvasWorld {
    /// Lay out `canvases` in order.
    pub fn new(canvases: &[Canvas], options: WorldOptions) -> Self {
        let horizontal = options.direction.is_horizontal();
        let (dx, dy) = options.direction.step();

        // Shared cross-axis extent: smallest positive height (or width).
        let cross = canvases
            .iter()
            .map(|c| if horizontal { c.height } else { c.width })
            .filter(|extent| *extent > 0)
            .min()
            .unwrap_or(0) as f64;

        let scaled: Vec<(f64, f64, f64)> = canvases
            .iter()
            .map(|canvas| {
                if canvas.aspect_ratio().is_none() {
                    return (0.0, 0.0, 0.0);
                }
                let scale = if horizontal {
                    cross / canvas.height as f64
                } else {
                    cross / canvas.width as f64
                };
                (scale, canvas.width as f64 * scale, canvas.height as f64 * scale)
            })
            .collect();

        let total: f64 = scaled
            .iter()
            .map(|(_, w, h)| if horizontal { *w } else { *h })
            .sum();

        let mut along = 0.0;
        let placed = canvases
            .iter()
            .zip(scaled)
            .map(|(canvas, (scale, w, h))| {
                let offset = if options.overlay {
                    Point::default()
                } else {
                    let extent = if horizontal { w } else { h };
                    let position = if dx < 0 || dy < 0 { total - along - extent } else { along };
                    along += extent;
                    if horizontal { Point::new(position, 0.0) } else { Point::new(0.0, position) }
                };
                WorldCanvas {
                    id: canvas.id.clone(),
                    width: canvas.width,
                    height: canvas.height,
                    offset,
                    scale,
                    layers: canvas.items.iter().cloned().map(Layer::new).collect(),
                }
            })
            .collect();

        log::debug!(
            "Built world of {} canvases ({:?}, overlay: {})",
            canvases.len(),
            options.direction,
            options.overlay
        );

        Self {
            canvases: placed,
            options,
        }
    }

    /// World of every canvas of a manifest in its viewing direction.
    pub fn from_manifest(manifest: &Manifest) -> Self {
        Self::new(
            &manifest.items,
            WorldOptions {
                direction: manifest.viewing_direction,
                overlay: false,
            },
        )
    }

    pub fn options(&self) -> WorldOptions {
        self.options
    }

    pub fn canvases(&self) -> &[WorldCanvas] {
        &self.canvases
    }

    pub fn is_empty(&self) -> bool {
        self.canvases.is_empty()
    }

    pub fn canvas(&self, canvas_id: &str) -> Option<&WorldCanvas> {
        self.canvases.iter().find(|canvas| canvas.id == canvas_id)
    }

    /// Canvas under a world point. Points outside every canvas are normal
    /// during interaction and yield `None`. With overlay the topmost
    /// (last) canvas wins.
    pub fn canvas_at_point(&self, point: Point) -> Option<&WorldCanvas> {
        let hit = |canvas: &&WorldCanvas| !canvas.is_degenerate() && canvas.rect().contains(point);
        if self.options.overlay {
            self.canvases.iter().rev().find(hit)
        } else {
            self.canvases.iter().find(hit)
        }
    }

    /// Top-left corner of a canvas in world coordinates.
    pub fn canvas_to_world_coordinates(&self, canvas_id: &str) -> Option<Point> {
        self.canvas(canvas_id).map(|canvas| canvas.offset)
    }

    pub fn canvas_rect(&self, canvas_id: &str) -> Option<Rect> {
        self.canvas(canvas_id).map(WorldCanvas::rect)
    }

    pub fn canvas_to_world(&self, canvas_id: &str, local: Point) -> Option<Point> {
        self.canvas(canvas_id).map(|canvas| canvas.to_world(local))
    }

    pub fn world_to_canvas(&self, canvas_id: &str, world: Point) -> Option<Point> {
        self.canvas(canvas_id)?.to_local(world)
    }

    /// Canvas and layer painting the given image resource.
    pub fn content_resource(&self, resource_id: &str) -> Option<(&WorldCanvas, &Layer)> {
        self.canvases.iter().find_map(|canvas| {
            canvas
                .layers
                .iter()
                .find(|layer| layer.resource.id == resource_id)
                .map(|layer| (canvas, layer))
        })
    }

    /// Where an image resource lands in the world: its target fragment if
    /// it has one, otherwise the whole canvas.
    pub fn content_resource_to_world_coordinates(&self, resource_id: &str) -> Option<Rect> {
        let (canvas, layer) = self.content_resource(resource_id)?;
        match layer.resource.target_fragment() {
            Some(fragment) => {
                let origin = canvas.to_world(fragment.origin());
                Some(Rect::new(
                    origin.x,
                    origin.y,
                    fragment.width * canvas.scale,
                    fragment.height * canvas.scale,
                ))
            }
            None => Some(canvas.rect()),
        }
    }

    /// Paint index of an image resource within its canvas (higher is on top).
    pub fn layer_index_of_image_resource(&self, resource_id: &str) -> Option<usize> {
        self.canvases
            .iter()
            .find_map(|canvas| canvas.layer_position(resource_id))
    }

    /// Effective opacity; unknown resources render fully opaque.
    pub fn layer_opacity_of_image_resource(&self, resource_id: &str) -> f64 {
        self.content_resource(resource_id)
            .map(|(_, layer)| layer.effective_opacity())
            .unwrap_or(1.0)
    }

    /// Bounding box of all canvases, used to fit the initial view.
    pub fn world_bounds(&self) -> Rect {
        self.canvases
            .iter()
            .filter(|canvas| !canvas.is_degenerate())
            .map(WorldCanvas::rect)
            .reduce(|acc, rect| acc.union(&rect))
            .unwrap_or_default()
    }

    /// Every image resource of the world, bottom-most first: canvases in
    /// sequence, layers in index order within each canvas.
    pub fn paint_order(&self) -> Vec<&str> {
        self.canvases
            .iter()
            .flat_map(|canvas| canvas.layers.iter().map(|layer| layer.resource.id.as_str()))
            .collect()
    }

    /// Apply an index/opacity/visibility change to one layer in place.
    ///
    /// Moving a layer shifts its siblings, so indices stay unique.
    pub fn update_layer(&mut self, canvas_id: &str, resource_id: &str, update: LayerUpdate) -> Result<()> {
        let canvas = self
            .canvases
            .iter_mut()
            .find(|canvas| canvas.id == canvas_id)
            .ok_or_else(|| ViewerError::unknown_canvas(canvas_id))?;

        let Some(position) = canvas.layer_position(resource_id) else {
            log::warn!("No layer '{}' on canvas '{}'", resource_id, canvas_id);
            return Ok(());
        };

        let layer = &mut canvas.layers[position];
        match update.opacity {
            Some(opacity) if opacity.is_finite() => layer.opacity = opacity.clamp(0.0, 1.0),
            Some(opacity) => log::warn!("Ignoring opacity {} for layer '{}'", opacity, resource_id),
            None => {}
        }
        if let Some(visible) = update.visible {
            layer.visible = visible;
        }

        if let Some(index) = update.index {
            let index = index.min(canvas.layers.len() - 1);
            if index != position {
                let layer = canvas.layers.remove(position);
                canvas.layers.insert(index, layer);
            }
        }
        Ok(())
    }
}
