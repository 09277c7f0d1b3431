//! Screen/world transform.
//!
//! The viewport is described by the world point at the center of the
//! container and a zoom factor in screen pixels per world unit:
//!
//! ```text
//! world = center + (pixel - container / 2) / zoom
//! ```

use iiif_resource::{Point, Rect, Size};

use super::sync::ViewportState;
use crate::constants;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenTransform {
    /// World point shown at the container center.
    pub center: Point,
    /// Screen pixels per world unit.
    pub zoom: f64,
    /// Container size in screen pixels.
    pub container: Size,
}

impl ScreenTransform {
    pub fn new(center: Point, zoom: f64, container: Size) -> Self {
        Self {
            center,
            zoom: clamp_zoom(zoom),
            container,
        }
    }

    /// Pose reported by the viewer, taken as-is. Zoom bounds only apply
    /// to zooms the application initiates. `None` for a zoom that is not
    /// finite and positive.
    pub fn from_state(state: ViewportState, container: Size) -> Option<Self> {
        if !state.zoom.is_finite() || state.zoom <= 0.0 {
            return None;
        }
        Some(Self {
            center: Point::new(state.x, state.y),
            zoom: state.zoom,
            container,
        })
    }

    pub fn state(&self) -> ViewportState {
        ViewportState::new(self.center.x, self.center.y, self.zoom)
    }

    fn half_container(&self) -> Point {
        Point::new(self.container.width / 2.0, self.container.height / 2.0)
    }

    /// Screen pixel to world coordinates.
    pub fn pixel_to_world(&self, pixel: Point) -> Point {
        let rel = pixel.offset_from(self.half_container());
        Point::new(self.center.x + rel.x / self.zoom, self.center.y + rel.y / self.zoom)
    }

    /// World coordinates to screen pixel.
    pub fn world_to_pixel(&self, world: Point) -> Point {
        let half = self.half_container();
        let rel = world.offset_from(self.center);
        Point::new(half.x + rel.x * self.zoom, half.y + rel.y * self.zoom)
    }

    /// Part of the world currently visible.
    pub fn visible_world_rect(&self) -> Rect {
        let top_left = self.pixel_to_world(Point::default());
        Rect::new(
            top_left.x,
            top_left.y,
            self.container.width / self.zoom,
            self.container.height / self.zoom,
        )
    }

    /// Zoom so that the world point under `cursor` stays under it.
    pub fn zoom_to_cursor(&self, new_zoom: f64, cursor: Point) -> ScreenTransform {
        let new_zoom = clamp_zoom(new_zoom);
        let anchor = self.pixel_to_world(cursor);
        let rel = cursor.offset_from(self.half_container());
        ScreenTransform {
            center: Point::new(anchor.x - rel.x / new_zoom, anchor.y - rel.y / new_zoom),
            zoom: new_zoom,
            container: self.container,
        }
    }

    /// Drag the content by a screen-space delta.
    pub fn pan_by(&self, dx: f64, dy: f64) -> ScreenTransform {
        ScreenTransform {
            center: Point::new(self.center.x - dx / self.zoom, self.center.y - dy / self.zoom),
            ..*self
        }
    }

    /// Zoom in by a factor (e.g., 1.2 for 20% zoom in), keeping the center.
    pub fn zoom_in(&self, factor: f64) -> ScreenTransform {
        ScreenTransform {
            zoom: clamp_zoom(self.zoom * factor),
            ..*self
        }
    }

    /// Zoom out by a factor, keeping the center.
    pub fn zoom_out(&self, factor: f64) -> ScreenTransform {
        ScreenTransform {
            zoom: clamp_zoom(self.zoom / factor),
            ..*self
        }
    }

    /// Center `bounds` and zoom so it fits entirely in the container.
    pub fn fit_bounds(bounds: Rect, container: Size) -> ScreenTransform {
        let zoom = if bounds.width > 0.0 && bounds.height > 0.0 {
            (container.width / bounds.width).min(container.height / bounds.height)
        } else {
            1.0
        };
        ScreenTransform::new(bounds.center(), zoom, container)
    }

    pub fn resize(&self, container: Size) -> ScreenTransform {
        ScreenTransform { container, ..*self }
    }
}

impl Default for ScreenTransform {
    fn default() -> Self {
        Self::new(Point::default(), 1.0, Size::default())
    }
}

fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_finite() && zoom > 0.0 {
        zoom.clamp(constants::zoom::MIN, constants::zoom::MAX)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn transform() -> ScreenTransform {
        ScreenTransform::new(Point::new(500.0, 300.0), 0.5, Size::new(800.0, 600.0))
    }

    #[test]
    fn test_center_pixel_maps_to_center() {
        let t = transform();
        assert_eq!(t.pixel_to_world(Point::new(400.0, 300.0)), Point::new(500.0, 300.0));
        assert_eq!(t.pixel_to_world(Point::new(0.0, 0.0)), Point::new(-300.0, -300.0));
    }

    #[test]
    fn test_pixel_world_round_trip() {
        let t = transform();
        for pixel in [Point::new(0.0, 0.0), Point::new(123.5, 456.25), Point::new(800.0, 600.0)] {
            let back = t.world_to_pixel(t.pixel_to_world(pixel));
            assert!(approx_eq(back.x, pixel.x) && approx_eq(back.y, pixel.y));
        }
    }

    #[test]
    fn test_zoom_to_cursor_at_center() {
        let t = transform();
        let zoomed = t.zoom_to_cursor(2.0, Point::new(400.0, 300.0));
        assert_eq!(zoomed.zoom, 2.0);
        assert!(approx_eq(zoomed.center.x, 500.0) && approx_eq(zoomed.center.y, 300.0));
    }

    #[test]
    fn test_zoom_to_cursor_preserves_cursor_point() {
        let t = transform();
        let cursor = Point::new(650.0, 120.0);
        let before = t.pixel_to_world(cursor);
        let after = t.zoom_to_cursor(3.0, cursor).pixel_to_world(cursor);
        assert!(approx_eq(before.x, after.x));
        assert!(approx_eq(before.y, after.y));
    }

    #[test]
    fn test_pan_by_moves_content_with_drag() {
        let t = transform();
        let world = Point::new(600.0, 400.0);
        let pixel = t.world_to_pixel(world);
        let panned = t.pan_by(10.0, -20.0);
        let moved = panned.world_to_pixel(world);

        assert_eq!(panned.zoom, t.zoom);
        assert!(approx_eq(moved.x, pixel.x + 10.0));
        assert!(approx_eq(moved.y, pixel.y - 20.0));
    }

    #[test]
    fn test_zoom_is_clamped() {
        let t = transform();
        assert_eq!(t.zoom_in(1e6).zoom, constants::zoom::MAX);
        assert_eq!(t.zoom_out(1e9).zoom, constants::zoom::MIN);
        assert_eq!(ScreenTransform::new(Point::default(), f64::NAN, Size::default()).zoom, 1.0);
        assert!(approx_eq(t.zoom_in(1.5).zoom_out(1.5).zoom, t.zoom));
    }

    #[test]
    fn test_fit_bounds_shows_whole_world() {
        let bounds = Rect::new(0.0, 0.0, 2000.0, 1000.0);
        let t = ScreenTransform::fit_bounds(bounds, Size::new(800.0, 600.0));

        assert!(approx_eq(t.zoom, 0.4));
        assert_eq!(t.center, Point::new(1000.0, 500.0));
        let visible = t.visible_world_rect();
        let slack = 1e-6;
        assert!(visible.x <= bounds.x + slack && visible.right() >= bounds.right() - slack);
        assert!(visible.y <= bounds.y + slack && visible.bottom() >= bounds.bottom() - slack);
    }

    #[test]
    fn test_state_round_trip() {
        let t = transform();
        assert_eq!(ScreenTransform::from_state(t.state(), t.container), Some(t));
    }

    #[test]
    fn test_reported_zoom_is_not_clamped() {
        let container = Size::new(800.0, 600.0);
        let t = ScreenTransform::from_state(ViewportState::new(0.0, 0.0, 128.0), container).unwrap();
        assert_eq!(t.zoom, 128.0);
        assert!(approx_eq(t.pixel_to_world(Point::new(528.0, 300.0)).x, 1.0));

        let t = ScreenTransform::from_state(ViewportState::new(0.0, 0.0, 0.0001), container).unwrap();
        assert_eq!(t.zoom, 0.0001);

        for zoom in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            assert!(ScreenTransform::from_state(ViewportState::new(0.0, 0.0, zoom), container).is_none());
        }
        // Application zooms from a deep pose are still bounded.
        let deep = ScreenTransform::from_state(ViewportState::new(0.0, 0.0, 128.0), container).unwrap();
        assert_eq!(deep.zoom_in(1.2).zoom, constants::zoom::MAX);
    }
}
