//! Point-in-annotation testing.
//!
//! Points arrive in world coordinates and are converted to canvas-local
//! pixels before being tested against selectors. When a click lands on
//! several annotations, the one covering more of the click's neighborhood
//! wins; see [`locality_score`].

use std::collections::BTreeSet;

use iiif_resource::{Point, Rect};

use super::model::{AnnotationId, AnnotationLayers, AnnotationResource, Selector};
use crate::constants;
use crate::world::{CanvasWorld, WorldCanvas};

/// Disambiguation tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct HitTestOptions {
    /// Neighborhood radii, tried in order until the best two scores differ.
    pub radii: Vec<f64>,
    /// Sampling grid spacing.
    pub sample_step: f64,
}

impl Default for HitTestOptions {
    fn default() -> Self {
        Self {
            radii: constants::hit_test::ESCALATION_RADII.to_vec(),
            sample_step: constants::hit_test::SAMPLE_STEP,
        }
    }
}

/// Hit tester over one world snapshot and its annotation layers.
#[derive(Debug, Clone, Copy)]
pub struct HitTester<'a> {
    world: &'a CanvasWorld,
    layers: &'a AnnotationLayers,
    options: &'a HitTestOptions,
}

impl<'a> HitTester<'a> {
    pub fn new(world: &'a CanvasWorld, layers: &'a AnnotationLayers, options: &'a HitTestOptions) -> Self {
        Self {
            world,
            layers,
            options,
        }
    }

    /// Every annotation on `canvas` whose selector contains the world
    /// point, in list order.
    pub fn hit_test(&self, canvas: &WorldCanvas, point: Point) -> Vec<&'a AnnotationResource> {
        let Some(local) = canvas.to_local(point) else {
            return Vec::new();
        };
        let layers: &'a AnnotationLayers = self.layers;
        layers
            .iter()
            .filter(|(_, resource)| resource.target_id == canvas.id && resource.contains(local))
            .map(|(_, resource)| resource)
            .collect()
    }

    /// Ids of the annotations under the point, for hover highlighting.
    pub fn hover_test(&self, canvas: &WorldCanvas, point: Point) -> BTreeSet<AnnotationId> {
        self.hit_test(canvas, point)
            .into_iter()
            .map(|resource| resource.id.clone())
            .collect()
    }

    /// The single annotation a click at `point` selects.
    pub fn select(&self, canvas: &WorldCanvas, point: Point) -> Option<&'a AnnotationResource> {
        let candidates = self.hit_test(canvas, point);
        let local = canvas.to_local(point)?;
        disambiguate(&candidates, local, self.options)
    }

    /// Locate the canvas under a world point and select on it.
    pub fn select_at(&self, point: Point) -> Option<(&'a WorldCanvas, &'a AnnotationResource)> {
        let canvas = self.world.canvas_at_point(point)?;
        self.select(canvas, point).map(|resource| (canvas, resource))
    }

    /// Hover ids at a world point; empty outside every canvas.
    pub fn hover_at(&self, point: Point) -> BTreeSet<AnnotationId> {
        match self.world.canvas_at_point(point) {
            Some(canvas) => self.hover_test(canvas, point),
            None => BTreeSet::new(),
        }
    }
}

/// Pick one candidate by escalating locality scores.
///
/// Ties at every radius resolve to the first candidate in list order.
pub fn disambiguate<'r>(
    candidates: &[&'r AnnotationResource],
    local: Point,
    options: &HitTestOptions,
) -> Option<&'r AnnotationResource> {
    let first = *candidates.first()?;
    if candidates.len() == 1 {
        return Some(first);
    }

    for &radius in &options.radii {
        let mut scored: Vec<(usize, &AnnotationResource)> = candidates
            .iter()
            .map(|resource| {
                let score = resource
                    .selector
                    .as_ref()
                    .map_or(0, |selector| locality_score(selector, local, radius, options.sample_step));
                (score, *resource)
            })
            .collect();
        // Stable, so equal scores keep list order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        log::trace!(
            "Locality at radius {}: {:?}",
            radius,
            scored.iter().map(|(score, r)| (r.id.as_str(), *score)).collect::<Vec<_>>()
        );

        if scored[0].0 != scored[1].0 {
            return Some(scored[0].1);
        }
    }

    log::debug!("Locality tied at every radius, selecting '{}'", first.id);
    Some(first)
}

/// Number of grid points within the square of half-size `radius` around
/// `center` that fall inside the selector. The grid is anchored on
/// `center` with spacing `step`.
pub fn locality_score(selector: &Selector, center: Point, radius: f64, step: f64) -> usize {
    if !step.is_finite() || step <= 0.0 || radius.is_nan() || radius < 0.0 {
        return 0;
    }
    let Some(bounds) = selector.bounds() else {
        return 0;
    };
    let Some(region) = Rect::around(center, radius).intersection(&bounds) else {
        return 0;
    };

    let n = (radius / step).floor() as i64;
    // One step of margin; exact membership is decided per point.
    let range = |lo: f64, hi: f64, origin: f64| {
        let start = (((lo - origin) / step).floor() as i64 - 1).max(-n);
        let end = (((hi - origin) / step).ceil() as i64 + 1).min(n);
        start..=end
    };
    let xs = range(region.x, region.right(), center.x);
    let ys = range(region.y, region.bottom(), center.y);

    let mut count = 0;
    for j in ys {
        let y = center.y + j as f64 * step;
        for i in xs.clone() {
            let x = center.x + i as f64 * step;
            if selector.contains(Point::new(x, y)) {
                count += 1;
            }
        }
    }
    count
}

/// Remembers the hovered set and reports only changes.
#[derive(Debug, Clone, Default)]
pub struct HoverTracker {
    current: BTreeSet<AnnotationId>,
}

impl HoverTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &BTreeSet<AnnotationId> {
        &self.current
    }

    /// Returns the new set if it differs from the previous one.
    pub fn update(&mut self, ids: BTreeSet<AnnotationId>) -> Option<BTreeSet<AnnotationId>> {
        if self.current.symmetric_difference(&ids).next().is_none() {
            return None;
        }
        self.current = ids;
        Some(self.current.clone())
    }

    /// Pointer left every canvas.
    pub fn clear(&mut self) -> Option<BTreeSet<AnnotationId>> {
        self.update(BTreeSet::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationList, SvgShape};
    use crate::world::WorldOptions;
    use iiif_resource::Canvas;

    fn rect(id: &str, canvas: &str, x: f64, y: f64, w: f64, h: f64) -> AnnotationResource {
        AnnotationResource::new(id, canvas, Selector::Fragment(Rect::new(x, y, w, h)))
    }

    fn world() -> CanvasWorld {
        CanvasWorld::new(
            &[Canvas::new("c1", 1000, 1000), Canvas::new("c2", 1000, 1000)],
            WorldOptions::default(),
        )
    }

    fn layers(resources: Vec<AnnotationResource>) -> AnnotationLayers {
        AnnotationLayers::new(vec![AnnotationList::new("list", resources)], Vec::new())
    }

    fn ids(found: &[&AnnotationResource]) -> Vec<String> {
        found.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_rectangle_containment_is_inclusive() {
        let world = world();
        let layers = layers(vec![rect("a", "c1", 10.0, 20.0, 30.0, 40.0)]);
        let options = HitTestOptions::default();
        let tester = HitTester::new(&world, &layers, &options);
        let canvas = world.canvas("c1").unwrap();

        for (x, y, expected) in [
            (10.0, 20.0, true),
            (40.0, 60.0, true),
            (25.0, 40.0, true),
            (9.999, 40.0, false),
            (40.001, 40.0, false),
            (25.0, 60.5, false),
        ] {
            let hits = tester.hit_test(canvas, Point::new(x, y));
            assert_eq!(!hits.is_empty(), expected, "point ({}, {})", x, y);
        }
    }

    #[test]
    fn test_hits_outlive_the_canvas_borrow() {
        let world = world();
        let layers = layers(vec![rect("a", "c1", 0.0, 0.0, 10.0, 10.0)]);
        let options = HitTestOptions::default();
        let tester = HitTester::new(&world, &layers, &options);

        let hits = {
            let canvas = world.canvas("c1").unwrap().clone();
            tester.hit_test(&canvas, Point::new(5.0, 5.0))
        };
        assert_eq!(ids(&hits), vec!["a"]);
    }

    #[test]
    fn test_hit_test_subtracts_canvas_offset() {
        let world = world();
        let layers = layers(vec![
            rect("on-c1", "c1", 0.0, 0.0, 100.0, 100.0),
            rect("on-c2", "c2", 0.0, 0.0, 100.0, 100.0),
        ]);
        let options = HitTestOptions::default();
        let tester = HitTester::new(&world, &layers, &options);

        // c2 starts at world x = 1000.
        let canvas = world.canvas("c2").unwrap();
        assert_eq!(ids(&tester.hit_test(canvas, Point::new(1050.0, 50.0))), vec!["on-c2"]);
        assert!(tester.hit_test(canvas, Point::new(1150.0, 50.0)).is_empty());
    }

    #[test]
    fn test_hit_test_includes_search_results() {
        let world = world();
        let layers = AnnotationLayers::new(
            vec![AnnotationList::new("l", vec![rect("std", "c1", 0.0, 0.0, 10.0, 10.0)])],
            vec![AnnotationList::new("s", vec![rect("hit", "c1", 0.0, 0.0, 10.0, 10.0)])],
        );
        let options = HitTestOptions::default();
        let tester = HitTester::new(&world, &layers, &options);
        let canvas = world.canvas("c1").unwrap();
        assert_eq!(ids(&tester.hit_test(canvas, Point::new(5.0, 5.0))), vec!["std", "hit"]);
    }

    #[test]
    fn test_svg_selector_hit() {
        let world = world();
        let triangle = SvgShape::parse("M0,0 L200,0 L0,200 Z").unwrap();
        let layers = layers(vec![AnnotationResource::new("tri", "c1", Selector::Svg(triangle))]);
        let options = HitTestOptions::default();
        let tester = HitTester::new(&world, &layers, &options);
        let canvas = world.canvas("c1").unwrap();

        assert_eq!(tester.hover_test(canvas, Point::new(20.0, 20.0)).len(), 1);
        assert!(tester.hover_test(canvas, Point::new(150.0, 150.0)).is_empty());
    }

    #[test]
    fn test_select_prefers_more_local_candidate() {
        let world = world();
        let layers = layers(vec![
            rect("right", "c1", 90.0, 0.0, 100.0, 100.0),
            rect("left", "c1", 0.0, 0.0, 100.0, 100.0),
        ]);
        let options = HitTestOptions::default();
        let tester = HitTester::new(&world, &layers, &options);
        let canvas = world.canvas("c1").unwrap();

        let selected = tester.select(canvas, Point::new(92.0, 50.0)).unwrap();
        assert_eq!(selected.id, "left");
    }

    #[test]
    fn test_select_escalates_radius_on_tie() {
        let a = rect("a", "c1", 0.0, 0.0, 100.0, 100.0);
        let b = rect("b", "c1", 100.0, 0.0, 300.0, 100.0);
        let click = Point::new(100.0, 50.0);

        let score = |r: &AnnotationResource, radius| locality_score(r.selector.as_ref().unwrap(), click, radius, 1.0);
        assert_eq!(score(&a, 50.0), score(&b, 50.0));
        assert!(score(&b, 150.0) > score(&a, 150.0));

        let options = HitTestOptions::default();
        assert_eq!(disambiguate(&[&a, &b], click, &options).unwrap().id, "b");
    }

    #[test]
    fn test_full_tie_is_deterministic() {
        let a = rect("a", "c1", 0.0, 0.0, 100.0, 100.0);
        let b = rect("b", "c1", 0.0, 0.0, 100.0, 100.0);
        let click = Point::new(50.0, 50.0);
        let options = HitTestOptions::default();

        for _ in 0..3 {
            assert_eq!(disambiguate(&[&a, &b], click, &options).unwrap().id, "a");
            assert_eq!(disambiguate(&[&b, &a], click, &options).unwrap().id, "b");
        }
    }

    #[test]
    fn test_locality_score_counts_grid_points() {
        let selector = Selector::Fragment(Rect::new(0.0, 0.0, 10.0, 10.0));
        // Whole rectangle within the neighborhood: 11 x 11 grid points.
        assert_eq!(locality_score(&selector, Point::new(5.0, 5.0), 50.0, 1.0), 121);
        // Neighborhood clipped at radius 2: 5 x 5.
        assert_eq!(locality_score(&selector, Point::new(5.0, 5.0), 2.0, 1.0), 25);
        assert_eq!(locality_score(&selector, Point::new(500.0, 500.0), 50.0, 1.0), 0);
    }

    #[test]
    fn test_select_at_outside_canvases() {
        let world = world();
        let layers = layers(vec![rect("a", "c1", 0.0, 0.0, 10.0, 10.0)]);
        let options = HitTestOptions::default();
        let tester = HitTester::new(&world, &layers, &options);

        assert!(tester.select_at(Point::new(-10.0, 5.0)).is_none());
        assert!(tester.hover_at(Point::new(5.0, 5000.0)).is_empty());
        let (canvas, resource) = tester.select_at(Point::new(5.0, 5.0)).unwrap();
        assert_eq!((canvas.id.as_str(), resource.id.as_str()), ("c1", "a"));
    }

    #[test]
    fn test_hover_tracker_reports_changes_only() {
        let mut tracker = HoverTracker::new();
        let set: BTreeSet<AnnotationId> = ["a".to_string(), "b".to_string()].into_iter().collect();

        assert_eq!(tracker.update(set.clone()), Some(set.clone()));
        assert_eq!(tracker.update(set.clone()), None);

        let reordered: BTreeSet<AnnotationId> = ["b".to_string(), "a".to_string()].into_iter().collect();
        assert_eq!(tracker.update(reordered), None);

        assert_eq!(tracker.clear(), Some(BTreeSet::new()));
        assert_eq!(tracker.clear(), None);
    }
}
