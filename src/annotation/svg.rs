//! SVG selector geometry.
//!
//! SVG selectors are parsed with usvg and flattened into polygons. Path
//! coordinates are canvas-local pixels; element transforms are not applied.

use iiif_resource::{Point, Rect};
use resvg::tiny_skia::PathSegment;
use resvg::usvg;

use crate::error::{Result, ViewerError};

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Line segments used to approximate one curve.
const CURVE_SEGMENTS: usize = 16;

/// A filled region made of one or more closed subpaths.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SvgShape {
    subpaths: Vec<Vec<Point>>,
    bounds: Option<Rect>,
}

impl SvgShape {
    /// A shape that contains nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a shape from already flattened subpaths.
    pub fn from_subpaths(subpaths: Vec<Vec<Point>>) -> Self {
        let subpaths: Vec<Vec<Point>> = subpaths.into_iter().filter(|s| s.len() >= 3).collect();
        let bounds = subpaths
            .iter()
            .flatten()
            .map(|p| Rect::new(p.x, p.y, 0.0, 0.0))
            .reduce(|acc, r| acc.union(&r));
        Self { subpaths, bounds }
    }

    /// Parse an SVG document, or bare path data.
    pub fn parse(source: &str) -> Result<Self> {
        let document = normalize_document(source);
        let tree = usvg::Tree::from_str(&document, &usvg::Options::default())
            .map_err(|e| ViewerError::invalid_annotation(format!("invalid SVG selector: {}", e)))?;

        let mut subpaths = Vec::new();
        collect_group(tree.root(), &mut subpaths);
        Ok(Self::from_subpaths(subpaths))
    }

    /// Like [`SvgShape::parse`], but an unparseable selector becomes an
    /// empty shape that never hits.
    pub fn parse_lossy(annotation_id: &str, source: &str) -> Self {
        Self::parse(source).unwrap_or_else(|e| {
            log::warn!("Annotation '{}': {}", annotation_id, e);
            Self::empty()
        })
    }

    pub fn is_empty(&self) -> bool {
        self.subpaths.is_empty()
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    pub fn subpaths(&self) -> &[Vec<Point>] {
        &self.subpaths
    }

    /// Even-odd containment over all subpaths.
    pub fn contains(&self, point: Point) -> bool {
        match self.bounds {
            Some(bounds) if bounds.contains(point) => {}
            _ => return false,
        }

        let mut inside = false;
        for vertices in &self.subpaths {
            let mut j = vertices.len() - 1;
            for i in 0..vertices.len() {
                let (a, b) = (vertices[i], vertices[j]);
                if (a.y > point.y) != (b.y > point.y)
                    && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
                {
                    inside = !inside;
                }
                j = i;
            }
        }
        inside
    }
}

/// Wrap bare path data and add a missing namespace so usvg accepts it.
fn normalize_document(source: &str) -> String {
    let trimmed = source.trim();
    if !trimmed.starts_with('<') {
        return format!(
            "<svg xmlns=\"{}\"><path d=\"{}\"/></svg>",
            SVG_NAMESPACE,
            trimmed.replace('"', "'")
        );
    }
    if !trimmed.contains("xmlns=") {
        return trimmed.replacen("<svg", &format!("<svg xmlns=\"{}\"", SVG_NAMESPACE), 1);
    }
    trimmed.to_string()
}

fn collect_group(group: &usvg::Group, out: &mut Vec<Vec<Point>>) {
    for node in group.children() {
        match node {
            usvg::Node::Group(group) => collect_group(group, out),
            usvg::Node::Path(path) => flatten_path(path.data(), out),
            _ => {}
        }
    }
}

fn flatten_path(data: &resvg::tiny_skia::Path, out: &mut Vec<Vec<Point>>) {
    let mut current: Vec<Point> = Vec::new();
    let mut last = Point::default();

    for segment in data.segments() {
        match segment {
            PathSegment::MoveTo(p) => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
                last = Point::new(p.x as f64, p.y as f64);
                current.push(last);
            }
            PathSegment::LineTo(p) => {
                last = Point::new(p.x as f64, p.y as f64);
                current.push(last);
            }
            PathSegment::QuadTo(c, p) => {
                let (c, end) = (Point::new(c.x as f64, c.y as f64), Point::new(p.x as f64, p.y as f64));
                for step in 1..=CURVE_SEGMENTS {
                    let t = step as f64 / CURVE_SEGMENTS as f64;
                    let u = 1.0 - t;
                    current.push(Point::new(
                        u * u * last.x + 2.0 * u * t * c.x + t * t * end.x,
                        u * u * last.y + 2.0 * u * t * c.y + t * t * end.y,
                    ));
                }
                last = end;
            }
            PathSegment::CubicTo(c1, c2, p) => {
                let c1 = Point::new(c1.x as f64, c1.y as f64);
                let c2 = Point::new(c2.x as f64, c2.y as f64);
                let end = Point::new(p.x as f64, p.y as f64);
                for step in 1..=CURVE_SEGMENTS {
                    let t = step as f64 / CURVE_SEGMENTS as f64;
                    let u = 1.0 - t;
                    let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
                    current.push(Point::new(
                        a * last.x + b * c1.x + c * c2.x + d * end.x,
                        a * last.y + b * c1.y + c * c2.y + d * end.y,
                    ));
                }
                last = end;
            }
            // Every subpath is treated as closed anyway.
            PathSegment::Close => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
}
