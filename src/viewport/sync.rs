//! Bidirectional viewport synchronization.
//!
//! The external viewer animates its own copy of the viewport. Application
//! state follows it when an animation finishes (and on idle updates), and
//! the viewer follows application state when it changes explicitly. While
//! the viewer is animating it is the source of truth and application
//! requests are dropped.

use serde::{Deserialize, Serialize};

const ZOOM_EPSILON: f64 = 1e-9;

/// Viewport center and zoom in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewportState {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl ViewportState {
    pub fn new(x: f64, y: f64, zoom: f64) -> Self {
        Self { x, y, zoom }
    }

    /// Position snapped to whole world units; zoom untouched.
    pub fn rounded(&self) -> Self {
        Self::new(self.x.round(), self.y.round(), self.zoom)
    }
}

/// Who currently owns the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Idle,
    /// The viewer is running its own animation.
    Animating,
}

/// What the viewer must do to catch up with application state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportRequest {
    PanTo { x: f64, y: f64, immediate: bool },
    ZoomTo { zoom: f64, immediate: bool },
}

#[derive(Debug, Clone, Default)]
pub struct ViewportSyncController {
    phase: SyncPhase,
    /// Latest pose reported by the viewer, full precision.
    pose: Option<ViewportState>,
    /// Last state handed to the application.
    emitted: Option<ViewportState>,
}

impl ViewportSyncController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn pose(&self) -> Option<ViewportState> {
        self.pose
    }

    pub fn animation_start(&mut self) {
        if self.phase != SyncPhase::Animating {
            log::debug!("Viewport sync: Idle -> Animating");
        }
        self.phase = SyncPhase::Animating;
    }

    /// The viewer finished animating: adopt its final pose.
    pub fn apply_external_change(&mut self, raw: ViewportState) -> ViewportState {
        if self.phase == SyncPhase::Animating {
            log::debug!("Viewport sync: Animating -> Idle");
        }
        self.phase = SyncPhase::Idle;
        self.pose = Some(raw);
        let state = raw.rounded();
        self.emitted = Some(state);
        state
    }

    /// Continuous pose update. Reconciles only while idle, and only when the
    /// rounded state actually changed.
    pub fn viewport_updated(&mut self, raw: ViewportState) -> Option<ViewportState> {
        self.pose = Some(raw);
        if self.phase == SyncPhase::Animating {
            return None;
        }
        let state = raw.rounded();
        if self.emitted == Some(state) {
            return None;
        }
        self.emitted = Some(state);
        Some(state)
    }

    /// Application state changed; compute what the viewer has to do.
    pub fn request_external_change(&mut self, state: ViewportState, immediate: bool) -> Vec<ViewportRequest> {
        if self.phase == SyncPhase::Animating {
            log::debug!("Viewport request suppressed during animation");
            return Vec::new();
        }

        let target = state.rounded();
        self.emitted = Some(target);

        let mut requests = Vec::new();
        let current = self.pose.map(|pose| pose.rounded());
        if current.is_none_or(|pose| pose.x != target.x || pose.y != target.y) {
            requests.push(ViewportRequest::PanTo {
                x: target.x,
                y: target.y,
                immediate,
            });
        }
        if current.is_none_or(|pose| (pose.zoom - target.zoom).abs() > ZOOM_EPSILON) {
            requests.push(ViewportRequest::ZoomTo {
                zoom: target.zoom,
                immediate,
            });
        }
        requests
    }
}
