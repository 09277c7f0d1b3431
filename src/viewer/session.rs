//! One viewer window.
//!
//! The session is driven entirely by [`ViewerEvent`]s and a clock passed in
//! by the caller. It never talks to the viewer or the application directly:
//! commands and notifications are queued and drained by the host.

use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;

use iiif_resource::Point;
use web_time::Instant;

use super::events::{Notification, ViewerCommand, ViewerEvent};
use super::loader::{ImageSourceBarrier, LoadOutcome, Settlement};
use crate::annotation::{AnnotationId, AnnotationLayers, HitTestOptions, HitTester, HoverTracker};
use crate::config::ViewerConfig;
use crate::error::Result;
use crate::viewport::{Coalescer, ScreenTransform, SyncPhase, ViewportRequest, ViewportState, ViewportSyncController};
use crate::world::{CanvasWorld, LayerUpdate};

pub struct ViewerSession {
    window_id: String,
    world: Rc<CanvasWorld>,
    annotations: Rc<AnnotationLayers>,
    hit_test: HitTestOptions,
    transform: ScreenTransform,
    sync: ViewportSyncController,
    hover: HoverTracker,
    barrier: ImageSourceBarrier,
    /// Item order and opacity the viewer was last told about.
    viewer_items: Vec<(String, f64)>,
    hover_out: Coalescer<BTreeSet<AnnotationId>>,
    viewport_out: Coalescer<ViewportState>,
    redraw: Coalescer<()>,
    commands: VecDeque<ViewerCommand>,
    notifications: VecDeque<Notification>,
}

impl ViewerSession {
    pub fn new(window_id: impl Into<String>, config: &ViewerConfig) -> Self {
        Self {
            window_id: window_id.into(),
            world: Rc::new(CanvasWorld::default()),
            annotations: Rc::new(AnnotationLayers::default()),
            hit_test: config.hit_test_options(),
            transform: ScreenTransform::default(),
            sync: ViewportSyncController::new(),
            hover: HoverTracker::new(),
            barrier: ImageSourceBarrier::new(),
            viewer_items: Vec::new(),
            hover_out: Coalescer::new(config.timing.hover_debounce()),
            viewport_out: Coalescer::new(config.timing.viewport_debounce()),
            redraw: Coalescer::new(config.timing.redraw_debounce()),
            commands: VecDeque::new(),
            notifications: VecDeque::new(),
        }
    }

    pub fn window_id(&self) -> &str {
        &self.window_id
    }

    /// Current world snapshot.
    pub fn world(&self) -> Rc<CanvasWorld> {
        Rc::clone(&self.world)
    }

    pub fn annotations(&self) -> Rc<AnnotationLayers> {
        Rc::clone(&self.annotations)
    }

    pub fn transform(&self) -> ScreenTransform {
        self.transform
    }

    pub fn sync_phase(&self) -> SyncPhase {
        self.sync.phase()
    }

    pub fn hovered(&self) -> &BTreeSet<AnnotationId> {
        self.hover.current()
    }

    /// Replace the world and reload every image source.
    pub fn load_world(&mut self, world: CanvasWorld) {
        let canvases_changed = !world
            .canvases()
            .iter()
            .map(|canvas| canvas.id.as_str())
            .eq(self.world.canvases().iter().map(|canvas| canvas.id.as_str()));

        self.world = Rc::new(world);
        self.commands.extend(self.barrier.begin(&self.world, canvases_changed));
        self.viewer_items = self.desired_items();
        self.finish_load_if_settled();
    }

    pub fn set_annotations(&mut self, annotations: AnnotationLayers, now: Instant) {
        self.annotations = Rc::new(annotations);
        self.redraw.push((), now);
    }

    /// Change a layer's order, opacity or visibility.
    pub fn update_layer(&mut self, canvas_id: &str, resource_id: &str, update: LayerUpdate, now: Instant) -> Result<()> {
        Rc::make_mut(&mut self.world).update_layer(canvas_id, resource_id, update)?;
        if self.barrier.is_settled() {
            self.refresh_layers();
        }
        self.redraw.push((), now);
        Ok(())
    }

    /// Application-driven viewport change.
    pub fn set_viewport(&mut self, state: ViewportState, immediate: bool) {
        for request in self.sync.request_external_change(state, immediate) {
            self.commands.push_back(match request {
                ViewportRequest::PanTo { x, y, immediate } => ViewerCommand::PanTo {
                    center: Point::new(x, y),
                    immediate,
                },
                ViewportRequest::ZoomTo { zoom, immediate } => ViewerCommand::ZoomTo { zoom, immediate },
            });
        }
    }

    pub fn handle_event(&mut self, event: ViewerEvent, now: Instant) {
        match event {
            ViewerEvent::ViewportUpdated { state } => {
                if !self.track_pose(state) {
                    return;
                }
                if let Some(state) = self.sync.viewport_updated(state) {
                    self.viewport_out.push(state, now);
                }
                self.redraw.push((), now);
            }
            ViewerEvent::AnimationStart => self.sync.animation_start(),
            ViewerEvent::AnimationFinish { state } => {
                // Settle on the last good pose if the final one is unusable.
                let state = if self.track_pose(state) { state } else { self.transform.state() };
                let state = self.sync.apply_external_change(state);
                self.viewport_out.push(state, now);
                self.redraw.push((), now);
            }
            ViewerEvent::CanvasClick { pixel } => self.click(pixel),
            ViewerEvent::PointerMove { pixel } => self.pointer_move(pixel, now),
            ViewerEvent::ImageSourceLoaded { request_id } => {
                self.barrier.settle(request_id, Ok(()));
                self.finish_load_if_settled();
            }
            ViewerEvent::ImageSourceFailed { request_id, reason } => {
                if let Settlement::Failed { resource_id, reason } = self.barrier.settle(request_id, Err(reason)) {
                    self.notifications.push_back(Notification::ImageSourceFailed {
                        window_id: self.window_id.clone(),
                        resource_id,
                        reason,
                    });
                }
                self.finish_load_if_settled();
            }
            ViewerEvent::Resized { container } => {
                self.transform = self.transform.resize(container);
                self.redraw.push((), now);
            }
        }
    }

    /// Deliver due coalesced notifications. Returns whether the annotation
    /// overlay should be redrawn now.
    pub fn poll(&mut self, now: Instant) -> bool {
        if let Some(state) = self.viewport_out.poll(now) {
            self.notifications.push_back(Notification::ViewportChanged {
                window_id: self.window_id.clone(),
                state,
            });
        }
        if let Some(ids) = self.hover_out.poll(now) {
            self.notifications.push_back(Notification::AnnotationsHovered {
                window_id: self.window_id.clone(),
                annotation_ids: ids.into_iter().collect(),
            });
        }
        self.redraw.poll(now).is_some()
    }

    /// Earliest time [`ViewerSession::poll`] has something to deliver.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.viewport_out.deadline(),
            self.hover_out.deadline(),
            self.redraw.deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    pub fn drain_commands(&mut self) -> Vec<ViewerCommand> {
        self.commands.drain(..).collect()
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    /// Adopt the viewer's pose. Returns false if it was rejected.
    fn track_pose(&mut self, state: ViewportState) -> bool {
        match ScreenTransform::from_state(state, self.transform.container) {
            Some(transform) => {
                self.transform = transform;
                true
            }
            None => {
                log::warn!("Ignoring viewer pose with zoom {}", state.zoom);
                false
            }
        }
    }

    fn click(&mut self, pixel: Point) {
        let world = Rc::clone(&self.world);
        let annotations = Rc::clone(&self.annotations);
        let point = self.transform.pixel_to_world(pixel);

        let tester = HitTester::new(&world, &annotations, &self.hit_test);
        let Some((canvas, annotation)) = tester.select_at(point) else {
            log::trace!("Click at {:?} selected nothing", point);
            return;
        };
        log::debug!("Selected annotation '{}' on '{}'", annotation.id, canvas.id);
        self.notifications.push_back(Notification::AnnotationSelected {
            window_id: self.window_id.clone(),
            target_id: canvas.id.clone(),
            annotation_id: annotation.id.clone(),
        });
    }

    fn pointer_move(&mut self, pixel: Point, now: Instant) {
        let world = Rc::clone(&self.world);
        let annotations = Rc::clone(&self.annotations);
        let point = self.transform.pixel_to_world(pixel);

        let ids = HitTester::new(&world, &annotations, &self.hit_test).hover_at(point);
        if let Some(changed) = self.hover.update(ids) {
            self.hover_out.push(changed, now);
            self.redraw.push((), now);
        }
    }

    fn finish_load_if_settled(&mut self) {
        if let Some(outcome) = self.barrier.take_outcome() {
            self.post_load(outcome);
        }
    }

    fn post_load(&mut self, outcome: LoadOutcome) {
        log::info!(
            "Image sources settled: {} loaded, {} failed",
            outcome.loaded,
            outcome.failed.len()
        );
        if outcome.fit_bounds && !self.world.is_empty() {
            self.commands.push_back(ViewerCommand::FitBounds {
                bounds: self.world.world_bounds(),
                immediate: true,
            });
        }
        self.refresh_layers();
    }

    fn desired_items(&self) -> Vec<(String, f64)> {
        self.world
            .paint_order()
            .into_iter()
            .map(|id| (id.to_string(), self.world.layer_opacity_of_image_resource(id)))
            .collect()
    }

    /// Bring the viewer's item order and opacity in line with the world.
    fn refresh_layers(&mut self) {
        let desired = self.desired_items();
        for (index, (id, opacity)) in desired.iter().enumerate() {
            let previous = self.viewer_items.iter().position(|(known, _)| known == id);
            if previous != Some(index) {
                self.commands.push_back(ViewerCommand::SetItemIndex {
                    resource_id: id.clone(),
                    index,
                });
            }
            let known_opacity = previous.map(|i| self.viewer_items[i].1);
            if known_opacity != Some(*opacity) {
                self.commands.push_back(ViewerCommand::SetItemOpacity {
                    resource_id: id.clone(),
                    opacity: *opacity,
                });
            }
        }
        self.viewer_items = desired;
    }
}

impl std::fmt::Debug for ViewerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerSession")
            .field("window_id", &self.window_id)
            .field("canvases", &self.world.canvases().len())
            .field("phase", &self.sync.phase())
            .field("pending_sources", &self.barrier.pending_count())
            .finish()
    }
}
