//! Image-source registration barrier.
//!
//! Every image layer of the world is registered with the viewer as an
//! independent request. Requests settle one by one, in any order, and a
//! failure never holds up the others. Once every request of the current
//! generation has settled the post-load actions become due, exactly once.
//! Starting a new load abandons the previous generation; settlements for
//! its requests are ignored.

use std::collections::HashMap;

use super::events::{RequestId, ViewerCommand};
use crate::world::CanvasWorld;

/// Result of settling one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Loaded { resource_id: String },
    Failed { resource_id: String, reason: String },
    /// Unknown or superseded request.
    Stale,
}

/// Summary of a finished load generation.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    pub generation: u64,
    pub loaded: usize,
    /// `(resource_id, reason)` for every failed source.
    pub failed: Vec<(String, String)>,
    /// The canvas set changed, so the view should be fit to the world.
    pub fit_bounds: bool,
}

#[derive(Debug, Default)]
pub struct ImageSourceBarrier {
    generation: u64,
    next_id: RequestId,
    /// Outstanding requests of the current generation.
    pending: HashMap<RequestId, String>,
    loaded: usize,
    failed: Vec<(String, String)>,
    fit_bounds: bool,
    /// Post-load actions of the current generation were handed out.
    finished: bool,
}

impl ImageSourceBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Discard the viewer's content and register every layer of `world`.
    pub fn begin(&mut self, world: &CanvasWorld, canvases_changed: bool) -> Vec<ViewerCommand> {
        self.generation += 1;
        if !self.pending.is_empty() {
            log::debug!(
                "Abandoning {} pending image sources of generation {}",
                self.pending.len(),
                self.generation - 1
            );
        }
        self.pending.clear();
        self.loaded = 0;
        self.failed.clear();
        self.fit_bounds = canvases_changed;
        self.finished = false;

        let mut commands = vec![ViewerCommand::Close];
        let mut index = 0;
        for canvas in world.canvases() {
            for layer in canvas.layers() {
                let Some(bounds) = world.content_resource_to_world_coordinates(&layer.resource.id) else {
                    continue;
                };
                let request_id = self.next_id;
                self.next_id = self.next_id.wrapping_add(1);
                self.pending.insert(request_id, layer.resource.id.clone());

                let resource_id = layer.resource.id.clone();
                let opacity = layer.effective_opacity();
                commands.push(match layer.resource.image_service() {
                    Some(service) => ViewerCommand::AddTiledImage {
                        request_id,
                        resource_id,
                        info_url: format!("{}/info.json", service.base_id()),
                        bounds,
                        index,
                        opacity,
                    },
                    None => ViewerCommand::AddSimpleImage {
                        request_id,
                        resource_id,
                        url: layer.resource.id.clone(),
                        bounds,
                        index,
                        opacity,
                    },
                });
                index += 1;
            }
        }

        log::info!(
            "Loading {} image sources (generation {})",
            self.pending.len(),
            self.generation
        );
        commands
    }

    /// Record the result of one request.
    pub fn settle(&mut self, request_id: RequestId, result: Result<(), String>) -> Settlement {
        let Some(resource_id) = self.pending.remove(&request_id) else {
            log::debug!("Ignoring settlement of unknown request {}", request_id);
            return Settlement::Stale;
        };
        match result {
            Ok(()) => {
                self.loaded += 1;
                Settlement::Loaded { resource_id }
            }
            Err(reason) => {
                log::warn!("Image source '{}' failed to load: {}", resource_id, reason);
                self.failed.push((resource_id.clone(), reason.clone()));
                Settlement::Failed { resource_id, reason }
            }
        }
    }

    /// Every request of the current generation has settled.
    pub fn is_settled(&self) -> bool {
        self.generation > 0 && self.pending.is_empty()
    }

    /// Post-load summary, handed out once per generation.
    pub fn take_outcome(&mut self) -> Option<LoadOutcome> {
        if self.finished || !self.is_settled() {
            return None;
        }
        self.finished = true;
        Some(LoadOutcome {
            generation: self.generation,
            loaded: self.loaded,
            failed: std::mem::take(&mut self.failed),
            fit_bounds: self.fit_bounds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::WorldOptions;
    use iiif_resource::{Canvas, ImageResource, ImageService};

    fn world() -> CanvasWorld {
        CanvasWorld::new(
            &[
                Canvas::new("c1", 100, 100).with_image(
                    ImageResource::new("tiled")
                        .with_service(ImageService::new("https://ex.org/iiif/tiled/").with_profile("level2")),
                ),
                Canvas::new("c2", 100, 100).with_image(ImageResource::new("https://ex.org/plain.jpg")),
            ],
            WorldOptions::default(),
        )
    }

    fn request_ids(commands: &[ViewerCommand]) -> Vec<RequestId> {
        commands
            .iter()
            .filter_map(|command| match command {
                ViewerCommand::AddTiledImage { request_id, .. } | ViewerCommand::AddSimpleImage { request_id, .. } => {
                    Some(*request_id)
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_begin_registers_every_layer() {
        let mut barrier = ImageSourceBarrier::new();
        let commands = barrier.begin(&world(), true);

        assert_eq!(commands[0], ViewerCommand::Close);
        assert!(matches!(
            &commands[1],
            ViewerCommand::AddTiledImage { info_url, index: 0, .. } if info_url == "https://ex.org/iiif/tiled/info.json"
        ));
        assert!(matches!(
            &commands[2],
            ViewerCommand::AddSimpleImage { url, index: 1, bounds, .. }
                if url == "https://ex.org/plain.jpg" && bounds.x == 100.0
        ));
        assert_eq!(barrier.pending_count(), 2);
    }

    #[test]
    fn test_outcome_once_after_all_settle() {
        let mut barrier = ImageSourceBarrier::new();
        let ids = request_ids(&barrier.begin(&world(), true));

        assert!(matches!(barrier.settle(ids[1], Err("404".to_string())), Settlement::Failed { .. }));
        assert_eq!(barrier.take_outcome(), None);
        assert!(matches!(barrier.settle(ids[0], Ok(())), Settlement::Loaded { .. }));

        let outcome = barrier.take_outcome().unwrap();
        assert_eq!(outcome.loaded, 1);
        assert_eq!(outcome.failed, vec![("https://ex.org/plain.jpg".to_string(), "404".to_string())]);
        assert!(outcome.fit_bounds);
        assert_eq!(barrier.take_outcome(), None);
    }

    #[test]
    fn test_new_generation_ignores_stale_settlements() {
        let mut barrier = ImageSourceBarrier::new();
        let old = request_ids(&barrier.begin(&world(), true));
        let new = request_ids(&barrier.begin(&world(), false));

        assert_eq!(barrier.generation(), 2);
        assert_eq!(barrier.settle(old[0], Ok(())), Settlement::Stale);
        assert_eq!(barrier.take_outcome(), None);

        for id in new {
            barrier.settle(id, Ok(()));
        }
        let outcome = barrier.take_outcome().unwrap();
        assert_eq!(outcome.generation, 2);
        assert!(!outcome.fit_bounds);
    }

    #[test]
    fn test_empty_world_settles_immediately() {
        let mut barrier = ImageSourceBarrier::new();
        assert_eq!(barrier.take_outcome(), None);
        let commands = barrier.begin(&CanvasWorld::default(), true);
        assert_eq!(commands, vec![ViewerCommand::Close]);
        assert!(barrier.take_outcome().is_some());
    }
}
