//! Messages exchanged with the external viewer and downstream consumers.

use iiif_resource::{Point, Rect, Size};
use serde::Serialize;

use crate::annotation::AnnotationId;
use crate::viewport::ViewportState;

/// Identifies one image-source registration.
pub type RequestId = u32;

/// Events reported by the deep-zoom viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    /// Pose changed (continuously during pans and zooms).
    ViewportUpdated { state: ViewportState },
    AnimationStart,
    /// Final pose of an animation.
    AnimationFinish { state: ViewportState },
    /// Click at a container pixel.
    CanvasClick { pixel: Point },
    /// Pointer moved to a container pixel.
    PointerMove { pixel: Point },
    ImageSourceLoaded { request_id: RequestId },
    ImageSourceFailed { request_id: RequestId, reason: String },
    Resized { container: Size },
}

/// Commands sent to the deep-zoom viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerCommand {
    /// Drop every image item.
    Close,
    /// Register a tiled source from its Image API `info.json`.
    AddTiledImage {
        request_id: RequestId,
        resource_id: String,
        info_url: String,
        bounds: Rect,
        index: usize,
        opacity: f64,
    },
    /// Register a single non-tiled image.
    AddSimpleImage {
        request_id: RequestId,
        resource_id: String,
        url: String,
        bounds: Rect,
        index: usize,
        opacity: f64,
    },
    FitBounds { bounds: Rect, immediate: bool },
    PanTo { center: Point, immediate: bool },
    ZoomTo { zoom: f64, immediate: bool },
    SetItemIndex { resource_id: String, index: usize },
    SetItemOpacity { resource_id: String, opacity: f64 },
}

/// Notifications for the application.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Notification {
    ViewportChanged {
        window_id: String,
        #[serde(flatten)]
        state: ViewportState,
    },
    AnnotationSelected {
        window_id: String,
        target_id: String,
        annotation_id: AnnotationId,
    },
    AnnotationsHovered {
        window_id: String,
        annotation_ids: Vec<AnnotationId>,
    },
    ImageSourceFailed {
        window_id: String,
        resource_id: String,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_json_shape() {
        let json = serde_json::to_value(Notification::AnnotationSelected {
            window_id: "w1".to_string(),
            target_id: "c1".to_string(),
            annotation_id: "a1".to_string(),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "annotationSelected",
                "windowId": "w1",
                "targetId": "c1",
                "annotationId": "a1"
            })
        );

        let json = serde_json::to_value(Notification::ViewportChanged {
            window_id: "w1".to_string(),
            state: ViewportState::new(1.0, 2.0, 0.5),
        })
        .unwrap();
        assert_eq!(json["x"], 1.0);
        assert_eq!(json["zoom"], 0.5);
    }
}
