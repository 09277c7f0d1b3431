//! Default tuning values for the viewer core.
//!
//! Every value here can be overridden through [`crate::config::ViewerConfig`].

/// Annotation hit testing.
pub mod hit_test {
    /// Neighborhood half-sizes tried in turn when disambiguating a click
    /// that lands on several annotations.
    pub const ESCALATION_RADII: [f64; 3] = [50.0, 150.0, 500.0];
    /// Spacing of the locality sampling grid.
    pub const SAMPLE_STEP: f64 = 1.0;
}

/// Thumbnail negotiation.
pub mod thumbnail {
    /// Requests smaller than this in both dimensions are clamped up so that
    /// small-thumbnail requesters share one cached size.
    pub const MIN_SIZE: u32 = 120;
    /// Height requested when the caller gives no constraints at all.
    pub const DEFAULT_HEIGHT: u32 = 120;
}

/// Event coalescing delays, in milliseconds.
pub mod timing {
    pub const HOVER_DEBOUNCE_MS: u64 = 10;
    pub const VIEWPORT_DEBOUNCE_MS: u64 = 300;
    pub const REDRAW_DEBOUNCE_MS: u64 = 16;
}

/// Default zoom bounds (screen pixels per world unit).
pub mod zoom {
    pub const MIN: f64 = 0.001;
    pub const MAX: f64 = 64.0;
}
