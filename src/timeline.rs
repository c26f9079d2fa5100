//! Scroll timeline mapper: scroll offset -> normalized scrub progress.
//!
//! The virtual region is anchored to a trigger element one viewport tall.
//! It starts where the trigger's top reaches the viewport top and ends where
//! the trigger's bottom plus `(duration_heights - 1) * viewport_height` has
//! reached the viewport bottom. Progress is the fraction of that region
//! already scrolled past, clamped to [0, 1].
//!
//! Pure math, no media state. Recomputed synchronously on every scroll or
//! resize tick; the value is threaded straight into the active playback
//! driver rather than parked in shared mutable state.

/// Host viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Virtual-region boundaries, for the debug overlay only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionMarkers {
    /// Scroll offset where progress leaves 0
    pub start: f64,
    /// Scroll offset where progress reaches 1
    pub end: f64,
    /// Page height the host must allocate for the scrub container
    pub total_height: f64,
}

/// Maps a scroll offset over the virtual region to progress in [0, 1].
#[derive(Debug, Clone, Copy)]
pub struct ScrollTimeline {
    trigger_top: f64,
    viewport_height: f64,
    duration_heights: f64,
}

impl ScrollTimeline {
    /// `trigger_top` is the document-space offset of the trigger element.
    /// `duration_heights` comes pre-validated from the media source.
    pub fn new(trigger_top: f64, viewport: Viewport, duration_heights: f64) -> Self {
        Self {
            trigger_top,
            viewport_height: viewport.height.max(0.0),
            duration_heights,
        }
    }

    /// Page height of the scrub container: `duration_heights * 100vh`.
    pub fn total_height(&self) -> f64 {
        self.duration_heights.max(0.0) * self.viewport_height
    }

    /// Scroll offset at which progress starts rising.
    pub fn region_start(&self) -> f64 {
        self.trigger_top
    }

    /// Scroll offset at which progress reaches 1. With the trigger one
    /// viewport tall, the scrollable span works out to
    /// `(duration_heights - 1) * viewport_height`.
    pub fn region_end(&self) -> f64 {
        self.trigger_top + self.span()
    }

    fn span(&self) -> f64 {
        (self.duration_heights - 1.0).max(0.0) * self.viewport_height
    }

    /// Progress in [0, 1] for the given scroll offset. Monotone
    /// non-decreasing inside the region, constant outside it.
    ///
    /// `duration_heights <= 1` collapses the region to zero height; progress
    /// is then a step from 0 to 1 at the trigger top.
    pub fn progress(&self, scroll_offset: f64) -> f64 {
        let span = self.span();
        if span <= 0.0 {
            return if scroll_offset < self.region_start() {
                0.0
            } else {
                1.0
            };
        }
        ((scroll_offset - self.region_start()) / span).clamp(0.0, 1.0)
    }

    pub fn markers(&self) -> RegionMarkers {
        RegionMarkers {
            start: self.region_start(),
            end: self.region_end(),
            total_height: self.total_height(),
        }
    }
}
