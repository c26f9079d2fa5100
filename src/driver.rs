//! Playback drivers: apply a progress value to the visible surface.
//!
//! Two variants behind one `apply(progress)` entry point, selected once at
//! bind time from the media kind and held for the binding's lifetime:
//!
//! - `VideoScrub` seeks a video to `progress * duration`. Until the
//!   element's metadata is known it does nothing; missed updates are not
//!   queued, the next scroll tick brings a fresh progress anyway.
//! - `FrameBlitter` maps progress to the nearest frame index and blits that
//!   frame. A frame that has not loaded yet skips the draw and keeps
//!   whatever was last drawn - the surface never blanks mid-scrub.
//!
//! `apply` is idempotent and infallible: internal inconsistency degrades to
//! a no-op for that call, never a panic.

use std::sync::Arc;

use log::trace;

use crate::cache::FrameCache;
use crate::surface::{CanvasSurface, SurfaceBinding, VideoSurface};

/// Continuous video scrubbing by seeking.
pub struct VideoScrub {
    surface: Box<dyn VideoSurface>,
    last_position: Option<f64>,
}

impl VideoScrub {
    pub fn new(surface: Box<dyn VideoSurface>) -> Self {
        Self {
            surface,
            last_position: None,
        }
    }

    /// The underlying surface, for source swaps and the autoplay probe.
    pub fn surface_mut(&mut self) -> &mut dyn VideoSurface {
        self.surface.as_mut()
    }

    fn apply(&mut self, progress: f64) {
        let Some(duration) = self.surface.duration() else {
            trace!("metadata not ready, skipping seek");
            return;
        };
        if !duration.is_finite() || duration <= 0.0 {
            return;
        }
        let position = (progress.clamp(0.0, 1.0) * duration).clamp(0.0, duration);
        if self.last_position == Some(position) {
            return;
        }
        self.surface.seek(position);
        self.last_position = Some(position);
    }
}

/// Discrete frame-sequence scrubbing by blitting cached stills.
pub struct FrameBlitter {
    surface: Box<dyn CanvasSurface>,
    cache: Arc<FrameCache>,
    frame_count: u32,
    last_drawn: Option<u32>,
}

impl FrameBlitter {
    pub fn new(surface: Box<dyn CanvasSurface>, cache: Arc<FrameCache>, frame_count: u32) -> Self {
        Self {
            surface,
            cache,
            frame_count,
            last_drawn: None,
        }
    }

    /// Nearest frame index for a progress value, clamped to
    /// `[0, frame_count - 1]`.
    pub fn frame_index(&self, progress: f64) -> u32 {
        if self.frame_count <= 1 {
            return 0;
        }
        let last = (self.frame_count - 1) as f64;
        let index = (progress.clamp(0.0, 1.0) * last).round();
        (index as i64).clamp(0, last as i64) as u32
    }

    pub fn last_drawn(&self) -> Option<u32> {
        self.last_drawn
    }

    fn apply(&mut self, progress: f64) {
        let index = self.frame_index(progress);
        if self.last_drawn == Some(index) {
            return;
        }
        match self.cache.get(index) {
            Some(frame) => {
                self.surface.clear();
                self.surface.blit(&frame);
                self.last_drawn = Some(index);
            }
            None => {
                // Not loaded yet: keep the previous draw on screen
                trace!("frame {} not loaded, retaining previous draw", index);
            }
        }
    }
}

/// Tagged driver variant, one per bound instance.
pub enum PlaybackDriver {
    Video(VideoScrub),
    Frames(FrameBlitter),
}

impl PlaybackDriver {
    /// Update the visible surface to reflect `progress`. Never fails.
    pub fn apply(&mut self, progress: f64) {
        match self {
            PlaybackDriver::Video(scrub) => scrub.apply(progress),
            PlaybackDriver::Frames(blitter) => blitter.apply(progress),
        }
    }

    /// Video surface access, None for the frame-sequence variant.
    pub fn video_surface_mut(&mut self) -> Option<&mut dyn VideoSurface> {
        match self {
            PlaybackDriver::Video(scrub) => Some(scrub.surface_mut()),
            PlaybackDriver::Frames(_) => None,
        }
    }

    /// Recover the surface for a rebind; the driver itself is discarded.
    pub fn into_binding(self) -> SurfaceBinding {
        match self {
            PlaybackDriver::Video(scrub) => SurfaceBinding::Video(scrub.surface),
            PlaybackDriver::Frames(blitter) => SurfaceBinding::Canvas(blitter.surface),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Dimensions;
    use crate::surface::{PixelCanvas, SoftwareVideo};
    use image::{Rgba, RgbaImage};
    use std::sync::Mutex;

    fn shared_video() -> Arc<Mutex<SoftwareVideo>> {
        Arc::new(Mutex::new(SoftwareVideo::new()))
    }

    fn shared_canvas(dims: Dimensions) -> Arc<Mutex<PixelCanvas>> {
        Arc::new(Mutex::new(PixelCanvas::new(dims)))
    }

    fn frame(shade: u8) -> RgbaImage {
        RgbaImage::from_pixel(2, 2, Rgba([shade, 0, 0, 255]))
    }

    #[test]
    fn test_video_scrub_seeks_progress_times_duration() {
        let video = shared_video();
        video.lock().unwrap().set_metadata(10.0);
        let mut driver = PlaybackDriver::Video(VideoScrub::new(Box::new(Arc::clone(&video))));

        driver.apply(0.25);
        assert_eq!(video.lock().unwrap().position(), 2.5);

        driver.apply(1.0);
        assert_eq!(video.lock().unwrap().position(), 10.0);

        // Overshoot clamps to the media duration
        driver.apply(7.0);
        assert_eq!(video.lock().unwrap().position(), 10.0);
    }

    #[test]
    fn test_video_scrub_noop_before_metadata() {
        let video = shared_video();
        let mut driver = PlaybackDriver::Video(VideoScrub::new(Box::new(Arc::clone(&video))));

        driver.apply(0.5);
        assert_eq!(video.lock().unwrap().seek_count(), 0);

        // Metadata arrives; the next tick seeks normally
        video.lock().unwrap().set_metadata(8.0);
        driver.apply(0.5);
        assert_eq!(video.lock().unwrap().position(), 4.0);
    }

    #[test]
    fn test_video_scrub_idempotent_per_position() {
        let video = shared_video();
        video.lock().unwrap().set_metadata(10.0);
        let mut driver = PlaybackDriver::Video(VideoScrub::new(Box::new(Arc::clone(&video))));

        driver.apply(0.3);
        driver.apply(0.3);
        assert_eq!(video.lock().unwrap().seek_count(), 1);
    }

    #[test]
    fn test_frame_index_rounding_and_clamping() {
        let cache = Arc::new(FrameCache::new(176));
        let canvas = shared_canvas(Dimensions::new(2, 2));
        let blitter = FrameBlitter::new(Box::new(canvas), cache, 176);

        assert_eq!(blitter.frame_index(0.0), 0);
        assert_eq!(blitter.frame_index(0.5), 88); // round(0.5 * 175)
        assert_eq!(blitter.frame_index(1.0), 175);
        assert_eq!(blitter.frame_index(-3.0), 0);
        assert_eq!(blitter.frame_index(42.0), 175);
    }

    #[test]
    fn test_frame_blit_draws_cached_frame() {
        let cache = Arc::new(FrameCache::new(4));
        cache.insert(2, frame(200));
        let canvas = shared_canvas(Dimensions::new(2, 2));
        let mut driver = PlaybackDriver::Frames(FrameBlitter::new(
            Box::new(Arc::clone(&canvas)),
            cache,
            4,
        ));

        // progress 0.66 -> round(0.66 * 3) = 2
        driver.apply(0.66);
        let canvas = canvas.lock().unwrap();
        assert_eq!(canvas.draw_count(), 1);
        assert_eq!(canvas.pixel(0, 0), [200, 0, 0, 255]);
    }

    #[test]
    fn test_missing_frame_retains_previous_draw() {
        let cache = Arc::new(FrameCache::new(4));
        cache.insert(0, frame(50));
        let canvas = shared_canvas(Dimensions::new(2, 2));
        let mut driver = PlaybackDriver::Frames(FrameBlitter::new(
            Box::new(Arc::clone(&canvas)),
            Arc::clone(&cache),
            4,
        ));

        driver.apply(0.0);
        assert_eq!(canvas.lock().unwrap().pixel(0, 0), [50, 0, 0, 255]);

        // Frame 3 has not loaded: no clear, no blank, previous pixels stay
        driver.apply(1.0);
        {
            let canvas = canvas.lock().unwrap();
            assert_eq!(canvas.draw_count(), 1);
            assert_eq!(canvas.pixel(0, 0), [50, 0, 0, 255]);
        }

        // Once it loads, the same progress draws it
        cache.insert(3, frame(99));
        driver.apply(1.0);
        assert_eq!(canvas.lock().unwrap().pixel(0, 0), [99, 0, 0, 255]);
    }

    #[test]
    fn test_same_index_does_not_redraw() {
        let cache = Arc::new(FrameCache::new(2));
        cache.insert(0, frame(10));
        let canvas = shared_canvas(Dimensions::new(2, 2));
        let mut driver = PlaybackDriver::Frames(FrameBlitter::new(
            Box::new(Arc::clone(&canvas)),
            cache,
            2,
        ));

        driver.apply(0.0);
        driver.apply(0.1); // still rounds to index 0
        assert_eq!(canvas.lock().unwrap().draw_count(), 1);
    }

    #[test]
    fn test_single_frame_sequence_always_index_zero() {
        let cache = Arc::new(FrameCache::new(1));
        let canvas = shared_canvas(Dimensions::new(2, 2));
        let blitter = FrameBlitter::new(Box::new(canvas), cache, 1);
        assert_eq!(blitter.frame_index(0.0), 0);
        assert_eq!(blitter.frame_index(1.0), 0);
    }
}
