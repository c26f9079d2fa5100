//! Host surface abstraction.
//!
//! The engine never talks to a concrete UI toolkit; it drives one of two
//! trait objects. `VideoSurface` is the seam for a seekable video element,
//! `CanvasSurface` for a drawing surface frames are blitted onto. The
//! headless `SoftwareVideo` and `PixelCanvas` implementations back the demo
//! binary and the tests.

use std::sync::{Arc, Mutex};

use image::RgbaImage;
use log::trace;

use crate::fetch::PlayableSource;
use crate::source::Dimensions;

/// The runtime refused to start playback (autoplay restriction, power
/// saving mode). Expected and recoverable.
#[derive(Debug, Clone)]
pub struct PlaybackDenied {
    pub reason: String,
}

impl std::fmt::Display for PlaybackDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "playback denied: {}", self.reason)
    }
}

impl std::error::Error for PlaybackDenied {}

/// Seekable video element owned by the host.
pub trait VideoSurface: Send {
    /// Swap the element's source (prefetched bytes or a remote reference).
    fn set_source(&mut self, source: &PlayableSource);

    /// Intrinsic media duration in seconds, None until metadata is known.
    fn duration(&self) -> Option<f64>;

    /// Move the playback position. Expected to be visually immediate.
    fn seek(&mut self, seconds: f64);

    /// Start playback; used both by the autoplay probe and by the Incapable
    /// initiation path. The probe always mutes before calling this.
    fn play(&mut self) -> Result<(), PlaybackDenied>;

    fn pause(&mut self);

    /// Mute or unmute the element. A scrubbed background element stays
    /// muted; the probe relies on this being silent.
    fn set_muted(&mut self, muted: bool);

    /// Configure the element to auto-initiate playback on its own.
    fn set_autoplay(&mut self, enabled: bool);
}

/// Drawing surface frames are blitted onto.
pub trait CanvasSurface: Send {
    fn dimensions(&self) -> Dimensions;

    fn clear(&mut self);

    /// Draw the image scaled to the surface's configured dimensions.
    fn blit(&mut self, image: &RgbaImage);
}

/// Either kind of surface, handed to the controller at bind time.
pub enum SurfaceBinding {
    Video(Box<dyn VideoSurface>),
    Canvas(Box<dyn CanvasSurface>),
}

impl std::fmt::Debug for SurfaceBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurfaceBinding::Video(_) => write!(f, "SurfaceBinding::Video"),
            SurfaceBinding::Canvas(_) => write!(f, "SurfaceBinding::Canvas"),
        }
    }
}

/// Headless video element double.
///
/// Duration stays unknown until the host (demo or test) reports metadata via
/// `set_metadata`, mirroring a real element's `loadedmetadata` timing.
#[derive(Debug, Default)]
pub struct SoftwareVideo {
    source_url: Option<String>,
    source_bytes: usize,
    duration: Option<f64>,
    position: f64,
    playing: bool,
    muted: bool,
    autoplay: bool,
    seek_count: u64,
    /// Simulates an autoplay-restricted runtime (battery saver)
    deny_playback: bool,
}

impl SoftwareVideo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a restricted element whose play() is denied.
    pub fn restricted() -> Self {
        Self {
            deny_playback: true,
            ..Self::default()
        }
    }

    /// Report media metadata, as a real element would after loading it.
    pub fn set_metadata(&mut self, duration: f64) {
        self.duration = Some(duration);
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn autoplay(&self) -> bool {
        self.autoplay
    }

    pub fn seek_count(&self) -> u64 {
        self.seek_count
    }
}

impl VideoSurface for SoftwareVideo {
    fn set_source(&mut self, source: &PlayableSource) {
        self.source_url = Some(source.url().to_string());
        self.source_bytes = match source {
            PlayableSource::Prefetched(handle) => handle.len(),
            PlayableSource::Remote(_) => 0,
        };
        trace!(
            "video source set: {} ({} local bytes)",
            source.url(),
            self.source_bytes
        );
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn seek(&mut self, seconds: f64) {
        self.position = seconds;
        self.seek_count += 1;
    }

    fn play(&mut self) -> Result<(), PlaybackDenied> {
        if self.deny_playback {
            return Err(PlaybackDenied {
                reason: "autoplay restricted".to_string(),
            });
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn set_autoplay(&mut self, enabled: bool) {
        self.autoplay = enabled;
    }
}

/// Software canvas: an RGBA buffer at fixed dimensions.
#[derive(Debug)]
pub struct PixelCanvas {
    dimensions: Dimensions,
    buffer: RgbaImage,
    draw_count: u64,
}

impl PixelCanvas {
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            buffer: RgbaImage::new(dimensions.width, dimensions.height),
            draw_count: 0,
        }
    }

    /// Number of completed blits (diagnostics and tests).
    pub fn draw_count(&self) -> u64 {
        self.draw_count
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.buffer.get_pixel(x, y).0
    }
}

impl CanvasSurface for PixelCanvas {
    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn clear(&mut self) {
        for px in self.buffer.pixels_mut() {
            *px = image::Rgba([0, 0, 0, 0]);
        }
    }

    fn blit(&mut self, image: &RgbaImage) {
        if image.dimensions() == (self.dimensions.width, self.dimensions.height) {
            self.buffer.copy_from_slice(image);
        } else {
            self.buffer = image::imageops::resize(
                image,
                self.dimensions.width,
                self.dimensions.height,
                image::imageops::FilterType::Triangle,
            );
        }
        self.draw_count += 1;
    }
}

// Shared-handle impls so a host can keep inspecting a surface after moving a
// clone of the handle into the driver. Lock poisoning is unrecoverable here,
// same as the rest of the crate's Mutex use.
impl VideoSurface for Arc<Mutex<SoftwareVideo>> {
    fn set_source(&mut self, source: &PlayableSource) {
        self.lock().unwrap().set_source(source);
    }

    fn duration(&self) -> Option<f64> {
        self.lock().unwrap().duration()
    }

    fn seek(&mut self, seconds: f64) {
        self.lock().unwrap().seek(seconds);
    }

    fn play(&mut self) -> Result<(), PlaybackDenied> {
        self.lock().unwrap().play()
    }

    fn pause(&mut self) {
        self.lock().unwrap().pause();
    }

    fn set_muted(&mut self, muted: bool) {
        self.lock().unwrap().set_muted(muted);
    }

    fn set_autoplay(&mut self, enabled: bool) {
        self.lock().unwrap().set_autoplay(enabled);
    }
}

impl CanvasSurface for Arc<Mutex<PixelCanvas>> {
    fn dimensions(&self) -> Dimensions {
        self.lock().unwrap().dimensions()
    }

    fn clear(&mut self) {
        self.lock().unwrap().clear();
    }

    fn blit(&mut self, image: &RgbaImage) {
        self.lock().unwrap().blit(image);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_software_video_metadata_and_seek() {
        let mut video = SoftwareVideo::new();
        assert!(video.duration().is_none());
        video.set_metadata(10.0);
        assert_eq!(video.duration(), Some(10.0));
        video.seek(2.5);
        assert_eq!(video.position(), 2.5);
        assert_eq!(video.seek_count(), 1);
    }

    #[test]
    fn test_restricted_video_denies_play() {
        let mut video = SoftwareVideo::restricted();
        assert!(video.play().is_err());
        assert!(!video.is_playing());
    }

    #[test]
    fn test_pixel_canvas_blit_and_scale() {
        let mut canvas = PixelCanvas::new(Dimensions::new(4, 4));
        let img = RgbaImage::from_pixel(4, 4, image::Rgba([9, 9, 9, 255]));
        canvas.blit(&img);
        assert_eq!(canvas.draw_count(), 1);
        assert_eq!(canvas.pixel(0, 0), [9, 9, 9, 255]);

        // Mismatched input is scaled to the configured dimensions
        let small = RgbaImage::from_pixel(2, 2, image::Rgba([100, 0, 0, 255]));
        canvas.blit(&small);
        assert_eq!(canvas.pixel(0, 0), [100, 0, 0, 255]);
    }
}
