//! Lifecycle controller: wires the scroll timeline to a playback driver.
//!
//! One controller owns one rendered instance. It holds the only active
//! listener set, the only local asset handle and the only driver at any
//! time, and walks the phase machine
//!
//! `Uninitialized -> AssetPending -> Bound -> Scrubbing -> Disposed`
//!
//! with `rebind()` looping back through AssetPending on a media-source
//! change. Scroll and resize callbacks are synchronous; loader results
//! arrive over a channel and are drained by `poll()` on the host's tick.
//! Completions tagged with a superseded generation, or arriving after
//! disposal, are discarded silently - an expected race, not a fault.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, info, trace, warn};
use uuid::Uuid;

use crate::cache::FrameCache;
use crate::driver::{FrameBlitter, PlaybackDriver, VideoScrub};
use crate::error::ConfigError;
use crate::fetch::{self, LoaderEvent, ResolvedAsset};
use crate::probe::{self, AutoplayCapability};
use crate::source::{MediaKind, MediaSource};
use crate::surface::SurfaceBinding;
use crate::timeline::{RegionMarkers, ScrollTimeline, Viewport};
use crate::workers::Workers;

/// Lifecycle phase of one rendered instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    AssetPending,
    Bound,
    Scrubbing,
    Disposed,
}

/// Scroll-to-media synchronization for one media source and one surface.
pub struct ScrubController {
    id: Uuid,
    source: MediaSource,
    phase: Phase,
    workers: Arc<Workers>,
    /// This instance's own epoch cell; bumping it cancels only this
    /// instance's queued loader jobs on the shared pool.
    epoch: Arc<AtomicU64>,
    /// Epoch value this binding was created under; loader completions from
    /// other generations are stale.
    generation: u64,
    timeline: Option<ScrollTimeline>,
    viewport: Viewport,
    trigger_top: f64,
    driver: Option<PlaybackDriver>,
    asset: Option<ResolvedAsset>,
    cache: Option<Arc<FrameCache>>,
    capability: AutoplayCapability,
    events_tx: Sender<LoaderEvent>,
    events_rx: Receiver<LoaderEvent>,
    /// True while this instance owns the host's scroll/resize listener set
    attached: bool,
    last_scroll: Option<f64>,
    frames_loaded: usize,
}

impl std::fmt::Debug for ScrubController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrubController")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("generation", &self.generation)
            .field("frames_loaded", &self.frames_loaded)
            .finish_non_exhaustive()
    }
}

impl ScrubController {
    /// Validate the source and create an unbound controller.
    pub fn new(source: MediaSource, workers: Arc<Workers>) -> Result<Self, ConfigError> {
        source.validate()?;
        let (events_tx, events_rx) = unbounded();
        Ok(Self {
            id: Uuid::new_v4(),
            source,
            phase: Phase::Uninitialized,
            workers,
            epoch: Arc::new(AtomicU64::new(0)),
            generation: 0,
            timeline: None,
            viewport: Viewport::new(0.0, 0.0),
            trigger_top: 0.0,
            driver: None,
            asset: None,
            cache: None,
            capability: AutoplayCapability::Unknown,
            events_tx,
            events_rx,
            attached: false,
            last_scroll: None,
            frames_loaded: 0,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn source(&self) -> &MediaSource {
        &self.source
    }

    pub fn capability(&self) -> AutoplayCapability {
        self.capability
    }

    /// True while the asset is still resolving (aria-busy for the host).
    pub fn is_busy(&self) -> bool {
        self.phase == Phase::AssetPending
    }

    /// Whether playback degraded to remote streaming. None until resolved.
    pub fn degraded(&self) -> Option<bool> {
        self.asset.as_ref().map(|a| a.degraded)
    }

    /// Frames resolved so far (frame-sequence bindings only).
    pub fn frames_loaded(&self) -> Option<usize> {
        self.cache.as_ref().map(|_| self.frames_loaded)
    }

    /// Progress of the most recent scroll tick.
    pub fn last_progress(&self) -> Option<f64> {
        match (&self.timeline, self.last_scroll) {
            (Some(tl), Some(scroll)) => Some(tl.progress(scroll)),
            _ => None,
        }
    }

    /// Page height the host must allocate for the scrub container.
    pub fn container_height(&self) -> Option<f64> {
        self.timeline.as_ref().map(|tl| tl.total_height())
    }

    /// Virtual-region boundaries for the debug overlay.
    pub fn markers(&self) -> Option<RegionMarkers> {
        self.timeline.as_ref().map(|tl| tl.markers())
    }

    /// Bind a surface and start asset resolution.
    ///
    /// Attaches the listener set, builds the timeline, constructs the driver
    /// variant matching the media kind and kicks off prefetching. Binding is
    /// optimistic: it never waits for the loader.
    pub fn bind(
        &mut self,
        binding: SurfaceBinding,
        viewport: Viewport,
        trigger_top: f64,
    ) -> Result<(), ConfigError> {
        match self.phase {
            Phase::Disposed => return Err(ConfigError::Disposed),
            Phase::Uninitialized => {}
            _ => return Err(ConfigError::AlreadyBound),
        }
        self.viewport = viewport;
        self.trigger_top = trigger_top;
        self.bind_inner(binding)
    }

    fn bind_inner(&mut self, binding: SurfaceBinding) -> Result<(), ConfigError> {
        // New generation: anything still queued for the old one goes stale
        self.generation = self.epoch.fetch_add(1, Ordering::Relaxed) + 1;
        self.phase = Phase::AssetPending;
        self.frames_loaded = 0;
        self.timeline = Some(ScrollTimeline::new(
            self.trigger_top,
            self.viewport,
            self.source.duration_heights,
        ));

        match (&self.source.kind, binding) {
            (MediaKind::Video { url, .. }, SurfaceBinding::Video(surface)) => {
                fetch::prefetch_video(
                    &self.workers,
                    &self.epoch,
                    self.generation,
                    url.clone(),
                    self.events_tx.clone(),
                );
                self.driver = Some(PlaybackDriver::Video(VideoScrub::new(surface)));
                // Stays AssetPending until the loader reports a playable
                // source; scroll ticks are no-ops meanwhile (no metadata).
            }
            (MediaKind::FrameSequence { frame_count, .. }, SurfaceBinding::Canvas(surface)) => {
                let cache = Arc::new(FrameCache::new(*frame_count));
                fetch::request_frames(
                    &self.workers,
                    &self.epoch,
                    self.generation,
                    &self.source,
                    Arc::clone(&cache),
                    self.events_tx.clone(),
                );
                self.driver = Some(PlaybackDriver::Frames(FrameBlitter::new(
                    surface,
                    Arc::clone(&cache),
                    *frame_count,
                )));
                self.cache = Some(cache);
                // The sequence prefix is playable as-is; bound immediately
                self.phase = Phase::Bound;
            }
            (_, binding) => {
                debug!("{}: surface {:?} does not match media kind", self.id, binding);
                self.phase = Phase::Uninitialized;
                return Err(ConfigError::SurfaceMismatch);
            }
        }

        self.attached = true;
        info!(
            "{}: bound {} over {:.1} viewport heights (generation {})",
            self.id,
            self.source.reference(),
            self.source.duration_heights,
            self.generation
        );
        Ok(())
    }

    /// Scroll listener: recompute progress and apply it. Synchronous, no
    /// suspension; ignored unless this instance owns the listener set.
    pub fn on_scroll(&mut self, scroll_offset: f64) {
        if !self.attached || self.phase == Phase::Disposed {
            return;
        }
        self.last_scroll = Some(scroll_offset);
        let Some(timeline) = &self.timeline else {
            return;
        };
        let progress = timeline.progress(scroll_offset);
        if let Some(driver) = &mut self.driver {
            driver.apply(progress);
            if self.phase == Phase::Bound {
                self.phase = Phase::Scrubbing;
            }
        }
    }

    /// Resize listener: rebuild the timeline for the new viewport and
    /// re-apply the last known scroll position.
    pub fn on_resize(&mut self, viewport: Viewport) {
        if !self.attached || self.phase == Phase::Disposed {
            return;
        }
        self.viewport = viewport;
        self.timeline = Some(ScrollTimeline::new(
            self.trigger_top,
            viewport,
            self.source.duration_heights,
        ));
        if let Some(scroll) = self.last_scroll {
            self.on_scroll(scroll);
        }
    }

    /// Drain loader completions. Host calls this on its update tick.
    ///
    /// Stale-generation and post-disposal completions are dropped without
    /// touching any surface.
    pub fn poll(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            if self.phase == Phase::Disposed {
                trace!("{}: discarding loader event after disposal", self.id);
                continue;
            }
            match event {
                LoaderEvent::VideoResolved { generation, asset } => {
                    if generation != self.generation {
                        trace!("{}: discarding stale video resolution", self.id);
                        continue;
                    }
                    self.on_video_resolved(asset);
                }
                LoaderEvent::FrameLoaded { generation, index } => {
                    if generation != self.generation {
                        trace!("{}: discarding stale frame {}", self.id, index);
                        continue;
                    }
                    self.frames_loaded += 1;
                    trace!(
                        "{}: frame {} loaded ({} total)",
                        self.id, index, self.frames_loaded
                    );
                }
            }
        }
    }

    fn on_video_resolved(&mut self, asset: ResolvedAsset) {
        if asset.degraded {
            warn!(
                "{}: degraded mode, streaming {} directly",
                self.id,
                asset.source.url()
            );
        } else {
            debug!("{}: local handle ready for {}", self.id, asset.source.url());
        }

        let Some(surface) = self.driver.as_mut().and_then(|d| d.video_surface_mut()) else {
            // Video resolution without a video driver is a stale race
            return;
        };
        surface.set_source(&asset.source);

        // Probe once per binding; the outcome is cached for its lifetime
        if !self.capability.is_resolved() {
            self.capability = probe::probe(surface);
            if self.capability == AutoplayCapability::Incapable {
                // Restricted runtimes need proactive initiation
                surface.set_autoplay(true);
            }
        }

        // The previous handle (if any) is replaced, and thereby released,
        // before the new one is stored
        self.asset = Some(asset);
        if self.phase == Phase::AssetPending {
            self.phase = Phase::Bound;
        }
    }

    /// Switch to a new media source over the same surface.
    ///
    /// Releases the held handle first, cancels queued loader work via the
    /// epoch bump inside `bind_inner`, and starts a fresh resolution cycle.
    /// The listener set is reused, never duplicated. All checks run before
    /// any teardown, so a failed rebind leaves the prior binding intact.
    pub fn rebind(&mut self, source: MediaSource) -> Result<(), ConfigError> {
        if self.phase == Phase::Disposed {
            return Err(ConfigError::Disposed);
        }
        source.validate()?;
        match (&source.kind, self.driver.as_ref()) {
            (_, None) => return Err(ConfigError::NotBound),
            (MediaKind::Video { .. }, Some(PlaybackDriver::Video(_)))
            | (MediaKind::FrameSequence { .. }, Some(PlaybackDriver::Frames(_))) => {}
            _ => return Err(ConfigError::SurfaceMismatch),
        }
        let Some(driver) = self.driver.take() else {
            return Err(ConfigError::NotBound);
        };

        debug!(
            "{}: rebinding {} -> {}",
            self.id,
            self.source.reference(),
            source.reference()
        );

        // Release the previous binding's resources before resolving anew
        self.asset = None;
        self.cache = None;
        self.capability = AutoplayCapability::Unknown;
        self.source = source;

        let binding = driver.into_binding();
        self.bind_inner(binding)
    }

    /// Tear down synchronously: detach listeners, cancel in-flight work,
    /// release the local handle, drop the driver. Idempotent; no `apply`
    /// can happen afterwards.
    pub fn dispose(&mut self) {
        if self.phase == Phase::Disposed {
            return;
        }
        self.attached = false;
        self.phase = Phase::Disposed;
        // Stale out anything still queued on the workers
        self.epoch.fetch_add(1, Ordering::Relaxed);
        self.driver = None;
        self.asset = None;
        self.cache = None;
        self.timeline = None;
        // Drain what already arrived; nothing reads these now
        while self.events_rx.try_recv().is_ok() {}
        info!("{}: disposed", self.id);
    }
}

impl Drop for ScrubController {
    fn drop(&mut self) {
        self.dispose();
    }
}
