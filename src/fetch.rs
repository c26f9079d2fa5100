//! Asset loader: video prefetching with degraded fallback and
//! fire-and-forget frame-sequence requests.
//!
//! Video assets are fetched whole into an in-memory `VideoHandle` so the
//! host's video surface can play from local bytes without network stalls
//! mid-scrub. Any failure degrades to streaming the original remote
//! reference directly - a warning, never an error the caller sees.
//!
//! Frame sequences get one independent request per index; each decoded image
//! lands in the shared `FrameCache` as it resolves. A failed frame is simply
//! skipped at render time, so there is no retry policy.
//!
//! All loading runs on the worker pool and reports back over a channel the
//! controller drains in `poll()`; binding never waits on the loader.

use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use crossbeam_channel::Sender;
use log::{debug, trace, warn};

use crate::cache::FrameCache;
use crate::error::FetchError;
use crate::source::{MediaKind, MediaSource};
use crate::workers::Workers;

/// Cap on how much of a remote body we will buffer (512 MB). Background
/// assets beyond that are better streamed anyway.
const MAX_PREFETCH_BYTES: u64 = 512 * 1024 * 1024;

/// Revocable in-memory copy of a video asset.
///
/// Holding the handle keeps the bytes alive; dropping it releases them.
/// Ownership makes the "never dereferenced after release" invariant
/// structural: releasing consumes the handle.
pub struct VideoHandle {
    url: String,
    bytes: Vec<u8>,
}

impl VideoHandle {
    pub fn new(url: String, bytes: Vec<u8>) -> Self {
        Self { url, bytes }
    }

    /// Original reference the bytes were fetched from.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Drop for VideoHandle {
    fn drop(&mut self) {
        debug!("released local handle for {} ({} bytes)", self.url, self.bytes.len());
    }
}

impl std::fmt::Debug for VideoHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoHandle")
            .field("url", &self.url)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// What the video surface should play from.
#[derive(Debug)]
pub enum PlayableSource {
    /// Locally held bytes (revocable handle)
    Prefetched(VideoHandle),
    /// Remote reference, streamed by the surface itself
    Remote(String),
}

impl PlayableSource {
    pub fn url(&self) -> &str {
        match self {
            PlayableSource::Prefetched(handle) => handle.url(),
            PlayableSource::Remote(url) => url,
        }
    }
}

/// Outcome of video asset resolution. `degraded` only changes buffering
/// behavior, never scrub correctness.
#[derive(Debug)]
pub struct ResolvedAsset {
    pub source: PlayableSource,
    pub degraded: bool,
}

/// Loader -> controller notifications, tagged with the binding generation
/// that requested them so stale completions can be discarded.
#[derive(Debug)]
pub enum LoaderEvent {
    VideoResolved {
        generation: u64,
        asset: ResolvedAsset,
    },
    FrameLoaded {
        generation: u64,
        index: u32,
    },
}

/// Fetch the full contents of a reference: http(s) URLs via ureq, anything
/// else as a filesystem path (with an optional `file://` prefix).
pub fn fetch_bytes(reference: &str) -> Result<Vec<u8>, FetchError> {
    if reference.starts_with("http://") || reference.starts_with("https://") {
        let response = ureq::get(reference)
            .call()
            .map_err(|e| FetchError::Http(e.to_string()))?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_PREFETCH_BYTES)
            .read_to_end(&mut bytes)
            .map_err(|e| FetchError::Io(e.to_string()))?;
        Ok(bytes)
    } else {
        let path = reference.strip_prefix("file://").unwrap_or(reference);
        std::fs::read(path).map_err(|e| FetchError::Io(e.to_string()))
    }
}

/// Fetch and decode one still image.
pub fn fetch_image(reference: &str) -> Result<image::RgbaImage, FetchError> {
    let bytes = fetch_bytes(reference)?;
    let decoded = image::load_from_memory(&bytes).map_err(|e| FetchError::Decode(e.to_string()))?;
    Ok(decoded.to_rgba8())
}

/// Kick off the full-asset video prefetch on the worker pool.
///
/// Always reports a playable outcome: prefetched bytes on success, the
/// original remote reference with `degraded = true` on any failure.
pub fn prefetch_video(
    workers: &Workers,
    epoch: &Arc<AtomicU64>,
    generation: u64,
    url: String,
    events: Sender<LoaderEvent>,
) {
    workers.execute_with_epoch(epoch, generation, move || {
        let asset = match fetch_bytes(&url) {
            Ok(bytes) => {
                debug!("prefetched {} ({} bytes)", url, bytes.len());
                ResolvedAsset {
                    source: PlayableSource::Prefetched(VideoHandle::new(url, bytes)),
                    degraded: false,
                }
            }
            Err(e) => {
                warn!("video prefetch failed, falling back to on-the-fly streaming: {}", e);
                ResolvedAsset {
                    source: PlayableSource::Remote(url),
                    degraded: true,
                }
            }
        };
        // Receiver may already be gone (disposed controller); that's fine
        let _ = events.send(LoaderEvent::VideoResolved { generation, asset });
    });
}

/// Enqueue one fire-and-forget image request per frame index.
///
/// Requests are unordered and independent; each resolved frame populates the
/// shared cache in place. Failures are skipped, not retried.
pub fn request_frames(
    workers: &Workers,
    epoch: &Arc<AtomicU64>,
    generation: u64,
    source: &MediaSource,
    cache: Arc<FrameCache>,
    events: Sender<LoaderEvent>,
) {
    let MediaKind::FrameSequence { frame_count, .. } = &source.kind else {
        debug!("request_frames called for a video source, nothing to do");
        return;
    };

    for index in 0..*frame_count {
        let Some(path) = source.frame_path(index) else {
            continue;
        };
        let cache = Arc::clone(&cache);
        let events = events.clone();
        workers.execute_with_epoch(epoch, generation, move || match fetch_image(&path) {
            Ok(img) => {
                cache.insert(index, img);
                let _ = events.send(LoaderEvent::FrameLoaded { generation, index });
            }
            Err(e) => {
                // Missing frames are skipped at render time
                debug!("frame {} failed to load ({}): {}", index, path, e);
            }
        });
    }
    trace!("enqueued {} frame requests", frame_count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Dimensions;
    use std::path::PathBuf;
    use std::time::Duration;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("scrubba-fetch-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_png(path: &std::path::Path, shade: u8) {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([shade, 0, 0, 255]));
        img.save(path).unwrap();
    }

    fn pool() -> Workers {
        Workers::new(2)
    }

    fn epoch() -> Arc<AtomicU64> {
        Arc::new(AtomicU64::new(0))
    }

    #[test]
    fn test_fetch_bytes_from_file() {
        let dir = temp_dir();
        let path = dir.join("clip.mp4");
        std::fs::write(&path, b"not really mp4").unwrap();

        let bytes = fetch_bytes(path.to_str().unwrap()).unwrap();
        assert_eq!(bytes, b"not really mp4");

        // file:// prefix resolves to the same path
        let uri = format!("file://{}", path.display());
        assert_eq!(fetch_bytes(&uri).unwrap(), b"not really mp4");
    }

    #[test]
    fn test_prefetch_success_keeps_local_handle() {
        let dir = temp_dir();
        let path = dir.join("clip.mp4");
        std::fs::write(&path, vec![1u8; 64]).unwrap();
        let url = path.to_str().unwrap().to_string();

        let workers = pool();
        let (tx, rx) = crossbeam_channel::unbounded();
        prefetch_video(&workers, &epoch(), 0, url.clone(), tx);

        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let LoaderEvent::VideoResolved { asset, .. } = event else {
            panic!("expected VideoResolved");
        };
        assert!(!asset.degraded);
        assert_eq!(asset.source.url(), url);
        match asset.source {
            PlayableSource::Prefetched(handle) => assert_eq!(handle.len(), 64),
            PlayableSource::Remote(_) => panic!("expected prefetched bytes"),
        }
    }

    #[test]
    fn test_prefetch_failure_degrades_to_remote() {
        let url = "/definitely/not/here.mp4".to_string();
        let workers = pool();
        let (tx, rx) = crossbeam_channel::unbounded();
        prefetch_video(&workers, &epoch(), 0, url.clone(), tx);

        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let LoaderEvent::VideoResolved { asset, .. } = event else {
            panic!("expected VideoResolved");
        };
        // Recoverable degradation: original reference, no error surfaced
        assert!(asset.degraded);
        assert!(matches!(asset.source, PlayableSource::Remote(ref u) if *u == url));
    }

    #[test]
    fn test_frame_requests_populate_cache_and_skip_missing() {
        let dir = temp_dir();
        // Frames 0 and 2 exist, frame 1 is missing on purpose
        write_png(&dir.join("shot_0000.png"), 10);
        write_png(&dir.join("shot_0002.png"), 30);

        let mut source = MediaSource::frames(
            format!("{}/shot_", dir.display()),
            3,
            3.5,
            Dimensions::new(2, 2),
        );
        if let MediaKind::FrameSequence { extension, .. } = &mut source.kind {
            *extension = "png".to_string();
        }

        let workers = pool();
        let cache = Arc::new(FrameCache::new(3));
        let (tx, rx) = crossbeam_channel::unbounded();
        request_frames(&workers, &epoch(), 0, &source, Arc::clone(&cache), tx);

        let mut loaded = Vec::new();
        while loaded.len() < 2 {
            match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
                LoaderEvent::FrameLoaded { index, .. } => loaded.push(index),
                LoaderEvent::VideoResolved { .. } => panic!("unexpected video event"),
            }
        }
        loaded.sort_unstable();
        assert_eq!(loaded, vec![0, 2]);
        assert!(cache.contains(0));
        assert!(!cache.contains(1));
        assert!(cache.contains(2));
        assert_eq!(cache.get(2).unwrap().get_pixel(0, 0).0[0], 30);
    }
}
