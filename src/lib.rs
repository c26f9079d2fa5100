//! SCRUBBA - scroll-driven media scrubbing engine
//!
//! Maps scroll progress over a virtual, multi-viewport-tall timeline to a
//! normalized playback position and applies it to a media surface: seeking
//! a video or blitting one frame of a pre-rendered image sequence.
//!
//! Re-exports the core types for use by binary targets and hosts.

pub mod cache;
pub mod cli;
pub mod controller;
pub mod driver;
pub mod error;
pub mod fetch;
pub mod overlay;
pub mod probe;
pub mod source;
pub mod surface;
pub mod timeline;
pub mod workers;

pub use cache::FrameCache;
pub use controller::{Phase, ScrubController};
pub use driver::{FrameBlitter, PlaybackDriver, VideoScrub};
pub use error::{ConfigError, FetchError};
pub use fetch::{LoaderEvent, PlayableSource, ResolvedAsset, VideoHandle};
pub use probe::AutoplayCapability;
pub use source::{Catalog, Dimensions, MediaKind, MediaSource};
pub use surface::{CanvasSurface, PixelCanvas, SoftwareVideo, SurfaceBinding, VideoSurface};
pub use timeline::{RegionMarkers, ScrollTimeline, Viewport};
pub use workers::Workers;
