//! Media source model and catalog selection.
//!
//! A `MediaSource` describes one scrubbable asset: either a video file/URL or
//! a pre-rendered image frame sequence addressed by a zero-padded path
//! pattern. Sources are immutable once constructed; changing the source of a
//! running instance always goes through a full rebind cycle.
//!
//! A `Catalog` is an ordered list of sources loaded from JSON, with
//! wrap-around index selection and an optional duration override.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Intrinsic media dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

fn default_padding() -> u32 {
    4
}

fn default_extension() -> String {
    "jpg".to_string()
}

/// Kind-specific part of a media source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaKind {
    /// Continuous video, scrubbed by seeking
    Video {
        url: String,
        /// Poster image shown before the first frame is available
        #[serde(default)]
        poster: Option<String>,
    },
    /// Discrete still-image sequence, scrubbed by blitting one frame
    FrameSequence {
        /// Path or URL prefix; full frame path is prefix + padded index + extension
        prefix: String,
        frame_count: u32,
        #[serde(default = "default_padding")]
        padding: u32,
        #[serde(default = "default_extension")]
        extension: String,
    },
}

/// One scrubbable media asset plus its scrub-region configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSource {
    #[serde(flatten)]
    pub kind: MediaKind,
    /// Scrub region length in viewport heights (the virtual region spans
    /// duration_heights * 100vh of page height)
    pub duration_heights: f64,
    pub dimensions: Dimensions,
    #[serde(default)]
    pub aria_label: Option<String>,
}

impl MediaSource {
    /// Convenience constructor for a video source.
    pub fn video(url: impl Into<String>, duration_heights: f64, dimensions: Dimensions) -> Self {
        Self {
            kind: MediaKind::Video {
                url: url.into(),
                poster: None,
            },
            duration_heights,
            dimensions,
            aria_label: None,
        }
    }

    /// Convenience constructor for a frame-sequence source.
    pub fn frames(
        prefix: impl Into<String>,
        frame_count: u32,
        duration_heights: f64,
        dimensions: Dimensions,
    ) -> Self {
        Self {
            kind: MediaKind::FrameSequence {
                prefix: prefix.into(),
                frame_count,
                padding: default_padding(),
                extension: default_extension(),
            },
            duration_heights,
            dimensions,
            aria_label: None,
        }
    }

    /// The primary reference: video URL or sequence prefix.
    pub fn reference(&self) -> &str {
        match &self.kind {
            MediaKind::Video { url, .. } => url,
            MediaKind::FrameSequence { prefix, .. } => prefix,
        }
    }

    /// Frame count for sequences, None for video.
    pub fn frame_count(&self) -> Option<u32> {
        match &self.kind {
            MediaKind::Video { .. } => None,
            MediaKind::FrameSequence { frame_count, .. } => Some(*frame_count),
        }
    }

    /// Full path of frame `index`: `prefix + zero-padded index + "." + extension`.
    ///
    /// Returns None for video sources and out-of-range indices.
    pub fn frame_path(&self, index: u32) -> Option<String> {
        match &self.kind {
            MediaKind::Video { .. } => None,
            MediaKind::FrameSequence {
                prefix,
                frame_count,
                padding,
                extension,
            } => {
                if index >= *frame_count {
                    return None;
                }
                Some(format!(
                    "{}{:0width$}.{}",
                    prefix,
                    index,
                    extension,
                    width = *padding as usize
                ))
            }
        }
    }

    /// Validate the source; a failed validation is a configuration error,
    /// never something the playback layer recovers from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reference().is_empty() {
            return Err(ConfigError::MissingReference);
        }
        if !self.duration_heights.is_finite() || self.duration_heights <= 0.0 {
            return Err(ConfigError::InvalidDuration(self.duration_heights));
        }
        if self.dimensions.width == 0 || self.dimensions.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if let MediaKind::FrameSequence { frame_count, .. } = &self.kind {
            if *frame_count == 0 {
                return Err(ConfigError::ZeroFrameCount);
            }
        }
        Ok(())
    }
}

/// Ordered list of media sources, selectable by index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub sources: Vec<MediaSource>,
}

impl Catalog {
    pub fn new(sources: Vec<MediaSource>) -> Self {
        Self { sources }
    }

    /// Parse a catalog from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Catalog(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Select a source by wrap-around index, optionally overriding the scrub
    /// duration. The override is ignored unless it is finite and greater
    /// than one viewport height.
    pub fn select(
        &self,
        index: usize,
        duration_override: Option<f64>,
    ) -> Result<MediaSource, ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        let mut source = self.sources[index % self.sources.len()].clone();
        if let Some(d) = duration_override {
            if d.is_finite() && d > 1.0 {
                source.duration_heights = d;
            }
        }
        source.validate()?;
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq_source() -> MediaSource {
        MediaSource::frames("/frames/shot_", 176, 3.5, Dimensions::new(376, 668))
    }

    #[test]
    fn test_frame_path_padding() {
        let source = seq_source();
        assert_eq!(source.frame_path(0).unwrap(), "/frames/shot_0000.jpg");
        assert_eq!(source.frame_path(88).unwrap(), "/frames/shot_0088.jpg");
        assert_eq!(source.frame_path(175).unwrap(), "/frames/shot_0175.jpg");
        // Out of range and video sources have no frame paths
        assert!(source.frame_path(176).is_none());
        let video = MediaSource::video("/clip.mp4", 4.0, Dimensions::new(376, 668));
        assert!(video.frame_path(0).is_none());
    }

    #[test]
    fn test_validation_errors() {
        let mut source = seq_source();
        source.duration_heights = f64::NAN;
        assert!(matches!(
            source.validate(),
            Err(ConfigError::InvalidDuration(_))
        ));

        let empty_ref = MediaSource::video("", 4.0, Dimensions::new(376, 668));
        assert_eq!(empty_ref.validate(), Err(ConfigError::MissingReference));

        let zero_frames = MediaSource::frames("/f/", 0, 3.5, Dimensions::new(376, 668));
        assert_eq!(zero_frames.validate(), Err(ConfigError::ZeroFrameCount));

        let flat = MediaSource::video("/clip.mp4", 4.0, Dimensions::new(0, 668));
        assert_eq!(flat.validate(), Err(ConfigError::InvalidDimensions));
    }

    #[test]
    fn test_catalog_json_and_select() {
        let json = r#"{
            "sources": [
                {
                    "kind": "video",
                    "url": "/Vertical_test_scroll-re.mp4",
                    "poster": "/Vertical_test_scroll-poster.jpg",
                    "duration_heights": 4.0,
                    "dimensions": { "width": 376, "height": 668 }
                },
                {
                    "kind": "frame_sequence",
                    "prefix": "/frames/shot_",
                    "frame_count": 176,
                    "duration_heights": 3.5,
                    "dimensions": { "width": 376, "height": 668 }
                }
            ]
        }"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);

        // Defaulted padding/extension on the sequence entry
        let seq = catalog.select(1, None).unwrap();
        assert_eq!(seq.frame_path(3).unwrap(), "/frames/shot_0003.jpg");

        // Wrap-around selection
        let wrapped = catalog.select(2, None).unwrap();
        assert_eq!(wrapped.reference(), "/Vertical_test_scroll-re.mp4");
    }

    #[test]
    fn test_catalog_duration_override_guard() {
        let catalog = Catalog::new(vec![seq_source()]);
        // Valid override applies
        let s = catalog.select(0, Some(6.0)).unwrap();
        assert_eq!(s.duration_heights, 6.0);
        // <= 1 and non-finite overrides are ignored
        let s = catalog.select(0, Some(0.5)).unwrap();
        assert_eq!(s.duration_heights, 3.5);
        let s = catalog.select(0, Some(f64::NAN)).unwrap();
        assert_eq!(s.duration_heights, 3.5);
    }

    #[test]
    fn test_empty_catalog_is_config_error() {
        let catalog = Catalog::default();
        assert_eq!(catalog.select(0, None), Err(ConfigError::EmptyCatalog));
    }
}
