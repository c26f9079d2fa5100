//! Error types for configuration and asset fetching.
//!
//! Fetch failures are always recovered from (degraded streaming, skipped
//! frames) and never cross the controller boundary. Configuration errors are
//! the only fatal class: a missing media reference cannot be rendered around.

/// Configuration errors - reported upward, never recovered internally.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Media reference (URL or sequence prefix) is empty
    MissingReference,
    /// duration_heights must be finite and positive
    InvalidDuration(f64),
    /// Frame sequence with zero frames
    ZeroFrameCount,
    /// Surface dimensions with a zero side
    InvalidDimensions,
    /// Catalog has no entries to select from
    EmptyCatalog,
    /// Catalog file could not be parsed
    Catalog(String),
    /// Surface kind does not match the media kind (video vs canvas)
    SurfaceMismatch,
    /// Operation requires a bound, undisposed instance
    NotBound,
    /// bind() called on an instance that already holds a binding
    AlreadyBound,
    /// Operation on a disposed instance
    Disposed,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingReference => write!(f, "media reference is empty"),
            ConfigError::InvalidDuration(d) => {
                write!(f, "duration_heights must be finite and positive, got {}", d)
            }
            ConfigError::ZeroFrameCount => write!(f, "frame sequence needs at least one frame"),
            ConfigError::InvalidDimensions => write!(f, "surface dimensions must be non-zero"),
            ConfigError::EmptyCatalog => write!(f, "catalog has no media sources"),
            ConfigError::Catalog(e) => write!(f, "catalog error: {}", e),
            ConfigError::SurfaceMismatch => {
                write!(f, "surface kind does not match the media source kind")
            }
            ConfigError::NotBound => write!(f, "no active binding"),
            ConfigError::AlreadyBound => write!(f, "instance already holds a binding"),
            ConfigError::Disposed => write!(f, "instance has been disposed"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Asset fetch errors - internal to the loader, recovered via degradation.
#[derive(Debug, Clone)]
pub enum FetchError {
    Io(String),
    Http(String),
    Decode(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Io(e) => write!(f, "I/O error: {}", e),
            FetchError::Http(e) => write!(f, "HTTP error: {}", e),
            FetchError::Decode(e) => write!(f, "decode error: {}", e),
        }
    }
}

impl std::error::Error for FetchError {}
