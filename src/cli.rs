use clap::Parser;
use std::path::PathBuf;

/// Scroll-driven media scrubbing demo: binds a headless surface and sweeps
/// a simulated scroll position through the virtual region.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Catalog JSON file listing media sources
    #[arg(short = 'c', long = "catalog", value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Which catalog entry to show (wraps around)
    #[arg(short = 'i', long = "index", value_name = "N", default_value = "0")]
    pub index: usize,

    /// Override scrub duration in viewport heights (ignored unless > 1)
    #[arg(short = 'd', long = "duration", value_name = "HEIGHTS")]
    pub duration: Option<f64>,

    /// Video URL or file to scrub (alternative to --catalog)
    #[arg(long = "video", value_name = "URL")]
    pub video: Option<String>,

    /// Frame-sequence prefix (pairs with --frame-count)
    #[arg(long = "frames", value_name = "PREFIX")]
    pub frames: Option<String>,

    /// Number of frames in the sequence
    #[arg(long = "frame-count", value_name = "N")]
    pub frame_count: Option<u32>,

    /// Frame file extension
    #[arg(long = "frame-ext", value_name = "EXT", default_value = "jpg")]
    pub frame_ext: String,

    /// Intrinsic media duration reported by the headless video element
    #[arg(long = "media-duration", value_name = "SECONDS", default_value = "10.0")]
    pub media_duration: f64,

    /// Simulated viewport width
    #[arg(long = "viewport-width", value_name = "PX", default_value = "376")]
    pub viewport_width: f64,

    /// Simulated viewport height
    #[arg(long = "viewport-height", value_name = "PX", default_value = "668")]
    pub viewport_height: f64,

    /// Number of scroll steps in the sweep
    #[arg(short = 's', long = "steps", value_name = "N", default_value = "40")]
    pub steps: u32,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}
