//! Headless demo binary.
//!
//! Resolves one media source (from a catalog file or direct flags), binds a
//! software surface, then sweeps a simulated scroll position through the
//! virtual region while polling the loader - the same call pattern a real
//! host's event loop would drive.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use log::{info, warn};

use scrubba::cli::Args;
use scrubba::controller::ScrubController;
use scrubba::overlay;
use scrubba::source::{Catalog, Dimensions, MediaKind, MediaSource};
use scrubba::surface::{PixelCanvas, SoftwareVideo, SurfaceBinding};
use scrubba::timeline::Viewport;
use scrubba::workers::Workers;

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

/// Resolve the media source from the catalog or direct flags. A missing
/// reference is a configuration error: report "not available", do not try
/// to partially render.
fn resolve_source(args: &Args) -> anyhow::Result<MediaSource> {
    if let Some(path) = &args.catalog {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading catalog {}", path.display()))?;
        let catalog = Catalog::from_json(&text)?;
        return Ok(catalog.select(args.index, args.duration)?);
    }

    if let Some(url) = &args.video {
        let mut source =
            MediaSource::video(url.clone(), args.duration.unwrap_or(4.0), Dimensions::new(376, 668));
        source.aria_label = Some("demo video background".to_string());
        source.validate()?;
        return Ok(source);
    }

    if let (Some(prefix), Some(count)) = (&args.frames, args.frame_count) {
        let mut source = MediaSource::frames(
            prefix.clone(),
            count,
            args.duration.unwrap_or(3.5),
            Dimensions::new(376, 668),
        );
        if let MediaKind::FrameSequence { extension, .. } = &mut source.kind {
            *extension = args.frame_ext.clone();
        }
        source.validate()?;
        return Ok(source);
    }

    bail!("media not available: no catalog, --video or --frames/--frame-count supplied");
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbosity);

    let source = resolve_source(&args)?;
    info!(
        "scrubbing {} over {:.1} viewport heights",
        source.reference(),
        source.duration_heights
    );

    let workers = Arc::new(Workers::new(4));
    let viewport = Viewport::new(args.viewport_width, args.viewport_height);

    let mut controller = ScrubController::new(source.clone(), workers)?;

    // Keep shared handles so this host can inspect the surfaces after the
    // driver takes ownership of its binding.
    let video = Arc::new(Mutex::new(SoftwareVideo::new()));
    let canvas = Arc::new(Mutex::new(PixelCanvas::new(source.dimensions)));
    let binding = match &source.kind {
        MediaKind::Video { .. } => SurfaceBinding::Video(Box::new(Arc::clone(&video))),
        MediaKind::FrameSequence { .. } => SurfaceBinding::Canvas(Box::new(Arc::clone(&canvas))),
    };
    controller.bind(binding, viewport, 0.0)?;

    if cfg!(debug_assertions) {
        if let Some(markers) = controller.markers() {
            println!("{}", overlay::render_markers(&markers));
        }
    }

    let markers = controller
        .markers()
        .context("bound controller always has a timeline")?;

    let mut metadata_reported = false;
    for step in 0..=args.steps {
        let t = f64::from(step) / f64::from(args.steps.max(1));
        let offset = markers.start + t * (markers.end - markers.start);

        controller.poll();

        // A real element reports metadata once enough of the source loaded;
        // the headless one reports it as soon as a source is attached.
        if !metadata_reported && video.lock().unwrap().source_url().is_some() {
            video.lock().unwrap().set_metadata(args.media_duration);
            metadata_reported = true;
        }

        controller.on_scroll(offset);

        let progress = controller.last_progress().unwrap_or(0.0);
        match &source.kind {
            MediaKind::Video { .. } => {
                println!(
                    "scroll {:7.1}px  progress {:5.3}  position {:6.3}s",
                    offset,
                    progress,
                    video.lock().unwrap().position()
                );
            }
            MediaKind::FrameSequence { frame_count, .. } => {
                println!(
                    "scroll {:7.1}px  progress {:5.3}  frame {:>4}/{}  loaded {}",
                    offset,
                    progress,
                    controller
                        .last_progress()
                        .map(|p| (p * f64::from(frame_count - 1)).round() as u32)
                        .unwrap_or(0),
                    frame_count - 1,
                    controller.frames_loaded().unwrap_or(0)
                );
            }
        }

        std::thread::sleep(Duration::from_millis(16));
    }

    // Let stragglers resolve once more before reporting
    controller.poll();
    match controller.degraded() {
        Some(true) => warn!("playback ran in degraded mode (remote streaming)"),
        Some(false) => info!("playback used the prefetched local handle"),
        None => {}
    }
    if let Some(loaded) = controller.frames_loaded() {
        info!("{} frames resolved", loaded);
    }

    controller.dispose();
    Ok(())
}
