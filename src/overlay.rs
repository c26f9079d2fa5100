//! Debug overlay: textual marker lines for the virtual-region boundaries.
//!
//! Diagnostic only, rendered by the demo in non-release builds. Has no
//! effect on scrub semantics.

use crate::timeline::RegionMarkers;

/// Render marker lines for the region boundaries, one per line.
pub fn render_markers(markers: &RegionMarkers) -> String {
    format!(
        "scrub-start ──────── {:.1}px\nscrub-end ────────── {:.1}px\ncontainer height ─── {:.1}px",
        markers.start, markers.end, markers.total_height
    )
}
