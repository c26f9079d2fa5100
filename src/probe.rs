//! Autoplay capability probe.
//!
//! A muted play-then-pause cycle tells us whether the runtime permits
//! autoplay; denial is the usual signal for device power-saving restrictions.
//! The result only selects the playback initiation strategy - scrubbing works
//! either way.

use log::{debug, warn};

use crate::surface::VideoSurface;

/// Tri-state capability. Starts Unknown, resolves exactly once per binding,
/// never reverts to Unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoplayCapability {
    #[default]
    Unknown,
    Capable,
    Incapable,
}

impl AutoplayCapability {
    pub fn is_resolved(self) -> bool {
        self != AutoplayCapability::Unknown
    }
}

/// Run the play/pause probe once against the surface.
///
/// The element is muted first so the cycle stays silent on real hosts. A
/// denied play is expected under autoplay restrictions and is recorded, not
/// treated as an error.
pub fn probe(surface: &mut dyn VideoSurface) -> AutoplayCapability {
    surface.set_muted(true);
    match surface.play() {
        Ok(()) => {
            surface.pause();
            debug!("autoplay probe succeeded");
            AutoplayCapability::Capable
        }
        Err(denied) => {
            warn!("autoplay probe denied ({}), likely power saving mode", denied);
            AutoplayCapability::Incapable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SoftwareVideo;

    #[test]
    fn test_probe_success_means_capable() {
        let mut video = SoftwareVideo::new();
        assert_eq!(probe(&mut video), AutoplayCapability::Capable);
        // The probe cycle must leave the element paused and muted
        assert!(!video.is_playing());
        assert!(video.is_muted());
    }

    #[test]
    fn test_probe_mutes_before_playing() {
        let mut video = SoftwareVideo::restricted();
        assert!(!video.is_muted());
        probe(&mut video);
        // Muted even when play was denied: the mute precedes the attempt
        assert!(video.is_muted());
    }

    #[test]
    fn test_probe_denial_means_incapable() {
        let mut video = SoftwareVideo::restricted();
        assert_eq!(probe(&mut video), AutoplayCapability::Incapable);
    }

    #[test]
    fn test_default_is_unknown() {
        let capability = AutoplayCapability::default();
        assert_eq!(capability, AutoplayCapability::Unknown);
        assert!(!capability.is_resolved());
        assert!(AutoplayCapability::Incapable.is_resolved());
    }
}
