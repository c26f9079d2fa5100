//! Frame cache shared between loader workers and the frame-sequence driver.
//!
//! Fixed-size slot store, one slot per frame index, populated asynchronously
//! and in arbitrary order as image requests resolve. The driver reads it on
//! every scroll tick; a missing slot means "skip the draw", never an error.
//!
//! One cache belongs to exactly one binding generation. Rebinding creates a
//! fresh cache and bumps the worker epoch; a late insert into a superseded
//! cache is harmless because no driver reads it anymore.

use std::sync::{Arc, Mutex};

use image::RgbaImage;
use log::trace;

/// Decoded frame pixels, shared without copying.
pub type CachedFrame = Arc<RgbaImage>;

/// Index-addressable store of decoded frames, length fixed at creation.
#[derive(Debug)]
pub struct FrameCache {
    slots: Mutex<Vec<Option<CachedFrame>>>,
}

impl FrameCache {
    pub fn new(frame_count: u32) -> Self {
        Self {
            slots: Mutex::new(vec![None; frame_count as usize]),
        }
    }

    /// Number of slots (equals the configured frame count).
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a decoded frame. Out-of-range indices are ignored rather than
    /// rejected; the loader computes them from the same frame count, so a
    /// mismatch only happens with a stale request.
    pub fn insert(&self, index: u32, image: RgbaImage) {
        let mut slots = self.slots.lock().unwrap();
        if let Some(slot) = slots.get_mut(index as usize) {
            *slot = Some(Arc::new(image));
        } else {
            trace!("dropping frame {} (out of range)", index);
        }
    }

    /// Get a frame if it has been loaded.
    pub fn get(&self, index: u32) -> Option<CachedFrame> {
        self.slots
            .lock()
            .unwrap()
            .get(index as usize)
            .and_then(|slot| slot.clone())
    }

    pub fn contains(&self, index: u32) -> bool {
        self.slots
            .lock()
            .unwrap()
            .get(index as usize)
            .is_some_and(|slot| slot.is_some())
    }

    /// How many frames have resolved so far.
    pub fn loaded_count(&self) -> usize {
        self.slots
            .lock()
            .unwrap()
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(px: u8) -> RgbaImage {
        RgbaImage::from_pixel(2, 2, image::Rgba([px, px, px, 255]))
    }

    #[test]
    fn test_insert_and_get() {
        let cache = FrameCache::new(4);
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.loaded_count(), 0);

        cache.insert(2, frame(7));
        assert!(cache.contains(2));
        assert!(!cache.contains(0));
        assert_eq!(cache.get(2).unwrap().get_pixel(0, 0).0[0], 7);
        assert_eq!(cache.loaded_count(), 1);
    }

    #[test]
    fn test_unordered_population() {
        let cache = FrameCache::new(3);
        cache.insert(2, frame(2));
        cache.insert(0, frame(0));
        assert_eq!(cache.loaded_count(), 2);
        assert!(cache.get(1).is_none());
    }

    #[test]
    fn test_out_of_range_insert_ignored() {
        let cache = FrameCache::new(2);
        cache.insert(5, frame(1));
        assert_eq!(cache.loaded_count(), 0);
    }
}
