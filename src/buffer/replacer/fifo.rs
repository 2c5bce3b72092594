//! FIFO (First-In-First-Out) replacement policy.

use std::collections::VecDeque;

use crate::common::FrameId;

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    queued: bool,
    evictable: bool,
}

/// Evicts unpinned frames in the order they were first loaded.
///
/// A frame joins the queue the first time it is pinned and keeps its
/// place while pinned; it only leaves when chosen as a victim.
#[derive(Debug)]
pub struct FifoReplacer {
    /// Front = oldest.
    queue: VecDeque<FrameId>,
    slots: Vec<Slot>,
    evictable: usize,
}

impl FifoReplacer {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity),
            slots: vec![Slot::default(); capacity],
            evictable: 0,
        }
    }

    /// The frame now has at least one pin.
    pub fn pinned(&mut self, frame_id: FrameId) {
        self.enqueue(frame_id);
        self.set_evictable(frame_id, false);
    }

    /// The frame's last pin was released.
    pub fn unpinned(&mut self, frame_id: FrameId) {
        self.enqueue(frame_id);
        self.set_evictable(frame_id, true);
    }

    /// Remove and return the oldest evictable frame.
    pub fn victim(&mut self) -> Option<FrameId> {
        let pos = self
            .queue
            .iter()
            .position(|frame_id| self.slots[frame_id.0].evictable)?;
        let frame_id = self.queue.remove(pos)?;
        self.slots[frame_id.0] = Slot::default();
        self.evictable -= 1;
        Some(frame_id)
    }

    pub fn evictable_count(&self) -> usize {
        self.evictable
    }

    fn enqueue(&mut self, frame_id: FrameId) {
        let slot = &mut self.slots[frame_id.0];
        if !slot.queued {
            slot.queued = true;
            self.queue.push_back(frame_id);
        }
    }

    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        let slot = &mut self.slots[frame_id.0];
        match (slot.evictable, evictable) {
            (false, true) => self.evictable += 1,
            (true, false) => self.evictable -= 1,
            _ => {}
        }
        slot.evictable = evictable;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_victims_in_load_order() {
        let mut replacer = FifoReplacer::new(3);
        for i in 0..3 {
            replacer.pinned(FrameId::new(i));
        }
        for i in [2, 0, 1] {
            replacer.unpinned(FrameId::new(i));
        }
        // Re-pinning does not move a frame to the back.
        replacer.pinned(FrameId::new(0));
        replacer.unpinned(FrameId::new(0));

        assert_eq!(replacer.evictable_count(), 3);
        assert_eq!(replacer.victim(), Some(FrameId::new(0)));
        assert_eq!(replacer.victim(), Some(FrameId::new(1)));
        assert_eq!(replacer.victim(), Some(FrameId::new(2)));
        assert_eq!(replacer.victim(), None);
        assert_eq!(replacer.evictable_count(), 0);
    }

    #[test]
    fn test_pinned_frame_keeps_its_place() {
        let mut replacer = FifoReplacer::new(3);
        replacer.pinned(FrameId::new(0));
        replacer.pinned(FrameId::new(1));
        replacer.unpinned(FrameId::new(1));

        assert_eq!(replacer.victim(), Some(FrameId::new(1)));
        assert_eq!(replacer.victim(), None);

        replacer.pinned(FrameId::new(2));
        replacer.unpinned(FrameId::new(2));
        replacer.unpinned(FrameId::new(0));
        assert_eq!(replacer.victim(), Some(FrameId::new(0)));
    }

    #[test]
    fn test_repeated_unpin_counts_once() {
        let mut replacer = FifoReplacer::new(2);
        replacer.unpinned(FrameId::new(1));
        replacer.unpinned(FrameId::new(1));
        assert_eq!(replacer.evictable_count(), 1);
        replacer.pinned(FrameId::new(1));
        assert_eq!(replacer.evictable_count(), 0);
    }
}
