//! CLOCK (second-chance) replacement policy.
//!
//! A hand sweeps the frames in a circle. Referenced frames lose their
//! reference bit and are skipped once; the first unreferenced, unpinned
//! frame is the victim. Empty frames are taken immediately.

use crate::buffer::FrameDescriptor;
use crate::common::FrameId;

/// Outcome of a successful clock sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Victim {
    /// The frame holds no page and can be used as is.
    Free(FrameId),
    /// The frame holds an unpinned page that must be written back (if
    /// dirty) and unmapped before reuse.
    Evict(FrameId),
}

impl Victim {
    #[inline]
    pub fn frame_id(self) -> FrameId {
        match self {
            Victim::Free(frame_id) | Victim::Evict(frame_id) => frame_id,
        }
    }
}

/// Clock hand over a fixed-size pool.
///
/// The replacer owns no frame state; it reads and clears reference bits
/// on the descriptor table passed to [`find_victim`](Self::find_victim).
///
/// # Exhaustion
/// A sweep gives up once it has seen every frame pinned. Pinned frames are
/// counted once each, so revisiting the same pinned frame after clearing
/// other frames' reference bits cannot end the sweep early. Every sweep is
/// bounded by `2 * pool_size` steps: one lap to clear reference bits and a
/// second to find an unreferenced victim.
#[derive(Debug)]
pub struct ClockReplacer {
    hand: usize,
    pool_size: usize,
    /// Frames seen pinned during the current sweep.
    seen_pinned: Vec<bool>,
}

impl ClockReplacer {
    /// Create a replacer for `pool_size` frames.
    ///
    /// The hand starts on the last frame so the first sweep begins at
    /// frame 0.
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn new(pool_size: usize) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");
        Self {
            hand: pool_size - 1,
            pool_size,
            seen_pinned: vec![false; pool_size],
        }
    }

    /// Frame the hand currently points at.
    #[inline]
    pub fn hand(&self) -> FrameId {
        FrameId::new(self.hand)
    }

    #[inline]
    fn advance(&mut self) {
        self.hand = (self.hand + 1) % self.pool_size;
    }

    /// Sweep for a frame to reuse.
    ///
    /// Returns `None` when every frame is pinned. Never selects a pinned
    /// frame. Clears the reference bit of each referenced frame it passes.
    pub fn find_victim(&mut self, descriptors: &mut [FrameDescriptor]) -> Option<Victim> {
        debug_assert_eq!(descriptors.len(), self.pool_size);
        self.seen_pinned.fill(false);
        let mut pinned = 0;

        for _ in 0..2 * self.pool_size {
            self.advance();
            let desc = &mut descriptors[self.hand];
            let frame_id = desc.frame_id();

            if !desc.is_valid() {
                return Some(Victim::Free(frame_id));
            }
            if desc.is_referenced() {
                desc.clear_referenced();
                continue;
            }
            if desc.is_pinned() {
                if !self.seen_pinned[self.hand] {
                    self.seen_pinned[self.hand] = true;
                    pinned += 1;
                    if pinned == self.pool_size {
                        return None;
                    }
                }
                continue;
            }
            return Some(Victim::Evict(frame_id));
        }

        None
    }
}
