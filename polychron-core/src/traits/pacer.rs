//! Pacing trait for animation and cascade delays
//!
//! Animation phases and cascade staggering are timed by blocking waits
//! in the calling context. The wait deliberately holds up further
//! dispatch and keyframe advancement; inbound control traffic keeps
//! queueing at the link layer and is drained once the sequence ends.

/// Trait for blocking waits between dispatches.
pub trait Pacer {
    /// Wait for `ms` milliseconds.
    fn pace(&mut self, ms: u32);
}

/// Pacer that records requested waits instead of sleeping.
///
/// Intended for host tests that assert on dispatch timing.
#[derive(Debug, Default)]
pub struct RecordingPacer {
    /// Every wait requested, in order.
    pub waits: heapless::Vec<u32, 128>,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of all recorded waits in milliseconds.
    pub fn total_ms(&self) -> u32 {
        self.waits.iter().sum()
    }
}

impl Pacer for RecordingPacer {
    fn pace(&mut self, ms: u32) {
        let _ = self.waits.push(ms);
    }
}
