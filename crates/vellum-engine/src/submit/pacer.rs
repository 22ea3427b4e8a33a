use std::sync::Arc;
use std::time::Duration;

use crate::coords::Viewport;
use crate::gate::{FrameGate, FrameSlot};

use super::{FramePhase, SubmitterConfig};

/// Upper bound on how long teardown waits for in-flight frames.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Admission and bookkeeping shared by both submitters.
#[derive(Debug)]
pub(super) struct FramePacer {
    label: &'static str,
    gate: Arc<FrameGate>,
    next_frame: u64,
    phase: FramePhase,
    /// Result of the last drain; cleared when a new frame is admitted.
    drained: Option<bool>,
}

impl FramePacer {
    pub(super) fn new(label: &'static str, config: &SubmitterConfig) -> Self {
        Self {
            label,
            gate: Arc::new(FrameGate::new(config.max_frames_in_flight)),
            next_frame: 0,
            phase: FramePhase::Idle,
            drained: None,
        }
    }

    /// Admits the next frame, blocking while the gate is full.
    ///
    /// Returns `None` for a zero-area viewport, without touching the gate.
    pub(super) fn admit(&mut self, viewport: Viewport) -> Option<FrameSlot> {
        if viewport.is_empty() {
            log::trace!(
                "{}: skipping frame for empty viewport {}x{}",
                self.label,
                viewport.width,
                viewport.height
            );
            self.phase = FramePhase::Idle;
            return None;
        }

        let frame_index = self.next_frame;
        self.next_frame += 1;
        self.drained = None;

        let slot = self.gate.admit(frame_index);
        self.enter(FramePhase::Admitted, frame_index);
        Some(slot)
    }

    #[inline]
    pub(super) fn enter(&mut self, phase: FramePhase, frame_index: u64) {
        log::trace!("{} frame {frame_index}: {phase}", self.label);
        self.phase = phase;
    }

    #[inline]
    pub(super) fn phase(&self) -> FramePhase {
        self.phase
    }

    #[inline]
    pub(super) fn gate(&self) -> &Arc<FrameGate> {
        &self.gate
    }

    #[inline]
    pub(super) fn frames_submitted(&self) -> u64 {
        self.next_frame
    }

    /// Waits for every committed frame to complete. Returns `false` on timeout.
    ///
    /// Only the first call after the last admitted frame waits; later calls
    /// report the same result.
    pub(super) fn drain(&mut self) -> bool {
        if let Some(drained) = self.drained {
            return drained;
        }
        let outstanding = self.gate.outstanding();
        if outstanding > 0 {
            log::debug!("{}: waiting for {outstanding} in-flight frame(s)", self.label);
        }
        let drained = self.gate.wait_idle_timeout(DRAIN_TIMEOUT);
        if !drained {
            log::warn!(
                "{}: {} frame(s) still in flight after {DRAIN_TIMEOUT:?}; tearing down anyway",
                self.label,
                self.gate.outstanding()
            );
        }
        self.drained = Some(drained);
        self.phase = FramePhase::Idle;
        drained
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn pacer() -> FramePacer {
        FramePacer::new("test", &SubmitterConfig::default())
    }

    #[test]
    fn skipped_frame_returns_phase_to_idle() {
        let mut pacer = pacer();
        let slot = pacer.admit(Viewport::new(10.0, 10.0, 1.0));
        assert!(slot.is_some());
        pacer.enter(FramePhase::Committed, 0);
        drop(slot);

        assert!(pacer.admit(Viewport::new(0.0, 10.0, 1.0)).is_none());
        assert_eq!(pacer.phase(), FramePhase::Idle);
        assert_eq!(pacer.frames_submitted(), 1);
    }

    #[test]
    fn timed_out_drain_is_not_repeated() {
        let mut pacer = pacer();
        let slot = pacer.admit(Viewport::new(10.0, 10.0, 1.0));

        let started = Instant::now();
        assert!(!pacer.drain());
        assert!(started.elapsed() >= DRAIN_TIMEOUT / 2);

        let again = Instant::now();
        assert!(!pacer.drain());
        assert!(again.elapsed() < DRAIN_TIMEOUT / 2);

        drop(slot);
    }

    #[test]
    fn admitting_a_frame_rearms_the_drain() {
        let mut pacer = pacer();
        assert!(pacer.drain());

        let slot = pacer.admit(Viewport::new(10.0, 10.0, 1.0));
        assert_eq!(pacer.gate().outstanding(), 1);
        drop(slot);
        assert!(pacer.drain());
        assert_eq!(pacer.gate().outstanding(), 0);
    }
}
