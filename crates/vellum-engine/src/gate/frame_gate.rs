use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::{FrameSlot, GateError};

/// Frames the GPU may have queued before submission blocks.
///
/// Three frames of latency keeps the device busy without unbounded queuing.
pub const DEFAULT_MAX_FRAMES_IN_FLIGHT: usize = 3;

/// Counting gate bounding concurrently in-flight frames.
///
/// `acquire` and `release` may be called from different threads. The count of
/// outstanding permits always stays in `[0, capacity]`.
#[derive(Debug)]
pub struct FrameGate {
    capacity: usize,
    available: Mutex<usize>,
    /// Signalled once per released permit.
    permit_returned: Condvar,
    /// Signalled when every permit is back.
    drained: Condvar,
}

impl FrameGate {
    /// Creates a gate with `capacity` permits.
    ///
    /// # Panics
    /// Panics if `capacity` is zero; such a gate could never admit a frame.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "frame gate capacity must be at least 1");
        Self {
            capacity,
            available: Mutex::new(capacity),
            permit_returned: Condvar::new(),
            drained: Condvar::new(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        *self.lock()
    }

    /// Permits currently held (frames admitted but not yet completed).
    pub fn outstanding(&self) -> usize {
        self.capacity - self.available()
    }

    /// Blocks until a permit is free, then takes it.
    pub fn acquire(&self) {
        let guard = self.lock();
        let mut available = self
            .permit_returned
            .wait_while(guard, |available| *available == 0)
            .unwrap_or_else(PoisonError::into_inner);
        *available -= 1;
    }

    /// Takes a permit if one is free right now.
    pub fn try_acquire(&self) -> bool {
        let mut available = self.lock();
        if *available == 0 {
            return false;
        }
        *available -= 1;
        true
    }

    /// Like [`acquire`](Self::acquire), but gives up after `timeout`.
    pub fn acquire_timeout(&self, timeout: Duration) -> Result<(), GateError> {
        let guard = self.lock();
        let (mut available, _) = self
            .permit_returned
            .wait_timeout_while(guard, timeout, |available| *available == 0)
            .unwrap_or_else(PoisonError::into_inner);

        if *available == 0 {
            return Err(GateError::Timeout(timeout));
        }
        *available -= 1;
        Ok(())
    }

    /// Returns a permit and wakes one waiter.
    ///
    /// Releasing a permit that was never acquired is a caller bug. Debug builds
    /// assert; release builds log the violation and ignore the call.
    pub fn release(&self) {
        let mut available = self.lock();
        if *available >= self.capacity {
            debug_assert!(
                false,
                "FrameGate::release called with no outstanding permits (capacity {})",
                self.capacity
            );
            log::error!("frame gate over-released; ignoring (capacity {})", self.capacity);
            return;
        }

        *available += 1;
        let idle = *available == self.capacity;
        drop(available);

        self.permit_returned.notify_one();
        if idle {
            self.drained.notify_all();
        }
    }

    /// Acquires a permit and wraps it in an owned [`FrameSlot`].
    pub fn admit(self: &Arc<Self>, frame_index: u64) -> FrameSlot {
        self.acquire();
        FrameSlot::new(Arc::clone(self), frame_index)
    }

    /// Blocks until every permit has been returned.
    pub fn wait_idle(&self) {
        let guard = self.lock();
        let _idle = self
            .drained
            .wait_while(guard, |available| *available < self.capacity)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Bounded [`wait_idle`](Self::wait_idle). Returns `true` if the gate drained.
    pub fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        let guard = self.lock();
        let (available, _) = self
            .drained
            .wait_timeout_while(guard, timeout, |available| *available < self.capacity)
            .unwrap_or_else(PoisonError::into_inner);
        *available == self.capacity
    }

    // The guarded value is a plain counter, so a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.available.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FrameGate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAMES_IN_FLIGHT)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;

    use super::*;

    #[test]
    fn starts_with_all_permits_available() {
        let gate = FrameGate::default();
        assert_eq!(gate.capacity(), 3);
        assert_eq!(gate.available(), 3);
        assert_eq!(gate.outstanding(), 0);
    }

    #[test]
    fn try_acquire_stops_at_capacity() {
        let gate = FrameGate::new(2);
        assert!(gate.try_acquire());
        assert!(gate.try_acquire());
        assert!(!gate.try_acquire());
        assert_eq!(gate.outstanding(), 2);

        gate.release();
        assert!(gate.try_acquire());
    }

    #[test]
    fn acquire_timeout_reports_timeout_when_full() {
        let gate = FrameGate::new(1);
        gate.acquire();
        let err = gate.acquire_timeout(Duration::from_millis(20)).unwrap_err();
        assert_eq!(err, GateError::Timeout(Duration::from_millis(20)));
        assert_eq!(gate.outstanding(), 1);
    }

    #[test]
    fn acquire_timeout_succeeds_when_released_in_time() {
        let gate = Arc::new(FrameGate::new(1));
        gate.acquire();

        let releaser = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                gate.release();
            })
        };

        assert!(gate.acquire_timeout(Duration::from_secs(5)).is_ok());
        releaser.join().unwrap();
        assert_eq!(gate.outstanding(), 1);
    }

    #[test]
    fn fourth_acquire_blocks_until_a_release() {
        let gate = Arc::new(FrameGate::default());
        for _ in 0..3 {
            gate.acquire();
        }

        let admitted = Arc::new(AtomicBool::new(false));
        let (started_tx, started_rx) = mpsc::channel();
        let waiter = {
            let gate = Arc::clone(&gate);
            let admitted = Arc::clone(&admitted);
            thread::spawn(move || {
                started_tx.send(()).unwrap();
                gate.acquire();
                admitted.store(true, Ordering::SeqCst);
            })
        };

        started_rx.recv().unwrap();
        thread::sleep(Duration::from_millis(50));
        assert!(!admitted.load(Ordering::SeqCst), "fourth frame must wait for a completion");

        gate.release();
        waiter.join().unwrap();
        assert!(admitted.load(Ordering::SeqCst));
        assert_eq!(gate.outstanding(), 3);
    }

    #[test]
    fn outstanding_never_exceeds_capacity_under_contention() {
        const CAPACITY: usize = 3;
        let gate = Arc::new(FrameGate::new(CAPACITY));
        let held = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let held = Arc::clone(&held);
                let peak = Arc::clone(&peak);
                thread::spawn(move || {
                    for _ in 0..200 {
                        gate.acquire();
                        let now = held.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        thread::yield_now();
                        held.fetch_sub(1, Ordering::SeqCst);
                        gate.release();
                    }
                })
            })
            .collect();

        for w in workers {
            w.join().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= CAPACITY);
        assert_eq!(gate.outstanding(), 0);
    }

    #[test]
    fn wait_idle_returns_after_last_release() {
        let gate = Arc::new(FrameGate::default());
        gate.acquire();
        gate.acquire();

        let drainer = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.wait_idle())
        };

        gate.release();
        assert!(!gate.wait_idle_timeout(Duration::from_millis(10)));
        gate.release();

        drainer.join().unwrap();
        assert_eq!(gate.outstanding(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "no outstanding permits")]
    fn over_release_asserts_in_debug() {
        FrameGate::new(1).release();
    }

    #[test]
    #[should_panic(expected = "capacity must be at least 1")]
    fn zero_capacity_is_rejected() {
        let _ = FrameGate::new(0);
    }
}
