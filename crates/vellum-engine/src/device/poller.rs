use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};

/// Background thread that drives wgpu completion callbacks.
///
/// Native wgpu only runs `on_submitted_work_done` callbacks while the device is
/// polled. The submission thread may be parked on the frame gate waiting for
/// exactly such a callback, so polling happens here instead: the thread sleeps
/// until work is committed, then blocks in `device.poll` until the queue is
/// idle.
pub(super) struct DevicePoller {
    shared: Arc<PollerShared>,
    thread: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct PollerState {
    pending_submissions: u64,
    shutdown: bool,
}

#[derive(Default)]
struct PollerShared {
    state: Mutex<PollerState>,
    wake: Condvar,
}

impl PollerShared {
    fn lock(&self) -> MutexGuard<'_, PollerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cheap handle used by command buffers to wake the poller after a submit.
#[derive(Clone)]
pub(super) struct PollerHandle(Arc<PollerShared>);

impl PollerHandle {
    pub(super) fn notify_submitted(&self) {
        self.0.lock().pending_submissions += 1;
        self.0.wake.notify_one();
    }
}

impl DevicePoller {
    pub(super) fn spawn(device: wgpu::Device) -> Result<Self> {
        let shared = Arc::new(PollerShared::default());
        let thread = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("vellum-device-poller".into())
                .spawn(move || run(&device, &shared))
                .context("failed to spawn device poller thread")?
        };

        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    pub(super) fn handle(&self) -> PollerHandle {
        PollerHandle(Arc::clone(&self.shared))
    }
}

impl Drop for DevicePoller {
    fn drop(&mut self) {
        self.shared.lock().shutdown = true;
        self.shared.wake.notify_one();

        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("device poller thread panicked");
            }
        }
    }
}

fn run(device: &wgpu::Device, shared: &PollerShared) {
    log::debug!("device poller started");
    loop {
        {
            let guard = shared.lock();
            let mut state = shared
                .wake
                .wait_while(guard, |s| s.pending_submissions == 0 && !s.shutdown)
                .unwrap_or_else(PoisonError::into_inner);

            // Outstanding work is still polled to completion on shutdown.
            if state.pending_submissions == 0 {
                break;
            }
            state.pending_submissions = 0;
        }

        if let Err(err) = device.poll(wgpu::PollType::wait_indefinitely()) {
            log::error!("device poll failed: {err}");
        }
    }
    log::debug!("device poller stopped");
}
