use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use super::manager::ResultStoreManager;
use crate::error::{QueryError, Result};

#[derive(Debug, Default)]
struct SweepSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl SweepSignal {
    /// Waits for `interval` or a stop request. Returns true if stopped.
    fn wait(&self, interval: Duration) -> bool {
        let mut stopped = self.stopped.lock();
        if !*stopped {
            self.wake.wait_for(&mut stopped, interval);
        }
        *stopped
    }

    fn stop(&self) {
        *self.stopped.lock() = true;
        self.wake.notify_all();
    }
}

/// Background thread that evicts expired result stores.
///
/// Holds only a weak reference to the manager and exits once the manager is
/// dropped, `shutdown` is called or the sweeper itself is dropped.
#[derive(Debug)]
pub struct Sweeper {
    signal: Arc<SweepSignal>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    pub fn spawn(manager: &Arc<ResultStoreManager>, interval: Duration) -> Result<Self> {
        let signal = Arc::new(SweepSignal::default());
        let thread_signal = signal.clone();
        let manager: Weak<ResultStoreManager> = Arc::downgrade(manager);
        let interval = interval.max(Duration::from_millis(1));

        let handle = thread::Builder::new()
            .name("result-store-sweeper".to_string())
            .spawn(move || loop {
                if thread_signal.wait(interval) {
                    break;
                }
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                let evicted = manager.evict_expired();
                if evicted > 0 {
                    log::debug!(
                        "sweep evicted stores node={} count={}",
                        manager.node_name(),
                        evicted
                    );
                }
            })
            .map_err(|error| QueryError::Config(format!("unable to start sweeper: {error}")))?;

        Ok(Self {
            signal,
            handle: Some(handle),
        })
    }

    /// Stops the sweep and waits for the thread to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.signal.stop();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("result store sweeper panicked");
            }
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}
