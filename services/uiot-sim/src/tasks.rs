//! Per-round registry of fire-and-forget tasks.
//!
//! Launchers never await what they spawn. The round owner can still drain the
//! group (bounded by a timeout) to reach a quiescent state before teardown.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::warn;

#[derive(Clone, Default)]
pub struct TaskGroup {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

/// Aborts the awaited task if the drain future is dropped mid-await.
struct AbortOnDrop(Option<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        if let Some(h) = self.0.take() { h.abort(); }
    }
}

impl TaskGroup {
    pub fn new() -> Self { Self::default() }

    /// Spawn onto the current runtime. Outside a runtime the future is dropped
    /// with a warning and nothing is tracked.
    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Ok(rt) = Handle::try_current() else {
            warn!("no_runtime_task_dropped");
            return;
        };
        let handle = rt.spawn(fut);
        let mut handles = self.handles.lock();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    pub fn in_flight(&self) -> usize {
        let mut handles = self.handles.lock();
        handles.retain(|h| !h.is_finished());
        handles.len()
    }

    /// Await every task, including ones spawned while draining.
    pub async fn drain(&self) {
        loop {
            let next = self.handles.lock().pop();
            let Some(handle) = next else { break };
            let mut guard = AbortOnDrop(Some(handle.abort_handle()));
            if let Err(e) = handle.await {
                if e.is_panic() { warn!(error = %e, "task_panicked"); }
            }
            guard.0 = None;
        }
    }

    /// Drain with a deadline. On timeout the remaining tasks are aborted and `false` returned.
    pub async fn quiesce(&self, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, self.drain()).await {
            Ok(()) => true,
            Err(_) => {
                let left = self.abort_all();
                warn!(aborted = left, ?timeout, "quiesce_timed_out");
                false
            }
        }
    }

    pub fn abort_all(&self) -> usize {
        let handles = std::mem::take(&mut *self.handles.lock());
        let mut aborted = 0;
        for h in handles {
            if !h.is_finished() {
                h.abort();
                aborted += 1;
            }
        }
        aborted
    }
}
