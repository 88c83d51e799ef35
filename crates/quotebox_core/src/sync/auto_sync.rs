//! Recurring background timer for automatic sync.
//!
//! # Responsibility
//! - Run a task once per interval on a dedicated thread.
//! - Stop promptly and deterministically on toggle-off or drop.
//!
//! # Invariants
//! - After `stop()` returns, the task is never invoked again.
//! - `stop()` is idempotent.

use log::{info, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

const THREAD_NAME: &str = "quotebox-auto-sync";

/// Handle to a running auto-sync timer.
pub struct AutoSync {
    running: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl AutoSync {
    /// Spawns the timer thread; `task` first runs one `interval` from now.
    ///
    /// # Errors
    /// - Returns the OS error when the thread cannot be spawned.
    pub fn start<F>(interval: Duration, mut task: F) -> std::io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let ticks = Arc::new(AtomicU64::new(0));
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let thread_running = Arc::clone(&running);
        let thread_ticks = Arc::clone(&ticks);
        let handle = std::thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if !thread_running.load(Ordering::SeqCst) {
                            break;
                        }
                        thread_ticks.fetch_add(1, Ordering::SeqCst);
                        task();
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        info!(
            "event=auto_sync_start module=sync status=ok interval_ms={}",
            interval.as_millis()
        );
        Ok(Self {
            running,
            ticks,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of times the task has been invoked.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    /// Cancels the timer and waits for the thread to exit.
    ///
    /// A task invocation already in progress finishes before this returns.
    pub fn stop(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("event=auto_sync_stop module=sync status=error error_code=task_panicked");
                return;
            }
        }
        info!(
            "event=auto_sync_stop module=sync status=ok ticks={}",
            self.ticks()
        );
    }
}

impl Drop for AutoSync {
    fn drop(&mut self) {
        self.stop();
    }
}
