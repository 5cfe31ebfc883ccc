//! Downloads that run on a worker thread.
//!
//! The pipeline still waits for each download before moving on; background
//! mode only keeps the caller free to poll and redraw while bytes arrive.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;

use super::progress::{DownloadObserver, DownloadResult};

/// Something the worker reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent {
    Progress(u8),
    Completed(DownloadResult),
}

/// A download running on another thread.
pub struct DownloadHandle {
    events: Receiver<DownloadEvent>,
    cancelled: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    destination: PathBuf,
    finished: Option<DownloadResult>,
}

impl DownloadHandle {
    pub(crate) fn new(
        events: Receiver<DownloadEvent>,
        cancelled: Arc<AtomicBool>,
        worker: JoinHandle<()>,
        destination: PathBuf,
    ) -> Self {
        Self {
            events,
            cancelled,
            worker: Some(worker),
            destination,
            finished: None,
        }
    }

    /// Poll for the next event without blocking.
    ///
    /// After the completion event has been returned this yields `None`.
    pub fn try_event(&mut self) -> Option<DownloadEvent> {
        if self.finished.is_some() {
            return None;
        }
        match self.events.try_recv() {
            Ok(event) => Some(self.track(event)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                let event = self.lost_worker();
                Some(self.track(event))
            }
        }
    }

    /// Ask the worker to stop; the download then completes as `Fail`.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Block until the download finishes, forwarding events to `observer`.
    pub fn wait(mut self, observer: &mut dyn DownloadObserver) -> DownloadResult {
        let result = loop {
            if let Some(result) = &self.finished {
                break result.clone();
            }
            let event = self
                .events
                .recv()
                .unwrap_or_else(|_| self.lost_worker());
            match self.track(event) {
                DownloadEvent::Progress(percent) => observer.on_progress(percent),
                DownloadEvent::Completed(result) => break result,
            }
        };
        observer.on_complete(&result);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        result
    }

    fn track(&mut self, event: DownloadEvent) -> DownloadEvent {
        if let DownloadEvent::Completed(result) = &event {
            self.finished = Some(result.clone());
        }
        event
    }

    // The worker always sends a completion before exiting unless it panicked.
    fn lost_worker(&self) -> DownloadEvent {
        tracing::warn!("Download worker for {} exited early", self.destination.display());
        DownloadEvent::Completed(DownloadResult::fail(&self.destination))
    }
}

impl Drop for DownloadHandle {
    fn drop(&mut self) {
        if self.finished.is_none() {
            self.cancel();
        }
    }
}
