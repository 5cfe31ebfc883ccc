//! Download progress and completion reporting.

use std::path::PathBuf;

/// Whether a transfer finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Success,
    Fail,
}

/// The result of one download, delivered exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    pub outcome: DownloadOutcome,
    /// Where the artifact was (or would have been) written.
    pub file: PathBuf,
}

impl DownloadResult {
    pub fn success(file: impl Into<PathBuf>) -> Self {
        Self {
            outcome: DownloadOutcome::Success,
            file: file.into(),
        }
    }

    pub fn fail(file: impl Into<PathBuf>) -> Self {
        Self {
            outcome: DownloadOutcome::Fail,
            file: file.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == DownloadOutcome::Success
    }
}

/// Receives download progress.
///
/// `on_progress` sees strictly increasing percentages in `0..=100`.
/// `on_complete` is called once per download, after the last progress call.
pub trait DownloadObserver {
    fn on_progress(&mut self, percent: u8);

    fn on_complete(&mut self, result: &DownloadResult);
}

/// Converts byte counts into percentage events, dropping repeats.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    total: Option<u64>,
    received: u64,
    last: Option<u8>,
}

impl ProgressTracker {
    pub(crate) fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|t| *t > 0),
            received: 0,
            last: None,
        }
    }

    /// Account for `bytes` more bytes; returns a percentage when it changed.
    pub(crate) fn advance(&mut self, bytes: u64) -> Option<u8> {
        self.received = self.received.saturating_add(bytes);
        let total = self.total?;
        // Never report 100 before the transfer has actually finished.
        let percent = ((self.received.min(total) * 100) / total).min(99) as u8;
        self.emit(percent)
    }

    /// Final percentage for a completed transfer, if not yet reported.
    pub(crate) fn finish(&mut self) -> Option<u8> {
        self.total?;
        self.emit(100)
    }

    fn emit(&mut self, percent: u8) -> Option<u8> {
        match self.last {
            Some(last) if percent <= last => None,
            _ => {
                self.last = Some(percent);
                Some(percent)
            }
        }
    }
}
