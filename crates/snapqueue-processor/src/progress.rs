//! Progress reporting.

use std::fmt;

/// Upload progress counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Photos uploaded since the queue was last loaded.
    pub uploaded: u64,
    /// `uploaded` plus everything queued or in flight.
    pub total: u64,
}

impl Progress {
    pub fn new(uploaded: u64, total: u64) -> Self {
        Self { uploaded, total }
    }

    /// Photos not yet confirmed.
    pub fn pending(&self) -> u64 {
        self.total - self.uploaded
    }

    /// Whether a progress indicator should be shown at all.
    pub fn is_visible(&self) -> bool {
        self.total > 0
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} uploaded", self.uploaded, self.total)
    }
}

/// UI collaborator notified after every queue state change.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, progress: Progress);
}

/// Reporter that ignores all progress.
#[derive(Debug, Default)]
pub struct NullProgressReporter;

impl ProgressReporter for NullProgressReporter {
    fn report(&self, _progress: Progress) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_display() {
        assert_eq!(Progress::new(2, 5).to_string(), "2 / 5 uploaded");
    }

    #[test]
    fn test_progress_visibility() {
        assert!(!Progress::default().is_visible());
        assert!(Progress::new(0, 1).is_visible());
    }

    #[test]
    fn test_progress_pending() {
        assert_eq!(Progress::new(3, 7).pending(), 4);
    }
}
