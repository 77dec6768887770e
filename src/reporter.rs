//! Progress reporter that writes to the log.

use tracing::info;

use snapqueue_processor::{Progress, ProgressReporter};

/// Logs `"{uploaded} / {total} uploaded"` whenever the queue is non-empty.
#[derive(Debug, Default)]
pub(crate) struct LogProgressReporter;

impl LogProgressReporter {
    pub(crate) fn render(progress: Progress) -> Option<String> {
        progress.is_visible().then(|| progress.to_string())
    }
}

impl ProgressReporter for LogProgressReporter {
    fn report(&self, progress: Progress) {
        if let Some(line) = Self::render(progress) {
            info!(uploaded = progress.uploaded, total = progress.total, "{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_hidden_when_empty() {
        assert_eq!(LogProgressReporter::render(Progress::default()), None);
    }

    #[test]
    fn test_render_counts() {
        assert_eq!(
            LogProgressReporter::render(Progress::new(1, 4)).as_deref(),
            Some("1 / 4 uploaded")
        );
    }
}
