//! Structured progress reporting for ingestion.
//!
//! Events go to an optional callback (the CLI prints them to stderr) and are
//! mirrored to `tracing` at debug level.

use std::sync::Arc;
use std::time::Instant;

/// Progress event emitted during ingestion.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Phase of the operation: "discover", "embed", "index", "skip", "finish"
    pub phase: String,

    /// Files handled so far
    pub current: u64,

    /// Total expected files (if known)
    pub total: Option<u64>,

    /// Percentage complete (0.0 - 100.0)
    pub percentage: Option<f64>,

    pub message: String,

    /// Seconds since the reporter was created
    pub elapsed_secs: Option<f64>,
}

impl ProgressEvent {
    pub fn new(
        phase: impl Into<String>,
        current: u64,
        total: Option<u64>,
        message: impl Into<String>,
    ) -> Self {
        let percentage =
            total.map(|t| if t > 0 { (current as f64 / t as f64) * 100.0 } else { 0.0 });

        Self {
            phase: phase.into(),
            current,
            total,
            percentage,
            message: message.into(),
            elapsed_secs: None,
        }
    }

    pub fn with_elapsed(mut self, elapsed_secs: f64) -> Self {
        self.elapsed_secs = Some(elapsed_secs);
        self
    }

    /// Format as a simple user-facing line.
    pub fn format_simple(&self) -> String {
        let progress = match self.total {
            Some(total) => format!("{}/{}", self.current, total),
            None => format!("{}", self.current),
        };

        let pct = match self.percentage {
            Some(p) => format!(" ({:.0}%)", p),
            None => String::new(),
        };

        format!("[{}] {}{} - {}", self.phase, progress, pct, self.message)
    }
}

/// Callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Progress reporter that emits events through a callback.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    start_time: Instant,
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            start_time: Instant::now(),
        }
    }

    /// A reporter that emits nothing.
    pub fn noop() -> Self {
        Self {
            callback: None,
            start_time: Instant::now(),
        }
    }

    pub fn emit(&self, event: ProgressEvent) {
        let Some(ref callback) = self.callback else {
            return;
        };

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let event = event.with_elapsed(elapsed);

        tracing::debug!(
            phase = %event.phase,
            current = event.current,
            total = ?event.total,
            message = %event.message,
            elapsed_secs = elapsed,
            "Progress event"
        );

        callback(event);
    }

    pub fn discover(&self, found: u64, root: &str) {
        self.emit(ProgressEvent::new(
            "discover",
            found,
            None,
            format!("found {} supported files under {}", found, root),
        ));
    }

    pub fn embed(&self, current: u64, total: u64, file: &str) {
        self.emit(ProgressEvent::new(
            "embed",
            current,
            Some(total),
            format!("embedding {}", file),
        ));
    }

    pub fn index(&self, current: u64, total: u64, title: &str) {
        self.emit(ProgressEvent::new(
            "index",
            current,
            Some(total),
            format!("indexed {}", title),
        ));
    }

    pub fn skip(&self, current: u64, total: u64, file: &str, reason: &str) {
        self.emit(ProgressEvent::new(
            "skip",
            current,
            Some(total),
            format!("skipped {}: {}", file, reason),
        ));
    }

    pub fn finish(&self, processed: u64, total: u64) {
        self.emit(ProgressEvent::new(
            "finish",
            processed,
            Some(total),
            format!("{} of {} files indexed", processed, total),
        ));
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::noop()
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("enabled", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_progress_event_format() {
        let event = ProgressEvent::new("embed", 5, Some(10), "embedding a.md");
        let formatted = event.format_simple();
        assert!(formatted.contains("[embed]"));
        assert!(formatted.contains("5/10"));
        assert!(formatted.contains("50%"));

        let open = ProgressEvent::new("discover", 3, None, "found");
        assert_eq!(open.format_simple(), "[discover] 3 - found");
    }

    #[test]
    fn test_zero_total_percentage() {
        let event = ProgressEvent::new("finish", 0, Some(0), "nothing");
        assert_eq!(event.percentage, Some(0.0));
    }

    #[test]
    fn test_progress_reporter_emit() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);

        let reporter = ProgressReporter::new(Arc::new(move |event: ProgressEvent| {
            sink.lock().unwrap().push(event);
        }));

        reporter.discover(3, "/kb");
        reporter.skip(1, 3, "a.md", "read failed");
        reporter.finish(2, 3);

        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 3);
        assert_eq!(captured[0].phase, "discover");
        assert_eq!(captured[1].phase, "skip");
        assert!(captured[1].message.contains("read failed"));
        assert_eq!(captured[2].current, 2);
        assert!(captured[2].elapsed_secs.is_some());
    }

    #[test]
    fn test_noop_reporter() {
        let reporter = ProgressReporter::noop();
        reporter.discover(1, "test");
    }
}
