use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

/// Cross-cutting logger for tracking-session events.
///
/// Keeps the cadence controller independent of where its observations end
/// up (stdout summary, nowhere in tests).
pub trait SessionLogger: Send {
    /// Report acquisition progress. `total` is 0 when the source length is unknown.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. candidate count).
    fn metric(&mut self, name: &str, value: f64);

    /// Count a discrete event such as a lock being acquired.
    fn event(&mut self, name: &str);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Logger that discards all events.
pub struct NullSessionLogger;

impl SessionLogger for NullSessionLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn event(&mut self, _name: &str) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI logger: per-stage timings, metrics and event counts, with a
/// summary at session end.
///
/// Progress output is throttled to every `throttle_frames` frames.
pub struct StdoutSessionLogger {
    throttle_frames: usize,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    events: BTreeMap<String, usize>,
    start_time: Instant,
    frames_seen: usize,
    messages: Vec<String>,
}

impl StdoutSessionLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            events: BTreeMap::new(),
            start_time: Instant::now(),
            frames_seen: 0,
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() && self.events.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.frames_seen;
        let mut lines = vec![format!(
            "Session summary ({frames} frames, {:.1}s total):",
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let avg_ms = mean(durations);
            lines.push(format!(
                "  {stage:10}: avg {avg_ms:6.1}ms  max {:6.1}ms  x{}",
                durations.iter().copied().fold(0.0, f64::max),
                durations.len()
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            lines.push(format!("  {name}: avg {:.1}", mean(&self.metrics[name])));
        }

        for (name, count) in &self.events {
            lines.push(format!("  {name}: {count}"));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Acquisition rate: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }

    pub fn event_count(&self, name: &str) -> usize {
        self.events.get(name).copied().unwrap_or(0)
    }
}

impl Default for StdoutSessionLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl SessionLogger for StdoutSessionLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_seen = current;
        if current % self.throttle_frames != 0 && current != total {
            return;
        }
        if total > 0 {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Tracking: {current}/{total} frames ({pct:.1}%)");
        } else {
            log::info!("Tracking: {current} frames");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn event(&mut self, name: &str) {
        *self.events.entry(name.to_string()).or_default() += 1;
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullSessionLogger;
        logger.progress(1, 10);
        logger.timing("detect", 5.0);
        logger.metric("candidates", 3.0);
        logger.event("lock_acquired");
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = StdoutSessionLogger::new(10);
        logger.timing("detect", 20.0);
        logger.timing("detect", 30.0);
        logger.timing("publish", 5.0);

        assert_eq!(logger.timings_for("detect").unwrap(), &[20.0, 30.0]);
        assert_eq!(logger.timings_for("publish").unwrap(), &[5.0]);
        assert!(logger.timings_for("overlay").is_none());
    }

    #[test]
    fn test_metric_records_values() {
        let mut logger = StdoutSessionLogger::new(10);
        logger.metric("candidates", 3.0);
        logger.metric("candidates", 4.0);
        assert_relative_eq!(mean(logger.metrics_for("candidates").unwrap()), 3.5);
    }

    #[test]
    fn test_event_counts() {
        let mut logger = StdoutSessionLogger::new(10);
        logger.event("lock_acquired");
        logger.event("no_match");
        logger.event("no_match");
        assert_eq!(logger.event_count("lock_acquired"), 1);
        assert_eq!(logger.event_count("no_match"), 2);
        assert_eq!(logger.event_count("lock_cleared"), 0);
    }

    #[test]
    fn test_summary_includes_all_sections() {
        let mut logger = StdoutSessionLogger::new(10);
        logger.progress(10, 0);
        logger.timing("detect", 20.0);
        logger.metric("candidates", 2.0);
        logger.event("lock_acquired");

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Session summary (10 frames"));
        assert!(summary.contains("detect"));
        assert!(summary.contains("candidates: avg 2.0"));
        assert!(summary.contains("lock_acquired: 1"));
        assert!(summary.contains("fps"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(StdoutSessionLogger::new(10).summary_string().is_none());
    }

    #[test]
    fn test_progress_tracks_frames_with_unknown_total() {
        let mut logger = StdoutSessionLogger::new(10);
        for i in 1..=25 {
            logger.progress(i, 0);
        }
        assert_eq!(logger.frames_seen, 25);
    }

    #[test]
    fn test_info_stores_messages() {
        let mut logger = StdoutSessionLogger::new(10);
        logger.info("locked");
        assert_eq!(logger.messages, vec!["locked".to_string()]);
    }

    #[test]
    fn test_zero_throttle_is_clamped() {
        assert_eq!(StdoutSessionLogger::new(0).throttle_frames, 1);
    }
}
