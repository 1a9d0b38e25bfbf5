use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::detection::domain::candidate_detector::CandidateDetector;
use crate::matching::domain::identity_matcher::IdentityMatcher;
use crate::matching::domain::match_result::MatchResult;
use crate::matching::domain::work_item::WorkItem;
use crate::matching::infrastructure::match_worker::MatchWorker;
use crate::overlay::domain::frame_overlay::FrameOverlay;
use crate::pipeline::session_logger::SessionLogger;
use crate::pipeline::session_state::{LockChange, SessionState, StalenessPolicy};
use crate::shared::frame::Frame;
use crate::shared::tracking_config::TrackingConfig;
use crate::video::domain::display_sink::DisplaySink;
use crate::video::domain::frame_source::FrameSource;

/// Which frames get detection and which get displayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cadence {
    detect_interval: u64,
    display_interval: u64,
}

impl Cadence {
    /// Intervals below 1 are treated as 1.
    pub fn new(detect_interval: u64, display_interval: u64) -> Self {
        Self {
            detect_interval: detect_interval.max(1),
            display_interval: display_interval.max(1),
        }
    }

    pub fn should_detect(&self, counter: u64) -> bool {
        counter % self.detect_interval == 0
    }

    pub fn should_display(&self, counter: u64) -> bool {
        counter % self.display_interval == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Continued,
    Stopped,
}

/// Collaborators the controller drives each tick.
pub struct SessionIo {
    pub source: Box<dyn FrameSource>,
    pub detector: Box<dyn CandidateDetector>,
    pub overlay: Box<dyn FrameOverlay>,
    pub sink: Box<dyn DisplaySink>,
    pub logger: Box<dyn SessionLogger>,
}

/// Drives acquisition at a fixed tick: pulls a frame, hands every
/// `detect_interval`-th one to the match worker, draws the last known box
/// and publishes every `display_interval`-th frame.
///
/// Matching never blocks a tick. Results are folded in at the start of the
/// following tick, so the drawn box may lag the frame by a few ticks.
pub struct CadenceController {
    io: SessionIo,
    worker: MatchWorker,
    results: crossbeam_channel::Receiver<MatchResult>,
    cadence: Cadence,
    class_filter: Vec<u32>,
    tick_period: Duration,
    total_frames: usize,
    cancelled: Arc<AtomicBool>,
    state: SessionState,
    torn_down: bool,
}

impl CadenceController {
    /// Spawns the match worker. The frame source must already be open.
    pub fn new(
        io: SessionIo,
        matcher: IdentityMatcher,
        config: &TrackingConfig,
    ) -> Result<Self, std::io::Error> {
        let (worker, results) = MatchWorker::spawn(matcher, config.idle_wait())?;
        Ok(Self {
            io,
            worker,
            results,
            cadence: Cadence::new(config.detect_interval, config.display_interval),
            class_filter: vec![config.person_class],
            tick_period: config.tick_period(),
            total_frames: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
            state: SessionState::new(StalenessPolicy::from_misses(config.stale_after_misses)),
            torn_down: false,
        })
    }

    /// Frame count used for progress reporting; 0 when unknown.
    pub fn with_total_frames(mut self, total_frames: usize) -> Self {
        self.total_frames = total_frames;
        self
    }

    /// Flag that stops the session at the next tick when set.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn start(&mut self) {
        if self.state.start() {
            self.io.logger.info("Tracking started");
        }
    }

    /// Explicit stop; the session cannot be restarted.
    pub fn stop(&mut self) {
        if !self.state.is_stopped() {
            self.state.stop();
            self.worker.stop();
            self.io.logger.info("Tracking stopped");
        }
    }

    /// Runs one acquisition tick.
    pub fn step(&mut self) -> StepOutcome {
        self.start();
        if self.cancelled.load(Ordering::Relaxed) {
            self.stop();
        }
        if self.state.is_stopped() {
            return StepOutcome::Stopped;
        }

        self.drain_results();

        let mut frame = match self.io.source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::info!(
                    "End of stream after {} frames",
                    self.state.frame_counter()
                );
                self.stop();
                return StepOutcome::Stopped;
            }
            Err(e) => {
                log::error!("Frame acquisition failed: {e}");
                self.stop();
                return StepOutcome::Stopped;
            }
        };

        let counter = self.state.advance_frame();
        self.io.logger.progress(counter as usize, self.total_frames);

        if self.cadence.should_detect(counter) {
            self.submit_detection(&frame);
        }

        if let Some(locked) = self.state.last_box() {
            let t0 = Instant::now();
            if let Err(e) = self.io.overlay.draw(&mut frame, &[locked]) {
                log::warn!("Overlay failed on frame {counter}: {e}");
            }
            self.io.logger.timing("overlay", elapsed_ms(t0));
        }

        if self.cadence.should_display(counter) {
            let t0 = Instant::now();
            if let Err(e) = self.io.sink.publish(&frame) {
                log::warn!("Display failed on frame {counter}: {e}");
            }
            self.io.logger.timing("publish", elapsed_ms(t0));
        }

        StepOutcome::Continued
    }

    /// Steps on a fixed-period timer until the session stops, then tears
    /// down the worker and releases the source. Returns the frame count.
    pub fn run(&mut self) -> u64 {
        let mut next_tick = Instant::now();
        while self.step() == StepOutcome::Continued {
            next_tick += self.tick_period;
            let now = Instant::now();
            if next_tick > now {
                std::thread::sleep(next_tick - now);
            } else {
                // Overran; restart the schedule instead of bursting to catch up.
                next_tick = now;
            }
        }
        self.shutdown();
        self.state.frame_counter()
    }

    /// Stops and joins the worker, then closes the source. Idempotent.
    pub fn shutdown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.stop();
        self.worker.shutdown();
        self.io.source.close();
        self.io.logger.summary();
    }

    fn submit_detection(&mut self, frame: &Frame) {
        let t0 = Instant::now();
        let candidates = match self.io.detector.detect(frame, &self.class_filter) {
            Ok(candidates) => candidates,
            Err(e) => {
                log::warn!("Detection failed on frame {}: {e}", frame.index());
                Vec::new()
            }
        };
        self.io.logger.timing("detect", elapsed_ms(t0));
        self.io.logger.metric("candidates", candidates.len() as f64);
        self.worker.set_work(WorkItem::new(frame.clone(), candidates));
    }

    fn drain_results(&mut self) {
        while let Ok(result) = self.results.try_recv() {
            match self.state.apply_result(result) {
                LockChange::Acquired(region) => {
                    self.io.logger.event("lock_acquired");
                    self.io.logger.info(&format!("Locked on {region}"));
                }
                LockChange::Moved(_) => self.io.logger.event("lock_moved"),
                LockChange::Cleared => {
                    self.io.logger.event("lock_cleared");
                    self.io.logger.info("Lock lost");
                }
                LockChange::Unchanged => {}
            }
            if result == MatchResult::NoMatch {
                self.io.logger.event("no_match");
            }
        }
    }
}

impl Drop for CadenceController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
