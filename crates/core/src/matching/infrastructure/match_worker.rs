use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::matching::domain::identity_matcher::IdentityMatcher;
use crate::matching::domain::match_result::MatchResult;
use crate::matching::domain::work_item::WorkItem;

/// Single-slot mailbox shared between the acquisition loop and the worker.
struct Mailbox {
    slot: Mutex<Option<WorkItem>>,
    wake: Condvar,
    stopped: AtomicBool,
}

impl Mailbox {
    /// The slot only holds plain data, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Option<WorkItem>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Takes the pending item, waiting at most `idle_wait` for one to arrive.
    fn take(&self, idle_wait: Duration) -> Option<WorkItem> {
        let mut slot = self.lock();
        if slot.is_none() && !self.is_stopped() {
            slot = match self.wake.wait_timeout(slot, idle_wait) {
                Ok((guard, _)) => guard,
                Err(e) => e.into_inner().0,
            };
        }
        slot.take()
    }
}

/// Background identity matcher with latest-wins handoff.
///
/// `set_work` overwrites the pending item; an item that was never picked up
/// is dropped without producing a result. Each item the worker does pick up
/// yields exactly one [`MatchResult`] on the channel returned by
/// [`MatchWorker::spawn`], unless the worker is stopped mid-pass.
pub struct MatchWorker {
    mailbox: Arc<Mailbox>,
    handle: Option<JoinHandle<()>>,
}

impl MatchWorker {
    pub fn spawn(
        matcher: IdentityMatcher,
        idle_wait: Duration,
    ) -> Result<(Self, crossbeam_channel::Receiver<MatchResult>), std::io::Error> {
        let mailbox = Arc::new(Mailbox {
            slot: Mutex::new(None),
            wake: Condvar::new(),
            stopped: AtomicBool::new(false),
        });
        let (result_tx, result_rx) = crossbeam_channel::unbounded();

        let worker_mailbox = Arc::clone(&mailbox);
        let handle = std::thread::Builder::new()
            .name("match-worker".into())
            .spawn(move || run_worker(&worker_mailbox, &matcher, idle_wait, &result_tx))?;

        Ok((
            Self {
                mailbox,
                handle: Some(handle),
            },
            result_rx,
        ))
    }

    /// Replaces the pending work item. Never waits for a pass to finish.
    pub fn set_work(&self, item: WorkItem) {
        let mut slot = self.mailbox.lock();
        if let Some(dropped) = slot.replace(item) {
            log::trace!(
                "Superseded unprocessed work item for frame {}",
                dropped.frame().index()
            );
        }
        self.mailbox.wake.notify_one();
    }

    /// Asks the worker to exit. Safe to call more than once.
    pub fn stop(&self) {
        self.mailbox.stopped.store(true, Ordering::Release);
        // Taking the lock orders the flag before a waiting worker re-checks it.
        let _slot = self.mailbox.lock();
        self.mailbox.wake.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        self.mailbox.is_stopped()
    }

    /// Stops the worker and waits for its thread to exit.
    pub fn shutdown(&mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Match worker thread panicked");
            }
        }
    }
}

impl Drop for MatchWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(
    mailbox: &Mailbox,
    matcher: &IdentityMatcher,
    idle_wait: Duration,
    result_tx: &crossbeam_channel::Sender<MatchResult>,
) {
    let mut passes: u64 = 0;
    while !mailbox.is_stopped() {
        let Some(item) = mailbox.take(idle_wait) else {
            continue;
        };

        let started = Instant::now();
        let result = matcher.find_match(&item);
        passes += 1;
        log::debug!(
            "Match pass {passes} on frame {} ({} candidates): {:?} in {:.1}ms",
            item.frame().index(),
            item.candidates().len(),
            result,
            started.elapsed().as_secs_f64() * 1000.0
        );

        if mailbox.is_stopped() || result_tx.send(result).is_err() {
            break;
        }
    }
    log::debug!("Match worker exiting after {passes} passes");
}
