//! Main-thread dispatcher
//!
//! Worker threads never touch engine state directly. They enqueue named
//! actions through a [`DispatcherHandle`]; the main thread drains a bounded
//! number of them per frame inside [`MainThreadDispatcher::update`].
//!
//! - Enqueueing never blocks and never runs the action inline
//! - Actions run FIFO, at most `budget` per `update`
//! - A failing or panicking action is logged and recorded; the rest of the
//!   batch still runs
//! - `update` from any thread other than the constructing one is a no-op
//!
//! ```ignore
//! let dispatcher = MainThreadDispatcher::new(DispatcherConfig::default());
//! let handle = dispatcher.handle();
//!
//! std::thread::spawn(move || {
//!     let result = expensive_job();
//!     handle.enqueue_action("apply job", move || store(result));
//! });
//!
//! // once per frame, on the main thread
//! dispatcher.update(&frame);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant, SystemTime};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use void_core::{Error, FrameTime};

use crate::recovery::catch_panic;

/// Dispatcher limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Maximum actions executed per `update`
    pub budget: usize,
    /// Completed action records retained
    pub history: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            budget: 10,
            history: 50,
        }
    }
}

impl DispatcherConfig {
    /// Clamp to usable values
    pub fn validate(&mut self) {
        self.budget = self.budget.max(1);
        self.history = self.history.max(1);
    }
}

type Action = Box<dyn FnOnce() -> Result<(), String> + Send>;

/// An action waiting for the main thread
pub struct NamedAction {
    pub name: String,
    action: Action,
}

impl fmt::Debug for NamedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedAction").field("name", &self.name).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionStatus {
    Succeeded,
    Failed,
}

/// A completed action
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRecord {
    pub name: String,
    pub status: ActionStatus,
    pub duration: Duration,
    pub completed_at: SystemTime,
}

/// Aggregates since construction or the last reset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatcherStats {
    pub total_executed: u64,
    pub total_failed: u64,
    pub total_time: Duration,
}

impl DispatcherStats {
    pub fn average_duration(&self) -> Duration {
        if self.total_executed == 0 {
            Duration::ZERO
        } else {
            self.total_time.div_f64(self.total_executed as f64)
        }
    }
}

fn named(name: impl Into<String>, action: Action) -> NamedAction {
    NamedAction {
        name: name.into(),
        action,
    }
}

fn infallible<F>(action: F) -> Action
where
    F: FnOnce() + Send + 'static,
{
    Box::new(move || {
        action();
        Ok(())
    })
}

fn fallible<F, E>(action: F) -> Action
where
    F: FnOnce() -> Result<(), E> + Send + 'static,
    E: fmt::Display,
{
    Box::new(move || action().map_err(|e| e.to_string()))
}

/// Cloneable producer side, safe to move to worker threads
#[derive(Clone)]
pub struct DispatcherHandle {
    sender: Sender<NamedAction>,
}

impl DispatcherHandle {
    pub fn enqueue_action<F>(&self, name: impl Into<String>, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.send(named(name, infallible(action)));
    }

    pub fn enqueue_unnamed<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue_action("unnamed", action);
    }

    /// Queue an action whose `Err` is recorded as a failure
    pub fn enqueue_fallible<F, E>(&self, name: impl Into<String>, action: F)
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: fmt::Display,
    {
        self.send(named(name, fallible(action)));
    }

    fn send(&self, action: NamedAction) {
        // The receiver lives in the dispatcher; a send only fails after it is gone
        if let Err(err) = self.sender.send(action) {
            log::warn!("dispatcher gone, dropping action '{}'", err.0.name);
        }
    }
}

impl fmt::Debug for DispatcherHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherHandle")
            .field("pending", &self.sender.len())
            .finish()
    }
}

/// Queue of actions drained on the main thread
pub struct MainThreadDispatcher {
    main_thread: ThreadId,
    handle: DispatcherHandle,
    receiver: Receiver<NamedAction>,
    budget: usize,
    history_len: usize,
    history: Mutex<VecDeque<ActionRecord>>,
    stats: Mutex<DispatcherStats>,
}

impl MainThreadDispatcher {
    /// Create a dispatcher bound to the calling thread
    pub fn new(mut config: DispatcherConfig) -> Self {
        config.validate();
        let (sender, receiver) = unbounded();
        Self {
            main_thread: thread::current().id(),
            handle: DispatcherHandle { sender },
            receiver,
            budget: config.budget,
            history_len: config.history,
            history: Mutex::new(VecDeque::with_capacity(config.history)),
            stats: Mutex::new(DispatcherStats::default()),
        }
    }

    /// Producer handle for worker threads
    pub fn handle(&self) -> DispatcherHandle {
        self.handle.clone()
    }

    pub fn enqueue_action<F>(&self, name: impl Into<String>, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle.enqueue_action(name, action);
    }

    pub fn enqueue_unnamed<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle.enqueue_unnamed(action);
    }

    pub fn enqueue_fallible<F, E>(&self, name: impl Into<String>, action: F)
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: fmt::Display,
    {
        self.handle.enqueue_fallible(name, action);
    }

    pub fn is_main_thread(&self) -> bool {
        thread::current().id() == self.main_thread
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn set_budget(&mut self, budget: usize) {
        self.budget = budget.max(1);
    }

    /// Actions waiting to run
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Run up to `budget` queued actions. Returns how many ran
    ///
    /// Off the main thread this logs a warning and runs nothing.
    pub fn update(&self, frame: &FrameTime) -> usize {
        match self.try_update(frame) {
            Ok(executed) => executed,
            Err(err) => {
                log::warn!("frame {}: {}, ignoring", frame.frame, err);
                0
            }
        }
    }

    /// Like [`update`](Self::update), but reports a call from the wrong
    /// thread as [`Error::WrongThread`]
    pub fn try_update(&self, frame: &FrameTime) -> void_core::Result<usize> {
        if !self.is_main_thread() {
            return Err(Error::WrongThread {
                operation: "dispatcher update",
            });
        }

        let mut executed = 0;
        while executed < self.budget {
            let Ok(NamedAction { name, action }) = self.receiver.try_recv() else {
                break;
            };
            executed += 1;

            let start = Instant::now();
            let outcome = catch_panic(AssertUnwindSafe(action)).and_then(|result| result);
            let duration = start.elapsed();

            let status = match outcome {
                Ok(()) => ActionStatus::Succeeded,
                Err(err) => {
                    log::error!("dispatched action '{}' failed: {}", name, err);
                    ActionStatus::Failed
                }
            };
            self.record(ActionRecord {
                name,
                status,
                duration,
                completed_at: SystemTime::now(),
            });
        }

        if executed > 0 {
            log::trace!(
                "frame {}: ran {} action(s), {} pending",
                frame.frame,
                executed,
                self.pending()
            );
        }
        Ok(executed)
    }

    fn record(&self, record: ActionRecord) {
        {
            let mut stats = self.stats.lock();
            stats.total_executed += 1;
            stats.total_time += record.duration;
            if record.status == ActionStatus::Failed {
                stats.total_failed += 1;
            }
        }

        let mut history = self.history.lock();
        if history.len() == self.history_len {
            history.pop_front();
        }
        history.push_back(record);
    }

    pub fn stats(&self) -> DispatcherStats {
        self.stats.lock().clone()
    }

    /// Completed actions, oldest first
    pub fn recent(&self) -> Vec<ActionRecord> {
        self.history.lock().iter().cloned().collect()
    }

    /// Clear aggregates and history. Queued actions stay queued
    pub fn reset_stats(&self) {
        *self.stats.lock() = DispatcherStats::default();
        self.history.lock().clear();
    }
}

impl Default for MainThreadDispatcher {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}

impl fmt::Debug for MainThreadDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MainThreadDispatcher")
            .field("main_thread", &self.main_thread)
            .field("budget", &self.budget)
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn frame() -> FrameTime {
        FrameTime::new(1, 0.016, 0.016)
    }

    #[test]
    fn test_never_runs_inline() {
        let dispatcher = MainThreadDispatcher::default();
        let ran = Arc::new(Mutex::new(false));
        let flag = ran.clone();
        dispatcher.enqueue_action("flag", move || *flag.lock() = true);
        assert!(!*ran.lock());
        assert_eq!(dispatcher.pending(), 1);

        assert_eq!(dispatcher.update(&frame()), 1);
        assert!(*ran.lock());
    }

    #[test]
    fn test_fallible_error_counts_as_failure() {
        let dispatcher = MainThreadDispatcher::default();
        dispatcher.enqueue_fallible("load", || Err::<(), _>("file missing"));
        dispatcher.enqueue_unnamed(|| {});
        dispatcher.update(&frame());

        let stats = dispatcher.stats();
        assert_eq!(stats.total_executed, 2);
        assert_eq!(stats.total_failed, 1);
        let recent = dispatcher.recent();
        assert_eq!(recent[0].status, ActionStatus::Failed);
        assert_eq!(recent[1].name, "unnamed");
    }

    #[test]
    fn test_history_is_bounded() {
        let dispatcher = MainThreadDispatcher::new(DispatcherConfig {
            budget: 100,
            history: 3,
        });
        for i in 0..5 {
            dispatcher.enqueue_action(format!("a{}", i), || {});
        }
        dispatcher.update(&frame());

        let names: Vec<_> = dispatcher.recent().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["a2", "a3", "a4"]);
        assert_eq!(dispatcher.stats().total_executed, 5);

        dispatcher.reset_stats();
        assert!(dispatcher.recent().is_empty());
        assert_eq!(dispatcher.stats().average_duration(), Duration::ZERO);
    }
}
