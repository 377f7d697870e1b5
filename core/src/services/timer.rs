//! Restartable countdown driving resend eligibility.
//!
//! The countdown runs as its own tokio task and publishes the remaining
//! seconds through a `watch` channel. Every (re)start bumps a generation
//! counter; a tick only lands if it still carries the current generation, so
//! nothing from an aborted countdown is ever observable.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Notification emitted by a running countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick { remaining: u32 },
    /// Emitted once, when the countdown reaches zero
    Expired,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TimerState {
    generation: u64,
    remaining: u32,
    running: bool,
    started: bool,
}

/// Countdown from a fixed number of seconds to zero
pub struct CountdownTimer {
    state: Arc<watch::Sender<TimerState>>,
    tick: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
    events: Option<mpsc::UnboundedSender<TimerEvent>>,
}

impl CountdownTimer {
    /// Timer ticking once per `tick`
    pub fn new(tick: Duration) -> Self {
        let (state, _) = watch::channel(TimerState::default());
        Self {
            state: Arc::new(state),
            tick,
            task: Mutex::new(None),
            events: None,
        }
    }

    /// Timer ticking once per second
    pub fn per_second() -> Self {
        Self::new(Duration::from_secs(1))
    }

    /// Forward tick and expiry notifications to `listener`
    pub fn with_listener(mut self, listener: mpsc::UnboundedSender<TimerEvent>) -> Self {
        self.events = Some(listener);
        self
    }

    /// Start counting down from `secs`, replacing any running countdown
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, secs: u32) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = task.take() {
            previous.abort();
        }

        let mut generation = 0;
        self.state.send_modify(|state| {
            state.generation += 1;
            generation = state.generation;
            state.remaining = secs;
            state.running = secs > 0;
            state.started = true;
        });

        tracing::debug!(seconds = secs, generation, event = "countdown_started", "Countdown started");

        if secs == 0 {
            self.emit(TimerEvent::Expired);
            return;
        }

        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        let period = self.tick;
        *task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let mut finished = false;
                let applied = state.send_if_modified(|current| {
                    if current.generation != generation || !current.running {
                        finished = true;
                        return false;
                    }
                    current.remaining = current.remaining.saturating_sub(1);
                    if let Some(events) = &events {
                        let _ = events.send(TimerEvent::Tick {
                            remaining: current.remaining,
                        });
                    }
                    if current.remaining == 0 {
                        current.running = false;
                        finished = true;
                        if let Some(events) = &events {
                            let _ = events.send(TimerEvent::Expired);
                        }
                    }
                    true
                });
                if finished {
                    if applied {
                        tracing::debug!(generation, event = "countdown_expired", "Countdown expired");
                    }
                    break;
                }
            }
        }));
    }

    /// Stop the countdown; no further ticks are observable
    pub fn cancel(&self) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = task.take() {
            previous.abort();
        }
        self.state.send_if_modified(|state| {
            state.generation += 1;
            let was_running = state.running;
            state.running = false;
            was_running
        });
    }

    /// Seconds left on the countdown
    pub fn remaining(&self) -> u32 {
        self.state.borrow().remaining
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().running
    }

    /// Whether a countdown ran all the way to zero
    pub fn is_expired(&self) -> bool {
        let state = *self.state.borrow();
        state.started && !state.running && state.remaining == 0
    }

    /// Watch the remaining seconds
    pub fn subscribe(&self) -> watch::Receiver<u32> {
        let mut source = self.state.subscribe();
        let (tx, rx) = watch::channel(source.borrow().remaining);
        tokio::spawn(async move {
            while source.changed().await.is_ok() {
                let remaining = source.borrow_and_update().remaining;
                if tx.send(remaining).is_err() {
                    break;
                }
            }
        });
        rx
    }

    fn emit(&self, event: TimerEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::per_second()
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        let task = self.task.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = task.take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for CountdownTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = *self.state.borrow();
        f.debug_struct("CountdownTimer")
            .field("remaining", &state.remaining)
            .field("running", &state.running)
            .field("tick", &self.tick)
            .finish()
    }
}
