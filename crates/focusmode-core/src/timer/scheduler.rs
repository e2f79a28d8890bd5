//! Time-driven side effects behind a schedule/cancel seam.
//!
//! The engine never waits. A [`Scheduler`] produces [`Wakeup`]s: a
//! repeating tick while a session runs, and a one-shot wakeup when an
//! auto-advance delay has elapsed. [`ManualScheduler`] only records what
//! was requested, so transition logic can be tested without real time;
//! [`TokioScheduler`] backs it with tokio tasks.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

/// A scheduled callback coming due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wakeup {
    /// One tick period elapsed. `epoch` names the tick source that sent it.
    Tick { epoch: u64 },
    /// The auto-advance armed with `token` is due.
    Advance { token: u64 },
}

pub trait Scheduler {
    /// Begin delivering `Wakeup::Tick { epoch }` every `period`, replacing
    /// any tick source already running.
    fn start_ticks(&mut self, epoch: u64, period: Duration);

    fn stop_ticks(&mut self);

    /// Deliver `Wakeup::Advance { token }` once after `delay`, replacing any
    /// advance already scheduled.
    fn schedule_advance(&mut self, token: u64, delay: Duration);

    fn cancel_advance(&mut self);
}

/// Records requests; the test (or host) delivers wakeups by hand.
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    ticks: Option<(u64, Duration)>,
    advance: Option<(u64, Duration)>,
    tick_starts: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(epoch, period)` of the active tick source.
    pub fn ticks(&self) -> Option<(u64, Duration)> {
        self.ticks
    }

    pub fn is_ticking(&self) -> bool {
        self.ticks.is_some()
    }

    /// `(token, delay)` of the scheduled advance.
    pub fn advance(&self) -> Option<(u64, Duration)> {
        self.advance
    }

    /// How many times a tick source was started.
    pub fn tick_starts(&self) -> usize {
        self.tick_starts
    }
}

impl Scheduler for ManualScheduler {
    fn start_ticks(&mut self, epoch: u64, period: Duration) {
        self.ticks = Some((epoch, period));
        self.tick_starts += 1;
    }

    fn stop_ticks(&mut self) {
        self.ticks = None;
    }

    fn schedule_advance(&mut self, token: u64, delay: Duration) {
        self.advance = Some((token, delay));
    }

    fn cancel_advance(&mut self) {
        self.advance = None;
    }
}

/// Runs ticks and advance delays as tokio tasks feeding one channel.
///
/// Must be used from within a tokio runtime. Each kind of wakeup has at
/// most one live task; replacing or cancelling aborts the previous one.
/// A wakeup already queued when its task is aborted can still arrive, so
/// the receiver checks `epoch` / `token` before acting on it.
#[derive(Debug)]
pub struct TokioScheduler {
    wakeups: mpsc::UnboundedSender<Wakeup>,
    tick_task: Option<JoinHandle<()>>,
    advance_task: Option<JoinHandle<()>>,
}

impl TokioScheduler {
    pub fn new(wakeups: mpsc::UnboundedSender<Wakeup>) -> Self {
        Self {
            wakeups,
            tick_task: None,
            advance_task: None,
        }
    }

    /// Create a scheduler together with the receiving end of its wakeups.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Wakeup>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn is_ticking(&self) -> bool {
        self.tick_task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn has_advance(&self) -> bool {
        self.advance_task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Scheduler for TokioScheduler {
    fn start_ticks(&mut self, epoch: u64, period: Duration) {
        self.stop_ticks();
        let tx = self.wakeups.clone();
        self.tick_task = Some(tokio::spawn(async move {
            // First tick one full period from now, not immediately.
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                if tx.send(Wakeup::Tick { epoch }).is_err() {
                    break;
                }
            }
        }));
    }

    fn stop_ticks(&mut self) {
        if let Some(task) = self.tick_task.take() {
            task.abort();
        }
    }

    fn schedule_advance(&mut self, token: u64, delay: Duration) {
        self.cancel_advance();
        let tx = self.wakeups.clone();
        self.advance_task = Some(tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = tx.send(Wakeup::Advance { token });
        }));
    }

    fn cancel_advance(&mut self) {
        if let Some(task) = self.advance_task.take() {
            task.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.stop_ticks();
        self.cancel_advance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_scheduler_replaces_and_cancels() {
        let mut s = ManualScheduler::new();
        s.start_ticks(1, Duration::from_secs(1));
        s.start_ticks(2, Duration::from_secs(1));
        assert_eq!(s.ticks(), Some((2, Duration::from_secs(1))));
        assert_eq!(s.tick_starts(), 2);
        s.stop_ticks();
        assert!(!s.is_ticking());

        s.schedule_advance(7, Duration::from_millis(1500));
        assert_eq!(s.advance(), Some((7, Duration::from_millis(1500))));
        s.cancel_advance();
        assert!(s.advance().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_ticks_every_period() {
        let (mut s, mut rx) = TokioScheduler::channel();
        s.start_ticks(3, Duration::from_secs(1));
        for _ in 0..3 {
            assert_eq!(rx.recv().await, Some(Wakeup::Tick { epoch: 3 }));
        }
        s.stop_ticks();
        assert!(!s.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_ticks_leaves_one_source() {
        let (mut s, mut rx) = TokioScheduler::channel();
        s.start_ticks(1, Duration::from_secs(1));
        s.start_ticks(2, Duration::from_secs(1));
        time::sleep(Duration::from_millis(3500)).await;
        s.stop_ticks();

        let mut received = Vec::new();
        while let Ok(w) = rx.try_recv() {
            received.push(w);
        }
        assert_eq!(received, vec![Wakeup::Tick { epoch: 2 }; 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_advance_never_fires() {
        let (mut s, mut rx) = TokioScheduler::channel();
        s.schedule_advance(1, Duration::from_millis(1500));
        time::sleep(Duration::from_millis(500)).await;
        s.cancel_advance();
        time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
        assert!(!s.has_advance());
    }

    #[tokio::test(start_paused = true)]
    async fn advance_fires_once_after_delay() {
        let (mut s, mut rx) = TokioScheduler::channel();
        let started = Instant::now();
        s.schedule_advance(9, Duration::from_millis(1500));
        assert_eq!(rx.recv().await, Some(Wakeup::Advance { token: 9 }));
        assert!(started.elapsed() >= Duration::from_millis(1500));
        time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }
}
