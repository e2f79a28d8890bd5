//! Binds a [`TimerEngine`] to a [`Scheduler`] and a [`NotificationSink`].
//!
//! After every operation the driver reconciles the scheduler with the
//! engine: a tick source exists exactly while the status is `Running`, and
//! an advance is scheduled exactly while the engine has one armed. Each
//! tick source gets a new epoch so ticks from a stopped source are dropped.

use std::time::Duration;

use tracing::debug;

use super::engine::{TimerEngine, TimerStatus};
use super::scheduler::{Scheduler, Wakeup};
use super::session::SessionType;
use super::settings::TimerSettings;
use crate::events::{Event, Snapshot};
use crate::notify::{CompletionNotice, NotificationSink};

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverOptions {
    /// Wall time per engine tick.
    pub tick_period: Duration,
    /// Right-to-left (Arabic) notice text.
    pub rtl: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            tick_period: DEFAULT_TICK_PERIOD,
            rtl: false,
        }
    }
}

pub struct TimerDriver<S, N> {
    engine: TimerEngine,
    scheduler: S,
    sink: N,
    options: DriverOptions,
    tick_epoch: u64,
    ticking: bool,
    armed_token: Option<u64>,
}

impl<S: Scheduler, N: NotificationSink> TimerDriver<S, N> {
    pub fn new(engine: TimerEngine, scheduler: S, sink: N, options: DriverOptions) -> Self {
        let mut driver = Self {
            engine,
            scheduler,
            sink,
            options,
            tick_epoch: 0,
            ticking: false,
            armed_token: None,
        };
        driver.reconcile();
        driver
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    pub fn snapshot(&self) -> Snapshot {
        self.engine.snapshot()
    }

    pub fn select_session_type(&mut self, session_type: SessionType) -> Vec<Event> {
        let event = self.engine.select_session_type(session_type);
        self.finish(vec![event])
    }

    pub fn update_settings(&mut self, settings: TimerSettings) -> Vec<Event> {
        let event = self.engine.update_settings(settings);
        self.finish(vec![event])
    }

    pub fn start(&mut self) -> Vec<Event> {
        let events = self.engine.start().into_iter().collect();
        self.finish(events)
    }

    pub fn pause(&mut self) -> Vec<Event> {
        let events = self.engine.pause().into_iter().collect();
        self.finish(events)
    }

    pub fn skip(&mut self) -> Vec<Event> {
        let event = self.engine.skip();
        self.finish(vec![event])
    }

    /// Deliver a wakeup produced by the scheduler.
    pub fn on_wakeup(&mut self, wakeup: Wakeup) -> Vec<Event> {
        let events = match wakeup {
            Wakeup::Tick { epoch } if self.ticking && epoch == self.tick_epoch => self.engine.tick(),
            Wakeup::Tick { epoch } => {
                debug!(epoch, current = self.tick_epoch, "tick from stopped source dropped");
                Vec::new()
            }
            Wakeup::Advance { token } => self.engine.fire_auto_advance(token),
        };
        self.finish(events)
    }

    fn finish(&mut self, events: Vec<Event>) -> Vec<Event> {
        for event in &events {
            if let Event::SessionCompleted {
                session_type,
                completed_focus_count,
                ..
            } = event
            {
                let notice =
                    CompletionNotice::new(*session_type, *completed_focus_count, self.options.rtl);
                self.sink.session_completed(&notice);
            }
        }
        self.reconcile();
        events
    }

    fn reconcile(&mut self) {
        let running = self.engine.status() == TimerStatus::Running;
        if running && !self.ticking {
            self.tick_epoch += 1;
            self.scheduler
                .start_ticks(self.tick_epoch, self.options.tick_period);
            self.ticking = true;
        } else if !running && self.ticking {
            self.scheduler.stop_ticks();
            self.ticking = false;
        }

        let armed = self.engine.pending_advance().map(|p| p.token);
        if armed != self.armed_token {
            match armed {
                Some(token) => self
                    .scheduler
                    .schedule_advance(token, self.engine.advance_delay()),
                None => self.scheduler.cancel_advance(),
            }
            self.armed_token = armed;
        }
    }
}
