//! Async timer service.
//!
//! One tokio task owns the [`TimerDriver`]; every caller goes through a
//! cloneable [`TimerHandle`]. Commands and scheduler wakeups are handled
//! one at a time by that task, so engine operations never interleave even
//! on a multi-threaded runtime.
//!
//! ```ignore
//! let (handle, task) = TimerService::spawn(engine, LogSink, DriverOptions::default());
//! handle.start().await?;
//! let mut display = handle.subscribe();
//! while display.changed().await.is_ok() {
//!     println!("{}", display.borrow().display);
//! }
//! ```

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::ServiceError;
use crate::events::{Event, Snapshot};
use crate::notify::NotificationSink;
use crate::timer::{
    DriverOptions, SessionType, TimerDriver, TimerEngine, TimerSettings, TokioScheduler, Wakeup,
};

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 64;

#[derive(Debug)]
enum Op {
    SelectSessionType(SessionType),
    UpdateSettings(TimerSettings),
    Start,
    Pause,
    Skip,
    Shutdown,
}

#[derive(Debug)]
struct Command {
    op: Op,
    reply: oneshot::Sender<Vec<Event>>,
}

pub struct TimerService<N> {
    driver: TimerDriver<TokioScheduler, N>,
    commands: mpsc::Receiver<Command>,
    wakeups: mpsc::UnboundedReceiver<Wakeup>,
    snapshots: watch::Sender<Snapshot>,
    events: broadcast::Sender<Event>,
}

impl<N: NotificationSink + Send + 'static> TimerService<N> {
    /// Spawn the service on the current tokio runtime.
    ///
    /// The task ends on [`TimerHandle::shutdown`] or once every handle
    /// has been dropped.
    pub fn spawn(
        engine: TimerEngine,
        sink: N,
        options: DriverOptions,
    ) -> (TimerHandle, JoinHandle<()>) {
        let (scheduler, wakeups) = TokioScheduler::channel();
        let driver = TimerDriver::new(engine, scheduler, sink, options);
        let (command_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (snapshots, snapshot_rx) = watch::channel(driver.snapshot());
        let (events, _) = broadcast::channel(EVENT_BUFFER);

        let handle = TimerHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            events: events.clone(),
        };
        let service = Self {
            driver,
            commands,
            wakeups,
            snapshots,
            events,
        };
        (handle, tokio::spawn(service.run()))
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(Command { op, reply }) = command else {
                        break;
                    };
                    let shutdown = matches!(op, Op::Shutdown);
                    let events = self.apply(op);
                    self.publish(&events);
                    let _ = reply.send(events);
                    if shutdown {
                        break;
                    }
                }
                Some(wakeup) = self.wakeups.recv() => {
                    let events = self.driver.on_wakeup(wakeup);
                    self.publish(&events);
                }
            }
        }
        debug!("timer service stopped");
    }

    fn apply(&mut self, op: Op) -> Vec<Event> {
        match op {
            Op::SelectSessionType(session_type) => self.driver.select_session_type(session_type),
            Op::UpdateSettings(settings) => self.driver.update_settings(settings),
            Op::Start => self.driver.start(),
            Op::Pause => self.driver.pause(),
            Op::Skip => self.driver.skip(),
            Op::Shutdown => self.driver.pause(),
        }
    }

    fn publish(&self, events: &[Event]) {
        for event in events {
            // No subscribers is fine.
            let _ = self.events.send(event.clone());
        }
        let snapshot = self.driver.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

/// Cloneable front door to a running [`TimerService`].
#[derive(Debug, Clone)]
pub struct TimerHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<Snapshot>,
    events: broadcast::Sender<Event>,
}

impl TimerHandle {
    async fn call(&self, op: Op) -> Result<Vec<Event>, ServiceError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command { op, reply })
            .await
            .map_err(|_| ServiceError::Closed)?;
        response.await.map_err(|_| ServiceError::Closed)
    }

    pub async fn select_session_type(
        &self,
        session_type: SessionType,
    ) -> Result<Vec<Event>, ServiceError> {
        self.call(Op::SelectSessionType(session_type)).await
    }

    pub async fn update_settings(
        &self,
        settings: TimerSettings,
    ) -> Result<Vec<Event>, ServiceError> {
        self.call(Op::UpdateSettings(settings)).await
    }

    pub async fn start(&self) -> Result<Vec<Event>, ServiceError> {
        self.call(Op::Start).await
    }

    pub async fn pause(&self) -> Result<Vec<Event>, ServiceError> {
        self.call(Op::Pause).await
    }

    pub async fn skip(&self) -> Result<Vec<Event>, ServiceError> {
        self.call(Op::Skip).await
    }

    /// Pause the timer and stop the service task.
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        self.call(Op::Shutdown).await.map(|_| ())
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that is notified whenever the snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Receiver for every event published after this call.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }
}
