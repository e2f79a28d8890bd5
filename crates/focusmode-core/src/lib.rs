//! # FocusMode Core Library
//!
//! This library provides the core logic for the FocusMode focus timer: a
//! Focus / Short Break / Long Break countdown with automatic advance
//! between sessions. The CLI binary is a thin terminal host over it.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A tick-driven state machine; the caller delivers one
//!   `tick()` per second and fires armed auto-advances
//! - **Scheduler**: The only place time passes; swapped for a manual
//!   scheduler in tests
//! - **Driver / Service**: Keep the scheduler in step with the engine, and
//!   serialize access to it from async hosts
//! - **Storage**: TOML-based configuration and the settings boundary
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TimerDriver`]: Engine + scheduler + notification sink
//! - [`TimerService`] / [`TimerHandle`]: Single-owner async actor
//! - [`Config`]: Application configuration management
//! - [`NotificationSink`]: Where completion notices go

pub mod error;
pub mod events;
pub mod notify;
pub mod service;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, ServiceError, TimerError};
pub use events::{format_mmss, Event, Snapshot};
pub use notify::{CompletionNotice, LogSink, MemorySink, NotificationSink};
pub use service::{TimerHandle, TimerService};
pub use storage::{
    Config, ConfigSettingsStore, MemorySettingsStore, NotificationsConfig, SettingsStore,
};
pub use timer::{
    DriverOptions, ManualScheduler, Scheduler, SessionType, TimerDriver, TimerEngine,
    TimerSettings, TimerStatus, TokioScheduler, Wakeup,
};
