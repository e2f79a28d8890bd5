mod driver;
mod engine;
mod scheduler;
mod session;
mod settings;

pub use driver::{DriverOptions, TimerDriver, DEFAULT_TICK_PERIOD};
pub use engine::{PendingAdvance, TimerEngine, TimerStatus, AUTO_ADVANCE_DELAY};
pub use scheduler::{ManualScheduler, Scheduler, TokioScheduler, Wakeup};
pub use session::{SessionType, SESSIONS_PER_CYCLE};
pub use settings::{
    DurationBounds, TimerSettings, FOCUS_BOUNDS, LONG_BREAK_BOUNDS, SHORT_BREAK_BOUNDS,
};
