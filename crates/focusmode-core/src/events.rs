use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{SessionType, TimerSettings, TimerStatus};

/// Every state change in the engine produces an Event.
/// Hosts render from snapshots; sinks and logs consume events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionSelected {
        session_type: SessionType,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    TimerStarted {
        session_type: SessionType,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerResumed {
        session_type: SessionType,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        session_type: SessionType,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// A countdown reached zero. `completed_focus_count` is set only for
    /// focus sessions and already includes the one that just finished.
    SessionCompleted {
        session_type: SessionType,
        completed_focus_count: Option<u32>,
        at: DateTime<Utc>,
    },
    /// The next session will be selected and started after `delay_ms`
    /// unless a manual operation comes first.
    AutoAdvanceScheduled {
        token: u64,
        next: SessionType,
        delay_ms: u64,
        at: DateTime<Utc>,
    },
    TimerSkipped {
        from: SessionType,
        to: SessionType,
        at: DateTime<Utc>,
    },
    SettingsUpdated {
        settings: TimerSettings,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Short lowercase name, used in logs and the CLI.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::SessionSelected { .. } => "session_selected",
            Event::TimerStarted { .. } => "timer_started",
            Event::TimerResumed { .. } => "timer_resumed",
            Event::TimerPaused { .. } => "timer_paused",
            Event::SessionCompleted { .. } => "session_completed",
            Event::AutoAdvanceScheduled { .. } => "auto_advance_scheduled",
            Event::TimerSkipped { .. } => "timer_skipped",
            Event::SettingsUpdated { .. } => "settings_updated",
        }
    }
}

/// Display-boundary view of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub session_type: SessionType,
    pub status: TimerStatus,
    pub remaining_secs: u32,
    pub total_secs: u32,
    pub progress_pct: f64,
    pub completed_focus_count: u32,
    /// Focus sessions finished in the current cycle of four.
    pub cycle_position: u32,
    /// Remaining time as `MM:SS`.
    pub display: String,
}

/// Format seconds as zero-padded `MM:SS`.
pub fn format_mmss(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
