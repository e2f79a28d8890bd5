//! Timer settings and their bounds.
//!
//! Durations are whole minutes on a fixed grid:
//!
//! | field                 | min | max | step | default |
//! |-----------------------|-----|-----|------|---------|
//! | `focus_minutes`       | 5   | 60  | 5    | 25      |
//! | `short_break_minutes` | 1   | 15  | 1    | 5       |
//! | `long_break_minutes`  | 5   | 30  | 5    | 15      |
//!
//! [`TimerSettings::clamped`] snaps anything off-grid back onto it, which is
//! what the engine applies. [`TimerSettings::validate`] is the strict variant.

use serde::{Deserialize, Serialize};

use super::session::SessionType;
use crate::error::TimerError;

/// Allowed range for one duration setting, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationBounds {
    pub min: u32,
    pub max: u32,
    pub step: u32,
}

impl DurationBounds {
    /// Clamp into `[min, max]` and round to the nearest step (ties round up).
    pub fn clamp(&self, minutes: u32) -> u32 {
        let bounded = minutes.clamp(self.min, self.max);
        let offset = bounded - self.min;
        let snapped = self.min + (offset + self.step / 2) / self.step * self.step;
        snapped.min(self.max)
    }

    pub fn contains(&self, minutes: u32) -> bool {
        (self.min..=self.max).contains(&minutes) && (minutes - self.min) % self.step == 0
    }
}

pub const FOCUS_BOUNDS: DurationBounds = DurationBounds { min: 5, max: 60, step: 5 };
pub const SHORT_BREAK_BOUNDS: DurationBounds = DurationBounds { min: 1, max: 15, step: 1 };
pub const LONG_BREAK_BOUNDS: DurationBounds = DurationBounds { min: 5, max: 30, step: 5 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    #[serde(default = "default_true")]
    pub auto_start_breaks: bool,
    #[serde(default = "default_true")]
    pub auto_start_focus: bool,
}

fn default_focus_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_true() -> bool {
    true
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            auto_start_breaks: true,
            auto_start_focus: true,
        }
    }
}

impl TimerSettings {
    pub fn bounds(session_type: SessionType) -> DurationBounds {
        match session_type {
            SessionType::Focus => FOCUS_BOUNDS,
            SessionType::ShortBreak => SHORT_BREAK_BOUNDS,
            SessionType::LongBreak => LONG_BREAK_BOUNDS,
        }
    }

    /// Configured minutes for a session type.
    pub fn minutes_for(&self, session_type: SessionType) -> u32 {
        match session_type {
            SessionType::Focus => self.focus_minutes,
            SessionType::ShortBreak => self.short_break_minutes,
            SessionType::LongBreak => self.long_break_minutes,
        }
    }

    /// Nominal duration of a session type in seconds.
    pub fn duration_secs(&self, session_type: SessionType) -> u32 {
        self.minutes_for(session_type).saturating_mul(60)
    }

    /// Whether finishing `session_type` should start the next session by itself.
    pub fn auto_starts_after(&self, session_type: SessionType) -> bool {
        if session_type.is_break() {
            self.auto_start_focus
        } else {
            self.auto_start_breaks
        }
    }

    /// Copy with every duration snapped into its bounds.
    pub fn clamped(&self) -> Self {
        Self {
            focus_minutes: FOCUS_BOUNDS.clamp(self.focus_minutes),
            short_break_minutes: SHORT_BREAK_BOUNDS.clamp(self.short_break_minutes),
            long_break_minutes: LONG_BREAK_BOUNDS.clamp(self.long_break_minutes),
            ..*self
        }
    }

    /// Reject any duration outside its bounds or off its step grid.
    pub fn validate(&self) -> Result<(), TimerError> {
        for session_type in SessionType::ALL {
            let bounds = Self::bounds(session_type);
            let minutes = self.minutes_for(session_type);
            if !bounds.contains(minutes) {
                return Err(TimerError::invalid(
                    field_name(session_type),
                    format!(
                        "{minutes} is not in {}..={} (step {})",
                        bounds.min, bounds.max, bounds.step
                    ),
                ));
            }
        }
        Ok(())
    }
}

fn field_name(session_type: SessionType) -> &'static str {
    match session_type {
        SessionType::Focus => "focus_minutes",
        SessionType::ShortBreak => "short_break_minutes",
        SessionType::LongBreak => "long_break_minutes",
    }
}
