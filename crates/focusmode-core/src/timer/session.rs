use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TimerError;

/// Number of focus sessions in one cycle; the last one earns a long break.
pub const SESSIONS_PER_CYCLE: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Focus,
    ShortBreak,
    LongBreak,
}

impl SessionType {
    pub const ALL: [SessionType; 3] = [
        SessionType::Focus,
        SessionType::ShortBreak,
        SessionType::LongBreak,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Focus => "focus",
            SessionType::ShortBreak => "short_break",
            SessionType::LongBreak => "long_break",
        }
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            SessionType::Focus => "Focus",
            SessionType::ShortBreak => "Short Break",
            SessionType::LongBreak => "Long Break",
        }
    }

    pub fn is_break(&self) -> bool {
        !matches!(self, SessionType::Focus)
    }

    /// The session that follows this one.
    ///
    /// `completed_focus_count` is the number of focus sessions finished so
    /// far, already including one that just completed. A focus session is
    /// followed by a long break when the latest completion closed a cycle
    /// (the 4th, 8th, ... completion) and by a short break otherwise.
    pub fn next(&self, completed_focus_count: u32) -> SessionType {
        match self {
            SessionType::Focus => {
                if completed_focus_count > 0
                    && (completed_focus_count - 1) % SESSIONS_PER_CYCLE == SESSIONS_PER_CYCLE - 1
                {
                    SessionType::LongBreak
                } else {
                    SessionType::ShortBreak
                }
            }
            SessionType::ShortBreak | SessionType::LongBreak => SessionType::Focus,
        }
    }
}

impl Default for SessionType {
    fn default() -> Self {
        SessionType::Focus
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionType {
    type Err = TimerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "focus" | "pomodoro" => Ok(SessionType::Focus),
            "short_break" | "shortbreak" | "short-break" | "short" => Ok(SessionType::ShortBreak),
            "long_break" | "longbreak" | "long-break" | "long" => Ok(SessionType::LongBreak),
            other => Err(TimerError::invalid(
                "session_type",
                format!("unrecognized session type '{other}'"),
            )),
        }
    }
}
