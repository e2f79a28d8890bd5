//! Timer engine implementation.
//!
//! The timer engine is a tick-driven state machine. It owns no timers and
//! spawns nothing - the caller delivers one `tick()` per elapsed second
//! while the status is `Running`, and calls `fire_auto_advance()` once the
//! delay announced by [`Event::AutoAdvanceScheduled`] has passed. See
//! [`super::driver::TimerDriver`] for the piece that does this.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//! Running -> Completed -> (auto-advance) -> Running
//! any -> Idle            (select_session_type, skip)
//! ```
//!
//! Calls that are not valid in the current status are no-ops: they change
//! nothing and return `None` (or an empty `Vec`).
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerSettings::default());
//! engine.start();
//! // once per second:
//! for event in engine.tick() { /* SessionCompleted, AutoAdvanceScheduled */ }
//! ```

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::session::{SessionType, SESSIONS_PER_CYCLE};
use super::settings::TimerSettings;
use crate::events::{format_mmss, Event, Snapshot};

/// Delay between a completion and the automatic start of the next session,
/// long enough for the completion notice to surface.
pub const AUTO_ADVANCE_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
    /// Countdown reached zero. Left by auto-advance, `skip` or
    /// `select_session_type`.
    Completed,
}

/// An armed auto-advance waiting for its delay to elapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAdvance {
    /// Identifies this arming; a stale token is ignored on fire.
    pub token: u64,
    pub next: SessionType,
}

/// Core timer engine.
///
/// Single owner, no interior mutability. Every operation updates session
/// type, status and remaining time together.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    settings: TimerSettings,
    session_type: SessionType,
    status: TimerStatus,
    remaining_secs: u32,
    /// Focus sessions finished since creation. Never decreases.
    completed_focus_count: u32,
    pending_advance: Option<PendingAdvance>,
    last_token: u64,
    advance_delay: Duration,
}

impl TimerEngine {
    /// Create an idle engine on a fresh focus session.
    pub fn new(settings: TimerSettings) -> Self {
        let settings = settings.clamped();
        Self {
            settings,
            session_type: SessionType::Focus,
            status: TimerStatus::Idle,
            remaining_secs: settings.duration_secs(SessionType::Focus),
            completed_focus_count: 0,
            pending_advance: None,
            last_token: 0,
            advance_delay: AUTO_ADVANCE_DELAY,
        }
    }

    /// Override the auto-advance delay (demos and fast test runs).
    pub fn with_advance_delay(mut self, delay: Duration) -> Self {
        self.advance_delay = delay;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn completed_focus_count(&self) -> u32 {
        self.completed_focus_count
    }

    pub fn pending_advance(&self) -> Option<PendingAdvance> {
        self.pending_advance
    }

    pub fn advance_delay(&self) -> Duration {
        self.advance_delay
    }

    /// Nominal length of the current session type under the current settings.
    pub fn total_secs(&self) -> u32 {
        self.settings.duration_secs(self.session_type)
    }

    /// 0.0 ..= 100.0 progress within the current session.
    pub fn progress_pct(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 {
            return 0.0;
        }
        let pct = 100.0 * (1.0 - f64::from(self.remaining_secs) / f64::from(total));
        pct.clamp(0.0, 100.0)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            session_type: self.session_type,
            status: self.status,
            remaining_secs: self.remaining_secs,
            total_secs: self.total_secs(),
            progress_pct: self.progress_pct(),
            completed_focus_count: self.completed_focus_count,
            cycle_position: self.completed_focus_count % SESSIONS_PER_CYCLE,
            display: format_mmss(self.remaining_secs),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Switch to `session_type`, reset its countdown and go idle.
    pub fn select_session_type(&mut self, session_type: SessionType) -> Event {
        self.cancel_pending();
        self.session_type = session_type;
        self.status = TimerStatus::Idle;
        self.remaining_secs = self.total_secs();
        debug!(session = %session_type, remaining = self.remaining_secs, "session selected");
        Event::SessionSelected {
            session_type,
            duration_secs: self.remaining_secs,
            at: Utc::now(),
        }
    }

    /// Replace the settings, clamping durations into bounds.
    ///
    /// An idle session picks up its new duration immediately. Running,
    /// paused and completed sessions keep their countdown; the change
    /// applies from the next session. An armed auto-advance is dropped if
    /// the new settings no longer auto-start after the finished session.
    pub fn update_settings(&mut self, settings: TimerSettings) -> Event {
        let clamped = settings.clamped();
        if clamped != settings {
            warn!(?settings, ?clamped, "timer settings out of range, clamped");
        }
        self.settings = clamped;

        if self.status == TimerStatus::Idle {
            self.remaining_secs = self.total_secs();
        }
        if self.pending_advance.is_some() && !clamped.auto_starts_after(self.session_type) {
            self.cancel_pending();
        }

        Event::SettingsUpdated {
            settings: clamped,
            at: Utc::now(),
        }
    }

    pub fn start(&mut self) -> Option<Event> {
        self.cancel_pending();
        match self.status {
            TimerStatus::Idle => {
                self.status = TimerStatus::Running;
                Some(Event::TimerStarted {
                    session_type: self.session_type,
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
            TimerStatus::Paused => {
                self.status = TimerStatus::Running;
                Some(Event::TimerResumed {
                    session_type: self.session_type,
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
            TimerStatus::Running | TimerStatus::Completed => {
                debug!(status = ?self.status, "start ignored");
                None
            }
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.cancel_pending();
        match self.status {
            TimerStatus::Running => {
                self.status = TimerStatus::Paused;
                Some(Event::TimerPaused {
                    session_type: self.session_type,
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
            _ => {
                debug!(status = ?self.status, "pause ignored");
                None
            }
        }
    }

    /// Move to the next session type without starting it.
    ///
    /// Uses the same rule as auto-advance and never touches the focus count.
    pub fn skip(&mut self) -> Event {
        let from = self.session_type;
        let to = from.next(self.completed_focus_count);
        self.select_session_type(to);
        info!(%from, %to, "session skipped");
        Event::TimerSkipped {
            from,
            to,
            at: Utc::now(),
        }
    }

    /// Advance the countdown by one second.
    ///
    /// Returns `SessionCompleted` (and `AutoAdvanceScheduled` when an
    /// auto-start applies) on the tick that reaches zero.
    pub fn tick(&mut self) -> Vec<Event> {
        if self.status != TimerStatus::Running {
            debug!(status = ?self.status, "tick ignored");
            return Vec::new();
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return Vec::new();
        }
        self.complete()
    }

    /// Perform the armed auto-advance identified by `token`.
    ///
    /// Selects the next session and starts it. A token that is not the
    /// currently armed one (cancelled or superseded) does nothing.
    pub fn fire_auto_advance(&mut self, token: u64) -> Vec<Event> {
        let pending = match self.pending_advance {
            Some(pending) if pending.token == token => pending,
            _ => {
                debug!(token, "stale auto-advance ignored");
                return Vec::new();
            }
        };
        self.pending_advance = None;

        let mut events = vec![self.select_session_type(pending.next)];
        events.extend(self.start());
        info!(next = %pending.next, "auto-advanced");
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self) -> Vec<Event> {
        let finished = self.session_type;
        self.status = TimerStatus::Completed;

        let completed_focus_count = if finished == SessionType::Focus {
            self.completed_focus_count += 1;
            Some(self.completed_focus_count)
        } else {
            None
        };
        info!(session = %finished, completed_focus = self.completed_focus_count, "session completed");

        let mut events = vec![Event::SessionCompleted {
            session_type: finished,
            completed_focus_count,
            at: Utc::now(),
        }];

        if self.settings.auto_starts_after(finished) {
            self.last_token += 1;
            let pending = PendingAdvance {
                token: self.last_token,
                next: finished.next(self.completed_focus_count),
            };
            self.pending_advance = Some(pending);
            events.push(Event::AutoAdvanceScheduled {
                token: pending.token,
                next: pending.next,
                delay_ms: u64::try_from(self.advance_delay.as_millis()).unwrap_or(u64::MAX),
                at: Utc::now(),
            });
        }
        events
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending_advance.take() {
            debug!(token = pending.token, "pending auto-advance discarded");
        }
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(TimerSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn manual_settings() -> TimerSettings {
        TimerSettings {
            auto_start_breaks: false,
            auto_start_focus: false,
            ..TimerSettings::default()
        }
    }

    /// Tick until the countdown ends, returning the events of the last tick.
    fn run_out(engine: &mut TimerEngine) -> Vec<Event> {
        let mut last = Vec::new();
        for _ in 0..engine.remaining_secs() {
            last = engine.tick();
        }
        last
    }

    #[test]
    fn fresh_engine_is_idle_focus() {
        let engine = TimerEngine::default();
        assert_eq!(engine.session_type(), SessionType::Focus);
        assert_eq!(engine.status(), TimerStatus::Idle);
        assert_eq!(engine.remaining_secs(), 1500);
        assert_eq!(engine.completed_focus_count(), 0);
        assert_eq!(engine.progress_pct(), 0.0);
    }

    #[test]
    fn start_pause_resume() {
        let mut engine = TimerEngine::default();
        assert!(matches!(engine.start(), Some(Event::TimerStarted { .. })));
        assert_eq!(engine.status(), TimerStatus::Running);

        assert!(engine.pause().is_some());
        assert_eq!(engine.status(), TimerStatus::Paused);

        assert!(matches!(engine.start(), Some(Event::TimerResumed { .. })));
        assert_eq!(engine.status(), TimerStatus::Running);
    }

    #[test]
    fn invalid_transitions_are_noops() {
        let mut engine = TimerEngine::default();
        assert!(engine.pause().is_none());
        assert!(engine.tick().is_empty());
        assert_eq!(engine.remaining_secs(), 1500);

        engine.start();
        assert!(engine.start().is_none());
        assert_eq!(engine.status(), TimerStatus::Running);
    }

    #[test]
    fn pause_then_start_keeps_exact_remaining() {
        let mut engine = TimerEngine::default();
        engine.start();
        for _ in 0..37 {
            engine.tick();
        }
        engine.pause();
        let at_pause = engine.remaining_secs();
        assert_eq!(at_pause, 1500 - 37);

        assert!(engine.tick().is_empty());
        engine.start();
        assert_eq!(engine.remaining_secs(), at_pause);
        engine.tick();
        assert_eq!(engine.remaining_secs(), at_pause - 1);
    }

    #[test]
    fn full_countdown_completes_exactly_once() {
        for session_type in SessionType::ALL {
            let mut engine = TimerEngine::new(manual_settings());
            engine.select_session_type(session_type);
            engine.start();
            let nominal = engine.total_secs();

            let mut completions = 0;
            for _ in 0..nominal {
                completions += engine
                    .tick()
                    .iter()
                    .filter(|e| matches!(e, Event::SessionCompleted { .. }))
                    .count();
            }
            assert_eq!(completions, 1, "{session_type}");
            assert_eq!(engine.remaining_secs(), 0);
            assert_eq!(engine.status(), TimerStatus::Completed);
            assert_eq!(engine.progress_pct(), 100.0);

            // Completed engines ignore further ticks.
            assert!(engine.tick().is_empty());
            assert_eq!(engine.remaining_secs(), 0);
        }
    }

    #[test]
    fn focus_completion_reports_post_increment_count() {
        let mut engine = TimerEngine::new(manual_settings());
        engine.start();
        let events = run_out(&mut engine);
        assert!(matches!(
            events.as_slice(),
            [Event::SessionCompleted {
                session_type: SessionType::Focus,
                completed_focus_count: Some(1),
                ..
            }]
        ));
        assert_eq!(engine.completed_focus_count(), 1);
    }

    #[test]
    fn break_completion_leaves_count_alone() {
        let mut engine = TimerEngine::new(manual_settings());
        engine.select_session_type(SessionType::ShortBreak);
        engine.start();
        let events = run_out(&mut engine);
        assert!(matches!(
            events.as_slice(),
            [Event::SessionCompleted {
                session_type: SessionType::ShortBreak,
                completed_focus_count: None,
                ..
            }]
        ));
        assert_eq!(engine.completed_focus_count(), 0);
    }

    #[test]
    fn fourth_skip_after_completion_selects_long_break() {
        let mut engine = TimerEngine::new(TimerSettings {
            focus_minutes: 25,
            auto_start_breaks: false,
            ..TimerSettings::default()
        });

        let mut selected = Vec::new();
        for _ in 0..4 {
            assert_eq!(engine.session_type(), SessionType::Focus);
            engine.start();
            run_out(&mut engine);
            assert_eq!(engine.status(), TimerStatus::Completed);
            assert!(engine.pending_advance().is_none());

            engine.skip();
            selected.push(engine.session_type());
            // Skip the break to get back to focus.
            engine.skip();
        }
        assert_eq!(
            selected,
            vec![
                SessionType::ShortBreak,
                SessionType::ShortBreak,
                SessionType::ShortBreak,
                SessionType::LongBreak,
            ]
        );
        assert_eq!(engine.completed_focus_count(), 4);
    }

    #[test]
    fn skip_never_runs_or_counts() {
        let mut engine = TimerEngine::default();
        engine.start();
        engine.tick();
        let event = engine.skip();
        assert!(matches!(
            event,
            Event::TimerSkipped {
                from: SessionType::Focus,
                to: SessionType::ShortBreak,
                ..
            }
        ));
        assert_eq!(engine.status(), TimerStatus::Idle);
        assert_eq!(engine.remaining_secs(), 300);
        assert_eq!(engine.completed_focus_count(), 0);

        engine.skip();
        assert_eq!(engine.session_type(), SessionType::Focus);
        assert_eq!(engine.status(), TimerStatus::Idle);
        assert_eq!(engine.completed_focus_count(), 0);
    }

    #[test]
    fn skip_from_completed_with_auto_start_does_not_run() {
        let mut engine = TimerEngine::default();
        engine.start();
        run_out(&mut engine);
        assert!(engine.pending_advance().is_some());

        engine.skip();
        assert_eq!(engine.status(), TimerStatus::Idle);
        assert_eq!(engine.session_type(), SessionType::ShortBreak);
        assert!(engine.pending_advance().is_none());
        assert_eq!(engine.completed_focus_count(), 1);
    }

    #[test]
    fn auto_start_breaks_arms_and_fires_advance() {
        let mut engine = TimerEngine::default();
        engine.start();
        let events = run_out(&mut engine);

        let token = match events.as_slice() {
            [Event::SessionCompleted { .. }, Event::AutoAdvanceScheduled {
                token,
                next: SessionType::ShortBreak,
                delay_ms: 1500,
                ..
            }] => *token,
            other => panic!("unexpected events {other:?}"),
        };
        assert_eq!(engine.status(), TimerStatus::Completed);

        let fired = engine.fire_auto_advance(token);
        assert_eq!(fired.len(), 2);
        assert_eq!(engine.session_type(), SessionType::ShortBreak);
        assert_eq!(engine.status(), TimerStatus::Running);
        assert_eq!(engine.remaining_secs(), 300);
        assert!(engine.pending_advance().is_none());
    }

    #[test]
    fn no_auto_start_stays_completed() {
        let mut engine = TimerEngine::new(manual_settings());
        engine.start();
        let events = run_out(&mut engine);
        assert_eq!(events.len(), 1);
        assert!(engine.pending_advance().is_none());
        assert_eq!(engine.status(), TimerStatus::Completed);
        assert!(engine.start().is_none());
        assert_eq!(engine.status(), TimerStatus::Completed);
    }

    #[test]
    fn break_completion_auto_starts_focus() {
        let mut engine = TimerEngine::new(TimerSettings {
            auto_start_breaks: false,
            auto_start_focus: true,
            ..TimerSettings::default()
        });
        engine.select_session_type(SessionType::LongBreak);
        engine.start();
        run_out(&mut engine);
        let pending = engine.pending_advance().expect("armed");
        assert_eq!(pending.next, SessionType::Focus);

        engine.fire_auto_advance(pending.token);
        assert_eq!(engine.session_type(), SessionType::Focus);
        assert_eq!(engine.status(), TimerStatus::Running);
        assert_eq!(engine.remaining_secs(), 1500);
    }

    #[test]
    fn manual_operations_discard_pending_advance() {
        type Op = fn(&mut TimerEngine);
        let ops: [Op; 4] = [
            |e| {
                e.skip();
            },
            |e| {
                e.select_session_type(SessionType::LongBreak);
            },
            |e| {
                e.pause();
            },
            |e| {
                e.start();
            },
        ];
        for op in ops {
            let mut engine = TimerEngine::default();
            engine.start();
            run_out(&mut engine);
            let token = engine.pending_advance().expect("armed").token;

            op(&mut engine);
            assert!(engine.pending_advance().is_none());

            let before = engine.snapshot();
            assert!(engine.fire_auto_advance(token).is_empty());
            assert_eq!(engine.snapshot(), before);
        }
    }

    #[test]
    fn tokens_are_unique_per_arming() {
        let mut engine = TimerEngine::default();
        engine.start();
        run_out(&mut engine);
        let first = engine.pending_advance().unwrap().token;
        engine.fire_auto_advance(first);
        run_out(&mut engine);
        let second = engine.pending_advance().unwrap().token;
        assert_ne!(first, second);
        assert!(engine.fire_auto_advance(first).is_empty());
    }

    #[test]
    fn update_settings_recomputes_when_idle() {
        let mut engine = TimerEngine::default();
        engine.update_settings(TimerSettings {
            focus_minutes: 50,
            ..TimerSettings::default()
        });
        assert_eq!(engine.remaining_secs(), 3000);
        assert_eq!(engine.status(), TimerStatus::Idle);
    }

    #[test]
    fn update_settings_leaves_running_countdown_alone() {
        let mut engine = TimerEngine::default();
        engine.start();
        engine.tick();
        engine.update_settings(TimerSettings {
            focus_minutes: 10,
            ..TimerSettings::default()
        });
        assert_eq!(engine.remaining_secs(), 1499);
        assert_eq!(engine.status(), TimerStatus::Running);

        engine.pause();
        engine.update_settings(TimerSettings {
            focus_minutes: 60,
            ..TimerSettings::default()
        });
        assert_eq!(engine.remaining_secs(), 1499);

        // Next session uses the new duration.
        engine.select_session_type(SessionType::Focus);
        assert_eq!(engine.remaining_secs(), 3600);
    }

    #[test]
    fn update_settings_clamps_out_of_range() {
        let mut engine = TimerEngine::default();
        let event = engine.update_settings(TimerSettings {
            focus_minutes: 90,
            short_break_minutes: 0,
            long_break_minutes: 45,
            ..TimerSettings::default()
        });
        assert!(matches!(
            event,
            Event::SettingsUpdated { settings, .. } if settings.focus_minutes == 60
        ));
        assert_eq!(engine.settings().short_break_minutes, 1);
        assert_eq!(engine.settings().long_break_minutes, 30);
        assert_eq!(engine.remaining_secs(), 3600);
    }

    #[test]
    fn disabling_auto_start_drops_armed_advance() {
        let mut engine = TimerEngine::default();
        engine.start();
        run_out(&mut engine);
        assert!(engine.pending_advance().is_some());

        engine.update_settings(manual_settings());
        assert!(engine.pending_advance().is_none());
        assert_eq!(engine.status(), TimerStatus::Completed);
    }

    #[test]
    fn progress_uses_current_settings() {
        let mut engine = TimerEngine::default();
        engine.start();
        for _ in 0..750 {
            engine.tick();
        }
        assert!((engine.progress_pct() - 50.0).abs() < 1e-9);

        // Shorter nominal duration than what is left: clamped at 0.
        engine.update_settings(TimerSettings {
            focus_minutes: 5,
            ..TimerSettings::default()
        });
        assert_eq!(engine.progress_pct(), 0.0);
    }

    #[test]
    fn end_to_end_focus_to_short_break() {
        let mut engine = TimerEngine::new(TimerSettings {
            focus_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            auto_start_breaks: true,
            auto_start_focus: true,
        });
        engine.select_session_type(SessionType::Focus);
        assert_eq!(engine.remaining_secs(), 1500);
        engine.start();
        for _ in 0..1500 {
            engine.tick();
        }
        assert_eq!(engine.status(), TimerStatus::Completed);
        assert_eq!(engine.completed_focus_count(), 1);

        let token = engine.pending_advance().unwrap().token;
        engine.fire_auto_advance(token);
        assert_eq!(engine.session_type(), SessionType::ShortBreak);
        assert_eq!(engine.remaining_secs(), 300);
        assert_eq!(engine.status(), TimerStatus::Running);
    }

    #[test]
    fn snapshot_reflects_cycle_position() {
        let mut engine = TimerEngine::new(manual_settings());
        for _ in 0..5 {
            engine.select_session_type(SessionType::Focus);
            engine.start();
            run_out(&mut engine);
        }
        let snap = engine.snapshot();
        assert_eq!(snap.completed_focus_count, 5);
        assert_eq!(snap.cycle_position, 1);
        assert_eq!(snap.display, "00:00");
        assert_eq!(snap.status, TimerStatus::Completed);
    }

    proptest! {
        #[test]
        fn progress_is_bounded_and_monotonic(
            focus in 0u32..80,
            short in 0u32..20,
            long in 0u32..40,
            which in 0usize..3,
            ticks in 0usize..4000,
        ) {
            let mut engine = TimerEngine::new(TimerSettings {
                focus_minutes: focus,
                short_break_minutes: short,
                long_break_minutes: long,
                auto_start_breaks: false,
                auto_start_focus: false,
            });
            engine.select_session_type(SessionType::ALL[which]);
            engine.start();

            let mut last = engine.progress_pct();
            prop_assert!((0.0..=100.0).contains(&last));
            for _ in 0..ticks {
                if engine.status() != TimerStatus::Running {
                    break;
                }
                engine.tick();
                let pct = engine.progress_pct();
                prop_assert!((0.0..=100.0).contains(&pct));
                prop_assert!(pct >= last);
                last = pct;
            }
        }
    }
}
