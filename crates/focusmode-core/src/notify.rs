//! Completion notices and the sinks that receive them.
//!
//! A sink renders the notice however the host likes (toast, terminal line,
//! sound). Sinks own their failures: nothing a sink does can reach back
//! into the engine.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::timer::SessionType;

/// What a host needs to announce a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionNotice {
    pub session_type: SessionType,
    /// Focus sessions completed so far; only set for focus sessions.
    pub completed_focus_count: Option<u32>,
    pub title: String,
    pub body: String,
}

impl CompletionNotice {
    /// Build the notice text. `rtl` selects the Arabic messages.
    pub fn new(session_type: SessionType, completed_focus_count: Option<u32>, rtl: bool) -> Self {
        let (title, body) = match (session_type.is_break(), rtl) {
            (false, false) => ("Focus session complete!", "Time for a break!"),
            (true, false) => ("Break time complete!", "Ready to get back to work?"),
            (false, true) => ("انتهت فترة التركيز!", "حان وقت الراحة!"),
            (true, true) => ("انتهت فترة الراحة!", "هل أنت مستعد للعودة للعمل؟"),
        };
        Self {
            session_type,
            completed_focus_count,
            title: title.to_string(),
            body: body.to_string(),
        }
    }
}

pub trait NotificationSink {
    fn session_completed(&mut self, notice: &CompletionNotice);
}

impl<N: NotificationSink + ?Sized> NotificationSink for Box<N> {
    fn session_completed(&mut self, notice: &CompletionNotice) {
        (**self).session_completed(notice);
    }
}

/// Writes notices to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn session_completed(&mut self, notice: &CompletionNotice) {
        info!(
            session = %notice.session_type,
            completed_focus = ?notice.completed_focus_count,
            "{}: {}",
            notice.title,
            notice.body
        );
    }
}

/// Keeps every notice in a shared list; clones see the same list.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    notices: Arc<Mutex<Vec<CompletionNotice>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<CompletionNotice> {
        match self.notices.lock() {
            Ok(notices) => notices.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl NotificationSink for MemorySink {
    fn session_completed(&mut self, notice: &CompletionNotice) {
        match self.notices.lock() {
            Ok(mut notices) => notices.push(notice.clone()),
            Err(poisoned) => poisoned.into_inner().push(notice.clone()),
        }
    }
}
