use std::io::Write;

use focusmode_core::{CompletionNotice, NotificationSink};

const BELL: &str = "\x07";

/// Prints completion notices to stderr, optionally ringing the terminal bell.
pub struct TerminalSink {
    sound: bool,
}

impl TerminalSink {
    pub fn new(sound: bool) -> Self {
        Self { sound }
    }

    fn write_notice(&self, notice: &CompletionNotice) -> std::io::Result<()> {
        let mut err = std::io::stderr().lock();
        writeln!(err)?;
        writeln!(err, "{} {}", notice.title, notice.body)?;
        if self.sound {
            write!(err, "{BELL}")?;
        }
        err.flush()
    }
}

impl NotificationSink for TerminalSink {
    fn session_completed(&mut self, notice: &CompletionNotice) {
        if let Err(e) = self.write_notice(notice) {
            tracing::warn!(error = %e, "could not show completion notice");
        }
    }
}
