use std::io::Write;
use std::time::Duration;

use clap::{Args, Subcommand};
use focusmode_core::timer::SESSIONS_PER_CYCLE;
use focusmode_core::{
    Config, DriverOptions, Event, LogSink, NotificationSink, SessionType, Snapshot, TimerEngine,
    TimerHandle, TimerService, TimerSettings, TimerStatus,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use crate::sink::TerminalSink;

const PROGRESS_WIDTH: usize = 20;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a live countdown in this terminal
    Run(RunArgs),
    /// Print the state of a fresh timer as JSON
    Status {
        /// Session type to show
        #[arg(long = "type", default_value = "focus")]
        session_type: SessionType,
    },
    /// Print the session type that follows another
    Next {
        /// Session that just ended or is being skipped
        #[arg(long = "type")]
        session_type: SessionType,
        /// Focus sessions completed so far
        #[arg(long, default_value_t = 0)]
        count: u32,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Session type to begin with
    #[arg(long = "type", default_value = "focus")]
    session_type: SessionType,
    /// Focus minutes (overrides config)
    #[arg(long)]
    focus: Option<u32>,
    /// Short break minutes (overrides config)
    #[arg(long)]
    short_break: Option<u32>,
    /// Long break minutes (overrides config)
    #[arg(long)]
    long_break: Option<u32>,
    /// Do not start breaks automatically
    #[arg(long)]
    no_auto_breaks: bool,
    /// Do not start focus sessions automatically
    #[arg(long)]
    no_auto_focus: bool,
    /// Milliseconds per timer second
    #[arg(long, default_value_t = 1000)]
    tick_ms: u64,
    /// Milliseconds between a completion and the auto-start
    #[arg(long, default_value_t = 1500)]
    advance_ms: u64,
    /// Exit after this many completed sessions
    #[arg(long)]
    sessions: Option<u32>,
    /// Print events as JSON lines instead of a live display
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    fn settings(&self, base: TimerSettings) -> TimerSettings {
        TimerSettings {
            focus_minutes: self.focus.unwrap_or(base.focus_minutes),
            short_break_minutes: self.short_break.unwrap_or(base.short_break_minutes),
            long_break_minutes: self.long_break.unwrap_or(base.long_break_minutes),
            auto_start_breaks: base.auto_start_breaks && !self.no_auto_breaks,
            auto_start_focus: base.auto_start_focus && !self.no_auto_focus,
        }
    }
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Run(args) => {
            let config = Config::load()?;
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(run_live(args, config))?;
        }
        TimerAction::Status { session_type } => {
            let config = Config::load()?;
            let mut engine = TimerEngine::new(config.timer);
            engine.select_session_type(session_type);
            println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
        }
        TimerAction::Next {
            session_type,
            count,
        } => {
            println!("{}", session_type.next(count));
        }
    }
    Ok(())
}

async fn run_live(args: RunArgs, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let engine = TimerEngine::new(args.settings(config.timer))
        .with_advance_delay(Duration::from_millis(args.advance_ms));
    let sink: Box<dyn NotificationSink + Send> = if config.notifications.enabled {
        Box::new(TerminalSink::new(config.notifications.sound))
    } else {
        Box::new(LogSink)
    };
    let options = DriverOptions {
        tick_period: Duration::from_millis(args.tick_ms.max(1)),
        rtl: config.notifications.rtl,
    };

    let (handle, task) = TimerService::spawn(engine, sink, options);
    let mut events = handle.events();
    let mut display = handle.subscribe();

    handle.select_session_type(args.session_type).await?;
    handle.start().await?;
    if !args.json {
        print_help();
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut completed = 0u32;

    loop {
        tokio::select! {
            changed = display.changed(), if !args.json => {
                if changed.is_err() {
                    break;
                }
                let snapshot = display.borrow_and_update().clone();
                render(&snapshot)?;
            }
            event = events.recv() => match event {
                Ok(event) => {
                    if args.json {
                        println!("{}", serde_json::to_string(&event)?);
                    }
                    if matches!(event, Event::SessionCompleted { .. }) {
                        completed += 1;
                        if args.sessions.is_some_and(|n| completed >= n) {
                            break;
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event stream lagged");
                }
                Err(RecvError::Closed) => break,
            },
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => {
                    if !apply_command(&handle, line.trim()).await? {
                        break;
                    }
                }
                None => stdin_open = false,
            },
        }
    }

    handle.shutdown().await?;
    task.await?;
    if !args.json {
        println!();
    }
    Ok(())
}

/// Apply one line typed by the user. Returns `false` to quit.
async fn apply_command(
    handle: &TimerHandle,
    input: &str,
) -> Result<bool, Box<dyn std::error::Error>> {
    match input {
        "" => {}
        "start" | "resume" => {
            handle.start().await?;
        }
        "pause" => {
            handle.pause().await?;
        }
        "skip" => {
            handle.skip().await?;
        }
        "status" => println!("\n{}", serde_json::to_string(&handle.snapshot())?),
        "help" => print_help(),
        "quit" | "exit" | "q" => return Ok(false),
        other => match other.parse::<SessionType>() {
            Ok(session_type) => {
                handle.select_session_type(session_type).await?;
            }
            Err(e) => eprintln!("\n{e}; type 'help' for commands"),
        },
    }
    Ok(true)
}

fn print_help() {
    eprintln!("commands: start | pause | skip | focus | short | long | status | quit");
}

fn status_label(status: TimerStatus) -> &'static str {
    match status {
        TimerStatus::Idle => "idle",
        TimerStatus::Running => "running",
        TimerStatus::Paused => "paused",
        TimerStatus::Completed => "done",
    }
}

fn render(snapshot: &Snapshot) -> std::io::Result<()> {
    let filled = ((snapshot.progress_pct / 100.0) * PROGRESS_WIDTH as f64).round() as usize;
    let filled = filled.min(PROGRESS_WIDTH);
    let bar = format!("{}{}", "#".repeat(filled), ".".repeat(PROGRESS_WIDTH - filled));
    let cycle: String = (0..SESSIONS_PER_CYCLE)
        .map(|i| if i < snapshot.cycle_position { '*' } else { 'o' })
        .collect();

    let mut out = std::io::stdout().lock();
    write!(
        out,
        "\r{:<11} {} [{}] {:>5.1}% {:<7} {}",
        snapshot.session_type.label(),
        snapshot.display,
        bar,
        snapshot.progress_pct,
        status_label(snapshot.status),
        cycle,
    )?;
    out.flush()
}
