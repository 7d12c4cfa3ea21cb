//! Progress indicator for long-running operations.
//!
//! The indicator runs as its own task and owns the error stream while it is
//! alive. [`ProgressHandle::finish`] hands it the outcome and waits until the
//! final line has been written, so nothing the caller prints afterwards can
//! interleave with the animation.

use std::io::{self, Write};
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Animation tick.
pub const DEFAULT_TICK: Duration = Duration::from_millis(200);

const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// How the tracked operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Failed,
    /// The wait itself stopped: cancellation or a transport error.
    Aborted,
}

impl Outcome {
    fn label(self) -> &'static str {
        match self {
            Self::Completed => "done",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
        }
    }
}

enum Surface {
    /// Animated spinner on a terminal.
    Spinner(ProgressDrawTarget),
    /// Static lines for pipes and log files.
    Plain(Box<dyn Write + Send>),
}

/// A not-yet-started progress indicator.
pub struct Progress {
    message: String,
    tick: Duration,
    surface: Surface,
}

impl Progress {
    /// Indicator on stderr, animated only when stderr is a terminal.
    pub fn stderr(message: impl Into<String>) -> Self {
        let target = ProgressDrawTarget::stderr();
        if target.is_hidden() {
            Self::plain(message, io::stderr())
        } else {
            Self::spinner(message, target)
        }
    }

    /// Animated indicator drawn on `target`.
    pub fn spinner(message: impl Into<String>, target: ProgressDrawTarget) -> Self {
        Self {
            message: message.into(),
            tick: DEFAULT_TICK,
            surface: Surface::Spinner(target),
        }
    }

    /// Writes the message once, then the final line.
    pub fn plain(message: impl Into<String>, sink: impl Write + Send + 'static) -> Self {
        Self {
            message: message.into(),
            tick: DEFAULT_TICK,
            surface: Surface::Plain(Box::new(sink)),
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Spawn the indicator task.
    pub fn start(self) -> ProgressHandle {
        let (done, outcome) = oneshot::channel();
        let task = tokio::spawn(self.run(outcome));
        ProgressHandle { done, task }
    }

    async fn run(self, outcome: oneshot::Receiver<Outcome>) {
        match self.surface {
            Surface::Spinner(target) => animate(self.message, self.tick, target, outcome).await,
            Surface::Plain(mut sink) => {
                emit(&mut sink, &format!("{}\n", self.message));
                let outcome = outcome.await.unwrap_or(Outcome::Aborted);
                emit(&mut sink, &format!("{} {}\n", self.message, outcome.label()));
            }
        }
    }
}

async fn animate(
    message: String,
    tick: Duration,
    target: ProgressDrawTarget,
    mut outcome: oneshot::Receiver<Outcome>,
) {
    let pb = ProgressBar::with_draw_target(None, target);
    pb.set_style(style("{spinner:.cyan} {msg}").tick_strings(&FRAMES));
    pb.set_message(message.clone());

    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let outcome = loop {
        tokio::select! {
            biased;
            received = &mut outcome => break received.unwrap_or(Outcome::Aborted),
            _ = ticker.tick() => pb.tick(),
        }
    };

    let label = match outcome {
        Outcome::Completed => outcome.label().green(),
        Outcome::Failed => outcome.label().red(),
        Outcome::Aborted => outcome.label().yellow(),
    };
    pb.set_style(style("{msg}"));
    pb.finish_with_message(format!("{} {}", message, label));
    debug!(?outcome, "Progress finished");
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|e| {
        debug!(error = %e, template, "Invalid progress template");
        ProgressStyle::default_spinner()
    })
}

fn emit(sink: &mut Box<dyn Write + Send>, text: &str) {
    if let Err(e) = sink.write_all(text.as_bytes()).and_then(|_| sink.flush()) {
        debug!(error = %e, "Failed to write progress");
    }
}

/// Running indicator. Dropping it without calling [`finish`](Self::finish)
/// makes the task print an aborted line on its own.
pub struct ProgressHandle {
    done: oneshot::Sender<Outcome>,
    task: JoinHandle<()>,
}

impl ProgressHandle {
    /// Report the outcome and wait for the final line to be written.
    pub async fn finish(self, outcome: Outcome) {
        let _ = self.done.send(outcome);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Progress task ended abnormally");
        }
    }
}
