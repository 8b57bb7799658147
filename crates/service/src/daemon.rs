//! Command loop: feeds newline-delimited commands to the dispatcher until
//! input ends or a shutdown is requested.

use std::io::BufRead;
use std::thread;

use busylight_engine::{DispatchError, Dispatcher, Outcome};
use crossbeam::channel::{Receiver, select, unbounded};
use tracing::{debug, error, info, warn};

/// Why the loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopReason {
    #[default]
    InputClosed,
    Shutdown,
}

/// Per-run command counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopSummary {
    pub handled: usize,
    pub ignored: usize,
    pub failed: usize,
    pub stopped_by: StopReason,
}

impl LoopSummary {
    fn record(&mut self, result: &Result<Outcome, DispatchError>) {
        match result {
            Ok(Outcome::Ignored) => self.ignored += 1,
            Ok(_) => self.handled += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Switch the light off and release it after the daemon failed to start,
/// returning `error` for the caller to report.
pub fn abort_startup(dispatcher: Dispatcher, error: anyhow::Error) -> anyhow::Error {
    if let Err(e) = dispatcher.shutdown() {
        warn!("Shutdown after failed start: {}", e);
    }
    error
}

/// Read lines from `reader` on a background thread.
///
/// The returned channel disconnects at end of input. The reader thread is
/// detached; a blocked read never delays shutdown.
pub fn spawn_line_reader<R>(reader: R) -> std::io::Result<Receiver<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = unbounded();
    thread::Builder::new()
        .name("busylight-input".to_string())
        .spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to read command input: {}", e);
                        break;
                    }
                }
            }
            debug!("Command input reader exiting");
        })?;
    Ok(rx)
}

pub struct CommandLoop {
    commands: Receiver<String>,
    shutdown: Receiver<()>,
}

impl CommandLoop {
    /// A message on `shutdown`, or its disconnection, ends the loop.
    pub fn new(commands: Receiver<String>, shutdown: Receiver<()>) -> Self {
        Self { commands, shutdown }
    }

    pub fn run(&self, dispatcher: &mut Dispatcher) -> LoopSummary {
        let mut summary = LoopSummary::default();
        loop {
            select! {
                recv(self.commands) -> msg => match msg {
                    Ok(line) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        let result = dispatcher.handle(&line);
                        if let Err(DispatchError::Scheduler(e)) = &result {
                            error!("Effect failure while handling '{}': {}", line.trim(), e);
                        }
                        summary.record(&result);
                    }
                    Err(_) => {
                        info!("Command input closed");
                        summary.stopped_by = StopReason::InputClosed;
                        break;
                    }
                },
                recv(self.shutdown) -> _ => {
                    info!("Shutdown requested");
                    summary.stopped_by = StopReason::Shutdown;
                    break;
                }
            }
        }
        info!(
            "Command loop finished: {} handled, {} ignored, {} failed",
            summary.handled, summary.ignored, summary.failed
        );
        summary
    }
}
