//! Effect loops run on scheduler worker threads.
//!
//! Each loop sends one frame, then waits on its stop channel for the frame
//! interval. A stop is observed both during the wait and before every frame,
//! so no frame leaves a loop after its stop was signalled.

use std::fmt;
use std::time::Duration;

use busylight_hid_kuando_protocol::{Instruction, Rgb};
use crossbeam::channel::{Receiver, RecvTimeoutError, TryRecvError};
use tracing::{debug, trace};

use crate::config::EffectTiming;
use crate::palette::RAINBOW;
use crate::transport::SharedTransport;

/// Named effect slot. At most one instance of each runs at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EffectKind {
    KeepAlive,
    Rainbow,
    Fade,
}

impl EffectKind {
    pub const ALL: [EffectKind; 3] = [EffectKind::KeepAlive, EffectKind::Rainbow, EffectKind::Fade];

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::KeepAlive => "keep-alive",
            EffectKind::Rainbow => "rainbow",
            EffectKind::Fade => "fade",
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A startable effect with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Heartbeat carrying the device timeout in seconds.
    KeepAlive { timeout: u8 },
    Rainbow,
    /// Breathe `color` up to full brightness and back down.
    Fade { color: Rgb },
}

impl Effect {
    pub fn kind(&self) -> EffectKind {
        match self {
            Effect::KeepAlive { .. } => EffectKind::KeepAlive,
            Effect::Rainbow => EffectKind::Rainbow,
            Effect::Fade { .. } => EffectKind::Fade,
        }
    }

    /// Loop body. Returns once `stop` fires.
    pub(crate) fn run(self, transport: &SharedTransport, timing: &EffectTiming, stop: &StopSignal) {
        debug!("{} effect started", self.kind());
        match self {
            Effect::KeepAlive { timeout } => {
                run_cycle(transport, stop, timing.keep_alive_interval(), || {
                    std::iter::once(Instruction::keep_alive(timeout))
                })
            }
            Effect::Rainbow => run_cycle(transport, stop, timing.rainbow_hold(), || {
                RAINBOW.into_iter().map(Instruction::solid)
            }),
            Effect::Fade { color } => {
                run_cycle(transport, stop, timing.fade_step_delay(), || {
                    fade_ramp(timing.fade_step).map(move |b| Instruction::solid(color.scaled(b)))
                })
            }
        }
        debug!("{} effect stopped", self.kind());
    }
}

/// Repeat `cycle` until stopped, sending one frame per `interval`.
fn run_cycle<I, F>(transport: &SharedTransport, stop: &StopSignal, interval: Duration, cycle: F)
where
    I: Iterator<Item = Instruction>,
    F: Fn() -> I,
{
    loop {
        for instruction in cycle() {
            if stop.is_stopped() {
                return;
            }
            // Send failures are already logged by the transport.
            if let Err(e) = transport.send_instruction(instruction) {
                trace!("Effect frame dropped: {}", e);
            }
            if stop.wait(interval) {
                return;
            }
        }
    }
}

/// Brightness sequence of one fade cycle: `0, s, 2s, …` up to 255, then back down.
pub fn fade_ramp(step: u8) -> impl Iterator<Item = u8> + Clone {
    let step = usize::from(step.max(1));
    let up = (0..=u8::MAX).step_by(step);
    let down = (0..=u8::MAX).rev().step_by(step);
    up.chain(down)
}

/// Receiving end of an effect's stop channel.
///
/// The scheduler never sends on the channel; dropping the sender is the stop.
#[derive(Debug)]
pub struct StopSignal {
    rx: Receiver<()>,
}

impl StopSignal {
    pub(crate) fn new(rx: Receiver<()>) -> Self {
        Self { rx }
    }

    pub fn is_stopped(&self) -> bool {
        !matches!(self.rx.try_recv(), Err(TryRecvError::Empty))
    }

    /// Sleep for `delay` or until stopped. Returns `true` when stopped.
    pub fn wait(&self, delay: Duration) -> bool {
        !matches!(self.rx.recv_timeout(delay), Err(RecvTimeoutError::Timeout))
    }
}
