//! Command dispatcher: turns command strings into frames and effect changes.
//!
//! Matching order, first hit wins:
//!
//! 1. `color_<name>`: solid color
//! 2. `blink_color_<name>`: blink with a 5/5 duty cycle
//! 3. `ring_<tone>`: ringtone at full volume, then a red 1/1 blink
//! 4. `stop_ringtone`
//! 5. `off`: stop the rainbow, light off
//! 6. `rainbow_on` / `rainbow_off`
//! 7. `fade_<name>` (or `fade_color_<name>`): start a fade of a named color
//! 8. `fade_off`: stop the fade, light off
//! 9. `raw_color r,g,b`: solid color from decimal channels
//! 10. anything else is ignored

use std::fmt;
use std::thread;

use busylight_hid_kuando_protocol::{Instruction, Rgb, Ring};
use tracing::{debug, info, warn};

use crate::config::{BusylightConfig, EffectTiming};
use crate::effects::{Effect, EffectKind};
use crate::error::DispatchError;
use crate::palette;
use crate::scheduler::EffectScheduler;
use crate::transport::SharedTransport;

/// Ringtone volume used by `ring_<tone>`.
pub const RING_VOLUME: u8 = 7;
/// Duty cycle of `blink_color_<name>`.
pub const BLINK_DUTY: (u8, u8) = (5, 5);
/// Duty cycle of the blink that follows a ringtone.
pub const RING_FOLLOW_UP_DUTY: (u8, u8) = (1, 1);
pub const RING_FOLLOW_UP_COLOR: Rgb = Rgb::new(255, 0, 0);

const RAW_COLOR: &str = "raw_color";
const FADE_PREFIX: &str = "fade_";

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Solid(Rgb),
    Blink(Rgb),
    Ring(Ring),
    StopRingtone,
    Off,
    RainbowOn,
    RainbowOff,
    Fade(Rgb),
    FadeOff,
    RawColor(Rgb),
    /// No table or keyword matched.
    Unrecognized(String),
}

impl Command {
    /// Parse one command. Only a malformed `raw_color` is an error.
    pub fn parse(input: &str) -> Result<Command, DispatchError> {
        let input = input.trim();

        if let Some(rgb) = palette::solid_color(input) {
            return Ok(Command::Solid(rgb));
        }
        if let Some(rgb) = palette::blink_color(input) {
            return Ok(Command::Blink(rgb));
        }
        if let Some(ring) = palette::ringtone(input) {
            return Ok(Command::Ring(ring));
        }

        let command = match input {
            "stop_ringtone" => Command::StopRingtone,
            "off" => Command::Off,
            "rainbow_on" => Command::RainbowOn,
            "rainbow_off" => Command::RainbowOff,
            "fade_off" => Command::FadeOff,
            _ => {
                if let Some(name) = input.strip_prefix(FADE_PREFIX) {
                    fade_color(name).map_or_else(|| Command::Unrecognized(input.to_string()), Command::Fade)
                } else if let Some(args) = input.strip_prefix(RAW_COLOR) {
                    Command::RawColor(parse_raw_color(input, args)?)
                } else {
                    Command::Unrecognized(input.to_string())
                }
            }
        };
        Ok(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Solid(rgb) => write!(f, "solid {rgb}"),
            Command::Blink(rgb) => write!(f, "blink {rgb}"),
            Command::Ring(ring) => write!(f, "ring {}", ring.name()),
            Command::StopRingtone => f.write_str("stop ringtone"),
            Command::Off => f.write_str("off"),
            Command::RainbowOn => f.write_str("rainbow on"),
            Command::RainbowOff => f.write_str("rainbow off"),
            Command::Fade(rgb) => write!(f, "fade {rgb}"),
            Command::FadeOff => f.write_str("fade off"),
            Command::RawColor(rgb) => write!(f, "raw color {rgb}"),
            Command::Unrecognized(input) => write!(f, "unrecognized '{input}'"),
        }
    }
}

/// `fade_red` and `fade_color_red` both name red.
fn fade_color(name: &str) -> Option<Rgb> {
    palette::color_by_name(name).or_else(|| palette::solid_color(name))
}

fn malformed(input: &str, reason: impl Into<String>) -> DispatchError {
    DispatchError::MalformedCommand {
        input: input.to_string(),
        reason: reason.into(),
    }
}

/// Parse the `" r,g,b"` tail of a `raw_color` command.
fn parse_raw_color(input: &str, args: &str) -> Result<Rgb, DispatchError> {
    let Some(args) = args.strip_prefix(' ') else {
        return Err(malformed(input, "expected 'raw_color r,g,b'"));
    };
    if args.contains(' ') {
        return Err(malformed(input, "expected 'raw_color r,g,b'"));
    }

    let channels = args
        .split(',')
        .map(|part| {
            let value: i64 = part
                .parse()
                .map_err(|_e| malformed(input, format!("'{part}' is not an integer")))?;
            u8::try_from(value)
                .map_err(|_e| malformed(input, format!("channel {value} is outside 0-255")))
        })
        .collect::<Result<Vec<u8>, DispatchError>>()?;

    match channels.as_slice() {
        &[red, green, blue] => Ok(Rgb::new(red, green, blue)),
        other => Err(malformed(
            input,
            format!("expected three channels, got {}", other.len()),
        )),
    }
}

/// What a handled command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// One or more frames were sent.
    Sent,
    EffectStarted(EffectKind),
    /// The effect was stopped (if running) and the light switched off.
    EffectStopped(EffectKind),
    Ignored,
}

/// Routes commands to the transport and the effect scheduler.
pub struct Dispatcher {
    transport: SharedTransport,
    scheduler: EffectScheduler,
    timing: EffectTiming,
    keep_alive_timeout: u8,
    exclusive_effects: bool,
}

impl Dispatcher {
    pub fn new(transport: SharedTransport, config: &BusylightConfig) -> Self {
        Self {
            scheduler: EffectScheduler::new(transport.clone(), config.timing),
            transport,
            timing: config.timing,
            keep_alive_timeout: config.keep_alive.timeout,
            exclusive_effects: config.exclusive_effects,
        }
    }

    /// Start the process-lifetime heartbeat.
    pub fn start_keep_alive(&mut self) -> Result<(), DispatchError> {
        self.scheduler.start(Effect::KeepAlive {
            timeout: self.keep_alive_timeout,
        })?;
        Ok(())
    }

    /// Parse and execute one command string.
    pub fn handle(&mut self, input: &str) -> Result<Outcome, DispatchError> {
        let command = match Command::parse(input) {
            Ok(command) => command,
            Err(e) => {
                warn!("{}", e);
                return Err(e);
            }
        };
        debug!("Dispatching {}", command);
        self.execute(command)
    }

    pub fn execute(&mut self, command: Command) -> Result<Outcome, DispatchError> {
        match command {
            Command::Solid(rgb) | Command::RawColor(rgb) => self.send(Instruction::solid(rgb)),
            Command::Blink(rgb) => {
                let (on, off) = BLINK_DUTY;
                self.send(Instruction::blink(rgb, on, off))
            }
            Command::Ring(ring) => {
                // A failed tone frame still gets its follow-up blink.
                let tone = self.send(Instruction::ring(ring, RING_VOLUME));
                thread::sleep(self.timing.ringtone_settle());
                let (on, off) = RING_FOLLOW_UP_DUTY;
                let blink = self.send(Instruction::blink(RING_FOLLOW_UP_COLOR, on, off));
                tone.and(blink)
            }
            Command::StopRingtone => self.send(Instruction::stop_ringtone()),
            Command::Off => {
                self.scheduler.stop(EffectKind::Rainbow)?;
                self.send(Instruction::off())
            }
            Command::RainbowOn => self.start_effect(Effect::Rainbow),
            Command::RainbowOff => self.stop_effect(EffectKind::Rainbow),
            Command::Fade(color) => self.start_effect(Effect::Fade { color }),
            Command::FadeOff => self.stop_effect(EffectKind::Fade),
            Command::Unrecognized(input) => {
                debug!("Ignoring unrecognized command '{}'", input);
                Ok(Outcome::Ignored)
            }
        }
    }

    fn send(&self, instruction: Instruction) -> Result<Outcome, DispatchError> {
        self.transport.send_instruction(instruction)?;
        Ok(Outcome::Sent)
    }

    fn start_effect(&mut self, effect: Effect) -> Result<Outcome, DispatchError> {
        let kind = effect.kind();
        if self.exclusive_effects {
            let rival = match kind {
                EffectKind::Rainbow => Some(EffectKind::Fade),
                EffectKind::Fade => Some(EffectKind::Rainbow),
                EffectKind::KeepAlive => None,
            };
            if let Some(rival) = rival {
                self.scheduler.stop(rival)?;
            }
        }
        self.scheduler.start(effect)?;
        Ok(Outcome::EffectStarted(kind))
    }

    fn stop_effect(&mut self, kind: EffectKind) -> Result<Outcome, DispatchError> {
        self.scheduler.stop(kind)?;
        self.transport.send_instruction(Instruction::off())?;
        Ok(Outcome::EffectStopped(kind))
    }

    pub fn scheduler(&self) -> &EffectScheduler {
        &self.scheduler
    }

    pub fn transport(&self) -> &SharedTransport {
        &self.transport
    }

    /// Stop every effect, switch the light off, then release the device.
    pub fn shutdown(mut self) -> Result<(), DispatchError> {
        info!("Shutting down {}", self.transport.description());
        let stopped = self.scheduler.stop_all();
        let off = self.transport.send_instruction(Instruction::off());
        let closed = self.transport.close();
        stopped?;
        off?;
        closed?;
        Ok(())
    }

    /// Stop every effect and release the device, leaving the light showing
    /// the last frame sent.
    pub fn release(mut self) -> Result<(), DispatchError> {
        debug!("Releasing {}", self.transport.description());
        let stopped = self.scheduler.stop_all();
        let closed = self.transport.close();
        stopped?;
        closed?;
        Ok(())
    }
}
