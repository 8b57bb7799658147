//! Effect scheduler: owns the worker thread of every running effect.
//!
//! Lifecycle per effect slot: `Idle -> Running -> Stopping -> Idle`.
//! Starting a running effect stops and joins the old worker before the new
//! one is spawned, so two instances of one effect never send concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{Sender, bounded};
use parking_lot::RwLock;
use tracing::{error, info, warn};

use crate::config::EffectTiming;
use crate::effects::{Effect, EffectKind, StopSignal};
use crate::error::SchedulerError;
use crate::transport::SharedTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EffectState {
    #[default]
    Idle,
    Running,
    Stopping,
}

/// Shared view of every effect's state, readable from any thread.
#[derive(Debug, Clone, Default)]
pub struct EffectStatus {
    states: Arc<RwLock<HashMap<EffectKind, EffectState>>>,
}

impl EffectStatus {
    pub fn get(&self, kind: EffectKind) -> EffectState {
        self.states.read().get(&kind).copied().unwrap_or_default()
    }

    fn set(&self, kind: EffectKind, state: EffectState) {
        self.states.write().insert(kind, state);
    }
}

struct EffectHandle {
    effect: Effect,
    stop_tx: Sender<()>,
    thread: JoinHandle<()>,
}

pub struct EffectScheduler {
    transport: SharedTransport,
    timing: EffectTiming,
    active: HashMap<EffectKind, EffectHandle>,
    status: EffectStatus,
}

impl EffectScheduler {
    pub fn new(transport: SharedTransport, timing: EffectTiming) -> Self {
        Self {
            transport,
            timing,
            active: HashMap::new(),
            status: EffectStatus::default(),
        }
    }

    /// Start `effect`, replacing a running instance of the same kind.
    pub fn start(&mut self, effect: Effect) -> Result<(), SchedulerError> {
        let kind = effect.kind();
        if self.active.contains_key(&kind) {
            info!("Restarting {} effect", kind);
            self.stop(kind)?;
        }

        let (stop_tx, stop_rx) = bounded::<()>(0);
        let transport = self.transport.clone();
        let timing = self.timing;
        let thread = thread::Builder::new()
            .name(format!("busylight-{kind}"))
            .spawn(move || effect.run(&transport, &timing, &StopSignal::new(stop_rx)))
            .map_err(|e| SchedulerError::SpawnFailed {
                effect: kind,
                reason: e.to_string(),
            })?;

        self.active.insert(
            kind,
            EffectHandle {
                effect,
                stop_tx,
                thread,
            },
        );
        self.status.set(kind, EffectState::Running);
        info!("Started {} effect", kind);
        Ok(())
    }

    /// Stop `kind` and wait for its worker to exit.
    ///
    /// Returns `Ok(false)` when the effect was not running.
    pub fn stop(&mut self, kind: EffectKind) -> Result<bool, SchedulerError> {
        let Some(handle) = self.active.remove(&kind) else {
            return Ok(false);
        };

        self.status.set(kind, EffectState::Stopping);
        let EffectHandle {
            stop_tx, thread, ..
        } = handle;
        drop(stop_tx);

        let joined = thread.join();
        self.status.set(kind, EffectState::Idle);
        match joined {
            Ok(()) => {
                info!("Stopped {} effect", kind);
                Ok(true)
            }
            Err(_) => {
                error!("{} worker panicked", kind);
                Err(SchedulerError::WorkerPanicked(kind))
            }
        }
    }

    /// Stop every running effect. Returns the first worker failure, after
    /// attempting all of them.
    pub fn stop_all(&mut self) -> Result<(), SchedulerError> {
        let mut kinds: Vec<EffectKind> = self.active.keys().copied().collect();
        kinds.sort();

        let mut first_error = None;
        for kind in kinds {
            if let Err(e) = self.stop(kind) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub fn state(&self, kind: EffectKind) -> EffectState {
        self.status.get(kind)
    }

    /// A live handle on the effect states for observers on other threads.
    pub fn status(&self) -> EffectStatus {
        self.status.clone()
    }

    /// `true` while a worker for `kind` is registered and has not exited.
    pub fn is_running(&self, kind: EffectKind) -> bool {
        self.active
            .get(&kind)
            .is_some_and(|handle| !handle.thread.is_finished())
    }

    /// Parameters of the running instance of `kind`.
    pub fn active_effect(&self, kind: EffectKind) -> Option<Effect> {
        self.active.get(&kind).map(|handle| handle.effect)
    }

    pub fn timing(&self) -> &EffectTiming {
        &self.timing
    }
}

impl Drop for EffectScheduler {
    fn drop(&mut self) {
        if !self.active.is_empty() {
            warn!("Effect scheduler dropped with running effects - forcing stop");
            if let Err(e) = self.stop_all() {
                error!("Forced stop failed: {}", e);
            }
        }
    }
}
