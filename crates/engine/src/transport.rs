//! Device transport: the single path by which frames reach the light.
//!
//! Effects and the dispatcher share one [`SharedTransport`]. Every physical
//! write happens while holding its mutex, so frames from different threads
//! never interleave on the wire.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use busylight_hid_kuando_protocol::{CommandBuffer, FRAME_LEN, Instruction};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{TransportError, TransportResult};

/// Raw output-report sink.
pub trait HidTransport: Send {
    /// Write one report, returning the number of bytes the device accepted.
    fn write_report(&mut self, data: &[u8]) -> TransportResult<usize>;

    /// Human-readable device description for logs.
    fn description(&self) -> String {
        "busylight".to_string()
    }

    /// Release the device. Further writes may fail.
    fn close(&mut self) -> TransportResult<()> {
        Ok(())
    }
}

impl HidTransport for Box<dyn HidTransport> {
    fn write_report(&mut self, data: &[u8]) -> TransportResult<usize> {
        (**self).write_report(data)
    }

    fn description(&self) -> String {
        (**self).description()
    }

    fn close(&mut self) -> TransportResult<()> {
        (**self).close()
    }
}

/// Frame counters of a [`SharedTransport`].
#[derive(Debug, Default)]
pub struct TransportStats {
    frames_sent: AtomicU64,
    frames_failed: AtomicU64,
}

impl TransportStats {
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }

    pub fn frames_failed(&self) -> u64 {
        self.frames_failed.load(Ordering::Relaxed)
    }

    fn record(&self, ok: bool) {
        let counter = if ok {
            &self.frames_sent
        } else {
            &self.frames_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Cloneable, mutex-guarded handle to the device.
#[derive(Clone)]
pub struct SharedTransport {
    inner: Arc<Mutex<Box<dyn HidTransport>>>,
    stats: Arc<TransportStats>,
}

impl fmt::Debug for SharedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedTransport")
            .field("frames_sent", &self.stats.frames_sent())
            .field("frames_failed", &self.stats.frames_failed())
            .finish_non_exhaustive()
    }
}

impl SharedTransport {
    pub fn new(transport: impl HidTransport + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(transport))),
            stats: Arc::new(TransportStats::default()),
        }
    }

    /// Serialize `buffer` and write it once.
    ///
    /// Failures are logged and returned. Nothing is retried or queued.
    pub fn send(&self, buffer: &CommandBuffer) -> TransportResult<()> {
        let frame = buffer.to_bytes();
        let result = {
            let mut device = self.inner.lock();
            device.write_report(&frame).and_then(|written| {
                if written < FRAME_LEN {
                    Err(TransportError::ShortWrite {
                        expected: FRAME_LEN,
                        actual: written,
                    })
                } else {
                    Ok(())
                }
            })
        };

        self.stats.record(result.is_ok());
        match &result {
            Ok(()) => debug!("Sent {}", buffer.line(0)),
            Err(e) => warn!("Failed to send {}: {}", buffer.line(0), e),
        }
        result
    }

    /// Send `instruction` as `line0` of a fresh buffer.
    pub fn send_instruction(&self, instruction: Instruction) -> TransportResult<()> {
        self.send(&CommandBuffer::with_line0(instruction))
    }

    pub fn stats(&self) -> &TransportStats {
        &self.stats
    }

    pub fn description(&self) -> String {
        self.inner.lock().description()
    }

    pub fn close(&self) -> TransportResult<()> {
        self.inner.lock().close()
    }
}

/// In-memory transports for tests and dry runs.
pub mod mock {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread::{self, ThreadId};
    use std::time::{Duration, Instant};

    use busylight_hid_kuando_protocol::{INSTRUCTION_LEN, Instruction, Rgb};
    use parking_lot::Mutex;

    use super::HidTransport;
    use crate::error::{TransportError, TransportResult};

    /// One frame observed by a [`RecordingTransport`].
    #[derive(Debug, Clone)]
    pub struct RecordedWrite {
        pub frame: Vec<u8>,
        /// Name of the writing thread, if it had one.
        pub thread_name: Option<String>,
        pub thread_id: ThreadId,
        pub at: Instant,
    }

    impl RecordedWrite {
        /// `line0` of the recorded frame.
        pub fn instruction(&self) -> Option<Instruction> {
            self.frame
                .get(..INSTRUCTION_LEN)
                .and_then(|head| <[u8; INSTRUCTION_LEN]>::try_from(head).ok())
                .map(Instruction::from_bytes)
        }
    }

    #[derive(Debug, Default)]
    struct RecorderState {
        writes: Mutex<Vec<RecordedWrite>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        failing: AtomicBool,
        fail_next: AtomicUsize,
        closed: AtomicBool,
        write_delay: Mutex<Duration>,
    }

    /// Transport that records every frame. Clones share one log.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingTransport {
        state: Arc<RecorderState>,
    }

    impl RecordingTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make subsequent writes fail with [`TransportError::Disconnected`].
        pub fn set_failing(&self, failing: bool) {
            self.state.failing.store(failing, Ordering::SeqCst);
        }

        /// Fail only the next `count` writes, then record again.
        pub fn fail_next(&self, count: usize) {
            self.state.fail_next.store(count, Ordering::SeqCst);
        }

        /// Hold each write for `delay` before recording it.
        pub fn set_write_delay(&self, delay: Duration) {
            *self.state.write_delay.lock() = delay;
        }

        pub fn writes(&self) -> Vec<RecordedWrite> {
            self.state.writes.lock().clone()
        }

        pub fn instructions(&self) -> Vec<Instruction> {
            self.state
                .writes
                .lock()
                .iter()
                .filter_map(RecordedWrite::instruction)
                .collect()
        }

        pub fn colors(&self) -> Vec<Rgb> {
            self.instructions().into_iter().map(Instruction::color).collect()
        }

        pub fn len(&self) -> usize {
            self.state.writes.lock().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        pub fn clear(&self) {
            self.state.writes.lock().clear();
        }

        /// Highest number of writes observed in progress at once.
        pub fn max_in_flight(&self) -> usize {
            self.state.max_in_flight.load(Ordering::SeqCst)
        }

        pub fn is_closed(&self) -> bool {
            self.state.closed.load(Ordering::SeqCst)
        }
    }

    impl HidTransport for RecordingTransport {
        fn write_report(&mut self, data: &[u8]) -> TransportResult<usize> {
            if self.state.failing.load(Ordering::SeqCst) {
                return Err(TransportError::Disconnected);
            }
            let pending = self
                .state
                .fail_next
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
            if pending.is_ok() {
                return Err(TransportError::Disconnected);
            }

            let now = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.state.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let delay = *self.state.write_delay.lock();
            if !delay.is_zero() {
                thread::sleep(delay);
            }

            let current = thread::current();
            self.state.writes.lock().push(RecordedWrite {
                frame: data.to_vec(),
                thread_name: current.name().map(str::to_owned),
                thread_id: current.id(),
                at: Instant::now(),
            });

            self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(data.len())
        }

        fn description(&self) -> String {
            "recording transport".to_string()
        }

        fn close(&mut self) -> TransportResult<()> {
            self.state.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Transport that accepts only the first `limit` bytes of every report.
    #[derive(Debug, Clone, Copy)]
    pub struct TruncatingTransport {
        pub limit: usize,
    }

    impl HidTransport for TruncatingTransport {
        fn write_report(&mut self, data: &[u8]) -> TransportResult<usize> {
            Ok(data.len().min(self.limit))
        }
    }
}
