//! Background throughput sampler.
//!
//! One thread per process reads the interface counters every `interval`,
//! turns consecutive readings into a [`RateSample`] and publishes it to a
//! [`SharedRate`]. Each window's baseline is the previous window's end reading.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, error, warn};

use crate::error::Result;
use crate::system::network::{CounterSource, InterfaceSample, RateSample};
use crate::system::rate_file::RateFile;

/// What the controller sees of the sampler
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RateState {
    /// No window has completed yet.
    #[default]
    Pending,
    Available(RateSample),
    /// The last window had no valid rate (counter wrap or reset).
    Unavailable,
    /// Counters can no longer be read; the sampler has stopped.
    Lost(String),
}

/// Most recent sampler result. The sampler is the only writer; every
/// publish replaces the whole value.
#[derive(Debug, Clone, Default)]
pub struct SharedRate {
    inner: Arc<Mutex<RateState>>,
}

impl SharedRate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, state: RateState) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    pub fn latest(&self) -> RateState {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Handle to the running sampler thread
pub struct Sampler {
    interface: String,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Sampler {
    pub fn spawn<C>(
        interface: String,
        interval: Duration,
        source: C,
        shared: SharedRate,
        rate_file: Option<RateFile>,
    ) -> Result<Self>
    where
        C: CounterSource + 'static,
    {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let mut worker = Worker {
            interface: interface.clone(),
            interval,
            source,
            shared,
            rate_file,
        };

        let handle = thread::Builder::new()
            .name("sampler".into())
            .spawn(move || worker.run(stop_rx))?;

        debug!(%interface, ?interval, "sampler started");
        Ok(Self {
            interface,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Stop the sampler and wait for it to exit. Returns `true` only for the
    /// call that actually stopped it.
    pub fn stop(&mut self) -> bool {
        let Some(stop_tx) = self.stop_tx.take() else {
            return false;
        };
        stop_tx.try_send(()).ok();
        drop(stop_tx);

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("sampler thread panicked");
            }
        }
        debug!(interface = %self.interface, "sampler stopped");
        true
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Worker<C> {
    interface: String,
    interval: Duration,
    source: C,
    shared: SharedRate,
    rate_file: Option<RateFile>,
}

impl<C: CounterSource> Worker<C> {
    fn run(&mut self, stop_rx: Receiver<()>) {
        let mut baseline = match self.source.read(&self.interface) {
            Ok(sample) => sample,
            Err(e) => return self.lose(e.to_string()),
        };

        loop {
            crossbeam_channel::select! {
                recv(stop_rx) -> _ => break,
                default(self.interval) => {}
            }

            let next = match self.source.read(&self.interface) {
                Ok(sample) => sample,
                Err(e) => return self.lose(e.to_string()),
            };
            let state = advance(&mut baseline, next);
            self.publish(state);
        }

        self.clear_rate_file();
    }

    fn publish(&self, state: RateState) {
        if let Some(file) = &self.rate_file {
            let written = match &state {
                RateState::Available(rate) => file.write(rate),
                _ => file.clear(),
            };
            if let Err(e) = written {
                warn!(path = ?file.path(), "failed to update rate file: {}", e);
            }
        }
        self.shared.publish(state);
    }

    fn lose(&self, reason: String) {
        error!(interface = %self.interface, %reason, "counter read failed; sampler stopping");
        self.clear_rate_file();
        self.shared.publish(RateState::Lost(reason));
    }

    fn clear_rate_file(&self) {
        if let Some(file) = &self.rate_file {
            file.clear().ok();
        }
    }
}

/// Compute the window ending at `next` and make `next` the new baseline.
pub fn advance(baseline: &mut InterfaceSample, next: InterfaceSample) -> RateState {
    let state = match RateSample::between(baseline, &next) {
        Some(rate) => RateState::Available(rate),
        None => {
            warn!(
                interface = %next.interface,
                prev_rx = baseline.rx_bytes,
                rx = next.rx_bytes,
                prev_tx = baseline.tx_bytes,
                tx = next.tx_bytes,
                "counters went backwards; window unavailable"
            );
            RateState::Unavailable
        }
    };
    *baseline = next;
    state
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::time::Instant;

    use super::*;
    use crate::error::Error;

    /// Replays scripted `(rx, tx, seconds-from-start)` readings, then fails.
    struct Scripted {
        start: Instant,
        readings: VecDeque<(u64, u64, u64)>,
    }

    impl Scripted {
        fn new(readings: &[(u64, u64, u64)]) -> Self {
            Self {
                start: Instant::now(),
                readings: readings.iter().copied().collect(),
            }
        }
    }

    impl CounterSource for Scripted {
        fn read(&mut self, interface: &str) -> Result<InterfaceSample> {
            let (rx, tx, secs) = self.readings.pop_front().ok_or_else(|| Error::CounterRead {
                interface: interface.to_string(),
            })?;
            Ok(InterfaceSample {
                interface: interface.to_string(),
                rx_bytes: rx,
                tx_bytes: tx,
                timestamp: self.start + Duration::from_secs(secs),
            })
        }
    }

    /// Never runs out of readings.
    struct Steady;

    impl CounterSource for Steady {
        fn read(&mut self, interface: &str) -> Result<InterfaceSample> {
            Ok(InterfaceSample {
                interface: interface.to_string(),
                rx_bytes: 0,
                tx_bytes: 0,
                timestamp: Instant::now(),
            })
        }
    }

    fn wait_for_lost(shared: &SharedRate) -> RateState {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let state = shared.latest();
            if matches!(state, RateState::Lost(_)) || Instant::now() > deadline {
                return state;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn baseline_advances_each_window() {
        let t0 = Instant::now();
        let mut baseline = InterfaceSample {
            interface: "eth0".into(),
            rx_bytes: 1_000_000,
            tx_bytes: 0,
            timestamp: t0,
        };
        let next = InterfaceSample {
            rx_bytes: 2_048_000,
            timestamp: t0 + Duration::from_secs(5),
            ..baseline.clone()
        };

        let state = advance(&mut baseline, next.clone());
        assert_eq!(
            state,
            RateState::Available(RateSample {
                download_mbps: 1.6,
                upload_mbps: 0.0,
                window_seconds: 5.0,
            })
        );
        assert_eq!(baseline, next);
    }

    #[test]
    fn wrap_is_unavailable_then_recovers() {
        let t0 = Instant::now();
        let mut baseline = InterfaceSample {
            interface: "eth0".into(),
            rx_bytes: 5_000,
            tx_bytes: 5_000,
            timestamp: t0,
        };
        let reset = InterfaceSample {
            rx_bytes: 10,
            timestamp: t0 + Duration::from_secs(1),
            ..baseline.clone()
        };
        assert_eq!(advance(&mut baseline, reset), RateState::Unavailable);

        let after = InterfaceSample {
            rx_bytes: 10 + 131_072,
            tx_bytes: 5_000,
            timestamp: t0 + Duration::from_secs(2),
            ..baseline.clone()
        };
        match advance(&mut baseline, after) {
            RateState::Available(rate) => assert_eq!(rate.download_mbps, 1.0),
            other => panic!("expected a rate, got {:?}", other),
        }
    }

    #[test]
    fn publishes_then_reports_loss() {
        let shared = SharedRate::new();
        assert_eq!(shared.latest(), RateState::Pending);

        let dir = mktemp::Temp::new_dir().unwrap();
        let rate_path = dir.to_path_buf().join("rate");
        let source = Scripted::new(&[(1_000_000, 0, 0), (2_048_000, 0, 5)]);
        let mut sampler = Sampler::spawn(
            "eth0".into(),
            Duration::from_millis(5),
            source,
            shared.clone(),
            Some(RateFile::new(&rate_path)),
        )
        .unwrap();

        // Third read fails: the interface is gone.
        match wait_for_lost(&shared) {
            RateState::Lost(reason) => assert!(reason.contains("eth0")),
            other => panic!("expected loss, got {:?}", other),
        }
        assert!(!rate_path.exists());
        assert!(sampler.stop());
    }

    #[test]
    fn stop_happens_once() {
        let shared = SharedRate::new();
        let mut sampler = Sampler::spawn(
            "eth0".into(),
            Duration::from_millis(5),
            Steady,
            shared.clone(),
            None,
        )
        .unwrap();
        assert_eq!(sampler.interface(), "eth0");

        assert!(sampler.stop());
        assert!(!sampler.stop());
        assert!(!sampler.stop());
    }

    #[test]
    fn lost_before_first_window() {
        let shared = SharedRate::new();
        let _sampler = Sampler::spawn(
            "wg0".into(),
            Duration::from_millis(5),
            Scripted::new(&[]),
            shared.clone(),
            None,
        )
        .unwrap();

        assert!(matches!(wait_for_lost(&shared), RateState::Lost(_)));
    }
}
