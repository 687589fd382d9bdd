//! One ordered stream of controller events.
//!
//! Redraw ticks come from a timer channel, keystrokes from an input thread
//! that polls the terminal with a short timeout, and shutdown from the signal
//! handler. `next` blocks until any of them fires, so keystroke latency is
//! bounded by the poll timeout and redraw cadence by the tick interval,
//! independently of each other.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use crossterm::event::{self as term, KeyEvent, KeyEventKind};
use tracing::{debug, error};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Tick,
    Key(KeyEvent),
    Resize,
    Shutdown,
}

pub struct Events {
    ticker: Receiver<Instant>,
    input: Receiver<Event>,
    shutdown: Receiver<()>,
    stop: Arc<AtomicBool>,
    input_thread: Option<JoinHandle<()>>,
}

impl Events {
    /// Start the terminal input thread and the tick timer.
    pub fn new(tick: Duration, input_poll: Duration, shutdown: Receiver<()>) -> Result<Self> {
        let (input_tx, input_rx) = crossbeam_channel::unbounded();
        let mut events = Self::from_channels(crossbeam_channel::tick(tick), input_rx, shutdown);

        let thread_stop = events.stop.clone();
        events.input_thread = Some(
            thread::Builder::new()
                .name("input".into())
                .spawn(move || read_terminal(input_tx, input_poll, thread_stop))?,
        );
        Ok(events)
    }

    /// Build from existing channels, without touching the terminal.
    pub fn from_channels(ticker: Receiver<Instant>, input: Receiver<Event>, shutdown: Receiver<()>) -> Self {
        Self {
            ticker,
            input,
            shutdown,
            stop: Arc::new(AtomicBool::new(false)),
            input_thread: None,
        }
    }

    /// Block until the next event.
    pub fn next(&self) -> Event {
        crossbeam_channel::select! {
            recv(self.shutdown) -> _ => Event::Shutdown,
            recv(self.input) -> ev => ev.unwrap_or(Event::Shutdown),
            recv(self.ticker) -> _ => Event::Tick,
        }
    }
}

impl Drop for Events {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.input_thread.take() {
            handle.join().ok();
        }
    }
}

fn read_terminal(tx: Sender<Event>, poll: Duration, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::Relaxed) {
        let event = match term::poll(poll) {
            Ok(false) => continue,
            Ok(true) => term::read(),
            Err(e) => Err(e),
        };

        let event = match event {
            // Some terminals report Press and Release; only act on Press
            Ok(term::Event::Key(key)) if key.kind == KeyEventKind::Press => Event::Key(key),
            Ok(term::Event::Resize(_, _)) => Event::Resize,
            Ok(_) => continue,
            Err(e) => {
                error!("terminal input failed: {}", e);
                Event::Shutdown
            }
        };

        let fatal = event == Event::Shutdown;
        if tx.send(event).is_err() || fatal {
            break;
        }
    }
    debug!("input thread exiting");
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;

    #[test]
    fn merges_sources() {
        let (tick_tx, tick_rx) = crossbeam_channel::unbounded();
        let (input_tx, input_rx) = crossbeam_channel::unbounded();
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        let events = Events::from_channels(tick_rx, input_rx, shutdown_rx);

        tick_tx.send(Instant::now()).unwrap();
        assert_eq!(events.next(), Event::Tick);

        let q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        input_tx.send(Event::Key(q)).unwrap();
        assert_eq!(events.next(), Event::Key(q));

        shutdown_tx.send(()).unwrap();
        assert_eq!(events.next(), Event::Shutdown);
    }

    #[test]
    fn closed_input_means_shutdown() {
        let (_tick_tx, tick_rx) = crossbeam_channel::unbounded::<Instant>();
        let (input_tx, input_rx) = crossbeam_channel::unbounded();
        let (_shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        let events = Events::from_channels(tick_rx, input_rx, shutdown_rx);

        drop(input_tx);
        assert_eq!(events.next(), Event::Shutdown);
    }

    #[test]
    fn ticks_keep_cadence() {
        let (_input_tx, input_rx) = crossbeam_channel::unbounded();
        let (_shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        let events = Events::from_channels(
            crossbeam_channel::tick(Duration::from_millis(10)),
            input_rx,
            shutdown_rx,
        );

        let start = Instant::now();
        for _ in 0..3 {
            assert_eq!(events.next(), Event::Tick);
        }
        assert!(start.elapsed() >= Duration::from_millis(25));
    }
}
