//! Periodic tick driver.
//!
//! Runs on its own thread and pushes a tick marker to the dispatcher at a
//! fixed interval until told to stop. The dispatcher is the one that
//! actually calls `Tick` on mounted visuals; this module only owns
//! the timing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender;

use crate::capabilities::{Capabilities, ColorDepth};

/// Default tick interval for a given capability set, used whenever neither
/// construction surface in [`crate::config::Config`] sets one explicitly.
pub fn default_interval(caps: &Capabilities) -> Duration {
    if !caps.is_tty {
        return Duration::from_millis(250);
    }
    match caps.color_depth {
        ColorDepth::Truecolor => Duration::from_millis(16),
        ColorDepth::Ansi256 | ColorDepth::Ansi16 => Duration::from_millis(33),
        ColorDepth::None => Duration::from_millis(100),
    }
}

/// A tick marker. Carries no payload beyond "a tick happened"; the
/// dispatcher stamps its own `Instant::now()` when it's received so tick
/// delivery time reflects when the visual actually observes it.
#[derive(Debug, Clone, Copy)]
pub struct Tick;

/// Owns the background timer thread.
pub struct EventLoop {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl EventLoop {
    /// Spawn the timer thread, sending a [`Tick`] on `tx` every `interval`
    /// until [`EventLoop::stop`] is called or `tx`'s receiver is dropped.
    pub fn spawn(interval: Duration, tx: Sender<Tick>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_for_thread = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("event-loop-timer".to_string())
            .spawn(move || {
                while !stop_for_thread.load(Ordering::SeqCst) {
                    thread::sleep(interval);
                    if stop_for_thread.load(Ordering::SeqCst) {
                        break;
                    }
                    if tx.send(Tick).is_err() {
                        break;
                    }
                }
            })
            .expect("failed to spawn event-loop-timer thread");
        EventLoop {
            stop,
            handle: Some(handle),
        }
    }

    /// Signal the timer thread to exit on its next wake and wait for it.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::time::Duration as StdDuration;

    #[test]
    fn default_interval_matches_capability_table() {
        let tty_true = Capabilities {
            is_tty: true,
            color_depth: ColorDepth::Truecolor,
            cols: 80,
            rows: 24,
        };
        let tty_256 = Capabilities {
            color_depth: ColorDepth::Ansi256,
            ..tty_true
        };
        let tty_weak = Capabilities {
            color_depth: ColorDepth::None,
            ..tty_true
        };
        let non_tty = Capabilities {
            is_tty: false,
            color_depth: ColorDepth::None,
            cols: 80,
            rows: 24,
        };
        assert_eq!(default_interval(&tty_true), StdDuration::from_millis(16));
        assert_eq!(default_interval(&tty_256), StdDuration::from_millis(33));
        assert_eq!(default_interval(&tty_weak), StdDuration::from_millis(100));
        assert_eq!(default_interval(&non_tty), StdDuration::from_millis(250));
    }

    #[test]
    fn spawn_delivers_ticks_until_stopped() {
        let (tx, rx) = unbounded();
        let mut timer = EventLoop::spawn(Duration::from_millis(5), tx);
        rx.recv_timeout(StdDuration::from_millis(200)).unwrap();
        timer.stop();
        // draining after stop should not hang forever
        while rx.try_recv().is_ok() {}
    }
}
