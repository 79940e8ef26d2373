//! Cross-platform subscription to resize and termination signals.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;

/// Event the signal handler forwards to the dispatcher's select loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalEvent {
    Resize,
    Terminate,
}

/// Installs the platform's resize and termination notifications and
/// forwards them to `tx`. Termination fires the stop path exactly once;
/// [`SignalHandler::listen`] may only be called a single time per process
/// because both `ctrlc` and `signal_hook` register process-global state.
pub struct SignalHandler {
    resize_flag: Arc<AtomicBool>,
    terminated: Arc<AtomicBool>,
}

impl SignalHandler {
    pub fn new() -> Self {
        SignalHandler {
            resize_flag: Arc::new(AtomicBool::new(false)),
            terminated: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Register SIGWINCH (Unix) and Ctrl+C/terminate handling, forwarding
    /// both as [`SignalEvent`]s on `tx`. On platforms without SIGWINCH the
    /// caller is expected to poll [`SignalHandler::take_resize`] itself at
    /// the tick rate instead; this crate targets Unix terminals, so
    /// that fallback is not wired here.
    pub fn listen(&self, tx: Sender<SignalEvent>) -> anyhow::Result<()> {
        #[cfg(unix)]
        {
            use signal_hook::consts::signal::SIGWINCH;
            signal_hook::flag::register(SIGWINCH, Arc::clone(&self.resize_flag))?;
        }

        let terminated = Arc::clone(&self.terminated);
        ctrlc::set_handler(move || {
            if terminated.swap(true, Ordering::SeqCst) {
                return;
            }
            let _ = tx.send(SignalEvent::Terminate);
        })?;

        Ok(())
    }

    /// Consume a pending resize notification, if SIGWINCH fired since the
    /// last call. The Main Loop polls this once per tick rather than
    /// receiving it over a channel, since signal-safe code can only touch
    /// an `AtomicBool`.
    pub fn take_resize(&self) -> bool {
        self.resize_flag.swap(false, Ordering::SeqCst)
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        SignalHandler::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_resize_consumes_the_flag_once() {
        let handler = SignalHandler::new();
        handler.resize_flag.store(true, Ordering::SeqCst);
        assert!(handler.take_resize());
        assert!(!handler.take_resize());
    }
}
