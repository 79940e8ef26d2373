//! The `Visual`/`Interactive`/`Ticking` capability traits and the mount
//! handle clients hold after `Loop::mount`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::key::Key;
use crate::multiplex::Multiplexer;

/// Anything that can be mounted onto the loop.
///
/// The two optional capabilities, [`Interactive`] and [`Ticking`], are
/// exposed through the accessor methods below rather than downcasting —
/// a type that wants `OnKey` or `Tick` overrides the matching accessor to
/// return `Some(self)`. Types that don't care leave the defaults, which
/// return `None`.
pub trait Visual: Send {
    /// Render this visual's current state into `out`. Called on the
    /// dispatcher thread only; never blocks.
    fn render(&mut self, out: &mut Vec<u8>);

    /// Notified whenever the terminal resizes, with the visual's
    /// allocated width. Happens-before the next `render` call.
    fn on_resize(&mut self, cols: u16, rows: u16);

    /// Rows this visual wants from the Screen Manager. Most visuals are
    /// single-line; multi-row visuals (a list, a multi-line prompt)
    /// override this.
    fn min_height(&self) -> u16 {
        1
    }

    /// Name used in logs and panic reports. Defaults to a generic label;
    /// adapters override it with something identifiable.
    fn name(&self) -> &str {
        "visual"
    }

    /// Returns `Some(self)` if this visual also implements [`Interactive`].
    fn as_interactive_mut(&mut self) -> Option<&mut dyn Interactive> {
        None
    }

    /// Returns `Some(self)` if this visual also implements [`Ticking`].
    fn as_ticking_mut(&mut self) -> Option<&mut dyn Ticking> {
        None
    }
}

/// Optional capability: a visual that consumes keyboard input.
pub trait Interactive: Visual {
    /// Handle `key`, returning `true` if it was consumed. Keys are
    /// dispatched to mounted visuals in mount order until one consumes
    /// them; a visual that returns `false` lets the next visual see it.
    fn on_key(&mut self, key: Key) -> bool;
}

/// Optional capability: a visual driven by the periodic tick.
pub trait Ticking: Visual {
    /// Called once per tick with the current time. Ticks are delivered
    /// monotonically; a visual must not block here.
    fn tick(&mut self, now: Instant);
}

/// Opaque token returned by `Loop::mount`. Its only operation is
/// [`MountHandle::unmount`], which is idempotent and safe to call after
/// the loop has stopped.
pub struct MountHandle {
    name: String,
    multiplexer: Arc<Mutex<Multiplexer>>,
    unmounted: Arc<AtomicBool>,
}

impl MountHandle {
    pub(crate) fn new(name: String, multiplexer: Arc<Mutex<Multiplexer>>) -> Self {
        MountHandle {
            name,
            multiplexer,
            unmounted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The name this handle's visual was mounted under.
    pub(crate) fn mounted_name(&self) -> &str {
        &self.name
    }

    /// Unmount the visual. A no-op on every call after the first.
    pub fn unmount(&self) {
        if self.unmounted.swap(true, Ordering::SeqCst) {
            return;
        }
        self.multiplexer.lock().unwrap().unmount(&self.name);
    }
}
