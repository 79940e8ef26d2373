//! Public error taxonomy for the runtime core.
//!
//! Every row of the error-kind table maps to one variant here. Call sites
//! decide which variants are ever allowed to surface from a public method;
//! `RegionConflict` for instance is constructed internally by the screen
//! manager and retried before it can reach a caller.

use std::io;

/// Errors produced by [`crate::main_loop::Loop`] and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    /// `Mount` was called with a visual that cannot be registered, or after
    /// the loop has stopped accepting new mounts.
    #[error("mount failed: {reason}")]
    MountFailed {
        /// Human-readable reason (nil visual, loop stopped, duplicate name).
        reason: &'static str,
    },

    /// The multiplexer is already holding `MaxVisuals` live slots.
    #[error("cannot mount {name}: at most {max} visuals may be mounted at once")]
    TooManyVisuals {
        /// Name the caller attempted to mount.
        name: String,
        /// The configured capacity.
        max: usize,
    },

    /// `Run` was called while the loop was already `Running` or `Stopping`.
    #[error("loop is already running")]
    AlreadyRunning,

    /// `Stop` was called while the loop was `Idle` or already `Stopped`.
    #[error("loop is not running")]
    NotRunning,

    /// `Run` returned because its cancellation token fired, or `Stop` was
    /// called. Not a failure; callers typically treat this as a clean exit.
    #[error("run was cancelled")]
    Cancelled,

    /// A region allocation attempt overlapped an existing region. This
    /// variant is retried internally by the screen manager and is not
    /// expected to reach a public caller; it exists so the retry loop has
    /// a typed signal to match on.
    #[error("region [{top}, {bottom}) conflicts with an existing allocation")]
    RegionConflict {
        /// Attempted top row.
        top: u16,
        /// Attempted bottom row (exclusive).
        bottom: u16,
    },

    /// The key reader encountered a byte sequence it could not decode.
    /// Logged at `warn` and translated into `Key::Unknown`; surfaced here
    /// only for tests that want to assert on the decode outcome directly.
    #[error("could not decode key sequence: {0:?}")]
    DecodeFailure(Vec<u8>),

    /// A write to the terminal sink failed after the single retry.
    #[error("terminal write failed: {source}")]
    WriteFailure {
        #[source]
        source: io::Error,
    },

    /// A visual's `Render`, `OnKey`, `OnResize`, or `Tick` method panicked.
    /// The offending visual has already been unmounted by the dispatcher;
    /// the loop itself keeps running.
    #[error("visual {name:?} panicked and was unmounted")]
    VisualPanicked {
        /// Name of the unmounted visual, if it had one assigned.
        name: String,
    },
}

impl From<io::Error> for LoopError {
    fn from(source: io::Error) -> Self {
        LoopError::WriteFailure { source }
    }
}

/// Convenience alias used throughout the crate's public API.
pub type Result<T> = std::result::Result<T, LoopError>;
