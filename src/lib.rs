//! Rendering and interaction runtime for terminal-effects components.
//!
//! Mounts `Visual` implementations onto a shared terminal, drives them
//! with a periodic tick and decoded keyboard input, diffs successive
//! frames so only changed bytes reach the terminal, and degrades to a
//! plain fallback when no TTY is attached. See [`main_loop::Loop`] for
//! the entry point.

pub mod adapters;
pub mod capabilities;
pub mod config;
pub mod cursor;
pub mod error;
pub mod event_loop;
pub mod key;
pub mod key_reader;
pub mod main_loop;
pub mod multiplex;
pub mod render_engine;
pub mod screen;
pub mod signals;
pub mod visual;
pub mod writer;

pub use adapters::{ConfirmPrompt, ProgressBar, PromptOutcome, SecretInput, SelectPrompt, Spinner};
pub use capabilities::{Capabilities, ColorDepth};
pub use config::{Config, ConfigBuilder};
pub use error::{LoopError, Result};
pub use key::{Key, KeyCode, Modifiers};
pub use key_reader::CancelToken;
pub use main_loop::Loop;
pub use visual::{Interactive, MountHandle, Ticking, Visual};
