//! Built-in `Visual` implementations: progress bar, spinner, and the
//! prompt family (confirm, select, secret input).
//!
//! Style escapes in these adapters are intentionally minimal — bold, dim,
//! and the basic 16-color set — rather than a full palette-degradation
//! system; that's a client concern, out of scope here.

mod confirm;
mod progress_bar;
mod secret_input;
mod select;
mod spinner;

pub use confirm::ConfirmPrompt;
pub use progress_bar::ProgressBar;
pub use secret_input::SecretInput;
pub use select::SelectPrompt;
pub use spinner::Spinner;

/// Outcome delivered on a prompt's one-shot completion channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome<T> {
    /// The user confirmed a value.
    Value(T),
    /// The user cancelled (Escape or Ctrl+C while focused).
    Cancelled,
}

/// Whether prompts should skip reading input and resolve to their default
/// value immediately, per `FORM_NONINTERACTIVE=1`.
pub(crate) fn noninteractive() -> bool {
    std::env::var("FORM_NONINTERACTIVE")
        .map(|v| v == "1")
        .unwrap_or(false)
}
