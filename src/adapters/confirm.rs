//! Yes/no confirmation prompt.

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::adapters::{noninteractive, PromptOutcome};
use crate::key::{Key, KeyCode};
use crate::visual::{Interactive, Visual};

/// A confirmation prompt. `y`/`Y`, `n`/`N`, and Enter (accepting the
/// default) all resolve it; Escape or Ctrl+C cancel it. The result is
/// delivered once on the paired [`Receiver`].
pub struct ConfirmPrompt {
    message: String,
    default: bool,
    done: bool,
    completion: Option<Sender<PromptOutcome<bool>>>,
}

impl ConfirmPrompt {
    /// Build a prompt and its one-shot completion channel. If
    /// `FORM_NONINTERACTIVE=1` is set, the prompt resolves to `default`
    /// immediately without waiting for a key.
    pub fn new(message: impl Into<String>, default: bool) -> (Self, Receiver<PromptOutcome<bool>>) {
        let (tx, rx) = bounded(1);
        let mut prompt = ConfirmPrompt {
            message: message.into(),
            default,
            done: false,
            completion: Some(tx),
        };
        if noninteractive() {
            prompt.resolve(PromptOutcome::Value(default));
        }
        (prompt, rx)
    }

    fn resolve(&mut self, outcome: PromptOutcome<bool>) {
        if let Some(tx) = self.completion.take() {
            let _ = tx.send(outcome);
        }
        self.done = true;
    }
}

impl Visual for ConfirmPrompt {
    fn render(&mut self, out: &mut Vec<u8>) {
        let hint = if self.default { "[Y/n]" } else { "[y/N]" };
        out.extend_from_slice(format!("{} {hint} ", self.message).as_bytes());
    }

    fn on_resize(&mut self, _cols: u16, _rows: u16) {}

    fn name(&self) -> &str {
        "confirm-prompt"
    }

    fn as_interactive_mut(&mut self) -> Option<&mut dyn Interactive> {
        Some(self)
    }
}

impl Interactive for ConfirmPrompt {
    fn on_key(&mut self, key: Key) -> bool {
        if self.done {
            return false;
        }
        match (key.code, key.rune) {
            (KeyCode::Enter, _) => {
                self.resolve(PromptOutcome::Value(self.default));
                true
            }
            (KeyCode::Escape, _) | (KeyCode::CtrlC, _) => {
                self.resolve(PromptOutcome::Cancelled);
                true
            }
            (KeyCode::Char, Some('y')) | (KeyCode::Char, Some('Y')) => {
                self.resolve(PromptOutcome::Value(true));
                true
            }
            (KeyCode::Char, Some('n')) | (KeyCode::Char, Some('N')) => {
                self.resolve(PromptOutcome::Value(false));
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Modifiers;

    fn char_key(c: char) -> Key {
        Key::new(KeyCode::Char, Modifiers::empty(), Some(c))
    }

    #[test]
    fn enter_resolves_to_the_default() {
        let (mut prompt, rx) = ConfirmPrompt::new("proceed?", true);
        assert!(prompt.on_key(Key::plain(KeyCode::Enter)));
        assert_eq!(rx.try_recv().unwrap(), PromptOutcome::Value(true));
    }

    #[test]
    fn y_and_n_resolve_explicitly() {
        let (mut prompt, rx) = ConfirmPrompt::new("proceed?", false);
        assert!(prompt.on_key(char_key('y')));
        assert_eq!(rx.try_recv().unwrap(), PromptOutcome::Value(true));

        let (mut prompt2, rx2) = ConfirmPrompt::new("proceed?", true);
        assert!(prompt2.on_key(char_key('N')));
        assert_eq!(rx2.try_recv().unwrap(), PromptOutcome::Value(false));
    }

    #[test]
    fn escape_cancels() {
        let (mut prompt, rx) = ConfirmPrompt::new("proceed?", true);
        assert!(prompt.on_key(Key::plain(KeyCode::Escape)));
        assert_eq!(rx.try_recv().unwrap(), PromptOutcome::Cancelled);
    }

    #[test]
    fn once_resolved_further_keys_are_not_consumed() {
        let (mut prompt, _rx) = ConfirmPrompt::new("proceed?", true);
        prompt.on_key(Key::plain(KeyCode::Enter));
        assert!(!prompt.on_key(char_key('y')));
    }

    #[test]
    fn render_shows_default_hint() {
        let mut prompt = ConfirmPrompt::new("ok?", true).0;
        let mut out = Vec::new();
        prompt.render(&mut out);
        assert!(String::from_utf8(out).unwrap().contains("[Y/n]"));
    }
}
