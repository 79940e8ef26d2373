//! Masked single-line text input, for passwords and other secrets.

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::adapters::{noninteractive, PromptOutcome};
use crate::key::{Key, KeyCode};
use crate::visual::{Interactive, Visual};

/// Accepts printable characters into a buffer that is never rendered in
/// the clear — only a mask character per entered rune. Enter submits the
/// buffer; Escape/Ctrl+C cancel without exposing what was typed so far.
pub struct SecretInput {
    prompt: String,
    buffer: String,
    mask: char,
    done: bool,
    completion: Option<Sender<PromptOutcome<String>>>,
}

impl SecretInput {
    pub fn new(prompt: impl Into<String>) -> (Self, Receiver<PromptOutcome<String>>) {
        let (tx, rx) = bounded(1);
        let mut input = SecretInput {
            prompt: prompt.into(),
            buffer: String::new(),
            mask: '*',
            done: false,
            completion: Some(tx),
        };
        if noninteractive() {
            input.resolve(PromptOutcome::Value(String::new()));
        }
        (input, rx)
    }

    pub fn with_mask(mut self, mask: char) -> Self {
        self.mask = mask;
        self
    }

    fn resolve(&mut self, outcome: PromptOutcome<String>) {
        if let Some(tx) = self.completion.take() {
            let _ = tx.send(outcome);
        }
        self.done = true;
    }
}

impl Visual for SecretInput {
    fn render(&mut self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.prompt.as_bytes());
        for _ in self.buffer.chars() {
            out.extend_from_slice(self.mask.to_string().as_bytes());
        }
    }

    fn on_resize(&mut self, _cols: u16, _rows: u16) {}

    fn name(&self) -> &str {
        "secret-input"
    }

    fn as_interactive_mut(&mut self) -> Option<&mut dyn Interactive> {
        Some(self)
    }
}

impl Interactive for SecretInput {
    fn on_key(&mut self, key: Key) -> bool {
        if self.done {
            return false;
        }
        match key.code {
            KeyCode::Char | KeyCode::Space => {
                if let Some(rune) = key.rune {
                    self.buffer.push(rune);
                } else if key.code == KeyCode::Space {
                    self.buffer.push(' ');
                }
                true
            }
            KeyCode::Backspace => {
                self.buffer.pop();
                true
            }
            KeyCode::Enter => {
                self.resolve(PromptOutcome::Value(self.buffer.clone()));
                true
            }
            KeyCode::Escape | KeyCode::CtrlC => {
                self.resolve(PromptOutcome::Cancelled);
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
    fn typed_characters_render_as_masks_not_plaintext() {
        let (mut input, _rx) = SecretInput::new("password: ");
        input.on_key(char_key('h'));
        input.on_key(char_key('i'));
        let mut out = Vec::new();
        input.render(&mut out);
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("**"));
        assert!(!text.contains("hi"));
    }

    #[test]
    fn backspace_removes_the_last_character() {
        let (mut input, _rx) = SecretInput::new("");
        input.on_key(char_key('a'));
        input.on_key(char_key('b'));
        input.on_key(Key::plain(KeyCode::Backspace));
        let mut out = Vec::new();
        input.render(&mut out);
        assert_eq!(out.len(), 1); // one mask char left
    }

    #[test]
    fn enter_submits_the_buffer_contents() {
        let (mut input, rx) = SecretInput::new("");
        input.on_key(char_key('s'));
        input.on_key(char_key('3'));
        input.on_key(Key::plain(KeyCode::Enter));
        assert_eq!(rx.try_recv().unwrap(), PromptOutcome::Value("s3".to_string()));
    }

    #[test]
    fn escape_cancels_without_leaking_the_buffer() {
        let (mut input, rx) = SecretInput::new("");
        input.on_key(char_key('x'));
        input.on_key(Key::plain(KeyCode::Escape));
        assert_eq!(rx.try_recv().unwrap(), PromptOutcome::Cancelled);
    }
}
