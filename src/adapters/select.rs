//! Single-choice list selection prompt.

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::adapters::{noninteractive, PromptOutcome};
use crate::key::{Key, KeyCode};
use crate::visual::{Interactive, Visual};

/// Moves a cursor over a fixed list of options with the arrow keys;
/// Enter confirms the highlighted option, Escape/Ctrl+C cancel.
pub struct SelectPrompt {
    options: Vec<String>,
    cursor: usize,
    done: bool,
    completion: Option<Sender<PromptOutcome<usize>>>,
}

impl SelectPrompt {
    /// Build a prompt over `options`. `default` is the index returned
    /// immediately under `FORM_NONINTERACTIVE=1`. Panics if `options` is
    /// empty or `default` is out of range — both are caller bugs, not
    /// runtime conditions.
    pub fn new(options: Vec<String>, default: usize) -> (Self, Receiver<PromptOutcome<usize>>) {
        assert!(!options.is_empty(), "SelectPrompt requires at least one option");
        assert!(default < options.len(), "default index out of range");
        let (tx, rx) = bounded(1);
        let mut prompt = SelectPrompt {
            options,
            cursor: default,
            done: false,
            completion: Some(tx),
        };
        if noninteractive() {
            prompt.resolve(PromptOutcome::Value(default));
        }
        (prompt, rx)
    }

    fn resolve(&mut self, outcome: PromptOutcome<usize>) {
        if let Some(tx) = self.completion.take() {
            let _ = tx.send(outcome);
        }
        self.done = true;
    }
}

impl Visual for SelectPrompt {
    fn render(&mut self, out: &mut Vec<u8>) {
        for (i, option) in self.options.iter().enumerate() {
            let marker = if i == self.cursor { "> " } else { "  " };
            out.extend_from_slice(marker.as_bytes());
            out.extend_from_slice(option.as_bytes());
            if i + 1 < self.options.len() {
                out.push(b'\n');
            }
        }
    }

    fn on_resize(&mut self, _cols: u16, _rows: u16) {}

    fn min_height(&self) -> u16 {
        self.options.len() as u16
    }

    fn name(&self) -> &str {
        "select-prompt"
    }

    fn as_interactive_mut(&mut self) -> Option<&mut dyn Interactive> {
        Some(self)
    }
}

impl Interactive for SelectPrompt {
    fn on_key(&mut self, key: Key) -> bool {
        if self.done {
            return false;
        }
        match key.code {
            KeyCode::ArrowUp => {
                self.cursor = self.cursor.checked_sub(1).unwrap_or(self.options.len() - 1);
                true
            }
            KeyCode::ArrowDown => {
                self.cursor = (self.cursor + 1) % self.options.len();
                true
            }
            KeyCode::Enter => {
                self.resolve(PromptOutcome::Value(self.cursor));
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

    fn options() -> Vec<String> {
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    }

    #[test]
    fn arrow_down_wraps_past_the_last_option() {
        let (mut prompt, _rx) = SelectPrompt::new(options(), 2);
        prompt.on_key(Key::plain(KeyCode::ArrowDown));
        assert_eq!(prompt.cursor, 0);
    }

    #[test]
    fn arrow_up_wraps_past_the_first_option() {
        let (mut prompt, _rx) = SelectPrompt::new(options(), 0);
        prompt.on_key(Key::plain(KeyCode::ArrowUp));
        assert_eq!(prompt.cursor, 2);
    }

    #[test]
    fn enter_resolves_to_the_highlighted_index() {
        let (mut prompt, rx) = SelectPrompt::new(options(), 0);
        prompt.on_key(Key::plain(KeyCode::ArrowDown));
        prompt.on_key(Key::plain(KeyCode::Enter));
        assert_eq!(rx.try_recv().unwrap(), PromptOutcome::Value(1));
    }

    #[test]
    fn escape_cancels() {
        let (mut prompt, rx) = SelectPrompt::new(options(), 0);
        prompt.on_key(Key::plain(KeyCode::Escape));
        assert_eq!(rx.try_recv().unwrap(), PromptOutcome::Cancelled);
    }

    #[test]
    fn render_marks_the_cursor_row() {
        let (mut prompt, _rx) = SelectPrompt::new(options(), 1);
        let mut out = Vec::new();
        prompt.render(&mut out);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().nth(1).unwrap(), "> b");
    }
}
