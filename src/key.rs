//! Decoded keyboard events.

use bitflags::bitflags;

bitflags! {
    /// Modifier bit-set carried alongside a [`KeyCode`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const CTRL  = 0b001;
        const ALT   = 0b010;
        const SHIFT = 0b100;
    }
}

/// The finite set of keys the reader can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A printable letter or digit; the rune carries the actual character.
    Char,
    ArrowUp,
    ArrowDown,
    ArrowRight,
    ArrowLeft,
    Home,
    End,
    Enter,
    Escape,
    Backspace,
    Tab,
    Space,
    Delete,
    Function(u8),
    /// `Ctrl+<letter>` for a control byte with a known letter mapping.
    CtrlChar(char),
    CtrlC,
    CtrlD,
    CtrlZ,
    /// Anything the reader could not classify; the raw bytes are discarded.
    Unknown,
}

/// A single decoded key event, immutable after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    /// The printable codepoint, when one exists for this key.
    pub rune: Option<char>,
}

impl Key {
    pub(crate) fn new(code: KeyCode, modifiers: Modifiers, rune: Option<char>) -> Self {
        Key {
            code,
            modifiers,
            rune,
        }
    }

    /// Convenience constructor for a key with no modifiers and no rune.
    pub fn plain(code: KeyCode) -> Self {
        Key::new(code, Modifiers::empty(), None)
    }

    /// `true` for the two keys the main loop treats as a shutdown request
    /// when no mounted visual consumes them.
    pub fn is_top_level_interrupt(&self) -> bool {
        matches!(self.code, KeyCode::CtrlC | KeyCode::Escape)
    }
}
