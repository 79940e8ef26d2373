//! Cursor visibility and positioning.
//!
//! A thin, write-only facade over ANSI `?25h`/`?25l` and CUP sequences.
//! Positions are never queried from the terminal; the controller only
//! remembers what it last told the terminal to do, so `restore` can undo
//! one nested `move_to`.

use crate::writer::TerminalWriter;
use std::io;

/// Zero-indexed screen position, translated to 1-indexed CUP on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub row: u16,
    pub col: u16,
}

/// Scoped show/hide/move/restore control over the cursor.
///
/// Keeps a single-slot stack of prior positions: `move_to` after a prior
/// `move_to` remembers the earlier position so a subsequent `restore`
/// returns to it.
pub struct CursorController {
    previous: Option<Position>,
    current: Option<Position>,
}

impl Default for CursorController {
    fn default() -> Self {
        CursorController::new()
    }
}

impl CursorController {
    pub fn new() -> Self {
        CursorController {
            previous: None,
            current: None,
        }
    }

    /// Emit a hide-cursor escape.
    pub fn hide(&self, writer: &TerminalWriter) -> io::Result<()> {
        writer.write(b"\x1b[?25l")
    }

    /// Emit a show-cursor escape.
    pub fn show(&self, writer: &TerminalWriter) -> io::Result<()> {
        writer.write(b"\x1b[?25h")
    }

    /// Move the cursor to `pos`, remembering the prior position for a
    /// subsequent [`CursorController::restore`].
    pub fn move_to(&mut self, writer: &TerminalWriter, pos: Position) -> io::Result<()> {
        self.previous = self.current;
        self.current = Some(pos);
        write_cup(writer, pos)
    }

    /// Return the cursor to the position before the last `move_to`. A
    /// no-op if there is no remembered prior position.
    pub fn restore(&mut self, writer: &TerminalWriter) -> io::Result<()> {
        if let Some(pos) = self.previous.take() {
            self.current = Some(pos);
            write_cup(writer, pos)
        } else {
            Ok(())
        }
    }
}

fn write_cup(writer: &TerminalWriter, pos: Position) -> io::Result<()> {
    writer.write(format!("\x1b[{};{}H", pos.row + 1, pos.col + 1).as_bytes())
}
