//! Output-stream capability detection.
//!
//! [`Capabilities`] is an immutable snapshot taken once at loop construction
//! and refreshed only for `cols`/`rows` on resize. It never writes to the
//! probed sink.

use std::env;

/// Color depth a destination stream supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorDepth {
    /// No color; SGR sequences should be stripped before emission.
    None,
    /// 16-color ANSI palette.
    Ansi16,
    /// 256-color palette.
    Ansi256,
    /// 24-bit truecolor.
    Truecolor,
}

impl ColorDepth {
    /// Whether this depth supports any color at all.
    pub fn supports_color(self) -> bool {
        !matches!(self, ColorDepth::None)
    }
}

/// Immutable capability record for one output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Whether the stream is attached to a terminal.
    pub is_tty: bool,
    /// Resolved color depth (`None` when `is_tty` is false).
    pub color_depth: ColorDepth,
    /// Terminal width in columns.
    pub cols: u16,
    /// Terminal height in rows.
    pub rows: u16,
}

impl Capabilities {
    /// Whether the stream supports any color output.
    pub fn supports_color(&self) -> bool {
        self.color_depth.supports_color()
    }

    /// Detect capabilities for standard output.
    ///
    /// Performs an isatty probe, reads `TERM`/`COLORTERM`/`NO_COLOR`, and
    /// queries terminal size, falling back to `(80, 24)` when the query
    /// fails.
    pub fn detect() -> Self {
        let is_tty = crossterm::tty::IsTty::is_tty(&std::io::stdout());
        Self::detect_with(is_tty, &EnvHints::from_process_env())
    }

    /// Detect capabilities given an explicit tty flag and environment hints.
    /// Split out from [`Capabilities::detect`] so tests can exercise the
    /// resolution logic without a real terminal.
    pub fn detect_with(is_tty: bool, hints: &EnvHints) -> Self {
        let color_depth = resolve_color_depth(is_tty, hints);
        let (cols, rows) = if is_tty {
            crossterm::terminal::size().unwrap_or((80, 24))
        } else {
            (80, 24)
        };
        Capabilities {
            is_tty,
            color_depth,
            cols,
            rows,
        }
    }

    /// Return a copy of this record with `cols`/`rows` refreshed.
    ///
    /// Nothing else about a [`Capabilities`] record changes across a
    /// process lifetime: color depth is resolved once at detection.
    pub fn with_size(self, cols: u16, rows: u16) -> Self {
        Capabilities { cols, rows, ..self }
    }
}

/// The subset of the environment the detector reads, captured once so the
/// resolution logic is pure and testable.
#[derive(Debug, Clone, Default)]
pub struct EnvHints {
    pub no_color: bool,
    pub colorterm: Option<String>,
    pub term: Option<String>,
}

impl EnvHints {
    /// Capture the environment variables the detector cares about.
    pub fn from_process_env() -> Self {
        EnvHints {
            no_color: env::var_os("NO_COLOR").is_some(),
            colorterm: env::var("COLORTERM").ok(),
            term: env::var("TERM").ok(),
        }
    }
}

fn resolve_color_depth(is_tty: bool, hints: &EnvHints) -> ColorDepth {
    if hints.no_color {
        return ColorDepth::None;
    }
    if !is_tty {
        return ColorDepth::None;
    }
    if let Some(colorterm) = &hints.colorterm {
        if colorterm.contains("truecolor") || colorterm.contains("24bit") {
            return ColorDepth::Truecolor;
        }
    }
    if let Some(term) = &hints.term {
        if term.contains("256") {
            return ColorDepth::Ansi256;
        }
    }
    ColorDepth::Ansi16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints(no_color: bool, colorterm: Option<&str>, term: Option<&str>) -> EnvHints {
        EnvHints {
            no_color,
            colorterm: colorterm.map(str::to_string),
            term: term.map(str::to_string),
        }
    }

    #[test]
    fn no_color_forces_none_even_on_a_tty() {
        let h = hints(true, Some("truecolor"), Some("xterm-256color"));
        assert_eq!(resolve_color_depth(true, &h), ColorDepth::None);
    }

    #[test]
    fn non_tty_is_always_none() {
        let h = hints(false, Some("truecolor"), Some("xterm-256color"));
        assert_eq!(resolve_color_depth(false, &h), ColorDepth::None);
    }

    #[test]
    fn truecolor_hint_wins_over_256() {
        let h = hints(false, Some("truecolor"), Some("xterm-256color"));
        assert_eq!(resolve_color_depth(true, &h), ColorDepth::Truecolor);
    }

    #[test]
    fn two_five_six_color_term_without_truecolor_hint() {
        let h = hints(false, None, Some("xterm-256color"));
        assert_eq!(resolve_color_depth(true, &h), ColorDepth::Ansi256);
    }

    #[test]
    fn plain_tty_falls_back_to_ansi16() {
        let h = hints(false, None, Some("xterm"));
        assert_eq!(resolve_color_depth(true, &h), ColorDepth::Ansi16);
    }

    #[test]
    fn detect_with_non_tty_uses_fallback_size() {
        let caps = Capabilities::detect_with(false, &EnvHints::default());
        assert!(!caps.is_tty);
        assert_eq!(caps.color_depth, ColorDepth::None);
        assert_eq!((caps.cols, caps.rows), (80, 24));
    }

    #[test]
    fn with_size_only_touches_geometry() {
        let caps = Capabilities::detect_with(true, &hints(false, None, Some("xterm-256color")));
        let resized = caps.with_size(120, 40);
        assert_eq!(resized.color_depth, caps.color_depth);
        assert_eq!((resized.cols, resized.rows), (120, 40));
    }
}
