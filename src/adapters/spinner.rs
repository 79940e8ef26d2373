//! A ticking spinner animation.

use std::time::Instant;

use crate::visual::{Ticking, Visual};

const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Cycles through a fixed frame set on every tick.
pub struct Spinner {
    frame: usize,
    label: String,
}

impl Spinner {
    pub fn new(label: impl Into<String>) -> Self {
        Spinner {
            frame: 0,
            label: label.into(),
        }
    }
}

impl Visual for Spinner {
    fn render(&mut self, out: &mut Vec<u8>) {
        out.extend_from_slice(FRAMES[self.frame].as_bytes());
        if !self.label.is_empty() {
            out.push(b' ');
            out.extend_from_slice(self.label.as_bytes());
        }
    }

    fn on_resize(&mut self, _cols: u16, _rows: u16) {}

    fn name(&self) -> &str {
        "spinner"
    }

    fn as_ticking_mut(&mut self) -> Option<&mut dyn Ticking> {
        Some(self)
    }
}

impl Ticking for Spinner {
    fn tick(&mut self, _now: Instant) {
        self.frame = (self.frame + 1) % FRAMES.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_advances_frame_and_wraps() {
        let mut spinner = Spinner::new("loading");
        let mut out = Vec::new();
        spinner.render(&mut out);
        assert_eq!(out, FRAMES[0].as_bytes().iter().chain(b" loading").copied().collect::<Vec<_>>());

        for _ in 0..FRAMES.len() {
            spinner.tick(Instant::now());
        }
        let mut out = Vec::new();
        spinner.render(&mut out);
        assert_eq!(&out[..FRAMES[0].len()], FRAMES[0].as_bytes());
    }
}
