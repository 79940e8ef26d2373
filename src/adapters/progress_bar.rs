//! A static, non-interactive progress bar.

use crate::visual::Visual;

/// Renders `[#####-----] NN%` for a `current`/`total` pair.
pub struct ProgressBar {
    current: u64,
    total: u64,
    width: u16,
    label: String,
}

impl ProgressBar {
    pub fn new(total: u64) -> Self {
        ProgressBar {
            current: 0,
            total: total.max(1),
            width: 20,
            label: String::new(),
        }
    }

    pub fn with_width(mut self, width: u16) -> Self {
        self.width = width.max(1);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Advance the bar to `current` out of its total, clamped to `[0, total]`.
    pub fn set_progress(&mut self, current: u64) {
        self.current = current.min(self.total);
    }

    fn fraction(&self) -> f64 {
        self.current as f64 / self.total as f64
    }
}

impl Visual for ProgressBar {
    fn render(&mut self, out: &mut Vec<u8>) {
        let filled = (self.fraction() * self.width as f64).round() as u16;
        let filled = filled.min(self.width);
        let percent = (self.fraction() * 100.0).round() as u64;
        out.push(b'[');
        out.extend(std::iter::repeat(b'#').take(filled as usize));
        out.extend(std::iter::repeat(b'-').take((self.width - filled) as usize));
        out.extend_from_slice(format!("] {percent:>3}%").as_bytes());
        if !self.label.is_empty() {
            out.push(b' ');
            out.extend_from_slice(self.label.as_bytes());
        }
    }

    fn on_resize(&mut self, _cols: u16, _rows: u16) {}

    fn name(&self) -> &str {
        "progress-bar"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(bar: &mut ProgressBar) -> String {
        let mut out = Vec::new();
        bar.render(&mut out);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn zero_progress_is_all_dashes() {
        let mut bar = ProgressBar::new(10).with_width(10);
        assert_eq!(render(&mut bar), "[----------]   0%");
    }

    #[test]
    fn half_progress_is_half_filled() {
        let mut bar = ProgressBar::new(10).with_width(10);
        bar.set_progress(5);
        assert_eq!(render(&mut bar), "[#####-----]  50%");
    }

    #[test]
    fn progress_past_total_clamps() {
        let mut bar = ProgressBar::new(10).with_width(10);
        bar.set_progress(999);
        assert_eq!(render(&mut bar), "[##########] 100%");
    }

    #[test]
    fn label_is_appended_when_set() {
        let mut bar = ProgressBar::new(10).with_width(4).with_label("downloading");
        assert!(render(&mut bar).ends_with("downloading"));
    }
}
