//! Loop construction surfaces: a fluent builder and a plain struct, kept
//! equally supported rather than picking one.

use std::io::Write;
use std::time::Duration;

use crate::capabilities::Capabilities;

/// Construction parameters for [`crate::main_loop::Loop`].
///
/// `tick_interval: None` means "use the capability-based default";
/// this is the tie-breaker whenever neither construction surface sets an
/// explicit interval.
pub struct Config {
    pub tick_interval: Option<Duration>,
    pub output: Box<dyn Write + Send>,
    pub test_mode: bool,
    pub handle_signals: Option<bool>,
}

impl Config {
    /// A config writing to stdout, with every other field left at its
    /// capability-aware default.
    pub fn new() -> Self {
        Config {
            tick_interval: None,
            output: Box::new(std::io::stdout()),
            test_mode: false,
            handle_signals: None,
        }
    }

    /// Begin a fluent builder chain starting from this config.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Resolve `handle_signals` against the detected capabilities: `true`
    /// whenever `is_tty`, `false` otherwise, unless set explicitly.
    pub fn resolved_handle_signals(&self, caps: &Capabilities) -> bool {
        self.handle_signals.unwrap_or(caps.is_tty)
    }

    /// Resolve `tick_interval` against the detected capabilities.
    pub fn resolved_tick_interval(&self, caps: &Capabilities) -> Duration {
        self.tick_interval
            .unwrap_or_else(|| crate::event_loop::default_interval(caps))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

/// Fluent `with_*` chain over [`Config`], mirroring the builder pattern
/// used throughout this crate's component constructors.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::new(),
        }
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.config.tick_interval = Some(interval);
        self
    }

    pub fn with_output(mut self, output: Box<dyn Write + Send>) -> Self {
        self.config.output = output;
        self
    }

    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.config.test_mode = test_mode;
        self
    }

    pub fn with_handle_signals(mut self, handle_signals: bool) -> Self {
        self.config.handle_signals = Some(handle_signals);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        ConfigBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::ColorDepth;

    fn caps(is_tty: bool) -> Capabilities {
        Capabilities {
            is_tty,
            color_depth: if is_tty { ColorDepth::Ansi16 } else { ColorDepth::None },
            cols: 80,
            rows: 24,
        }
    }

    #[test]
    fn builder_chain_sets_every_field() {
        let cfg = Config::builder()
            .with_tick_interval(Duration::from_millis(10))
            .with_test_mode(true)
            .with_handle_signals(false)
            .build();
        assert_eq!(cfg.tick_interval, Some(Duration::from_millis(10)));
        assert!(cfg.test_mode);
        assert_eq!(cfg.handle_signals, Some(false));
    }

    #[test]
    fn struct_literal_path_works_via_default() {
        let cfg = Config {
            test_mode: true,
            ..Config::default()
        };
        assert!(cfg.test_mode);
        assert_eq!(cfg.tick_interval, None);
    }

    #[test]
    fn unset_handle_signals_follows_is_tty() {
        let cfg = Config::new();
        assert!(cfg.resolved_handle_signals(&caps(true)));
        assert!(!cfg.resolved_handle_signals(&caps(false)));
    }

    #[test]
    fn unset_tick_interval_falls_back_to_capability_default() {
        let cfg = Config::new();
        let interval = cfg.resolved_tick_interval(&caps(true));
        assert_eq!(interval, Duration::from_millis(33));
    }

    #[test]
    fn explicit_tick_interval_overrides_capability_default() {
        let cfg = Config::builder()
            .with_tick_interval(Duration::from_millis(7))
            .build();
        assert_eq!(cfg.resolved_tick_interval(&caps(true)), Duration::from_millis(7));
    }
}
