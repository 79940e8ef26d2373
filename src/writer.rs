//! Thread-safe, double-buffered output sink.
//!
//! All writes go through a mutex-guarded staging buffer. The buffer is
//! flushed to the underlying sink on an explicit [`TerminalWriter::flush`]
//! call, or automatically once per write when auto-flush is enabled (the
//! main loop turns auto-flush off during a frame and flushes once at the
//! end, so a frame's writes reach the terminal as a single syscall).

use std::io::{self, Write};
use std::sync::Mutex;

#[cfg(test)]
use std::sync::Arc;

struct Inner {
    sink: Box<dyn Write + Send>,
    staging: Vec<u8>,
    auto_flush: bool,
    disable_color: bool,
}

/// Mutex-guarded byte sink with optional SGR stripping.
pub struct TerminalWriter {
    inner: Mutex<Inner>,
    #[cfg(test)]
    test_sink: Option<Arc<Mutex<Vec<u8>>>>,
}

impl TerminalWriter {
    /// Wrap `sink` for buffered, mutex-guarded writes. `disable_color`
    /// strips SGR sequences from every write before it is staged.
    pub fn new(sink: Box<dyn Write + Send>, disable_color: bool) -> Self {
        TerminalWriter {
            inner: Mutex::new(Inner {
                sink,
                staging: Vec::new(),
                auto_flush: true,
                disable_color,
            }),
            #[cfg(test)]
            test_sink: None,
        }
    }

    /// An in-memory writer for tests: staged bytes land in a `Vec<u8>`
    /// retrievable via [`TerminalWriter::staged_for_test`].
    #[cfg(test)]
    pub fn in_memory(disable_color: bool) -> Self {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let sink = SharedBufferSink(Arc::clone(&buf));
        TerminalWriter {
            inner: Mutex::new(Inner {
                sink: Box::new(sink),
                staging: Vec::new(),
                auto_flush: true,
                disable_color,
            }),
            test_sink: Some(buf),
        }
    }

    #[cfg(test)]
    pub fn staged_for_test(&self) -> Vec<u8> {
        self.test_sink
            .as_ref()
            .expect("staged_for_test requires TerminalWriter::in_memory")
            .lock()
            .unwrap()
            .clone()
    }

    /// Enable or disable auto-flush. The main loop disables this while
    /// assembling a frame and flushes once at the end.
    pub fn set_auto_flush(&self, enabled: bool) {
        self.inner.lock().unwrap().auto_flush = enabled;
    }

    /// Stage `bytes` for output, stripping SGR sequences first if color is
    /// disabled. Flushes immediately if auto-flush is enabled.
    pub fn write(&self, bytes: &[u8]) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.disable_color {
            let stripped = strip_sgr(bytes);
            inner.staging.extend_from_slice(&stripped);
        } else {
            inner.staging.extend_from_slice(bytes);
        }
        if inner.auto_flush {
            flush_locked(&mut inner)?;
        }
        Ok(())
    }

    /// Write any staged bytes to the sink and flush the sink itself.
    pub fn flush(&self) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        flush_locked(&mut inner)
    }

    /// Flush outstanding bytes and release the sink. After `close`, further
    /// writes still succeed against an empty sink but have no destination;
    /// callers are expected to drop the writer afterward.
    pub fn close(&self) -> io::Result<()> {
        self.flush()
    }
}

fn flush_locked(inner: &mut Inner) -> io::Result<()> {
    if !inner.staging.is_empty() {
        inner.sink.write_all(&inner.staging)?;
        inner.staging.clear();
    }
    inner.sink.flush()
}

/// Strip well-formed `ESC [ <digits/;>* m` (SGR) sequences from `input`,
/// leaving every other byte — including non-SGR CSI sequences such as
/// cursor moves — untouched.
fn strip_sgr(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] == 0x1B && input.get(i + 1) == Some(&b'[') {
            let mut j = i + 2;
            while j < input.len() && matches!(input[j], b'0'..=b'9' | b';') {
                j += 1;
            }
            if j < input.len() && input[j] == b'm' {
                i = j + 1;
                continue;
            }
            out.push(input[i]);
            i += 1;
            continue;
        }
        out.push(input[i]);
        i += 1;
    }
    out
}

#[cfg(test)]
struct SharedBufferSink(Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl Write for SharedBufferSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_reaches_sink_with_auto_flush_on() {
        let w = TerminalWriter::in_memory(false);
        w.write(b"hello").unwrap();
        assert_eq!(w.staged_for_test(), b"hello");
    }

    #[test]
    fn writes_stage_until_flush_when_auto_flush_off() {
        let w = TerminalWriter::in_memory(false);
        w.set_auto_flush(false);
        w.write(b"abc").unwrap();
        assert!(w.staged_for_test().is_empty());
        w.flush().unwrap();
        assert_eq!(w.staged_for_test(), b"abc");
    }

    #[test]
    fn disable_color_strips_sgr_sequences() {
        let w = TerminalWriter::in_memory(true);
        w.write(b"\x1b[31mred\x1b[0m plain").unwrap();
        assert_eq!(w.staged_for_test(), b"red plain");
    }

    #[test]
    fn disable_color_leaves_non_sgr_escapes_alone() {
        let w = TerminalWriter::in_memory(true);
        w.write(b"\x1b[2J\x1b[1;1H\x1b[31mred\x1b[0m").unwrap();
        assert_eq!(w.staged_for_test(), b"\x1b[2J\x1b[1;1Hred");
    }

    #[test]
    fn strip_sgr_is_a_pure_function() {
        assert_eq!(strip_sgr(b"no escapes here"), b"no escapes here");
        assert_eq!(strip_sgr(b"\x1b[1;31;4mtext\x1b[0m"), b"text");
    }

    #[test]
    fn close_flushes_staged_bytes() {
        let w = TerminalWriter::in_memory(false);
        w.set_auto_flush(false);
        w.write(b"final").unwrap();
        w.close().unwrap();
        assert_eq!(w.staged_for_test(), b"final");
    }
}
