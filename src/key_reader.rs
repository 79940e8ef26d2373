//! Byte-stream to [`Key`] decoding, and the background thread that feeds a
//! channel from stdin.
//!
//! The decoding state machine (`Decoder`) is pure and has no I/O dependency
//! so it can be driven directly in tests; [`KeyReader`] is the thin thread
//! wrapper that owns stdin and honors cancellation between reads.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender;
use log::warn;

use crate::key::{Key, KeyCode, Modifiers};

/// Longest CSI parameter buffer the decoder will accumulate before giving
/// up and emitting `KeyCode::Unknown`. Guards against unbounded growth on
/// a malformed or adversarial byte stream.
const MAX_CSI_PARAM_LEN: usize = 32;

#[derive(Debug)]
enum State {
    Normal,
    PendingEscape,
    Csi(Vec<u8>),
}

/// Incremental CSI-aware key decoder.
///
/// Feed it one byte at a time; it returns zero, one, or (in the ESC
/// not-followed-by-`[` case) two decoded keys per byte.
#[derive(Debug)]
pub struct Decoder {
    state: State,
}

impl Default for Decoder {
    fn default() -> Self {
        Decoder::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        Decoder {
            state: State::Normal,
        }
    }

    /// Feed one byte, returning any keys it completes.
    pub fn feed(&mut self, byte: u8) -> Vec<Key> {
        match std::mem::replace(&mut self.state, State::Normal) {
            State::Normal => self.feed_normal(byte),
            State::PendingEscape => self.feed_pending_escape(byte),
            State::Csi(buf) => self.feed_csi(buf, byte),
        }
    }

    /// Called when the reader's wait for the next byte times out. Flushes
    /// a lone `Escape` if one was pending; a no-op otherwise.
    pub fn timeout(&mut self) -> Option<Key> {
        if matches!(self.state, State::PendingEscape) {
            self.state = State::Normal;
            Some(Key::plain(KeyCode::Escape))
        } else {
            None
        }
    }

    fn feed_normal(&mut self, byte: u8) -> Vec<Key> {
        match byte {
            0x1B => {
                self.state = State::PendingEscape;
                vec![]
            }
            0x03 => vec![Key::plain(KeyCode::CtrlC)],
            0x04 => vec![Key::plain(KeyCode::CtrlD)],
            0x1A => vec![Key::plain(KeyCode::CtrlZ)],
            0x09 => vec![Key::plain(KeyCode::Tab)],
            0x0A | 0x0D => vec![Key::plain(KeyCode::Enter)],
            0x08 | 0x7F => vec![Key::plain(KeyCode::Backspace)],
            0x20 => vec![Key::plain(KeyCode::Space)],
            0x01..=0x19 => {
                let letter = (byte | 0x60) as char;
                vec![Key::new(KeyCode::CtrlChar(letter), Modifiers::CTRL, Some(letter))]
            }
            b if b.is_ascii_alphanumeric() => {
                let ch = b as char;
                let mods = if ch.is_ascii_uppercase() {
                    Modifiers::SHIFT
                } else {
                    Modifiers::empty()
                };
                vec![Key::new(KeyCode::Char, mods, Some(ch))]
            }
            _ => {
                warn!("key reader: unrecognized byte {byte:#04x}");
                vec![Key::plain(KeyCode::Unknown)]
            }
        }
    }

    fn feed_pending_escape(&mut self, byte: u8) -> Vec<Key> {
        if byte == b'[' {
            self.state = State::Csi(Vec::new());
            vec![]
        } else {
            let mut keys = vec![Key::plain(KeyCode::Escape)];
            keys.extend(self.feed_normal(byte));
            keys
        }
    }

    fn feed_csi(&mut self, mut buf: Vec<u8>, byte: u8) -> Vec<Key> {
        if (0x40..=0x7E).contains(&byte) {
            return vec![decode_csi(&buf, byte)];
        }
        if buf.len() >= MAX_CSI_PARAM_LEN {
            warn!("key reader: CSI sequence exceeded {MAX_CSI_PARAM_LEN} bytes, discarding");
            return vec![Key::plain(KeyCode::Unknown)];
        }
        buf.push(byte);
        self.state = State::Csi(buf);
        vec![]
    }
}

fn decode_csi(params: &[u8], final_byte: u8) -> Key {
    let param_str = std::str::from_utf8(params).unwrap_or("");
    let nums: Vec<i64> = param_str
        .split(';')
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect();

    let modifiers = nums
        .get(1)
        .map(|&m| modifiers_from_param(m))
        .unwrap_or_else(Modifiers::empty);

    let code = match final_byte {
        b'A' => KeyCode::ArrowUp,
        b'B' => KeyCode::ArrowDown,
        b'C' => KeyCode::ArrowRight,
        b'D' => KeyCode::ArrowLeft,
        b'H' => KeyCode::Home,
        b'F' => KeyCode::End,
        b'~' if nums.first() == Some(&3) => KeyCode::Delete,
        _ => KeyCode::Unknown,
    };
    Key::new(code, modifiers, None)
}

fn modifiers_from_param(m: i64) -> Modifiers {
    match m {
        2 => Modifiers::SHIFT,
        3 => Modifiers::ALT,
        4 => Modifiers::SHIFT | Modifiers::ALT,
        5 => Modifiers::CTRL,
        6 => Modifiers::CTRL | Modifiers::SHIFT,
        7 => Modifiers::CTRL | Modifiers::ALT,
        8 => Modifiers::CTRL | Modifiers::ALT | Modifiers::SHIFT,
        _ => Modifiers::empty(),
    }
}

/// Decode a whole byte slice at once. Convenience for tests and for the
/// non-TTY/test-mode code paths that never need a background thread.
pub fn decode_all(bytes: &[u8]) -> Vec<Key> {
    let mut decoder = Decoder::new();
    let mut keys = Vec::new();
    for &b in bytes {
        keys.extend(decoder.feed(b));
    }
    if let Some(k) = decoder.timeout() {
        keys.push(k);
    }
    keys
}

/// Cooperative cancellation flag shared between the dispatcher and the
/// key-reader thread.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How long the reader waits for the next byte before checking the cancel
/// token again. Also the resolution at which a lone `Escape` is detected.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Owns a background thread that decodes bytes from a reader and forwards
/// [`Key`] events onto a bounded channel until cancelled or EOF.
pub struct KeyReader {
    handle: Option<JoinHandle<()>>,
    cancel: CancelToken,
}

impl KeyReader {
    /// Spawn the reader thread over `source`, sending decoded keys to `tx`.
    pub fn spawn<R>(source: R, tx: Sender<Key>, cancel: CancelToken) -> Self
    where
        R: Read + Readiness + Send + 'static,
    {
        let thread_cancel = cancel.clone();
        let handle = thread::spawn(move || run_reader(source, tx, thread_cancel));
        KeyReader {
            handle: Some(handle),
            cancel,
        }
    }

    /// Request the reader thread to stop at its next opportunity. Does not
    /// block; the thread may still be mid-poll when this returns.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Block until the reader thread has exited. Safe to call after
    /// [`KeyReader::stop`]; the thread notices the cancel token within one
    /// `POLL_INTERVAL`.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Abstraction over "is there data to read right now" so the reader thread
/// can poll for cancellation between reads without blocking indefinitely
/// on an arbitrary `Read` implementation.
pub trait Readiness {
    /// Block up to `timeout` for readability; return `true` if the next
    /// read is expected to return promptly.
    fn wait_readable(&self, timeout: Duration) -> bool;
}

#[cfg(unix)]
impl Readiness for std::io::Stdin {
    fn wait_readable(&self, timeout: Duration) -> bool {
        use std::os::unix::io::AsRawFd;
        let fd = self.as_raw_fd();
        let mut pfd = libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        };
        let millis = timeout.as_millis().min(i32::MAX as u128) as i32;
        // SAFETY: `pfd` is a single, stack-local pollfd valid for the call.
        let rv = unsafe { libc::poll(&mut pfd, 1, millis) };
        rv > 0 && (pfd.revents & libc::POLLIN) != 0
    }
}

#[cfg(not(unix))]
impl Readiness for std::io::Stdin {
    fn wait_readable(&self, _timeout: Duration) -> bool {
        // No portable non-blocking readiness check; fall through to a
        // blocking read. Cancellation on these platforms takes effect on
        // the next byte, or on process exit.
        true
    }
}

/// A plain in-memory source is always "ready"; used by tests that replay a
/// byte slice without a real thread/poll loop.
impl Readiness for std::io::Cursor<Vec<u8>> {
    fn wait_readable(&self, _timeout: Duration) -> bool {
        true
    }
}

fn run_reader<R: Read + Readiness>(mut source: R, tx: Sender<Key>, cancel: CancelToken) {
    let mut decoder = Decoder::new();
    let mut byte = [0u8; 1];
    while !cancel.is_cancelled() {
        if !source.wait_readable(POLL_INTERVAL) {
            if let Some(key) = decoder.timeout() {
                if tx.send(key).is_err() {
                    return;
                }
            }
            continue;
        }
        match source.read(&mut byte) {
            Ok(0) => return, // EOF
            Ok(_) => {
                for key in decoder.feed(byte[0]) {
                    if tx.send(key).is_err() {
                        return;
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("key reader: read error: {e}");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_arrow_up() {
        let keys = decode_all(&[0x1B, 0x5B, 0x41]);
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].code, KeyCode::ArrowUp);
        assert_eq!(keys[0].modifiers, Modifiers::empty());
        assert_eq!(keys[0].rune, None);
    }

    #[test]
    fn decodes_ctrl_modified_arrow_up() {
        let keys = decode_all(b"\x1b[1;5A");
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].code, KeyCode::ArrowUp);
        assert_eq!(keys[0].modifiers, Modifiers::CTRL);
    }

    #[test]
    fn decodes_delete() {
        let keys = decode_all(b"\x1b[3~");
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].code, KeyCode::Delete);
    }

    #[test]
    fn decodes_home_and_end() {
        assert_eq!(decode_all(b"\x1b[H")[0].code, KeyCode::Home);
        assert_eq!(decode_all(b"\x1b[F")[0].code, KeyCode::End);
    }

    #[test]
    fn lone_escape_not_followed_by_bracket() {
        let keys = decode_all(b"\x1bx");
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].code, KeyCode::Escape);
        assert_eq!(keys[1].code, KeyCode::Char);
        assert_eq!(keys[1].rune, Some('x'));
    }

    #[test]
    fn trailing_escape_with_no_more_bytes_flushes_on_timeout() {
        let mut decoder = Decoder::new();
        assert!(decoder.feed(0x1B).is_empty());
        assert_eq!(decoder.timeout(), Some(Key::plain(KeyCode::Escape)));
        assert_eq!(decoder.timeout(), None);
    }

    #[test]
    fn control_bytes_map_to_known_ctrl_keys() {
        assert_eq!(decode_all(&[0x03])[0].code, KeyCode::CtrlC);
        assert_eq!(decode_all(&[0x04])[0].code, KeyCode::CtrlD);
        assert_eq!(decode_all(&[0x1A])[0].code, KeyCode::CtrlZ);
    }

    #[test]
    fn other_control_bytes_map_to_ctrl_letter() {
        let keys = decode_all(&[0x01]);
        assert_eq!(keys[0].code, KeyCode::CtrlChar('a'));
        assert_eq!(keys[0].modifiers, Modifiers::CTRL);
    }

    #[test]
    fn printable_letters_set_shift_for_uppercase() {
        let lower = decode_all(b"a");
        assert_eq!(lower[0].modifiers, Modifiers::empty());
        let upper = decode_all(b"A");
        assert_eq!(upper[0].modifiers, Modifiers::SHIFT);
        assert_eq!(upper[0].rune, Some('A'));
    }

    #[test]
    fn whitespace_and_editing_bytes() {
        assert_eq!(decode_all(&[0x09])[0].code, KeyCode::Tab);
        assert_eq!(decode_all(&[0x0A])[0].code, KeyCode::Enter);
        assert_eq!(decode_all(&[0x0D])[0].code, KeyCode::Enter);
        assert_eq!(decode_all(&[0x08])[0].code, KeyCode::Backspace);
        assert_eq!(decode_all(&[0x7F])[0].code, KeyCode::Backspace);
        assert_eq!(decode_all(&[0x20])[0].code, KeyCode::Space);
    }

    #[test]
    fn unrecognized_csi_terminator_yields_unknown() {
        // ESC [ 9 9 z -- not a terminator this decoder recognizes.
        let keys = decode_all(b"\x1b[99z");
        assert_eq!(keys[0].code, KeyCode::Unknown);
    }

    #[test]
    fn overlong_csi_sequence_is_discarded_as_unknown() {
        let mut bytes = vec![0x1B, b'['];
        bytes.extend(std::iter::repeat(b'0').take(MAX_CSI_PARAM_LEN + 1));
        let keys = decode_all(&bytes);
        assert_eq!(keys[0].code, KeyCode::Unknown);
    }

    #[test]
    fn reader_thread_delivers_keys_from_a_cursor_and_stops_at_eof() {
        let source = std::io::Cursor::new(b"ab\x03".to_vec());
        let (tx, rx) = crossbeam_channel::unbounded();
        let reader = KeyReader::spawn(source, tx, CancelToken::new());
        let mut got = Vec::new();
        while let Ok(key) = rx.recv_timeout(Duration::from_secs(1)) {
            got.push(key.code);
        }
        reader.join();
        assert_eq!(got, vec![KeyCode::Char, KeyCode::Char, KeyCode::CtrlC]);
    }
}
