//! The dispatcher: owns every other component and implements the public
//! `Loop` contract (`Mount`, `Run`, `Stop`, `IsRunning`).
//!
//! `Run` executes on the calling thread and *is* the dispatcher — the
//! single-writer caller of every visual method. Auxiliary threads
//! (Key Reader, Signal Handler, Event Loop timer) only ever send events in;
//! they never touch a mounted visual directly.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossbeam_channel::{select, unbounded, Sender};
use log::{debug, error, trace, warn};

use crate::capabilities::Capabilities;
use crate::config::Config;
use crate::cursor::CursorController;
use crate::error::{LoopError, Result};
use crate::event_loop::{EventLoop, Tick};
use crate::key::Key;
use crate::key_reader::{CancelToken, KeyReader};
use crate::multiplex::{Multiplexer, DEFAULT_MAX_VISUALS};
use crate::render_engine::RenderEngine;
use crate::screen::ScreenManager;
use crate::signals::{SignalEvent, SignalHandler};
use crate::visual::{MountHandle, Visual};
use crate::writer::TerminalWriter;

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const STOPPING: u8 = 2;
const STOPPED: u8 = 3;

/// The runtime rendering and interaction core. One `Loop` owns one
/// terminal; mounting, running, and stopping all go through it.
pub struct Loop {
    state: AtomicU8,
    multiplexer: Arc<Mutex<Multiplexer>>,
    screen: Mutex<ScreenManager>,
    render_engine: Mutex<RenderEngine>,
    cursor: Mutex<CursorController>,
    writer: Arc<TerminalWriter>,
    caps: Capabilities,
    test_mode: bool,
    handle_signals: bool,
    tick_interval: Duration,
    next_id: AtomicU64,
    stop_tx: Mutex<Option<Sender<()>>>,
}

impl Loop {
    /// Build a loop from `config`, detecting capabilities for the current
    /// process's stdout.
    pub fn new(config: Config) -> Self {
        let caps = Capabilities::detect();
        Self::from_parts(config, caps)
    }

    /// Build a loop with explicit capabilities, bypassing detection. Used
    /// by tests that need to force a TTY or non-TTY path independent of
    /// the test harness's own stdout.
    pub fn from_parts(config: Config, caps: Capabilities) -> Self {
        let handle_signals = config.resolved_handle_signals(&caps);
        let tick_interval = config.resolved_tick_interval(&caps);
        let disable_color = !caps.supports_color();
        Loop {
            state: AtomicU8::new(IDLE),
            multiplexer: Arc::new(Mutex::new(Multiplexer::new(DEFAULT_MAX_VISUALS))),
            screen: Mutex::new(ScreenManager::new()),
            render_engine: Mutex::new(RenderEngine::new()),
            cursor: Mutex::new(CursorController::new()),
            writer: Arc::new(TerminalWriter::new(config.output, disable_color)),
            caps,
            test_mode: config.test_mode,
            handle_signals,
            tick_interval,
            next_id: AtomicU64::new(0),
            stop_tx: Mutex::new(None),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    /// Mount `visual`, allocating it a name and a region. Takes effect
    /// immediately if `Running`; if `Idle`, takes effect on the next
    /// `Run`.
    pub fn mount(&self, visual: Box<dyn Visual>) -> Result<MountHandle> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let name = format!("visual-{id}");
        let height = visual.min_height();
        {
            let mut mux = self.multiplexer.lock().unwrap();
            mux.mount(name.clone(), visual)?;
        }
        self.reallocate_regions();
        debug!("mounted {name} requesting {height} row(s)");
        Ok(MountHandle::new(name, Arc::clone(&self.multiplexer)))
    }

    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::SeqCst) == RUNNING
    }

    /// Request shutdown. A no-op error (`NotRunning`) if the loop isn't
    /// `Running`; idempotent once `Stopping` has been entered.
    pub fn stop(&self) -> Result<()> {
        let prev = self
            .state
            .compare_exchange(RUNNING, STOPPING, Ordering::SeqCst, Ordering::SeqCst);
        match prev {
            Ok(_) => {
                if let Some(tx) = self.stop_tx.lock().unwrap().take() {
                    let _ = tx.send(());
                }
                Ok(())
            }
            Err(STOPPING) => Ok(()), // idempotent
            _ => Err(LoopError::NotRunning),
        }
    }

    /// Run the loop to completion on the calling thread. `cancel` is the
    /// authoritative shutdown signal; stopping via [`Loop::stop`] or
    /// cancelling the token have the same effect.
    pub fn run(&self, cancel: CancelToken) -> Result<()> {
        if self
            .state
            .compare_exchange(IDLE, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(LoopError::AlreadyRunning);
        }

        let (stop_tx, stop_rx) = unbounded();
        *self.stop_tx.lock().unwrap() = Some(stop_tx);

        let result = if self.caps.is_tty && !self.test_mode {
            self.run_tty(&cancel, stop_rx)
        } else {
            self.run_headless(&cancel, stop_rx)
        };

        self.state.store(STOPPED, Ordering::SeqCst);
        *self.stop_tx.lock().unwrap() = None;
        result
    }

    fn run_headless(
        &self,
        cancel: &CancelToken,
        stop_rx: crossbeam_channel::Receiver<()>,
    ) -> Result<()> {
        if !self.test_mode {
            while !cancel.is_cancelled() {
                if stop_rx.recv_timeout(Duration::from_millis(20)).is_ok() {
                    break;
                }
            }
            return Err(LoopError::Cancelled);
        }

        let (tick_tx, tick_rx) = unbounded();
        let mut timer = EventLoop::spawn(self.tick_interval, tick_tx);
        loop {
            if cancel.is_cancelled() {
                break;
            }
            select! {
                recv(stop_rx) -> _ => break,
                recv(tick_rx) -> msg => {
                    if msg.is_ok() {
                        self.dispatch_tick(Instant::now());
                    } else {
                        break;
                    }
                }
                default(Duration::from_millis(20)) => {}
            }
        }
        timer.stop();
        Err(LoopError::Cancelled)
    }

    fn run_tty(&self, cancel: &CancelToken, stop_rx: crossbeam_channel::Receiver<()>) -> Result<()> {
        let cursor_hide_result = self.cursor.lock().unwrap().hide(&self.writer);
        if let Err(e) = cursor_hide_result {
            warn!("failed to hide cursor: {e}");
        }
        if let Err(e) = crossterm::terminal::enable_raw_mode() {
            warn!("failed to enable raw mode: {e}");
        }

        let (tick_tx, tick_rx) = unbounded();
        let mut timer = EventLoop::spawn(self.tick_interval, tick_tx);

        let (key_tx, key_rx) = unbounded();
        let key_cancel = CancelToken::new();
        let key_reader = KeyReader::spawn(std::io::stdin(), key_tx, key_cancel.clone());

        let signals = SignalHandler::new();
        let (signal_tx, signal_rx) = unbounded::<SignalEvent>();
        if self.handle_signals {
            if let Err(e) = signals.listen(signal_tx) {
                warn!("failed to install signal handlers: {e}");
            }
        }

        let outcome = loop {
            if cancel.is_cancelled() {
                break Ok(());
            }
            if signals.take_resize() {
                self.handle_resize();
            }
            select! {
                recv(stop_rx) -> _ => break Ok(()),
                recv(tick_rx) -> msg => {
                    match msg {
                        Ok(Tick) => {
                            self.dispatch_tick(Instant::now());
                            if let Err(e) = self.render_frame() {
                                warn!("terminal write failed, retrying once: {e}");
                                if let Err(e) = self.render_frame() {
                                    error!("terminal write failed after retry: {e}");
                                    break Err(LoopError::from(e));
                                }
                            }
                        }
                        Err(_) => break Ok(()),
                    }
                }
                recv(key_rx) -> msg => {
                    match msg {
                        Ok(key) => {
                            trace!("key: {key:?}");
                            if self.dispatch_key(key) {
                                // consumed; nothing else to do this round
                            } else if key.is_top_level_interrupt() {
                                break Ok(());
                            }
                        }
                        Err(_) => break Ok(()),
                    }
                }
                recv(signal_rx) -> msg => {
                    if msg.is_ok() {
                        debug!("termination signal received");
                        break Ok(());
                    }
                }
                default(Duration::from_millis(20)) => {}
            }
        };

        key_reader.stop();
        key_reader.join();
        timer.stop();

        self.shutdown_terminal();

        match outcome {
            Ok(()) => Err(LoopError::Cancelled),
            Err(e) => Err(e),
        }
    }

    fn handle_resize(&self) {
        let (cols, rows) = crossterm::terminal::size().unwrap_or((self.caps.cols, self.caps.rows));
        debug!("resize: {cols}x{rows}");
        self.reallocate_regions_for_size(rows);
        let mut mux = self.multiplexer.lock().unwrap();
        dispatch_resize(&mut mux, cols, rows);
        drop(mux);
        self.render_engine.lock().unwrap().clear(&self.writer).ok();
    }

    fn reallocate_regions(&self) {
        self.reallocate_regions_for_size(self.caps.rows);
    }

    fn reallocate_regions_for_size(&self, rows: u16) {
        let order = self.multiplexer.lock().unwrap().heights_in_order();
        let dropped = self.screen.lock().unwrap().reallocate(&order, rows);
        for name in dropped {
            warn!("region for {name} dropped after resize to {rows} rows");
        }
    }

    fn render_frame(&self) -> std::io::Result<()> {
        let mut mux = self.multiplexer.lock().unwrap();
        let screen = self.screen.lock().unwrap();
        let mut frame = Vec::new();
        let mut lowest_bottom: u16 = 0;
        let mut panicked = Vec::new();

        for (name, visual) in mux.iter_mut() {
            let Some(region) = screen.region_of(name) else {
                continue;
            };
            frame.extend_from_slice(format!("\x1b[{};1H", region.top + 1).as_bytes());
            let mut buf = Vec::new();
            let result =
                panic::catch_unwind(AssertUnwindSafe(|| visual.render(&mut buf)));
            if result.is_err() {
                error!("visual {name} panicked in render and will be unmounted");
                panicked.push(name.to_string());
            }
            frame.extend_from_slice(&buf);
            lowest_bottom = lowest_bottom.max(region.bottom);
        }
        frame.extend_from_slice(format!("\x1b[{};1H", lowest_bottom + 1).as_bytes());
        drop(screen);
        for name in &panicked {
            mux.unmount(name);
        }
        drop(mux);

        trace!("frame: {} bytes", frame.len());
        self.writer.set_auto_flush(false);
        let render_result = self.render_engine.lock().unwrap().render(&self.writer, &frame);
        self.writer.set_auto_flush(true);
        render_result?;
        self.writer.flush()?;
        Ok(())
    }

    fn dispatch_tick(&self, now: Instant) {
        let mut mux = self.multiplexer.lock().unwrap();
        let mut panicked = Vec::new();
        for (name, visual) in mux.iter_mut() {
            if let Some(ticking) = visual.as_ticking_mut() {
                let result = panic::catch_unwind(AssertUnwindSafe(|| ticking.tick(now)));
                if result.is_err() {
                    error!("visual {name} panicked in tick and will be unmounted");
                    panicked.push(name.to_string());
                }
            }
        }
        for name in &panicked {
            mux.unmount(name);
        }
    }

    /// Dispatch `key` to mounted `Interactive` visuals in mount order
    /// until one consumes it. Returns whether any visual consumed it.
    fn dispatch_key(&self, key: Key) -> bool {
        let mut mux = self.multiplexer.lock().unwrap();
        let mut panicked = Vec::new();
        let mut consumed = false;
        for (name, visual) in mux.iter_mut() {
            if consumed {
                break;
            }
            if let Some(interactive) = visual.as_interactive_mut() {
                let result =
                    panic::catch_unwind(AssertUnwindSafe(|| interactive.on_key(key)));
                match result {
                    Ok(true) => consumed = true,
                    Ok(false) => {}
                    Err(_) => {
                        error!("visual {name} panicked in on_key and will be unmounted");
                        panicked.push(name.to_string());
                    }
                }
            }
        }
        for name in &panicked {
            mux.unmount(name);
        }
        consumed
    }

    fn shutdown_terminal(&self) {
        let mut cursor = self.cursor.lock().unwrap();
        if let Err(e) = cursor.show(&self.writer) {
            warn!("failed to restore cursor: {e}");
        }
        drop(cursor);
        if let Err(e) = crossterm::terminal::disable_raw_mode() {
            warn!("failed to disable raw mode: {e}");
        }

        let mut screen = self.screen.lock().unwrap();
        let names: Vec<String> = self
            .multiplexer
            .lock()
            .unwrap()
            .region_names();
        for name in names {
            let _ = screen.clear(&self.writer, &name);
        }
        let _ = self.writer.flush();
    }

    /// One-shot text emission for non-TTY callers that want to announce
    /// progress without any cursor or ANSI control.
    pub fn write_line(&self, text: &str) -> std::io::Result<()> {
        self.writer.write(text.as_bytes())?;
        self.writer.write(b"\n")
    }
}

fn dispatch_resize(mux: &mut Multiplexer, cols: u16, rows: u16) {
    let mut panicked = Vec::new();
    for (name, visual) in mux.iter_mut() {
        let result = panic::catch_unwind(AssertUnwindSafe(|| visual.on_resize(cols, rows)));
        if result.is_err() {
            error!("visual {name} panicked in on_resize and will be unmounted");
            panicked.push(name.to_string());
        }
    }
    for name in &panicked {
        mux.unmount(name);
    }
}
