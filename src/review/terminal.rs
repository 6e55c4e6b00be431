//! Terminal playback surface and key reader.
//!
//! [`TerminalSurface`] prints each item and can hand it to an external viewer
//! process. [`KeyReader`] puts the terminal into raw mode and forwards bound
//! key presses into the session channel from a background thread.
//!
//! Raw mode is always left again, even on panic.

use std::io::{self, Write};
use std::panic;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event};
use crossterm::terminal;
use yansi::Paint;

use super::{KeyMap, PlaybackSurface, ReviewEvent, SurfaceError};
use crate::logging;

/// Poll interval for the key reader and viewer watcher threads.
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// A running viewer process plus the thread watching for it to exit.
struct ViewerProcess {
    child: Arc<Mutex<Child>>,
    cancelled: Arc<AtomicBool>,
    watcher: Option<JoinHandle<()>>,
}

impl ViewerProcess {
    fn spawn(argv: &[String], path: &Path, events: Option<Sender<ReviewEvent>>) -> Result<Self, SurfaceError> {
        let (program, args) = argv.split_first().ok_or_else(|| SurfaceError::Viewer {
            command: String::new(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "empty viewer command"),
        })?;

        let child = Command::new(program)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SurfaceError::Viewer {
                command: argv.join(" "),
                source,
            })?;
        log::debug!("Started viewer (pid {}) for {}", child.id(), path.display());

        let child = Arc::new(Mutex::new(child));
        let cancelled = Arc::new(AtomicBool::new(false));
        let watcher = events.map(|tx| {
            let child = Arc::clone(&child);
            let cancelled = Arc::clone(&cancelled);
            thread::spawn(move || watch(&child, &cancelled, &tx))
        });

        Ok(Self {
            child,
            cancelled,
            watcher,
        })
    }

    fn kill(mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(handle) = self.watcher.take() {
            let _ = handle.join();
        }
        if let Ok(mut child) = self.child.lock() {
            if matches!(child.try_wait(), Ok(None)) {
                let _ = child.kill();
            }
            let _ = child.wait();
        }
    }
}

/// Send [`ReviewEvent::Finished`] once the viewer exits on its own.
fn watch(child: &Mutex<Child>, cancelled: &AtomicBool, events: &Sender<ReviewEvent>) {
    while !cancelled.load(Ordering::SeqCst) {
        let exited = match child.lock() {
            Ok(mut child) => !matches!(child.try_wait(), Ok(None)),
            Err(_) => true,
        };
        if exited {
            let _ = events.send(ReviewEvent::Finished);
            return;
        }
        thread::sleep(POLL_TIMEOUT);
    }
}

/// Prints items to stdout and optionally opens them in an external viewer.
pub struct TerminalSurface {
    viewer: Option<Vec<String>>,
    events: Option<Sender<ReviewEvent>>,
    current: Option<ViewerProcess>,
}

impl TerminalSurface {
    /// `viewer` is a command line split on whitespace; the item path is
    /// appended as the last argument.
    #[must_use]
    pub fn new(viewer: Option<&str>) -> Self {
        let viewer = viewer
            .map(|cmd| cmd.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .filter(|argv| !argv.is_empty());
        Self {
            viewer,
            events: None,
            current: None,
        }
    }

    /// Report viewer exits as [`ReviewEvent::Finished`] on `events`.
    #[must_use]
    pub fn with_events(mut self, events: Sender<ReviewEvent>) -> Self {
        self.events = Some(events);
        self
    }

    fn print_line(line: &str) {
        // Raw mode needs an explicit carriage return.
        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "{line}\r\n");
        let _ = stdout.flush();
    }

    fn close_viewer(&mut self) {
        if let Some(process) = self.current.take() {
            process.kill();
        }
    }
}

impl PlaybackSurface for TerminalSurface {
    fn show(&mut self, path: &Path, position: usize, total: usize) -> Result<(), SurfaceError> {
        self.close_viewer();
        Self::print_line(&format!(
            "{} {}",
            format!("[{position}/{total}]").bold(),
            path.display()
        ));
        if let Some(argv) = &self.viewer {
            self.current = Some(ViewerProcess::spawn(argv, path, self.events.clone())?);
        }
        Ok(())
    }

    fn notify(&mut self, message: &str) {
        Self::print_line(message);
    }

    fn stop(&mut self) {
        self.close_viewer();
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        self.close_viewer();
    }
}

/// Background reader turning key presses into session events.
///
/// Enables raw mode on spawn and restores the terminal when dropped.
pub struct KeyReader {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl KeyReader {
    /// Start reading keys on a background thread.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Io`] if the terminal cannot enter raw mode
    /// (for example when stdin is not a terminal).
    pub fn spawn(keymap: KeyMap, events: Sender<ReviewEvent>) -> Result<Self, SurfaceError> {
        terminal::enable_raw_mode()?;
        logging::set_raw_terminal(true);

        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            let _ = terminal::disable_raw_mode();
            logging::set_raw_terminal(false);
            original_hook(panic_info);
        }));

        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::spawn(move || read_keys(&keymap, &events, &flag));

        log::debug!("Key reader started");
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }
}

fn read_keys(keymap: &KeyMap, events: &Sender<ReviewEvent>, stop: &AtomicBool) {
    while !stop.load(Ordering::SeqCst) {
        match event::poll(POLL_TIMEOUT) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) => {
                    if let Some(review_event) = keymap.resolve(&key) {
                        if events.send(review_event).is_err() {
                            return;
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!("Failed to read key: {e}");
                    let _ = events.send(ReviewEvent::Quit);
                    return;
                }
            },
            Ok(false) => {}
            Err(e) => {
                log::warn!("Failed to poll terminal: {e}");
                let _ = events.send(ReviewEvent::Quit);
                return;
            }
        }
    }
}

impl Drop for KeyReader {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        let _ = terminal::disable_raw_mode();
        logging::set_raw_terminal(false);
        // Restore the default panic hook
        let _ = panic::take_hook();
        log::debug!("Key reader stopped");
    }
}
