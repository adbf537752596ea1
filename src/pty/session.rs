//! A running terminal session: one `Terminal` behind a mutex, fed by a
//! background thread reading the PTY master.
//!
//! The reader holds the lock per chunk only; hosts lock it to render or
//! to encode input. Query replies the executor queues up are written
//! back to the child outside the lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use nix::sys::signal::Signal;

use super::{CommandConfig, Pty, PtyError, PtyResult, WindowSize};
use crate::core::Snapshot;
use crate::Terminal;

const POLL_INTERVAL_MS: i32 = 50;
const READ_CHUNK: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Unstarted,
    Running,
    Terminated,
}

/// Owns the terminal, the PTY and the reader thread.
///
/// Dropping a session shuts it down: flag, hangup, join, reap.
#[derive(Debug)]
pub struct Session {
    terminal: Arc<Mutex<Terminal>>,
    pty: Option<Arc<Pty>>,
    reader: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    status: Arc<Mutex<SessionStatus>>,
}

impl Session {
    pub fn new(terminal: Terminal) -> Self {
        Self {
            terminal: Arc::new(Mutex::new(terminal)),
            pty: None,
            reader: None,
            shutdown: Arc::new(AtomicBool::new(false)),
            status: Arc::new(Mutex::new(SessionStatus::Unstarted)),
        }
    }

    /// Shared handle to the terminal, for rendering and input encoding.
    pub fn terminal(&self) -> Arc<Mutex<Terminal>> {
        Arc::clone(&self.terminal)
    }

    pub fn status(&self) -> SessionStatus {
        *lock(&self.status)
    }

    /// Start the user's shell.
    pub fn start(&mut self) -> PtyResult<()> {
        self.start_with(CommandConfig::shell())
    }

    /// Spawn `config` on a PTY sized from the terminal and begin
    /// pumping its output. Fails without side effects; the session
    /// stays `Unstarted` if the spawn does not succeed.
    pub fn start_with(&mut self, config: CommandConfig) -> PtyResult<()> {
        if self.pty.is_some() {
            return Err(PtyError::AlreadyStarted);
        }

        let size = {
            let term = lock(&self.terminal);
            WindowSize::new(
                clamp_dimension(term.screen().cols()),
                clamp_dimension(term.screen().rows()),
            )
        };
        let pty = Arc::new(Pty::spawn(&config, size)?);

        self.shutdown.store(false, Ordering::Relaxed);
        *lock(&self.status) = SessionStatus::Running;

        let reader = {
            let terminal = Arc::clone(&self.terminal);
            let pty = Arc::clone(&pty);
            let shutdown = Arc::clone(&self.shutdown);
            let status = Arc::clone(&self.status);
            std::thread::spawn(move || reader_loop(terminal, pty, shutdown, status))
        };

        self.pty = Some(pty);
        self.reader = Some(reader);
        Ok(())
    }

    /// Forward input bytes to the child, best effort.
    pub fn write(&self, bytes: &[u8]) {
        let Some(pty) = &self.pty else {
            tracing::warn!("write on a session that is not running");
            return;
        };
        if let Err(err) = pty.write_all(bytes) {
            tracing::warn!("pty write failed: {err}");
        }
    }

    /// Paste text, bracketed when the application asked for it.
    pub fn paste(&self, text: &str) {
        let bytes = lock(&self.terminal).paste_bytes(text.as_bytes());
        self.write(&bytes);
    }

    /// Resize screen and kernel window size together. Unchanged
    /// dimensions do nothing.
    pub fn resize(&self, cols: usize, rows: usize) -> PtyResult<()> {
        let changed = lock(&self.terminal).resize(cols, rows);
        if !changed {
            return Ok(());
        }
        if let Some(pty) = &self.pty {
            pty.resize(WindowSize::new(
                clamp_dimension(cols),
                clamp_dimension(rows),
            ))?;
        }
        tracing::info!("session resized to {}x{}", cols, rows);
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        lock(&self.terminal).snapshot()
    }

    /// Stop the reader and reap the child. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(pty) = &self.pty {
            pty.signal(Signal::SIGHUP);
        }
        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() {
                tracing::warn!("reader thread panicked");
            }
        }
        if self.pty.take().is_some() {
            *lock(&self.status) = SessionStatus::Terminated;
            tracing::info!("session shut down");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn reader_loop(
    terminal: Arc<Mutex<Terminal>>,
    pty: Arc<Pty>,
    shutdown: Arc<AtomicBool>,
    status: Arc<Mutex<SessionStatus>>,
) {
    let mut buf = [0u8; READ_CHUNK];
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        let readable = match pty.poll_read(POLL_INTERVAL_MS) {
            Ok(readable) => readable,
            Err(err) => {
                tracing::warn!("pty poll failed: {err}");
                break;
            }
        };
        if !readable {
            continue;
        }
        let n = match pty.read(&mut buf) {
            // Zero bytes after a readable poll means the child is gone.
            Ok(0) => {
                tracing::info!("child closed the pty");
                break;
            }
            Ok(n) => n,
            Err(err) => {
                tracing::warn!("pty read failed: {err}");
                break;
            }
        };
        let responses = {
            let mut term = lock(&terminal);
            term.process(&buf[..n]);
            term.take_responses()
        };
        if !responses.is_empty() {
            if let Err(err) = pty.write_all(&responses) {
                tracing::warn!("failed to write query replies: {err}");
            }
        }
    }
    *lock(&status) = SessionStatus::Terminated;
}

/// A poisoned lock still guards a renderable screen; keep going.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn clamp_dimension(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}
