//! Unix PTY: master setup, child spawn, and I/O on the master side.

use std::convert::Infallible;
use std::ffi::CString;
use std::os::fd::BorrowedFd;
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::OnceLock;
use std::time::Duration;

use nix::errno::Errno;
use nix::fcntl::{fcntl, open, FcntlArg, OFlag};
use nix::libc;
use nix::poll::{poll, PollFd, PollFlags};
use nix::pty::{grantpt, posix_openpt, ptsname, unlockpt, PtyMaster};
use nix::sys::signal::{self, kill, SigHandler, Signal};
use nix::sys::stat::Mode;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{close, dup2, execvp, fork, read, setsid, write, ForkResult, Pid};

use super::{CommandConfig, PtyError, PtyResult, WindowSize};

/// A pseudo-terminal master with its child process.
///
/// Dropping a `Pty` hangs up the child and reaps it.
pub struct Pty {
    master: PtyMaster,
    child: Pid,
    /// Exit code, recorded the first time the child is reaped.
    status: OnceLock<i32>,
}

impl Pty {
    /// Open a PTY pair, fork, and exec `config` on the slave side.
    ///
    /// The master is left non-blocking. Errors before the fork leave no
    /// descriptor behind; errors in the child make it exit with 1.
    pub fn spawn(config: &CommandConfig, size: WindowSize) -> PtyResult<Self> {
        // Fail on bad command strings before any resource is allocated.
        let (program, argv) = build_argv(config)?;

        let master = posix_openpt(OFlag::O_RDWR | OFlag::O_NOCTTY).map_err(PtyError::OpenMaster)?;
        grantpt(&master).map_err(PtyError::Grant)?;
        unlockpt(&master).map_err(PtyError::Unlock)?;

        // SAFETY: no other thread is resolving pty names here; the result
        // is copied to an owned String before anything else runs.
        let slave_path = unsafe { ptsname(&master) }.map_err(PtyError::PtsName)?;

        set_window_size(master.as_raw_fd(), size)?;

        // SAFETY: the child branch only sets up descriptors and execs.
        match unsafe { fork() }.map_err(PtyError::Fork)? {
            ForkResult::Child => {
                drop(master);
                let _ = setup_child(&slave_path, &program, &argv, config);
                // Reachable only when some setup step or exec failed.
                std::process::exit(1);
            }
            ForkResult::Parent { child } => {
                let flags = fcntl(master.as_raw_fd(), FcntlArg::F_GETFL)
                    .map_err(PtyError::SetNonBlocking)?;
                let flags = OFlag::from_bits_truncate(flags) | OFlag::O_NONBLOCK;
                fcntl(master.as_raw_fd(), FcntlArg::F_SETFL(flags))
                    .map_err(PtyError::SetNonBlocking)?;

                tracing::info!(
                    "spawned {} (pid {}) on {}",
                    config.program,
                    child,
                    slave_path
                );
                Ok(Self {
                    master,
                    child,
                    status: OnceLock::new(),
                })
            }
        }
    }

    pub fn master_fd(&self) -> RawFd {
        self.master.as_raw_fd()
    }

    pub fn child_pid(&self) -> Pid {
        self.child
    }

    /// Non-blocking read; no pending data reads as `Ok(0)`.
    pub fn read(&self, buf: &mut [u8]) -> PtyResult<usize> {
        match read(self.master.as_raw_fd(), buf) {
            Ok(n) => Ok(n),
            Err(Errno::EAGAIN) => Ok(0),
            Err(err) => Err(PtyError::Read(err)),
        }
    }

    /// Non-blocking write; a full kernel buffer writes `Ok(0)`.
    pub fn write(&self, data: &[u8]) -> PtyResult<usize> {
        // SAFETY: the master stays open for the life of self.
        let fd = unsafe { BorrowedFd::borrow_raw(self.master.as_raw_fd()) };
        match write(fd.as_raw_fd(), data) {
            Ok(n) => Ok(n),
            Err(Errno::EAGAIN) => Ok(0),
            Err(err) => Err(PtyError::Write(err)),
        }
    }

    /// Write everything, yielding whenever the kernel buffer is full.
    pub fn write_all(&self, mut data: &[u8]) -> PtyResult<()> {
        while !data.is_empty() {
            match self.write(data)? {
                0 => std::thread::yield_now(),
                n => data = &data[n..],
            }
        }
        Ok(())
    }

    /// Wait up to `timeout_ms` for the master to become readable.
    ///
    /// Hangup counts as readable so the caller's next `read` observes
    /// EOF instead of blocking on a dead child.
    pub fn poll_read(&self, timeout_ms: i32) -> PtyResult<bool> {
        // SAFETY: the master stays open for the life of self.
        let fd = unsafe { BorrowedFd::borrow_raw(self.master.as_raw_fd()) };
        let mut fds = [PollFd::new(&fd, PollFlags::POLLIN)];
        match poll(&mut fds, timeout_ms) {
            Ok(0) => Ok(false),
            Ok(_) => {
                let revents = fds[0].revents().unwrap_or(PollFlags::empty());
                Ok(revents.intersects(PollFlags::POLLIN | PollFlags::POLLHUP))
            }
            Err(Errno::EINTR) => Ok(false),
            Err(err) => Err(PtyError::Poll(err)),
        }
    }

    /// Push a new window size to the kernel and notify the child.
    pub fn resize(&self, size: WindowSize) -> PtyResult<()> {
        let ws: libc::winsize = size.into();
        // SAFETY: TIOCSWINSZ with a valid winsize on an open master.
        if unsafe { libc::ioctl(self.master.as_raw_fd(), libc::TIOCSWINSZ, &ws) } < 0 {
            return Err(PtyError::Resize(Errno::last()));
        }
        self.signal(Signal::SIGWINCH);
        Ok(())
    }

    /// Current kernel-side window size.
    pub fn window_size(&self) -> PtyResult<WindowSize> {
        let mut ws = libc::winsize {
            ws_row: 0,
            ws_col: 0,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        // SAFETY: TIOCGWINSZ writes into the winsize we own.
        if unsafe { libc::ioctl(self.master.as_raw_fd(), libc::TIOCGWINSZ, &mut ws) } < 0 {
            return Err(PtyError::GetWinsize(Errno::last()));
        }
        Ok(WindowSize {
            rows: ws.ws_row,
            cols: ws.ws_col,
            pixel_width: ws.ws_xpixel,
            pixel_height: ws.ws_ypixel,
        })
    }

    /// Send a signal to the child, best effort. A child that already
    /// exited is not worth reporting.
    pub fn signal(&self, signal: Signal) {
        if let Err(err) = kill(self.child, signal) {
            if err != Errno::ESRCH {
                tracing::warn!("failed to signal child {}: {}", self.child, err);
            }
        }
    }

    /// Reap the child if it has exited. `None` means still running.
    pub fn try_wait(&self) -> PtyResult<Option<i32>> {
        if let Some(&code) = self.status.get() {
            return Ok(Some(code));
        }
        match waitpid(self.child, Some(WaitPidFlag::WNOHANG)).map_err(PtyError::Wait)? {
            WaitStatus::StillAlive => Ok(None),
            WaitStatus::Exited(_, code) => {
                let _ = self.status.set(code);
                Ok(Some(code))
            }
            WaitStatus::Signaled(_, sig, _) => {
                let code = 128 + sig as i32;
                let _ = self.status.set(code);
                Ok(Some(code))
            }
            _ => Ok(None),
        }
    }

    /// Block until the child exits and return its exit code
    /// (128 + signal number for a signaled child).
    pub fn wait(&self) -> PtyResult<i32> {
        if let Some(&code) = self.status.get() {
            return Ok(code);
        }
        loop {
            match waitpid(self.child, None).map_err(PtyError::Wait)? {
                WaitStatus::Exited(_, code) => {
                    let _ = self.status.set(code);
                    return Ok(code);
                }
                WaitStatus::Signaled(_, sig, _) => {
                    let code = 128 + sig as i32;
                    let _ = self.status.set(code);
                    return Ok(code);
                }
                _ => continue,
            }
        }
    }

    pub fn is_alive(&self) -> bool {
        matches!(self.try_wait(), Ok(None))
    }
}

impl Drop for Pty {
    fn drop(&mut self) {
        if self.status.get().is_some() {
            return;
        }
        self.signal(Signal::SIGHUP);
        for _ in 0..10 {
            match self.try_wait() {
                Ok(None) => std::thread::sleep(Duration::from_millis(10)),
                _ => return,
            }
        }
        self.signal(Signal::SIGKILL);
        let _ = waitpid(self.child, None);
    }
}

impl std::fmt::Debug for Pty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pty")
            .field("master_fd", &self.master.as_raw_fd())
            .field("child", &self.child)
            .finish()
    }
}

/// Convert the configured command into exec-ready strings, applying the
/// login-shell argv[0] convention.
fn build_argv(config: &CommandConfig) -> PtyResult<(CString, Vec<CString>)> {
    let program = CString::new(config.program.as_str())
        .map_err(|_| PtyError::BadCommand(format!("NUL byte in program {:?}", config.program)))?;

    let argv0 = if config.login_shell {
        let name = config
            .program
            .rsplit('/')
            .next()
            .unwrap_or(config.program.as_str());
        format!("-{name}")
    } else {
        config.program.clone()
    };

    let mut argv = Vec::with_capacity(config.args.len() + 1);
    argv.push(
        CString::new(argv0)
            .map_err(|_| PtyError::BadCommand("NUL byte in argv[0]".to_string()))?,
    );
    for arg in &config.args {
        argv.push(
            CString::new(arg.as_str())
                .map_err(|_| PtyError::BadCommand(format!("NUL byte in argument {arg:?}")))?,
        );
    }
    Ok((program, argv))
}

/// Runs in the forked child: acquire the slave as the controlling
/// terminal, wire stdio, clean the signal table, exec. Never returns on
/// success; the caller exits on error.
fn setup_child(
    slave_path: &str,
    program: &CString,
    argv: &[CString],
    config: &CommandConfig,
) -> PtyResult<Infallible> {
    setsid().map_err(PtyError::Setsid)?;

    let slave = open(slave_path, OFlag::O_RDWR, Mode::empty()).map_err(PtyError::OpenSlave)?;

    // SAFETY: the fresh session leader claims its terminal.
    if unsafe { libc::ioctl(slave, libc::TIOCSCTTY as _, 0) } < 0 {
        return Err(PtyError::SetControllingTerminal(Errno::last()));
    }

    dup2(slave, libc::STDIN_FILENO).map_err(PtyError::Dup2)?;
    dup2(slave, libc::STDOUT_FILENO).map_err(PtyError::Dup2)?;
    dup2(slave, libc::STDERR_FILENO).map_err(PtyError::Dup2)?;
    if slave > libc::STDERR_FILENO {
        let _ = close(slave);
    }

    // Undo any dispositions inherited from the embedding process.
    for sig in [
        Signal::SIGCHLD,
        Signal::SIGHUP,
        Signal::SIGINT,
        Signal::SIGQUIT,
        Signal::SIGTERM,
        Signal::SIGALRM,
    ] {
        // SAFETY: restoring the default disposition.
        let _ = unsafe { signal::signal(sig, SigHandler::SigDfl) };
    }

    for (key, value) in &config.env {
        std::env::set_var(key, value);
    }
    std::env::set_var("TERM", &config.term);
    std::env::set_var("COLORTERM", "truecolor");

    match execvp(program, argv).map_err(PtyError::Exec)? {}
}

/// Set the window size during spawn, before the child exists.
fn set_window_size(fd: RawFd, size: WindowSize) -> PtyResult<()> {
    let ws: libc::winsize = size.into();
    // SAFETY: TIOCSWINSZ with a valid winsize.
    if unsafe { libc::ioctl(fd, libc::TIOCSWINSZ, &ws) } < 0 {
        return Err(PtyError::SetWinsize(Errno::last()));
    }
    Ok(())
}
