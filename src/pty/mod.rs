//! Pseudo-terminal plumbing.
//!
//! `Pty` owns the master side and the child process; `Session` adds the
//! background reader thread that pumps child output into a shared
//! `Terminal`. Unix only.

#[cfg(unix)]
mod session;
#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub use session::{Session, SessionStatus};
#[cfg(unix)]
pub use unix::Pty;

use thiserror::Error;

/// Everything that can go wrong while setting up or driving a PTY.
#[derive(Debug, Error)]
pub enum PtyError {
    #[error("failed to open PTY master: {0}")]
    OpenMaster(#[source] nix::Error),

    #[error("failed to grant PTY slave access: {0}")]
    Grant(#[source] nix::Error),

    #[error("failed to unlock PTY slave: {0}")]
    Unlock(#[source] nix::Error),

    #[error("failed to resolve PTY slave name: {0}")]
    PtsName(#[source] nix::Error),

    #[error("failed to open PTY slave: {0}")]
    OpenSlave(#[source] nix::Error),

    #[error("failed to fork child: {0}")]
    Fork(#[source] nix::Error),

    #[error("failed to create a new session: {0}")]
    Setsid(#[source] nix::Error),

    #[error("failed to set controlling terminal: {0}")]
    SetControllingTerminal(#[source] nix::Error),

    #[error("failed to duplicate descriptor onto stdio: {0}")]
    Dup2(#[source] nix::Error),

    #[error("failed to execute command: {0}")]
    Exec(#[source] nix::Error),

    #[error("failed to set window size: {0}")]
    SetWinsize(#[source] nix::Error),

    #[error("failed to read window size: {0}")]
    GetWinsize(#[source] nix::Error),

    #[error("failed to resize PTY: {0}")]
    Resize(#[source] nix::Error),

    #[error("failed to read from PTY master: {0}")]
    Read(#[source] nix::Error),

    #[error("failed to write to PTY master: {0}")]
    Write(#[source] nix::Error),

    #[error("failed to poll PTY master: {0}")]
    Poll(#[source] nix::Error),

    #[error("failed to wait for child: {0}")]
    Wait(#[source] nix::Error),

    #[error("failed to set non-blocking mode: {0}")]
    SetNonBlocking(#[source] nix::Error),

    #[error("invalid command: {0}")]
    BadCommand(String),

    #[error("session already started")]
    AlreadyStarted,

    #[error("session is not running")]
    NotRunning,
}

pub type PtyResult<T> = Result<T, PtyError>;

/// PTY window dimensions, in character cells and optional pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub rows: u16,
    pub cols: u16,
    pub pixel_width: u16,
    pub pixel_height: u16,
}

impl WindowSize {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            rows,
            cols,
            pixel_width: 0,
            pixel_height: 0,
        }
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

#[cfg(unix)]
impl From<WindowSize> for nix::libc::winsize {
    fn from(size: WindowSize) -> Self {
        nix::libc::winsize {
            ws_row: size.rows,
            ws_col: size.cols,
            ws_xpixel: size.pixel_width,
            ws_ypixel: size.pixel_height,
        }
    }
}

/// What to run on the slave side and how.
#[derive(Debug, Clone)]
pub struct CommandConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment variables for the child.
    pub env: Vec<(String, String)>,
    /// Prefix argv[0] with `-` so shells start as login shells.
    pub login_shell: bool,
    /// Value for `TERM` in the child.
    pub term: String,
}

impl CommandConfig {
    /// The user's shell from `$SHELL`, falling back to `/bin/sh`.
    pub fn shell() -> Self {
        let program = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
        Self {
            program,
            args: Vec::new(),
            env: Vec::new(),
            login_shell: true,
            term: "xterm-256color".to_string(),
        }
    }

    /// An explicit program with arguments, not a login shell.
    pub fn command(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
            env: Vec::new(),
            login_shell: false,
            term: "xterm-256color".to_string(),
        }
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self::shell()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_size_new() {
        let size = WindowSize::new(132, 43);
        assert_eq!(size.cols, 132);
        assert_eq!(size.rows, 43);
        assert_eq!(size.pixel_width, 0);
    }

    #[test]
    fn test_command_config_shell_fallback() {
        let config = CommandConfig::shell();
        assert!(!config.program.is_empty());
        assert!(config.login_shell);
        assert_eq!(config.term, "xterm-256color");
    }

    #[test]
    fn test_command_config_explicit() {
        let config = CommandConfig::command("/bin/echo", &["hi"]);
        assert_eq!(config.program, "/bin/echo");
        assert_eq!(config.args, vec!["hi".to_string()]);
        assert!(!config.login_shell);
    }
}
