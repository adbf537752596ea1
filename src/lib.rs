//! Terminal emulation core: VT100/xterm byte stream in, screen state out.
//!
//! - `codec`: incremental UTF-8 decoding
//! - `parser`: escape-sequence state machine producing `Action`s
//! - `core`: screen model (grids, cursor, palette, scrollback, selection)
//! - `terminal`: the executor tying parser and screen together
//! - `pty`: Unix PTY spawn plus the background reader session
//! - `input`: key/mouse/paste encoding helpers for hosts
//!
//! There is no rendering here. Hosts take `Snapshot`s (or read the
//! screen directly under the session lock) and draw however they like.

pub mod codec;
pub mod core;
pub mod input;
pub mod parser;
pub mod pty;

mod terminal;

pub use terminal::Terminal;
