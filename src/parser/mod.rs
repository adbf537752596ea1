//! Terminal escape sequence parser
//!
//! A stateful parser that converts bytes into terminal actions, resilient
//! to arbitrary chunk boundaries and malformed input.

mod action;
mod state;

pub use action::{Action, CsiParams};
pub use state::Parser;
