//! Terminal core
//!
//! Platform-independent terminal state: the screen model with primary
//! and alternate buffers, cells and their attributes, cursor state,
//! character set mapping, the color palette, scrollback with selection,
//! and deterministic snapshot generation.
//!
//! The core is fully deterministic: the same sequence of actions always
//! produces the same state.

mod cell;
mod charset;
mod cursor;
mod palette;
mod screen;
mod scrollback;
mod selection;
mod snapshot;

pub use cell::{Cell, CellFlags, Color};
pub use charset::{Charset, CharsetState};
pub use cursor::{Cursor, CursorShape, SavedCursor};
pub use palette::{standard_color, Palette, Rgb};
pub use screen::{Modes, MouseEncoding, MouseMode, Screen};
pub use scrollback::{Line, Scrollback};
pub use selection::{Selection, SelectionKind, SelectionMode, SelectionPoint};
pub use snapshot::{
    CellSnapshot, ColorSnapshot, CursorSnapshot, ModesSnapshot, Snapshot, StyleSnapshot,
};
