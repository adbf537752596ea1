//! Cursor state
//!
//! Position plus the rendition applied to newly printed cells. Motion and
//! clamping live on the screen, which knows the grid bounds and scroll
//! region; the cursor is plain data.

use super::cell::{Cell, CellFlags, Color};
use super::charset::CharsetState;

/// Cursor shape as selected by DECSCUSR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorShape {
    #[default]
    Block,
    Underline,
    Bar,
}

/// The active cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    /// Column position (0-indexed).
    pub col: usize,
    /// Row position (0-indexed, absolute even under origin mode).
    pub row: usize,
    /// Attribute flags applied to printed cells.
    pub flags: CellFlags,
    pub fg: Color,
    pub bg: Color,
    /// Designated character sets and the active shift.
    pub charsets: CharsetState,
    /// Set when a print filled the last column; the next print wraps
    /// first. Cleared by any explicit motion.
    pub pending_wrap: bool,
    pub shape: CursorShape,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            col: 0,
            row: 0,
            flags: CellFlags::empty(),
            fg: Color::Default,
            bg: Color::Default,
            charsets: CharsetState::default(),
            pending_wrap: false,
            shape: CursorShape::Block,
        }
    }
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the rendition only (SGR 0).
    pub fn reset_sgr(&mut self) {
        self.flags &= !CellFlags::SGR_MASK;
        self.fg = Color::Default;
        self.bg = Color::Default;
    }

    /// A blank cell carrying the cursor's colors, used to fill erased and
    /// scrolled-in regions.
    pub fn template(&self) -> Cell {
        Cell::blank(self.fg, self.bg)
    }
}

/// State captured by DECSC and restored by DECRC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedCursor {
    pub col: usize,
    pub row: usize,
    pub flags: CellFlags,
    pub fg: Color,
    pub bg: Color,
    pub charsets: CharsetState,
    pub origin_mode: bool,
    pub pending_wrap: bool,
}
