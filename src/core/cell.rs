//! Terminal cell
//!
//! A single grid position: one Unicode scalar plus attribute flags and
//! colors. Wide characters occupy two cells, the second marked
//! `WIDE_DUMMY` and skipped when extracting text.

use bitflags::bitflags;

bitflags! {
    /// Per-cell rendition and bookkeeping flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CellFlags: u16 {
        const BOLD       = 1 << 0;
        const FAINT      = 1 << 1;
        const ITALIC     = 1 << 2;
        const UNDERLINE  = 1 << 3;
        const BLINK      = 1 << 4;
        const INVERSE    = 1 << 5;
        const HIDDEN     = 1 << 6;
        const STRIKE     = 1 << 7;
        /// First cell of a double-width character.
        const WIDE       = 1 << 8;
        /// Second cell of a double-width character.
        const WIDE_DUMMY = 1 << 9;
        /// Set on the last cell of a row when the next row continues it.
        const WRAP       = 1 << 10;
    }
}

impl CellFlags {
    /// Flags that carry over from the cursor's rendition when printing.
    /// WIDE/WIDE_DUMMY/WRAP are positional, never part of the SGR state.
    pub const SGR_MASK: CellFlags = CellFlags::BOLD
        .union(CellFlags::FAINT)
        .union(CellFlags::ITALIC)
        .union(CellFlags::UNDERLINE)
        .union(CellFlags::BLINK)
        .union(CellFlags::INVERSE)
        .union(CellFlags::HIDDEN)
        .union(CellFlags::STRIKE);
}

/// Color of a cell's foreground or background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    /// The terminal's default foreground or background.
    #[default]
    Default,
    /// Palette index: 0-7 standard, 8-15 bright, 16-255 extended.
    Indexed(u8),
    /// Direct 24-bit color.
    Rgb(u8, u8, u8),
}

/// A single cell in the terminal grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub flags: CellFlags,
    pub fg: Color,
    pub bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            flags: CellFlags::empty(),
            fg: Color::Default,
            bg: Color::Default,
        }
    }
}

impl Cell {
    /// A blank cell carrying the given colors, used by erase operations
    /// so cleared regions keep the current background.
    pub fn blank(fg: Color, bg: Color) -> Self {
        Self {
            ch: ' ',
            flags: CellFlags::empty(),
            fg,
            bg,
        }
    }

    /// True for the placeholder half of a wide character.
    pub fn is_wide_dummy(&self) -> bool {
        self.flags.contains(CellFlags::WIDE_DUMMY)
    }

    /// True when the cell holds a space with no visible attributes.
    pub fn is_blank(&self) -> bool {
        self.ch == ' ' && !self.flags.intersects(CellFlags::WIDE | CellFlags::WIDE_DUMMY)
    }
}
