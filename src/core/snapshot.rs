//! Deterministic snapshot generation
//!
//! Snapshots capture terminal state in a serializable form for testing,
//! debugging and headless hosts. Given the same byte stream, the
//! terminal must produce identical snapshots. The grid is captured as
//! currently displayed, so a view scrolled into history snapshots the
//! history rows.

use serde::{Deserialize, Serialize};

use super::cell::{Cell, CellFlags, Color};
use super::cursor::CursorShape;
use super::screen::{Modes, MouseEncoding, MouseMode, Screen};

/// A complete snapshot of the terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Screen dimensions.
    pub cols: usize,
    pub rows: usize,
    /// Displayed content (row-major, viewport order).
    pub grid: Vec<Vec<CellSnapshot>>,
    /// Cursor state.
    pub cursor: CursorSnapshot,
    /// Scroll region.
    pub scroll_top: usize,
    pub scroll_bottom: usize,
    /// Terminal modes.
    pub modes: ModesSnapshot,
    /// Window title.
    pub title: String,
    /// Whether the alternate screen is active.
    pub alternate_screen: bool,
    /// Scrollback line count.
    pub scrollback_lines: usize,
    /// How far the view is scrolled into history.
    pub display_offset: usize,
    /// Rows touched since the dirty flags were last cleared.
    pub dirty: Vec<bool>,
}

/// Snapshot of a single cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSnapshot {
    /// Character content.
    pub ch: char,
    /// Foreground color.
    pub fg: ColorSnapshot,
    /// Background color.
    pub bg: ColorSnapshot,
    /// Style attributes.
    pub style: StyleSnapshot,
    /// Cell width (0 for the trailing half of a wide pair, 1, or 2).
    pub width: u8,
}

/// Snapshot of a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ColorSnapshot {
    Default,
    Indexed { index: u8 },
    Rgb { r: u8, g: u8, b: u8 },
}

/// Snapshot of style attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StyleSnapshot {
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub faint: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub blink: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub inverse: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strikethrough: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Snapshot of cursor state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorSnapshot {
    pub col: usize,
    pub row: usize,
    pub visible: bool,
    pub shape: String,
    pub blinking: bool,
}

/// Snapshot of terminal modes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModesSnapshot {
    #[serde(default, skip_serializing_if = "is_false")]
    pub application_cursor: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub application_keypad: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub origin: bool,
    pub autowrap: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub insert: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub linefeed_mode: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub reverse_video: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub bracketed_paste: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub focus_reporting: bool,
    pub mouse_tracking: String,
    pub mouse_encoding: String,
}

impl From<&Color> for ColorSnapshot {
    fn from(color: &Color) -> Self {
        match color {
            Color::Default => ColorSnapshot::Default,
            Color::Indexed(i) => ColorSnapshot::Indexed { index: *i },
            Color::Rgb(r, g, b) => ColorSnapshot::Rgb {
                r: *r,
                g: *g,
                b: *b,
            },
        }
    }
}

impl From<CellFlags> for StyleSnapshot {
    fn from(flags: CellFlags) -> Self {
        StyleSnapshot {
            bold: flags.contains(CellFlags::BOLD),
            faint: flags.contains(CellFlags::FAINT),
            italic: flags.contains(CellFlags::ITALIC),
            underline: flags.contains(CellFlags::UNDERLINE),
            blink: flags.contains(CellFlags::BLINK),
            inverse: flags.contains(CellFlags::INVERSE),
            hidden: flags.contains(CellFlags::HIDDEN),
            strikethrough: flags.contains(CellFlags::STRIKE),
        }
    }
}

impl From<&Cell> for CellSnapshot {
    fn from(cell: &Cell) -> Self {
        let width = if cell.flags.contains(CellFlags::WIDE_DUMMY) {
            0
        } else if cell.flags.contains(CellFlags::WIDE) {
            2
        } else {
            1
        };
        CellSnapshot {
            ch: cell.ch,
            fg: ColorSnapshot::from(&cell.fg),
            bg: ColorSnapshot::from(&cell.bg),
            style: StyleSnapshot::from(cell.flags),
            width,
        }
    }
}

impl From<&Modes> for ModesSnapshot {
    fn from(modes: &Modes) -> Self {
        ModesSnapshot {
            application_cursor: modes.cursor_keys_application,
            application_keypad: modes.keypad_application,
            origin: modes.origin,
            autowrap: modes.autowrap,
            insert: modes.insert,
            linefeed_mode: modes.newline,
            reverse_video: modes.reverse_video,
            bracketed_paste: modes.bracketed_paste,
            focus_reporting: modes.focus_reporting,
            mouse_tracking: match modes.mouse_mode {
                MouseMode::None => "none".to_string(),
                MouseMode::X10 => "x10".to_string(),
                MouseMode::Normal => "normal".to_string(),
                MouseMode::ButtonMotion => "button_motion".to_string(),
                MouseMode::AnyMotion => "any_motion".to_string(),
            },
            mouse_encoding: match modes.mouse_encoding {
                MouseEncoding::X10 => "x10".to_string(),
                MouseEncoding::Utf8 => "utf8".to_string(),
                MouseEncoding::Sgr => "sgr".to_string(),
                MouseEncoding::Urxvt => "urxvt".to_string(),
            },
        }
    }
}

impl Snapshot {
    /// Capture the current display. History lines shorter or longer than
    /// the present width are padded or truncated to the grid.
    pub fn from_screen(screen: &Screen) -> Self {
        let blank = Cell::default();
        let mut grid = Vec::with_capacity(screen.rows());
        for row in 0..screen.rows() {
            let line = screen.display_line(row);
            let mut row_cells = Vec::with_capacity(screen.cols());
            for col in 0..screen.cols() {
                let cell = line
                    .and_then(|line| line.cells.get(col))
                    .unwrap_or(&blank);
                row_cells.push(CellSnapshot::from(cell));
            }
            grid.push(row_cells);
        }

        let cursor = screen.cursor();
        let (scroll_top, scroll_bottom) = screen.scroll_region();
        Snapshot {
            cols: screen.cols(),
            rows: screen.rows(),
            grid,
            cursor: CursorSnapshot {
                col: cursor.col,
                row: cursor.row,
                visible: screen.modes.cursor_visible,
                shape: match cursor.shape {
                    CursorShape::Block => "block".to_string(),
                    CursorShape::Underline => "underline".to_string(),
                    CursorShape::Bar => "bar".to_string(),
                },
                blinking: screen.modes.cursor_blink,
            },
            scroll_top,
            scroll_bottom,
            modes: ModesSnapshot::from(&screen.modes),
            title: screen.title().to_string(),
            alternate_screen: screen.on_alternate(),
            scrollback_lines: screen.scrollback_len(),
            display_offset: screen.display_offset(),
            dirty: screen.dirty_rows().to_vec(),
        }
    }

    /// Convert the snapshot to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a snapshot from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Plain-text rendering of the display, one line per row with
    /// trailing blanks trimmed.
    pub fn to_text(&self) -> String {
        let mut result = String::new();
        for row in &self.grid {
            for cell in row {
                if cell.width == 0 {
                    continue;
                }
                result.push(cell.ch);
            }
            while result.ends_with(' ') {
                result.pop();
            }
            result.push('\n');
        }
        while result.ends_with("\n\n") {
            result.pop();
        }
        result
    }

    /// Compare displayed content, ignoring cursor and mode state.
    pub fn content_equals(&self, other: &Snapshot) -> bool {
        self.cols == other.cols && self.rows == other.rows && self.grid == other.grid
    }
}
