//! Screen model
//!
//! The addressable grid and every mutation the escape-sequence executor
//! performs on it: printing, cursor motion, scrolling, erasing, line and
//! character editing, tab stops, modes, the scroll region and the
//! alternate buffer. Rows evicted off the top of the primary buffer land
//! in the scrollback ring; the display offset lets a host view history
//! without disturbing the live grid.

use std::mem;

use unicode_width::UnicodeWidthChar;

use crate::core::cell::{Cell, CellFlags, Color};
use crate::core::charset::CharsetState;
use crate::core::cursor::{Cursor, CursorShape, SavedCursor};
use crate::core::palette::Palette;
use crate::core::scrollback::{Line, Scrollback};
use crate::core::selection::{Selection, SelectionKind, SelectionPoint};

/// Mouse reporting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseMode {
    #[default]
    None,
    /// Button presses only (DECSET 9).
    X10,
    /// Presses and releases (DECSET 1000).
    Normal,
    /// Plus motion while a button is held (DECSET 1002).
    ButtonMotion,
    /// All motion (DECSET 1003).
    AnyMotion,
}

/// Encoding used for mouse reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseEncoding {
    /// Legacy single-byte coordinates, limited to column/row 223.
    #[default]
    X10,
    /// Coordinates as UTF-8 (DECSET 1005).
    Utf8,
    /// `CSI < b ; x ; y M/m` (DECSET 1006).
    Sgr,
    /// `CSI b ; x ; y M` with decimal fields (DECSET 1015).
    Urxvt,
}

/// Terminal modes toggled by SM/RM and their DEC private variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modes {
    /// DECCKM: cursor keys send SS3 sequences.
    pub cursor_keys_application: bool,
    /// DECKPAM/DECKPNM.
    pub keypad_application: bool,
    /// DECOM: cursor addressing is relative to the scroll region.
    pub origin: bool,
    /// DECAWM: printing past the last column wraps to the next row.
    pub autowrap: bool,
    /// IRM: printed characters push the rest of the row right.
    pub insert: bool,
    /// LNM: linefeed implies carriage return.
    pub newline: bool,
    /// DECCOLM: tracked for state queries only, no grid resize.
    pub column_132: bool,
    /// DECSCNM: reverse video, applied at render time.
    pub reverse_video: bool,
    /// DECTCEM.
    pub cursor_visible: bool,
    pub cursor_blink: bool,
    pub bracketed_paste: bool,
    pub focus_reporting: bool,
    pub mouse_mode: MouseMode,
    pub mouse_encoding: MouseEncoding,
}

impl Default for Modes {
    fn default() -> Self {
        Self {
            cursor_keys_application: false,
            keypad_application: false,
            origin: false,
            autowrap: true,
            insert: false,
            newline: false,
            column_132: false,
            reverse_video: false,
            cursor_visible: true,
            cursor_blink: false,
            bracketed_paste: false,
            focus_reporting: false,
            mouse_mode: MouseMode::None,
            mouse_encoding: MouseEncoding::X10,
        }
    }
}

/// The terminal screen: primary and alternate grids plus everything the
/// control sequences mutate.
#[derive(Debug, Clone)]
pub struct Screen {
    cols: usize,
    rows: usize,
    primary: Vec<Line>,
    alternate: Vec<Line>,
    on_alternate: bool,
    cursor: Cursor,
    primary_saved: Option<SavedCursor>,
    alternate_saved: Option<SavedCursor>,
    scroll_top: usize,
    /// Inclusive bottom row of the scroll region.
    scroll_bottom: usize,
    tab_stops: Vec<bool>,
    dirty: Vec<bool>,
    pub modes: Modes,
    palette: Palette,
    scrollback: Scrollback,
    /// How many history rows the view is shifted up from the live grid.
    display_offset: usize,
    selection: Selection,
    title: String,
    /// Last printed glyph, replayed by REP.
    last_char: Option<char>,
}

fn blank_grid(cols: usize, rows: usize) -> Vec<Line> {
    (0..rows).map(|_| Line::blank(cols)).collect()
}

fn default_tab_stops(cols: usize) -> Vec<bool> {
    let mut stops = vec![false; cols];
    for col in (8..cols).step_by(8) {
        stops[col] = true;
    }
    stops
}

/// Grow or shrink a grid in place, keeping the top-left intersection.
fn resize_grid(grid: &mut Vec<Line>, cols: usize, rows: usize) {
    for line in grid.iter_mut() {
        line.resize(cols, Cell::default());
    }
    while grid.len() < rows {
        grid.push(Line::blank(cols));
    }
    grid.truncate(rows);
}

impl Screen {
    pub fn new(cols: usize, rows: usize, scrollback_capacity: usize) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Self {
            cols,
            rows,
            primary: blank_grid(cols, rows),
            alternate: blank_grid(cols, rows),
            on_alternate: false,
            cursor: Cursor::new(),
            primary_saved: None,
            alternate_saved: None,
            scroll_top: 0,
            scroll_bottom: rows - 1,
            tab_stops: default_tab_stops(cols),
            dirty: vec![true; rows],
            modes: Modes::default(),
            palette: Palette::new(),
            scrollback: Scrollback::new(scrollback_capacity),
            display_offset: 0,
            selection: Selection::new(),
            title: String::new(),
            last_char: None,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    pub fn on_alternate(&self) -> bool {
        self.on_alternate
    }

    pub fn scroll_region(&self) -> (usize, usize) {
        (self.scroll_top, self.scroll_bottom)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: String) {
        self.title = title;
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn palette_mut(&mut self) -> &mut Palette {
        &mut self.palette
    }

    pub fn scrollback(&self) -> &Scrollback {
        &self.scrollback
    }

    pub fn scrollback_len(&self) -> usize {
        self.scrollback.len()
    }

    pub fn set_scrollback_capacity(&mut self, capacity: usize) {
        self.scrollback.set_capacity(capacity);
        self.display_offset = self.display_offset.min(self.scrollback.len());
    }

    pub fn display_offset(&self) -> usize {
        self.display_offset
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Row of the active grid.
    pub fn line(&self, row: usize) -> Option<&Line> {
        self.active_grid().get(row)
    }

    pub fn cell(&self, col: usize, row: usize) -> Option<&Cell> {
        self.active_grid().get(row)?.cells.get(col)
    }

    /// Row as currently displayed: history rows first when the view is
    /// scrolled back, then the live grid.
    pub fn display_line(&self, viewport_row: usize) -> Option<&Line> {
        if viewport_row >= self.rows {
            return None;
        }
        if viewport_row < self.display_offset {
            self.scrollback
                .get_from_end(self.display_offset - 1 - viewport_row)
        } else {
            self.active_grid().get(viewport_row - self.display_offset)
        }
    }

    pub fn dirty_rows(&self) -> &[bool] {
        &self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty.fill(false);
    }

    fn active_grid(&self) -> &Vec<Line> {
        if self.on_alternate {
            &self.alternate
        } else {
            &self.primary
        }
    }

    fn active_grid_mut(&mut self) -> &mut Vec<Line> {
        if self.on_alternate {
            &mut self.alternate
        } else {
            &mut self.primary
        }
    }

    fn mark_dirty(&mut self, row: usize) {
        if let Some(flag) = self.dirty.get_mut(row) {
            *flag = true;
        }
    }

    fn mark_all_dirty(&mut self) {
        self.dirty.fill(true);
    }

    fn mark_region_dirty(&mut self, top: usize, bottom: usize) {
        for row in top..=bottom.min(self.rows - 1) {
            self.dirty[row] = true;
        }
    }
}

// Printing.
impl Screen {
    /// Place a glyph at the cursor and advance it.
    pub fn print(&mut self, ch: char) {
        let ch = self.cursor.charsets.map(ch);
        let width = match UnicodeWidthChar::width(ch) {
            Some(w) if w > 0 => w,
            // Zero-width and control glyphs are dropped.
            _ => return,
        };
        self.last_char = Some(ch);

        if self.cursor.pending_wrap && self.modes.autowrap {
            self.wrap_line();
        }

        // A wide glyph with no room before the margin pads the rest of
        // the row and continues on the next one.
        if width == 2 && self.cursor.col + 1 >= self.cols {
            let spacer = self.cursor.template();
            let (col, row) = (self.cursor.col, self.cursor.row);
            self.put_cell(col, row, spacer);
            if !self.modes.autowrap {
                return;
            }
            self.wrap_line();
        }

        if self.modes.insert {
            self.insert_blanks(width);
        }

        let (col, row) = (self.cursor.col, self.cursor.row);
        let mut cell = Cell {
            ch,
            flags: self.cursor.flags & CellFlags::SGR_MASK,
            fg: self.cursor.fg,
            bg: self.cursor.bg,
        };
        if width == 2 {
            cell.flags |= CellFlags::WIDE;
            self.put_cell(col, row, cell);
            let mut dummy = self.cursor.template();
            dummy.flags |= CellFlags::WIDE_DUMMY;
            self.put_cell(col + 1, row, dummy);
        } else {
            self.put_cell(col, row, cell);
        }

        if col + width >= self.cols {
            self.cursor.col = self.cols - 1;
            self.cursor.pending_wrap = true;
        } else {
            self.cursor.col = col + width;
        }
    }

    /// REP: repeat the last printed glyph.
    pub fn repeat_last(&mut self, n: usize) {
        if let Some(ch) = self.last_char {
            for _ in 0..n.max(1) {
                self.print(ch);
            }
        }
    }

    /// Write one cell, clearing the orphaned half of any wide pair it
    /// overwrites.
    fn put_cell(&mut self, col: usize, row: usize, cell: Cell) {
        if col >= self.cols {
            return;
        }
        let cols = self.cols;
        let grid = self.active_grid_mut();
        let Some(line) = grid.get_mut(row) else {
            return;
        };
        let old = line.cells[col];
        if old.flags.contains(CellFlags::WIDE) && col + 1 < cols {
            line.cells[col + 1] = Cell::blank(old.fg, old.bg);
        }
        if old.flags.contains(CellFlags::WIDE_DUMMY) && col > 0 {
            let lead = line.cells[col - 1];
            line.cells[col - 1] = Cell::blank(lead.fg, lead.bg);
        }
        line.cells[col] = cell;
        self.mark_dirty(row);
    }

    /// Mark the current row as soft-wrapped and move to the start of the
    /// next one, scrolling at the region bottom.
    fn wrap_line(&mut self) {
        let row = self.cursor.row;
        if let Some(line) = self.active_grid_mut().get_mut(row) {
            line.set_wrapped(true);
        }
        self.mark_dirty(row);
        self.cursor.col = 0;
        self.cursor.pending_wrap = false;
        self.linefeed();
    }

    /// Shift the rest of the row right and blank `n` cells at the cursor.
    fn insert_blanks(&mut self, n: usize) {
        let (col, row) = (self.cursor.col, self.cursor.row);
        let n = n.min(self.cols - col);
        if n == 0 {
            return;
        }
        let template = self.cursor.template();
        let cols = self.cols;
        let grid = self.active_grid_mut();
        let Some(line) = grid.get_mut(row) else {
            return;
        };
        line.cells[col..].rotate_right(n);
        for cell in &mut line.cells[col..col + n] {
            *cell = template;
        }
        // The shift can split a wide pair at either boundary.
        if col > 0 && line.cells[col - 1].flags.contains(CellFlags::WIDE) {
            let lead = line.cells[col - 1];
            line.cells[col - 1] = Cell::blank(lead.fg, lead.bg);
        }
        if line.cells[cols - 1].flags.contains(CellFlags::WIDE) {
            let lead = line.cells[cols - 1];
            line.cells[cols - 1] = Cell::blank(lead.fg, lead.bg);
        }
        self.mark_dirty(row);
    }
}

// Cursor motion.
impl Screen {
    /// CUP/HVP. Coordinates are 0-based; origin mode maps the row into
    /// the scroll region.
    pub fn move_to(&mut self, row: usize, col: usize) {
        self.cursor.row = if self.modes.origin {
            (self.scroll_top + row).min(self.scroll_bottom)
        } else {
            row.min(self.rows - 1)
        };
        self.cursor.col = col.min(self.cols - 1);
        self.cursor.pending_wrap = false;
    }

    /// CUU: stops at the top margin when starting at or below it.
    pub fn move_up(&mut self, n: usize) {
        let limit = if self.cursor.row >= self.scroll_top {
            self.scroll_top
        } else {
            0
        };
        self.cursor.row = self.cursor.row.saturating_sub(n.max(1)).max(limit);
        self.cursor.pending_wrap = false;
    }

    /// CUD: stops at the bottom margin when starting at or above it.
    pub fn move_down(&mut self, n: usize) {
        let limit = if self.cursor.row <= self.scroll_bottom {
            self.scroll_bottom
        } else {
            self.rows - 1
        };
        self.cursor.row = (self.cursor.row + n.max(1)).min(limit);
        self.cursor.pending_wrap = false;
    }

    pub fn move_forward(&mut self, n: usize) {
        self.cursor.col = (self.cursor.col + n.max(1)).min(self.cols - 1);
        self.cursor.pending_wrap = false;
    }

    pub fn move_backward(&mut self, n: usize) {
        self.cursor.col = self.cursor.col.saturating_sub(n.max(1));
        self.cursor.pending_wrap = false;
    }

    /// CHA/HPA.
    pub fn move_to_col(&mut self, col: usize) {
        self.cursor.col = col.min(self.cols - 1);
        self.cursor.pending_wrap = false;
    }

    /// VPA.
    pub fn move_to_row(&mut self, row: usize) {
        self.cursor.row = if self.modes.origin {
            (self.scroll_top + row).min(self.scroll_bottom)
        } else {
            row.min(self.rows - 1)
        };
        self.cursor.pending_wrap = false;
    }

    pub fn carriage_return(&mut self) {
        self.cursor.col = 0;
        self.cursor.pending_wrap = false;
    }

    pub fn backspace(&mut self) {
        self.cursor.col = self.cursor.col.saturating_sub(1);
        self.cursor.pending_wrap = false;
    }

    /// LF/VT/FF and IND: down one row, scrolling at the region bottom.
    pub fn linefeed(&mut self) {
        if self.cursor.row == self.scroll_bottom {
            self.scroll_up(1);
        } else if self.cursor.row + 1 < self.rows {
            self.cursor.row += 1;
        }
        self.cursor.pending_wrap = false;
    }

    /// RI: up one row, scrolling down at the region top.
    pub fn reverse_index(&mut self) {
        if self.cursor.row == self.scroll_top {
            self.scroll_down(1);
        } else if self.cursor.row > 0 {
            self.cursor.row -= 1;
        }
        self.cursor.pending_wrap = false;
    }

    /// NEL.
    pub fn next_line(&mut self) {
        self.linefeed();
        self.cursor.col = 0;
    }

    /// DECSC. One slot per buffer.
    pub fn save_cursor(&mut self) {
        let saved = SavedCursor {
            col: self.cursor.col,
            row: self.cursor.row,
            flags: self.cursor.flags,
            fg: self.cursor.fg,
            bg: self.cursor.bg,
            charsets: self.cursor.charsets,
            origin_mode: self.modes.origin,
            pending_wrap: self.cursor.pending_wrap,
        };
        if self.on_alternate {
            self.alternate_saved = Some(saved);
        } else {
            self.primary_saved = Some(saved);
        }
    }

    /// DECRC. Without a prior save this homes the cursor with default
    /// rendition, matching xterm.
    pub fn restore_cursor(&mut self) {
        let saved = if self.on_alternate {
            self.alternate_saved.clone()
        } else {
            self.primary_saved.clone()
        };
        match saved {
            Some(saved) => {
                self.cursor.col = saved.col.min(self.cols - 1);
                self.cursor.row = saved.row.min(self.rows - 1);
                self.cursor.flags = saved.flags;
                self.cursor.fg = saved.fg;
                self.cursor.bg = saved.bg;
                self.cursor.charsets = saved.charsets;
                self.modes.origin = saved.origin_mode;
                self.cursor.pending_wrap = saved.pending_wrap && self.cursor.col == self.cols - 1;
            }
            None => {
                self.cursor.col = 0;
                self.cursor.row = 0;
                self.cursor.reset_sgr();
                self.cursor.charsets = CharsetState::default();
                self.cursor.pending_wrap = false;
                self.modes.origin = false;
            }
        }
    }
}

// Scrolling, line and character editing.
impl Screen {
    /// SU and the bottom-of-region linefeed. Rows leaving the top of the
    /// primary grid go to scrollback when the region starts at row 0.
    pub fn scroll_up(&mut self, n: usize) {
        let evict = !self.on_alternate && self.scroll_top == 0;
        self.rotate_up(self.scroll_top, self.scroll_bottom, n, evict);
    }

    /// SD: blank rows enter at the region top, the bottom rows drop.
    pub fn scroll_down(&mut self, n: usize) {
        self.rotate_down(self.scroll_top, self.scroll_bottom, n);
    }

    /// IL: only acts when the cursor is inside the scroll region.
    pub fn insert_lines(&mut self, n: usize) {
        let row = self.cursor.row;
        if row < self.scroll_top || row > self.scroll_bottom {
            return;
        }
        self.rotate_down(row, self.scroll_bottom, n);
    }

    /// DL: only acts when the cursor is inside the scroll region.
    /// Deleted rows are discarded, never pushed to scrollback.
    pub fn delete_lines(&mut self, n: usize) {
        let row = self.cursor.row;
        if row < self.scroll_top || row > self.scroll_bottom {
            return;
        }
        self.rotate_up(row, self.scroll_bottom, n, false);
    }

    fn rotate_up(&mut self, top: usize, bottom: usize, n: usize, evict: bool) {
        if top > bottom || bottom >= self.rows {
            return;
        }
        let height = bottom - top + 1;
        let n = n.max(1).min(height);
        let fill = Line::filled(self.cols, self.cursor.template());
        let grid = if self.on_alternate {
            &mut self.alternate
        } else {
            &mut self.primary
        };
        for i in top..top + n {
            let evicted = mem::replace(&mut grid[i], fill.clone());
            if evict {
                self.scrollback.push(evicted);
            }
        }
        grid[top..=bottom].rotate_left(n);
        if evict && self.display_offset > 0 {
            // Keep a scrolled-back view anchored on the same history rows.
            self.display_offset = (self.display_offset + n).min(self.scrollback.len());
        }
        self.mark_region_dirty(top, bottom);
    }

    fn rotate_down(&mut self, top: usize, bottom: usize, n: usize) {
        if top > bottom || bottom >= self.rows {
            return;
        }
        let height = bottom - top + 1;
        let n = n.max(1).min(height);
        let fill = Line::filled(self.cols, self.cursor.template());
        let grid = self.active_grid_mut();
        for i in bottom + 1 - n..=bottom {
            grid[i] = fill.clone();
        }
        grid[top..=bottom].rotate_right(n);
        self.mark_region_dirty(top, bottom);
    }

    /// ICH.
    pub fn insert_chars(&mut self, n: usize) {
        self.insert_blanks(n.max(1));
    }

    /// DCH: pull the rest of the row left, blanks enter at the margin.
    pub fn delete_chars(&mut self, n: usize) {
        let (col, row) = (self.cursor.col, self.cursor.row);
        let n = n.max(1).min(self.cols - col);
        let template = self.cursor.template();
        let cols = self.cols;
        let grid = self.active_grid_mut();
        let Some(line) = grid.get_mut(row) else {
            return;
        };
        line.cells[col..].rotate_left(n);
        for cell in &mut line.cells[cols - n..] {
            *cell = template;
        }
        if line.cells[col].flags.contains(CellFlags::WIDE_DUMMY) {
            let dummy = line.cells[col];
            line.cells[col] = Cell::blank(dummy.fg, dummy.bg);
        }
        if col > 0 && line.cells[col - 1].flags.contains(CellFlags::WIDE) {
            let lead = line.cells[col - 1];
            line.cells[col - 1] = Cell::blank(lead.fg, lead.bg);
        }
        self.mark_dirty(row);
    }
}

// Erasing. Cleared cells keep the cursor's current colors.
impl Screen {
    /// ED. Mode 3 also drops the scrollback.
    pub fn erase_in_display(&mut self, mode: u16) {
        match mode {
            0 => {
                self.erase_in_line(0);
                for row in self.cursor.row + 1..self.rows {
                    self.erase_cols(row, 0, self.cols - 1);
                }
            }
            1 => {
                for row in 0..self.cursor.row {
                    self.erase_cols(row, 0, self.cols - 1);
                }
                self.erase_in_line(1);
            }
            2 => {
                for row in 0..self.rows {
                    self.erase_cols(row, 0, self.cols - 1);
                }
            }
            3 => {
                for row in 0..self.rows {
                    self.erase_cols(row, 0, self.cols - 1);
                }
                self.scrollback.clear();
                self.display_offset = 0;
            }
            _ => {}
        }
    }

    /// EL.
    pub fn erase_in_line(&mut self, mode: u16) {
        let (col, row) = (self.cursor.col, self.cursor.row);
        match mode {
            0 => self.erase_cols(row, col, self.cols - 1),
            1 => self.erase_cols(row, 0, col),
            2 => self.erase_cols(row, 0, self.cols - 1),
            _ => {}
        }
    }

    /// ECH.
    pub fn erase_chars(&mut self, n: usize) {
        let (col, row) = (self.cursor.col, self.cursor.row);
        let end = (col + n.max(1) - 1).min(self.cols - 1);
        self.erase_cols(row, col, end);
    }

    /// Blank an inclusive column range, widening over split wide pairs.
    fn erase_cols(&mut self, row: usize, start: usize, end: usize) {
        let template = self.cursor.template();
        let cols = self.cols;
        let grid = self.active_grid_mut();
        let Some(line) = grid.get_mut(row) else {
            return;
        };
        let mut start = start.min(cols - 1);
        let mut end = end.min(cols - 1);
        if start > end {
            return;
        }
        if start > 0 && line.cells[start].flags.contains(CellFlags::WIDE_DUMMY) {
            start -= 1;
        }
        if end + 1 < cols && line.cells[end].flags.contains(CellFlags::WIDE) {
            end += 1;
        }
        for cell in &mut line.cells[start..=end] {
            *cell = template;
        }
        self.mark_dirty(row);
    }
}

// Tab stops.
impl Screen {
    /// HT/CHT: advance to the nth following stop, or the last column.
    pub fn tab_forward(&mut self, n: usize) {
        for _ in 0..n.max(1) {
            if self.cursor.col + 1 >= self.cols {
                break;
            }
            let mut col = self.cursor.col + 1;
            while col < self.cols - 1 && !self.tab_stops[col] {
                col += 1;
            }
            self.cursor.col = col;
        }
        self.cursor.pending_wrap = false;
    }

    /// CBT: back to the nth preceding stop, or column 0.
    pub fn tab_backward(&mut self, n: usize) {
        for _ in 0..n.max(1) {
            if self.cursor.col == 0 {
                break;
            }
            let mut col = self.cursor.col - 1;
            while col > 0 && !self.tab_stops[col] {
                col -= 1;
            }
            self.cursor.col = col;
        }
        self.cursor.pending_wrap = false;
    }

    /// HTS.
    pub fn set_tab_stop(&mut self) {
        let col = self.cursor.col;
        if let Some(stop) = self.tab_stops.get_mut(col) {
            *stop = true;
        }
    }

    /// TBC 0.
    pub fn clear_tab_stop(&mut self) {
        let col = self.cursor.col;
        if let Some(stop) = self.tab_stops.get_mut(col) {
            *stop = false;
        }
    }

    /// TBC 3.
    pub fn clear_all_tab_stops(&mut self) {
        self.tab_stops.fill(false);
    }
}

// Regions, modes, buffers.
impl Screen {
    /// DECSTBM with 0-based rows; invalid bounds reset to the full
    /// screen. Homes the cursor, honoring origin mode.
    pub fn set_scroll_region(&mut self, top: usize, bottom: usize) {
        let bottom = bottom.min(self.rows - 1);
        if top < bottom {
            self.scroll_top = top;
            self.scroll_bottom = bottom;
        } else {
            self.scroll_top = 0;
            self.scroll_bottom = self.rows - 1;
        }
        self.move_to(0, 0);
    }

    /// DECOM: setting or clearing it homes the cursor.
    pub fn set_origin_mode(&mut self, on: bool) {
        self.modes.origin = on;
        self.move_to(0, 0);
    }

    /// Switch to the alternate grid. Entry is idempotent and resets any
    /// history view.
    pub fn enter_alternate(&mut self, clear: bool) {
        if self.on_alternate {
            return;
        }
        self.on_alternate = true;
        if clear {
            let fill = Line::filled(self.cols, self.cursor.template());
            for line in &mut self.alternate {
                *line = fill.clone();
            }
        }
        self.display_offset = 0;
        self.mark_all_dirty();
    }

    /// Switch back to the primary grid, which reappears untouched.
    pub fn exit_alternate(&mut self) {
        if !self.on_alternate {
            return;
        }
        self.on_alternate = false;
        self.display_offset = 0;
        self.mark_all_dirty();
    }

    /// Scroll the view into history (positive) or back toward the live
    /// grid (negative).
    pub fn scroll_display(&mut self, delta: isize) {
        let max = self.scrollback.len() as isize;
        let next = (self.display_offset as isize + delta).clamp(0, max);
        if next as usize != self.display_offset {
            self.display_offset = next as usize;
            self.mark_all_dirty();
        }
    }

    pub fn scroll_display_to_bottom(&mut self) {
        if self.display_offset != 0 {
            self.display_offset = 0;
            self.mark_all_dirty();
        }
    }

    /// DECALN: fill with `E`, reset the region, home the cursor.
    pub fn align_test(&mut self) {
        let mut cell = Cell::default();
        cell.ch = 'E';
        let fill = Line::filled(self.cols, cell);
        for line in self.active_grid_mut().iter_mut() {
            *line = fill.clone();
        }
        self.scroll_top = 0;
        self.scroll_bottom = self.rows - 1;
        self.cursor.col = 0;
        self.cursor.row = 0;
        self.cursor.pending_wrap = false;
        self.mark_all_dirty();
    }

    /// RIS.
    pub fn reset(&mut self) {
        let (cols, rows) = (self.cols, self.rows);
        self.primary = blank_grid(cols, rows);
        self.alternate = blank_grid(cols, rows);
        self.on_alternate = false;
        self.cursor = Cursor::new();
        self.primary_saved = None;
        self.alternate_saved = None;
        self.scroll_top = 0;
        self.scroll_bottom = rows - 1;
        self.tab_stops = default_tab_stops(cols);
        self.modes = Modes::default();
        self.palette.reset_all();
        self.scrollback.clear();
        self.display_offset = 0;
        self.selection.clear();
        self.title.clear();
        self.last_char = None;
        self.dirty = vec![true; rows];
    }

    /// DECSTR: cursor state, modes and region, leaving the grids alone.
    pub fn soft_reset(&mut self) {
        self.scroll_top = 0;
        self.scroll_bottom = self.rows - 1;
        self.modes.insert = false;
        self.modes.origin = false;
        self.modes.autowrap = true;
        self.modes.cursor_visible = true;
        self.modes.cursor_keys_application = false;
        self.modes.keypad_application = false;
        self.cursor.reset_sgr();
        self.cursor.charsets = CharsetState::default();
        self.cursor.pending_wrap = false;
        self.cursor.shape = CursorShape::Block;
        self.primary_saved = None;
        self.alternate_saved = None;
    }

    /// Rebuild both grids around the new dimensions, keeping the
    /// top-left intersection. Returns false when the size is unchanged.
    pub fn resize(&mut self, cols: usize, rows: usize) -> bool {
        let cols = cols.max(1);
        let rows = rows.max(1);
        if cols == self.cols && rows == self.rows {
            return false;
        }
        resize_grid(&mut self.primary, cols, rows);
        resize_grid(&mut self.alternate, cols, rows);
        self.cols = cols;
        self.rows = rows;
        self.scroll_top = 0;
        self.scroll_bottom = rows - 1;
        self.tab_stops = default_tab_stops(cols);
        self.cursor.col = self.cursor.col.min(cols - 1);
        self.cursor.row = self.cursor.row.min(rows - 1);
        self.cursor.pending_wrap = false;
        for saved in [&mut self.primary_saved, &mut self.alternate_saved] {
            if let Some(saved) = saved {
                saved.col = saved.col.min(cols - 1);
                saved.row = saved.row.min(rows - 1);
            }
        }
        self.display_offset = self.display_offset.min(self.scrollback.len());
        self.selection.clear();
        self.dirty = vec![true; rows];
        true
    }
}

// Selection. Points arrive in viewport coordinates and are stored in the
// signed row space, so a selection survives further scrolling.
impl Screen {
    pub fn begin_selection(&mut self, col: usize, viewport_row: usize, kind: SelectionKind) {
        let point = self.viewport_point(col, viewport_row);
        let on_alternate = self.on_alternate;
        self.selection.begin(point, kind, on_alternate);
    }

    pub fn update_selection(&mut self, col: usize, viewport_row: usize) {
        let point = self.viewport_point(col, viewport_row);
        self.selection.update(point);
    }

    pub fn finish_selection(&mut self) {
        self.selection.finish();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    fn viewport_point(&self, col: usize, viewport_row: usize) -> SelectionPoint {
        let row = viewport_row as i32 - self.display_offset as i32;
        SelectionPoint::new(row, col.min(self.cols - 1))
    }

    fn signed_line(&self, row: i32) -> Option<&Line> {
        if row < 0 {
            self.scrollback.get_from_end((-row - 1) as usize)
        } else {
            self.active_grid().get(row as usize)
        }
    }

    /// Extract the selected text. Wide-character placeholders are
    /// skipped, trailing blanks trimmed per row, and a soft-wrapped row
    /// joins the next one without a newline. Returns None when there is
    /// no selection or it was made on the other buffer.
    pub fn selection_text(&self) -> Option<String> {
        let (start, end) = self.selection.normalized()?;
        if self.selection.on_alternate() != self.on_alternate {
            return None;
        }
        let rectangular = self.selection.kind() == SelectionKind::Rectangular;
        let mut out = String::new();
        let mut first = true;
        let mut join_next = false;
        for row in start.row..=end.row {
            let Some(line) = self.signed_line(row) else {
                continue;
            };
            if line.is_empty() {
                continue;
            }
            let (from, to) = if rectangular {
                (start.col, end.col)
            } else {
                let from = if row == start.row { start.col } else { 0 };
                let to = if row == end.row { end.col } else { line.len() - 1 };
                (from, to)
            };
            let to = to.min(line.len() - 1);
            let from = from.min(to);

            if !first && !join_next {
                out.push('\n');
            }
            first = false;

            let mut text = String::new();
            for cell in &line.cells[from..=to] {
                if !cell.is_wide_dummy() {
                    text.push(cell.ch);
                }
            }
            // A wrapped row selected through its end keeps its trailing
            // blanks: the content genuinely continues.
            let wrapped = !rectangular && line.is_wrapped() && to == line.len() - 1;
            if !wrapped {
                text.truncate(text.trim_end_matches(' ').len());
            }
            out.push_str(&text);
            join_next = wrapped;
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::palette::Rgb;

    fn row_text(screen: &Screen, row: usize) -> String {
        screen.line(row).map(Line::text).unwrap_or_default()
    }

    fn print_str(screen: &mut Screen, s: &str) {
        for ch in s.chars() {
            screen.print(ch);
        }
    }

    #[test]
    fn test_new_screen_dimensions() {
        let screen = Screen::new(80, 24, 100);
        assert_eq!(screen.cols(), 80);
        assert_eq!(screen.rows(), 24);
        assert_eq!(screen.scroll_region(), (0, 23));
        assert_eq!((screen.cursor().col, screen.cursor().row), (0, 0));
    }

    #[test]
    fn test_print_advances_cursor() {
        let mut screen = Screen::new(80, 24, 0);
        print_str(&mut screen, "hi");
        assert_eq!(row_text(&screen, 0), "hi");
        assert_eq!(screen.cursor().col, 2);
    }

    #[test]
    fn test_print_fills_grid_row_major() {
        let mut screen = Screen::new(4, 2, 0);
        print_str(&mut screen, "abcdefgh");
        assert_eq!(row_text(&screen, 0), "abcd");
        assert_eq!(row_text(&screen, 1), "efgh");
        assert_eq!(screen.cursor().col, 3);
        assert_eq!(screen.cursor().row, 1);
        assert!(screen.cursor().pending_wrap);
    }

    #[test]
    fn test_autowrap_marks_wrapped_row() {
        let mut screen = Screen::new(5, 3, 0);
        print_str(&mut screen, "HelloWorld");
        assert_eq!(row_text(&screen, 0), "Hello");
        assert_eq!(row_text(&screen, 1), "World");
        assert!(screen.line(0).is_some_and(Line::is_wrapped));
        assert!(!screen.line(1).is_some_and(Line::is_wrapped));
    }

    #[test]
    fn test_autowrap_off_sticks_at_margin() {
        let mut screen = Screen::new(4, 2, 0);
        screen.modes.autowrap = false;
        print_str(&mut screen, "abcdef");
        assert_eq!(row_text(&screen, 0), "abcf");
        assert_eq!(screen.cursor().col, 3);
        assert_eq!(screen.cursor().row, 0);
    }

    #[test]
    fn test_wide_char_occupies_pair() {
        let mut screen = Screen::new(10, 2, 0);
        screen.print('世');
        let lead = screen.cell(0, 0).copied().unwrap();
        let dummy = screen.cell(1, 0).copied().unwrap();
        assert_eq!(lead.ch, '世');
        assert!(lead.flags.contains(CellFlags::WIDE));
        assert!(dummy.flags.contains(CellFlags::WIDE_DUMMY));
        assert_eq!(screen.cursor().col, 2);
    }

    #[test]
    fn test_wide_char_at_margin_wraps_with_spacer() {
        let mut screen = Screen::new(5, 2, 0);
        screen.move_to_col(4);
        screen.print('界');
        assert!(screen.cell(4, 0).unwrap().is_blank());
        assert_eq!(screen.cell(0, 1).unwrap().ch, '界');
        assert!(screen.cell(1, 1).unwrap().is_wide_dummy());
    }

    #[test]
    fn test_overwriting_wide_lead_clears_dummy() {
        let mut screen = Screen::new(10, 2, 0);
        screen.print('世');
        screen.move_to(0, 0);
        screen.print('x');
        assert_eq!(screen.cell(0, 0).unwrap().ch, 'x');
        assert!(!screen.cell(1, 0).unwrap().is_wide_dummy());
        assert_eq!(screen.cell(1, 0).unwrap().ch, ' ');
    }

    #[test]
    fn test_insert_mode_shifts_row() {
        let mut screen = Screen::new(6, 2, 0);
        print_str(&mut screen, "abc");
        screen.move_to(0, 0);
        screen.modes.insert = true;
        screen.print('X');
        assert_eq!(row_text(&screen, 0), "Xabc");
        assert_eq!(screen.cursor().col, 1);
    }

    #[test]
    fn test_linefeed_scrolls_and_evicts() {
        let mut screen = Screen::new(5, 2, 10);
        print_str(&mut screen, "one");
        screen.carriage_return();
        screen.linefeed();
        print_str(&mut screen, "two");
        screen.carriage_return();
        screen.linefeed();
        assert_eq!(screen.scrollback_len(), 1);
        assert_eq!(screen.scrollback().get_from_end(0).unwrap().text(), "one");
        assert_eq!(row_text(&screen, 0), "two");
        assert_eq!(row_text(&screen, 1), "");
    }

    #[test]
    fn test_alternate_screen_never_evicts() {
        let mut screen = Screen::new(5, 2, 10);
        screen.enter_alternate(true);
        print_str(&mut screen, "abc");
        screen.linefeed();
        screen.linefeed();
        screen.linefeed();
        assert_eq!(screen.scrollback_len(), 0);
    }

    #[test]
    fn test_scroll_down_inserts_blank_at_top() {
        let mut screen = Screen::new(5, 3, 0);
        print_str(&mut screen, "top");
        screen.scroll_down(1);
        assert_eq!(row_text(&screen, 0), "");
        assert_eq!(row_text(&screen, 1), "top");
    }

    #[test]
    fn test_scroll_confined_to_region() {
        let mut screen = Screen::new(5, 4, 10);
        for (row, text) in ["aa", "bb", "cc", "dd"].iter().enumerate() {
            screen.move_to(row, 0);
            print_str(&mut screen, text);
        }
        screen.set_scroll_region(1, 2);
        screen.move_to(2, 0);
        screen.linefeed();
        assert_eq!(row_text(&screen, 0), "aa");
        assert_eq!(row_text(&screen, 1), "cc");
        assert_eq!(row_text(&screen, 2), "");
        assert_eq!(row_text(&screen, 3), "dd");
        // Region does not start at the top, nothing entered history.
        assert_eq!(screen.scrollback_len(), 0);
    }

    #[test]
    fn test_invalid_scroll_region_resets() {
        let mut screen = Screen::new(10, 10, 0);
        screen.set_scroll_region(2, 6);
        assert_eq!(screen.scroll_region(), (2, 6));
        screen.set_scroll_region(5, 5);
        assert_eq!(screen.scroll_region(), (0, 9));
        screen.set_scroll_region(3, 100);
        assert_eq!(screen.scroll_region(), (3, 9));
    }

    #[test]
    fn test_origin_mode_addresses_inside_region() {
        let mut screen = Screen::new(10, 10, 0);
        screen.set_scroll_region(2, 6);
        screen.set_origin_mode(true);
        assert_eq!(screen.cursor().row, 2);
        screen.move_to(1, 3);
        assert_eq!(screen.cursor().row, 3);
        screen.move_to(100, 0);
        assert_eq!(screen.cursor().row, 6);
        screen.set_origin_mode(false);
        screen.move_to(0, 0);
        assert_eq!(screen.cursor().row, 0);
    }

    #[test]
    fn test_cursor_motion_stops_at_margins() {
        let mut screen = Screen::new(10, 8, 0);
        screen.set_scroll_region(2, 5);
        screen.move_to(4, 0);
        screen.move_up(10);
        assert_eq!(screen.cursor().row, 2);
        screen.move_down(10);
        assert_eq!(screen.cursor().row, 5);
        // Starting below the region, CUD may reach the screen bottom.
        screen.move_to(6, 0);
        screen.move_down(10);
        assert_eq!(screen.cursor().row, 7);
        // Starting above it, CUU may reach the top.
        screen.move_to(1, 0);
        screen.move_up(10);
        assert_eq!(screen.cursor().row, 0);
    }

    #[test]
    fn test_erase_keeps_background() {
        let mut screen = Screen::new(10, 2, 0);
        print_str(&mut screen, "abc");
        screen.cursor_mut().bg = Color::Indexed(4);
        screen.move_to(0, 0);
        screen.erase_in_line(2);
        let cell = screen.cell(0, 0).unwrap();
        assert_eq!(cell.ch, ' ');
        assert_eq!(cell.bg, Color::Indexed(4));
    }

    #[test]
    fn test_erase_in_line_variants() {
        let mut screen = Screen::new(6, 1, 0);
        print_str(&mut screen, "abcdef");
        screen.move_to(0, 2);
        screen.erase_in_line(0);
        assert_eq!(row_text(&screen, 0), "ab");
        print_str(&mut screen, "CDEF");
        screen.move_to(0, 2);
        screen.erase_in_line(1);
        assert_eq!(row_text(&screen, 0), "   DEF");
    }

    #[test]
    fn test_erase_display_below_and_above() {
        let mut screen = Screen::new(4, 3, 0);
        for (row, text) in ["aaaa", "bbbb", "cccc"].iter().enumerate() {
            screen.move_to(row, 0);
            print_str(&mut screen, text);
        }
        screen.move_to(1, 2);
        screen.erase_in_display(0);
        assert_eq!(row_text(&screen, 0), "aaaa");
        assert_eq!(row_text(&screen, 1), "bb");
        assert_eq!(row_text(&screen, 2), "");
        screen.erase_in_display(1);
        assert_eq!(row_text(&screen, 0), "");
        assert_eq!(row_text(&screen, 1), "");
    }

    #[test]
    fn test_erase_display_scrollback() {
        let mut screen = Screen::new(5, 2, 10);
        print_str(&mut screen, "old");
        screen.carriage_return();
        screen.linefeed();
        screen.linefeed();
        assert_eq!(screen.scrollback_len(), 1);
        screen.erase_in_display(3);
        assert_eq!(screen.scrollback_len(), 0);
        assert_eq!(row_text(&screen, 0), "");
    }

    #[test]
    fn test_erase_chars() {
        let mut screen = Screen::new(8, 1, 0);
        print_str(&mut screen, "abcdefgh");
        screen.move_to(0, 2);
        screen.erase_chars(3);
        assert_eq!(row_text(&screen, 0), "ab   fgh");
    }

    #[test]
    fn test_insert_and_delete_lines() {
        let mut screen = Screen::new(4, 5, 0);
        for (row, text) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            screen.move_to(row, 0);
            print_str(&mut screen, text);
        }
        screen.set_scroll_region(1, 3);
        screen.move_to(1, 0);
        screen.insert_lines(1);
        assert_eq!(row_text(&screen, 1), "");
        assert_eq!(row_text(&screen, 2), "b");
        assert_eq!(row_text(&screen, 3), "c");
        assert_eq!(row_text(&screen, 4), "e");
        screen.delete_lines(1);
        assert_eq!(row_text(&screen, 1), "b");
        assert_eq!(row_text(&screen, 2), "c");
        assert_eq!(row_text(&screen, 3), "");
    }

    #[test]
    fn test_insert_delete_lines_outside_region_ignored() {
        let mut screen = Screen::new(4, 4, 0);
        print_str(&mut screen, "keep");
        screen.set_scroll_region(1, 2);
        screen.move_to(3, 0);
        screen.insert_lines(1);
        screen.delete_lines(1);
        assert_eq!(row_text(&screen, 0), "keep");
    }

    #[test]
    fn test_insert_and_delete_chars() {
        let mut screen = Screen::new(6, 1, 0);
        print_str(&mut screen, "abcdef");
        screen.move_to(0, 2);
        screen.insert_chars(2);
        assert_eq!(row_text(&screen, 0), "ab  cd");
        screen.delete_chars(2);
        assert_eq!(row_text(&screen, 0), "abcd");
    }

    #[test]
    fn test_tab_stops() {
        let mut screen = Screen::new(20, 2, 0);
        screen.tab_forward(1);
        assert_eq!(screen.cursor().col, 8);
        screen.tab_forward(1);
        assert_eq!(screen.cursor().col, 16);
        screen.tab_forward(1);
        assert_eq!(screen.cursor().col, 19);
        screen.move_to_col(12);
        screen.set_tab_stop();
        screen.move_to_col(0);
        screen.tab_forward(2);
        assert_eq!(screen.cursor().col, 12);
        screen.tab_backward(1);
        assert_eq!(screen.cursor().col, 8);
        screen.clear_all_tab_stops();
        screen.move_to_col(0);
        screen.tab_forward(1);
        assert_eq!(screen.cursor().col, 19);
    }

    #[test]
    fn test_save_restore_cursor() {
        let mut screen = Screen::new(10, 5, 0);
        screen.move_to(2, 3);
        screen.cursor_mut().flags |= CellFlags::BOLD;
        screen.cursor_mut().fg = Color::Indexed(2);
        screen.save_cursor();
        screen.move_to(0, 0);
        screen.cursor_mut().reset_sgr();
        screen.restore_cursor();
        assert_eq!((screen.cursor().row, screen.cursor().col), (2, 3));
        assert!(screen.cursor().flags.contains(CellFlags::BOLD));
        assert_eq!(screen.cursor().fg, Color::Indexed(2));
    }

    #[test]
    fn test_restore_without_save_homes() {
        let mut screen = Screen::new(10, 5, 0);
        screen.move_to(3, 4);
        screen.cursor_mut().flags |= CellFlags::ITALIC;
        screen.restore_cursor();
        assert_eq!((screen.cursor().row, screen.cursor().col), (0, 0));
        assert!(screen.cursor().flags.is_empty());
    }

    #[test]
    fn test_alternate_screen_preserves_primary() {
        let mut screen = Screen::new(10, 3, 0);
        print_str(&mut screen, "primary");
        let before: Vec<String> = (0..3).map(|r| row_text(&screen, r)).collect();
        screen.enter_alternate(true);
        assert_eq!(row_text(&screen, 0), "");
        print_str(&mut screen, "alt stuff");
        screen.exit_alternate();
        let after: Vec<String> = (0..3).map(|r| row_text(&screen, r)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_alternate_enter_is_idempotent() {
        let mut screen = Screen::new(10, 3, 0);
        screen.enter_alternate(true);
        print_str(&mut screen, "alt");
        screen.enter_alternate(true);
        assert_eq!(row_text(&screen, 0), "alt");
    }

    #[test]
    fn test_resize_preserves_top_left() {
        let mut screen = Screen::new(10, 3, 0);
        print_str(&mut screen, "0123456789");
        assert!(screen.resize(5, 3));
        assert_eq!(row_text(&screen, 0), "01234");
        assert!(screen.resize(10, 3));
        assert_eq!(row_text(&screen, 0), "01234");
        assert!(!screen.resize(10, 3));
    }

    #[test]
    fn test_resize_rederives_tabs_and_clamps_cursor() {
        let mut screen = Screen::new(30, 10, 0);
        screen.move_to(9, 29);
        screen.resize(12, 4);
        assert_eq!((screen.cursor().row, screen.cursor().col), (3, 11));
        assert_eq!(screen.scroll_region(), (0, 3));
        screen.move_to(0, 0);
        screen.tab_forward(1);
        assert_eq!(screen.cursor().col, 8);
    }

    #[test]
    fn test_display_offset_anchors_on_eviction() {
        let mut screen = Screen::new(5, 2, 10);
        for word in ["aa", "bb", "cc"] {
            print_str(&mut screen, word);
            screen.carriage_return();
            screen.linefeed();
        }
        assert_eq!(screen.scrollback_len(), 2);
        screen.scroll_display(1);
        assert_eq!(screen.display_offset(), 1);
        assert_eq!(screen.display_line(0).unwrap().text(), "bb");
        // New eviction keeps the same history row at the top of the view.
        print_str(&mut screen, "dd");
        screen.carriage_return();
        screen.linefeed();
        assert_eq!(screen.display_offset(), 2);
        assert_eq!(screen.display_line(0).unwrap().text(), "bb");
        screen.scroll_display_to_bottom();
        assert_eq!(screen.display_offset(), 0);
    }

    #[test]
    fn test_selection_across_scrollback_and_live() {
        let mut screen = Screen::new(5, 2, 10);
        print_str(&mut screen, "one");
        screen.carriage_return();
        screen.linefeed();
        print_str(&mut screen, "two");
        screen.carriage_return();
        screen.linefeed();
        assert_eq!(screen.scrollback_len(), 1);
        screen.scroll_display(1);
        screen.begin_selection(0, 0, SelectionKind::Linear);
        screen.update_selection(4, 1);
        screen.finish_selection();
        assert_eq!(screen.selection_text().as_deref(), Some("one\ntwo"));
    }

    #[test]
    fn test_selection_joins_wrapped_rows() {
        let mut screen = Screen::new(3, 2, 0);
        print_str(&mut screen, "abcd");
        screen.begin_selection(0, 0, SelectionKind::Linear);
        screen.update_selection(2, 1);
        screen.finish_selection();
        assert_eq!(screen.selection_text().as_deref(), Some("abcd"));
    }

    #[test]
    fn test_selection_rectangular_band() {
        let mut screen = Screen::new(5, 2, 0);
        print_str(&mut screen, "abcde");
        screen.move_to(1, 0);
        print_str(&mut screen, "fghij");
        screen.begin_selection(3, 0, SelectionKind::Rectangular);
        screen.update_selection(1, 1);
        screen.finish_selection();
        assert_eq!(screen.selection_text().as_deref(), Some("bcd\nghi"));
    }

    #[test]
    fn test_selection_ignored_on_other_buffer() {
        let mut screen = Screen::new(5, 2, 0);
        print_str(&mut screen, "text");
        screen.begin_selection(0, 0, SelectionKind::Linear);
        screen.update_selection(3, 0);
        screen.finish_selection();
        screen.enter_alternate(true);
        assert_eq!(screen.selection_text(), None);
        screen.exit_alternate();
        assert_eq!(screen.selection_text().as_deref(), Some("text"));
    }

    #[test]
    fn test_selection_skips_wide_dummy() {
        let mut screen = Screen::new(6, 1, 0);
        screen.print('a');
        screen.print('界');
        screen.print('b');
        screen.begin_selection(0, 0, SelectionKind::Linear);
        screen.update_selection(3, 0);
        screen.finish_selection();
        assert_eq!(screen.selection_text().as_deref(), Some("a界b"));
    }

    #[test]
    fn test_repeat_last_glyph() {
        let mut screen = Screen::new(10, 1, 0);
        screen.print('z');
        screen.repeat_last(3);
        assert_eq!(row_text(&screen, 0), "zzzz");
    }

    #[test]
    fn test_align_test_pattern() {
        let mut screen = Screen::new(4, 2, 0);
        screen.set_scroll_region(0, 1);
        screen.move_to(1, 2);
        screen.align_test();
        assert_eq!(row_text(&screen, 0), "EEEE");
        assert_eq!(row_text(&screen, 1), "EEEE");
        assert_eq!((screen.cursor().row, screen.cursor().col), (0, 0));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut screen = Screen::new(10, 4, 10);
        print_str(&mut screen, "junk");
        screen.set_title("shell".into());
        screen.modes.insert = true;
        screen.palette_mut().set_entry(1, Rgb::new(1, 2, 3));
        screen.enter_alternate(true);
        screen.reset();
        assert_eq!(row_text(&screen, 0), "");
        assert!(!screen.on_alternate());
        assert!(!screen.modes.insert);
        assert_eq!(screen.title(), "");
        assert_eq!(screen.scrollback_len(), 0);
        assert_ne!(screen.palette().entry(1), Rgb::new(1, 2, 3));
    }

    #[test]
    fn test_soft_reset_keeps_grid() {
        let mut screen = Screen::new(10, 4, 0);
        print_str(&mut screen, "kept");
        screen.set_scroll_region(1, 2);
        screen.set_origin_mode(true);
        screen.modes.insert = true;
        screen.soft_reset();
        assert_eq!(row_text(&screen, 0), "kept");
        assert_eq!(screen.scroll_region(), (0, 3));
        assert!(!screen.modes.origin);
        assert!(!screen.modes.insert);
    }

    #[test]
    fn test_dirty_rows_track_mutations() {
        let mut screen = Screen::new(10, 3, 0);
        screen.clear_dirty();
        assert!(screen.dirty_rows().iter().all(|&d| !d));
        screen.move_to(1, 0);
        screen.print('x');
        assert!(!screen.dirty_rows()[0]);
        assert!(screen.dirty_rows()[1]);
    }
}
