//! Lines and the scrollback ring
//!
//! Rows evicted off the top of the primary screen land here, oldest
//! first. The buffer is a fixed-capacity ring; once full, each push drops
//! the oldest line.

use super::cell::{Cell, CellFlags};

/// One row of cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub cells: Vec<Cell>,
}

impl Line {
    /// A row of `cols` copies of `fill`.
    pub fn filled(cols: usize, fill: Cell) -> Self {
        Self {
            cells: vec![fill; cols],
        }
    }

    /// A row of default blanks.
    pub fn blank(cols: usize) -> Self {
        Self::filled(cols, Cell::default())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Truncate or pad with `fill` to `cols` columns.
    pub fn resize(&mut self, cols: usize, fill: Cell) {
        self.cells.resize(cols, fill);
    }

    /// Overwrite every cell.
    pub fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    /// Whether the row continues onto the next one (soft wrap). Recorded
    /// on the last cell so it survives eviction into scrollback.
    pub fn is_wrapped(&self) -> bool {
        self.cells
            .last()
            .is_some_and(|c| c.flags.contains(CellFlags::WRAP))
    }

    pub fn set_wrapped(&mut self, wrapped: bool) {
        if let Some(last) = self.cells.last_mut() {
            last.flags.set(CellFlags::WRAP, wrapped);
        }
    }

    /// Text content: wide-character placeholders are skipped and trailing
    /// blanks trimmed.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for cell in &self.cells {
            if !cell.is_wide_dummy() {
                out.push(cell.ch);
            }
        }
        out.truncate(out.trim_end_matches(' ').len());
        out
    }
}

/// Ring buffer of evicted rows.
#[derive(Debug, Clone)]
pub struct Scrollback {
    lines: Vec<Line>,
    /// Physical index of the oldest line once the ring has wrapped.
    head: usize,
    len: usize,
    capacity: usize,
}

impl Scrollback {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Vec::new(),
            head: 0,
            len: 0,
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a line, dropping the oldest when full.
    pub fn push(&mut self, line: Line) {
        if self.capacity == 0 {
            return;
        }
        if self.len < self.capacity {
            self.lines.push(line);
            self.len += 1;
        } else {
            self.lines[self.head] = line;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    /// Line by age: index 0 is the oldest retained.
    pub fn get(&self, index: usize) -> Option<&Line> {
        if index >= self.len {
            return None;
        }
        self.lines.get((self.head + index) % self.lines.len())
    }

    /// Line by recency: index 0 is the newest, the row just above the
    /// visible screen.
    pub fn get_from_end(&self, index: usize) -> Option<&Line> {
        if index >= self.len {
            return None;
        }
        self.get(self.len - 1 - index)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.head = 0;
        self.len = 0;
    }

    /// Change capacity, keeping the most recent lines that fit. The ring
    /// is linearized so later pushes stay ordered.
    pub fn set_capacity(&mut self, capacity: usize) {
        if capacity == self.capacity {
            return;
        }
        let keep = self.len.min(capacity);
        let start = self.len - keep;
        let lines: Vec<Line> = (start..self.len)
            .filter_map(|i| self.get(i).cloned())
            .collect();
        self.lines = lines;
        self.head = 0;
        self.len = keep;
        self.capacity = capacity;
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            scrollback: self,
            index: 0,
        }
    }
}

/// Iterator over scrollback lines, oldest first.
pub struct Iter<'a> {
    scrollback: &'a Scrollback,
    index: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Line;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.scrollback.get(self.index)?;
        self.index += 1;
        Some(line)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.scrollback.len.saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}
