//! Selection model
//!
//! Selections live in a coordinate space joining the visible grid and
//! scrollback: visible rows are 0 and up, scrollback rows are negative
//! with -1 the most recently evicted. Endpoints are stored as dragged;
//! normalization happens on demand so drags in any direction work.

/// Lifecycle of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// No selection.
    #[default]
    Idle,
    /// Anchor placed, no drag yet.
    Empty,
    /// Drag in progress.
    Selecting,
    /// Drag finished; contents stable until cleared.
    Ready,
}

/// Shape of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionKind {
    /// Reading order from anchor to head.
    #[default]
    Linear,
    /// The rectangle spanned by the anchor and head corners.
    Rectangular,
}

/// A position in unified row space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionPoint {
    /// Visible row (>= 0) or scrollback row (< 0, -1 newest).
    pub row: i32,
    pub col: usize,
}

impl SelectionPoint {
    pub fn new(row: i32, col: usize) -> Self {
        Self { row, col }
    }

    fn is_before(&self, other: &SelectionPoint) -> bool {
        (self.row, self.col) < (other.row, other.col)
    }
}

/// Selection state machine.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    mode: SelectionMode,
    kind: SelectionKind,
    /// Which buffer was live when the selection started. A selection made
    /// on one buffer is not valid against the other.
    on_alternate: bool,
    anchor: SelectionPoint,
    head: SelectionPoint,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn kind(&self) -> SelectionKind {
        self.kind
    }

    pub fn on_alternate(&self) -> bool {
        self.on_alternate
    }

    /// True while a drag is live or finished contents exist.
    pub fn is_active(&self) -> bool {
        matches!(self.mode, SelectionMode::Selecting | SelectionMode::Ready)
    }

    /// Place the anchor. The alternate-screen flag is frozen here.
    pub fn begin(&mut self, point: SelectionPoint, kind: SelectionKind, on_alternate: bool) {
        self.mode = SelectionMode::Empty;
        self.kind = kind;
        self.on_alternate = on_alternate;
        self.anchor = point;
        self.head = point;
    }

    /// Move the head during a drag. Ignored unless a selection was begun.
    pub fn update(&mut self, point: SelectionPoint) {
        match self.mode {
            SelectionMode::Empty | SelectionMode::Selecting => {
                self.mode = SelectionMode::Selecting;
                self.head = point;
            }
            SelectionMode::Idle | SelectionMode::Ready => {}
        }
    }

    /// End the drag. A bare click with no drag leaves nothing selected.
    pub fn finish(&mut self) {
        match self.mode {
            SelectionMode::Selecting => self.mode = SelectionMode::Ready,
            SelectionMode::Empty => self.clear(),
            SelectionMode::Idle | SelectionMode::Ready => {}
        }
    }

    pub fn clear(&mut self) {
        self.mode = SelectionMode::Idle;
        self.anchor = SelectionPoint::default();
        self.head = SelectionPoint::default();
    }

    /// Ordered endpoints, independent of drag direction. For rectangular
    /// selections rows and columns are normalized separately.
    pub fn normalized(&self) -> Option<(SelectionPoint, SelectionPoint)> {
        if !self.is_active() {
            return None;
        }
        let (start, end) = if self.anchor.is_before(&self.head) {
            (self.anchor, self.head)
        } else {
            (self.head, self.anchor)
        };
        match self.kind {
            SelectionKind::Linear => Some((start, end)),
            SelectionKind::Rectangular => Some((
                SelectionPoint::new(start.row, self.anchor.col.min(self.head.col)),
                SelectionPoint::new(end.row, self.anchor.col.max(self.head.col)),
            )),
        }
    }

    /// Whether a cell falls inside the selection.
    pub fn contains(&self, row: i32, col: usize) -> bool {
        let Some((start, end)) = self.normalized() else {
            return false;
        };
        match self.kind {
            SelectionKind::Linear => {
                let after_start = row > start.row || (row == start.row && col >= start.col);
                let before_end = row < end.row || (row == end.row && col <= end.col);
                after_start && before_end
            }
            SelectionKind::Rectangular => {
                (start.row..=end.row).contains(&row) && (start.col..=end.col).contains(&col)
            }
        }
    }
}
