//! Character set translation
//!
//! VT terminals address four designated sets G0-G3 through a locking
//! shift. In practice only ASCII, the UK variant, and DEC Special
//! Graphics (the line-drawing set used by curses applications) matter.

/// A designated character set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    #[default]
    Ascii,
    Uk,
    DecSpecial,
}

impl Charset {
    /// Interpret the final byte of a designation sequence (`ESC ( 0`
    /// etc.). Unknown designators fall back to ASCII.
    pub fn from_designator(byte: u8) -> Self {
        match byte {
            b'0' => Charset::DecSpecial,
            b'A' => Charset::Uk,
            _ => Charset::Ascii,
        }
    }

    /// Translate a character through this set.
    pub fn map(&self, ch: char) -> char {
        match self {
            Charset::Ascii => ch,
            Charset::Uk => {
                if ch == '#' {
                    '£'
                } else {
                    ch
                }
            }
            Charset::DecSpecial => dec_special(ch),
        }
    }
}

/// DEC Special Graphics, as xterm renders it.
fn dec_special(ch: char) -> char {
    match ch {
        '_' => ' ',
        '`' => '◆',
        'a' => '▒',
        'b' => '␉',
        'c' => '␌',
        'd' => '␍',
        'e' => '␊',
        'f' => '°',
        'g' => '±',
        'h' => '␤',
        'i' => '␋',
        'j' => '┘',
        'k' => '┐',
        'l' => '┌',
        'm' => '└',
        'n' => '┼',
        'o' => '⎺',
        'p' => '⎻',
        'q' => '─',
        'r' => '⎼',
        's' => '⎽',
        't' => '├',
        'u' => '┤',
        'v' => '┴',
        'w' => '┬',
        'x' => '│',
        'y' => '≤',
        'z' => '≥',
        '{' => 'π',
        '|' => '≠',
        '}' => '£',
        '~' => '·',
        _ => ch,
    }
}

/// The four designation slots plus the active locking shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharsetState {
    slots: [Charset; 4],
    active: usize,
}

impl Default for CharsetState {
    fn default() -> Self {
        Self {
            slots: [Charset::Ascii; 4],
            active: 0,
        }
    }
}

impl CharsetState {
    /// Designate a set into slot 0-3.
    pub fn designate(&mut self, slot: usize, charset: Charset) {
        if slot < 4 {
            self.slots[slot] = charset;
        }
    }

    /// Lock a slot in as active (SI, SO, LS2, LS3).
    pub fn shift(&mut self, slot: usize) {
        if slot < 4 {
            self.active = slot;
        }
    }

    pub fn active_slot(&self) -> usize {
        self.active
    }

    /// Translate a character through the active set.
    pub fn map(&self, ch: char) -> char {
        self.slots[self.active].map(ch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        let state = CharsetState::default();
        assert_eq!(state.map('q'), 'q');
        assert_eq!(state.map('#'), '#');
    }

    #[test]
    fn test_dec_special_line_drawing() {
        let mut state = CharsetState::default();
        state.designate(0, Charset::DecSpecial);
        assert_eq!(state.map('q'), '─');
        assert_eq!(state.map('x'), '│');
        assert_eq!(state.map('l'), '┌');
        assert_eq!(state.map('j'), '┘');
        // Characters outside the graphics range pass through.
        assert_eq!(state.map('A'), 'A');
    }

    #[test]
    fn test_shift_between_slots() {
        let mut state = CharsetState::default();
        state.designate(1, Charset::DecSpecial);
        assert_eq!(state.map('q'), 'q');
        state.shift(1);
        assert_eq!(state.map('q'), '─');
        state.shift(0);
        assert_eq!(state.map('q'), 'q');
    }

    #[test]
    fn test_uk_pound() {
        assert_eq!(Charset::Uk.map('#'), '£');
        assert_eq!(Charset::Uk.map('a'), 'a');
    }

    #[test]
    fn test_unknown_designator_is_ascii() {
        assert_eq!(Charset::from_designator(b'B'), Charset::Ascii);
        assert_eq!(Charset::from_designator(b'Z'), Charset::Ascii);
        assert_eq!(Charset::from_designator(b'0'), Charset::DecSpecial);
        assert_eq!(Charset::from_designator(b'A'), Charset::Uk);
    }
}
