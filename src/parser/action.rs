//! Actions produced by the escape-sequence parser
//!
//! The parser turns a byte stream into a flat list of actions; it never
//! touches screen state itself. Interpretation happens in the executor.

/// One parsed unit of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Print a character, already decoded from UTF-8.
    Print(char),

    /// Execute a C0 control byte (0x00..=0x1F).
    Control(u8),

    /// A completed non-CSI escape sequence: the optional intermediate
    /// (charset designators `( ) * + #`) plus the final byte.
    Esc { intermediate: Option<u8>, byte: u8 },

    /// A completed CSI sequence.
    Csi(CsiParams),

    /// An operating system command: numeric selector plus everything after
    /// the first `;`, kept as raw bytes.
    Osc { command: u16, payload: Vec<u8> },

    /// A device control string, raw.
    Dcs(Vec<u8>),
}

/// Parsed contents of a CSI sequence.
///
/// Parameters keep their raw values; an absent or empty field is stored as
/// 0 and resolved against the command's default at dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CsiParams {
    /// Semicolon-separated numeric parameters.
    pub params: Vec<u16>,
    /// Intermediate bytes (0x20..=0x2F) seen before the final.
    pub intermediates: Vec<u8>,
    /// Leading private marker (`?`, `>`, `=`, `<`), if any.
    pub prefix: Option<u8>,
    /// The byte (0x40..=0x7E) that identifies the command.
    pub final_byte: u8,
}

impl CsiParams {
    /// Get parameter at `index`, or `default` if not present.
    pub fn param(&self, index: usize, default: u16) -> u16 {
        self.params.get(index).copied().unwrap_or(default)
    }

    /// Get parameter at `index` with zero treated as absent. Most cursor
    /// and edit commands document "0 or omitted means 1".
    pub fn param_or(&self, index: usize, default: u16) -> u16 {
        match self.params.get(index) {
            Some(&0) | None => default,
            Some(&v) => v,
        }
    }

    /// True when the sequence carried the DEC private marker `?`.
    pub fn is_dec_private(&self) -> bool {
        self.prefix == Some(b'?')
    }

    /// First intermediate byte, if any.
    pub fn intermediate(&self) -> Option<u8> {
        self.intermediates.first().copied()
    }
}
