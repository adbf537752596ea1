//! Parser state machine
//!
//! A compact four-state machine covering the sequences terminals emit in
//! practice: plain text, ESC finals, CSI, and the string-payload family
//! (OSC, DCS, APC, PM). Each non-ground state carries its own accumulation
//! buffer, so the parser is chunk-agnostic: a sequence split across reads
//! resumes exactly where it left off.
//!
//! Compared to the full thirteen-state machine described at
//! <https://vt100.net/emu/dec_ansi_parser>, parameter and intermediate
//! collection happens at dispatch time from the raw CSI buffer rather than
//! in dedicated states. Observable behavior is the same.

use super::action::{Action, CsiParams};
use crate::codec::{self, Decode, REPLACEMENT};

/// Longest CSI body (params + intermediates) accepted before the sequence
/// is abandoned.
const MAX_CSI_LEN: usize = 256;

/// Longest OSC/DCS/APC/PM payload accepted before the sequence is
/// abandoned.
const MAX_STRING_LEN: usize = 4096;

/// Which string-payload sequence is being collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    /// ESC ] ... operating system command.
    Osc,
    /// ESC P ... device control string.
    Dcs,
    /// ESC _ ... application program command, consumed and dropped.
    Apc,
    /// ESC ^ ... privacy message, consumed and dropped.
    Pm,
    /// ESC k ... title sequence from GNU screen, treated as OSC 2.
    LegacyTitle,
}

/// Parser state. Non-ground states own the bytes collected so far.
#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Ground,
    Escape {
        /// Charset designator or `#`, seen between ESC and the final.
        intermediate: Option<u8>,
    },
    Csi {
        buf: Vec<u8>,
    },
    /// An oversized CSI body: swallow up to the final byte, dispatch
    /// nothing.
    CsiIgnore,
    StringSeq {
        kind: StringKind,
        buf: Vec<u8>,
        /// An ESC was seen; the next byte decides between ST and abort.
        esc: bool,
    },
}

/// The escape-sequence parser.
///
/// Feed it bytes in whatever chunks the PTY produces; it returns the
/// actions completed by those bytes.
#[derive(Debug)]
pub struct Parser {
    state: State,
    /// Undecoded tail of a UTF-8 sequence split across chunks.
    pending: [u8; 4],
    pending_len: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a new parser in the ground state.
    pub fn new() -> Self {
        Self {
            state: State::Ground,
            pending: [0; 4],
            pending_len: 0,
        }
    }

    /// Drop any in-flight sequence and partial UTF-8 state.
    pub fn reset(&mut self) {
        self.state = State::Ground;
        self.pending_len = 0;
    }

    /// Process a chunk of bytes, returning the actions it completed.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Action> {
        let mut actions = Vec::new();
        for &byte in bytes {
            self.step(byte, &mut actions);
        }
        actions
    }

    fn step(&mut self, byte: u8, out: &mut Vec<Action>) {
        let state = std::mem::replace(&mut self.state, State::Ground);
        self.state = match state {
            State::Ground => self.ground(byte, out),
            State::Escape { intermediate } => self.escape(intermediate, byte, out),
            State::Csi { buf } => self.csi(buf, byte, out),
            State::CsiIgnore => self.csi_ignore(byte, out),
            State::StringSeq { kind, buf, esc } => self.string_seq(kind, buf, esc, byte, out),
        };
    }

    fn ground(&mut self, byte: u8, out: &mut Vec<Action>) -> State {
        match byte {
            0x1B => {
                self.pending_len = 0;
                State::Escape { intermediate: None }
            }
            0x00..=0x1F => {
                out.push(Action::Control(byte));
                State::Ground
            }
            0x7F => State::Ground,
            _ => {
                self.collect_utf8(byte, out);
                State::Ground
            }
        }
    }

    fn escape(&mut self, intermediate: Option<u8>, byte: u8, out: &mut Vec<Action>) -> State {
        match byte {
            // CAN and SUB abort the sequence.
            0x18 | 0x1A => State::Ground,
            0x1B => State::Escape { intermediate: None },
            // Other C0 controls execute without ending the sequence.
            0x00..=0x1F => {
                out.push(Action::Control(byte));
                State::Escape { intermediate }
            }
            0x7F => State::Escape { intermediate },
            b'[' if intermediate.is_none() => State::Csi { buf: Vec::new() },
            b']' if intermediate.is_none() => string_state(StringKind::Osc),
            b'P' if intermediate.is_none() => string_state(StringKind::Dcs),
            b'_' if intermediate.is_none() => string_state(StringKind::Apc),
            b'^' if intermediate.is_none() => string_state(StringKind::Pm),
            b'k' if intermediate.is_none() => string_state(StringKind::LegacyTitle),
            b'(' | b')' | b'*' | b'+' | b'#' if intermediate.is_none() => State::Escape {
                intermediate: Some(byte),
            },
            _ => {
                out.push(Action::Esc { intermediate, byte });
                State::Ground
            }
        }
    }

    fn csi(&mut self, mut buf: Vec<u8>, byte: u8, out: &mut Vec<Action>) -> State {
        match byte {
            0x18 | 0x1A => State::Ground,
            0x1B => State::Escape { intermediate: None },
            // C0 controls execute without disturbing the accumulation.
            0x00..=0x1F => {
                out.push(Action::Control(byte));
                State::Csi { buf }
            }
            0x7F => State::Csi { buf },
            0x40..=0x7E => {
                out.push(Action::Csi(parse_csi(&buf, byte)));
                State::Ground
            }
            _ => {
                if buf.len() >= MAX_CSI_LEN {
                    return State::CsiIgnore;
                }
                buf.push(byte);
                State::Csi { buf }
            }
        }
    }

    fn csi_ignore(&mut self, byte: u8, out: &mut Vec<Action>) -> State {
        match byte {
            0x18 | 0x1A => State::Ground,
            0x1B => State::Escape { intermediate: None },
            0x00..=0x1F => {
                out.push(Action::Control(byte));
                State::CsiIgnore
            }
            // The final byte ends the sequence; nothing is dispatched.
            0x40..=0x7E => State::Ground,
            _ => State::CsiIgnore,
        }
    }

    fn string_seq(
        &mut self,
        kind: StringKind,
        mut buf: Vec<u8>,
        esc: bool,
        byte: u8,
        out: &mut Vec<Action>,
    ) -> State {
        if esc {
            return if byte == b'\\' {
                // ESC \ is ST, the string terminator.
                dispatch_string(kind, buf, out);
                State::Ground
            } else {
                // Any other byte after ESC abandons the string and starts
                // a fresh sequence.
                self.escape(None, byte, out)
            };
        }
        match byte {
            // BEL terminates like ST (xterm extension).
            0x07 => {
                dispatch_string(kind, buf, out);
                State::Ground
            }
            0x18 | 0x1A => State::Ground,
            0x1B => State::StringSeq {
                kind,
                buf,
                esc: true,
            },
            // Remaining C0 controls and DEL are dropped inside strings.
            0x00..=0x1F | 0x7F => State::StringSeq {
                kind,
                buf,
                esc: false,
            },
            _ => {
                if buf.len() >= MAX_STRING_LEN {
                    // Too long to be meaningful: keep consuming to the
                    // terminator, then drop the whole thing.
                    return State::StringSeq {
                        kind: StringKind::Apc,
                        buf,
                        esc: false,
                    };
                }
                buf.push(byte);
                State::StringSeq {
                    kind,
                    buf,
                    esc: false,
                }
            }
        }
    }

    /// Accumulate one byte of UTF-8, emitting completed scalars and
    /// replacement characters for malformed input.
    fn collect_utf8(&mut self, byte: u8, out: &mut Vec<Action>) {
        self.pending[self.pending_len] = byte;
        self.pending_len += 1;
        loop {
            match codec::decode(&self.pending[..self.pending_len]) {
                Decode::Ok { ch, len } => {
                    out.push(Action::Print(ch));
                    self.drain_pending(len);
                }
                Decode::Incomplete => break,
                Decode::Invalid => {
                    out.push(Action::Print(REPLACEMENT));
                    self.drain_pending(1);
                }
            }
            if self.pending_len == 0 {
                break;
            }
        }
    }

    fn drain_pending(&mut self, n: usize) {
        self.pending.copy_within(n..self.pending_len, 0);
        self.pending_len -= n;
    }
}

fn string_state(kind: StringKind) -> State {
    State::StringSeq {
        kind,
        buf: Vec::new(),
        esc: false,
    }
}

/// Interpret an accumulated CSI body against its final byte.
///
/// Numeric fields separated by `;` (or `:`) become parameters, with empty
/// fields recorded as 0. A leading byte in 0x3C..=0x3F becomes the private
/// prefix. Bytes in 0x20..=0x2F are intermediates wherever they appear.
fn parse_csi(buf: &[u8], final_byte: u8) -> CsiParams {
    let mut csi = CsiParams {
        final_byte,
        ..Default::default()
    };
    let mut current: u32 = 0;
    let mut seen_digit = false;
    for &b in buf {
        match b {
            b'0'..=b'9' => {
                seen_digit = true;
                current = (current * 10 + u32::from(b - b'0')).min(u32::from(u16::MAX));
            }
            b';' | b':' => {
                csi.params.push(current as u16);
                current = 0;
                seen_digit = false;
            }
            0x3C..=0x3F if csi.prefix.is_none() && csi.params.is_empty() && !seen_digit => {
                csi.prefix = Some(b);
            }
            0x20..=0x2F => csi.intermediates.push(b),
            // Stray private bytes after parameters start; drop them.
            _ => {}
        }
    }
    if seen_digit || !csi.params.is_empty() {
        csi.params.push(current as u16);
    }
    csi
}

/// Turn a terminated string sequence into an action.
fn dispatch_string(kind: StringKind, buf: Vec<u8>, out: &mut Vec<Action>) {
    match kind {
        StringKind::Osc => {
            let (head, payload) = match buf.iter().position(|&b| b == b';') {
                Some(i) => (&buf[..i], &buf[i + 1..]),
                None => (&buf[..], &[][..]),
            };
            if head.is_empty() || !head.iter().all(u8::is_ascii_digit) {
                return;
            }
            let command = head
                .iter()
                .fold(0u32, |acc, &b| {
                    (acc * 10 + u32::from(b - b'0')).min(u32::from(u16::MAX))
                });
            out.push(Action::Osc {
                command: command as u16,
                payload: payload.to_vec(),
            });
        }
        StringKind::LegacyTitle => out.push(Action::Osc {
            command: 2,
            payload: buf,
        }),
        StringKind::Dcs => out.push(Action::Dcs(buf)),
        StringKind::Apc | StringKind::Pm => {}
    }
}
