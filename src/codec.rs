//! UTF-8 decoding and encoding
//!
//! Byte streams from the PTY arrive in arbitrary chunks, so decoding must
//! report how far it got: a complete scalar, a valid-but-truncated prefix,
//! or a malformed sequence. Recovery policy lives with the caller; this
//! module only classifies.

/// Emitted in place of malformed input.
pub const REPLACEMENT: char = '\u{FFFD}';

/// Outcome of decoding the front of a byte slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decode {
    /// A complete scalar value and the number of bytes it occupied.
    Ok { ch: char, len: usize },
    /// The input is a strict prefix of a valid sequence; more bytes needed.
    Incomplete,
    /// The input starts with a malformed sequence. The caller should drop
    /// exactly one byte and retry.
    Invalid,
}

/// Decode one scalar from the front of `bytes`.
///
/// Length comes from the lead byte's high bits. Continuation bytes must
/// match `10xxxxxx`, with the second byte's window narrowed per lead so
/// overlong encodings, surrogates (0xD800..=0xDFFF) and values above
/// 0x10FFFF are rejected at the earliest byte that proves them wrong.
pub fn decode(bytes: &[u8]) -> Decode {
    let Some(&lead) = bytes.first() else {
        return Decode::Incomplete;
    };

    if lead < 0x80 {
        return Decode::Ok {
            ch: lead as char,
            len: 1,
        };
    }

    let len = match lead {
        // Continuation byte in lead position.
        0x80..=0xBF => return Decode::Invalid,
        // 0xC0/0xC1 can only encode overlong two-byte forms.
        0xC0..=0xC1 => return Decode::Invalid,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        // Leads above 0xF4 would encode past 0x10FFFF.
        _ => return Decode::Invalid,
    };

    let mut scalar = (lead & (0x7F >> len)) as u32;
    for i in 1..len {
        let Some(&b) = bytes.get(i) else {
            return Decode::Incomplete;
        };
        if !continuation_valid(lead, i, b) {
            return Decode::Invalid;
        }
        scalar = (scalar << 6) | (b & 0x3F) as u32;
    }

    match char::from_u32(scalar) {
        Some(ch) => Decode::Ok { ch, len },
        None => Decode::Invalid,
    }
}

/// Continuation-byte check. The second byte of E0/ED/F0/F4 sequences gets
/// a narrowed window: the full `10xxxxxx` range there would admit overlong
/// forms, surrogates, or scalars past 0x10FFFF.
fn continuation_valid(lead: u8, index: usize, byte: u8) -> bool {
    if index == 1 {
        match lead {
            0xE0 => return (0xA0..=0xBF).contains(&byte),
            0xED => return (0x80..=0x9F).contains(&byte),
            0xF0 => return (0x90..=0xBF).contains(&byte),
            0xF4 => return (0x80..=0x8F).contains(&byte),
            _ => {}
        }
    }
    byte & 0xC0 == 0x80
}

/// Encode `ch` into `buf`, returning the number of bytes written (1..=4).
pub fn encode(ch: char, buf: &mut [u8; 4]) -> usize {
    let scalar = ch as u32;
    if scalar < 0x80 {
        buf[0] = scalar as u8;
        1
    } else if scalar < 0x800 {
        buf[0] = 0xC0 | (scalar >> 6) as u8;
        buf[1] = 0x80 | (scalar & 0x3F) as u8;
        2
    } else if scalar < 0x1_0000 {
        buf[0] = 0xE0 | (scalar >> 12) as u8;
        buf[1] = 0x80 | ((scalar >> 6) & 0x3F) as u8;
        buf[2] = 0x80 | (scalar & 0x3F) as u8;
        3
    } else {
        buf[0] = 0xF0 | (scalar >> 18) as u8;
        buf[1] = 0x80 | ((scalar >> 12) & 0x3F) as u8;
        buf[2] = 0x80 | ((scalar >> 6) & 0x3F) as u8;
        buf[3] = 0x80 | (scalar & 0x3F) as u8;
        4
    }
}
