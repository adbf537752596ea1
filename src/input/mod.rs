//! Encoding of host input events into the byte sequences terminal
//! applications expect.
//!
//! The screen model only tracks the relevant modes (DECCKM, DECKPAM,
//! mouse protocol, bracketed paste); the host calls these helpers with
//! that state to turn key presses, mouse events and pastes into bytes
//! for the PTY write path.

use bitflags::bitflags;

use crate::core::{Modes, MouseEncoding, MouseMode};

bitflags! {
    /// Modifier keys held during an event. The bit values match the
    /// xterm CSI modifier parameter, which is `1 + bits`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1;
        const ALT = 2;
        const CTRL = 4;
    }
}

impl Modifiers {
    fn csi_param(self) -> u8 {
        1 + self.bits()
    }
}

/// The mode state keyboard encoding depends on, copied out of `Modes`
/// so hosts can encode without holding the terminal lock.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyboardState {
    pub application_cursor: bool,
    pub application_keypad: bool,
}

impl From<&Modes> for KeyboardState {
    fn from(modes: &Modes) -> Self {
        Self {
            application_cursor: modes.cursor_keys_application,
            application_keypad: modes.keypad_application,
        }
    }
}

/// Keys that encode to something other than their own character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Right,
    Left,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    Backspace,
    Tab,
    Enter,
    Escape,
    /// Function key, 1 through 12.
    F(u8),
    /// Numeric keypad character: digits, `. + - * / =`.
    Keypad(char),
    KeypadEnter,
}

/// Encode a key press. Unknown function keys encode to nothing.
pub fn encode_key(key: Key, mods: Modifiers, state: KeyboardState) -> Vec<u8> {
    match key {
        Key::Up => cursor_sequence(b'A', mods, state),
        Key::Down => cursor_sequence(b'B', mods, state),
        Key::Right => cursor_sequence(b'C', mods, state),
        Key::Left => cursor_sequence(b'D', mods, state),
        Key::Home => cursor_sequence(b'H', mods, state),
        Key::End => cursor_sequence(b'F', mods, state),
        Key::Insert => tilde_sequence(2, mods),
        Key::Delete => tilde_sequence(3, mods),
        Key::PageUp => tilde_sequence(5, mods),
        Key::PageDown => tilde_sequence(6, mods),
        Key::Backspace => {
            if mods.contains(Modifiers::CTRL) {
                vec![0x08]
            } else if mods.contains(Modifiers::ALT) {
                vec![0x1b, 0x7f]
            } else {
                vec![0x7f]
            }
        }
        Key::Tab => {
            if mods.contains(Modifiers::SHIFT) {
                b"\x1b[Z".to_vec()
            } else {
                vec![b'\t']
            }
        }
        Key::Enter => {
            if mods.contains(Modifiers::ALT) {
                vec![0x1b, b'\r']
            } else {
                vec![b'\r']
            }
        }
        Key::Escape => vec![0x1b],
        Key::F(n) => function_sequence(n, mods),
        Key::Keypad(ch) => keypad_sequence(ch, state.application_keypad),
        Key::KeypadEnter => {
            if state.application_keypad {
                b"\x1bOM".to_vec()
            } else {
                vec![b'\r']
            }
        }
    }
}

/// Arrows plus Home/End: CSI normally, SS3 in application cursor mode,
/// always CSI with an explicit modifier parameter.
fn cursor_sequence(code: u8, mods: Modifiers, state: KeyboardState) -> Vec<u8> {
    if !mods.is_empty() {
        return format!("\x1b[1;{}{}", mods.csi_param(), code as char).into_bytes();
    }
    if state.application_cursor {
        vec![0x1b, b'O', code]
    } else {
        vec![0x1b, b'[', code]
    }
}

fn tilde_sequence(number: u8, mods: Modifiers) -> Vec<u8> {
    if mods.is_empty() {
        format!("\x1b[{number}~").into_bytes()
    } else {
        format!("\x1b[{};{}~", number, mods.csi_param()).into_bytes()
    }
}

fn function_sequence(n: u8, mods: Modifiers) -> Vec<u8> {
    match n {
        // F1-F4 are SS3 P/Q/R/S
        1..=4 => {
            let code = b'P' + (n - 1);
            if mods.is_empty() {
                vec![0x1b, b'O', code]
            } else {
                format!("\x1b[1;{}{}", mods.csi_param(), code as char).into_bytes()
            }
        }
        5..=12 => {
            const NUMBERS: [u8; 8] = [15, 17, 18, 19, 20, 21, 23, 24];
            tilde_sequence(NUMBERS[usize::from(n - 5)], mods)
        }
        _ => Vec::new(),
    }
}

fn keypad_sequence(ch: char, application: bool) -> Vec<u8> {
    let code = match ch {
        '0'..='9' => b'p' + (ch as u8 - b'0'),
        '.' => b'n',
        '+' => b'k',
        '-' => b'm',
        '*' => b'j',
        '/' => b'o',
        '=' => b'X',
        _ => return ch.to_string().into_bytes(),
    };
    if application {
        vec![0x1b, b'O', code]
    } else {
        ch.to_string().into_bytes()
    }
}

/// Encode a printable character, applying Ctrl and Alt.
pub fn encode_char(ch: char, mods: Modifiers) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(5);
    if mods.contains(Modifiers::ALT) {
        bytes.push(0x1b);
    }
    if mods.contains(Modifiers::CTRL) {
        if let Some(code) = control_code(ch) {
            bytes.push(code);
            return bytes;
        }
    }
    let mut buf = [0u8; 4];
    bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
    bytes
}

fn control_code(ch: char) -> Option<u8> {
    match ch {
        ' ' | '@' => Some(0x00),
        'a'..='z' => Some(ch as u8 - b'a' + 1),
        'A'..='Z' => Some(ch as u8 - b'A' + 1),
        '[' => Some(0x1b),
        '\\' => Some(0x1c),
        ']' => Some(0x1d),
        '^' => Some(0x1e),
        '_' => Some(0x1f),
        '?' => Some(0x7f),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    Press,
    Release,
    Motion,
}

/// One mouse event in grid coordinates (0-based).
#[derive(Debug, Clone, Copy)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    /// The button involved; `None` for motion with nothing held.
    pub button: Option<MouseButton>,
    pub col: usize,
    pub row: usize,
    pub mods: Modifiers,
}

impl MouseEvent {
    fn is_wheel(&self) -> bool {
        matches!(
            self.button,
            Some(MouseButton::WheelUp) | Some(MouseButton::WheelDown)
        )
    }
}

/// Encode a mouse event under the active protocol, or `None` when the
/// mode says this event is not reported.
pub fn encode_mouse(
    event: MouseEvent,
    mode: MouseMode,
    encoding: MouseEncoding,
) -> Option<Vec<u8>> {
    match mode {
        MouseMode::None => return None,
        MouseMode::X10 => {
            if event.kind != MouseEventKind::Press || event.is_wheel() {
                return None;
            }
        }
        MouseMode::Normal => {
            if event.kind == MouseEventKind::Motion {
                return None;
            }
        }
        MouseMode::ButtonMotion => {
            if event.kind == MouseEventKind::Motion && event.button.is_none() {
                return None;
            }
        }
        MouseMode::AnyMotion => {}
    }
    // Wheels have no release to report.
    if event.is_wheel() && event.kind == MouseEventKind::Release {
        return None;
    }

    let code = button_code(&event);
    let (col, row) = (event.col + 1, event.row + 1);
    match encoding {
        MouseEncoding::X10 => {
            let cb = legacy_release(code, event.kind);
            let cx = col.min(223) as u8 + 32;
            let cy = row.min(223) as u8 + 32;
            Some(vec![0x1b, b'[', b'M', cb + 32, cx, cy])
        }
        MouseEncoding::Utf8 => {
            let cb = legacy_release(code, event.kind);
            let mut out = vec![0x1b, b'[', b'M'];
            push_utf8_coord(&mut out, u16::from(cb) + 32);
            push_utf8_coord(&mut out, col.min(2015) as u16 + 32);
            push_utf8_coord(&mut out, row.min(2015) as u16 + 32);
            Some(out)
        }
        // SGR keeps the button code on release and flips the final byte.
        MouseEncoding::Sgr => {
            let final_byte = if event.kind == MouseEventKind::Release {
                'm'
            } else {
                'M'
            };
            Some(format!("\x1b[<{code};{col};{row}{final_byte}").into_bytes())
        }
        MouseEncoding::Urxvt => {
            let cb = legacy_release(code, event.kind);
            Some(format!("\x1b[{};{};{}M", u16::from(cb) + 32, col, row).into_bytes())
        }
    }
}

fn button_code(event: &MouseEvent) -> u8 {
    let mut code = match event.button {
        Some(MouseButton::Left) => 0,
        Some(MouseButton::Middle) => 1,
        Some(MouseButton::Right) => 2,
        Some(MouseButton::WheelUp) => 64,
        Some(MouseButton::WheelDown) => 65,
        None => 3,
    };
    if event.kind == MouseEventKind::Motion {
        code += 32;
    }
    if event.mods.contains(Modifiers::SHIFT) {
        code += 4;
    }
    if event.mods.contains(Modifiers::ALT) {
        code += 8;
    }
    if event.mods.contains(Modifiers::CTRL) {
        code += 16;
    }
    code
}

/// Legacy encodings report every release as button 3, keeping the
/// modifier and motion bits.
fn legacy_release(code: u8, kind: MouseEventKind) -> u8 {
    if kind == MouseEventKind::Release {
        (code & !0x03) | 3
    } else {
        code
    }
}

/// Coordinates above 95 become two UTF-8 bytes under mode 1005.
fn push_utf8_coord(out: &mut Vec<u8>, value: u16) {
    if value < 0x80 {
        out.push(value as u8);
    } else {
        out.push(0xC0 | (value >> 6) as u8);
        out.push(0x80 | (value & 0x3F) as u8);
    }
}

/// Focus reporting (mode 1004).
pub fn encode_focus(focused: bool) -> Vec<u8> {
    if focused {
        b"\x1b[I".to_vec()
    } else {
        b"\x1b[O".to_vec()
    }
}

/// Wrap pasted text in bracketed-paste markers when the mode is on.
pub fn encode_paste(data: &str, bracketed: bool) -> Vec<u8> {
    if bracketed {
        let mut out = Vec::with_capacity(data.len() + 12);
        out.extend_from_slice(b"\x1b[200~");
        out.extend_from_slice(data.as_bytes());
        out.extend_from_slice(b"\x1b[201~");
        out
    } else {
        data.as_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrow_keys_both_modes() {
        let normal = KeyboardState::default();
        let app = KeyboardState {
            application_cursor: true,
            ..Default::default()
        };
        assert_eq!(encode_key(Key::Up, Modifiers::empty(), normal), b"\x1b[A");
        assert_eq!(encode_key(Key::Left, Modifiers::empty(), normal), b"\x1b[D");
        assert_eq!(encode_key(Key::Up, Modifiers::empty(), app), b"\x1bOA");
        assert_eq!(encode_key(Key::End, Modifiers::empty(), app), b"\x1bOF");
    }

    #[test]
    fn test_modified_arrows_use_csi() {
        let app = KeyboardState {
            application_cursor: true,
            ..Default::default()
        };
        assert_eq!(encode_key(Key::Up, Modifiers::SHIFT, app), b"\x1b[1;2A");
        assert_eq!(encode_key(Key::Up, Modifiers::CTRL, app), b"\x1b[1;5A");
        assert_eq!(
            encode_key(Key::Right, Modifiers::CTRL | Modifiers::SHIFT, app),
            b"\x1b[1;6C"
        );
    }

    #[test]
    fn test_tilde_keys() {
        let state = KeyboardState::default();
        assert_eq!(encode_key(Key::Insert, Modifiers::empty(), state), b"\x1b[2~");
        assert_eq!(encode_key(Key::Delete, Modifiers::empty(), state), b"\x1b[3~");
        assert_eq!(encode_key(Key::PageUp, Modifiers::empty(), state), b"\x1b[5~");
        assert_eq!(encode_key(Key::PageDown, Modifiers::ALT, state), b"\x1b[6;3~");
    }

    #[test]
    fn test_function_keys() {
        let state = KeyboardState::default();
        assert_eq!(encode_key(Key::F(1), Modifiers::empty(), state), b"\x1bOP");
        assert_eq!(encode_key(Key::F(4), Modifiers::empty(), state), b"\x1bOS");
        assert_eq!(encode_key(Key::F(2), Modifiers::CTRL, state), b"\x1b[1;5Q");
        assert_eq!(encode_key(Key::F(5), Modifiers::empty(), state), b"\x1b[15~");
        assert_eq!(encode_key(Key::F(12), Modifiers::empty(), state), b"\x1b[24~");
        assert!(encode_key(Key::F(13), Modifiers::empty(), state).is_empty());
    }

    #[test]
    fn test_editing_keys() {
        let state = KeyboardState::default();
        assert_eq!(encode_key(Key::Backspace, Modifiers::empty(), state), b"\x7f");
        assert_eq!(encode_key(Key::Backspace, Modifiers::CTRL, state), b"\x08");
        assert_eq!(encode_key(Key::Tab, Modifiers::empty(), state), b"\t");
        assert_eq!(encode_key(Key::Tab, Modifiers::SHIFT, state), b"\x1b[Z");
        assert_eq!(encode_key(Key::Enter, Modifiers::ALT, state), b"\x1b\r");
    }

    #[test]
    fn test_keypad_application_mode() {
        let normal = KeyboardState::default();
        let app = KeyboardState {
            application_keypad: true,
            ..Default::default()
        };
        assert_eq!(encode_key(Key::Keypad('5'), Modifiers::empty(), normal), b"5");
        assert_eq!(encode_key(Key::Keypad('5'), Modifiers::empty(), app), b"\x1bOu");
        assert_eq!(encode_key(Key::Keypad('+'), Modifiers::empty(), app), b"\x1bOk");
        assert_eq!(encode_key(Key::KeypadEnter, Modifiers::empty(), app), b"\x1bOM");
        assert_eq!(encode_key(Key::KeypadEnter, Modifiers::empty(), normal), b"\r");
    }

    #[test]
    fn test_control_characters() {
        assert_eq!(encode_char('c', Modifiers::CTRL), vec![0x03]);
        assert_eq!(encode_char('A', Modifiers::CTRL), vec![0x01]);
        assert_eq!(encode_char('[', Modifiers::CTRL), vec![0x1b]);
        assert_eq!(encode_char(' ', Modifiers::CTRL), vec![0x00]);
        assert_eq!(encode_char('x', Modifiers::ALT), b"\x1bx");
        assert_eq!(encode_char('c', Modifiers::CTRL | Modifiers::ALT), vec![0x1b, 0x03]);
        assert_eq!(encode_char('é', Modifiers::empty()), "é".as_bytes());
    }

    fn press(button: MouseButton, col: usize, row: usize) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Press,
            button: Some(button),
            col,
            row,
            mods: Modifiers::empty(),
        }
    }

    #[test]
    fn test_mouse_sgr_encoding() {
        let event = press(MouseButton::Left, 10, 5);
        let out = encode_mouse(event, MouseMode::Normal, MouseEncoding::Sgr);
        assert_eq!(out, Some(b"\x1b[<0;11;6M".to_vec()));

        let release = MouseEvent {
            kind: MouseEventKind::Release,
            ..event
        };
        let out = encode_mouse(release, MouseMode::Normal, MouseEncoding::Sgr);
        assert_eq!(out, Some(b"\x1b[<0;11;6m".to_vec()));
    }

    #[test]
    fn test_mouse_legacy_encoding() {
        let event = press(MouseButton::Left, 0, 0);
        let out = encode_mouse(event, MouseMode::Normal, MouseEncoding::X10);
        assert_eq!(out, Some(vec![0x1b, b'[', b'M', 32, 33, 33]));

        let release = MouseEvent {
            kind: MouseEventKind::Release,
            ..event
        };
        let out = encode_mouse(release, MouseMode::Normal, MouseEncoding::X10);
        assert_eq!(out, Some(vec![0x1b, b'[', b'M', 35, 33, 33]));
    }

    #[test]
    fn test_mouse_wheel_codes() {
        let event = press(MouseButton::WheelUp, 2, 2);
        let out = encode_mouse(event, MouseMode::Normal, MouseEncoding::Sgr);
        assert_eq!(out, Some(b"\x1b[<64;3;3M".to_vec()));
        // Wheel in X10 protocol is not reported at all.
        assert_eq!(encode_mouse(event, MouseMode::X10, MouseEncoding::X10), None);
    }

    #[test]
    fn test_mouse_mode_filtering() {
        let motion = MouseEvent {
            kind: MouseEventKind::Motion,
            button: None,
            col: 1,
            row: 1,
            mods: Modifiers::empty(),
        };
        assert_eq!(encode_mouse(motion, MouseMode::None, MouseEncoding::Sgr), None);
        assert_eq!(encode_mouse(motion, MouseMode::Normal, MouseEncoding::Sgr), None);
        assert_eq!(
            encode_mouse(motion, MouseMode::ButtonMotion, MouseEncoding::Sgr),
            None
        );
        // AnyMotion reports bare motion as button 3 plus the motion bit.
        assert_eq!(
            encode_mouse(motion, MouseMode::AnyMotion, MouseEncoding::Sgr),
            Some(b"\x1b[<35;2;2M".to_vec())
        );

        let dragged = MouseEvent {
            button: Some(MouseButton::Left),
            ..motion
        };
        assert_eq!(
            encode_mouse(dragged, MouseMode::ButtonMotion, MouseEncoding::Sgr),
            Some(b"\x1b[<32;2;2M".to_vec())
        );
    }

    #[test]
    fn test_mouse_utf8_wide_coordinates() {
        let event = press(MouseButton::Left, 300, 0);
        let out = encode_mouse(event, MouseMode::Normal, MouseEncoding::Utf8)
            .unwrap();
        // 300 + 1 + 32 = 333 encodes as two bytes.
        assert_eq!(&out[..4], &[0x1b, b'[', b'M', 32]);
        assert_eq!(&out[4..6], &[0xC0 | (333 >> 6) as u8, 0x80 | (333 & 0x3F) as u8]);
    }

    #[test]
    fn test_focus_and_paste() {
        assert_eq!(encode_focus(true), b"\x1b[I");
        assert_eq!(encode_focus(false), b"\x1b[O");
        assert_eq!(encode_paste("hi", false), b"hi");
        assert_eq!(encode_paste("hi", true), b"\x1b[200~hi\x1b[201~");
    }
}
