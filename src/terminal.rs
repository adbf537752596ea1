//! Terminal executor
//!
//! Ties the parser and the screen model together: bytes go in, parsed
//! actions are interpreted against the screen, and anything the
//! application asked to be told (cursor position, device attributes,
//! setting reports) is queued as response bytes for the host to write
//! back to the PTY.

use crate::core::{
    CellFlags, Charset, Color, CursorShape, MouseEncoding, MouseMode, Rgb, Screen, Snapshot,
};
use crate::parser::{Action, CsiParams, Parser};

/// The terminal: parser, screen state and pending host-visible effects.
#[derive(Debug)]
pub struct Terminal {
    screen: Screen,
    parser: Parser,
    /// Bytes owed to the application (DSR, DA, DECRQSS, OSC queries).
    responses: Vec<u8>,
    /// BEL was seen since the host last asked.
    bell: bool,
    /// Base64 payload of the latest OSC 52 write, for the host to decode.
    clipboard_offer: Option<String>,
}

impl Terminal {
    pub fn new(cols: usize, rows: usize, scrollback_capacity: usize) -> Self {
        Self {
            screen: Screen::new(cols, rows, scrollback_capacity),
            parser: Parser::new(),
            responses: Vec::new(),
            bell: false,
            clipboard_offer: None,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    /// Process a chunk of application output.
    pub fn process(&mut self, bytes: &[u8]) {
        for action in self.parser.feed(bytes) {
            self.apply(action);
        }
    }

    /// Apply one parsed action.
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Print(ch) => self.screen.print(ch),
            Action::Control(byte) => self.control(byte),
            Action::Esc { intermediate, byte } => self.esc_dispatch(intermediate, byte),
            Action::Csi(csi) => self.csi_dispatch(csi),
            Action::Osc { command, payload } => self.osc_dispatch(command, &payload),
            Action::Dcs(payload) => self.dcs_dispatch(&payload),
        }
    }

    /// Drain the bytes owed to the application.
    pub fn take_responses(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.responses)
    }

    /// True once if BEL arrived since the last call.
    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell)
    }

    /// Clipboard data offered via OSC 52, still base64 encoded.
    pub fn take_clipboard_offer(&mut self) -> Option<String> {
        self.clipboard_offer.take()
    }

    /// Wrap pasted bytes in bracketed-paste markers when the application
    /// asked for them.
    pub fn paste_bytes(&self, data: &[u8]) -> Vec<u8> {
        if self.screen.modes.bracketed_paste {
            let mut out = Vec::with_capacity(data.len() + 12);
            out.extend_from_slice(b"\x1b[200~");
            out.extend_from_slice(data);
            out.extend_from_slice(b"\x1b[201~");
            out
        } else {
            data.to_vec()
        }
    }

    /// Resize the grid. Returns false when the size did not change.
    pub fn resize(&mut self, cols: usize, rows: usize) -> bool {
        self.screen.resize(cols, rows)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_screen(&self.screen)
    }

    fn respond(&mut self, bytes: &[u8]) {
        self.responses.extend_from_slice(bytes);
    }

    fn control(&mut self, byte: u8) {
        match byte {
            // BEL
            0x07 => self.bell = true,
            // BS
            0x08 => self.screen.backspace(),
            // HT
            0x09 => self.screen.tab_forward(1),
            // LF, VT, FF
            0x0A | 0x0B | 0x0C => {
                if self.screen.modes.newline {
                    self.screen.carriage_return();
                }
                self.screen.linefeed();
            }
            // CR
            0x0D => self.screen.carriage_return(),
            // SO: lock shift to G1
            0x0E => self.screen.cursor_mut().charsets.shift(1),
            // SI: lock shift to G0
            0x0F => self.screen.cursor_mut().charsets.shift(0),
            _ => {}
        }
    }

    fn esc_dispatch(&mut self, intermediate: Option<u8>, byte: u8) {
        match (intermediate, byte) {
            (Some(b'('), b) => self.designate(0, b),
            (Some(b')'), b) => self.designate(1, b),
            (Some(b'*'), b) => self.designate(2, b),
            (Some(b'+'), b) => self.designate(3, b),
            // DECALN
            (Some(b'#'), b'8') => self.screen.align_test(),
            (Some(i), b) => {
                tracing::debug!("ignored ESC {} {}", i as char, b as char);
            }
            // DECSC / DECRC
            (None, b'7') => self.screen.save_cursor(),
            (None, b'8') => self.screen.restore_cursor(),
            // IND
            (None, b'D') => self.screen.linefeed(),
            // NEL
            (None, b'E') => self.screen.next_line(),
            // HTS
            (None, b'H') => self.screen.set_tab_stop(),
            // RI
            (None, b'M') => self.screen.reverse_index(),
            // DECID, answered like DA1
            (None, b'Z') => self.respond(b"\x1b[?1;2c"),
            // RIS
            (None, b'c') => {
                self.screen.reset();
                self.parser.reset();
            }
            // DECKPAM / DECKPNM
            (None, b'=') => self.screen.modes.keypad_application = true,
            (None, b'>') => self.screen.modes.keypad_application = false,
            // LS2 / LS3
            (None, b'n') => self.screen.cursor_mut().charsets.shift(2),
            (None, b'o') => self.screen.cursor_mut().charsets.shift(3),
            (None, b) => {
                tracing::debug!("ignored ESC {}", b as char);
            }
        }
    }

    fn designate(&mut self, slot: usize, byte: u8) {
        let charset = Charset::from_designator(byte);
        self.screen.cursor_mut().charsets.designate(slot, charset);
    }

    fn csi_dispatch(&mut self, csi: CsiParams) {
        if let Some(prefix) = csi.prefix {
            match (prefix, csi.final_byte) {
                // DECSET / DECRST
                (b'?', b'h') => {
                    for i in 0..csi.params.len().max(1) {
                        self.set_dec_mode(csi.param(i, 0), true);
                    }
                }
                (b'?', b'l') => {
                    for i in 0..csi.params.len().max(1) {
                        self.set_dec_mode(csi.param(i, 0), false);
                    }
                }
                // Secondary DA
                (b'>', b'c') => self.respond(b"\x1b[>0;10;0c"),
                _ => tracing::debug!(
                    "unhandled private CSI {} ... {}",
                    prefix as char,
                    csi.final_byte as char
                ),
            }
            return;
        }

        match csi.final_byte {
            // ICH
            b'@' => self.screen.insert_chars(csi.param_or(0, 1) as usize),
            // CUU
            b'A' => self.screen.move_up(csi.param_or(0, 1) as usize),
            // CUD, VPR
            b'B' | b'e' => self.screen.move_down(csi.param_or(0, 1) as usize),
            // CUF, HPR
            b'C' | b'a' => self.screen.move_forward(csi.param_or(0, 1) as usize),
            // CUB
            b'D' => self.screen.move_backward(csi.param_or(0, 1) as usize),
            // CNL
            b'E' => {
                self.screen.move_down(csi.param_or(0, 1) as usize);
                self.screen.carriage_return();
            }
            // CPL
            b'F' => {
                self.screen.move_up(csi.param_or(0, 1) as usize);
                self.screen.carriage_return();
            }
            // CHA, HPA
            b'G' | b'`' => {
                let col = csi.param_or(0, 1).saturating_sub(1) as usize;
                self.screen.move_to_col(col);
            }
            // CUP, HVP
            b'H' | b'f' => {
                let row = csi.param_or(0, 1).saturating_sub(1) as usize;
                let col = csi.param_or(1, 1).saturating_sub(1) as usize;
                self.screen.move_to(row, col);
            }
            // CHT
            b'I' => self.screen.tab_forward(csi.param_or(0, 1) as usize),
            // ED
            b'J' => self.screen.erase_in_display(csi.param(0, 0)),
            // EL
            b'K' => self.screen.erase_in_line(csi.param(0, 0)),
            // IL
            b'L' => self.screen.insert_lines(csi.param_or(0, 1) as usize),
            // DL
            b'M' => self.screen.delete_lines(csi.param_or(0, 1) as usize),
            // DCH
            b'P' => self.screen.delete_chars(csi.param_or(0, 1) as usize),
            // SU
            b'S' => self.screen.scroll_up(csi.param_or(0, 1) as usize),
            // SD
            b'T' => self.screen.scroll_down(csi.param_or(0, 1) as usize),
            // ECH
            b'X' => self.screen.erase_chars(csi.param_or(0, 1) as usize),
            // CBT
            b'Z' => self.screen.tab_backward(csi.param_or(0, 1) as usize),
            // REP
            b'b' => self.screen.repeat_last(csi.param_or(0, 1) as usize),
            // Primary DA
            b'c' => {
                if csi.param(0, 0) == 0 {
                    self.respond(b"\x1b[?1;2c");
                }
            }
            // VPA
            b'd' => {
                let row = csi.param_or(0, 1).saturating_sub(1) as usize;
                self.screen.move_to_row(row);
            }
            // TBC
            b'g' => match csi.param(0, 0) {
                0 => self.screen.clear_tab_stop(),
                3 => self.screen.clear_all_tab_stops(),
                _ => {}
            },
            // SM / RM
            b'h' => {
                for i in 0..csi.params.len().max(1) {
                    self.set_ansi_mode(csi.param(i, 0), true);
                }
            }
            b'l' => {
                for i in 0..csi.params.len().max(1) {
                    self.set_ansi_mode(csi.param(i, 0), false);
                }
            }
            // SGR
            b'm' => self.apply_sgr(&csi.params),
            // DSR
            b'n' => match csi.param(0, 0) {
                5 => self.respond(b"\x1b[0n"),
                6 => self.cursor_position_report(),
                _ => {}
            },
            // DECSTR
            b'p' if csi.intermediate() == Some(b'!') => self.screen.soft_reset(),
            // DECSCUSR
            b'q' if csi.intermediate() == Some(b' ') => {
                self.set_cursor_style(csi.param(0, 0));
            }
            // DECSTBM
            b'r' => {
                let top = csi.param_or(0, 1).saturating_sub(1) as usize;
                let bottom = csi.param_or(1, self.screen.rows() as u16).saturating_sub(1) as usize;
                self.screen.set_scroll_region(top, bottom);
            }
            // SCOSC / SCORC
            b's' => self.screen.save_cursor(),
            b'u' => self.screen.restore_cursor(),
            _ => tracing::debug!(
                "unhandled CSI: params={:?} intermediates={:?} final={}",
                csi.params,
                csi.intermediates,
                csi.final_byte as char
            ),
        }
    }

    /// CPR. Reported row is region-relative while origin mode is on.
    fn cursor_position_report(&mut self) {
        let cursor = self.screen.cursor();
        let row = if self.screen.modes.origin {
            cursor.row - self.screen.scroll_region().0 + 1
        } else {
            cursor.row + 1
        };
        let report = format!("\x1b[{};{}R", row, cursor.col + 1);
        self.respond(report.as_bytes());
    }

    fn set_dec_mode(&mut self, mode: u16, enable: bool) {
        match mode {
            // DECCKM
            1 => self.screen.modes.cursor_keys_application = enable,
            // DECCOLM: tracked, the grid is not resized
            3 => self.screen.modes.column_132 = enable,
            // DECSCNM
            5 => self.screen.modes.reverse_video = enable,
            // DECOM
            6 => self.screen.set_origin_mode(enable),
            // DECAWM
            7 => self.screen.modes.autowrap = enable,
            // X10 mouse
            9 => self.set_mouse_mode(MouseMode::X10, enable),
            // att610 cursor blink
            12 => self.screen.modes.cursor_blink = enable,
            // DECTCEM
            25 => self.screen.modes.cursor_visible = enable,
            // Alternate screen, plain swap
            47 => {
                if enable {
                    self.screen.enter_alternate(false);
                } else {
                    self.screen.exit_alternate();
                }
            }
            // DECNKM
            66 => self.screen.modes.keypad_application = enable,
            1000 => self.set_mouse_mode(MouseMode::Normal, enable),
            1002 => self.set_mouse_mode(MouseMode::ButtonMotion, enable),
            1003 => self.set_mouse_mode(MouseMode::AnyMotion, enable),
            1004 => self.screen.modes.focus_reporting = enable,
            1005 => self.set_mouse_encoding(MouseEncoding::Utf8, enable),
            1006 => self.set_mouse_encoding(MouseEncoding::Sgr, enable),
            1015 => self.set_mouse_encoding(MouseEncoding::Urxvt, enable),
            // Alternate screen, cleared on entry
            1047 => {
                if enable {
                    self.screen.enter_alternate(true);
                } else {
                    self.screen.exit_alternate();
                }
            }
            1048 => {
                if enable {
                    self.screen.save_cursor();
                } else {
                    self.screen.restore_cursor();
                }
            }
            // Alternate screen with cursor save, the modern pairing
            1049 => {
                if enable {
                    self.screen.save_cursor();
                    self.screen.enter_alternate(true);
                } else {
                    self.screen.exit_alternate();
                    self.screen.restore_cursor();
                }
            }
            2004 => self.screen.modes.bracketed_paste = enable,
            _ => tracing::debug!("unknown DEC mode: {} = {}", mode, enable),
        }
    }

    fn set_mouse_mode(&mut self, mode: MouseMode, enable: bool) {
        self.screen.modes.mouse_mode = if enable { mode } else { MouseMode::None };
    }

    fn set_mouse_encoding(&mut self, encoding: MouseEncoding, enable: bool) {
        if enable {
            self.screen.modes.mouse_encoding = encoding;
        } else if self.screen.modes.mouse_encoding == encoding {
            self.screen.modes.mouse_encoding = MouseEncoding::X10;
        }
    }

    fn set_ansi_mode(&mut self, mode: u16, enable: bool) {
        match mode {
            // IRM
            4 => self.screen.modes.insert = enable,
            // LNM
            20 => self.screen.modes.newline = enable,
            _ => tracing::debug!("unknown ANSI mode: {} = {}", mode, enable),
        }
    }

    fn set_cursor_style(&mut self, param: u16) {
        let (shape, blink) = match param {
            0 | 1 => (CursorShape::Block, true),
            2 => (CursorShape::Block, false),
            3 => (CursorShape::Underline, true),
            4 => (CursorShape::Underline, false),
            5 => (CursorShape::Bar, true),
            6 => (CursorShape::Bar, false),
            _ => return,
        };
        self.screen.cursor_mut().shape = shape;
        self.screen.modes.cursor_blink = blink;
    }

    fn apply_sgr(&mut self, params: &[u16]) {
        let cursor = self.screen.cursor_mut();
        if params.is_empty() {
            cursor.reset_sgr();
            return;
        }
        let mut i = 0;
        while i < params.len() {
            match params[i] {
                0 => cursor.reset_sgr(),
                1 => cursor.flags.insert(CellFlags::BOLD),
                2 => cursor.flags.insert(CellFlags::FAINT),
                3 => cursor.flags.insert(CellFlags::ITALIC),
                4 => cursor.flags.insert(CellFlags::UNDERLINE),
                5 | 6 => cursor.flags.insert(CellFlags::BLINK),
                7 => cursor.flags.insert(CellFlags::INVERSE),
                8 => cursor.flags.insert(CellFlags::HIDDEN),
                9 => cursor.flags.insert(CellFlags::STRIKE),
                // Double underline, carried as plain underline.
                21 => cursor.flags.insert(CellFlags::UNDERLINE),
                22 => cursor.flags.remove(CellFlags::BOLD | CellFlags::FAINT),
                23 => cursor.flags.remove(CellFlags::ITALIC),
                24 => cursor.flags.remove(CellFlags::UNDERLINE),
                25 => cursor.flags.remove(CellFlags::BLINK),
                27 => cursor.flags.remove(CellFlags::INVERSE),
                28 => cursor.flags.remove(CellFlags::HIDDEN),
                29 => cursor.flags.remove(CellFlags::STRIKE),
                30..=37 => cursor.fg = Color::Indexed((params[i] - 30) as u8),
                39 => cursor.fg = Color::Default,
                40..=47 => cursor.bg = Color::Indexed((params[i] - 40) as u8),
                49 => cursor.bg = Color::Default,
                90..=97 => cursor.fg = Color::Indexed((params[i] - 90 + 8) as u8),
                100..=107 => cursor.bg = Color::Indexed((params[i] - 100 + 8) as u8),
                38 | 48 => {
                    let foreground = params[i] == 38;
                    let color = match params.get(i + 1).copied() {
                        Some(5) => {
                            let index = params.get(i + 2).copied();
                            i += 2;
                            index.map(|n| Color::Indexed(n.min(255) as u8))
                        }
                        Some(2) => {
                            let parts = (params.get(i + 2), params.get(i + 3), params.get(i + 4));
                            i += 4;
                            match parts {
                                (Some(&r), Some(&g), Some(&b)) => Some(Color::Rgb(
                                    r.min(255) as u8,
                                    g.min(255) as u8,
                                    b.min(255) as u8,
                                )),
                                _ => None,
                            }
                        }
                        _ => None,
                    };
                    if let Some(color) = color {
                        if foreground {
                            cursor.fg = color;
                        } else {
                            cursor.bg = color;
                        }
                    }
                }
                other => tracing::debug!("ignored SGR attribute {}", other),
            }
            i += 1;
        }
    }

    fn osc_dispatch(&mut self, command: u16, payload: &[u8]) {
        let text = String::from_utf8_lossy(payload);
        match command {
            // Title and icon name, treated alike
            0 | 1 | 2 => self.screen.set_title(text.into_owned()),
            // Palette set / query, repeating index;spec pairs
            4 => self.osc_set_color(&text),
            10 | 11 => self.osc_default_color(command, &text),
            // Clipboard write; queries need host-side data and are dropped
            52 => {
                if let Some((_, data)) = text.split_once(';') {
                    if data != "?" {
                        self.clipboard_offer = Some(data.to_string());
                    }
                }
            }
            // Palette reset
            104 => {
                if text.is_empty() {
                    self.screen.palette_mut().reset_all();
                } else {
                    for field in text.split(';') {
                        if let Ok(index) = field.parse::<u8>() {
                            self.screen.palette_mut().reset_entry(index);
                        }
                    }
                }
            }
            _ => tracing::debug!("unknown OSC {}: {}", command, text),
        }
    }

    fn osc_set_color(&mut self, payload: &str) {
        let mut fields = payload.split(';');
        while let (Some(index), Some(spec)) = (fields.next(), fields.next()) {
            let Ok(index) = index.parse::<u8>() else {
                continue;
            };
            if spec == "?" {
                let rgb = self.screen.palette().entry(index);
                let reply = format!("\x1b]4;{};{}\x1b\\", index, x11_color(rgb));
                self.respond(reply.as_bytes());
            } else if let Some(rgb) = parse_color_spec(spec) {
                self.screen.palette_mut().set_entry(index, rgb);
            }
        }
    }

    fn osc_default_color(&mut self, command: u16, payload: &str) {
        if payload == "?" {
            let rgb = if command == 10 {
                self.screen.palette().default_fg()
            } else {
                self.screen.palette().default_bg()
            };
            let reply = format!("\x1b]{};{}\x1b\\", command, x11_color(rgb));
            self.respond(reply.as_bytes());
        } else if let Some(rgb) = parse_color_spec(payload) {
            if command == 10 {
                self.screen.palette_mut().set_default_fg(rgb);
            } else {
                self.screen.palette_mut().set_default_bg(rgb);
            }
        }
    }

    /// DECRQSS: report a setting back as `DCS 1 $ r ... ST`, or reject
    /// with `DCS 0 $ r ST`.
    fn dcs_dispatch(&mut self, payload: &[u8]) {
        let Some(request) = payload.strip_prefix(b"$q") else {
            tracing::debug!("ignored DCS: {:?}", payload);
            return;
        };
        let reply = match request {
            b"m" => Some(format!("{}m", self.sgr_report())),
            b"r" => {
                let (top, bottom) = self.screen.scroll_region();
                Some(format!("{};{}r", top + 1, bottom + 1))
            }
            b"\"q" => Some("0\"q".to_string()),
            b"\"p" => Some("64;1\"p".to_string()),
            b" q" => Some(format!("{} q", self.cursor_style_code())),
            _ => None,
        };
        match reply {
            Some(reply) => {
                self.respond(b"\x1bP1$r");
                self.respond(reply.as_bytes());
                self.respond(b"\x1b\\");
            }
            None => self.respond(b"\x1bP0$r\x1b\\"),
        }
    }

    fn sgr_report(&self) -> String {
        let cursor = self.screen.cursor();
        let mut parts = vec!["0".to_string()];
        for (flag, code) in [
            (CellFlags::BOLD, 1),
            (CellFlags::FAINT, 2),
            (CellFlags::ITALIC, 3),
            (CellFlags::UNDERLINE, 4),
            (CellFlags::BLINK, 5),
            (CellFlags::INVERSE, 7),
            (CellFlags::HIDDEN, 8),
            (CellFlags::STRIKE, 9),
        ] {
            if cursor.flags.contains(flag) {
                parts.push(code.to_string());
            }
        }
        match cursor.fg {
            Color::Default => {}
            Color::Indexed(i) if i < 8 => parts.push((30 + u16::from(i)).to_string()),
            Color::Indexed(i) if i < 16 => parts.push((82 + u16::from(i)).to_string()),
            Color::Indexed(i) => parts.push(format!("38;5;{i}")),
            Color::Rgb(r, g, b) => parts.push(format!("38;2;{r};{g};{b}")),
        }
        match cursor.bg {
            Color::Default => {}
            Color::Indexed(i) if i < 8 => parts.push((40 + u16::from(i)).to_string()),
            Color::Indexed(i) if i < 16 => parts.push((92 + u16::from(i)).to_string()),
            Color::Indexed(i) => parts.push(format!("48;5;{i}")),
            Color::Rgb(r, g, b) => parts.push(format!("48;2;{r};{g};{b}")),
        }
        parts.join(";")
    }

    fn cursor_style_code(&self) -> u16 {
        let blink = self.screen.modes.cursor_blink;
        match (self.screen.cursor().shape, blink) {
            (CursorShape::Block, true) => 1,
            (CursorShape::Block, false) => 2,
            (CursorShape::Underline, true) => 3,
            (CursorShape::Underline, false) => 4,
            (CursorShape::Bar, true) => 5,
            (CursorShape::Bar, false) => 6,
        }
    }
}

/// Format a color the way xterm answers queries: 16-bit components.
fn x11_color(rgb: Rgb) -> String {
    format!(
        "rgb:{:04x}/{:04x}/{:04x}",
        u16::from(rgb.r) * 257,
        u16::from(rgb.g) * 257,
        u16::from(rgb.b) * 257
    )
}

/// Parse `rgb:RR/GG/BB` (1-4 hex digits per component) or `#RRGGBB`.
fn parse_color_spec(spec: &str) -> Option<Rgb> {
    if let Some(rest) = spec.strip_prefix("rgb:") {
        let mut parts = rest.split('/');
        let r = scaled_component(parts.next()?)?;
        let g = scaled_component(parts.next()?)?;
        let b = scaled_component(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }
        return Some(Rgb::new(r, g, b));
    }
    let hex = spec.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Rgb::new(r, g, b))
}

/// Scale a 1-4 digit hex component to 8 bits.
fn scaled_component(field: &str) -> Option<u8> {
    if field.is_empty() || field.len() > 4 {
        return None;
    }
    let value = u32::from_str_radix(field, 16).ok()?;
    let max = (1u32 << (4 * field.len() as u32)) - 1;
    Some((value * 255 / max) as u8)
}
