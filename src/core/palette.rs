//! Color palette
//!
//! The 256-entry palette plus default foreground/background, owned by the
//! screen so themes and OSC color changes stay per-terminal. Resolution
//! from symbolic [`Color`] values to concrete RGB happens here, including
//! the bold-brightens-basic-colors rule.

use super::cell::Color;

/// A concrete 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Typical xterm defaults for the 16 base entries.
const ANSI_16: [Rgb; 16] = [
    Rgb::new(0, 0, 0),
    Rgb::new(205, 0, 0),
    Rgb::new(0, 205, 0),
    Rgb::new(205, 205, 0),
    Rgb::new(0, 0, 238),
    Rgb::new(205, 0, 205),
    Rgb::new(0, 205, 205),
    Rgb::new(229, 229, 229),
    Rgb::new(127, 127, 127),
    Rgb::new(255, 0, 0),
    Rgb::new(0, 255, 0),
    Rgb::new(255, 255, 0),
    Rgb::new(92, 92, 255),
    Rgb::new(255, 0, 255),
    Rgb::new(0, 255, 255),
    Rgb::new(255, 255, 255),
];

const DEFAULT_FG: Rgb = Rgb::new(229, 229, 229);
const DEFAULT_BG: Rgb = Rgb::new(0, 0, 0);

/// Standard xterm value for a palette index: the 16 base colors, the
/// 6x6x6 cube (16-231), and the grayscale ramp (232-255).
pub fn standard_color(index: u8) -> Rgb {
    match index {
        0..=15 => ANSI_16[index as usize],
        16..=231 => {
            let n = index - 16;
            let channel = |v: u8| if v == 0 { 0 } else { 55 + v * 40 };
            Rgb::new(channel(n / 36), channel((n % 36) / 6), channel(n % 6))
        }
        232..=255 => {
            let gray = 8 + (index - 232) * 10;
            Rgb::new(gray, gray, gray)
        }
    }
}

/// Brighten a color by 25%, clamped per channel. Used to derive bright
/// variants when a theme supplies only the eight base colors.
pub fn brighten(color: Rgb) -> Rgb {
    let scale = |v: u8| ((u16::from(v) * 5) / 4).min(255) as u8;
    Rgb::new(scale(color.r), scale(color.g), scale(color.b))
}

/// The terminal's color table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [Rgb; 256],
    default_fg: Rgb,
    default_bg: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

impl Palette {
    /// A palette filled with the standard xterm colors.
    pub fn new() -> Self {
        let mut colors = [Rgb::new(0, 0, 0); 256];
        for (i, slot) in colors.iter_mut().enumerate() {
            *slot = standard_color(i as u8);
        }
        Self {
            colors,
            default_fg: DEFAULT_FG,
            default_bg: DEFAULT_BG,
        }
    }

    /// Seed entries 0-7 (and through 15 when provided) from a theme.
    /// With only eight colors given, the bright half is derived by
    /// brightening. Shorter slices leave the palette untouched.
    pub fn set_theme(&mut self, base: &[Rgb]) {
        if base.len() < 8 {
            return;
        }
        for i in 0..8 {
            self.colors[i] = base[i];
        }
        for i in 8..16 {
            self.colors[i] = if base.len() > i {
                base[i]
            } else {
                brighten(base[i - 8])
            };
        }
    }

    pub fn default_fg(&self) -> Rgb {
        self.default_fg
    }

    pub fn default_bg(&self) -> Rgb {
        self.default_bg
    }

    pub fn set_default_fg(&mut self, color: Rgb) {
        self.default_fg = color;
    }

    pub fn set_default_bg(&mut self, color: Rgb) {
        self.default_bg = color;
    }

    /// Current value of a palette entry.
    pub fn entry(&self, index: u8) -> Rgb {
        self.colors[index as usize]
    }

    /// Replace one entry (OSC 4).
    pub fn set_entry(&mut self, index: u8, color: Rgb) {
        self.colors[index as usize] = color;
    }

    /// Restore one entry to its standard value (OSC 104 with arguments).
    pub fn reset_entry(&mut self, index: u8) {
        self.colors[index as usize] = standard_color(index);
    }

    /// Restore every entry and the defaults (OSC 104 without arguments).
    pub fn reset_all(&mut self) {
        for (i, slot) in self.colors.iter_mut().enumerate() {
            *slot = standard_color(i as u8);
        }
        self.default_fg = DEFAULT_FG;
        self.default_bg = DEFAULT_BG;
    }

    /// Resolve a foreground color. Bold maps the basic entries 0-7 onto
    /// their bright counterparts; indexes 8 and above and direct RGB are
    /// left alone.
    pub fn resolve_fg(&self, color: Color, bold: bool) -> Rgb {
        match color {
            Color::Default => self.default_fg,
            Color::Indexed(i) => {
                let i = if bold && i < 8 { i + 8 } else { i };
                self.colors[i as usize]
            }
            Color::Rgb(r, g, b) => Rgb::new(r, g, b),
        }
    }

    /// Resolve a background color. Never brightened.
    pub fn resolve_bg(&self, color: Color) -> Rgb {
        match color {
            Color::Default => self.default_bg,
            Color::Indexed(i) => self.colors[i as usize],
            Color::Rgb(r, g, b) => Rgb::new(r, g, b),
        }
    }
}
