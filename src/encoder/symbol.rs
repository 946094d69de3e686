/// Signal symbols and the reference color table
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbol {
    One,
    Zero,
    Delimiter,
    Terminator,
}

impl Symbol {
    pub const ALL: [Symbol; 4] = [
        Symbol::One,
        Symbol::Zero,
        Symbol::Delimiter,
        Symbol::Terminator,
    ];

    pub fn from_bit(bit: bool) -> Self {
        if bit {
            Symbol::One
        } else {
            Symbol::Zero
        }
    }

    /// Color an external decoder expects to capture for this symbol.
    pub fn color(self) -> Color {
        match self {
            Symbol::One => Color::GREEN,
            Symbol::Zero => Color::BLUE,
            Symbol::Terminator => Color::RED,
            Symbol::Delimiter => Color::BLACK,
        }
    }

    /// Single-letter code used in the compact sequence form.
    pub fn code(self) -> char {
        match self {
            Symbol::One => 'G',
            Symbol::Zero => 'B',
            Symbol::Delimiter => '_',
            Symbol::Terminator => 'R',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const GREEN: Color = Color::new(0x00, 0xff, 0x00);
    pub const BLUE: Color = Color::new(0x00, 0x00, 0xff);
    pub const RED: Color = Color::new(0xff, 0x00, 0x00);
    pub const BLACK: Color = Color::new(0x00, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}
