/// Encoder - turns a session key into a framed blink sequence
/// This is pure and stateless; playback timing lives in the sequencer
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EncodeError, InvalidReason};

pub mod symbol;

pub use symbol::{Color, Symbol};

/// Number of hex digits in a session key.
pub const KEY_LEN: usize = 5;

/// Number of bits carried by one frame.
pub const BIT_WIDTH: usize = 20;

/// Symbols per frame: a bit and a delimiter per bit, then the terminator.
pub const FRAME_LEN: usize = BIT_WIDTH * 2 + 1;

/// A validated 5-digit hex session key, stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier {
    text: String,
    value: u32,
}

impl Identifier {
    /// Case is normalized here, so callers never need to lowercase first.
    /// Whitespace is not stripped; it counts toward the length.
    pub fn parse(text: &str) -> Result<Self, EncodeError> {
        let normalized = text.to_ascii_lowercase();
        let invalid = |reason| EncodeError::InvalidIdentifier {
            text: text.to_string(),
            reason,
        };

        if normalized.is_empty() {
            return Err(invalid(InvalidReason::Empty));
        }
        if normalized.starts_with("0x") {
            return Err(invalid(InvalidReason::Prefixed));
        }
        let len = normalized.chars().count();
        if len != KEY_LEN {
            return Err(invalid(InvalidReason::WrongLength(len)));
        }
        if let Some(ch) = normalized.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(invalid(InvalidReason::NonHexDigit(ch)));
        }

        // Five validated hex digits always fit in a u32.
        let value = u32::from_str_radix(&normalized, 16)
            .map_err(|_| invalid(InvalidReason::NonHexDigit('?')))?;

        Ok(Self {
            text: normalized,
            value,
        })
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn to_frame(&self) -> Result<Frame, EncodeError> {
        Ok(to_frame(&to_bit_vector(self.value)?))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Identifier {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = EncodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.text
    }
}

/// Fixed-width binary rendering of a key, most significant bit first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BitVector(String);

impl BitVector {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.chars().map(|c| c == '1')
    }
}

impl fmt::Display for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One complete, self-terminating symbol sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    symbols: Vec<Symbol>,
}

impl Frame {
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Symbol> {
        self.symbols.get(index).copied()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.symbols.iter().copied()
    }

    /// Parse the compact `G`/`B`/`_`/`R` form back into a frame.
    pub fn from_sequence(sequence: &str) -> Result<Self, EncodeError> {
        let malformed = |position, detail: String| EncodeError::MalformedSequence { position, detail };

        let codes: Vec<char> = sequence.chars().collect();
        if codes.len() != FRAME_LEN {
            return Err(malformed(
                codes.len().min(FRAME_LEN),
                format!("expected {} symbols, got {}", FRAME_LEN, codes.len()),
            ));
        }

        let mut symbols = Vec::with_capacity(FRAME_LEN);
        for (position, &code) in codes.iter().enumerate() {
            let symbol = Symbol::from_code(code)
                .ok_or_else(|| malformed(position, format!("unknown symbol code {:?}", code)))?;

            let expected_ok = if position == FRAME_LEN - 1 {
                symbol == Symbol::Terminator
            } else if position % 2 == 1 {
                symbol == Symbol::Delimiter
            } else {
                matches!(symbol, Symbol::One | Symbol::Zero)
            };
            if !expected_ok {
                return Err(malformed(position, format!("unexpected {:?}", symbol)));
            }
            symbols.push(symbol);
        }

        Ok(Self { symbols })
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.symbols {
            write!(f, "{}", symbol.code())?;
        }
        Ok(())
    }
}

pub fn parse_identifier(text: &str) -> Result<u32, EncodeError> {
    Identifier::parse(text).map(|id| id.value())
}

/// Render `value` as a zero-padded 20-bit string.
///
/// `16^5 == 2^20`, so every valid key fits; the width check still guards
/// values that did not come from `parse_identifier`.
pub fn to_bit_vector(value: u32) -> Result<BitVector, EncodeError> {
    if value >> BIT_WIDTH != 0 {
        return Err(EncodeError::Overflow {
            value,
            width: BIT_WIDTH,
        });
    }
    Ok(BitVector(format!("{:0width$b}", value, width = BIT_WIDTH)))
}

pub fn to_frame(bits: &BitVector) -> Frame {
    let mut symbols = Vec::with_capacity(FRAME_LEN);
    for bit in bits.bits() {
        symbols.push(Symbol::from_bit(bit));
        symbols.push(Symbol::Delimiter);
    }
    symbols.push(Symbol::Terminator);
    Frame { symbols }
}

/// Full pipeline: key text to frame.
pub fn encode(text: &str) -> Result<Frame, EncodeError> {
    Identifier::parse(text)?.to_frame()
}
