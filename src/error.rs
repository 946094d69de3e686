/// Error types shared across the crate
use thiserror::Error;

/// Why an identifier was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    Empty,
    WrongLength(usize),
    NonHexDigit(char),
    /// `0x`-style prefixes are not part of the key format.
    Prefixed,
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidReason::Empty => write!(f, "key is empty"),
            InvalidReason::WrongLength(n) => write!(f, "expected 5 characters, got {}", n),
            InvalidReason::NonHexDigit(ch) => write!(f, "'{}' is not a hex digit", ch),
            InvalidReason::Prefixed => write!(f, "key must not carry a 0x prefix"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("invalid session key {text:?}: {reason}")]
    InvalidIdentifier { text: String, reason: InvalidReason },

    #[error("value {value} does not fit in {width} bits")]
    Overflow { value: u32, width: usize },

    #[error("malformed blink sequence at position {position}: {detail}")]
    MalformedSequence { position: usize, detail: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequencerError {
    #[error("blink rate must be a positive duration, got {0}")]
    InvalidRate(String),

    #[error("a playback session is already running")]
    AlreadyRunning,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("rate_ms must be greater than zero")]
    ZeroRate,

    #[error("invalid base url: {0}")]
    BaseUrl(#[from] url::ParseError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("invalid base url {base:?}: {source}")]
    BaseUrl {
        base: String,
        #[source]
        source: url::ParseError,
    },

    #[error("cannot encode link as a scan code: {0}")]
    ScanCode(#[from] qrcode::types::QrError),
}

/// Crate-level convenience error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Sequencer(#[from] SequencerError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Link(#[from] LinkError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
