/// BLINKSEQ - Session keys as a looping color signal
///
/// This library provides the core components for optical key transfer:
/// - Encoding a 5-digit hex key into a framed symbol sequence
/// - A cooperative sequencer that plays the frame one symbol per tick
/// - A playback engine that drives the sequencer against a real clock
/// - Helpers for the links and launch parameters that carry the key

pub mod config;
pub mod encoder;
pub mod error;
pub mod sequencer;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use encoder::{encode, parse_identifier, to_bit_vector, to_frame, BitVector, Color, Frame, Identifier, Symbol};
pub use error::{EncodeError, Error, Result, SequencerError};
pub use sequencer::playback::{PlaybackEngine, PlaybackEvent};
pub use sequencer::{ManualClock, Sequencer, SystemClock, TimeSource, DEFAULT_RATE};
pub use transport::{is_mobile, LaunchParams, PresentationMode};
