/// Transport helpers - how session keys and rates reach the encoder
/// Query parameters, typed input, outbound links and device detection
use std::time::Duration;

use url::Url;

use crate::error::SequencerError;
use crate::sequencer::DEFAULT_RATE;

pub mod code;
pub mod device;
pub mod links;

pub use code::ScanCode;
pub use device::{is_mobile, PresentationMode};
pub use links::{blink_url, sms_link, verification_url, EmailForm};

/// Query parameter carrying the session key on the blink page.
pub const KEY_PARAM: &str = "key";

/// Query parameter carrying the blink rate in milliseconds.
pub const RATE_PARAM: &str = "rate";

/// Pick the session key: a query parameter wins over typed input.
pub fn resolve_key(query_key: Option<&str>, typed_input: Option<&str>) -> Option<String> {
    let present = |s: &&str| !s.trim().is_empty();

    query_key
        .filter(present)
        .map(|k| k.trim().to_string())
        .or_else(|| {
            typed_input
                .filter(present)
                .map(|k| k.trim().to_lowercase())
        })
}

/// Read a rate in milliseconds from loose text.
///
/// Only the leading integer is read, so `"250ms"` is 250. Missing,
/// non-numeric, or zero values fall back to the default.
/// Values beyond `u64::MAX` milliseconds are rejected, not clamped.
pub fn parse_rate(raw: Option<&str>) -> Result<Duration, SequencerError> {
    let Some(raw) = raw.map(str::trim) else {
        return Ok(DEFAULT_RATE);
    };

    let (negative, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    let digits = &unsigned[..end];
    if digits.is_empty() {
        return Ok(DEFAULT_RATE);
    }

    let millis: u64 = digits
        .parse()
        .map_err(|_| SequencerError::InvalidRate(raw.to_string()))?;
    if millis == 0 {
        Ok(DEFAULT_RATE)
    } else if negative {
        Err(SequencerError::InvalidRate(raw.to_string()))
    } else {
        Ok(Duration::from_millis(millis))
    }
}

/// Key and rate read from a launch URL. `None` means the parameter was absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LaunchParams {
    pub key: Option<String>,
    pub rate: Option<Duration>,
}

impl LaunchParams {
    pub fn from_url(url: &Url) -> Result<Self, SequencerError> {
        Self::from_query(url.query().unwrap_or(""))
    }

    pub fn from_query(query: &str) -> Result<Self, SequencerError> {
        let mut key = None;
        let mut rate = None;
        for (name, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match name.as_ref() {
                KEY_PARAM if key.is_none() => key = Some(value.into_owned()),
                RATE_PARAM if rate.is_none() => rate = Some(value.into_owned()),
                _ => {}
            }
        }

        let rate = match rate {
            Some(raw) => Some(parse_rate(Some(&raw))?),
            None => None,
        };

        Ok(Self {
            key: key.filter(|k| !k.is_empty()),
            rate,
        })
    }
}
