/// Scan code - QR module matrix of a blink link for a phone camera
use qrcode::{EcLevel, QrCode};
use url::Url;

use crate::error::LinkError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCode {
    width: usize,
    dark: Vec<bool>,
}

impl ScanCode {
    /// Encoded at level H so a partly obscured or glary screen still scans.
    pub fn for_url(url: &Url) -> Result<Self, LinkError> {
        let code = QrCode::with_error_correction_level(url.as_str().as_bytes(), EcLevel::H)?;
        let dark = code
            .to_colors()
            .into_iter()
            .map(|c| c == qrcode::Color::Dark)
            .collect();

        Ok(Self {
            width: code.width(),
            dark,
        })
    }

    /// Modules per side, quiet zone excluded.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.dark[y * self.width + x]
    }

    /// `(x, y)` of every dark module, row by row.
    pub fn dark_modules(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let width = self.width;
        self.dark
            .iter()
            .enumerate()
            .filter(|(_, dark)| **dark)
            .map(move |(i, _)| (i % width, i / width))
    }
}
