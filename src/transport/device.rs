/// Device-class detection for choosing how the signal is presented
use std::sync::OnceLock;

use regex::Regex;

const MOBILE_AGENTS: &str = r"(?i)Android|webOS|iPhone|iPad|iPod|BlackBerry|IEMobile|Opera Mini";

fn mobile_agents() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(MOBILE_AGENTS).ok()).as_ref()
}

/// A mobile user agent or any touch support counts as mobile.
pub fn is_mobile(user_agent: &str, max_touch_points: u32) -> bool {
    let agent_match = mobile_agents().is_some_and(|re| re.is_match(user_agent));
    agent_match || max_touch_points > 0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationMode {
    /// Blink straight away on this screen.
    DirectPlayback,
    /// Show a link to open on a phone, with an override to blink anyway.
    ScannableCode,
}

impl PresentationMode {
    pub fn choose(is_mobile: bool) -> Self {
        if is_mobile {
            PresentationMode::DirectPlayback
        } else {
            PresentationMode::ScannableCode
        }
    }
}
