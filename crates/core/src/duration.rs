//! Compact duration tokens (`PT1H2M3S`) as returned by the videos endpoint.
//!
//! Parsing is a fixed-order scan: an optional hours component, then minutes,
//! then seconds. Anything that does not fit that shape decodes to zero.

use tracing::warn;

/// Videos at or under this length count as shorts.
pub const SHORT_MAX_SECONDS: u64 = 60;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Component {
    Hours,
    Minutes,
    Seconds,
}

impl Component {
    fn from_designator(c: char) -> Option<Self> {
        match c {
            'H' => Some(Component::Hours),
            'M' => Some(Component::Minutes),
            'S' => Some(Component::Seconds),
            _ => None,
        }
    }

    fn multiplier(self) -> u64 {
        match self {
            Component::Hours => 3600,
            Component::Minutes => 60,
            Component::Seconds => 1,
        }
    }

    fn rank(self) -> u8 {
        match self {
            Component::Hours => 0,
            Component::Minutes => 1,
            Component::Seconds => 2,
        }
    }
}

/// Decode a duration token into whole seconds, or `None` if it is malformed.
pub fn try_parse_duration(token: &str) -> Option<u64> {
    let body = token.trim().strip_prefix("PT")?;

    let mut total: u64 = 0;
    let mut digits = String::new();
    let mut last_rank: Option<u8> = None;

    for c in body.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }

        let component = Component::from_designator(c)?;
        if digits.is_empty() {
            return None;
        }
        if last_rank.is_some_and(|rank| rank >= component.rank()) {
            return None;
        }

        let value: u64 = digits.parse().ok()?;
        total = total.checked_add(value.checked_mul(component.multiplier())?)?;
        last_rank = Some(component.rank());
        digits.clear();
    }

    // trailing digits without a designator
    if !digits.is_empty() {
        return None;
    }

    Some(total)
}

/// Decode a duration token into whole seconds. Malformed tokens yield 0.
pub fn parse_duration(token: &str) -> u64 {
    match try_parse_duration(token) {
        Some(seconds) => seconds,
        None => {
            warn!(token, "malformed duration token, defaulting to 0 seconds");
            0
        }
    }
}

/// Format seconds as `H:MM:SS`, or `M:SS` when under an hour.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Format a raw duration token directly.
pub fn format_duration_token(token: &str) -> String {
    format_duration(parse_duration(token))
}

pub fn is_short(seconds: u64) -> bool {
    seconds <= SHORT_MAX_SECONDS
}
