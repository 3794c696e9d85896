use regex::Regex;
use std::sync::LazyLock;

use super::config::ConfigError;

// "1h30m", "25m", "90s", "1h", "2m30s"; each unit at most once, in order.
static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<h>\d+)h)?(?:(?P<m>\d+)m)?(?:(?P<s>\d+)s)?$")
        .expect("duration pattern is valid")
});

/// Parse a human duration into seconds. A bare number means minutes.
pub fn parse_duration(input: &str) -> Result<u64, ConfigError> {
    let invalid = || ConfigError::InvalidDurationString {
        input: input.to_string(),
    };
    let text = input.trim().to_lowercase();

    if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
        let minutes: u64 = text.parse().map_err(|_| invalid())?;
        return positive(minutes.checked_mul(60).ok_or_else(invalid)?).ok_or_else(invalid);
    }

    let captures = DURATION_RE.captures(&text).ok_or_else(invalid)?;
    let mut total: u64 = 0;
    let mut matched = false;
    for (name, scale) in [("h", 3600u64), ("m", 60), ("s", 1)] {
        if let Some(value) = captures.name(name) {
            matched = true;
            let value: u64 = value.as_str().parse().map_err(|_| invalid())?;
            total = value
                .checked_mul(scale)
                .and_then(|v| total.checked_add(v))
                .ok_or_else(invalid)?;
        }
    }
    if !matched {
        return Err(invalid());
    }
    positive(total).ok_or_else(invalid)
}

fn positive(secs: u64) -> Option<u64> {
    (secs > 0).then_some(secs)
}
