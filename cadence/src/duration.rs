//! Text <-> duration helpers for the clock face and edit prompts.

/// Parse `"mm:ss"` or `"mm"` into seconds.
///
/// Each part reads its leading integer; a part with no digits counts as 0.
/// Returns 0 for anything that does not add up to a positive duration, which
/// the engine then rejects.
pub fn parse_clock(input: &str) -> u64 {
    let parts: Vec<&str> = input.trim().split(':').collect();
    let (minutes, seconds) = match parts.as_slice() {
        [minutes, seconds] => (leading_int(minutes), leading_int(seconds)),
        [minutes] => (leading_int(minutes), None),
        _ => (None, None),
    };
    let seconds = minutes
        .unwrap_or(0)
        .saturating_mul(60)
        .saturating_add(seconds.unwrap_or(0));
    u64::try_from(seconds).unwrap_or(0)
}

/// Parse a minute count from free text. No digits at all means 1; negative
/// values come back as 0 so validation rejects them.
pub fn parse_minutes(input: &str) -> u32 {
    match leading_int(input.trim()) {
        Some(n) if n < 0 => 0,
        Some(n) => u32::try_from(n).unwrap_or(u32::MAX),
        None => 1,
    }
}

/// `MM:SS`, with minutes allowed past 99.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end]
        .parse::<i64>()
        .ok()
        .map(|n| n.saturating_mul(sign))
}
