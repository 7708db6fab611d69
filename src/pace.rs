use serde_json::Value;

/// Minutes a full-time-equivalent player is on the floor.
pub const PACE_MINUTES: f64 = 36.0;

/// Extrapolates a counting stat to a 36-minute rate, rounded half-to-even.
/// Zero or negative minutes give zero.
pub fn pace_project(stat: u32, minutes: f64) -> u32 {
    if !minutes.is_finite() || minutes <= 0.0 {
        return 0;
    }
    let paced = (f64::from(stat) / minutes * PACE_MINUTES).round_ties_even();
    if paced.is_finite() && paced > 0.0 {
        paced as u32
    } else {
        0
    }
}

/// Parses a minutes-played cell: `PT18M30.00S`, `18:30`, or a plain number.
/// Anything else is zero minutes.
pub fn parse_minutes(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Ok(value) = trimmed.parse::<f64>() {
        return if value.is_finite() && value > 0.0 {
            value
        } else {
            0.0
        };
    }
    if let Some(duration) = trimmed.strip_prefix("PT") {
        return parse_iso_minutes(duration).unwrap_or(0.0);
    }
    if let Some((mins, secs)) = trimmed.split_once(':') {
        let (Ok(mins), Ok(secs)) = (mins.trim().parse::<u32>(), secs.trim().parse::<f64>()) else {
            return 0.0;
        };
        return round2(f64::from(mins) + secs / 60.0);
    }
    0.0
}

pub fn parse_minutes_value(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite() && *v > 0.0).unwrap_or(0.0),
        Value::String(s) => parse_minutes(s),
        _ => 0.0,
    }
}

fn parse_iso_minutes(duration: &str) -> Option<f64> {
    let (mins, rest) = match duration.split_once('M') {
        Some((mins, rest)) => (mins.parse::<u32>().ok()?, rest),
        None => (0, duration),
    };
    let secs = match rest.strip_suffix('S') {
        Some(secs) if !secs.is_empty() => secs.parse::<f64>().ok()?,
        Some(_) => return None,
        None if rest.is_empty() => 0.0,
        None => return None,
    };
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some(round2(f64::from(mins) + secs / 60.0))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
