use crate::error::DurationParseError;
use std::time::Duration;

const NS_PER_US: u128 = 1_000;
const NS_PER_MS: u128 = 1_000_000;
const NS_PER_S:  u128 = 1_000_000_000;
const NS_PER_M:  u128 = 60 * NS_PER_S;
const NS_PER_H:  u128 = 60 * NS_PER_M;

/// Format a duration compactly: "10ms", "1.234567ms", "850µs", "2m3.5s", "1h0m0s"
pub fn fmt_duration(d: Duration) -> String {
    let ns = d.as_nanos();
    if ns == 0              { return "0s".to_string(); }
    if ns < NS_PER_US       { return format!("{}ns", ns); }
    if ns < NS_PER_MS       { return format!("{}µs", fmt_frac(ns, NS_PER_US, 3)); }
    if ns < NS_PER_S        { return format!("{}ms", fmt_frac(ns, NS_PER_MS, 6)); }

    let hours = ns / NS_PER_H;
    let mins  = (ns % NS_PER_H) / NS_PER_M;
    let secs  = fmt_frac(ns % NS_PER_M, NS_PER_S, 9);
    if hours > 0     { format!("{}h{}m{}s", hours, mins, secs) }
    else if mins > 0 { format!("{}m{}s", mins, secs) }
    else             { format!("{}s", secs) }
}

/// `value / unit` with the remainder as trailing-zero-trimmed decimals.
fn fmt_frac(value: u128, unit: u128, digits: usize) -> String {
    let whole = value / unit;
    let frac  = value % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let decimals = format!("{:0width$}", frac, width = digits);
    format!("{}.{}", whole, decimals.trim_end_matches('0'))
}

/// Parse a suffixed duration literal: "100ms", "3s", "1m30s", "1.5s", "250us".
///
/// A bare "0" is accepted; any other number needs a unit.
pub fn parse_duration(input: &str) -> Result<Duration, DurationParseError> {
    let s = input.trim();
    if s.is_empty() { return Err(DurationParseError::Empty); }
    if s.starts_with('-') { return Err(DurationParseError::Negative(s.to_string())); }
    let s_unsigned = s.strip_prefix('+').unwrap_or(s);
    if s_unsigned == "0" { return Ok(Duration::ZERO); }

    let mut total: f64 = 0.0;
    let mut rest = s_unsigned;
    if rest.is_empty() { return Err(DurationParseError::Invalid(s.to_string())); }

    while !rest.is_empty() {
        let num_len = rest.find(|c: char| !(c.is_ascii_digit() || c == '.')).unwrap_or(rest.len());
        let number = &rest[..num_len];
        if number.is_empty() || number == "." {
            return Err(DurationParseError::Invalid(s.to_string()));
        }
        let value: f64 = number.parse().map_err(|_| DurationParseError::Invalid(s.to_string()))?;
        rest = &rest[num_len..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit() || c == '.').unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];

        let scale = match unit {
            ""               => return Err(DurationParseError::MissingUnit(s.to_string())),
            "ns"             => 1,
            "us" | "µs" | "μs" => NS_PER_US,
            "ms"             => NS_PER_MS,
            "s"              => NS_PER_S,
            "m"              => NS_PER_M,
            "h"              => NS_PER_H,
            other => {
                return Err(DurationParseError::UnknownUnit {
                    input: s.to_string(),
                    unit:  other.to_string(),
                })
            }
        };
        total += value * scale as f64;
    }

    if !total.is_finite() || total > u64::MAX as f64 {
        return Err(DurationParseError::Invalid(s.to_string()));
    }
    Ok(Duration::from_nanos(total.round() as u64))
}
