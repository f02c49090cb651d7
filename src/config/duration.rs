use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Parses Go-style durations: one or more `<number><unit>` segments with
/// units `ms`, `s`, `m`, `h` (`"500ms"`, `"1.5s"`, `"1m30s"`), or a bare
/// integer number of seconds.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let invalid = || format!("invalid duration {raw:?}");

    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw.parse().map(Duration::from_secs).map_err(|_| invalid());
    }
    if raw.is_empty() {
        return Err(invalid());
    }

    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut total = Duration::ZERO;
    let mut rest = raw;
    while !rest.is_empty() {
        let number_end = rest.find(|c: char| !is_number(c)).ok_or_else(|| {
            format!("missing unit in duration {raw:?}")
        })?;
        let (number, tail) = rest.split_at(number_end);
        let unit_end = tail.find(is_number).unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_end);

        let value: f64 = number.parse().map_err(|_| invalid())?;
        let seconds = match unit {
            "ms" => value / 1000.0,
            "s" => value,
            "m" => value * 60.0,
            "h" => value * 3600.0,
            other => return Err(format!("unknown duration unit {other:?} in {raw:?}")),
        };
        let segment = Duration::try_from_secs_f64(seconds).map_err(|_| invalid())?;
        total = total.checked_add(segment).ok_or_else(invalid)?;
        rest = next;
    }

    Ok(total)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Seconds(u64),
    Text(String),
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    match RawDuration::deserialize(deserializer)? {
        RawDuration::Seconds(secs) => Ok(Duration::from_secs(secs)),
        RawDuration::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
    }
}
