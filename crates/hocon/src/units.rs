//! Duration and size unit parsing for the query layer.
//!
//! Unit-bearing values stay strings through parse and resolve; they are
//! interpreted only when a typed accessor asks for them.

use hocon_tree::{ConfigError, Origin, Result};

/// Parse a duration string to nanoseconds.
///
/// A bare number means milliseconds (the historical default). Supported
/// units: `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`, `d`, plus their long
/// names.
pub fn parse_duration(text: &str, origin: &Origin, path: &str) -> Result<i64> {
    let s = text.trim();
    let (number, unit) = split_unit(s);

    let nanos_per_unit: i64 = match unit {
        "" => 1_000_000, // bare numbers are milliseconds
        "ns" | "nano" | "nanos" | "nanosecond" | "nanoseconds" => 1,
        "us" | "µs" | "micro" | "micros" | "microsecond" | "microseconds" => 1_000,
        "ms" | "milli" | "millis" | "millisecond" | "milliseconds" => 1_000_000,
        "s" | "second" | "seconds" => 1_000_000_000,
        "m" | "minute" | "minutes" => 60 * 1_000_000_000,
        "h" | "hour" | "hours" => 3_600 * 1_000_000_000,
        "d" | "day" | "days" => 86_400 * 1_000_000_000,
        _ => {
            return Err(ConfigError::wrong_type(
                origin.clone(),
                path,
                "duration with a known time unit",
                format!("unknown time unit '{unit}'"),
            ));
        }
    };

    apply_unit(number, nanos_per_unit, origin, path, "duration")
}

/// Parse a size-in-bytes string.
///
/// Suffix shape picks the base: `kB`/`MB`/… are powers of 1000,
/// `K`/`Ki`/`KiB`/… are powers of 1024, bare `B` (or no unit) is bytes.
pub fn parse_bytes(text: &str, origin: &Origin, path: &str) -> Result<i64> {
    let s = text.trim();
    let (number, unit) = split_unit(s);

    let bytes_per_unit: i64 = match unit {
        "" | "B" | "b" | "byte" | "bytes" => 1,

        "kB" | "kilobyte" | "kilobytes" => 1_000,
        "MB" | "megabyte" | "megabytes" => 1_000_000,
        "GB" | "gigabyte" | "gigabytes" => 1_000_000_000,
        "TB" | "terabyte" | "terabytes" => 1_000_000_000_000,
        "PB" | "petabyte" | "petabytes" => 1_000_000_000_000_000,

        "K" | "k" | "Ki" | "KiB" | "kibibyte" | "kibibytes" => 1 << 10,
        "M" | "m" | "Mi" | "MiB" | "mebibyte" | "mebibytes" => 1 << 20,
        "G" | "g" | "Gi" | "GiB" | "gibibyte" | "gibibytes" => 1 << 30,
        "T" | "t" | "Ti" | "TiB" | "tebibyte" | "tebibytes" => 1 << 40,
        "P" | "p" | "Pi" | "PiB" | "pebibyte" | "pebibytes" => 1 << 50,

        _ => {
            return Err(ConfigError::wrong_type(
                origin.clone(),
                path,
                "size in bytes with a known unit",
                format!("unknown size unit '{unit}'"),
            ));
        }
    };

    apply_unit(number, bytes_per_unit, origin, path, "size in bytes")
}

/// Split a value into its leading number and trailing unit word.
fn split_unit(s: &str) -> (&str, &str) {
    let unit_start = s
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_alphabetic() || *c == 'µ')
        .last()
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(unit_start);
    (number.trim(), unit)
}

/// Multiply the parsed count by the unit, with overflow checking.
/// Fractional counts are allowed and truncate to a whole result.
fn apply_unit(
    number: &str,
    per_unit: i64,
    origin: &Origin,
    path: &str,
    what: &str,
) -> Result<i64> {
    let overflow = || {
        ConfigError::wrong_type(
            origin.clone(),
            path,
            what,
            "value too large to fit in 64 bits",
        )
    };

    if let Ok(n) = number.parse::<i64>() {
        return n.checked_mul(per_unit).ok_or_else(overflow);
    }
    if let Ok(f) = number.parse::<f64>() {
        let result = f * per_unit as f64;
        if !result.is_finite() || result >= i64::MAX as f64 || result <= i64::MIN as f64 {
            return Err(overflow());
        }
        return Ok(result as i64);
    }
    Err(ConfigError::wrong_type(
        origin.clone(),
        path,
        what,
        format!("unparseable value '{number}'"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Origin {
        Origin::new("test")
    }

    fn duration(text: &str) -> i64 {
        parse_duration(text, &origin(), "p").unwrap()
    }

    fn bytes(text: &str) -> i64 {
        parse_bytes(text, &origin(), "p").unwrap()
    }

    #[test]
    fn test_duration_units() {
        assert_eq!(duration("1ns"), 1);
        assert_eq!(duration("7us"), 7_000);
        assert_eq!(duration("7µs"), 7_000);
        assert_eq!(duration("10ms"), 10_000_000);
        assert_eq!(duration("3s"), 3_000_000_000);
        assert_eq!(duration("2m"), 120_000_000_000);
        assert_eq!(duration("1h"), 3_600_000_000_000);
        assert_eq!(duration("1d"), 86_400_000_000_000);
        assert_eq!(duration("5 seconds"), 5_000_000_000);
        assert_eq!(duration("1 minute"), 60_000_000_000);
    }

    #[test]
    fn test_duration_bare_number_is_millis() {
        assert_eq!(duration("250"), 250_000_000);
    }

    #[test]
    fn test_duration_fractional() {
        assert_eq!(duration("1.5s"), 1_500_000_000);
        assert_eq!(duration("0.5ms"), 500_000);
    }

    #[test]
    fn test_duration_unknown_unit() {
        assert!(parse_duration("3 fortnights", &origin(), "p").is_err());
    }

    #[test]
    fn test_duration_overflow() {
        assert!(parse_duration("9223372036854775807d", &origin(), "p").is_err());
    }

    #[test]
    fn test_bytes_plain() {
        assert_eq!(bytes("10"), 10);
        assert_eq!(bytes("10B"), 10);
        assert_eq!(bytes("10 bytes"), 10);
    }

    #[test]
    fn test_bytes_decimal_vs_binary() {
        assert_eq!(bytes("1kB"), 1_000);
        assert_eq!(bytes("1K"), 1_024);
        assert_eq!(bytes("1Ki"), 1_024);
        assert_eq!(bytes("1KiB"), 1_024);
        assert_eq!(bytes("1MB"), 1_000_000);
        assert_eq!(bytes("1Mi"), 1_048_576);
        assert_eq!(bytes("1GB"), 1_000_000_000);
        assert_eq!(bytes("1Gi"), 1 << 30);
    }

    #[test]
    fn test_bytes_fractional() {
        assert_eq!(bytes("1.5kB"), 1_500);
        assert_eq!(bytes("0.5Ki"), 512);
    }

    #[test]
    fn test_bytes_unknown_unit() {
        assert!(parse_bytes("1 parsec", &origin(), "p").is_err());
    }
}
