//! Subscription command parsing.
//!
//! A client subscribes by sending one text frame of whitespace separated
//! tokens:
//!
//! ```text
//! [identifier...] <sample_rate> <output_format>
//! ```
//!
//! The last two tokens are read positionally. Identifier matching scans the
//! whole token list, trailing tokens included, so a trailing token that is
//! also a device identifier selects that device *and* supplies the rate or
//! format.

use std::time::Duration;

use wavestream_core::DeviceRegistry;

/// Samples per second used when the rate token is missing or not positive.
pub const DEFAULT_SAMPLE_RATE: u32 = 60;

/// Shortest tick period the server will schedule.
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

/// Requested sample encoding.
///
/// Unrecognized formats are kept verbatim; sessions using them run their
/// timer but emit nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
    Other(String),
}

impl OutputFormat {
    pub fn parse(token: &str) -> Self {
        match token {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            other => OutputFormat::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Other(s) => s,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A command that named at least one registered device.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscribeCommand {
    /// Matching tokens in request order, duplicates kept. Resolve against
    /// the registry to get the emission order.
    pub identifiers: Vec<String>,
    pub sample_rate: u32,
    pub output_format: OutputFormat,
}

impl SubscribeCommand {
    /// Interval between two ticks: `1000 / sample_rate` ms, at least 1 ms.
    pub fn tick_period(&self) -> Duration {
        let nanos = 1_000_000_000 / u64::from(self.sample_rate.max(1));
        Duration::from_nanos(nanos).max(MIN_TICK_PERIOD)
    }
}

/// Result of parsing one client frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedCommand {
    /// Blank frame; ignored without a response.
    Empty,
    /// No token matched a registered device.
    NoValidIdentifiers,
    Subscribe(SubscribeCommand),
}

/// Parse a subscription command against the registry.
pub fn parse_command(text: &str, registry: &DeviceRegistry) -> ParsedCommand {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let Some(&format_token) = tokens.last() else {
        return ParsedCommand::Empty;
    };

    let identifiers: Vec<String> = tokens
        .iter()
        .filter(|token| registry.exists(token))
        .map(|token| token.to_string())
        .collect();
    if identifiers.is_empty() {
        return ParsedCommand::NoValidIdentifiers;
    }

    let rate_token = tokens.len().checked_sub(2).map(|i| tokens[i]);

    ParsedCommand::Subscribe(SubscribeCommand {
        identifiers,
        sample_rate: parse_sample_rate(rate_token),
        output_format: OutputFormat::parse(format_token),
    })
}

/// Parse the rate token, falling back to [`DEFAULT_SAMPLE_RATE`].
///
/// Only the leading integer is read (`"10.5"` gives 10, `"12hz"` gives 12).
/// Missing, unparseable, zero and negative values fall back to the default;
/// values beyond `u32::MAX` saturate.
pub fn parse_sample_rate(token: Option<&str>) -> u32 {
    match token.and_then(parse_integer_prefix) {
        Some(n) if n > 0 => u32::try_from(n).unwrap_or(u32::MAX),
        _ => DEFAULT_SAMPLE_RATE,
    }
}

fn parse_integer_prefix(token: &str) -> Option<i64> {
    let (sign, digits) = match token.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, token.strip_prefix('+').unwrap_or(token)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude = digits[..end].bytes().fold(0i64, |acc, b| {
        acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
    });
    Some(sign * magnitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscribe(text: &str) -> SubscribeCommand {
        match parse_command(text, &DeviceRegistry::demo()) {
            ParsedCommand::Subscribe(cmd) => cmd,
            other => panic!("Expected Subscribe, got {other:?}"),
        }
    }

    #[test]
    fn test_full_command() {
        let cmd = subscribe("1002345 299345 10 json");
        assert_eq!(cmd.identifiers, vec!["1002345", "299345"]);
        assert_eq!(cmd.sample_rate, 10);
        assert_eq!(cmd.output_format, OutputFormat::Json);
        assert_eq!(cmd.tick_period(), Duration::from_millis(100));
    }

    #[test]
    fn test_blank_frames_are_empty() {
        let registry = DeviceRegistry::demo();
        assert_eq!(parse_command("", &registry), ParsedCommand::Empty);
        assert_eq!(parse_command("   \t\n ", &registry), ParsedCommand::Empty);
    }

    #[test]
    fn test_unknown_identifiers() {
        let registry = DeviceRegistry::demo();
        assert_eq!(
            parse_command("badid 60 csv", &registry),
            ParsedCommand::NoValidIdentifiers
        );
        assert_eq!(parse_command("json", &registry), ParsedCommand::NoValidIdentifiers);
    }

    #[test]
    fn test_extra_whitespace() {
        let cmd = subscribe("  299345\t\t5   csv \n");
        assert_eq!(cmd.identifiers, vec!["299345"]);
        assert_eq!(cmd.sample_rate, 5);
        assert_eq!(cmd.output_format, OutputFormat::Csv);
    }

    #[test]
    fn test_bad_rate_defaults() {
        assert_eq!(subscribe("1002345 notanumber xml").sample_rate, 60);
        assert_eq!(subscribe("1002345 0 json").sample_rate, 60);
        assert_eq!(subscribe("1002345 -5 json").sample_rate, 60);
        assert_eq!(subscribe("1002345 -0 json").sample_rate, 60);
    }

    #[test]
    fn test_unknown_format_kept_verbatim() {
        let cmd = subscribe("1002345 notanumber xml");
        assert_eq!(cmd.output_format, OutputFormat::Other("xml".to_string()));

        // Format matching is case-sensitive.
        let cmd = subscribe("1002345 10 JSON");
        assert_eq!(cmd.output_format.as_str(), "JSON");
        assert!(matches!(cmd.output_format, OutputFormat::Other(_)));
    }

    #[test]
    fn test_trailing_tokens_double_as_identifiers() {
        // The last token selects a device and is also the output format.
        let cmd = subscribe("1002345 20 299345");
        assert_eq!(cmd.identifiers, vec!["1002345", "299345"]);
        assert_eq!(cmd.sample_rate, 20);
        assert_eq!(cmd.output_format, OutputFormat::Other("299345".to_string()));

        // The second-to-last token selects a device and is read as the rate.
        let cmd = subscribe("1002345 json");
        assert_eq!(cmd.identifiers, vec!["1002345"]);
        assert_eq!(cmd.sample_rate, 1_002_345);
        assert_eq!(cmd.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_single_token() {
        let cmd = subscribe("299345");
        assert_eq!(cmd.identifiers, vec!["299345"]);
        assert_eq!(cmd.sample_rate, DEFAULT_SAMPLE_RATE);
        assert_eq!(cmd.output_format.as_str(), "299345");
    }

    #[test]
    fn test_duplicates_kept_in_request_order() {
        let cmd = subscribe("299345 1002345 299345 30 json");
        assert_eq!(cmd.identifiers, vec!["299345", "1002345", "299345"]);
    }

    #[test]
    fn test_parse_sample_rate() {
        assert_eq!(parse_sample_rate(None), 60);
        assert_eq!(parse_sample_rate(Some("")), 60);
        assert_eq!(parse_sample_rate(Some("25")), 25);
        assert_eq!(parse_sample_rate(Some("+25")), 25);
        assert_eq!(parse_sample_rate(Some("10.5")), 10);
        assert_eq!(parse_sample_rate(Some("12hz")), 12);
        assert_eq!(parse_sample_rate(Some("hz12")), 60);
        assert_eq!(parse_sample_rate(Some("-")), 60);
        assert_eq!(parse_sample_rate(Some("99999999999999999999999")), u32::MAX);
    }

    #[test]
    fn test_tick_period_clamped() {
        let mut cmd = subscribe("1002345 60 json");
        assert_eq!(cmd.tick_period(), Duration::from_nanos(16_666_666));

        cmd.sample_rate = u32::MAX;
        assert_eq!(cmd.tick_period(), MIN_TICK_PERIOD);
    }
}
