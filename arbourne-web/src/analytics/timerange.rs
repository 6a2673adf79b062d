//! Lookback windows for dashboard queries

use chrono::{DateTime, Duration, Utc};

use arbourne_common::{Error, Result};

/// Lookback bucket selected by the dashboard caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookback {
    SevenDays,
    ThirtyDays,
    OneYear,
}

impl Lookback {
    /// Parse the `range` query parameter (`7d` | `30d` | `1y`)
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim() {
            "7d" => Ok(Self::SevenDays),
            "30d" => Ok(Self::ThirtyDays),
            "1y" => Ok(Self::OneYear),
            other => Err(Error::InvalidInput(format!(
                "Unknown range: {} (expected 7d, 30d or 1y)",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SevenDays => "7d",
            Self::ThirtyDays => "30d",
            Self::OneYear => "1y",
        }
    }

    /// Window start, relative to `now`
    pub fn cutoff(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::SevenDays => now - Duration::days(7),
            Self::ThirtyDays => now - Duration::days(30),
            Self::OneYear => now - Duration::days(365),
        }
    }
}

impl Default for Lookback {
    fn default() -> Self {
        Self::ThirtyDays
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_ranges() {
        assert_eq!(Lookback::parse("7d").unwrap(), Lookback::SevenDays);
        assert_eq!(Lookback::parse("30d").unwrap(), Lookback::ThirtyDays);
        assert_eq!(Lookback::parse("1y").unwrap(), Lookback::OneYear);
        assert!(Lookback::parse("90d").is_err());
        assert!(Lookback::parse("").is_err());
    }

    #[test]
    fn cutoff_is_in_the_past() {
        let now = Utc::now();
        assert_eq!(Lookback::SevenDays.cutoff(now), now - Duration::days(7));
        assert!(Lookback::OneYear.cutoff(now) < Lookback::ThirtyDays.cutoff(now));
    }
}
