//! Turns the free-text "posted 5 minutes ago" phrase of a listing into a [`Freshness`] verdict.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Freshness;

static NUMERAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("numeral pattern"));

const STALE_UNITS: [&str; 5] = ["hour", "day", "week", "month", "year"];

/// Classify a posted-time phrase against a threshold in minutes.
///
/// Seconds are always fresh, minutes are fresh up to and including
/// `threshold_minutes`, anything measured in hours or longer is stale.
/// Text without a recognizable unit (including "just now") is unknown.
pub fn classify(text: &str, threshold_minutes: u64) -> Freshness {
    let text = text.to_lowercase();

    if text.contains("second") {
        return Freshness::Fresh;
    }

    if text.contains("minute") {
        return match NUMERAL.find(&text) {
            // Too many digits for u64 is still a minute count, and larger than any threshold.
            Some(m) => match m.as_str().parse::<u64>() {
                Ok(minutes) if minutes <= threshold_minutes => Freshness::Fresh,
                _ => Freshness::Stale,
            },
            None => Freshness::Unknown,
        };
    }

    if STALE_UNITS.iter().any(|unit| text.contains(unit)) {
        return Freshness::Stale;
    }

    Freshness::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_are_always_fresh() {
        for text in [
            "1 second ago",
            "45 seconds ago",
            "a few seconds ago",
            "Listed 30 SECONDS ago",
        ] {
            assert_eq!(classify(text, 0), Freshness::Fresh, "{text}");
        }
    }

    #[test]
    fn minutes_compare_inclusively_against_threshold() {
        assert_eq!(classify("3 minutes ago", 5), Freshness::Fresh);
        assert_eq!(classify("5 minutes ago", 5), Freshness::Fresh);
        assert_eq!(classify("6 minutes ago", 5), Freshness::Stale);
        assert_eq!(classify("10 minutes ago", 5), Freshness::Stale);
        assert_eq!(classify("0 minutes ago", 0), Freshness::Fresh);
        assert_eq!(classify("1 minute ago", 0), Freshness::Stale);
    }

    #[test]
    fn matching_ignores_case() {
        assert_eq!(classify("Listed 2 Minutes Ago in Austin, TX", 5), Freshness::Fresh);
        assert_eq!(classify("POSTED 2 HOURS AGO", 5), Freshness::Stale);
    }

    #[test]
    fn longer_units_are_stale_regardless_of_numeral() {
        for text in [
            "1 hour ago",
            "2 hours ago",
            "3 days ago",
            "a week ago",
            "2 months ago",
            "1 year ago",
            "yesterday",
        ] {
            assert_eq!(classify(text, 10_000), Freshness::Stale, "{text}");
        }
    }

    #[test]
    fn minute_without_numeral_is_unknown() {
        assert_eq!(classify("a minute ago", 5), Freshness::Unknown);
        assert_eq!(classify("minutes", 5), Freshness::Unknown);
    }

    #[test]
    fn unitless_text_is_unknown() {
        assert_eq!(classify("just now", 5), Freshness::Unknown);
        assert_eq!(classify("unknown", 5), Freshness::Unknown);
        assert_eq!(classify("", 5), Freshness::Unknown);
        assert_eq!(classify("Pickup only", 5), Freshness::Unknown);
    }

    #[test]
    fn huge_minute_counts_do_not_panic() {
        assert_eq!(classify("99999999999999999999999 minutes ago", u64::MAX), Freshness::Stale);
    }
}
