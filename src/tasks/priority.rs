//! Priority labels and the deadline classification rule

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse priority label derived from time left until the deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Stored/wire form of the label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }

    /// All labels, most urgent first
    pub fn all() -> [Priority; 3] {
        [Self::High, Self::Medium, Self::Low]
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    /// Exact match only: "high" is not a stored label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HIGH" => Ok(Self::High),
            "MEDIUM" => Ok(Self::Medium),
            "LOW" => Ok(Self::Low),
            other => Err(format!("unknown priority '{}' (expected HIGH, MEDIUM or LOW)", other)),
        }
    }
}

/// Boundaries between the three labels, measured as time left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Anything due sooner than this is HIGH
    pub high_within: TimeDelta,
    /// Anything due sooner than this (and not HIGH) is MEDIUM
    pub medium_within: TimeDelta,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            high_within: TimeDelta::days(1),
            medium_within: TimeDelta::days(3),
        }
    }
}

impl Thresholds {
    /// Thresholds from whole hours, or `None` if either is out of `TimeDelta` range
    pub fn from_hours(high: i64, medium: i64) -> Option<Self> {
        Some(Self {
            high_within: TimeDelta::try_hours(high)?,
            medium_within: TimeDelta::try_hours(medium)?,
        })
    }

    /// Label for a deadline as seen at `now`. Past deadlines are HIGH.
    pub fn classify(&self, deadline: DateTime<Utc>, now: DateTime<Utc>) -> Priority {
        let time_left = deadline - now;

        if time_left < self.high_within {
            Priority::High
        } else if time_left < self.medium_within {
            Priority::Medium
        } else {
            Priority::Low
        }
    }
}

/// Classify with the default one-day / three-day boundaries
pub fn classify(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Priority {
    Thresholds::default().classify(deadline, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_under_one_day_is_high() {
        let now = now();
        for delta in [
            TimeDelta::zero(),
            TimeDelta::minutes(5),
            TimeDelta::hours(23),
            TimeDelta::days(1) - TimeDelta::milliseconds(1),
        ] {
            assert_eq!(classify(now + delta, now), Priority::High, "{:?}", delta);
        }
    }

    #[test]
    fn test_overdue_is_high() {
        let now = now();
        assert_eq!(classify(now - TimeDelta::seconds(1), now), Priority::High);
        assert_eq!(classify(now - TimeDelta::days(30), now), Priority::High);
    }

    #[test]
    fn test_one_to_three_days_is_medium() {
        let now = now();
        assert_eq!(classify(now + TimeDelta::days(1), now), Priority::Medium);
        assert_eq!(classify(now + TimeDelta::hours(50), now), Priority::Medium);
        assert_eq!(
            classify(now + TimeDelta::days(3) - TimeDelta::milliseconds(1), now),
            Priority::Medium
        );
    }

    #[test]
    fn test_three_days_or_more_is_low() {
        let now = now();
        assert_eq!(classify(now + TimeDelta::days(3), now), Priority::Low);
        assert_eq!(classify(now + TimeDelta::days(365), now), Priority::Low);
    }

    #[test]
    fn test_custom_thresholds() {
        let now = now();
        let thresholds = Thresholds::from_hours(2, 8).unwrap();
        assert_eq!(thresholds.classify(now + TimeDelta::hours(1), now), Priority::High);
        assert_eq!(thresholds.classify(now + TimeDelta::hours(2), now), Priority::Medium);
        assert_eq!(thresholds.classify(now + TimeDelta::hours(8), now), Priority::Low);
    }

    #[test]
    fn test_out_of_range_hours_are_refused() {
        assert!(Thresholds::from_hours(i64::MAX, i64::MAX).is_none());
        assert!(Thresholds::from_hours(24, i64::MAX).is_none());
        assert_eq!(Thresholds::from_hours(24, 72), Some(Thresholds::default()));
    }

    #[test]
    fn test_label_parsing_is_exact() {
        for p in Priority::all() {
            assert_eq!(p.as_str().parse::<Priority>().unwrap(), p);
        }
        assert!("high".parse::<Priority>().is_err());
        assert!("URGENT".parse::<Priority>().is_err());
    }

    #[test]
    fn test_serde_uses_uppercase_labels() {
        assert_eq!(serde_json::to_string(&Priority::Medium).unwrap(), "\"MEDIUM\"");
        let p: Priority = serde_json::from_str("\"LOW\"").unwrap();
        assert_eq!(p, Priority::Low);
    }
}
