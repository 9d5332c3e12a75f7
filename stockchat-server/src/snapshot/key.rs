//! Snapshot object names.
//!
//! Snapshots are stored as `<prefix><YYYY-MM-DD>_<HH-MM><suffix>`, e.g.
//! `tickertape_custom_screener_2025-06-14_15-38.json`. The scrape time encoded
//! in the name (UTC) is the snapshot's identity and ordering.

use std::cmp::Ordering;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::Serialize;

static STAMP_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}_\d{2}-\d{2}$").unwrap());

const STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M";

/// A parsed snapshot object name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotKey {
    /// Full object name in the bucket
    pub name: String,
    /// Scrape time in epoch milliseconds; 0 when the name is malformed
    pub timestamp_ms: i64,
}

impl SnapshotKey {
    /// Scrape time as an ISO-8601 string (`YYYY-MM-DDTHH:MM:00Z`).
    pub fn iso_date(&self) -> Option<String> {
        if self.timestamp_ms == 0 {
            return None;
        }
        DateTime::<Utc>::from_timestamp_millis(self.timestamp_ms)
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:00Z").to_string())
    }
}

impl Ord for SnapshotKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp_ms
            .cmp(&other.timestamp_ms)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for SnapshotKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Naming convention of one snapshot family.
#[derive(Debug, Clone)]
pub struct SnapshotNaming {
    prefix: String,
    suffix: String,
}

impl SnapshotNaming {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether `name` carries this family's prefix and suffix.
    pub fn matches_convention(&self, name: &str) -> bool {
        name.starts_with(&self.prefix) && name.ends_with(&self.suffix)
    }

    /// Epoch milliseconds encoded in `name`, or 0 if it does not follow the
    /// naming convention or encodes an impossible date.
    pub fn parse_timestamp_from_filename(&self, name: &str) -> i64 {
        self.parse_datetime(name)
            .map(|dt| dt.timestamp_millis())
            .unwrap_or(0)
    }

    fn parse_datetime(&self, name: &str) -> Option<DateTime<Utc>> {
        let stamp = name
            .strip_prefix(&self.prefix)?
            .strip_suffix(&self.suffix)?;

        if !STAMP_SHAPE.is_match(stamp) {
            return None;
        }

        NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT)
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    }

    pub fn parse(&self, name: &str) -> SnapshotKey {
        SnapshotKey {
            name: name.to_string(),
            timestamp_ms: self.parse_timestamp_from_filename(name),
        }
    }

    /// Object name for an explicit `date` (`YYYY-MM-DD`) and optional
    /// `time` (`HH-MM`, default `00-00`). `None` when either part is not
    /// shaped like a timestamp.
    pub fn key_for(&self, date: &str, time: Option<&str>) -> Option<String> {
        let stamp = format!("{}_{}", date, time.unwrap_or("00-00"));
        if !STAMP_SHAPE.is_match(&stamp) {
            return None;
        }
        Some(format!("{}{}{}", self.prefix, stamp, self.suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naming() -> SnapshotNaming {
        SnapshotNaming::new("tickertape_custom_screener_", ".json")
    }

    #[test]
    fn test_parse_valid_name() {
        let key = naming().parse("tickertape_custom_screener_2025-06-14_15-38.json");
        let expected = Utc.with_ymd_and_hms(2025, 6, 14, 15, 38, 0).unwrap();
        assert_eq!(key.timestamp_ms, expected.timestamp_millis());
        assert_eq!(key.iso_date().as_deref(), Some("2025-06-14T15:38:00Z"));
    }

    #[test]
    fn test_malformed_names_parse_to_zero() {
        let n = naming();
        for name in [
            "tickertape_custom_screener_latest.json",
            "tickertape_custom_screener_2025-6-14_15-38.json",
            "tickertape_custom_screener_2025-06-14.json",
            "tickertape_custom_screener_2025-13-40_15-38.json",
            "tickertape_custom_screener_2025-06-14_25-99.json",
            "other_2025-06-14_15-38.json",
            "tickertape_custom_screener_2025-06-14_15-38.csv",
        ] {
            assert_eq!(n.parse_timestamp_from_filename(name), 0, "{}", name);
            assert!(n.parse(name).iso_date().is_none());
        }
    }

    #[test]
    fn test_keys_order_by_timestamp() {
        let n = naming();
        let mut keys = vec![
            n.parse("tickertape_custom_screener_2025-06-14_15-38.json"),
            n.parse("tickertape_custom_screener_2025-01-02_09-00.json"),
            n.parse("tickertape_custom_screener_2025-06-14_09-15.json"),
        ];
        keys.sort();
        let names: Vec<_> = keys.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "tickertape_custom_screener_2025-01-02_09-00.json",
                "tickertape_custom_screener_2025-06-14_09-15.json",
                "tickertape_custom_screener_2025-06-14_15-38.json",
            ]
        );
    }

    #[test]
    fn test_key_for_defaults_time() {
        let n = naming();
        assert_eq!(
            n.key_for("2025-06-14", None).as_deref(),
            Some("tickertape_custom_screener_2025-06-14_00-00.json")
        );
        assert_eq!(
            n.key_for("2025-06-14", Some("15-38")).as_deref(),
            Some("tickertape_custom_screener_2025-06-14_15-38.json")
        );
    }

    #[test]
    fn test_key_for_rejects_malformed_parts() {
        let n = naming();
        for (date, time) in [
            ("x/../../otherbucket/private.json#", Some("z")),
            ("2025-06-14", Some("15:38")),
            ("2025-06-14", Some("15-38/../x")),
            ("2025-6-14", None),
            ("2025-06-14_15", Some("38")),
            ("", None),
        ] {
            assert!(n.key_for(date, time).is_none(), "{:?} {:?}", date, time);
        }
    }

    #[test]
    fn test_matches_convention() {
        let n = naming();
        assert!(n.matches_convention("tickertape_custom_screener_x.json"));
        assert!(!n.matches_convention("readme.txt"));
    }
}
