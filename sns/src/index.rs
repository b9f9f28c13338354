//! Index naming and monthly shard resolution
//!
//! Time-partitioned collections are stored one index per calendar month,
//! named `<base>-YYYY.MM`. Flat collections use the bare base name.

use crate::domain::DateRange;
use chrono::{Datelike, NaiveDateTime};
use std::fmt;

/// Ordered, gap-free list of monthly index names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexShardSet {
    names: Vec<String>,
}

impl IndexShardSet {
    /// Every month from the earlier to the later endpoint, inclusive.
    ///
    /// Day and time-of-day components are ignored. Endpoints may be given in
    /// either order.
    pub fn resolve(base: &str, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        let (mut from, mut to) = (month_index(start), month_index(end));
        if to < from {
            std::mem::swap(&mut from, &mut to);
        }

        let names = (from..=to)
            .map(|month| {
                format!("{}-{:04}.{:02}", base, month.div_euclid(12), month.rem_euclid(12) + 1)
            })
            .collect();

        Self { names }
    }

    pub fn for_range(base: &str, range: &DateRange) -> Self {
        Self::resolve(base, range.start(), range.end())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl fmt::Display for IndexShardSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names.join(","))
    }
}

/// Months since year 0, so consecutive months differ by one.
fn month_index(at: NaiveDateTime) -> i32 {
    at.year() * 12 + at.month0() as i32
}

/// Index expression sent in the search path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexTarget {
    /// One flat index.
    Single(String),
    /// Explicit monthly shards.
    Shards(IndexShardSet),
    /// Every shard of a family, `<base>-*`.
    AllShards(String),
}

impl IndexTarget {
    pub fn single(name: impl Into<String>) -> Self {
        Self::Single(name.into())
    }

    pub fn shards(base: &str, range: &DateRange) -> Self {
        Self::Shards(IndexShardSet::for_range(base, range))
    }

    pub fn all_shards(base: impl Into<String>) -> Self {
        Self::AllShards(base.into())
    }

    /// Index family, used as a metric label.
    pub fn kind(&self) -> &str {
        match self {
            Self::Single(name) | Self::AllShards(name) => name,
            Self::Shards(set) => set
                .names()
                .first()
                .and_then(|name| name.rsplit_once('-'))
                .map_or("unknown", |(base, _)| base),
        }
    }
}

impl fmt::Display for IndexTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(name) => f.write_str(name),
            Self::Shards(set) => set.fmt(f),
            Self::AllShards(base) => write!(f, "{}-*", base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_same_month_yields_one_shard() {
        let set = IndexShardSet::resolve("tweet", at(2023, 5, 1), at(2023, 5, 31));
        assert_eq!(set.names(), &["tweet-2023.05".to_string()]);
    }

    #[test]
    fn test_crosses_year_boundary() {
        let set = IndexShardSet::resolve("tweet", at(2016, 11, 30), at(2017, 2, 1));
        assert_eq!(
            set.names(),
            &["tweet-2016.11", "tweet-2016.12", "tweet-2017.01", "tweet-2017.02"]
        );
    }

    #[test]
    fn test_swapped_endpoints() {
        let forward = IndexShardSet::resolve("user", at(2022, 12, 15), at(2023, 3, 2));
        let backward = IndexShardSet::resolve("user", at(2023, 3, 2), at(2022, 12, 15));
        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 4);
    }

    #[test]
    fn test_day_of_month_does_not_matter() {
        // 31st to 1st still covers both months
        let set = IndexShardSet::resolve("tweet", at(2023, 1, 31), at(2023, 2, 1));
        assert_eq!(set.to_string(), "tweet-2023.01,tweet-2023.02");
    }

    #[test]
    fn test_target_rendering() {
        assert_eq!(IndexTarget::single("url").to_string(), "url");
        assert_eq!(IndexTarget::all_shards("tweet").to_string(), "tweet-*");

        let range = DateRange::new(at(2023, 1, 1), at(2023, 3, 31)).unwrap();
        let target = IndexTarget::shards("tweet", &range);
        assert_eq!(target.to_string(), "tweet-2023.01,tweet-2023.02,tweet-2023.03");
        assert_eq!(target.kind(), "tweet");
    }
}
