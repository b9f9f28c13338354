//! Domain records and request-scoped value types
//!
//! Everything here is created per request and dropped once the response is
//! serialized.

mod hashtag;
mod transition;
mod tweet;
mod user;

pub use hashtag::{Hashtag, HashtagCount};
pub use transition::Transition;
pub use tweet::{Media, NestedUrl, Tweet, TweetMedia, UrlInfo};
pub use user::User;

use crate::{Error, Result};
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Wire layout of timestamps stored in the engine and sent in range clauses.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Inclusive time span used both as a filter value and as the shard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DateRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidDateRange {
                start: start.format(TIMESTAMP_FORMAT).to_string(),
                end: end.format(TIMESTAMP_FORMAT).to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Range from minute-precision inputs: the end minute is closed at `:59`.
    pub fn from_minutes(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        let start = start.with_second(0).unwrap_or(start);
        let end = end.with_second(59).unwrap_or(end);
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// `gte` bound as rendered in a range clause
    pub fn gte_value(&self) -> String {
        self.start.format(TIMESTAMP_FORMAT).to_string()
    }

    /// `lte` bound as rendered in a range clause
    pub fn lte_value(&self) -> String {
        self.end.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// One bounded page of records plus the engine's true match count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult<T> {
    pub records: Vec<T>,
    pub total_hits: u64,
}

impl<T> SearchResult<T> {
    pub fn new(records: Vec<T>, total_hits: u64) -> Self {
        Self {
            records,
            total_hits,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }
}

/// Output of a two-stage flow.
///
/// The primary and secondary record sets are independent; joining them on the
/// shared key is left to the caller. A failed secondary stage keeps the
/// primary records and reports the failure in `secondary_error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enriched<P, S> {
    pub primary: SearchResult<P>,
    pub secondary: Vec<S>,
    pub secondary_error: Option<String>,
}

/// Sort fields accepted by the tweet operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TweetOrder {
    RetweetCount,
    QuoteCount,
    #[default]
    FavoriteCount,
    CreatedAt,
    InsertedAt,
}

impl TweetOrder {
    pub fn field(&self) -> &'static str {
        match self {
            Self::RetweetCount => "retweet_count",
            Self::QuoteCount => "quote_count",
            Self::FavoriteCount => "favorite_count",
            Self::CreatedAt => "created_at",
            Self::InsertedAt => "inserted_at",
        }
    }
}

/// Sort fields accepted by user search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserOrder {
    #[default]
    FollowersCount,
    FriendsCount,
    ListedCount,
    FavouritesCount,
    StatusesCount,
}

impl UserOrder {
    pub fn field(&self) -> &'static str {
        match self {
            Self::FollowersCount => "followers_count",
            Self::FriendsCount => "friends_count",
            Self::ListedCount => "listed_count",
            Self::FavouritesCount => "favourites_count",
            Self::StatusesCount => "statuses_count",
        }
    }
}

/// Media filter for the media-enrichment flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    All,
    Photo,
    Video,
    Gif,
}

impl MediaType {
    /// Codes stored in the `media_type` field. `All` expands to every
    /// concrete type.
    pub fn codes(&self) -> &'static [i64] {
        match self {
            Self::All => &[2, 3, 4],
            Self::Photo => &[2],
            Self::Video => &[3],
            Self::Gif => &[4],
        }
    }
}

impl TryFrom<i64> for MediaType {
    type Error = String;

    fn try_from(code: i64) -> std::result::Result<Self, Self::Error> {
        match code {
            -1 => Ok(Self::All),
            2 => Ok(Self::Photo),
            3 => Ok(Self::Video),
            4 => Ok(Self::Gif),
            other => Err(format!("unsupported media_type {other}, expected one of -1 2 3 4")),
        }
    }
}
