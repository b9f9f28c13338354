//! Request parameters and validation
//!
//! Numeric filters are `Option`s so that an explicit `0` survives as
//! `Some(0)` and an omitted parameter stays `None`.

use super::error::ApiError;
use crate::domain::{DateRange, MediaType, TweetOrder, UserOrder};
use crate::repository::{HashtagFilters, TweetPage, UserFilters};
use chrono::{NaiveDate, NaiveDateTime};
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

pub const MINUTE_FORMAT: &str = "%Y-%m-%d %H:%M";
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Largest page any search operation may request
pub const MAX_COUNT: usize = 10_000;
/// Largest id list accepted by the multi-id operations
pub const MAX_IDS: usize = 10_000;
pub const MAX_TRANSITIONS: u32 = 100_000;

fn minute<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    NaiveDateTime::parse_from_str(raw.trim(), MINUTE_FORMAT)
        .map_err(|_| {
            de::Error::custom(format!("invalid timestamp '{raw}', expected YYYY-MM-DD HH:MM"))
        })
}

fn day<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    NaiveDate::parse_from_str(raw.trim(), DAY_FORMAT)
        .map_err(|_| de::Error::custom(format!("invalid date '{raw}', expected YYYY-MM-DD")))
}

/// Comma-separated string in a query string, plain array in a JSON body.
fn comma_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: fmt::Display,
{
    struct ListVisitor<T>(PhantomData<T>);

    impl<'de, T> Visitor<'de> for ListVisitor<T>
    where
        T: FromStr + Deserialize<'de>,
        T::Err: fmt::Display,
    {
        type Value = Vec<T>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a comma-separated list")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Vec<T>, E> {
            value
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| {
                    item.parse::<T>()
                        .map_err(|e| E::custom(format!("invalid list item '{item}': {e}")))
                })
                .collect()
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<T>, A::Error> {
            let mut items = Vec::new();
            while let Some(item) = seq.next_element()? {
                items.push(item);
            }
            Ok(items)
        }
    }

    deserializer.deserialize_any(ListVisitor(PhantomData))
}

fn window(start: NaiveDateTime, end: NaiveDateTime) -> Result<DateRange, ApiError> {
    DateRange::from_minutes(start, end)
        .map_err(|_| ApiError::BadRequest("end_date must not be before start_date".to_string()))
}

fn page_size(count: Option<usize>, default: usize) -> Result<usize, ApiError> {
    match count.unwrap_or(default) {
        n @ 1..=MAX_COUNT => Ok(n),
        n => Err(ApiError::BadRequest(format!("count must be between 1 and {MAX_COUNT}, got {n}"))),
    }
}

fn id_list(ids: &[u64]) -> Result<(), ApiError> {
    if ids.is_empty() {
        return Err(ApiError::BadRequest("user_ids must not be empty".to_string()));
    }
    if ids.len() > MAX_IDS {
        return Err(ApiError::BadRequest(format!("at most {MAX_IDS} user_ids are accepted")));
    }
    Ok(())
}

/// `max` must not be below `min`. A zero `max` means no ceiling and is not
/// compared.
fn bounds<T: PartialOrd + Default + Copy>(
    name: &str,
    min: Option<T>,
    max: Option<T>,
) -> Result<(), ApiError> {
    if let (Some(min), Some(max)) = (min, max) {
        if max > T::default() && max < min {
            return Err(ApiError::BadRequest(format!("{name}_max must not be below {name}_min")));
        }
    }
    Ok(())
}

fn non_blank(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

#[derive(Debug, Deserialize)]
pub struct TweetsByUserParams {
    pub user_id: u64,
    #[serde(deserialize_with = "minute")]
    pub start_date: NaiveDateTime,
    #[serde(deserialize_with = "minute")]
    pub end_date: NaiveDateTime,
    #[serde(default)]
    pub order_by: Option<TweetOrder>,
    #[serde(default)]
    pub count: Option<usize>,
}

impl TweetsByUserParams {
    pub fn page(&self) -> Result<TweetPage, ApiError> {
        Ok(TweetPage {
            range: window(self.start_date, self.end_date)?,
            count: page_size(self.count, 1)?,
            order: self.order_by.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TweetsByUsersParams {
    #[serde(deserialize_with = "comma_list")]
    pub user_ids: Vec<u64>,
    #[serde(deserialize_with = "minute")]
    pub start_date: NaiveDateTime,
    #[serde(deserialize_with = "minute")]
    pub end_date: NaiveDateTime,
    #[serde(default)]
    pub order_by: Option<TweetOrder>,
    #[serde(default)]
    pub count: Option<usize>,
}

impl TweetsByUsersParams {
    pub fn page(&self) -> Result<TweetPage, ApiError> {
        id_list(&self.user_ids)?;
        Ok(TweetPage {
            range: window(self.start_date, self.end_date)?,
            count: page_size(self.count, 1)?,
            order: self.order_by.unwrap_or(TweetOrder::CreatedAt),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TweetsByDomainParams {
    pub user_id: u64,
    #[serde(deserialize_with = "minute")]
    pub start_date: NaiveDateTime,
    #[serde(deserialize_with = "minute")]
    pub end_date: NaiveDateTime,
    #[serde(default)]
    pub order_by: Option<TweetOrder>,
    #[serde(default)]
    pub count: Option<usize>,
    pub domain: String,
}

impl TweetsByDomainParams {
    pub fn page(&self) -> Result<TweetPage, ApiError> {
        if self.domain.trim().is_empty() {
            return Err(ApiError::BadRequest("domain must not be empty".to_string()));
        }
        Ok(TweetPage {
            range: window(self.start_date, self.end_date)?,
            count: page_size(self.count, 1)?,
            order: self.order_by.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TweetsByMediaParams {
    pub user_id: u64,
    #[serde(deserialize_with = "minute")]
    pub start_date: NaiveDateTime,
    #[serde(deserialize_with = "minute")]
    pub end_date: NaiveDateTime,
    #[serde(default)]
    pub order_by: Option<TweetOrder>,
    #[serde(default)]
    pub count: Option<usize>,
    pub media_type: i64,
}

impl TweetsByMediaParams {
    pub fn page(&self) -> Result<(TweetPage, MediaType), ApiError> {
        let media_type = MediaType::try_from(self.media_type).map_err(ApiError::BadRequest)?;
        let page = TweetPage {
            range: window(self.start_date, self.end_date)?,
            count: page_size(self.count, 1)?,
            order: self.order_by.unwrap_or_default(),
        };
        Ok((page, media_type))
    }
}

#[derive(Debug, Deserialize)]
pub struct TransitionParams {
    pub user_id: u64,
    #[serde(deserialize_with = "day")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "day")]
    pub end_date: NaiveDate,
    #[serde(default)]
    pub count: Option<u32>,
}

impl TransitionParams {
    pub fn limit(&self) -> Result<u32, ApiError> {
        if self.end_date < self.start_date {
            return Err(ApiError::BadRequest("end_date must not be before start_date".to_string()));
        }
        match self.count.unwrap_or(100) {
            n @ 1..=MAX_TRANSITIONS => Ok(n),
            n => Err(ApiError::BadRequest(format!(
                "count must be between 1 and {MAX_TRANSITIONS}, got {n}"
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HashtagRankingParams {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default, deserialize_with = "comma_list")]
    pub hashtag: Vec<String>,
    #[serde(default, deserialize_with = "comma_list")]
    pub tweet_type: Vec<i64>,
    #[serde(default)]
    pub retweet_min: Option<u64>,
    #[serde(default)]
    pub retweet_max: Option<u64>,
    #[serde(default)]
    pub quote_min: Option<u64>,
    #[serde(default)]
    pub quote_max: Option<u64>,
    #[serde(default)]
    pub favorite_min: Option<u64>,
    #[serde(default)]
    pub favorite_max: Option<u64>,
    #[serde(default, deserialize_with = "comma_list")]
    pub user_include: Vec<String>,
    #[serde(default, deserialize_with = "comma_list")]
    pub user_exclude: Vec<String>,
    #[serde(default, deserialize_with = "comma_list")]
    pub hashtag_include: Vec<String>,
    #[serde(default, deserialize_with = "comma_list")]
    pub hashtag_exclude: Vec<String>,
    #[serde(default)]
    pub user_follower_min: Option<u64>,
    #[serde(default)]
    pub user_follower_max: Option<u64>,
    #[serde(default)]
    pub user_status_min: Option<u64>,
    #[serde(default)]
    pub user_status_max: Option<u64>,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(deserialize_with = "minute")]
    pub start_date: NaiveDateTime,
    #[serde(deserialize_with = "minute")]
    pub end_date: NaiveDateTime,
}

impl HashtagRankingParams {
    pub fn into_query(self) -> Result<(HashtagFilters, DateRange, usize), ApiError> {
        if !non_blank(&self.keyword) && self.hashtag.is_empty() {
            return Err(ApiError::BadRequest("keyword or hashtag is required".to_string()));
        }
        bounds("retweet", self.retweet_min, self.retweet_max)?;
        bounds("quote", self.quote_min, self.quote_max)?;
        bounds("favorite", self.favorite_min, self.favorite_max)?;
        bounds("user_follower", self.user_follower_min, self.user_follower_max)?;
        bounds("user_status", self.user_status_min, self.user_status_max)?;
        let range = window(self.start_date, self.end_date)?;
        let count = page_size(self.count, 10)?;

        let filters = HashtagFilters {
            keyword: self.keyword,
            hashtags: self.hashtag,
            tweet_types: self.tweet_type,
            retweet_min: self.retweet_min,
            retweet_max: self.retweet_max,
            quote_min: self.quote_min,
            quote_max: self.quote_max,
            favorite_min: self.favorite_min,
            favorite_max: self.favorite_max,
            user_include: self.user_include,
            user_exclude: self.user_exclude,
            hashtag_include: self.hashtag_include,
            hashtag_exclude: self.hashtag_exclude,
            user_follower_min: self.user_follower_min,
            user_follower_max: self.user_follower_max,
            user_status_min: self.user_status_min,
            user_status_max: self.user_status_max,
        };
        Ok((filters, range, count))
    }
}

#[derive(Debug, Deserialize)]
pub struct HashtagSearchParams {
    pub hashtag: String,
    #[serde(deserialize_with = "minute")]
    pub start_date: NaiveDateTime,
    #[serde(deserialize_with = "minute")]
    pub end_date: NaiveDateTime,
    #[serde(default)]
    pub count: Option<usize>,
}

impl HashtagSearchParams {
    pub fn window(&self) -> Result<(DateRange, usize), ApiError> {
        if self.hashtag.trim().is_empty() {
            return Err(ApiError::BadRequest("hashtag must not be empty".to_string()));
        }
        Ok((window(self.start_date, self.end_date)?, page_size(self.count, 10)?))
    }
}

#[derive(Debug, Deserialize)]
pub struct UserSearchParams {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub follower_min: Option<u64>,
    #[serde(default)]
    pub follower_max: Option<u64>,
    #[serde(default)]
    pub status_min: Option<u64>,
    #[serde(default)]
    pub status_max: Option<u64>,
    #[serde(default)]
    pub favorite_min: Option<u64>,
    #[serde(default)]
    pub favorite_max: Option<u64>,
    #[serde(default)]
    pub follow_min: Option<u64>,
    #[serde(default)]
    pub follow_max: Option<u64>,
    #[serde(default)]
    pub list_min: Option<u64>,
    #[serde(default)]
    pub list_max: Option<u64>,
    #[serde(default)]
    pub sr_score_min: Option<f64>,
    #[serde(default)]
    pub sr_score_max: Option<f64>,
    #[serde(deserialize_with = "minute")]
    pub start_date: NaiveDateTime,
    #[serde(deserialize_with = "minute")]
    pub end_date: NaiveDateTime,
    #[serde(default)]
    pub order_by: Option<UserOrder>,
    #[serde(default)]
    pub count: Option<usize>,
}

impl UserSearchParams {
    pub fn into_query(self) -> Result<(UserFilters, DateRange, usize, UserOrder), ApiError> {
        if !non_blank(&self.name) && !non_blank(&self.description) {
            return Err(ApiError::BadRequest("name or description is required".to_string()));
        }
        bounds("follower", self.follower_min, self.follower_max)?;
        bounds("status", self.status_min, self.status_max)?;
        bounds("favorite", self.favorite_min, self.favorite_max)?;
        bounds("follow", self.follow_min, self.follow_max)?;
        bounds("list", self.list_min, self.list_max)?;
        bounds("sr_score", self.sr_score_min, self.sr_score_max)?;
        let range = window(self.start_date, self.end_date)?;
        let count = page_size(self.count, 10)?;
        let order = self.order_by.unwrap_or_default();

        let filters = UserFilters {
            name: self.name,
            description: self.description,
            language: self.language,
            follower_min: self.follower_min,
            follower_max: self.follower_max,
            status_min: self.status_min,
            status_max: self.status_max,
            favorite_min: self.favorite_min,
            favorite_max: self.favorite_max,
            follow_min: self.follow_min,
            follow_max: self.follow_max,
            list_min: self.list_min,
            list_max: self.list_max,
            sr_score_min: self.sr_score_min,
            sr_score_max: self.sr_score_max,
        };
        Ok((filters, range, count, order))
    }
}

#[derive(Debug, Deserialize)]
pub struct UserIdParams {
    pub user_id: u64,
    #[serde(deserialize_with = "minute")]
    pub start_date: NaiveDateTime,
    #[serde(deserialize_with = "minute")]
    pub end_date: NaiveDateTime,
}

impl UserIdParams {
    pub fn window(&self) -> Result<DateRange, ApiError> {
        window(self.start_date, self.end_date)
    }
}

#[derive(Debug, Deserialize)]
pub struct UserIdsParams {
    #[serde(deserialize_with = "comma_list")]
    pub user_ids: Vec<u64>,
    #[serde(deserialize_with = "minute")]
    pub start_date: NaiveDateTime,
    #[serde(deserialize_with = "minute")]
    pub end_date: NaiveDateTime,
}

impl UserIdsParams {
    pub fn window(&self) -> Result<DateRange, ApiError> {
        id_list(&self.user_ids)?;
        window(self.start_date, self.end_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::Uri;
    use serde::de::DeserializeOwned;
    use serde_json::json;

    fn parse<T: DeserializeOwned>(qs: &str) -> Option<T> {
        let uri: Uri = format!("/?{qs}").parse().unwrap();
        Query::<T>::try_from_uri(&uri).ok().map(|Query(params)| params)
    }

    fn query<T: DeserializeOwned>(qs: &str) -> T {
        parse(qs).unwrap()
    }

    #[test]
    fn test_tweet_params_defaults() {
        let params: TweetsByUserParams =
            query("user_id=42&start_date=2023-01-01+00%3A00&end_date=2023-01-31+23%3A59");
        let page = params.page().unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.order, TweetOrder::FavoriteCount);
        assert_eq!(page.range.lte_value(), "2023-01-31 23:59:59");
    }

    #[test]
    fn test_inverted_window_is_rejected() {
        let params: TweetsByUserParams =
            query("user_id=42&start_date=2023-02-01+00%3A00&end_date=2023-01-01+00%3A00");
        assert!(matches!(params.page(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_count_limits() {
        assert!(page_size(Some(0), 1).is_err());
        assert_eq!(page_size(Some(MAX_COUNT), 1).unwrap(), MAX_COUNT);
        assert!(page_size(Some(MAX_COUNT + 1), 1).is_err());
    }

    #[test]
    fn test_comma_lists_from_query_and_json() {
        let params: TweetsByUsersParams =
            query("user_ids=1,2,%203&start_date=2023-01-01+00%3A00&end_date=2023-01-01+00%3A00");
        assert_eq!(params.user_ids, vec![1, 2, 3]);
        assert_eq!(params.page().unwrap().order, TweetOrder::CreatedAt);

        let params: UserIdsParams = serde_json::from_value(json!({
            "user_ids": [7, 8],
            "start_date": "2023-01-01 00:00",
            "end_date": "2023-01-02 00:00"
        }))
        .unwrap();
        assert_eq!(params.user_ids, vec![7, 8]);
    }

    #[test]
    fn test_bad_list_item_fails_to_parse() {
        let result: Option<TweetsByUsersParams> =
            parse("user_ids=1,two&start_date=2023-01-01+00%3A00&end_date=2023-01-01+00%3A00");
        assert!(result.is_none());
    }

    #[test]
    fn test_hashtag_ranking_needs_keyword_or_hashtag() {
        let params: HashtagRankingParams =
            query("start_date=2023-01-01+00%3A00&end_date=2023-03-31+23%3A59&retweet_min=0");
        assert!(params.into_query().is_err());

        let params: HashtagRankingParams = query(
            "keyword=news&retweet_min=0&hashtag_exclude=ad,promo\
             &start_date=2023-01-01+00%3A00&end_date=2023-03-31+23%3A59",
        );
        let (filters, _, count) = params.into_query().unwrap();
        assert_eq!(filters.retweet_min, Some(0));
        assert_eq!(filters.retweet_max, None);
        assert_eq!(filters.hashtag_exclude, vec!["ad", "promo"]);
        assert_eq!(count, 10);
    }

    #[test]
    fn test_paired_bounds() {
        assert!(bounds("retweet", Some(10_u64), Some(5)).is_err());
        assert!(bounds("retweet", Some(10_u64), Some(0)).is_ok());
        assert!(bounds("sr_score", Some(0.5), Some(0.7)).is_ok());
    }

    #[test]
    fn test_unknown_order_is_rejected() {
        let result: Option<UserSearchParams> = parse(
            "name=ann&order_by=retweet_count\
             &start_date=2023-01-01+00%3A00&end_date=2023-01-01+00%3A00",
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_media_type_validation() {
        let params: TweetsByMediaParams = query(
            "user_id=1&media_type=5&start_date=2023-01-01+00%3A00&end_date=2023-01-01+00%3A00",
        );
        assert!(params.page().is_err());
    }

    #[test]
    fn test_transition_defaults() {
        let params: TransitionParams = query("user_id=1&start_date=2023-01-01&end_date=2023-01-31");
        assert_eq!(params.limit().unwrap(), 100);
        let params: TransitionParams = query("user_id=1&start_date=2023-02-01&end_date=2023-01-31");
        assert!(params.limit().is_err());
    }
}
