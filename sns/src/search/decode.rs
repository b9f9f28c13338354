//! Projection of response hits and aggregation buckets into typed records
//!
//! Every record type declares a field-mapping table in its [`Decode`] impl.
//! Lookups go through [`Fields`], which owns the single "absent means
//! default" policy: `required` fails with a decode error, `optional` falls
//! back to the type's zero value.

use super::SearchResponse;
use crate::domain::TIMESTAMP_FORMAT;
use crate::{metrics, Error, Result};
use chrono::{NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;

/// Substitute for timestamps that cannot be parsed.
pub const FALLBACK_TIMESTAMP: &str = "2006-01-01 00:00:00";

/// A value that can be read out of one JSON leaf.
pub trait FieldValue: Sized {
    /// Shape name used in decode errors.
    const SHAPE: &'static str;

    fn from_json(value: &Value) -> Option<Self>;
}

impl FieldValue for String {
    const SHAPE: &'static str = "a string";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

impl FieldValue for f64 {
    const SHAPE: &'static str = "a number";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FieldValue for u64 {
    const SHAPE: &'static str = "a non-negative number";

    fn from_json(value: &Value) -> Option<Self> {
        // counters and sums arrive as floats from aggregations
        value.as_u64().or_else(|| {
            value
                .as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        })
    }
}

impl FieldValue for i64 {
    const SHAPE: &'static str = "an integer";

    fn from_json(value: &Value) -> Option<Self> {
        value
            .as_i64()
            .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
    }
}

impl FieldValue for bool {
    const SHAPE: &'static str = "a boolean";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

/// Read-only view over one hit or bucket, addressed by dotted paths.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    record: &'static str,
    root: &'a Value,
}

impl<'a> Fields<'a> {
    pub fn new(record: &'static str, root: &'a Value) -> Self {
        Self { record, root }
    }

    pub fn record(&self) -> &'static str {
        self.record
    }

    /// Walk `a.b.c` from the root, `None` if any step is missing.
    pub fn lookup(&self, path: &str) -> Option<&'a Value> {
        path.split('.')
            .try_fold(self.root, |value, key| value.get(key))
    }

    pub fn required<T: FieldValue>(&self, path: &str) -> Result<T> {
        self.lookup(path)
            .and_then(T::from_json)
            .ok_or_else(|| Error::Decode {
                record: self.record,
                field: path.to_string(),
                expected: T::SHAPE,
            })
    }

    pub fn optional<T: FieldValue + Default>(&self, path: &str) -> T {
        self.lookup(path).and_then(T::from_json).unwrap_or_default()
    }

    /// Decode every element of an array field. A missing or non-array field
    /// yields an empty list.
    pub fn each<T, F>(&self, path: &str, decode: F) -> Result<Vec<T>>
    where
        F: Fn(&Fields<'a>) -> Result<T>,
    {
        match self.lookup(path).and_then(Value::as_array) {
            Some(items) => items
                .iter()
                .map(|item| decode(&Fields::new(self.record, item)))
                .collect(),
            None => Ok(Vec::new()),
        }
    }
}

/// Per-deployment decode settings.
#[derive(Debug, Clone)]
pub struct DecodeContext {
    pub time_zone: Tz,
    pub strict_timestamps: bool,
}

impl Default for DecodeContext {
    fn default() -> Self {
        Self {
            time_zone: chrono_tz::Asia::Tokyo,
            strict_timestamps: false,
        }
    }
}

impl DecodeContext {
    pub fn new(time_zone: Tz, strict_timestamps: bool) -> Self {
        Self {
            time_zone,
            strict_timestamps,
        }
    }

    /// Read a stored UTC wall-clock timestamp and render it in the
    /// configured zone.
    pub fn timestamp(&self, item: &Fields<'_>, path: &str) -> Result<String> {
        let raw: String = item.required(path)?;
        match NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT) {
            Ok(naive) => Ok(Utc
                .from_utc_datetime(&naive)
                .with_timezone(&self.time_zone)
                .format(TIMESTAMP_FORMAT)
                .to_string()),
            Err(_) if self.strict_timestamps => Err(Error::Timestamp {
                record: item.record(),
                value: raw,
            }),
            Err(e) => {
                tracing::warn!(
                    record = item.record(),
                    value = %raw,
                    error = %e,
                    "Unparseable timestamp, substituting fallback"
                );
                metrics::record_timestamp_fallback(item.record());
                Ok(FALLBACK_TIMESTAMP.to_string())
            }
        }
    }
}

/// A record type with a fixed field-mapping table.
pub trait Decode: Sized {
    /// Name used in decode errors, logs and metric labels.
    const RECORD: &'static str;

    fn decode(item: &Fields<'_>, ctx: &DecodeContext) -> Result<Self>;
}

/// Decode every hit of a response. The first malformed hit fails the batch.
pub fn decode_hits<T: Decode>(response: &SearchResponse, ctx: &DecodeContext) -> Result<Vec<T>> {
    response
        .hits
        .hits
        .iter()
        .map(|hit| T::decode(&Fields::new(T::RECORD, hit), ctx))
        .collect()
}

/// Decode the buckets of a terms aggregation.
pub fn decode_buckets<T: Decode>(
    response: &SearchResponse,
    aggregation: &str,
    ctx: &DecodeContext,
) -> Result<Vec<T>> {
    let buckets = response
        .aggregation(aggregation)
        .and_then(|agg| agg.get("buckets"))
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Envelope(format!("aggregation '{aggregation}' has no buckets")))?;

    buckets
        .iter()
        .map(|bucket| T::decode(&Fields::new(T::RECORD, bucket), ctx))
        .collect()
}

/// Value of a single-value metric aggregation such as `cardinality`.
pub fn metric_value(response: &SearchResponse, aggregation: &str) -> Result<u64> {
    response
        .aggregation(aggregation)
        .and_then(|agg| agg.get("value"))
        .and_then(u64::from_json)
        .ok_or_else(|| Error::Envelope(format!("aggregation '{aggregation}' has no value")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(body: Value) -> SearchResponse {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_lookup_dotted_path() {
        let doc = json!({"_source": {"unwound": {"title": "t"}}});
        let fields = Fields::new("url_info", &doc);
        assert_eq!(fields.lookup("_source.unwound.title"), Some(&json!("t")));
        assert_eq!(fields.lookup("_source.missing.title"), None);
    }

    #[test]
    fn test_u64_accepts_integral_floats() {
        assert_eq!(u64::from_json(&json!(12)), Some(12));
        assert_eq!(u64::from_json(&json!(12.0)), Some(12));
        assert_eq!(u64::from_json(&json!(-1)), None);
        assert_eq!(u64::from_json(&json!("12")), None);
    }

    #[test]
    fn test_required_reports_field_and_shape() {
        let doc = json!({"count": "lots"});
        let err = Fields::new("tweet", &doc).required::<u64>("count").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to decode tweet: field 'count' missing or not a non-negative number"
        );
    }

    #[test]
    fn test_timestamp_renormalised_to_zone() {
        let doc = json!({"created_at": "2022-12-31 20:30:00"});
        let ctx = DecodeContext::default();
        let value = ctx.timestamp(&Fields::new("tweet", &doc), "created_at").unwrap();
        assert_eq!(value, "2023-01-01 05:30:00");
    }

    #[test]
    fn test_timestamp_fallback_and_strict_mode() {
        let doc = json!({"created_at": "2023-01-01T00:00:00Z"});
        let fields = Fields::new("tweet", &doc);

        let lenient = DecodeContext::default();
        assert_eq!(lenient.timestamp(&fields, "created_at").unwrap(), FALLBACK_TIMESTAMP);

        let strict = DecodeContext::new(chrono_tz::Asia::Tokyo, true);
        assert!(matches!(
            strict.timestamp(&fields, "created_at"),
            Err(Error::Timestamp { record: "tweet", .. })
        ));
    }

    #[test]
    fn test_metric_and_buckets() {
        let resp = response(json!({
            "took": 3,
            "hits": {"total": {"value": 100, "relation": "eq"}, "hits": []},
            "aggregations": {
                "distinct_hashtag_count": {"value": 7},
                "group_by_hashtag": {"buckets": [{"key": "rust", "doc_count": 4}]}
            }
        }));
        assert_eq!(metric_value(&resp, "distinct_hashtag_count").unwrap(), 7);
        let buckets = decode_buckets::<crate::domain::HashtagCount>(
            &resp,
            "group_by_hashtag",
            &DecodeContext::default(),
        )
        .unwrap();
        assert_eq!(buckets[0].hashtag, "rust");
        assert!(metric_value(&resp, "missing").is_err());
    }
}
