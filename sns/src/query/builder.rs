//! Boolean query assembly from optional filter inputs
//!
//! Every input is an `Option`: `None` never renders a clause. `Some` renders
//! one unless the value is at that input type's absence boundary:
//!
//! | input            | renders when                        |
//! |------------------|-------------------------------------|
//! | text             | non-empty after trimming            |
//! | lower bound      | always (`Some(0)` renders `gte: 0`) |
//! | upper bound      | value > 0                           |
//! | score bounds     | value > 0.0                         |
//! | lists            | at least one element                |
//! | time range       | always                              |

use super::types::{BoolQuery, FilterClause, RangeParams};
use crate::domain::DateRange;
use serde_json::Value;

/// Clause group a filter is appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Must,
    Filter,
    Should,
    MustNot,
}

/// How a text value is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextQuery {
    Phrase,
    Match,
    Term,
    /// Substring match via `*value*`
    Contains,
}

impl TextQuery {
    fn clause(self, field: &str, value: &str) -> FilterClause {
        match self {
            Self::Phrase => FilterClause::match_phrase(field, value),
            Self::Match => FilterClause::matches(field, value),
            Self::Term => FilterClause::term(field, value),
            Self::Contains => FilterClause::contains(field, value),
        }
    }
}

#[derive(Debug, Default)]
pub struct QueryBuilder {
    query: BoolQuery,
    minimum_should_match: Option<u32>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn group(&mut self, group: Group) -> &mut Vec<FilterClause> {
        match group {
            Group::Must => &mut self.query.must,
            Group::Filter => &mut self.query.filter,
            Group::Should => &mut self.query.should,
            Group::MustNot => &mut self.query.must_not,
        }
    }

    /// Append a fixed clause unconditionally.
    pub fn push(&mut self, group: Group, clause: FilterClause) -> &mut Self {
        self.group(group).push(clause);
        self
    }

    pub fn text(
        &mut self,
        group: Group,
        field: &str,
        value: Option<&str>,
        kind: TextQuery,
    ) -> &mut Self {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.push(group, kind.clause(field, value));
        }
        self
    }

    /// `gte` bound. An explicit zero floor is kept.
    pub fn at_least(&mut self, group: Group, field: &str, value: Option<u64>) -> &mut Self {
        if let Some(value) = value {
            self.push(group, FilterClause::range(field, RangeParams::gte(value)));
        }
        self
    }

    /// `lte` bound. Zero means no ceiling.
    pub fn at_most(&mut self, group: Group, field: &str, value: Option<u64>) -> &mut Self {
        if let Some(value) = value.filter(|v| *v > 0) {
            self.push(group, FilterClause::range(field, RangeParams::lte(value)));
        }
        self
    }

    pub fn score_at_least(&mut self, group: Group, field: &str, value: Option<f64>) -> &mut Self {
        if let Some(value) = value.filter(|v| *v > 0.0) {
            self.push(group, FilterClause::range(field, RangeParams::gte(value)));
        }
        self
    }

    pub fn score_at_most(&mut self, group: Group, field: &str, value: Option<f64>) -> &mut Self {
        if let Some(value) = value.filter(|v| *v > 0.0) {
            self.push(group, FilterClause::range(field, RangeParams::lte(value)));
        }
        self
    }

    /// One `terms` clause matching any of the values.
    pub fn any_of<T>(&mut self, group: Group, field: &str, values: &[T]) -> &mut Self
    where
        T: Clone + Into<Value>,
    {
        if !values.is_empty() {
            let values = values.iter().cloned().map(Into::into).collect();
            self.push(group, FilterClause::terms(field, values));
        }
        self
    }

    /// One clause per element. Used where `terms` cannot express the match,
    /// such as substring matching on hashtags.
    pub fn each(
        &mut self,
        group: Group,
        field: &str,
        values: &[String],
        kind: TextQuery,
    ) -> &mut Self {
        for value in values {
            self.text(group, field, Some(value.as_str()), kind);
        }
        self
    }

    pub fn time_range(&mut self, group: Group, field: &str, range: &DateRange) -> &mut Self {
        self.push(
            group,
            FilterClause::range(field, RangeParams::between(range.gte_value(), range.lte_value())),
        )
    }

    /// Require `n` should clauses to match, applied only when the should
    /// group ends up non-empty.
    pub fn minimum_should_match(&mut self, n: u32) -> &mut Self {
        self.minimum_should_match = Some(n);
        self
    }

    pub fn build(self) -> BoolQuery {
        let mut query = self.query;
        if !query.should.is_empty() {
            query.minimum_should_match = self.minimum_should_match;
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn to_json(builder: QueryBuilder) -> Value {
        serde_json::to_value(builder.build()).unwrap()
    }

    #[test]
    fn test_absent_values_render_nothing() {
        let mut b = QueryBuilder::new();
        b.text(Group::Must, "tweet", None, TextQuery::Phrase)
            .text(Group::Must, "tweet", Some("   "), TextQuery::Phrase)
            .at_least(Group::Must, "retweet_count", None)
            .at_most(Group::Must, "retweet_count", Some(0))
            .score_at_least(Group::Filter, "sr_score", Some(0.0))
            .any_of::<String>(Group::Must, "user_screen_name", &[])
            .each(Group::Must, "hashtag", &[], TextQuery::Contains);
        assert_eq!(to_json(b), json!({}));
    }

    #[test]
    fn test_one_past_boundary_renders() {
        let mut b = QueryBuilder::new();
        b.at_most(Group::Must, "retweet_count", Some(1))
            .score_at_most(Group::Filter, "sr_score", Some(0.5))
            .text(Group::Must, "tweet", Some("a"), TextQuery::Phrase);
        assert_eq!(
            to_json(b),
            json!({
                "must": [
                    {"range": {"retweet_count": {"lte": 1}}},
                    {"match_phrase": {"tweet": "a"}}
                ],
                "filter": [{"range": {"sr_score": {"lte": 0.5}}}]
            })
        );
    }

    #[test]
    fn test_explicit_zero_floor_is_kept() {
        let mut b = QueryBuilder::new();
        b.at_least(Group::Must, "quote_count", Some(0));
        assert_eq!(
            to_json(b),
            json!({"must": [{"range": {"quote_count": {"gte": 0}}}]})
        );
    }

    #[test]
    fn test_list_inputs() {
        let mut b = QueryBuilder::new();
        b.any_of(Group::Must, "tweet_type", &[1_i64, 3])
            .each(
                Group::Must,
                "hashtag",
                &["rust".to_string(), "go".to_string()],
                TextQuery::Contains,
            )
            .each(Group::MustNot, "hashtag", &["spam".to_string()], TextQuery::Match);
        assert_eq!(
            to_json(b),
            json!({
                "must": [
                    {"terms": {"tweet_type": [1, 3]}},
                    {"wildcard": {"hashtag": {"value": "*rust*"}}},
                    {"wildcard": {"hashtag": {"value": "*go*"}}}
                ],
                "must_not": [{"match": {"hashtag": "spam"}}]
            })
        );
    }

    #[test]
    fn test_time_range_renders_both_bounds() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 3, 31).unwrap().and_hms_opt(23, 59, 59).unwrap();
        let range = DateRange::new(start, end).unwrap();

        let mut b = QueryBuilder::new();
        b.time_range(Group::Filter, "created_at", &range);
        assert_eq!(
            to_json(b),
            json!({"filter": [{"range": {"created_at": {
                "gte": "2023-01-01 00:00:00",
                "lte": "2023-03-31 23:59:59"
            }}}]})
        );
    }

    #[test]
    fn test_minimum_should_match_only_with_should_clauses() {
        let mut b = QueryBuilder::new();
        b.text(Group::Should, "name", None, TextQuery::Phrase)
            .minimum_should_match(1);
        assert_eq!(b.build().minimum_should_match, None);

        let mut b = QueryBuilder::new();
        b.text(Group::Should, "name", Some("ann"), TextQuery::Phrase)
            .minimum_should_match(1);
        assert_eq!(b.build().minimum_should_match, Some(1));
    }
}
