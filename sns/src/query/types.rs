//! Search request document types
//!
//! The subset of the engine's Query DSL emitted by the repositories. Only
//! serialization is needed: documents are built here and sent, never parsed.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Root search request body
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchBody {
    /// The query to execute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<FilterClause>,

    /// Keep one hit per value of a field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapse: Option<Collapse>,

    /// Sort order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<BTreeMap<String, SortOrder>>,

    /// Aggregations
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub aggs: BTreeMap<String, Aggregation>,
}

impl SearchBody {
    pub fn new(query: BoolQuery) -> Self {
        Self {
            query: Some(FilterClause::Bool(query)),
            ..Default::default()
        }
    }

    pub fn collapse(mut self, field: &str) -> Self {
        self.collapse = Some(Collapse {
            field: field.to_string(),
        });
        self
    }

    pub fn sort_desc(mut self, field: &str) -> Self {
        self.sort
            .push(BTreeMap::from([(field.to_string(), SortOrder::Desc)]));
        self
    }

    pub fn aggregation(mut self, name: &str, aggregation: Aggregation) -> Self {
        self.aggs.insert(name.to_string(), aggregation);
        self
    }

    /// Encode the document, reporting failure as a build error.
    pub fn to_bytes(&self) -> crate::Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(crate::Error::Build)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collapse {
    pub field: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Query clauses
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterClause {
    /// Exact match, not analyzed
    Term(BTreeMap<String, Value>),

    /// Exact match against any of several values
    Terms(BTreeMap<String, Vec<Value>>),

    /// Analyzed full-text match
    Match(BTreeMap<String, Value>),

    /// Analyzed phrase match
    MatchPhrase(BTreeMap<String, Value>),

    /// Pattern match with `*` and `?`
    Wildcard(BTreeMap<String, WildcardParams>),

    /// Bounded range
    Range(BTreeMap<String, RangeParams>),

    /// Query against nested sub-documents
    Nested(NestedQuery),

    /// Boolean combination
    Bool(BoolQuery),
}

impl FilterClause {
    pub fn term(field: &str, value: impl Into<Value>) -> Self {
        Self::Term(single(field, value.into()))
    }

    pub fn terms(field: &str, values: Vec<Value>) -> Self {
        Self::Terms(single(field, values))
    }

    pub fn matches(field: &str, value: impl Into<Value>) -> Self {
        Self::Match(single(field, value.into()))
    }

    pub fn match_phrase(field: &str, value: impl Into<Value>) -> Self {
        Self::MatchPhrase(single(field, value.into()))
    }

    /// Substring match: the value is wrapped as `*value*`.
    pub fn contains(field: &str, value: &str) -> Self {
        Self::Wildcard(single(
            field,
            WildcardParams {
                value: format!("*{}*", value),
            },
        ))
    }

    pub fn range(field: &str, params: RangeParams) -> Self {
        Self::Range(single(field, params))
    }

    /// Nested query that also returns the matching sub-documents.
    pub fn nested_with_inner_hits(path: &str, query: FilterClause) -> Self {
        Self::Nested(NestedQuery {
            path: path.to_string(),
            inner_hits: Some(InnerHits {}),
            query: Box::new(query),
        })
    }

    /// `bool.should` over the given clauses.
    pub fn any_of(clauses: Vec<FilterClause>) -> Self {
        Self::Bool(BoolQuery {
            should: clauses,
            ..Default::default()
        })
    }
}

fn single<T>(field: &str, value: T) -> BTreeMap<String, T> {
    BTreeMap::from([(field.to_string(), value)])
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WildcardParams {
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RangeParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gte: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lte: Option<Value>,
}

impl RangeParams {
    pub fn gte(value: impl Into<Value>) -> Self {
        Self {
            gte: Some(value.into()),
            lte: None,
        }
    }

    pub fn lte(value: impl Into<Value>) -> Self {
        Self {
            gte: None,
            lte: Some(value.into()),
        }
    }

    pub fn between(gte: impl Into<Value>, lte: impl Into<Value>) -> Self {
        Self {
            gte: Some(gte.into()),
            lte: Some(lte.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedQuery {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner_hits: Option<InnerHits>,
    pub query: Box<FilterClause>,
}

/// Empty `inner_hits` object: return matching sub-documents with defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InnerHits {}

/// Four independent clause groups. Empty groups are left off the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoolQuery {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<FilterClause>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<FilterClause>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<FilterClause>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must_not: Vec<FilterClause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_should_match: Option<u32>,
}

/// One named aggregation, with optional sub-aggregations
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<CardinalityAgg>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms: Option<TermsAgg>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg: Option<FieldAgg>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum: Option<FieldAgg>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub aggs: BTreeMap<String, Aggregation>,
}

impl Aggregation {
    /// Approximate distinct count, exact up to `precision_threshold`.
    pub fn cardinality(field: &str, precision_threshold: usize) -> Self {
        Self {
            cardinality: Some(CardinalityAgg {
                field: field.to_string(),
                precision_threshold,
            }),
            ..Default::default()
        }
    }

    /// Top `size` buckets by document count.
    pub fn terms(field: &str, size: usize) -> Self {
        Self {
            terms: Some(TermsAgg {
                field: field.to_string(),
                size,
                order: BTreeMap::from([("_count".to_string(), SortOrder::Desc)]),
            }),
            ..Default::default()
        }
    }

    pub fn avg(field: &str) -> Self {
        Self {
            avg: Some(FieldAgg {
                field: field.to_string(),
            }),
            ..Default::default()
        }
    }

    pub fn sum(field: &str) -> Self {
        Self {
            sum: Some(FieldAgg {
                field: field.to_string(),
            }),
            ..Default::default()
        }
    }

    pub fn with_sub(mut self, name: impl Into<String>, sub: Aggregation) -> Self {
        self.aggs.insert(name.into(), sub);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardinalityAgg {
    pub field: String,
    pub precision_threshold: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermsAgg {
    pub field: String,
    pub size: usize,
    pub order: BTreeMap<String, SortOrder>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldAgg {
    pub field: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_groups_are_omitted() {
        let query = BoolQuery {
            must: vec![FilterClause::match_phrase("tweet", "news")],
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({"must": [{"match_phrase": {"tweet": "news"}}]})
        );
    }

    #[test]
    fn test_nested_clause_with_inner_hits() {
        let clause = FilterClause::nested_with_inner_hits(
            "nested_url",
            FilterClause::match_phrase("nested_url.domain", "example.com"),
        );
        assert_eq!(
            serde_json::to_value(&clause).unwrap(),
            json!({"nested": {
                "path": "nested_url",
                "inner_hits": {},
                "query": {"match_phrase": {"nested_url.domain": "example.com"}}
            }})
        );
    }

    #[test]
    fn test_body_with_collapse_sort_and_aggs() {
        let body = SearchBody::new(BoolQuery::default())
            .collapse("id")
            .sort_desc("favorite_count")
            .aggregation("distinct", Aggregation::cardinality("hashtag", 10));

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "query": {"bool": {}},
                "collapse": {"field": "id"},
                "sort": [{"favorite_count": "desc"}],
                "aggs": {"distinct": {
                    "cardinality": {"field": "hashtag", "precision_threshold": 10}
                }}
            })
        );
    }

    #[test]
    fn test_terms_agg_with_metrics() {
        let agg = Aggregation::terms("hashtag", 5)
            .with_sub("retweet_avg", Aggregation::avg("retweet_count"));
        assert_eq!(
            serde_json::to_value(&agg).unwrap(),
            json!({
                "terms": {"field": "hashtag", "size": 5, "order": {"_count": "desc"}},
                "aggs": {"retweet_avg": {"avg": {"field": "retweet_count"}}}
            })
        );
    }

    #[test]
    fn test_wildcard_wraps_value() {
        assert_eq!(
            serde_json::to_value(FilterClause::contains("hashtag", "rust")).unwrap(),
            json!({"wildcard": {"hashtag": {"value": "*rust*"}}})
        );
    }
}
