//! Response bodies

use crate::domain::{Enriched, Media, SearchResult, Tweet, TweetMedia, UrlInfo};
use serde::Serialize;

/// `{"hits", "res"}` envelope used by the single-stage operations
#[derive(Debug, Serialize)]
pub struct Hits<T> {
    pub hits: u64,
    pub res: T,
}

impl<T> From<SearchResult<T>> for Hits<Vec<T>> {
    fn from(result: SearchResult<T>) -> Self {
        Self {
            hits: result.total_hits,
            res: result.records,
        }
    }
}

/// Rows read in full from the relational store; `hits` is the row count.
impl<T> From<Vec<T>> for Hits<Vec<T>> {
    fn from(records: Vec<T>) -> Self {
        Self {
            hits: records.len() as u64,
            res: records,
        }
    }
}

impl<T> From<SearchResult<T>> for Hits<Option<T>> {
    fn from(result: SearchResult<T>) -> Self {
        Self {
            hits: result.total_hits,
            res: result.records.into_iter().next(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DomainTweets {
    pub hits: u64,
    pub tweets: Vec<Tweet>,
    pub url_info: Vec<UrlInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment_error: Option<String>,
}

impl From<Enriched<Tweet, UrlInfo>> for DomainTweets {
    fn from(result: Enriched<Tweet, UrlInfo>) -> Self {
        Self {
            hits: result.primary.total_hits,
            tweets: result.primary.records,
            url_info: result.secondary,
            enrichment_error: result.secondary_error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MediaTweets {
    pub hits: u64,
    pub tweets: Vec<TweetMedia>,
    pub media: Vec<Media>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment_error: Option<String>,
}

impl From<Enriched<TweetMedia, Media>> for MediaTweets {
    fn from(result: Enriched<TweetMedia, Media>) -> Self {
        Self {
            hits: result.primary.total_hits,
            tweets: result.primary.records,
            media: result.secondary,
            enrichment_error: result.secondary_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SearchResult;
    use serde_json::json;

    #[test]
    fn test_enrichment_error_only_when_present() {
        let ok = MediaTweets::from(Enriched::<TweetMedia, Media> {
            primary: SearchResult::empty(),
            secondary: Vec::new(),
            secondary_error: None,
        });
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"hits": 0, "tweets": [], "media": []})
        );

        let failed = DomainTweets::from(Enriched::<Tweet, UrlInfo> {
            primary: SearchResult::empty(),
            secondary: Vec::new(),
            secondary_error: Some("url lookup failed (engine)".to_string()),
        });
        assert_eq!(
            serde_json::to_value(&failed).unwrap()["enrichment_error"],
            "url lookup failed (engine)"
        );
    }

    #[test]
    fn test_single_record_envelope() {
        let hits: Hits<Option<u64>> = SearchResult::new(vec![7, 8], 2).into();
        assert_eq!(serde_json::to_value(&hits).unwrap(), json!({"hits": 2, "res": 7}));
        let none: Hits<Option<u64>> = SearchResult::<u64>::empty().into();
        assert_eq!(serde_json::to_value(&none).unwrap(), json!({"hits": 0, "res": null}));
    }

    #[test]
    fn test_row_list_envelope_counts_rows() {
        let hits: Hits<Vec<&str>> = vec!["a", "b", "c"].into();
        assert_eq!(
            serde_json::to_value(&hits).unwrap(),
            json!({"hits": 3, "res": ["a", "b", "c"]})
        );
    }
}
