use serde::Deserialize;
use serde_json::{Map, Value};

/// Top-level `_search` response envelope.
///
/// Only the envelope is typed. Hits and aggregation bodies stay as raw JSON
/// and are projected by the record decoders.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub took: u64,
    #[serde(default)]
    pub timed_out: bool,
    pub hits: HitsEnvelope,
    #[serde(default)]
    pub aggregations: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HitsEnvelope {
    #[serde(default)]
    pub total: Option<TotalHits>,
    #[serde(default)]
    pub hits: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TotalHits {
    pub value: u64,
    #[serde(default)]
    pub relation: String,
}

impl SearchResponse {
    /// Engine's true match count, which may exceed the returned page.
    pub fn total_hits(&self) -> u64 {
        self.hits.total.as_ref().map_or(0, |total| total.value)
    }

    pub fn aggregation(&self, name: &str) -> Option<&Value> {
        self.aggregations.as_ref().and_then(|aggs| aggs.get(name))
    }
}

/// Error body returned with a non-success status.
#[derive(Debug, Deserialize)]
pub struct EngineErrorBody {
    pub error: EngineError,
    #[serde(default)]
    pub status: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct EngineError {
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(default)]
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_envelope() {
        let resp: SearchResponse = serde_json::from_value(json!({
            "took": 12,
            "timed_out": false,
            "_shards": {"total": 3, "successful": 3},
            "hits": {
                "total": {"value": 2500, "relation": "eq"},
                "hits": [{"_id": "1", "_source": {}}]
            }
        }))
        .unwrap();

        assert_eq!(resp.took, 12);
        assert_eq!(resp.total_hits(), 2500);
        assert_eq!(resp.hits.hits.len(), 1);
        assert!(resp.aggregation("anything").is_none());
    }

    #[test]
    fn test_missing_total_counts_zero() {
        let resp: SearchResponse =
            serde_json::from_value(json!({"took": 1, "hits": {"hits": []}})).unwrap();
        assert_eq!(resp.total_hits(), 0);
    }

    #[test]
    fn test_envelope_without_hits_is_rejected() {
        assert!(serde_json::from_value::<SearchResponse>(json!({"took": 1})).is_err());
    }

    #[test]
    fn test_parse_engine_error() {
        let body: EngineErrorBody = serde_json::from_value(json!({
            "error": {
                "root_cause": [],
                "type": "index_not_found_exception",
                "reason": "no such index [tweet-2031.01]"
            },
            "status": 404
        }))
        .unwrap();
        assert_eq!(body.error.error_type, "index_not_found_exception");
        assert_eq!(body.status, Some(404));
    }
}
