//! Search execution and result decoding

mod client;
mod decode;
mod response;

pub use client::{ElasticsearchClient, SearchBackend};
pub use decode::{
    decode_buckets, decode_hits, metric_value, Decode, DecodeContext, FieldValue, Fields,
    FALLBACK_TIMESTAMP,
};
pub use response::{EngineError, EngineErrorBody, HitsEnvelope, SearchResponse, TotalHits};
