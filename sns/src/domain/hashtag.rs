use crate::search::{Decode, DecodeContext, Fields};
use crate::Result;
use serde::Serialize;

/// One `group_by_hashtag` bucket with engagement statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hashtag {
    pub hashtag: String,
    pub status_count: u64,
    pub retweet_avg: f64,
    pub retweet_count: u64,
    pub favorite_avg: f64,
    pub favorite_count: u64,
    pub reply_avg: f64,
    pub reply_count: u64,
    pub quote_avg: f64,
    pub quote_count: u64,
}

impl Decode for Hashtag {
    const RECORD: &'static str = "hashtag";

    fn decode(bucket: &Fields<'_>, _ctx: &DecodeContext) -> Result<Self> {
        Ok(Self {
            hashtag: bucket.required("key")?,
            status_count: bucket.required("doc_count")?,
            retweet_avg: bucket.optional("retweet_avg.value"),
            retweet_count: bucket.optional("retweet_sum.value"),
            favorite_avg: bucket.optional("favorite_avg.value"),
            favorite_count: bucket.optional("favorite_sum.value"),
            reply_avg: bucket.optional("reply_avg.value"),
            reply_count: bucket.optional("reply_sum.value"),
            quote_avg: bucket.optional("quote_avg.value"),
            quote_count: bucket.optional("quote_sum.value"),
        })
    }
}

/// Bucket returned by hashtag search: tag and document count only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashtagCount {
    pub hashtag: String,
    pub status_count: u64,
}

impl Decode for HashtagCount {
    const RECORD: &'static str = "hashtag_count";

    fn decode(bucket: &Fields<'_>, _ctx: &DecodeContext) -> Result<Self> {
        Ok(Self {
            hashtag: bucket.required("key")?,
            status_count: bucket.required("doc_count")?,
        })
    }
}
