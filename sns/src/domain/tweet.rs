use crate::search::{Decode, DecodeContext, Fields};
use crate::Result;
use serde::Serialize;

/// A tweet as stored in the monthly `tweet-*` shards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tweet {
    pub user_id: String,
    pub user_screen_name: String,
    pub user_name: String,
    pub tweet_id: String,
    pub text: String,
    pub quote_count: u64,
    pub favorite_count: u64,
    pub retweet_count: u64,
    pub reply_count: u64,
    pub created_at: String,
    pub nested_url: Vec<NestedUrl>,
}

/// URL mention embedded in a tweet document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NestedUrl {
    pub canonical_url: String,
    pub domain: String,
}

impl NestedUrl {
    fn from_entry(entry: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            canonical_url: entry.required("canonical_url")?,
            domain: entry.required("domain")?,
        })
    }

    /// URL mentions that matched a nested query, read from the hit's
    /// `inner_hits` rather than its source.
    pub fn from_inner_hits(hit: &Fields<'_>) -> Result<Vec<Self>> {
        hit.each("inner_hits.nested_url.hits.hits", |inner| {
            Ok(Self {
                canonical_url: inner.required("_source.canonical_url")?,
                domain: inner.required("_source.domain")?,
            })
        })
    }
}

impl Tweet {
    /// Decode a hit with a URL list supplied by the caller; the hit's own
    /// `_source.nested_url` is not read.
    pub fn with_urls(
        hit: &Fields<'_>,
        ctx: &DecodeContext,
        nested_url: Vec<NestedUrl>,
    ) -> Result<Self> {
        Ok(Self {
            user_id: hit.required("_source.user_id")?,
            user_screen_name: hit.required("_source.user_screen_name")?,
            user_name: hit.required("_source.user_name")?,
            tweet_id: hit.required("_id")?,
            text: hit.required("_source.tweet")?,
            quote_count: hit.required("_source.quote_count")?,
            favorite_count: hit.required("_source.favorite_count")?,
            retweet_count: hit.required("_source.retweet_count")?,
            reply_count: hit.required("_source.reply_count")?,
            created_at: ctx.timestamp(hit, "_source.created_at")?,
            nested_url,
        })
    }
}

impl Decode for Tweet {
    const RECORD: &'static str = "tweet";

    fn decode(hit: &Fields<'_>, ctx: &DecodeContext) -> Result<Self> {
        let nested_url = hit.each("_source.nested_url", NestedUrl::from_entry)?;
        Self::with_urls(hit, ctx, nested_url)
    }
}

/// Media summary of a tweet, the primary record of the media flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TweetMedia {
    pub tweet_id: String,
    pub media_type: i64,
    pub favorite_count: u64,
    pub retweet_count: u64,
    /// Source tweet id, the key into the media index.
    #[serde(skip_serializing)]
    pub source_id: String,
}

impl Decode for TweetMedia {
    const RECORD: &'static str = "tweet_media";

    fn decode(hit: &Fields<'_>, _ctx: &DecodeContext) -> Result<Self> {
        Ok(Self {
            tweet_id: hit.required("_id")?,
            media_type: hit.required("_source.media_type")?,
            favorite_count: hit.required("_source.favorite_count")?,
            retweet_count: hit.required("_source.retweet_count")?,
            source_id: hit.required("_source.id")?,
        })
    }
}

/// Metadata for one canonical URL from the `url` index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlInfo {
    pub canonical_url: String,
    pub title: String,
    pub description: String,
}

impl Decode for UrlInfo {
    const RECORD: &'static str = "url_info";

    fn decode(hit: &Fields<'_>, _ctx: &DecodeContext) -> Result<Self> {
        Ok(Self {
            canonical_url: hit.required("_source.canonical_url")?,
            title: hit.optional("_source.unwound.title"),
            description: hit.optional("_source.unwound.description"),
        })
    }
}

/// Media attachment from the `media` index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Media {
    pub tweet_id: String,
    pub media_url: String,
}

impl Decode for Media {
    const RECORD: &'static str = "media";

    fn decode(hit: &Fields<'_>, _ctx: &DecodeContext) -> Result<Self> {
        Ok(Self {
            tweet_id: hit.required("_source.source_status_id")?,
            media_url: hit.required("_source.media_url_https")?,
        })
    }
}
