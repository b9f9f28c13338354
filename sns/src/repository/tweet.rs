use super::enrich::{lookup, settle, Lookup};
use super::{decoded, fetch, observed, DerivedKeys, SearchContext, Stage};
use crate::domain::{
    DateRange, Enriched, Media, MediaType, NestedUrl, SearchResult, Tweet, TweetMedia, TweetOrder,
    UrlInfo,
};
use crate::index::IndexTarget;
use crate::query::{FilterClause, Group, QueryBuilder, SearchBody};
use crate::search::{decode_hits, Decode, DecodeContext, Fields, SearchResponse};
use crate::Result;

/// `tweet_type` of a plain post
const TWEET_TYPE_NORMAL: i64 = 1;

/// Time window, page size and ordering shared by the tweet operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TweetPage {
    pub range: DateRange,
    pub count: usize,
    pub order: TweetOrder,
}

pub struct TweetRepository {
    ctx: SearchContext,
}

impl TweetRepository {
    pub fn new(ctx: SearchContext) -> Self {
        Self { ctx }
    }

    /// One user's original tweets inside the window.
    pub async fn tweets_by_user(
        &self,
        user_id: u64,
        page: &TweetPage,
    ) -> Result<SearchResult<Tweet>> {
        const OPERATION: &str = "tweets_by_user";

        let result: Result<SearchResult<Tweet>> = async {
            let body = self.timeline_body(user_id, page, None);
            let target = IndexTarget::all_shards(&self.ctx.indices.tweet);
            let response =
                fetch(&self.ctx, OPERATION, Stage::Primary, &target, &body, page.count).await?;
            let tweets =
                decoded(OPERATION, Stage::Primary, decode_hits(&response, &self.ctx.decode))?;
            Ok(SearchResult::new(tweets, response.total_hits()))
        }
        .await;

        observed(OPERATION, result)
    }

    /// Original tweets by any of several users, searched in the monthly
    /// shards covering the window.
    pub async fn tweets_by_users(
        &self,
        user_ids: &[u64],
        page: &TweetPage,
    ) -> Result<SearchResult<Tweet>> {
        const OPERATION: &str = "tweets_by_users";

        if user_ids.is_empty() {
            return Ok(SearchResult::empty());
        }

        let result: Result<SearchResult<Tweet>> = async {
            let authors = user_ids
                .iter()
                .map(|id| FilterClause::match_phrase("user_id", *id))
                .collect();

            let mut query = QueryBuilder::new();
            query
                .push(Group::Filter, FilterClause::any_of(authors))
                .push(Group::Filter, FilterClause::matches("tweet_type", TWEET_TYPE_NORMAL));
            let body = SearchBody::new(query.build())
                .collapse("id")
                .sort_desc(page.order.field());

            let target = IndexTarget::shards(&self.ctx.indices.tweet, &page.range);
            let response =
                fetch(&self.ctx, OPERATION, Stage::Primary, &target, &body, page.count).await?;
            let tweets =
                decoded(OPERATION, Stage::Primary, decode_hits(&response, &self.ctx.decode))?;
            Ok(SearchResult::new(tweets, response.total_hits()))
        }
        .await;

        observed(OPERATION, result)
    }

    /// Tweets linking to `domain`, plus metadata for every matched URL.
    ///
    /// Each tweet's `nested_url` holds only the URLs that matched. URL
    /// metadata is returned separately, keyed by canonical URL.
    pub async fn tweets_by_domain(
        &self,
        user_id: u64,
        page: &TweetPage,
        domain: &str,
    ) -> Result<Enriched<Tweet, UrlInfo>> {
        const OPERATION: &str = "tweets_by_domain";

        let result: Result<Enriched<Tweet, UrlInfo>> = async {
            let linked = FilterClause::nested_with_inner_hits(
                "nested_url",
                FilterClause::match_phrase("nested_url.domain", domain),
            );
            let body = self.timeline_body(user_id, page, Some(linked));
            let target = IndexTarget::all_shards(&self.ctx.indices.tweet);
            let response =
                fetch(&self.ctx, OPERATION, Stage::Primary, &target, &body, page.count).await?;
            let (tweets, keys) =
                decoded(OPERATION, Stage::Primary, linked_tweets(&response, &self.ctx.decode))?;
            let primary = SearchResult::new(tweets, response.total_hits());

            let urls = lookup::<UrlInfo>(
                &self.ctx,
                OPERATION,
                Lookup {
                    flow: "url",
                    target: IndexTarget::single(&self.ctx.indices.url),
                    key_field: "canonical_url",
                    size: self.ctx.indices.url_fanout_cap,
                    collapse: None,
                },
                keys,
            )
            .await;

            Ok(settle("url", primary, urls))
        }
        .await;

        observed(OPERATION, result)
    }

    /// Tweets carrying media of the given type, plus their media records.
    pub async fn tweets_by_media_type(
        &self,
        user_id: u64,
        page: &TweetPage,
        media_type: MediaType,
    ) -> Result<Enriched<TweetMedia, Media>> {
        const OPERATION: &str = "tweets_by_media_type";

        let result: Result<Enriched<TweetMedia, Media>> = async {
            let types = media_type
                .codes()
                .iter()
                .map(|code| FilterClause::match_phrase("media_type", *code))
                .collect();
            let body = self.timeline_body(user_id, page, Some(FilterClause::any_of(types)));
            let target = IndexTarget::all_shards(&self.ctx.indices.tweet);
            let response =
                fetch(&self.ctx, OPERATION, Stage::Primary, &target, &body, page.count).await?;
            let tweets: Vec<TweetMedia> =
                decoded(OPERATION, Stage::Primary, decode_hits(&response, &self.ctx.decode))?;

            let mut keys = DerivedKeys::new();
            for tweet in &tweets {
                keys.insert(tweet.source_id.as_str());
            }
            let primary = SearchResult::new(tweets, response.total_hits());

            let media = lookup::<Media>(
                &self.ctx,
                OPERATION,
                Lookup {
                    flow: "media",
                    target: IndexTarget::single(&self.ctx.indices.media),
                    key_field: "source_status_id",
                    size: page.count,
                    collapse: Some("id"),
                },
                keys,
            )
            .await;

            Ok(settle("media", primary, media))
        }
        .await;

        observed(OPERATION, result)
    }

    /// One author's original tweets in the window, with an optional extra
    /// `must` clause.
    fn timeline_body(
        &self,
        user_id: u64,
        page: &TweetPage,
        extra: Option<FilterClause>,
    ) -> SearchBody {
        let mut query = QueryBuilder::new();
        query.push(Group::Must, FilterClause::match_phrase("user_id", user_id));
        if let Some(clause) = extra {
            query.push(Group::Must, clause);
        }
        query
            .time_range(Group::Filter, "created_at", &page.range)
            .push(Group::Filter, FilterClause::matches("tweet_type", TWEET_TYPE_NORMAL));

        SearchBody::new(query.build())
            .collapse("id")
            .sort_desc(page.order.field())
    }
}

/// Decode domain-flow hits, replacing each tweet's URLs with the matched
/// inner hits and collecting their canonical URLs as lookup keys.
fn linked_tweets(
    response: &SearchResponse,
    ctx: &DecodeContext,
) -> Result<(Vec<Tweet>, DerivedKeys)> {
    let mut keys = DerivedKeys::new();
    let mut tweets = Vec::with_capacity(response.hits.hits.len());

    for hit in &response.hits.hits {
        let fields = Fields::new(Tweet::RECORD, hit);
        let tweet = Tweet::with_urls(&fields, ctx, NestedUrl::from_inner_hits(&fields)?)?;
        for url in &tweet.nested_url {
            keys.insert(url.canonical_url.as_str());
        }
        tweets.push(tweet);
    }

    Ok((tweets, keys))
}
