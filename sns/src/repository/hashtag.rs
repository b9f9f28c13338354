use super::{decoded, fetch, observed, SearchContext, Stage};
use crate::domain::{DateRange, Hashtag, HashtagCount, SearchResult};
use crate::index::IndexTarget;
use crate::query::{GroupedAggregation, Group, QueryBuilder, SearchBody, TextQuery};
use crate::search::{decode_buckets, metric_value};
use crate::Result;

const DISTINCT_COUNT: &str = "distinct_hashtag_count";
const GROUP_BY: &str = "group_by_hashtag";

/// Optional filters for hashtag ranking. Unset fields add no clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HashtagFilters {
    /// Phrase in the tweet text
    pub keyword: Option<String>,
    /// Substring match, one clause per tag
    pub hashtags: Vec<String>,
    pub tweet_types: Vec<i64>,
    pub retweet_min: Option<u64>,
    pub retweet_max: Option<u64>,
    pub quote_min: Option<u64>,
    pub quote_max: Option<u64>,
    pub favorite_min: Option<u64>,
    pub favorite_max: Option<u64>,
    pub user_include: Vec<String>,
    pub user_exclude: Vec<String>,
    pub hashtag_include: Vec<String>,
    pub hashtag_exclude: Vec<String>,
    pub user_follower_min: Option<u64>,
    pub user_follower_max: Option<u64>,
    pub user_status_min: Option<u64>,
    pub user_status_max: Option<u64>,
}

pub struct HashtagRepository {
    ctx: SearchContext,
}

impl HashtagRepository {
    pub fn new(ctx: SearchContext) -> Self {
        Self { ctx }
    }

    /// Most used hashtags among matching tweets, with engagement averages
    /// and sums. `total_hits` is the approximate number of distinct tags.
    pub async fn hashtag_ranking(
        &self,
        filters: &HashtagFilters,
        range: &DateRange,
        count: usize,
    ) -> Result<SearchResult<Hashtag>> {
        const OPERATION: &str = "hashtag_ranking";

        let result: Result<SearchResult<Hashtag>> = async {
            let body = GroupedAggregation::new("hashtag", count)
                .avg_and_sum("retweet", "retweet_count")
                .avg_and_sum("favorite", "favorite_count")
                .avg_and_sum("quote", "quote_count")
                .avg_and_sum("reply", "reply_count")
                .attach(SearchBody::new(ranking_query(filters, range)), DISTINCT_COUNT, GROUP_BY);

            let target = IndexTarget::shards(&self.ctx.indices.tweet, range);
            let response = fetch(&self.ctx, OPERATION, Stage::Primary, &target, &body, 0).await?;
            let distinct =
                decoded(OPERATION, Stage::Primary, metric_value(&response, DISTINCT_COUNT))?;
            let tags = decoded(
                OPERATION,
                Stage::Primary,
                decode_buckets(&response, GROUP_BY, &self.ctx.decode),
            )?;
            Ok(SearchResult::new(tags, distinct))
        }
        .await;

        observed(OPERATION, result)
    }

    /// Hashtags containing `hashtag`, ranked by tweet count.
    pub async fn hashtag_search(
        &self,
        hashtag: &str,
        range: &DateRange,
        count: usize,
    ) -> Result<SearchResult<HashtagCount>> {
        const OPERATION: &str = "hashtag_search";

        let result: Result<SearchResult<HashtagCount>> = async {
            let mut query = QueryBuilder::new();
            query
                .text(Group::Must, "hashtag", Some(hashtag), TextQuery::Contains)
                .time_range(Group::Filter, "created_at", range);
            let body = GroupedAggregation::new("hashtag", count).attach(
                SearchBody::new(query.build()),
                DISTINCT_COUNT,
                GROUP_BY,
            );

            let target = IndexTarget::shards(&self.ctx.indices.tweet, range);
            let response = fetch(&self.ctx, OPERATION, Stage::Primary, &target, &body, 0).await?;
            let distinct =
                decoded(OPERATION, Stage::Primary, metric_value(&response, DISTINCT_COUNT))?;
            let tags = decoded(
                OPERATION,
                Stage::Primary,
                decode_buckets(&response, GROUP_BY, &self.ctx.decode),
            )?;
            Ok(SearchResult::new(tags, distinct))
        }
        .await;

        observed(OPERATION, result)
    }
}

/// Scoring filters go to `must`, exclusions to `must_not`, the time window
/// to `filter`.
pub(crate) fn ranking_query(
    filters: &HashtagFilters,
    range: &DateRange,
) -> crate::query::BoolQuery {
    let mut query = QueryBuilder::new();
    query
        .text(Group::Must, "tweet", filters.keyword.as_deref(), TextQuery::Phrase)
        .each(Group::Must, "hashtag", &filters.hashtags, TextQuery::Contains)
        .any_of(Group::Must, "tweet_type", &filters.tweet_types)
        .at_least(Group::Must, "retweet_count", filters.retweet_min)
        .at_most(Group::Must, "retweet_count", filters.retweet_max)
        .at_least(Group::Must, "quote_count", filters.quote_min)
        .at_most(Group::Must, "quote_count", filters.quote_max)
        .at_least(Group::Must, "favorite_count", filters.favorite_min)
        .at_most(Group::Must, "favorite_count", filters.favorite_max)
        .any_of(Group::Must, "user_screen_name", &filters.user_include)
        .each(Group::Must, "hashtag", &filters.hashtag_include, TextQuery::Match)
        .at_least(Group::Must, "user_followers_count", filters.user_follower_min)
        .at_most(Group::Must, "user_followers_count", filters.user_follower_max)
        .at_least(Group::Must, "user_statuses_count", filters.user_status_min)
        .at_most(Group::Must, "user_statuses_count", filters.user_status_max)
        .time_range(Group::Filter, "created_at", range)
        .any_of(Group::MustNot, "user_screen_name", &filters.user_exclude)
        .each(Group::MustNot, "hashtag", &filters.hashtag_exclude, TextQuery::Match);
    query.build()
}
