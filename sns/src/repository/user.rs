use super::{decoded, fetch, observed, SearchContext, Stage};
use crate::domain::{DateRange, SearchResult, User, UserOrder};
use crate::index::IndexTarget;
use crate::query::{BoolQuery, FilterClause, Group, QueryBuilder, SearchBody, TextQuery};
use crate::search::decode_hits;
use crate::Result;

/// Optional filters for user search. Unset fields add no clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilters {
    /// Matched as a phrase against both screen name and display name
    pub name: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub follower_min: Option<u64>,
    pub follower_max: Option<u64>,
    pub status_min: Option<u64>,
    pub status_max: Option<u64>,
    pub favorite_min: Option<u64>,
    pub favorite_max: Option<u64>,
    pub follow_min: Option<u64>,
    pub follow_max: Option<u64>,
    pub list_min: Option<u64>,
    pub list_max: Option<u64>,
    pub sr_score_min: Option<f64>,
    pub sr_score_max: Option<f64>,
}

pub struct UserRepository {
    ctx: SearchContext,
}

impl UserRepository {
    pub fn new(ctx: SearchContext) -> Self {
        Self { ctx }
    }

    pub async fn user_search(
        &self,
        filters: &UserFilters,
        range: &DateRange,
        count: usize,
        order: UserOrder,
    ) -> Result<SearchResult<User>> {
        const OPERATION: &str = "user_search";

        let result: Result<SearchResult<User>> = async {
            let body = SearchBody::new(search_query(filters))
                .collapse("id")
                .sort_desc(order.field());
            let target = IndexTarget::shards(&self.ctx.indices.user, range);
            let response =
                fetch(&self.ctx, OPERATION, Stage::Primary, &target, &body, count).await?;
            let users =
                decoded(OPERATION, Stage::Primary, decode_hits(&response, &self.ctx.decode))?;
            Ok(SearchResult::new(users, response.total_hits()))
        }
        .await;

        observed(OPERATION, result)
    }

    /// Latest snapshot of one user. At most one record is returned.
    pub async fn user_by_id(&self, user_id: u64, range: &DateRange) -> Result<SearchResult<User>> {
        const OPERATION: &str = "user_by_id";

        let result: Result<SearchResult<User>> = async {
            let mut query = QueryBuilder::new();
            query.push(Group::Filter, FilterClause::match_phrase("id", user_id));
            let body = SearchBody::new(query.build()).sort_desc("inserted_at");

            let target = IndexTarget::shards(&self.ctx.indices.user, range);
            let response = fetch(&self.ctx, OPERATION, Stage::Primary, &target, &body, 1).await?;
            let mut users: Vec<User> =
                decoded(OPERATION, Stage::Primary, decode_hits(&response, &self.ctx.decode))?;
            users.truncate(1);
            Ok(SearchResult::new(users, response.total_hits()))
        }
        .await;

        observed(OPERATION, result)
    }

    /// Latest snapshot of each listed user.
    pub async fn users_by_ids(
        &self,
        user_ids: &[u64],
        range: &DateRange,
    ) -> Result<SearchResult<User>> {
        const OPERATION: &str = "users_by_ids";

        if user_ids.is_empty() {
            return Ok(SearchResult::empty());
        }

        let result: Result<SearchResult<User>> = async {
            let mut query = QueryBuilder::new();
            for id in user_ids {
                query.push(Group::Should, FilterClause::match_phrase("id", *id));
            }
            let body = SearchBody::new(query.build())
                .collapse("id")
                .sort_desc("inserted_at");

            let target = IndexTarget::shards(&self.ctx.indices.user, range);
            let response =
                fetch(&self.ctx, OPERATION, Stage::Primary, &target, &body, user_ids.len()).await?;
            let users =
                decoded(OPERATION, Stage::Primary, decode_hits(&response, &self.ctx.decode))?;
            Ok(SearchResult::new(users, response.total_hits()))
        }
        .await;

        observed(OPERATION, result)
    }
}

/// Name and description score in `should`; everything else filters.
pub(crate) fn search_query(filters: &UserFilters) -> BoolQuery {
    let name = filters.name.as_deref();
    let mut query = QueryBuilder::new();
    query
        .text(Group::Should, "screen_name", name, TextQuery::Phrase)
        .text(Group::Should, "name", name, TextQuery::Phrase)
        .text(Group::Should, "description", filters.description.as_deref(), TextQuery::Match)
        .text(Group::Filter, "language", filters.language.as_deref(), TextQuery::Term)
        .at_least(Group::Filter, "followers_count", filters.follower_min)
        .at_most(Group::Filter, "followers_count", filters.follower_max)
        .at_least(Group::Filter, "statuses_count", filters.status_min)
        .at_most(Group::Filter, "statuses_count", filters.status_max)
        .at_least(Group::Filter, "favourites_count", filters.favorite_min)
        .at_most(Group::Filter, "favourites_count", filters.favorite_max)
        .at_least(Group::Filter, "friends_count", filters.follow_min)
        .at_most(Group::Filter, "friends_count", filters.follow_max)
        .at_least(Group::Filter, "listed_count", filters.list_min)
        .at_most(Group::Filter, "listed_count", filters.list_max)
        .score_at_least(Group::Filter, "sr_score", filters.sr_score_min)
        .score_at_most(Group::Filter, "sr_score", filters.sr_score_max)
        .minimum_should_match(1);
    query.build()
}
