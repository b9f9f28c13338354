use super::error::ApiError;
use super::params::{
    HashtagRankingParams, HashtagSearchParams, TransitionParams, TweetsByDomainParams,
    TweetsByMediaParams,
    TweetsByUserParams, TweetsByUsersParams, UserIdParams, UserIdsParams, UserSearchParams,
};
use super::response::{DomainTweets, Hits, MediaTweets};
use super::server::AppState;
use crate::domain::{Hashtag, HashtagCount, Transition, Tweet, User};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

type ApiResult<T> = Result<Json<T>, ApiError>;

pub async fn health() -> Json<Value> {
    Json(json!({ "message": "success" }))
}

/// GET /metrics - Prometheus text exposition
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics disabled".to_string()),
    }
}

pub async fn tweets_by_user(
    State(state): State<AppState>,
    params: Result<Query<TweetsByUserParams>, QueryRejection>,
) -> ApiResult<Hits<Vec<Tweet>>> {
    let Query(params) = params?;
    let page = params.page()?;
    let result = state.tweets.tweets_by_user(params.user_id, &page).await?;
    Ok(Json(result.into()))
}

pub async fn tweets_by_users(
    State(state): State<AppState>,
    params: Result<Query<TweetsByUsersParams>, QueryRejection>,
) -> ApiResult<Hits<Vec<Tweet>>> {
    let Query(params) = params?;
    users_timeline(&state, params).await
}

pub async fn tweets_by_users_body(
    State(state): State<AppState>,
    params: Result<Json<TweetsByUsersParams>, JsonRejection>,
) -> ApiResult<Hits<Vec<Tweet>>> {
    let Json(params) = params?;
    users_timeline(&state, params).await
}

async fn users_timeline(
    state: &AppState,
    params: TweetsByUsersParams,
) -> ApiResult<Hits<Vec<Tweet>>> {
    let page = params.page()?;
    let result = state.tweets.tweets_by_users(&params.user_ids, &page).await?;
    Ok(Json(result.into()))
}

pub async fn tweets_by_domain(
    State(state): State<AppState>,
    params: Result<Query<TweetsByDomainParams>, QueryRejection>,
) -> ApiResult<DomainTweets> {
    let Query(params) = params?;
    let page = params.page()?;
    let result = state
        .tweets
        .tweets_by_domain(params.user_id, &page, params.domain.trim())
        .await?;
    Ok(Json(result.into()))
}

pub async fn tweets_by_media_type(
    State(state): State<AppState>,
    params: Result<Query<TweetsByMediaParams>, QueryRejection>,
) -> ApiResult<MediaTweets> {
    let Query(params) = params?;
    let (page, media_type) = params.page()?;
    let result = state
        .tweets
        .tweets_by_media_type(params.user_id, &page, media_type)
        .await?;
    Ok(Json(result.into()))
}

pub async fn transitions_by_user(
    State(state): State<AppState>,
    params: Result<Query<TransitionParams>, QueryRejection>,
) -> ApiResult<Hits<Vec<Transition>>> {
    let Query(params) = params?;
    let limit = params.limit()?;
    let rows = state
        .transitions
        .transitions_by_user(params.user_id, params.start_date, params.end_date, limit)
        .await?;
    Ok(Json(rows.into()))
}

pub async fn hashtag_ranking(
    State(state): State<AppState>,
    params: Result<Query<HashtagRankingParams>, QueryRejection>,
) -> ApiResult<Hits<Vec<Hashtag>>> {
    let Query(params) = params?;
    let (filters, range, count) = params.into_query()?;
    let result = state.hashtags.hashtag_ranking(&filters, &range, count).await?;
    Ok(Json(result.into()))
}

pub async fn hashtag_search(
    State(state): State<AppState>,
    params: Result<Query<HashtagSearchParams>, QueryRejection>,
) -> ApiResult<Hits<Vec<HashtagCount>>> {
    let Query(params) = params?;
    let (range, count) = params.window()?;
    let result = state
        .hashtags
        .hashtag_search(params.hashtag.trim(), &range, count)
        .await?;
    Ok(Json(result.into()))
}

pub async fn user_search(
    State(state): State<AppState>,
    params: Result<Query<UserSearchParams>, QueryRejection>,
) -> ApiResult<Hits<Vec<User>>> {
    let Query(params) = params?;
    let (filters, range, count, order) = params.into_query()?;
    let result = state.users.user_search(&filters, &range, count, order).await?;
    Ok(Json(result.into()))
}

pub async fn user_by_id(
    State(state): State<AppState>,
    params: Result<Query<UserIdParams>, QueryRejection>,
) -> ApiResult<Hits<Option<User>>> {
    let Query(params) = params?;
    let range = params.window()?;
    let result = state.users.user_by_id(params.user_id, &range).await?;
    Ok(Json(result.into()))
}

pub async fn users_by_ids(
    State(state): State<AppState>,
    params: Result<Query<UserIdsParams>, QueryRejection>,
) -> ApiResult<Hits<Vec<User>>> {
    let Query(params) = params?;
    latest_users(&state, params).await
}

pub async fn users_by_ids_body(
    State(state): State<AppState>,
    params: Result<Json<UserIdsParams>, JsonRejection>,
) -> ApiResult<Hits<Vec<User>>> {
    let Json(params) = params?;
    latest_users(&state, params).await
}

async fn latest_users(state: &AppState, params: UserIdsParams) -> ApiResult<Hits<Vec<User>>> {
    let range = params.window()?;
    let result = state.users.users_by_ids(&params.user_ids, &range).await?;
    Ok(Json(result.into()))
}
