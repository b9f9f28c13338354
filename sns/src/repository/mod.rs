//! Query catalogue over the search engine and the relational store
//!
//! Each repository method builds one fixed query shape, runs it, decodes the
//! result and records an operation metric. Failures are logged with the
//! operation name and the stage that failed, then returned unchanged.

mod enrich;
mod hashtag;
mod transition;
mod tweet;
mod user;

pub use enrich::DerivedKeys;
pub use hashtag::{HashtagFilters, HashtagRepository};
pub use transition::{MySqlTransitionStore, TransitionStore};
pub use tweet::{TweetPage, TweetRepository};
pub use user::{UserFilters, UserRepository};

use crate::config::IndexConfig;
use crate::index::IndexTarget;
use crate::query::SearchBody;
use crate::search::{DecodeContext, SearchBackend, SearchResponse};
use crate::{metrics, Result};
use std::sync::Arc;

/// Handles shared by the search-backed repositories.
#[derive(Clone)]
pub struct SearchContext {
    pub backend: Arc<dyn SearchBackend>,
    pub indices: IndexConfig,
    pub decode: DecodeContext,
}

impl SearchContext {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        indices: IndexConfig,
        decode: DecodeContext,
    ) -> Self {
        Self {
            backend,
            indices,
            decode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    Primary,
    Secondary,
}

impl Stage {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

/// Run one search, logging failures with their operation and stage.
pub(crate) async fn fetch(
    ctx: &SearchContext,
    operation: &'static str,
    stage: Stage,
    target: &IndexTarget,
    body: &SearchBody,
    size: usize,
) -> Result<SearchResponse> {
    ctx.backend
        .search(target, body, size)
        .await
        .inspect_err(|e| {
            tracing::error!(
                operation,
                stage = stage.as_str(),
                index = %target,
                error = %e,
                "Search failed"
            )
        })
}

/// Log a decode failure with its operation and stage.
pub(crate) fn decoded<T>(operation: &'static str, stage: Stage, result: Result<T>) -> Result<T> {
    result.inspect_err(|e| {
        tracing::error!(
            operation,
            stage = stage.as_str(),
            error = %e,
            "Decode failed"
        )
    })
}

/// Count the outcome of a whole operation.
pub(crate) fn observed<T>(operation: &'static str, result: Result<T>) -> Result<T> {
    match &result {
        Ok(_) => metrics::record_operation_success(operation),
        Err(e) => metrics::record_operation_error(operation, e.kind()),
    }
    result
}
