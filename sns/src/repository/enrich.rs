//! Second stage of the two-stage flows
//!
//! Stage one yields a [`DerivedKeys`] value. Stage two turns those keys into
//! a fresh `should` query against another index; nothing from the stage-one
//! document is reused.

use super::{decoded, fetch, SearchContext, Stage};
use crate::domain::{Enriched, SearchResult};
use crate::index::IndexTarget;
use crate::query::{BoolQuery, FilterClause, Group, QueryBuilder, SearchBody};
use crate::search::{decode_hits, Decode};
use crate::{metrics, Result};
use std::collections::HashSet;

/// Distinct lookup keys in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedKeys {
    keys: Vec<String>,
    seen: HashSet<String>,
}

impl DerivedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>) {
        let key = key.into();
        if self.seen.insert(key.clone()) {
            self.keys.push(key);
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.keys
    }

    /// One `match_phrase` per key, any of which may match.
    pub fn into_query(self, field: &str) -> BoolQuery {
        let mut query = QueryBuilder::new();
        for key in self.keys {
            query.push(Group::Should, FilterClause::match_phrase(field, key));
        }
        query.minimum_should_match(1);
        query.build()
    }
}

/// Where and how the second stage looks up its keys.
pub(crate) struct Lookup {
    pub flow: &'static str,
    pub target: IndexTarget,
    pub key_field: &'static str,
    pub size: usize,
    pub collapse: Option<&'static str>,
}

/// Execute the second stage. No keys means no query and an empty result.
pub(crate) async fn lookup<S: Decode>(
    ctx: &SearchContext,
    operation: &'static str,
    second: Lookup,
    keys: DerivedKeys,
) -> Result<Vec<S>> {
    if keys.is_empty() {
        tracing::debug!(
            operation,
            flow = second.flow,
            "No keys from primary stage, skipping lookup"
        );
        metrics::record_enrichment_skipped(second.flow);
        return Ok(Vec::new());
    }

    let mut body = SearchBody::new(keys.into_query(second.key_field));
    if let Some(field) = second.collapse {
        body = body.collapse(field);
    }

    let response =
        fetch(ctx, operation, Stage::Secondary, &second.target, &body, second.size).await?;
    decoded(operation, Stage::Secondary, decode_hits(&response, &ctx.decode))
}

/// Combine both stages. A failed second stage keeps the primary records.
pub(crate) fn settle<P, S>(
    flow: &'static str,
    primary: SearchResult<P>,
    secondary: Result<Vec<S>>,
) -> Enriched<P, S> {
    match secondary {
        Ok(secondary) => Enriched {
            primary,
            secondary,
            secondary_error: None,
        },
        Err(e) => {
            metrics::record_enrichment_failed(flow);
            Enriched {
                primary,
                secondary: Vec::new(),
                secondary_error: Some(format!("{} lookup failed ({})", flow, e.kind())),
            }
        }
    }
}
