use super::response::{EngineErrorBody, SearchResponse};
use crate::config::ElasticsearchConfig;
use crate::index::IndexTarget;
use crate::query::SearchBody;
use crate::{metrics, Error, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use url::Url;

/// Something that can run a search document against an index expression.
///
/// One call is one engine round trip. Implementations must not retry.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(
        &self,
        target: &IndexTarget,
        body: &SearchBody,
        size: usize,
    ) -> Result<SearchResponse>;
}

/// HTTP client for the engine's `_search` endpoint
pub struct ElasticsearchClient {
    client: Client,
    base_url: Url,
    username: Option<String>,
    password: Option<String>,
}

impl ElasticsearchClient {
    pub fn new(config: &ElasticsearchConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = Client::builder();
        if let Some(ms) = config.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn search_url(&self, target: &IndexTarget) -> Result<Url> {
        Ok(self.base_url.join(&format!("{}/_search", target))?)
    }
}

#[async_trait]
impl SearchBackend for ElasticsearchClient {
    async fn search(
        &self,
        target: &IndexTarget,
        body: &SearchBody,
        size: usize,
    ) -> Result<SearchResponse> {
        let payload = body.to_bytes()?;
        let url = self.search_url(target)?;
        let started = Instant::now();

        let mut request = self
            .client
            .post(url)
            .query(&[("size", size.to_string()), ("track_total_hits", "true".to_string())])
            .header(CONTENT_TYPE, "application/json")
            .body(payload);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_ref());
        }

        let response = request.send().await?;
        let status = response.status();
        metrics::record_search_duration(target.kind(), started.elapsed());

        if !status.is_success() {
            match response.text().await {
                Ok(body) => log_engine_error(status, target, &body),
                Err(e) => tracing::error!(
                    index = %target,
                    status = status.as_u16(),
                    error = %e,
                    "[{}] search rejected; error body unreadable",
                    status
                ),
            }
            return Err(Error::Engine {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        let parsed: SearchResponse =
            serde_json::from_slice(&bytes).map_err(|e| Error::Envelope(e.to_string()))?;

        let hits = parsed.total_hits();
        metrics::record_search_hits(target.kind(), hits);
        tracing::info!(
            index = %target,
            status = status.as_u16(),
            hits,
            took_ms = parsed.took,
            "[{}] {} hits; took: {}ms",
            status,
            hits,
            parsed.took
        );

        Ok(parsed)
    }
}

fn log_engine_error(status: StatusCode, target: &IndexTarget, body: &str) {
    match serde_json::from_str::<EngineErrorBody>(body) {
        Ok(parsed) => tracing::error!(
            index = %target,
            status = status.as_u16(),
            error_type = %parsed.error.error_type,
            reason = %parsed.error.reason,
            "[{}] {}: {}",
            status,
            parsed.error.error_type,
            parsed.error.reason
        ),
        Err(_) => tracing::error!(
            index = %target,
            status = status.as_u16(),
            body = %body,
            "[{}] search rejected",
            status
        ),
    }
}
