use super::routes;
use crate::config::CorsConfig;
use crate::repository::{
    HashtagRepository, SearchContext, TransitionStore, TweetRepository, UserRepository,
};
use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub tweets: Arc<TweetRepository>,
    pub users: Arc<UserRepository>,
    pub hashtags: Arc<HashtagRepository>,
    pub transitions: Arc<dyn TransitionStore>,
    pub metrics: Option<PrometheusHandle>,
}

pub struct ApiServer {
    state: AppState,
    cors_config: CorsConfig,
}

impl ApiServer {
    pub fn new(search: SearchContext, transitions: Arc<dyn TransitionStore>) -> Self {
        Self {
            state: AppState {
                tweets: Arc::new(TweetRepository::new(search.clone())),
                users: Arc::new(UserRepository::new(search.clone())),
                hashtags: Arc::new(HashtagRepository::new(search)),
                transitions,
                metrics: None,
            },
            cors_config: CorsConfig::default(),
        }
    }

    pub fn with_cors(mut self, cors_config: CorsConfig) -> Self {
        self.cors_config = cors_config;
        self
    }

    /// Serve the recorder behind `handle` at GET /metrics
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.state.metrics = Some(handle);
        self
    }

    fn build_cors_layer(&self) -> CorsLayer {
        if !self.cors_config.enabled {
            return CorsLayer::new();
        }

        let has_wildcard = self.cors_config.origins.iter().any(|o| o == "*");
        let origins: Vec<HeaderValue> = self
            .cors_config
            .origins
            .iter()
            .filter(|o| *o != "*")
            .filter_map(|o| o.parse().ok())
            .collect();

        let cors = if has_wildcard {
            CorsLayer::new().allow_origin(tower_http::cors::Any)
        } else {
            CorsLayer::new().allow_origin(origins)
        };

        cors.allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(tower_http::cors::Any)
    }

    pub fn router(&self) -> Router {
        let api = Router::new()
            .route("/health", get(routes::health))
            .route("/health/", get(routes::health))
            .route("/tweets/user", get(routes::tweets_by_user))
            .route(
                "/tweets/users",
                get(routes::tweets_by_users).post(routes::tweets_by_users_body),
            )
            .route("/tweets/domain", get(routes::tweets_by_domain))
            .route("/tweets/media", get(routes::tweets_by_media_type))
            .route("/tweets/transition", get(routes::transitions_by_user))
            .route("/hashtags", get(routes::hashtag_ranking))
            .route("/hashtags/", get(routes::hashtag_ranking))
            .route("/hashtags/search", get(routes::hashtag_search))
            .route("/users/search", get(routes::user_search))
            .route("/users/id", get(routes::user_by_id))
            .route(
                "/users/ids",
                get(routes::users_by_ids).post(routes::users_by_ids_body),
            );

        Router::new()
            .nest("/api/v1", api)
            .route("/metrics", get(routes::metrics))
            .with_state(self.state.clone())
            .layer(self.build_cors_layer())
            .layer(TraceLayer::new_for_http())
    }

    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("API server listening on {}", addr);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
