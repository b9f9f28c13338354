use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use sns::api::ApiServer;
use sns::repository::{MySqlTransitionStore, SearchContext};
use sns::search::ElasticsearchClient;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sns-server")]
#[command(about = "SNS analytics API server")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "SNS_CONFIG", default_value = "sns.toml")]
    config: String,

    /// Address to bind to, overrides server.bind_addr
    #[arg(long)]
    bind_addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = sns::Config::load_or_create(Path::new(&args.config))?;

    // RUST_LOG and LOG_FORMAT win over the config file
    let filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.observability.log_level.clone());
    let json = std::env::var("LOG_FORMAT")
        .unwrap_or_else(|_| config.observability.log_format.clone())
        == "json";
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();

    tracing::info!("Config file: {}", args.config);

    let metrics = if config.observability.metrics_enabled {
        Some(PrometheusBuilder::new().install_recorder()?)
    } else {
        None
    };

    let backend = Arc::new(ElasticsearchClient::new(&config.elasticsearch)?);
    tracing::info!("Search engine at {}", config.elasticsearch.url);
    let search = SearchContext::new(backend, config.indices.clone(), config.decode.context()?);
    let transitions = Arc::new(MySqlTransitionStore::connect_lazy(&config.mysql)?);

    let mut server = ApiServer::new(search, transitions).with_cors(config.server.cors.clone());
    if let Some(handle) = metrics {
        server = server.with_metrics(handle);
    }

    let addr = args.bind_addr.unwrap_or_else(|| config.server.bind_addr.clone());
    server.serve(&addr).await?;

    Ok(())
}
