use tracing_subscriber::EnvFilter;

use product_search::api;
use product_search::config::Config;
use product_search::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Semantic engine: {}", config.semantic.base_url);
    tracing::info!(
        "Graph service: {} (database {})",
        config.graph.base_url,
        config.graph.database
    );
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.base_url);
    tracing::info!(
        "Fusion weights: semantic {} / graph {}, diversity bonus {}",
        config.fusion.semantic_weight,
        config.fusion.graph_weight,
        config.fusion.diversity_bonus
    );

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config)?;
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {bind_addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
