use anyhow::Context;

use outletops_infra::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    outletops_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    if config.using_default_secret {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }

    let app = outletops_api::app::build_app(&config);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
