use anyhow::Result;
use std::sync::Arc;

use genesys_bridge::{auth, config, http_client, middleware, routes};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (for log level)
    let config = config::Config::load()?;
    config.validate()?;

    init_logging(&config);

    tracing::info!("🚀 Genesys Bridge starting...");
    tracing::info!(
        "Server configured: {}:{}",
        config.server_host,
        config.server_port
    );
    tracing::debug!("Genesys settings: {:?}", config.genesys);

    // Initialize HTTP client
    let http_client = Arc::new(http_client::GenesysHttpClient::new(
        config.genesys.api_url.clone(),
        config.http_max_connections,
        config.http_connect_timeout,
        config.http_request_timeout,
    )?);
    tracing::info!("✅ HTTP client initialized with connection pooling");

    // Initialize token provider with the process-wide cache
    let token_provider = Arc::new(auth::TokenProvider::with_client(
        config.genesys.clone(),
        Arc::new(auth::TokenCache::new()),
        http_client.client().clone(),
    ));

    if token_provider.has_credentials() {
        // Warm the cache; a failure here only affects requests, not startup
        match token_provider.acquire_token().await {
            Ok(token) => {
                tracing::info!("✅ Genesys authentication successful (region: {})", token.region)
            }
            Err(e) => {
                tracing::error!("❌ Genesys authentication failed: {}", e);
                tracing::warn!(
                    "Server will start but proxied requests will fail until credentials are valid"
                );
            }
        }
    } else {
        tracing::warn!(
            "GENESYS_CLIENT_ID / GENESYS_CLIENT_SECRET not set; proxied requests will return configuration errors"
        );
    }

    let app_state = routes::AppState {
        token_provider,
        http_client,
    };

    let app = build_app(app_state);

    // Bind to configured host and port
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    print_startup_banner(&config);

    tracing::info!("🚀 Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("👋 Server shutdown complete");

    Ok(())
}

/// Initialize logging with the configured level and format
fn init_logging(config: &config::Config) {
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    match config.log_format {
        config::LogFormat::Json => builder.json().init(),
        config::LogFormat::Text => builder.init(),
    }
}

/// Build the application with all routes and middleware
fn build_app(state: routes::AppState) -> axum::Router {
    use axum::Router;

    Router::new()
        .merge(routes::health_routes())
        .merge(routes::proxy_routes(state))
        .layer(middleware::cors_layer())
        .layer(middleware::trace_layer())
}

/// Print startup banner
fn print_startup_banner(config: &config::Config) {
    let banner = r#"
╔═══════════════════════════════════════════════════════════╗
║                                                           ║
║                 🔐 Genesys Bridge                         ║
║                                                           ║
║  Credential broker & API proxy for Genesys Cloud          ║
║                                                           ║
╚═══════════════════════════════════════════════════════════╝
"#;

    println!("{}", banner);
    println!("  Version:     {}", env!("CARGO_PKG_VERSION"));
    println!(
        "  Server:      http://{}:{}",
        config.server_host, config.server_port
    );
    println!("  Region:      {}", config.genesys.region);
    println!("  Proxy:       {}?path=/api/v2/...", routes::PROXY_ROUTE);
    println!("  Log Level:   {}", config.log_level);
    println!();
}

/// Handle graceful shutdown signal
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown...");
        },
    }
}
