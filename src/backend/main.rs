/**
 * PlanSync Server Entry Point
 *
 * Loads configuration, installs tracing and serves the Axum app.
 */

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let config = plansync::shared::AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .init();

    tracing::info!("[Server] Log filter set to {}", config.log_filter);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = plansync::backend::server::init::create_app(config).await;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("[Server] Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(not(feature = "ssr"))]
fn main() {
    eprintln!("Server requires the 'ssr' feature to be enabled.");
    eprintln!("Run with: cargo run --bin plansync-server --features ssr");
    std::process::exit(1);
}
