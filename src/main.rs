use std::net::SocketAddr;

use taskdeck::{config::Config, create_router, db};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = Config::from_env();

    // Initialize database
    let pool = db::create_db_pool(&config.database_url).await;

    // Create the router
    let app = create_router(pool, &config);

    // run it with hyper
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
