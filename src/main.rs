use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use workflow_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    store::{memory::MemoryWorkflowStore, postgres::PgWorkflowStore, WorkflowStore},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let store: Arc<dyn WorkflowStore> = match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = create_pool(database_url).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Running against Postgres");
            Arc::new(PgWorkflowStore::new(pool))
        }
        None => {
            info!("DATABASE_URL not set, running with the in-memory store");
            Arc::new(MemoryWorkflowStore::new())
        }
    };

    let app_state = AppState::new(store);
    let app = workflow_backend::app_router(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
