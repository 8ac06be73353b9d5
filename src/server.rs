//! Top-level assembly: wire the HTTP and WebSocket route tables onto the
//! shared `Router`, layer tracing, and serve. Grounded in the teacher's
//! `websocket::routes::{create_router, run_server}` pair — CORS/headers
//! machinery is explicitly out of this system's scope (`spec.md` §1 names
//! it an external collaborator), so only the `TraceLayer` survives from the
//! teacher's layer stack.

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::router::Router;
use crate::{http, websocket};

pub fn build_app(router: Arc<Router>) -> axum::Router {
    axum::Router::new()
        .merge(http::routes())
        .merge(websocket::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(router)
}

/// Build the shared `Router`, spawn its maintenance sweep, bind, and serve
/// until the process is killed or the listener fails.
pub async fn run(cfg: ServerConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = cfg.bind_addr;
    let router = Router::new(Arc::new(cfg));
    router.spawn_maintenance_task();

    let app = build_app(router);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "bidchess-server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
