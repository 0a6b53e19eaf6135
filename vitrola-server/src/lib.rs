use std::net::{Ipv6Addr, SocketAddr};

use axum::routing::get;
use log::info;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

mod auth;
mod connections;
mod context;
mod docs;
mod errors;
mod gateway;
mod player;
mod requests;
mod schemas;
mod serialized;
mod settings;

pub use connections::ConnectionManager;
pub use context::ServerContext;

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 9050;

pub type Router = axum::Router<ServerContext>;

/// Starts the vitrola server
pub async fn run_server(context: ServerContext, port: u16) -> std::io::Result<()> {
    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, port).into();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .nest("/api/musicas", requests::router())
        .nest("/api/player", player::router())
        .nest("/api/config", settings::router())
        .nest("/ws", gateway::router())
        .route("/api.json", get(docs::docs))
        .layer(cors)
        .with_state(context);

    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on port {}", port);

    axum::serve(listener, router.into_make_service()).await
}
