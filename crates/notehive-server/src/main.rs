use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use notehive_api::state::{AppState, AppStateInner};
use notehive_api::{admin, groups, invitations, sync, users};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notehive=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("NOTEHIVE_DB_PATH").unwrap_or_else(|_| "notehive.db".into());
    let host = std::env::var("NOTEHIVE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("NOTEHIVE_PORT")
        .unwrap_or_else(|_| "8000".into())
        .parse()?;

    // Init database
    let db = notehive_db::Database::open(&PathBuf::from(&db_path))?;
    let state: AppState = Arc::new(AppStateInner { db });

    // Routes
    let app = Router::new()
        .route("/", get(admin::health))
        .route("/sync/send", post(sync::send_note))
        .route("/sync/updates", get(sync::get_updates))
        .route("/sync/ack", post(sync::acknowledge))
        .route("/groups/create", post(groups::create_group))
        .route("/groups/list", get(groups::list_groups))
        .route("/groups/{group_id}/invite", post(invitations::create_invite))
        .route("/groups/{group_id}/invitations", get(invitations::list_invites))
        .route(
            "/groups/invitations/{token}",
            get(invitations::preview_invite).delete(invitations::revoke_invite),
        )
        .route(
            "/groups/invitations/{token}/accept",
            post(invitations::accept_invite),
        )
        .route("/users/register", post(users::register_user))
        .route("/users/by-group/{group_id}", get(users::users_by_group))
        .route(
            "/users/{user_id}",
            put(users::update_user).delete(users::delete_user),
        )
        .route("/admin/reset", post(admin::reset))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Notehive server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
