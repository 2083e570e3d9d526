use crate::render::{error_html, host_html, render_preview};
use crate::watcher;
use anyhow::{Context, Result};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use mockup_context::project::MockupProject;
use tokio::sync::broadcast;
use tracing::{info, warn};

#[derive(Clone)]
struct AppState {
    project: MockupProject,
    reload_tx: broadcast::Sender<()>,
}

pub async fn run(project: MockupProject, port: u16) -> Result<()> {
    let (reload_tx, _) = broadcast::channel::<()>(16);

    // The watcher stops when dropped.
    let _watcher = watcher::start(&project.watch_paths(), reload_tx.clone())
        .context("Failed to start file watcher")?;

    let state = AppState { project, reload_tx };

    let app = router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!(%addr, "dev server listening");
    eprintln!("  Mockup preview running at http://localhost:{port}");
    eprintln!("  Raw preview at http://localhost:{port}/__mockup/preview");
    eprintln!("  Watching for file changes...");
    eprintln!();

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/__mockup/preview", get(preview_handler))
        .route("/__mockup/ws", get(ws_handler))
        .with_state(state)
}

async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(host_html(state.project.config.display_title()))
}

async fn preview_handler(State(state): State<AppState>) -> Html<String> {
    match render_preview(&state.project) {
        Ok(html) => Html(html),
        Err(e) => {
            warn!(error = %format!("{e:#}"), "preview render failed");
            Html(error_html(&format!("{e:#}")))
        }
    }
}

async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state.reload_tx))
}

async fn handle_ws(socket: WebSocket, reload_tx: broadcast::Sender<()>) {
    let mut rx = reload_tx.subscribe();
    let (mut sender, mut receiver) = socket.split();

    let send_task = tokio::spawn(async move {
        while rx.recv().await.is_ok() {
            let msg = Message::Text("{\"type\":\"reload\"}".into());
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    // Incoming messages are ignored; reading keeps the connection alive.
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_)) = receiver.next().await {}
    });

    tokio::select! {
        _ = send_task => {}
        _ = recv_task => {}
    }
}
