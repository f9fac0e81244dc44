//! Documentation of the Slice Queen pizza slice voting platform.
//!
//! Visitors press plus/minus on a fixed menu of slices, each building a personal tally. The
//! results view sums every visitor's tally into one bar chart of slices to order.
//!
//!
//!
//! # General Infrastructure
//! - Single HTTP server, JSON in and out
//! - Visitors identified by an opaque `slice_session` cookie assigned on first vote
//! - Counters live in the shared store, in-memory by default or Redis when `REDIS_URL` is set
//! - Page rendering lives in the frontend, this crate only serves data
//!
//!
//!
//! # Endpoints
//!
//! | Method | Path           | Purpose                                            |
//! |--------|----------------|----------------------------------------------------|
//! | GET    | `/catalog`     | Ordered slices with keys and descriptions          |
//! | GET    | `/tally`       | Caller's own counts, restores the voting view      |
//! | POST   | `/vote/{item}` | `{"plus": ms, "minus": ms}` last press times       |
//! | GET    | `/report`      | Bar chart figure of summed counts                  |
//!
//!
//!
//! # Notes
//!
//! ## Press times instead of deltas
//! The frontend sends the last time each button was pressed, not how many times. Re-sending
//! the same times is harmless, see [`ledger`].
//!
//! ## Consistency
//! No locking across keys. A snapshot is always written before its session joins the
//! registry, so the report treats a registered session without a snapshot as a fault.
//!
//!
//!
//! # Setup
//!
//! Run with the embedded menu and in-memory store.
//! ```sh
//! RUST_LOG=info cargo run -p slice-queen
//! ```
//!
//! Share counters through Redis and load a custom menu.
//! ```sh
//! REDIS_URL=redis://127.0.0.1/ CATALOG_SOURCE=./slices.json cargo run -p slice-queen
//! ```
//!
//! Simulate visitors against a running server.
//! ```sh
//! cargo run -p tester -- --visitors 20 --rounds 5
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod aggregate;
pub mod config;
pub mod database;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;
pub mod utils;

use routes::{catalog_handler, report_handler, tally_handler, vote_handler};
use state::State;

pub fn router(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/catalog", get(catalog_handler))
        .route("/tally", get(tally_handler))
        .route("/vote/{item}", post(vote_handler))
        .route("/report", get(report_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new().await?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down...");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{
            Request, StatusCode,
            header::{COOKIE, SET_COOKIE},
        },
        response::Response,
    };
    use catalog::get_catalog;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::Config,
        memory::MemoryStore,
        models::SessionId,
        store::SharedStore,
    };

    fn app() -> Router {
        app_with_store(SharedStore::new(MemoryStore::new()))
    }

    fn app_with_store(store: SharedStore) -> Router {
        let state = State::with_store(get_catalog().unwrap(), Config::default(), store);

        router(state)
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        serde_json::from_slice(&bytes).unwrap()
    }

    fn vote(item: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/vote/{item}"))
            .header(CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }

        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn session_cookie(response: &Response) -> String {
        let header = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();

        header.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_catalog_endpoint() {
        let response = app()
            .oneshot(Request::builder().uri("/catalog").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body[0]["key"], "Plain-Jane-Slice");
        assert_eq!(body.as_array().unwrap().len(), 11);
    }

    #[tokio::test]
    async fn test_vote_assigns_session_once() {
        let app = app();

        let response = app
            .clone()
            .oneshot(vote("Plain-Jane-Slice", None, json!({ "plus": 100 })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie(&response);
        assert!(cookie.starts_with("slice_session="));
        assert_eq!(
            json_body(response).await,
            json!({ "item": "Plain-Jane-Slice", "count": 1 })
        );

        let response = app
            .clone()
            .oneshot(vote("Plain-Jane-Slice", Some(&cookie), json!({ "plus": 200 })))
            .await
            .unwrap();
        assert!(response.headers().get(SET_COOKIE).is_none());
        assert_eq!(json_body(response).await["count"], 2);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/tally")
                    .header(COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body[0], json!({ "item": "Plain-Jane-Slice", "count": 2 }));
        assert_eq!(body[1], json!({ "item": "Prom-Queen-Margherita-Slice", "count": 0 }));
    }

    #[tokio::test]
    async fn test_report_sums_visitors() {
        let app = app();

        for (plus, minus) in [(json!(10), json!(null)), (json!(10), json!(null))] {
            let response = app
                .clone()
                .oneshot(vote("Sup-Dude-Slice", None, json!({ "plus": plus, "minus": minus })))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .oneshot(Request::builder().uri("/report").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let figure = json_body(response).await;
        assert_eq!(figure["layout"]["title"], "Slices to Order");
        assert_eq!(figure["data"][0]["type"], "bar");
        assert_eq!(figure["data"][0]["x"][5], "Sup-Dude-Slice");
        assert_eq!(figure["data"][0]["y"][5], 2);
        assert_eq!(figure["data"][0]["y"][0], 0);
    }

    #[tokio::test]
    async fn test_rejects_bad_votes() {
        let app = app();

        let response = app
            .clone()
            .oneshot(vote("Not-A-Slice", None, json!({ "plus": 1 })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/vote/Plain-Jane-Slice")
                    .body(Body::from("plus"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_forged_cookie_gets_fresh_session() {
        let store = SharedStore::new(MemoryStore::new());
        let app = app_with_store(store.clone());
        let forged = "slice_session=00000000-0000-4000-8000-000000000001";

        let response = app
            .oneshot(vote("Plain-Jane-Slice", Some(forged), json!({ "plus": 1 })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = session_cookie(&response);
        assert!(cookie.starts_with("slice_session="));
        assert_ne!(cookie, forged);

        let sessions = store.sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_ne!(
            sessions[0],
            "00000000-0000-4000-8000-000000000001".parse::<SessionId>().unwrap()
        );
    }

    #[tokio::test]
    async fn test_report_fails_on_missing_snapshot() {
        let store = SharedStore::new(MemoryStore::new());
        store.register_session(&SessionId::generate()).await.unwrap();

        let response = app_with_store(store)
            .oneshot(Request::builder().uri("/report").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
