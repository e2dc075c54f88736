use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json,
    },
    routing::get,
    Router,
};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use crate::config::RelayConfig;
use crate::provider::ContentProvider;
use crate::relay::{self, EventSink};
use crate::sync::{self, SyncError};

pub struct AppState {
    pub blogs: Vec<String>,
    pub provider: Arc<dyn ContentProvider>,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/blogs", get(get_blogs))
        .route("/api/blog/{name}", get(get_blog))
        .route("/api/stream-posts", get(get_stream_posts))
        .with_state(state)
}

/// Configured channel list, in configured order.
async fn get_blogs(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.blogs.clone())
}

/// Bulk sync one channel: full capped history, shuffled.
async fn get_blog(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> (StatusCode, Json<Value>) {
    let mut rng = StdRng::from_os_rng();
    match sync::sync_channel(state.provider.as_ref(), &name, &mut rng).await {
        Ok(posts) => (StatusCode::OK, Json(Value::Array(posts))),
        Err(SyncError::ChannelNotFound) => {
            (StatusCode::NOT_FOUND, Json(json!({"error": "Not Found"})))
        }
        Err(SyncError::FetchFailed) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Fetch failed"})),
        ),
    }
}

/// EventSink backed by the SSE response channel. A dropped receiver
/// (client disconnected) is what the relay observes at its checkpoints.
pub struct ChannelSink {
    tx: tokio::sync::mpsc::Sender<String>,
}

impl ChannelSink {
    pub fn new(tx: tokio::sync::mpsc::Sender<String>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn push_frame(&mut self, frame: String) {
        let _ = self.tx.send(frame).await;
    }

    fn is_consumer_gone(&self) -> bool {
        self.tx.is_closed()
    }
}

/// One randomized relay pass over the configured channels, delivered as
/// an event stream. The stream ends naturally after the last channel.
async fn get_stream_posts(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (tx, rx) = tokio::sync::mpsc::channel::<String>(16);
    let provider = Arc::clone(&state.provider);
    let blogs = state.blogs.clone();

    tokio::spawn(async move {
        let mut sink = ChannelSink::new(tx);
        let mut rng = StdRng::from_os_rng();
        relay::relay_posts(provider.as_ref(), &blogs, &mut sink, &mut rng).await;
    });

    let stream =
        ReceiverStream::new(rx).map(|frame| Ok::<Event, Infallible>(Event::default().data(frame)));

    (
        [(header::CACHE_CONTROL, "no-cache")],
        Sse::new(stream).keep_alive(KeepAlive::default()),
    )
}

pub async fn serve(config: &RelayConfig, provider: Arc<dyn ContentProvider>) -> anyhow::Result<()> {
    let state = Arc::new(AppState {
        blogs: config.blogs.clone(),
        provider,
    });
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!(%addr, "phazr engine running");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
