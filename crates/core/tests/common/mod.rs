#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clipdna_core::{
    GenerationRequest, GenerativeModel, LogEntry, ModelError, Severity, VideoRecord,
    config::DEFAULT_LOOKUP_API,
};
use serde_json::{Value, json};
use tokio::sync::Notify;

pub const VIDEO_URL: &str = "https://www.tiktok.com/@x/video/123";
pub const COVER_URL: &str = "https://p16.example/cover.jpg";
pub const COVER_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

pub fn lookup_payload() -> Value {
    json!({
        "code": 0,
        "msg": "success",
        "data": {
            "id": "7294458392095313184",
            "title": "golden hour skate #fyp",
            "author": {"id": "6789", "unique_id": "skate.daily", "nickname": "Skate Daily"},
            "cover": COVER_URL,
            "play": "https://v.example/sd.mp4",
            "hdplay": "https://v.example/hd.mp4",
            "duration": 17,
            "play_count": 2400000,
            "digg_count": 310000
        }
    })
}

/// In-process stand-in for relays, the lookup API and a chat completions endpoint.
#[derive(Clone, Default)]
pub struct Upstream {
    hits: Arc<Mutex<Vec<(String, String)>>>,
    chat_requests: Arc<Mutex<Vec<Value>>>,
    chat_reply: Arc<Mutex<Option<(u16, Value)>>>,
}

pub struct MockServer {
    pub addr: SocketAddr,
    pub upstream: Upstream,
}

impl MockServer {
    pub async fn start() -> Self {
        let upstream = Upstream::default();
        let router = Router::new()
            .route("/ok", get(relay_ok))
            .route("/down", get(relay_down))
            .route("/apierr", get(relay_api_error))
            .route("/apierr-data", get(relay_api_error_with_data))
            .route("/garbage", get(relay_garbage))
            .route("/v1/chat/completions", post(chat_completions))
            .with_state(upstream.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, upstream }
    }

    /// Relay base for one of the mock routes, e.g. `relay("ok")`.
    pub fn relay(&self, route: &str) -> String {
        format!("http://{}/{}?url=", self.addr, route)
    }

    pub fn chat_url(&self) -> String {
        format!("http://{}/v1/chat/completions", self.addr)
    }

    pub fn hits(&self) -> Vec<(String, String)> {
        self.upstream.hits.lock().unwrap().clone()
    }

    pub fn hits_on(&self, route: &str) -> usize {
        self.hits().iter().filter(|(r, _)| r == route).count()
    }

    pub fn chat_requests(&self) -> Vec<Value> {
        self.upstream.chat_requests.lock().unwrap().clone()
    }

    pub fn set_chat_reply(&self, status: u16, body: Value) {
        *self.upstream.chat_reply.lock().unwrap() = Some((status, body));
    }
}

fn record_hit(upstream: &Upstream, route: &str, query: &HashMap<String, String>) -> String {
    let target = query.get("url").cloned().unwrap_or_default();
    upstream
        .hits
        .lock()
        .unwrap()
        .push((route.to_string(), target.clone()));
    target
}

async fn relay_ok(
    State(upstream): State<Upstream>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let target = record_hit(&upstream, "ok", &query);

    if target.starts_with(DEFAULT_LOOKUP_API) {
        return Json(lookup_payload()).into_response();
    }
    if target == COVER_URL {
        return ([(header::CONTENT_TYPE, "image/png")], COVER_BYTES).into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}

async fn relay_down(
    State(upstream): State<Upstream>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    record_hit(&upstream, "down", &query);
    StatusCode::SERVICE_UNAVAILABLE.into_response()
}

async fn relay_api_error(
    State(upstream): State<Upstream>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    record_hit(&upstream, "apierr", &query);
    Json(json!({"code": -1, "msg": "Url parsing is failed! Please check url."})).into_response()
}

async fn relay_api_error_with_data(
    State(upstream): State<Upstream>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    record_hit(&upstream, "apierr-data", &query);
    let mut payload = lookup_payload();
    payload["code"] = json!(-1);
    payload["msg"] = json!("partial");
    Json(payload).into_response()
}

async fn relay_garbage(
    State(upstream): State<Upstream>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    record_hit(&upstream, "garbage", &query);
    "<html>blocked</html>".into_response()
}

async fn chat_completions(State(upstream): State<Upstream>, Json(body): Json<Value>) -> Response {
    upstream.chat_requests.lock().unwrap().push(body);

    let reply = upstream.chat_reply.lock().unwrap().clone();
    match reply {
        Some((status, body)) => {
            let status = StatusCode::from_u16(status).unwrap();
            (status, Json(body)).into_response()
        }
        None => Json(chat_completion(&good_reply())).into_response(),
    }
}

pub fn chat_completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

pub fn good_reply() -> String {
    json!({
        "prompt": "Vertical 9:16 handheld shot of a skateboarder carving through an empty parking lot at golden hour, warm rim light, lens flare, shallow depth of field, slow-motion kickflip at the climax.",
        "technicalDetails": "24mm wide lens, 120fps for the slow-motion beat, warm grade with lifted shadows.",
        "viralFactors": ["Instant visual hook", "Satisfying slow-motion payoff", "Trending audio sync"]
    })
    .to_string()
}

#[derive(Clone)]
pub enum StubReply {
    Text(String),
    Empty,
    Fail,
}

/// Deterministic model. Optionally parks inside `generate` until released.
pub struct StubModel {
    reply: StubReply,
    requests: Mutex<Vec<GenerationRequest>>,
    pub entered: Arc<Notify>,
    release: Option<Arc<Notify>>,
}

impl StubModel {
    pub fn new(reply: StubReply) -> Self {
        Self {
            reply,
            requests: Mutex::new(Vec::new()),
            entered: Arc::new(Notify::new()),
            release: None,
        }
    }

    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(StubReply::Text(text.into()))
    }

    pub fn gated(reply: StubReply, release: Arc<Notify>) -> Self {
        Self {
            release: Some(release),
            ..Self::new(reply)
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for StubModel {
    fn name(&self) -> &str {
        "Stub"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Option<String>, ModelError> {
        self.requests.lock().unwrap().push(request.clone());
        self.entered.notify_one();

        if let Some(release) = &self.release {
            release.notified().await;
        }

        match &self.reply {
            StubReply::Text(text) => Ok(Some(text.clone())),
            StubReply::Empty => Ok(None),
            StubReply::Fail => Err(ModelError::InvalidResponse(json!({"error": "overloaded"}))),
        }
    }
}

pub fn real_record() -> VideoRecord {
    VideoRecord {
        video_id: "7294458392095313184".into(),
        title: "golden hour skate #fyp".into(),
        author: "Skate Daily".into(),
        author_id: Some("6789".into()),
        thumbnail_url: COVER_URL.into(),
        video_url: "https://v.example/hd.mp4".into(),
        duration_seconds: 17,
        play_count: Some(2_400_000),
        like_count: Some(310_000),
        description: Some("golden hour skate #fyp".into()),
        is_demo: false,
    }
}

pub fn messages(entries: &[LogEntry]) -> Vec<String> {
    entries.iter().map(|e| e.message.clone()).collect()
}

pub fn count_severity(entries: &[LogEntry], severity: Severity) -> usize {
    entries.iter().filter(|e| e.severity == severity).count()
}
