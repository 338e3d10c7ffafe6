use std::{
    collections::{BTreeMap, HashMap},
    io::Read,
    sync::Arc,
    time::Duration,
};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

/// What the server saw of a request, returned by `/echo`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EchoReport {
    pub method: String,
    pub query: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    pub body: String,
    pub body_len: usize,
}

pub type Files = Arc<RwLock<HashMap<String, Vec<u8>>>>;

pub fn app() -> Router {
    let files: Files = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/echo", get(echo).post(echo))
        .route("/raw", post(raw))
        .route("/session", get(new_session))
        .route("/cookies", get(list_cookies))
        .route("/cookies/set", get(set_cookies))
        .route("/status/{code}", get(status))
        .route("/redirect", get(redirect))
        .route("/slow", get(slow))
        .route("/files/{name}", get(get_file).put(put_file).post(put_file))
        .with_state(files)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Split a `Cookie` request header into name/value pairs.
pub fn parse_cookie_header(value: &str) -> BTreeMap<String, String> {
    value
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Undo `Content-Encoding: gzip` on a request body.
pub fn decode_body(headers: &HeaderMap, body: &[u8]) -> Result<Vec<u8>, StatusCode> {
    let gzipped = headers
        .get(header::CONTENT_ENCODING)
        .is_some_and(|v| v.as_bytes().eq_ignore_ascii_case(b"gzip"));
    if !gzipped {
        return Ok(body.to_vec());
    }
    let mut out = Vec::new();
    GzDecoder::new(body)
        .read_to_end(&mut out)
        .map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok(out)
}

fn cookies_of(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(parse_cookie_header)
        .collect()
}

async fn echo(
    method: Method,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<EchoReport>, StatusCode> {
    let decoded = decode_body(&headers, &body)?;
    debug!(%method, len = decoded.len(), "echo");
    let header_map = headers
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
        .collect();
    Ok(Json(EchoReport {
        method: method.to_string(),
        query,
        cookies: cookies_of(&headers),
        headers: header_map,
        body_len: decoded.len(),
        body: String::from_utf8_lossy(&decoded).into_owned(),
    }))
}

/// Return the request body byte-for-byte, with the encoding-related request
/// headers reflected back so the client can see what it sent.
async fn raw(headers: HeaderMap, body: Bytes) -> Response {
    let mut response = body.into_response();
    for (seen, name) in [
        ("x-seen-content-encoding", header::CONTENT_ENCODING),
        ("x-seen-expect", header::EXPECT),
    ] {
        if let Some(value) = headers.get(&name) {
            response.headers_mut().insert(seen, value.clone());
        }
    }
    response
}

async fn new_session() -> Response {
    let sid = Uuid::new_v4();
    let mut response = Json(serde_json::json!({ "sid": sid })).into_response();
    if let Ok(value) = HeaderValue::from_str(&format!("sid={sid}; Path=/")) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

async fn list_cookies(headers: HeaderMap) -> Json<BTreeMap<String, String>> {
    Json(cookies_of(&headers))
}

async fn set_cookies(Query(pairs): Query<BTreeMap<String, String>>) -> Response {
    let mut response = StatusCode::OK.into_response();
    for (name, value) in pairs {
        if let Ok(value) = HeaderValue::from_str(&format!("{name}={value}; Path=/")) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

async fn status(Path(code): Path<u16>) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (status, format!("status {code}")).into_response()
}

async fn redirect() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/echo")], "moved").into_response()
}

#[derive(Deserialize)]
struct SlowQuery {
    #[serde(default)]
    ms: u64,
}

async fn slow(Query(q): Query<SlowQuery>) -> &'static str {
    tokio::time::sleep(Duration::from_millis(q.ms)).await;
    "done"
}

async fn get_file(State(files): State<Files>, Path(name): Path<String>) -> Result<Vec<u8>, StatusCode> {
    files.read().await.get(&name).cloned().ok_or(StatusCode::NOT_FOUND)
}

async fn put_file(
    State(files): State<Files>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, StatusCode> {
    let data = decode_body(&headers, &body)?;
    debug!(%name, len = data.len(), "stored file");
    files.write().await.insert(name, data);
    Ok(StatusCode::CREATED)
}
