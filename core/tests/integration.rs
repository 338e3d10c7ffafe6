//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts its own mock server on a random port on a background
//! tokio runtime, then drives the blocking client against it over real HTTP.
//! Separate servers keep file uploads and cookies from leaking between tests.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use flate2::read::GzDecoder;
use hurl_core::{Error, ErrorKind, HttpParams, RequestConfig, Session};
use mock_server::EchoReport;

const NO_TIMEOUT: Duration = Duration::ZERO;

/// Start the mock server on a random port and return its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn params(pairs: &[(&str, &str)]) -> HttpParams {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn echo(body: &[u8]) -> EchoReport {
    serde_json::from_slice(body).unwrap()
}

fn cookies(body: &[u8]) -> BTreeMap<String, String> {
    serde_json::from_slice(body).unwrap()
}

fn tar_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *data).unwrap();
    }
    builder.into_inner().unwrap()
}

fn upload(base: &str, name: &str, data: &[u8]) {
    let resp = hurl_core::post(&format!("{base}/files/{name}"), data, NO_TIMEOUT).unwrap();
    assert_eq!(resp.status, 201, "upload of {name}");
}

// ---------------------------------------------------------------------------
// GET / POST
// ---------------------------------------------------------------------------

#[test]
fn get_with_params_builds_query_string() {
    let base = start_server();
    let resp = hurl_core::get(
        &format!("{base}/echo"),
        &params(&[("q", "a b&c"), ("n", "1")]),
        NO_TIMEOUT,
    )
    .unwrap();

    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("content-type"), Some("application/json"));
    let report = echo(&resp.body);
    assert_eq!(report.method, "GET");
    assert_eq!(report.query.get("q").map(String::as_str), Some("a b&c"));
    assert_eq!(report.query.get("n").map(String::as_str), Some("1"));
}

#[test]
fn http_error_status_is_a_normal_response() {
    let base = start_server();
    let resp = hurl_core::get(&format!("{base}/status/404"), &HttpParams::new(), NO_TIMEOUT).unwrap();
    assert_eq!(resp.status, 404);
    assert_eq!(resp.text(), "status 404");
}

#[test]
fn status_line_is_not_a_header() {
    let base = start_server();
    let resp = hurl_core::get(&format!("{base}/echo"), &HttpParams::new(), NO_TIMEOUT).unwrap();
    assert!(resp.headers.keys().all(|k| !k.starts_with("HTTP/")));
    assert!(resp.header("content-type").is_some());
}

#[test]
fn post_form_sends_urlencoded_body() {
    let base = start_server();
    let resp = hurl_core::post_form(
        &format!("{base}/echo"),
        &params(&[("a", "x y"), ("b", "&=")]),
        NO_TIMEOUT,
    )
    .unwrap();

    let report = echo(&resp.body);
    assert_eq!(report.method, "POST");
    assert_eq!(report.body, "a=x%20y&b=%26%3D");
    assert_eq!(
        report.headers.get("content-type").map(String::as_str),
        Some("application/x-www-form-urlencoded")
    );
    assert!(!report.headers.contains_key("expect"));
}

#[test]
fn post_at_threshold_is_sent_uncompressed() {
    let base = start_server();
    let data = vec![b'a'; 10240];
    let resp = hurl_core::post(&format!("{base}/raw"), &data, NO_TIMEOUT).unwrap();

    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("x-seen-content-encoding"), None);
    assert_eq!(resp.header("x-seen-expect"), None);
    assert_eq!(resp.body, data);
}

#[test]
fn post_over_threshold_is_sent_gzipped() {
    let base = start_server();
    let data: Vec<u8> = (0..10241u32).map(|i| (i % 251) as u8).collect();
    let resp = hurl_core::post(&format!("{base}/raw"), &data, NO_TIMEOUT).unwrap();

    assert_eq!(resp.header("x-seen-content-encoding"), Some("gzip"));
    assert_eq!(resp.header("x-seen-expect"), None);
    let mut decoded = Vec::new();
    GzDecoder::new(resp.body.as_slice())
        .read_to_end(&mut decoded)
        .unwrap();
    assert_eq!(decoded, data);
}

#[test]
fn session_compression_threshold_is_configurable() {
    let base = start_server();
    let config = RequestConfig {
        compression_threshold: 100,
        ..RequestConfig::default()
    };
    let mut session = Session::with_config(&base, config).unwrap();

    let small = vec![b'a'; 100];
    let resp = session.post("/raw", &small).unwrap();
    assert_eq!(resp.header("x-seen-content-encoding"), None);
    assert_eq!(resp.body, small);

    let large = vec![b'a'; 101];
    let resp = session.post("/raw", &large).unwrap();
    assert_eq!(resp.header("x-seen-content-encoding"), Some("gzip"));
    let mut decoded = Vec::new();
    GzDecoder::new(resp.body.as_slice())
        .read_to_end(&mut decoded)
        .unwrap();
    assert_eq!(decoded, large);
}

#[test]
fn large_form_post_is_decoded_by_server() {
    let base = start_server();
    let big = "v".repeat(20_000);
    let resp = hurl_core::post_form(&format!("{base}/echo"), &params(&[("k", big.as_str())]), NO_TIMEOUT).unwrap();
    let report = echo(&resp.body);
    assert_eq!(report.headers.get("content-encoding").map(String::as_str), Some("gzip"));
    assert_eq!(report.body, format!("k={big}"));
}

// ---------------------------------------------------------------------------
// Sessions and cookies
// ---------------------------------------------------------------------------

#[test]
fn session_replays_cookies() {
    let base = start_server();
    let mut session = Session::new(&base).unwrap();

    let resp = session.get("/session", &HttpParams::new()).unwrap();
    let sid: serde_json::Value = serde_json::from_slice(&resp.body).unwrap();
    let sid = sid["sid"].as_str().unwrap().to_string();

    let resp = session.get("/cookies", &HttpParams::new()).unwrap();
    assert_eq!(cookies(&resp.body).get("sid"), Some(&sid));
}

#[test]
fn free_functions_never_share_cookies() {
    let base = start_server();
    hurl_core::get(&format!("{base}/session"), &HttpParams::new(), NO_TIMEOUT).unwrap();
    let resp = hurl_core::get(&format!("{base}/cookies"), &HttpParams::new(), NO_TIMEOUT).unwrap();
    assert!(cookies(&resp.body).is_empty());
}

#[test]
fn session_cookies_accumulate_across_calls() {
    let base = start_server();
    let mut session = Session::new(&base).unwrap();
    session.get("/cookies/set", &params(&[("a", "1")])).unwrap();
    session.get("/cookies/set", &params(&[("b", "2")])).unwrap();

    let resp = session.get("/cookies", &HttpParams::new()).unwrap();
    let jar = cookies(&resp.body);
    assert_eq!(jar.get("a").map(String::as_str), Some("1"));
    assert_eq!(jar.get("b").map(String::as_str), Some("2"));
}

#[test]
fn cookie_dump_round_trips_on_same_session() {
    let base = start_server();
    let mut session = Session::new(&base).unwrap();
    session.get("/session", &HttpParams::new()).unwrap();
    let before = cookies(&session.get("/cookies", &HttpParams::new()).unwrap().body);

    let dump = session.cookie().unwrap();
    assert_eq!(dump.lines().count(), 1);
    session.set_cookie(&dump).unwrap();

    let after = cookies(&session.get("/cookies", &HttpParams::new()).unwrap().body);
    assert_eq!(before, after);
}

#[test]
fn cookie_dump_transfers_to_new_session() {
    let base = start_server();
    let mut first = Session::new(&base).unwrap();
    first.get("/session", &HttpParams::new()).unwrap();
    let expected = cookies(&first.get("/cookies", &HttpParams::new()).unwrap().body);

    let mut second = Session::new(&base).unwrap();
    second.set_cookie(&first.cookie().unwrap()).unwrap();
    let got = cookies(&second.get("/cookies", &HttpParams::new()).unwrap().body);
    assert_eq!(got, expected);
}

#[test]
fn session_post_form_uses_base_url() {
    let base = start_server();
    let mut session = Session::new(&base).unwrap();
    let resp = session.post_form("/echo", &params(&[("x", "1")])).unwrap();
    assert_eq!(echo(&resp.body).body, "x=1");
}

#[test]
fn session_options_do_not_leak_between_calls() {
    let base = start_server();
    let mut session = Session::new(&base).unwrap();
    session.post("/echo", b"payload").unwrap();
    let resp = session.get("/echo", &HttpParams::new()).unwrap();
    let report = echo(&resp.body);
    assert_eq!(report.method, "GET");
    assert_eq!(report.body_len, 0);
}

#[test]
fn redirects_are_not_followed_by_default() {
    let base = start_server();
    let mut session = Session::new(&base).unwrap();
    let resp = session.get("/redirect", &HttpParams::new()).unwrap();
    assert_eq!(resp.status, 302);
    assert_eq!(resp.header("location"), Some("/echo"));
}

#[test]
fn follow_redirects_reports_final_headers() {
    let base = start_server();
    let config = RequestConfig {
        follow_redirects: true,
        ..RequestConfig::default()
    };
    let mut session = Session::with_config(&base, config).unwrap();
    let resp = session.get("/redirect", &HttpParams::new()).unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("location"), None);
    assert_eq!(echo(&resp.body).method, "GET");
}

// ---------------------------------------------------------------------------
// Downloads
// ---------------------------------------------------------------------------

#[test]
fn download_writes_exact_body() {
    let base = start_server();
    let payload: Vec<u8> = (0..50_000u32).map(|i| (i % 7) as u8).collect();
    upload(&base, "blob.bin", &payload);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blob.bin");
    let resp = hurl_core::download(&format!("{base}/files/blob.bin"), &path, NO_TIMEOUT).unwrap();

    assert_eq!(resp.status, 200);
    assert!(resp.body.is_empty());
    assert_eq!(fs::read(&path).unwrap(), payload);
}

#[cfg(target_os = "linux")]
#[test]
fn download_into_full_device_is_io_error() {
    let base = start_server();
    let payload = vec![7u8; 100_000];
    upload(&base, "big.bin", &payload);
    let full = Path::new("/dev/full");

    let err = hurl_core::download(&format!("{base}/files/big.bin"), full, NO_TIMEOUT).unwrap_err();
    assert!(matches!(err, Error::Io { .. }), "{err:?}");
    assert_eq!(err.kind(), ErrorKind::Io);

    let err = hurl_core::download(&format!("{base}/status/200"), full, NO_TIMEOUT).unwrap_err();
    assert!(matches!(err, Error::Io { .. }), "{err:?}");
}

#[test]
fn download_of_error_status_keeps_error_body() {
    let base = start_server();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");
    fs::write(&path, "stale contents that must disappear").unwrap();

    let resp = hurl_core::download(&format!("{base}/status/500"), &path, NO_TIMEOUT).unwrap();
    assert_eq!(resp.status, 500);
    assert_eq!(fs::read_to_string(&path).unwrap(), "status 500");
}

#[test]
fn download_truncates_even_when_transfer_fails() {
    let dead = dead_address();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");
    fs::write(&path, "stale").unwrap();

    let err = hurl_core::download(&format!("http://{dead}/x"), &path, NO_TIMEOUT).unwrap_err();
    assert!(matches!(err, Error::Connect));
    assert_eq!(fs::read(&path).unwrap(), b"");
}

#[test]
fn session_download_uses_base_url() {
    let base = start_server();
    upload(&base, "s.txt", b"session file");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.txt");

    let mut session = Session::new(&base).unwrap();
    let resp = session.download("/files/s.txt", &path).unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(fs::read(&path).unwrap(), b"session file");
}

// ---------------------------------------------------------------------------
// Tarballs
// ---------------------------------------------------------------------------

fn assert_untouched(dir: &Path) {
    assert!(!dir.exists(), "{} should not have been created", dir.display());
}

#[test]
fn download_tarball_extracts_on_200() {
    let base = start_server();
    let big = vec![b'z'; 30_000];
    let archive = tar_bytes(&[("readme.txt", &b"hello"[..]), ("data/big.bin", &big[..])]);
    upload(&base, "bundle.tar", &archive);

    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("bundle.tar");
    let extract = dir.path().join("extracted");
    let resp = hurl_core::download_tarball(
        &format!("{base}/files/bundle.tar"),
        &local,
        &extract,
        NO_TIMEOUT,
    )
    .unwrap();

    assert_eq!(resp.status, 200);
    assert_eq!(fs::read(&local).unwrap(), archive);
    assert_eq!(fs::read(extract.join("readme.txt")).unwrap(), b"hello");
    assert_eq!(fs::read(extract.join("data/big.bin")).unwrap(), big);
}

#[test]
fn download_tarball_skips_extraction_on_404() {
    let base = start_server();
    let dir = tempfile::tempdir().unwrap();
    let extract = dir.path().join("extracted");

    let resp = hurl_core::download_tarball(
        &format!("{base}/files/missing.tar"),
        &dir.path().join("missing.tar"),
        &extract,
        NO_TIMEOUT,
    )
    .unwrap();

    assert_eq!(resp.status, 404);
    assert_untouched(&extract);
}

#[test]
fn download_tarball_never_follows_redirects() {
    let base = start_server();
    let config = RequestConfig {
        follow_redirects: true,
        ..RequestConfig::default()
    };
    let mut session = Session::with_config(&base, config).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let extract = dir.path().join("extracted");

    let resp = session
        .download_tarball("/redirect", &dir.path().join("r.tar"), &extract)
        .unwrap();
    assert_eq!(resp.status, 302);
    assert_untouched(&extract);
}

#[test]
fn download_tarball_of_garbage_is_archive_error() {
    let base = start_server();
    upload(&base, "junk.tar", &vec![0xAB; 2048]);
    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("junk.tar");

    let err = hurl_core::download_tarball(
        &format!("{base}/files/junk.tar"),
        &local,
        &dir.path().join("extracted"),
        NO_TIMEOUT,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArchiveExtractionFailure);
    assert_eq!(fs::read(&local).unwrap().len(), 2048);
}

// ---------------------------------------------------------------------------
// Transport failures
// ---------------------------------------------------------------------------

/// An address nothing is listening on.
fn dead_address() -> std::net::SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

#[test]
fn unresolvable_host_is_resolve_failure() {
    let err = hurl_core::get("http://no-such-host.invalid/", &HttpParams::new(), NO_TIMEOUT).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResolveFailure);
}

#[test]
fn refused_connection_is_connect_failure() {
    let dead = dead_address();
    let err = hurl_core::get(&format!("http://{dead}/"), &HttpParams::new(), NO_TIMEOUT).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConnectFailure);
}

#[test]
fn slow_response_is_timeout() {
    let base = start_server();
    let err = hurl_core::get(
        &format!("{base}/slow"),
        &params(&[("ms", "5000")]),
        Duration::from_secs(1),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[test]
fn sub_millisecond_timeout_still_bounds_the_transfer() {
    let base = start_server();
    let err = hurl_core::get(
        &format!("{base}/slow"),
        &params(&[("ms", "1500")]),
        Duration::from_micros(500),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[test]
fn session_timeout_applies_to_every_call() {
    let base = start_server();
    let mut session = Session::with_timeout(&base, Duration::from_secs(1)).unwrap();
    assert_eq!(session.get("/echo", &HttpParams::new()).unwrap().status, 200);
    let err = session.get("/slow", &params(&[("ms", "5000")])).unwrap_err();
    assert!(matches!(err, Error::Timeout));
}

#[test]
fn session_survives_a_failed_request() {
    let base = start_server();
    let mut session = Session::with_timeout(&base, Duration::from_secs(1)).unwrap();
    session.get("/session", &HttpParams::new()).unwrap();
    session.get("/slow", &params(&[("ms", "5000")])).unwrap_err();

    let resp = session.get("/cookies", &HttpParams::new()).unwrap();
    assert!(cookies(&resp.body).contains_key("sid"));
}

#[test]
fn independent_calls_run_in_parallel() {
    let base = start_server();
    let workers: Vec<_> = (0..4)
        .map(|i| {
            let url = format!("{base}/echo");
            std::thread::spawn(move || {
                let worker = i.to_string();
                let p = params(&[("worker", worker.as_str())]);
                hurl_core::get(&url, &p, NO_TIMEOUT).unwrap()
            })
        })
        .collect();

    for (i, worker) in workers.into_iter().enumerate() {
        let resp = worker.join().unwrap();
        let report = echo(&resp.body);
        assert_eq!(report.query.get("worker"), Some(&i.to_string()));
    }
}

#[test]
fn transport_is_initialized_once_handles_exist() {
    let _session = Session::new("http://localhost").unwrap();
    assert!(hurl_core::transport::is_initialized());
    assert!(hurl_core::transport::live_handles() >= 1);
}
