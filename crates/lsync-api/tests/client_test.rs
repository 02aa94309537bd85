#![allow(clippy::unwrap_used)]
// Integration tests for `Client` using wiremock.

use std::io;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use tracing_subscriber::fmt::MakeWriter;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use lsync_api::models::{RemoteResource, Stream, StreamAttributes, STREAM};
use lsync_api::{
    CancellationToken, Client, ClientIdentity, ClientOptions, DEFAULT_USER_AGENT, Envelope,
    Error, Method, RateLimit, RetryPolicy, StatusCode, TransportConfig, UNKNOWN_STATUS,
};

// ── Helpers ─────────────────────────────────────────────────────────

const ORG: &str = "my-org";

fn fast_options() -> ClientOptions {
    ClientOptions {
        rate_limit: RateLimit {
            enabled: false,
            ..RateLimit::default()
        },
        transport: TransportConfig {
            timeout: Duration::from_secs(5),
            retry: RetryPolicy {
                max_retries: 3,
                wait_min: Duration::from_millis(10),
                wait_max: Duration::from_millis(50),
            },
        },
        user_agent: DEFAULT_USER_AGENT.into(),
    }
}

fn client_for(base_url: &str, options: ClientOptions) -> Client {
    let identity = ClientIdentity::new(
        SecretString::from("test-key"),
        ORG,
        "public",
        Some(base_url),
    )
    .unwrap();
    Client::new(identity, options).unwrap()
}

async fn setup() -> (MockServer, Client) {
    let server = MockServer::start().await;
    let client = client_for(&server.uri(), fast_options());
    (server, client)
}

fn api_path(suffix: &str) -> String {
    format!("/public/v0.2/{ORG}/{suffix}")
}

fn stream_body(id: &str, query: &str) -> serde_json::Value {
    json!({
        "data": {
            "type": "stream",
            "id": id,
            "attributes": { "name": "Errors", "query": query }
        }
    })
}

/// In-memory sink for a scoped `tracing` subscriber.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Matches requests that do NOT carry the given header.
struct NoHeader(&'static str);

impl Match for NoHeader {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key(self.0)
    }
}

// ── Request shape ───────────────────────────────────────────────────

#[tokio::test]
async fn test_sends_auth_org_and_media_type_headers() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(api_path("projects/p/streams/s1")))
        .and(header("Authorization", "bearer test-key"))
        .and(header("X-Lightstep-Org", ORG))
        .and(header("Content-Type", "application/vnd.api+json"))
        .and(header("Accept", "application/vnd.api+json"))
        .and(header("User-Agent", DEFAULT_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(stream_body("s1", "error = true")))
        .expect(1)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let stream: Stream = client.get(&cancel, "projects/p/streams/s1").await.unwrap();

    assert_eq!(stream.id.as_deref(), Some("s1"));
    assert_eq!(stream.attributes.query, "error = true");
}

#[tokio::test]
async fn test_post_sends_enveloped_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(api_path("projects/p/streams")))
        .and(body_json(json!({
            "data": {
                "type": "stream",
                "attributes": { "name": "Errors", "query": "error = true" }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(stream_body("new-id", "error = true")))
        .expect(1)
        .mount(&server)
        .await;

    let request = Envelope::new(Stream::new(
        STREAM,
        StreamAttributes {
            name: "Errors".into(),
            query: "error = true".into(),
            custom_data: Default::default(),
        },
    ));
    let cancel = CancellationToken::new();
    let created: Stream = client
        .post(&cancel, "projects/p/streams", &request)
        .await
        .unwrap();

    assert_eq!(created.id.as_deref(), Some("new-id"));
}

#[tokio::test]
async fn test_delete_discards_response_body() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(api_path("projects/p/streams/s1")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    client.delete(&cancel, "projects/p/streams/s1").await.unwrap();
}

#[tokio::test]
async fn test_raw_call_leaves_data_untyped() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(api_path("projects/p/streams/s1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(stream_body("s1", "q")))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let raw = client
        .call_api_raw::<()>(&cancel, Method::GET, "projects/p/streams/s1", None)
        .await
        .unwrap();

    assert_eq!(raw["attributes"]["query"], "q");
}

#[tokio::test]
async fn test_body_on_delete_is_sent_with_a_warning() {
    let (server, client) = setup().await;
    let body = json!({ "reason": "cleanup" });

    Mock::given(method("DELETE"))
        .and(path(api_path("projects/p/streams/s1")))
        .and(body_json(&body))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let cancel = CancellationToken::new();
    client
        .call_api_discard(&cancel, Method::DELETE, "projects/p/streams/s1", Some(&body))
        .await
        .unwrap();

    let output = logs.contents();
    let warnings: Vec<&str> = output
        .lines()
        .filter(|line| line.contains("does not support a request body"))
        .collect();
    assert_eq!(warnings.len(), 1, "log output:\n{output}");
    assert!(warnings[0].contains("WARN"));
    assert!(warnings[0].contains("DELETE"));
}

// ── Links ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_by_link_omits_org_header() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(api_path("projects/p/streams/linked")))
        .and(header("Authorization", "bearer test-key"))
        .and(NoHeader("X-Lightstep-Org"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stream_body("linked", "q")))
        .expect(1)
        .mount(&server)
        .await;

    let link = format!("{}{}", server.uri(), api_path("projects/p/streams/linked"));
    let cancel = CancellationToken::new();
    let id = client.get_by_link(&cancel, &link).await.unwrap();

    assert_eq!(id, "linked");
}

#[tokio::test]
async fn test_get_by_link_reads_only_the_identifier() {
    let (server, client) = setup().await;

    // No `query`: too sparse for the typed stream model.
    Mock::given(method("GET"))
        .and(path(api_path("projects/p/streams/s-9")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "type": "stream", "id": "s-9", "attributes": { "name": "x" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let link = format!("{}{}", server.uri(), api_path("projects/p/streams/s-9"));
    let cancel = CancellationToken::new();
    let id = client.get_by_link(&cancel, &link).await.unwrap();

    assert_eq!(id, "s-9");
}

#[tokio::test]
async fn test_get_linked_dispatches_on_type() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(api_path("projects/p/dashboards/d1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "type": "dashboard",
                "id": "d1",
                "attributes": { "name": "Overview", "streams": [] }
            }
        })))
        .mount(&server)
        .await;

    let link = format!("{}{}", server.uri(), api_path("projects/p/dashboards/d1"));
    let cancel = CancellationToken::new();
    let resource = client.get_linked(&cancel, &link).await.unwrap();

    assert!(matches!(resource, RemoteResource::Dashboard(_)));
    assert_eq!(resource.id(), Some("d1"));
}

#[tokio::test]
async fn test_get_by_link_without_id_is_decode_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(api_path("projects/p/things/x")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "type": "thing" } })),
        )
        .mount(&server)
        .await;

    let link = format!("{}{}", server.uri(), api_path("projects/p/things/x"));
    let cancel = CancellationToken::new();
    let err = client.get_by_link(&cancel, &link).await.unwrap_err();

    assert!(
        matches!(err, Error::Deserialization { .. }),
        "expected Deserialization error, got: {err:?}"
    );
    assert_eq!(err.status_code(), 200);
}

// ── Error classification ────────────────────────────────────────────

#[tokio::test]
async fn test_not_found_is_rejected_without_retry() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(api_path("projects/p/streams/missing")))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let err = client
        .get::<Stream>(&cancel, "projects/p/streams/missing")
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.status_code(), 404);
    assert_eq!(err.http_response().unwrap().body, "not found");
    let msg = err.to_string();
    assert!(msg.contains("GET"), "{msg}");
    assert!(msg.contains("projects/p/streams/missing"), "{msg}");
    assert!(msg.contains("404 Not Found"), "{msg}");
}

#[tokio::test]
async fn test_created_status_is_not_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(api_path("projects/p/streams")))
        .respond_with(ResponseTemplate::new(201).set_body_json(stream_body("s1", "q")))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let err = client
        .post::<_, Stream>(&cancel, "projects/p/streams", &json!({ "data": {} }))
        .await
        .unwrap_err();

    assert_eq!(err.http_response().unwrap().status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(api_path("projects/p/streams/s1")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let err = client
        .get::<Stream>(&cancel, "projects/p/streams/s1")
        .await
        .unwrap_err();

    let Error::Deserialization { status, body, .. } = &err else {
        panic!("expected Deserialization error, got: {err:?}");
    };
    assert_eq!(*status, StatusCode::OK);
    assert_eq!(body, "<html>oops</html>");
}

#[tokio::test]
async fn test_connection_refused_reports_unknown_status() {
    // Nothing listens on port 1.
    let client = client_for("http://127.0.0.1:1", fast_options());

    let cancel = CancellationToken::new();
    let err = client
        .get::<Stream>(&cancel, "projects/p/streams/s1")
        .await
        .unwrap_err();

    assert!(
        matches!(err, Error::Transport { .. }),
        "expected Transport error, got: {err:?}"
    );
    assert_eq!(err.status_code(), UNKNOWN_STATUS);
    assert!(err.http_response().is_none());
}

// ── Retry & deadline ────────────────────────────────────────────────

#[tokio::test]
async fn test_server_errors_are_retried() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(api_path("projects/p/streams/s1")))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("projects/p/streams/s1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(stream_body("s1", "q")))
        .expect(1)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let stream: Stream = client.get(&cancel, "projects/p/streams/s1").await.unwrap();

    assert_eq!(stream.id.as_deref(), Some("s1"));
}

#[tokio::test]
async fn test_throttling_is_retried() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(api_path("projects/p/streams/s1")))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("projects/p/streams/s1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(stream_body("s1", "q")))
        .expect(1)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    client
        .get::<Stream>(&cancel, "projects/p/streams/s1")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_exhausted_retries_surface_last_status() {
    let (server, client) = setup().await;

    // One initial attempt plus three retries.
    Mock::given(method("GET"))
        .and(path(api_path("projects/p/streams/s1")))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(4)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let err = client
        .get::<Stream>(&cancel, "projects/p/streams/s1")
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 503);
}

#[tokio::test]
async fn test_deadline_bounds_the_request() {
    let server = MockServer::start().await;
    let mut options = fast_options();
    options.transport.timeout = Duration::from_millis(200);
    let client = client_for(&server.uri(), options);

    Mock::given(method("GET"))
        .and(path(api_path("projects/p/streams/slow")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(stream_body("slow", "q"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let err = client
        .get::<Stream>(&cancel, "projects/p/streams/slow")
        .await
        .unwrap_err();

    assert!(
        matches!(err, Error::Timeout { .. }),
        "expected Timeout error, got: {err:?}"
    );
    assert_eq!(err.status_code(), UNKNOWN_STATUS);
}

// ── Cancellation & pacing ───────────────────────────────────────────

#[tokio::test]
async fn test_cancelled_token_sends_nothing() {
    let server = MockServer::start().await;
    let mut options = fast_options();
    options.rate_limit.enabled = true;
    let client = client_for(&server.uri(), options);

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stream_body("s1", "q")))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = client
        .get::<Stream>(&cancel, "projects/p/streams/s1")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled { .. }));
    assert_eq!(err.status_code(), UNKNOWN_STATUS);
}

#[tokio::test]
async fn test_cancel_during_backoff_stops_retrying() {
    let server = MockServer::start().await;
    let mut options = fast_options();
    options.transport.timeout = Duration::from_secs(30);
    options.transport.retry.wait_min = Duration::from_secs(5);
    options.transport.retry.wait_max = Duration::from_secs(10);
    let client = client_for(&server.uri(), options);

    Mock::given(method("GET"))
        .and(path(api_path("projects/p/streams/s1")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let start = Instant::now();
    let trigger = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    };
    let (result, ()) = tokio::join!(
        client.get::<Stream>(&cancel, "projects/p/streams/s1"),
        trigger,
    );

    let err = result.unwrap_err();
    assert!(
        matches!(err, Error::Cancelled { .. }),
        "expected Cancelled error, got: {err:?}"
    );
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_limiter_is_shared_across_concurrent_calls() {
    let server = MockServer::start().await;
    let mut options = fast_options();
    options.rate_limit = RateLimit {
        per_second: NonZeroU32::new(10).unwrap(),
        enabled: true,
    };
    let client = client_for(&server.uri(), options);

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stream_body("s1", "q")))
        .expect(3)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let start = Instant::now();
    let (a, b, c) = tokio::join!(
        client.get::<Stream>(&cancel, "projects/p/streams/a"),
        client.get::<Stream>(&cancel, "projects/p/streams/b"),
        client.get::<Stream>(&cancel, "projects/p/streams/c"),
    );
    a.unwrap();
    b.unwrap();
    c.unwrap();

    // 10 rps with burst 1: the third request waits for two refills.
    assert!(start.elapsed() >= Duration::from_millis(180));
}
