//! Tests for pagination module

use super::*;
use crate::config::ClientOptions;
use crate::error::{ApiErrorKind, Error, ErrorId};
use crate::http::{HttpTransport, TransportResponse};
use bytes::Bytes;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use test_case::test_case;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helpers
// ============================================================================

#[derive(Default)]
struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

#[async_trait::async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

fn options(base_url: &str, max_pages: u32) -> ClientOptions {
    ClientOptions::builder()
        .base_url(base_url)
        .max_pages(max_pages)
        .no_rate_limit()
        .build()
}

fn paginator(server: &MockServer, max_pages: u32) -> (Paginator, Arc<RecordingSleeper>) {
    let options = options(&server.uri(), max_pages);
    let transport = Arc::new(HttpTransport::new(&options).unwrap());
    let sleeper = Arc::new(RecordingSleeper::default());
    let mut paginator = Paginator::new(&options, transport);
    paginator.set_sleeper(sleeper.clone());
    (paginator, sleeper)
}

fn offline_paginator() -> Paginator {
    let options = ClientOptions::builder()
        .key("app-key")
        .access_token("token")
        .page_size(50)
        .build();
    let transport = Arc::new(HttpTransport::new(&options).unwrap());
    Paginator::new(&options, transport)
}

fn page(items: Value, has_more: bool) -> Value {
    json!({
        "items": items,
        "has_more": has_more,
        "quota_max": 300,
        "quota_remaining": 290,
    })
}

fn response(body: &[u8]) -> TransportResponse {
    TransportResponse {
        status: 200,
        url: "https://api.stackexchange.com/2.2/questions/?page=1".to_string(),
        body: Bytes::copy_from_slice(body),
    }
}

// ============================================================================
// Request Construction Tests
// ============================================================================

#[test]
fn test_prepare_base_params() {
    let mut paginator = offline_paginator();
    paginator.set_site("stackoverflow");

    let prepared = paginator
        .prepare(&FetchRequest::new("questions").page(3))
        .unwrap();

    assert_eq!(prepared.url, "https://api.stackexchange.com/2.2/questions/");
    assert_eq!(prepared.page, 3);
    assert_eq!(prepared.params["pagesize"], "50");
    assert_eq!(prepared.params["filter"], "default");
    assert_eq!(prepared.params["key"], "app-key");
    assert_eq!(prepared.params["access_token"], "token");
    assert_eq!(prepared.params["site"], "stackoverflow");
    assert!(prepared
        .wire_params()
        .contains(&("page".to_string(), "3".to_string())));
}

#[test]
fn test_prepare_merges_caller_params() {
    let prepared = offline_paginator()
        .prepare(
            &FetchRequest::new("questions")
                .filter("withbody")
                .param("tagged", json!(["rust", "serde"]))
                .param("pagesize", 10)
                .param("fromdate", json!(null))
                .param("page", 9),
        )
        .unwrap();

    assert_eq!(prepared.params["filter"], "withbody");
    assert_eq!(prepared.params["tagged"], "rust;serde");
    assert_eq!(prepared.params["pagesize"], "10");
    assert!(!prepared.params.contains_key("fromdate"));
    assert!(!prepared.params.contains_key("page"));
    assert!(!prepared.params.contains_key("site"));
    assert_eq!(prepared.page, 1);
}

#[test]
fn test_prepare_splices_ids_into_path() {
    let prepared = offline_paginator()
        .prepare(&FetchRequest::new("answers").ids([1, 2, 3]))
        .unwrap();

    assert!(prepared.url.ends_with("/answers/1;2;3"));
    assert!(!prepared.params.contains_key("ids"));
}

#[test_case("answers/{ids}/comments" ; "named placeholder")]
#[test_case("answers/{}/comments" ; "bare placeholder")]
fn test_prepare_fills_id_placeholder(endpoint: &str) {
    let prepared = offline_paginator()
        .prepare(&FetchRequest::new(endpoint).ids(["10", "20"]))
        .unwrap();

    assert_eq!(
        prepared.url,
        "https://api.stackexchange.com/2.2/answers/10;20/comments/"
    );
}

#[test]
fn test_prepare_placeholder_without_ids() {
    let err = offline_paginator()
        .prepare(&FetchRequest::new("answers/{ids}/comments"))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));
}

#[test_case("" ; "empty")]
#[test_case("/" ; "slash only")]
fn test_prepare_rejects_missing_endpoint(endpoint: &str) {
    let err = offline_paginator()
        .prepare(&FetchRequest::new(endpoint))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));
}

#[test_case(json!("rust"), Some("rust") ; "string")]
#[test_case(json!(42), Some("42") ; "number")]
#[test_case(json!(true), Some("true") ; "bool")]
#[test_case(json!([1, "two", null]), Some("1;two") ; "array")]
#[test_case(json!(null), None ; "null")]
fn test_param_text(value: Value, expected: Option<&str>) {
    assert_eq!(param_text(&value).as_deref(), expected);
}

// ============================================================================
// Response Decoding Tests
// ============================================================================

#[test]
fn test_decode_envelope() {
    let body = json!({
        "items": [{"id": 1}],
        "has_more": true,
        "backoff": 10,
        "total": 42,
        "quota_max": 10000,
        "quota_remaining": 9999,
    });
    let envelope = ResponseEnvelope::decode(&response(body.to_string().as_bytes()), None).unwrap();

    assert_eq!(envelope.items, vec![json!({"id": 1})]);
    assert!(envelope.has_more);
    assert_eq!(envelope.backoff, Some(10));
    assert_eq!(envelope.total, Some(42));
    assert_eq!(envelope.quota_max, 10000);
    assert_eq!(envelope.quota_remaining, 9999);
}

#[test]
fn test_decode_tolerates_bom() {
    let mut body = b"\xEF\xBB\xBF".to_vec();
    body.extend_from_slice(br#"{"items": [1, 2]}"#);

    let envelope = ResponseEnvelope::decode(&response(&body), None).unwrap();
    assert_eq!(envelope.items.len(), 2);
    assert!(!envelope.has_more);
    assert_eq!(envelope.backoff, None);
}

#[test]
fn test_decode_error_object() {
    let body = json!({
        "error_id": 502,
        "error_name": "throttle_violation",
        "error_message": "too many requests from this IP",
    });
    let err = ResponseEnvelope::decode(&response(body.to_string().as_bytes()), None).unwrap_err();

    let api = err.as_api_error().unwrap();
    assert_eq!(api.kind, ApiErrorKind::Remote);
    assert_eq!(api.error_id, ErrorId::Code(502));
    assert_eq!(api.error_name, "throttle_violation");
    assert_eq!(api.error_message, "too many requests from this IP");
    assert_eq!(api.url, "https://api.stackexchange.com/2.2/questions/?page=1");
}

#[test_case(b"<html>busy</html>" ; "html")]
#[test_case(b"[1, 2]" ; "array")]
#[test_case(br#"{"items": 5}"# ; "items not a list")]
fn test_decode_parse_failures(body: &[u8]) {
    let err = ResponseEnvelope::decode(&response(body), None).unwrap_err();
    assert_eq!(err.as_api_error().unwrap().kind, ApiErrorKind::Parse);
}

#[test]
fn test_decode_sub_key() {
    let body = json!({
        "items": [1, 2, 3],
        "answers": [{"answer_id": 7}],
        "wrapper": {"items": [{"a": 1}, {"a": 2}]},
        "has_more": false,
    });
    let raw = response(body.to_string().as_bytes());

    let answers = ResponseEnvelope::decode(&raw, Some("answers")).unwrap();
    assert_eq!(answers.items, vec![json!({"answer_id": 7})]);

    let wrapped = ResponseEnvelope::decode(&raw, Some("wrapper")).unwrap();
    assert_eq!(wrapped.items.len(), 2);

    let err = ResponseEnvelope::decode(&raw, Some("missing")).unwrap_err();
    assert_eq!(err.as_api_error().unwrap().kind, ApiErrorKind::Parse);
}

// ============================================================================
// Read Tests
// ============================================================================

#[tokio::test]
async fn test_fetch_single_page_with_ids() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2.2/answers/100"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page(json!([{"answer_id": 100}, {"answer_id": 101}]), false)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let (paginator, sleeper) = paginator(&mock_server, 100);
    let result = paginator
        .fetch(&FetchRequest::new("answers").ids([100]))
        .await
        .unwrap();

    assert_eq!(result.items.len(), 2);
    assert_eq!(result.page, 1);
    assert_eq!(result.requests, 1);
    assert!(!result.has_more);
    assert_eq!(result.quota_max, 300);
    assert_eq!(result.quota_remaining, 290);
    assert_eq!(result.backoff, Some(0));
    assert_eq!(result.total, Some(0));
    assert!(result.url.contains("/2.2/answers/100"));
    assert!(sleeper.slept.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_walks_pages_in_order() {
    let mock_server = MockServer::start().await;

    for (n, has_more) in [(1, true), (2, true), (3, false)] {
        Mock::given(method("GET"))
            .and(path("/2.2/questions/"))
            .and(query_param("page", n.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(
                json!([{"question_id": n * 10}, {"question_id": n * 10 + 1}]),
                has_more,
            )))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let (paginator, _) = paginator(&mock_server, 100);
    let result = paginator.fetch(&FetchRequest::new("questions")).await.unwrap();

    let ids: Vec<i64> = result
        .items
        .iter()
        .map(|item| item["question_id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![10, 11, 20, 21, 30, 31]);
    assert_eq!(result.requests, 3);
    assert_eq!(result.page, 3);
    assert!(!result.has_more);
}

#[tokio::test]
async fn test_fetch_stops_at_max_pages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2.2/questions/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([1]), true)))
        .expect(2)
        .mount(&mock_server)
        .await;

    let (paginator, _) = paginator(&mock_server, 2);
    let result = paginator
        .fetch(&FetchRequest::new("questions").page(5))
        .await
        .unwrap();

    assert_eq!(result.requests, 2);
    assert_eq!(result.items.len(), 2);
    assert!(result.has_more);
    // the page after the last one fetched, ready to resume from
    assert_eq!(result.page, 7);
}

#[tokio::test]
async fn test_fetch_error_aborts_walk() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([1, 2]), true)))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error_id": 400,
            "error_name": "bad_parameter",
            "error_message": "page",
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]), false)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (paginator, _) = paginator(&mock_server, 100);
    let err = paginator
        .fetch(&FetchRequest::new("questions"))
        .await
        .unwrap_err();

    let api = err.as_api_error().unwrap();
    assert_eq!(api.error_id, ErrorId::Code(400));
    assert_eq!(api.error_name, "bad_parameter");
    assert_eq!(api.error_message, "page");
    assert!(api.url.contains("page=2"));
}

#[tokio::test]
async fn test_fetch_honors_backoff_and_resets_total() {
    let mock_server = MockServer::start().await;

    let mut first = page(json!([1]), true);
    first["backoff"] = json!(5);
    first["total"] = json!(2);
    Mock::given(method("GET"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(first))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([2]), false)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (paginator, sleeper) = paginator(&mock_server, 100);
    let result = paginator.fetch(&FetchRequest::new("questions")).await.unwrap();

    assert_eq!(*sleeper.slept.lock().unwrap(), vec![Duration::from_secs(6)]);
    assert_eq!(result.items, vec![json!(1), json!(2)]);
    assert_eq!(result.backoff, Some(0));
    assert_eq!(result.total, Some(0));
}

#[tokio::test]
async fn test_fetch_saturates_huge_backoff() {
    let mock_server = MockServer::start().await;

    let mut body = page(json!([1]), false);
    body["backoff"] = json!(u64::MAX);
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (paginator, sleeper) = paginator(&mock_server, 100);
    let result = paginator.fetch(&FetchRequest::new("questions")).await.unwrap();

    assert_eq!(
        *sleeper.slept.lock().unwrap(),
        vec![Duration::from_secs(u64::MAX)]
    );
    assert_eq!(result.backoff, Some(u64::MAX));
}

#[tokio::test]
async fn test_fetch_pages_visitor_can_stop() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!(["x"]), true)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (paginator, _) = paginator(&mock_server, 100);
    let mut seen = 0;
    let result = paginator
        .fetch_pages(&FetchRequest::new("sites"), |envelope| {
            seen += envelope.items.len();
            ControlFlow::Break(())
        })
        .await
        .unwrap();

    assert_eq!(seen, 1);
    assert_eq!(result.requests, 1);
    assert_eq!(result.page, 1);
}

#[tokio::test]
async fn test_fetch_unparseable_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>offline</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (paginator, _) = paginator(&mock_server, 100);
    let err = paginator
        .fetch(&FetchRequest::new("questions"))
        .await
        .unwrap_err();

    assert_eq!(err.as_api_error().unwrap().kind, ApiErrorKind::Parse);
}

#[tokio::test]
async fn test_fetch_transport_failure() {
    let options = options("http://127.0.0.1:1", 100);
    let transport = Arc::new(HttpTransport::new(&options).unwrap());
    let paginator = Paginator::new(&options, transport);

    let err = paginator
        .fetch(&FetchRequest::new("questions"))
        .await
        .unwrap_err();

    let api = err.as_api_error().unwrap();
    assert_eq!(api.kind, ApiErrorKind::Transport);
    assert_eq!(api.url, "http://127.0.0.1:1/2.2/questions/");
}

// ============================================================================
// Write Tests
// ============================================================================

#[tokio::test]
async fn test_send_single_post() {
    let mock_server = MockServer::start().await;

    let mut body = page(json!([{"answer_id": 1, "upvoted": true}]), true);
    body["backoff"] = json!(3);
    Mock::given(method("POST"))
        .and(path("/2.2/answers/1/vote-up/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (paginator, sleeper) = paginator(&mock_server, 100);
    let result = paginator
        .send(&FetchRequest::new("answers/1/vote-up"))
        .await
        .unwrap();

    assert_eq!(result.items.len(), 1);
    assert_eq!(result.requests, 1);
    assert_eq!(result.page, 1);
    assert!(result.has_more);
    assert_eq!(result.backoff, None);
    assert_eq!(result.total, None);
    assert!(sleeper.slept.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_send_reports_auth_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2.2/answers/1/vote-up/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error_id": 401,
            "error_name": "access_token_required",
            "error_message": "no access_token was passed",
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (paginator, _) = paginator(&mock_server, 100);
    let err = paginator
        .send(&FetchRequest::new("answers/1/vote-up"))
        .await
        .unwrap_err();

    let api = err.as_api_error().unwrap();
    assert_eq!(api.error_id.code(), Some(401));
    assert_eq!(api.error_name, "access_token_required");
}

#[tokio::test]
async fn test_send_decodes_error_status_without_error_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2.2/comments/5/delete/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(page(json!([]), false)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (paginator, _) = paginator(&mock_server, 100);
    let result = paginator
        .send(&FetchRequest::new("comments/5/delete"))
        .await
        .unwrap();

    assert!(result.items.is_empty());
    assert_eq!(result.requests, 1);
    assert!(result.url.contains("/2.2/comments/5/delete/"));
}

#[tokio::test]
async fn test_send_rejects_missing_endpoint() {
    let mock_server = MockServer::start().await;
    let (paginator, _) = paginator(&mock_server, 100);

    let err = paginator.send(&FetchRequest::new("")).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));
}
