//! Tests for engine module

use super::*;
use crate::catalog::contacts_stream;
use crate::http::HttpClientConfig;
use crate::pagination::PageBudget;
use crate::schema::infer_schema;
use crate::state::State;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> HttpClient {
    HttpClient::with_config(HttpClientConfig::builder().no_rate_limit().build()).unwrap()
}

fn tags_stream(server: &MockServer) -> StreamDefinition {
    StreamDefinition::new(
        "tags",
        format!("{}/api/v2/tags", server.uri()),
        infer_schema(&[json!({
            "name": "volunteer",
            "modified_date": "2024-01-01T00:00:00Z",
            "_links": {"self": {"href": "u"}}
        })]),
    )
}

fn tag(name: &str, modified: &str) -> Value {
    json!({
        "name": name,
        "modified_date": modified,
        "_links": {"self": {"href": format!("https://x.org/tags/{name}")}}
    })
}

fn page(collection: &str, records: Value, next: Option<String>) -> Value {
    let mut links = json!({"self": {"href": "ignored"}});
    if let Some(next) = next {
        links["next"] = json!({"href": next});
    }
    json!({"_links": links, "_embedded": { collection: records }})
}

fn records(messages: &[Message]) -> Vec<&Value> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::Record { record, .. } => Some(record),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Message Tests
// ============================================================================

#[test]
fn test_message_kind_and_stream() {
    let record = Message::record("tags", json!({"name": "a"}));
    assert_eq!((record.kind(), record.stream()), ("RECORD", Some("tags")));

    let schema = Message::schema("forms", json!({}), None);
    assert_eq!((schema.kind(), schema.stream()), ("SCHEMA", Some("forms")));

    let state = Message::state(json!({"bookmarks": {}}));
    assert_eq!((state.kind(), state.stream()), ("STATE", None));
}

#[test]
fn test_message_singer_format() {
    let schema = Message::schema("tags", json!({"type": "object"}), Some("modified_date"));
    assert_eq!(
        schema.to_json(),
        json!({
            "type": "SCHEMA",
            "stream": "tags",
            "schema": {"type": "object"},
            "key_properties": [],
            "bookmark_properties": ["modified_date"]
        })
    );

    let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
    let record = Message::record_at("tags", json!({"name": "a"}), at);
    assert_eq!(
        record.to_json(),
        json!({
            "type": "RECORD",
            "stream": "tags",
            "record": {"name": "a"},
            "time_extracted": "2024-03-01T12:30:00Z"
        })
    );

    let state = Message::state(json!({"bookmarks": {}}));
    assert_eq!(
        state.to_json(),
        json!({"type": "STATE", "value": {"bookmarks": {}}})
    );
}

// ============================================================================
// SyncConfig / SyncStats Tests
// ============================================================================

#[test]
fn test_sync_config_builder() {
    let config = SyncConfig::new()
        .with_page_budget(PageBudget::default().with_max_pages(5))
        .with_start_date("2024-01-01T00:00:00Z")
        .with_max_records(10);

    assert_eq!(config.page_budget.max_pages, Some(5));
    assert_eq!(config.start_date.as_deref(), Some("2024-01-01T00:00:00Z"));
    assert_eq!(config.max_records, 10);
}

#[test]
fn test_sync_stats_fold_streams() {
    let mut stats = SyncStats::default();
    stats.record_stream(2, 100);
    stats.record_stream(1, 0);

    assert_eq!(
        stats,
        SyncStats {
            records_synced: 100,
            pages_fetched: 3,
            streams_synced: 2,
            elapsed: std::time::Duration::ZERO,
        }
    );
}

// ============================================================================
// Read Tests
// ============================================================================

#[tokio::test]
async fn test_full_table_stream_flattens_and_follows_next() {
    let server = MockServer::start().await;
    let next = format!("{}/api/v2/tags?page=2", server.uri());

    Mock::given(method("GET"))
        .and(path("/api/v2/tags"))
        .and(query_param_is_missing("page"))
        .and(query_param_is_missing("filter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            "osdi:tags",
            json!([tag("a", "2024-01-02T00:00:00Z")]),
            Some(next),
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/tags"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            "osdi:tags",
            json!([tag("b", "2024-01-03T00:00:00Z")]),
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = SyncEngine::new(client(), StateManager::in_memory());
    let messages = engine.sync_stream(&tags_stream(&server)).await.unwrap();

    assert_eq!(messages[0].kind(), "SCHEMA");
    assert!(messages.iter().all(|m| m.kind() != "STATE"));
    assert_eq!(
        records(&messages),
        vec![
            &json!({
                "name": "a",
                "modified_date": "2024-01-02T00:00:00Z",
                "_links.self.href": "https://x.org/tags/a"
            }),
            &json!({
                "name": "b",
                "modified_date": "2024-01-03T00:00:00Z",
                "_links.self.href": "https://x.org/tags/b"
            }),
        ]
    );
    assert_eq!(engine.stats().pages_fetched, 2);
    assert_eq!(engine.stats().records_synced, 2);
    assert_eq!(engine.stats().streams_synced, 1);
}

#[tokio::test]
async fn test_incremental_stream_filters_from_start_date() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/tags"))
        .and(query_param("filter", "modified_date gt 2024-01-01T00:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            "osdi:tags",
            json!([
                tag("a", "2024-02-01T00:00:00Z"),
                tag("b", "2024-03-01T00:00:00Z"),
                tag("c", "2024-01-15T00:00:00Z")
            ]),
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let stream = tags_stream(&server).with_replication_key("modified_date");
    let mut engine = SyncEngine::new(client(), StateManager::in_memory())
        .with_config(SyncConfig::new().with_start_date("2024-01-01T00:00:00+00:00"));
    let messages = engine.sync_stream(&stream).await.unwrap();

    assert_eq!(records(&messages).len(), 3);
    assert_eq!(
        messages[0].to_json()["bookmark_properties"],
        json!(["modified_date"])
    );

    let last = messages.last().unwrap();
    assert_eq!(
        last.to_json(),
        json!({
            "type": "STATE",
            "value": {"bookmarks": {"tags": {
                "replication_key": "modified_date",
                "replication_key_value": "2024-03-01T00:00:00Z"
            }}}
        })
    );

    let bookmark = engine.state().get_bookmark("tags").await.unwrap();
    assert_eq!(bookmark.replication_key_value, "2024-03-01T00:00:00Z");
}

#[tokio::test]
async fn test_incremental_bookmark_wins_over_start_date() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/tags"))
        .and(query_param("filter", "modified_date gt 2024-05-06T07:08:09Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            "osdi:tags",
            json!([]),
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut state = State::new();
    state.set_bookmark("tags", "modified_date", "2024-05-06T07:08:09Z");

    let stream = tags_stream(&server).with_replication_key("modified_date");
    let mut engine = SyncEngine::new(client(), StateManager::with_state(state))
        .with_config(SyncConfig::new().with_start_date("2020-01-01T00:00:00Z"));
    let messages = engine.sync_stream(&stream).await.unwrap();

    // No records, so no new bookmark and no STATE
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind(), "SCHEMA");
}

#[tokio::test]
async fn test_incremental_without_start_date_reads_everything() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/tags"))
        .and(query_param_is_missing("filter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            "osdi:tags",
            json!([tag("a", "2024-02-01T00:00:00Z")]),
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let stream = tags_stream(&server).with_replication_key("modified_date");
    let mut engine = SyncEngine::new(client(), StateManager::in_memory());
    let messages = engine.sync_stream(&stream).await.unwrap();

    assert_eq!(messages.last().map(Message::kind), Some("STATE"));
}

#[tokio::test]
async fn test_nested_schema_emits_raw_records() {
    let server = MockServer::start().await;
    let person = json!({
        "given_name": "Ada",
        "modified_date": "2024-01-02T00:00:00Z",
        "email_addresses": [{"address": "ada@example.org", "primary": true}]
    });

    Mock::given(method("GET"))
        .and(path("/api/v2/people"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            "osdi:people",
            json!([person.clone()]),
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let stream = contacts_stream(&format!("{}/api/v2/", server.uri())).unwrap();
    let mut engine = SyncEngine::new(client(), StateManager::in_memory());
    let messages = engine.sync_stream(&stream).await.unwrap();

    assert_eq!(records(&messages), vec![&person]);
    match &messages[1] {
        Message::Record { stream, .. } => assert_eq!(stream, "contacts"),
        other => panic!("expected a record, got {other:?}"),
    }
    assert_eq!(messages.last().map(Message::kind), Some("STATE"));
}

#[tokio::test]
async fn test_page_budget_is_fatal() {
    let server = MockServer::start().await;
    let self_link = format!("{}/api/v2/tags", server.uri());

    Mock::given(method("GET"))
        .and(path("/api/v2/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            "osdi:tags",
            json!([tag("a", "2024-01-02T00:00:00Z")]),
            Some(self_link),
        )))
        .expect(2)
        .mount(&server)
        .await;

    let mut engine = SyncEngine::new(client(), StateManager::in_memory()).with_config(
        SyncConfig::new().with_page_budget(PageBudget::default().with_max_pages(2)),
    );
    let err = engine.sync_stream(&tags_stream(&server)).await.unwrap_err();

    assert!(matches!(
        err,
        Error::PaginationBudgetExceeded { pages: 2, .. }
    ));
}

#[tokio::test]
async fn test_max_records_stops_early() {
    let server = MockServer::start().await;
    let next = format!("{}/api/v2/tags?page=2", server.uri());

    Mock::given(method("GET"))
        .and(path("/api/v2/tags"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            "osdi:tags",
            json!([
                tag("a", "2024-01-02T00:00:00Z"),
                tag("b", "2024-01-03T00:00:00Z"),
                tag("c", "2024-01-04T00:00:00Z")
            ]),
            Some(next),
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/tags"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            "osdi:tags",
            json!([]),
            None,
        )))
        .expect(0)
        .mount(&server)
        .await;

    let mut engine = SyncEngine::new(client(), StateManager::in_memory())
        .with_config(SyncConfig::new().with_max_records(2));
    let messages = engine.sync_stream(&tags_stream(&server)).await.unwrap();

    assert_eq!(records(&messages).len(), 2);
}

#[tokio::test]
async fn test_http_error_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/tags"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let mut engine = SyncEngine::new(client(), StateManager::in_memory());
    let err = engine.sync_stream(&tags_stream(&server)).await.unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn test_sync_streams_accumulates_stats() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            "osdi:tags",
            json!([tag("a", "2024-01-02T00:00:00Z")]),
            None,
        )))
        .mount(&server)
        .await;

    let tags = tags_stream(&server);
    let again = StreamDefinition::new("labels", tags.url.clone(), tags.schema.clone())
        .with_collection("tags");

    let mut engine = SyncEngine::new(client(), StateManager::in_memory());
    let mut messages = Vec::new();
    engine
        .sync_streams(&[&tags, &again], |msg| messages.push(msg))
        .await
        .unwrap();

    assert_eq!(messages.iter().filter(|m| m.kind() == "SCHEMA").count(), 2);
    assert_eq!(engine.stats().streams_synced, 2);
    assert_eq!(engine.stats().records_synced, 2);
}

#[tokio::test]
async fn test_failed_stream_keeps_earlier_messages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            "osdi:tags",
            json!([tag("a", "2024-01-02T00:00:00Z"), tag("b", "2024-01-03T00:00:00Z")]),
            None,
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/forms"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .mount(&server)
        .await;

    let tags = tags_stream(&server).with_replication_key("modified_date");
    let forms = StreamDefinition::new(
        "forms",
        format!("{}/api/v2/forms", server.uri()),
        tags.schema.clone(),
    );

    let mut engine = SyncEngine::new(client(), StateManager::in_memory());
    let mut emitted = Vec::new();
    let err = engine
        .sync_streams(&[&tags, &forms], |msg| emitted.push(msg))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));

    let kinds: Vec<&str> = emitted.iter().map(Message::kind).collect();
    assert_eq!(kinds, vec!["SCHEMA", "RECORD", "RECORD", "STATE", "SCHEMA"]);
    assert_eq!(records(&emitted)[1]["name"], "b");
    assert_eq!(emitted[4].stream(), Some("forms"));
    assert!(engine.state().get_bookmark("tags").await.is_some());
}
