//! End-to-end tests for the fetch → parse → merge pipeline.
//!
//! Every source is a local `wiremock` server, so these tests exercise the
//! real HTTP transport, content-type dispatch and per-request timeouts.

use std::time::Duration;

use federated_search::{
    ContentPolicy, FederatedSearch, SearchConfig, SearchError, SourceStatus,
};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JSON_ENVELOPE: &str =
    r#"{"total":5,"results":[{"id":"1","score":0.9},{"id":"2","score":0.2}]}"#;

const ATOM_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"
      xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">
  <title>Results</title>
  <opensearch:totalResults>3</opensearch:totalResults>
  <entry>
    <title>Salt &amp; Pepper</title>
    <id>urn:feed:1</id>
    <updated>2024-03-01T12:00:00Z</updated>
    <author><name>Grace</name></author>
    <link rel="alternate" href="https://b.example/1"/>
    <summary>x &lt; y</summary>
    <content type="text">&lt;score&gt;0.95&lt;/score&gt;&lt;lang&gt;en&lt;/lang&gt;</content>
  </entry>
</feed>"#;

async fn serve(server: &MockServer, route: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .mount(server)
        .await;
}

fn body(content_type: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_owned(), content_type)
}

fn url(server: &MockServer, route: &str) -> String {
    format!("{}{route}", server.uri())
}

fn score_list(results: &[federated_search::Record]) -> Vec<f64> {
    results.iter().map(|r| r.score()).collect()
}

#[tokio::test]
async fn json_and_atom_sources_merge_into_one_ranking() {
    let server = MockServer::start().await;
    serve(&server, "/json", body("application/json", JSON_ENVELOPE)).await;
    serve(&server, "/atom", body("application/xml", ATOM_FEED)).await;

    let config = SearchConfig::new([url(&server, "/json"), url(&server, "/atom")]);
    let result = federated_search::search(&config).await.expect("search");

    assert_eq!(result.total, 8);
    assert_eq!(result.results.len(), 3);
    assert_eq!(score_list(&result.results), vec![0.95, 0.9, 0.2]);
    assert_eq!(result.results[1].get("id"), Some(&json!("1")));
    assert_eq!(result.results[2].get("id"), Some(&json!("2")));

    let feed_record = &result.results[0];
    assert_eq!(feed_record.get("uri"), Some(&json!("urn:feed:1")));
    assert_eq!(feed_record.get("mtime"), Some(&json!(1_709_294_400)));
    assert!(!feed_record.contains_key("id"));
    assert!(!feed_record.contains_key("modified"));
    assert_eq!(feed_record.get("title"), Some(&json!("Salt &amp; Pepper")));
    assert_eq!(feed_record.get("summary"), Some(&json!("x &lt; y")));
    assert_eq!(feed_record.get("author"), Some(&json!("Grace")));
    assert_eq!(feed_record.get("link"), Some(&json!("https://b.example/1")));
    assert_eq!(feed_record.get("lang"), Some(&json!("en")));
}

#[tokio::test]
async fn content_type_parameters_are_ignored() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/json",
        body("application/json; charset=utf-8", JSON_ENVELOPE),
    )
    .await;
    serve(
        &server,
        "/atom",
        body("application/atom+xml; charset=utf-8", ATOM_FEED),
    )
    .await;

    let config = SearchConfig::new([url(&server, "/json"), url(&server, "/atom")]);
    let result = federated_search::search(&config).await.expect("search");
    assert_eq!(result.total, 8);
}

#[tokio::test]
async fn unsupported_content_type_fails_the_search() {
    let server = MockServer::start().await;
    serve(&server, "/json", body("application/json", JSON_ENVELOPE)).await;
    serve(&server, "/html", body("text/html", "<html><body/></html>")).await;

    let config = SearchConfig::new([url(&server, "/json"), url(&server, "/html")]);
    let err = federated_search::search(&config).await.unwrap_err();

    match err {
        SearchError::UnsupportedContentType {
            url: source,
            content_type,
        } => {
            assert!(source.ends_with("/html"));
            assert_eq!(content_type, "text/html");
        }
        other => panic!("expected unsupported content type, got {other}"),
    }
}

#[tokio::test]
async fn lenient_policy_skips_unsupported_source() {
    let server = MockServer::start().await;
    serve(&server, "/json", body("application/json", JSON_ENVELOPE)).await;
    serve(&server, "/html", body("text/html", "<html><body/></html>")).await;

    let config = SearchConfig::new([url(&server, "/html"), url(&server, "/json")])
        .with_content_policy(ContentPolicy::Lenient);
    let result = federated_search::search(&config).await.expect("search");

    assert_eq!(result.total, 5);
    assert_eq!(result.results.len(), 2);
    assert_eq!(
        result.sources[0].status,
        SourceStatus::Skipped {
            content_type: "text/html".into()
        }
    );
}

#[tokio::test]
async fn malformed_feed_contributes_nothing() {
    let server = MockServer::start().await;
    serve(&server, "/json", body("application/json", JSON_ENVELOPE)).await;
    serve(
        &server,
        "/broken",
        body("application/xml", "<feed><entry><title>cut off"),
    )
    .await;

    let config = SearchConfig::new([url(&server, "/broken"), url(&server, "/json")]);
    let result = federated_search::search(&config).await.expect("search");

    assert_eq!(result.total, 5);
    assert_eq!(result.results.len(), 2);
    assert!(matches!(
        result.sources[0].status,
        SourceStatus::ParseFailed { .. }
    ));
}

#[tokio::test]
async fn slow_source_times_out_without_blocking_others() {
    let server = MockServer::start().await;
    serve(&server, "/json", body("application/json", JSON_ENVELOPE)).await;
    serve(
        &server,
        "/slow",
        body("application/xml", ATOM_FEED).set_delay(Duration::from_secs(5)),
    )
    .await;

    let config = SearchConfig::new([url(&server, "/slow"), url(&server, "/json")])
        .with_timeout(Duration::from_millis(300));
    let started = std::time::Instant::now();
    let result = federated_search::search(&config).await.expect("search");

    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(result.total, 5);
    match &result.sources[0].status {
        SourceStatus::TransportFailed { error } => assert!(error.contains("timed out")),
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(result.sources[1].status.is_ok());
}

#[tokio::test]
async fn http_error_status_is_isolated() {
    let server = MockServer::start().await;
    serve(&server, "/json", body("application/json", JSON_ENVELOPE)).await;
    serve(&server, "/down", ResponseTemplate::new(503)).await;

    let config = SearchConfig::new([url(&server, "/json"), url(&server, "/down")]);
    let result = federated_search::search(&config).await.expect("search");

    assert_eq!(result.total, 5);
    match &result.sources[1].status {
        SourceStatus::TransportFailed { error } => {
            assert!(error.contains("503"));
            assert!(!error.contains(&server.uri()));
        }
        other => panic!("expected transport failure, got {other:?}"),
    }
}

#[tokio::test]
async fn equal_scores_follow_configuration_order_not_completion_order() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/first",
        body(
            "application/json",
            r#"{"total":2,"results":[{"id":"first-a","score":0.5},{"id":"first-b","score":0.5}]}"#,
        )
        .set_delay(Duration::from_millis(200)),
    )
    .await;
    serve(
        &server,
        "/second",
        body(
            "application/json",
            r#"{"total":1,"results":[{"id":"second-a","score":0.5}]}"#,
        ),
    )
    .await;

    let config = SearchConfig::new([url(&server, "/first"), url(&server, "/second")]);
    for _ in 0..3 {
        let result = federated_search::search(&config).await.expect("search");
        let ids: Vec<&str> = result
            .results
            .iter()
            .map(|r| r.get("id").and_then(Value::as_str).unwrap_or_default())
            .collect();
        assert_eq!(ids, vec!["first-a", "first-b", "second-a"]);
        assert!(result.sources[0].url.ends_with("/first"));
    }
}

#[tokio::test]
async fn facade_tracks_total_between_searches() {
    let server = MockServer::start().await;
    serve(&server, "/json", body("application/json", JSON_ENVELOPE)).await;
    serve(&server, "/atom", body("application/xml", ATOM_FEED)).await;

    let config = SearchConfig::new([url(&server, "/json"), url(&server, "/atom")])
        .with_fields(["title", "id", "modified"]);
    let mut search = FederatedSearch::new(config).expect("valid config");
    assert_eq!(search.total(), 0);
    assert_eq!(search.fields(), ["title", "id", "modified"]);

    let result = search.search().await.expect("search");
    assert_eq!(search.total(), 8);
    let feed_record = &result.results[0];
    assert!(feed_record.contains_key("title"));
    assert!(!feed_record.contains_key("author"));
}

#[tokio::test]
async fn empty_url_list_is_a_config_error() {
    let err = federated_search::search(&SearchConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Config(_)));
}
