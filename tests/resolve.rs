//! End-to-end resolution tests against a wiremock registry + store.
//!
//! These tests verify:
//! - Stage priority (version input > actor input > store page > example)
//! - That higher-priority hits skip the store origin entirely
//! - Soft-failure fallthrough and the canonical empty result
//! - The fatal metadata-fetch error path
//! - Idempotence of repeated resolutions

use apify_schema::{ActorRef, Client, Config, Error, Schema};
use serde_json::{json, Value};
use wiremock::matchers::{header, headers, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ACTOR: &str = "crawlbot~page-snapshotter";
const TOKEN: &str = "apify_api_test_token";

/// Client pointing both the registry and the store at the mock server.
fn client_for_server(server: &MockServer) -> Client {
    Client::new(Config {
        token: Some(TOKEN.into()),
        base_url: Some(server.uri()),
        docs_base_url: Some(server.uri()),
        ..Default::default()
    })
    .expect("client creation should succeed")
}

fn actor_ref() -> ActorRef {
    ActorRef::from(ACTOR)
}

fn metadata_body(extra: Value) -> Value {
    let mut data = json!({
        "id": "S2Fmk9PgiAq6zpPcR",
        "username": "crawlbot",
        "name": "page-snapshotter",
        "title": "Page Snapshotter",
        "latestVersionNumber": "0.4"
    });
    if let (Some(base), Some(extra)) = (data.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }
    json!({"data": data})
}

async fn mount_metadata(server: &MockServer, extra: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/acts/{ACTOR}")))
        .and(header("authorization", format!("Bearer {TOKEN}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(metadata_body(extra)))
        .mount(server)
        .await;
}

async fn mount_version(server: &MockServer, input: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/acts/{ACTOR}/versions/0.4")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"versionNumber": "0.4", "input": input}
        })))
        .mount(server)
        .await;
}

/// Mock asserting the store documentation page is never fetched.
async fn mount_docs_never(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/crawlbot/page-snapshotter/input-schema"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(0)
        .mount(server)
        .await;
}

async fn mount_docs(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/crawlbot/page-snapshotter/input-schema"))
        // wiremock's header matcher splits incoming values on commas, so the
        // browser UA (which contains "KHTML, like Gecko") must be matched as
        // its comma-separated segments.
        .and(headers(
            "user-agent",
            vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML",
                "like Gecko) Chrome/120.0.0.0 Safari/537.36",
            ],
        ))
        .respond_with(template)
        .mount(server)
        .await;
}

fn schema_value(schema: &Schema) -> Value {
    serde_json::to_value(schema).expect("schema serializes")
}

#[tokio::test]
async fn version_input_wins_without_touching_the_store() {
    let server = MockServer::start().await;
    let version_input = json!({
        "properties": {"startUrls": {"type": "array"}},
        "required": ["startUrls"]
    });

    // Top-level input also present; the version record must still win.
    mount_metadata(&server, json!({"input": {"fromMetadata": true}})).await;
    mount_version(&server, version_input.clone()).await;
    mount_docs_never(&server).await;

    let client = client_for_server(&server);
    let schema = client
        .actors()
        .input_schema(&actor_ref())
        .await
        .expect("resolution should succeed");
    assert_eq!(schema_value(&schema), version_input);
}

#[tokio::test]
async fn metadata_input_used_when_version_input_is_empty() {
    let server = MockServer::start().await;

    mount_metadata(&server, json!({"input": {"properties": {"query": {"type": "string"}}}}))
        .await;
    mount_version(&server, json!({})).await;
    mount_docs_never(&server).await;

    let client = client_for_server(&server);
    let schema = client
        .actors()
        .input_schema(&actor_ref())
        .await
        .expect("resolution should succeed");
    assert_eq!(
        schema_value(&schema),
        json!({"properties": {"query": {"type": "string"}}})
    );
}

#[tokio::test]
async fn version_fetch_failure_is_soft_and_falls_back() {
    let server = MockServer::start().await;

    mount_metadata(&server, json!({"input": {"properties": {}, "required": []}})).await;
    Mock::given(method("GET"))
        .and(path(format!("/acts/{ACTOR}/versions/0.4")))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    mount_docs_never(&server).await;

    let client = client_for_server(&server);
    let schema = client
        .actors()
        .input_schema(&actor_ref())
        .await
        .expect("resolution should succeed");
    assert_eq!(
        schema_value(&schema),
        json!({"properties": {}, "required": []})
    );
}

#[tokio::test]
async fn store_page_json_body_is_used_when_registry_has_nothing() {
    let server = MockServer::start().await;
    let page_schema = json!({"properties": {"url": {"type": "string"}}, "required": ["url"]});

    mount_metadata(&server, json!({})).await;
    mount_version(&server, json!({})).await;
    // Raw JSON with a misleading content type; the body must be sniffed.
    mount_docs(
        &server,
        ResponseTemplate::new(200).set_body_raw(page_schema.to_string(), "text/html"),
    )
    .await;

    let client = client_for_server(&server);
    let schema = client
        .actors()
        .input_schema(&actor_ref())
        .await
        .expect("resolution should succeed");
    assert_eq!(schema_value(&schema), page_schema);
}

#[tokio::test]
async fn store_page_html_code_block_is_scraped() {
    let server = MockServer::start().await;
    let html = r#"<!DOCTYPE html><html><body>
        <div data-test-id="input-schema-content">
            <pre>{"properties": {"depth": {"type": "integer"}}}</pre>
        </div>
    </body></html>"#;

    mount_metadata(&server, json!({})).await;
    mount_version(&server, json!({})).await;
    mount_docs(
        &server,
        ResponseTemplate::new(200).set_body_raw(html, "text/html; charset=utf-8"),
    )
    .await;

    let client = client_for_server(&server);
    let schema = client
        .actors()
        .input_schema(&actor_ref())
        .await
        .expect("resolution should succeed");
    assert_eq!(
        schema_value(&schema),
        json!({"properties": {"depth": {"type": "integer"}}})
    );
}

#[tokio::test]
async fn store_page_heading_reference_is_synthesized() {
    let server = MockServer::start().await;
    let html = r#"<!DOCTYPE html><html><body>
        <div data-test-id="input-schema-content">
            <h2 id="url">Start URL</h2>
            <p><span class="InputSchemaProperty-type">string</span></p>
            <div>The page the actor opens first.</div>
            <h2 id="maxItems">Max items</h2>
            <p><span class="InputSchemaProperty-type">integer</span><span>Optional</span></p>
            <div>Stop after this many results.</div>
        </div>
    </body></html>"#;

    mount_metadata(&server, json!({})).await;
    mount_version(&server, json!({})).await;
    mount_docs(
        &server,
        ResponseTemplate::new(200).set_body_raw(html, "text/html"),
    )
    .await;

    let client = client_for_server(&server);
    let schema = client
        .actors()
        .input_schema(&actor_ref())
        .await
        .expect("resolution should succeed");
    assert_eq!(
        schema_value(&schema),
        json!({
            "properties": {
                "maxItems": {"type": "integer", "description": "Stop after this many results."},
                "url": {"type": "string", "description": "The page the actor opens first."}
            },
            "required": ["url"]
        })
    );
}

#[tokio::test]
async fn example_payload_is_the_last_fallback() {
    let server = MockServer::start().await;

    mount_metadata(
        &server,
        json!({"exampleRunInput": {
            "body": "{\"startUrls\": [\"https://example.com\"], \"maxDepth\": 1}",
            "contentType": "application/json; charset=utf-8"
        }}),
    )
    .await;
    mount_version(&server, json!({})).await;
    mount_docs(&server, ResponseTemplate::new(404).set_body_string("Not found")).await;

    let client = client_for_server(&server);
    let schema = client
        .actors()
        .input_schema(&actor_ref())
        .await
        .expect("resolution should succeed");
    assert_eq!(
        schema_value(&schema),
        json!({"startUrls": ["https://example.com"], "maxDepth": 1})
    );
}

#[tokio::test]
async fn exhausting_every_stage_returns_the_empty_object() {
    let server = MockServer::start().await;

    mount_metadata(&server, json!({})).await;
    mount_version(&server, json!({})).await;
    mount_docs(&server, ResponseTemplate::new(404).set_body_string("Not found")).await;

    let client = client_for_server(&server);
    let schema = client
        .actors()
        .input_schema(&actor_ref())
        .await
        .expect("an exhausted pipeline is not an error");
    assert!(schema.is_empty());
    assert_eq!(schema_value(&schema), json!({}));
}

#[tokio::test]
async fn metadata_fetch_failure_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/acts/{ACTOR}")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"type": "token-not-found", "message": "API token not found"}
        })))
        .mount(&server)
        .await;
    // No later stage may run after a fatal metadata failure.
    mount_docs_never(&server).await;

    let client = client_for_server(&server);
    let err = client
        .actors()
        .input_schema(&actor_ref())
        .await
        .expect_err("a 401 on metadata must abort resolution");
    match err {
        Error::Api(api) => {
            assert_eq!(api.status, 401);
            assert_eq!(api.code.as_deref(), Some("token-not-found"));
            assert_eq!(api.message, "API token not found");
        }
        other => panic!("expected APIError, got {other:?}"),
    }
}

#[tokio::test]
async fn store_timeout_is_a_soft_failure() {
    let server = MockServer::start().await;

    mount_metadata(
        &server,
        json!({"exampleRunInput": {"body": "{\"q\": \"news\"}"}}),
    )
    .await;
    mount_version(&server, json!({})).await;
    mount_docs(
        &server,
        ResponseTemplate::new(200)
            .set_body_string("{}")
            .set_delay(std::time::Duration::from_secs(5)),
    )
    .await;

    let client = Client::new(Config {
        token: Some(TOKEN.into()),
        base_url: Some(server.uri()),
        docs_base_url: Some(server.uri()),
        timeout: Some(std::time::Duration::from_millis(200)),
        ..Default::default()
    })
    .expect("client creation should succeed");

    let schema = client
        .actors()
        .input_schema(&actor_ref())
        .await
        .expect("a store timeout must not fail the resolution");
    assert_eq!(schema_value(&schema), json!({"q": "news"}));
}

#[tokio::test]
async fn resolution_is_idempotent() {
    let server = MockServer::start().await;
    let version_input = json!({"properties": {"startUrls": {"type": "array"}}});

    mount_metadata(&server, json!({})).await;
    mount_version(&server, version_input).await;

    let client = client_for_server(&server);
    let first = client.actors().input_schema(&actor_ref()).await.unwrap();
    let second = client.actors().input_schema(&actor_ref()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn list_unwraps_the_paginated_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/acts"))
        .and(header("authorization", format!("Bearer {TOKEN}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "total": 2,
                "items": [
                    {"id": "a1", "username": "crawlbot", "name": "page-snapshotter"},
                    {"id": "a2", "username": "crawlbot", "name": "sitemap-walker"}
                ]
            }
        })))
        .mount(&server)
        .await;

    let client = client_for_server(&server);
    let actors = client.actors().list().await.expect("list should succeed");
    assert_eq!(actors.len(), 2);
    assert_eq!(actors[1].name, "sitemap-walker");
}
