//! generate -> extract -> validate, end to end against a mock vendor

mod common;

use std::sync::Arc;
use common::{drain, init_logging, mock_config, sse};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_test::{assert_err, assert_ok};
use uikit_ai::schema::IntentType;
use uikit_ai::{
  AssistantClient, AssistantConfig, CatalogEntry, ComponentCatalog,
  ComponentIntent, Error, ResponseExtractor, ResponseKind, RetryPolicy,
  SchemaValidator, ServiceFactory
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn catalog() -> Arc<ComponentCatalog>
{   Arc::new(ComponentCatalog::new()
      .with_entry(
        "ui-button",
        CatalogEntry::new("Clickable button")
          .with_attributes(["variant", "size"])
          .with_examples(["<ui-button variant=\"primary\">Save</ui-button>"])
      )
      .with_entry(
        "ui-card",
        CatalogEntry::new("Content container").with_category("layout")
      ))
}

fn chat_completion(content: &str) -> Value
{   json!({
      "model": "gpt-4o-mini-2024-07-18",
      "choices": [{
        "message": { "role": "assistant", "content": content },
        "finish_reason": "stop"
      }]
    })
}

async fn client_for(server: &MockServer) -> AssistantClient
{   let adapter = ServiceFactory::resolve("openai", mock_config(server)).unwrap();
    AssistantClient::new(adapter, catalog())
      .with_retry_policy(RetryPolicy::new(2, 1, 2))
}

/// One valid payload per response kind
fn valid_payloads() -> Vec<(ResponseKind, Value)>
{   vec![
      (ResponseKind::Suggestion, json!({
        "suggestions": [{
          "componentTag": "ui-button",
          "reason": "Primary action",
          "example": "<ui-button>Go</ui-button>",
          "recommendedProps": ["variant"]
        }]
      }))
    , (ResponseKind::UiGeneration, json!({
        "html": "<ui-card><ui-button>Save</ui-button></ui-card>",
        "componentsUsed": ["ui-card", "ui-button"],
        "explanation": "A card with a save button"
      }))
    , (ResponseKind::Theme, json!({
        "css": ":root { --primary: #0af; }",
        "tokens": { "primary": "#0af", "surface": "#fff" },
        "explanation": "Cool blues"
      }))
    , (ResponseKind::Analysis, json!({
        "issues": [{
          "kind": "warning",
          "component": "ui-button",
          "message": "Missing label",
          "fix": "Add text content"
        }],
        "improvements": [{
          "current": "<ui-button></ui-button>",
          "improved": "<ui-button>Save</ui-button>",
          "reason": "Accessible name"
        }],
        "score": 85,
        "summary": "Mostly fine"
      }))
    , (ResponseKind::Improvement, json!({
        "improved": "<ui-button>Save</ui-button>",
        "changes": ["Added label"],
        "explanation": "Buttons need text"
      }))
    , (ResponseKind::ComponentIntent, json!({
        "type": "page",
        "name": "Settings",
        "components": [{
          "name": "ui-card",
          "props": { "elevated": true },
          "children": [{ "name": "ui-button", "textContent": "Save" }]
        }],
        "layout": { "type": "grid", "columns": 2, "gap": "1rem" },
        "state": [{ "name": "saving", "type": "boolean", "initialValue": false }],
        "events": [{ "name": "click", "handler": "onSave", "params": ["event"] }]
      }))
    ]
}

#[test]
fn test_every_kind_round_trips_through_extract_and_validate()
{   for (kind, payload) in valid_payloads()
    {   let raw = format!("Sure!\n```json\n{}\n```", serde_json::to_string_pretty(&payload).unwrap());
        let extracted = assert_ok!(ResponseExtractor::extract(&raw));
        let intent = assert_ok!(SchemaValidator::validate(kind, &extracted));
        assert_eq!(intent.kind(), kind);
        assert_eq!(intent.to_json(), payload, "{} did not round-trip", kind);
    }
}

#[tokio::test]
async fn test_every_kind_through_mock_vendor()
{   init_logging();
    for (kind, payload) in valid_payloads()
    {   let server = MockServer::start().await;
        let content = format!("Here you go: {}", payload);
        Mock::given(method("POST"))
          .and(path("/chat/completions"))
          .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(&content)))
          .expect(1)
          .mount(&server)
          .await;

        let client = client_for(&server).await;
        let generated = assert_ok!(client.run(kind, "settings page").await);
        assert_eq!(generated.intent.to_json(), payload);
        assert_eq!(generated.model, "gpt-4o-mini-2024-07-18");
        assert!(generated.is_complete);
    }
}

#[tokio::test]
async fn test_typed_conveniences()
{   let server = MockServer::start().await;
    let (_, payload) = valid_payloads().remove(5);
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(chat_completion(&payload.to_string()))
      )
      .mount(&server)
      .await;

    let client = client_for(&server).await;
    let intent = assert_ok!(client.generate_intent("settings page").await);
    assert_eq!(intent.intent_type, IntentType::Page);
    assert_eq!(intent.components[0].children.as_ref().unwrap()[0].name, "ui-button");
}

#[tokio::test]
async fn test_catalog_reaches_the_prompt()
{   let server = MockServer::start().await;
    let (_, payload) = valid_payloads().remove(0);
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(chat_completion(&payload.to_string()))
      )
      .mount(&server)
      .await;

    let client = client_for(&server).await;
    let suggestions = assert_ok!(client.suggest("a form with a submit action").await);
    assert_eq!(suggestions.suggestions[0].component_tag, "ui-button");

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let user = body["messages"][1]["content"].as_str().unwrap();
    assert!(user.contains("ui-button"));
    assert!(user.contains("ui-card"));
    assert!(user.contains("a form with a submit action"));
}

#[tokio::test]
async fn test_unparseable_answer_is_retried_with_a_fresh_generation()
{   init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(chat_completion("I cannot help with that request."))
      )
      .up_to_n_times(1)
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(
        r##"{"css":"body{}","tokens":{"primary":"#000"},"explanation":"ok"}"##
      )))
      .expect(1)
      .mount(&server)
      .await;

    let client = client_for(&server).await;
    let theme = assert_ok!(client.generate_theme("monochrome").await);
    assert_eq!(theme.tokens["primary"], "#000");
}

#[tokio::test]
async fn test_server_errors_are_retried_until_exhausted()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
      .expect(3)
      .mount(&server)
      .await;

    let client = client_for(&server).await;
    let err = assert_err!(client.run(ResponseKind::Theme, "x").await);
    match err
    {   Error::Provider(e) => assert_eq!(e.status, Some(502)),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_auth_failure_fails_fast()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .respond_with(ResponseTemplate::new(401).set_body_json(json!({
        "error": { "message": "Incorrect API key provided" }
      })))
      .expect(1)
      .mount(&server)
      .await;

    let client = client_for(&server).await;
    let response = client.respond(ResponseKind::Theme, "x").await;
    assert!(!response.success);
    let error = response.error.unwrap();
    assert_eq!(error.code, "provider_error");
    assert_eq!(error.status, Some(401));
    assert!(error.message.contains("Incorrect API key provided"));
}

#[tokio::test]
async fn test_schema_mismatch_surfaces_after_retries()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(
        r#"{"suggestions": {"componentTag": "ui-button"}}"#
      )))
      .expect(3)
      .mount(&server)
      .await;

    let client = client_for(&server).await;
    let response = client.respond(ResponseKind::Suggestion, "x").await;
    assert!(!response.success);
    let error = response.error.unwrap();
    assert_eq!(error.code, "schema_error");
    assert!(error.message.contains("$.suggestions"));
}

#[tokio::test]
async fn test_streaming_pipeline_forwards_chunks()
{   let server = MockServer::start().await;
    let body = sse(&[
      json!({ "choices": [{ "delta": { "content": "```json\n{\"improved\":\"<b>x</b>\"," }, "finish_reason": null }] }).to_string()
    , json!({ "choices": [{ "delta": { "content": "\"changes\":[],\"explanation\":\"bold\"}\n```" }, "finish_reason": "stop" }] }).to_string()
    , "[DONE]".to_string()
    ]);
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
      .mount(&server)
      .await;

    let client = client_for(&server).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let generated = assert_ok!(
      client.run_streaming(ResponseKind::Improvement, "<b>x</b>", tx).await
    );
    assert_eq!(drain(&mut rx).len(), 2);
    match generated.intent
    {   ComponentIntent::Improvement(improvement) => {
          assert_eq!(improvement.improved, "<b>x</b>");
          assert!(improvement.changes.is_empty());
        }
      , other => panic!("unexpected intent: {:?}", other)
    }
    assert!(generated.is_complete);
}

#[tokio::test]
async fn test_client_from_json_config()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/generate"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "model": "llama3",
        "response": "{\"improved\":\"a\",\"changes\":[\"b\"],\"explanation\":\"c\"}",
        "done": true
      })))
      .expect(1)
      .mount(&server)
      .await;

    let config = AssistantConfig::from_json_str(&format!(
      r#"{{
        "provider": "ollama",
        "provider_config": {{ "api_base": "{}" }},
        "retry": {{ "max_retries": 0 }}
      }}"#,
      server.uri()
    )).unwrap();
    let client = AssistantClient::from_config(&config, catalog()).unwrap();
    let response = client.respond(ResponseKind::Improvement, "a").await;
    assert!(response.success);
    assert_eq!(response.model.as_deref(), Some("llama3"));
    assert_eq!(response.data.unwrap()["changes"], json!(["b"]));
}
