//! Helpers shared by the mock-server test suites
#![allow(dead_code)]

use serde_json::Value;
use tokio::sync::mpsc;
use uikit_ai::ProviderConfig;
use wiremock::MockServer;

/// Surface crate logs with `RUST_LOG=debug cargo test`
pub fn init_logging()
{   let _ = env_logger::builder().is_test(true).try_init();
}

/// Adapter config aimed at the mock server
pub fn mock_config(server: &MockServer) -> ProviderConfig
{   ProviderConfig::new("test-key")
      .with_api_base(server.uri())
      .with_timeout_secs(5)
}

/// Server-sent events body, one `data:` frame per payload
pub fn sse(payloads: &[String]) -> String
{   payloads
      .iter()
      .map(|p| format!("data: {}\n\n", p))
      .collect()
}

/// Newline-delimited JSON body
pub fn ndjson(events: &[Value]) -> String
{   events
      .iter()
      .map(|e| format!("{}\n", e))
      .collect()
}

/// Drain whatever the adapter pushed into the channel
pub fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String>
{   let mut chunks = Vec::new();
    while let Ok(chunk) = rx.try_recv()
    {   chunks.push(chunk);
    }
    chunks
}

/// Body of the only request the server received
pub async fn sent_body(server: &MockServer) -> Value
{   let requests = server
      .received_requests()
      .await
      .expect("request recording is on by default");
    assert_eq!(requests.len(), 1, "expected exactly one request");
    serde_json::from_slice(&requests[0].body).expect("request body is JSON")
}
