//! Line framing for streamed vendor bodies (SSE and NDJSON)

use futures::StreamExt;
use log::{debug, error, trace};
use crate::error::{ProviderError, ProviderErrorKind};
use crate::request::GenerationResult;
use super::{AdapterSettings, ChunkSender};

/// What the line handler wants next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow
{   Continue
  , /// Vendor's terminal marker seen; stop reading
    Done
}

/// Accumulates raw bytes and yields complete lines.
/// Bytes are kept until a newline so multi-byte characters split across
/// network chunks decode intact.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer
{   pending: Vec<u8>
}

impl LineBuffer
{   pub fn push(&mut self, bytes: &[u8]) -> Vec<String>
    {   self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n')
        {   let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1])
              .trim_end_matches('\r')
              .to_string();
            lines.push(line);
        }
        lines
    }

    /// Whatever is left once the body ends without a trailing newline
    pub fn finish(&mut self) -> Option<String>
    {   if self.pending.is_empty()
        {   return None;
        }
        let rest = String::from_utf8_lossy(&self.pending)
          .trim_end_matches('\r')
          .to_string();
        self.pending.clear();
        Some(rest)
    }
}

/// Payload of an SSE `data:` line, if this is one
pub(crate) fn sse_data(line: &str) -> Option<&str>
{   line.strip_prefix("data:").map(str::trim)
}

/// Feed every non-empty line of `response` to `on_line` until the body
/// ends or the handler reports `Flow::Done`. Returns whether `Done` was
/// reached.
pub(crate) async fn for_each_line<F>(
  provider: crate::Provider
, response: reqwest::Response
, mut on_line: F
) -> Result<bool, ProviderError>
where
  F: FnMut(&str) -> Result<Flow, ProviderError>
{   let mut body = response.bytes_stream();
    let mut buffer = LineBuffer::default();

    while let Some(chunk) = body.next().await
    {   let bytes = chunk.map_err(|e| {
          error!("{} stream interrupted: {}", provider, e);
          ProviderError::new(provider, ProviderErrorKind::Stream, e.to_string())
        })?;
        for line in buffer.push(&bytes)
        {   if line.trim().is_empty()
            {   continue;
            }
            trace!("{} stream line: {}", provider, line);
            if on_line(&line)? == Flow::Done
            {   debug!("{} stream finished", provider);
                return Ok(true);
            }
        }
    }

    if let Some(line) = buffer.finish()
    {   if !line.trim().is_empty() && on_line(&line)? == Flow::Done
        {   return Ok(true);
        }
    }
    debug!("{} stream closed without terminal marker", provider);
    Ok(false)
}

/// Text gathered from a stream so far
#[derive(Debug, Default)]
pub(crate) struct Accumulator
{   pub text: String
  , pub truncated: bool
  , /// Model reported by the vendor mid-stream, if any
    pub model: Option<String>
}

impl Accumulator
{   /// Append a delta and forward it to the caller's sink
    pub fn push(&mut self, delta: &str, chunks: &ChunkSender)
    {   if delta.is_empty()
        {   return;
        }
        self.text.push_str(delta);
        // A dropped receiver only means nobody is watching.
        let _ = chunks.send(delta.to_string());
    }

    pub fn finish_reason(&mut self, reason: &str)
    {   if super::is_length_stop(reason)
        {   self.truncated = true;
        }
    }

    /// `terminated` is whether the vendor's end marker was seen
    pub fn into_result(
      self
    , settings: &AdapterSettings
    , requested_model: String
    , terminated: bool
    ) -> GenerationResult
    {   settings.result(
          self.text,
          self.model.unwrap_or(requested_model),
          terminated && !self.truncated
        )
    }
}

/// Parse one streamed JSON event, normalizing failures
pub(crate) fn parse_event(provider: crate::Provider, payload: &str)
  -> Result<serde_json::Value, ProviderError>
{   serde_json::from_str(payload).map_err(|e| {
      error!("{} sent an unparseable stream event: {}", provider, e);
      ProviderError::new(
        provider,
        ProviderErrorKind::Stream,
        format!("bad stream event: {}", e)
      )
    })
}
