//! Pull the JSON object out of raw model output.
//!
//! Models wrap their answer in prose, markdown fences or preambles no matter
//! what the prompt says, so three strategies are tried in order and the
//! first one that parses wins:
//!
//! 1. a fenced code block (optionally tagged `json`) holding `{...}`
//! 2. the widest `{ ... }` span in the text
//! 3. `{...}` following a `response:` / `answer:` / `json:` label

use std::sync::LazyLock;
use regex::Regex;
use serde_json::Value;
use log::{debug, error, trace};
use crate::error::ExtractionError;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?s)```(?i:json)?[ \t]*\r?\n?\s*(\{.*?\})\s*```")
    .expect("valid fenced block regex")
});

static GREEDY_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?s)\{.*\}").expect("valid object regex")
});

static LABELLED_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?is)(?:response|answer|json)\s*:\s*(\{.*\})")
    .expect("valid label regex")
});

/// Which strategy located the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy
{   FencedBlock
  , GreedyObject
  , LabelledObject
}

/// Stateless extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseExtractor;

impl ResponseExtractor
{   /// Locate and parse the embedded JSON object
    pub fn extract(raw: &str) -> Result<Value, ExtractionError>
    {   ResponseExtractor::extract_with_strategy(raw).map(|(value, _)| value)
    }

    /// Like `extract`, also reporting which strategy succeeded
    pub fn extract_with_strategy(raw: &str)
      -> Result<(Value, Strategy), ExtractionError>
    {   debug!("Extracting JSON from {} chars of model output", raw.len());

        let strategies: [(Strategy, &Regex); 3] = [
          (Strategy::FencedBlock, &*FENCED_BLOCK)
        , (Strategy::GreedyObject, &*GREEDY_OBJECT)
        , (Strategy::LabelledObject, &*LABELLED_OBJECT)
        ];

        for (strategy, pattern) in strategies
        {   let candidate = match pattern.captures(raw)
            {   Some(caps) => caps
                  .get(1)
                  .or_else(|| caps.get(0))
                  .map(|m| m.as_str())
              , None => None
            };
            let Some(candidate) = candidate else
            {   trace!("{:?}: no candidate", strategy);
                continue;
            };

            match serde_json::from_str::<Value>(candidate)
            {   Ok(value) if value.is_object() => {
                  debug!("{:?} matched", strategy);
                  return Ok((value, strategy));
                }
              , Ok(_) => {
                  trace!("{:?}: candidate is not an object", strategy);
                }
              , Err(e) => {
                  trace!("{:?}: candidate failed to parse: {}", strategy, e);
                }
            }
        }

        let err = ExtractionError::from_raw(raw);
        error!("No JSON object found; preview: {:?}", err.preview);
        Err(err)
    }
}
