//! System + user prompt construction.
//!
//! Pure string composition: same kind, text and catalog always give the
//! same prompt. Catalog entries are capped so the prompt stays bounded no
//! matter how large the catalog grows.

use serde::{Deserialize, Serialize};
use log::debug;
use crate::catalog::{CatalogEntry, ComponentCatalog};
use crate::ResponseKind;

/// A built prompt, ready for `GenerationRequest::from_prompt`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt
{   pub system: String
  , pub user: String
}

/// Caps applied to every catalog entry rendered into a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptBuilder
{   pub max_examples: usize
  , pub max_use_cases: usize
  , pub max_attributes: usize
  , /// Longer example snippets are cut at this many characters
    pub max_example_chars: usize
}

impl Default for PromptBuilder
{   fn default() -> Self
    {   PromptBuilder
        {   max_examples: 2
          , max_use_cases: 2
          , max_attributes: 8
          , max_example_chars: 300
        }
    }
}

const SUGGESTION_SHAPE: &str = r#"{
  "suggestions": [
    {
      "componentTag": "<catalog component identifier>",
      "reason": "<why it fits the request>",
      "example": "<minimal markup using the component>",
      "recommendedProps": ["<attribute name>"]
    }
  ]
}"#;

const UI_GENERATION_SHAPE: &str = r#"{
  "html": "<complete markup>",
  "componentsUsed": ["<catalog component identifier>"],
  "explanation": "<short description of the layout>"
}"#;

const THEME_SHAPE: &str = r##"{
  "css": "<CSS custom property declarations>",
  "tokens": {
    "<token-name>": "<CSS color value, e.g. #1a73e8>"
  },
  "explanation": "<short description of the palette>"
}"##;

const ANALYSIS_SHAPE: &str = r#"{
  "issues": [
    {
      "kind": "error | warning | suggestion",
      "component": "<component identifier>",
      "message": "<what is wrong>",
      "fix": "<how to fix it>"
    }
  ],
  "improvements": [
    {
      "current": "<current markup>",
      "improved": "<improved markup>",
      "reason": "<why it is better>"
    }
  ],
  "score": 0,
  "summary": "<one paragraph summary>"
}"#;

const IMPROVEMENT_SHAPE: &str = r#"{
  "improved": "<rewritten markup>",
  "changes": ["<one change per entry>"],
  "explanation": "<why these changes>"
}"#;

const COMPONENT_INTENT_SHAPE: &str = r#"{
  "type": "page | component | layout | feature",
  "name": "<PascalCase name>",
  "components": [
    {
      "name": "<component identifier>",
      "props": { "<prop>": "<value>" },
      "children": [],
      "textContent": "<optional text>"
    }
  ],
  "layout": {
    "type": "<flex | grid | stack>",
    "columns": 2,
    "gap": "<CSS length>",
    "direction": "<row | column>",
    "align": "<start | center | end>",
    "justify": "<start | center | end | between>"
  },
  "state": [
    { "name": "<identifier>", "type": "<string | number | boolean | array | object>", "initialValue": null }
  ],
  "events": [
    { "name": "<event name>", "handler": "<handler identifier>", "params": ["<param>"] }
  ]
}"#;

impl PromptBuilder
{   pub fn new() -> Self
    {   PromptBuilder::default()
    }

    /// Build the system and user prompt for one request
    pub fn build(
      &self
    , kind: ResponseKind
    , user_text: &str
    , catalog: &ComponentCatalog
    ) -> Prompt
    {   debug!(
          "Building {} prompt over {} catalog entries",
          kind,
          catalog.len()
        );

        let mut system = String::new();
        system.push_str(role_line(kind));
        system.push_str("\n\nRules:\n");
        if kind.uses_catalog()
        {   system.push_str(
              "- Use ONLY component identifiers listed in the catalog. \
               Never invent new components.\n"
            );
        }
        system.push_str(
          "- Return exactly ONE JSON object and nothing else: no prose, \
           no markdown, no comments.\n"
        );
        system.push_str(
          "- The object MUST use exactly these field names and this shape:\n"
        );
        system.push_str(shape(kind));
        system.push('\n');

        let mut user = String::new();
        if kind.uses_catalog()
        {   user.push_str("## Available components\n");
            if catalog.is_empty()
            {   user.push_str("(none)\n");
            }
            for (tag, entry) in catalog.iter()
            {   self.render_entry(&mut user, tag, entry);
            }
            user.push('\n');
        }
        user.push_str(request_heading(kind));
        user.push('\n');
        user.push_str(user_text.trim());
        user.push_str("\n\nRespond with the JSON object only.");

        Prompt { system, user }
    }

    fn render_entry(&self, out: &mut String, tag: &str, entry: &CatalogEntry)
    {   out.push_str(&format!("- {}: {}", tag, entry.description.trim()));
        if let Some(category) = &entry.category
        {   out.push_str(&format!(" [{}]", category));
        }
        out.push('\n');

        if !entry.attributes.is_empty()
        {   let attributes: Vec<&str> = entry.attributes
              .iter()
              .take(self.max_attributes)
              .map(String::as_str)
              .collect();
            out.push_str(&format!("  attributes: {}\n", attributes.join(", ")));
        }
        for use_case in entry.use_cases.iter().take(self.max_use_cases)
        {   out.push_str(&format!("  use case: {}\n", use_case.trim()));
        }
        for example in entry.examples.iter().take(self.max_examples)
        {   out.push_str(&format!(
              "  example: {}\n",
              clip(example.trim(), self.max_example_chars)
            ));
        }
    }
}

fn role_line(kind: ResponseKind) -> &'static str
{   match kind
    {   ResponseKind::Suggestion => {
          "You are a UI component expert. Recommend the catalog components \
           that best fit the user's request."
        }
      , ResponseKind::UiGeneration => {
          "You are a UI developer. Build the requested interface as HTML \
           markup composed from catalog components."
        }
      , ResponseKind::Theme => {
          "You are a design-system specialist. Produce a color theme as CSS \
           custom properties and matching design tokens."
        }
      , ResponseKind::Analysis => {
          "You are a UI reviewer. Analyze the given markup for misuse of \
           catalog components, accessibility problems and layout issues. \
           Score it from 0 to 100."
        }
      , ResponseKind::Improvement => {
          "You are a UI developer. Rewrite the given markup so it uses \
           catalog components correctly and reads better."
        }
      , ResponseKind::ComponentIntent => {
          "You are a front-end architect. Describe the requested UI as a \
           structured component intent that code generators can consume."
        }
    }
}

fn request_heading(kind: ResponseKind) -> &'static str
{   match kind
    {   ResponseKind::Analysis => "## Markup to analyze"
      , ResponseKind::Improvement => "## Markup to improve"
      , _ => "## Request"
    }
}

fn shape(kind: ResponseKind) -> &'static str
{   match kind
    {   ResponseKind::Suggestion => SUGGESTION_SHAPE
      , ResponseKind::UiGeneration => UI_GENERATION_SHAPE
      , ResponseKind::Theme => THEME_SHAPE
      , ResponseKind::Analysis => ANALYSIS_SHAPE
      , ResponseKind::Improvement => IMPROVEMENT_SHAPE
      , ResponseKind::ComponentIntent => COMPONENT_INTENT_SHAPE
    }
}

fn clip(text: &str, max_chars: usize) -> String
{   if text.chars().count() <= max_chars
    {   return text.to_string();
    }
    let mut clipped: String = text.chars().take(max_chars).collect();
    clipped.push('…');
    clipped
}
