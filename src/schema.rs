//! Typed response payloads and the strict validator that produces them.
//!
//! Validation walks the untyped `serde_json::Value` once, reporting the
//! first mismatch with its JSON path. Required fields are never defaulted,
//! enum literals must match exactly, and extra fields are ignored.
//! Everything past this module works on the typed structs only.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use log::{debug, error};
use crate::error::SchemaError;
use crate::ResponseKind;

/// Deepest component tree accepted in a codegen intent
pub const MAX_COMPONENT_DEPTH: usize = 32;

// ===== Payloads =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion
{   pub component_tag: String
  , pub reason: String
  , pub example: String
  , pub recommended_props: Vec<String>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestions
{   pub suggestions: Vec<Suggestion>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiGeneration
{   pub html: String
  , pub components_used: Vec<String>
  , pub explanation: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme
{   pub css: String
  , /// Token name -> CSS color value
    pub tokens: BTreeMap<String, String>
  , pub explanation: String
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind
{   Error
  , Warning
  , Suggestion
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue
{   pub kind: IssueKind
  , pub component: String
  , pub message: String
  , pub fix: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementNote
{   pub current: String
  , pub improved: String
  , pub reason: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis
{   pub issues: Vec<Issue>
  , pub improvements: Vec<ImprovementNote>
  , /// Kept as the model wrote it, so `85` stays an integer
    pub score: Number
  , pub summary: String
}

impl Analysis
{   pub fn score_f64(&self) -> f64
    {   self.score.as_f64().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Improvement
{   pub improved: String
  , pub changes: Vec<String>
  , pub explanation: String
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentType
{   Page
  , Component
  , Layout
  , Feature
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentNode
{   pub name: String
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub props: Option<Map<String, Value>>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ComponentNode>>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSpec
{   #[serde(rename = "type")]
    pub layout_type: String
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<u32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub gap: Option<String>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<String>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub justify: Option<String>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateField
{   pub name: String
  , #[serde(rename = "type")]
    pub state_type: String
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<Value>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBinding
{   pub name: String
  , pub handler: String
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<String>>
}

/// Intent consumed by the framework code generators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodegenIntent
{   #[serde(rename = "type")]
    pub intent_type: IntentType
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>
  , pub components: Vec<ComponentNode>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutSpec>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Vec<StateField>>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<EventBinding>>
}

/// Validated response, one variant per `ResponseKind`.
/// Serializes as the bare payload object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ComponentIntent
{   Suggestions(Suggestions)
  , UiGeneration(UiGeneration)
  , Theme(Theme)
  , Analysis(Analysis)
  , Improvement(Improvement)
  , Codegen(CodegenIntent)
}

impl ComponentIntent
{   pub fn kind(&self) -> ResponseKind
    {   match self
        {   ComponentIntent::Suggestions(_) => ResponseKind::Suggestion
          , ComponentIntent::UiGeneration(_) => ResponseKind::UiGeneration
          , ComponentIntent::Theme(_) => ResponseKind::Theme
          , ComponentIntent::Analysis(_) => ResponseKind::Analysis
          , ComponentIntent::Improvement(_) => ResponseKind::Improvement
          , ComponentIntent::Codegen(_) => ResponseKind::ComponentIntent
        }
    }

    pub fn to_json(&self) -> Value
    {   // Every payload is built from owned strings, maps and numbers.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

// ===== Validator =====

/// Stateless validator: untyped JSON in, typed payload out
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator
{   pub fn validate(kind: ResponseKind, json: &Value)
      -> Result<ComponentIntent, SchemaError>
    {   debug!("Validating payload as {}", kind);
        let result = match kind
        {   ResponseKind::Suggestion => {
              Suggestions::from_json(json, "$")
                .map(ComponentIntent::Suggestions)
            }
          , ResponseKind::UiGeneration => {
              UiGeneration::from_json(json, "$")
                .map(ComponentIntent::UiGeneration)
            }
          , ResponseKind::Theme => {
              Theme::from_json(json, "$").map(ComponentIntent::Theme)
            }
          , ResponseKind::Analysis => {
              Analysis::from_json(json, "$").map(ComponentIntent::Analysis)
            }
          , ResponseKind::Improvement => {
              Improvement::from_json(json, "$")
                .map(ComponentIntent::Improvement)
            }
          , ResponseKind::ComponentIntent => {
              CodegenIntent::from_json(json, "$")
                .map(ComponentIntent::Codegen)
            }
        };
        if let Err(e) = &result
        {   error!("{} payload rejected: {}", kind, e);
        }
        result
    }

    /// Validate and unwrap a specific payload type
    pub fn validate_as<T: FromJson>(json: &Value) -> Result<T, SchemaError>
    {   T::from_json(json, "$")
    }
}

/// Strict conversion from untyped JSON at a given path
pub trait FromJson: Sized
{   fn from_json(value: &Value, path: &str) -> Result<Self, SchemaError>;
}

impl FromJson for Suggestions
{   fn from_json(value: &Value, path: &str) -> Result<Self, SchemaError>
    {   let map = object(value, path)?;
        let items_path = child(path, "suggestions");
        let items = array(required(map, "suggestions", path)?, &items_path)?;
        if items.is_empty()
        {   return Err(mismatch(&items_path, "non-empty array", "empty array"));
        }
        let suggestions = items
          .iter()
          .enumerate()
          .map(|(i, item)| Suggestion::from_json(item, &index(&items_path, i)))
          .collect::<Result<Vec<_>, _>>()?;
        Ok(Suggestions { suggestions })
    }
}

impl FromJson for Suggestion
{   fn from_json(value: &Value, path: &str) -> Result<Self, SchemaError>
    {   let map = object(value, path)?;
        Ok(Suggestion
        {   component_tag: string_field(map, "componentTag", path)?
          , reason: string_field(map, "reason", path)?
          , example: string_field(map, "example", path)?
          , recommended_props: string_list_field(map, "recommendedProps", path)?
        })
    }
}

impl FromJson for UiGeneration
{   fn from_json(value: &Value, path: &str) -> Result<Self, SchemaError>
    {   let map = object(value, path)?;
        let components_used = string_list_field(map, "componentsUsed", path)?;
        let list_path = child(path, "componentsUsed");
        for (i, tag) in components_used.iter().enumerate()
        {   if components_used[..i].contains(tag)
            {   return Err(mismatch(
                  &index(&list_path, i),
                  "unique component identifier",
                  &format!("duplicate {:?}", tag)
                ));
            }
        }
        Ok(UiGeneration
        {   html: string_field(map, "html", path)?
          , components_used
          , explanation: string_field(map, "explanation", path)?
        })
    }
}

impl FromJson for Theme
{   fn from_json(value: &Value, path: &str) -> Result<Self, SchemaError>
    {   let map = object(value, path)?;
        let tokens_path = child(path, "tokens");
        let token_map = object(required(map, "tokens", path)?, &tokens_path)?;
        let mut tokens = BTreeMap::new();
        for (name, token) in token_map
        {   tokens.insert(name.clone(), string(token, &child(&tokens_path, name))?);
        }
        Ok(Theme
        {   css: string_field(map, "css", path)?
          , tokens
          , explanation: string_field(map, "explanation", path)?
        })
    }
}

impl FromJson for IssueKind
{   fn from_json(value: &Value, path: &str) -> Result<Self, SchemaError>
    {   match string(value, path)?.as_str()
        {   "error" => Ok(IssueKind::Error)
          , "warning" => Ok(IssueKind::Warning)
          , "suggestion" => Ok(IssueKind::Suggestion)
          , other => Err(mismatch(
              path,
              "one of \"error\", \"warning\", \"suggestion\"",
              &format!("{:?}", other)
            ))
        }
    }
}

impl FromJson for Issue
{   fn from_json(value: &Value, path: &str) -> Result<Self, SchemaError>
    {   let map = object(value, path)?;
        Ok(Issue
        {   kind: IssueKind::from_json(
              required(map, "kind", path)?,
              &child(path, "kind")
            )?
          , component: string_field(map, "component", path)?
          , message: string_field(map, "message", path)?
          , fix: string_field(map, "fix", path)?
        })
    }
}

impl FromJson for ImprovementNote
{   fn from_json(value: &Value, path: &str) -> Result<Self, SchemaError>
    {   let map = object(value, path)?;
        Ok(ImprovementNote
        {   current: string_field(map, "current", path)?
          , improved: string_field(map, "improved", path)?
          , reason: string_field(map, "reason", path)?
        })
    }
}

impl FromJson for Analysis
{   fn from_json(value: &Value, path: &str) -> Result<Self, SchemaError>
    {   let map = object(value, path)?;
        let score_value = required(map, "score", path)?;
        let score = match score_value
        {   Value::Number(n) => n.clone()
          , other => return Err(
              mismatch(&child(path, "score"), "number", type_name(other))
            )
        };
        Ok(Analysis
        {   issues: list_field(map, "issues", path)?
          , improvements: list_field(map, "improvements", path)?
          , score
          , summary: string_field(map, "summary", path)?
        })
    }
}

impl FromJson for Improvement
{   fn from_json(value: &Value, path: &str) -> Result<Self, SchemaError>
    {   let map = object(value, path)?;
        Ok(Improvement
        {   improved: string_field(map, "improved", path)?
          , changes: string_list_field(map, "changes", path)?
          , explanation: string_field(map, "explanation", path)?
        })
    }
}

impl FromJson for IntentType
{   fn from_json(value: &Value, path: &str) -> Result<Self, SchemaError>
    {   match string(value, path)?.as_str()
        {   "page" => Ok(IntentType::Page)
          , "component" => Ok(IntentType::Component)
          , "layout" => Ok(IntentType::Layout)
          , "feature" => Ok(IntentType::Feature)
          , other => Err(mismatch(
              path,
              "one of \"page\", \"component\", \"layout\", \"feature\"",
              &format!("{:?}", other)
            ))
        }
    }
}

impl ComponentNode
{   fn from_json_at_depth(value: &Value, path: &str, depth: usize)
      -> Result<Self, SchemaError>
    {   if depth > MAX_COMPONENT_DEPTH
        {   return Err(mismatch(
              path,
              &format!("component tree at most {} deep", MAX_COMPONENT_DEPTH),
              "deeper nesting"
            ));
        }
        let map = object(value, path)?;
        let props = match map.get("props")
        {   Some(props) => Some(object(props, &child(path, "props"))?.clone())
          , None => None
        };
        let children = match map.get("children")
        {   Some(children) => {
              let children_path = child(path, "children");
              let nodes = array(children, &children_path)?
                .iter()
                .enumerate()
                .map(|(i, node)| {
                  ComponentNode::from_json_at_depth(
                    node,
                    &index(&children_path, i),
                    depth + 1
                  )
                })
                .collect::<Result<Vec<_>, _>>()?;
              Some(nodes)
            }
          , None => None
        };
        Ok(ComponentNode
        {   name: string_field(map, "name", path)?
          , props
          , children
          , text_content: optional_string_field(map, "textContent", path)?
        })
    }
}

impl FromJson for ComponentNode
{   fn from_json(value: &Value, path: &str) -> Result<Self, SchemaError>
    {   ComponentNode::from_json_at_depth(value, path, 1)
    }
}

impl FromJson for LayoutSpec
{   fn from_json(value: &Value, path: &str) -> Result<Self, SchemaError>
    {   let map = object(value, path)?;
        let columns = match map.get("columns")
        {   Some(columns) => {
              let columns_path = child(path, "columns");
              let n = columns
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| {
                  mismatch(&columns_path, "non-negative integer", type_name(columns))
                })?;
              Some(n)
            }
          , None => None
        };
        Ok(LayoutSpec
        {   layout_type: string_field(map, "type", path)?
          , columns
          , gap: optional_string_field(map, "gap", path)?
          , direction: optional_string_field(map, "direction", path)?
          , align: optional_string_field(map, "align", path)?
          , justify: optional_string_field(map, "justify", path)?
        })
    }
}

impl FromJson for StateField
{   fn from_json(value: &Value, path: &str) -> Result<Self, SchemaError>
    {   let map = object(value, path)?;
        Ok(StateField
        {   name: string_field(map, "name", path)?
          , state_type: string_field(map, "type", path)?
          , initial_value: map.get("initialValue").cloned()
        })
    }
}

impl FromJson for EventBinding
{   fn from_json(value: &Value, path: &str) -> Result<Self, SchemaError>
    {   let map = object(value, path)?;
        let params = match map.get("params")
        {   Some(_) => Some(string_list_field(map, "params", path)?)
          , None => None
        };
        Ok(EventBinding
        {   name: string_field(map, "name", path)?
          , handler: string_field(map, "handler", path)?
          , params
        })
    }
}

impl FromJson for CodegenIntent
{   fn from_json(value: &Value, path: &str) -> Result<Self, SchemaError>
    {   let map = object(value, path)?;
        let layout = match map.get("layout")
        {   Some(layout) => Some(LayoutSpec::from_json(layout, &child(path, "layout"))?)
          , None => None
        };
        let state = match map.get("state")
        {   Some(_) => Some(list_field(map, "state", path)?)
          , None => None
        };
        let events = match map.get("events")
        {   Some(_) => Some(list_field(map, "events", path)?)
          , None => None
        };
        Ok(CodegenIntent
        {   intent_type: IntentType::from_json(
              required(map, "type", path)?,
              &child(path, "type")
            )?
          , name: optional_string_field(map, "name", path)?
          , components: list_field(map, "components", path)?
          , layout
          , state
          , events
        })
    }
}

// ===== Field helpers =====

fn type_name(value: &Value) -> &'static str
{   match value
    {   Value::Null => "null"
      , Value::Bool(_) => "boolean"
      , Value::Number(_) => "number"
      , Value::String(_) => "string"
      , Value::Array(_) => "array"
      , Value::Object(_) => "object"
    }
}

fn mismatch(path: &str, expected: &str, found: &str) -> SchemaError
{   SchemaError
    {   path: path.to_string()
      , expected: expected.to_string()
      , found: found.to_string()
    }
}

fn child(path: &str, key: &str) -> String
{   format!("{}.{}", path, key)
}

fn index(path: &str, i: usize) -> String
{   format!("{}[{}]", path, i)
}

fn object<'a>(value: &'a Value, path: &str)
  -> Result<&'a Map<String, Value>, SchemaError>
{   value
      .as_object()
      .ok_or_else(|| mismatch(path, "object", type_name(value)))
}

fn array<'a>(value: &'a Value, path: &str)
  -> Result<&'a Vec<Value>, SchemaError>
{   value
      .as_array()
      .ok_or_else(|| mismatch(path, "array", type_name(value)))
}

fn string(value: &Value, path: &str) -> Result<String, SchemaError>
{   value
      .as_str()
      .map(str::to_string)
      .ok_or_else(|| mismatch(path, "string", type_name(value)))
}

fn required<'a>(map: &'a Map<String, Value>, key: &str, path: &str)
  -> Result<&'a Value, SchemaError>
{   map
      .get(key)
      .ok_or_else(|| mismatch(&child(path, key), "required field", "missing"))
}

fn string_field(map: &Map<String, Value>, key: &str, path: &str)
  -> Result<String, SchemaError>
{   string(required(map, key, path)?, &child(path, key))
}

fn optional_string_field(map: &Map<String, Value>, key: &str, path: &str)
  -> Result<Option<String>, SchemaError>
{   match map.get(key)
    {   Some(value) => string(value, &child(path, key)).map(Some)
      , None => Ok(None)
    }
}

fn string_list_field(map: &Map<String, Value>, key: &str, path: &str)
  -> Result<Vec<String>, SchemaError>
{   let list_path = child(path, key);
    array(required(map, key, path)?, &list_path)?
      .iter()
      .enumerate()
      .map(|(i, item)| string(item, &index(&list_path, i)))
      .collect()
}

fn list_field<T: FromJson>(map: &Map<String, Value>, key: &str, path: &str)
  -> Result<Vec<T>, SchemaError>
{   let list_path = child(path, key);
    array(required(map, key, path)?, &list_path)?
      .iter()
      .enumerate()
      .map(|(i, item)| T::from_json(item, &index(&list_path, i)))
      .collect()
}

#[cfg(test)]
mod tests
{   use super::*;
    use serde_json::json;

    fn theme_json() -> Value
    {   json!({
          "css": ":root { --primary: #000; }",
          "tokens": { "primary": "#000", "surface": "rgb(255, 255, 255)" },
          "explanation": "monochrome"
        })
    }

    #[test]
    fn test_theme_validates()
    {   let intent = SchemaValidator::validate(ResponseKind::Theme, &theme_json()).unwrap();
        let ComponentIntent::Theme(theme) = intent else
        {   panic!("expected theme");
        };
        assert_eq!(theme.tokens["primary"], "#000");
    }

    #[test]
    fn test_theme_token_must_be_string()
    {   let mut value = theme_json();
        value["tokens"]["primary"] = json!(0);
        let err = SchemaValidator::validate(ResponseKind::Theme, &value).unwrap_err();
        assert_eq!(err.path, "$.tokens.primary");
        assert_eq!(err.expected, "string");
        assert_eq!(err.found, "number");
    }

    #[test]
    fn test_bare_suggestion_array_rejected()
    {   let value = json!([{
          "componentTag": "ui-button",
          "reason": "r",
          "example": "e",
          "recommendedProps": []
        }]);
        let err = SchemaValidator::validate(ResponseKind::Suggestion, &value).unwrap_err();
        assert_eq!(err.path, "$");
        assert_eq!(err.expected, "object");
        assert_eq!(err.found, "array");
    }

    #[test]
    fn test_empty_suggestions_rejected()
    {   let err = SchemaValidator::validate(
          ResponseKind::Suggestion,
          &json!({"suggestions": []})
        ).unwrap_err();
        assert_eq!(err.path, "$.suggestions");
    }

    #[test]
    fn test_missing_field_reports_path()
    {   let value = json!({
          "suggestions": [{
            "componentTag": "ui-button",
            "reason": "r",
            "recommendedProps": ["variant"]
          }]
        });
        let err = SchemaValidator::validate(ResponseKind::Suggestion, &value).unwrap_err();
        assert_eq!(err.path, "$.suggestions[0].example");
        assert_eq!(err.found, "missing");
    }

    #[test]
    fn test_issue_kind_is_case_sensitive()
    {   let value = json!({
          "issues": [{
            "kind": "Warning",
            "component": "ui-card",
            "message": "m",
            "fix": "f"
          }],
          "improvements": [],
          "score": 70,
          "summary": "s"
        });
        let err = SchemaValidator::validate(ResponseKind::Analysis, &value).unwrap_err();
        assert_eq!(err.path, "$.issues[0].kind");
        assert_eq!(err.found, "\"Warning\"");
    }

    #[test]
    fn test_integer_score_is_kept_as_written()
    {   let value = json!({
          "issues": [],
          "improvements": [],
          "score": 85,
          "summary": "s"
        });
        let intent = SchemaValidator::validate(ResponseKind::Analysis, &value).unwrap();
        assert_eq!(intent.to_json(), value);
        match intent
        {   ComponentIntent::Analysis(analysis) => assert_eq!(analysis.score_f64(), 85.0)
          , other => panic!("unexpected intent: {:?}", other)
        }
    }

    #[test]
    fn test_analysis_score_must_be_number()
    {   let value = json!({
          "issues": [],
          "improvements": [],
          "score": "high",
          "summary": "s"
        });
        let err = SchemaValidator::validate(ResponseKind::Analysis, &value).unwrap_err();
        assert_eq!(err.path, "$.score");
        assert_eq!(err.found, "string");
    }

    #[test]
    fn test_duplicate_components_used_rejected()
    {   let value = json!({
          "html": "<ui-card></ui-card>",
          "componentsUsed": ["ui-card", "ui-card"],
          "explanation": "e"
        });
        let err = SchemaValidator::validate(ResponseKind::UiGeneration, &value).unwrap_err();
        assert_eq!(err.path, "$.componentsUsed[1]");
    }

    #[test]
    fn test_codegen_intent_tree()
    {   let value = json!({
          "type": "page",
          "name": "Login",
          "components": [{
            "name": "ui-card",
            "children": [
              { "name": "ui-input", "props": { "type": "email", "required": true } },
              { "name": "ui-button", "textContent": "Sign in" }
            ]
          }],
          "layout": { "type": "grid", "columns": 2 },
          "state": [{ "name": "email", "type": "string", "initialValue": "" }],
          "events": [{ "name": "submit", "handler": "onSubmit" }]
        });
        let intent = SchemaValidator::validate_as::<CodegenIntent>(&value).unwrap();
        assert_eq!(intent.intent_type, IntentType::Page);
        let card = &intent.components[0];
        let children = card.children.as_ref().unwrap();
        assert_eq!(children[1].text_content.as_deref(), Some("Sign in"));
        assert_eq!(children[0].props.as_ref().unwrap()["required"], true);
        assert_eq!(intent.layout.unwrap().columns, Some(2));
        assert!(intent.events.unwrap()[0].params.is_none());

        // Optional fields stay absent rather than defaulted.
        assert_eq!(serde_json::to_value(&intent.components[0].children.as_ref().unwrap()[1]).unwrap(),
          json!({ "name": "ui-button", "textContent": "Sign in" }));
    }

    #[test]
    fn test_codegen_intent_type_enum()
    {   let err = SchemaValidator::validate(
          ResponseKind::ComponentIntent,
          &json!({ "type": "Page", "components": [] })
        ).unwrap_err();
        assert_eq!(err.path, "$.type");
    }

    #[test]
    fn test_codegen_nested_child_error_path()
    {   let value = json!({
          "type": "component",
          "components": [{ "name": "ui-card", "children": [{ "props": {} }] }]
        });
        let err = SchemaValidator::validate(ResponseKind::ComponentIntent, &value).unwrap_err();
        assert_eq!(err.path, "$.components[0].children[0].name");
    }

    #[test]
    fn test_codegen_depth_limit()
    {   let mut node = json!({ "name": "leaf" });
        for _ in 0..MAX_COMPONENT_DEPTH
        {   node = json!({ "name": "wrap", "children": [node] });
        }
        let value = json!({ "type": "layout", "components": [node] });
        assert!(SchemaValidator::validate(ResponseKind::ComponentIntent, &value).is_err());
    }

    #[test]
    fn test_serializes_as_bare_payload()
    {   let intent = SchemaValidator::validate(ResponseKind::Theme, &theme_json()).unwrap();
        assert_eq!(intent.kind(), ResponseKind::Theme);
        assert_eq!(intent.to_json(), theme_json());
    }
}
