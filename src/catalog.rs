//! Component catalog: what the model is allowed to build with.
//!
//! Supplied by the caller and only ever read here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One catalog component
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry
{   pub description: String
  , /// Attribute / prop names the component accepts
    #[serde(default)]
    pub attributes: Vec<String>
  , /// Markup snippets showing the component in use
    #[serde(default)]
    pub examples: Vec<String>
  , #[serde(default)]
    pub use_cases: Vec<String>
  , #[serde(default)]
    pub category: Option<String>
}

impl CatalogEntry
{   pub fn new(description: impl Into<String>) -> Self
    {   CatalogEntry
        {   description: description.into()
          , ..CatalogEntry::default()
        }
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
      I: IntoIterator<Item = S>,
      S: Into<String>
    {   self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_examples<I, S>(mut self, examples: I) -> Self
    where
      I: IntoIterator<Item = S>,
      S: Into<String>
    {   self.examples = examples.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_use_cases<I, S>(mut self, use_cases: I) -> Self
    where
      I: IntoIterator<Item = S>,
      S: Into<String>
    {   self.use_cases = use_cases.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self
    {   self.category = Some(category.into());
        self
    }
}

/// Component identifier -> entry, iterated in identifier order so
/// prompts built from the same catalog are byte-identical.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentCatalog
{   entries: BTreeMap<String, CatalogEntry>
}

impl ComponentCatalog
{   pub fn new() -> Self
    {   ComponentCatalog::default()
    }

    pub fn with_entry(
      mut self
    , tag: impl Into<String>
    , entry: CatalogEntry
    ) -> Self
    {   self.insert(tag, entry);
        self
    }

    pub fn insert(&mut self, tag: impl Into<String>, entry: CatalogEntry)
    {   self.entries.insert(tag.into(), entry);
    }

    pub fn get(&self, tag: &str) -> Option<&CatalogEntry>
    {   self.entries.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool
    {   self.entries.contains_key(tag)
    }

    pub fn len(&self) -> usize
    {   self.entries.len()
    }

    pub fn is_empty(&self) -> bool
    {   self.entries.is_empty()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str>
    {   self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CatalogEntry)>
    {   self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn from_json_str(json: &str)
      -> Result<Self, crate::error::ConfigError>
    {   serde_json::from_str(json).map_err(|e| {
          crate::error::ConfigError::InvalidOption(
            format!("bad component catalog: {}", e)
          )
        })
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn test_catalog_loads_from_json_map()
    {   let catalog = ComponentCatalog::from_json_str(r#"{
          "ui-button": {
            "description": "A button",
            "attributes": ["variant"],
            "useCases": ["Submit forms"],
            "category": "actions"
          },
          "ui-card": {"description": "A card"}
        }"#).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.tags().collect::<Vec<_>>(), vec!["ui-button", "ui-card"]);
        let button = catalog.get("ui-button").unwrap();
        assert_eq!(button.use_cases, vec!["Submit forms".to_string()]);
        assert!(catalog.get("ui-card").unwrap().examples.is_empty());
    }
}
