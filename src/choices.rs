//! Choice lists for radio and multi-select fields.
//!
//! Tokens are opaque strings, usually composite `"id - label"` values. The
//! core never interprets them beyond [`crate::render::id_portion`].

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::persist::read_json;

/// Supplies the selectable tokens for a field, optionally narrowed by type.
pub trait ChoiceProvider {
    fn choices(&self, field_key: &str, type_filter: Option<&str>) -> Vec<String>;
}

/// One selectable token with an optional type tag (element, rarity, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub token: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// In-memory provider: field key → tokens in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticChoices {
    fields: IndexMap<String, Vec<Choice>>,
}

impl StaticChoices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, AppError> {
        serde_json::from_str(json).map_err(|e| AppError::CatalogError {
            message: format!("Invalid choice data: {e}"),
        })
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        Ok(read_json(path)?)
    }

    pub fn insert(&mut self, field_key: &str, token: impl Into<String>, kind: Option<&str>) {
        self.fields
            .entry(field_key.to_string())
            .or_default()
            .push(Choice {
                token: token.into(),
                kind: kind.map(str::to_string),
            });
    }

    /// Distinct type tags for a field, in first-seen order.
    pub fn types(&self, field_key: &str) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for kind in self
            .fields
            .get(field_key)
            .into_iter()
            .flatten()
            .filter_map(|c| c.kind.as_deref())
        {
            if !out.contains(&kind) {
                out.push(kind);
            }
        }
        out
    }

    /// Case-insensitive substring search within a field's (filtered) choices.
    pub fn search(&self, field_key: &str, type_filter: Option<&str>, query: &str) -> Vec<String> {
        let needle = query.to_lowercase();
        self.choices(field_key, type_filter)
            .into_iter()
            .filter(|t| t.to_lowercase().contains(&needle))
            .collect()
    }
}

impl ChoiceProvider for StaticChoices {
    fn choices(&self, field_key: &str, type_filter: Option<&str>) -> Vec<String> {
        let filter = type_filter.filter(|f| !f.is_empty());
        self.fields
            .get(field_key)
            .into_iter()
            .flatten()
            .filter(|c| filter.map_or(true, |f| c.kind.as_deref() == Some(f)))
            .map(|c| c.token.clone())
            .collect()
    }
}
