// SPDX-License-Identifier: MIT OR Apache-2.0
//! Declarative documents describing a sequence tree.
//!
//! A [`Preferences`] node carries the type identifier of the item it
//! describes, its scalar attributes, named sub-documents (`shape`,
//! `modulation`, `context`) and the ordered documents of its children.
//! Documents are stored as RON or JSON.

use crate::builder::BuildError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// A document describing one item and its children
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Registry identifier of the described type
    pub item_id: String,
    /// Scalar attributes
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, Value>,
    /// Named sub-documents
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub components: IndexMap<String, Preferences>,
    /// Child documents in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Preferences>,
}

impl Preferences {
    /// Create an empty document for the given type
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            ..Default::default()
        }
    }

    /// Set an attribute, returning the document
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Set an attribute
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Set a name -> number mapping attribute
    pub fn set_f64_map(&mut self, key: impl Into<String>, map: &IndexMap<String, f64>) {
        let object = map
            .iter()
            .map(|(name, value)| (name.clone(), Value::from(*value)))
            .collect();
        self.attributes.insert(key.into(), Value::Object(object));
    }

    /// Set a name -> string mapping attribute
    pub fn set_string_map(&mut self, key: impl Into<String>, map: &IndexMap<String, String>) {
        let object = map
            .iter()
            .map(|(name, value)| (name.clone(), Value::from(value.as_str())))
            .collect();
        self.attributes.insert(key.into(), Value::Object(object));
    }

    /// Get a raw attribute
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Read an optional string attribute
    pub fn str_attr(&self, key: &str) -> Result<Option<&str>, BuildError> {
        match self.attributes.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.as_str())),
            Some(_) => Err(self.invalid(key, "a string")),
        }
    }

    /// Read a required string attribute
    pub fn require_str(&self, key: &str) -> Result<&str, BuildError> {
        self.str_attr(key)?.ok_or_else(|| BuildError::MissingAttribute {
            type_id: self.item_id.clone(),
            attribute: key.to_string(),
        })
    }

    /// Read an optional boolean attribute
    pub fn bool_attr(&self, key: &str) -> Result<Option<bool>, BuildError> {
        match self.attributes.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(value)) => Ok(Some(*value)),
            Some(_) => Err(self.invalid(key, "a boolean")),
        }
    }

    /// Read an optional list of strings
    pub fn string_list_attr(&self, key: &str) -> Result<Option<Vec<String>>, BuildError> {
        let Some(value) = self.attributes.get(key) else {
            return Ok(None);
        };
        let Value::Array(values) = value else {
            return Err(self.invalid(key, "a list of strings"));
        };
        values
            .iter()
            .map(|value| {
                value
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.invalid(key, "a list of strings"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    /// Read an optional name -> number mapping
    pub fn f64_map_attr(&self, key: &str) -> Result<Option<IndexMap<String, f64>>, BuildError> {
        let Some(value) = self.attributes.get(key) else {
            return Ok(None);
        };
        let Value::Object(object) = value else {
            return Err(self.invalid(key, "a mapping of names to numbers"));
        };
        object
            .iter()
            .map(|(name, value)| {
                value
                    .as_f64()
                    .map(|number| (name.clone(), number))
                    .ok_or_else(|| self.invalid(key, "a mapping of names to numbers"))
            })
            .collect::<Result<IndexMap<_, _>, _>>()
            .map(Some)
    }

    /// Read an optional name -> string mapping
    pub fn string_map_attr(
        &self,
        key: &str,
    ) -> Result<Option<IndexMap<String, String>>, BuildError> {
        let Some(value) = self.attributes.get(key) else {
            return Ok(None);
        };
        let Value::Object(object) = value else {
            return Err(self.invalid(key, "a mapping of names to strings"));
        };
        object
            .iter()
            .map(|(name, value)| {
                value
                    .as_str()
                    .map(|text| (name.clone(), text.to_string()))
                    .ok_or_else(|| self.invalid(key, "a mapping of names to strings"))
            })
            .collect::<Result<IndexMap<_, _>, _>>()
            .map(Some)
    }

    /// Error for a malformed attribute of this document
    pub fn invalid(&self, key: &str, expected: &'static str) -> BuildError {
        BuildError::InvalidAttribute {
            type_id: self.item_id.clone(),
            attribute: key.to_string(),
            expected,
        }
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Deserialize from RON
    pub fn from_ron(s: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(s)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Load a document, picking the format from the file extension
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let format = DocumentFormat::from_path(path)?;
        let contents = std::fs::read_to_string(path)?;
        let preferences = match format {
            DocumentFormat::Ron => Self::from_ron(&contents)?,
            DocumentFormat::Json => Self::from_json(&contents)?,
        };
        tracing::debug!("Loaded sequence document from {:?}", path);
        Ok(preferences)
    }

    /// Save a document, picking the format from the file extension
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        let contents = match DocumentFormat::from_path(path)? {
            DocumentFormat::Ron => self.to_ron()?,
            DocumentFormat::Json => self.to_json()?,
        };
        std::fs::write(path, contents)?;
        tracing::debug!("Saved sequence document to {:?}", path);
        Ok(())
    }
}

/// On-disk encoding of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Rusty Object Notation (`.ron`)
    Ron,
    /// JSON (`.json`)
    Json,
}

impl DocumentFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("ron") => Ok(Self::Ron),
            Some("json") => Ok(Self::Json),
            _ => Err(DocumentError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Error when reading or writing a document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// File could not be read or written
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// RON encoding failed
    #[error("RON serialization error: {0}")]
    RonSerialize(#[from] ron::Error),

    /// RON parsing failed
    #[error("RON parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    /// JSON encoding or parsing failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Extension is neither `.ron` nor `.json`
    #[error("Unsupported document format: {0:?}")]
    UnsupportedFormat(PathBuf),
}
