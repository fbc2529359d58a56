//! Festival registry.
//!
//! The registry is a JSON document listing every known festival plus the id
//! of the default one. It is baked into the binary (or read once from an
//! override file at startup), checked for consistency, and then served
//! byte-for-byte. Nothing writes to it at runtime.
use std::{collections::HashSet, path::Path};

use bytes::Bytes;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Registry shipped with the binary.
pub const EMBEDDED_REGISTRY: &str = include_str!("../../resources/festivals.json");

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("Failed to read registry file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Registry is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Registry contains no festivals")]
    Empty,

    #[error("Festival at index {index} has an empty id")]
    EmptyId { index: usize },

    #[error("Duplicate festival id '{0}'")]
    DuplicateId(String),

    #[error("Default festival '{0}' is not in the registry")]
    UnknownDefault(String),

    #[error("Festival '{id}' ends ({end}) before it starts ({start})")]
    InvertedDates {
        id: String,
        start: NaiveDate,
        end: NaiveDate,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Festival {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub data_base_url: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct RegistryDocument {
    default_festival_id: String,
    festivals: Vec<Festival>,
}

/// Validated, immutable festival registry.
#[derive(Debug, Clone)]
pub struct FestivalRegistry {
    raw: Bytes,
    default_festival_id: String,
    festivals: Vec<Festival>,
}

impl FestivalRegistry {
    /// The registry compiled into the binary.
    pub fn embedded() -> Result<Self, RegistryError> {
        Self::from_json(EMBEDDED_REGISTRY)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(raw)
    }

    /// Load either the override file, when given, or the embedded copy.
    pub fn load(override_path: Option<&str>) -> Result<Self, RegistryError> {
        match override_path {
            Some(path) => Self::from_file(path),
            None => Self::embedded(),
        }
    }

    pub fn from_json(raw: impl Into<String>) -> Result<Self, RegistryError> {
        let raw = raw.into();
        let document: RegistryDocument = serde_json::from_str(&raw)?;

        if document.festivals.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen = HashSet::new();
        for (index, festival) in document.festivals.iter().enumerate() {
            if festival.id.trim().is_empty() {
                return Err(RegistryError::EmptyId { index });
            }
            if !seen.insert(festival.id.as_str()) {
                return Err(RegistryError::DuplicateId(festival.id.clone()));
            }
            if festival.end_date < festival.start_date {
                return Err(RegistryError::InvertedDates {
                    id: festival.id.clone(),
                    start: festival.start_date,
                    end: festival.end_date,
                });
            }
        }

        if !seen.contains(document.default_festival_id.as_str()) {
            return Err(RegistryError::UnknownDefault(document.default_festival_id));
        }

        Ok(Self {
            raw: Bytes::from(raw),
            default_festival_id: document.default_festival_id,
            festivals: document.festivals,
        })
    }

    /// The registry document exactly as loaded.
    pub fn raw_json(&self) -> Bytes {
        self.raw.clone()
    }

    pub fn festivals(&self) -> &[Festival] {
        &self.festivals
    }

    pub fn default_festival_id(&self) -> &str {
        &self.default_festival_id
    }

    pub fn default_festival(&self) -> Option<&Festival> {
        self.find(&self.default_festival_id)
    }

    pub fn find(&self, id: &str) -> Option<&Festival> {
        self.festivals.iter().find(|f| f.id == id)
    }
}
