//! Schema configuration: TOML documents describing table profiles.
//!
//! ```toml
//! [entities.User]
//! table = "users"
//!
//! [entities.User.columns]   # property = column
//! id = "id"
//! userName = "username"
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{BrokerError, BrokerResult};
use crate::profile::{ProfileRegistry, TableProfile};

/// Root of a schema configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaConfig {
    /// Entity name -> table description
    pub entities: IndexMap<String, EntityConfig>,
}

/// One entity's table binding.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityConfig {
    /// Target table name
    pub table: String,
    /// property -> column mapping
    #[serde(default)]
    pub columns: IndexMap<String, String>,
}

impl SchemaConfig {
    /// Parse a schema document from TOML text.
    pub fn from_toml_str(text: &str) -> BrokerResult<Self> {
        toml::from_str(text)
            .map_err(|e| BrokerError::config(format!("invalid schema document: {e}")))
    }

    /// Read and parse a schema document from a file.
    pub fn from_path(path: impl AsRef<Path>) -> BrokerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            BrokerError::config(format!("cannot read schema file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Build the profile registry, running full name and bijection
    /// validation on every entity.
    pub fn registry(&self) -> BrokerResult<ProfileRegistry> {
        let mut registry = ProfileRegistry::new();
        for (entity, entry) in &self.entities {
            let profile = TableProfile::new(
                entity.clone(),
                entry.table.clone(),
                entry
                    .columns
                    .iter()
                    .map(|(property, column)| (property.clone(), column.clone())),
            )?;
            registry.insert(profile)?;
        }
        Ok(registry)
    }
}
