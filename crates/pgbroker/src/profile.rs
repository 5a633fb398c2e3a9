//! Table profiles: the static binding between an entity type and its table.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{BrokerError, BrokerResult};

/// Immutable description of one entity's table: its name and the 1:1
/// property/column mapping.
///
/// Profiles are shared behind [`Arc`]; every value mapping minted for an
/// entity points at the same profile instance, and that pointer identity is
/// what makes two mappings compatible.
#[derive(Debug)]
pub struct TableProfile {
    entity: String,
    table: String,
    /// property -> column, insertion order preserved
    columns: IndexMap<String, String>,
    /// column -> property, the inverse view
    properties: IndexMap<String, String>,
}

impl TableProfile {
    /// Build a profile, validating that the property/column mapping is a
    /// bijection with non-empty names.
    pub fn new(
        entity: impl Into<String>,
        table: impl Into<String>,
        columns: impl IntoIterator<Item = (String, String)>,
    ) -> BrokerResult<Self> {
        let entity = entity.into();
        let table = table.into();
        if entity.is_empty() {
            return Err(BrokerError::config("entity name must not be empty"));
        }
        if table.is_empty() {
            return Err(BrokerError::config(format!(
                "table name for entity '{entity}' must not be empty"
            )));
        }

        let mut forward = IndexMap::new();
        let mut inverse = IndexMap::new();
        for (property, column) in columns {
            if property.is_empty() || column.is_empty() {
                return Err(BrokerError::config(format!(
                    "entity '{entity}' has an empty property or column name"
                )));
            }
            if inverse.contains_key(&column) {
                return Err(BrokerError::config(format!(
                    "entity '{entity}' maps two properties to column '{column}'"
                )));
            }
            if forward.insert(property.clone(), column.clone()).is_some() {
                return Err(BrokerError::config(format!(
                    "entity '{entity}' declares property '{property}' twice"
                )));
            }
            inverse.insert(column, property);
        }

        Ok(Self {
            entity,
            table,
            columns: forward,
            properties: inverse,
        })
    }

    /// Entity type name this profile describes.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Table the entity persists to.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Resolve a property name to its column.
    pub fn column_for(&self, property: &str) -> BrokerResult<&str> {
        self.columns
            .get(property)
            .map(String::as_str)
            .ok_or_else(|| {
                BrokerError::schema_binding(format!(
                    "no property '{}' on entity '{}'",
                    property, self.entity
                ))
            })
    }

    /// Resolve a column name back to its property.
    pub fn property_for(&self, column: &str) -> BrokerResult<&str> {
        self.properties
            .get(column)
            .map(String::as_str)
            .ok_or_else(|| {
                BrokerError::schema_binding(format!(
                    "no column '{}' on entity '{}'",
                    column, self.entity
                ))
            })
    }

    /// The full property -> column mapping, in declaration order.
    pub fn property_columns(&self) -> &IndexMap<String, String> {
        &self.columns
    }
}

/// Registry of table profiles, keyed by entity name.
#[derive(Debug, Default)]
pub struct ProfileRegistry {
    profiles: HashMap<String, Arc<TableProfile>>,
}

impl ProfileRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a profile. Each entity may be registered once.
    pub fn insert(&mut self, profile: TableProfile) -> BrokerResult<()> {
        let entity = profile.entity().to_string();
        if self.profiles.contains_key(&entity) {
            return Err(BrokerError::config(format!(
                "entity '{entity}' is already registered"
            )));
        }
        self.profiles.insert(entity, Arc::new(profile));
        Ok(())
    }

    /// Look up the shared profile for an entity.
    pub fn get(&self, entity: &str) -> BrokerResult<Arc<TableProfile>> {
        self.profiles.get(entity).cloned().ok_or_else(|| {
            BrokerError::config(format!("no profile registered for entity '{entity}'"))
        })
    }

    /// Names of all registered entities.
    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_profile() -> TableProfile {
        TableProfile::new(
            "User",
            "users",
            [
                ("id".to_string(), "id".to_string()),
                ("userName".to_string(), "username".to_string()),
            ],
        )
        .unwrap()
    }

    #[test]
    fn resolves_both_directions() {
        let profile = user_profile();
        assert_eq!(profile.column_for("userName").unwrap(), "username");
        assert_eq!(profile.property_for("username").unwrap(), "userName");
        assert_eq!(profile.table(), "users");
        assert_eq!(profile.entity(), "User");
    }

    #[test]
    fn unknown_names_are_schema_binding_errors() {
        let profile = user_profile();
        let err = profile.column_for("missing").unwrap_err();
        assert!(matches!(err, BrokerError::SchemaBinding(_)));
        let err = profile.property_for("missing").unwrap_err();
        assert!(matches!(err, BrokerError::SchemaBinding(_)));
    }

    #[test]
    fn rejects_duplicate_column_targets() {
        let err = TableProfile::new(
            "User",
            "users",
            [
                ("a".to_string(), "same".to_string()),
                ("b".to_string(), "same".to_string()),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, BrokerError::Config(_)));
    }

    #[test]
    fn rejects_empty_names() {
        assert!(TableProfile::new("", "users", []).is_err());
        assert!(TableProfile::new("User", "", []).is_err());
        assert!(
            TableProfile::new("User", "users", [(String::new(), "c".to_string())]).is_err()
        );
    }

    #[test]
    fn registry_rejects_duplicates_and_unknowns() {
        let mut registry = ProfileRegistry::new();
        registry.insert(user_profile()).unwrap();
        assert!(registry.insert(user_profile()).is_err());
        assert!(registry.get("User").is_ok());
        assert!(matches!(
            registry.get("Ghost").unwrap_err(),
            BrokerError::Config(_)
        ));
    }
}
