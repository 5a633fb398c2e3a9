//! Value mappings: ordered rows binding properties, columns, placeholders,
//! and values for one entity.
//!
//! A [`ValueMap`] is the unit of currency between statement assembly and
//! execution. Every row it carries has a fixed shape: the entity property,
//! the table column it resolves to, the placeholder minted for the bind, and
//! the bound value. Keyed views over the rows are built on demand.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use crate::error::{BrokerError, BrokerResult};
use crate::profile::{ProfileRegistry, TableProfile};
use crate::value::Value;

/// Placeholder -> value payload handed to an executor.
pub type BindValues = IndexMap<String, Value>;

/// Atomic source of the unique tokens baked into placeholders.
///
/// One counter is shared by every mapping a factory mints, so placeholders
/// from any two mappings never collide. Tokens start at 1.
#[derive(Debug)]
pub struct TokenCounter {
    next: AtomicU64,
}

impl TokenCounter {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Claim the next token.
    pub fn next_token(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
struct MapRow {
    property: String,
    column: String,
    placeholder: String,
    value: Value,
}

/// Ordered property/column/placeholder/value rows bound to one table profile.
///
/// Mappings are minted by a [`ValueMapFactory`] with a token unique to the
/// instance; the token is baked into every placeholder
/// (`:val{token}_{column}`), which keeps bindings from distinct mappings
/// disjoint when they meet inside one statement.
///
/// Merging two mappings produces a third, flagged as merged. A merged
/// mapping can carry the same property or column twice with different
/// values, so the views keyed by property or column refuse to answer on it.
/// The placeholder-keyed views stay safe everywhere.
#[derive(Debug, Clone)]
pub struct ValueMap {
    tokens: Arc<TokenCounter>,
    profile: Arc<TableProfile>,
    token: u64,
    rows: Vec<MapRow>,
    merged: bool,
}

impl ValueMap {
    fn new(tokens: Arc<TokenCounter>, profile: Arc<TableProfile>, token: u64) -> Self {
        Self {
            tokens,
            profile,
            token,
            rows: Vec::new(),
            merged: false,
        }
    }

    /// Entity this mapping binds values for.
    pub fn entity(&self) -> &str {
        self.profile.entity()
    }

    /// Table the entity persists to.
    pub fn table(&self) -> &str {
        self.profile.table()
    }

    /// The shared profile this mapping is bound to.
    pub fn profile(&self) -> &Arc<TableProfile> {
        &self.profile
    }

    /// True if this mapping was produced by [`merge`](Self::merge).
    pub fn is_merged(&self) -> bool {
        self.merged
    }

    /// Number of bound rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Bind a value under a property name. The column is resolved through
    /// the profile; an unknown property is a schema binding error.
    pub fn add_property(&mut self, property: &str, value: impl Into<Value>) -> BrokerResult<()> {
        let column = self.profile.column_for(property)?.to_string();
        self.push(property.to_string(), column, value.into());
        Ok(())
    }

    /// Bind a batch of property/value pairs in iteration order.
    pub fn add_properties<I, K, V>(&mut self, entries: I) -> BrokerResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (property, value) in entries {
            self.add_property(property.as_ref(), value)?;
        }
        Ok(())
    }

    /// Bind a value under a column name. The property is resolved through
    /// the profile; an unknown column is a schema binding error.
    pub fn add_column(&mut self, column: &str, value: impl Into<Value>) -> BrokerResult<()> {
        let property = self.profile.property_for(column)?.to_string();
        self.push(property, column.to_string(), value.into());
        Ok(())
    }

    /// Bind a batch of column/value pairs in iteration order.
    pub fn add_columns<I, K, V>(&mut self, entries: I) -> BrokerResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (column, value) in entries {
            self.add_column(column.as_ref(), value)?;
        }
        Ok(())
    }

    /// True if any row carries the property.
    pub fn has_property(&self, property: &str) -> bool {
        self.rows.iter().any(|row| row.property == property)
    }

    /// Remove the first row carrying the property. Removing a property no
    /// row carries is a not-found error; the mapping stays usable.
    pub fn remove_property(&mut self, property: &str) -> BrokerResult<()> {
        let index = self
            .rows
            .iter()
            .position(|row| row.property == property)
            .ok_or_else(|| {
                BrokerError::not_found(format!(
                    "no row carries property '{}' on entity '{}'",
                    property,
                    self.entity()
                ))
            })?;
        self.rows.remove(index);
        Ok(())
    }

    /// True if both mappings are bound to the same profile instance.
    pub fn is_compatible(&self, other: &ValueMap) -> bool {
        Arc::ptr_eq(&self.profile, &other.profile)
    }

    /// Combine two mappings into a new one carrying self's rows first, then
    /// `other`'s, each row unchanged. Neither input is modified. The result
    /// gets a fresh token and is flagged as merged.
    pub fn merge(&self, other: &ValueMap) -> BrokerResult<ValueMap> {
        if !self.is_compatible(other) {
            return Err(BrokerError::IncompatibleMapping(format!(
                "cannot merge mappings bound to different profiles ('{}' and '{}')",
                self.entity(),
                other.entity()
            )));
        }
        let token = self.tokens.next_token();
        let mut merged = ValueMap::new(Arc::clone(&self.tokens), Arc::clone(&self.profile), token);
        merged.rows.extend(self.rows.iter().cloned());
        merged.rows.extend(other.rows.iter().cloned());
        merged.merged = true;
        Ok(merged)
    }

    /// property -> column over the bound rows, insertion order, later rows
    /// winning on a repeated property.
    pub fn property_to_column(&self) -> IndexMap<String, String> {
        self.rows
            .iter()
            .map(|row| (row.property.clone(), row.column.clone()))
            .collect()
    }

    /// property -> value over the bound rows. Unavailable on merged
    /// mappings.
    pub fn property_to_value(&self) -> BrokerResult<IndexMap<String, Value>> {
        self.guard_unmerged("property_to_value")?;
        Ok(self
            .rows
            .iter()
            .map(|row| (row.property.clone(), row.value.clone()))
            .collect())
    }

    /// column -> value over the bound rows. Unavailable on merged mappings.
    pub fn column_to_value(&self) -> BrokerResult<IndexMap<String, Value>> {
        self.guard_unmerged("column_to_value")?;
        Ok(self
            .rows
            .iter()
            .map(|row| (row.column.clone(), row.value.clone()))
            .collect())
    }

    /// column -> placeholder over the bound rows. Unavailable on merged
    /// mappings.
    pub fn column_to_placeholder(&self) -> BrokerResult<IndexMap<String, String>> {
        self.guard_unmerged("column_to_placeholder")?;
        Ok(self
            .rows
            .iter()
            .map(|row| (row.column.clone(), row.placeholder.clone()))
            .collect())
    }

    /// placeholder -> column over the bound rows. Placeholders stay unique
    /// across merges, so this view is always available.
    pub fn placeholder_to_column(&self) -> IndexMap<String, String> {
        self.rows
            .iter()
            .map(|row| (row.placeholder.clone(), row.column.clone()))
            .collect()
    }

    /// placeholder -> value over the bound rows: the payload an executor
    /// receives. Always available.
    pub fn placeholder_to_value(&self) -> BindValues {
        self.rows
            .iter()
            .map(|row| (row.placeholder.clone(), row.value.clone()))
            .collect()
    }

    fn push(&mut self, property: String, column: String, value: Value) {
        let placeholder = format!(":val{}_{}", self.token, column);
        self.rows.push(MapRow {
            property,
            column,
            placeholder,
            value,
        });
    }

    fn guard_unmerged(&self, view: &str) -> BrokerResult<()> {
        if self.merged {
            return Err(BrokerError::MergedMapping(format!(
                "{view} is unavailable on a merged mapping"
            )));
        }
        Ok(())
    }
}

/// Mints value mappings bound to registered profiles, handing each one a
/// unique token from the shared counter.
#[derive(Debug, Clone)]
pub struct ValueMapFactory {
    registry: Arc<ProfileRegistry>,
    tokens: Arc<TokenCounter>,
}

impl ValueMapFactory {
    pub fn new(registry: Arc<ProfileRegistry>) -> Self {
        Self {
            registry,
            tokens: Arc::new(TokenCounter::new()),
        }
    }

    /// Mint an empty mapping for a registered entity.
    pub fn build(&self, entity: &str) -> BrokerResult<ValueMap> {
        let profile = self.registry.get(entity)?;
        let token = self.tokens.next_token();
        Ok(ValueMap::new(Arc::clone(&self.tokens), profile, token))
    }
}
