//! Row constraints rendered into WHERE clauses.
//!
//! The constraint tree is a closed enum so statement assembly can match it
//! exhaustively. Each node owns a dedicated value mapping minted for it;
//! [`ConstraintFactory`] is the supported way to get one.

use crate::error::{BrokerError, BrokerResult};
use crate::map::{ValueMap, ValueMapFactory};
use crate::value::Value;

/// A predicate over the rows of one entity's table.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Matches every row. Renders to the tautology `1=1` and carries an
    /// empty mapping.
    Any { values: ValueMap },
    /// Matches rows where one column equals a bound value.
    Equals {
        values: ValueMap,
        column: String,
        placeholder: String,
    },
}

impl Constraint {
    /// Match-all constraint over a dedicated mapping.
    pub fn any(values: ValueMap) -> Self {
        Self::Any { values }
    }

    /// Equality constraint: binds `value` under `property` on the dedicated
    /// mapping and renders against the row it minted.
    pub fn equals(
        mut values: ValueMap,
        property: &str,
        value: impl Into<Value>,
    ) -> BrokerResult<Self> {
        values.add_property(property, value)?;
        let (placeholder, column) = values
            .placeholder_to_column()
            .into_iter()
            .last()
            .ok_or_else(|| BrokerError::internal("equality constraint lost its bound row"))?;
        Ok(Self::Equals {
            values,
            column,
            placeholder,
        })
    }

    /// Render the predicate for a WHERE clause.
    pub fn to_sql(&self) -> String {
        match self {
            Self::Any { .. } => "1=1".to_string(),
            Self::Equals {
                column,
                placeholder,
                ..
            } => format!("{column}={placeholder}"),
        }
    }

    /// The mapping carrying this constraint's bound values.
    pub fn value_map(&self) -> &ValueMap {
        match self {
            Self::Any { values } | Self::Equals { values, .. } => values,
        }
    }
}

/// Builds constraints for one entity, minting a fresh dedicated mapping per
/// node so placeholders never collide between constraints.
#[derive(Debug, Clone)]
pub struct ConstraintFactory {
    maps: ValueMapFactory,
    entity: String,
}

impl ConstraintFactory {
    pub fn new(maps: ValueMapFactory, entity: impl Into<String>) -> Self {
        Self {
            maps,
            entity: entity.into(),
        }
    }

    /// Match-all constraint.
    pub fn any(&self) -> BrokerResult<Constraint> {
        Ok(Constraint::any(self.maps.build(&self.entity)?))
    }

    /// `property = value` constraint.
    pub fn equals(&self, property: &str, value: impl Into<Value>) -> BrokerResult<Constraint> {
        Constraint::equals(self.maps.build(&self.entity)?, property, value)
    }
}
