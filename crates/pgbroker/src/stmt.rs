//! SQL statement assembly for the four single-table statement kinds.
//!
//! A statement is a kind plus two slots: a values mapping and a constraint.
//! Which slots a kind requires or forbids is table data rather than
//! per-kind code:
//!
//! | kind   | values    | constraints |
//! |--------|-----------|-------------|
//! | SELECT | forbidden | required    |
//! | INSERT | required  | forbidden   |
//! | UPDATE | required  | required    |
//! | DELETE | forbidden | required    |
//!
//! Rendering and binding refuse to run until every required slot is filled.

use std::fmt;

use crate::constraint::Constraint;
use crate::error::{BrokerError, BrokerResult};
use crate::map::{BindValues, ValueMap};

/// Property name reserved for the database-generated identity column.
pub const IDENTITY_PROPERTY: &str = "id";

/// The four supported statement kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Forbidden,
    Required,
}

#[derive(Debug, Clone, Copy)]
struct KindRules {
    values: Slot,
    constraints: Slot,
}

impl StatementKind {
    const fn rules(self) -> KindRules {
        match self {
            Self::Select => KindRules {
                values: Slot::Forbidden,
                constraints: Slot::Required,
            },
            Self::Insert => KindRules {
                values: Slot::Required,
                constraints: Slot::Forbidden,
            },
            Self::Update => KindRules {
                values: Slot::Required,
                constraints: Slot::Required,
            },
            Self::Delete => KindRules {
                values: Slot::Forbidden,
                constraints: Slot::Required,
            },
        }
    }

    const fn action_clause(self) -> &'static str {
        match self {
            Self::Select => "SELECT * FROM",
            Self::Insert => "INSERT INTO",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE FROM",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        })
    }
}

/// One assembling statement: kind, optional values, optional constraints.
#[derive(Debug, Clone)]
pub struct Statement {
    kind: StatementKind,
    values: Option<ValueMap>,
    constraints: Option<Constraint>,
}

impl Statement {
    pub fn new(kind: StatementKind) -> Self {
        Self {
            kind,
            values: None,
            constraints: None,
        }
    }

    pub fn select() -> Self {
        Self::new(StatementKind::Select)
    }

    pub fn insert() -> Self {
        Self::new(StatementKind::Insert)
    }

    pub fn update() -> Self {
        Self::new(StatementKind::Update)
    }

    pub fn delete() -> Self {
        Self::new(StatementKind::Delete)
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    /// The values mapping, when set.
    pub fn values(&self) -> Option<&ValueMap> {
        self.values.as_ref()
    }

    /// The constraint, when set.
    pub fn constraints(&self) -> Option<&Constraint> {
        self.constraints.as_ref()
    }

    /// Fill the values slot. Fails on kinds that forbid values and on a
    /// mapping incompatible with an already-set constraint.
    pub fn set_values(mut self, values: ValueMap) -> BrokerResult<Self> {
        if self.kind.rules().values == Slot::Forbidden {
            return Err(BrokerError::unsupported(format!(
                "{} statements do not take values",
                self.kind
            )));
        }
        if let Some(constraint) = &self.constraints {
            if !values.is_compatible(constraint.value_map()) {
                return Err(self.incompatible_slots(&values, constraint));
            }
        }
        self.values = Some(values);
        Ok(self)
    }

    /// Fill the constraints slot. Fails on kinds that forbid constraints and
    /// on a constraint incompatible with an already-set values mapping.
    pub fn set_constraints(mut self, constraints: Constraint) -> BrokerResult<Self> {
        if self.kind.rules().constraints == Slot::Forbidden {
            return Err(BrokerError::unsupported(format!(
                "{} statements do not take constraints",
                self.kind
            )));
        }
        if let Some(values) = &self.values {
            if !values.is_compatible(constraints.value_map()) {
                return Err(self.incompatible_slots(values, &constraints));
            }
        }
        self.constraints = Some(constraints);
        Ok(self)
    }

    fn incompatible_slots(&self, values: &ValueMap, constraint: &Constraint) -> BrokerError {
        BrokerError::IncompatibleMapping(format!(
            "{} statement cannot combine values for '{}' with constraints for '{}'",
            self.kind,
            values.entity(),
            constraint.value_map().entity()
        ))
    }

    fn is_ready(&self) -> bool {
        let rules = self.kind.rules();
        (rules.values != Slot::Required || self.values.is_some())
            && (rules.constraints != Slot::Required || self.constraints.is_some())
    }

    fn ensure_ready(&self, operation: &str) -> BrokerResult<()> {
        if self.is_ready() {
            return Ok(());
        }
        let rules = self.kind.rules();
        let mut missing = Vec::new();
        if rules.values == Slot::Required && self.values.is_none() {
            missing.push("values");
        }
        if rules.constraints == Slot::Required && self.constraints.is_none() {
            missing.push("constraints");
        }
        Err(BrokerError::not_ready(format!(
            "{} statement needs {} before {}",
            self.kind,
            missing.join(" and "),
            operation
        )))
    }

    /// Render the statement text: the non-empty clauses joined by single
    /// spaces, terminated with `;`.
    pub fn to_sql(&self) -> BrokerResult<String> {
        self.ensure_ready("rendering")?;
        let mut clauses = vec![
            self.kind.action_clause().to_string(),
            self.table_name()?.to_string(),
        ];
        if let Some(body) = self.body_clause()? {
            clauses.push(body);
        }
        if let Some(filter) = self.where_clause() {
            clauses.push(filter);
        }
        Ok(format!("{};", clauses.join(" ")))
    }

    /// Collect the placeholder -> value payload for execution. With both
    /// slots filled the values rows come first, then the constraint rows.
    pub fn bind_values(&self) -> BrokerResult<BindValues> {
        self.ensure_ready("binding")?;
        match (&self.values, &self.constraints) {
            (Some(values), Some(constraints)) => {
                Ok(values.merge(constraints.value_map())?.placeholder_to_value())
            }
            (Some(values), None) => Ok(values.placeholder_to_value()),
            (None, Some(constraints)) => Ok(constraints.value_map().placeholder_to_value()),
            (None, None) => Err(BrokerError::internal(format!(
                "{} statement passed readiness with no mappings",
                self.kind
            ))),
        }
    }

    fn table_name(&self) -> BrokerResult<&str> {
        if let Some(values) = &self.values {
            return Ok(values.table());
        }
        if let Some(constraints) = &self.constraints {
            return Ok(constraints.value_map().table());
        }
        Err(BrokerError::not_ready(format!(
            "{} statement has no mapping to name its table",
            self.kind
        )))
    }

    fn body_clause(&self) -> BrokerResult<Option<String>> {
        match self.kind {
            StatementKind::Insert => self.insert_body().map(Some),
            StatementKind::Update => self.update_body().map(Some),
            StatementKind::Select | StatementKind::Delete => Ok(None),
        }
    }

    fn insert_body(&self) -> BrokerResult<String> {
        let values = self.values.as_ref().ok_or_else(|| {
            BrokerError::internal("INSERT statement reached rendering without values")
        })?;
        if values.has_property(IDENTITY_PROPERTY) {
            return Err(BrokerError::IdentityConflict(format!(
                "insert values for entity '{}' already carry '{}'; the database generates it",
                values.entity(),
                IDENTITY_PROPERTY
            )));
        }
        let view = values.placeholder_to_column();
        let mut columns = Vec::with_capacity(view.len());
        let mut placeholders = Vec::with_capacity(view.len());
        for (placeholder, column) in &view {
            columns.push(column.as_str());
            placeholders.push(placeholder.as_str());
        }
        Ok(format!(
            "({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        ))
    }

    fn update_body(&self) -> BrokerResult<String> {
        let values = self.values.as_ref().ok_or_else(|| {
            BrokerError::internal("UPDATE statement reached rendering without values")
        })?;
        let pairs: Vec<String> = values
            .placeholder_to_column()
            .into_iter()
            .map(|(placeholder, column)| format!("{column}={placeholder}"))
            .collect();
        Ok(format!("SET {}", pairs.join(", ")))
    }

    fn where_clause(&self) -> Option<String> {
        self.constraints
            .as_ref()
            .map(|constraint| format!("WHERE {}", constraint.to_sql()))
    }
}
