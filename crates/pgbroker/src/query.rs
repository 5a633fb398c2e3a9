//! Query orchestration: render, execute, process.

use tracing::debug;

use crate::constraint::Constraint;
use crate::error::BrokerResult;
use crate::executor::Executor;
use crate::map::{ValueMap, ValueMapFactory};
use crate::result::{
    DeleteProcessor, InsertProcessor, ResultProcessor, SelectProcessor, UpdateProcessor,
};
use crate::stmt::{Statement, StatementKind};

/// One executable statement paired with the processor for its kind.
#[derive(Debug, Clone)]
pub struct Query<P> {
    statement: Statement,
    processor: P,
}

impl<P: ResultProcessor> Query<P> {
    pub fn new(statement: Statement, processor: P) -> Self {
        Self {
            statement,
            processor,
        }
    }

    pub fn kind(&self) -> StatementKind {
        self.statement.kind()
    }

    /// Forwarded to the statement; the kind's slot rules apply unchanged.
    pub fn set_values(self, values: ValueMap) -> BrokerResult<Self> {
        let Self {
            statement,
            processor,
        } = self;
        Ok(Self {
            statement: statement.set_values(values)?,
            processor,
        })
    }

    /// Forwarded to the statement; the kind's slot rules apply unchanged.
    pub fn set_constraints(self, constraints: Constraint) -> BrokerResult<Self> {
        let Self {
            statement,
            processor,
        } = self;
        Ok(Self {
            statement: statement.set_constraints(constraints)?,
            processor,
        })
    }

    /// Render the statement, run it on the executor, and hand the raw
    /// outcome to the processor.
    pub async fn run<E: Executor>(self, executor: &E) -> BrokerResult<P::Output> {
        let sql = self.statement.to_sql()?;
        let bindings = self.statement.bind_values()?;
        debug!(
            kind = %self.statement.kind(),
            bindings = bindings.len(),
            sql = %sql,
            "executing statement"
        );
        let raw = executor.execute(&sql, &bindings).await?;
        self.processor.process(executor, raw, &self.statement).await
    }
}

/// Wires each statement kind to the processor that understands its outcome.
#[derive(Debug, Clone)]
pub struct QueryFactory {
    maps: ValueMapFactory,
}

impl QueryFactory {
    pub fn new(maps: ValueMapFactory) -> Self {
        Self { maps }
    }

    pub fn select(&self) -> Query<SelectProcessor> {
        Query::new(Statement::select(), SelectProcessor::new(self.maps.clone()))
    }

    pub fn insert(&self) -> Query<InsertProcessor> {
        Query::new(Statement::insert(), InsertProcessor)
    }

    pub fn update(&self) -> Query<UpdateProcessor> {
        Query::new(Statement::update(), UpdateProcessor)
    }

    pub fn delete(&self) -> Query<DeleteProcessor> {
        Query::new(Statement::delete(), DeleteProcessor)
    }
}
