//! Result processors: kind-specific translation of raw backend outcomes.

use std::future::Future;

use crate::error::{BrokerError, BrokerResult};
use crate::executor::{Executor, RawResult};
use crate::map::{ValueMap, ValueMapFactory};
use crate::stmt::{IDENTITY_PROPERTY, Statement};

/// Turns the raw outcome of one statement kind into its caller-facing shape.
///
/// Processors receive the executor again because some outcomes need a
/// follow-up round trip (the insert processor asks for the generated
/// identity).
pub trait ResultProcessor: Send + Sync {
    type Output;

    fn process<E: Executor>(
        &self,
        executor: &E,
        raw: RawResult,
        statement: &Statement,
    ) -> impl Future<Output = BrokerResult<Self::Output>> + Send;
}

/// SELECT: one value mapping per returned row, bound to the entity the
/// statement's constraint was built for.
#[derive(Debug, Clone)]
pub struct SelectProcessor {
    maps: ValueMapFactory,
}

impl SelectProcessor {
    pub fn new(maps: ValueMapFactory) -> Self {
        Self { maps }
    }
}

impl ResultProcessor for SelectProcessor {
    type Output = Vec<ValueMap>;

    async fn process<E: Executor>(
        &self,
        _executor: &E,
        mut raw: RawResult,
        statement: &Statement,
    ) -> BrokerResult<Vec<ValueMap>> {
        let entity = statement
            .constraints()
            .map(|constraint| constraint.value_map().entity().to_string())
            .ok_or_else(|| BrokerError::internal("SELECT processed without constraints"))?;

        let mut out = Vec::with_capacity(raw.remaining());
        while let Some(row) = raw.next_row() {
            let mut map = self.maps.build(&entity)?;
            map.add_columns(row)?;
            out.push(map);
        }
        Ok(out)
    }
}

/// INSERT: a clone of the statement's values mapping with the generated
/// identity added. The statement's own mapping is left untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertProcessor;

impl ResultProcessor for InsertProcessor {
    type Output = ValueMap;

    async fn process<E: Executor>(
        &self,
        executor: &E,
        _raw: RawResult,
        statement: &Statement,
    ) -> BrokerResult<ValueMap> {
        let values = statement
            .values()
            .ok_or_else(|| BrokerError::internal("INSERT processed without values"))?;
        let id = executor.last_insert_id().await?;
        let mut out = values.clone();
        out.add_property(IDENTITY_PROPERTY, id)?;
        Ok(out)
    }
}

/// UPDATE: a clone of the statement's values mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateProcessor;

impl ResultProcessor for UpdateProcessor {
    type Output = ValueMap;

    async fn process<E: Executor>(
        &self,
        _executor: &E,
        _raw: RawResult,
        statement: &Statement,
    ) -> BrokerResult<ValueMap> {
        statement
            .values()
            .cloned()
            .ok_or_else(|| BrokerError::internal("UPDATE processed without values"))
    }
}

/// DELETE: whether any row was removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteProcessor;

impl ResultProcessor for DeleteProcessor {
    type Output = bool;

    async fn process<E: Executor>(
        &self,
        _executor: &E,
        raw: RawResult,
        _statement: &Statement,
    ) -> BrokerResult<bool> {
        Ok(raw.rows_affected() > 0)
    }
}
