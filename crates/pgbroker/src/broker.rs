//! Single-table persistence broker: get, save, delete in terms of entities.

use std::sync::Arc;

use tracing::debug;

use crate::constraint::{Constraint, ConstraintFactory};
use crate::error::{BrokerError, BrokerResult};
use crate::executor::Executor;
use crate::map::{ValueMap, ValueMapFactory};
use crate::profile::ProfileRegistry;
use crate::query::QueryFactory;
use crate::stmt::IDENTITY_PROPERTY;

/// Conversion between a user type and its value mapping.
///
/// Implementations translate in both directions: building the mapping that
/// persists an instance, and rebuilding an instance from a mapping handed
/// back by a select or by insert/update processing.
pub trait Entity: Sized {
    /// Entity name the table profile is registered under.
    const ENTITY: &'static str;

    /// Build the mapping that persists this instance.
    fn to_map(&self, maps: &ValueMapFactory) -> BrokerResult<ValueMap>;

    /// Rebuild an instance from a mapping.
    fn from_map(map: &ValueMap) -> BrokerResult<Self>;
}

/// Persistence operations for entity types over one executor.
#[derive(Debug)]
pub struct Broker<E> {
    executor: E,
    maps: ValueMapFactory,
    queries: QueryFactory,
}

impl<E: Executor> Broker<E> {
    pub fn new(executor: E, registry: Arc<ProfileRegistry>) -> Self {
        let maps = ValueMapFactory::new(registry);
        let queries = QueryFactory::new(maps.clone());
        Self {
            executor,
            maps,
            queries,
        }
    }

    /// The mapping factory, for binding values by hand.
    pub fn maps(&self) -> &ValueMapFactory {
        &self.maps
    }

    /// A constraint factory bound to one entity.
    pub fn constraints(&self, entity: &str) -> ConstraintFactory {
        ConstraintFactory::new(self.maps.clone(), entity)
    }

    /// Fetch every row matching the constraint as `T`.
    pub async fn get<T: Entity>(&self, constraints: Constraint) -> BrokerResult<Vec<T>> {
        debug!(entity = T::ENTITY, "get");
        let rows = self
            .queries
            .select()
            .set_constraints(constraints)?
            .run(&self.executor)
            .await?;
        rows.iter().map(T::from_map).collect()
    }

    /// Persist `entity`: update when its mapping already carries the
    /// identity property, insert otherwise. Returns the stored state, so an
    /// insert hands back the instance with its generated identity.
    pub async fn save<T: Entity>(&self, entity: &T) -> BrokerResult<T> {
        let map = entity.to_map(&self.maps)?;
        let stored = if map.has_property(IDENTITY_PROPERTY) {
            debug!(entity = T::ENTITY, "save: updating");
            self.update(map).await?
        } else {
            debug!(entity = T::ENTITY, "save: inserting");
            self.insert(map).await?
        };
        T::from_map(&stored)
    }

    /// Delete every row matching the constraint. Matching nothing is a
    /// not-found error.
    pub async fn delete(&self, constraints: Constraint) -> BrokerResult<()> {
        let deleted = self
            .queries
            .delete()
            .set_constraints(constraints)?
            .run(&self.executor)
            .await?;
        if !deleted {
            return Err(BrokerError::not_found("delete matched no rows"));
        }
        Ok(())
    }

    async fn insert(&self, values: ValueMap) -> BrokerResult<ValueMap> {
        self.queries
            .insert()
            .set_values(values)?
            .run(&self.executor)
            .await
    }

    async fn update(&self, values: ValueMap) -> BrokerResult<ValueMap> {
        let id = values
            .property_to_value()?
            .get(IDENTITY_PROPERTY)
            .cloned()
            .ok_or_else(|| BrokerError::internal("update reached without an identity value"))?;
        let constraint = ConstraintFactory::new(self.maps.clone(), values.entity())
            .equals(IDENTITY_PROPERTY, id)?;
        self.queries
            .update()
            .set_values(values)?
            .set_constraints(constraint)?
            .run(&self.executor)
            .await
    }
}
