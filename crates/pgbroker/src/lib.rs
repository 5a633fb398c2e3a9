//! # pgbroker
//!
//! A single-table statement assembly and persistence broker for PostgreSQL.
//!
//! ## Features
//!
//! - **Schema profiles**: entities bind to one table through a validated
//!   property/column bijection, loaded from TOML
//! - **Collision-free bindings**: every value mapping mints placeholders
//!   from a shared atomic token counter, so bindings from different
//!   mappings can always meet inside one statement
//! - **Table-driven statements**: SELECT/INSERT/UPDATE/DELETE assembly with
//!   per-kind slot rules enforced before any SQL is rendered
//! - **Narrow execution seam**: statements run through the [`Executor`]
//!   trait; tokio-postgres clients, transactions, and pooled clients
//!   implement it out of the box
//! - **Kind-aware results**: each statement kind post-processes its raw
//!   outcome (selects hydrate mappings, inserts fetch the generated id)
//!
//! ## Statement assembly
//!
//! ```ignore
//! use pgbroker::{Statement, ValueMapFactory};
//!
//! let maps = ValueMapFactory::new(registry);
//! let mut values = maps.build("User")?;
//! values.add_property("userName", "alice")?;
//!
//! let statement = Statement::insert().set_values(values)?;
//! assert_eq!(
//!     statement.to_sql()?,
//!     "INSERT INTO users (username) VALUES (:val1_username);"
//! );
//! ```
//!
//! ## Broker
//!
//! ```ignore
//! use pgbroker::{Broker, SchemaConfig};
//!
//! let registry = Arc::new(SchemaConfig::from_path("schema.toml")?.registry()?);
//! let (client, connection) = tokio_postgres::connect(&url, NoTls).await?;
//! tokio::spawn(connection);
//!
//! let broker = Broker::new(client, registry);
//!
//! // No identity bound yet, so save() inserts and returns the stored row.
//! let alice = broker.save(&User::new("alice")).await?;
//!
//! let found: Vec<User> = broker
//!     .get(broker.constraints("User").equals("id", alice.id)?)
//!     .await?;
//!
//! broker.delete(broker.constraints("User").equals("id", alice.id)?).await?;
//! ```

pub mod broker;
pub mod config;
pub mod constraint;
pub mod error;
pub mod executor;
pub mod map;
pub mod postgres;
pub mod profile;
pub mod query;
pub mod result;
pub mod stmt;
pub mod value;

pub use broker::{Broker, Entity};
pub use config::{EntityConfig, SchemaConfig};
pub use constraint::{Constraint, ConstraintFactory};
pub use error::{BrokerError, BrokerResult, ExecutionError};
pub use executor::{Executor, RawResult, RawRow};
pub use map::{BindValues, TokenCounter, ValueMap, ValueMapFactory};
pub use profile::{ProfileRegistry, TableProfile};
pub use query::{Query, QueryFactory};
pub use result::{
    DeleteProcessor, InsertProcessor, ResultProcessor, SelectProcessor, UpdateProcessor,
};
pub use stmt::{IDENTITY_PROPERTY, Statement, StatementKind};
pub use value::Value;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config, create_pool_with_manager_config};

#[cfg(test)]
pub(crate) mod test_util;
