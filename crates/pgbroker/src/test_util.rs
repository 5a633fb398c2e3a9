//! Shared fixtures for unit tests.

use std::sync::Arc;

use crate::config::SchemaConfig;
use crate::map::ValueMapFactory;
use crate::profile::ProfileRegistry;

pub(crate) const SCHEMA: &str = r#"
    [entities.User]
    table = "users"

    [entities.User.columns]
    id = "id"
    userName = "username"
    email = "email"

    [entities.Widget]
    table = "widgets"

    [entities.Widget.columns]
    id = "id"
    label = "label"

    [entities.Sample]
    table = "my_table"

    [entities.Sample.columns]
    id = "id"
    colOne = "col_one"
"#;

pub(crate) fn registry() -> Arc<ProfileRegistry> {
    let config = SchemaConfig::from_toml_str(SCHEMA).unwrap();
    Arc::new(config.registry().unwrap())
}

pub(crate) fn maps() -> ValueMapFactory {
    ValueMapFactory::new(registry())
}
