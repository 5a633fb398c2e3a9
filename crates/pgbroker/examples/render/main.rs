//! Statement assembly without a database.
//!
//! Run with: cargo run --example render -p pgbroker
//!
//! Builds one statement of each kind from a schema profile, then prints the
//! rendered SQL, the named bindings, and the positional form the postgres
//! adapter would actually send.

use std::sync::Arc;

use pgbroker::{BrokerError, ConstraintFactory, SchemaConfig, Statement, ValueMapFactory};

const SCHEMA: &str = r#"
    [entities.User]
    table = "users"

    [entities.User.columns]
    id = "id"
    userName = "username"
    email = "email"
"#;

fn print_statement(label: &str, statement: &Statement) -> Result<(), BrokerError> {
    let sql = statement.to_sql()?;
    println!("=== {label} ===");
    println!("{sql}");
    for (placeholder, value) in statement.bind_values()? {
        println!("  {placeholder} = {value:?}");
    }
    let (positional, order) = pgbroker::postgres::to_positional(&sql);
    println!("positional: {positional}");
    if !order.is_empty() {
        println!("param order: {order:?}");
    }
    println!();
    Ok(())
}

fn main() -> Result<(), BrokerError> {
    let config = SchemaConfig::from_toml_str(SCHEMA)?;
    let registry = Arc::new(config.registry()?);
    let maps = ValueMapFactory::new(registry);
    let constraints = ConstraintFactory::new(maps.clone(), "User");

    let mut values = maps.build("User")?;
    values.add_property("userName", "alice")?;
    values.add_property("email", "alice@example.com")?;
    let insert = Statement::insert().set_values(values)?;
    print_statement("INSERT", &insert)?;

    let mut values = maps.build("User")?;
    values.add_property("email", "alice@retrofit.example")?;
    let update = Statement::update()
        .set_values(values)?
        .set_constraints(constraints.equals("id", 1i64)?)?;
    print_statement("UPDATE", &update)?;

    let select = Statement::select().set_constraints(constraints.equals("userName", "alice")?)?;
    print_statement("SELECT", &select)?;

    let delete = Statement::delete().set_constraints(constraints.equals("id", 1i64)?)?;
    print_statement("DELETE", &delete)?;

    Ok(())
}
