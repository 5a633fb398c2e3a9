//! End-to-end coverage of query orchestration and the persistence broker,
//! run against a scripted executor instead of a live database.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use pgbroker::{
    BindValues, Broker, BrokerError, BrokerResult, Entity, ExecutionError, Executor,
    ProfileRegistry, QueryFactory, RawResult, RawRow, ResultProcessor, SchemaConfig,
    SelectProcessor, Statement, Value, ValueMap, ValueMapFactory,
};

const SCHEMA: &str = r#"
    [entities.User]
    table = "users"

    [entities.User.columns]
    id = "id"
    userName = "username"
    email = "email"
"#;

fn registry() -> Arc<ProfileRegistry> {
    let config = SchemaConfig::from_toml_str(SCHEMA).unwrap();
    Arc::new(config.registry().unwrap())
}

fn user_row(id: i64, name: &str, email: &str) -> RawRow {
    let mut row = RawRow::new();
    row.push("id", id);
    row.push("username", name);
    row.push("email", email);
    row
}

/// Hands out queued results in order and records every statement it runs.
#[derive(Default)]
struct ScriptedExecutor {
    results: Mutex<VecDeque<Result<RawResult, ExecutionError>>>,
    insert_id: Mutex<Value>,
    calls: Mutex<Vec<(String, BindValues)>>,
}

impl ScriptedExecutor {
    fn new() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            insert_id: Mutex::new(Value::Int(1)),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn push_result(&self, result: RawResult) {
        self.results.lock().unwrap().push_back(Ok(result));
    }

    fn push_error(&self, error: ExecutionError) {
        self.results.lock().unwrap().push_back(Err(error));
    }

    fn set_insert_id(&self, id: i64) {
        *self.insert_id.lock().unwrap() = Value::Int(id);
    }

    fn calls(&self) -> Vec<(String, BindValues)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Executor for ScriptedExecutor {
    async fn execute(&self, sql: &str, bindings: &BindValues) -> Result<RawResult, ExecutionError> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), bindings.clone()));
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(RawResult::from_rows_affected(0)))
    }

    async fn last_insert_id(&self) -> Result<Value, ExecutionError> {
        Ok(self.insert_id.lock().unwrap().clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct User {
    id: Option<i64>,
    user_name: String,
    email: String,
}

impl User {
    fn new(name: &str, email: &str) -> Self {
        Self {
            id: None,
            user_name: name.to_string(),
            email: email.to_string(),
        }
    }
}

impl Entity for User {
    const ENTITY: &'static str = "User";

    fn to_map(&self, maps: &ValueMapFactory) -> BrokerResult<ValueMap> {
        let mut map = maps.build(Self::ENTITY)?;
        if let Some(id) = self.id {
            map.add_property("id", id)?;
        }
        map.add_property("userName", self.user_name.as_str())?;
        map.add_property("email", self.email.as_str())?;
        Ok(map)
    }

    fn from_map(map: &ValueMap) -> BrokerResult<Self> {
        let values = map.property_to_value()?;
        let id = values.get("id").and_then(Value::as_int);
        let user_name = values
            .get("userName")
            .and_then(Value::as_str)
            .ok_or_else(|| BrokerError::conversion("user row is missing 'userName'"))?
            .to_string();
        let email = values
            .get("email")
            .and_then(Value::as_str)
            .ok_or_else(|| BrokerError::conversion("user row is missing 'email'"))?
            .to_string();
        Ok(Self {
            id,
            user_name,
            email,
        })
    }
}

#[tokio::test]
async fn select_hydrates_one_mapping_per_row() {
    let maps = ValueMapFactory::new(registry());
    let queries = QueryFactory::new(maps.clone());
    let executor = ScriptedExecutor::new();
    executor.push_result(RawResult::from_rows([
        user_row(1, "alice", "alice@example.com"),
        user_row(2, "bob", "bob@example.com"),
    ]));

    let constraint = pgbroker::ConstraintFactory::new(maps, "User").any().unwrap();
    let rows = queries
        .select()
        .set_constraints(constraint)
        .unwrap()
        .run(&executor)
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].entity(), "User");
    let first = rows[0].property_to_value().unwrap();
    assert_eq!(first["id"], Value::Int(1));
    assert_eq!(first["userName"], Value::Text("alice".into()));

    let calls = executor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "SELECT * FROM users WHERE 1=1;");
    assert!(calls[0].1.is_empty());
}

#[tokio::test]
async fn insert_returns_a_mapping_with_the_generated_identity() {
    let maps = ValueMapFactory::new(registry());
    let queries = QueryFactory::new(maps.clone());
    let executor = ScriptedExecutor::new();
    executor.push_result(RawResult::from_rows_affected(1));
    executor.set_insert_id(42);

    let mut values = maps.build("User").unwrap();
    values.add_property("userName", "alice").unwrap();
    values.add_property("email", "alice@example.com").unwrap();

    let stored = queries
        .insert()
        .set_values(values)
        .unwrap()
        .run(&executor)
        .await
        .unwrap();

    let stored_values = stored.property_to_value().unwrap();
    assert_eq!(stored_values.len(), 3);
    assert_eq!(stored_values["id"], Value::Int(42));

    let calls = executor.calls();
    assert_eq!(
        calls[0].0,
        "INSERT INTO users (username, email) VALUES (:val1_username, :val1_email);"
    );
    assert_eq!(calls[0].1[":val1_email"], Value::Text("alice@example.com".into()));
}

#[tokio::test]
async fn update_returns_the_statement_values() {
    let maps = ValueMapFactory::new(registry());
    let queries = QueryFactory::new(maps.clone());
    let executor = ScriptedExecutor::new();
    executor.push_result(RawResult::from_rows_affected(1));

    let mut values = maps.build("User").unwrap();
    values.add_property("userName", "renamed").unwrap();
    let constraint = pgbroker::ConstraintFactory::new(maps, "User")
        .equals("id", 7i64)
        .unwrap();

    let stored = queries
        .update()
        .set_values(values)
        .unwrap()
        .set_constraints(constraint)
        .unwrap()
        .run(&executor)
        .await
        .unwrap();

    let stored_values = stored.property_to_value().unwrap();
    assert_eq!(stored_values["userName"], Value::Text("renamed".into()));

    let calls = executor.calls();
    assert_eq!(
        calls[0].0,
        "UPDATE users SET username=:val1_username WHERE id=:val2_id;"
    );
    let binding_keys: Vec<_> = calls[0].1.keys().cloned().collect();
    assert_eq!(
        binding_keys,
        vec![":val1_username".to_string(), ":val2_id".to_string()]
    );
}

#[tokio::test]
async fn delete_reports_whether_rows_were_removed() {
    let maps = ValueMapFactory::new(registry());
    let queries = QueryFactory::new(maps.clone());
    let executor = ScriptedExecutor::new();
    executor.push_result(RawResult::from_rows_affected(1));
    executor.push_result(RawResult::from_rows_affected(0));

    let constraints = pgbroker::ConstraintFactory::new(maps, "User");

    let deleted = queries
        .delete()
        .set_constraints(constraints.equals("id", 1i64).unwrap())
        .unwrap()
        .run(&executor)
        .await
        .unwrap();
    assert!(deleted);

    let deleted = queries
        .delete()
        .set_constraints(constraints.equals("id", 2i64).unwrap())
        .unwrap()
        .run(&executor)
        .await
        .unwrap();
    assert!(!deleted);
}

#[tokio::test]
async fn executor_errors_surface_as_execution_errors() {
    let maps = ValueMapFactory::new(registry());
    let queries = QueryFactory::new(maps.clone());
    let executor = ScriptedExecutor::new();
    executor.push_error(ExecutionError::Connection("connection refused".into()));

    let constraint = pgbroker::ConstraintFactory::new(maps, "User").any().unwrap();
    let err = queries
        .select()
        .set_constraints(constraint)
        .unwrap()
        .run(&executor)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BrokerError::Execution(ExecutionError::Connection(_))
    ));
}

#[tokio::test]
async fn processors_reject_statements_missing_their_slot() {
    let maps = ValueMapFactory::new(registry());
    let executor = ScriptedExecutor::new();

    let err = SelectProcessor::new(maps)
        .process(&executor, RawResult::default(), &Statement::select())
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Internal(_)));
}

#[tokio::test]
async fn broker_save_inserts_when_no_identity_is_bound() {
    let executor = ScriptedExecutor::new();
    executor.push_result(RawResult::from_rows_affected(1));
    executor.set_insert_id(42);
    let broker = Broker::new(&executor, registry());

    let saved = broker
        .save(&User::new("alice", "alice@example.com"))
        .await
        .unwrap();
    assert_eq!(saved.id, Some(42));
    assert_eq!(saved.user_name, "alice");

    let calls = executor.calls();
    assert_eq!(
        calls[0].0,
        "INSERT INTO users (username, email) VALUES (:val1_username, :val1_email);"
    );
}

#[tokio::test]
async fn broker_save_updates_when_the_identity_is_bound() {
    let executor = ScriptedExecutor::new();
    executor.push_result(RawResult::from_rows_affected(1));
    let broker = Broker::new(&executor, registry());

    let mut user = User::new("alice", "alice@example.com");
    user.id = Some(7);
    let saved = broker.save(&user).await.unwrap();
    assert_eq!(saved.id, Some(7));

    let calls = executor.calls();
    assert_eq!(
        calls[0].0,
        "UPDATE users SET id=:val1_id, username=:val1_username, email=:val1_email \
         WHERE id=:val2_id;"
    );
    assert_eq!(calls[0].1[":val2_id"], Value::Int(7));
}

#[tokio::test]
async fn broker_get_maps_rows_back_to_entities() {
    let executor = ScriptedExecutor::new();
    executor.push_result(RawResult::from_rows([user_row(
        5,
        "carol",
        "carol@example.com",
    )]));
    let broker = Broker::new(&executor, registry());

    let users: Vec<User> = broker
        .get(broker.constraints("User").equals("id", 5i64).unwrap())
        .await
        .unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(
        users[0],
        User {
            id: Some(5),
            user_name: "carol".to_string(),
            email: "carol@example.com".to_string(),
        }
    );
}

#[tokio::test]
async fn broker_delete_errors_when_nothing_matches() {
    let executor = ScriptedExecutor::new();
    executor.push_result(RawResult::from_rows_affected(1));
    executor.push_result(RawResult::from_rows_affected(0));
    let broker = Broker::new(&executor, registry());

    broker
        .delete(broker.constraints("User").equals("id", 1i64).unwrap())
        .await
        .unwrap();

    let err = broker
        .delete(broker.constraints("User").equals("id", 2i64).unwrap())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
