#![allow(dead_code)]

use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlframe::{Driver, Error, Executor, Result, Row, Value};

#[derive(Default)]
struct State {
    statements: Vec<(String, Vec<Value>)>,
    rows: VecDeque<Vec<Row>>,
    next_id: i64,
    fail_on: Option<String>,
}

/// Records every statement and answers queries with scripted rows.
#[derive(Clone)]
pub struct FakeExecutor {
    driver: Driver,
    state: Arc<Mutex<State>>,
}

impl FakeExecutor {
    pub fn new(driver: Driver) -> Self {
        Self {
            driver,
            state: Arc::new(Mutex::new(State {
                next_id: 1,
                ..Default::default()
            })),
        }
    }

    pub fn mysql() -> Self {
        Self::new(Driver::MySql)
    }

    pub fn postgres() -> Self {
        Self::new(Driver::Postgres)
    }

    /// Queues the result of the next row-returning statement.
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.state.lock().rows.push_back(rows);
    }

    pub fn set_next_id(&self, id: i64) {
        self.state.lock().next_id = id;
    }

    /// Fails every statement containing `fragment`.
    pub fn fail_on(&self, fragment: &str) {
        self.state.lock().fail_on = Some(fragment.to_owned());
    }

    pub fn statements(&self) -> Vec<(String, Vec<Value>)> {
        self.state.lock().statements.clone()
    }

    pub fn sql(&self) -> Vec<String> {
        self.statements().into_iter().map(|(sql, _)| sql).collect()
    }

    pub fn last(&self) -> Option<(String, Vec<Value>)> {
        self.state.lock().statements.last().cloned()
    }

    pub fn clear(&self) {
        self.state.lock().statements.clear();
    }

    fn record(&self, sql: &str, binds: Vec<Value>) -> Result<()> {
        let mut state = self.state.lock();

        if let Some(fragment) = &state.fail_on {
            if sql.contains(fragment.as_str()) {
                return Err(Error::Builder(format!("scripted failure: {sql}")));
            }
        }

        state.statements.push((sql.to_owned(), binds));

        Ok(())
    }
}

#[async_trait]
impl Executor for FakeExecutor {
    fn driver(&self) -> Driver {
        self.driver
    }

    async fn execute(&self, sql: &str, binds: Vec<Value>) -> Result<u64> {
        self.record(sql, binds)?;

        Ok(1)
    }

    async fn fetch_all(&self, sql: &str, binds: Vec<Value>) -> Result<Vec<Row>> {
        self.record(sql, binds)?;

        Ok(self.state.lock().rows.pop_front().unwrap_or_default())
    }

    async fn insert(&self, sql: &str, binds: Vec<Value>, _id_column: &str) -> Result<Option<i64>> {
        self.record(sql, binds)?;

        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;

        Ok(Some(id))
    }
}

pub fn row<const N: usize>(columns: [(&str, Value); N]) -> Row {
    columns
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value))
        .collect()
}
