use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use uuid::Uuid;

use crate::db::{Gateway, Query, Row};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Select,
    Insert,
    Update,
    Upsert,
    Delete,
    Rpc,
}

pub type Tables = HashMap<String, Vec<Row>>;

type Procedure = Arc<dyn Fn(&mut Tables, &Value) -> Result<Value, AppError> + Send + Sync>;

/// In-process gateway. Rows live in memory, inserted rows get a v4 id, and
/// failures can be injected per table and verb.
#[derive(Default)]
pub struct MemoryGateway {
    tables: Mutex<Tables>,
    procedures: Mutex<HashMap<String, Procedure>>,
    failures: Mutex<HashMap<(String, Verb), String>>,
    calls: Mutex<Vec<(Verb, String)>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_procedure<F>(&self, name: &str, procedure: F)
    where
        F: Fn(&mut Tables, &Value) -> Result<Value, AppError> + Send + Sync + 'static,
    {
        self.procedures
            .lock()
            .insert(name.to_string(), Arc::new(procedure));
    }

    /// Makes every `verb` call against `table` fail with `message` until cleared.
    pub fn fail(&self, table: &str, verb: Verb, message: &str) {
        self.failures
            .lock()
            .insert((table.to_string(), verb), message.to_string());
    }

    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables.lock().get(table).cloned().unwrap_or_default()
    }

    pub fn seed(&self, table: &str, rows: Vec<Row>) -> Vec<Row> {
        let mut tables = self.tables.lock();
        let stored: Vec<Row> = rows.into_iter().map(with_id).collect();
        tables
            .entry(table.to_string())
            .or_default()
            .extend(stored.iter().cloned());
        stored
    }

    pub fn calls(&self) -> Vec<(Verb, String)> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn enter(&self, table: &str, verb: Verb) -> Result<(), AppError> {
        self.calls.lock().push((verb, table.to_string()));
        tracing::debug!(table, ?verb, "memory gateway call");
        match self.failures.lock().get(&(table.to_string(), verb)) {
            Some(message) => Err(AppError::gateway(message.clone())),
            None => Ok(()),
        }
    }
}

fn with_id(mut row: Row) -> Row {
    if !row.get("id").is_some_and(|id| !id.is_null()) {
        row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
    }
    row
}

fn merge(target: &mut Row, values: &Row) {
    for (key, value) in values {
        target.insert(key.clone(), value.clone());
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, AppError> {
        self.enter(table, Verb::Select)?;
        let tables = self.tables.lock();
        let mut rows: Vec<Row> = tables
            .get(table)
            .map(|rows| rows.iter().filter(|row| query.matches(row)).cloned().collect())
            .unwrap_or_default();
        query.sort(&mut rows);
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows.into_iter().map(|row| query.project(row)).collect())
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, AppError> {
        self.enter(table, Verb::Insert)?;
        let mut tables = self.tables.lock();
        let stored: Vec<Row> = rows.into_iter().map(with_id).collect();
        tables
            .entry(table.to_string())
            .or_default()
            .extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn update(
        &self,
        table: &str,
        values: Row,
        filter: &Query,
    ) -> Result<Vec<Row>, AppError> {
        self.enter(table, Verb::Update)?;
        let mut tables = self.tables.lock();
        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| filter.matches(row)) {
                merge(row, &values);
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Row>,
        on_conflict: &str,
    ) -> Result<Vec<Row>, AppError> {
        self.enter(table, Verb::Upsert)?;
        let keys: Vec<&str> = on_conflict
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .collect();
        let mut tables = self.tables.lock();
        let stored = tables.entry(table.to_string()).or_default();
        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            let existing = stored.iter_mut().find(|candidate| {
                !keys.is_empty() && keys.iter().all(|k| row.get(*k) == candidate.get(*k))
            });
            match existing {
                Some(candidate) => {
                    merge(candidate, &row);
                    result.push(candidate.clone());
                }
                None => {
                    let row = with_id(row);
                    stored.push(row.clone());
                    result.push(row);
                }
            }
        }
        Ok(result)
    }

    async fn delete(&self, table: &str, filter: &Query) -> Result<(), AppError> {
        self.enter(table, Verb::Delete)?;
        let mut tables = self.tables.lock();
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|row| !filter.matches(row));
        }
        Ok(())
    }

    async fn rpc(&self, function: &str, args: Value) -> Result<Value, AppError> {
        self.enter(function, Verb::Rpc)?;
        let procedure = self
            .procedures
            .lock()
            .get(function)
            .cloned()
            .ok_or_else(|| {
                AppError::gateway(format!("Could not find the function public.{function}"))
            })?;
        let mut tables = self.tables.lock();
        procedure(&mut tables, &args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => Row::new(),
        }
    }

    #[tokio::test]
    async fn upsert_merges_on_conflict_target() {
        let gateway = MemoryGateway::new();
        gateway
            .upsert("rsvps", vec![row(json!({"guest_id": "g1", "status": "yes"}))], "guest_id")
            .await
            .unwrap();
        gateway
            .upsert("rsvps", vec![row(json!({"guest_id": "g1", "status": "no"}))], "guest_id")
            .await
            .unwrap();

        let rows = gateway.rows("rsvps");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["status"], json!("no"));
    }

    #[tokio::test]
    async fn injected_failure_is_reported_as_gateway_error() {
        let gateway = MemoryGateway::new();
        gateway.fail("guests", Verb::Insert, "permission denied for table guests");
        let err = gateway
            .insert("guests", vec![row(json!({"name": "Anna"}))])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "permission denied for table guests");
        assert!(gateway.rows("guests").is_empty());
    }

    #[tokio::test]
    async fn update_and_delete_respect_filters() {
        let gateway = MemoryGateway::new();
        let stored = gateway.seed(
            "tasks",
            vec![
                row(json!({"wedding_id": "w1", "title": "Book DJ", "completed": false})),
                row(json!({"wedding_id": "w2", "title": "Book DJ", "completed": false})),
            ],
        );
        let id = stored[0]["id"].clone();

        let updated = gateway
            .update("tasks", row(json!({"completed": true})), &Query::new().eq("id", id.clone()))
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);

        gateway
            .delete("tasks", &Query::new().eq("wedding_id", "w2"))
            .await
            .unwrap();
        let rows = gateway.rows("tasks");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], id);
        assert_eq!(rows[0]["completed"], json!(true));
    }

    #[tokio::test]
    async fn unknown_procedure_is_an_error() {
        let gateway = MemoryGateway::new();
        assert!(gateway.rpc("nope", json!({})).await.is_err());
    }
}
