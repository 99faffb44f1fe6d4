//! Remote data gateway: a table-scoped row store plus server procedures.

pub mod budget;
pub mod events;
pub mod guests;
pub mod memory;
pub mod models;
pub mod query;
pub mod rest;
pub mod tasks;
pub mod vendors;
pub mod weddings;

pub use budget::{BudgetRepository, BudgetWrite};
pub use events::{EventRepository, EventWrite};
pub use guests::{GuestFields, GuestRepository};
pub use memory::{MemoryGateway, Verb};
pub use models::{
    AssigneeKind, BudgetItem, Guest, NewTask, NewWedding, Rsvp, RsvpStatus, Task, TimelineEvent,
    Vendor, VendorStatus, Wedding, WeddingMember, WeddingSummary,
};
pub use query::{Filter, Order, Query};
pub use rest::RestGateway;
pub use tasks::TaskRepository;
pub use vendors::VendorRepository;
pub use weddings::WeddingRepository;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;

pub type Row = serde_json::Map<String, Value>;

#[async_trait]
pub trait Gateway: Send + Sync {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, AppError>;

    /// Inserts a batch and returns the stored rows.
    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, AppError>;

    async fn update(&self, table: &str, values: Row, filter: &Query)
        -> Result<Vec<Row>, AppError>;

    /// Inserts or merges rows, matching existing rows on the comma-separated
    /// `on_conflict` columns.
    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Row>,
        on_conflict: &str,
    ) -> Result<Vec<Row>, AppError>;

    async fn delete(&self, table: &str, filter: &Query) -> Result<(), AppError>;

    async fn rpc(&self, function: &str, args: Value) -> Result<Value, AppError>;
}

pub fn to_row<T: Serialize>(value: &T) -> Result<Row, AppError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(AppError::Internal(format!(
            "expected a JSON object for a row, got {other}"
        ))),
    }
}

pub fn from_row<T: DeserializeOwned>(row: Row) -> Result<T, AppError> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

pub fn from_rows<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>, AppError> {
    rows.into_iter().map(from_row).collect()
}

/// JavaScript-style truthiness, used for procedure results.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness_follows_procedure_conventions() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("ok")));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&Value::Null));
    }
}
