use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;

use crate::db::models::BudgetItem;
use crate::db::{from_rows, to_row, Gateway, Query};
use crate::error::AppError;

pub const BUDGET_ITEMS: &str = "budget_items";

/// Normalized values written for one budget category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetWrite {
    pub planned_cents: i64,
    pub actual_cents: i64,
    pub notes: Option<String>,
    pub due_date: Option<NaiveDate>,
}

pub struct BudgetRepository;

impl BudgetRepository {
    /// Stored rows of `wedding_id` whose category is one of `categories`.
    pub async fn list(
        gateway: &dyn Gateway,
        wedding_id: &str,
        categories: &[&str],
    ) -> Result<Vec<BudgetItem>, AppError> {
        from_rows(
            gateway
                .select(
                    BUDGET_ITEMS,
                    &Query::new()
                        .columns("id,category,planned_cents,actual_cents,notes,due_date")
                        .eq("wedding_id", wedding_id)
                        .is_in("category", categories.iter().copied()),
                )
                .await?,
        )
    }

    /// Updates the row when `item` was loaded from storage, inserts otherwise.
    /// Never deletes.
    pub async fn save(
        gateway: &dyn Gateway,
        wedding_id: &str,
        item: &BudgetItem,
        write: &BudgetWrite,
    ) -> Result<(), AppError> {
        match &item.id {
            Some(id) => {
                gateway
                    .update(
                        BUDGET_ITEMS,
                        to_row(write)?,
                        &Query::new().eq("id", id.as_str()).eq("wedding_id", wedding_id),
                    )
                    .await?;
            }
            None => {
                let mut row = to_row(write)?;
                row.insert("wedding_id".to_string(), json!(wedding_id));
                row.insert("category".to_string(), json!(item.category));
                gateway.insert(BUDGET_ITEMS, vec![row]).await?;
            }
        }
        Ok(())
    }
}
