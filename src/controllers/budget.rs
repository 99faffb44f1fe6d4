use async_trait::async_trait;
use chrono::NaiveDate;

use crate::controllers::draft::{DraftController, DraftSchema};
use crate::controllers::money::{cents_to_input, format_amount, normalize_amount};
use crate::controllers::ScreenContext;
use crate::db::{BudgetItem, BudgetRepository, BudgetWrite, Gateway};
use crate::error::AppError;

/// Budget categories shown by the budget screen and the dashboard widget.
pub const BUDGET_CATEGORIES: [&str; 7] = [
    "Hair",
    "Make-up",
    "Officiator",
    "DJ",
    "Dress",
    "Suit",
    "Wedding party outfits",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BudgetDraft {
    pub planned: String,
    pub actual: String,
    pub notes: String,
    pub due_date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetField {
    Planned,
    Actual,
    Notes,
    DueDate,
}

impl BudgetDraft {
    pub fn set(&mut self, field: BudgetField, value: impl Into<String>) {
        let value = value.into();
        match field {
            BudgetField::Planned => self.planned = value,
            BudgetField::Actual => self.actual = value,
            BudgetField::Notes => self.notes = value,
            BudgetField::DueDate => self.due_date = value,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BudgetSchema;

#[async_trait]
impl DraftSchema for BudgetSchema {
    type Key = String;
    type Entity = BudgetItem;
    type Draft = BudgetDraft;
    type Write = BudgetWrite;

    fn noun(&self) -> &'static str {
        "budget items"
    }

    async fn fetch(
        &self,
        gateway: &dyn Gateway,
        wedding_id: &str,
    ) -> Result<Vec<(String, BudgetItem)>, AppError> {
        let mut stored = BudgetRepository::list(gateway, wedding_id, &BUDGET_CATEGORIES).await?;
        Ok(BUDGET_CATEGORIES
            .iter()
            .map(|category| {
                let item = stored
                    .iter()
                    .position(|item| item.category == *category)
                    .map(|i| stored.swap_remove(i))
                    .unwrap_or_else(|| BudgetItem::empty(category));
                (category.to_string(), item)
            })
            .collect())
    }

    fn draft_of(&self, item: &BudgetItem) -> BudgetDraft {
        BudgetDraft {
            planned: cents_to_input(item.planned_cents),
            actual: cents_to_input(item.actual_cents),
            notes: item.notes.clone().unwrap_or_default(),
            due_date: item
                .due_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }

    fn prepare(
        &self,
        key: &String,
        _item: &BudgetItem,
        draft: &BudgetDraft,
    ) -> Result<BudgetWrite, AppError> {
        let notes = draft.notes.trim();
        let due = draft.due_date.trim();
        let due_date = if due.is_empty() {
            None
        } else {
            Some(NaiveDate::parse_from_str(due, "%Y-%m-%d").map_err(|_| {
                AppError::Validation(format!("Due date for {key} must be YYYY-MM-DD"))
            })?)
        };
        Ok(BudgetWrite {
            planned_cents: normalize_amount(&draft.planned),
            actual_cents: normalize_amount(&draft.actual),
            notes: (!notes.is_empty()).then(|| notes.to_string()),
            due_date,
        })
    }

    async fn persist(
        &self,
        gateway: &dyn Gateway,
        wedding_id: &str,
        item: &BudgetItem,
        write: &BudgetWrite,
    ) -> Result<(), AppError> {
        BudgetRepository::save(gateway, wedding_id, item, write).await
    }
}

pub type BudgetController = DraftController<BudgetSchema>;

impl DraftController<BudgetSchema> {
    pub fn budget(ctx: ScreenContext) -> Self {
        DraftController::new(ctx, BudgetSchema)
    }

    /// Sets one draft field while editing. Returns false otherwise or for an
    /// unknown category.
    pub fn set_field(&mut self, category: &str, field: BudgetField, value: &str) -> bool {
        match self.draft_mut(&category.to_string()) {
            Some(draft) => {
                draft.set(field, value);
                true
            }
            None => false,
        }
    }

    /// Sum of planned amounts; saturates instead of overflowing.
    pub fn total_planned(&self) -> i64 {
        self.entries()
            .iter()
            .map(|(_, item)| item.planned_cents.unwrap_or(0))
            .fold(0, i64::saturating_add)
    }

    pub fn total_actual(&self) -> i64 {
        self.entries()
            .iter()
            .map(|(_, item)| item.actual_cents.unwrap_or(0))
            .fold(0, i64::saturating_add)
    }

    pub fn planned_label(&self, category: &str) -> String {
        format_amount(
            self.entity(&category.to_string())
                .and_then(|item| item.planned_cents),
        )
    }

    pub fn actual_label(&self, category: &str) -> String {
        format_amount(
            self.entity(&category.to_string())
                .and_then(|item| item.actual_cents),
        )
    }
}
