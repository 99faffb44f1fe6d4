//! Screen controllers.
//!
//! Each controller owns the state of one screen: what was last loaded from
//! the gateway, what the user is editing, and whether a request is in flight.
//! Handlers report every failure through the [`Notifier`] and always clear
//! their in-progress flag before returning.

pub mod budget;
pub mod dashboard;
pub mod draft;
pub mod edit;
pub mod guests;
pub mod money;
pub mod onboarding;
pub mod sign_in;
pub mod tasks;
pub mod vendors;

pub use budget::{BudgetController, BudgetDraft, BudgetField, BudgetSchema, BUDGET_CATEGORIES};
pub use dashboard::{DashboardController, EventController, EventDraft, EventField, EventSchema};
pub use draft::{DraftController, DraftSchema};
pub use edit::EditMode;
pub use guests::{GuestForm, GuestsController};
pub use onboarding::{CreateWeddingForm, OnboardingController, JOIN_ROLES};
pub use sign_in::SignInController;
pub use tasks::{AssigneeOption, AssigneeSelection, TasksController};
pub use vendors::{VendorForm, VendorsController};

use std::sync::Arc;

use crate::db::Gateway;
use crate::error::AppError;
use crate::notice::Notifier;
use crate::state::ActiveWedding;

/// Services every wedding-scoped screen needs.
#[derive(Clone)]
pub struct ScreenContext {
    pub gateway: Arc<dyn Gateway>,
    pub wedding: Arc<ActiveWedding>,
    pub notifier: Arc<dyn Notifier>,
}

impl ScreenContext {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        wedding: Arc<ActiveWedding>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            gateway,
            wedding,
            notifier,
        }
    }

    pub fn gateway(&self) -> &dyn Gateway {
        self.gateway.as_ref()
    }

    /// The active wedding id, or a precondition failure naming `what` the
    /// user was trying to manage.
    pub fn require_wedding(&self, what: &str) -> Result<String, AppError> {
        self.wedding.current().ok_or_else(|| {
            AppError::precondition(
                "No wedding selected",
                format!("Select a wedding before editing {what}."),
            )
        })
    }

    /// True when `wedding_id` is still the active wedding. Results of a load
    /// issued for another wedding are discarded.
    pub fn is_current(&self, wedding_id: &str) -> bool {
        self.wedding.current().as_deref() == Some(wedding_id)
    }

    /// Surfaces an error to the user and hands the result back unchanged.
    pub fn report<T>(&self, result: Result<T, AppError>, fallback: &str) -> Result<T, AppError> {
        if let Err(e) = &result {
            self.notifier.notify(e.notice(fallback));
        }
        result
    }
}
