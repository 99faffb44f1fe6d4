use futures::future::try_join3;

use crate::controllers::ScreenContext;
use crate::db::{
    AssigneeKind, Guest, GuestRepository, NewTask, Task, TaskRepository, Vendor, VendorRepository,
};
use crate::error::AppError;

/// Who a new task is assigned to. A reference is only meaningful together
/// with the kind it was chosen for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssigneeSelection {
    kind: Option<AssigneeKind>,
    reference: Option<String>,
}

impl AssigneeSelection {
    pub fn kind(&self) -> Option<AssigneeKind> {
        self.kind
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// Switching to a different kind drops the chosen reference.
    pub fn select_kind(&mut self, kind: Option<AssigneeKind>) {
        if self.kind != kind {
            self.reference = None;
        }
        self.kind = kind;
    }

    pub fn choose(&mut self, reference: &str) {
        self.reference = Some(reference.to_string());
    }

    /// No assignee at all, or a kind with a chosen reference.
    pub fn is_complete(&self) -> bool {
        self.kind.is_none() || self.reference.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssigneeOption {
    pub id: String,
    pub label: String,
}

pub struct TasksController {
    ctx: ScreenContext,
    tasks: Vec<Task>,
    guests: Vec<Guest>,
    vendors: Vec<Vendor>,
    title: String,
    assignee: AssigneeSelection,
    loading: bool,
}

impl TasksController {
    pub fn new(ctx: ScreenContext) -> Self {
        Self {
            ctx,
            tasks: Vec::new(),
            guests: Vec::new(),
            vendors: Vec::new(),
            title: String::new(),
            assignee: AssigneeSelection::default(),
            loading: false,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn assignee(&self) -> &AssigneeSelection {
        &self.assignee
    }

    pub fn select_kind(&mut self, kind: Option<AssigneeKind>) {
        self.assignee.select_kind(kind);
    }

    /// Picks a reference from the current options. Ids that are not offered
    /// for the selected kind are refused.
    pub fn choose_assignee(&mut self, reference: &str) -> bool {
        if !self.assignee_options().iter().any(|o| o.id == reference) {
            return false;
        }
        self.assignee.choose(reference);
        true
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Entities a task of the selected kind can point at. Officiants and
    /// venues are picked from the whole vendor list.
    pub fn assignee_options(&self) -> Vec<AssigneeOption> {
        match self.assignee.kind {
            None | Some(AssigneeKind::Other) => Vec::new(),
            Some(AssigneeKind::Guest) => self
                .guests
                .iter()
                .map(|g| AssigneeOption {
                    id: g.id.clone(),
                    label: g.name.clone(),
                })
                .collect(),
            Some(AssigneeKind::Vendor | AssigneeKind::Officiant | AssigneeKind::Venue) => self
                .vendors
                .iter()
                .map(|v| AssigneeOption {
                    id: v.id.clone(),
                    label: vendor_label(v),
                })
                .collect(),
        }
    }

    /// Display name of a task's assignee, if it still exists.
    pub fn assignee_label(&self, task: &Task) -> Option<String> {
        let reference = task.assignee_ref_id.as_deref()?;
        match task.assignee_kind? {
            AssigneeKind::Guest => self
                .guests
                .iter()
                .find(|g| g.id == reference)
                .map(|g| g.name.clone()),
            AssigneeKind::Other => None,
            _ => self
                .vendors
                .iter()
                .find(|v| v.id == reference)
                .map(vendor_label),
        }
    }

    pub fn can_add(&self) -> bool {
        !self.loading && !self.title.trim().is_empty() && self.assignee.is_complete()
    }

    pub async fn load(&mut self) -> Result<(), AppError> {
        let Some(wedding_id) = self.ctx.wedding.current() else {
            return Ok(());
        };
        self.loading = true;
        let gateway = self.ctx.gateway();
        let result = try_join3(
            TaskRepository::list(gateway, &wedding_id),
            GuestRepository::directory(gateway, &wedding_id),
            VendorRepository::list(gateway, &wedding_id),
        )
        .await;
        self.loading = false;

        let (tasks, guests, vendors) = self.ctx.report(result, "Failed to load tasks")?;
        if self.ctx.is_current(&wedding_id) {
            self.tasks = tasks;
            self.guests = guests;
            self.vendors = vendors;
        }
        Ok(())
    }

    pub async fn add(&mut self) -> Result<(), AppError> {
        let result = self.add_inner().await;
        self.ctx.report(result, "Failed to add task")?;
        self.title.clear();
        self.assignee = AssigneeSelection::default();
        let _ = self.load().await;
        Ok(())
    }

    async fn add_inner(&mut self) -> Result<(), AppError> {
        let wedding_id = self.ctx.require_wedding("tasks")?;
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::precondition("Missing title", "Give the task a title."));
        }
        if !self.assignee.is_complete() {
            return Err(AppError::precondition(
                "Missing assignee",
                "Choose who the task is assigned to.",
            ));
        }
        let task = NewTask {
            wedding_id,
            title: title.to_string(),
            assignee_kind: self.assignee.kind,
            assignee_ref_id: self.assignee.reference.clone(),
        };

        self.loading = true;
        let result = TaskRepository::insert(self.ctx.gateway(), &task).await;
        self.loading = false;
        result
    }

    pub async fn toggle_complete(&mut self, task_id: &str) -> Result<(), AppError> {
        let result = self.toggle_inner(task_id).await;
        self.ctx.report(result, "Failed to update task")?;
        let _ = self.load().await;
        Ok(())
    }

    async fn toggle_inner(&mut self, task_id: &str) -> Result<(), AppError> {
        let wedding_id = self.ctx.require_wedding("tasks")?;
        let completed = self
            .tasks
            .iter()
            .find(|t| t.id == task_id)
            .map(|t| t.completed)
            .ok_or_else(|| AppError::Validation(format!("Unknown task {task_id}")))?;

        self.loading = true;
        let result =
            TaskRepository::set_completed(self.ctx.gateway(), &wedding_id, task_id, !completed)
                .await;
        self.loading = false;
        result
    }
}

fn vendor_label(vendor: &Vendor) -> String {
    match vendor.kind.as_deref().filter(|k| !k.is_empty()) {
        Some(kind) => format!("{} ({})", vendor.name, kind),
        None => vendor.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::testing::{row, Harness};
    use crate::db::guests::GUESTS;
    use crate::db::tasks::TASKS;
    use crate::db::vendors::VENDORS;
    use serde_json::json;

    async fn seeded() -> (Harness, String, String) {
        let harness = Harness::new(Some("w1")).await;
        let guests = harness
            .gateway
            .seed(GUESTS, vec![row(json!({"wedding_id": "w1", "name": "Anna"}))]);
        let vendors = harness.gateway.seed(
            VENDORS,
            vec![row(json!({"wedding_id": "w1", "name": "Lumen", "type": "Photographer"}))],
        );
        let guest = guests[0]["id"].as_str().unwrap().to_string();
        let vendor = vendors[0]["id"].as_str().unwrap().to_string();
        (harness, guest, vendor)
    }

    #[tokio::test]
    async fn switching_kind_clears_the_reference() {
        let (harness, guest, vendor) = seeded().await;
        let mut tasks = TasksController::new(harness.context());
        tasks.load().await.unwrap();
        tasks.set_title("Book photographer");

        tasks.select_kind(Some(AssigneeKind::Vendor));
        assert!(!tasks.can_add());
        assert!(tasks.choose_assignee(&vendor));
        assert!(tasks.can_add());

        tasks.select_kind(Some(AssigneeKind::Guest));
        assert_eq!(tasks.assignee().reference(), None);
        assert!(!tasks.can_add());
        assert!(!tasks.choose_assignee(&vendor));
        assert!(tasks.choose_assignee(&guest));
        assert!(tasks.can_add());
    }

    #[tokio::test]
    async fn officiant_and_venue_offer_every_vendor() {
        let (harness, _, vendor) = seeded().await;
        let mut tasks = TasksController::new(harness.context());
        tasks.load().await.unwrap();

        for kind in [AssigneeKind::Vendor, AssigneeKind::Officiant, AssigneeKind::Venue] {
            tasks.select_kind(Some(kind));
            assert_eq!(
                tasks.assignee_options(),
                vec![AssigneeOption {
                    id: vendor.clone(),
                    label: "Lumen (Photographer)".to_string(),
                }]
            );
        }
        tasks.select_kind(None);
        assert!(tasks.assignee_options().is_empty());
    }

    #[tokio::test]
    async fn add_stores_the_assignment_and_resets_the_form() {
        let (harness, guest, _) = seeded().await;
        let mut tasks = TasksController::new(harness.context());
        tasks.load().await.unwrap();

        tasks.set_title("  Send invitations ");
        tasks.select_kind(Some(AssigneeKind::Guest));
        tasks.choose_assignee(&guest);
        tasks.add().await.unwrap();

        let rows = harness.gateway.rows(TASKS);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], json!("Send invitations"));
        assert_eq!(rows[0]["assignee_kind"], json!("guest"));
        assert_eq!(rows[0]["assignee_ref_id"], json!(guest));
        assert_eq!(tasks.title(), "");
        assert_eq!(tasks.assignee(), &AssigneeSelection::default());
        assert_eq!(tasks.assignee_label(&tasks.tasks()[0]).as_deref(), Some("Anna"));
    }

    #[tokio::test]
    async fn incomplete_assignment_is_refused() {
        let (harness, _, _) = seeded().await;
        let mut tasks = TasksController::new(harness.context());
        tasks.load().await.unwrap();
        harness.gateway.clear_calls();

        tasks.set_title("Rings");
        tasks.select_kind(Some(AssigneeKind::Venue));
        assert!(tasks.add().await.is_err());
        assert!(harness.gateway.calls().is_empty());
        assert_eq!(tasks.title(), "Rings");
    }

    #[tokio::test]
    async fn toggle_flips_completion() {
        let (harness, _, _) = seeded().await;
        harness.gateway.seed(
            TASKS,
            vec![row(json!({"wedding_id": "w1", "title": "Cake", "completed": false}))],
        );
        let mut tasks = TasksController::new(harness.context());
        tasks.load().await.unwrap();
        let id = tasks.tasks()[0].id.clone();

        tasks.toggle_complete(&id).await.unwrap();
        assert!(tasks.tasks()[0].completed);
        tasks.toggle_complete(&id).await.unwrap();
        assert!(!tasks.tasks()[0].completed);
    }

    #[tokio::test]
    async fn unknown_assignee_kind_still_loads() {
        let (harness, _, _) = seeded().await;
        harness.gateway.seed(
            TASKS,
            vec![row(json!({
                "wedding_id": "w1", "title": "Seating plan", "completed": false,
                "assignee_kind": "user", "assignee_ref_id": "u1"
            }))],
        );
        let mut tasks = TasksController::new(harness.context());
        tasks.load().await.unwrap();

        assert_eq!(tasks.tasks().len(), 1);
        assert_eq!(tasks.tasks()[0].assignee_kind, Some(AssigneeKind::Other));
        assert_eq!(tasks.assignee_label(&tasks.tasks()[0]), None);
        assert!("user".parse::<AssigneeKind>().is_err());
    }
}
