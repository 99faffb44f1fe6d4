use crate::controllers::ScreenContext;
use crate::db::{Guest, GuestFields, GuestRepository, RsvpStatus};
use crate::error::AppError;

/// Form used for both adding and editing a guest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestForm {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Badge text for a guest's RSVP.
pub fn rsvp_badge(status: Option<RsvpStatus>) -> &'static str {
    match status {
        Some(RsvpStatus::Yes) => "RSVP Yes",
        Some(RsvpStatus::Maybe) => "RSVP Maybe",
        Some(RsvpStatus::No) => "RSVP No",
        None => "No RSVP",
    }
}

/// Status chip text for a guest's RSVP.
pub fn rsvp_status_label(status: Option<RsvpStatus>) -> &'static str {
    match status {
        Some(RsvpStatus::Yes) => "Confirmed",
        Some(RsvpStatus::Maybe) => "Pending",
        Some(RsvpStatus::No) => "Declined",
        None => "Awaiting reply",
    }
}

pub struct GuestsController {
    ctx: ScreenContext,
    guests: Vec<Guest>,
    form: GuestForm,
    editing_id: Option<String>,
    loading: bool,
}

impl GuestsController {
    pub fn new(ctx: ScreenContext) -> Self {
        Self {
            ctx,
            guests: Vec::new(),
            form: GuestForm::default(),
            editing_id: None,
            loading: false,
        }
    }

    pub fn guests(&self) -> &[Guest] {
        &self.guests
    }

    pub fn form(&self) -> &GuestForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut GuestForm {
        &mut self.form
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing_id.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn can_submit(&self) -> bool {
        !self.loading && !self.form.name.trim().is_empty()
    }

    pub async fn load(&mut self) -> Result<(), AppError> {
        let Some(wedding_id) = self.ctx.wedding.current() else {
            return Ok(());
        };
        self.loading = true;
        let result = GuestRepository::list(self.ctx.gateway(), &wedding_id).await;
        self.loading = false;

        let guests = self.ctx.report(result, "Failed to load guests")?;
        if self.ctx.is_current(&wedding_id) {
            self.guests = guests;
        }
        Ok(())
    }

    /// Fills the form from `guest_id` and switches submit to update it.
    pub fn begin_edit(&mut self, guest_id: &str) -> bool {
        let Some(guest) = self.guests.iter().find(|g| g.id == guest_id) else {
            return false;
        };
        self.form = GuestForm {
            name: guest.name.clone(),
            email: guest.email.clone().unwrap_or_default(),
            phone: guest.phone.clone().unwrap_or_default(),
        };
        self.editing_id = Some(guest.id.clone());
        true
    }

    pub fn reset_form(&mut self) {
        self.form = GuestForm::default();
        self.editing_id = None;
    }

    /// Updates the guest being edited, or inserts a new one.
    pub async fn submit(&mut self) -> Result<(), AppError> {
        let result = self.submit_inner().await;
        self.ctx.report(result, "Failed to save guest")
    }

    async fn submit_inner(&mut self) -> Result<(), AppError> {
        let wedding_id = self.ctx.require_wedding("guests")?;
        if self.form.name.trim().is_empty() {
            return Err(AppError::precondition("Missing name", "Enter the guest's name."));
        }
        let fields = GuestFields::new(&self.form.name, &self.form.email, &self.form.phone);

        self.loading = true;
        let result = match &self.editing_id {
            Some(id) => GuestRepository::update(self.ctx.gateway(), &wedding_id, id, &fields).await,
            None => GuestRepository::insert(self.ctx.gateway(), &wedding_id, &fields).await,
        };
        self.loading = false;
        result?;

        self.reset_form();
        // Reload reports its own failure.
        let _ = self.load().await;
        Ok(())
    }

    pub async fn delete(&mut self, guest_id: &str) -> Result<(), AppError> {
        let result = self.delete_inner(guest_id).await;
        self.ctx.report(result, "Failed to delete guest")?;
        if self.editing_id.as_deref() == Some(guest_id) {
            self.reset_form();
        }
        let _ = self.load().await;
        Ok(())
    }

    async fn delete_inner(&mut self, guest_id: &str) -> Result<(), AppError> {
        let wedding_id = self.ctx.require_wedding("guests")?;
        self.loading = true;
        let result = GuestRepository::delete(self.ctx.gateway(), &wedding_id, guest_id).await;
        self.loading = false;
        result
    }

    /// Records `status` as the guest's only RSVP, replacing any earlier answer.
    pub async fn set_rsvp(&mut self, guest_id: &str, status: RsvpStatus) -> Result<(), AppError> {
        self.loading = true;
        let result = GuestRepository::set_rsvp(self.ctx.gateway(), guest_id, status).await;
        self.loading = false;
        self.ctx.report(result, "Failed to set RSVP")?;
        let _ = self.load().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::testing::{row, Harness};
    use crate::db::guests::{GUESTS, RSVPS};
    use crate::db::Verb;
    use serde_json::json;

    #[tokio::test]
    async fn lists_guests_by_name_with_rsvp() {
        let harness = Harness::new(Some("w1")).await;
        let seeded = harness.gateway.seed(
            GUESTS,
            vec![
                row(json!({"wedding_id": "w1", "name": "Zoe"})),
                row(json!({"wedding_id": "w1", "name": "Anna", "email": "anna@example.com"})),
                row(json!({"wedding_id": "w2", "name": "Bob"})),
            ],
        );
        let zoe = seeded[0]["id"].as_str().unwrap().to_string();
        harness
            .gateway
            .seed(RSVPS, vec![row(json!({"guest_id": zoe, "status": "maybe"}))]);

        let mut guests = GuestsController::new(harness.context());
        guests.load().await.unwrap();

        let names: Vec<_> = guests.guests().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Anna", "Zoe"]);
        assert_eq!(guests.guests()[0].rsvp_status, None);
        assert_eq!(guests.guests()[1].rsvp_status, Some(RsvpStatus::Maybe));
        assert_eq!(rsvp_badge(guests.guests()[1].rsvp_status), "RSVP Maybe");
        assert_eq!(rsvp_status_label(None), "Awaiting reply");
    }

    #[tokio::test]
    async fn rsvp_is_overwritten_not_appended() {
        let harness = Harness::new(Some("w1")).await;
        let seeded = harness
            .gateway
            .seed(GUESTS, vec![row(json!({"wedding_id": "w1", "name": "Anna"}))]);
        let id = seeded[0]["id"].as_str().unwrap().to_string();

        let mut guests = GuestsController::new(harness.context());
        guests.load().await.unwrap();
        guests.set_rsvp(&id, RsvpStatus::Yes).await.unwrap();
        guests.set_rsvp(&id, RsvpStatus::Maybe).await.unwrap();

        let rsvps = harness.gateway.rows(RSVPS);
        assert_eq!(rsvps.len(), 1);
        assert_eq!(rsvps[0]["status"], json!("maybe"));
        assert_eq!(guests.guests()[0].rsvp_status, Some(RsvpStatus::Maybe));
    }

    #[tokio::test]
    async fn submit_adds_then_edits() {
        let harness = Harness::new(Some("w1")).await;
        let mut guests = GuestsController::new(harness.context());
        guests.load().await.unwrap();

        guests.form_mut().name = "Anna".to_string();
        guests.form_mut().email = "  ".to_string();
        guests.submit().await.unwrap();
        assert_eq!(guests.guests().len(), 1);
        assert_eq!(guests.guests()[0].email, None);
        assert_eq!(guests.form(), &GuestForm::default());

        let id = guests.guests()[0].id.clone();
        assert!(guests.begin_edit(&id));
        guests.form_mut().phone = "+358 40 123".to_string();
        guests.submit().await.unwrap();

        let rows = harness.gateway.rows(GUESTS);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["phone"], json!("+358 40 123"));
        assert_eq!(guests.editing_id(), None);
    }

    #[tokio::test]
    async fn empty_name_is_refused_locally() {
        let harness = Harness::new(Some("w1")).await;
        let mut guests = GuestsController::new(harness.context());
        assert!(!guests.can_submit());
        assert!(guests.submit().await.is_err());
        assert!(harness.gateway.calls().is_empty());
        assert_eq!(harness.notices.last().unwrap().title, "Missing name");
    }

    #[tokio::test]
    async fn delete_failure_is_surfaced_and_clears_loading() {
        let harness = Harness::new(Some("w1")).await;
        let seeded = harness
            .gateway
            .seed(GUESTS, vec![row(json!({"wedding_id": "w1", "name": "Anna"}))]);
        let id = seeded[0]["id"].as_str().unwrap().to_string();
        let mut guests = GuestsController::new(harness.context());
        guests.load().await.unwrap();

        harness.gateway.fail(GUESTS, Verb::Delete, "permission denied");
        assert!(guests.delete(&id).await.is_err());
        assert!(!guests.is_loading());
        assert_eq!(guests.guests().len(), 1);
        assert_eq!(harness.notices.last().unwrap().message, "permission denied");

        harness.gateway.clear_failures();
        guests.delete(&id).await.unwrap();
        assert!(guests.guests().is_empty());
    }
}
