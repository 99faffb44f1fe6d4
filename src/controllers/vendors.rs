use crate::controllers::ScreenContext;
use crate::db::{Vendor, VendorRepository, VendorStatus};
use crate::error::AppError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorForm {
    pub name: String,
    /// Free text such as "Photographer" or "Venue".
    pub kind: String,
}

pub struct VendorsController {
    ctx: ScreenContext,
    vendors: Vec<Vendor>,
    form: VendorForm,
    loading: bool,
}

impl VendorsController {
    pub fn new(ctx: ScreenContext) -> Self {
        Self {
            ctx,
            vendors: Vec::new(),
            form: VendorForm::default(),
            loading: false,
        }
    }

    pub fn vendors(&self) -> &[Vendor] {
        &self.vendors
    }

    pub fn form(&self) -> &VendorForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut VendorForm {
        &mut self.form
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn can_add(&self) -> bool {
        !self.loading && !self.form.name.trim().is_empty()
    }

    pub async fn load(&mut self) -> Result<(), AppError> {
        let Some(wedding_id) = self.ctx.wedding.current() else {
            return Ok(());
        };
        self.loading = true;
        let result = VendorRepository::list(self.ctx.gateway(), &wedding_id).await;
        self.loading = false;

        let vendors = self.ctx.report(result, "Failed to load vendors")?;
        if self.ctx.is_current(&wedding_id) {
            self.vendors = vendors;
        }
        Ok(())
    }

    pub async fn add(&mut self) -> Result<(), AppError> {
        let result = self.add_inner().await;
        self.ctx.report(result, "Failed to add vendor")?;
        self.form = VendorForm::default();
        let _ = self.load().await;
        Ok(())
    }

    async fn add_inner(&mut self) -> Result<(), AppError> {
        let wedding_id = self.ctx.require_wedding("vendors")?;
        let name = self.form.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::precondition("Missing name", "Enter the vendor's name."));
        }
        let kind = self.form.kind.trim().to_string();
        let kind = (!kind.is_empty()).then_some(kind);

        self.loading = true;
        let result =
            VendorRepository::insert(self.ctx.gateway(), &wedding_id, &name, kind.as_deref()).await;
        self.loading = false;
        result
    }

    pub async fn set_status(&mut self, vendor_id: &str, status: VendorStatus) -> Result<(), AppError> {
        let result = async {
            let wedding_id = self.ctx.require_wedding("vendors")?;
            VendorRepository::set_status(self.ctx.gateway(), &wedding_id, vendor_id, status).await
        }
        .await;
        self.ctx.report(result, "Failed to update vendor")?;
        let _ = self.load().await;
        Ok(())
    }

    pub async fn delete(&mut self, vendor_id: &str) -> Result<(), AppError> {
        let result = async {
            let wedding_id = self.ctx.require_wedding("vendors")?;
            VendorRepository::delete(self.ctx.gateway(), &wedding_id, vendor_id).await
        }
        .await;
        self.ctx.report(result, "Failed to delete vendor")?;
        let _ = self.load().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::testing::Harness;
    use crate::db::vendors::VENDORS;
    use crate::db::Verb;
    use serde_json::json;

    #[tokio::test]
    async fn new_vendors_start_researching() {
        let harness = Harness::new(Some("w1")).await;
        let mut vendors = VendorsController::new(harness.context());
        vendors.form_mut().name = "Lumen".to_string();
        vendors.form_mut().kind = "Photographer".to_string();
        vendors.add().await.unwrap();

        assert_eq!(vendors.vendors().len(), 1);
        let vendor = &vendors.vendors()[0];
        assert_eq!(vendor.kind.as_deref(), Some("Photographer"));
        assert_eq!(vendor.status, VendorStatus::Researching);
        assert_eq!(vendors.form(), &VendorForm::default());
    }

    #[tokio::test]
    async fn status_changes_and_delete() {
        let harness = Harness::new(Some("w1")).await;
        let mut vendors = VendorsController::new(harness.context());
        vendors.form_mut().name = "Chapel".to_string();
        vendors.add().await.unwrap();
        let id = vendors.vendors()[0].id.clone();

        vendors.set_status(&id, VendorStatus::Booked).await.unwrap();
        assert_eq!(harness.gateway.rows(VENDORS)[0]["status"], json!("booked"));
        assert_eq!(vendors.vendors()[0].status.label(), "Booked");

        vendors.delete(&id).await.unwrap();
        assert!(vendors.vendors().is_empty());
    }

    #[tokio::test]
    async fn failed_insert_keeps_the_form() {
        let harness = Harness::new(Some("w1")).await;
        harness.gateway.fail(VENDORS, Verb::Insert, "permission denied for table vendors");
        let mut vendors = VendorsController::new(harness.context());
        vendors.form_mut().name = "DJ Sam".to_string();

        assert!(vendors.add().await.is_err());
        assert_eq!(vendors.form().name, "DJ Sam");
        assert!(!vendors.is_loading());
        assert_eq!(
            harness.notices.last().unwrap().message,
            "permission denied for table vendors"
        );
    }
}
