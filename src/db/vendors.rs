use serde_json::json;

use crate::db::models::{Vendor, VendorStatus};
use crate::db::{from_rows, Gateway, Query, Row};
use crate::error::AppError;

pub const VENDORS: &str = "vendors";

pub struct VendorRepository;

impl VendorRepository {
    pub async fn list(gateway: &dyn Gateway, wedding_id: &str) -> Result<Vec<Vendor>, AppError> {
        from_rows(
            gateway
                .select(VENDORS, &Query::new().eq("wedding_id", wedding_id).order("name"))
                .await?,
        )
    }

    pub async fn insert(
        gateway: &dyn Gateway,
        wedding_id: &str,
        name: &str,
        kind: Option<&str>,
    ) -> Result<(), AppError> {
        let mut row = Row::new();
        row.insert("wedding_id".to_string(), json!(wedding_id));
        row.insert("name".to_string(), json!(name));
        row.insert("type".to_string(), json!(kind));
        row.insert("status".to_string(), serde_json::to_value(VendorStatus::default())?);
        gateway.insert(VENDORS, vec![row]).await?;
        Ok(())
    }

    pub async fn set_status(
        gateway: &dyn Gateway,
        wedding_id: &str,
        vendor_id: &str,
        status: VendorStatus,
    ) -> Result<(), AppError> {
        let mut values = Row::new();
        values.insert("status".to_string(), serde_json::to_value(status)?);
        gateway
            .update(
                VENDORS,
                values,
                &Query::new().eq("id", vendor_id).eq("wedding_id", wedding_id),
            )
            .await?;
        Ok(())
    }

    pub async fn delete(
        gateway: &dyn Gateway,
        wedding_id: &str,
        vendor_id: &str,
    ) -> Result<(), AppError> {
        gateway
            .delete(
                VENDORS,
                &Query::new().eq("id", vendor_id).eq("wedding_id", wedding_id),
            )
            .await
    }
}
