use std::collections::HashMap;

use serde::Serialize;
use serde_json::json;

use crate::db::models::{Guest, Rsvp, RsvpStatus};
use crate::db::{from_rows, to_row, Gateway, Query};
use crate::error::AppError;

pub const GUESTS: &str = "guests";
pub const RSVPS: &str = "rsvps";

/// Editable guest columns. Empty optional strings are stored as null.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuestFields {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl GuestFields {
    pub fn new(name: &str, email: &str, phone: &str) -> Self {
        GuestFields {
            name: name.trim().to_string(),
            email: non_empty(email),
            phone: non_empty(phone),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub struct GuestRepository;

impl GuestRepository {
    /// Guests of a wedding ordered by name, with their RSVP status merged in.
    pub async fn list(gateway: &dyn Gateway, wedding_id: &str) -> Result<Vec<Guest>, AppError> {
        let mut guests: Vec<Guest> = from_rows(
            gateway
                .select(GUESTS, &Query::new().eq("wedding_id", wedding_id).order("name"))
                .await?,
        )?;
        if guests.is_empty() {
            return Ok(guests);
        }

        let rsvps: Vec<Rsvp> = from_rows(
            gateway
                .select(
                    RSVPS,
                    &Query::new()
                        .columns("guest_id,status")
                        .is_in("guest_id", guests.iter().map(|g| g.id.clone())),
                )
                .await?,
        )?;
        let statuses: HashMap<String, RsvpStatus> =
            rsvps.into_iter().map(|r| (r.guest_id, r.status)).collect();
        for guest in &mut guests {
            guest.rsvp_status = statuses.get(&guest.id).copied();
        }
        Ok(guests)
    }

    /// Just enough of each guest to pick one from a list.
    pub async fn directory(gateway: &dyn Gateway, wedding_id: &str) -> Result<Vec<Guest>, AppError> {
        from_rows(
            gateway
                .select(
                    GUESTS,
                    &Query::new()
                        .columns("id,wedding_id,name")
                        .eq("wedding_id", wedding_id)
                        .order("name"),
                )
                .await?,
        )
    }

    pub async fn insert(
        gateway: &dyn Gateway,
        wedding_id: &str,
        fields: &GuestFields,
    ) -> Result<(), AppError> {
        let mut row = to_row(fields)?;
        row.insert("wedding_id".to_string(), json!(wedding_id));
        gateway.insert(GUESTS, vec![row]).await?;
        Ok(())
    }

    pub async fn update(
        gateway: &dyn Gateway,
        wedding_id: &str,
        guest_id: &str,
        fields: &GuestFields,
    ) -> Result<(), AppError> {
        gateway
            .update(
                GUESTS,
                to_row(fields)?,
                &Query::new().eq("id", guest_id).eq("wedding_id", wedding_id),
            )
            .await?;
        Ok(())
    }

    pub async fn delete(
        gateway: &dyn Gateway,
        wedding_id: &str,
        guest_id: &str,
    ) -> Result<(), AppError> {
        gateway
            .delete(
                GUESTS,
                &Query::new().eq("id", guest_id).eq("wedding_id", wedding_id),
            )
            .await
    }

    /// At most one RSVP row exists per guest; a repeated call overwrites it.
    pub async fn set_rsvp(
        gateway: &dyn Gateway,
        guest_id: &str,
        status: RsvpStatus,
    ) -> Result<(), AppError> {
        let rsvp = Rsvp {
            guest_id: guest_id.to_string(),
            status,
        };
        gateway.upsert(RSVPS, vec![to_row(&rsvp)?], "guest_id").await?;
        Ok(())
    }
}
