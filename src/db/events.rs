use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::db::models::TimelineEvent;
use crate::db::{from_rows, to_row, Gateway, Query};
use crate::error::AppError;

pub const TIMELINE_EVENTS: &str = "timeline_events";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventWrite {
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

pub struct EventRepository;

impl EventRepository {
    /// The event with the earliest start time, if the wedding has any.
    pub async fn upcoming(
        gateway: &dyn Gateway,
        wedding_id: &str,
    ) -> Result<Option<TimelineEvent>, AppError> {
        let events: Vec<TimelineEvent> = from_rows(
            gateway
                .select(
                    TIMELINE_EVENTS,
                    &Query::new()
                        .eq("wedding_id", wedding_id)
                        .order("starts_at")
                        .limit(1),
                )
                .await?,
        )?;
        Ok(events.into_iter().next())
    }

    pub async fn save(
        gateway: &dyn Gateway,
        wedding_id: &str,
        existing: Option<&TimelineEvent>,
        write: &EventWrite,
    ) -> Result<(), AppError> {
        match existing {
            Some(event) => {
                gateway
                    .update(
                        TIMELINE_EVENTS,
                        to_row(write)?,
                        &Query::new()
                            .eq("id", event.id.as_str())
                            .eq("wedding_id", wedding_id),
                    )
                    .await?;
            }
            None => {
                let mut row = to_row(write)?;
                row.insert("wedding_id".to_string(), json!(wedding_id));
                gateway.insert(TIMELINE_EVENTS, vec![row]).await?;
            }
        }
        Ok(())
    }
}
