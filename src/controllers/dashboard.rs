use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::controllers::budget::BudgetController;
use crate::controllers::draft::{DraftController, DraftSchema};
use crate::controllers::ScreenContext;
use crate::db::{EventRepository, EventWrite, Gateway, TimelineEvent};
use crate::error::AppError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`, 24-hour
    pub time: String,
    pub location: String,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventField {
    Title,
    Date,
    Time,
    Location,
    Notes,
}

impl EventDraft {
    pub fn set(&mut self, field: EventField, value: impl Into<String>) {
        let value = value.into();
        match field {
            EventField::Title => self.title = value,
            EventField::Date => self.date = value,
            EventField::Time => self.time = value,
            EventField::Location => self.location = value,
            EventField::Notes => self.notes = value,
        }
    }
}

/// The wedding's single upcoming event: the one that starts first.
#[derive(Debug, Clone, Default)]
pub struct EventSchema;

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn parse_start(date: &str, time: &str) -> Result<chrono::DateTime<Utc>, AppError> {
    let invalid = || AppError::Validation("Date must be YYYY-MM-DD and time HH:MM".to_string());
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| invalid())?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M").map_err(|_| invalid())?;
    Ok(Utc.from_utc_datetime(&NaiveDateTime::new(date, time)))
}

#[async_trait]
impl DraftSchema for EventSchema {
    type Key = ();
    type Entity = Option<TimelineEvent>;
    type Draft = EventDraft;
    type Write = EventWrite;

    fn noun(&self) -> &'static str {
        "the event"
    }

    async fn fetch(
        &self,
        gateway: &dyn Gateway,
        wedding_id: &str,
    ) -> Result<Vec<((), Option<TimelineEvent>)>, AppError> {
        Ok(vec![((), EventRepository::upcoming(gateway, wedding_id).await?)])
    }

    fn draft_of(&self, event: &Option<TimelineEvent>) -> EventDraft {
        match event {
            Some(event) => EventDraft {
                title: event.title.clone(),
                date: event.starts_at.format("%Y-%m-%d").to_string(),
                time: event.starts_at.format("%H:%M").to_string(),
                location: event.location.clone().unwrap_or_default(),
                notes: event.notes.clone().unwrap_or_default(),
            },
            None => EventDraft::default(),
        }
    }

    fn prepare(
        &self,
        _key: &(),
        _event: &Option<TimelineEvent>,
        draft: &EventDraft,
    ) -> Result<EventWrite, AppError> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(AppError::precondition("Missing title", "Give the event a title."));
        }
        Ok(EventWrite {
            title: title.to_string(),
            starts_at: parse_start(&draft.date, &draft.time)?,
            location: optional(&draft.location),
            notes: optional(&draft.notes),
        })
    }

    async fn persist(
        &self,
        gateway: &dyn Gateway,
        wedding_id: &str,
        event: &Option<TimelineEvent>,
        write: &EventWrite,
    ) -> Result<(), AppError> {
        EventRepository::save(gateway, wedding_id, event.as_ref(), write).await
    }
}

pub type EventController = DraftController<EventSchema>;

impl DraftController<EventSchema> {
    pub fn upcoming(&self) -> Option<&TimelineEvent> {
        self.entity(&()).and_then(Option::as_ref)
    }

    pub fn set_field(&mut self, field: EventField, value: &str) -> bool {
        match self.draft_mut(&()) {
            Some(draft) => {
                draft.set(field, value);
                true
            }
            None => false,
        }
    }
}

/// Dashboard: the upcoming event editor and the budget widget.
pub struct DashboardController {
    pub event: EventController,
    pub budget: BudgetController,
}

impl DashboardController {
    pub fn new(ctx: ScreenContext) -> Self {
        Self {
            event: DraftController::new(ctx.clone(), EventSchema),
            budget: BudgetController::budget(ctx),
        }
    }

    /// Loads both editors. Each reports its own failure; the first is returned.
    pub async fn load(&mut self) -> Result<(), AppError> {
        let event = self.event.load().await;
        let budget = self.budget.load().await;
        event.and(budget)
    }

    pub fn budget_totals(&self) -> (i64, i64) {
        (self.budget.total_planned(), self.budget.total_actual())
    }
}
