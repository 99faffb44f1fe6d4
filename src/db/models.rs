use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wedding {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub venue: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewWedding {
    pub title: String,
    pub date: Option<NaiveDate>,
    pub venue: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeddingMember {
    pub wedding_id: String,
    pub user_id: String,
    pub role: String,
}

/// A membership joined with the wedding it points at.
#[derive(Debug, Clone, PartialEq)]
pub struct WeddingSummary {
    pub wedding_id: String,
    pub role: String,
    pub wedding: Option<Wedding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpStatus {
    Yes,
    No,
    Maybe,
}

impl RsvpStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RsvpStatus::Yes => "yes",
            RsvpStatus::No => "no",
            RsvpStatus::Maybe => "maybe",
        }
    }
}

impl std::str::FromStr for RsvpStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" => Ok(RsvpStatus::Yes),
            "no" => Ok(RsvpStatus::No),
            "maybe" => Ok(RsvpStatus::Maybe),
            other => Err(format!("unknown RSVP status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rsvp {
    pub guest_id: String,
    pub status: RsvpStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guest {
    pub id: String,
    pub wedding_id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Merged in from the `rsvps` table; not a guest column.
    #[serde(skip)]
    pub rsvp_status: Option<RsvpStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssigneeKind {
    Guest,
    Vendor,
    Officiant,
    Venue,
    /// Any kind this client does not know, e.g. `user`. Such tasks still load.
    #[serde(other)]
    Other,
}

impl AssigneeKind {
    pub const ALL: [AssigneeKind; 4] = [
        AssigneeKind::Guest,
        AssigneeKind::Vendor,
        AssigneeKind::Officiant,
        AssigneeKind::Venue,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AssigneeKind::Guest => "guest",
            AssigneeKind::Vendor => "vendor",
            AssigneeKind::Officiant => "officiant",
            AssigneeKind::Venue => "venue",
            AssigneeKind::Other => "other",
        }
    }
}

impl std::str::FromStr for AssigneeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssigneeKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| format!("unknown assignee kind: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub wedding_id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub assignee_kind: Option<AssigneeKind>,
    #[serde(default)]
    pub assignee_ref_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTask {
    pub wedding_id: String,
    pub title: String,
    pub assignee_kind: Option<AssigneeKind>,
    pub assignee_ref_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorStatus {
    #[default]
    Researching,
    Contacted,
    Booked,
    Paid,
}

impl VendorStatus {
    pub fn label(self) -> &'static str {
        match self {
            VendorStatus::Researching => "Researching",
            VendorStatus::Contacted => "Contacted",
            VendorStatus::Booked => "Booked",
            VendorStatus::Paid => "Paid",
        }
    }
}

impl std::str::FromStr for VendorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "researching" => Ok(VendorStatus::Researching),
            "contacted" => Ok(VendorStatus::Contacted),
            "booked" => Ok(VendorStatus::Booked),
            "paid" => Ok(VendorStatus::Paid),
            other => Err(format!("unknown vendor status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: String,
    pub wedding_id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: VendorStatus,
}

/// One budget line. `id` is absent for categories that have no stored row yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub category: String,
    #[serde(default)]
    pub planned_cents: Option<i64>,
    #[serde(default)]
    pub actual_cents: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl BudgetItem {
    pub fn empty(category: &str) -> Self {
        BudgetItem {
            category: category.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: String,
    pub wedding_id: String,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}
