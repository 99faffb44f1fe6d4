use std::sync::Arc;

use chrono::NaiveDate;

use crate::auth::AuthProvider;
use crate::controllers::ScreenContext;
use crate::db::{NewWedding, WeddingMember, WeddingRepository, WeddingSummary};
use crate::error::AppError;
use crate::notice::Notice;

/// Roles a user can request when joining with a code, with their labels.
pub const JOIN_ROLES: [(&str, &str); 10] = [
    ("bride_groom", "Bride/Groom"),
    ("best_man", "Best man"),
    ("maid_of_honor", "Maid of honor"),
    ("bridesmaid", "Bridesmaid"),
    ("groomsman", "Groomsman"),
    ("planner", "Wedding planner"),
    ("officiant", "Officiant / Priest"),
    ("guest", "Guest"),
    ("vendor", "Vendor"),
    ("venue", "Venue"),
];

pub const OWNER_ROLE: &str = "owner";

pub fn role_label(role: &str) -> &str {
    if role == OWNER_ROLE {
        return "Owner";
    }
    JOIN_ROLES
        .iter()
        .find(|(key, _)| *key == role)
        .map(|(_, label)| *label)
        .unwrap_or(role)
}

/// Parses a `DDMMYYYY` date typed with any separators. Only empty input is
/// no date; anything else must carry exactly eight digits.
pub fn parse_wedding_date(input: &str) -> Result<Option<NaiveDate>, AppError> {
    if input.is_empty() {
        return Ok(None);
    }
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    let invalid = || AppError::Validation("Date must be DDMMYYYY".to_string());
    if digits.len() != 8 {
        return Err(invalid());
    }
    let (day, month, year) = (&digits[0..2], &digits[2..4], &digits[4..8]);
    let day: u32 = day.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, day)
        .map(Some)
        .ok_or_else(invalid)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateWeddingForm {
    pub title: String,
    /// `DDMMYYYY`
    pub date: String,
    pub venue: String,
}

impl Default for CreateWeddingForm {
    fn default() -> Self {
        Self {
            title: "Our Wedding".to_string(),
            date: String::new(),
            venue: String::new(),
        }
    }
}

impl CreateWeddingForm {
    fn to_new_wedding(&self) -> Result<NewWedding, AppError> {
        let title = self.title.trim();
        let venue = self.venue.trim();
        Ok(NewWedding {
            title: if title.is_empty() { "Our Wedding" } else { title }.to_string(),
            date: parse_wedding_date(&self.date)?,
            venue: (!venue.is_empty()).then(|| venue.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinForm {
    pub wedding_id: String,
    pub role: String,
    pub code: String,
}

impl Default for JoinForm {
    fn default() -> Self {
        Self {
            wedding_id: String::new(),
            role: JOIN_ROLES[0].0.to_string(),
            code: String::new(),
        }
    }
}

/// Shown while signed in without an active wedding: pick one of the user's
/// weddings, create a new one or join one with a code.
pub struct OnboardingController {
    ctx: ScreenContext,
    auth: Arc<dyn AuthProvider>,
    weddings: Vec<WeddingSummary>,
    pub create_form: CreateWeddingForm,
    pub join_form: JoinForm,
    loading: bool,
}

impl OnboardingController {
    pub fn new(ctx: ScreenContext, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            ctx,
            auth,
            weddings: Vec::new(),
            create_form: CreateWeddingForm::default(),
            join_form: JoinForm::default(),
            loading: false,
        }
    }

    pub fn weddings(&self) -> &[WeddingSummary] {
        &self.weddings
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn can_join(&self) -> bool {
        !self.loading
            && !self.join_form.wedding_id.trim().is_empty()
            && !self.join_form.code.trim().is_empty()
    }

    async fn user_id(&self) -> Result<Option<String>, AppError> {
        Ok(self.auth.get_user().await?.map(|user| user.id))
    }

    /// Loads the weddings the signed-in user belongs to. Does nothing
    /// without a user.
    pub async fn load(&mut self) -> Result<(), AppError> {
        self.loading = true;
        let result = async {
            match self.user_id().await? {
                Some(user_id) => {
                    WeddingRepository::list_for_user(self.ctx.gateway(), &user_id)
                        .await
                        .map(Some)
                }
                None => Ok(None),
            }
        }
        .await;
        self.loading = false;

        if let Some(weddings) = self.ctx.report(result, "Failed to load weddings")? {
            self.weddings = weddings;
        }
        Ok(())
    }

    /// Creates a wedding owned by the signed-in user and makes it active.
    /// Returns the new wedding id.
    pub async fn create(&mut self) -> Result<String, AppError> {
        self.loading = true;
        let result = self.create_inner().await;
        self.loading = false;
        let wedding_id = self.ctx.report(result, "Failed to create wedding")?;
        self.ctx
            .notifier
            .notify(Notice::info("Wedding created", "You can start planning now."));
        self.create_form = CreateWeddingForm::default();
        Ok(wedding_id)
    }

    async fn create_inner(&self) -> Result<String, AppError> {
        let user_id = self
            .user_id()
            .await?
            .ok_or_else(|| AppError::precondition("No user", "Sign in before creating a wedding."))?;
        let new_wedding = self.create_form.to_new_wedding()?;

        let wedding = WeddingRepository::create(self.ctx.gateway(), &new_wedding).await?;
        // A failed membership insert leaves the wedding row behind.
        WeddingRepository::add_member(
            self.ctx.gateway(),
            &WeddingMember {
                wedding_id: wedding.id.clone(),
                user_id,
                role: OWNER_ROLE.to_string(),
            },
        )
        .await?;
        self.ctx.wedding.set(Some(&wedding.id)).await?;
        tracing::info!(wedding_id = %wedding.id, "wedding created");
        Ok(wedding.id)
    }

    /// Asks the server to admit the user to a wedding with a shared code.
    pub async fn join(&mut self) -> Result<(), AppError> {
        self.loading = true;
        let result = self.join_inner().await;
        self.loading = false;
        self.ctx.report(result, "Failed to join wedding")?;
        self.ctx
            .notifier
            .notify(Notice::info("Joined", "Welcome to the wedding."));
        self.join_form = JoinForm::default();
        Ok(())
    }

    async fn join_inner(&self) -> Result<(), AppError> {
        let wedding_id = self.join_form.wedding_id.trim();
        let code = self.join_form.code.trim();
        if wedding_id.is_empty() || code.is_empty() {
            return Err(AppError::precondition(
                "Missing code",
                "Enter the wedding id and the code you were given.",
            ));
        }
        let role = self.join_form.role.as_str();
        if !JOIN_ROLES.iter().any(|(key, _)| *key == role) {
            return Err(AppError::Validation(format!("Unknown role {role}")));
        }

        let joined =
            WeddingRepository::join_with_code(self.ctx.gateway(), wedding_id, role, code).await?;
        if !joined {
            return Err(AppError::Validation("Invalid code".to_string()));
        }
        self.ctx.wedding.set(Some(wedding_id)).await
    }

    /// Makes one of the loaded weddings active.
    pub async fn open(&mut self, wedding_id: &str) -> Result<(), AppError> {
        let result = async {
            if !self.weddings.iter().any(|w| w.wedding_id == wedding_id) {
                return Err(AppError::precondition(
                    "Unknown wedding",
                    "You are not a member of that wedding.",
                ));
            }
            self.ctx.wedding.set(Some(wedding_id)).await
        }
        .await;
        self.ctx.report(result, "Failed to open wedding")
    }
}
