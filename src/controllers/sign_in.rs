use std::sync::Arc;

use crate::auth::{AuthProvider, Session};
use crate::error::AppError;
use crate::notice::{Notice, Notifier};
use crate::state::ActiveWedding;

pub const MIN_CODE_LEN: usize = 4;

/// Email one-time-code sign-in, and sign-out.
pub struct SignInController {
    auth: Arc<dyn AuthProvider>,
    wedding: Arc<ActiveWedding>,
    notifier: Arc<dyn Notifier>,
    loading: bool,
}

impl SignInController {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        wedding: Arc<ActiveWedding>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            auth,
            wedding,
            notifier,
            loading: false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    fn report<T>(&self, result: Result<T, AppError>, fallback: &str) -> Result<T, AppError> {
        if let Err(e) = &result {
            self.notifier.notify(e.notice(fallback));
        }
        result
    }

    pub async fn send_code(&mut self, email: &str) -> Result<(), AppError> {
        let email = email.trim();
        let result = if email.is_empty() {
            Err(AppError::precondition("Missing email", "Enter your email address."))
        } else {
            self.loading = true;
            let result = self.auth.sign_in_with_otp(email).await;
            self.loading = false;
            result
        };
        self.report(result, "Failed to send code")?;
        self.notifier
            .notify(Notice::info("Check your email", "Enter the code you received."));
        Ok(())
    }

    pub async fn verify(&mut self, email: &str, code: &str) -> Result<Session, AppError> {
        let (email, code) = (email.trim(), code.trim());
        let result = if email.is_empty() {
            Err(AppError::precondition("Missing email", "Enter your email address."))
        } else if code.chars().count() < MIN_CODE_LEN {
            Err(AppError::Validation(format!(
                "The code must be at least {MIN_CODE_LEN} characters"
            )))
        } else {
            self.loading = true;
            let result = self.auth.verify_otp(email, code).await;
            self.loading = false;
            result
        };
        let session = self.report(result, "Failed to verify code")?;
        tracing::info!(user_id = %session.user.id, "signed in");
        Ok(session)
    }

    /// Ends the session and forgets the active wedding.
    pub async fn sign_out(&mut self) -> Result<(), AppError> {
        self.loading = true;
        let signed_out = self.auth.sign_out().await;
        let cleared = self.wedding.set(None).await;
        self.loading = false;
        self.report(signed_out.and(cleared), "Failed to sign out")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryAuth;
    use crate::notice::{NoticeLevel, RecordingNotifier};
    use crate::storage::MemoryStore;

    async fn controller(auth: Arc<MemoryAuth>) -> (SignInController, Arc<ActiveWedding>, Arc<RecordingNotifier>) {
        let wedding = Arc::new(ActiveWedding::new(Arc::new(MemoryStore::new())));
        wedding.init().await.unwrap();
        let notices = Arc::new(RecordingNotifier::new());
        let controller = SignInController::new(auth, wedding.clone(), notices.clone());
        (controller, wedding, notices)
    }

    #[tokio::test]
    async fn code_round_trip_signs_in() {
        let auth = Arc::new(MemoryAuth::new("123456"));
        let (mut sign_in, _, notices) = controller(auth.clone()).await;

        sign_in.send_code("a@example.com").await.unwrap();
        assert_eq!(notices.last().unwrap().title, "Check your email");
        assert_eq!(notices.last().unwrap().level, NoticeLevel::Info);

        let session = sign_in.verify("a@example.com", "123456").await.unwrap();
        assert_eq!(auth.get_session().await.unwrap(), Some(session));
    }

    #[tokio::test]
    async fn short_code_and_empty_email_never_reach_auth() {
        let auth = Arc::new(MemoryAuth::new("123456"));
        let (mut sign_in, _, notices) = controller(auth.clone()).await;

        assert!(matches!(
            sign_in.send_code("  ").await,
            Err(AppError::Precondition { .. })
        ));
        assert!(matches!(
            sign_in.verify("a@example.com", "12").await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(notices.notices().len(), 2);
        assert!(auth.get_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn wrong_code_is_reported() {
        let auth = Arc::new(MemoryAuth::new("123456"));
        let (mut sign_in, _, notices) = controller(auth).await;
        sign_in.send_code("a@example.com").await.unwrap();

        assert!(sign_in.verify("a@example.com", "654321").await.is_err());
        assert!(!sign_in.is_loading());
        assert_eq!(notices.last().unwrap().level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn sign_out_clears_active_wedding() {
        let auth = Arc::new(MemoryAuth::new("123456"));
        auth.sign_in_as("u1", "u1@example.com");
        let (mut sign_in, wedding, _) = controller(auth.clone()).await;
        wedding.set(Some("w1")).await.unwrap();

        sign_in.sign_out().await.unwrap();
        assert_eq!(wedding.current(), None);
        assert!(auth.get_session().await.unwrap().is_none());
    }
}
