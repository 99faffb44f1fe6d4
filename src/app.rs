//! Service container: builds the shared state once and hands out screen
//! controllers wired to it.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::auth::{spawn_refresher, AuthProvider, RestAuth};
use crate::client::ApiClient;
use crate::config::Config;
use crate::controllers::{
    BudgetController, DashboardController, GuestsController, OnboardingController,
    ScreenContext, SignInController, TasksController, VendorsController,
};
use crate::db::{Gateway, RestGateway};
use crate::error::AppError;
use crate::notice::Notifier;
use crate::state::{ActiveWedding, Flow, NavigationGate, SessionState};
use crate::storage::{FileStore, SecureStore};

/// The collaborators an [`App`] is built from.
pub struct AppParts {
    pub gateway: Arc<dyn Gateway>,
    pub auth: Arc<dyn AuthProvider>,
    pub store: Arc<dyn SecureStore>,
    pub notifier: Arc<dyn Notifier>,
}

pub struct App {
    gateway: Arc<dyn Gateway>,
    auth: Arc<dyn AuthProvider>,
    notifier: Arc<dyn Notifier>,
    sessions: Arc<SessionState>,
    wedding: Arc<ActiveWedding>,
    gate: NavigationGate,
    tasks: Vec<JoinHandle<()>>,
}

impl App {
    /// Resolves the stored wedding and the current session, then starts the
    /// navigation gate. With `refresh_every` set, sessions close to expiry
    /// are refreshed in the background.
    pub async fn start(parts: AppParts, refresh_every: Option<Duration>) -> Result<Self, AppError> {
        let wedding = Arc::new(ActiveWedding::new(parts.store));
        if let Err(e) = wedding.init().await {
            tracing::warn!("Could not read the active wedding: {}", e);
        }

        let sessions = Arc::new(SessionState::new());
        let mut tasks = vec![sessions.start(parts.auth.clone()).await];
        let gate = NavigationGate::spawn(sessions.subscribe(), wedding.subscribe());

        if let Some(every) = refresh_every {
            tasks.push(spawn_refresher(parts.auth.clone(), every));
            tracing::info!("✅ Session refresh task started (every {}s)", every.as_secs());
        }
        tracing::info!(flow = ?gate.current(), "client started");

        Ok(Self {
            gateway: parts.gateway,
            auth: parts.auth,
            notifier: parts.notifier,
            sessions,
            wedding,
            gate,
            tasks,
        })
    }

    /// Connects to the hosted backend described by `config`.
    pub async fn connect(config: &Config, notifier: Arc<dyn Notifier>) -> Result<Self, AppError> {
        let store: Arc<dyn SecureStore> = Arc::new(FileStore::open(&config.storage_dir).await?);
        tracing::info!("✅ Secure storage opened: {}", config.storage_dir.display());

        let api = ApiClient::new(config)?;
        let auth = Arc::new(RestAuth::restore(api.clone(), store.clone()).await?);
        tracing::info!("✅ Stored session restored");

        let gateway = Arc::new(RestGateway::new(api, auth.clone()));
        tracing::info!("✅ Backend configured: {}", config.supabase_url);

        Self::start(
            AppParts {
                gateway,
                auth,
                store,
                notifier,
            },
            Some(Duration::from_secs(config.session_refresh_interval_secs)),
        )
        .await
    }

    pub fn auth(&self) -> &Arc<dyn AuthProvider> {
        &self.auth
    }

    pub fn sessions(&self) -> &Arc<SessionState> {
        &self.sessions
    }

    pub fn wedding(&self) -> &Arc<ActiveWedding> {
        &self.wedding
    }

    pub fn gate(&self) -> &NavigationGate {
        &self.gate
    }

    pub fn flow(&self) -> Option<Flow> {
        self.gate.current()
    }

    pub fn context(&self) -> ScreenContext {
        ScreenContext::new(
            self.gateway.clone(),
            self.wedding.clone(),
            self.notifier.clone(),
        )
    }

    pub fn sign_in(&self) -> SignInController {
        SignInController::new(
            self.auth.clone(),
            self.wedding.clone(),
            self.notifier.clone(),
        )
    }

    pub fn onboarding(&self) -> OnboardingController {
        OnboardingController::new(self.context(), self.auth.clone())
    }

    pub fn dashboard(&self) -> DashboardController {
        DashboardController::new(self.context())
    }

    pub fn guests(&self) -> GuestsController {
        GuestsController::new(self.context())
    }

    pub fn tasks(&self) -> TasksController {
        TasksController::new(self.context())
    }

    pub fn vendors(&self) -> VendorsController {
        VendorsController::new(self.context())
    }

    pub fn budget(&self) -> BudgetController {
        BudgetController::budget(self.context())
    }

    /// Stops the background tasks. The gate stops when dropped.
    pub fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        tracing::debug!("client stopped");
    }
}
