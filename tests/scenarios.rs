use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wedding_planner::auth::{AuthProvider, MemoryAuth};
use wedding_planner::controllers::BUDGET_CATEGORIES;
use wedding_planner::db::weddings::{WEDDINGS, WEDDING_MEMBERS};
use wedding_planner::db::MemoryGateway;
use wedding_planner::notice::RecordingNotifier;
use wedding_planner::state::{Flow, ACTIVE_WEDDING_KEY};
use wedding_planner::storage::{MemoryStore, SecureStore};
use wedding_planner::{App, AppParts};

struct Fixture {
    gateway: Arc<MemoryGateway>,
    auth: Arc<MemoryAuth>,
    store: Arc<MemoryStore>,
    notices: Arc<RecordingNotifier>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            gateway: Arc::new(MemoryGateway::new()),
            auth: Arc::new(MemoryAuth::new("123456")),
            store: Arc::new(MemoryStore::new()),
            notices: Arc::new(RecordingNotifier::new()),
        }
    }

    async fn start(&self) -> App {
        App::start(
            AppParts {
                gateway: self.gateway.clone(),
                auth: self.auth.clone(),
                store: self.store.clone(),
                notifier: self.notices.clone(),
            },
            None,
        )
        .await
        .unwrap()
    }
}

async fn wait_for_flow(app: &App, flow: Flow) {
    let mut flows = app.gate().subscribe();
    tokio::time::timeout(Duration::from_secs(2), flows.wait_for(|f| *f == Some(flow)))
        .await
        .expect("flow did not change in time")
        .unwrap();
}

#[tokio::test]
async fn signing_in_and_creating_a_wedding_reaches_main() {
    let fixture = Fixture::new();
    let app = fixture.start().await;
    assert_eq!(app.gate().ready().await, Some(Flow::Auth));

    let mut sign_in = app.sign_in();
    sign_in.send_code("u1@example.com").await.unwrap();
    sign_in.verify("u1@example.com", "123456").await.unwrap();
    wait_for_flow(&app, Flow::Onboarding).await;

    let user_id = app.sessions().user_id().unwrap();
    let mut onboarding = app.onboarding();
    onboarding.load().await.unwrap();
    assert!(onboarding.weddings().is_empty());

    let wedding_id = onboarding.create().await.unwrap();
    wait_for_flow(&app, Flow::Main).await;

    let weddings = fixture.gateway.rows(WEDDINGS);
    assert_eq!(weddings.len(), 1);
    assert_eq!(weddings[0]["title"], json!("Our Wedding"));
    let members = fixture.gateway.rows(WEDDING_MEMBERS);
    assert_eq!(members[0]["user_id"], json!(user_id));
    assert_eq!(members[0]["role"], json!("owner"));
    assert_eq!(app.wedding().current(), Some(wedding_id.clone()));
    assert_eq!(
        fixture.store.get(ACTIVE_WEDDING_KEY).await.unwrap(),
        Some(wedding_id)
    );
    app.shutdown();
}

#[tokio::test]
async fn empty_budget_shows_every_category_unset() {
    let fixture = Fixture::new();
    fixture.auth.sign_in_as("u1", "u1@example.com");
    fixture.store.set(ACTIVE_WEDDING_KEY, "w1").await.unwrap();
    let app = fixture.start().await;
    assert_eq!(app.gate().ready().await, Some(Flow::Main));

    let mut budget = app.budget();
    budget.load().await.unwrap();
    for category in BUDGET_CATEGORIES {
        assert_eq!(budget.planned_label(category), "Amount not set");
        assert_eq!(budget.actual_label(category), "Amount not set");
    }
    assert_eq!(budget.total_planned(), 0);
    assert!(fixture.notices.notices().is_empty());
    app.shutdown();
}

#[tokio::test]
async fn active_wedding_survives_a_restart_and_sign_out_clears_it() {
    let fixture = Fixture::new();
    fixture.auth.sign_in_as("u1", "u1@example.com");

    let app = fixture.start().await;
    assert_eq!(app.gate().ready().await, Some(Flow::Onboarding));
    app.wedding().set(Some("w1")).await.unwrap();
    app.shutdown();

    let app = fixture.start().await;
    assert_eq!(app.gate().ready().await, Some(Flow::Main));
    assert_eq!(app.wedding().current().as_deref(), Some("w1"));

    app.sign_in().sign_out().await.unwrap();
    wait_for_flow(&app, Flow::Auth).await;
    assert!(!fixture.store.contains(ACTIVE_WEDDING_KEY));
    assert!(fixture.auth.get_session().await.unwrap().is_none());
    app.shutdown();
}
