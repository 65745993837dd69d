//! Shared harness for the HTTP integration tests.
//!
//! Every [`TestApp`] owns its own file-backed SQLite database, so tests can
//! run in parallel without stepping on each other's sequences or fixtures.
//! The router is the same one `main` serves, minus the outer tower layers
//! that do not affect behavior under test.

use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use procurement_api::auth::{ActingUser, AllowAllPermissions, PermissionChecker};
use procurement_api::config::AppConfig;
use procurement_api::db;
use procurement_api::events::{self, Event, EventHandler, EventSender};
use procurement_api::handlers::AppServices;
use procurement_api::models::RequisitionPriority;
use procurement_api::services::requisitions::{
    CreateRequisitionRequest, RequisitionLineInput, RequisitionSnapshot,
};
use procurement_api::AppState;

/// Event handler that records everything it sees, for asserting on the
/// audit trail produced by an operation.
#[derive(Default)]
pub struct CapturingAuditHandler {
    events: Mutex<Vec<Event>>,
}

#[async_trait::async_trait]
impl EventHandler for CapturingAuditHandler {
    async fn handle_event(&self, event: Event) -> Result<(), String> {
        self.events
            .lock()
            .map_err(|e| format!("audit handler lock poisoned: {}", e))?
            .push(event);
        Ok(())
    }
}

impl CapturingAuditHandler {
    #[allow(dead_code)]
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().expect("audit handler lock").clone()
    }
}

pub struct TestApp {
    router: Router,
    pub state: AppState,
    #[allow(dead_code)]
    pub audit: Arc<CapturingAuditHandler>,
    _event_task: tokio::task::JoinHandle<()>,
    // Held so the database file outlives the app.
    _db_file: tempfile::NamedTempFile,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_permission_checker(Arc::new(AllowAllPermissions)).await
    }

    /// Builds the app with a specific permission checker, for tests that
    /// exercise authority failures at the approval gate.
    pub async fn with_permission_checker(checker: Arc<dyn PermissionChecker>) -> Self {
        let db_file = tempfile::NamedTempFile::new().expect("create temp database file");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_file.path().display()),
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.db_max_connections = 5;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("connect to test database");
        db::run_migrations(&pool)
            .await
            .expect("run migrations against test database");
        let db_pool = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
        let event_sender = EventSender::new(event_tx);
        let audit = Arc::new(CapturingAuditHandler::default());
        let handlers: Vec<Arc<dyn EventHandler>> = vec![audit.clone()];
        let event_task = tokio::spawn(events::process_events(event_rx, handlers));

        let services = AppServices::new(db_pool.clone(), Arc::new(event_sender.clone()), checker);

        let state = AppState {
            db: db_pool,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .nest("/api/v1", procurement_api::api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            audit,
            _event_task: event_task,
            _db_file: db_file,
        }
    }

    /// Sends one request through the router and returns the raw response.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json).expect("serialize request body"))
            }
            None => Body::empty(),
        };
        let request = builder.body(body).expect("build test request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router handled request")
    }

    /// Creates a draft requisition directly through the service layer, one
    /// line per entry in `quantities`.
    #[allow(dead_code)]
    pub async fn seed_draft_requisition(&self, quantities: &[Decimal]) -> RequisitionSnapshot {
        let lines = quantities
            .iter()
            .enumerate()
            .map(|(idx, qty)| RequisitionLineInput {
                item_id: Uuid::new_v4(),
                item_code: format!("ITM-{:03}", idx + 1),
                item_name: format!("Test item {}", idx + 1),
                item_description: None,
                unit_of_measure: "EA".to_string(),
                quantity_requested: *qty,
            })
            .collect();

        self.state
            .services
            .requisitions
            .create_requisition(CreateRequisitionRequest {
                requester_id: Uuid::new_v4(),
                requester_name: "Fixture Requester".to_string(),
                department: "Operations".to_string(),
                delivery_location: "Central store".to_string(),
                purpose: "Integration fixture".to_string(),
                required_date: Utc::now().date_naive(),
                priority: RequisitionPriority::Normal,
                lines,
            })
            .await
            .expect("seed draft requisition")
    }

    /// Creates, submits and approves a requisition so dispatch tests start
    /// from a fulfillable document.
    #[allow(dead_code)]
    pub async fn seed_approved_requisition(&self, quantities: &[Decimal]) -> RequisitionSnapshot {
        let draft = self.seed_draft_requisition(quantities).await;
        let approver = ActingUser::new(Uuid::new_v4(), "Fixture Approver");

        self.state
            .services
            .requisitions
            .submit_requisition(draft.id, approver.clone())
            .await
            .expect("seed submit");
        self.state
            .services
            .requisitions
            .approve_requisition(draft.id, approver)
            .await
            .expect("seed approve")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}
