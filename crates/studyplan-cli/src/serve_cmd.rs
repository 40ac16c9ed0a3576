use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use studyplan_core::history::HistoryStore;
use studyplan_core::plan::{PlanGenerator, PlanOutcome, ValidationError, validate_submission};
use studyplan_db::models::{HistoryEntry, NewHistoryEntry};

use crate::page::{FormValues, PageView, render_page};

pub const MISSING_FIELDS_BANNER: &str = "Please fill in all fields";
pub const BAD_DEADLINES_BANNER: &str = "Error in deadlines format";
pub const EMPTY_RESPONSE_BANNER: &str = "Error: AI response was empty";
pub const SAVE_FAILED_BANNER: &str = "Error: could not save study plan";

// ---------------------------------------------------------------------------
// State and error type
// ---------------------------------------------------------------------------

/// Shared, immutable per-process state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn HistoryStore>,
    pub generator: Arc<PlanGenerator>,
}

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(status = %self.status, message = %self.message, "request failed");
        let body = maud::html! {
            (maud::DOCTYPE)
            html { head { title { "Study Planner - error" } } body {
                h1 { (self.status.as_u16()) }
                p { "Something went wrong while loading your study plans." }
            } }
        };
        (self.status, Html(body.into_string())).into_response()
    }
}

/// Raw form fields; absent fields are `None`.
#[derive(Debug, Default, Deserialize)]
pub struct PlanForm {
    pub syllabus: Option<String>,
    pub deadlines: Option<String>,
    pub available_time: Option<String>,
}

impl PlanForm {
    fn values(&self) -> FormValues<'_> {
        FormValues {
            syllabus: self.syllabus.as_deref().unwrap_or_default(),
            deadlines: self.deadlines.as_deref().unwrap_or_default(),
            available_time: self.available_time.as_deref().unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/healthz", get(healthz))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!("studyplan listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("studyplan shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn healthz() -> &'static str {
    "ok"
}

async fn index(State(state): State<AppState>) -> Result<Response, AppError> {
    let history = load_history(&state).await?;
    Ok(page(None, None, FormValues::default(), &history))
}

async fn submit(
    State(state): State<AppState>,
    Form(form): Form<PlanForm>,
) -> Result<Response, AppError> {
    let input = match validate_submission(
        form.syllabus.as_deref(),
        form.deadlines.as_deref(),
        form.available_time.as_deref(),
    ) {
        Ok(input) => input,
        Err(e) => {
            let banner = match &e {
                ValidationError::MissingField(_) => MISSING_FIELDS_BANNER,
                ValidationError::MalformedDeadlines { .. } => BAD_DEADLINES_BANNER,
            };
            info!(reason = %e, "submission rejected");
            let history = load_history(&state).await?;
            return Ok(page(None, Some(banner), form.values(), &history));
        }
    };

    let study_plan = match state.generator.generate(&input).await {
        PlanOutcome::Generated(html) => html,
        PlanOutcome::Empty => {
            let history = load_history(&state).await?;
            return Ok(page(None, Some(EMPTY_RESPONSE_BANNER), form.values(), &history));
        }
    };

    let entry = NewHistoryEntry {
        syllabus: input.syllabus,
        deadlines: input.canonical_deadlines,
        available_time: input.available_time,
        study_plan: study_plan.clone(),
    };
    if let Err(e) = state.store.append(entry).await {
        error!(error = %e, "failed to save study plan");
        let history = load_history(&state).await?;
        return Ok(page(None, Some(SAVE_FAILED_BANNER), form.values(), &history));
    }

    let history = load_history(&state).await?;
    Ok(page(Some(&study_plan), None, FormValues::default(), &history))
}

async fn load_history(state: &AppState) -> Result<Vec<HistoryEntry>, AppError> {
    state.store.list_all().await.map_err(AppError::internal)
}

fn page(
    study_plan: Option<&str>,
    error: Option<&str>,
    form: FormValues<'_>,
    history: &[HistoryEntry],
) -> Response {
    let view = PageView {
        study_plan,
        error,
        form,
        history,
    };
    Html(render_page(&view).into_string()).into_response()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::anyhow;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use chrono::{TimeZone, Utc};
    use tower::ServiceExt;

    use studyplan_core::completion::{
        ChatCompletionRequest, ChatCompletionResponse, CompletionClient,
    };
    use studyplan_core::history::{PersistenceError, PgHistoryStore};
    use studyplan_test_utils::{create_test_db, drop_test_db, seed_entry};

    use super::*;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// In-memory store; `fail_appends` simulates a broken database on write.
    #[derive(Default)]
    struct MemoryStore {
        entries: Mutex<Vec<HistoryEntry>>,
        fail_appends: bool,
    }

    #[async_trait]
    impl HistoryStore for MemoryStore {
        async fn append(&self, entry: NewHistoryEntry) -> Result<HistoryEntry, PersistenceError> {
            if self.fail_appends {
                return Err(anyhow!("database is unreachable").into());
            }
            let mut entries = self.entries.lock().unwrap();
            let stored = HistoryEntry {
                id: entries.len() as i64 + 1,
                syllabus: entry.syllabus,
                deadlines: entry.deadlines,
                available_time: entry.available_time,
                study_plan: entry.study_plan,
                created_at: Utc::now(),
            };
            entries.push(stored.clone());
            Ok(stored)
        }

        async fn list_all(&self) -> Result<Vec<HistoryEntry>, PersistenceError> {
            let mut all = self.entries.lock().unwrap().clone();
            all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok(all)
        }
    }

    /// Store whose reads always fail.
    struct BrokenStore;

    #[async_trait]
    impl HistoryStore for BrokenStore {
        async fn append(&self, _entry: NewHistoryEntry) -> Result<HistoryEntry, PersistenceError> {
            Err(anyhow!("connection refused").into())
        }

        async fn list_all(&self) -> Result<Vec<HistoryEntry>, PersistenceError> {
            Err(anyhow!("connection refused").into())
        }
    }

    /// Completion client returning fixed content (or `None` for no choices).
    struct FixedClient {
        content: Option<String>,
        calls: Mutex<usize>,
    }

    impl FixedClient {
        fn new(content: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                content: content.map(str::to_string),
                calls: Mutex::new(0),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for FixedClient {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(
            &self,
            _request: &ChatCompletionRequest,
        ) -> anyhow::Result<ChatCompletionResponse> {
            *self.calls.lock().unwrap() += 1;
            Ok(match &self.content {
                Some(c) => ChatCompletionResponse::with_content(c.clone()),
                None => ChatCompletionResponse::default(),
            })
        }
    }

    const PLAN_MARKDOWN: &str = "## Week 1\n\n- **Math**: algebra drills\n- Physics: kinematics\n";

    fn state_with(store: Arc<dyn HistoryStore>, client: Arc<FixedClient>) -> AppState {
        AppState {
            store,
            generator: Arc::new(PlanGenerator::new(client)),
        }
    }

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    async fn get_page(state: AppState) -> (StatusCode, String) {
        let resp = build_router(state)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        (resp.status(), body_text(resp).await)
    }

    async fn post_form(state: AppState, body: &str) -> (StatusCode, String) {
        let resp = build_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        (resp.status(), body_text(resp).await)
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    const VALID_FORM: &str = "syllabus=Math%2C+Physics%2C+Chemistry\
        &deadlines=2025-05-01%2C+2025-05-15%2C+2025-06-01\
        &available_time=5";

    // -----------------------------------------------------------------------
    // Tests (in-memory doubles)
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn get_renders_empty_page() {
        let store = Arc::new(MemoryStore::default());
        let (status, body) = get_page(state_with(store, FixedClient::new(None))).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("History"));
        assert!(!body.contains("Your Study Plan:"));
    }

    #[tokio::test]
    async fn valid_submission_generates_and_stores_plan() {
        let store = Arc::new(MemoryStore::default());
        let client = FixedClient::new(Some(PLAN_MARKDOWN));
        let (status, body) = post_form(state_with(store.clone(), client.clone()), VALID_FORM).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Your Study Plan:"));
        assert!(body.contains("<strong>Math</strong>"));
        assert!(!body.contains("role=\"alert\""));
        assert_eq!(*client.calls.lock().unwrap(), 1);

        let entries = store.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.syllabus, "Math, Physics, Chemistry");
        assert_eq!(entry.deadlines, "2025-05-01, 2025-05-15, 2025-06-01");
        assert_eq!(entry.available_time, "5");
        assert!(entry.study_plan.starts_with("<h2>Week 1</h2>"));
        assert!(body.contains("History (1)"));
    }

    #[tokio::test]
    async fn deadlines_are_stored_in_canonical_form() {
        let store = Arc::new(MemoryStore::default());
        let client = FixedClient::new(Some(PLAN_MARKDOWN));
        let form = "syllabus=Art&deadlines=2025-5-1%2C2025-06-01+&available_time=2";
        post_form(state_with(store.clone(), client), form).await;

        let entries = store.entries.lock().unwrap();
        assert_eq!(entries[0].deadlines, "2025-05-01, 2025-06-01");
    }

    #[tokio::test]
    async fn empty_fields_show_banner_and_store_nothing() {
        let store = Arc::new(MemoryStore::default());
        let client = FixedClient::new(Some(PLAN_MARKDOWN));
        let (status, body) = post_form(
            state_with(store.clone(), client.clone()),
            "syllabus=&deadlines=&available_time=",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Please fill in all fields"));
        assert!(!body.contains("Your Study Plan:"));
        assert!(store.entries.lock().unwrap().is_empty());
        assert_eq!(*client.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn absent_field_is_missing() {
        let store = Arc::new(MemoryStore::default());
        let (_, body) = post_form(
            state_with(store.clone(), FixedClient::new(Some(PLAN_MARKDOWN))),
            "syllabus=Math&deadlines=2025-05-01",
        )
        .await;

        assert!(body.contains("Please fill in all fields"));
        assert!(store.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_deadlines_show_format_banner() {
        let store = Arc::new(MemoryStore::default());
        let client = FixedClient::new(Some(PLAN_MARKDOWN));
        let (status, body) = post_form(
            state_with(store.clone(), client.clone()),
            "syllabus=Math&deadlines=+++&available_time=5",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Error in deadlines format"));
        assert!(!body.contains("Please fill in all fields"));
        assert!(store.entries.lock().unwrap().is_empty());
        assert_eq!(*client.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn malformed_deadlines_show_banner_and_keep_input() {
        let store = Arc::new(MemoryStore::default());
        let client = FixedClient::new(Some(PLAN_MARKDOWN));
        let (status, body) = post_form(
            state_with(store.clone(), client.clone()),
            "syllabus=Math%2C+Physics&deadlines=invalid-date-format&available_time=5",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Error in deadlines format"));
        assert!(body.contains("value=\"invalid-date-format\""));
        assert!(store.entries.lock().unwrap().is_empty());
        assert_eq!(*client.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn empty_ai_response_shows_banner_and_stores_nothing() {
        let store = Arc::new(MemoryStore::default());
        let client = FixedClient::new(Some("   \n"));
        let (status, body) = post_form(
            state_with(store.clone(), client),
            "syllabus=Math%2C+Physics&deadlines=2025-05-01%2C+2025-05-15&available_time=5",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Error: AI response was empty"));
        assert!(!body.contains("Your Study Plan:"));
        assert!(store.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_choices_shows_empty_banner() {
        let store = Arc::new(MemoryStore::default());
        let (_, body) = post_form(state_with(store.clone(), FixedClient::new(None)), VALID_FORM).await;

        assert!(body.contains("Error: AI response was empty"));
        assert!(store.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_save_shows_banner() {
        let store = Arc::new(MemoryStore {
            fail_appends: true,
            ..MemoryStore::default()
        });
        let (status, body) = post_form(
            state_with(store.clone(), FixedClient::new(Some(PLAN_MARKDOWN))),
            VALID_FORM,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(SAVE_FAILED_BANNER));
        assert!(!body.contains("Your Study Plan:"));
    }

    #[tokio::test]
    async fn unreadable_history_is_a_server_error() {
        let (status, body) = get_page(state_with(Arc::new(BrokenStore), FixedClient::new(None))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("connection refused"));
    }

    #[tokio::test]
    async fn history_lists_newest_first() {
        let store = Arc::new(MemoryStore::default());
        let client = FixedClient::new(Some(PLAN_MARKDOWN));
        let state = state_with(store.clone(), client);

        post_form(
            state.clone(),
            "syllabus=First+Subject&deadlines=2025-05-01&available_time=1",
        )
        .await;
        let (_, body) = post_form(
            state,
            "syllabus=Second+Subject&deadlines=2025-05-01&available_time=2",
        )
        .await;

        let second = body.find("Second Subject").unwrap();
        let first = body.find("First Subject").unwrap();
        assert!(second < first, "newest entry should render first");
    }

    #[tokio::test]
    async fn healthz_returns_ok() {
        let store = Arc::new(MemoryStore::default());
        let resp = build_router(state_with(store, FixedClient::new(None)))
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "ok");
    }

    // -----------------------------------------------------------------------
    // Tests (PostgreSQL)
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn pg_submission_persists_one_entry() {
        let (pool, db_name) = create_test_db().await;
        let store = Arc::new(PgHistoryStore::new(pool.clone()));
        let client = FixedClient::new(Some("Plan for **Math**, Physics and Chemistry."));

        let (status, body) = post_form(state_with(store.clone(), client), VALID_FORM).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Your Study Plan:"));
        assert!(body.contains("Math"));

        let entries = store.list_all().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].syllabus, "Math, Physics, Chemistry");
        assert_eq!(entries[0].deadlines, "2025-05-01, 2025-05-15, 2025-06-01");
        assert_eq!(entries[0].available_time, "5");
        assert!(!entries[0].study_plan.is_empty());

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn pg_seeded_history_is_displayed() {
        let (pool, db_name) = create_test_db().await;
        seed_entry(
            &pool,
            &NewHistoryEntry {
                syllabus: "Biology, Chemistry".to_string(),
                deadlines: "2025-06-15, 2025-07-01".to_string(),
                available_time: "4".to_string(),
                study_plan: "Study plan generated for Biology and Chemistry".to_string(),
            },
            Utc.with_ymd_and_hms(2025, 3, 24, 14, 30, 0).unwrap(),
        )
        .await;
        let store = Arc::new(PgHistoryStore::new(pool.clone()));

        let (status, body) = get_page(state_with(store, FixedClient::new(None))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("History"));
        assert!(body.contains("Biology, Chemistry"));

        pool.close().await;
        drop_test_db(&db_name).await;
    }
}
