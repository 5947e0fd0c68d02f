// Expense Ledger - Web Server
// JSON API over the same ExpenseTracker the CLI and TUI use

use anyhow::{Context, Result};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use expense_ledger::logging::init_tracing;
use expense_ledger::{
    Budget, BudgetStatus, ChartData, Expense, ExpenseId, ExpenseTracker, LedgerError,
    LedgerPaths, Listing, Settings,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
struct AppState {
    tracker: Arc<Mutex<ExpenseTracker>>,
}

impl AppState {
    fn new(tracker: ExpenseTracker) -> Self {
        Self {
            tracker: Arc::new(Mutex::new(tracker)),
        }
    }

    /// A panicked handler must not take the API down with it
    fn lock(&self) -> MutexGuard<'_, ExpenseTracker> {
        self.tracker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Failures rendered in the same JSON envelope as successes
enum ApiError {
    Ledger(LedgerError),
    /// Malformed path or body, rejected before reaching a handler
    Rejected { status: StatusCode, message: String },
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Ledger(err) => {
                let status = match &err {
                    LedgerError::Validation(_) | LedgerError::NoSelection => {
                        StatusCode::BAD_REQUEST
                    }
                    LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
                    other => {
                        tracing::error!(error = %other, "request failed");
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, err.user_message())
            }
            ApiError::Rejected { status, message } => {
                tracing::debug!(%status, %message, "request rejected");
                (status, message)
            }
        };

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message),
        };

        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

/// Accept amounts as JSON numbers or strings; validation happens in the library
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(serde_json::Number),
    Text(String),
}

impl RawAmount {
    fn as_text(&self) -> String {
        match self {
            RawAmount::Number(n) => n.to_string(),
            RawAmount::Text(s) => s.clone(),
        }
    }
}

#[derive(Deserialize)]
struct AddExpenseRequest {
    date: String,
    category: String,
    amount: RawAmount,
}

#[derive(Deserialize)]
struct SetBudgetRequest {
    amount: RawAmount,
    start: String,
    end: String,
}

#[derive(Serialize)]
struct BudgetResponse {
    budget: Option<Budget>,
    status: Option<BudgetStatus>,
    message: Option<String>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/expenses - All expenses plus total
async fn list_expenses(State(state): State<AppState>) -> ApiResult<Listing> {
    let tracker = state.lock();
    Ok(Json(ApiResponse::ok(tracker.list()?)))
}

/// GET /api/expenses/:id - One expense
async fn get_expense(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> ApiResult<Expense> {
    let Path(id) = id?;
    let tracker = state.lock();
    Ok(Json(ApiResponse::ok(tracker.expense(ExpenseId(id))?)))
}

/// POST /api/expenses - Add an expense
async fn add_expense(
    State(state): State<AppState>,
    req: std::result::Result<Json<AddExpenseRequest>, JsonRejection>,
) -> std::result::Result<(StatusCode, Json<ApiResponse<Expense>>), ApiError> {
    let Json(req) = req?;
    let tracker = state.lock();
    let expense = tracker.add_expense(&req.date, &req.category, &req.amount.as_text())?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(expense))))
}

/// DELETE /api/expenses/:id - Delete by id
async fn delete_expense(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> ApiResult<ExpenseId> {
    let Path(id) = id?;
    let tracker = state.lock();
    tracker.delete_selected(Some(ExpenseId(id)))?;
    Ok(Json(ApiResponse::ok(ExpenseId(id))))
}

fn budget_response(tracker: &ExpenseTracker) -> Result<BudgetResponse, LedgerError> {
    let status = tracker.status()?;
    Ok(BudgetResponse {
        budget: tracker.budget().cloned(),
        message: status.as_ref().map(BudgetStatus::message),
        status,
    })
}

/// GET /api/budget - Current budget and status
async fn get_budget(State(state): State<AppState>) -> ApiResult<BudgetResponse> {
    let tracker = state.lock();
    Ok(Json(ApiResponse::ok(budget_response(&tracker)?)))
}

/// PUT /api/budget - Replace the budget
async fn set_budget(
    State(state): State<AppState>,
    req: std::result::Result<Json<SetBudgetRequest>, JsonRejection>,
) -> ApiResult<BudgetResponse> {
    let Json(req) = req?;
    let mut tracker = state.lock();
    tracker.set_budget(&req.amount.as_text(), &req.start, &req.end)?;
    Ok(Json(ApiResponse::ok(budget_response(&tracker)?)))
}

/// GET /api/chart - Category totals over the budget range
async fn get_chart(State(state): State<AppState>) -> ApiResult<ChartData> {
    let tracker = state.lock();
    Ok(Json(ApiResponse::ok(tracker.chart()?)))
}

fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/expenses", get(list_expenses).post(add_expense))
        .route("/expenses/:id", get(get_expense).delete(delete_expense))
        .route("/budget", get(get_budget).put(set_budget))
        .route("/chart", get(get_chart))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(false);

    let paths = LedgerPaths::new()?;
    paths.ensure_directories()?;
    let settings = Settings::load_or_create(&paths)?;
    let db_path = std::env::var_os("EXPENSE_LEDGER_DB")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| paths.database_file(&settings.database_file));

    let tracker = ExpenseTracker::open(&db_path, &settings)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    tracing::info!(db = %db_path.display(), "database opened");

    let addr = std::env::var("EXPENSE_LEDGER_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(%addr, "server running");
    println!("🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/expenses", addr);

    axum::serve(listener, app(AppState::new(tracker)))
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState::new(ExpenseTracker::in_memory().unwrap())
    }

    async fn call(state: &AppState, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();

        let response = app(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let state = test_state();

        let (status, body) = call(
            &state,
            Method::POST,
            "/api/expenses",
            Some(r#"{"date":"2024-01-15","category":"food","amount":12.5}"#),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["category"], "food");

        let (status, body) = call(&state, Method::GET, "/api/expenses", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["expenses"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"]["total"], 12.5);
    }

    #[tokio::test]
    async fn test_validation_failure_is_bad_request() {
        let state = test_state();

        let (status, body) = call(
            &state,
            Method::POST,
            "/api/expenses",
            Some(r#"{"date":"2024-13-40","category":"food","amount":"3"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(
            body["error"],
            "Date 2024-13-40 is not in the correct format (YYYY-MM-DD)"
        );
        assert!(state.lock().list().unwrap().expenses.is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let state = test_state();
        let (status, _) = call(&state, Method::DELETE, "/api/expenses/42", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_expense_by_id() {
        let state = test_state();
        let added = state.lock().add_expense("2024-01-15", "food", "4").unwrap();

        let (status, body) = call(&state, Method::GET, &format!("/api/expenses/{}", added.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], added.id.0);
        assert_eq!(body["data"]["date"], "2024-01-15");

        let (status, body) = call(&state, Method::GET, "/api/expenses/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Expense #999 no longer exists.");
    }

    #[tokio::test]
    async fn test_malformed_requests_use_json_envelope() {
        let state = test_state();
        state.lock().add_expense("2024-01-15", "food", "4").unwrap();

        let (status, body) = call(&state, Method::DELETE, "/api/expenses/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().is_some());

        let (status, body) = call(&state, Method::POST, "/api/expenses", Some("{not json")).await;
        assert!(status.is_client_error());
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().is_some());

        assert_eq!(state.lock().list().unwrap().expenses.len(), 1);
    }

    #[tokio::test]
    async fn test_budget_round_trip() {
        let state = test_state();
        state.lock().add_expense("2024-01-15", "rent", "150").unwrap();

        let (status, body) = call(&state, Method::GET, "/api/budget", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["budget"].is_null());

        let (status, body) = call(
            &state,
            Method::PUT,
            "/api/budget",
            Some(r#"{"amount":"100.00","start":"2024-01-01","end":"2024-01-31"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"]["status"], "OVER_BUDGET");
        assert_eq!(body["data"]["status"]["overage"], 50.0);
        assert_eq!(
            body["data"]["message"],
            "Warning: You've exceeded your budget by 50.00!"
        );

        let (_, body) = call(&state, Method::GET, "/api/chart", None).await;
        assert_eq!(
            body["data"]["title"],
            "Total Expenses by Category (2024-01-01 to 2024-01-31)"
        );
        assert_eq!(body["data"]["bars"][0]["category"], "rent");
    }
}
