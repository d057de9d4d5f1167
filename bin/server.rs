// Ledger Desk - JSON API
// Read-only REST endpoints over the same record source the dashboard uses

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use ledger_desk::{
    logging::{self, LogTarget},
    open_source, Company, Config, DashboardMetrics, Error, Formatter, RecordSource,
};

type SharedSource = Arc<Mutex<Box<dyn RecordSource + Send>>>;

/// Shared application state
#[derive(Clone)]
struct AppState {
    source: SharedSource,
    rounding: ledger_desk::Rounding,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
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

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Metrics with display strings alongside the raw figures
#[derive(Serialize)]
struct MetricsResponse {
    company_id: String,
    company_name: String,
    financial_year: String,
    metrics: DashboardMetrics,
    display: Vec<MetricCard>,
}

#[derive(Serialize)]
struct MetricCard {
    label: &'static str,
    value: String,
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::Format(_) => StatusCode::BAD_REQUEST,
        Error::Remote(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Run a query against the record source off the async runtime.
/// The source may block (SQLite, blocking HTTP).
async fn query<T, F>(state: &AppState, f: F) -> Response
where
    T: Serialize + Send + 'static,
    F: FnOnce(&dyn RecordSource) -> ledger_desk::Result<T> + Send + 'static,
{
    let source = Arc::clone(&state.source);
    let result = tokio::task::spawn_blocking(move || {
        // Read-only source: a panic in another request leaves nothing half-written
        let guard = source.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&**guard)
    })
    .await;

    match result {
        Ok(Ok(data)) => (StatusCode::OK, Json(ApiResponse::ok(data))).into_response(),
        Ok(Err(err)) => {
            let status = status_for(&err);
            if status.is_server_error() {
                error!(%err, "query failed");
            }
            (status, Json(ApiResponse::<()>::err(err.to_string()))).into_response()
        }
        Err(err) => {
            error!(%err, "query task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::err("internal error")),
            )
                .into_response()
        }
    }
}

fn decode_id(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

fn find_company(source: &dyn RecordSource, company_id: &str) -> ledger_desk::Result<Company> {
    source
        .companies()?
        .into_iter()
        .find(|c| c.id == company_id)
        .ok_or_else(|| Error::NotFound {
            kind: "company",
            id: company_id.to_string(),
        })
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/companies
async fn get_companies(State(state): State<AppState>) -> Response {
    query(&state, |source| source.companies()).await
}

/// GET /api/companies/:id/ledgers
async fn get_ledgers(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = decode_id(&id);
    query(&state, move |source| {
        find_company(source, &id)?;
        source.ledgers(&id)
    })
    .await
}

/// GET /api/companies/:id/vouchers
async fn get_vouchers(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = decode_id(&id);
    query(&state, move |source| {
        find_company(source, &id)?;
        source.vouchers(&id)
    })
    .await
}

/// GET /api/vouchers/:id/items
async fn get_voucher_items(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = decode_id(&id);
    query(&state, move |source| source.voucher_items(&id)).await
}

/// GET /api/companies/:id/stock
async fn get_stock(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = decode_id(&id);
    query(&state, move |source| {
        find_company(source, &id)?;
        source.stock_items(&id)
    })
    .await
}

/// GET /api/companies/:id/metrics
async fn get_metrics(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = decode_id(&id);
    let rounding = state.rounding;
    query(&state, move |source| {
        let company = find_company(source, &id)?;
        let metrics = DashboardMetrics::load(source, &company.id)?;
        let formatter = Formatter::new(company.currency_symbol.clone()).with_rounding(rounding);

        let display = metrics
            .cards(&formatter)
            .into_iter()
            .map(|(label, value)| MetricCard { label, value })
            .collect();

        Ok(MetricsResponse {
            financial_year: company.financial_year_label(),
            company_id: company.id,
            company_name: company.name,
            metrics,
            display,
        })
    })
    .await
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/companies", get(get_companies))
        .route("/companies/:id/ledgers", get(get_ledgers))
        .route("/companies/:id/vouchers", get(get_vouchers))
        .route("/companies/:id/stock", get(get_stock))
        .route("/companies/:id/metrics", get(get_metrics))
        .route("/vouchers/:id/items", get(get_voucher_items))
        .with_state(state);

    Router::new().nest("/api", api_routes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "cannot listen for shutdown signal");
    }
    info!("shutting down");
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;
    let _guard = logging::init(&config, LogTarget::Stderr)?;

    // Opening may build a blocking HTTP client, which must not happen on the runtime
    let source = tokio::task::spawn_blocking({
        let config = config.clone();
        move || open_source(&config)
    })
    .await?
    .context("opening the books")?;

    let state = AppState {
        source: Arc::new(Mutex::new(source)),
        rounding: config.rounding,
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, version = ledger_desk::VERSION, "Ledger Desk API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::NaiveDate;
    use ledger_desk::{
        db::{insert_companies, insert_ledgers, insert_vouchers},
        Ledger, LedgerGroup, Rounding, SqliteStore, Voucher, VoucherType,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.connection();
        let day = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();

        let mut company = Company::new("Acme Traders", NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        company.id = "acme".to_string();
        insert_companies(conn, &[company]).unwrap();
        insert_ledgers(conn, &[Ledger::new("acme", "Cash", LedgerGroup::CashInHand, 0.0, 4_500.0)]).unwrap();
        insert_vouchers(
            conn,
            &[Voucher::new("acme", "SAL/1", VoucherType::Sales, day, 12_345_678.0)],
        )
        .unwrap();

        let source: Box<dyn RecordSource + Send> = Box::new(store);
        AppState {
            source: Arc::new(Mutex::new(source)),
            rounding: Rounding::HalfUp,
        }
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let response = router(test_state())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_companies_and_ledgers() {
        let (status, body) = get_json("/api/companies").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["id"], "acme");

        let (status, body) = get_json("/api/companies/acme/ledgers").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["name"], "Cash");
    }

    #[tokio::test]
    async fn test_unknown_company_is_404() {
        let (status, body) = get_json("/api/companies/nope/vouchers").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert!(body["data"].is_null());
        assert!(body["error"].as_str().unwrap().contains("nope"));
    }

    #[tokio::test]
    async fn test_metrics_carry_display_strings() {
        let (status, body) = get_json("/api/companies/acme/metrics").await;
        assert_eq!(status, StatusCode::OK);

        let data = &body["data"];
        assert_eq!(data["metrics"]["total_sales"], 12_345_678.0);
        assert_eq!(data["display"][0]["label"], "Sales");
        assert_eq!(data["display"][0]["value"], "₹1.23 Cr");
        assert_eq!(data["display"][4]["value"], "₹4.50 K");
    }

    #[tokio::test]
    async fn test_voucher_items_empty() {
        let (status, body) = get_json("/api/vouchers/missing/items").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], serde_json::json!([]));
    }

    #[test]
    fn test_decode_id() {
        assert_eq!(decode_id("acme%20traders"), "acme traders");
        assert_eq!(decode_id("plain"), "plain");
    }
}
