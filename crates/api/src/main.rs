use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scout_core::client::{HttpPredictionClient, NewsApiClient, NewsService};
use scout_core::dashboard::{Dashboard, NewsPanel, TickerPanel};
use scout_core::domain::company::CompanyInfo;
use scout_core::domain::params::{TickerSelection, UiSelection};
use scout_core::error::{FetchError, ValidationError};
use scout_core::normalize::Normalizer;
use scout_core::tickers::TickerCache;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = scout_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let predictions = Arc::new(HttpPredictionClient::from_settings(&settings)?);
    let news: Option<Arc<dyn NewsService>> = match NewsApiClient::from_settings(&settings) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "news api disabled; news panels will report failures");
            None
        }
    };
    let tickers = settings
        .ticker_list_path
        .as_deref()
        .map(|path| Arc::new(TickerCache::new(path)));

    let state = AppState {
        dashboard: Dashboard::new(
            predictions,
            news,
            Normalizer::from_settings(&settings),
            settings.news_limit,
        ),
        tickers,
        max_tickers: settings.max_tickers,
    };

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(
        %addr,
        prediction_api = %settings.prediction_api_base_url,
        request_shape = ?settings.request_shape,
        max_tickers = settings.max_tickers,
        "api listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/predict", get(get_predictions))
        .route("/api/news", get(get_news))
        .route("/api/info/:ticker", get(get_company_info))
        .route("/api/tickers", get(get_tickers))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    dashboard: Dashboard,
    tickers: Option<Arc<TickerCache>>,
    max_tickers: usize,
}

#[derive(Debug, Serialize)]
struct ApiError {
    #[serde(skip)]
    code: StatusCode,
    error: String,
    http_status: Option<u16>,
}

impl ApiError {
    fn new(code: StatusCode, error: impl ToString) -> Self {
        Self {
            code,
            error: error.to_string(),
            http_status: None,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err)
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        let code = match &err {
            FetchError::Validation(_) => StatusCode::BAD_REQUEST,
            FetchError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_GATEWAY,
        };
        Self {
            code,
            http_status: err.status(),
            error: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code, Json(self)).into_response()
    }
}

async fn get_predictions(
    State(state): State<AppState>,
    Query(selection): Query<UiSelection>,
) -> Result<Json<Vec<TickerPanel>>, ApiError> {
    let params = selection.into_parameters(state.max_tickers)?;
    let panels = state.dashboard.predict(&params).await?;
    Ok(Json(panels))
}

#[derive(Debug, Deserialize)]
struct NewsQuery {
    tickers: String,
}

async fn get_news(
    State(state): State<AppState>,
    Query(q): Query<NewsQuery>,
) -> Result<Json<Vec<NewsPanel>>, ApiError> {
    let requested = q.tickers.split(',').filter(|t| !t.trim().is_empty());
    let tickers = TickerSelection::new(requested, state.max_tickers)?;
    Ok(Json(state.dashboard.news(&tickers).await))
}

async fn get_company_info(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<CompanyInfo>, ApiError> {
    let info = state.dashboard.company_info(&ticker).await.map_err(|e| {
        tracing::warn!(%ticker, error = %e, "company info request failed");
        ApiError::from(e)
    })?;
    Ok(Json(info))
}

async fn get_tickers(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let Some(cache) = &state.tickers else {
        return Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "TICKER_LIST_PATH is not configured",
        ));
    };

    let tickers = cache.get().await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        tracing::error!(error = %e, "ticker list load failed");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
    })?;
    Ok(Json(tickers.as_ref().clone()))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &scout_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
