use super::{build_http, get_text, join_url, PredictionService};
use crate::config::Settings;
use crate::domain::company::CompanyInfo;
use crate::domain::prediction::PredictionProjection;
use crate::error::FetchError;
use crate::normalize::QueryParams;
use crate::project::{project_company_info, project_prediction};
use std::time::Duration;

const PREDICT_PATH: &str = "/predict";
const INFO_PATH: &str = "/info";

#[derive(Debug, Clone)]
pub struct HttpPredictionClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPredictionClient {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> anyhow::Result<Self> {
        Ok(Self {
            http: build_http(timeout)?,
            base_url: base_url.into(),
        })
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(
            settings.prediction_api_base_url.clone(),
            settings.prediction_api_timeout,
        )
    }
}

#[async_trait::async_trait]
impl PredictionService for HttpPredictionClient {
    fn service_name(&self) -> &'static str {
        "prediction_http"
    }

    async fn predict(&self, query: &QueryParams) -> Result<PredictionProjection, FetchError> {
        let url = join_url(&self.base_url, PREDICT_PATH);
        tracing::debug!(%url, ?query, "requesting prediction");
        let body = get_text(&self.http, &url, query.as_pairs()).await?;
        project_prediction(200, &body)
    }

    async fn company_info(&self, ticker: &str) -> Result<CompanyInfo, FetchError> {
        let url = join_url(&self.base_url, INFO_PATH);
        tracing::debug!(%url, %ticker, "requesting company info");
        let body = get_text(&self.http, &url, &[("ticker", ticker)]).await?;
        project_company_info(200, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_server;
    use crate::domain::prediction::Worthiness;
    use axum::extract::{Query, RawQuery};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn default_query() -> QueryParams {
        let mut q = QueryParams::default();
        q.push("ticker", "AAPL");
        q.push("model_type", "rnn");
        q.push("threshold", "50%");
        q.push("small_cap", "true");
        q
    }

    #[tokio::test]
    async fn predict_sends_query_and_projects_response() {
        let app = Router::new().route(
            "/predict",
            get(|RawQuery(raw): RawQuery, Query(q): Query<HashMap<String, String>>| async move {
                Json(json!({
                    "ticker": q.get("ticker"),
                    "model_type": q.get("model_type"),
                    "threshold": q.get("threshold"),
                    "small_cap": q.get("small_cap"),
                    "raw": raw,
                    "prediction": 1,
                    "worthiness": "worthy",
                }))
            }),
        );
        let base = test_server::spawn(app).await;
        let client = HttpPredictionClient::new(base, None).unwrap();

        let PredictionProjection::Single(r) = client.predict(&default_query()).await.unwrap() else {
            panic!("expected single projection");
        };
        assert_eq!(r.ticker.as_deref(), Some("AAPL"));
        assert_eq!(r.model_type.as_deref(), Some("rnn"));
        assert_eq!(r.threshold.as_deref(), Some("50%"));
        assert_eq!(r.small_cap.as_deref(), Some("true"));
        assert_eq!(r.worthiness, Some(Worthiness::Worthy));
    }

    #[tokio::test]
    async fn percent_sign_is_encoded_exactly_once() {
        let app = Router::new().route(
            "/predict",
            get(|RawQuery(raw): RawQuery| async move {
                Json(json!({ "ticker": raw.unwrap_or_default() }))
            }),
        );
        let base = test_server::spawn(app).await;
        let client = HttpPredictionClient::new(base, None).unwrap();

        let PredictionProjection::Single(r) = client.predict(&default_query()).await.unwrap() else {
            panic!("expected single projection");
        };
        let raw = r.ticker.unwrap();
        assert!(raw.contains("threshold=50%25"), "{raw}");
        assert!(!raw.contains("%2525"), "{raw}");
    }

    #[tokio::test]
    async fn error_status_surfaces_as_request_failed() {
        let app = Router::new().route(
            "/predict",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = test_server::spawn(app).await;
        let client = HttpPredictionClient::new(base, None).unwrap();

        let err = client.predict(&default_query()).await.unwrap_err();
        assert!(matches!(err, FetchError::RequestFailed { status: 500 }));
    }

    #[tokio::test]
    async fn missing_route_is_404() {
        let base = test_server::spawn(Router::new()).await;
        let client = HttpPredictionClient::new(base, None).unwrap();
        let err = client.company_info("AAPL").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn company_info_is_requested_by_ticker() {
        let app = Router::new().route(
            "/info",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let name = format!("{} Corp", q.get("ticker").cloned().unwrap_or_default());
                Json::<Value>(json!({ "Company name": name, "Revenues": "10B" }))
            }),
        );
        let base = test_server::spawn(app).await;
        let client = HttpPredictionClient::new(base, None).unwrap();

        let info = client.company_info("MSFT").await.unwrap();
        assert_eq!(info.company_name, "MSFT Corp");
        assert_eq!(info.revenues, "10B");
        assert_eq!(info.market_cap, "No data available");
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpPredictionClient::new(format!("http://{addr}"), None).unwrap();
        let err = client.predict(&default_query()).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
