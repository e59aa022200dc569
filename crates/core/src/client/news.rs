use super::{build_http, get_text, join_url, NewsService};
use crate::config::Settings;
use crate::domain::news::NewsItem;
use crate::error::FetchError;
use crate::normalize::encode_ticker_list;
use crate::project::project_news;
use anyhow::Context;

const NEWS_PATH: &str = "/v1/news/all";

/// Client for the third-party `/v1/news/all` endpoint.
#[derive(Clone)]
pub struct NewsApiClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl std::fmt::Debug for NewsApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl NewsApiClient {
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            http: build_http(None)?,
            base_url: base_url.into(),
            api_token: api_token.into(),
        })
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let token = settings.require_news_api_token()?;
        Self::new(settings.news_api_base_url.clone(), token)
            .context("failed to build news api client")
    }
}

#[async_trait::async_trait]
impl NewsService for NewsApiClient {
    fn service_name(&self) -> &'static str {
        "news_api"
    }

    async fn latest_news(
        &self,
        symbols: &[String],
        limit: usize,
    ) -> Result<Vec<NewsItem>, FetchError> {
        let url = join_url(&self.base_url, NEWS_PATH);
        let symbols = encode_ticker_list(symbols);
        tracing::debug!(%url, %symbols, limit, "requesting news");

        let query = [
            ("symbols", symbols),
            ("api_token", self.api_token.clone()),
            ("limit", limit.to_string()),
        ];
        let body = get_text(&self.http, &url, &query).await?;
        project_news(200, &body, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_server;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    fn news_app() -> Router {
        Router::new().route(
            "/v1/news/all",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                if q.get("api_token").map(String::as_str) != Some("secret") {
                    return Err(StatusCode::UNAUTHORIZED);
                }
                let symbols = q.get("symbols").cloned().unwrap_or_default();
                let limit: usize = q.get("limit").and_then(|l| l.parse().ok()).unwrap_or(3);
                let data: Vec<_> = (0..limit + 2)
                    .map(|i| {
                        json!({
                            "title": format!("{symbols} story {i}"),
                            "url": format!("https://news.test/{symbols}/{i}"),
                            "description": "",
                        })
                    })
                    .collect();
                Ok(Json(json!({ "data": data })))
            }),
        )
    }

    #[tokio::test]
    async fn fetches_and_caps_news() {
        let base = test_server::spawn(news_app()).await;
        let client = NewsApiClient::new(base, "secret").unwrap();

        let items = client
            .latest_news(&["AAPL".to_string(), "MSFT".to_string()], 5)
            .await
            .unwrap();
        assert_eq!(items.len(), 5);
        assert_eq!(items[0].title, "AAPL,MSFT story 0");
        assert_eq!(items[0].description, None);
    }

    #[tokio::test]
    async fn bad_token_is_request_failed() {
        let base = test_server::spawn(news_app()).await;
        let client = NewsApiClient::new(base, "wrong").unwrap();

        let err = client.latest_news(&["AAPL".to_string()], 5).await.unwrap_err();
        assert!(matches!(err, FetchError::RequestFailed { status: 401 }));
    }

    #[test]
    fn debug_output_hides_token() {
        let client = NewsApiClient::new("http://localhost", "secret").unwrap();
        assert!(!format!("{client:?}").contains("secret"));
    }
}
