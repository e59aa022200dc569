use crate::domain::company::CompanyInfo;
use crate::domain::news::NewsItem;
use crate::domain::prediction::PredictionProjection;
use crate::error::FetchError;
use crate::normalize::QueryParams;
use crate::project::ensure_ok;
use std::time::Duration;

pub mod news;
pub mod prediction;

pub use news::NewsApiClient;
pub use prediction::HttpPredictionClient;

#[async_trait::async_trait]
pub trait PredictionService: Send + Sync {
    fn service_name(&self) -> &'static str;

    async fn predict(&self, query: &QueryParams) -> Result<PredictionProjection, FetchError>;

    async fn company_info(&self, ticker: &str) -> Result<CompanyInfo, FetchError>;
}

#[async_trait::async_trait]
pub trait NewsService: Send + Sync {
    fn service_name(&self) -> &'static str;

    async fn latest_news(&self, symbols: &[String], limit: usize)
        -> Result<Vec<NewsItem>, FetchError>;
}

pub(crate) fn build_http(timeout: Option<Duration>) -> anyhow::Result<reqwest::Client> {
    use anyhow::Context;

    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().context("failed to build http client")
}

pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Single-attempt GET. The body is only read for a 200.
pub(crate) async fn get_text<Q>(
    http: &reqwest::Client,
    url: &str,
    query: &Q,
) -> Result<String, FetchError>
where
    Q: serde::Serialize + ?Sized,
{
    let res = http.get(url).query(query).send().await?;
    let status = res.status().as_u16();
    if let Err(err) = ensure_ok(status) {
        tracing::warn!(%url, status, "external service returned an error status");
        return Err(err);
    }
    Ok(res.text().await?)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_handles_slashes() {
        assert_eq!(join_url("http://h/", "/predict"), "http://h/predict");
        assert_eq!(join_url("http://h", "predict"), "http://h/predict");
    }
}
