pub mod client;
pub mod dashboard;
pub mod domain;
pub mod error;
pub mod normalize;
pub mod project;
pub mod tickers;

pub mod config {
    use crate::normalize::RequestShape;
    use anyhow::Context;
    use std::time::Duration;

    pub const DEFAULT_PREDICTION_API_BASE_URL: &str =
        "https://smallcapscout-196636255726.europe-west1.run.app";
    pub const DEFAULT_NEWS_API_BASE_URL: &str = "https://api.marketaux.com";
    pub const DEFAULT_MAX_TICKERS: usize = 5;
    pub const DEFAULT_NEWS_LIMIT: usize = 5;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub prediction_api_base_url: String,
        pub prediction_api_timeout: Option<Duration>,
        pub request_shape: RequestShape,
        pub max_tickers: usize,
        pub news_api_base_url: String,
        pub news_api_token: Option<String>,
        pub news_limit: usize,
        pub ticker_list_path: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                prediction_api_base_url: DEFAULT_PREDICTION_API_BASE_URL.to_string(),
                prediction_api_timeout: None,
                request_shape: RequestShape::PerTicker,
                max_tickers: DEFAULT_MAX_TICKERS,
                news_api_base_url: DEFAULT_NEWS_API_BASE_URL.to_string(),
                news_api_token: None,
                news_limit: DEFAULT_NEWS_LIMIT,
                ticker_list_path: None,
                sentry_dsn: None,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let defaults = Self::default();

            let prediction_api_timeout = match non_empty_var("PREDICTION_API_TIMEOUT_SECS") {
                Some(s) => Some(Duration::from_secs(
                    s.parse::<u64>()
                        .with_context(|| format!("PREDICTION_API_TIMEOUT_SECS is not a number: {s}"))?,
                )),
                None => None,
            };

            let request_shape = match non_empty_var("PREDICT_REQUEST_SHAPE") {
                Some(s) => s.parse::<RequestShape>()?,
                None => defaults.request_shape,
            };

            let max_tickers = match non_empty_var("MAX_TICKERS") {
                Some(s) => s
                    .parse::<usize>()
                    .with_context(|| format!("MAX_TICKERS is not a number: {s}"))?,
                None => defaults.max_tickers,
            };
            anyhow::ensure!(max_tickers >= 1, "MAX_TICKERS must be >= 1");

            let news_limit = match non_empty_var("NEWS_LIMIT") {
                Some(s) => s
                    .parse::<usize>()
                    .with_context(|| format!("NEWS_LIMIT is not a number: {s}"))?,
                None => defaults.news_limit,
            };

            Ok(Self {
                prediction_api_base_url: non_empty_var("PREDICTION_API_BASE_URL")
                    .unwrap_or(defaults.prediction_api_base_url),
                prediction_api_timeout,
                request_shape,
                max_tickers,
                news_api_base_url: non_empty_var("NEWS_API_BASE_URL")
                    .unwrap_or(defaults.news_api_base_url),
                news_api_token: non_empty_var("NEWS_API_TOKEN"),
                news_limit,
                ticker_list_path: non_empty_var("TICKER_LIST_PATH"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }

        pub fn require_news_api_token(&self) -> anyhow::Result<&str> {
            self.news_api_token
                .as_deref()
                .context("NEWS_API_TOKEN is required")
        }

        pub fn require_ticker_list_path(&self) -> anyhow::Result<&str> {
            self.ticker_list_path
                .as_deref()
                .context("TICKER_LIST_PATH is required")
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}
