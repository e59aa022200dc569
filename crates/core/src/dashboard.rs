use crate::client::{NewsService, PredictionService};
use crate::domain::company::CompanyInfo;
use crate::domain::news::NewsItem;
use crate::domain::params::{RequestParameters, TickerSelection};
use crate::domain::prediction::{PredictionProjection, PredictionResult, Recommendation};
use crate::error::{FetchError, ValidationError};
use crate::normalize::Normalizer;
use serde::Serialize;
use std::sync::Arc;

/// Outcome of one ticker's widget. Failures stay local to the ticker.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum PanelOutcome<T> {
    Ready(T),
    Failed {
        message: String,
        http_status: Option<u16>,
    },
}

impl<T> PanelOutcome<T> {
    fn from_result(res: Result<T, FetchError>) -> Self {
        match res {
            Ok(v) => Self::Ready(v),
            Err(err) => Self::failed(&err),
        }
    }

    fn failed(err: &FetchError) -> Self {
        Self::Failed {
            message: err.to_string(),
            http_status: err.status(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PredictionPanel {
    pub prediction: Option<PredictionResult>,
    pub recommendation: Option<Recommendation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TickerPanel {
    pub ticker: String,
    pub outcome: PanelOutcome<PredictionPanel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewsPanel {
    pub ticker: String,
    pub outcome: PanelOutcome<Vec<NewsItem>>,
}

#[derive(Clone)]
pub struct Dashboard {
    predictions: Arc<dyn PredictionService>,
    news: Option<Arc<dyn NewsService>>,
    normalizer: Normalizer,
    news_limit: usize,
}

impl Dashboard {
    pub fn new(
        predictions: Arc<dyn PredictionService>,
        news: Option<Arc<dyn NewsService>>,
        normalizer: Normalizer,
        news_limit: usize,
    ) -> Self {
        Self {
            predictions,
            news,
            normalizer,
            news_limit,
        }
    }

    /// Runs every planned request in order, one at a time.
    pub async fn predict(
        &self,
        params: &RequestParameters,
    ) -> Result<Vec<TickerPanel>, ValidationError> {
        let plans = self.normalizer.plan(params)?;

        let mut panels = Vec::with_capacity(params.tickers.len());
        for plan in plans {
            let res = self.predictions.predict(&plan.query).await;
            if let Err(err) = &res {
                tracing::warn!(
                    service = self.predictions.service_name(),
                    tickers = ?plan.tickers,
                    status = err.status(),
                    error = %err,
                    "prediction request failed"
                );
            }

            let shared = plan.tickers.len() > 1;
            for ticker in plan.tickers {
                let outcome = match &res {
                    Ok(projection) => {
                        PanelOutcome::Ready(panel_for(projection, &ticker, shared))
                    }
                    Err(err) => PanelOutcome::failed(err),
                };
                panels.push(TickerPanel { ticker, outcome });
            }
        }
        Ok(panels)
    }

    /// One news request per ticker, in selection order.
    pub async fn news(&self, tickers: &TickerSelection) -> Vec<NewsPanel> {
        let mut panels = Vec::with_capacity(tickers.len());
        for ticker in tickers.iter() {
            let (service, res) = match &self.news {
                Some(news) => (
                    news.service_name(),
                    news.latest_news(&[ticker.to_string()], self.news_limit).await,
                ),
                None => ("none", Err(FetchError::NotConfigured("news api token"))),
            };
            if let Err(err) = &res {
                tracing::warn!(service, %ticker, error = %err, "news request failed");
            }
            panels.push(NewsPanel {
                ticker: ticker.to_string(),
                outcome: PanelOutcome::from_result(res),
            });
        }
        panels
    }

    pub async fn company_info(&self, ticker: &str) -> Result<CompanyInfo, FetchError> {
        let ticker = ticker.trim().to_ascii_uppercase();
        if ticker.is_empty() {
            return Err(ValidationError::EmptyTicker.into());
        }
        self.predictions.company_info(&ticker).await
    }
}

/// `shared` is set when one response answers several tickers; a flat result then
/// only belongs to the ticker it names.
fn panel_for(projection: &PredictionProjection, ticker: &str, shared: bool) -> PredictionPanel {
    match projection {
        PredictionProjection::Single(result) => {
            let owned = !shared
                || result
                    .ticker
                    .as_deref()
                    .is_some_and(|t| t.trim().eq_ignore_ascii_case(ticker));
            PredictionPanel {
                prediction: owned.then(|| result.clone()),
                recommendation: None,
            }
        }
        PredictionProjection::Batch(batch) => {
            let (prediction, recommendation) = batch.for_ticker(ticker);
            PredictionPanel {
                prediction: prediction.cloned(),
                recommendation: recommendation.cloned(),
            }
        }
    }
}
