//! Turns validated dashboard parameters into the `/predict` query contract.

use crate::domain::params::{Period, RequestParameters, Threshold};
use crate::error::ValidationError;
use anyhow::bail;
use std::str::FromStr;

/// How tickers are sent to `/predict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
    /// One request per ticker under `ticker`, issued one after another.
    PerTicker,
    /// One request for all tickers under `tickers`, comma-joined.
    Batch,
}

impl FromStr for RequestShape {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per_ticker" | "single" => Ok(Self::PerTicker),
            "batch" => Ok(Self::Batch),
            other => bail!("unknown request shape {other:?} (expected per_ticker or batch)"),
        }
    }
}

/// Ordered query pairs. Values are sent raw; the HTTP client URL-encodes them once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(&'static str, String)>);

impl QueryParams {
    pub fn push(&mut self, name: &'static str, value: impl Into<String>) {
        self.0.push((name, value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn as_pairs(&self) -> &[(&'static str, String)] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRequest {
    /// Tickers whose display depends on this request.
    pub tickers: Vec<String>,
    pub query: QueryParams,
}

#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    pub max_tickers: usize,
    pub shape: RequestShape,
}

impl Normalizer {
    pub fn new(max_tickers: usize, shape: RequestShape) -> Self {
        Self { max_tickers, shape }
    }

    pub fn from_settings(settings: &crate::config::Settings) -> Self {
        Self::new(settings.max_tickers, settings.request_shape)
    }

    pub fn plan(&self, params: &RequestParameters) -> Result<Vec<PlannedRequest>, ValidationError> {
        let selected = params.tickers.len();
        if selected > self.max_tickers {
            return Err(ValidationError::TooManyTickers {
                selected,
                max: self.max_tickers,
            });
        }

        let plans = match self.shape {
            RequestShape::PerTicker => params
                .tickers
                .iter()
                .map(|ticker| {
                    let mut query = QueryParams::default();
                    query.push("ticker", ticker);
                    push_common(&mut query, params);
                    PlannedRequest {
                        tickers: vec![ticker.to_string()],
                        query,
                    }
                })
                .collect(),
            RequestShape::Batch => {
                let tickers = params.tickers.as_slice().to_vec();
                let mut query = QueryParams::default();
                query.push("tickers", encode_ticker_list(&tickers));
                push_common(&mut query, params);
                vec![PlannedRequest { tickers, query }]
            }
        };
        Ok(plans)
    }
}

fn push_common(query: &mut QueryParams, params: &RequestParameters) {
    query.push("model_type", params.model_type.as_str());
    match params.period {
        Period::Single(q) => query.push("quarter", q.to_string()),
        Period::Range { start, end } => {
            query.push("quarter_start", start.to_string());
            query.push("quarter_end", end.to_string());
        }
    }
    query.push("sequence", params.sequence_length.get().to_string());
    query.push("horizon", params.horizon.as_str());
    query.push("threshold", encode_threshold(params.threshold));
    query.push("small_cap", encode_bool(params.small_cap_only));
}

pub fn encode_model_label(label: &str) -> String {
    label.trim().to_lowercase().replace(' ', "_")
}

pub fn encode_threshold(threshold: Threshold) -> String {
    format!("{}%", threshold.percent())
}

pub fn encode_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

pub fn encode_ticker_list(tickers: &[String]) -> String {
    tickers.join(",")
}
