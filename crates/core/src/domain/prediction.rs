use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder shown for any field the service left out.
pub const NO_DATA: &str = "No data available";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Worthiness {
    #[serde(rename = "worthy")]
    Worthy,
    #[serde(rename = "not worthy")]
    NotWorthy,
}

impl Worthiness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Worthy => "worthy",
            Self::NotWorthy => "not worthy",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let key = s.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        match key.as_str() {
            "worthy" => Some(Self::Worthy),
            "not worthy" => Some(Self::NotWorthy),
            _ => None,
        }
    }
}

impl fmt::Display for Worthiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ticker's verdict as returned by `/predict`. Absent keys stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub ticker: Option<String>,
    pub model_type: Option<String>,
    pub quarter: Option<String>,
    pub sequence: Option<i64>,
    pub horizon: Option<String>,
    pub threshold: Option<String>,
    pub small_cap: Option<String>,
    /// 0 or 1.
    pub prediction: Option<u8>,
    pub worthiness: Option<Worthiness>,
}

impl PredictionResult {
    pub fn worthiness_label(&self) -> String {
        or_no_data(self.worthiness.map(|w| w.to_string()))
    }

    pub fn prediction_label(&self) -> String {
        or_no_data(self.prediction.map(|p| p.to_string()))
    }

    pub fn display_rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Ticker", or_no_data(self.ticker.clone())),
            ("Model type", or_no_data(self.model_type.clone())),
            ("Quarter", or_no_data(self.quarter.clone())),
            ("Sequence", or_no_data(self.sequence.map(|s| s.to_string()))),
            ("Horizon", or_no_data(self.horizon.clone())),
            ("Threshold", or_no_data(self.threshold.clone())),
            ("Small cap", or_no_data(self.small_cap.clone())),
            ("Prediction", self.prediction_label()),
            ("Worthiness", self.worthiness_label()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub ticker: Option<String>,
    pub worthiness: Option<Worthiness>,
}

impl Recommendation {
    pub fn worthiness_label(&self) -> String {
        or_no_data(self.worthiness.map(|w| w.to_string()))
    }
}

/// Multi-ticker `/predict` response. The two arrays are independent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProjection {
    pub predictions: Vec<PredictionResult>,
    pub recommendations: Vec<Recommendation>,
}

impl BatchProjection {
    pub fn for_ticker(&self, ticker: &str) -> (Option<&PredictionResult>, Option<&Recommendation>) {
        let matches = |t: &Option<String>| {
            t.as_deref()
                .is_some_and(|t| t.trim().eq_ignore_ascii_case(ticker))
        };
        (
            self.predictions.iter().find(|p| matches(&p.ticker)),
            self.recommendations.iter().find(|r| matches(&r.ticker)),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredictionProjection {
    Single(PredictionResult),
    Batch(BatchProjection),
}

pub(crate) fn or_no_data(v: Option<String>) -> String {
    v.unwrap_or_else(|| NO_DATA.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_render_placeholder() {
        let r = PredictionResult {
            ticker: Some("AAPL".to_string()),
            prediction: Some(1),
            ..Default::default()
        };
        assert_eq!(r.worthiness_label(), NO_DATA);
        assert_eq!(r.prediction_label(), "1");

        let rows = r.display_rows();
        assert_eq!(rows[0], ("Ticker", "AAPL".to_string()));
        assert_eq!(rows[1], ("Model type", NO_DATA.to_string()));
        assert_eq!(rows.len(), 9);
    }

    #[test]
    fn worthiness_parse_is_lenient_on_case_and_separator() {
        assert_eq!(Worthiness::parse("Worthy"), Some(Worthiness::Worthy));
        assert_eq!(Worthiness::parse("not_worthy"), Some(Worthiness::NotWorthy));
        assert_eq!(Worthiness::parse("NOT WORTHY"), Some(Worthiness::NotWorthy));
        assert_eq!(Worthiness::parse("maybe"), None);
    }

    #[test]
    fn batch_lookup_is_per_array() {
        let batch = BatchProjection {
            predictions: vec![
                PredictionResult {
                    ticker: Some("AAPL".to_string()),
                    prediction: Some(1),
                    ..Default::default()
                },
                PredictionResult {
                    ticker: Some("MSFT".to_string()),
                    prediction: Some(0),
                    ..Default::default()
                },
            ],
            recommendations: vec![Recommendation {
                ticker: Some("AAPL".to_string()),
                worthiness: Some(Worthiness::Worthy),
            }],
        };

        let (p, r) = batch.for_ticker("msft");
        assert_eq!(p.and_then(|p| p.prediction), Some(0));
        assert!(r.is_none());

        let (p, r) = batch.for_ticker("AAPL");
        assert!(p.is_some());
        assert_eq!(r.map(|r| r.worthiness_label()), Some("worthy".to_string()));
    }
}
