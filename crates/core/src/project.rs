//! Validates raw service responses and projects them into display structures.
//!
//! A non-200 status short-circuits before the body is touched. On a 200, a body that is not
//! JSON fails the call; any individual key that is missing or of the wrong type only
//! degrades that field.

use crate::domain::company::CompanyInfo;
use crate::domain::news::NewsItem;
use crate::domain::prediction::{
    or_no_data, BatchProjection, PredictionProjection, PredictionResult, Recommendation,
    Worthiness,
};
use crate::error::FetchError;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

pub fn ensure_ok(status: u16) -> Result<(), FetchError> {
    if status == 200 {
        Ok(())
    } else {
        Err(FetchError::RequestFailed { status })
    }
}

fn parse_body(status: u16, body: &str) -> Result<Value, FetchError> {
    ensure_ok(status)?;
    serde_json::from_str::<Value>(body).map_err(|e| FetchError::MalformedBody(e.to_string()))
}

pub fn project_prediction(status: u16, body: &str) -> Result<PredictionProjection, FetchError> {
    let raw = parse_body(status, body)?;
    let Some(obj) = raw.as_object() else {
        tracing::warn!("prediction response is not a JSON object; showing placeholders");
        return Ok(PredictionProjection::Single(PredictionResult::default()));
    };

    if obj.contains_key("predictions") || obj.contains_key("recommendations") {
        let predictions = object_entries(obj, "predictions")
            .map(prediction_from)
            .collect();
        let recommendations = object_entries(obj, "recommendations")
            .map(recommendation_from)
            .collect();
        return Ok(PredictionProjection::Batch(BatchProjection {
            predictions,
            recommendations,
        }));
    }

    Ok(PredictionProjection::Single(prediction_from(obj)))
}

pub fn project_news(status: u16, body: &str, limit: usize) -> Result<Vec<NewsItem>, FetchError> {
    let raw = parse_body(status, body)?;
    let Some(data) = raw.get("data").and_then(Value::as_array) else {
        tracing::warn!("news response has no data array");
        return Ok(Vec::new());
    };

    Ok(data
        .iter()
        .filter_map(Value::as_object)
        .take(limit)
        .map(|item| NewsItem {
            title: or_no_data(text_field(item, "title")),
            url: or_no_data(text_field(item, "url")),
            description: text_field(item, "description").filter(|s| !s.trim().is_empty()),
            published_at: text_field(item, "published_at")
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|d| d.with_timezone(&Utc)),
        })
        .collect())
}

pub fn project_company_info(status: u16, body: &str) -> Result<CompanyInfo, FetchError> {
    let raw = parse_body(status, body)?;
    let empty = Map::new();
    let obj = raw.as_object().unwrap_or(&empty);
    let field = |key: &str| or_no_data(text_field(obj, key));

    Ok(CompanyInfo {
        company_name: field("Company name"),
        market_cap: field("Market cap"),
        revenues: field("Revenues"),
        gross_profit: field("Gross Profit"),
        net_income: field("Net Income"),
        operating_cash_flows: field("Operating Cash Flows"),
    })
}

fn object_entries<'a>(
    obj: &'a Map<String, Value>,
    key: &'static str,
) -> impl Iterator<Item = &'a Map<String, Value>> {
    let entries: &[Value] = match obj.get(key) {
        Some(Value::Array(items)) => items.as_slice(),
        Some(other) => {
            tracing::warn!(key, found = %type_name(other), "expected an array; ignoring");
            &[]
        }
        None => &[],
    };
    entries.iter().filter_map(move |v| {
        let item = v.as_object();
        if item.is_none() {
            tracing::warn!(key, "skipping non-object entry");
        }
        item
    })
}

fn prediction_from(obj: &Map<String, Value>) -> PredictionResult {
    PredictionResult {
        ticker: text_field(obj, "ticker"),
        model_type: text_field(obj, "model_type"),
        quarter: text_field(obj, "quarter"),
        sequence: obj.get("sequence").and_then(as_integer),
        horizon: text_field(obj, "horizon"),
        threshold: text_field(obj, "threshold"),
        small_cap: text_field(obj, "small_cap").map(|s| s.to_ascii_lowercase()),
        prediction: obj.get("prediction").and_then(as_binary),
        worthiness: worthiness_field(obj),
    }
}

fn recommendation_from(obj: &Map<String, Value>) -> Recommendation {
    Recommendation {
        ticker: text_field(obj, "ticker"),
        worthiness: worthiness_field(obj),
    }
}

fn worthiness_field(obj: &Map<String, Value>) -> Option<Worthiness> {
    let raw = text_field(obj, "worthiness").or_else(|| text_field(obj, "recommendation"))?;
    let parsed = Worthiness::parse(&raw);
    if parsed.is_none() {
        tracing::warn!(value = %raw, "unrecognized worthiness value");
    }
    parsed
}

/// Strings as-is; numbers and booleans rendered as text.
fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_integer(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_binary(v: &Value) -> Option<u8> {
    let n = match v {
        Value::Bool(b) => return Some(u8::from(*b)),
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if n == 0.0 {
        Some(0)
    } else if n == 1.0 {
        Some(1)
    } else {
        None
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prediction::NO_DATA;
    use serde_json::json;

    fn single(projection: PredictionProjection) -> PredictionResult {
        match projection {
            PredictionProjection::Single(r) => r,
            other => panic!("expected single projection, got {other:?}"),
        }
    }

    #[test]
    fn projects_flat_response() {
        let body = json!({
            "ticker": "AAPL",
            "model_type": "rnn",
            "quarter": "2024-Q2",
            "sequence": 4,
            "horizon": "quarter-ahead",
            "threshold": "50%",
            "small_cap": true,
            "prediction": 1,
            "worthiness": "worthy",
        })
        .to_string();

        let r = single(project_prediction(200, &body).unwrap());
        assert_eq!(r.ticker.as_deref(), Some("AAPL"));
        assert_eq!(r.sequence, Some(4));
        assert_eq!(r.small_cap.as_deref(), Some("true"));
        assert_eq!(r.prediction, Some(1));
        assert_eq!(r.worthiness, Some(Worthiness::Worthy));
    }

    #[test]
    fn missing_worthiness_falls_back_to_placeholder() {
        let body = json!({"ticker": "AAPL", "prediction": 0}).to_string();
        let r = single(project_prediction(200, &body).unwrap());
        assert_eq!(r.worthiness, None);
        assert_eq!(r.worthiness_label(), "No data available");
        assert_eq!(r.prediction_label(), "0");
    }

    #[test]
    fn non_200_fails_without_parsing_body() {
        for status in [404, 500] {
            let err = project_prediction(status, "<html>not json</html>").unwrap_err();
            assert!(matches!(err, FetchError::RequestFailed { status: s } if s == status));
            assert!(err.to_string().contains(&status.to_string()));
        }
    }

    #[test]
    fn invalid_json_on_200_is_malformed_body() {
        let err = project_prediction(200, "not json").unwrap_err();
        assert!(matches!(err, FetchError::MalformedBody(_)));
    }

    #[test]
    fn odd_field_types_degrade_per_field() {
        let body = json!({
            "ticker": "MSFT",
            "sequence": "8",
            "threshold": 70,
            "small_cap": "True",
            "prediction": 2,
            "worthiness": {"nested": true},
        })
        .to_string();
        let r = single(project_prediction(200, &body).unwrap());
        assert_eq!(r.sequence, Some(8));
        assert_eq!(r.threshold.as_deref(), Some("70"));
        assert_eq!(r.small_cap.as_deref(), Some("true"));
        assert_eq!(r.prediction, None);
        assert_eq!(r.worthiness, None);
    }

    #[test]
    fn batch_arrays_are_independent() {
        let body = json!({
            "predictions": [
                {"ticker": "AAPL", "prediction": 1},
                {"ticker": "MSFT", "prediction": 0},
                "garbage",
            ],
            "recommendations": [
                {"ticker": "AAPL", "worthiness": "worthy"},
            ],
        })
        .to_string();

        let PredictionProjection::Batch(batch) = project_prediction(200, &body).unwrap() else {
            panic!("expected batch projection");
        };
        assert_eq!(batch.predictions.len(), 2);
        assert_eq!(batch.recommendations.len(), 1);

        let (p, r) = batch.for_ticker("MSFT");
        assert_eq!(p.and_then(|p| p.prediction), Some(0));
        assert!(r.is_none());
    }

    #[test]
    fn batch_with_only_recommendations() {
        let body = json!({
            "recommendations": [{"ticker": "TSLA", "recommendation": "not worthy"}],
        })
        .to_string();
        let PredictionProjection::Batch(batch) = project_prediction(200, &body).unwrap() else {
            panic!("expected batch projection");
        };
        assert!(batch.predictions.is_empty());
        let (p, r) = batch.for_ticker("TSLA");
        assert!(p.is_none());
        assert_eq!(r.and_then(|r| r.worthiness), Some(Worthiness::NotWorthy));
    }

    #[test]
    fn news_is_capped_and_tolerates_missing_fields() {
        let items: Vec<_> = (0..8)
            .map(|i| json!({"title": format!("Headline {i}"), "url": format!("https://n.test/{i}")}))
            .collect();
        let mut data = items;
        data.insert(0, json!({"url": "https://n.test/untitled", "published_at": "2024-05-01T12:00:00Z"}));
        let body = json!({"data": data}).to_string();

        let news = project_news(200, &body, 5).unwrap();
        assert_eq!(news.len(), 5);
        assert_eq!(news[0].title, NO_DATA);
        assert!(news[0].published_at.is_some());
        assert_eq!(news[1].title, "Headline 0");
    }

    #[test]
    fn news_without_data_is_empty() {
        assert!(project_news(200, "{}", 5).unwrap().is_empty());
        assert!(matches!(
            project_news(401, "{}", 5),
            Err(FetchError::RequestFailed { status: 401 })
        ));
    }

    #[test]
    fn company_info_fields_fall_back() {
        let body = json!({
            "Company name": "Apple Inc.",
            "Market cap": 3_100_000_000_000u64,
            "Net Income": "97B",
        })
        .to_string();
        let info = project_company_info(200, &body).unwrap();
        assert_eq!(info.company_name, "Apple Inc.");
        assert_eq!(info.market_cap, "3100000000000");
        assert_eq!(info.net_income, "97B");
        assert_eq!(info.revenues, NO_DATA);
        assert_eq!(info.operating_cash_flows, NO_DATA);
    }
}
