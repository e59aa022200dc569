use crate::error::ValidationError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MIN_SEQUENCE_LENGTH: u32 = 1;
pub const MAX_SEQUENCE_LENGTH: u32 = 12;
pub const MIN_THRESHOLD_PERCENT: u32 = 10;
pub const MAX_THRESHOLD_PERCENT: u32 = 100;

/// Raw dashboard state, exactly as the widgets hand it over.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSelection {
    #[serde(deserialize_with = "csv_or_list")]
    pub tickers: Vec<String>,
    pub model: String,
    pub quarter: String,
    pub quarter_start: Option<String>,
    pub quarter_end: Option<String>,
    pub sequence: u32,
    pub horizon: String,
    pub threshold: String,
    pub small_cap: bool,
}

impl Default for UiSelection {
    fn default() -> Self {
        Self {
            tickers: vec!["AAPL".to_string()],
            model: "RNN".to_string(),
            quarter: "2024-Q2".to_string(),
            quarter_start: None,
            quarter_end: None,
            sequence: 4,
            horizon: Horizon::QuarterAhead.as_str().to_string(),
            threshold: "0.5".to_string(),
            small_cap: true,
        }
    }
}

impl UiSelection {
    /// Validates every widget value. Either all of them are usable or nothing is built.
    pub fn into_parameters(self, max_tickers: usize) -> Result<RequestParameters, ValidationError> {
        let tickers = TickerSelection::new(self.tickers, max_tickers)?;
        let model_type = self.model.parse::<ModelType>()?;

        let period = match (self.quarter_start.as_deref(), self.quarter_end.as_deref()) {
            (Some(start), Some(end)) => Period::range(start.parse()?, end.parse()?)?,
            (None, None) => Period::Single(self.quarter.parse()?),
            _ => return Err(ValidationError::IncompleteQuarterRange),
        };

        Ok(RequestParameters {
            tickers,
            model_type,
            period,
            sequence_length: SequenceLength::new(self.sequence)?,
            horizon: self.horizon.parse()?,
            threshold: self.threshold.parse()?,
            small_cap_only: self.small_cap,
        })
    }
}

fn csv_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Csv(String),
        List(Vec<String>),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Csv(s) => s
            .split(',')
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string)
            .collect(),
        Raw::List(v) => v,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParameters {
    pub tickers: TickerSelection,
    pub model_type: ModelType,
    pub period: Period,
    pub sequence_length: SequenceLength,
    pub horizon: Horizon,
    pub threshold: Threshold,
    pub small_cap_only: bool,
}

/// Ordered ticker symbols, bounded by a configured maximum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TickerSelection(Vec<String>);

impl TickerSelection {
    pub fn new<I, S>(raw: I, max: usize) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for symbol in raw {
            let symbol = symbol.as_ref().trim().to_ascii_uppercase();
            if symbol.is_empty() {
                return Err(ValidationError::EmptyTicker);
            }
            if out.contains(&symbol) {
                return Err(ValidationError::DuplicateTicker(symbol));
            }
            out.push(symbol);
        }

        if out.is_empty() {
            return Err(ValidationError::NoTickers);
        }
        if out.len() > max {
            return Err(ValidationError::TooManyTickers {
                selected: out.len(),
                max,
            });
        }
        Ok(Self(out))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    Rnn,
    Knn,
    LogisticRegression,
    Xgb,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rnn => "rnn",
            Self::Knn => "knn",
            Self::LogisticRegression => "logistic_regression",
            Self::Xgb => "xgb",
        }
    }
}

impl FromStr for ModelType {
    type Err = ValidationError;

    /// Accepts UI labels such as "Logistic Regression" as well as the wire names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match crate::normalize::encode_model_label(s).as_str() {
            "rnn" => Ok(Self::Rnn),
            "knn" => Ok(Self::Knn),
            "logistic_regression" => Ok(Self::LogisticRegression),
            "xgb" | "xgboost" => Ok(Self::Xgb),
            _ => Err(ValidationError::UnknownModelType(s.to_string())),
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quarter {
    year: i32,
    number: u8,
}

impl Quarter {
    pub fn new(year: i32, number: u8) -> Option<Self> {
        (1..=4).contains(&number).then_some(Self { year, number })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn number(&self) -> u8 {
        self.number
    }
}

impl FromStr for Quarter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidQuarter(s.to_string());
        let (year, q) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let number = q
            .strip_prefix('Q')
            .or_else(|| q.strip_prefix('q'))
            .and_then(|n| n.parse::<u8>().ok())
            .ok_or_else(invalid)?;
        Self::new(year, number).ok_or_else(invalid)
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-Q{}", self.year, self.number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Single(Quarter),
    Range { start: Quarter, end: Quarter },
}

impl Period {
    pub fn range(start: Quarter, end: Quarter) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedQuarterRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self::Range { start, end })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceLength(u32);

impl SequenceLength {
    pub fn new(n: u32) -> Result<Self, ValidationError> {
        if (MIN_SEQUENCE_LENGTH..=MAX_SEQUENCE_LENGTH).contains(&n) {
            Ok(Self(n))
        } else {
            Err(ValidationError::SequenceOutOfRange(n))
        }
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Horizon {
    #[serde(rename = "quarter-ahead")]
    QuarterAhead,
    #[serde(rename = "year-ahead")]
    YearAhead,
    #[serde(rename = "2-year-ahead")]
    TwoYearAhead,
}

impl Horizon {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QuarterAhead => "quarter-ahead",
            Self::YearAhead => "year-ahead",
            Self::TwoYearAhead => "2-year-ahead",
        }
    }
}

impl FromStr for Horizon {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace([' ', '_'], "-");
        match key.as_str() {
            "quarter-ahead" => Ok(Self::QuarterAhead),
            "year-ahead" => Ok(Self::YearAhead),
            "2-year-ahead" => Ok(Self::TwoYearAhead),
            _ => Err(ValidationError::UnknownHorizon(s.to_string())),
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Integer percentage in 10..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Threshold(u32);

impl Threshold {
    pub fn from_percent(percent: u32) -> Result<Self, ValidationError> {
        if (MIN_THRESHOLD_PERCENT..=MAX_THRESHOLD_PERCENT).contains(&percent) {
            Ok(Self(percent))
        } else {
            Err(ValidationError::ThresholdOutOfRange(percent.to_string()))
        }
    }

    /// Slider value in [0.1, 1.0]. The percentage is truncated, not rounded.
    pub fn from_fraction(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || !(0.1..=1.0).contains(&value) {
            return Err(ValidationError::ThresholdOutOfRange(value.to_string()));
        }
        Self::from_percent((value * 100.0).trunc() as u32)
    }

    pub fn percent(&self) -> u32 {
        self.0
    }
}

impl FromStr for Threshold {
    type Err = ValidationError;

    /// "0.5", "50" and "50%" all mean 50%. Values up to 1.0 are fractions.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let out_of_range = || ValidationError::ThresholdOutOfRange(s.to_string());
        let trimmed = s.trim();
        if let Some(percent) = trimmed.strip_suffix('%') {
            let percent = percent.trim().parse::<u32>().map_err(|_| out_of_range())?;
            return Self::from_percent(percent);
        }

        let value = trimmed.parse::<f64>().map_err(|_| out_of_range())?;
        if value <= 1.0 {
            Self::from_fraction(value)
        } else if value.fract() == 0.0 && value <= MAX_THRESHOLD_PERCENT as f64 {
            Self::from_percent(value as u32)
        } else {
            Err(out_of_range())
        }
    }
}
