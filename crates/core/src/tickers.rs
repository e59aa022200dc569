use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;

/// Selectable ticker universe, read from disk on first use and kept until invalidated.
#[derive(Debug)]
pub struct TickerCache {
    path: PathBuf,
    cached: tokio::sync::Mutex<Option<Arc<Vec<String>>>>,
}

impl TickerCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: tokio::sync::Mutex::new(None),
        }
    }

    pub async fn get(&self) -> anyhow::Result<Arc<Vec<String>>> {
        let mut guard = self.cached.lock().await;
        if let Some(tickers) = guard.as_ref() {
            return Ok(tickers.clone());
        }

        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read ticker list {}", self.path.display()))?;
        let tickers = Arc::new(parse_ticker_list(&text));
        anyhow::ensure!(
            !tickers.is_empty(),
            "ticker list {} contains no symbols",
            self.path.display()
        );

        tracing::info!(path = %self.path.display(), count = tickers.len(), "loaded ticker list");
        *guard = Some(tickers.clone());
        Ok(tickers)
    }

    /// Drops the cached list so the next `get` reads the file again.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }
}

/// First csv column of each line, upper-cased and de-duplicated in file order.
pub fn parse_ticker_list(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let symbol = line
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
            .trim_matches('"')
            .to_ascii_uppercase();
        if symbol.is_empty() {
            continue;
        }
        if idx == 0 && matches!(symbol.as_str(), "TICKER" | "SYMBOL") {
            continue;
        }
        if !out.contains(&symbol) {
            out.push(symbol);
        }
    }
    out
}
