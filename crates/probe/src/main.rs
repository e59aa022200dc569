use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scout_core::client::{HttpPredictionClient, NewsApiClient, NewsService};
use scout_core::config::Settings;
use scout_core::dashboard::{Dashboard, NewsPanel, PanelOutcome, TickerPanel};
use scout_core::domain::params::{TickerSelection, UiSelection};
use scout_core::normalize::Normalizer;
use scout_core::tickers::TickerCache;

#[derive(Debug, Parser)]
#[command(name = "scout_probe", about = "Issue one dashboard request and print the result")]
struct Args {
    /// Print the projected result as JSON instead of text rows.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Request predictions for up to MAX_TICKERS tickers.
    Predict(PredictArgs),

    /// Latest headlines per ticker.
    News {
        #[arg(long, value_delimiter = ',', required = true)]
        tickers: Vec<String>,
    },

    /// Company financials from the prediction service.
    Info {
        #[arg(long)]
        ticker: String,
    },

    /// List the selectable tickers from TICKER_LIST_PATH.
    Tickers,
}

#[derive(Debug, clap::Args)]
struct PredictArgs {
    /// Comma-separated, order preserved.
    #[arg(long, value_delimiter = ',')]
    tickers: Vec<String>,

    /// RNN, KNN, Logistic Regression or XGB.
    #[arg(long)]
    model: Option<String>,

    /// YYYY-Qn.
    #[arg(long)]
    quarter: Option<String>,

    #[arg(long, requires = "quarter_end")]
    quarter_start: Option<String>,

    #[arg(long, requires = "quarter_start")]
    quarter_end: Option<String>,

    /// 1..=12.
    #[arg(long)]
    sequence: Option<u32>,

    /// quarter-ahead, year-ahead or 2-year-ahead.
    #[arg(long)]
    horizon: Option<String>,

    /// 0.1..=1.0, or 10..=100 with optional '%'.
    #[arg(long)]
    threshold: Option<String>,

    #[arg(long)]
    small_cap: Option<bool>,
}

impl PredictArgs {
    fn into_selection(self) -> UiSelection {
        let defaults = UiSelection::default();
        UiSelection {
            tickers: if self.tickers.is_empty() {
                defaults.tickers
            } else {
                self.tickers
            },
            model: self.model.unwrap_or(defaults.model),
            quarter: self.quarter.unwrap_or(defaults.quarter),
            quarter_start: self.quarter_start,
            quarter_end: self.quarter_end,
            sequence: self.sequence.unwrap_or(defaults.sequence),
            horizon: self.horizon.unwrap_or(defaults.horizon),
            threshold: self.threshold.unwrap_or(defaults.threshold),
            small_cap: self.small_cap.unwrap_or(defaults.small_cap),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if let Err(err) = run(&settings, args).await {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "probe failed");
        return Err(err);
    }
    Ok(())
}

async fn run(settings: &Settings, args: Args) -> anyhow::Result<()> {
    let dashboard = build_dashboard(settings)?;

    match args.command {
        Command::Predict(predict) => {
            let params = predict.into_selection().into_parameters(settings.max_tickers)?;
            let panels = dashboard.predict(&params).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&panels)?);
            } else {
                panels.iter().for_each(print_prediction_panel);
            }
        }
        Command::News { tickers } => {
            let tickers = TickerSelection::new(&tickers, settings.max_tickers)?;
            let panels = dashboard.news(&tickers).await;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&panels)?);
            } else {
                panels.iter().for_each(print_news_panel);
            }
        }
        Command::Info { ticker } => {
            let info = dashboard
                .company_info(&ticker)
                .await
                .with_context(|| format!("company info for {ticker} failed"))?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                for (label, value) in info.display_rows() {
                    println!("{label}: {value}");
                }
            }
        }
        Command::Tickers => {
            let path = settings.require_ticker_list_path()?;
            let tickers = TickerCache::new(path).get().await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(tickers.as_ref())?);
            } else {
                println!("{}", tickers.join("\n"));
            }
        }
    }
    Ok(())
}

fn build_dashboard(settings: &Settings) -> anyhow::Result<Dashboard> {
    let predictions = Arc::new(HttpPredictionClient::from_settings(settings)?);
    let news: Option<Arc<dyn NewsService>> = match NewsApiClient::from_settings(settings) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::debug!(error = %e, "news api disabled");
            None
        }
    };
    Ok(Dashboard::new(
        predictions,
        news,
        Normalizer::from_settings(settings),
        settings.news_limit,
    ))
}

fn print_prediction_panel(panel: &TickerPanel) {
    println!("== {}", panel.ticker);
    match &panel.outcome {
        PanelOutcome::Ready(ready) => {
            match &ready.prediction {
                Some(prediction) => {
                    for (label, value) in prediction.display_rows() {
                        println!("  {label}: {value}");
                    }
                }
                None => println!("  Prediction: {}", scout_core::domain::prediction::NO_DATA),
            }
            if let Some(recommendation) = &ready.recommendation {
                println!("  Recommendation: {}", recommendation.worthiness_label());
            }
        }
        PanelOutcome::Failed { message, .. } => println!("  error: {message}"),
    }
}

fn print_news_panel(panel: &NewsPanel) {
    println!("== {}", panel.ticker);
    match &panel.outcome {
        PanelOutcome::Ready(items) if items.is_empty() => println!("  no news"),
        PanelOutcome::Ready(items) => {
            for item in items {
                println!("  - {} ({})", item.title, item.url);
            }
        }
        PanelOutcome::Failed { message, .. } => println!("  error: {message}"),
    }
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
