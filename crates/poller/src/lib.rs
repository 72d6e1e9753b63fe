//! Dashboard Poller
//!
//! Client-side loop behind the dashboard: polls the relay on a fixed
//! interval, keeps a bounded sliding window for the chart, and tracks
//! the latest reading labels. Ticks are fire-and-forget — a slow or
//! failed fetch skips that interval's update, nothing is queued or
//! retried, and a late response cannot reorder the window.

mod window;

pub use window::{ChartWindow, DEFAULT_CAPACITY};

use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storage::Sample;
use thiserror::Error;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

/// Poller error types
#[derive(Debug, Error)]
pub enum PollError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Poller configuration
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Relay base URL
    pub base_url: String,
    /// Poll interval (the dashboard uses 2s)
    pub interval: Duration,
    /// Chart window size
    pub window_capacity: usize,
    /// Operator session cookie, `name=value`
    pub session_cookie: Option<String>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            interval: Duration::from_secs(2),
            window_capacity: DEFAULT_CAPACITY,
            session_cookie: None,
        }
    }
}

/// What the dashboard gauges display. Sentinel polls carry the relay's
/// own placeholder text through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestReading {
    pub temperature: String,
    pub output: String,
}

impl Default for LatestReading {
    fn default() -> Self {
        Self {
            temperature: "--".to_string(),
            output: "--".to_string(),
        }
    }
}

/// `/latest-output` is either a full sample or the empty-store sentinel.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LatestOutputPayload {
    Present(Sample),
    Sentinel { temperature: String, output: String },
}

/// Fixed-interval polling client.
pub struct DashboardPoller {
    client: reqwest::Client,
    config: PollerConfig,
    window: Arc<Mutex<ChartWindow>>,
    reading: Arc<Mutex<LatestReading>>,
}

impl DashboardPoller {
    pub fn new(config: PollerConfig) -> Self {
        let window = Arc::new(Mutex::new(ChartWindow::new(config.window_capacity)));
        Self {
            client: reqwest::Client::new(),
            config,
            window,
            reading: Arc::new(Mutex::new(LatestReading::default())),
        }
    }

    /// Shared chart window, for whatever renders it.
    pub fn window(&self) -> Arc<Mutex<ChartWindow>> {
        self.window.clone()
    }

    /// Current gauge labels.
    pub fn reading(&self) -> LatestReading {
        self.reading
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// One-shot backfill from `/graph-data`, so the chart starts with
    /// history instead of building up from empty. Returns how many
    /// samples were applied.
    pub async fn seed(&self) -> Result<usize, PollError> {
        let url = format!("{}/graph-data", self.config.base_url);
        let samples: Vec<Sample> = self
            .request(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let applied = match self.window.lock() {
            Ok(mut window) => window.extend(samples),
            Err(_) => 0,
        };
        Ok(applied)
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.get(url);
        if let Some(cookie) = &self.config.session_cookie {
            builder = builder.header(reqwest::header::COOKIE, cookie.clone());
        }
        builder
    }

    /// Run the poll loop forever. Each tick spawns an independent fetch;
    /// successive polls are unordered relative to each other.
    pub async fn run(self) {
        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let client = self.client.clone();
            let url = format!("{}/latest-output", self.config.base_url);
            let cookie = self.config.session_cookie.clone();
            let window = self.window.clone();
            let reading = self.reading.clone();

            tokio::spawn(async move {
                match fetch_latest(&client, &url, cookie.as_deref()).await {
                    Ok(payload) => apply(payload, &window, &reading),
                    Err(err) => warn!(error = %err, "poll failed, skipping tick"),
                }
            });
        }
    }
}

async fn fetch_latest(
    client: &reqwest::Client,
    url: &str,
    cookie: Option<&str>,
) -> Result<LatestOutputPayload, PollError> {
    let mut builder = client.get(url);
    if let Some(cookie) = cookie {
        builder = builder.header(reqwest::header::COOKIE, cookie);
    }
    let payload = builder
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(payload)
}

/// Fold one poll result into the shared state. The reading label is
/// last-applied-wins; the window refuses stale ids on its own.
fn apply(
    payload: LatestOutputPayload,
    window: &Mutex<ChartWindow>,
    reading: &Mutex<LatestReading>,
) {
    match payload {
        LatestOutputPayload::Present(sample) => {
            info!(
                temperature = sample.temperature,
                output = sample.output,
                "latest reading"
            );
            if let Ok(mut reading) = reading.lock() {
                // Same formatting the dashboard uses for its gauges.
                *reading = LatestReading {
                    temperature: format!("{:.2}", sample.temperature),
                    output: format!("{:.2}", sample.output),
                };
            }
            if let Ok(mut window) = window.lock() {
                window.push(sample);
            }
        }
        LatestOutputPayload::Sentinel {
            temperature,
            output,
        } => {
            if let Ok(mut reading) = reading.lock() {
                *reading = LatestReading {
                    temperature,
                    output,
                };
            }
        }
    }
}
