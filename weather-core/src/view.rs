//! Caller-side view state for the weather screen.
//!
//! Wraps [`WeatherOrchestrator`] with the loading / error / ready states and
//! the rules for keeping old data on a failed refresh.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::{error::FetchError, model::WeatherReport, orchestrator::WeatherOrchestrator};

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Loading,
    /// First load failed; there is nothing else to show.
    Error(String),
    Ready {
        report: WeatherReport,
        /// Error from a later refresh, shown alongside the old data.
        notice: Option<String>,
    },
}

impl ViewState {
    pub fn report(&self) -> Option<&WeatherReport> {
        match self {
            ViewState::Ready { report, .. } => Some(report),
            _ => None,
        }
    }

    /// Next state after a fetch outcome.
    fn apply(&self, outcome: Result<WeatherReport, FetchError>) -> ViewState {
        match (outcome, self) {
            (Ok(report), _) => ViewState::Ready {
                report,
                notice: None,
            },
            (Err(e), ViewState::Ready { report, .. }) => ViewState::Ready {
                report: report.clone(),
                notice: Some(e.to_string()),
            },
            (Err(e), _) => ViewState::Error(e.to_string()),
        }
    }
}

#[derive(Debug)]
pub struct WeatherView {
    orchestrator: WeatherOrchestrator,
    // Sequence number of the most recently issued fetch.
    issued: AtomicU64,
    state: watch::Sender<ViewState>,
}

impl WeatherView {
    pub fn new(orchestrator: WeatherOrchestrator) -> Self {
        let (state, _) = watch::channel(ViewState::Loading);
        Self {
            orchestrator,
            issued: AtomicU64::new(0),
            state,
        }
    }

    pub fn state(&self) -> ViewState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    /// Initial load. Shows `Loading` unless data is already on screen.
    pub async fn load(&self, lat: Option<f64>, lon: Option<f64>) -> ViewState {
        self.state.send_if_modified(|state| {
            if matches!(state, ViewState::Error(_)) {
                *state = ViewState::Loading;
                true
            } else {
                false
            }
        });
        self.run(lat, lon).await
    }

    /// User-triggered refresh. Existing data stays visible while it runs.
    pub async fn refresh(&self, lat: Option<f64>, lon: Option<f64>) -> ViewState {
        self.run(lat, lon).await
    }

    async fn run(&self, lat: Option<f64>, lon: Option<f64>) -> ViewState {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;

        let outcome = self.orchestrator.fetch(lat, lon).await;
        if let Err(e) = &outcome {
            tracing::warn!(seq, error = %e, "weather fetch failed");
        }

        self.state.send_if_modified(|state| {
            if self.issued.load(Ordering::SeqCst) != seq {
                tracing::debug!(seq, "discarding stale weather result");
                return false;
            }
            *state = state.apply(outcome);
            true
        });

        self.state()
    }
}
