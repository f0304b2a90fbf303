// src/tui/tasks.rs
//! Network work requested by the UI. Each task runs on the runtime and
//! posts exactly one `UiEvent` back when it finishes.
use crate::connectors::traits::ScreenerApi;
use crate::screener::chart::ChartFetch;
use crate::screener::controller::PendingScan;
use crate::screener::performance::{self, PerformanceQuery};
use crate::tui::UiEvent;
use crate::types::{SignalQuery, StrategyParameters};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    Stats,
    Strategies,
    Scan(PendingScan),
    Chart(ChartFetch),
    LoadParameters(String),
    SaveParameters {
        strategy: String,
        parameters: StrategyParameters,
    },
    History(SignalQuery),
    Performance(PerformanceQuery),
}

pub fn spawn(api: Arc<dyn ScreenerApi>, tx: mpsc::Sender<UiEvent>, task: Task) {
    debug!("Dispatching {:?}", task);
    tokio::spawn(async move {
        let event = execute(api.as_ref(), task).await;
        if tx.send(event).await.is_err() {
            error!("UI Channel closed! Interface is likely dead.");
        }
    });
}

async fn execute(api: &dyn ScreenerApi, task: Task) -> UiEvent {
    match task {
        Task::Stats => UiEvent::StatsLoaded(api.stats().await),
        Task::Strategies => UiEvent::StrategiesLoaded(api.strategies().await),
        Task::Scan(pending) => UiEvent::ScanFinished {
            ticket: pending.ticket,
            result: api.run_scan(&pending.request).await,
        },
        Task::Chart(fetch) => UiEvent::ChartLoaded {
            ticket: fetch.ticket,
            result: api.ohlcv(&fetch.symbol, fetch.days).await,
        },
        Task::LoadParameters(strategy) => {
            let result = api.strategy_parameters(&strategy).await;
            UiEvent::ParametersLoaded { strategy, result }
        }
        Task::SaveParameters { strategy, parameters } => {
            let result = api.update_strategy_parameters(&strategy, &parameters).await;
            UiEvent::ParametersSaved { strategy, result }
        }
        Task::History(query) => UiEvent::HistoryLoaded(api.signals(&query).await),
        Task::Performance(query) => UiEvent::PerformanceLoaded {
            ticket: query.ticket,
            result: performance::fetch(api, query.days, query.period).await,
        },
    }
}
