// src/tui/app.rs
use crate::config::AppConfig;
use crate::screener::chart::{ChartHost, ChartSession};
use crate::screener::chips::ChipMenus;
use crate::screener::controller::{ScanOutcome, ScreenerController};
use crate::screener::params::ParameterSet;
use crate::screener::performance::PerformanceDashboard;
use crate::tui::tasks::Task;
use crate::tui::UiEvent;
use crate::types::{MarketStats, SignalPage, SignalQuery};
use ratatui::widgets::TableState;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info};

const MAX_LOGS: usize = 50;
const STATUS_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Screener,
    Performance,
    History,
    Parameters,
}

impl View {
    pub const ALL: [View; 4] = [View::Screener, View::Performance, View::History, View::Parameters];

    pub fn title(self) -> &'static str {
        match self {
            View::Screener => "Screener",
            View::Performance => "Performance",
            View::History => "History",
            View::Parameters => "Parameters",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|v| *v == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }
}

/// Numeric filter field being typed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeField {
    RsiMin,
    RsiMax,
    AdxMin,
    PriceMin,
    PriceMax,
    VolumeMin,
}

impl RangeField {
    pub fn label(self) -> &'static str {
        match self {
            RangeField::RsiMin => "RSI min",
            RangeField::RsiMax => "RSI max",
            RangeField::AdxMin => "ADX min",
            RangeField::PriceMin => "Price min",
            RangeField::PriceMax => "Price max",
            RangeField::VolumeMin => "Volume min",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing { target: EditTarget, buffer: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    Range(RangeField),
    Watchlist,
    Parameter(String),
}

pub struct App {
    pub controller: ScreenerController,
    pub chart_host: ChartHost,
    pub chart: ChartSession,
    pub chips: ChipMenus,
    pub chip_cursor: usize,
    pub table: TableState,
    pub view: View,
    pub input_mode: InputMode,
    pub stats: Option<MarketStats>,
    pub params: Option<ParameterSet>,
    pub param_cursor: usize,
    pub history: Option<SignalPage>,
    pub history_query: SignalQuery,
    pub performance: PerformanceDashboard,
    pub lookback_days: u32,
    pub export_dir: PathBuf,
    pub logs: Vec<String>,
    pub status: Option<(String, Instant)>,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: &AppConfig, width: u16) -> Self {
        let chart_host = ChartHost::new(width);
        Self {
            controller: ScreenerController::from_config(config),
            chart: ChartSession::new(chart_host.clone()),
            chart_host,
            chips: ChipMenus::default(),
            chip_cursor: 0,
            table: TableState::default(),
            view: View::Screener,
            input_mode: InputMode::Normal,
            stats: None,
            params: None,
            param_cursor: 0,
            history: None,
            history_query: SignalQuery::default(),
            performance: PerformanceDashboard::new(),
            lookback_days: config.chart_lookback_days,
            export_dir: config.export_dir.clone(),
            logs: Vec::new(),
            status: None,
            should_quit: false,
        }
    }

    pub fn startup_tasks(&mut self, api_url: &str) -> Vec<Task> {
        self.push_log(format!("Connected to {api_url}"));
        vec![Task::Stats, Task::Strategies]
    }

    /// Shows a notice in the footer and keeps it in the log pane.
    pub fn notify(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.push_log(message.clone());
        self.status = Some((message, Instant::now()));
    }

    pub fn clear_expired_status(&mut self) {
        if let Some((_, since)) = &self.status {
            if since.elapsed() > STATUS_TTL {
                self.status = None;
            }
        }
    }

    fn push_log(&mut self, message: String) {
        let stamp = chrono::Local::now().format("%H:%M:%S");
        self.logs.push(format!("{stamp} {message}"));
        if self.logs.len() > MAX_LOGS {
            self.logs.remove(0);
        }
    }

    pub fn on_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::StatsLoaded(result) => match result {
                Ok(stats) => self.stats = Some(stats),
                Err(e) => error!("Failed to load market stats: {}", e),
            },
            UiEvent::StrategiesLoaded(result) => {
                self.controller.apply_strategies(result);
            }
            UiEvent::ScanFinished { ticket, result } => match self.controller.finish_scan(ticket, result) {
                ScanOutcome::Applied { signals } => {
                    let shown = self.controller.view().len();
                    self.table.select(if shown == 0 { None } else { Some(0) });
                    self.notify(format!("Scan complete: {signals} signals, {shown} shown"));
                }
                ScanOutcome::Failed(message) => self.notify(message),
                ScanOutcome::Stale => {}
            },
            UiEvent::ChartLoaded { ticket, result } => {
                self.chart.complete(ticket, result);
            }
            UiEvent::ParametersLoaded { strategy, result } => match result {
                Ok(values) if strategy == self.controller.strategy() => {
                    info!("Loaded {} parameters for {}", values.len(), strategy);
                    self.params = Some(ParameterSet::new(strategy, values));
                    self.param_cursor = 0;
                }
                Ok(_) => {}
                Err(e) => self.notify(format!("Could not load parameters: {e}")),
            },
            UiEvent::ParametersSaved { strategy, result } => match result {
                Ok(_) => {
                    if let Some(params) = self.params.as_mut().filter(|p| p.strategy() == strategy) {
                        params.commit();
                    }
                    self.notify(format!("Parameters saved for {strategy}"));
                }
                Err(e) => self.notify(format!("Could not save parameters: {e}")),
            },
            UiEvent::HistoryLoaded(result) => match result {
                Ok(page) => self.history = Some(page),
                Err(e) => self.notify(format!("Could not load signal history: {e}")),
            },
            UiEvent::PerformanceLoaded { ticket, result } => {
                self.performance.complete(ticket, result);
            }
        }
    }

    pub fn resize(&mut self, width: u16) {
        self.chart_host.resize(width);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::screener::controller::tests::scan_of;
    use crate::screener::filter::tests::signal;

    pub(crate) fn app() -> App {
        let config = AppConfig {
            api_url: "http://localhost:5001".into(),
            timeout_secs: 30,
            user_id: 1,
            watchlist: "BIST TUM".into(),
            strategy: "XTUMYV27Strategy".into(),
            chart_lookback_days: 90,
            export_dir: PathBuf::from("."),
            log_dir: PathBuf::from("logs"),
        };
        App::new(&config, 120)
    }

    #[test]
    fn scan_result_selects_first_row_and_notifies() {
        let mut app = app();
        let pending = app.controller.begin_scan();
        app.on_event(UiEvent::ScanFinished {
            ticket: pending.ticket,
            result: Ok(scan_of(vec![signal("AKBNK", Some(60.0), Some(25.0), 50.0)])),
        });
        assert_eq!(app.table.selected(), Some(0));
        assert!(app.status.as_ref().unwrap().0.contains("1 signals"));
        assert_eq!(app.logs.len(), 1);
    }

    #[test]
    fn failed_scan_surfaces_retry_notice() {
        let mut app = app();
        let pending = app.controller.begin_scan();
        app.on_event(UiEvent::ScanFinished {
            ticket: pending.ticket,
            result: Err(ApiError::Timeout),
        });
        assert!(app.status.as_ref().unwrap().0.contains("retry"));
        assert!(!app.controller.is_loading());
    }

    #[test]
    fn parameters_for_another_strategy_are_ignored() {
        let mut app = app();
        app.on_event(UiEvent::ParametersLoaded {
            strategy: "OtherStrategy".into(),
            result: Ok(Default::default()),
        });
        assert!(app.params.is_none());
    }

    #[test]
    fn terminal_resize_reaches_the_chart_host() {
        let mut app = app();
        app.resize(80);
        assert_eq!(app.chart_host.width(), 80);
    }

    #[test]
    fn startup_loads_stats_and_strategies_and_logs_the_service() {
        let mut app = app();
        let tasks = app.startup_tasks("http://localhost:5001");
        assert_eq!(tasks, vec![Task::Stats, Task::Strategies]);
        assert!(app.logs[0].ends_with("Connected to http://localhost:5001"));
        assert!(app.status.is_none());
    }

    #[test]
    fn log_pane_is_bounded() {
        let mut app = app();
        for i in 0..(MAX_LOGS + 5) {
            app.push_log(format!("line {i}"));
        }
        assert_eq!(app.logs.len(), MAX_LOGS);
        assert!(app.logs[0].ends_with("line 5"));
    }
}
