// src/tui/mod.rs
pub mod app;
pub mod event;
pub mod tasks;
pub mod ui;
pub mod widgets;

use crate::config::AppConfig;
use crate::connectors::traits::{ApiResult, ScreenerApi};
use crate::screener::performance::PerformanceSnapshot;
use crate::types::{MarketStats, OhlcvCandle, ScanResult, SignalPage, Strategy, StrategyParameters};
use app::App;
use crossterm::{
    event::{self as term, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::sync::Arc;
use std::{io, time::Duration};
use tokio::sync::mpsc;
use tracing::info;

/// Results of background work, delivered to the UI loop.
#[derive(Debug)]
pub enum UiEvent {
    StatsLoaded(ApiResult<MarketStats>),
    StrategiesLoaded(ApiResult<Vec<Strategy>>),
    ScanFinished {
        ticket: u64,
        result: ApiResult<ScanResult>,
    },
    ChartLoaded {
        ticket: u64,
        result: ApiResult<Vec<OhlcvCandle>>,
    },
    ParametersLoaded {
        strategy: String,
        result: ApiResult<StrategyParameters>,
    },
    ParametersSaved {
        strategy: String,
        result: ApiResult<StrategyParameters>,
    },
    HistoryLoaded(ApiResult<SignalPage>),
    PerformanceLoaded {
        ticket: u64,
        result: ApiResult<PerformanceSnapshot>,
    },
}

pub async fn run(
    config: AppConfig,
    api: Arc<dyn ScreenerApi>,
    tx: mpsc::Sender<UiEvent>,
    mut rx: mpsc::Receiver<UiEvent>,
) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (width, _) = terminal::size()?;
    let mut app = App::new(&config, width);
    for task in app.startup_tasks(&config.api_url) {
        tasks::spawn(Arc::clone(&api), tx.clone(), task);
    }

    let result = event_loop(&mut terminal, &mut app, &api, &tx, &mut rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    info!("Console closed");
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    api: &Arc<dyn ScreenerApi>,
    tx: &mpsc::Sender<UiEvent>,
    rx: &mut mpsc::Receiver<UiEvent>,
) -> anyhow::Result<()> {
    loop {
        terminal.draw(|f| ui::ui(f, app))?;
        app.clear_expired_status();

        if term::poll(Duration::from_millis(100))? {
            let task = match term::read()? {
                Event::Key(key) if key.kind == term::KeyEventKind::Press => event::handle_key_event(app, key),
                Event::Resize(width, _) => {
                    app.resize(width);
                    None
                }
                _ => None,
            };
            if let Some(task) = task {
                tasks::spawn(Arc::clone(api), tx.clone(), task);
            }
        }

        while let Ok(event) = rx.try_recv() {
            app.on_event(event);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
