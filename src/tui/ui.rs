// src/tui/ui.rs
use crate::screener::chart::ChartPhase;
use crate::screener::performance::{format_gain, format_win_rate};
use crate::screener::results::SortKey;
use crate::tui::app::{App, EditTarget, InputMode, View};
use crate::tui::widgets::{candlestick_canvas, centered_rect, visible_candles, volume_canvas};
use crate::types::Signal;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, Tabs, Wrap},
};

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(7),
            Constraint::Length(2),
        ])
        .split(f.size());

    draw_header(f, chunks[0], app);
    draw_tabs(f, chunks[1], app);
    match app.view {
        View::Screener => draw_screener(f, chunks[2], app),
        View::Performance => draw_performance(f, chunks[2], app),
        View::History => draw_history(f, chunks[2], app),
        View::Parameters => draw_parameters(f, chunks[2], app),
    }
    draw_logs(f, chunks[3], app);
    draw_footer(f, chunks[4], app);

    if app.chart.is_open() {
        draw_chart_modal(f, app);
    }
    if let InputMode::Editing { target, buffer } = &app.input_mode {
        draw_input(f, target, buffer);
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let strategy = app
        .controller
        .selected_strategy()
        .map(|s| s.title().to_string())
        .unwrap_or_else(|| app.controller.strategy().to_string());

    let mut spans = vec![
        Span::styled("BIST Screener", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(" | {} | ", app.controller.watchlist())),
        Span::styled(strategy, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
    ];
    if let Some(stats) = &app.stats {
        spans.push(Span::raw(format!(
            " | {} tickers ({} active), data to {}",
            stats.tickers_count,
            stats.active_tickers,
            stats.latest_data_date.as_deref().unwrap_or("-")
        )));
    }
    if app.controller.is_loading() {
        spans.push(Span::styled(" | Scanning...", Style::default().fg(Color::Cyan)));
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(header, area);
}

fn draw_tabs(f: &mut Frame, area: Rect, app: &App) {
    let titles: Vec<Line> = View::ALL.iter().map(|v| Line::from(v.title())).collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL))
        .select(app.view.index())
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .divider("|");
    f.render_widget(tabs, area);
}

fn draw_screener(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    draw_chips(f, chunks[0], app);
    draw_filters(f, chunks[1], app);
    draw_results(f, chunks[2], app);

    if let Some(open) = app.chips.open_menu() {
        let verb = if app.controller.is_active(open) { "Deactivate" } else { "Activate" };
        let menu = Paragraph::new(vec![
            Line::from(format!("[t] {verb}")),
            Line::from("[x] Remove"),
        ])
        .block(Block::default().borders(Borders::ALL).title(format!(" {} ", open.label())));
        let popup = Rect {
            x: chunks[0].x + 2,
            y: chunks[0].bottom(),
            width: 28u16.min(chunks[0].width),
            height: 4,
        }
        .intersection(f.size());
        f.render_widget(Clear, popup);
        f.render_widget(menu, popup);
    }
}

fn draw_chips(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = Vec::new();
    for (i, signal_type) in app.controller.visible_signal_types().iter().enumerate() {
        let mut style = Style::default().fg(signal_type.color());
        if app.controller.is_active(signal_type) {
            style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
        }
        if i == app.chip_cursor {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        spans.push(Span::styled(format!(" {} ", signal_type.label()), style));
        spans.push(Span::raw(" "));
    }
    if app.controller.can_add_signal_type() {
        spans.push(Span::styled("[+]", Style::default().fg(Color::DarkGray)));
    }

    let chips = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Signal Types"));
    f.render_widget(chips, area);
}

fn draw_filters(f: &mut Frame, area: Rect, app: &App) {
    let r = app.controller.range();
    let price_max = if r.price_max.is_finite() {
        format!("{:.2}", r.price_max)
    } else {
        "∞".to_string()
    };
    let sort = app.controller.sort();
    let text = format!(
        "RSI {:.0}-{:.0}  ADX ≥{:.0}  Price {:.2}-{}  Vol ≥{:.0}  |  Sort: {} {}",
        r.rsi_min,
        r.rsi_max,
        r.adx_min,
        r.price_min,
        price_max,
        r.volume_min,
        sort.key.label(),
        sort.direction.arrow()
    );
    let title = if app.controller.range_is_customized() { "Filters *" } else { "Filters" };
    let filters = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(filters, area);
}

fn metric(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string())
}

fn signal_row(signal: &Signal) -> Row<'static> {
    Row::new(vec![
        Cell::from(signal.symbol.clone()),
        Cell::from(signal.signal_type.label()).style(Style::default().fg(signal.signal_type.color())),
        Cell::from(signal.signal_date.format("%Y-%m-%d").to_string()),
        Cell::from(format!("{:.2}", signal.price)),
        Cell::from(metric(signal.rsi)),
        Cell::from(metric(signal.adx)),
    ])
}

fn draw_results(f: &mut Frame, area: Rect, app: &mut App) {
    let view = app.controller.view();
    let sort = app.controller.sort();
    let mut title = format!("Results ({} of {})", view.len(), app.controller.signals().len());
    if let Some(summary) = app.controller.last_scan() {
        title.push_str(&format!(
            " | {} scanned in {:.1}s",
            summary.total_tickers_scanned, summary.execution_time
        ));
    }

    // a failed scan keeps the previous rows; the error sits above them
    let area = match app.controller.error() {
        Some(message) => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Min(3)])
                .split(area);
            let banner = Paragraph::new(message.to_string()).style(Style::default().fg(Color::Red));
            f.render_widget(banner, chunks[0]);
            chunks[1]
        }
        None => area,
    };

    if view.is_empty() {
        let hint = if app.controller.signals().is_empty() {
            "No signals yet. Press [s] to scan."
        } else {
            "No signals match the current filters."
        };
        let empty = Paragraph::new(hint)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(empty, area);
        return;
    }

    let header_cell = |key: Option<SortKey>, label: &'static str| {
        let text = match key {
            Some(k) if k == sort.key => format!("{label} {}", sort.direction.arrow()),
            _ => label.to_string(),
        };
        Cell::from(text)
    };
    let header = Row::new(vec![
        header_cell(Some(SortKey::Symbol), "Symbol"),
        header_cell(None, "Signal Type"),
        header_cell(Some(SortKey::SignalDate), "Date"),
        header_cell(Some(SortKey::Price), "Price"),
        header_cell(Some(SortKey::Rsi), "RSI"),
        header_cell(Some(SortKey::Adx), "ADX"),
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = view.iter().map(signal_row).collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(18),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .highlight_style(Style::default().bg(Color::DarkGray))
    .block(Block::default().borders(Borders::ALL).title(title));

    f.render_stateful_widget(table, area, &mut app.table);
}

fn draw_chart_modal(f: &mut Frame, app: &App) {
    let area = centered_rect(80, 80, f.size());
    f.render_widget(Clear, area);

    let symbol = app.chart.symbol().unwrap_or("-");
    let days = app.chart.days().unwrap_or(app.lookback_days);
    let title = format!(" {symbol} | {days} days | [l] lookback [Esc] close ");

    match app.chart.phase() {
        ChartPhase::Ready => {
            let Some(surface) = app.chart.surface() else {
                return;
            };
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
                .split(area);
            let candles = visible_candles(surface, chunks[0].width.saturating_sub(2));
            f.render_widget(candlestick_canvas(candles, title), chunks[0]);
            f.render_widget(volume_canvas(candles), chunks[1]);
        }
        ChartPhase::Loading => {
            let loading = Paragraph::new("Loading chart...")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(title));
            f.render_widget(loading, area);
        }
        ChartPhase::Failed => {
            let message = app.chart.failure().map(|e| e.to_string()).unwrap_or_default();
            let failed = Paragraph::new(vec![Line::from(message), Line::from("[r] retry")])
                .style(Style::default().fg(Color::Red))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(title));
            f.render_widget(failed, area);
        }
        ChartPhase::Closed => {}
    }
}

fn draw_performance(f: &mut Frame, area: Rect, app: &App) {
    let dashboard = &app.performance;
    let title = format!(
        "Performance | last {} days | period {} ",
        dashboard.days(),
        dashboard.period().as_str()
    );

    let Some(snapshot) = dashboard.snapshot() else {
        let text = match (dashboard.is_loading(), dashboard.error()) {
            (true, _) => "Loading performance...".to_string(),
            (false, Some(e)) => e.to_string(),
            (false, None) => "Press [r] to load performance.".to_string(),
        };
        let placeholder = Paragraph::new(text)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(placeholder, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Min(5)])
        .split(area);

    let totals = &snapshot.summary.summary;
    let mut summary = format!(
        "Signals {}  Tracked {}  Win rate 7d {}  Avg gain 7d {}",
        totals.total_signals,
        totals.tracked_signals,
        format_win_rate(totals.overall_win_rate_7d),
        format_gain(totals.overall_avg_gain_7d)
    );
    if let Some(e) = dashboard.error() {
        summary.push_str(&format!("  ({e})"));
    }
    f.render_widget(
        Paragraph::new(summary).block(Block::default().borders(Borders::ALL).title(title)),
        chunks[0],
    );

    let period = dashboard.period();
    let type_rows: Vec<Row> = snapshot
        .summary
        .by_signal_type
        .iter()
        .map(|row| {
            let stats = period.stats(&row.performance);
            Row::new(vec![
                Cell::from(row.signal_type.label()).style(Style::default().fg(row.signal_type.color())),
                Cell::from(row.total_signals.to_string()),
                Cell::from(stats.tracked.to_string()),
                Cell::from(format_gain(stats.avg_gain)),
                Cell::from(format_win_rate(stats.win_rate)),
            ])
        })
        .collect();
    let by_type = Table::new(
        type_rows,
        [
            Constraint::Length(18),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(8),
        ],
    )
    .header(Row::new(vec!["Type", "Signals", "Tracked", "Avg", "Win"]).style(Style::default().add_modifier(Modifier::BOLD)))
    .block(Block::default().borders(Borders::ALL).title("By Signal Type"));

    let lower = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);
    let upper = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);
    f.render_widget(by_type, upper[0]);

    let movers: Vec<ListItem> = snapshot
        .top
        .top_gainers
        .iter()
        .map(|p| (p, Color::Green))
        .chain(snapshot.top.top_losers.iter().map(|p| (p, Color::Red)))
        .map(|(p, color)| {
            ListItem::new(Line::from(vec![
                Span::raw(format!("{:<8}", p.symbol)),
                Span::styled(format_gain(p.gain), Style::default().fg(color)),
            ]))
        })
        .collect();
    f.render_widget(
        List::new(movers).block(Block::default().borders(Borders::ALL).title("Top Movers")),
        upper[1],
    );

    let symbol_rows: Vec<Row> = snapshot
        .symbols
        .iter()
        .map(|s| {
            Row::new(vec![
                s.symbol.clone(),
                s.total_signals.to_string(),
                format_gain(s.avg_gain_7d),
                format_win_rate(s.win_rate_7d),
                format_gain(s.best_gain),
                format_gain(s.worst_gain),
            ])
        })
        .collect();
    let widths = [
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Length(10),
    ];
    let (left, right) = symbol_rows.split_at(symbol_rows.len().div_ceil(2));
    for (rows, slot) in [(left, lower[0]), (right, lower[1])] {
        let table = Table::new(rows.to_vec(), widths)
            .header(
                Row::new(vec!["Symbol", "Signals", "Avg 7d", "Win 7d", "Best", "Worst"])
                    .style(Style::default().add_modifier(Modifier::BOLD)),
            )
            .block(Block::default().borders(Borders::ALL).title("By Symbol"));
        f.render_widget(table, slot);
    }
}

fn draw_history(f: &mut Frame, area: Rect, app: &App) {
    let Some(page) = &app.history else {
        let placeholder = Paragraph::new("Loading signal history...")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Signal History"));
        f.render_widget(placeholder, area);
        return;
    };

    let first = if page.signals.is_empty() { 0 } else { page.offset + 1 };
    let last = page.offset as usize + page.signals.len();
    let title = format!("Signal History {first}-{last} of {} | [n] next [b] back [r] reload", page.total);
    let rows: Vec<Row> = page.signals.iter().map(signal_row).collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(18),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(8),
        ],
    )
    .header(
        Row::new(vec!["Symbol", "Signal Type", "Date", "Price", "RSI", "ADX"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(table, area);
}

fn draw_parameters(f: &mut Frame, area: Rect, app: &App) {
    let Some(params) = &app.params else {
        let placeholder = Paragraph::new("Loading parameters...")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Parameters"));
        f.render_widget(placeholder, area);
        return;
    };
    if params.is_empty() {
        let empty = Paragraph::new(format!("No tunable parameters for {}.", params.strategy()))
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Parameters"));
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = params
        .iter()
        .enumerate()
        .map(|(i, (name, value))| {
            let style = if i == app.param_cursor {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::raw(format!("{name:<28}")),
                Span::styled(value.display(), Style::default().fg(Color::Yellow)),
                Span::styled(format!("  ({})", value.kind()), Style::default().fg(Color::DarkGray)),
            ]))
            .style(style)
        })
        .collect();

    let dirty = if params.is_dirty() { " *" } else { "" };
    let title = format!("Parameters: {}{dirty} | [Enter] edit [u] undo [S] save", params.strategy());
    f.render_widget(
        List::new(items).block(Block::default().borders(Borders::ALL).title(title)),
        area,
    );
}

fn draw_logs(f: &mut Frame, area: Rect, app: &App) {
    let logs: Vec<ListItem> = app
        .logs
        .iter()
        .rev()
        .map(|s| ListItem::new(Line::from(Span::raw(s.as_str()))))
        .collect();

    let logs_list = List::new(logs).block(Block::default().borders(Borders::ALL).title("System Logs"));
    f.render_widget(logs_list, area);
}

fn draw_footer(f: &mut Frame, area: Rect, app: &App) {
    let help = if app.chart.is_open() {
        "[l] Lookback  [r] Retry  [Esc] Close chart"
    } else if app.chips.open_menu().is_some() {
        "[t] Toggle  [x] Remove  any other key closes"
    } else {
        match (&app.input_mode, app.view) {
            (InputMode::Editing { .. }, _) => "Enter: Confirm | Esc: Cancel",
            (_, View::Screener) => {
                "[s] Scan [m] Strategy [w] Watchlist [←→ Space] Chips [+] Add [1-6] Filters [R] Reset [o/O] Sort [e] Export [Enter] Chart"
            }
            (_, View::Performance) => "[r] Reload [p] Period [d] Days",
            (_, View::History) => "[n] Next [b] Back [r] Reload",
            (_, View::Parameters) => "[↑↓] Select [Enter] Edit [u] Undo [S] Save [r] Reload",
        }
    };

    let text = match &app.status {
        Some((status, _)) => format!("{status} | {help} | [Tab] View [q] Quit"),
        None => format!("{help} | [Tab] View [q] Quit"),
    };
    let footer = Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::TOP));
    f.render_widget(footer, area);
}

fn draw_input(f: &mut Frame, target: &EditTarget, buffer: &str) {
    let label = match target {
        EditTarget::Range(field) => field.label().to_string(),
        EditTarget::Watchlist => "Watchlist".to_string(),
        EditTarget::Parameter(name) => name.clone(),
    };
    let area = centered_rect(40, 20, f.size());
    let area = Rect {
        height: area.height.min(3),
        ..area
    };
    f.render_widget(Clear, area);
    let input = Paragraph::new(format!("{buffer}_"))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title(label));
    f.render_widget(input, area);
}
