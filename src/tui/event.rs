// src/tui/event.rs
//! Keyboard handling. Every handler returns the network task it wants run, if any.

use crate::screener::chips::ChipAction;
use crate::screener::filter::NumericRange;
use crate::tui::app::{App, EditTarget, InputMode, RangeField, View};
use crate::tui::tasks::Task;
use crate::types::ParameterValue;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::info;

pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Option<Task> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return None;
    }

    if let InputMode::Editing { .. } = app.input_mode {
        return handle_editing_mode(app, key);
    }

    // the chart modal captures input while it is open
    if app.chart.is_open() {
        return handle_chart_keys(app, key);
    }
    if app.chips.open_menu().is_some() {
        return handle_chip_menu_keys(app, key);
    }

    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            None
        }
        KeyCode::Tab => switch_view(app, app.view.next()),
        _ => match app.view {
            View::Screener => handle_screener_keys(app, key),
            View::Performance => handle_performance_keys(app, key),
            View::History => handle_history_keys(app, key),
            View::Parameters => handle_parameter_keys(app, key),
        },
    }
}

fn switch_view(app: &mut App, view: View) -> Option<Task> {
    app.view = view;
    match view {
        View::Performance if app.performance.snapshot().is_none() && !app.performance.is_loading() => {
            Some(Task::Performance(app.performance.begin_load()))
        }
        View::History if app.history.is_none() => Some(history_task(app)),
        View::Parameters if needs_parameters(app) => {
            Some(Task::LoadParameters(app.controller.strategy().to_string()))
        }
        _ => None,
    }
}

fn needs_parameters(app: &App) -> bool {
    app.params
        .as_ref()
        .map_or(true, |p| p.strategy() != app.controller.strategy())
}

fn history_task(app: &mut App) -> Task {
    app.history_query.strategy_id = app.controller.selected_strategy().map(|s| s.id);
    Task::History(app.history_query.clone())
}

fn start_editing(app: &mut App, target: EditTarget, initial: String) {
    app.input_mode = InputMode::Editing {
        target,
        buffer: initial,
    };
}

fn range_value(range: &NumericRange, field: RangeField) -> f64 {
    match field {
        RangeField::RsiMin => range.rsi_min,
        RangeField::RsiMax => range.rsi_max,
        RangeField::AdxMin => range.adx_min,
        RangeField::PriceMin => range.price_min,
        RangeField::PriceMax => range.price_max,
        RangeField::VolumeMin => range.volume_min,
    }
}

fn set_range_value(range: &mut NumericRange, field: RangeField, value: f64) {
    match field {
        RangeField::RsiMin => range.rsi_min = value,
        RangeField::RsiMax => range.rsi_max = value,
        RangeField::AdxMin => range.adx_min = value,
        RangeField::PriceMin => range.price_min = value,
        RangeField::PriceMax => range.price_max = value,
        RangeField::VolumeMin => range.volume_min = value,
    }
}

fn range_field_for(c: char) -> Option<RangeField> {
    match c {
        '1' => Some(RangeField::RsiMin),
        '2' => Some(RangeField::RsiMax),
        '3' => Some(RangeField::AdxMin),
        '4' => Some(RangeField::PriceMin),
        '5' => Some(RangeField::PriceMax),
        '6' => Some(RangeField::VolumeMin),
        _ => None,
    }
}

fn handle_screener_keys(app: &mut App, key: KeyEvent) -> Option<Task> {
    match key.code {
        KeyCode::Char('s') => {
            if app.controller.is_loading() {
                return None;
            }
            app.notify(format!("Scanning {} with {}...", app.controller.watchlist(), app.controller.strategy()));
            Some(Task::Scan(app.controller.begin_scan()))
        }
        KeyCode::Char('m') => {
            app.controller.cycle_strategy();
            None
        }
        KeyCode::Char('w') => {
            let current = app.controller.watchlist().to_string();
            start_editing(app, EditTarget::Watchlist, current);
            None
        }
        KeyCode::Left => {
            app.chip_cursor = app.chip_cursor.saturating_sub(1);
            None
        }
        KeyCode::Right => {
            let last = app.controller.visible_signal_types().len().saturating_sub(1);
            app.chip_cursor = (app.chip_cursor + 1).min(last);
            None
        }
        KeyCode::Char(' ') => {
            if let Some(signal_type) = app.controller.visible_signal_types().get(app.chip_cursor).cloned() {
                app.chips.click(&signal_type);
            }
            None
        }
        KeyCode::Char('+') => {
            if !app.controller.add_signal_type() {
                app.notify("All signal types are already shown");
            }
            None
        }
        KeyCode::Char(c @ '1'..='6') => {
            if let Some(field) = range_field_for(c) {
                let value = range_value(&app.controller.range(), field);
                let initial = if value.is_finite() { value.to_string() } else { String::new() };
                start_editing(app, EditTarget::Range(field), initial);
            }
            None
        }
        KeyCode::Char('R') => {
            app.controller.reset_range();
            sync_selection(app);
            app.notify("Filters reset");
            None
        }
        KeyCode::Char('o') => {
            let next = app.controller.sort().key.next();
            app.controller.set_sort(next);
            sync_selection(app);
            None
        }
        KeyCode::Char('O') => {
            let same = app.controller.sort().key;
            app.controller.set_sort(same);
            sync_selection(app);
            None
        }
        KeyCode::Char('e') => {
            let today = chrono::Local::now().date_naive();
            match app.controller.export_csv(&app.export_dir, today) {
                Ok(path) => app.notify(format!("Exported to {}", path.display())),
                Err(e) => app.notify(format!("Export failed: {e}")),
            }
            None
        }
        KeyCode::Up => {
            move_selection(app, -1);
            None
        }
        KeyCode::Down => {
            move_selection(app, 1);
            None
        }
        KeyCode::Enter | KeyCode::Char('c') => {
            let view = app.controller.view();
            let symbol = app.table.selected().and_then(|i| view.get(i)).map(|s| s.symbol.clone())?;
            let days = app.lookback_days;
            app.chart.open(&symbol, days).map(Task::Chart)
        }
        _ => None,
    }
}

/// Keeps the table cursor on a row whenever the view has rows.
fn sync_selection(app: &mut App) {
    let shown = app.controller.view().len();
    if shown == 0 {
        app.table.select(None);
    } else if app.table.selected().map_or(true, |i| i >= shown) {
        app.table.select(Some(0));
    }
}

fn move_selection(app: &mut App, delta: i32) {
    let len = app.controller.view().len();
    if len == 0 {
        app.table.select(None);
        return;
    }
    let current = app.table.selected().unwrap_or(0) as i32;
    let next = (current + delta).clamp(0, len as i32 - 1);
    app.table.select(Some(next as usize));
}

fn handle_chip_menu_keys(app: &mut App, key: KeyEvent) -> Option<Task> {
    let action = match key.code {
        KeyCode::Char('t') | KeyCode::Enter => Some(ChipAction::Toggle),
        KeyCode::Char('x') | KeyCode::Delete => Some(ChipAction::Remove),
        KeyCode::Char(' ') => {
            if let Some(open) = app.chips.open_menu().cloned() {
                app.chips.click(&open);
            }
            None
        }
        _ => {
            app.chips.click_outside();
            None
        }
    };

    if let Some((signal_type, action)) = action.and_then(|a| app.chips.choose(a)) {
        match action {
            ChipAction::Toggle => app.controller.toggle_signal_type(&signal_type),
            ChipAction::Remove => {
                app.controller.remove_signal_type(&signal_type);
                let last = app.controller.visible_signal_types().len().saturating_sub(1);
                app.chip_cursor = app.chip_cursor.min(last);
            }
        }
    }
    None
}

fn handle_chart_keys(app: &mut App, key: KeyEvent) -> Option<Task> {
    match key.code {
        KeyCode::Esc | KeyCode::Char('c') | KeyCode::Char('q') => {
            app.chart.close();
            None
        }
        KeyCode::Char('l') => {
            let fetch = app.chart.cycle_lookback();
            if let Some(days) = app.chart.days() {
                app.lookback_days = days;
            }
            fetch.map(Task::Chart)
        }
        KeyCode::Char('r') => {
            let symbol = app.chart.symbol()?.to_string();
            let days = app.chart.days()?;
            app.chart.open(&symbol, days).map(Task::Chart)
        }
        _ => None,
    }
}

fn handle_performance_keys(app: &mut App, key: KeyEvent) -> Option<Task> {
    match key.code {
        KeyCode::Char('r') => Some(Task::Performance(app.performance.begin_load())),
        KeyCode::Char('p') => Some(Task::Performance(app.performance.cycle_period())),
        KeyCode::Char('d') => Some(Task::Performance(app.performance.cycle_days())),
        _ => None,
    }
}

fn handle_history_keys(app: &mut App, key: KeyEvent) -> Option<Task> {
    let limit = app.history_query.limit;
    match key.code {
        KeyCode::Char('r') => Some(history_task(app)),
        KeyCode::Char('n') => {
            let total = app.history.as_ref().map_or(0, |p| p.total);
            if u64::from(app.history_query.offset + limit) >= total {
                return None;
            }
            app.history_query.offset += limit;
            Some(history_task(app))
        }
        KeyCode::Char('b') => {
            if app.history_query.offset == 0 {
                return None;
            }
            app.history_query.offset = app.history_query.offset.saturating_sub(limit);
            Some(history_task(app))
        }
        _ => None,
    }
}

fn handle_parameter_keys(app: &mut App, key: KeyEvent) -> Option<Task> {
    let params = app.params.as_mut()?;
    let count = params.len();
    match key.code {
        KeyCode::Up => {
            app.param_cursor = app.param_cursor.saturating_sub(1);
            None
        }
        KeyCode::Down => {
            app.param_cursor = (app.param_cursor + 1).min(count.saturating_sub(1));
            None
        }
        KeyCode::Enter => {
            let (name, value) = params.iter().nth(app.param_cursor)?;
            let name = name.clone();
            if let ParameterValue::Bool(_) = value {
                params.toggle(&name);
            } else {
                let initial = value.display();
                start_editing(app, EditTarget::Parameter(name), initial);
            }
            None
        }
        KeyCode::Char('u') => {
            params.reset();
            app.notify("Parameter edits discarded");
            None
        }
        KeyCode::Char('S') => {
            if !params.is_dirty() {
                app.notify("No parameter changes to save");
                return None;
            }
            info!("Saving parameters for {}", params.strategy());
            Some(Task::SaveParameters {
                strategy: params.strategy().to_string(),
                parameters: params.to_wire(),
            })
        }
        KeyCode::Char('r') => Some(Task::LoadParameters(app.controller.strategy().to_string())),
        _ => None,
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) -> Option<Task> {
    let InputMode::Editing { target, buffer } = &mut app.input_mode else {
        return None;
    };

    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => {
            buffer.pop();
        }
        KeyCode::Char(c) => buffer.push(c),
        KeyCode::Enter => {
            let target = target.clone();
            let input = std::mem::take(buffer);
            app.input_mode = InputMode::Normal;
            commit_edit(app, target, &input);
        }
        _ => {}
    }
    None
}

fn commit_edit(app: &mut App, target: EditTarget, input: &str) {
    match target {
        EditTarget::Watchlist => {
            let name = input.trim();
            if !name.is_empty() {
                app.controller.set_watchlist(name);
            }
        }
        EditTarget::Range(field) => {
            let trimmed = input.trim();
            let value = if trimmed.is_empty() {
                Ok(range_value(&NumericRange::default(), field))
            } else {
                trimmed.parse::<f64>()
            };
            match value {
                Ok(v) if !v.is_nan() => {
                    let mut range = app.controller.range();
                    set_range_value(&mut range, field, v);
                    app.controller.set_range(range);
                    sync_selection(app);
                }
                _ => app.notify(format!("'{trimmed}' is not a number for {}", field.label())),
            }
        }
        EditTarget::Parameter(name) => {
            if let Some(params) = app.params.as_mut() {
                if let Err(e) = params.edit(&name, input) {
                    app.notify(e.to_string());
                }
            }
        }
    }
}
