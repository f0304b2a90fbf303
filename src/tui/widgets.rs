// src/tui/widgets.rs
//! Candlestick and volume rendering on the ratatui canvas.

use crate::screener::chart::{self, ChartSurface};
use crate::types::OhlcvCandle;
use ratatui::{
    prelude::*,
    symbols::Marker,
    widgets::canvas::{Canvas, Context, Line as CanvasLine, Rectangle},
    widgets::{Block, Borders},
};

const BULL: Color = Color::Green;
const BEAR: Color = Color::Red;

/// The most recent candles that fit the surface, one per terminal column.
pub fn visible_candles(surface: &ChartSurface, inner_width: u16) -> &[OhlcvCandle] {
    let candles = surface.candles();
    let columns = usize::from(inner_width.min(surface.width())).max(1);
    let start = candles.len().saturating_sub(columns);
    &candles[start..]
}

fn candle_color(candle: &OhlcvCandle) -> Color {
    if candle.is_bullish() {
        BULL
    } else {
        BEAR
    }
}

pub fn candlestick_canvas<'a>(
    candles: &'a [OhlcvCandle],
    title: String,
) -> Canvas<'a, impl Fn(&mut Context) + 'a> {
    let (low, high) = chart::price_bounds(candles);
    let pad = ((high - low) * 0.05).max(0.01);
    let x_max = candles.len().max(1) as f64;

    Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .marker(Marker::Braille)
        .x_bounds([0.0, x_max])
        .y_bounds([low - pad, high + pad])
        .paint(move |ctx| {
            for (i, candle) in candles.iter().enumerate() {
                let x = i as f64 + 0.5;
                let color = candle_color(candle);
                ctx.draw(&CanvasLine {
                    x1: x,
                    y1: candle.low,
                    x2: x,
                    y2: candle.high,
                    color,
                });
                let body_low = candle.open.min(candle.close);
                ctx.draw(&Rectangle {
                    x: x - 0.3,
                    y: body_low,
                    width: 0.6,
                    height: (candle.close - candle.open).abs(),
                    color,
                });
            }
        })
}

pub fn volume_canvas<'a>(candles: &'a [OhlcvCandle]) -> Canvas<'a, impl Fn(&mut Context) + 'a> {
    let max_volume = chart::max_volume(candles).max(1.0);
    let x_max = candles.len().max(1) as f64;

    Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(" Volume "))
        .marker(Marker::Braille)
        .x_bounds([0.0, x_max])
        .y_bounds([0.0, max_volume])
        .paint(move |ctx| {
            for (i, candle) in candles.iter().enumerate() {
                let x = i as f64 + 0.5;
                ctx.draw(&CanvasLine {
                    x1: x,
                    y1: 0.0,
                    x2: x,
                    y2: candle.volume,
                    color: candle_color(candle),
                });
            }
        })
}

/// Rectangle of `percent_x` by `percent_y` centered in `area`.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screener::chart::ChartHost;
    use chrono::NaiveDate;

    fn candles(n: usize) -> Vec<OhlcvCandle> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        (0..n)
            .map(|i| OhlcvCandle {
                date: start + chrono::Days::new(i as u64),
                open: 10.0,
                high: 12.0,
                low: 9.0,
                close: 11.0,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn visible_window_follows_host_width() {
        let host = ChartHost::new(40);
        let surface = host.mount(candles(90));
        assert_eq!(visible_candles(&surface, 100).len(), 40);

        host.resize(200);
        // resizing the host alone does not reach an unsubscribed surface
        assert_eq!(visible_candles(&surface, 60).len(), 40);
        surface.dispose();
    }

    #[test]
    fn short_series_is_shown_whole() {
        let host = ChartHost::new(120);
        let surface = host.mount(candles(5));
        let shown = visible_candles(&surface, 80);
        assert_eq!(shown.len(), 5);
        assert_eq!(shown[0].date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(80, 80, area);
        assert!(popup.x >= area.x && popup.right() <= area.right());
        assert!(popup.y >= area.y && popup.bottom() <= area.bottom());
        assert!((78..=80).contains(&popup.width));
    }
}
