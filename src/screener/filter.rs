// src/screener/filter.rs
//! Numeric range filtering over scan results.
//!
//! Absent RSI, ADX and volume compare as `0`, so any positive minimum
//! excludes a signal that carries no such reading.

use crate::types::Signal;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    pub rsi_min: f64,
    pub rsi_max: f64,
    pub adx_min: f64,
    pub price_min: f64,
    pub price_max: f64,
    pub volume_min: f64,
}

impl Default for NumericRange {
    fn default() -> Self {
        Self {
            rsi_min: 0.0,
            rsi_max: 100.0,
            adx_min: 0.0,
            price_min: 0.0,
            price_max: f64::INFINITY,
            volume_min: 0.0,
        }
    }
}

impl NumericRange {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, signal: &Signal) -> bool {
        let rsi = signal.rsi.unwrap_or(0.0);
        let adx = signal.adx.unwrap_or(0.0);
        let volume = signal.volume().unwrap_or(0.0);

        rsi >= self.rsi_min
            && rsi <= self.rsi_max
            && adx >= self.adx_min
            && signal.price >= self.price_min
            && signal.price <= self.price_max
            && volume >= self.volume_min
    }
}

/// Signals that satisfy `range`, in input order.
pub fn apply(signals: &[Signal], range: &NumericRange) -> Vec<Signal> {
    signals
        .iter()
        .filter(|signal| range.matches(signal))
        .cloned()
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::screener::registry::SignalType;
    use chrono::NaiveDate;
    use serde_json::{json, Map};

    pub(crate) fn signal(symbol: &str, rsi: Option<f64>, adx: Option<f64>, price: f64) -> Signal {
        Signal {
            id: 0,
            symbol: symbol.to_string(),
            signal_type: SignalType::new("PULLBACK AL"),
            signal_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            price,
            rsi,
            adx,
            metadata: Map::new(),
            created_at: None,
        }
    }

    fn sample() -> Vec<Signal> {
        vec![
            signal("AKBNK", Some(65.0), Some(30.0), 50.0),
            signal("THYAO", Some(20.0), Some(15.0), 200.0),
            signal("ASELS", None, None, 81.5),
            signal("SISE", Some(100.0), Some(0.0), 0.01),
        ]
    }

    #[test]
    fn rsi_min_keeps_only_strong_momentum() {
        let range = NumericRange {
            rsi_min: 50.0,
            ..Default::default()
        };
        let signals = vec![
            signal("AKBNK", Some(65.0), Some(30.0), 50.0),
            signal("THYAO", Some(20.0), Some(15.0), 200.0),
        ];
        let kept = apply(&signals, &range);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].symbol, "AKBNK");
    }

    #[test]
    fn widest_range_is_identity() {
        let signals = sample();
        assert_eq!(apply(&signals, &NumericRange::default()), signals);
    }

    #[test]
    fn filtering_is_idempotent() {
        let signals = sample();
        let ranges = [
            NumericRange::default(),
            NumericRange {
                rsi_min: 30.0,
                rsi_max: 70.0,
                ..Default::default()
            },
            NumericRange {
                adx_min: 10.0,
                price_max: 100.0,
                ..Default::default()
            },
        ];
        for range in ranges {
            let once = apply(&signals, &range);
            assert_eq!(apply(&once, &range), once);
        }
    }

    #[test]
    fn absent_indicator_fails_positive_minimum() {
        let signals = sample();
        let range = NumericRange {
            adx_min: 0.5,
            ..Default::default()
        };
        let kept = apply(&signals, &range);
        assert!(kept.iter().all(|s| s.symbol != "ASELS"));
    }

    #[test]
    fn inverted_range_yields_nothing() {
        let range = NumericRange {
            price_min: 300.0,
            price_max: 10.0,
            ..Default::default()
        };
        assert!(apply(&sample(), &range).is_empty());
    }

    #[test]
    fn volume_is_read_from_metadata() {
        let mut liquid = signal("GARAN", Some(55.0), Some(25.0), 100.0);
        liquid.metadata.insert("volume".into(), json!(2_500_000.0));
        let thin = signal("KOZAL", Some(55.0), Some(25.0), 100.0);

        let range = NumericRange {
            volume_min: 1_000_000.0,
            ..Default::default()
        };
        let kept = apply(&[liquid, thin], &range);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].symbol, "GARAN");
    }
}
