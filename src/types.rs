// src/types.rs
use crate::screener::registry::SignalType;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(default)]
    pub id: i64,
    pub symbol: String,
    pub signal_type: SignalType,
    #[serde(deserialize_with = "de_calendar_date")]
    pub signal_date: NaiveDate,
    pub price: f64,
    #[serde(default)]
    pub rsi: Option<f64>,
    #[serde(default)]
    pub adx: Option<f64>,
    #[serde(default, deserialize_with = "de_metadata")]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Signal {
    /// Volume reported by the strategy, if it attached one to the metadata.
    pub fn volume(&self) -> Option<f64> {
        self.metadata.get("volume").and_then(Value::as_f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

impl Strategy {
    pub fn title(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanRequest {
    pub strategy_name: String,
    pub user_id: i64,
    pub save_to_db: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbols: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_types: Option<Vec<SignalType>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScanResult {
    #[serde(default, alias = "strategy")]
    pub strategy_name: String,
    #[serde(default)]
    pub total_tickers_scanned: u64,
    #[serde(default)]
    pub signals_found: u64,
    #[serde(default)]
    pub execution_time: f64,
    #[serde(default)]
    pub saved_to_db: bool,
    #[serde(default)]
    pub signals: Vec<Signal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcvCandle {
    #[serde(deserialize_with = "de_calendar_date")]
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl OhlcvCandle {
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MarketStats {
    #[serde(default)]
    pub tickers_count: u64,
    #[serde(default)]
    pub active_tickers: u64,
    #[serde(default)]
    pub data_points: u64,
    #[serde(default)]
    pub latest_data_date: Option<String>,
}

/// Filters for the persisted signal history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_type: Option<SignalType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adx_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adx_max: Option<f64>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for SignalQuery {
    fn default() -> Self {
        Self {
            strategy_id: None,
            signal_type: None,
            date_from: None,
            date_to: None,
            rsi_min: None,
            rsi_max: None,
            adx_min: None,
            adx_max: None,
            limit: 50,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SignalPage {
    #[serde(default)]
    pub signals: Vec<Signal>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

/// Runtime-typed strategy parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

pub type StrategyParameters = BTreeMap<String, ParameterValue>;

// --- Performance dashboard ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct HorizonStats {
    #[serde(default)]
    pub tracked: u64,
    #[serde(default)]
    pub avg_gain: Option<f64>,
    #[serde(default)]
    pub win_rate: Option<f64>,
    #[serde(default)]
    pub wins: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HorizonBreakdown {
    #[serde(default, rename = "1d")]
    pub one_day: HorizonStats,
    #[serde(default, rename = "3d")]
    pub three_days: HorizonStats,
    #[serde(default, rename = "7d")]
    pub seven_days: HorizonStats,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SignalTypePerformance {
    pub signal_type: SignalType,
    #[serde(default)]
    pub total_signals: u64,
    #[serde(default)]
    pub performance: HorizonBreakdown,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SummaryTotals {
    #[serde(default)]
    pub total_signals: u64,
    #[serde(default)]
    pub tracked_signals: u64,
    #[serde(default)]
    pub overall_win_rate_7d: Option<f64>,
    #[serde(default)]
    pub overall_avg_gain_7d: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PerformanceSummary {
    #[serde(default)]
    pub summary: SummaryTotals,
    #[serde(default)]
    pub by_signal_type: Vec<SignalTypePerformance>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TopPerformer {
    #[serde(default)]
    pub id: i64,
    pub symbol: String,
    pub signal_type: SignalType,
    #[serde(default)]
    pub signal_date: Option<String>,
    #[serde(default)]
    pub gain: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TopPerformers {
    #[serde(default)]
    pub top_gainers: Vec<TopPerformer>,
    #[serde(default)]
    pub top_losers: Vec<TopPerformer>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SymbolPerformance {
    pub symbol: String,
    #[serde(default)]
    pub total_signals: u64,
    #[serde(default)]
    pub signal_types: Vec<SignalType>,
    #[serde(default)]
    pub avg_gain_7d: Option<f64>,
    #[serde(default)]
    pub win_rate_7d: Option<f64>,
    #[serde(default)]
    pub best_gain: Option<f64>,
    #[serde(default)]
    pub worst_gain: Option<f64>,
}

// --- Helpers ---

fn de_calendar_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_calendar_date(&raw).map_err(serde::de::Error::custom)
}

/// Accepts `YYYY-MM-DD`, a naive `YYYY-MM-DDTHH:MM:SS` or an RFC 3339 instant.
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.date());
        }
    }
    Err(format!("unrecognised date: {raw}"))
}

fn de_metadata<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}
