// src/screener/performance.rs
//! Signal performance dashboard: summary by type, top movers and per-symbol rows.
use crate::connectors::traits::{ApiResult, ScreenerApi};
use crate::types::{HorizonBreakdown, HorizonStats, PerformanceSummary, SymbolPerformance, TopPerformers};
use tracing::{error, info};

pub const DAY_CHOICES: [u32; 3] = [7, 30, 90];
const TOP_LIMIT: u32 = 10;
const SYMBOL_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    OneDay,
    ThreeDays,
    #[default]
    SevenDays,
}

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::ThreeDays => "3d",
            Period::SevenDays => "7d",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Period::OneDay => Period::ThreeDays,
            Period::ThreeDays => Period::SevenDays,
            Period::SevenDays => Period::OneDay,
        }
    }

    pub fn stats(self, breakdown: &HorizonBreakdown) -> HorizonStats {
        match self {
            Period::OneDay => breakdown.one_day,
            Period::ThreeDays => breakdown.three_days,
            Period::SevenDays => breakdown.seven_days,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSnapshot {
    pub summary: PerformanceSummary,
    pub top: TopPerformers,
    pub symbols: Vec<SymbolPerformance>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceQuery {
    pub ticket: u64,
    pub days: u32,
    pub period: Period,
}

/// Fetches the three dashboard sections together. One failure fails the whole load.
pub async fn fetch(api: &dyn ScreenerApi, days: u32, period: Period) -> ApiResult<PerformanceSnapshot> {
    let (summary, top, symbols) = futures::try_join!(
        api.performance_summary(days),
        api.top_performers(period.as_str(), days, TOP_LIMIT),
        api.performance_by_symbol(days, 1, SYMBOL_PAGE_SIZE),
    )?;
    Ok(PerformanceSnapshot { summary, top, symbols })
}

#[derive(Debug, Default)]
pub struct PerformanceDashboard {
    days_index: usize,
    period: Period,
    snapshot: Option<PerformanceSnapshot>,
    loading: bool,
    error: Option<String>,
    latest: u64,
}

impl PerformanceDashboard {
    pub fn new() -> Self {
        Self {
            days_index: 1,
            ..Default::default()
        }
    }

    pub fn days(&self) -> u32 {
        DAY_CHOICES[self.days_index % DAY_CHOICES.len()]
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn snapshot(&self) -> Option<&PerformanceSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn cycle_days(&mut self) -> PerformanceQuery {
        self.days_index = (self.days_index + 1) % DAY_CHOICES.len();
        self.begin_load()
    }

    pub fn cycle_period(&mut self) -> PerformanceQuery {
        self.period = self.period.next();
        self.begin_load()
    }

    pub fn begin_load(&mut self) -> PerformanceQuery {
        self.latest += 1;
        self.loading = true;
        self.error = None;
        PerformanceQuery {
            ticket: self.latest,
            days: self.days(),
            period: self.period,
        }
    }

    /// Returns false when the response belongs to an outdated query.
    pub fn complete(&mut self, ticket: u64, result: ApiResult<PerformanceSnapshot>) -> bool {
        if ticket != self.latest {
            return false;
        }
        self.loading = false;
        match result {
            Ok(snapshot) => {
                info!(
                    "Performance loaded: {} signal types, {} symbols",
                    snapshot.summary.by_signal_type.len(),
                    snapshot.symbols.len()
                );
                self.snapshot = Some(snapshot);
            }
            Err(e) => {
                error!("Performance load failed: {}", e);
                self.error = Some(format!("Could not load performance: {e}. Press r to retry."));
            }
        }
        true
    }
}

pub fn format_gain(gain: Option<f64>) -> String {
    match gain {
        Some(g) if g.is_finite() => format!("{g:+.2}%"),
        _ => "-".to_string(),
    }
}

pub fn format_win_rate(rate: Option<f64>) -> String {
    match rate {
        Some(r) if r.is_finite() => format!("{r:.1}%"),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::traits::ApiResult;
    use crate::error::ApiError;
    use crate::screener::controller::tests::FakeApi;
    use crate::types::{
        MarketStats, OhlcvCandle, ScanRequest, ScanResult, SignalPage, SignalQuery, Strategy,
        StrategyParameters,
    };
    use async_trait::async_trait;

    struct BrokenTopPerformers;

    #[async_trait]
    impl ScreenerApi for BrokenTopPerformers {
        async fn stats(&self) -> ApiResult<MarketStats> {
            Ok(MarketStats::default())
        }
        async fn strategies(&self) -> ApiResult<Vec<Strategy>> {
            Ok(Vec::new())
        }
        async fn strategy_parameters(&self, _strategy: &str) -> ApiResult<StrategyParameters> {
            Ok(StrategyParameters::new())
        }
        async fn update_strategy_parameters(
            &self,
            _strategy: &str,
            parameters: &StrategyParameters,
        ) -> ApiResult<StrategyParameters> {
            Ok(parameters.clone())
        }
        async fn run_scan(&self, _request: &ScanRequest) -> ApiResult<ScanResult> {
            Err(ApiError::Timeout)
        }
        async fn signals(&self, _query: &SignalQuery) -> ApiResult<SignalPage> {
            Ok(SignalPage::default())
        }
        async fn ohlcv(&self, _symbol: &str, _days: u32) -> ApiResult<Vec<OhlcvCandle>> {
            Ok(Vec::new())
        }
        async fn performance_summary(&self, _days: u32) -> ApiResult<PerformanceSummary> {
            Ok(PerformanceSummary::default())
        }
        async fn top_performers(&self, _period: &str, _days: u32, _limit: u32) -> ApiResult<TopPerformers> {
            Err(ApiError::Status {
                status: 500,
                message: "boom".into(),
            })
        }
        async fn performance_by_symbol(
            &self,
            _days: u32,
            _page: u32,
            _limit: u32,
        ) -> ApiResult<Vec<SymbolPerformance>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn gains_carry_sign_and_absent_is_dash() {
        assert_eq!(format_gain(Some(3.456)), "+3.46%");
        assert_eq!(format_gain(Some(-1.2)), "-1.20%");
        assert_eq!(format_gain(None), "-");
        assert_eq!(format_win_rate(Some(62.5)), "62.5%");
        assert_eq!(format_win_rate(Some(60.0)), "60.0%");
        assert_eq!(format_win_rate(None), "-");
    }

    #[test]
    fn period_cycles_through_horizons() {
        let mut p = Period::default();
        assert_eq!(p.as_str(), "7d");
        for expected in ["1d", "3d", "7d"] {
            p = p.next();
            assert_eq!(p.as_str(), expected);
        }
    }

    #[tokio::test]
    async fn one_failing_section_fails_the_load() {
        let mut dashboard = PerformanceDashboard::new();
        let query = dashboard.begin_load();
        let result = fetch(&BrokenTopPerformers, query.days, query.period).await;
        assert!(dashboard.complete(query.ticket, result));
        assert!(dashboard.snapshot().is_none());
        assert!(dashboard.error().unwrap().contains("retry"));
        assert!(!dashboard.is_loading());
    }

    #[tokio::test]
    async fn outdated_response_is_ignored() {
        let api = FakeApi::default();
        let mut dashboard = PerformanceDashboard::new();
        let first = dashboard.begin_load();
        let second = dashboard.cycle_period();
        assert_eq!(second.period, Period::OneDay);

        let stale = fetch(&api, first.days, first.period).await;
        assert!(!dashboard.complete(first.ticket, stale));
        assert!(dashboard.is_loading());

        let fresh = fetch(&api, second.days, second.period).await;
        assert!(dashboard.complete(second.ticket, fresh));
        assert!(dashboard.snapshot().is_some());
        assert_eq!(dashboard.days(), 30);
    }
}
