// src/connectors/traits.rs
use crate::error::ApiError;
use crate::types::{
    MarketStats, OhlcvCandle, PerformanceSummary, ScanRequest, ScanResult, SignalPage,
    SignalQuery, Strategy, StrategyParameters, SymbolPerformance, TopPerformers,
};
use async_trait::async_trait;

pub type ApiResult<T> = Result<T, ApiError>;

/// The REST surface of the screener service.
#[async_trait]
pub trait ScreenerApi: Send + Sync {
    async fn stats(&self) -> ApiResult<MarketStats>;

    async fn strategies(&self) -> ApiResult<Vec<Strategy>>;

    async fn strategy_parameters(&self, strategy: &str) -> ApiResult<StrategyParameters>;

    async fn update_strategy_parameters(
        &self,
        strategy: &str,
        parameters: &StrategyParameters,
    ) -> ApiResult<StrategyParameters>;

    async fn run_scan(&self, request: &ScanRequest) -> ApiResult<ScanResult>;

    async fn signals(&self, query: &SignalQuery) -> ApiResult<SignalPage>;

    async fn ohlcv(&self, symbol: &str, days: u32) -> ApiResult<Vec<OhlcvCandle>>;

    async fn performance_summary(&self, days: u32) -> ApiResult<PerformanceSummary>;

    async fn top_performers(&self, period: &str, days: u32, limit: u32) -> ApiResult<TopPerformers>;

    async fn performance_by_symbol(
        &self,
        days: u32,
        page: u32,
        limit: u32,
    ) -> ApiResult<Vec<SymbolPerformance>>;
}
