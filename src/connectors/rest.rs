// src/connectors/rest.rs
use crate::connectors::messages::{
    ErrorBody, OhlcvEnvelope, ParametersEnvelope, StrategiesEnvelope, SymbolPerformanceEnvelope,
    UpdateParametersBody,
};
use crate::connectors::traits::{ApiResult, ScreenerApi};
use crate::error::ApiError;
use crate::types::{
    MarketStats, OhlcvCandle, PerformanceSummary, ScanRequest, ScanResult, SignalPage,
    SignalQuery, Strategy, StrategyParameters, SymbolPerformance, TopPerformers,
};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

pub struct ScreenerClient {
    http_client: Client,
    base_url: Url,
    user_id: i64,
}

impl ScreenerClient {
    pub fn new(base_url: &str, timeout: Duration, user_id: i64) -> ApiResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidRequest(format!("bad base url {base_url}: {e}")))?;
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::from)?;

        Ok(Self {
            http_client,
            base_url,
            user_id,
        })
    }

    /// Appends escaped path segments to the base URL, keeping any prefix it has.
    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidRequest(format!("base url cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn with_query<Q: Serialize>(mut url: Url, query: &Q) -> ApiResult<Url> {
        let encoded =
            serde_urlencoded::to_string(query).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        if !encoded.is_empty() {
            url.set_query(Some(&encoded));
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("error").to_string());
            error!("API Error: {} {}", status, message);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice::<T>(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn request<T: DeserializeOwned>(&self, method: Method, url: Url) -> ApiResult<T> {
        debug!("{} {}", method, url);
        self.send(self.http_client.request(method, url)).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, url: Url, body: &B) -> ApiResult<T> {
        debug!("POST {}", url);
        self.send(self.http_client.post(url).json(body)).await
    }
}

#[async_trait]
impl ScreenerApi for ScreenerClient {
    async fn stats(&self) -> ApiResult<MarketStats> {
        let url = self.endpoint(&["api", "market-data", "stats"])?;
        self.request(Method::GET, url).await
    }

    async fn strategies(&self) -> ApiResult<Vec<Strategy>> {
        let url = self.endpoint(&["api", "screener", "strategies"])?;
        let envelope: StrategiesEnvelope = self.request(Method::GET, url).await?;
        Ok(envelope.strategies)
    }

    async fn strategy_parameters(&self, strategy: &str) -> ApiResult<StrategyParameters> {
        let url = self.endpoint(&["api", "screener", "strategies", strategy, "parameters"])?;
        let url = Self::with_query(url, &[("user_id", self.user_id)])?;
        let envelope: ParametersEnvelope = self.request(Method::GET, url).await?;
        Ok(envelope.into_parameters())
    }

    async fn update_strategy_parameters(
        &self,
        strategy: &str,
        parameters: &StrategyParameters,
    ) -> ApiResult<StrategyParameters> {
        let url = self.endpoint(&["api", "screener", "strategies", strategy, "parameters"])?;
        let body = UpdateParametersBody {
            user_id: self.user_id,
            parameters,
        };
        let envelope: ParametersEnvelope = self.post_json(url, &body).await?;
        Ok(envelope.into_parameters())
    }

    async fn run_scan(&self, request: &ScanRequest) -> ApiResult<ScanResult> {
        let url = self.endpoint(&["api", "screener", "scan"])?;
        self.post_json(url, request).await
    }

    async fn signals(&self, query: &SignalQuery) -> ApiResult<SignalPage> {
        let url = self.endpoint(&["api", "screener", "signals"])?;
        let url = Self::with_query(url, query)?;
        self.request(Method::GET, url).await
    }

    async fn ohlcv(&self, symbol: &str, days: u32) -> ApiResult<Vec<OhlcvCandle>> {
        let url = self.endpoint(&["api", "market-data", symbol, "ohlcv"])?;
        let url = Self::with_query(url, &[("days", days)])?;
        let envelope: OhlcvEnvelope = self.request(Method::GET, url).await?;
        Ok(envelope.data)
    }

    async fn performance_summary(&self, days: u32) -> ApiResult<PerformanceSummary> {
        let url = self.endpoint(&["api", "screener", "performance", "summary"])?;
        let url = Self::with_query(url, &[("days", days)])?;
        self.request(Method::GET, url).await
    }

    async fn top_performers(&self, period: &str, days: u32, limit: u32) -> ApiResult<TopPerformers> {
        let url = self.endpoint(&["api", "screener", "performance", "top-performers"])?;
        let days = days.to_string();
        let limit = limit.to_string();
        let url = Self::with_query(url, &[("period", period), ("days", days.as_str()), ("limit", limit.as_str())])?;
        self.request(Method::GET, url).await
    }

    async fn performance_by_symbol(
        &self,
        days: u32,
        page: u32,
        limit: u32,
    ) -> ApiResult<Vec<SymbolPerformance>> {
        let url = self.endpoint(&["api", "screener", "performance", "by-symbol"])?;
        let url = Self::with_query(url, &[("days", days), ("page", page), ("limit", limit)])?;
        let envelope: SymbolPerformanceEnvelope = self.request(Method::GET, url).await?;
        Ok(envelope.symbols)
    }
}
