// src/screener/controller.rs
use crate::config::AppConfig;
use crate::connectors::traits::{ApiResult, ScreenerApi};
use crate::error::{ApiError, ExportError};
use crate::screener::filter::{self, NumericRange};
use crate::screener::registry::{SignalType, SignalTypeRegistry};
use crate::screener::results::{self, SortKey, SortSpec};
use crate::types::{ScanRequest, ScanResult, Signal, Strategy};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

const DEFAULT_VISIBLE_TYPES: usize = 4;

/// A scan the caller must execute and report back through `finish_scan`.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingScan {
    pub ticket: u64,
    pub request: ScanRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanSummary {
    pub strategy_name: String,
    pub signals_found: u64,
    pub total_tickers_scanned: u64,
    pub execution_time: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Applied { signals: usize },
    Failed(String),
    /// A newer scan was issued after this one; the response was dropped.
    Stale,
}

pub struct ScreenerController {
    registry: SignalTypeRegistry,
    user_id: i64,
    watchlist: String,
    strategy: String,
    strategies: Vec<Strategy>,
    visible_signal_types: Vec<SignalType>,
    active_signal_types: Vec<SignalType>,
    signals: Arc<Vec<Signal>>,
    view: Arc<Vec<Signal>>,
    range: NumericRange,
    sort: SortSpec,
    loading: bool,
    latest_scan: u64,
    last_scan: Option<ScanSummary>,
    error: Option<String>,
}

impl ScreenerController {
    pub fn new(watchlist: impl Into<String>, strategy: impl Into<String>, user_id: i64) -> Self {
        let registry = SignalTypeRegistry::builtin();
        Self {
            registry,
            user_id,
            watchlist: watchlist.into(),
            strategy: strategy.into(),
            strategies: Vec::new(),
            visible_signal_types: registry.default_visible(DEFAULT_VISIBLE_TYPES),
            active_signal_types: Vec::new(),
            signals: Arc::new(Vec::new()),
            view: Arc::new(Vec::new()),
            range: NumericRange::default(),
            sort: SortSpec::default(),
            loading: false,
            latest_scan: 0,
            last_scan: None,
            error: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.watchlist, &config.strategy, config.user_id)
    }

    // --- Read access ---

    #[cfg(test)]
    pub fn registry(&self) -> SignalTypeRegistry {
        self.registry
    }

    pub fn watchlist(&self) -> &str {
        &self.watchlist
    }

    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    #[cfg(test)]
    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    pub fn selected_strategy(&self) -> Option<&Strategy> {
        self.strategies.iter().find(|s| s.name == self.strategy)
    }

    pub fn visible_signal_types(&self) -> &[SignalType] {
        &self.visible_signal_types
    }

    #[cfg(test)]
    pub fn active_signal_types(&self) -> &[SignalType] {
        &self.active_signal_types
    }

    pub fn is_active(&self, signal_type: &SignalType) -> bool {
        self.active_signal_types.contains(signal_type)
    }

    pub fn can_add_signal_type(&self) -> bool {
        self.registry.first_missing(&self.visible_signal_types).is_some()
    }

    /// Raw signals of the current scan.
    pub fn signals(&self) -> Arc<Vec<Signal>> {
        Arc::clone(&self.signals)
    }

    /// Filtered and sorted rows, as displayed.
    pub fn view(&self) -> Arc<Vec<Signal>> {
        Arc::clone(&self.view)
    }

    pub fn range(&self) -> NumericRange {
        self.range
    }

    pub fn range_is_customized(&self) -> bool {
        !self.range.is_default()
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_scan(&self) -> Option<&ScanSummary> {
        self.last_scan.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    // --- Selection ---

    pub fn set_watchlist(&mut self, watchlist: impl Into<String>) {
        self.watchlist = watchlist.into();
    }

    pub fn select_strategy(&mut self, name: impl Into<String>) {
        self.strategy = name.into();
        info!("Strategy selected: {}", self.strategy);
    }

    /// Moves the selection to the next strategy in the catalog.
    pub fn cycle_strategy(&mut self) {
        if self.strategies.is_empty() {
            return;
        }
        let next = self
            .strategies
            .iter()
            .position(|s| s.name == self.strategy)
            .map(|i| (i + 1) % self.strategies.len())
            .unwrap_or(0);
        let name = self.strategies[next].name.clone();
        self.select_strategy(name);
    }

    pub async fn load_strategies(&mut self, api: &dyn ScreenerApi) {
        let result = api.strategies().await;
        self.apply_strategies(result);
    }

    /// Keeps only active strategies. A failed fetch leaves the catalog as it was.
    pub fn apply_strategies(&mut self, result: ApiResult<Vec<Strategy>>) {
        match result {
            Ok(strategies) => {
                self.strategies = strategies.into_iter().filter(|s| s.is_active).collect();
                info!("Loaded {} active strategies", self.strategies.len());
            }
            Err(e) => error!("Failed to load strategies: {}", e),
        }
    }

    // --- Signal-type chips ---

    pub fn toggle_signal_type(&mut self, signal_type: &SignalType) {
        if let Some(pos) = self.active_signal_types.iter().position(|t| t == signal_type) {
            self.active_signal_types.remove(pos);
        } else {
            self.active_signal_types.push(signal_type.clone());
        }
    }

    pub fn remove_signal_type(&mut self, signal_type: &SignalType) {
        self.visible_signal_types.retain(|t| t != signal_type);
        self.active_signal_types.retain(|t| t != signal_type);
    }

    /// Shows the first registry type that is not visible yet.
    pub fn add_signal_type(&mut self) -> bool {
        match self.registry.first_missing(&self.visible_signal_types) {
            Some(signal_type) => {
                self.visible_signal_types.push(signal_type);
                true
            }
            None => false,
        }
    }

    // --- Filters and ordering ---

    pub fn set_range(&mut self, range: NumericRange) {
        self.range = range;
        self.refresh_view();
    }

    pub fn reset_range(&mut self) {
        self.set_range(NumericRange::default());
    }

    pub fn set_sort(&mut self, key: SortKey) {
        self.sort = self.sort.select(key);
        self.refresh_view();
    }

    fn refresh_view(&mut self) {
        let filtered = filter::apply(&self.signals, &self.range);
        self.view = Arc::new(results::sort(&filtered, self.sort));
    }

    // --- Scanning ---

    /// Issues a new scan. Any scan still in flight becomes stale.
    pub fn begin_scan(&mut self) -> PendingScan {
        self.latest_scan += 1;
        self.loading = true;
        self.error = None;

        let signal_types = if self.active_signal_types.is_empty() {
            None
        } else {
            Some(self.active_signal_types.clone())
        };

        let request = ScanRequest {
            strategy_name: self.strategy.clone(),
            user_id: self.user_id,
            save_to_db: false,
            symbols: None,
            signal_types,
        };
        info!(
            "Scan #{} started: {} on {}",
            self.latest_scan, request.strategy_name, self.watchlist
        );

        PendingScan {
            ticket: self.latest_scan,
            request,
        }
    }

    pub fn finish_scan(&mut self, ticket: u64, result: Result<ScanResult, ApiError>) -> ScanOutcome {
        if ticket != self.latest_scan {
            debug!("Discarding stale scan #{} (latest #{})", ticket, self.latest_scan);
            return ScanOutcome::Stale;
        }

        let outcome = match result {
            Ok(scan) => {
                let found = scan.signals.len();
                info!(
                    "Scan #{} finished: {} signals in {:.2}s",
                    ticket, found, scan.execution_time
                );
                self.last_scan = Some(ScanSummary {
                    strategy_name: scan.strategy_name,
                    signals_found: scan.signals_found.max(found as u64),
                    total_tickers_scanned: scan.total_tickers_scanned,
                    execution_time: scan.execution_time,
                });
                self.signals = Arc::new(scan.signals);
                self.refresh_view();
                ScanOutcome::Applied { signals: found }
            }
            Err(e) => {
                error!("Scan failed: {}", e);
                let message = format!("Scan failed: {e}. Press s to retry.");
                self.error = Some(message.clone());
                ScanOutcome::Failed(message)
            }
        };

        self.loading = false;
        outcome
    }

    pub async fn run_scan(&mut self, api: &dyn ScreenerApi) -> ScanOutcome {
        let pending = self.begin_scan();
        let result = api.run_scan(&pending.request).await;
        self.finish_scan(pending.ticket, result)
    }

    // --- Export ---

    pub fn export_csv(&self, dir: &Path, today: NaiveDate) -> Result<PathBuf, ExportError> {
        results::export_csv(&self.view, dir, today)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::connectors::traits::ApiResult;
    use crate::screener::filter::tests::signal;
    use crate::types::{
        MarketStats, OhlcvCandle, PerformanceSummary, SignalPage, SignalQuery,
        StrategyParameters, SymbolPerformance, TopPerformers,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory service: answers scans from a queue and records requests.
    #[derive(Default)]
    pub(crate) struct FakeApi {
        pub strategies: Mutex<Option<ApiResult<Vec<Strategy>>>>,
        pub scans: Mutex<Vec<ApiResult<ScanResult>>>,
        pub requests: Mutex<Vec<ScanRequest>>,
    }

    pub(crate) fn scan_of(signals: Vec<Signal>) -> ScanResult {
        ScanResult {
            strategy_name: "XTUMYV27Strategy".into(),
            total_tickers_scanned: 593,
            signals_found: signals.len() as u64,
            execution_time: 1.5,
            saved_to_db: false,
            signals,
        }
    }

    #[async_trait]
    impl ScreenerApi for FakeApi {
        async fn stats(&self) -> ApiResult<MarketStats> {
            Ok(MarketStats::default())
        }

        async fn strategies(&self) -> ApiResult<Vec<Strategy>> {
            self.strategies
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(ApiError::Timeout))
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

        async fn run_scan(&self, request: &ScanRequest) -> ApiResult<ScanResult> {
            self.requests.lock().unwrap().push(request.clone());
            let mut scans = self.scans.lock().unwrap();
            if scans.is_empty() {
                Err(ApiError::Connect("connection refused".into()))
            } else {
                scans.remove(0)
            }
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
            Ok(TopPerformers::default())
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

    fn strategy(id: i64, name: &str, active: bool) -> Strategy {
        Strategy {
            id,
            name: name.into(),
            display_name: name.to_uppercase(),
            description: None,
            is_active: active,
        }
    }

    fn controller() -> ScreenerController {
        ScreenerController::new("BIST TUM", "XTUMYV27Strategy", 1)
    }

    #[tokio::test]
    async fn load_strategies_keeps_active_and_survives_failure() {
        let api = FakeApi::default();
        *api.strategies.lock().unwrap() = Some(Ok(vec![
            strategy(1, "XTUMYV27Strategy", true),
            strategy(2, "LegacyStrategy", false),
        ]));
        let mut c = controller();

        c.load_strategies(&api).await;
        assert_eq!(c.strategies().len(), 1);
        assert_eq!(c.selected_strategy().unwrap().id, 1);

        // second call hits the Timeout fallback
        c.load_strategies(&api).await;
        assert_eq!(c.strategies().len(), 1);
    }

    #[test]
    fn double_toggle_restores_active_set() {
        let mut c = controller();
        let pullback = SignalType::new("PULLBACK AL");
        let dip = SignalType::new("DİP AL");
        c.toggle_signal_type(&dip);
        let before = c.active_signal_types().to_vec();

        c.toggle_signal_type(&pullback);
        assert!(c.is_active(&pullback));
        c.toggle_signal_type(&pullback);
        assert_eq!(c.active_signal_types(), before.as_slice());
    }

    #[test]
    fn removed_type_is_neither_visible_nor_active() {
        let mut c = controller();
        let trend = SignalType::new("TREND BAŞLANGIÇ");
        c.toggle_signal_type(&trend);
        c.remove_signal_type(&trend);
        assert!(!c.visible_signal_types().contains(&trend));
        assert!(!c.is_active(&trend));

        // removing something never shown is harmless
        c.remove_signal_type(&SignalType::new("UNKNOWN"));
        assert_eq!(c.visible_signal_types().len(), 3);
    }

    #[test]
    fn add_signal_type_fills_in_registry_order_then_stops() {
        let mut c = controller();
        assert!(c.add_signal_type());
        assert_eq!(c.visible_signal_types().last(), Some(&SignalType::new("ALTIN KIRILIM")));

        while c.add_signal_type() {}
        let visible = c.visible_signal_types().to_vec();
        let active = c.active_signal_types().to_vec();
        assert!(!c.add_signal_type());
        assert_eq!(c.visible_signal_types(), visible.as_slice());
        assert_eq!(c.active_signal_types(), active.as_slice());
        assert_eq!(visible.len(), c.registry().len());
    }

    #[tokio::test]
    async fn scan_sends_active_types_only_when_present() {
        let api = FakeApi::default();
        api.scans.lock().unwrap().push(Ok(scan_of(vec![])));
        api.scans.lock().unwrap().push(Ok(scan_of(vec![])));
        let mut c = controller();

        c.run_scan(&api).await;
        c.toggle_signal_type(&SignalType::new("ALTIN KIRILIM"));
        c.run_scan(&api).await;

        let requests = api.requests.lock().unwrap();
        assert_eq!(requests[0].signal_types, None);
        assert_eq!(
            requests[1].signal_types,
            Some(vec![SignalType::new("ALTIN_KIRILIM")])
        );
        assert!(!requests[1].save_to_db);
        assert_eq!(requests[1].strategy_name, "XTUMYV27Strategy");
    }

    #[tokio::test]
    async fn scan_result_is_filtered_immediately() {
        let api = FakeApi::default();
        api.scans.lock().unwrap().push(Ok(scan_of(vec![
            signal("AKBNK", Some(65.0), Some(30.0), 50.0),
            signal("THYAO", Some(20.0), Some(15.0), 200.0),
        ])));
        let mut c = controller();
        c.set_range(NumericRange {
            rsi_min: 50.0,
            ..Default::default()
        });

        let outcome = c.run_scan(&api).await;
        assert_eq!(outcome, ScanOutcome::Applied { signals: 2 });
        assert_eq!(c.signals().len(), 2);
        let view = c.view();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].symbol, "AKBNK");
        assert!(!c.is_loading());
    }

    #[tokio::test]
    async fn failed_scan_keeps_previous_signals() {
        let api = FakeApi::default();
        api.scans
            .lock()
            .unwrap()
            .push(Ok(scan_of(vec![signal("SISE", Some(40.0), Some(22.0), 41.0)])));
        let mut c = controller();
        c.run_scan(&api).await;

        let outcome = c.run_scan(&api).await;
        assert!(matches!(outcome, ScanOutcome::Failed(_)));
        assert_eq!(c.signals().len(), 1);
        assert!(c.error().unwrap().contains("retry"));
        assert!(!c.is_loading());
    }

    #[test]
    fn last_issued_scan_wins_over_last_resolved() {
        let mut c = controller();
        let first = c.begin_scan();
        let second = c.begin_scan();

        let outcome = c.finish_scan(
            second.ticket,
            Ok(scan_of(vec![signal("THYAO", Some(55.0), Some(25.0), 200.0)])),
        );
        assert_eq!(outcome, ScanOutcome::Applied { signals: 1 });

        let late = c.finish_scan(
            first.ticket,
            Ok(scan_of(vec![signal("AKBNK", Some(65.0), Some(30.0), 50.0)])),
        );
        assert_eq!(late, ScanOutcome::Stale);
        assert_eq!(c.view()[0].symbol, "THYAO");
    }

    #[test]
    fn stale_response_does_not_clear_loading() {
        let mut c = controller();
        let first = c.begin_scan();
        let _second = c.begin_scan();
        c.finish_scan(first.ticket, Err(ApiError::Timeout));
        assert!(c.is_loading());
        assert_eq!(c.error(), None);
    }

    #[test]
    fn sorting_and_filtering_replace_view_without_touching_signals() {
        let mut c = controller();
        let pending = c.begin_scan();
        c.finish_scan(
            pending.ticket,
            Ok(scan_of(vec![
                signal("THYAO", Some(20.0), None, 200.0),
                signal("AKBNK", Some(65.0), None, 50.0),
            ])),
        );
        let raw = c.signals();
        let before = c.view();

        c.set_sort(SortKey::Symbol);
        assert_eq!(c.view()[0].symbol, "AKBNK");
        assert_eq!(before.len(), 2);
        assert!(Arc::ptr_eq(&raw, &c.signals()));

        c.set_range(NumericRange {
            price_max: 100.0,
            ..Default::default()
        });
        assert!(c.range_is_customized());
        assert_eq!(c.view().len(), 1);
        c.reset_range();
        assert_eq!(c.view().len(), 2);
    }

    #[test]
    fn exporting_empty_view_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let err = controller().export_csv(dir.path(), today).unwrap_err();
        assert!(matches!(err, ExportError::Empty));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn cycle_strategy_wraps_around() {
        let mut c = controller();
        c.apply_strategies(Ok(vec![
            strategy(1, "XTUMYV27Strategy", true),
            strategy(2, "MomentumStrategy", true),
        ]));
        c.cycle_strategy();
        assert_eq!(c.strategy(), "MomentumStrategy");
        c.cycle_strategy();
        assert_eq!(c.strategy(), "XTUMYV27Strategy");
    }
}
