// src/screener/chart.rs
//! Candlestick chart lifecycle.
//!
//! A `ChartSession` moves through `Closed -> Loading -> Ready | Failed`.
//! While `Ready` it owns exactly one `ChartSurface` mounted on the shared
//! `ChartHost` and exactly one resize subscription on that host. Both are
//! released on every transition out of `Ready`, and on drop.

use crate::error::ApiError;
use crate::types::OhlcvCandle;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

pub const LOOKBACK_CHOICES: [u32; 4] = [30, 90, 180, 365];

type ResizeListener = Box<dyn Fn(u16) + Send>;

#[derive(Default)]
struct HostInner {
    width: u16,
    next_listener: u64,
    listeners: BTreeMap<u64, ResizeListener>,
    live_surfaces: usize,
}

/// The container charts are drawn into. Resize events from the terminal
/// are fanned out to the listeners registered here.
#[derive(Clone, Default)]
pub struct ChartHost {
    inner: Arc<Mutex<HostInner>>,
}

impl fmt::Debug for ChartHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("ChartHost")
            .field("width", &inner.width)
            .field("listeners", &inner.listeners.len())
            .field("live_surfaces", &inner.live_surfaces)
            .finish()
    }
}

impl ChartHost {
    pub fn new(width: u16) -> Self {
        let host = Self::default();
        host.lock().width = width;
        host
    }

    fn lock(&self) -> MutexGuard<'_, HostInner> {
        // a poisoned lock still holds consistent counters
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(test)]
    pub fn width(&self) -> u16 {
        self.lock().width
    }

    pub fn resize(&self, width: u16) {
        let mut inner = self.lock();
        inner.width = width;
        for listener in inner.listeners.values() {
            listener(width);
        }
    }

    pub fn mount(&self, candles: Vec<OhlcvCandle>) -> ChartSurface {
        let mut inner = self.lock();
        inner.live_surfaces += 1;
        ChartSurface {
            host: self.clone(),
            candles,
            width: Arc::new(AtomicU16::new(inner.width)),
            released: false,
        }
    }

    pub fn on_resize(&self, listener: impl Fn(u16) + Send + 'static) -> ResizeSubscription {
        let mut inner = self.lock();
        let id = inner.next_listener;
        inner.next_listener += 1;
        inner.listeners.insert(id, Box::new(listener));
        ResizeSubscription {
            host: self.clone(),
            id,
        }
    }

    #[cfg(test)]
    pub fn live_surfaces(&self) -> usize {
        self.lock().live_surfaces
    }

    #[cfg(test)]
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }
}

/// Removes its listener from the host when dropped.
#[derive(Debug)]
pub struct ResizeSubscription {
    host: ChartHost,
    id: u64,
}

impl Drop for ResizeSubscription {
    fn drop(&mut self) {
        self.host.lock().listeners.remove(&self.id);
    }
}

/// Owned handle to one mounted chart. `dispose` consumes it, so a surface
/// cannot be released twice or used after release.
#[derive(Debug)]
pub struct ChartSurface {
    host: ChartHost,
    candles: Vec<OhlcvCandle>,
    width: Arc<AtomicU16>,
    released: bool,
}

impl ChartSurface {
    pub fn candles(&self) -> &[OhlcvCandle] {
        &self.candles
    }

    pub fn width(&self) -> u16 {
        self.width.load(Ordering::Relaxed)
    }

    fn width_cell(&self) -> Arc<AtomicU16> {
        Arc::clone(&self.width)
    }

    pub fn dispose(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let mut inner = self.host.lock();
        inner.live_surfaces = inner.live_surfaces.saturating_sub(1);
    }
}

impl Drop for ChartSurface {
    fn drop(&mut self) {
        self.release();
    }
}

/// Lowest low and highest high across `candles`.
pub fn price_bounds(candles: &[OhlcvCandle]) -> (f64, f64) {
    candles
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| (lo.min(c.low), hi.max(c.high)))
}

pub fn max_volume(candles: &[OhlcvCandle]) -> f64 {
    candles.iter().map(|c| c.volume).fold(0.0, f64::max)
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartFailure {
    Empty,
    Network(String),
}

impl fmt::Display for ChartFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartFailure::Empty => f.write_str("No chart data available"),
            ChartFailure::Network(message) => write!(f, "Could not load chart: {message}"),
        }
    }
}

/// One OHLCV request the caller must run and hand back via `complete`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartFetch {
    pub ticket: u64,
    pub symbol: String,
    pub days: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartPhase {
    Closed,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug)]
enum ChartState {
    Closed,
    Loading(ChartFetch),
    Ready {
        fetch: ChartFetch,
        surface: ChartSurface,
        resize: ResizeSubscription,
    },
    Failed {
        fetch: ChartFetch,
        reason: ChartFailure,
    },
}

#[derive(Debug)]
pub struct ChartSession {
    host: ChartHost,
    state: ChartState,
    next_ticket: u64,
}

impl ChartSession {
    pub fn new(host: ChartHost) -> Self {
        Self {
            host,
            state: ChartState::Closed,
            next_ticket: 0,
        }
    }

    pub fn phase(&self) -> ChartPhase {
        match self.state {
            ChartState::Closed => ChartPhase::Closed,
            ChartState::Loading(_) => ChartPhase::Loading,
            ChartState::Ready { .. } => ChartPhase::Ready,
            ChartState::Failed { .. } => ChartPhase::Failed,
        }
    }

    pub fn is_open(&self) -> bool {
        self.phase() != ChartPhase::Closed
    }

    fn current(&self) -> Option<&ChartFetch> {
        match &self.state {
            ChartState::Closed => None,
            ChartState::Loading(fetch)
            | ChartState::Ready { fetch, .. }
            | ChartState::Failed { fetch, .. } => Some(fetch),
        }
    }

    pub fn symbol(&self) -> Option<&str> {
        self.current().map(|fetch| fetch.symbol.as_str())
    }

    pub fn days(&self) -> Option<u32> {
        self.current().map(|fetch| fetch.days)
    }

    pub fn surface(&self) -> Option<&ChartSurface> {
        match &self.state {
            ChartState::Ready { surface, .. } => Some(surface),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&ChartFailure> {
        match &self.state {
            ChartState::Failed { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Opens the chart, or re-targets it when already open. Returns the
    /// fetch to run, or `None` when the chart already shows these parameters.
    pub fn open(&mut self, symbol: &str, days: u32) -> Option<ChartFetch> {
        let unchanged = self
            .current()
            .is_some_and(|fetch| fetch.symbol == symbol && fetch.days == days);
        if unchanged && self.phase() != ChartPhase::Failed {
            return None;
        }
        Some(self.begin(symbol.to_string(), days))
    }

    pub fn set_lookback(&mut self, days: u32) -> Option<ChartFetch> {
        let symbol = self.symbol()?.to_string();
        self.open(&symbol, days)
    }

    /// Steps to the next entry of `LOOKBACK_CHOICES`, wrapping around.
    pub fn cycle_lookback(&mut self) -> Option<ChartFetch> {
        let days = self.days()?;
        let next = LOOKBACK_CHOICES
            .iter()
            .position(|&choice| choice == days)
            .map(|i| LOOKBACK_CHOICES[(i + 1) % LOOKBACK_CHOICES.len()])
            .unwrap_or(LOOKBACK_CHOICES[0]);
        self.set_lookback(next)
    }

    /// Applies a finished OHLCV fetch. Responses for anything other than
    /// the fetch currently loading are dropped; returns whether it was applied.
    pub fn complete(&mut self, ticket: u64, result: Result<Vec<OhlcvCandle>, ApiError>) -> bool {
        let fetch = match &self.state {
            ChartState::Loading(fetch) if fetch.ticket == ticket => fetch.clone(),
            _ => {
                debug!("Discarding stale chart response #{}", ticket);
                return false;
            }
        };

        self.state = match result {
            Ok(candles) if candles.is_empty() => {
                warn!("No OHLCV data for {}", fetch.symbol);
                ChartState::Failed {
                    fetch,
                    reason: ChartFailure::Empty,
                }
            }
            Ok(candles) => {
                let surface = self.host.mount(candles);
                let width = surface.width_cell();
                let resize = self
                    .host
                    .on_resize(move |w| width.store(w, Ordering::Relaxed));
                info!(
                    "Chart ready: {} ({} candles, {}d)",
                    fetch.symbol,
                    surface.candles().len(),
                    fetch.days
                );
                ChartState::Ready {
                    fetch,
                    surface,
                    resize,
                }
            }
            Err(e) => {
                warn!("Failed to load chart data for {}: {}", fetch.symbol, e);
                ChartState::Failed {
                    fetch,
                    reason: ChartFailure::Network(e.to_string()),
                }
            }
        };
        true
    }

    pub fn close(&mut self) {
        if self.is_open() {
            debug!("Closing chart for {:?}", self.symbol());
        }
        self.teardown();
    }

    fn begin(&mut self, symbol: String, days: u32) -> ChartFetch {
        self.teardown();
        self.next_ticket += 1;
        let fetch = ChartFetch {
            ticket: self.next_ticket,
            symbol,
            days,
        };
        info!("Loading chart for {} ({}d)", fetch.symbol, fetch.days);
        self.state = ChartState::Loading(fetch.clone());
        fetch
    }

    fn teardown(&mut self) {
        if let ChartState::Ready {
            surface, resize, ..
        } = std::mem::replace(&mut self.state, ChartState::Closed)
        {
            drop(resize);
            surface.dispose();
        }
    }
}
