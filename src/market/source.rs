//! Price source abstraction

use super::types::{InstrumentProfile, Symbol};
use dashmap::DashMap;
use std::sync::Arc;

/// Read dependency the engine settles trades against.
///
/// The engine never caches quotes; every operation re-reads the source so
/// the host can drive it from a live feed.
pub trait PriceSource {
    /// Current tradable price for a symbol, `None` when unquoted.
    fn current_price(&self, symbol: &Symbol) -> Option<f64>;

    /// Risk profile for metrics aggregation. Sources without instrument
    /// metadata can leave the default; callers substitute
    /// [`InstrumentProfile::default`].
    fn profile(&self, symbol: &Symbol) -> Option<InstrumentProfile> {
        let _ = symbol;
        None
    }
}

impl<P: PriceSource + ?Sized> PriceSource for &P {
    fn current_price(&self, symbol: &Symbol) -> Option<f64> {
        (**self).current_price(symbol)
    }

    fn profile(&self, symbol: &Symbol) -> Option<InstrumentProfile> {
        (**self).profile(symbol)
    }
}

impl<P: PriceSource + ?Sized> PriceSource for Arc<P> {
    fn current_price(&self, symbol: &Symbol) -> Option<f64> {
        (**self).current_price(symbol)
    }

    fn profile(&self, symbol: &Symbol) -> Option<InstrumentProfile> {
        (**self).profile(symbol)
    }
}

/// Concurrent quote table a market-data thread can update while the host
/// loop trades against it.
#[derive(Debug, Default)]
pub struct LivePriceTable {
    quotes: DashMap<Symbol, f64>,
    profiles: DashMap<Symbol, InstrumentProfile>,
}

impl LivePriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_price(&self, symbol: Symbol, price: f64) {
        self.quotes.insert(symbol, price);
    }

    pub fn set_profile(&self, symbol: Symbol, profile: InstrumentProfile) {
        self.profiles.insert(symbol, profile);
    }

    pub fn remove(&self, symbol: &Symbol) {
        self.quotes.remove(symbol);
        self.profiles.remove(symbol);
    }
}

impl PriceSource for LivePriceTable {
    fn current_price(&self, symbol: &Symbol) -> Option<f64> {
        self.quotes.get(symbol).map(|p| *p)
    }

    fn profile(&self, symbol: &Symbol) -> Option<InstrumentProfile> {
        self.profiles.get(symbol).map(|p| p.clone())
    }
}
