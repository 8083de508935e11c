//! Single-account brokerage simulation engine.
//!
//! Turns trade intents (market and limit buys and sells, short sales and
//! covers, stop-loss and take-profit instructions) into filled
//! transactions against an externally supplied price feed. The engine
//! maintains signed position quantities with weighted-average cost bases,
//! enforces cash and short-margin sufficiency, re-evaluates queued
//! conditional orders per tick, and derives account valuation and
//! portfolio risk metrics on demand.
//!
//! The caller owns the [`Account`] aggregate and passes it mutably per
//! call; the engine never retains it, so persistence and per-account call
//! serialization stay with the host.

pub mod market;
pub mod trading;

// Re-export main types for easy access
pub use market::{InstrumentProfile, LivePriceTable, PriceSource, Symbol};
pub use trading::{
    Account, EngineConfig, OrderKind, OrderOutcome, OrderStatus, PendingFill, PendingOrder,
    PendingOrderKind, Position, TradeError, TradingEngine, Transaction, TransactionKind,
};
