//! Trading error types

use crate::market::Symbol;
use thiserror::Error;

/// Validation failures surfaced by the engine.
///
/// Every variant is a local, recoverable rejection: the account aggregate
/// is left untouched and the caller may retry with corrected input. The
/// engine never retries internally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TradeError {
    #[error("no quote available for {0}")]
    UnknownSymbol(Symbol),

    #[error("order quantity must be positive")]
    InvalidQuantity,

    #[error("insufficient funds: need {required:.2}, have {available:.2}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("insufficient margin: need {required:.2}, have {available:.2}")]
    InsufficientMargin { required: f64, available: f64 },

    #[error("insufficient position in {symbol}: holding {held}, asked to sell {requested}")]
    InsufficientPosition {
        symbol: Symbol,
        held: i64,
        requested: u64,
    },

    #[error("insufficient short position in {symbol}: holding {held}, asked to cover {requested}")]
    InsufficientShortPosition {
        symbol: Symbol,
        held: i64,
        requested: u64,
    },

    #[error("order {0} not found")]
    OrderNotFound(String),
}
