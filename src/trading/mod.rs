//! Order execution and position management

pub mod account;
pub mod engine;
pub mod error;
pub mod orders;
pub mod pending;
pub mod router;
pub mod valuation;

pub use account::{Account, Position, Transaction, TransactionKind};
pub use engine::TradingEngine;
pub use error::TradeError;
pub use orders::{OrderStatus, PendingOrder, PendingOrderKind};
pub use pending::{PendingFill, PendingOrderBook};
pub use router::{EngineConfig, OrderKind, OrderOutcome, OrderRouter};
pub use valuation::{portfolio_metrics, total_value, PortfolioMetrics};
