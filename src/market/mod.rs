//! Market data: symbols, instrument profiles and price sources

pub mod source;
pub mod types;

pub use source::{LivePriceTable, PriceSource};
pub use types::{InstrumentProfile, Symbol};
