//! Pending order records and trigger evaluation

use crate::market::Symbol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction-bearing kind of a queued instruction.
///
/// Limit kinds carry a limit price; stop-loss and take-profit carry a
/// trigger price and close whatever side of the book is open when they
/// fire (sell a long, cover a short).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingOrderKind {
    LimitBuy,
    LimitSell,
    LimitShort,
    StopLoss,
    TakeProfit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Executed,
    Cancelled,
}

/// One outstanding conditional or limit instruction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PendingOrder {
    pub id: String,
    pub symbol: Symbol,
    pub quantity: u64,
    pub kind: PendingOrderKind,
    /// Limit price for limit kinds, trigger price for stop/take-profit.
    pub price: f64,
    pub status: OrderStatus,
    pub created_time: DateTime<Utc>,
}

impl PendingOrder {
    /// Whether the order becomes executable at `current_price`.
    ///
    /// `position_sign` is the signum of the held quantity for the order's
    /// symbol (0 when flat). Trigger kinds cannot be direction-evaluated
    /// while flat and never fire then.
    pub fn should_trigger(&self, current_price: f64, position_sign: i64) -> bool {
        match self.kind {
            PendingOrderKind::LimitBuy => current_price <= self.price,
            PendingOrderKind::LimitSell | PendingOrderKind::LimitShort => {
                current_price >= self.price
            }
            PendingOrderKind::StopLoss => match position_sign {
                1 => current_price <= self.price,
                -1 => current_price >= self.price,
                _ => false,
            },
            PendingOrderKind::TakeProfit => match position_sign {
                1 => current_price >= self.price,
                -1 => current_price <= self.price,
                _ => false,
            },
        }
    }
}

/// Pending-order id source owned by the order book, replacing any
/// process-wide counter.
#[derive(Debug, Default)]
pub struct OrderIdGenerator {
    counter: u64,
}

impl OrderIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("ORD_{}_{}", self.counter, nanoid::nanoid!(8))
    }
}
