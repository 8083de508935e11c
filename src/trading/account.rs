//! Account aggregate and signed-quantity position ledger

use super::orders::PendingOrder;
use crate::market::Symbol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of fill recorded on a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Buy,
    LimitBuy,
    Sell,
    LimitSell,
    ShortSell,
    LimitShort,
    CoverShort,
    StopLoss,
    TakeProfit,
}

/// Immutable record emitted by every successful fill.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub kind: TransactionKind,
    pub symbol: Symbol,
    pub quantity: u64,
    pub fill_price: f64,
    pub notional: f64,
    pub fee: f64,
    /// Closing fills only: P&L realized against the average cost, net of fee.
    pub realized_profit: Option<f64>,
    /// Short entries only: cash set aside as collateral for the new lot.
    pub margin_reserved: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// One ledger entry per symbol currently held.
///
/// `quantity` is signed: positive is long, negative is short. A position
/// is never stored at zero quantity; a fill that reaches zero deletes the
/// entry from the account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: Symbol,
    pub quantity: i64,
    /// Weighted-average fill price of the open lot, meaningful relative to
    /// the sign of `quantity`.
    pub average_cost: f64,
}

impl Position {
    pub fn new(symbol: Symbol, quantity: i64, average_cost: f64) -> Self {
        Self {
            symbol,
            quantity,
            average_cost,
        }
    }

    pub fn is_long(&self) -> bool {
        self.quantity > 0
    }

    pub fn is_short(&self) -> bool {
        self.quantity < 0
    }

    /// Shares held or shorted, ignoring direction.
    pub fn magnitude(&self) -> u64 {
        self.quantity.unsigned_abs()
    }

    /// Add to the position in its current direction, recomputing the
    /// weighted-average cost across the combined lot.
    pub fn add(&mut self, quantity: u64, fill_price: f64) {
        let held = self.magnitude() as f64;
        let added = quantity as f64;
        self.average_cost = (self.average_cost * held + fill_price * added) / (held + added);
        self.quantity += self.quantity.signum() * quantity as i64;
    }
}

/// Single-user account aggregate: cash, the position ledger and the set of
/// outstanding conditional orders.
///
/// The engine mutates the aggregate in place for the duration of one call
/// and never retains it; the caller owns its lifetime and persistence. No
/// operation commits a state with negative cash.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Account {
    pub cash: f64,
    pub positions: HashMap<Symbol, Position>,
    pub pending_orders: Vec<PendingOrder>,
}

impl Account {
    pub fn new(cash: f64) -> Self {
        Self {
            cash,
            positions: HashMap::new(),
            pending_orders: Vec::new(),
        }
    }

    pub fn position(&self, symbol: &Symbol) -> Option<&Position> {
        self.positions.get(symbol)
    }

    /// Signed quantity held for a symbol; zero when flat.
    pub fn signed_quantity(&self, symbol: &Symbol) -> i64 {
        self.positions.get(symbol).map(|p| p.quantity).unwrap_or(0)
    }

    /// Open a new lot or add to an existing same-direction one.
    pub(crate) fn apply_open(&mut self, symbol: &Symbol, signed_quantity: i64, fill_price: f64) {
        match self.positions.get_mut(symbol) {
            Some(position) => {
                debug_assert_eq!(position.quantity.signum(), signed_quantity.signum());
                position.add(signed_quantity.unsigned_abs(), fill_price);
            }
            None => {
                self.positions.insert(
                    symbol.clone(),
                    Position::new(symbol.clone(), signed_quantity, fill_price),
                );
            }
        }
    }

    /// Shrink a lot toward zero, deleting the entry when it gets there.
    /// The average cost of the remainder is unchanged.
    pub(crate) fn apply_reduce(&mut self, symbol: &Symbol, quantity: u64) {
        if let Some(position) = self.positions.get_mut(symbol) {
            debug_assert!(position.magnitude() >= quantity);
            position.quantity -= position.quantity.signum() * quantity as i64;
            if position.quantity == 0 {
                self.positions.remove(symbol);
            }
        }
    }
}
