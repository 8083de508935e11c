//! Order routing: immediate execution paths for buy, sell, short and cover

use super::account::{Account, Transaction, TransactionKind};
use super::error::TradeError;
use super::orders::{PendingOrder, PendingOrderKind};
use super::pending::PendingOrderBook;
use crate::market::{PriceSource, Symbol};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// How a trade intent should be priced.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum OrderKind {
    Market,
    Limit(f64),
}

/// Execution parameters shared by every routed order.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fee charged on every fill, as a fraction of notional.
    pub fee_rate: f64,
    /// Adverse price impact per 1000 shares, as a fraction of price.
    pub slippage_coefficient: f64,
    /// Cash reserved per unit of short notional at entry.
    pub short_margin_rate: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fee_rate: 0.001,
            slippage_coefficient: 0.0005,
            short_margin_rate: 0.5,
        }
    }
}

/// Result of routing an immediate trade intent.
#[derive(Clone, Debug)]
pub enum OrderOutcome {
    /// Executed now: the account was mutated and a record emitted.
    Filled(Transaction),
    /// Limit not marketable: queued for the per-tick sweeps, no cash moved.
    Queued(PendingOrder),
}

/// Resolves one trade intent into a fill or a queued pending order.
///
/// Every path validates fully before mutating, so a returned error means
/// the account is exactly as it was.
#[derive(Clone, Debug, Default)]
pub struct OrderRouter {
    config: EngineConfig,
}

impl OrderRouter {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn quote(&self, prices: &impl PriceSource, symbol: &Symbol) -> Result<f64, TradeError> {
        prices
            .current_price(symbol)
            .ok_or_else(|| TradeError::UnknownSymbol(symbol.clone()))
    }

    /// Adverse price adjustment: buyers pay more, sellers receive less,
    /// scaling linearly with order size.
    fn slipped(&self, price: f64, quantity: u64, adverse_up: bool) -> f64 {
        let impact = self.config.slippage_coefficient * quantity as f64 / 1000.0;
        if adverse_up {
            price * (1.0 + impact)
        } else {
            price * (1.0 - impact)
        }
    }

    /// Open or extend a long position; a buy over an existing short covers
    /// it first and flips to long with any excess.
    pub fn buy(
        &self,
        prices: &impl PriceSource,
        account: &mut Account,
        book: &mut PendingOrderBook,
        symbol: &Symbol,
        quantity: u64,
        kind: OrderKind,
    ) -> Result<OrderOutcome, TradeError> {
        if quantity == 0 {
            return Err(TradeError::InvalidQuantity);
        }
        let price = self.quote(prices, symbol)?;
        if let OrderKind::Limit(limit) = kind {
            if limit < price {
                let order =
                    book.queue(account, symbol.clone(), quantity, PendingOrderKind::LimitBuy, limit);
                debug!(%symbol, quantity, limit, "limit buy not marketable, queued");
                return Ok(OrderOutcome::Queued(order));
            }
        }
        let tag = match kind {
            OrderKind::Market => TransactionKind::Buy,
            OrderKind::Limit(_) => TransactionKind::LimitBuy,
        };
        Ok(OrderOutcome::Filled(self.fill_buy(
            prices, account, symbol, quantity, tag,
        )?))
    }

    /// Reduce an existing long position.
    pub fn sell(
        &self,
        prices: &impl PriceSource,
        account: &mut Account,
        book: &mut PendingOrderBook,
        symbol: &Symbol,
        quantity: u64,
        kind: OrderKind,
    ) -> Result<OrderOutcome, TradeError> {
        if quantity == 0 {
            return Err(TradeError::InvalidQuantity);
        }
        let price = self.quote(prices, symbol)?;
        if let OrderKind::Limit(limit) = kind {
            if limit > price {
                let order = book.queue(
                    account,
                    symbol.clone(),
                    quantity,
                    PendingOrderKind::LimitSell,
                    limit,
                );
                debug!(%symbol, quantity, limit, "limit sell not marketable, queued");
                return Ok(OrderOutcome::Queued(order));
            }
        }
        let tag = match kind {
            OrderKind::Market => TransactionKind::Sell,
            OrderKind::Limit(_) => TransactionKind::LimitSell,
        };
        Ok(OrderOutcome::Filled(self.fill_sell(
            prices, account, symbol, quantity, tag,
        )?))
    }

    /// Open or extend a short position; a short over an existing long
    /// closes the long first and shorts any remainder.
    pub fn short_sell(
        &self,
        prices: &impl PriceSource,
        account: &mut Account,
        book: &mut PendingOrderBook,
        symbol: &Symbol,
        quantity: u64,
        kind: OrderKind,
    ) -> Result<OrderOutcome, TradeError> {
        if quantity == 0 {
            return Err(TradeError::InvalidQuantity);
        }
        let price = self.quote(prices, symbol)?;
        if let OrderKind::Limit(limit) = kind {
            if limit > price {
                let order = book.queue(
                    account,
                    symbol.clone(),
                    quantity,
                    PendingOrderKind::LimitShort,
                    limit,
                );
                debug!(%symbol, quantity, limit, "limit short not marketable, queued");
                return Ok(OrderOutcome::Queued(order));
            }
        }
        let tag = match kind {
            OrderKind::Market => TransactionKind::ShortSell,
            OrderKind::Limit(_) => TransactionKind::LimitShort,
        };
        Ok(OrderOutcome::Filled(self.fill_short(
            prices, account, symbol, quantity, tag,
        )?))
    }

    /// Buy back a borrowed lot, releasing its reserved margin.
    pub fn cover_short(
        &self,
        prices: &impl PriceSource,
        account: &mut Account,
        symbol: &Symbol,
        quantity: u64,
    ) -> Result<Transaction, TradeError> {
        self.fill_cover(prices, account, symbol, quantity, TransactionKind::CoverShort)
    }

    pub(crate) fn fill_buy(
        &self,
        prices: &impl PriceSource,
        account: &mut Account,
        symbol: &Symbol,
        quantity: u64,
        kind: TransactionKind,
    ) -> Result<Transaction, TradeError> {
        if quantity == 0 {
            return Err(TradeError::InvalidQuantity);
        }
        let price = self.quote(prices, symbol)?;
        let fill = self.slipped(price, quantity, true);
        let notional = fill * quantity as f64;
        let fee = self.config.fee_rate * notional;
        if notional + fee > account.cash {
            return Err(TradeError::InsufficientFunds {
                required: notional + fee,
                available: account.cash,
            });
        }

        // A buy over a short is a cover: margin comes back, P&L is realized
        // against the short's basis, and any excess opens a long lot.
        let (covered, average_cost) = match account.position(symbol) {
            Some(p) if p.is_short() => (quantity.min(p.magnitude()), p.average_cost),
            _ => (0, 0.0),
        };
        let opened = quantity - covered;

        let mut realized_profit = None;
        if covered > 0 {
            let margin_released =
                self.config.short_margin_rate * average_cost * covered as f64;
            let pnl = (average_cost - fill) * covered as f64;
            realized_profit = Some(pnl - fee);
            account.cash += margin_released + pnl - fill * opened as f64 - fee;
            account.apply_reduce(symbol, covered);
        } else {
            account.cash -= notional + fee;
        }
        if opened > 0 {
            account.apply_open(symbol, opened as i64, fill);
        }
        debug_assert!(account.cash >= 0.0);

        info!(%symbol, quantity, fill_price = fill, fee, ?kind, "buy filled");
        Ok(Transaction {
            kind,
            symbol: symbol.clone(),
            quantity,
            fill_price: fill,
            notional,
            fee,
            realized_profit,
            margin_reserved: None,
            timestamp: Utc::now(),
        })
    }

    pub(crate) fn fill_sell(
        &self,
        prices: &impl PriceSource,
        account: &mut Account,
        symbol: &Symbol,
        quantity: u64,
        kind: TransactionKind,
    ) -> Result<Transaction, TradeError> {
        if quantity == 0 {
            return Err(TradeError::InvalidQuantity);
        }
        let price = self.quote(prices, symbol)?;
        let average_cost = match account.position(symbol) {
            Some(p) if p.quantity >= quantity as i64 => p.average_cost,
            other => {
                return Err(TradeError::InsufficientPosition {
                    symbol: symbol.clone(),
                    held: other.map(|p| p.quantity).unwrap_or(0),
                    requested: quantity,
                });
            }
        };
        let fill = self.slipped(price, quantity, false);
        let notional = fill * quantity as f64;
        let fee = self.config.fee_rate * notional;
        let realized = (fill - average_cost) * quantity as f64 - fee;

        account.cash += notional - fee;
        account.apply_reduce(symbol, quantity);

        info!(%symbol, quantity, fill_price = fill, fee, realized, ?kind, "sell filled");
        Ok(Transaction {
            kind,
            symbol: symbol.clone(),
            quantity,
            fill_price: fill,
            notional,
            fee,
            realized_profit: Some(realized),
            margin_reserved: None,
            timestamp: Utc::now(),
        })
    }

    pub(crate) fn fill_short(
        &self,
        prices: &impl PriceSource,
        account: &mut Account,
        symbol: &Symbol,
        quantity: u64,
        kind: TransactionKind,
    ) -> Result<Transaction, TradeError> {
        if quantity == 0 {
            return Err(TradeError::InvalidQuantity);
        }
        let price = self.quote(prices, symbol)?;
        let fill = self.slipped(price, quantity, false);
        let notional = fill * quantity as f64;
        let fee = self.config.fee_rate * notional;

        // An existing long is closed first; only the remainder is shorted
        // and margined.
        let (closed, long_cost) = match account.position(symbol) {
            Some(p) if p.is_long() => (quantity.min(p.magnitude()), p.average_cost),
            _ => (0, 0.0),
        };
        let opened = quantity - closed;
        let close_proceeds = fill * closed as f64;
        let margin = self.config.short_margin_rate * fill * opened as f64;
        let available = account.cash + close_proceeds;
        if margin + fee > available {
            return Err(TradeError::InsufficientMargin {
                required: margin + fee,
                available,
            });
        }

        let realized_profit =
            (closed > 0).then(|| (fill - long_cost) * closed as f64 - fee);
        account.cash += close_proceeds - margin - fee;
        if closed > 0 {
            account.apply_reduce(symbol, closed);
        }
        if opened > 0 {
            account.apply_open(symbol, -(opened as i64), fill);
        }
        debug_assert!(account.cash >= 0.0);

        info!(%symbol, quantity, fill_price = fill, fee, margin, ?kind, "short filled");
        Ok(Transaction {
            kind,
            symbol: symbol.clone(),
            quantity,
            fill_price: fill,
            notional,
            fee,
            realized_profit,
            margin_reserved: (opened > 0).then_some(margin),
            timestamp: Utc::now(),
        })
    }

    pub(crate) fn fill_cover(
        &self,
        prices: &impl PriceSource,
        account: &mut Account,
        symbol: &Symbol,
        quantity: u64,
        kind: TransactionKind,
    ) -> Result<Transaction, TradeError> {
        if quantity == 0 {
            return Err(TradeError::InvalidQuantity);
        }
        let price = self.quote(prices, symbol)?;
        let average_cost = match account.position(symbol) {
            Some(p) if p.is_short() && p.magnitude() >= quantity => p.average_cost,
            other => {
                return Err(TradeError::InsufficientShortPosition {
                    symbol: symbol.clone(),
                    held: other.map(|p| p.quantity).unwrap_or(0),
                    requested: quantity,
                });
            }
        };
        let fill = self.slipped(price, quantity, true);
        let notional = fill * quantity as f64;
        let fee = self.config.fee_rate * notional;
        let margin_released = self.config.short_margin_rate * average_cost * quantity as f64;
        let pnl = (average_cost - fill) * quantity as f64;
        let cash_delta = margin_released + pnl - fee;
        // A deeply underwater short can cost more to buy back than the
        // margin covers; the cash-never-negative invariant wins.
        if account.cash + cash_delta < 0.0 {
            return Err(TradeError::InsufficientFunds {
                required: -cash_delta,
                available: account.cash,
            });
        }

        account.cash += cash_delta;
        account.apply_reduce(symbol, quantity);
        debug_assert!(account.cash >= 0.0);

        info!(%symbol, quantity, fill_price = fill, fee, realized = pnl - fee, ?kind, "short covered");
        Ok(Transaction {
            kind,
            symbol: symbol.clone(),
            quantity,
            fill_price: fill,
            notional,
            fee,
            realized_profit: Some(pnl - fee),
            margin_reserved: None,
            timestamp: Utc::now(),
        })
    }
}
