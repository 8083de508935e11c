//! Pending order book: queueing, the per-tick sweep, and cancellation

use super::account::{Account, Transaction, TransactionKind};
use super::error::TradeError;
use super::orders::{OrderIdGenerator, OrderStatus, PendingOrder, PendingOrderKind};
use super::router::OrderRouter;
use crate::market::{PriceSource, Symbol};
use chrono::Utc;
use tracing::{debug, info};

/// A pending order the sweep executed, paired with its fill record.
#[derive(Clone, Debug)]
pub struct PendingFill {
    pub order: PendingOrder,
    pub transaction: Transaction,
}

/// Owns the id source for conditional orders and re-evaluates the
/// account's pending set against current prices.
///
/// The orders themselves live on the account aggregate; the book holds no
/// per-account state, so one book can serve any number of accounts.
#[derive(Debug, Default)]
pub struct PendingOrderBook {
    ids: OrderIdGenerator,
}

impl PendingOrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn queue(
        &mut self,
        account: &mut Account,
        symbol: Symbol,
        quantity: u64,
        kind: PendingOrderKind,
        price: f64,
    ) -> PendingOrder {
        let order = PendingOrder {
            id: self.ids.next_id(),
            symbol,
            quantity,
            kind,
            price,
            status: OrderStatus::Pending,
            created_time: Utc::now(),
        };
        account.pending_orders.push(order.clone());
        order
    }

    /// Queue a stop-loss: closes a long when price falls to the trigger,
    /// covers a short when price rises to it.
    pub fn place_stop_loss(
        &mut self,
        account: &mut Account,
        symbol: Symbol,
        quantity: u64,
        trigger_price: f64,
    ) -> Result<PendingOrder, TradeError> {
        if quantity == 0 {
            return Err(TradeError::InvalidQuantity);
        }
        Ok(self.queue(account, symbol, quantity, PendingOrderKind::StopLoss, trigger_price))
    }

    /// Queue a take-profit: the mirror image of a stop-loss.
    pub fn place_take_profit(
        &mut self,
        account: &mut Account,
        symbol: Symbol,
        quantity: u64,
        trigger_price: f64,
    ) -> Result<PendingOrder, TradeError> {
        if quantity == 0 {
            return Err(TradeError::InvalidQuantity);
        }
        Ok(self.queue(account, symbol, quantity, PendingOrderKind::TakeProfit, trigger_price))
    }

    /// Re-evaluate every pending order against current prices, routing the
    /// triggered ones through the router at the current price.
    ///
    /// Orders whose routed execution fails (insufficient cash, position
    /// gone) stay pending for the next sweep; re-sweeping at an unchanged
    /// price is a no-op for them. Executed orders are removed from the
    /// account and returned with their transactions.
    pub fn check_pending_orders(
        &mut self,
        router: &OrderRouter,
        prices: &impl PriceSource,
        account: &mut Account,
    ) -> Vec<PendingFill> {
        let mut fills = Vec::new();
        let mut index = 0;
        while index < account.pending_orders.len() {
            let order = account.pending_orders[index].clone();
            let Some(price) = prices.current_price(&order.symbol) else {
                index += 1;
                continue;
            };
            let sign = account.signed_quantity(&order.symbol).signum();
            if !order.should_trigger(price, sign) {
                index += 1;
                continue;
            }

            let result = match order.kind {
                PendingOrderKind::LimitBuy => router.fill_buy(
                    prices,
                    account,
                    &order.symbol,
                    order.quantity,
                    TransactionKind::LimitBuy,
                ),
                PendingOrderKind::LimitSell => router.fill_sell(
                    prices,
                    account,
                    &order.symbol,
                    order.quantity,
                    TransactionKind::LimitSell,
                ),
                PendingOrderKind::LimitShort => router.fill_short(
                    prices,
                    account,
                    &order.symbol,
                    order.quantity,
                    TransactionKind::LimitShort,
                ),
                PendingOrderKind::StopLoss | PendingOrderKind::TakeProfit => {
                    let tag = if order.kind == PendingOrderKind::StopLoss {
                        TransactionKind::StopLoss
                    } else {
                        TransactionKind::TakeProfit
                    };
                    if sign > 0 {
                        router.fill_sell(prices, account, &order.symbol, order.quantity, tag)
                    } else {
                        router.fill_cover(prices, account, &order.symbol, order.quantity, tag)
                    }
                }
            };

            match result {
                Ok(transaction) => {
                    let mut executed = account.pending_orders.remove(index);
                    executed.status = OrderStatus::Executed;
                    info!(id = %executed.id, symbol = %executed.symbol, "pending order executed");
                    fills.push(PendingFill {
                        order: executed,
                        transaction,
                    });
                    // The next order shifted into this slot.
                }
                Err(err) => {
                    debug!(id = %order.id, %err, "triggered order failed, left pending");
                    index += 1;
                }
            }
        }
        fills
    }

    /// Remove a pending order by id, returning it marked cancelled.
    /// Already-executed (or never-known) ids fail without mutating state.
    pub fn cancel_order(
        &self,
        account: &mut Account,
        id: &str,
    ) -> Result<PendingOrder, TradeError> {
        let index = account
            .pending_orders
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| TradeError::OrderNotFound(id.to_string()))?;
        let mut order = account.pending_orders.remove(index);
        order.status = OrderStatus::Cancelled;
        info!(id = %order.id, "pending order cancelled");
        Ok(order)
    }
}
