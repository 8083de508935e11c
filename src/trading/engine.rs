//! Trading engine facade

use super::account::{Account, Transaction};
use super::error::TradeError;
use super::orders::PendingOrder;
use super::pending::{PendingFill, PendingOrderBook};
use super::router::{EngineConfig, OrderKind, OrderOutcome, OrderRouter};
use super::valuation::{self, PortfolioMetrics};
use crate::market::{PriceSource, Symbol};

/// Synchronous, single-account trading engine over an injected price
/// source.
///
/// The engine composes the order router, the pending order book and the
/// valuation logic behind one surface. Each call mutates the caller-owned
/// [`Account`] in place and returns; the engine retains no account state
/// between calls, so the host serializes calls per account and may drive
/// any number of accounts through one engine.
pub struct TradingEngine<P> {
    prices: P,
    router: OrderRouter,
    book: PendingOrderBook,
}

impl<P: PriceSource> TradingEngine<P> {
    pub fn new(prices: P) -> Self {
        Self::with_config(prices, EngineConfig::default())
    }

    pub fn with_config(prices: P, config: EngineConfig) -> Self {
        Self {
            prices,
            router: OrderRouter::new(config),
            book: PendingOrderBook::new(),
        }
    }

    pub fn prices(&self) -> &P {
        &self.prices
    }

    pub fn config(&self) -> &EngineConfig {
        self.router.config()
    }

    /// Open or extend a long; covers an existing short first.
    pub fn buy(
        &mut self,
        account: &mut Account,
        symbol: &Symbol,
        quantity: u64,
        kind: OrderKind,
    ) -> Result<OrderOutcome, TradeError> {
        self.router
            .buy(&self.prices, account, &mut self.book, symbol, quantity, kind)
    }

    /// Reduce an existing long.
    pub fn sell(
        &mut self,
        account: &mut Account,
        symbol: &Symbol,
        quantity: u64,
        kind: OrderKind,
    ) -> Result<OrderOutcome, TradeError> {
        self.router
            .sell(&self.prices, account, &mut self.book, symbol, quantity, kind)
    }

    /// Open or extend a short; closes an existing long first.
    pub fn short_sell(
        &mut self,
        account: &mut Account,
        symbol: &Symbol,
        quantity: u64,
        kind: OrderKind,
    ) -> Result<OrderOutcome, TradeError> {
        self.router
            .short_sell(&self.prices, account, &mut self.book, symbol, quantity, kind)
    }

    /// Buy back part or all of a short, releasing its margin.
    pub fn cover_short(
        &mut self,
        account: &mut Account,
        symbol: &Symbol,
        quantity: u64,
    ) -> Result<Transaction, TradeError> {
        self.router.cover_short(&self.prices, account, symbol, quantity)
    }

    pub fn place_stop_loss(
        &mut self,
        account: &mut Account,
        symbol: Symbol,
        quantity: u64,
        trigger_price: f64,
    ) -> Result<PendingOrder, TradeError> {
        self.book.place_stop_loss(account, symbol, quantity, trigger_price)
    }

    pub fn place_take_profit(
        &mut self,
        account: &mut Account,
        symbol: Symbol,
        quantity: u64,
        trigger_price: f64,
    ) -> Result<PendingOrder, TradeError> {
        self.book.place_take_profit(account, symbol, quantity, trigger_price)
    }

    /// Per-tick sweep of the account's pending orders.
    pub fn check_pending_orders(&mut self, account: &mut Account) -> Vec<PendingFill> {
        self.book
            .check_pending_orders(&self.router, &self.prices, account)
    }

    pub fn cancel_order(
        &mut self,
        account: &mut Account,
        id: &str,
    ) -> Result<PendingOrder, TradeError> {
        self.book.cancel_order(account, id)
    }

    /// Total account value at current prices, floored at zero.
    pub fn total_value(&self, account: &Account) -> f64 {
        valuation::total_value(self.router.config(), &self.prices, account)
    }

    /// Portfolio risk aggregates at current prices.
    pub fn portfolio_metrics(&self, account: &Account) -> PortfolioMetrics {
        valuation::portfolio_metrics(self.router.config(), &self.prices, account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::LivePriceTable;

    const EPS: f64 = 1e-9;

    #[test]
    fn engine_routes_through_one_surface() {
        let prices = LivePriceTable::new();
        let symbol = Symbol::new("XYZ");
        prices.set_price(symbol.clone(), 100.0);

        let mut engine = TradingEngine::with_config(
            prices,
            EngineConfig {
                slippage_coefficient: 0.0,
                ..EngineConfig::default()
            },
        );
        let mut account = Account::new(10_000.0);

        engine
            .buy(&mut account, &symbol, 10, OrderKind::Market)
            .unwrap();
        let order = engine
            .place_stop_loss(&mut account, symbol.clone(), 10, 90.0)
            .unwrap();

        // cash 8999 + 10 shares at 100
        assert!((engine.total_value(&account) - 9999.0).abs() < EPS);

        engine.prices().set_price(symbol.clone(), 89.0);
        let fills = engine.check_pending_orders(&mut account);
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].order.id, order.id);
        assert!(account.positions.is_empty());

        assert!(matches!(
            engine.cancel_order(&mut account, &order.id),
            Err(TradeError::OrderNotFound(_))
        ));
    }
}
