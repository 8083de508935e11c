//! Account valuation and portfolio risk metrics

use super::account::Account;
use super::router::EngineConfig;
use crate::market::PriceSource;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Portfolio-level risk aggregates derived from the position ledger.
///
/// Weights are absolute exposures over total account value, so a short
/// contributes to concentration the same way a long of equal size does.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    /// Exposure-weighted sum of instrument betas.
    pub beta: f64,
    /// Exposure-weighted sum of instrument volatilities.
    pub volatility: f64,
    /// Percent of total value exposed per sector.
    pub sector_weights: HashMap<String, f64>,
    pub max_position_weight: f64,
    pub long_count: usize,
    pub short_count: usize,
}

/// Total account value: cash, longs at market, shorts as their reserved
/// margin equivalent plus unrealized P&L. Floored at zero.
///
/// Positions whose symbol has no quote are valued at average cost, so a
/// feed gap reads as flat P&L rather than a wiped-out book.
pub fn total_value(config: &EngineConfig, prices: &impl PriceSource, account: &Account) -> f64 {
    let mut value = account.cash;
    for position in account.positions.values() {
        let price = prices
            .current_price(&position.symbol)
            .unwrap_or(position.average_cost);
        let quantity = position.magnitude() as f64;
        if position.is_long() {
            value += price * quantity;
        } else {
            let margin_equivalent = config.short_margin_rate * position.average_cost * quantity;
            value += margin_equivalent + (position.average_cost - price) * quantity;
        }
    }
    value.max(0.0)
}

/// Aggregate per-position weights into portfolio metrics. An account with
/// zero total value yields the all-zero result.
pub fn portfolio_metrics(
    config: &EngineConfig,
    prices: &impl PriceSource,
    account: &Account,
) -> PortfolioMetrics {
    let total = total_value(config, prices, account);
    if total == 0.0 {
        return PortfolioMetrics::default();
    }

    let mut metrics = PortfolioMetrics::default();
    for position in account.positions.values() {
        let price = prices
            .current_price(&position.symbol)
            .unwrap_or(position.average_cost);
        let exposure = position.magnitude() as f64 * price;
        let weight = exposure / total;
        let profile = prices.profile(&position.symbol).unwrap_or_default();

        metrics.beta += weight * profile.beta;
        metrics.volatility += weight * profile.volatility;
        *metrics.sector_weights.entry(profile.sector).or_insert(0.0) += weight * 100.0;
        metrics.max_position_weight = metrics.max_position_weight.max(weight);
        if position.is_long() {
            metrics.long_count += 1;
        } else {
            metrics.short_count += 1;
        }
    }
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{InstrumentProfile, LivePriceTable, Symbol};
    use crate::trading::account::Position;

    const EPS: f64 = 1e-9;

    fn sym() -> Symbol {
        Symbol::new("XYZ")
    }

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn empty_account_is_worth_its_cash() {
        let prices = LivePriceTable::new();
        let account = Account::new(12_345.67);
        assert!((total_value(&config(), &prices, &account) - 12_345.67).abs() < EPS);
    }

    #[test]
    fn longs_are_marked_to_market() {
        let prices = LivePriceTable::new();
        prices.set_price(sym(), 110.0);
        let mut account = Account::new(1_000.0);
        account
            .positions
            .insert(sym(), Position::new(sym(), 10, 100.0));

        assert!((total_value(&config(), &prices, &account) - 2_100.0).abs() < EPS);
    }

    #[test]
    fn shorts_are_margin_plus_unrealized_pnl() {
        let prices = LivePriceTable::new();
        prices.set_price(sym(), 40.0);
        let mut account = Account::new(1_000.0);
        account
            .positions
            .insert(sym(), Position::new(sym(), -5, 50.0));

        // 1000 cash + 125 margin equivalent + (50-40)*5 gain
        assert!((total_value(&config(), &prices, &account) - 1_175.0).abs() < EPS);
    }

    #[test]
    fn quoteless_positions_fall_back_to_average_cost() {
        let prices = LivePriceTable::new();
        let mut account = Account::new(0.0);
        account
            .positions
            .insert(sym(), Position::new(sym(), 10, 100.0));

        assert!((total_value(&config(), &prices, &account) - 1_000.0).abs() < EPS);
    }

    #[test]
    fn value_is_floored_at_zero() {
        let prices = LivePriceTable::new();
        prices.set_price(sym(), 100.0);
        let mut account = Account::new(0.0);
        account
            .positions
            .insert(sym(), Position::new(sym(), -10, 10.0));

        // Margin equivalent 50, unrealized loss 900.
        assert_eq!(total_value(&config(), &prices, &account), 0.0);
    }

    #[test]
    fn zero_value_account_yields_all_zero_metrics() {
        let prices = LivePriceTable::new();
        let account = Account::new(0.0);
        let metrics = portfolio_metrics(&config(), &prices, &account);
        assert_eq!(metrics.beta, 0.0);
        assert_eq!(metrics.volatility, 0.0);
        assert!(metrics.sector_weights.is_empty());
        assert_eq!(metrics.max_position_weight, 0.0);
        assert_eq!(metrics.long_count + metrics.short_count, 0);
    }

    #[test]
    fn metrics_weight_exposures_against_total_value() {
        let prices = LivePriceTable::new();
        prices.set_price(sym(), 100.0);
        prices.set_profile(
            sym(),
            InstrumentProfile {
                beta: 1.2,
                volatility: 0.3,
                sector: "Technology".to_string(),
            },
        );
        let mut account = Account::new(5_000.0);
        account
            .positions
            .insert(sym(), Position::new(sym(), 50, 100.0));

        // total = 5000 cash + 5000 position, weight 0.5
        let metrics = portfolio_metrics(&config(), &prices, &account);
        assert!((metrics.beta - 0.6).abs() < EPS);
        assert!((metrics.volatility - 0.15).abs() < EPS);
        assert!((metrics.sector_weights["Technology"] - 50.0).abs() < EPS);
        assert!((metrics.max_position_weight - 0.5).abs() < EPS);
        assert_eq!(metrics.long_count, 1);
        assert_eq!(metrics.short_count, 0);
    }

    #[test]
    fn unprofiled_instruments_count_as_market_beta() {
        let prices = LivePriceTable::new();
        prices.set_price(sym(), 100.0);
        let mut account = Account::new(0.0);
        account
            .positions
            .insert(sym(), Position::new(sym(), 10, 100.0));

        let metrics = portfolio_metrics(&config(), &prices, &account);
        assert!((metrics.beta - 1.0).abs() < EPS);
        assert!((metrics.sector_weights["Other"] - 100.0).abs() < EPS);
        assert!((metrics.max_position_weight - 1.0).abs() < EPS);
    }

    #[test]
    fn shorts_count_with_absolute_weight() {
        let prices = LivePriceTable::new();
        let long = Symbol::new("AAA");
        let short = Symbol::new("BBB");
        prices.set_price(long.clone(), 100.0);
        prices.set_price(short.clone(), 50.0);

        let mut account = Account::new(1_000.0);
        account
            .positions
            .insert(long.clone(), Position::new(long, 10, 100.0));
        account
            .positions
            .insert(short.clone(), Position::new(short, -10, 50.0));

        let metrics = portfolio_metrics(&config(), &prices, &account);
        assert_eq!(metrics.long_count, 1);
        assert_eq!(metrics.short_count, 1);
        // total = 1000 + 1000 long + 250 margin equivalent + 0 pnl = 2250
        // short exposure 500 / 2250
        assert!((metrics.max_position_weight - 1_000.0 / 2_250.0).abs() < EPS);
    }
}
