// src/dashboard.rs
use std::collections::HashMap;

use log::warn;
use serde::Serialize;

use crate::models::{Holding, Stock};
use crate::prices::PriceFeed;

/// Price used when the feed cannot answer for a ticker.
pub const FALLBACK_PRICE: f64 = 0.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub name: String,
    pub ticker: String,
    pub value: f64,
    /// Share of the total portfolio value, in `[0, 1]` for non-negative values.
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_value: f64,
    pub top_stock: String,
    pub breakdown: Vec<Allocation>,
}

/// Attaches a current price to each stock. Each ticker is looked up once.
pub async fn price_holdings(stocks: Vec<Stock>, feed: &dyn PriceFeed) -> Vec<Holding> {
    let mut quotes: HashMap<String, f64> = HashMap::new();
    let mut holdings = Vec::with_capacity(stocks.len());

    for stock in stocks {
        let current_price = match quotes.get(&stock.ticker) {
            Some(price) => *price,
            None => {
                let price = feed.current_price(&stock.ticker).await.unwrap_or_else(|e| {
                    warn!("Using {} for {}: {}", FALLBACK_PRICE, stock.ticker, e);
                    FALLBACK_PRICE
                });
                quotes.insert(stock.ticker.clone(), price);
                price
            }
        };
        holdings.push(Holding {
            stock,
            current_price,
        });
    }
    holdings
}

pub fn summarize(holdings: &[Holding]) -> PortfolioSummary {
    let mut total_value = 0.0;
    let mut top: Option<(&str, f64)> = None;

    for holding in holdings {
        let value = holding.market_value();
        total_value += value;
        // Strictly greater: the first of equal values keeps the spot, and
        // nothing at or below zero ever becomes the top stock.
        if value > top.map_or(0.0, |(_, best)| best) {
            top = Some((holding.stock.name.as_str(), value));
        }
    }

    let breakdown = holdings
        .iter()
        .map(|holding| {
            let value = holding.market_value();
            Allocation {
                name: holding.stock.name.clone(),
                ticker: holding.stock.ticker.clone(),
                value,
                weight: if total_value == 0.0 {
                    0.0
                } else {
                    value / total_value
                },
            }
        })
        .collect();

    PortfolioSummary {
        total_value,
        top_stock: top.map(|(name, _)| name.to_string()).unwrap_or_default(),
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prices::FixedPriceFeed;
    use approx::assert_relative_eq;

    fn holding(name: &str, quantity: i64, price: f64) -> Holding {
        Holding {
            stock: Stock {
                id: 0,
                name: name.to_string(),
                ticker: name.to_uppercase(),
                quantity,
                buy_price: 1.0,
            },
            current_price: price,
        }
    }

    #[test]
    fn empty_portfolio() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_value, 0.0);
        assert_eq!(summary.top_stock, "");
        assert!(summary.breakdown.is_empty());
    }

    #[test]
    fn larger_position_wins() {
        let summary = summarize(&[holding("first", 10, 5.0), holding("second", 2, 100.0)]);
        assert_relative_eq!(summary.total_value, 250.0);
        assert_eq!(summary.top_stock, "second");
        assert_relative_eq!(summary.breakdown[0].weight, 0.2);
        assert_relative_eq!(summary.breakdown[1].weight, 0.8);
    }

    #[test]
    fn first_of_equal_values_wins() {
        let summary = summarize(&[
            holding("small", 1, 1.0),
            holding("early", 4, 25.0),
            holding("late", 10, 10.0),
        ]);
        assert_eq!(summary.top_stock, "early");
    }

    #[test]
    fn total_is_sum_of_quantity_times_price() {
        let holdings: Vec<_> = (1..=20)
            .map(|i| holding(&format!("s{}", i), i, i as f64 * 0.25))
            .collect();
        let expected: f64 = (1..=20).map(|i| i as f64 * (i as f64 * 0.25)).sum();
        assert_relative_eq!(summarize(&holdings).total_value, expected);
    }

    #[test]
    fn unpriced_portfolio_has_no_top_stock() {
        let summary = summarize(&[holding("a", 10, 0.0), holding("b", 5, 0.0)]);
        assert_eq!(summary.top_stock, "");
        assert!(summary.breakdown.iter().all(|a| a.weight == 0.0));
    }

    #[tokio::test]
    async fn unknown_tickers_fall_back_to_zero() {
        let feed = FixedPriceFeed::new([("AAPL", 190.0)]);
        let stocks = vec![
            holding("aapl", 1, 0.0).stock,
            holding("zzz", 1, 0.0).stock,
            holding("aapl", 3, 0.0).stock,
        ];
        let prices: Vec<f64> = price_holdings(stocks, &feed)
            .await
            .iter()
            .map(|h| h.current_price)
            .collect();
        assert_eq!(prices, vec![190.0, 0.0, 190.0]);
    }
}
