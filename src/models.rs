// src/models.rs
use serde::{Deserialize, Serialize};

/// A stored holding. `id` is assigned by the store and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub id: i64,
    pub name: String,
    pub ticker: String,
    pub quantity: i64,
    pub buy_price: f64,
}

/// Everything about a stock except its id: the body of create and update
/// requests. Omitted fields fall back to their zero value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StockFields {
    pub name: String,
    pub ticker: String,
    pub quantity: i64,
    pub buy_price: f64,
}

impl StockFields {
    pub fn with_id(self, id: i64) -> Stock {
        Stock {
            id,
            name: self.name,
            ticker: self.ticker,
            quantity: self.quantity,
            buy_price: self.buy_price,
        }
    }

    /// Values the store accepts but which are probably input mistakes.
    pub fn suspicious(&self) -> Vec<&'static str> {
        let mut found = Vec::new();
        if self.name.trim().is_empty() {
            found.push("empty name");
        }
        if self.ticker.trim().is_empty() {
            found.push("empty ticker");
        }
        if self.quantity < 0 {
            found.push("negative quantity");
        }
        if self.buy_price < 0.0 {
            found.push("negative buy price");
        }
        found
    }
}

impl From<Stock> for StockFields {
    fn from(stock: Stock) -> Self {
        StockFields {
            name: stock.name,
            ticker: stock.ticker,
            quantity: stock.quantity,
            buy_price: stock.buy_price,
        }
    }
}

/// A stock merged with the latest price from the feed. Display only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    #[serde(flatten)]
    pub stock: Stock,
    pub current_price: f64,
}

impl Holding {
    pub fn market_value(&self) -> f64 {
        self.stock.quantity as f64 * self.current_price
    }

    pub fn cost_basis(&self) -> f64 {
        self.stock.quantity as f64 * self.stock.buy_price
    }
}
