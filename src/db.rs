// src/db.rs
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::error::PortfolioError;
use crate::models::{Stock, StockFields};

const CREATE_STOCKS_TABLE: &str = "CREATE TABLE IF NOT EXISTS stocks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL DEFAULT '',
    ticker TEXT NOT NULL DEFAULT '',
    quantity INTEGER NOT NULL DEFAULT 0,
    buy_price REAL NOT NULL DEFAULT 0
)";

/// Durable, id-indexed storage for stock records.
#[async_trait]
pub trait StockRepository: Send + Sync {
    /// Every record, in primary-key order.
    async fn list(&self) -> Result<Vec<Stock>, PortfolioError>;

    /// Stores a new record under a freshly assigned id.
    async fn insert(&self, fields: StockFields) -> Result<Stock, PortfolioError>;

    /// Overwrites all fields of an existing record.
    async fn update(&self, id: i64, fields: StockFields) -> Result<Stock, PortfolioError>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: i64) -> Result<bool, PortfolioError>;
}

/// Opens the store named by `DATABASE_URL`.
pub async fn open(config: &Config) -> Result<Arc<dyn StockRepository>, PortfolioError> {
    if config.uses_memory_store() {
        warn!("Using the in-memory store; stocks will not survive a restart");
        return Ok(Arc::new(MemoryRepository::new()));
    }
    let repo = SqlRepository::connect(&config.database_url, config.max_connections).await?;
    Ok(Arc::new(repo))
}

pub struct SqlRepository {
    pool: SqlitePool,
}

impl SqlRepository {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, PortfolioError> {
        let mut options = SqlitePoolOptions::new().max_connections(max_connections);
        if is_in_memory(url) {
            // Every connection to an in-memory URL opens its own empty
            // database, so the pool holds exactly one and never recycles it.
            if max_connections != 1 {
                warn!("{} is in memory; using 1 connection instead of {}", url, max_connections);
            }
            options = options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = options.connect(url).await?;
        sqlx::query(CREATE_STOCKS_TABLE).execute(&pool).await?;

        info!("Stocks table ready at {}", url);
        Ok(SqlRepository { pool })
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// The one place a storage row becomes a `Stock`.
fn stock_from_row(row: &SqliteRow) -> Result<Stock, sqlx::Error> {
    Ok(Stock {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        ticker: row.try_get("ticker")?,
        quantity: row.try_get("quantity")?,
        buy_price: row.try_get("buy_price")?,
    })
}

#[async_trait]
impl StockRepository for SqlRepository {
    async fn list(&self) -> Result<Vec<Stock>, PortfolioError> {
        let rows = sqlx::query("SELECT id, name, ticker, quantity, buy_price FROM stocks ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        let stocks = rows
            .iter()
            .map(stock_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Fetched {} stocks", stocks.len());
        Ok(stocks)
    }

    async fn insert(&self, fields: StockFields) -> Result<Stock, PortfolioError> {
        let result =
            sqlx::query("INSERT INTO stocks (name, ticker, quantity, buy_price) VALUES (?, ?, ?, ?)")
                .bind(fields.name.as_str())
                .bind(fields.ticker.as_str())
                .bind(fields.quantity)
                .bind(fields.buy_price)
                .execute(&self.pool)
                .await?;
        Ok(fields.with_id(result.last_insert_rowid()))
    }

    async fn update(&self, id: i64, fields: StockFields) -> Result<Stock, PortfolioError> {
        let result = sqlx::query(
            "UPDATE stocks SET name = ?, ticker = ?, quantity = ?, buy_price = ? WHERE id = ?",
        )
        .bind(fields.name.as_str())
        .bind(fields.ticker.as_str())
        .bind(fields.quantity)
        .bind(fields.buy_price)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PortfolioError::NotFound(id));
        }
        Ok(fields.with_id(id))
    }

    async fn delete(&self, id: i64) -> Result<bool, PortfolioError> {
        let result = sqlx::query("DELETE FROM stocks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Default)]
struct MemoryTable {
    last_id: i64,
    rows: BTreeMap<i64, StockFields>,
}

/// Non-durable store with the same id rules as the SQL table.
#[derive(Default)]
pub struct MemoryRepository {
    table: RwLock<MemoryTable>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StockRepository for MemoryRepository {
    async fn list(&self) -> Result<Vec<Stock>, PortfolioError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .iter()
            .map(|(id, fields)| fields.clone().with_id(*id))
            .collect())
    }

    async fn insert(&self, fields: StockFields) -> Result<Stock, PortfolioError> {
        let mut table = self.table.write().await;
        table.last_id += 1;
        let id = table.last_id;
        table.rows.insert(id, fields.clone());
        Ok(fields.with_id(id))
    }

    async fn update(&self, id: i64, fields: StockFields) -> Result<Stock, PortfolioError> {
        let mut table = self.table.write().await;
        match table.rows.get_mut(&id) {
            Some(row) => {
                *row = fields.clone();
                Ok(fields.with_id(id))
            }
            None => Err(PortfolioError::NotFound(id)),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, PortfolioError> {
        let mut table = self.table.write().await;
        Ok(table.rows.remove(&id).is_some())
    }
}
