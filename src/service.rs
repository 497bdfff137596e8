// src/service.rs
use std::sync::Arc;

use log::{info, warn};

use crate::db::StockRepository;
use crate::error::PortfolioError;
use crate::models::{Stock, StockFields};

/// CRUD over the stock store. Cheap to clone; all clones share one store.
#[derive(Clone)]
pub struct PortfolioService {
    repo: Arc<dyn StockRepository>,
}

impl PortfolioService {
    pub fn new(repo: Arc<dyn StockRepository>) -> Self {
        PortfolioService { repo }
    }

    pub async fn list_all(&self) -> Result<Vec<Stock>, PortfolioError> {
        self.repo.list().await
    }

    pub async fn add(&self, fields: StockFields) -> Result<Stock, PortfolioError> {
        flag_suspicious("add", &fields);
        let stock = self.repo.insert(fields).await?;
        info!("Added stock {} ({})", stock.id, stock.ticker);
        Ok(stock)
    }

    /// Replaces all four fields of `id`. Last write wins.
    pub async fn update(&self, id: i64, fields: StockFields) -> Result<Stock, PortfolioError> {
        flag_suspicious("update", &fields);
        let stock = self.repo.update(id, fields).await?;
        info!("Updated stock {}", id);
        Ok(stock)
    }

    /// Deleting an unknown id is not an error.
    pub async fn delete(&self, id: i64) -> Result<(), PortfolioError> {
        if self.repo.delete(id).await? {
            info!("Deleted stock {}", id);
        } else {
            info!("Delete of unknown stock {} ignored", id);
        }
        Ok(())
    }
}

fn flag_suspicious(operation: &str, fields: &StockFields) {
    let problems = fields.suspicious();
    if !problems.is_empty() {
        warn!(
            "Accepting {} of {:?} with {}",
            operation,
            fields.ticker,
            problems.join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryRepository;

    fn service() -> PortfolioService {
        PortfolioService::new(Arc::new(MemoryRepository::new()))
    }

    fn apple() -> StockFields {
        StockFields {
            name: "Apple".into(),
            ticker: "AAPL".into(),
            quantity: 10,
            buy_price: 150.0,
        }
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        assert!(service().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn added_stock_is_listed_once() {
        let service = service();
        let added = service.add(apple()).await.unwrap();
        service
            .add(StockFields {
                ticker: "MSFT".into(),
                ..apple()
            })
            .await
            .unwrap();

        let listed = service.list_all().await.unwrap();
        let matching: Vec<_> = listed.iter().filter(|s| s.id == added.id).collect();
        assert_eq!(matching, vec![&apple().with_id(added.id)]);
    }

    #[tokio::test]
    async fn update_then_list_shows_only_new_values() {
        let service = service();
        let added = service.add(apple()).await.unwrap();
        let changed = StockFields {
            name: "Apple Inc".into(),
            ticker: "AAPL.O".into(),
            quantity: 4,
            buy_price: 175.25,
        };
        let updated = service.update(added.id, changed.clone()).await.unwrap();

        assert_eq!(updated.id, added.id);
        assert_eq!(service.list_all().await.unwrap(), vec![changed.with_id(added.id)]);
    }

    #[tokio::test]
    async fn update_on_empty_store_is_not_found() {
        let err = service().update(999, apple()).await.unwrap_err();
        assert!(matches!(err, PortfolioError::NotFound(999)));
    }

    #[tokio::test]
    async fn deleting_unknown_id_changes_nothing() {
        let service = service();
        let added = service.add(apple()).await.unwrap();
        service.delete(added.id + 1).await.unwrap();
        assert_eq!(service.list_all().await.unwrap(), vec![added]);
    }

    #[tokio::test]
    async fn negative_quantity_is_stored_as_sent() {
        let service = service();
        let added = service
            .add(StockFields {
                quantity: -5,
                name: String::new(),
                ..apple()
            })
            .await
            .unwrap();
        assert_eq!(added.quantity, -5);
        assert_eq!(service.list_all().await.unwrap()[0].name, "");
    }
}
