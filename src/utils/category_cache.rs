use crate::model::category::LeaveCategory;
use crate::store::{CategoryCatalog, StoreError};
use anyhow::Result;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Category catalog read through a short-lived in-memory copy.
pub struct CachedCategoryCatalog {
    inner: Arc<dyn CategoryCatalog>,
    cache: Cache<(), Arc<Vec<LeaveCategory>>>,
}

impl CachedCategoryCatalog {
    pub fn new(inner: Arc<dyn CategoryCatalog>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    async fn load(&self) -> Result<Arc<Vec<LeaveCategory>>, StoreError> {
        let categories = Arc::new(self.inner.categories().await?);
        self.cache.insert((), categories.clone()).await;
        Ok(categories)
    }

    /// Load the catalog once at startup
    pub async fn warmup(&self) -> Result<()> {
        let categories = self.load().await?;

        log::info!(
            "Category cache warmup complete: {} categories ({} active)",
            categories.len(),
            categories.iter().filter(|category| category.active).count()
        );

        Ok(())
    }
}

#[async_trait]
impl CategoryCatalog for CachedCategoryCatalog {
    async fn categories(&self) -> Result<Vec<LeaveCategory>, StoreError> {
        let categories = match self.cache.get(&()).await {
            Some(cached) => cached,
            None => self.load().await?,
        };
        Ok(categories.as_ref().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::category::CategoryColor;
    use crate::model::holiday::Region;
    use crate::store::memory::MemoryStore;

    #[actix_web::test]
    async fn serves_cached_copy_until_it_expires() {
        let store = Arc::new(MemoryStore::new(Region::new("GERMANY_BERLIN")));
        store
            .add_category(LeaveCategory::new(1, "holiday", CategoryColor::Orange))
            .unwrap();
        let cached = CachedCategoryCatalog::new(store.clone(), Duration::from_millis(100));
        cached.warmup().await.unwrap();

        store
            .add_category(LeaveCategory::new(2, "overtime", CategoryColor::Blue))
            .unwrap();
        assert_eq!(cached.categories().await.unwrap().len(), 1);

        actix_web::rt::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(cached.categories().await.unwrap().len(), 2);
    }
}
