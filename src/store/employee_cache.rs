use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use crate::error::Result;
use crate::handover::EmployeeLookup;
use crate::model::employee::EmployeeSnapshot;

/// Caches employee snapshots for display in front of another lookup.
/// Only hits are cached so newly hired employees show up immediately. Existence
/// checks always reach the inner lookup so a removed employee is never validated.
pub struct CachedEmployeeLookup {
    inner: Arc<dyn EmployeeLookup>,
    cache: Cache<u64, EmployeeSnapshot>,
}

impl CachedEmployeeLookup {
    pub fn new(inner: Arc<dyn EmployeeLookup>, capacity: u64, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }
}

#[async_trait]
impl EmployeeLookup for CachedEmployeeLookup {
    async fn exists(&self, id: u64) -> Result<bool> {
        self.inner.exists(id).await
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<EmployeeSnapshot>> {
        if let Some(hit) = self.cache.get(&id).await {
            return Ok(Some(hit));
        }

        let found = self.inner.find_by_id(id).await?;
        if let Some(employee) = &found {
            self.cache.insert(id, employee.clone()).await;
        }
        Ok(found)
    }
}
