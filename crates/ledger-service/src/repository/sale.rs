//! # Sale Repository
//!
//! Storage contract for sales plus the in-memory implementation used by
//! tests and by front ends that cache the ledger locally.

use std::collections::HashMap;
use std::sync::Mutex;

use ledger_core::Sale;
use tracing::debug;

use super::lock;
use crate::error::{ServiceError, ServiceResult};

/// Storage for sales.
pub trait SaleRepository: Send + Sync {
    /// Gets a sale by ID.
    fn get(&self, id: &str) -> ServiceResult<Option<Sale>>;

    /// Stores a sale.
    ///
    /// `expected_version` is the version the caller read before mutating.
    /// `None` inserts and fails with `AlreadyExists` if the id is taken.
    fn save(&self, sale: Sale, expected_version: Option<u64>) -> ServiceResult<Sale>;

    /// All sales of one client, oldest first.
    fn list_by_client(&self, client_id: &str) -> ServiceResult<Vec<Sale>>;
}

/// `Mutex<HashMap>` backed sale storage.
#[derive(Debug, Default)]
pub struct InMemorySaleRepository {
    sales: Mutex<HashMap<String, Sale>>,
}

impl InMemorySaleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sales.
    pub fn len(&self) -> usize {
        self.sales.lock().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SaleRepository for InMemorySaleRepository {
    fn get(&self, id: &str) -> ServiceResult<Option<Sale>> {
        Ok(lock(&self.sales, "sales")?.get(id).cloned())
    }

    fn save(&self, sale: Sale, expected_version: Option<u64>) -> ServiceResult<Sale> {
        let mut sales = lock(&self.sales, "sales")?;

        match (sales.get(&sale.id), expected_version) {
            (Some(_), None) => {
                return Err(ServiceError::AlreadyExists {
                    entity: "Sale".to_string(),
                    id: sale.id,
                });
            }
            (None, Some(_)) => return Err(ServiceError::not_found("Sale", sale.id)),
            (Some(stored), Some(expected)) if stored.version != expected => {
                return Err(ServiceError::version_conflict(
                    "Sale",
                    sale.id,
                    expected,
                    stored.version,
                ));
            }
            _ => {}
        }

        debug!(id = %sale.id, version = sale.version, status = %sale.status, "Saving sale");
        sales.insert(sale.id.clone(), sale.clone());
        Ok(sale)
    }

    fn list_by_client(&self, client_id: &str) -> ServiceResult<Vec<Sale>> {
        let mut found: Vec<Sale> = lock(&self.sales, "sales")?
            .values()
            .filter(|s| s.client_id == client_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }
}
