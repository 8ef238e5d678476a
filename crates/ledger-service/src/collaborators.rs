//! # Collaborators
//!
//! Contracts the ledger consumes but does not own: the product catalog, the
//! client directory and the stock movement sink. Each has an in-memory
//! implementation for tests and offline use.
//!
//! ```text
//! ┌─────────────────┐   get_product_by_id   ┌──────────────────┐
//! │                 │ ────────────────────► │  ProductCatalog  │
//! │  LedgerService  │   get_client_by_id    ├──────────────────┤
//! │                 │ ────────────────────► │  ClientDirectory │
//! │                 │   record(movement)    ├──────────────────┤
//! │                 │ ────────────────────► │  StockMovements  │
//! └─────────────────┘                       └──────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use ledger_core::{Client, Product, StockMovement};
use tracing::debug;

use crate::error::ServiceResult;
use crate::repository::lock;

// =============================================================================
// Contracts
// =============================================================================

pub trait ProductCatalog: Send + Sync {
    fn get_product_by_id(&self, id: &str) -> ServiceResult<Option<Product>>;
}

pub trait ClientDirectory: Send + Sync {
    fn get_client_by_id(&self, id: &str) -> ServiceResult<Option<Client>>;
}

/// Sink for stock movements. Stock levels are computed elsewhere.
pub trait StockMovements: Send + Sync {
    fn record(&self, movement: StockMovement) -> ServiceResult<()>;
}

// =============================================================================
// In-Memory Implementations
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: Mutex<HashMap<String, Product>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        InMemoryCatalog {
            products: Mutex::new(products.into_iter().map(|p| (p.id.clone(), p)).collect()),
        }
    }

    pub fn upsert(&self, product: Product) -> ServiceResult<()> {
        lock(&self.products, "products")?.insert(product.id.clone(), product);
        Ok(())
    }
}

impl ProductCatalog for InMemoryCatalog {
    fn get_product_by_id(&self, id: &str) -> ServiceResult<Option<Product>> {
        Ok(lock(&self.products, "products")?.get(id).cloned())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryClients {
    clients: Mutex<HashMap<String, Client>>,
}

impl InMemoryClients {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clients(clients: impl IntoIterator<Item = Client>) -> Self {
        InMemoryClients {
            clients: Mutex::new(clients.into_iter().map(|c| (c.id.clone(), c)).collect()),
        }
    }

    pub fn upsert(&self, client: Client) -> ServiceResult<()> {
        lock(&self.clients, "clients")?.insert(client.id.clone(), client);
        Ok(())
    }
}

impl ClientDirectory for InMemoryClients {
    fn get_client_by_id(&self, id: &str) -> ServiceResult<Option<Client>> {
        Ok(lock(&self.clients, "clients")?.get(id).cloned())
    }
}

/// Keeps every recorded movement in order.
#[derive(Debug, Default)]
pub struct RecordedMovements {
    movements: Mutex<Vec<StockMovement>>,
}

impl RecordedMovements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of what has been recorded so far.
    pub fn movements(&self) -> ServiceResult<Vec<StockMovement>> {
        Ok(lock(&self.movements, "stock_movements")?.clone())
    }
}

impl StockMovements for RecordedMovements {
    fn record(&self, movement: StockMovement) -> ServiceResult<()> {
        debug!(
            product_id = %movement.product_id,
            quantity = movement.quantity,
            kind = ?movement.kind,
            reference = %movement.reference,
            "Recording stock movement"
        );
        lock(&self.movements, "stock_movements")?.push(movement);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ledger_core::{BillingType, Money, MovementKind};

    #[test]
    fn test_catalog_lookup() {
        let catalog = InMemoryCatalog::with_products([Product {
            id: "p-1".to_string(),
            nombre: "Cemento gris 42.5kg".to_string(),
            precio_venta: Money::from_pesos(475),
            stock: 80,
            itbis_exento: false,
        }]);

        assert_eq!(
            catalog.get_product_by_id("p-1").unwrap().unwrap().precio_venta,
            Money::from_pesos(475)
        );
        assert!(catalog.get_product_by_id("p-2").unwrap().is_none());
    }

    #[test]
    fn test_client_upsert() {
        let clients = InMemoryClients::new();
        clients
            .upsert(Client {
                id: "c-1".to_string(),
                nombre: "Constructora Bávaro".to_string(),
                billing_type: BillingType::Credito,
                ncf_type: "B01".to_string(),
            })
            .unwrap();

        let client = clients.get_client_by_id("c-1").unwrap().unwrap();
        assert_eq!(client.billing_type, BillingType::Credito);
    }

    #[test]
    fn test_movements_kept_in_order() {
        let sink = RecordedMovements::new();
        for (qty, kind) in [(3, MovementKind::Salida), (1, MovementKind::Entrada)] {
            sink.record(StockMovement {
                product_id: "p-1".to_string(),
                quantity: qty,
                kind,
                reference: "v-1".to_string(),
                date: Utc::now(),
            })
            .unwrap();
        }

        let kinds: Vec<MovementKind> = sink.movements().unwrap().iter().map(|m| m.kind).collect();
        assert_eq!(kinds, vec![MovementKind::Salida, MovementKind::Entrada]);
    }
}
