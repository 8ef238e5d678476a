//! # ledger-service: Sales Ledger Orchestration
//!
//! Connects the pure rules in `ledger-core` to storage, the product catalog,
//! the client directory and the stock movement sink.
//!
//! ## Module Structure
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ledger-service Modules                             │
//! │                                                                         │
//! │  ┌─────────────┐  ┌──────────────┐  ┌───────────────┐                  │
//! │  │  service    │  │  repository  │  │ collaborators │                  │
//! │  │ ──────────  │  │ ──────────── │  │ ───────────── │                  │
//! │  │ LedgerSvc   │─►│ SaleRepo     │  │ ProductCatalog│                  │
//! │  │ requests    │  │ CreditNote   │  │ ClientDir     │                  │
//! │  └──────┬──────┘  │ Repo (CAS)   │  │ StockMovements│                  │
//! │         │         └──────────────┘  └───────────────┘                  │
//! │         ▼                                                               │
//! │  ┌─────────────┐  ┌──────────────┐  ┌───────────────┐                  │
//! │  │   config    │  │   logging    │  │    error      │                  │
//! │  │ ledger.toml │  │ init_tracing │  │ ServiceError  │                  │
//! │  └─────────────┘  └──────────────┘  └───────────────┘                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wiring
//!
//! ```rust
//! use std::sync::Arc;
//! use ledger_core::clock::SystemClock;
//! use ledger_core::ids::UuidIdGenerator;
//! use ledger_service::collaborators::{InMemoryCatalog, InMemoryClients, RecordedMovements};
//! use ledger_service::repository::{InMemoryCreditNoteRepository, InMemorySaleRepository};
//! use ledger_service::{LedgerConfig, LedgerDeps, LedgerService};
//!
//! let config = LedgerConfig::default();
//! let service = LedgerService::new(
//!     LedgerDeps {
//!         sales: Arc::new(InMemorySaleRepository::new()),
//!         credit_notes: Arc::new(InMemoryCreditNoteRepository::new()),
//!         catalog: Arc::new(InMemoryCatalog::new()),
//!         clients: Arc::new(InMemoryClients::new()),
//!         stock: Arc::new(RecordedMovements::new()),
//!         ids: Arc::new(UuidIdGenerator),
//!         clock: Arc::new(SystemClock),
//!     },
//!     &config,
//! );
//! assert_eq!(service.rules().max_items, 500);
//! ```

pub mod collaborators;
pub mod config;
pub mod error;
pub mod logging;
pub mod repository;
pub mod service;

pub use config::LedgerConfig;
pub use error::{ServiceError, ServiceResult};
pub use logging::init_tracing;
pub use service::{
    CreditNoteRequest, LedgerDeps, LedgerService, PaymentRequest, SaleLineRequest, SaleRequest,
};
