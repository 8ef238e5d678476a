//! # Repository Module
//!
//! Persistence contracts for sales and credit notes.
//!
//! ## Compare-and-Swap Saves
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Optimistic Concurrency                               │
//! │                                                                         │
//! │  LedgerService                                                         │
//! │       │  sale = sales.get("v-1")          (version 3)                  │
//! │       │  next = add_payment(&sale, ...)   (version 4)                  │
//! │       │  sales.save(next, Some(3))                                     │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── stored version == 3  → write, return version 4                   │
//! │  └── stored version != 3  → VersionConflict, nothing written          │
//! │                                                                         │
//! │  `None` means insert: the id must not exist yet.                      │
//! │  Credit notes compare on status instead of a version number.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SaleRepository`] / [`InMemorySaleRepository`]
//! - [`CreditNoteRepository`] / [`InMemoryCreditNoteRepository`]

use std::sync::{Mutex, MutexGuard};

use crate::error::{ServiceError, ServiceResult};

pub mod credit_note;
pub mod sale;

pub use credit_note::{CreditNoteRepository, InMemoryCreditNoteRepository};
pub use sale::{InMemorySaleRepository, SaleRepository};

/// Locks an in-memory table, surfacing poisoning as a storage error.
pub(crate) fn lock<'a, T>(table: &'a Mutex<T>, name: &str) -> ServiceResult<MutexGuard<'a, T>> {
    table
        .lock()
        .map_err(|_| ServiceError::Storage(format!("{} table lock poisoned", name)))
}
