//! # ledger-core: Pure Sales Ledger Rules
//!
//! This crate holds the rules behind the sales ledger: how a sale is priced,
//! how payments and credit notes settle it, and what its status is at every
//! step. It has zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sales Ledger Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Front end (forms, tables)                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ledger-service (LedgerService)                     │   │
//! │  │    repositories, catalog, client directory, stock movements    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ ledger-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌──────────┐  ┌──────────────┐     │   │
//! │  │   │  money  │  │  sale   │  │ payment  │  │ credit_note  │     │   │
//! │  │   │  ITBIS  │  │ create  │  │ add      │  │ apply/cancel │     │   │
//! │  │   └─────────┘  └─────────┘  └──────────┘  └──────────────┘     │   │
//! │  │          status::derive_status  ◄── called after every step     │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Sale, Payment, CreditNote, ...)
//! - [`money`] - Integer Money and ITBIS helpers
//! - [`sale`] - Sale construction and cancellation
//! - [`payment`] - Payment registration
//! - [`credit_note`] - Credit note creation and state machine
//! - [`status`] - The one status derivation function
//! - [`report`] - Receivables and payment-method totals
//! - [`validation`] - Input rules and [`LedgerRules`]
//! - [`ids`], [`clock`] - Injected id and time sources
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Values in, values out**: every operation takes a `&Sale` or
//!    `&CreditNote` and returns a new one; nothing is mutated in place
//! 2. **All or nothing**: inputs are validated before the result is built
//! 3. **Resum, never increment**: `total_paid` is rebuilt from records
//! 4. **Integer Money**: all amounts are centavos (i64)
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use ledger_core::ids::SequentialIdGenerator;
//! use ledger_core::payment::{add_payment, PaymentDraft};
//! use ledger_core::sale::{create_sale, NewSale, SaleItemDraft};
//! use ledger_core::{LedgerRules, Money, PaymentMethod, SaleStatus, SaleType};
//!
//! let ids = SequentialIdGenerator::new("id");
//! let sale = create_sale(
//!     NewSale {
//!         client_id: "c-1".into(),
//!         date: Utc::now(),
//!         sale_type: SaleType::Credit,
//!         items: vec![SaleItemDraft {
//!             product_id: "p-1".into(),
//!             quantity: 1,
//!             unit_price: Money::from_pesos(1000),
//!             itbis_amount: Some(Money::zero()),
//!         }],
//!         cash_amount: None,
//!         credit_amount: None,
//!         advance_payment: None,
//!     },
//!     &ids,
//!     &LedgerRules::default(),
//! )?;
//!
//! let sale = add_payment(
//!     &sale,
//!     PaymentDraft {
//!         amount: Money::from_pesos(400),
//!         method: PaymentMethod::Efectivo,
//!         date: Utc::now(),
//!         reference: None,
//!     },
//!     &ids,
//! )?;
//!
//! assert_eq!(sale.remaining_balance, Money::from_pesos(600));
//! assert_eq!(sale.status, SaleStatus::Partial);
//! # Ok::<(), ledger_core::CoreError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod clock;
pub mod credit_note;
pub mod error;
pub mod ids;
pub mod money;
pub mod payment;
pub mod report;
pub mod sale;
pub mod status;
pub mod types;
pub mod validation;

#[cfg(test)]
mod scenarios;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;
pub use validation::LedgerRules;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// ITBIS rate in basis points (18%).
pub const ITBIS_RATE_BPS: u32 = 1800;

/// Default allowed gap between `cash + credit` and `total` on a mixed sale.
pub const MIXED_SPLIT_TOLERANCE_CENTS: i64 = 1;

/// Maximum lines on a single sale or credit note.
pub const MAX_SALE_ITEMS: usize = 500;

/// Maximum quantity on a single line.
///
/// Construction orders run large (blocks, rebar); anything beyond a
/// million units on one line is a typing error.
pub const MAX_ITEM_QUANTITY: i64 = 1_000_000;

/// Maximum length of a payment reference.
pub const MAX_REFERENCE_LEN: usize = 100;
