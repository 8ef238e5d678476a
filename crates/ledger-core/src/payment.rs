//! # Payment Ledger
//!
//! Registers payments against a sale. The payment list is append-only: there
//! is no edit or delete, corrections go through credit notes.
//!
//! ## User Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sale V-1021  total RD$1,000.00  remaining RD$600.00                    │
//! │                                                                         │
//! │  User registers RD$400.00 by transfer                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  add_payment() ← THIS MODULE                                           │
//! │       │                                                                 │
//! │       ├── sale cancelled?          → InvalidState                      │
//! │       ├── amount <= 0?             → InvalidAmount                     │
//! │       ├── amount > remaining?      → Overpayment                       │
//! │       │                                                                 │
//! │       └── OK → new Sale: payments + [p], total_paid resummed,          │
//! │                remaining RD$200.00, status re-derived, version + 1     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Retries
//! Every call mints a fresh payment id, so sending the same draft twice
//! registers two payments. Callers must guard against double submission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::ids::IdGenerator;
use crate::money::Money;
use crate::sale::{ensure_open, rebalance};
use crate::types::{Payment, PaymentMethod, Sale};
use crate::validation::validate_reference;

/// A payment as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDraft {
    pub amount: Money,
    pub method: PaymentMethod,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub reference: Option<String>,
}

/// Appends a payment to a sale and returns the updated sale.
///
/// The remaining balance consulted here already reflects applied credit
/// notes, so a credited sale accepts correspondingly less.
///
/// ## Errors
/// - `InvalidState` if the sale is cancelled
/// - `InvalidAmount` if `amount <= 0`
/// - `Overpayment` if `amount > remaining_balance` (equality is allowed)
/// - `Validation` if the reference is too long
pub fn add_payment(sale: &Sale, draft: PaymentDraft, ids: &dyn IdGenerator) -> CoreResult<Sale> {
    ensure_open(sale, "register a payment")?;

    if !draft.amount.is_positive() {
        return Err(CoreError::InvalidAmount {
            amount: draft.amount,
        });
    }

    if draft.amount > sale.remaining_balance {
        return Err(CoreError::Overpayment {
            sale_id: sale.id.clone(),
            amount: draft.amount,
            remaining: sale.remaining_balance,
        });
    }

    validate_reference(draft.reference.as_deref())?;

    let payment = Payment {
        id: ids.next_id(),
        date: draft.date,
        amount: draft.amount,
        method: draft.method,
        reference: draft
            .reference
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty()),
    };

    let mut next = sale.clone();
    next.payments.push(payment);
    next.version += 1;
    Ok(rebalance(next))
}

// =============================================================================
// Unit Tests
// =============================================================================
