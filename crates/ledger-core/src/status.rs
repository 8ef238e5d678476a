//! # Status Derivation
//!
//! The single place a [`SaleStatus`] is computed.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  derive_status(type, total, total_paid, cancelled)                      │
//! │                                                                         │
//! │  cancelled?  ──yes──► Cancelled                                        │
//! │      │no                                                                │
//! │  type Cash?  ──yes──► Completed                                        │
//! │      │no                                                                │
//! │  total_paid >= total ──yes──► Completed   (remaining == 0)             │
//! │      │no                                                                │
//! │  total_paid == 0 ──yes──► Pending                                      │
//! │      │no                                                                │
//! │  Partial                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A zero-total credit sale is `Completed`: nothing is owed.
//! `create_sale`, `add_payment`, `cancel_sale` and `apply_credit_note` all
//! call this after rebuilding the balance fields; nothing assigns a status
//! directly.

use crate::money::Money;
use crate::types::{SaleStatus, SaleType};

/// Derives a sale's status from its settlement figures.
///
/// ```rust
/// use ledger_core::money::Money;
/// use ledger_core::status::derive_status;
/// use ledger_core::types::{SaleStatus, SaleType};
///
/// let total = Money::from_pesos(1000);
/// assert_eq!(
///     derive_status(SaleType::Credit, total, Money::from_pesos(400), false),
///     SaleStatus::Partial
/// );
/// ```
pub fn derive_status(
    sale_type: SaleType,
    total: Money,
    total_paid: Money,
    cancelled: bool,
) -> SaleStatus {
    if cancelled {
        return SaleStatus::Cancelled;
    }

    if sale_type == SaleType::Cash || total_paid >= total {
        return SaleStatus::Completed;
    }

    if total_paid.is_zero() {
        SaleStatus::Pending
    } else {
        SaleStatus::Partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOTAL: Money = Money::from_cents(100_000);

    #[test]
    fn test_cancelled_overrides_everything() {
        for sale_type in [SaleType::Cash, SaleType::Credit, SaleType::Mixed] {
            assert_eq!(
                derive_status(sale_type, TOTAL, TOTAL, true),
                SaleStatus::Cancelled
            );
        }
    }

    #[test]
    fn test_cash_is_always_completed() {
        assert_eq!(
            derive_status(SaleType::Cash, TOTAL, TOTAL, false),
            SaleStatus::Completed
        );
    }

    #[test]
    fn test_credit_progression() {
        assert_eq!(
            derive_status(SaleType::Credit, TOTAL, Money::zero(), false),
            SaleStatus::Pending
        );
        assert_eq!(
            derive_status(SaleType::Credit, TOTAL, Money::from_cents(1), false),
            SaleStatus::Partial
        );
        assert_eq!(
            derive_status(SaleType::Credit, TOTAL, TOTAL, false),
            SaleStatus::Completed
        );
    }

    #[test]
    fn test_mixed_with_cash_portion_is_partial() {
        assert_eq!(
            derive_status(SaleType::Mixed, TOTAL, Money::from_pesos(300), false),
            SaleStatus::Partial
        );
    }

    #[test]
    fn test_zero_total_credit_sale_is_completed() {
        assert_eq!(
            derive_status(SaleType::Credit, Money::zero(), Money::zero(), false),
            SaleStatus::Completed
        );
    }

    #[test]
    fn test_is_deterministic() {
        let first = derive_status(SaleType::Mixed, TOTAL, Money::from_pesos(450), false);
        let second = derive_status(SaleType::Mixed, TOTAL, Money::from_pesos(450), false);
        assert_eq!(first, second);
    }
}
