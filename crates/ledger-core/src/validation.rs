//! # Validation Module
//!
//! Input validation for sale items, payments and credit note lines.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Front end forms                                              │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Field rules (quantity > 0, price >= 0, ...)                       │
//! │  └── Cross-field rules (mixed split = total)                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Ledger operations                                            │
//! │  └── State rules (overpayment, credit note transitions)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every validator runs before anything is built, so a failed operation
//! never leaves a partly constructed value.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::TaxRate;
use crate::{
    ITBIS_RATE_BPS, MAX_ITEM_QUANTITY, MAX_REFERENCE_LEN, MAX_SALE_ITEMS,
    MIXED_SPLIT_TOLERANCE_CENTS,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Ledger Rules
// =============================================================================

/// Tunable business rules, normally built from the service configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRules {
    /// Rate used when a line does not carry an explicit ITBIS amount.
    pub itbis_rate: TaxRate,
    /// Allowed gap between `cash + credit` and `total` on mixed sales.
    pub mixed_split_tolerance: Money,
    /// Maximum number of lines on a sale or credit note.
    pub max_items: usize,
}

impl Default for LedgerRules {
    fn default() -> Self {
        LedgerRules {
            itbis_rate: TaxRate::from_bps(ITBIS_RATE_BPS),
            mixed_split_tolerance: Money::from_cents(MIXED_SPLIT_TOLERANCE_CENTS),
            max_items: MAX_SALE_ITEMS,
        }
    }
}

// =============================================================================
// String Validators
// =============================================================================

/// Rejects empty or whitespace-only values.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

/// Validates an optional payment reference (transfer/cheque number).
///
/// ```rust
/// use ledger_core::validation::validate_reference;
///
/// assert!(validate_reference(None).is_ok());
/// assert!(validate_reference(Some("TRF-0091")).is_ok());
/// assert!(validate_reference(Some(&"9".repeat(200))).is_err());
/// ```
pub fn validate_reference(reference: Option<&str>) -> ValidationResult<()> {
    if let Some(reference) = reference {
        if reference.trim().len() > MAX_REFERENCE_LEN {
            return Err(ValidationError::TooLong {
                field: "reference".to_string(),
                max: MAX_REFERENCE_LEN,
            });
        }
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Rejects negative amounts. Zero is allowed (free items, exempt lines).
///
/// ```rust
/// use ledger_core::money::Money;
/// use ledger_core::validation::validate_non_negative;
///
/// assert!(validate_non_negative("unit_price", Money::from_cents(0)).is_ok());
/// assert!(validate_non_negative("unit_price", Money::from_cents(-1)).is_err());
/// ```
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Turns the result of checked money arithmetic into a typed error.
///
/// ```rust
/// use ledger_core::money::Money;
/// use ledger_core::validation::require_in_range;
///
/// assert!(require_in_range("total", Money::from_cents(i64::MAX).checked_add(Money::from_cents(1))).is_err());
/// ```
pub fn require_in_range(field: &str, amount: Option<Money>) -> ValidationResult<Money> {
    amount.ok_or_else(|| ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    })
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }
    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines on a sale or credit note.
pub fn validate_item_count(count: usize, max: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::required("items"));
    }

    if count > max {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: max as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Cross-field Validators
// =============================================================================

/// Validates the cash/credit split of a mixed sale against its total.
///
/// ## Rules
/// - Both portions are non-negative
/// - `|cash + credit - total| <= tolerance`
pub fn validate_mixed_split(
    cash: Money,
    credit: Money,
    total: Money,
    tolerance: Money,
) -> ValidationResult<()> {
    validate_non_negative("cash_amount", cash)?;
    validate_non_negative("credit_amount", credit)?;

    let split = cash + credit;
    if (split - total).abs() > tolerance {
        return Err(ValidationError::mismatch("cash_amount + credit_amount", total, split));
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
