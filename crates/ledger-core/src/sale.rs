//! # Sale Construction & Lifecycle
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── create_sale() → Cash: completed                                │
//! │                         Credit: pending (partial with advance)         │
//! │                         Mixed: partial (cash portion settled)          │
//! │                                                                         │
//! │  2. SETTLE (any number of times, any order)                            │
//! │     ├── payment::add_payment()          → payments[] grows             │
//! │     └── credit_note::apply_credit_note() → credit_applications[] grows │
//! │                                                                         │
//! │  3. (OPTIONAL) CANCEL                                                  │
//! │     └── cancel_sale() → cancelled (terminal)                           │
//! │                                                                         │
//! │  After every step: rebalance() resums total_paid from scratch and      │
//! │  derive_status() recomputes the status.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here takes a `&Sale` and hands back a new `Sale`; the
//! caller persists it. Stock decrements are the caller's job too.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::ids::IdGenerator;
use crate::money::{checked_line_subtotal, itbis, Money};
use crate::status::derive_status;
use crate::types::{BillingType, Client, Sale, SaleItem, SaleType};
use crate::validation::{
    require_in_range, validate_item_count, validate_mixed_split, validate_non_negative,
    validate_quantity, validate_required, LedgerRules,
};

// =============================================================================
// Input Types
// =============================================================================

/// A line as entered by the user, before ids and ITBIS are settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemDraft {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    /// Explicit line ITBIS (e.g. zero for exempt goods). When absent it is
    /// computed from the subtotal at the configured rate.
    #[serde(default)]
    pub itbis_amount: Option<Money>,
}

/// Everything needed to create a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub client_id: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub sale_type: SaleType,
    pub items: Vec<SaleItemDraft>,
    #[serde(default)]
    pub cash_amount: Option<Money>,
    #[serde(default)]
    pub credit_amount: Option<Money>,
    #[serde(default)]
    pub advance_payment: Option<Money>,
}

// =============================================================================
// Operations
// =============================================================================

/// Builds a new sale from its lines and settlement configuration.
///
/// ## Errors
/// `CoreError::Validation` when:
/// - `client_id` is empty, `items` is empty or too long
/// - a line has `quantity <= 0`, a negative price or negative ITBIS
/// - a mixed sale lacks either portion, or `cash + credit != total`
///   beyond the configured tolerance
/// - split amounts are sent for a sale type that has none, or the advance
///   on a credit sale exceeds its total
///
/// ```rust
/// use chrono::Utc;
/// use ledger_core::ids::SequentialIdGenerator;
/// use ledger_core::money::Money;
/// use ledger_core::sale::{create_sale, NewSale, SaleItemDraft};
/// use ledger_core::types::{SaleStatus, SaleType};
/// use ledger_core::validation::LedgerRules;
///
/// let sale = create_sale(
///     NewSale {
///         client_id: "c-1".into(),
///         date: Utc::now(),
///         sale_type: SaleType::Cash,
///         items: vec![SaleItemDraft {
///             product_id: "p-1".into(),
///             quantity: 2,
///             unit_price: Money::from_pesos(100),
///             itbis_amount: None,
///         }],
///         cash_amount: None,
///         credit_amount: None,
///         advance_payment: None,
///     },
///     &SequentialIdGenerator::new("v"),
///     &LedgerRules::default(),
/// )
/// .unwrap();
///
/// assert_eq!(sale.total, Money::from_pesos(236));
/// assert_eq!(sale.status, SaleStatus::Completed);
/// ```
pub fn create_sale(input: NewSale, ids: &dyn IdGenerator, rules: &LedgerRules) -> CoreResult<Sale> {
    validate_required("client_id", &input.client_id)?;
    validate_item_count(input.items.len(), rules.max_items)?;

    for draft in &input.items {
        validate_required("product_id", &draft.product_id)?;
        validate_quantity(draft.quantity)?;
        validate_non_negative("unit_price", draft.unit_price)?;
        if let Some(amount) = draft.itbis_amount {
            validate_non_negative("itbis_amount", amount)?;
        }
    }

    // ITBIS is fixed per line here and never re-rounded on the aggregate.
    let mut priced: Vec<(SaleItemDraft, Money, Money)> = Vec::with_capacity(input.items.len());
    for draft in input.items {
        let line = require_in_range(
            "line_subtotal",
            checked_line_subtotal(draft.quantity, draft.unit_price),
        )?;
        let tax = draft
            .itbis_amount
            .unwrap_or_else(|| itbis(line, rules.itbis_rate));
        priced.push((draft, line, tax));
    }

    let subtotal = require_in_range("subtotal", Money::checked_sum(priced.iter().map(|p| p.1)))?;
    let itbis_total = require_in_range("itbis_total", Money::checked_sum(priced.iter().map(|p| p.2)))?;
    let total = require_in_range("total", subtotal.checked_add(itbis_total))?;

    let (cash_amount, credit_amount, advance_payment) = settlement_split(
        input.sale_type,
        input.cash_amount,
        input.credit_amount,
        input.advance_payment,
        total,
        rules,
    )?;

    let sale_id = ids.next_id();
    let items = priced
        .into_iter()
        .map(|(draft, _, tax)| SaleItem {
            id: ids.next_id(),
            product_id: draft.product_id,
            quantity: draft.quantity,
            unit_price: draft.unit_price,
            itbis_amount: tax,
        })
        .collect();

    let sale = Sale {
        id: sale_id,
        client_id: input.client_id,
        date: input.date,
        items,
        sale_type: input.sale_type,
        subtotal,
        itbis_total,
        total,
        cash_amount,
        credit_amount,
        advance_payment,
        payments: Vec::new(),
        credit_applications: Vec::new(),
        total_paid: Money::zero(),
        remaining_balance: total,
        status: derive_status(input.sale_type, total, Money::zero(), false),
        cancelled: false,
        version: 0,
    };

    Ok(rebalance(sale))
}

/// Cancels a sale. Payments and credit applications stay for audit.
///
/// ## Errors
/// `CoreError::InvalidState` when the sale is already cancelled.
pub fn cancel_sale(sale: &Sale) -> CoreResult<Sale> {
    ensure_open(sale, "cancel")?;

    let mut next = sale.clone();
    next.cancelled = true;
    next.version += 1;
    Ok(rebalance(next))
}

/// Sale type a new sale for this client should default to.
pub fn default_sale_type(client: &Client) -> SaleType {
    match client.billing_type {
        BillingType::Contado => SaleType::Cash,
        BillingType::Credito => SaleType::Credit,
        BillingType::Mixto => SaleType::Mixed,
    }
}

// =============================================================================
// Internal Helpers
// =============================================================================

/// Rebuilds `total_paid`, `remaining_balance` and `status` from the sale's
/// own records. Always a full resummation, never an increment.
pub(crate) fn rebalance(mut sale: Sale) -> Sale {
    let total_paid = sale.initial_paid() + sale.payments_total() + sale.credited_total();
    debug_assert!(total_paid <= sale.total, "sale {} is over-settled", sale.id);

    sale.total_paid = total_paid;
    sale.remaining_balance = sale.total.saturating_sub(total_paid);
    sale.status = derive_status(sale.sale_type, sale.total, total_paid, sale.cancelled);
    sale
}

/// Fails with `InvalidState` when the sale has been cancelled.
pub(crate) fn ensure_open(sale: &Sale, operation: &str) -> CoreResult<()> {
    if sale.cancelled {
        return Err(CoreError::invalid_state(
            "Sale",
            &sale.id,
            sale.status.to_string(),
            operation,
        ));
    }
    Ok(())
}

type Split = (Option<Money>, Option<Money>, Option<Money>);

fn settlement_split(
    sale_type: SaleType,
    cash_amount: Option<Money>,
    credit_amount: Option<Money>,
    advance_payment: Option<Money>,
    total: Money,
    rules: &LedgerRules,
) -> CoreResult<Split> {
    match sale_type {
        SaleType::Cash => {
            reject_field(cash_amount, "cash_amount", "only mixed sales carry a cash portion")?;
            reject_field(credit_amount, "credit_amount", "only mixed sales carry a credit portion")?;
            reject_field(advance_payment, "advance_payment", "cash sales are paid in full")?;
            Ok((None, None, None))
        }
        SaleType::Credit => {
            reject_field(cash_amount, "cash_amount", "only mixed sales carry a cash portion")?;
            reject_field(credit_amount, "credit_amount", "only mixed sales carry a credit portion")?;

            let advance = advance_payment.filter(|a| !a.is_zero());
            if let Some(advance) = advance {
                validate_non_negative("advance_payment", advance)?;
                if advance > total {
                    return Err(ValidationError::OutOfRange {
                        field: "advance_payment".to_string(),
                        min: 0,
                        max: total.cents(),
                    }
                    .into());
                }
            }
            Ok((None, None, advance))
        }
        SaleType::Mixed => {
            reject_field(advance_payment, "advance_payment", "the cash portion is the advance")?;

            let cash = cash_amount.ok_or_else(|| ValidationError::required("cash_amount"))?;
            let credit = credit_amount.ok_or_else(|| ValidationError::required("credit_amount"))?;
            validate_mixed_split(cash, credit, total, rules.mixed_split_tolerance)?;
            if cash > total {
                return Err(ValidationError::mismatch("cash_amount", total, cash).into());
            }
            Ok((Some(cash), Some(credit), None))
        }
    }
}

fn reject_field(value: Option<Money>, field: &str, reason: &str) -> CoreResult<()> {
    if value.is_some() {
        return Err(ValidationError::NotAllowed {
            field: field.to_string(),
            reason: reason.to_string(),
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
