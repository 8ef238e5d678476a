//! # Credit Note Engine
//!
//! Credit notes (notas de crédito) are documents of their own that may point
//! at an original sale. Applying one reduces that sale's outstanding balance.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   create_credit_note()                                                 │
//! │          │                                                              │
//! │          ▼                                                              │
//! │     ┌───────────┐   apply_credit_note()    ┌──────────┐                │
//! │     │ Pendiente │ ───────────────────────► │ Aplicada │  terminal      │
//! │     └─────┬─────┘                          └──────────┘                │
//! │           │ cancel_credit_note()                                       │
//! │           ▼                                                             │
//! │     ┌───────────┐                                                       │
//! │     │ Cancelada │  terminal                                            │
//! │     └───────────┘                                                       │
//! │                                                                         │
//! │   Delete: only while Pendiente (ensure_deletable)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Effect on the Sale
//! The applied amount goes into `Sale::credit_applications`, a ledger kept
//! parallel to `payments`. It counts toward `total_paid` exactly like a
//! payment, but payment-method reports never see it. When the note is worth
//! more than the sale still owes, only the outstanding part is applied and
//! the surplus is recorded as `unapplied` client credit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::clock::Clock;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::ids::IdGenerator;
use crate::money::{checked_line_subtotal, itbis, Money};
use crate::sale::{ensure_open, rebalance};
use crate::types::{
    CreditApplication, CreditNote, CreditNoteItem, CreditNoteStatus, CreditNoteType, Sale,
};
use crate::validation::{
    require_in_range, validate_item_count, validate_non_negative, validate_quantity,
    validate_required, LedgerRules,
};

// =============================================================================
// Input Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreditNoteItemDraft {
    #[serde(default)]
    pub product_id: Option<String>,
    pub descripcion: String,
    pub cantidad: i64,
    pub precio_unitario: Money,
    /// Explicit line ITBIS; computed at the configured rate when absent.
    #[serde(default)]
    pub itbis: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewCreditNote {
    pub numero: String,
    pub client_id: String,
    #[serde(default)]
    pub factura_original_id: Option<String>,
    pub tipo: CreditNoteType,
    #[serde(default)]
    pub motivo: Option<String>,
    #[ts(as = "String")]
    pub fecha: DateTime<Utc>,
    pub items: Vec<CreditNoteItemDraft>,
}

/// Result of applying a note: the note itself and, when it references a
/// sale, the updated sale. Both must be persisted together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedCreditNote {
    pub note: CreditNote,
    pub sale: Option<Sale>,
}

// =============================================================================
// Operations
// =============================================================================

/// Builds a pending credit note, pricing every line.
///
/// ## Errors
/// `CoreError::Validation` for an empty numero or client, no lines, a line
/// without description, `cantidad <= 0`, negative prices, or a note whose
/// total is zero.
pub fn create_credit_note(
    input: NewCreditNote,
    ids: &dyn IdGenerator,
    rules: &LedgerRules,
) -> CoreResult<CreditNote> {
    validate_required("numero", &input.numero)?;
    validate_required("client_id", &input.client_id)?;
    if let Some(sale_id) = &input.factura_original_id {
        validate_required("factura_original_id", sale_id)?;
    }
    validate_item_count(input.items.len(), rules.max_items)?;

    for draft in &input.items {
        validate_required("descripcion", &draft.descripcion)?;
        validate_quantity(draft.cantidad)?;
        validate_non_negative("precio_unitario", draft.precio_unitario)?;
        if let Some(tax) = draft.itbis {
            validate_non_negative("itbis", tax)?;
        }
    }

    let mut items: Vec<CreditNoteItem> = Vec::with_capacity(input.items.len());
    for draft in input.items {
        let subtotal = require_in_range(
            "subtotal",
            checked_line_subtotal(draft.cantidad, draft.precio_unitario),
        )?;
        let tax = draft
            .itbis
            .unwrap_or_else(|| itbis(subtotal, rules.itbis_rate));
        items.push(CreditNoteItem {
            product_id: draft.product_id.filter(|id| !id.trim().is_empty()),
            descripcion: draft.descripcion.trim().to_string(),
            cantidad: draft.cantidad,
            precio_unitario: draft.precio_unitario,
            subtotal,
            itbis: tax,
            total: require_in_range("total", subtotal.checked_add(tax))?,
        });
    }

    let subtotal = require_in_range("subtotal", Money::checked_sum(items.iter().map(|i| i.subtotal)))?;
    let itbis_total = require_in_range("itbis_total", Money::checked_sum(items.iter().map(|i| i.itbis)))?;
    let monto_total = require_in_range("monto_total", Money::checked_sum(items.iter().map(|i| i.total)))?;

    if !monto_total.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "monto_total".to_string(),
        }
        .into());
    }

    Ok(CreditNote {
        id: ids.next_id(),
        numero: input.numero.trim().to_string(),
        client_id: input.client_id,
        factura_original_id: input.factura_original_id,
        tipo: input.tipo,
        motivo: input.motivo,
        fecha: input.fecha,
        items,
        subtotal,
        itbis_total,
        monto_total,
        status: CreditNoteStatus::Pendiente,
        fecha_aplicacion: None,
    })
}

/// Applies a pending note, crediting the referenced sale if there is one.
///
/// `sale` must be the sale named by `factura_original_id` (and be omitted
/// when the note is a general adjustment).
///
/// ## Errors
/// - `InvalidState` if the note is not `Pendiente`, the sale is cancelled,
///   or the sale already carries an application of this note
/// - `Validation` if the sale is missing, is a different sale, or belongs to
///   another client
pub fn apply_credit_note(
    note: &CreditNote,
    sale: Option<&Sale>,
    clock: &dyn Clock,
) -> CoreResult<AppliedCreditNote> {
    ensure_pending(note, "apply")?;

    let now = clock.now();

    let credited = match (note.factura_original_id.as_deref(), sale) {
        (Some(sale_id), Some(sale)) => Some(credit_sale(note, sale_id, sale, now)?),
        (Some(_), None) => return Err(ValidationError::required("original sale").into()),
        (None, Some(_)) => {
            return Err(ValidationError::NotAllowed {
                field: "sale".to_string(),
                reason: format!("credit note {} does not reference a sale", note.numero),
            }
            .into())
        }
        (None, None) => None,
    };

    let mut applied = note.clone();
    applied.status = CreditNoteStatus::Aplicada;
    applied.fecha_aplicacion = Some(now);

    Ok(AppliedCreditNote {
        note: applied,
        sale: credited,
    })
}

/// Cancels a pending note. No sale is touched.
pub fn cancel_credit_note(note: &CreditNote) -> CoreResult<CreditNote> {
    ensure_pending(note, "cancel")?;

    let mut cancelled = note.clone();
    cancelled.status = CreditNoteStatus::Cancelada;
    Ok(cancelled)
}

/// Checks that a note may be deleted (only while pending).
pub fn ensure_deletable(note: &CreditNote) -> CoreResult<()> {
    ensure_pending(note, "delete")
}

// =============================================================================
// Internal Helpers
// =============================================================================

fn ensure_pending(note: &CreditNote, operation: &str) -> CoreResult<()> {
    if note.status.is_terminal() {
        return Err(CoreError::invalid_state(
            "Credit note",
            &note.numero,
            note.status.to_string(),
            operation,
        ));
    }
    Ok(())
}

fn credit_sale(note: &CreditNote, sale_id: &str, sale: &Sale, now: DateTime<Utc>) -> CoreResult<Sale> {
    if sale.id != sale_id {
        return Err(ValidationError::mismatch("factura_original_id", sale_id, &sale.id).into());
    }
    if sale.client_id != note.client_id {
        return Err(ValidationError::mismatch("client_id", &sale.client_id, &note.client_id).into());
    }
    ensure_open(sale, "apply a credit note")?;

    if sale
        .credit_applications
        .iter()
        .any(|c| c.credit_note_id == note.id)
    {
        return Err(CoreError::invalid_state(
            "Credit note",
            &note.numero,
            CreditNoteStatus::Aplicada.to_string(),
            "apply",
        ));
    }

    let amount = note.monto_total.min(sale.remaining_balance);

    let mut next = sale.clone();
    next.credit_applications.push(CreditApplication {
        credit_note_id: note.id.clone(),
        numero: note.numero.clone(),
        date: now,
        amount,
        unapplied: note.monto_total - amount,
    });
    next.version += 1;
    Ok(rebalance(next))
}

// =============================================================================
// Unit Tests
// =============================================================================
