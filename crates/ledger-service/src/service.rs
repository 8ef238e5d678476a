//! # Ledger Service
//!
//! Runs the ledger-core rules against storage and collaborators.
//!
//! ## Operation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    register_payment("v-1", Some(3), ...)               │
//! │                                                                         │
//! │  1. LOAD      sales.get("v-1")                → Sale v3                │
//! │  2. CHECK     caller's version == 3           → else VersionConflict   │
//! │  3. RULES     ledger_core::add_payment(&sale) → Sale v4 (pure)         │
//! │  4. SAVE      sales.save(v4, Some(3))         → CAS against storage    │
//! │                                                                         │
//! │  A rule rejection (step 3) leaves storage untouched.                   │
//! │  A lost race (step 4) surfaces as VersionConflict; reload and retry.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Payments are not idempotent: a caller retrying after a timeout must
//! reload the sale and pass its fresh version, never replay blindly.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use ledger_core::clock::Clock;
use ledger_core::credit_note::{self, CreditNoteItemDraft, NewCreditNote};
use ledger_core::ids::IdGenerator;
use ledger_core::payment::{self, PaymentDraft};
use ledger_core::report::{self, ClientBalance};
use ledger_core::sale::{self, NewSale, SaleItemDraft};
use ledger_core::{
    CoreError, CoreResult, CreditNote, CreditNoteStatus, CreditNoteType, LedgerRules, Money,
    MovementKind, PaymentMethod, Sale, SaleType, StockMovement, ValidationError,
};

use crate::collaborators::{ClientDirectory, ProductCatalog, StockMovements};
use crate::config::{LedgerConfig, NumberingSettings};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{CreditNoteRepository, SaleRepository};

// =============================================================================
// Requests
// =============================================================================

/// One line of a sale as entered at the counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineRequest {
    pub product_id: String,
    pub quantity: i64,
    /// Catalog price when omitted.
    #[serde(default)]
    pub unit_price: Option<Money>,
}

/// A sale as submitted by the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequest {
    pub client_id: String,
    /// Client's billing type when omitted.
    #[serde(default, rename = "type")]
    pub sale_type: Option<SaleType>,
    /// Clock time when omitted.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    pub items: Vec<SaleLineRequest>,
    #[serde(default)]
    pub cash_amount: Option<Money>,
    #[serde(default)]
    pub credit_amount: Option<Money>,
    #[serde(default)]
    pub advance_payment: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount: Money,
    pub method: PaymentMethod,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// A credit note to issue; the number is assigned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditNoteRequest {
    pub client_id: String,
    #[serde(default)]
    pub factura_original_id: Option<String>,
    pub tipo: CreditNoteType,
    #[serde(default)]
    pub motivo: Option<String>,
    #[serde(default)]
    pub fecha: Option<DateTime<Utc>>,
    pub items: Vec<CreditNoteItemDraft>,
}

// =============================================================================
// Service
// =============================================================================

/// Everything the service talks to.
#[derive(Clone)]
pub struct LedgerDeps {
    pub sales: Arc<dyn SaleRepository>,
    pub credit_notes: Arc<dyn CreditNoteRepository>,
    pub catalog: Arc<dyn ProductCatalog>,
    pub clients: Arc<dyn ClientDirectory>,
    pub stock: Arc<dyn StockMovements>,
    pub ids: Arc<dyn IdGenerator>,
    pub clock: Arc<dyn Clock>,
}

pub struct LedgerService {
    deps: LedgerDeps,
    rules: LedgerRules,
    numbering: NumberingSettings,
}

impl LedgerService {
    pub fn new(deps: LedgerDeps, config: &LedgerConfig) -> Self {
        LedgerService {
            deps,
            rules: config.rules(),
            numbering: config.numbering.clone(),
        }
    }

    pub fn rules(&self) -> &LedgerRules {
        &self.rules
    }

    // =========================================================================
    // Sales
    // =========================================================================

    pub fn get_sale(&self, sale_id: &str) -> ServiceResult<Sale> {
        self.deps
            .sales
            .get(sale_id)?
            .ok_or_else(|| ServiceError::not_found("Sale", sale_id))
    }

    /// Creates and stores a sale, then records its `Salida` movements.
    ///
    /// Once the sale is stored the call succeeds; a movement the sink
    /// refuses is logged, not returned.
    pub fn create_sale(&self, request: SaleRequest) -> ServiceResult<Sale> {
        debug!(client_id = %request.client_id, lines = request.items.len(), "Creating sale");

        let client = self
            .deps
            .clients
            .get_client_by_id(&request.client_id)?
            .ok_or_else(|| ServiceError::not_found("Client", &request.client_id))?;
        let sale_type = request
            .sale_type
            .unwrap_or_else(|| sale::default_sale_type(&client));

        let mut items = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let product = self
                .deps
                .catalog
                .get_product_by_id(&line.product_id)?
                .ok_or_else(|| ServiceError::not_found("Product", &line.product_id))?;

            if product.stock < line.quantity {
                // Stock levels are informational here; the sale goes through.
                warn!(
                    product_id = %product.id,
                    stock = product.stock,
                    requested = line.quantity,
                    "Selling more than recorded stock"
                );
            }

            items.push(SaleItemDraft {
                product_id: product.id.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price.unwrap_or(product.precio_venta),
                itbis_amount: product.itbis_exento.then(Money::zero),
            });
        }

        let input = NewSale {
            client_id: client.id.clone(),
            date: request.date.unwrap_or_else(|| self.deps.clock.now()),
            sale_type,
            items,
            cash_amount: request.cash_amount,
            credit_amount: request.credit_amount,
            advance_payment: request.advance_payment,
        };
        let sale = rejected(
            sale::create_sale(input, self.deps.ids.as_ref(), &self.rules),
            "create_sale",
            &client.id,
        )?;
        let sale = self.deps.sales.save(sale, None)?;

        for item in &sale.items {
            self.record_movement(StockMovement {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
                kind: MovementKind::Salida,
                reference: sale.id.clone(),
                date: sale.date,
            });
        }

        info!(
            sale_id = %sale.id,
            sale_type = %sale.sale_type,
            total = %sale.total,
            status = %sale.status,
            "Sale created"
        );
        Ok(sale)
    }

    /// Registers a payment against a stored sale.
    ///
    /// `expected_version` is the version the caller last saw; `None` skips
    /// that check and only guards against writers racing this call.
    pub fn register_payment(
        &self,
        sale_id: &str,
        expected_version: Option<u64>,
        request: PaymentRequest,
    ) -> ServiceResult<Sale> {
        debug!(sale_id = %sale_id, amount = %request.amount, method = %request.method, "Registering payment");

        let current = self.load_sale_at(sale_id, expected_version)?;
        let draft = PaymentDraft {
            amount: request.amount,
            method: request.method,
            date: request.date.unwrap_or_else(|| self.deps.clock.now()),
            reference: request.reference,
        };
        let next = rejected(
            payment::add_payment(&current, draft, self.deps.ids.as_ref()),
            "register_payment",
            sale_id,
        )?;
        let saved = self.deps.sales.save(next, Some(current.version))?;

        info!(
            sale_id = %saved.id,
            remaining = %saved.remaining_balance,
            status = %saved.status,
            "Payment registered"
        );
        Ok(saved)
    }

    pub fn cancel_sale(&self, sale_id: &str, expected_version: Option<u64>) -> ServiceResult<Sale> {
        debug!(sale_id = %sale_id, "Cancelling sale");

        let current = self.load_sale_at(sale_id, expected_version)?;
        let next = rejected(sale::cancel_sale(&current), "cancel_sale", sale_id)?;
        let saved = self.deps.sales.save(next, Some(current.version))?;

        info!(sale_id = %saved.id, "Sale cancelled");
        Ok(saved)
    }

    // =========================================================================
    // Credit Notes
    // =========================================================================

    pub fn get_credit_note(&self, note_id: &str) -> ServiceResult<CreditNote> {
        self.deps
            .credit_notes
            .get(note_id)?
            .ok_or_else(|| ServiceError::not_found("CreditNote", note_id))
    }

    pub fn list_credit_notes(&self) -> ServiceResult<Vec<CreditNote>> {
        self.deps.credit_notes.list()
    }

    /// Number of stored notes, whatever their status.
    pub fn credit_note_count(&self) -> ServiceResult<usize> {
        self.deps.credit_notes.count()
    }

    /// Numbers and stores a new pending credit note.
    pub fn issue_credit_note(&self, request: CreditNoteRequest) -> ServiceResult<CreditNote> {
        debug!(client_id = %request.client_id, tipo = ?request.tipo, "Issuing credit note");

        self.deps
            .clients
            .get_client_by_id(&request.client_id)?
            .ok_or_else(|| ServiceError::not_found("Client", &request.client_id))?;

        if let Some(sale_id) = request.factura_original_id.as_deref() {
            let original = self.get_sale(sale_id)?;
            rejected(
                check_note_target(&original, &request.client_id),
                "issue_credit_note",
                sale_id,
            )?;
        }

        let numero = self
            .numbering
            .credit_note_number(self.deps.credit_notes.next_sequence()?);
        let input = NewCreditNote {
            numero,
            client_id: request.client_id,
            factura_original_id: request.factura_original_id,
            tipo: request.tipo,
            motivo: request.motivo,
            fecha: request.fecha.unwrap_or_else(|| self.deps.clock.now()),
            items: request.items,
        };
        let note = rejected(
            credit_note::create_credit_note(input, self.deps.ids.as_ref(), &self.rules),
            "issue_credit_note",
            &self.numbering.credit_note_prefix,
        )?;
        let note = self.deps.credit_notes.save(note, None)?;

        info!(note_id = %note.id, numero = %note.numero, monto = %note.monto_total, "Credit note issued");
        Ok(note)
    }

    /// Applies a pending note, crediting its sale when it references one.
    ///
    /// The note is claimed first (CAS on `Pendiente`), so a note cancelled
    /// or deleted meanwhile never reaches the sale. The sale is then saved
    /// with CAS on its version; if that fails the note goes back to
    /// `Pendiente` and the sale's error is returned.
    pub fn apply_credit_note(&self, note_id: &str) -> ServiceResult<CreditNote> {
        debug!(note_id = %note_id, "Applying credit note");

        let note = self.get_credit_note(note_id)?;
        let sale = match note.factura_original_id.as_deref() {
            Some(sale_id) => Some(self.get_sale(sale_id)?),
            None => None,
        };

        let applied = rejected(
            credit_note::apply_credit_note(&note, sale.as_ref(), self.deps.clock.as_ref()),
            "apply_credit_note",
            &note.numero,
        )?;

        let saved = self
            .deps
            .credit_notes
            .save(applied.note, Some(CreditNoteStatus::Pendiente))?;

        if let (Some(before), Some(after)) = (sale.as_ref(), applied.sale) {
            match self.deps.sales.save(after, Some(before.version)) {
                Ok(after) => info!(
                    sale_id = %after.id,
                    remaining = %after.remaining_balance,
                    status = %after.status,
                    "Sale credited"
                ),
                Err(err) => {
                    self.release_note(note);
                    return Err(err);
                }
            }
        }

        if saved.tipo == CreditNoteType::Devolucion {
            for item in &saved.items {
                if let Some(product_id) = &item.product_id {
                    self.record_movement(StockMovement {
                        product_id: product_id.clone(),
                        quantity: item.cantidad,
                        kind: MovementKind::Entrada,
                        reference: saved.id.clone(),
                        date: saved.fecha_aplicacion.unwrap_or(saved.fecha),
                    });
                }
            }
        }

        info!(note_id = %saved.id, numero = %saved.numero, "Credit note applied");
        Ok(saved)
    }

    pub fn cancel_credit_note(&self, note_id: &str) -> ServiceResult<CreditNote> {
        let note = self.get_credit_note(note_id)?;
        let cancelled = rejected(
            credit_note::cancel_credit_note(&note),
            "cancel_credit_note",
            &note.numero,
        )?;
        let saved = self
            .deps
            .credit_notes
            .save(cancelled, Some(CreditNoteStatus::Pendiente))?;

        info!(note_id = %saved.id, numero = %saved.numero, "Credit note cancelled");
        Ok(saved)
    }

    /// Deletes a pending note. Its sale is never touched.
    ///
    /// Storage re-checks `Pendiente`, so a note applied meanwhile stays.
    pub fn delete_credit_note(&self, note_id: &str) -> ServiceResult<()> {
        let note = self.get_credit_note(note_id)?;
        rejected(
            credit_note::ensure_deletable(&note),
            "delete_credit_note",
            &note.numero,
        )?;
        self.deps
            .credit_notes
            .delete(note_id, CreditNoteStatus::Pendiente)?;

        info!(note_id = %note_id, numero = %note.numero, "Credit note deleted");
        Ok(())
    }

    // =========================================================================
    // Reports
    // =========================================================================

    pub fn client_balance(&self, client_id: &str) -> ServiceResult<ClientBalance> {
        let sales = self.deps.sales.list_by_client(client_id)?;
        Ok(report::client_balance(&sales, client_id))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Puts a claimed note back to `Pendiente` after its sale could not be saved.
    fn release_note(&self, pending: CreditNote) {
        let note_id = pending.id.clone();
        if let Err(e) = self
            .deps
            .credit_notes
            .save(pending, Some(CreditNoteStatus::Aplicada))
        {
            error!(?e, note_id = %note_id, "Failed to release credit note; it stays Aplicada without credit");
        } else {
            warn!(note_id = %note_id, "Credit note released after sale save failed");
        }
    }

    fn record_movement(&self, movement: StockMovement) {
        let (product_id, reference) = (movement.product_id.clone(), movement.reference.clone());
        if let Err(e) = self.deps.stock.record(movement) {
            error!(?e, product_id = %product_id, reference = %reference, "Failed to record stock movement");
        }
    }

    fn load_sale_at(&self, sale_id: &str, expected_version: Option<u64>) -> ServiceResult<Sale> {
        let sale = self.get_sale(sale_id)?;
        match expected_version {
            Some(expected) if expected != sale.version => {
                warn!(sale_id = %sale_id, expected, actual = sale.version, "Stale sale version");
                Err(ServiceError::version_conflict("Sale", sale_id, expected, sale.version))
            }
            _ => Ok(sale),
        }
    }
}

/// A note may only point at an open sale of the same client.
fn check_note_target(sale: &Sale, client_id: &str) -> CoreResult<()> {
    if sale.client_id != client_id {
        return Err(ValidationError::mismatch("client_id", &sale.client_id, client_id).into());
    }
    if sale.cancelled {
        return Err(CoreError::invalid_state(
            "Sale",
            &sale.id,
            sale.status.to_string(),
            "issue credit note",
        ));
    }
    Ok(())
}

/// Logs a rule rejection and lifts it into a service error.
fn rejected<T>(result: CoreResult<T>, operation: &'static str, subject: &str) -> ServiceResult<T> {
    result.map_err(|err| {
        warn!(operation, subject = %subject, error = %err, "Ledger rule rejected operation");
        ServiceError::Core(err)
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
