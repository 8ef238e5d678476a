//! # Domain Types
//!
//! Core domain types used throughout the sales ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌─────────────────┐      │
//! │  │      Sale       │   │     Payment      │   │   CreditNote    │      │
//! │  │  ─────────────  │   │  ──────────────  │   │  ─────────────  │      │
//! │  │  items[]        │──►│  amount          │   │  items[]        │      │
//! │  │  payments[]     │   │  method          │   │  monto_total    │      │
//! │  │  credit_apps[]  │   │  reference       │   │  status         │      │
//! │  │  total_paid     │   └──────────────────┘   │  factura_id ────┼──┐   │
//! │  │  remaining      │                          └─────────────────┘  │   │
//! │  │  status         │◄── CreditApplication ◄────── apply ───────────┘   │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  Collaborator contracts (read only): Client, Product, StockMovement    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//! - A `Sale` owns its items, payments and credit applications.
//! - A `Payment` has no reference back to its sale.
//! - A `CreditNote` refers to a sale by id only (`factura_original_id`);
//!   deleting a note never touches the sale.
//!
//! Balance fields on `Sale` are derived. They are only ever written by the
//! functions in [`crate::sale`], [`crate::payment`] and
//! [`crate::credit_note`], which resum them and call
//! [`crate::status::derive_status`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::{line_subtotal, Money};

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so ITBIS at 18% is 1800 bps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Dominican ITBIS, 18%.
    pub const ITBIS: TaxRate = TaxRate(1800);

    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::ITBIS
    }
}

// =============================================================================
// Sale Type & Status
// =============================================================================

/// How a sale is settled.
///
/// ```text
/// Cash   → paid in full at creation
/// Credit → nothing (or an advance) paid at creation, rest via payments
/// Mixed  → cash_amount paid at creation, credit_amount via payments
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleType {
    Cash,
    Credit,
    Mixed,
}

impl fmt::Display for SaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaleType::Cash => write!(f, "cash"),
            SaleType::Credit => write!(f, "credit"),
            SaleType::Mixed => write!(f, "mixed"),
        }
    }
}

/// Settlement status of a sale. Always produced by
/// [`derive_status`](crate::status::derive_status).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Nothing settled yet.
    Pending,
    /// Partly settled.
    Partial,
    /// Fully settled.
    Completed,
    /// Cancelled by an explicit operation. Terminal.
    Cancelled,
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaleStatus::Pending => write!(f, "pending"),
            SaleStatus::Partial => write!(f, "partial"),
            SaleStatus::Completed => write!(f, "completed"),
            SaleStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// =============================================================================
// Payment
// =============================================================================

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Efectivo,
    Transferencia,
    Tarjeta,
    Cheque,
    Otro,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Efectivo => write!(f, "efectivo"),
            PaymentMethod::Transferencia => write!(f, "transferencia"),
            PaymentMethod::Tarjeta => write!(f, "tarjeta"),
            PaymentMethod::Cheque => write!(f, "cheque"),
            PaymentMethod::Otro => write!(f, "otro"),
        }
    }
}

/// A payment registered against a sale. Immutable once added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub amount: Money,
    pub method: PaymentMethod,
    /// Transfer number, cheque number, card authorisation, etc.
    pub reference: Option<String>,
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale. Frozen at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    /// ITBIS for the whole line, already rounded.
    pub itbis_amount: Money,
}

impl SaleItem {
    /// `quantity × unit_price`.
    #[inline]
    pub fn subtotal(&self) -> Money {
        line_subtotal(self.quantity, self.unit_price)
    }

    /// `quantity × unit_price + itbis_amount`.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.subtotal() + self.itbis_amount
    }
}

// =============================================================================
// Credit Application
// =============================================================================

/// The effect of an applied credit note on a sale.
///
/// Kept apart from `payments` so payment-method reporting only ever sees
/// money that was actually received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreditApplication {
    pub credit_note_id: String,
    pub numero: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    /// Portion of the note that reduced the sale balance.
    pub amount: Money,
    /// Portion that exceeded the balance and stays as client credit.
    pub unapplied: Money,
}

// =============================================================================
// Sale
// =============================================================================

/// A sale and its settlement state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub client_id: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub items: Vec<SaleItem>,
    #[serde(rename = "type")]
    pub sale_type: SaleType,

    /// `Σ quantity × unit_price`.
    pub subtotal: Money,
    /// `Σ itbis_amount`.
    pub itbis_total: Money,
    /// `subtotal + itbis_total`.
    pub total: Money,

    /// Mixed only: portion paid at creation.
    pub cash_amount: Option<Money>,
    /// Mixed only: portion left on account.
    pub credit_amount: Option<Money>,
    /// Credit only: advance received at creation.
    pub advance_payment: Option<Money>,

    pub payments: Vec<Payment>,
    pub credit_applications: Vec<CreditApplication>,

    /// Initial settlement + payments + applied credit.
    pub total_paid: Money,
    /// `total - total_paid`, never negative.
    pub remaining_balance: Money,
    pub status: SaleStatus,
    pub cancelled: bool,

    /// Incremented on every successful mutation. Storage uses it for
    /// compare-and-swap.
    pub version: u64,
}

impl Sale {
    /// Amount settled when the sale was created.
    pub fn initial_paid(&self) -> Money {
        match self.sale_type {
            SaleType::Cash => self.total,
            SaleType::Mixed => self.cash_amount.unwrap_or_default(),
            SaleType::Credit => self.advance_payment.unwrap_or_default(),
        }
    }

    /// Sum of registered payments (excludes initial settlement and credit).
    pub fn payments_total(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// Sum of credit applied against this sale.
    pub fn credited_total(&self) -> Money {
        self.credit_applications.iter().map(|c| c.amount).sum()
    }

    /// Whether another payment could be registered right now.
    pub fn can_accept_payment(&self) -> bool {
        !self.cancelled && self.remaining_balance.is_positive()
    }
}

// =============================================================================
// Credit Note
// =============================================================================

/// Reason a credit note was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CreditNoteType {
    /// Goods returned. Applying it puts stock back.
    Devolucion,
    Descuento,
    Ajuste,
    Anulacion,
}

/// Lifecycle state of a credit note.
///
/// ```text
///              apply
///   Pendiente ───────► Aplicada   (terminal)
///       │
///       │ cancel
///       ▼
///   Cancelada                     (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CreditNoteStatus {
    Pendiente,
    Aplicada,
    Cancelada,
}

impl CreditNoteStatus {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CreditNoteStatus::Pendiente)
    }
}

impl fmt::Display for CreditNoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreditNoteStatus::Pendiente => write!(f, "pendiente"),
            CreditNoteStatus::Aplicada => write!(f, "aplicada"),
            CreditNoteStatus::Cancelada => write!(f, "cancelada"),
        }
    }
}

/// A credit note line. Amounts are computed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreditNoteItem {
    /// Set when the line returns a catalogued product.
    pub product_id: Option<String>,
    pub descripcion: String,
    pub cantidad: i64,
    pub precio_unitario: Money,
    pub subtotal: Money,
    pub itbis: Money,
    pub total: Money,
}

/// A credit note (nota de crédito).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreditNote {
    pub id: String,
    pub numero: String,
    pub client_id: String,
    /// Sale this note corrects, if any. Lookup only.
    pub factura_original_id: Option<String>,
    pub tipo: CreditNoteType,
    pub motivo: Option<String>,
    #[ts(as = "String")]
    pub fecha: DateTime<Utc>,
    pub items: Vec<CreditNoteItem>,
    pub subtotal: Money,
    pub itbis_total: Money,
    /// `Σ item.total`.
    pub monto_total: Money,
    pub status: CreditNoteStatus,
    #[ts(as = "Option<String>")]
    pub fecha_aplicacion: Option<DateTime<Utc>>,
}

// =============================================================================
// Collaborator Contracts
// =============================================================================

/// Client billing preference, used to pre-fill a new sale's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BillingType {
    Contado,
    Credito,
    Mixto,
}

/// Client record as served by the client directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub nombre: String,
    pub billing_type: BillingType,
    /// NCF document type code (e.g. "B01"). Not interpreted here.
    pub ncf_type: String,
}

/// Product record as served by the inventory catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub nombre: String,
    pub precio_venta: Money,
    pub stock: i64,
    /// Exempt products carry no ITBIS.
    #[serde(default)]
    pub itbis_exento: bool,
}

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Stock leaving (sale).
    Salida,
    /// Stock returning (devolución).
    Entrada,
}

/// A stock movement handed to the inventory collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub product_id: String,
    /// Always positive; direction is in `kind`.
    pub quantity: i64,
    pub kind: MovementKind,
    /// Sale id or credit note id that caused the movement.
    pub reference: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate() {
        assert_eq!(TaxRate::ITBIS.bps(), 1800);
        assert!((TaxRate::ITBIS.percentage() - 18.0).abs() < f64::EPSILON);
        assert_eq!(TaxRate::default(), TaxRate::ITBIS);
    }

    #[test]
    fn test_sale_item_totals() {
        let item = SaleItem {
            id: "i-1".to_string(),
            product_id: "p-1".to_string(),
            quantity: 2,
            unit_price: Money::from_pesos(100),
            itbis_amount: Money::from_pesos(36),
        };
        assert_eq!(item.subtotal(), Money::from_pesos(200));
        assert_eq!(item.line_total(), Money::from_pesos(236));
    }

    #[test]
    fn test_credit_note_status_terminal() {
        assert!(!CreditNoteStatus::Pendiente.is_terminal());
        assert!(CreditNoteStatus::Aplicada.is_terminal());
        assert!(CreditNoteStatus::Cancelada.is_terminal());
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Transferencia).unwrap(),
            "\"transferencia\""
        );
        assert_eq!(serde_json::to_string(&SaleStatus::Partial).unwrap(), "\"partial\"");
        assert_eq!(
            serde_json::to_string(&CreditNoteType::Devolucion).unwrap(),
            "\"devolucion\""
        );
    }

    #[test]
    fn test_product_exempt_defaults_to_false() {
        let json = r#"{"id":"p-1","nombre":"Cemento","precioVenta":45000,"stock":10}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert!(!product.itbis_exento);
        assert_eq!(product.precio_venta, Money::from_pesos(450));
    }
}
