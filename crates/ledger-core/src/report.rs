//! # Ledger Reports
//!
//! Read-only aggregations over sales. Cancelled sales are left out of
//! receivables; payment-method totals only count registered payments, never
//! credit applications or the settlement recorded at creation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{PaymentMethod, Sale};

/// Accounts-receivable position of one client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ClientBalance {
    pub client_id: String,
    pub total_sold: Money,
    pub total_paid: Money,
    /// Part of `total_paid` that came from credit notes.
    pub total_credited: Money,
    pub outstanding: Money,
    /// Sales with something still owed.
    pub open_sales: usize,
}

/// Totals registered payments per method.
pub fn payment_method_totals(sales: &[Sale]) -> BTreeMap<PaymentMethod, Money> {
    let mut totals = BTreeMap::new();
    for payment in sales.iter().flat_map(|s| s.payments.iter()) {
        *totals.entry(payment.method).or_insert_with(Money::zero) += payment.amount;
    }
    totals
}

/// Total credit applied across sales.
pub fn credit_applied_total(sales: &[Sale]) -> Money {
    sales.iter().map(Sale::credited_total).sum()
}

/// Receivables for one client, ignoring cancelled sales.
pub fn client_balance(sales: &[Sale], client_id: &str) -> ClientBalance {
    sales
        .iter()
        .filter(|s| s.client_id == client_id && !s.cancelled)
        .fold(
            ClientBalance {
                client_id: client_id.to_string(),
                ..ClientBalance::default()
            },
            |mut acc, sale| {
                acc.total_sold += sale.total;
                acc.total_paid += sale.total_paid;
                acc.total_credited += sale.credited_total();
                acc.outstanding += sale.remaining_balance;
                if sale.remaining_balance.is_positive() {
                    acc.open_sales += 1;
                }
                acc
            },
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::credit_note::{apply_credit_note, create_credit_note, CreditNoteItemDraft, NewCreditNote};
    use crate::ids::SequentialIdGenerator;
    use crate::payment::{add_payment, PaymentDraft};
    use crate::sale::{cancel_sale, create_sale, NewSale, SaleItemDraft};
    use crate::types::{CreditNoteType, SaleType};
    use crate::validation::LedgerRules;
    use chrono::Utc;

    fn credit_sale(ids: &SequentialIdGenerator, client: &str, pesos: i64) -> Sale {
        create_sale(
            NewSale {
                client_id: client.to_string(),
                date: Utc::now(),
                sale_type: SaleType::Credit,
                items: vec![SaleItemDraft {
                    product_id: "p-1".to_string(),
                    quantity: 1,
                    unit_price: Money::from_pesos(pesos),
                    itbis_amount: Some(Money::zero()),
                }],
                cash_amount: None,
                credit_amount: None,
                advance_payment: None,
            },
            ids,
            &LedgerRules::default(),
        )
        .unwrap()
    }

    fn pay(sale: &Sale, ids: &SequentialIdGenerator, pesos: i64, method: PaymentMethod) -> Sale {
        add_payment(
            sale,
            PaymentDraft {
                amount: Money::from_pesos(pesos),
                method,
                date: Utc::now(),
                reference: None,
            },
            ids,
        )
        .unwrap()
    }

    fn credited(sale: &Sale, ids: &SequentialIdGenerator, pesos: i64) -> Sale {
        let note = create_credit_note(
            NewCreditNote {
                numero: "NC-1".to_string(),
                client_id: sale.client_id.clone(),
                factura_original_id: Some(sale.id.clone()),
                tipo: CreditNoteType::Descuento,
                motivo: None,
                fecha: Utc::now(),
                items: vec![CreditNoteItemDraft {
                    product_id: None,
                    descripcion: "Descuento".to_string(),
                    cantidad: 1,
                    precio_unitario: Money::from_pesos(pesos),
                    itbis: Some(Money::zero()),
                }],
            },
            ids,
            &LedgerRules::default(),
        )
        .unwrap();
        apply_credit_note(&note, Some(sale), &FixedClock(Utc::now()))
            .unwrap()
            .sale
            .unwrap()
    }

    #[test]
    fn test_payment_method_totals_exclude_credit() {
        let ids = SequentialIdGenerator::new("id");
        let a = pay(&credit_sale(&ids, "c-1", 1000), &ids, 400, PaymentMethod::Efectivo);
        let a = credited(&a, &ids, 100);
        let b = pay(&credit_sale(&ids, "c-2", 500), &ids, 200, PaymentMethod::Efectivo);
        let b = pay(&b, &ids, 50, PaymentMethod::Cheque);

        let totals = payment_method_totals(&[a.clone(), b.clone()]);
        assert_eq!(totals.get(&PaymentMethod::Efectivo), Some(&Money::from_pesos(600)));
        assert_eq!(totals.get(&PaymentMethod::Cheque), Some(&Money::from_pesos(50)));
        assert_eq!(totals.get(&PaymentMethod::Tarjeta), None);

        assert_eq!(credit_applied_total(&[a, b]), Money::from_pesos(100));
    }

    #[test]
    fn test_client_balance() {
        let ids = SequentialIdGenerator::new("id");
        let open = pay(&credit_sale(&ids, "c-1", 1000), &ids, 400, PaymentMethod::Transferencia);
        let open = credited(&open, &ids, 100);
        let settled = pay(&credit_sale(&ids, "c-1", 300), &ids, 300, PaymentMethod::Tarjeta);
        let cancelled = cancel_sale(&credit_sale(&ids, "c-1", 700)).unwrap();
        let foreign = credit_sale(&ids, "c-2", 50);

        let balance = client_balance(&[open, settled, cancelled, foreign], "c-1");

        assert_eq!(balance.total_sold, Money::from_pesos(1300));
        assert_eq!(balance.total_paid, Money::from_pesos(800));
        assert_eq!(balance.total_credited, Money::from_pesos(100));
        assert_eq!(balance.outstanding, Money::from_pesos(500));
        assert_eq!(balance.open_sales, 1);
    }
}
