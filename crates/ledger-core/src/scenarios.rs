//! End-to-end ledger scenarios and balance properties.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use crate::clock::FixedClock;
use crate::credit_note::{apply_credit_note, create_credit_note, CreditNoteItemDraft, NewCreditNote};
use crate::error::{CoreError, ValidationError};
use crate::ids::SequentialIdGenerator;
use crate::money::Money;
use crate::payment::{add_payment, PaymentDraft};
use crate::sale::{create_sale, NewSale, SaleItemDraft};
use crate::status::derive_status;
use crate::types::{CreditNoteType, PaymentMethod, Sale, SaleStatus, SaleType};
use crate::validation::LedgerRules;

fn clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2024, 7, 15, 8, 0, 0).unwrap())
}

fn untaxed_sale(sale_type: SaleType, total: Money) -> NewSale {
    NewSale {
        client_id: "c-ferreteria".to_string(),
        date: clock().0,
        sale_type,
        items: vec![SaleItemDraft {
            product_id: "p-cemento".to_string(),
            quantity: 1,
            unit_price: total,
            itbis_amount: Some(Money::zero()),
        }],
        cash_amount: None,
        credit_amount: None,
        advance_payment: None,
    }
}

fn payment(amount: Money) -> PaymentDraft {
    PaymentDraft {
        amount,
        method: PaymentMethod::Efectivo,
        date: clock().0,
        reference: None,
    }
}

fn discount_note(sale: &Sale, amount: Money, ids: &SequentialIdGenerator) -> crate::types::CreditNote {
    create_credit_note(
        NewCreditNote {
            numero: format!("NC-{}", ids.issued() + 1),
            client_id: sale.client_id.clone(),
            factura_original_id: Some(sale.id.clone()),
            tipo: CreditNoteType::Descuento,
            motivo: None,
            fecha: clock().0,
            items: vec![CreditNoteItemDraft {
                product_id: None,
                descripcion: "Descuento".to_string(),
                cantidad: 1,
                precio_unitario: amount,
                itbis: Some(Money::zero()),
            }],
        },
        ids,
        &LedgerRules::default(),
    )
    .unwrap()
}

fn assert_balanced(sale: &Sale) {
    assert_eq!(sale.remaining_balance, sale.total - sale.total_paid);
    assert!(sale.total_paid <= sale.total);
    assert!(!sale.remaining_balance.is_negative());
    assert_eq!(
        sale.total_paid,
        sale.initial_paid() + sale.payments_total() + sale.credited_total()
    );
    assert_eq!(
        sale.status,
        derive_status(sale.sale_type, sale.total, sale.total_paid, sale.cancelled)
    );
}

#[test]
fn scenario_a_cash_sale() {
    let input = NewSale {
        items: vec![SaleItemDraft {
            product_id: "p-cemento".to_string(),
            quantity: 2,
            unit_price: Money::from_pesos(100),
            itbis_amount: None,
        }],
        ..untaxed_sale(SaleType::Cash, Money::zero())
    };
    let sale = create_sale(input, &SequentialIdGenerator::new("v"), &LedgerRules::default()).unwrap();

    assert_eq!(sale.itbis_total, Money::from_pesos(36));
    assert_eq!(sale.total, Money::from_pesos(236));
    assert_eq!(sale.status, SaleStatus::Completed);
    assert_eq!(sale.remaining_balance, Money::zero());
    assert_balanced(&sale);
}

#[test]
fn scenario_b_and_c_credit_sale_paid_off() {
    let ids = SequentialIdGenerator::new("id");
    let rules = LedgerRules::default();
    let sale = create_sale(untaxed_sale(SaleType::Credit, Money::from_pesos(1000)), &ids, &rules).unwrap();

    let sale = add_payment(&sale, payment(Money::from_pesos(400)), &ids).unwrap();
    assert_eq!(sale.total_paid, Money::from_pesos(400));
    assert_eq!(sale.remaining_balance, Money::from_pesos(600));
    assert_eq!(sale.status, SaleStatus::Partial);
    assert_balanced(&sale);

    let sale = add_payment(&sale, payment(Money::from_pesos(600)), &ids).unwrap();
    assert_eq!(sale.remaining_balance, Money::zero());
    assert_eq!(sale.status, SaleStatus::Completed);
    assert_balanced(&sale);

    assert!(matches!(
        add_payment(&sale, payment(Money::from_cents(1)), &ids),
        Err(CoreError::Overpayment { .. })
    ));
}

#[test]
fn scenario_d_mixed_sale_split() {
    let ids = SequentialIdGenerator::new("id");
    let rules = LedgerRules::default();

    let mut input = untaxed_sale(SaleType::Mixed, Money::from_pesos(1000));
    input.cash_amount = Some(Money::from_pesos(300));
    input.credit_amount = Some(Money::from_pesos(700));
    let sale = create_sale(input.clone(), &ids, &rules).unwrap();
    assert_balanced(&sale);

    input.credit_amount = Some(Money::from_pesos(600));
    assert!(matches!(
        create_sale(input, &ids, &rules),
        Err(CoreError::Validation(ValidationError::Mismatch { .. }))
    ));
}

#[test]
fn scenario_e_credit_note_reduces_payable_balance() {
    let ids = SequentialIdGenerator::new("id");
    let rules = LedgerRules::default();
    let sale = create_sale(untaxed_sale(SaleType::Credit, Money::from_pesos(1000)), &ids, &rules).unwrap();
    let sale = add_payment(&sale, payment(Money::from_pesos(400)), &ids).unwrap();
    assert_eq!(sale.remaining_balance, Money::from_pesos(600));

    let note = discount_note(&sale, Money::from_pesos(150), &ids);
    let applied = apply_credit_note(&note, Some(&sale), &clock()).unwrap();
    let sale = applied.sale.unwrap();

    assert_eq!(sale.remaining_balance, Money::from_pesos(450));
    assert_eq!(sale.payments.len(), 1);
    assert_balanced(&sale);

    assert!(matches!(
        add_payment(&sale, payment(Money::from_pesos(600)), &ids),
        Err(CoreError::Overpayment { .. })
    ));
    let sale = add_payment(&sale, payment(Money::from_pesos(450)), &ids).unwrap();
    assert_eq!(sale.status, SaleStatus::Completed);
    assert_balanced(&sale);
}

/// A settlement step in a random history.
#[derive(Debug, Clone)]
enum Step {
    Pay(i64),
    Credit(i64),
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (1i64..200_000).prop_map(Step::Pay),
        1 => (1i64..200_000).prop_map(Step::Credit),
    ]
}

fn arb_sale_type() -> impl Strategy<Value = SaleType> {
    prop_oneof![Just(SaleType::Cash), Just(SaleType::Credit), Just(SaleType::Mixed)]
}

proptest! {
    #[test]
    fn balance_invariants_hold_after_any_history(
        sale_type in arb_sale_type(),
        total_cents in 1i64..1_000_000,
        cash_share in 0i64..=100,
        steps in prop::collection::vec(arb_step(), 0..30),
    ) {
        let ids = SequentialIdGenerator::new("id");
        let total = Money::from_cents(total_cents);
        let mut input = untaxed_sale(sale_type, total);
        if sale_type == SaleType::Mixed {
            let cash = Money::from_cents(total_cents * cash_share / 100);
            input.cash_amount = Some(cash);
            input.credit_amount = Some(total - cash);
        }

        let mut sale = create_sale(input, &ids, &LedgerRules::default()).unwrap();
        assert_balanced(&sale);

        for step in steps {
            let before = sale.clone();
            let result = match step {
                Step::Pay(cents) => add_payment(&sale, payment(Money::from_cents(cents)), &ids),
                Step::Credit(cents) => {
                    let note = discount_note(&sale, Money::from_cents(cents), &ids);
                    apply_credit_note(&note, Some(&sale), &clock())
                        .map(|applied| applied.sale.unwrap())
                }
            };

            match result {
                Ok(next) => {
                    prop_assert_eq!(next.version, before.version + 1);
                    sale = next;
                }
                Err(CoreError::Overpayment { amount, remaining, .. }) => {
                    prop_assert!(amount > remaining);
                    prop_assert_eq!(&sale, &before);
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
            assert_balanced(&sale);
        }
    }

    #[test]
    fn derive_status_is_deterministic(
        sale_type in arb_sale_type(),
        total in 0i64..1_000_000,
        paid in 0i64..1_000_000,
        cancelled in any::<bool>(),
    ) {
        let paid = Money::from_cents(paid.min(total));
        let total = Money::from_cents(total);
        prop_assert_eq!(
            derive_status(sale_type, total, paid, cancelled),
            derive_status(sale_type, total, paid, cancelled)
        );
    }
}
