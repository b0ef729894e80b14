//! # Checkout Cart
//!
//! The counter's cart and the three-state checkout it drives.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Checkout States                                   │
//! │                                                                         │
//! │   ┌──────────────┐  begin_payment(tender)  ┌────────────────────┐       │
//! │   │ BuildingCart │ ──────────────────────► │  AwaitingPayment   │       │
//! │   │  add_line    │ ◄────────────────────── │  summary()         │       │
//! │   │  remove_line │     back_to_cart()      │                    │       │
//! │   └──────▲───────┘                         └─────────┬──────────┘       │
//! │          │                                           │ mark_settled()   │
//! │          │ reset()              cancel() from any    ▼                  │
//! │          │                      state → BuildingCart ┌──────────┐       │
//! │          └────────────────────────────────────────── │ Settled  │       │
//! │                                                      └──────────┘       │
//! │                                                                         │
//! │  Persistence (stock, bill, ledger, profit, dues) is the settlement      │
//! │  command's job; this type only guards the transitions.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Check
//! Lines are checked against the product's stock when added, counting what
//! the cart already holds for the same product. Settlement re-checks
//! against the store with a guarded decrement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{BillLine, LedgerAccount, Product, SellUnit};
use crate::validation::{normalize_customer_name, validate_price, validate_quantity};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Checkout State
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    BuildingCart,
    AwaitingPayment,
    Settled,
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CheckoutState::BuildingCart => "building cart",
            CheckoutState::AwaitingPayment => "awaiting payment",
            CheckoutState::Settled => "settled",
        };
        f.write_str(label)
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// One line in the cart. Prices are frozen when the line is added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub product_name: String,
    pub unit: SellUnit,
    pub quantity: i64,
    pub unit_price: Money,
    pub unit_cost: Money,
    /// Tabs taken from stock by one unit of this line.
    pub units_per: i64,
}

impl CartLine {
    fn from_product(product: &Product, quantity: i64, unit: SellUnit) -> Self {
        CartLine {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            unit,
            quantity,
            unit_price: product.unit_price(unit),
            unit_cost: product.unit_cost(unit),
            units_per: product.units_per(unit),
        }
    }

    /// `unit_price × quantity`.
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// Tabs this line removes from stock.
    #[inline]
    pub fn stock_units(&self) -> i64 {
        self.quantity * self.units_per
    }

    pub fn to_bill_line(&self) -> BillLine {
        BillLine {
            product_id: self.product_id.clone(),
            product_name: self.product_name.clone(),
            unit: self.unit,
            quantity: self.quantity,
            unit_price: self.unit_price,
            unit_cost: self.unit_cost,
            subtotal: self.subtotal(),
            stock_units: self.stock_units(),
        }
    }
}

// =============================================================================
// Tender & Payment Summary
// =============================================================================

/// What the customer hands over at the payment step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Tender {
    #[serde(default)]
    pub customer_name: String,
    pub account: LedgerAccount,
    pub cash_given: Money,
}

/// Totals shown on the payment confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub total: Money,
    pub cash_given: Money,
    /// Credited to the ledger: `min(cash_given, total)`.
    pub amount_received: Money,
    /// `cash_given − total`. Negative is still owed, positive is change.
    pub remaining_balance: Money,
}

impl PaymentSummary {
    pub fn new(total: Money, cash_given: Money) -> Self {
        PaymentSummary {
            total,
            cash_given,
            amount_received: cash_given.min(total),
            remaining_balance: cash_given - total,
        }
    }

    /// Whether the customer left owing money.
    #[inline]
    pub fn is_short(&self) -> bool {
        self.remaining_balance.is_negative()
    }
}

// =============================================================================
// Checkout
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    pub state: CheckoutState,
    pub lines: Vec<CartLine>,
    pub tender: Option<Tender>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Checkout {
    pub fn new(now: DateTime<Utc>) -> Self {
        Checkout {
            state: CheckoutState::BuildingCart,
            lines: Vec::new(),
            tender: None,
            created_at: now,
        }
    }

    fn require(&self, expected: CheckoutState) -> CoreResult<()> {
        if self.state != expected {
            return Err(CoreError::InvalidCheckoutState {
                expected: expected.to_string(),
                actual: self.state.to_string(),
            });
        }
        Ok(())
    }

    /// Tabs of `product_id` already in the cart.
    pub fn units_in_cart(&self, product_id: &str) -> i64 {
        self.lines
            .iter()
            .filter(|l| l.product_id == product_id)
            .map(CartLine::stock_units)
            .sum()
    }

    /// Adds `quantity` of `unit` of `product`, merging with an existing
    /// line for the same product and unit.
    ///
    /// ## Example
    /// ```rust
    /// use apotheca_core::{Checkout, Money, Product, SellUnit};
    /// use chrono::{NaiveDate, Utc};
    ///
    /// let product = Product {
    ///     id: "p1".into(), name: "Panadol".into(), company: "GSK".into(),
    ///     stock_units: 50, tabs_per_pack: 10,
    ///     purchase_price: Money::from_rupees(40), selling_price: Money::from_rupees(50),
    ///     expiry_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
    ///     vendor_id: None, batch: None, generic_name: None,
    ///     created_at: Utc::now(), updated_at: Utc::now(),
    /// };
    /// let mut checkout = Checkout::new(Utc::now());
    /// checkout.add_line(&product, 2, SellUnit::Pack).unwrap();
    /// assert_eq!(checkout.total(), Money::from_rupees(100));
    /// ```
    pub fn add_line(&mut self, product: &Product, quantity: i64, unit: SellUnit) -> CoreResult<()> {
        self.require(CheckoutState::BuildingCart)?;

        if product.id.is_empty() {
            return Err(ValidationError::InvalidLine.into());
        }
        // Keeps line subtotals and the cart total inside i64
        validate_price("sellingPrice", product.selling_price)?;
        validate_quantity(quantity).map_err(|e| match e {
            ValidationError::OutOfRange { .. } => CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            },
            other => other.into(),
        })?;

        let existing = self
            .lines
            .iter()
            .position(|l| l.product_id == product.id && l.unit == unit);

        let merged_quantity = match existing {
            Some(idx) => self.lines[idx].quantity + quantity,
            None => quantity,
        };
        if merged_quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: merged_quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }
        if existing.is_none() && self.lines.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        let requested = self.units_in_cart(&product.id) + quantity * product.units_per(unit);
        if requested > product.stock_units {
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock_units,
                requested,
            });
        }

        match existing {
            Some(idx) => self.lines[idx].quantity = merged_quantity,
            None => self
                .lines
                .push(CartLine::from_product(product, quantity, unit)),
        }
        Ok(())
    }

    /// Removes the line at `index`.
    pub fn remove_line(&mut self, index: usize) -> CoreResult<CartLine> {
        self.require(CheckoutState::BuildingCart)?;
        if index >= self.lines.len() {
            return Err(CoreError::LineNotFound(index));
        }
        Ok(self.lines.remove(index))
    }

    /// Sum of line subtotals.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Captures the tender and moves to AwaitingPayment.
    ///
    /// A blank customer name becomes "Walking Customer".
    pub fn begin_payment(&mut self, tender: Tender) -> CoreResult<PaymentSummary> {
        self.require(CheckoutState::BuildingCart)?;
        if self.lines.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        validate_price("cashGiven", tender.cash_given).map_err(|e| {
            let reason = match e {
                ValidationError::OutOfRange { .. } => "cash given is too large",
                _ => "cash given cannot be negative",
            };
            CoreError::InvalidPaymentAmount {
                reason: reason.to_string(),
            }
        })?;

        let tender = Tender {
            customer_name: normalize_customer_name(&tender.customer_name),
            ..tender
        };
        let summary = PaymentSummary::new(self.total(), tender.cash_given);
        self.tender = Some(tender);
        self.state = CheckoutState::AwaitingPayment;
        Ok(summary)
    }

    /// Payment summary for the captured tender.
    pub fn summary(&self) -> CoreResult<PaymentSummary> {
        self.require(CheckoutState::AwaitingPayment)?;
        let cash_given = self
            .tender
            .as_ref()
            .map(|t| t.cash_given)
            .unwrap_or_default();
        Ok(PaymentSummary::new(self.total(), cash_given))
    }

    /// Leaves the payment step, keeping the lines.
    pub fn back_to_cart(&mut self) -> CoreResult<()> {
        self.require(CheckoutState::AwaitingPayment)?;
        self.tender = None;
        self.state = CheckoutState::BuildingCart;
        Ok(())
    }

    /// Discards everything and returns to an empty BuildingCart.
    pub fn cancel(&mut self) {
        self.lines.clear();
        self.tender = None;
        self.state = CheckoutState::BuildingCart;
    }

    pub fn mark_settled(&mut self) -> CoreResult<()> {
        self.require(CheckoutState::AwaitingPayment)?;
        self.state = CheckoutState::Settled;
        Ok(())
    }

    /// Starts a fresh cart after settlement.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        *self = Checkout::new(now);
    }

    pub fn to_bill_lines(&self) -> Vec<BillLine> {
        self.lines.iter().map(CartLine::to_bill_line).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn product(id: &str, packs: i64, tabs_per_pack: i64, selling_rupees: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            company: "GSK".to_string(),
            stock_units: packs * tabs_per_pack,
            tabs_per_pack,
            purchase_price: Money::from_rupees(selling_rupees - 10),
            selling_price: Money::from_rupees(selling_rupees),
            expiry_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            vendor_id: None,
            batch: None,
            generic_name: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn tender(cash_rupees: i64) -> Tender {
        Tender {
            customer_name: String::new(),
            account: LedgerAccount::Cash,
            cash_given: Money::from_rupees(cash_rupees),
        }
    }

    #[test]
    fn test_total_is_sum_of_subtotals() {
        let mut c = Checkout::new(Utc::now());
        c.add_line(&product("a", 5, 10, 50), 2, SellUnit::Pack).unwrap();
        c.add_line(&product("b", 5, 10, 100), 3, SellUnit::Tab).unwrap();

        let sum: Money = c.lines.iter().map(|l| l.subtotal()).sum();
        assert_eq!(c.total(), sum);
        assert_eq!(c.total(), Money::from_rupees(100 + 30));
    }

    #[test]
    fn test_merges_same_product_and_unit() {
        let p = product("a", 5, 10, 50);
        let mut c = Checkout::new(Utc::now());
        c.add_line(&p, 1, SellUnit::Pack).unwrap();
        c.add_line(&p, 2, SellUnit::Pack).unwrap();
        c.add_line(&p, 4, SellUnit::Tab).unwrap();

        assert_eq!(c.lines.len(), 2);
        assert_eq!(c.lines[0].quantity, 3);
        assert_eq!(c.units_in_cart("a"), 34);
    }

    #[test]
    fn test_stock_checked_at_add_time() {
        let p = product("a", 2, 10, 50);
        let mut c = Checkout::new(Utc::now());
        c.add_line(&p, 15, SellUnit::Tab).unwrap();

        let err = c.add_line(&p, 1, SellUnit::Pack).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 20,
                requested: 25,
                ..
            }
        ));
        assert_eq!(c.lines.len(), 1);
    }

    #[test]
    fn test_price_above_bound_cannot_enter_cart() {
        let mut p = product("a", 5, 10, 50);
        p.selling_price = Money::from_minor(9_223_372_036_854_775_807);
        let mut c = Checkout::new(Utc::now());
        assert!(matches!(
            c.add_line(&p, 2, SellUnit::Pack),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert!(c.is_empty());
    }

    #[test]
    fn test_full_cart_at_price_bound_fits() {
        let mut c = Checkout::new(Utc::now());
        for i in 0..MAX_CART_ITEMS {
            let mut p = product(&i.to_string(), MAX_ITEM_QUANTITY, 1, 50);
            p.selling_price = crate::validation::MAX_PRICE;
            c.add_line(&p, MAX_ITEM_QUANTITY, SellUnit::Pack).unwrap();
        }
        assert!(c.total().is_positive());
    }

    #[test]
    fn test_invalid_quantity() {
        let mut c = Checkout::new(Utc::now());
        let err = c.add_line(&product("a", 5, 10, 50), 0, SellUnit::Pack).unwrap_err();
        assert_eq!(err.to_string(), "Please select a valid product and quantity.");
    }

    #[test]
    fn test_begin_payment_requires_items() {
        let mut c = Checkout::new(Utc::now());
        assert!(matches!(c.begin_payment(tender(10)), Err(CoreError::EmptyCart)));
        assert_eq!(c.state, CheckoutState::BuildingCart);
    }

    #[test]
    fn test_short_payment_summary() {
        let mut c = Checkout::new(Utc::now());
        c.add_line(&product("a", 5, 10, 50), 2, SellUnit::Pack).unwrap();

        let summary = c.begin_payment(tender(80)).unwrap();
        assert_eq!(summary.total, Money::from_rupees(100));
        assert_eq!(summary.amount_received, Money::from_rupees(80));
        assert_eq!(summary.remaining_balance, Money::from_rupees(-20));
        assert!(summary.is_short());
        assert_eq!(
            c.tender.as_ref().unwrap().customer_name,
            crate::DEFAULT_CUSTOMER_NAME
        );
    }

    #[test]
    fn test_overpayment_receives_total_only() {
        let summary = PaymentSummary::new(Money::from_rupees(100), Money::from_rupees(150));
        assert_eq!(summary.amount_received, Money::from_rupees(100));
        assert_eq!(summary.remaining_balance, Money::from_rupees(50));
        assert!(!summary.is_short());
    }

    #[test]
    fn test_transitions() {
        let mut c = Checkout::new(Utc::now());
        c.add_line(&product("a", 5, 10, 50), 1, SellUnit::Pack).unwrap();
        c.begin_payment(tender(50)).unwrap();

        // Lines are frozen while awaiting payment.
        assert!(c.add_line(&product("b", 5, 10, 50), 1, SellUnit::Pack).is_err());
        assert!(c.remove_line(0).is_err());

        c.back_to_cart().unwrap();
        assert_eq!(c.state, CheckoutState::BuildingCart);
        assert!(c.tender.is_none());
        assert_eq!(c.lines.len(), 1);

        c.begin_payment(tender(50)).unwrap();
        c.mark_settled().unwrap();
        assert_eq!(c.state, CheckoutState::Settled);
        assert!(c.mark_settled().is_err());

        c.reset(Utc::now());
        assert_eq!(c.state, CheckoutState::BuildingCart);
        assert!(c.is_empty());
    }

    #[test]
    fn test_cancel_discards_cart() {
        let mut c = Checkout::new(Utc::now());
        c.add_line(&product("a", 5, 10, 50), 1, SellUnit::Pack).unwrap();
        c.begin_payment(tender(50)).unwrap();
        c.cancel();
        assert_eq!(c.state, CheckoutState::BuildingCart);
        assert!(c.is_empty());
        assert!(c.tender.is_none());
    }

    #[test]
    fn test_remove_line() {
        let mut c = Checkout::new(Utc::now());
        c.add_line(&product("a", 5, 10, 50), 1, SellUnit::Pack).unwrap();
        assert!(matches!(c.remove_line(3), Err(CoreError::LineNotFound(3))));
        let removed = c.remove_line(0).unwrap();
        assert_eq!(removed.product_id, "a");
        assert!(c.is_empty());
    }

    #[test]
    fn test_bill_lines_snapshot() {
        let mut c = Checkout::new(Utc::now());
        c.add_line(&product("a", 5, 10, 50), 5, SellUnit::Tab).unwrap();
        let lines = c.to_bill_lines();
        assert_eq!(lines[0].unit_price, Money::from_rupees(5));
        assert_eq!(lines[0].subtotal, Money::from_rupees(25));
        assert_eq!(lines[0].stock_units, 5);
    }
}
