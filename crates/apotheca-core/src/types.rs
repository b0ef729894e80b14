//! # Domain Types
//!
//! Core domain types shared by the store, the commands and the reports.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Bill       │   │  LedgerEntry    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │◄──│  items[].id     │   │  account        │       │
//! │  │  stock_units    │   │  total          │──►│  amount (±)     │       │
//! │  │  tabs_per_pack  │   │  cash_given     │   │  reference_id   │       │
//! │  │  vendor_id ─────┼─┐ │  remaining      │   └─────────────────┘       │
//! │  └─────────────────┘ │ └────────┬────────┘                             │
//! │                      │          │ sale_id                              │
//! │  ┌─────────────────┐ │ ┌────────▼────────┐   ┌─────────────────┐       │
//! │  │     Vendor      │◄┘ │ Outstanding     │   │  ProfitEntry    │       │
//! │  │  name, company  │   │ Balance (dues)  │   │  sale_id        │       │
//! │  │  phone          │   │ remaining < 0   │   │  profit         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every stored entity has a store-generated `id`. Relations use ids
//! (`vendor_id`, `sale_id`, `product_id`); names are kept alongside only as
//! display snapshots.
//!
//! ## Stock Unit
//! Stock is counted in tabs (`stock_units`). A product with 5 packs of 10
//! holds 50 units; selling 2 packs removes 20, selling 5 tabs removes 5.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Sell Unit
// =============================================================================

/// Whether a cart line sells whole packs or loose tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SellUnit {
    Pack,
    Tab,
}

impl fmt::Display for SellUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SellUnit::Pack => write!(f, "pack"),
            SellUnit::Tab => write!(f, "tab"),
        }
    }
}

impl FromStr for SellUnit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pack" | "packs" => Ok(SellUnit::Pack),
            "tab" | "tabs" | "tablet" | "tablets" => Ok(SellUnit::Tab),
            _ => Err(ValidationError::NotAllowed {
                field: "unit".to_string(),
                allowed: vec!["pack".to_string(), "tab".to_string()],
            }),
        }
    }
}

// =============================================================================
// Ledger Account
// =============================================================================

/// One of the four payment-method balances.
///
/// The serialized name is also the name of the account's collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum LedgerAccount {
    Cash,
    JazzCash,
    EasyPesa,
    BankTransfer,
}

impl LedgerAccount {
    /// Every account, in display order.
    pub const ALL: [LedgerAccount; 4] = [
        LedgerAccount::Cash,
        LedgerAccount::JazzCash,
        LedgerAccount::EasyPesa,
        LedgerAccount::BankTransfer,
    ];

    /// Collection holding this account's journal.
    pub const fn collection(&self) -> &'static str {
        match self {
            LedgerAccount::Cash => "Cash",
            LedgerAccount::JazzCash => "JazzCash",
            LedgerAccount::EasyPesa => "EasyPesa",
            LedgerAccount::BankTransfer => "BankTransfer",
        }
    }
}

impl fmt::Display for LedgerAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

impl FromStr for LedgerAccount {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "cash" => Ok(LedgerAccount::Cash),
            "jazzcash" | "jazz" => Ok(LedgerAccount::JazzCash),
            "easypesa" | "easypaisa" => Ok(LedgerAccount::EasyPesa),
            "banktransfer" | "bank" => Ok(LedgerAccount::BankTransfer),
            _ => Err(ValidationError::NotAllowed {
                field: "account".to_string(),
                allowed: LedgerAccount::ALL
                    .iter()
                    .map(|a| a.collection().to_string())
                    .collect(),
            }),
        }
    }
}

/// Why a ledger entry exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryKind {
    /// Cash received at checkout.
    Sale,
    /// Manual deposit from the cash screen.
    Deposit,
    /// Manual withdrawal from the cash screen.
    Withdrawal,
    /// Customer paying off an outstanding balance.
    DueSettlement,
    /// Payment to a vendor for a purchase.
    VendorPayment,
    /// Operating expense (rent, electricity, ...).
    Expense,
}

/// One journal line in a ledger account.
///
/// Credits carry a positive `amount`, debits a negative one. The account
/// balance is the sum over its journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: String,
    pub account: LedgerAccount,
    pub kind: LedgerEntryKind,
    pub amount: Money,
    /// Bill, outstanding balance, vendor payment or expense this entry
    /// belongs to.
    pub reference_id: Option<String>,
    pub memo: Option<String>,
    #[ts(as = "String")]
    pub business_day: NaiveDate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product on the shelf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,

    /// Display name; the catalog's add-or-update key.
    pub name: String,

    /// Manufacturer.
    pub company: String,

    /// On-hand stock in tabs.
    pub stock_units: i64,

    /// Tabs in one pack (1 for syrups, injections, ...).
    pub tabs_per_pack: i64,

    /// Cost of one pack.
    pub purchase_price: Money,

    /// Shelf price of one pack.
    pub selling_price: Money,

    #[ts(as = "String")]
    pub expiry_date: NaiveDate,

    pub vendor_id: Option<String>,
    pub batch: Option<String>,
    pub generic_name: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Units consumed by one `unit` of this product.
    #[inline]
    pub fn units_per(&self, unit: SellUnit) -> i64 {
        match unit {
            SellUnit::Pack => self.tabs_per_pack.max(1),
            SellUnit::Tab => 1,
        }
    }

    /// Whole packs on hand.
    #[inline]
    pub fn packs_on_hand(&self) -> i64 {
        self.stock_units / self.tabs_per_pack.max(1)
    }

    /// Loose tabs left over from an opened pack.
    #[inline]
    pub fn loose_tabs(&self) -> i64 {
        self.stock_units % self.tabs_per_pack.max(1)
    }

    /// Selling price of one `unit`. Tab price is the pack price divided by
    /// tabs per pack, rounded half up to the paisa.
    pub fn unit_price(&self, unit: SellUnit) -> Money {
        match unit {
            SellUnit::Pack => self.selling_price,
            SellUnit::Tab => self.selling_price.div_round(self.tabs_per_pack),
        }
    }

    /// Purchase cost of one `unit`, rounded the same way as the price.
    pub fn unit_cost(&self, unit: SellUnit) -> Money {
        match unit {
            SellUnit::Pack => self.purchase_price,
            SellUnit::Tab => self.purchase_price.div_round(self.tabs_per_pack),
        }
    }
}

/// Catalog form / purchase line: a product before it has an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub company: String,
    /// Quantity in packs.
    pub quantity: i64,
    pub tabs_per_pack: i64,
    pub purchase_price: Money,
    pub selling_price: Money,
    #[ts(as = "String")]
    pub expiry_date: NaiveDate,
    #[serde(default)]
    pub vendor_id: Option<String>,
    #[serde(default)]
    pub batch: Option<String>,
    #[serde(default)]
    pub generic_name: Option<String>,
}

impl ProductDraft {
    /// Stock units represented by `quantity` packs.
    #[inline]
    pub fn stock_units(&self) -> i64 {
        self.quantity * self.tabs_per_pack.max(1)
    }

    /// Purchase cost of the whole line: `purchase_price × quantity`.
    #[inline]
    pub fn line_cost(&self) -> Money {
        self.purchase_price.multiply_quantity(self.quantity)
    }

    /// Builds a new product. The id is assigned by the store.
    pub fn into_product(self, now: DateTime<Utc>) -> Product {
        let stock_units = self.stock_units();
        Product {
            id: String::new(),
            name: self.name.trim().to_string(),
            company: self.company.trim().to_string(),
            stock_units,
            tabs_per_pack: self.tabs_per_pack,
            purchase_price: self.purchase_price,
            selling_price: self.selling_price,
            expiry_date: self.expiry_date,
            vendor_id: self.vendor_id,
            batch: self.batch,
            generic_name: self.generic_name,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites every editable field of `product` with this draft.
    pub fn overwrite(&self, product: &mut Product, now: DateTime<Utc>) {
        product.company = self.company.trim().to_string();
        product.stock_units = self.stock_units();
        product.tabs_per_pack = self.tabs_per_pack;
        product.purchase_price = self.purchase_price;
        product.selling_price = self.selling_price;
        product.expiry_date = self.expiry_date;
        product.vendor_id = self.vendor_id.clone();
        product.batch = self.batch.clone();
        product.generic_name = self.generic_name.clone();
        product.updated_at = now;
    }
}

// =============================================================================
// Vendor
// =============================================================================

/// A supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: String,
    pub name: String,
    pub company_name: String,
    pub phone_number: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Bill (Sale)
// =============================================================================

/// Snapshot of one cart line as sold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BillLine {
    pub product_id: String,
    pub product_name: String,
    pub unit: SellUnit,
    pub quantity: i64,
    pub unit_price: Money,
    pub unit_cost: Money,
    pub subtotal: Money,
    /// Tabs taken from stock for this line.
    pub stock_units: i64,
}

impl BillLine {
    /// `(unit price − unit cost) × quantity`.
    pub fn profit(&self) -> Money {
        (self.unit_price - self.unit_cost).multiply_quantity(self.quantity)
    }
}

/// One completed checkout. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: String,
    pub customer_name: String,
    /// Account the customer paid into.
    pub account: LedgerAccount,
    pub items: Vec<BillLine>,
    pub total: Money,
    pub cash_given: Money,
    /// What actually reached the ledger: `min(cash_given, total)`.
    pub amount_received: Money,
    /// `cash_given − total`; negative means the customer still owes.
    pub remaining_balance: Money,
    #[ts(as = "String")]
    pub business_day: NaiveDate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Bill {
    /// Sum of line quantities (packs and tabs counted alike, as the
    /// sellings screen does).
    pub fn products_sold(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

/// Profit posted for one sold line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProfitEntry {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub product_name: String,
    pub unit: SellUnit,
    pub quantity_sold: i64,
    pub profit: Money,
    #[ts(as = "String")]
    pub business_day: NaiveDate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Amount a customer still owes after a short-paid checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OutstandingBalance {
    pub id: String,
    pub sale_id: String,
    pub customer_name: String,
    /// Always negative.
    pub remaining: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Purchasing
// =============================================================================

/// A saved purchase awaiting payment to the vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PendingVendorPayment {
    pub id: String,
    pub vendor_id: String,
    pub vendor_name: String,
    pub company_name: String,
    pub items: Vec<ProductDraft>,
    pub total_bill: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Record of a settled vendor payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct VendorPayment {
    pub id: String,
    pub pending_id: String,
    pub vendor_id: String,
    pub vendor_name: String,
    pub account: LedgerAccount,
    pub amount: Money,
    pub items: Vec<ProductDraft>,
    #[ts(as = "String")]
    pub business_day: NaiveDate,
    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,
}

// =============================================================================
// Expenses
// =============================================================================

/// Operating expense category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ExpenseCategory {
    #[serde(rename = "Electricity Bill")]
    ElectricityBill,
    #[serde(rename = "Rent")]
    Rent,
    #[serde(rename = "Software Bill")]
    SoftwareBill,
    #[serde(rename = "Shop Maintenance")]
    ShopMaintenance,
    #[serde(rename = "Miscellaneous")]
    Miscellaneous,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 5] = [
        ExpenseCategory::ElectricityBill,
        ExpenseCategory::Rent,
        ExpenseCategory::SoftwareBill,
        ExpenseCategory::ShopMaintenance,
        ExpenseCategory::Miscellaneous,
    ];

    pub const fn label(&self) -> &'static str {
        match self {
            ExpenseCategory::ElectricityBill => "Electricity Bill",
            ExpenseCategory::Rent => "Rent",
            ExpenseCategory::SoftwareBill => "Software Bill",
            ExpenseCategory::ShopMaintenance => "Shop Maintenance",
            ExpenseCategory::Miscellaneous => "Miscellaneous",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ExpenseCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        ExpenseCategory::ALL
            .iter()
            .find(|c| {
                let label: String = c
                    .label()
                    .chars()
                    .filter(|ch| ch.is_alphanumeric())
                    .collect::<String>()
                    .to_lowercase();
                label == wanted || (!wanted.is_empty() && label.starts_with(&wanted))
            })
            .copied()
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "category".to_string(),
                allowed: ExpenseCategory::ALL
                    .iter()
                    .map(|c| c.label().to_string())
                    .collect(),
            })
    }
}

/// Paid operating expense ("dues/spending").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub category: ExpenseCategory,
    pub amount: Money,
    pub account: LedgerAccount,
    #[ts(as = "String")]
    pub business_day: NaiveDate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Login
// =============================================================================

/// A back-office user. Only the Argon2 PHC string is stored.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for UserAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserAccount")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn panadol() -> Product {
        ProductDraft {
            name: "Panadol".to_string(),
            company: "GSK".to_string(),
            quantity: 5,
            tabs_per_pack: 10,
            purchase_price: Money::from_rupees(80),
            selling_price: Money::from_rupees(100),
            expiry_date: NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(),
            vendor_id: None,
            batch: None,
            generic_name: Some("Paracetamol".to_string()),
        }
        .into_product(Utc::now())
    }

    #[test]
    fn test_stock_in_units() {
        let mut p = panadol();
        assert_eq!(p.stock_units, 50);
        assert_eq!(p.packs_on_hand(), 5);

        p.stock_units -= 2 * p.units_per(SellUnit::Pack);
        assert_eq!(p.packs_on_hand(), 3);

        p.stock_units -= 5 * p.units_per(SellUnit::Tab);
        assert_eq!(p.packs_on_hand(), 2);
        assert_eq!(p.loose_tabs(), 5);
    }

    #[test]
    fn test_unit_price() {
        let p = panadol();
        assert_eq!(p.unit_price(SellUnit::Pack), Money::from_rupees(100));
        assert_eq!(p.unit_price(SellUnit::Tab), Money::from_rupees(10));
        assert_eq!(p.unit_cost(SellUnit::Tab), Money::from_rupees(8));
    }

    #[test]
    fn test_account_parsing() {
        assert_eq!("cash".parse::<LedgerAccount>().unwrap(), LedgerAccount::Cash);
        assert_eq!(
            "Bank Transfer".parse::<LedgerAccount>().unwrap(),
            LedgerAccount::BankTransfer
        );
        assert_eq!(
            "easypaisa".parse::<LedgerAccount>().unwrap(),
            LedgerAccount::EasyPesa
        );
        assert!("visa".parse::<LedgerAccount>().is_err());
    }

    #[test]
    fn test_account_serializes_as_collection_name() {
        let json = serde_json::to_string(&LedgerAccount::JazzCash).unwrap();
        assert_eq!(json, "\"JazzCash\"");
    }

    #[test]
    fn test_expense_category_labels() {
        let json = serde_json::to_string(&ExpenseCategory::ElectricityBill).unwrap();
        assert_eq!(json, "\"Electricity Bill\"");
        assert_eq!(
            "rent".parse::<ExpenseCategory>().unwrap(),
            ExpenseCategory::Rent
        );
        assert_eq!(
            "electricity".parse::<ExpenseCategory>().unwrap(),
            ExpenseCategory::ElectricityBill
        );
        assert!("food".parse::<ExpenseCategory>().is_err());
    }

    #[test]
    fn test_bill_line_profit() {
        let line = BillLine {
            product_id: "p1".to_string(),
            product_name: "Panadol".to_string(),
            unit: SellUnit::Tab,
            quantity: 5,
            unit_price: Money::from_rupees(10),
            unit_cost: Money::from_rupees(8),
            subtotal: Money::from_rupees(50),
            stock_units: 5,
        };
        assert_eq!(line.profit(), Money::from_rupees(10));
    }

    #[test]
    fn test_user_debug_redacts_hash() {
        let user = UserAccount {
            id: "u1".to_string(),
            username: "admin".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            created_at: Utc::now(),
        };
        let debug = format!("{:?}", user);
        assert!(!debug.contains("secret"));
    }
}
