//! # Validation Module
//!
//! Input validation for catalog, vendor, ledger and login forms.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Command arguments (backoffice)                                │
//! │  ├── Parsing (Money::from_str, LedgerAccount::from_str)                 │
//! │  └── THIS MODULE: Business rule validation                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Document store                                                │
//! │  ├── Guarded increments (stock never below 0)                           │
//! │  └── Guarded appends (ledger never below 0)                             │
//! │                                                                         │
//! │  Everything here runs before the first write.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::ProductDraft;
use crate::{DEFAULT_CUSTOMER_NAME, MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Upper bound on tabs in one pack.
pub const MAX_TABS_PER_PACK: i64 = 1_000;

/// Upper bound on a price or amount: PKR 10,000,000.
///
/// A full cart at this price (`MAX_CART_ITEMS` lines of
/// `MAX_ITEM_QUANTITY` packs) still totals inside `i64`.
pub const MAX_PRICE: Money = Money::from_minor(1_000_000_000);

const _: () = assert!(
    (MAX_PRICE.minor() as i128) * (MAX_ITEM_QUANTITY as i128) * (MAX_CART_ITEMS as i128)
        <= i64::MAX as i128
);

// =============================================================================
// String Validators
// =============================================================================

fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Example
/// ```rust
/// use apotheca_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Panadol 500mg").is_ok());
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_text("name", name, 200)
}

/// Validates a manufacturer name.
pub fn validate_company(company: &str) -> ValidationResult<()> {
    validate_text("company", company, 200)
}

/// Validates the vendor form. Any blank field fails with the form's
/// single "All fields are required" message.
pub fn validate_vendor_fields(name: &str, company: &str, phone: &str) -> ValidationResult<()> {
    if name.trim().is_empty() || company.trim().is_empty() || phone.trim().is_empty() {
        return Err(ValidationError::AllFieldsRequired);
    }

    validate_text("name", name, 200)?;
    validate_text("companyName", company, 200)?;
    validate_phone(phone)
}

/// Validates a phone number: digits plus `+`, `-`, spaces and parentheses,
/// with 7 to 15 digits.
///
/// ## Example
/// ```rust
/// use apotheca_core::validation::validate_phone;
///
/// assert!(validate_phone("+92 300 1234567").is_ok());
/// assert!(validate_phone("call me").is_err());
/// ```
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "phoneNumber".to_string(),
            reason: "only digits, spaces, +, - and parentheses are allowed".to_string(),
        });
    }

    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if !(7..=15).contains(&digits) {
        return Err(ValidationError::InvalidFormat {
            field: "phoneNumber".to_string(),
            reason: "must contain 7 to 15 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a login username.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }
    if username.len() < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }
    if username.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 50,
        });
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, '.', '_' and '-'".to_string(),
        });
    }

    Ok(())
}

/// Validates a new password (length only).
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < 8 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        });
    }
    if password.len() > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }
    Ok(())
}

/// Returns the trimmed customer name, or "Walking Customer" when blank.
///
/// ## Example
/// ```rust
/// use apotheca_core::validation::normalize_customer_name;
///
/// assert_eq!(normalize_customer_name("  "), "Walking Customer");
/// assert_eq!(normalize_customer_name(" Ali "), "Ali");
/// ```
pub fn normalize_customer_name(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        DEFAULT_CUSTOMER_NAME.to_string()
    } else {
        name.to_string()
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity (packs or tabs).
///
/// ## Rules
/// - Must be positive
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::InvalidLine);
    }

    if quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates tabs per pack (at least one).
pub fn validate_tabs_per_pack(tabs: i64) -> ValidationResult<()> {
    if !(1..=MAX_TABS_PER_PACK).contains(&tabs) {
        return Err(ValidationError::OutOfRange {
            field: "tabsPerPack".to_string(),
            min: 1,
            max: MAX_TABS_PER_PACK,
        });
    }
    Ok(())
}

/// Validates a price. Zero is allowed (free samples), negative is not,
/// and nothing above [`MAX_PRICE`].
///
/// ## Example
/// ```rust
/// use apotheca_core::money::Money;
/// use apotheca_core::validation::{validate_price, MAX_PRICE};
///
/// assert!(validate_price("sellingPrice", Money::zero()).is_ok());
/// assert!(validate_price("sellingPrice", MAX_PRICE).is_ok());
/// assert!(validate_price("sellingPrice", Money::from_minor(MAX_PRICE.minor() + 1)).is_err());
/// ```
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    if price > MAX_PRICE {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE.rupees(),
        });
    }
    Ok(())
}

/// Validates a ledger or expense amount: strictly positive, at most
/// [`MAX_PRICE`].
///
/// ## Example
/// ```rust
/// use apotheca_core::money::Money;
/// use apotheca_core::validation::validate_amount;
///
/// assert!(validate_amount(Money::from_minor(1)).is_ok());
/// assert!(validate_amount(Money::zero()).is_err());
/// ```
pub fn validate_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() || amount > MAX_PRICE {
        return Err(ValidationError::InvalidAmount);
    }
    Ok(())
}

/// Validates a catalog form or purchase line.
///
/// Catalog quantity may be zero (listing a product before stock arrives);
/// purchase lines go through [`validate_purchase_line`] which also demands
/// a positive quantity.
pub fn validate_product_draft(draft: &ProductDraft) -> ValidationResult<()> {
    validate_product_name(&draft.name)?;
    validate_company(&draft.company)?;
    if draft.quantity < 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if draft.quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_ITEM_QUANTITY,
        });
    }
    validate_tabs_per_pack(draft.tabs_per_pack)?;
    validate_price("purchasePrice", draft.purchase_price)?;
    validate_price("sellingPrice", draft.selling_price)?;
    Ok(())
}

/// Validates an incoming-stock line on a purchase.
pub fn validate_purchase_line(draft: &ProductDraft) -> ValidationResult<()> {
    validate_product_draft(draft)?;
    validate_quantity(draft.quantity)
}

// =============================================================================
// Unit Tests
// =============================================================================
