//! # Validation Module
//!
//! Input validation for Ridgeline.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                              │
//! │                                                                     │
//! │  Layer 1: Presentation (external)                                   │
//! │  └── field-level feedback, out of scope here                        │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 2: THIS MODULE - business rule validation                    │
//! │  └── rejected before any database call                              │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 3: Database (SQLite)                                         │
//! │  └── NOT NULL, UNIQUE, CHECK, foreign keys                          │
//! │                                                                     │
//! │  Defense in depth: each layer catches different mistakes            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::types::{ArticleDraft, Registration, RentalRequest};
use crate::MAX_RENTAL_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn require(field: &'static str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required { field });
    }
    if value.len() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

/// Validates an article name (required, at most 100 characters).
pub fn validate_article_name(name: &str) -> ValidationResult<()> {
    require("article name", name, 100)
}

/// Validates a category name (required, at most 100 characters).
pub fn validate_category_name(name: &str) -> ValidationResult<()> {
    require("category name", name, 100)
}

/// Validates a login (required, at most 50 characters).
pub fn validate_login(login: &str) -> ValidationResult<()> {
    require("login", login, 50)
}

/// Validates an email address.
///
/// Only a shape check: a single `@` with text on both sides. Anything
/// stricter belongs to the presentation layer.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    require("email", email, 200)?;

    let mut parts = email.trim().splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ValidationError::InvalidFormat {
            field: "email",
            reason: "expected local@domain",
        });
    }
    Ok(())
}

/// Validates a postal code: exactly five ASCII digits.
pub fn validate_postal_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();
    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "postal code",
        });
    }
    if code.len() != 5 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "postal code",
            reason: "must be exactly five digits",
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a rental quantity.
///
/// ## Rules
/// - Must be positive (>= 1)
/// - Must not exceed [`MAX_RENTAL_QUANTITY`]
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive { field: "quantity" });
    }
    if quantity > MAX_RENTAL_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity",
            min: 1,
            max: MAX_RENTAL_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a daily rate in cents. Zero is allowed (free loans).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price",
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a stock quantity. Zero is allowed (out of stock).
pub fn validate_stock_quantity(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock quantity",
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Validates a rental period: the end date must not precede the start date.
///
/// A single-day rental (end == start) is valid.
pub fn validate_rental_period(start: NaiveDate, end: NaiveDate) -> ValidationResult<()> {
    if end < start {
        return Err(ValidationError::EndBeforeStart { start, end });
    }
    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates everything needed before creating or updating an article.
pub fn validate_article_draft(draft: &ArticleDraft) -> ValidationResult<()> {
    validate_article_name(&draft.name)?;
    validate_price_cents(draft.price_cents)?;
    validate_stock_quantity(draft.stock_quantity)?;
    Ok(())
}

/// Validates a rental request before any database access.
pub fn validate_rental_request(request: &RentalRequest) -> ValidationResult<()> {
    validate_quantity(request.quantity)?;
    validate_rental_period(request.start_date, request.end_date)?;
    Ok(())
}

/// Validates a registration before any database access.
pub fn validate_registration(registration: &Registration) -> ValidationResult<()> {
    require("last name", &registration.last_name, 100)?;
    require("first name", &registration.first_name, 100)?;
    validate_email(&registration.email)?;
    validate_login(&registration.login)?;
    require("password", &registration.password, 200)?;
    require("address", &registration.address, 300)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
