//! # Invoice Export Model
//!
//! The flat data model handed to the external document renderer, plus the
//! rental pricing math used around it.
//!
//! ## Two Amounts, By Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  The reservation screen shows an ESTIMATE:                          │
//! │      unit price × quantity × day count                              │
//! │                                                                     │
//! │  The workflow invoices a FLAT amount:                               │
//! │      unit price × quantity        (duration ignored)                │
//! │                                                                     │
//! │  These two figures disagree for multi-day rentals. Both are kept    │
//! │  exactly as the product behaves today; reconciling them is a        │
//! │  product decision, not a code fix.                                  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rendering (layout, fonts, PDF) is an external collaborator; this module
//! only computes the fields.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{Rental, RentalArticle, User};
use crate::STANDARD_VAT;

/// Company block printed on every invoice.
pub const COMPANY_NAME: &str = "Ridgeline Rentals";
pub const COMPANY_ADDRESS: &str = "91300 Massy, France";
pub const COMPANY_EMAIL: &str = "contact@ridgeline-rentals.fr";

/// Payment method label; there is a single payment path today.
pub const PAYMENT_METHOD: &str = "Online payment";

// =============================================================================
// Pricing Math
// =============================================================================

/// Number of billable days in a rental period, boundaries inclusive.
///
/// A rental from the 10th to the 12th spans three days; a single-day rental
/// counts as one.
#[inline]
pub fn rental_day_count(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// The day-multiplied price estimate shown before confirming a reservation.
///
/// Deliberately distinct from the invoiced amount (see module docs).
pub fn rental_estimate(unit_price: Money, quantity: i64, start: NaiveDate, end: NaiveDate) -> Money {
    unit_price * quantity * rental_day_count(start, end)
}

// =============================================================================
// Export Model
// =============================================================================

/// One line of the exported invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// Article name at export time.
    pub description: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    /// Inclusive day count for the period.
    pub day_count: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

/// Everything the document renderer needs, flat and precomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceExport {
    pub invoice_number: i64,
    pub issue_date: DateTime<Utc>,

    pub company_name: String,
    pub company_address: String,
    pub company_email: String,

    pub customer_name: String,
    pub customer_address: String,
    /// "postal_code city", e.g. "91300 Massy".
    pub customer_city: String,

    pub payment_method: String,

    pub lines: Vec<InvoiceLine>,

    /// Ex-tax part of the stored VAT-inclusive amount.
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

impl InvoiceExport {
    /// Builds the export model for one rental.
    ///
    /// The stored invoice amount is authoritative: the line totals carry
    /// `unit price × quantity` and the subtotal/tax split is derived from the
    /// stored total at the standard VAT rate, so the rendered document always
    /// reconciles with the database.
    pub fn build(rental: &Rental, customer: &User, lines: &[RentalArticle]) -> InvoiceExport {
        let total = rental.invoice.amount();
        let subtotal = total.excl_tax(STANDARD_VAT);
        let day_count = rental_day_count(rental.start_date, rental.end_date);

        InvoiceExport {
            invoice_number: rental.invoice.id,
            issue_date: rental.invoice.issue_date,
            company_name: COMPANY_NAME.to_string(),
            company_address: COMPANY_ADDRESS.to_string(),
            company_email: COMPANY_EMAIL.to_string(),
            customer_name: format!("{} {}", customer.last_name, customer.first_name),
            customer_address: customer.address.clone(),
            customer_city: format!("{} {}", customer.city.postal_code, customer.city.name),
            payment_method: PAYMENT_METHOD.to_string(),
            lines: lines
                .iter()
                .map(|line| InvoiceLine {
                    description: line.article.name.clone(),
                    period_start: rental.start_date,
                    period_end: rental.end_date,
                    day_count,
                    quantity: line.quantity,
                    unit_price_cents: line.article.price_cents,
                    line_total_cents: line.article.price_cents * line.quantity,
                })
                .collect(),
            subtotal_cents: subtotal.cents(),
            tax_cents: (total - subtotal).cents(),
            total_cents: total.cents(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
