//! # ridgeline-core: Pure Business Logic for Ridgeline
//!
//! This crate is the heart of the rental system. It contains all business
//! rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     Ridgeline Architecture                          │
//! │                                                                     │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │              Presentation Layer (external)                  │   │
//! │  │    catalog browsing ─► reservation ─► invoice display       │   │
//! │  └───────────────────────────┬─────────────────────────────────┘   │
//! │                              │                                      │
//! │  ┌───────────────────────────▼─────────────────────────────────┐   │
//! │  │             ★ ridgeline-core (THIS CRATE) ★                 │   │
//! │  │                                                             │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │  types  │  │  money  │  │ validation │  │  invoice  │  │   │
//! │  │   │ Article │  │  Money  │  │   rules    │  │  export   │  │   │
//! │  │   │ Rental  │  │ TaxRate │  │   checks   │  │   model   │  │   │
//! │  │   └─────────┘  └─────────┘  └────────────┘  └───────────┘  │   │
//! │  │                                                             │   │
//! │  │   NO I/O • NO DATABASE • NO HASHING • PURE FUNCTIONS        │   │
//! │  └───────────────────────────┬─────────────────────────────────┘   │
//! │                              │                                      │
//! │  ┌───────────────────────────▼─────────────────────────────────┐   │
//! │  │                ridgeline-db (Database Layer)                │   │
//! │  │          SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Article, Rental, RentalState, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//! - [`invoice`] - Invoice export model and rental pricing math
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output, always
//! 2. **No I/O**: database, network, and file system access are forbidden here
//! 3. **Integer Money**: all monetary values are in cents (i64)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod invoice;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use invoice::{InvoiceExport, InvoiceLine};
pub use money::{Money, TaxRate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single article in one rental.
///
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_RENTAL_QUANTITY: i64 = 999;

/// VAT rate applied to all rentals, in basis points (2000 = 20%).
///
/// Invoice amounts are stored VAT-inclusive; the export model derives the
/// ex-tax and tax parts from this rate.
pub const STANDARD_VAT: TaxRate = TaxRate::from_bps(2000);
