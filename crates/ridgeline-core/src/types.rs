//! # Domain Types
//!
//! Core domain types used throughout Ridgeline.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌───────────────┐    ┌───────────────┐    ┌───────────────┐       │
//! │  │    Article    │    │    Rental     │    │    Invoice    │       │
//! │  │  ───────────  │    │  ───────────  │    │  ───────────  │       │
//! │  │  id           │    │  id           │    │  id           │       │
//! │  │  name         │    │  start/end    │    │  issue_date   │       │
//! │  │  price_cents  │    │  state        │    │  amount_cents │       │
//! │  │  stock        │    │  invoice ─────┼───►│  (immutable)  │       │
//! │  │  category     │    │  user_id      │    └───────────────┘       │
//! │  └───────┬───────┘    └───────┬───────┘                            │
//! │          │                    │                                     │
//! │          └──── RentalArticle ─┘  (join record with quantity)       │
//! │                                                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity carries the integer primary key assigned by the store
//! (AUTOINCREMENT); ids are never invented in memory.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Rental State
// =============================================================================

/// Lifecycle state of a rental.
///
/// ## Persisted Mapping
/// The integer codes are a fixed external interface: they are foreign keys
/// into the seeded `etatlocation` reference table and must never be
/// renumbered:
///
/// | code | state          |
/// |------|----------------|
/// | 1    | PendingPayment |
/// | 2    | Paid           |
/// | 3    | InProgress     |
/// | 4    | Returned       |
/// | 5    | Cancelled      |
///
/// ## State Machine
/// ```text
///        create
///          │
///          ▼
///  ┌──────────────┐  mark_returned   ┌──────────┐
///  │     Paid     │─────────────────►│ Returned │ (terminal)
///  └──┬───────────┘                  └──────────┘
///     │        ▲ dates mutable            ▲
///     │cancel  │ in place                 │ mark_returned
///     ▼        │                          │
///  ┌───────────┴──┐               ┌──────────────┐
///  │  Cancelled   │◄──────────────│  InProgress  │
///  │  (terminal)  │    (never:    └──────────────┘
///  └──────────────┘   InProgress cannot be cancelled)
///
///  PendingPayment behaves like Paid for cancel/date changes but cannot
///  be returned. No operation leaves Returned or Cancelled.
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[repr(i32)]
#[serde(rename_all = "snake_case")]
pub enum RentalState {
    /// Reservation recorded, payment still expected.
    PendingPayment = 1,
    /// Payment received; the equipment is reserved.
    Paid = 2,
    /// The equipment has been handed over.
    InProgress = 3,
    /// The equipment came back; terminal.
    Returned = 4,
    /// The reservation was cancelled and stock restored; terminal.
    Cancelled = 5,
}

impl RentalState {
    /// All states, in code order. Matches the seeded reference table.
    pub const ALL: [RentalState; 5] = [
        RentalState::PendingPayment,
        RentalState::Paid,
        RentalState::InProgress,
        RentalState::Returned,
        RentalState::Cancelled,
    ];

    /// Returns the persisted integer code.
    #[inline]
    pub const fn code(self) -> i64 {
        self as i32 as i64
    }

    /// Resolves a persisted integer code.
    pub const fn from_code(code: i64) -> Option<RentalState> {
        match code {
            1 => Some(RentalState::PendingPayment),
            2 => Some(RentalState::Paid),
            3 => Some(RentalState::InProgress),
            4 => Some(RentalState::Returned),
            5 => Some(RentalState::Cancelled),
            _ => None,
        }
    }

    /// Returns the human-readable label stored in the reference table.
    pub const fn label(self) -> &'static str {
        match self {
            RentalState::PendingPayment => "Pending payment",
            RentalState::Paid => "Paid",
            RentalState::InProgress => "In progress",
            RentalState::Returned => "Returned",
            RentalState::Cancelled => "Cancelled",
        }
    }

    /// Resolves a state from its reference-table label.
    pub fn from_label(label: &str) -> Option<RentalState> {
        RentalState::ALL.into_iter().find(|s| s.label() == label)
    }

    /// States from which a rental may be cancelled.
    #[inline]
    pub const fn can_cancel(self) -> bool {
        matches!(self, RentalState::Paid | RentalState::PendingPayment)
    }

    /// States in which the rental period may still be changed.
    ///
    /// Same set as cancellation: once the equipment is out, dates are fixed.
    #[inline]
    pub const fn can_change_dates(self) -> bool {
        self.can_cancel()
    }

    /// States from which a rental may be marked as returned.
    #[inline]
    pub const fn can_return(self) -> bool {
        matches!(self, RentalState::Paid | RentalState::InProgress)
    }

    /// Terminal states; no operation transitions out of them.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, RentalState::Returned | RentalState::Cancelled)
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// An equipment category (e.g. "Tents", "Skis").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    /// Globally unique display name.
    pub name: String,
}

/// An article available for rental.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    /// Display name; unique within its category.
    pub name: String,
    pub description: String,
    /// Daily rental rate in cents.
    pub price_cents: i64,
    /// Units currently available; never negative.
    pub stock_quantity: i64,
    /// Opaque image filename, resolved by an external asset loader.
    pub image: Option<String>,
    pub category: Category,
}

impl Article {
    /// Returns the daily rate as a [`Money`] value.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether the requested quantity is currently in stock.
    ///
    /// Advisory only; the creation transaction re-checks atomically.
    pub fn can_rent(&self, quantity: i64) -> bool {
        quantity >= 1 && self.stock_quantity >= quantity
    }
}

/// Input for creating or updating an article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleDraft {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub stock_quantity: i64,
    pub image: Option<String>,
    pub category_id: i64,
}

// =============================================================================
// Billing
// =============================================================================

/// An invoice owned by exactly one rental.
///
/// The amount is computed once at creation and never updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub issue_date: DateTime<Utc>,
    /// VAT-inclusive amount in cents.
    pub amount_cents: i64,
}

impl Invoice {
    /// Returns the amount as a [`Money`] value.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Rental
// =============================================================================

/// A booking of equipment by one user over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rental {
    pub id: i64,
    /// When the reservation was placed.
    pub created_at: DateTime<Utc>,
    pub start_date: NaiveDate,
    /// Always >= `start_date`.
    pub end_date: NaiveDate,
    /// Set when the equipment comes back; None until then.
    pub returned_at: Option<DateTime<Utc>>,
    pub user_id: i64,
    pub state: RentalState,
    /// Owned 1:1, created in the same transaction as the rental.
    pub invoice: Invoice,
}

/// Join record linking a rental to an article with a quantity.
///
/// Immutable after creation; quantity is always >= 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalArticle {
    pub rental_id: i64,
    pub article: Article,
    pub quantity: i64,
}

/// Input for creating a rental.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RentalRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub quantity: i64,
    pub user_id: i64,
    pub article_id: i64,
}

// =============================================================================
// Directory
// =============================================================================

/// A city referenced by user addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: i64,
    pub name: String,
    /// Exactly five digits; (name, postal_code) pairs are unique.
    pub postal_code: String,
}

/// A registered account.
///
/// The credential hash never leaves the directory repository; it is not part
/// of the domain type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub last_name: String,
    pub first_name: String,
    pub email: String,
    /// Globally unique.
    pub login: String,
    pub birth_date: NaiveDate,
    pub address: String,
    /// Partitions access: employees reach the back-office operations.
    pub is_employee: bool,
    pub city: City,
}

/// Input for registering a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub last_name: String,
    pub first_name: String,
    pub email: String,
    pub login: String,
    /// Clear-text secret; hashed by the directory repository, never stored.
    pub password: String,
    pub birth_date: NaiveDate,
    pub address: String,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_codes_round_trip() {
        for state in RentalState::ALL {
            assert_eq!(RentalState::from_code(state.code()), Some(state));
            assert_eq!(RentalState::from_label(state.label()), Some(state));
        }
        assert_eq!(RentalState::from_code(0), None);
        assert_eq!(RentalState::from_code(6), None);
    }

    #[test]
    fn persisted_codes_are_stable() {
        // External interface: renumbering would corrupt every stored rental.
        assert_eq!(RentalState::PendingPayment.code(), 1);
        assert_eq!(RentalState::Paid.code(), 2);
        assert_eq!(RentalState::InProgress.code(), 3);
        assert_eq!(RentalState::Returned.code(), 4);
        assert_eq!(RentalState::Cancelled.code(), 5);
    }

    #[test]
    fn cancel_set_is_paid_or_pending() {
        assert!(RentalState::Paid.can_cancel());
        assert!(RentalState::PendingPayment.can_cancel());
        assert!(!RentalState::InProgress.can_cancel());
        assert!(!RentalState::Returned.can_cancel());
        assert!(!RentalState::Cancelled.can_cancel());
    }

    #[test]
    fn return_set_is_paid_or_in_progress() {
        assert!(RentalState::Paid.can_return());
        assert!(RentalState::InProgress.can_return());
        assert!(!RentalState::PendingPayment.can_return());
        assert!(!RentalState::Returned.can_return());
        assert!(!RentalState::Cancelled.can_return());
    }

    #[test]
    fn terminal_states_allow_nothing() {
        for state in [RentalState::Returned, RentalState::Cancelled] {
            assert!(state.is_terminal());
            assert!(!state.can_cancel());
            assert!(!state.can_change_dates());
            assert!(!state.can_return());
        }
    }

    #[test]
    fn article_stock_check() {
        let article = Article {
            id: 1,
            name: "Tent".into(),
            description: "2-person tent".into(),
            price_cents: 5000,
            stock_quantity: 3,
            image: None,
            category: Category {
                id: 1,
                name: "Camping".into(),
            },
        };
        assert!(article.can_rent(3));
        assert!(!article.can_rent(4));
        assert!(!article.can_rent(0));
    }
}
