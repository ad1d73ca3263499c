//! # Repository Module
//!
//! Database repository implementations for Ridgeline.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                     │
//! │                                                                     │
//! │  The Repository pattern abstracts database access behind a clean    │
//! │  API. The presentation layer asks, the repository queries:          │
//! │                                                                     │
//! │  db.catalog().list_articles()                                       │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  CatalogRepository                                                  │
//! │  ├── list_articles(&self)                                           │
//! │  ├── create_article(&self, draft)                                   │
//! │  └── delete_article(&self, id)                                      │
//! │       │                                                             │
//! │       │  parameterized SQL                                          │
//! │       ▼                                                             │
//! │  SQLite Database                                                    │
//! │                                                                     │
//! │  Every call is a fresh read-through query; nothing mirrors the      │
//! │  database in ambient mutable state.                                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`catalog::CatalogRepository`] - Articles and categories
//! - [`directory::DirectoryRepository`] - Cities, users, rental states
//! - [`billing::BillingRepository`] - Invoices
//! - [`rental::RentalRepository`] - The transactional rental workflow

pub mod billing;
pub mod catalog;
pub mod directory;
pub mod rental;
