//! # ridgeline-db: Database Layer for Ridgeline
//!
//! SQLite persistence for the rental system, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     Ridgeline Architecture                          │
//! │                                                                     │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │              Presentation Layer (external)                  │   │
//! │  └───────────────────────────┬─────────────────────────────────┘   │
//! │                              │                                      │
//! │  ┌───────────────────────────▼─────────────────────────────────┐   │
//! │  │              ridgeline-core (Business Logic)                │   │
//! │  └───────────────────────────┬─────────────────────────────────┘   │
//! │                              │                                      │
//! │  ┌───────────────────────────▼─────────────────────────────────┐   │
//! │  │             ★ ridgeline-db (THIS CRATE) ★                   │   │
//! │  │                                                             │   │
//! │  │   ┌────────┐  ┌────────────┐  ┌──────────────────────────┐ │   │
//! │  │   │  pool  │  │ migrations │  │       repository         │ │   │
//! │  │   │ config │  │  embedded  │  │ catalog directory        │ │   │
//! │  │   │  WAL   │  │    SQL     │  │ billing rental           │ │   │
//! │  │   └────────┘  └────────────┘  └──────────────────────────┘ │   │
//! │  │                                                             │   │
//! │  │              SQLite (WAL mode, foreign keys ON)             │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use ridgeline_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("ridgeline.db")).await?;
//! let articles = db.catalog().list_articles().await?;
//! let rental = db.rentals().create_rental(&request).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::billing::BillingRepository;
pub use repository::catalog::CatalogRepository;
pub use repository::directory::DirectoryRepository;
pub use repository::rental::RentalRepository;
