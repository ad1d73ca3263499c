//! # Billing Repository
//!
//! Database operations for invoices.
//!
//! Invoices are write-once: the amount is computed by the rental workflow at
//! creation time and never updated afterwards. Insertion happens inside the
//! rental-creation transaction, so an invoice row can never exist without
//! its rental committing in the same breath.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use ridgeline_core::{Invoice, Money};

use crate::error::DbResult;

/// Repository for invoice operations.
#[derive(Debug, Clone)]
pub struct BillingRepository {
    pool: SqlitePool,
}

impl BillingRepository {
    /// Creates a new billing repository with the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        BillingRepository { pool }
    }

    /// Inserts an invoice within the caller's transaction.
    ///
    /// The caller owns the transaction; if it rolls back, the invoice row
    /// disappears with everything else.
    pub async fn insert_invoice(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        amount: Money,
        issue_date: DateTime<Utc>,
    ) -> DbResult<Invoice> {
        let result = sqlx::query("INSERT INTO facture (dateFacture, montant) VALUES (?, ?)")
            .bind(issue_date)
            .bind(amount.cents())
            .execute(&mut **tx)
            .await?;

        let id = result.last_insert_rowid();
        debug!(invoice_id = id, amount = %amount, "Invoice inserted");

        Ok(Invoice {
            id,
            issue_date,
            amount_cents: amount.cents(),
        })
    }

    /// Fetches a single invoice by id.
    pub async fn get_invoice(&self, id: i64) -> DbResult<Option<Invoice>> {
        let row: Option<(i64, DateTime<Utc>, i64)> = sqlx::query_as(
            "SELECT idFacture, dateFacture, montant FROM facture WHERE idFacture = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, issue_date, amount_cents)| Invoice {
            id,
            issue_date,
            amount_cents,
        }))
    }

    /// Fetches the invoice owned by a rental.
    pub async fn invoice_for_rental(&self, rental_id: i64) -> DbResult<Option<Invoice>> {
        let row: Option<(i64, DateTime<Utc>, i64)> = sqlx::query_as(
            "SELECT f.idFacture, f.dateFacture, f.montant \
             FROM facture f \
             INNER JOIN location l ON l.idFacture = f.idFacture \
             WHERE l.idLocation = ?",
        )
        .bind(rental_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, issue_date, amount_cents)| Invoice {
            id,
            issue_date,
            amount_cents,
        }))
    }
}
