//! # Rental Repository
//!
//! The transactional rental workflow: create, cancel, change dates, return.
//!
//! ## Creation Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                create_rental(request)                               │
//! │                                                                     │
//! │  validate request (no database access)                              │
//! │     │                                                               │
//! │     ▼                                                               │
//! │  BEGIN                                                              │
//! │  ├── read article rate and stock                                    │
//! │  ├── INSERT facture (rate × quantity)                               │
//! │  ├── INSERT location (state = Paid, idFacture)                      │
//! │  ├── INSERT locationarticle (quantity)                              │
//! │  └── UPDATE article                                                 │
//! │        SET quantiteStock = quantiteStock - q                        │
//! │        WHERE idArticle = ? AND quantiteStock >= q   ◄── the guard   │
//! │            │                                                        │
//! │            ├── 1 row  → COMMIT                                      │
//! │            └── 0 rows → ROLLBACK, InsufficientStock                 │
//! │                                                                     │
//! │  The guarded decrement makes concurrent reservations race safely:   │
//! │  whichever transaction commits second sees the reduced stock and    │
//! │  fails cleanly. Stock can never go negative, and no invoice or      │
//! │  rental row survives a failed reservation.                          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## State Transitions
//! Every mutation is a single conditional UPDATE carrying the allowed
//! source states in its WHERE clause. A stale caller (another session moved
//! the rental first) hits zero affected rows and gets a
//! [`CoreError::StateConflict`] built from the state actually stored.

use chrono::{NaiveDate, Utc};
use sqlx::{Sqlite, SqlitePool};
use tracing::{debug, info, warn};

use ridgeline_core::validation::{validate_rental_period, validate_rental_request};
use ridgeline_core::{
    Article, Category, CoreError, Invoice, Money, Rental, RentalArticle, RentalRequest,
    RentalState,
};

use crate::error::{DbError, DbResult};
use crate::repository::billing::BillingRepository;

/// Repository for the rental workflow.
#[derive(Debug, Clone)]
pub struct RentalRepository {
    pool: SqlitePool,
}

// =============================================================================
// Row Mapping
// =============================================================================

/// Flat projection of `location` joined with its `facture`.
#[derive(sqlx::FromRow)]
struct RentalRow {
    id: i64,
    created_at: chrono::DateTime<Utc>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    returned_at: Option<chrono::DateTime<Utc>>,
    user_id: i64,
    state: RentalState,
    invoice_id: i64,
    invoice_date: chrono::DateTime<Utc>,
    amount_cents: i64,
}

impl From<RentalRow> for Rental {
    fn from(row: RentalRow) -> Self {
        Rental {
            id: row.id,
            created_at: row.created_at,
            start_date: row.start_date,
            end_date: row.end_date,
            returned_at: row.returned_at,
            user_id: row.user_id,
            state: row.state,
            invoice: Invoice {
                id: row.invoice_id,
                issue_date: row.invoice_date,
                amount_cents: row.amount_cents,
            },
        }
    }
}

const RENTAL_SELECT: &str = "\
    SELECT l.idLocation        AS id, \
           l.dateLocation      AS created_at, \
           l.dateDebutLocation AS start_date, \
           l.dateFinLocation   AS end_date, \
           l.dateRetourArticle AS returned_at, \
           l.idUser            AS user_id, \
           l.idEtatLocation    AS state, \
           f.idFacture         AS invoice_id, \
           f.dateFacture       AS invoice_date, \
           f.montant           AS amount_cents \
    FROM location l \
    INNER JOIN facture f ON f.idFacture = l.idFacture";

impl RentalRepository {
    /// Creates a new rental repository with the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        RentalRepository { pool }
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Creates a rental atomically: invoice, rental, article line, and stock
    /// decrement commit together or not at all.
    ///
    /// The invoice amount is the article's rate times the quantity. New
    /// rentals start in [`RentalState::Paid`]; payment settles before the
    /// reservation is recorded.
    ///
    /// ## Errors
    /// - [`DbError::Domain`] with [`CoreError::InsufficientStock`] if the
    ///   guarded decrement finds less stock than requested
    /// - [`DbError::NotFound`] if the article does not exist
    pub async fn create_rental(&self, request: &RentalRequest) -> DbResult<Rental> {
        validate_rental_request(request).map_err(CoreError::from)?;

        let mut tx = self.pool.begin().await?;

        // rate and stock read inside the transaction; the stock value is
        // advisory (error reporting), the decrement below is the arbiter
        let article: Option<(i64, i64)> =
            sqlx::query_as("SELECT tarif, quantiteStock FROM article WHERE idArticle = ?")
                .bind(request.article_id)
                .fetch_optional(&mut *tx)
                .await?;
        let (rate_cents, available) =
            article.ok_or_else(|| DbError::not_found("Article", request.article_id))?;

        let amount = Money::from_cents(rate_cents) * request.quantity;
        let now = Utc::now();

        let invoice = BillingRepository::new(self.pool.clone())
            .insert_invoice(&mut tx, amount, now)
            .await?;

        let result = sqlx::query(
            "INSERT INTO location \
                 (dateLocation, dateDebutLocation, dateFinLocation, dateRetourArticle, \
                  idUser, idEtatLocation, idFacture) \
             VALUES (?, ?, ?, NULL, ?, ?, ?)",
        )
        .bind(now)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.user_id)
        .bind(RentalState::Paid.code())
        .bind(invoice.id)
        .execute(&mut *tx)
        .await?;
        let rental_id = result.last_insert_rowid();

        sqlx::query("INSERT INTO locationarticle (idLocation, idArticle, quantite) VALUES (?, ?, ?)")
            .bind(rental_id)
            .bind(request.article_id)
            .bind(request.quantity)
            .execute(&mut *tx)
            .await?;

        // guarded decrement: zero rows means another reservation got there
        // first (or stock was short all along)
        let decremented = sqlx::query(
            "UPDATE article SET quantiteStock = quantiteStock - ? \
             WHERE idArticle = ? AND quantiteStock >= ?",
        )
        .bind(request.quantity)
        .bind(request.article_id)
        .bind(request.quantity)
        .execute(&mut *tx)
        .await?;

        if decremented.rows_affected() == 0 {
            warn!(
                article_id = request.article_id,
                available,
                requested = request.quantity,
                "Reservation rejected: insufficient stock"
            );
            // dropping tx rolls back the invoice and rental rows
            return Err(CoreError::InsufficientStock {
                article_id: request.article_id,
                available,
                requested: request.quantity,
            }
            .into());
        }

        tx.commit().await?;

        info!(
            rental_id,
            user_id = request.user_id,
            article_id = request.article_id,
            quantity = request.quantity,
            amount = %amount,
            "Rental created"
        );

        Ok(Rental {
            id: rental_id,
            created_at: now,
            start_date: request.start_date,
            end_date: request.end_date,
            returned_at: None,
            user_id: request.user_id,
            state: RentalState::Paid,
            invoice,
        })
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Cancels a rental and restores its article quantities to stock.
    ///
    /// Allowed from [`RentalState::Paid`] and [`RentalState::PendingPayment`]
    /// only. The caller's copy is pre-checked to fail fast; the UPDATE
    /// re-checks against the stored state so a stale copy cannot cancel a
    /// rental that already moved on.
    pub async fn cancel_rental(&self, rental: &Rental) -> DbResult<()> {
        if !rental.state.can_cancel() {
            return Err(CoreError::StateConflict {
                rental_id: rental.id,
                state: rental.state,
                operation: "cancel",
            }
            .into());
        }

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE location SET idEtatLocation = ? \
             WHERE idLocation = ? AND idEtatLocation IN (?, ?)",
        )
        .bind(RentalState::Cancelled.code())
        .bind(rental.id)
        .bind(RentalState::PendingPayment.code())
        .bind(RentalState::Paid.code())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self
                .stale_state_error(&mut *tx, rental.id, "cancel")
                .await?);
        }

        // every reserved quantity goes back on the shelf
        sqlx::query(
            "UPDATE article \
             SET quantiteStock = quantiteStock + \
                 (SELECT la.quantite FROM locationarticle la \
                  WHERE la.idLocation = ? AND la.idArticle = article.idArticle) \
             WHERE idArticle IN \
                 (SELECT idArticle FROM locationarticle WHERE idLocation = ?)",
        )
        .bind(rental.id)
        .bind(rental.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(rental_id = rental.id, "Rental cancelled, stock restored");
        Ok(())
    }

    /// Changes the rental period in place.
    ///
    /// Allowed while the rental could still be cancelled; once the equipment
    /// is out, dates are fixed.
    pub async fn update_dates(
        &self,
        rental: &Rental,
        new_start: NaiveDate,
        new_end: NaiveDate,
    ) -> DbResult<()> {
        if !rental.state.can_change_dates() {
            return Err(CoreError::StateConflict {
                rental_id: rental.id,
                state: rental.state,
                operation: "change dates",
            }
            .into());
        }
        validate_rental_period(new_start, new_end).map_err(CoreError::from)?;

        let result = sqlx::query(
            "UPDATE location SET dateDebutLocation = ?, dateFinLocation = ? \
             WHERE idLocation = ? AND idEtatLocation IN (?, ?)",
        )
        .bind(new_start)
        .bind(new_end)
        .bind(rental.id)
        .bind(RentalState::PendingPayment.code())
        .bind(RentalState::Paid.code())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self
                .stale_state_error(&self.pool, rental.id, "change dates")
                .await?);
        }

        debug!(rental_id = rental.id, %new_start, %new_end, "Rental dates changed");
        Ok(())
    }

    /// Marks the equipment as returned, stamping the return time.
    ///
    /// Allowed from [`RentalState::Paid`] and [`RentalState::InProgress`].
    /// Stock is not restored here; only cancellation returns quantities to
    /// the catalog.
    pub async fn mark_returned(&self, rental: &Rental) -> DbResult<()> {
        if !rental.state.can_return() {
            return Err(CoreError::StateConflict {
                rental_id: rental.id,
                state: rental.state,
                operation: "mark returned",
            }
            .into());
        }

        let result = sqlx::query(
            "UPDATE location SET idEtatLocation = ?, dateRetourArticle = ? \
             WHERE idLocation = ? AND idEtatLocation IN (?, ?)",
        )
        .bind(RentalState::Returned.code())
        .bind(Utc::now())
        .bind(rental.id)
        .bind(RentalState::Paid.code())
        .bind(RentalState::InProgress.code())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self
                .stale_state_error(&self.pool, rental.id, "mark returned")
                .await?);
        }

        info!(rental_id = rental.id, "Rental marked returned");
        Ok(())
    }

    /// Builds the error for a conditional UPDATE that matched nothing:
    /// either the rental is gone, or its stored state forbids the operation.
    async fn stale_state_error<'e, E>(
        &self,
        executor: E,
        rental_id: i64,
        operation: &'static str,
    ) -> DbResult<DbError>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let code: Option<i64> =
            sqlx::query_scalar("SELECT idEtatLocation FROM location WHERE idLocation = ?")
                .bind(rental_id)
                .fetch_optional(executor)
                .await?;

        Ok(match code.and_then(RentalState::from_code) {
            Some(state) => CoreError::StateConflict {
                rental_id,
                state,
                operation,
            }
            .into(),
            None => DbError::not_found("Rental", rental_id),
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Fetches a single rental (with its invoice) by id.
    pub async fn get_rental(&self, id: i64) -> DbResult<Option<Rental>> {
        let row: Option<RentalRow> =
            sqlx::query_as(&format!("{RENTAL_SELECT} WHERE l.idLocation = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Rental::from))
    }

    /// Lists one user's rentals with their invoices, newest first.
    pub async fn rentals_for_user(&self, user_id: i64) -> DbResult<Vec<Rental>> {
        debug!(user_id, "Listing rentals for user");

        let rows: Vec<RentalRow> = sqlx::query_as(&format!(
            "{RENTAL_SELECT} WHERE l.idUser = ? ORDER BY l.dateLocation DESC, l.idLocation DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Rental::from).collect())
    }

    /// Lists the article lines of one rental.
    pub async fn articles_for_rental(&self, rental_id: i64) -> DbResult<Vec<RentalArticle>> {
        let rows: Vec<(i64, i64, String, String, i64, i64, Option<String>, i64, String)> =
            sqlx::query_as(
                "SELECT la.quantite, \
                        a.idArticle, a.nomArticle, a.description, a.tarif, a.quantiteStock, \
                        a.image, c.idCategorie, c.nomCategorie \
                 FROM locationarticle la \
                 INNER JOIN article a ON a.idArticle = la.idArticle \
                 INNER JOIN categorie c ON c.idCategorie = a.idCategorie \
                 WHERE la.idLocation = ? \
                 ORDER BY a.nomArticle",
            )
            .bind(rental_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(
                |(
                    quantity,
                    id,
                    name,
                    description,
                    price_cents,
                    stock_quantity,
                    image,
                    category_id,
                    category_name,
                )| RentalArticle {
                    rental_id,
                    article: Article {
                        id,
                        name,
                        description,
                        price_cents,
                        stock_quantity,
                        image,
                        category: Category {
                            id: category_id,
                            name: category_name,
                        },
                    },
                    quantity,
                },
            )
            .collect())
    }
}
