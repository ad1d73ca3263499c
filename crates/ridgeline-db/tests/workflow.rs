//! End-to-end tests for the rental workflow against an in-memory database.
//!
//! Each test builds its own catalog and customer, then drives the workflow
//! through the public repository API only; assertions read back through the
//! same API (plus raw row counts where atomicity is the point).

use chrono::NaiveDate;
use ridgeline_core::{ArticleDraft, CoreError, RentalRequest, RentalState};
use ridgeline_db::{Database, DbConfig, DbError};

async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Inserts a customer row directly; bcrypt at cost 12 is too slow to run in
/// every test and credentials are not under test here.
async fn insert_customer(db: &Database, login: &str) -> i64 {
    sqlx::query("INSERT INTO ville (nomVille, codePostal) VALUES (?, ?)")
        .bind(format!("City-{login}"))
        .bind("91300")
        .execute(db.pool())
        .await
        .unwrap();

    let result = sqlx::query(
        "INSERT INTO user (nom, prenom, email, login, password, dateNaiss, adresse, estEmploye, idVille) \
         VALUES ('Martin', 'Sam', 'sam@example.org', ?, 'not-a-real-hash', '1990-04-02', '12 rue des Pins', 0, \
                 (SELECT idVille FROM ville WHERE nomVille = ?))",
    )
    .bind(login)
    .bind(format!("City-{login}"))
    .execute(db.pool())
    .await
    .unwrap();

    result.last_insert_rowid()
}

/// Creates a category and an article, returning the article id.
async fn insert_article(db: &Database, name: &str, rate_cents: i64, stock: i64) -> i64 {
    let catalog = db.catalog();
    let category = match catalog.create_category("Camping").await {
        Ok(c) => c,
        // already created by an earlier helper call in the same test
        Err(_) => catalog
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .find(|c| c.name == "Camping")
            .unwrap(),
    };

    catalog
        .create_article(&ArticleDraft {
            name: name.to_string(),
            description: format!("{name} for testing"),
            price_cents: rate_cents,
            stock_quantity: stock,
            image: None,
            category_id: category.id,
        })
        .await
        .unwrap()
        .id
}

async fn stock_of(db: &Database, article_id: i64) -> i64 {
    db.catalog()
        .get_article(article_id)
        .await
        .unwrap()
        .unwrap()
        .stock_quantity
}

async fn count(db: &Database, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(db.pool())
        .await
        .unwrap()
}

fn request(user_id: i64, article_id: i64, quantity: i64) -> RentalRequest {
    RentalRequest {
        start_date: date(2026, 7, 10),
        end_date: date(2026, 7, 12),
        quantity,
        user_id,
        article_id,
    }
}

// =============================================================================
// Creation
// =============================================================================

#[tokio::test]
async fn create_rental_reserves_stock_and_invoices() {
    let db = test_db().await;
    let user_id = insert_customer(&db, "sam").await;
    let tent = insert_article(&db, "Tent 2P", 5000, 3).await;

    let rental = db.rentals().create_rental(&request(user_id, tent, 2)).await.unwrap();

    assert_eq!(rental.state, RentalState::Paid);
    assert_eq!(rental.invoice.amount_cents, 10_000); // 50.00 × 2
    assert!(rental.returned_at.is_none());
    assert_eq!(stock_of(&db, tent).await, 1);

    // reads back identically through the user's history
    let history = db.rentals().rentals_for_user(user_id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, rental.id);
    assert_eq!(history[0].invoice.id, rental.invoice.id);
    assert_eq!(history[0].invoice.amount_cents, 10_000);
    assert_eq!(history[0].start_date, date(2026, 7, 10));
    assert_eq!(history[0].end_date, date(2026, 7, 12));

    let lines = db.rentals().articles_for_rental(rental.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 2);
    assert_eq!(lines[0].article.id, tent);

    // the invoice is reachable from billing too
    let invoice = db.billing().invoice_for_rental(rental.id).await.unwrap().unwrap();
    assert_eq!(invoice.id, rental.invoice.id);
    assert_eq!(invoice.amount_cents, rental.invoice.amount_cents);
}

#[tokio::test]
async fn create_rental_allows_taking_entire_stock() {
    let db = test_db().await;
    let user_id = insert_customer(&db, "sam").await;
    let tent = insert_article(&db, "Tent 2P", 5000, 3).await;

    db.rentals().create_rental(&request(user_id, tent, 3)).await.unwrap();
    assert_eq!(stock_of(&db, tent).await, 0);

    // next customer finds the shelf empty
    let err = db
        .rentals()
        .create_rental(&request(user_id, tent, 1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::InsufficientStock {
            available: 0,
            requested: 1,
            ..
        })
    ));
}

#[tokio::test]
async fn overdraw_rolls_back_everything() {
    let db = test_db().await;
    let user_id = insert_customer(&db, "sam").await;
    let tent = insert_article(&db, "Tent 2P", 5000, 3).await;

    let err = db
        .rentals()
        .create_rental(&request(user_id, tent, 4))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::InsufficientStock {
            available: 3,
            requested: 4,
            ..
        })
    ));

    // nothing survives the rollback: no orphan invoice, rental, or line
    assert_eq!(count(&db, "facture").await, 0);
    assert_eq!(count(&db, "location").await, 0);
    assert_eq!(count(&db, "locationarticle").await, 0);
    assert_eq!(stock_of(&db, tent).await, 3);
}

#[tokio::test]
async fn invalid_request_rejected_before_any_write() {
    let db = test_db().await;
    let user_id = insert_customer(&db, "sam").await;
    let tent = insert_article(&db, "Tent 2P", 5000, 3).await;

    let mut bad = request(user_id, tent, 2);
    bad.end_date = date(2026, 7, 9); // before start

    let err = db.rentals().create_rental(&bad).await.unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

    let bad = request(user_id, tent, 0);
    let err = db.rentals().create_rental(&bad).await.unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

    assert_eq!(count(&db, "facture").await, 0);
    assert_eq!(count(&db, "location").await, 0);
}

#[tokio::test]
async fn single_day_rental_is_valid() {
    let db = test_db().await;
    let user_id = insert_customer(&db, "sam").await;
    let tent = insert_article(&db, "Tent 2P", 5000, 3).await;

    let mut req = request(user_id, tent, 1);
    req.end_date = req.start_date;

    let rental = db.rentals().create_rental(&req).await.unwrap();
    assert_eq!(rental.start_date, rental.end_date);
}

#[tokio::test]
async fn unknown_article_is_not_found() {
    let db = test_db().await;
    let user_id = insert_customer(&db, "sam").await;

    let err = db
        .rentals()
        .create_rental(&request(user_id, 999, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));
    assert_eq!(count(&db, "facture").await, 0);
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn cancel_restores_stock_exactly_once() {
    let db = test_db().await;
    let user_id = insert_customer(&db, "sam").await;
    let tent = insert_article(&db, "Tent 2P", 5000, 3).await;

    let rental = db.rentals().create_rental(&request(user_id, tent, 2)).await.unwrap();
    assert_eq!(stock_of(&db, tent).await, 1);

    db.rentals().cancel_rental(&rental).await.unwrap();
    assert_eq!(stock_of(&db, tent).await, 3);

    let cancelled = db.rentals().get_rental(rental.id).await.unwrap().unwrap();
    assert_eq!(cancelled.state, RentalState::Cancelled);

    // second cancel with the refreshed copy: rejected by the pre-check
    let err = db.rentals().cancel_rental(&cancelled).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::StateConflict {
            state: RentalState::Cancelled,
            ..
        })
    ));

    // second cancel with the stale Paid copy: rejected by the stored state
    let err = db.rentals().cancel_rental(&rental).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::StateConflict {
            state: RentalState::Cancelled,
            ..
        })
    ));

    // stock restored exactly once either way
    assert_eq!(stock_of(&db, tent).await, 3);
}

#[tokio::test]
async fn cancel_after_return_is_a_state_conflict() {
    let db = test_db().await;
    let user_id = insert_customer(&db, "sam").await;
    let tent = insert_article(&db, "Tent 2P", 5000, 3).await;

    let rental = db.rentals().create_rental(&request(user_id, tent, 2)).await.unwrap();
    db.rentals().mark_returned(&rental).await.unwrap();

    // stale copy still says Paid; the stored Returned state wins
    let err = db.rentals().cancel_rental(&rental).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::StateConflict {
            state: RentalState::Returned,
            ..
        })
    ));

    // returned equipment does not flow back into stock by itself
    assert_eq!(stock_of(&db, tent).await, 1);
}

// =============================================================================
// Date Changes
// =============================================================================

#[tokio::test]
async fn dates_mutable_until_cancelled_or_returned() {
    let db = test_db().await;
    let user_id = insert_customer(&db, "sam").await;
    let tent = insert_article(&db, "Tent 2P", 5000, 3).await;

    let rental = db.rentals().create_rental(&request(user_id, tent, 1)).await.unwrap();

    db.rentals()
        .update_dates(&rental, date(2026, 7, 15), date(2026, 7, 20))
        .await
        .unwrap();

    let updated = db.rentals().get_rental(rental.id).await.unwrap().unwrap();
    assert_eq!(updated.start_date, date(2026, 7, 15));
    assert_eq!(updated.end_date, date(2026, 7, 20));
    // the invoice amount does not follow the dates
    assert_eq!(updated.invoice.amount_cents, rental.invoice.amount_cents);

    db.rentals().cancel_rental(&updated).await.unwrap();

    let err = db
        .rentals()
        .update_dates(&updated, date(2026, 8, 1), date(2026, 8, 2))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::StateConflict { .. })
    ));
}

#[tokio::test]
async fn date_change_rejects_inverted_period() {
    let db = test_db().await;
    let user_id = insert_customer(&db, "sam").await;
    let tent = insert_article(&db, "Tent 2P", 5000, 3).await;

    let rental = db.rentals().create_rental(&request(user_id, tent, 1)).await.unwrap();

    let err = db
        .rentals()
        .update_dates(&rental, date(2026, 7, 20), date(2026, 7, 15))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

    // untouched
    let stored = db.rentals().get_rental(rental.id).await.unwrap().unwrap();
    assert_eq!(stored.start_date, rental.start_date);
    assert_eq!(stored.end_date, rental.end_date);
}

// =============================================================================
// Returns
// =============================================================================

#[tokio::test]
async fn mark_returned_stamps_time_and_is_terminal() {
    let db = test_db().await;
    let user_id = insert_customer(&db, "sam").await;
    let tent = insert_article(&db, "Tent 2P", 5000, 3).await;

    let rental = db.rentals().create_rental(&request(user_id, tent, 2)).await.unwrap();
    db.rentals().mark_returned(&rental).await.unwrap();

    let returned = db.rentals().get_rental(rental.id).await.unwrap().unwrap();
    assert_eq!(returned.state, RentalState::Returned);
    assert!(returned.returned_at.is_some());

    // a second return attempt fails both fresh and stale
    for copy in [&returned, &rental] {
        let err = db.rentals().mark_returned(copy).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::StateConflict { .. })
        ));
    }

    // the first stamp is preserved
    let again = db.rentals().get_rental(rental.id).await.unwrap().unwrap();
    assert_eq!(again.returned_at, returned.returned_at);
}

// =============================================================================
// History
// =============================================================================

#[tokio::test]
async fn history_is_per_user_and_newest_first() {
    let db = test_db().await;
    let sam = insert_customer(&db, "sam").await;
    let ana = insert_customer(&db, "ana").await;
    let tent = insert_article(&db, "Tent 2P", 5000, 10).await;

    let first = db.rentals().create_rental(&request(sam, tent, 1)).await.unwrap();
    let second = db.rentals().create_rental(&request(sam, tent, 1)).await.unwrap();
    db.rentals().create_rental(&request(ana, tent, 1)).await.unwrap();

    let history = db.rentals().rentals_for_user(sam).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, second.id);
    assert_eq!(history[1].id, first.id);

    assert_eq!(db.rentals().rentals_for_user(ana).await.unwrap().len(), 1);
    // a user with no rentals gets an empty list, not an error
    assert!(db.rentals().rentals_for_user(999).await.unwrap().is_empty());
}

// =============================================================================
// Catalog Interaction
// =============================================================================

#[tokio::test]
async fn rented_article_cannot_be_deleted() {
    let db = test_db().await;
    let user_id = insert_customer(&db, "sam").await;
    let tent = insert_article(&db, "Tent 2P", 5000, 3).await;

    let rental = db.rentals().create_rental(&request(user_id, tent, 1)).await.unwrap();

    let err = db.catalog().delete_article(tent).await.unwrap_err();
    assert!(matches!(err, DbError::InUse { .. }));

    // history keeps the article pinned even after the rental ends
    db.rentals().mark_returned(&rental).await.unwrap();
    let err = db.catalog().delete_article(tent).await.unwrap_err();
    assert!(matches!(err, DbError::InUse { .. }));
}
