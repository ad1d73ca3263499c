//! # Directory Repository
//!
//! Database operations for cities, accounts, and the rental-state
//! reference table.
//!
//! ## Credential Handling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Password Lifecycle                             │
//! │                                                                     │
//! │  register(registration)                                             │
//! │     │                                                               │
//! │     ▼                                                               │
//! │  bcrypt::hash(password, COST) ── salted, cost 12                    │
//! │     │                                                               │
//! │     ▼                                                               │
//! │  INSERT INTO user (.., password = <hash>, ..)                       │
//! │                                                                     │
//! │  authenticate(login, password)                                      │
//! │     │                                                               │
//! │     ▼                                                               │
//! │  SELECT password WHERE login = ?  ──►  bcrypt::verify               │
//! │     │                                       │                       │
//! │     │ no row                                │ mismatch              │
//! │     ▼                                       ▼                       │
//! │  Ok(None) ◄─────────────────────────── Ok(None)                     │
//! │                                                                     │
//! │  Unknown login and wrong password are indistinguishable to the      │
//! │  caller. The clear-text secret and the hash never leave this        │
//! │  module; User carries neither.                                      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use ridgeline_core::validation::{validate_postal_code, validate_registration};
use ridgeline_core::{City, CoreError, Registration, RentalState, User};

use crate::error::{DbError, DbResult};

/// Work factor for credential hashing. 2^12 rounds.
const BCRYPT_COST: u32 = 12;

/// Repository for city, account, and rental-state operations.
#[derive(Debug, Clone)]
pub struct DirectoryRepository {
    pool: SqlitePool,
}

// =============================================================================
// Row Mapping
// =============================================================================

/// Flat projection of `user` joined with `ville`. Deliberately omits the
/// password column.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    last_name: String,
    first_name: String,
    email: String,
    login: String,
    birth_date: chrono::NaiveDate,
    address: String,
    is_employee: bool,
    city_id: i64,
    city_name: String,
    postal_code: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            last_name: row.last_name,
            first_name: row.first_name,
            email: row.email,
            login: row.login,
            birth_date: row.birth_date,
            address: row.address,
            is_employee: row.is_employee,
            city: City {
                id: row.city_id,
                name: row.city_name,
                postal_code: row.postal_code,
            },
        }
    }
}

const USER_SELECT: &str = "\
    SELECT u.idUser     AS id, \
           u.nom        AS last_name, \
           u.prenom     AS first_name, \
           u.email      AS email, \
           u.login      AS login, \
           u.dateNaiss  AS birth_date, \
           u.adresse    AS address, \
           u.estEmploye AS is_employee, \
           v.idVille    AS city_id, \
           v.nomVille   AS city_name, \
           v.codePostal AS postal_code \
    FROM user u \
    INNER JOIN ville v ON v.idVille = u.idVille";

impl DirectoryRepository {
    /// Creates a new directory repository with the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        DirectoryRepository { pool }
    }

    // =========================================================================
    // Cities
    // =========================================================================

    /// Lists all cities, ordered by name.
    pub async fn list_cities(&self) -> DbResult<Vec<City>> {
        let rows: Vec<(i64, String, String)> = sqlx::query_as(
            "SELECT idVille, nomVille, codePostal FROM ville ORDER BY nomVille",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, postal_code)| City {
                id,
                name,
                postal_code,
            })
            .collect())
    }

    /// Adds a city, or returns the existing one.
    ///
    /// Matching is case-insensitive on the name; (name, postal code) pairs
    /// are the unit of identity, so "Massy 91300" and "Massy 91305" are
    /// distinct cities.
    pub async fn add_city(&self, name: &str, postal_code: &str) -> DbResult<City> {
        validate_postal_code(postal_code).map_err(CoreError::from)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::from(
                ridgeline_core::ValidationError::Required { field: "city name" },
            )
            .into());
        }
        let postal_code = postal_code.trim();

        let existing: Option<(i64, String, String)> = sqlx::query_as(
            "SELECT idVille, nomVille, codePostal FROM ville \
             WHERE LOWER(nomVille) = LOWER(?) AND codePostal = ?",
        )
        .bind(name)
        .bind(postal_code)
        .fetch_optional(&self.pool)
        .await?;

        if let Some((id, name, postal_code)) = existing {
            debug!(city_id = id, "City already present, reusing");
            return Ok(City {
                id,
                name,
                postal_code,
            });
        }

        let result = sqlx::query("INSERT INTO ville (nomVille, codePostal) VALUES (?, ?)")
            .bind(name)
            .bind(postal_code)
            .execute(&self.pool)
            .await?;

        let id = result.last_insert_rowid();
        info!(city_id = id, name, postal_code, "City created");

        Ok(City {
            id,
            name: name.to_string(),
            postal_code: postal_code.to_string(),
        })
    }

    // =========================================================================
    // Rental States
    // =========================================================================

    /// Lists all rental states from the seeded reference table, in code
    /// order.
    pub async fn list_rental_states(&self) -> DbResult<Vec<RentalState>> {
        let codes: Vec<i64> = sqlx::query_scalar(
            "SELECT idEtatLocation FROM etatlocation ORDER BY idEtatLocation",
        )
        .fetch_all(&self.pool)
        .await?;

        codes
            .into_iter()
            .map(|code| {
                RentalState::from_code(code).ok_or_else(|| {
                    DbError::Internal(format!("unknown rental state code {code}"))
                })
            })
            .collect()
    }

    /// Resolves a rental state from its reference-table label.
    pub async fn state_by_label(&self, label: &str) -> DbResult<Option<RentalState>> {
        let code: Option<i64> = sqlx::query_scalar(
            "SELECT idEtatLocation FROM etatlocation WHERE nomEtatLocation = ?",
        )
        .bind(label)
        .fetch_optional(&self.pool)
        .await?;

        match code {
            None => Ok(None),
            Some(code) => RentalState::from_code(code)
                .map(Some)
                .ok_or_else(|| DbError::Internal(format!("unknown rental state code {code}"))),
        }
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Verifies a login/password pair.
    ///
    /// Returns `Ok(None)` for an unknown login and for a wrong password
    /// alike; only infrastructure failures surface as errors.
    pub async fn authenticate(&self, login: &str, password: &str) -> DbResult<Option<User>> {
        let stored: Option<String> =
            sqlx::query_scalar("SELECT password FROM user WHERE login = ?")
                .bind(login)
                .fetch_optional(&self.pool)
                .await?;

        let Some(hash) = stored else {
            debug!(login, "Authentication failed: unknown login");
            return Ok(None);
        };

        if !bcrypt::verify(password, &hash)? {
            warn!(login, "Authentication failed: bad credentials");
            return Ok(None);
        }

        let row: Option<UserRow> = sqlx::query_as(&format!("{USER_SELECT} WHERE u.login = ?"))
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;

        info!(login, "Authentication succeeded");
        Ok(row.map(User::from))
    }

    /// Registers a new customer account.
    ///
    /// The password is hashed with bcrypt before storage; accounts created
    /// here are always customers, never employees.
    ///
    /// ## Errors
    /// - [`DbError::Domain`] if the registration fails validation
    /// - [`DbError::UniqueViolation`] if the login is taken
    /// - [`DbError::NotFound`] if the city does not exist
    pub async fn register(&self, registration: &Registration, city_id: i64) -> DbResult<User> {
        validate_registration(registration).map_err(CoreError::from)?;

        if self.login_exists(&registration.login).await? {
            return Err(DbError::duplicate("login", &registration.login));
        }

        let city_known: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ville WHERE idVille = ?")
            .bind(city_id)
            .fetch_one(&self.pool)
            .await?;
        if city_known == 0 {
            return Err(DbError::not_found("City", city_id));
        }

        let hash = bcrypt::hash(&registration.password, BCRYPT_COST)?;

        let result = sqlx::query(
            "INSERT INTO user \
                 (nom, prenom, email, login, password, dateNaiss, adresse, estEmploye, idVille) \
             VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?)",
        )
        .bind(registration.last_name.trim())
        .bind(registration.first_name.trim())
        .bind(registration.email.trim())
        .bind(registration.login.trim())
        .bind(&hash)
        .bind(registration.birth_date)
        .bind(registration.address.trim())
        .bind(city_id)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(user_id = id, login = %registration.login, "Account registered");

        self.get_user(id)
            .await?
            .ok_or_else(|| DbError::Internal("user vanished after insert".to_string()))
    }

    /// Fetches a single user by id.
    pub async fn get_user(&self, id: i64) -> DbResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!("{USER_SELECT} WHERE u.idUser = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::from))
    }

    /// Lists all customer accounts (non-employees), ordered by last name.
    pub async fn list_customers(&self) -> DbResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "{USER_SELECT} WHERE u.estEmploye = 0 ORDER BY u.nom, u.prenom"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Checks whether a login is already taken.
    pub async fn login_exists(&self, login: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user WHERE login = ?")
            .bind(login.trim())
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn registration(login: &str) -> Registration {
        Registration {
            last_name: "Martin".to_string(),
            first_name: "Sam".to_string(),
            email: "sam@example.org".to_string(),
            login: login.to_string(),
            password: "correct horse".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 4, 2).unwrap(),
            address: "12 rue des Pins".to_string(),
        }
    }

    #[tokio::test]
    async fn city_dedup_is_case_insensitive() {
        let db = test_db().await;
        let directory = db.directory();

        let first = directory.add_city("Massy", "91300").await.unwrap();
        let again = directory.add_city("MASSY", "91300").await.unwrap();
        assert_eq!(first.id, again.id);
        // stored spelling wins
        assert_eq!(again.name, "Massy");

        // same name, different postal code: a distinct city
        let other = directory.add_city("Massy", "91305").await.unwrap();
        assert_ne!(first.id, other.id);

        assert_eq!(directory.list_cities().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn bad_postal_code_rejected() {
        let db = test_db().await;
        let err = db.directory().add_city("Massy", "913").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));
    }

    #[tokio::test]
    async fn rental_states_match_the_enum() {
        let db = test_db().await;
        let directory = db.directory();

        let states = directory.list_rental_states().await.unwrap();
        assert_eq!(states, RentalState::ALL.to_vec());

        assert_eq!(
            directory.state_by_label("Cancelled").await.unwrap(),
            Some(RentalState::Cancelled)
        );
        assert_eq!(directory.state_by_label("Nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn register_then_authenticate() {
        let db = test_db().await;
        let directory = db.directory();

        let city = directory.add_city("Massy", "91300").await.unwrap();
        let user = directory
            .register(&registration("sam"), city.id)
            .await
            .unwrap();
        assert!(!user.is_employee);
        assert_eq!(user.city.postal_code, "91300");

        let ok = directory.authenticate("sam", "correct horse").await.unwrap();
        assert_eq!(ok.map(|u| u.id), Some(user.id));

        // wrong password and unknown login are both None, not errors
        assert!(directory.authenticate("sam", "wrong").await.unwrap().is_none());
        assert!(directory
            .authenticate("nobody", "correct horse")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn duplicate_login_rejected() {
        let db = test_db().await;
        let directory = db.directory();

        let city = directory.add_city("Massy", "91300").await.unwrap();
        directory.register(&registration("sam"), city.id).await.unwrap();

        let err = directory
            .register(&registration("sam"), city.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn register_requires_existing_city() {
        let db = test_db().await;
        let err = db
            .directory()
            .register(&registration("sam"), 999)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
