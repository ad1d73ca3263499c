//! # Catalog Repository
//!
//! Database operations for articles and their categories.
//!
//! ## Responsibilities
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     CatalogRepository                               │
//! │                                                                     │
//! │  Articles                          Categories                       │
//! │  ├── list_articles()               ├── list_categories()            │
//! │  ├── articles_by_category(id)      ├── create_category(name)        │
//! │  ├── get_article(id)               └── category_exists(name)        │
//! │  ├── create_article(draft)                                          │
//! │  ├── update_article(article)       Guards                           │
//! │  └── delete_article(id)            ├── article_name_exists(..)      │
//! │                                    ├── article_name_taken_by_other  │
//! │                                    └── is_article_in_use(id)        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Uniqueness
//! Article names are unique per category (a "Tent 2P" may exist under both
//! Camping and Promotions); category names are unique globally. Writes run
//! an explicit existence check first so callers get a typed
//! [`DbError::UniqueViolation`] instead of a raw constraint message, and the
//! schema-level UNIQUE constraints back the check up under concurrency.

use sqlx::SqlitePool;
use tracing::{debug, info};

use ridgeline_core::validation::{validate_article_draft, validate_category_name};
use ridgeline_core::{Article, ArticleDraft, Category, CoreError};

use crate::error::{DbError, DbResult};

/// Repository for article and category operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

// =============================================================================
// Row Mapping
// =============================================================================

/// Flat projection of `article` joined with `categorie`.
#[derive(sqlx::FromRow)]
struct ArticleRow {
    id: i64,
    name: String,
    description: String,
    price_cents: i64,
    stock_quantity: i64,
    image: Option<String>,
    category_id: i64,
    category_name: String,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: row.id,
            name: row.name,
            description: row.description,
            price_cents: row.price_cents,
            stock_quantity: row.stock_quantity,
            image: row.image,
            category: Category {
                id: row.category_id,
                name: row.category_name,
            },
        }
    }
}

/// Shared SELECT for all article reads; every article carries its category.
const ARTICLE_SELECT: &str = "\
    SELECT a.idArticle      AS id, \
           a.nomArticle     AS name, \
           a.description    AS description, \
           a.tarif          AS price_cents, \
           a.quantiteStock  AS stock_quantity, \
           a.image          AS image, \
           c.idCategorie    AS category_id, \
           c.nomCategorie   AS category_name \
    FROM article a \
    INNER JOIN categorie c ON c.idCategorie = a.idCategorie";

impl CatalogRepository {
    /// Creates a new catalog repository with the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Article Reads
    // =========================================================================

    /// Lists all articles with their categories, ordered by name.
    pub async fn list_articles(&self) -> DbResult<Vec<Article>> {
        debug!("Listing all articles");

        let rows: Vec<ArticleRow> =
            sqlx::query_as(&format!("{ARTICLE_SELECT} ORDER BY a.nomArticle"))
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    /// Lists the articles belonging to one category, ordered by name.
    pub async fn articles_by_category(&self, category_id: i64) -> DbResult<Vec<Article>> {
        debug!(category_id, "Listing articles by category");

        let rows: Vec<ArticleRow> = sqlx::query_as(&format!(
            "{ARTICLE_SELECT} WHERE a.idCategorie = ? ORDER BY a.nomArticle"
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    /// Fetches a single article by id.
    pub async fn get_article(&self, id: i64) -> DbResult<Option<Article>> {
        let row: Option<ArticleRow> =
            sqlx::query_as(&format!("{ARTICLE_SELECT} WHERE a.idArticle = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Article::from))
    }

    // =========================================================================
    // Article Writes
    // =========================================================================

    /// Creates a new article.
    ///
    /// ## Errors
    /// - [`DbError::Domain`] if the draft fails validation
    /// - [`DbError::UniqueViolation`] if the name is taken within the category
    /// - [`DbError::ForeignKeyViolation`] if the category does not exist
    pub async fn create_article(&self, draft: &ArticleDraft) -> DbResult<Article> {
        validate_article_draft(draft).map_err(CoreError::from)?;

        if self
            .article_name_exists(&draft.name, draft.category_id)
            .await?
        {
            return Err(DbError::duplicate("article name", &draft.name));
        }

        let result = sqlx::query(
            "INSERT INTO article \
                 (nomArticle, description, tarif, quantiteStock, image, idCategorie) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(draft.name.trim())
        .bind(&draft.description)
        .bind(draft.price_cents)
        .bind(draft.stock_quantity)
        .bind(&draft.image)
        .bind(draft.category_id)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(article_id = id, name = %draft.name, "Article created");

        self.get_article(id)
            .await?
            .ok_or_else(|| DbError::Internal("article vanished after insert".to_string()))
    }

    /// Updates an existing article in place.
    ///
    /// ## Errors
    /// - [`DbError::UniqueViolation`] if renaming collides with another
    ///   article in the target category
    /// - [`DbError::NotFound`] if the article no longer exists
    pub async fn update_article(&self, article: &Article) -> DbResult<()> {
        let draft = ArticleDraft {
            name: article.name.clone(),
            description: article.description.clone(),
            price_cents: article.price_cents,
            stock_quantity: article.stock_quantity,
            image: article.image.clone(),
            category_id: article.category.id,
        };
        validate_article_draft(&draft).map_err(CoreError::from)?;

        if self
            .article_name_taken_by_other(&article.name, article.category.id, article.id)
            .await?
        {
            return Err(DbError::duplicate("article name", &article.name));
        }

        let result = sqlx::query(
            "UPDATE article \
             SET nomArticle = ?, description = ?, tarif = ?, quantiteStock = ?, \
                 image = ?, idCategorie = ? \
             WHERE idArticle = ?",
        )
        .bind(article.name.trim())
        .bind(&article.description)
        .bind(article.price_cents)
        .bind(article.stock_quantity)
        .bind(&article.image)
        .bind(article.category.id)
        .bind(article.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Article", article.id));
        }

        info!(article_id = article.id, "Article updated");
        Ok(())
    }

    /// Deletes an article.
    ///
    /// Refused while any rental references it, including returned and
    /// cancelled ones; rental history outlives the catalog entry.
    pub async fn delete_article(&self, id: i64) -> DbResult<()> {
        if self.is_article_in_use(id).await? {
            return Err(DbError::InUse {
                entity: "Article",
                id,
            });
        }

        let result = sqlx::query("DELETE FROM article WHERE idArticle = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Article", id));
        }

        info!(article_id = id, "Article deleted");
        Ok(())
    }

    // =========================================================================
    // Guards
    // =========================================================================

    /// Checks whether an article name is already taken within a category.
    ///
    /// Used before INSERT, where there is no own row to exclude.
    pub async fn article_name_exists(&self, name: &str, category_id: i64) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM article WHERE nomArticle = ? AND idCategorie = ?",
        )
        .bind(name.trim())
        .bind(category_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Checks whether an article name is taken by a *different* article
    /// within a category.
    ///
    /// Used before UPDATE; an article keeping its own name is not a
    /// collision.
    pub async fn article_name_taken_by_other(
        &self,
        name: &str,
        category_id: i64,
        exclude_id: i64,
    ) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM article \
             WHERE nomArticle = ? AND idCategorie = ? AND idArticle <> ?",
        )
        .bind(name.trim())
        .bind(category_id)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Checks whether any rental line references the article.
    pub async fn is_article_in_use(&self, id: i64) -> DbResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM locationarticle WHERE idArticle = ?")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Lists all categories, ordered by name.
    pub async fn list_categories(&self) -> DbResult<Vec<Category>> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT idCategorie, nomCategorie FROM categorie ORDER BY nomCategorie",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| Category { id, name })
            .collect())
    }

    /// Creates a new category.
    ///
    /// ## Errors
    /// - [`DbError::UniqueViolation`] if the name already exists
    pub async fn create_category(&self, name: &str) -> DbResult<Category> {
        validate_category_name(name).map_err(CoreError::from)?;

        if self.category_exists(name).await? {
            return Err(DbError::duplicate("category name", name));
        }

        let result = sqlx::query("INSERT INTO categorie (nomCategorie) VALUES (?)")
            .bind(name.trim())
            .execute(&self.pool)
            .await?;

        let id = result.last_insert_rowid();
        info!(category_id = id, name, "Category created");

        Ok(Category {
            id,
            name: name.trim().to_string(),
        })
    }

    /// Checks whether a category name already exists.
    pub async fn category_exists(&self, name: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categorie WHERE nomCategorie = ?")
            .bind(name.trim())
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

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn draft(name: &str, category_id: i64) -> ArticleDraft {
        ArticleDraft {
            name: name.to_string(),
            description: "test article".to_string(),
            price_cents: 5000,
            stock_quantity: 3,
            image: None,
            category_id,
        }
    }

    #[tokio::test]
    async fn create_and_list_articles() {
        let db = test_db().await;
        let catalog = db.catalog();

        let camping = catalog.create_category("Camping").await.unwrap();
        let skiing = catalog.create_category("Skiing").await.unwrap();

        catalog.create_article(&draft("Tent 2P", camping.id)).await.unwrap();
        catalog.create_article(&draft("Alpine skis", skiing.id)).await.unwrap();

        let all = catalog.list_articles().await.unwrap();
        assert_eq!(all.len(), 2);
        // ordered by name
        assert_eq!(all[0].name, "Alpine skis");
        assert_eq!(all[0].category.name, "Skiing");

        let by_cat = catalog.articles_by_category(camping.id).await.unwrap();
        assert_eq!(by_cat.len(), 1);
        assert_eq!(by_cat[0].name, "Tent 2P");
    }

    #[tokio::test]
    async fn duplicate_article_name_rejected_per_category() {
        let db = test_db().await;
        let catalog = db.catalog();

        let camping = catalog.create_category("Camping").await.unwrap();
        let promo = catalog.create_category("Promotions").await.unwrap();

        catalog.create_article(&draft("Tent 2P", camping.id)).await.unwrap();

        // same name, same category: rejected
        let err = catalog
            .create_article(&draft("Tent 2P", camping.id))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // same name, different category: fine
        catalog.create_article(&draft("Tent 2P", promo.id)).await.unwrap();
    }

    #[tokio::test]
    async fn update_checks_collisions_but_allows_own_name() {
        let db = test_db().await;
        let catalog = db.catalog();

        let camping = catalog.create_category("Camping").await.unwrap();
        let tent = catalog.create_article(&draft("Tent 2P", camping.id)).await.unwrap();
        let stove = catalog.create_article(&draft("Stove", camping.id)).await.unwrap();

        // keeping its own name is not a collision
        let mut updated = tent.clone();
        updated.price_cents = 6000;
        catalog.update_article(&updated).await.unwrap();
        assert_eq!(
            catalog.get_article(tent.id).await.unwrap().unwrap().price_cents,
            6000
        );

        // renaming onto a sibling is
        let mut renamed = stove.clone();
        renamed.name = "Tent 2P".to_string();
        let err = catalog.update_article(&renamed).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn duplicate_category_rejected() {
        let db = test_db().await;
        let catalog = db.catalog();

        catalog.create_category("Camping").await.unwrap();
        let err = catalog.create_category("Camping").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn delete_unused_article() {
        let db = test_db().await;
        let catalog = db.catalog();

        let camping = catalog.create_category("Camping").await.unwrap();
        let tent = catalog.create_article(&draft("Tent 2P", camping.id)).await.unwrap();

        catalog.delete_article(tent.id).await.unwrap();
        assert!(catalog.get_article(tent.id).await.unwrap().is_none());

        // second delete: gone
        let err = catalog.delete_article(tent.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn invalid_draft_rejected_before_write() {
        let db = test_db().await;
        let catalog = db.catalog();

        let camping = catalog.create_category("Camping").await.unwrap();

        let mut bad = draft("", camping.id);
        let err = catalog.create_article(&bad).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));

        bad = draft("Tent 2P", camping.id);
        bad.price_cents = -1;
        let err = catalog.create_article(&bad).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));

        assert!(catalog.list_articles().await.unwrap().is_empty());
    }
}
