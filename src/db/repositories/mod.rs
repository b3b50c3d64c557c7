//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod agency;
pub mod article;
pub mod article_category;
pub mod blog_post;
pub mod category;
pub mod contact;
pub mod faq;
pub mod listing;
pub mod location;
pub mod session;
pub mod slider;
pub mod user;
pub mod video;
pub mod wishlist;

pub use agency::{AgencyRepository, SqlxAgencyRepository};
pub use article::{ArticleRepository, SqlxArticleRepository};
pub use article_category::{ArticleCategoryRepository, SqlxArticleCategoryRepository};
pub use blog_post::{BlogPostRepository, SqlxBlogPostRepository};
pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use contact::{ContactRepository, SqlxContactRepository};
pub use faq::{FaqRepository, SqlxFaqRepository};
pub use listing::{KindCount, ListingRepository, SqlxListingRepository};
pub use location::{LocationRepository, SqlxLocationRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use slider::{SliderRepository, SqlxSliderRepository};
pub use user::{SqlxUserRepository, UserRepository};
pub use video::{SqlxVideoRepository, VideoRepository};
pub use wishlist::{SqlxWishlistRepository, WishlistRepository};

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};

/// Decode a JSON text column. Blank columns decode to the type's default.
pub(crate) fn decode_json<T: DeserializeOwned + Default>(raw: &str, column: &str) -> Result<T> {
    if raw.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(raw).with_context(|| format!("Invalid JSON in column {}", column))
}

/// Encode a value for a JSON text column
pub(crate) fn encode_json<T: Serialize + ?Sized>(value: &T, column: &str) -> Result<String> {
    serde_json::to_string(value).with_context(|| format!("Failed to encode column {}", column))
}

/// Whether a repository error comes from a UNIQUE constraint
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<sqlx::Error>(),
            Some(sqlx::Error::Database(db)) if db.is_unique_violation()
        )
    })
}

/// Delete one row by primary key; `table` is always a fixed identifier.
pub(crate) async fn delete_by_id(pool: &DynDatabasePool, table: &str, id: i64) -> Result<bool> {
    let sql = format!("DELETE FROM {} WHERE id = ?", table);
    let result = match pool.driver() {
        DatabaseDriver::Sqlite => sqlx::query(&sql).bind(id).execute(pool.sqlite()?).await?.rows_affected(),
        DatabaseDriver::Mysql => sqlx::query(&sql).bind(id).execute(pool.mysql()?).await?.rows_affected(),
    };
    Ok(result > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value};

    #[test]
    fn test_decode_json_blank_is_default() {
        let images: Vec<String> = decode_json("", "images").unwrap();
        assert!(images.is_empty());
        let attrs: Map<String, Value> = decode_json("  ", "attributes").unwrap();
        assert!(attrs.is_empty());
    }

    #[tokio::test]
    async fn test_unique_violation_is_detected_through_context() {
        let pool = crate::db::create_test_pool().await.unwrap();
        crate::db::migrations::run_migrations(&pool).await.unwrap();
        let sqlite = pool.sqlite().unwrap();
        let insert = "INSERT INTO newsletter_subscribers (email) VALUES ('asha@example.in')";

        sqlx::query(insert).execute(sqlite).await.unwrap();
        let err = sqlx::query(insert)
            .execute(sqlite)
            .await
            .context("Failed to subscribe")
            .unwrap_err();
        assert!(is_unique_violation(&err));
        assert!(!is_unique_violation(&anyhow::anyhow!("connection reset")));
    }

    #[test]
    fn test_decode_json_reports_column() {
        let err = decode_json::<Vec<String>>("{not json", "images").unwrap_err();
        assert!(err.to_string().contains("images"));
    }
}
