//! Wishlist repository
//!
//! Saved listings per user. A listing appears at most once per user.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{WishlistEntryInput, WishlistItem};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

/// Wishlist repository trait
#[async_trait]
pub trait WishlistRepository: Send + Sync {
    /// List a user's saved items, most recent first
    async fn list(&self, user_id: i64) -> Result<Vec<WishlistItem>>;

    /// Get one saved item
    async fn get(&self, user_id: i64, listing_id: i64) -> Result<Option<WishlistItem>>;

    /// Save a listing for a user
    async fn add(&self, user_id: i64, entry: &WishlistEntryInput) -> Result<WishlistItem>;

    /// Remove a saved listing, returning whether it was present
    async fn remove(&self, user_id: i64, listing_id: i64) -> Result<bool>;

    /// Remove every saved listing for a user
    async fn clear(&self, user_id: i64) -> Result<u64>;

    /// Number of saved listings for a user
    async fn count(&self, user_id: i64) -> Result<i64>;
}

/// SQLx-based wishlist repository implementation
pub struct SqlxWishlistRepository {
    pool: DynDatabasePool,
}

impl SqlxWishlistRepository {
    /// Create a new SQLx wishlist repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn WishlistRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_ITEM: &str = r#"
    SELECT id, user_id, listing_id, kind, title, href, photo, created_at
    FROM wishlist_items
"#;

const INSERT_ITEM: &str = r#"
    INSERT INTO wishlist_items (user_id, listing_id, kind, title, href, photo, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?)
"#;

macro_rules! row_to_item {
    ($row:expr) => {
        WishlistItem {
            id: $row.get("id"),
            user_id: $row.get("user_id"),
            listing_id: $row.get("listing_id"),
            kind: $row.get("kind"),
            title: $row.get("title"),
            href: $row.get("href"),
            photo: $row.get("photo"),
            created_at: $row.get("created_at"),
        }
    };
}

#[async_trait]
impl WishlistRepository for SqlxWishlistRepository {
    async fn list(&self, user_id: i64) -> Result<Vec<WishlistItem>> {
        let sql = format!("{} WHERE user_id = ? ORDER BY created_at DESC, id DESC", SELECT_ITEM);
        let items: Vec<WishlistItem> = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .bind(user_id)
                .fetch_all(self.pool.sqlite()?)
                .await
                .context("Failed to list wishlist")?
                .iter()
                .map(|row| row_to_item!(row))
                .collect(),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .bind(user_id)
                .fetch_all(self.pool.mysql()?)
                .await
                .context("Failed to list wishlist")?
                .iter()
                .map(|row| row_to_item!(row))
                .collect(),
        };
        Ok(items)
    }

    async fn get(&self, user_id: i64, listing_id: i64) -> Result<Option<WishlistItem>> {
        let sql = format!("{} WHERE user_id = ? AND listing_id = ?", SELECT_ITEM);
        let item = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .bind(user_id)
                .bind(listing_id)
                .fetch_optional(self.pool.sqlite()?)
                .await
                .context("Failed to get wishlist item")?
                .map(|row| row_to_item!(row)),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .bind(user_id)
                .bind(listing_id)
                .fetch_optional(self.pool.mysql()?)
                .await
                .context("Failed to get wishlist item")?
                .map(|row| row_to_item!(row)),
        };
        Ok(item)
    }

    async fn add(&self, user_id: i64, entry: &WishlistEntryInput) -> Result<WishlistItem> {
        let now = Utc::now();
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(INSERT_ITEM)
                .bind(user_id)
                .bind(entry.listing_id)
                .bind(&entry.kind)
                .bind(&entry.title)
                .bind(&entry.href)
                .bind(&entry.photo)
                .bind(now)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to add wishlist item")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(INSERT_ITEM)
                .bind(user_id)
                .bind(entry.listing_id)
                .bind(&entry.kind)
                .bind(&entry.title)
                .bind(&entry.href)
                .bind(&entry.photo)
                .bind(now)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to add wishlist item")?
                .last_insert_id() as i64,
        };

        Ok(WishlistItem {
            id,
            user_id,
            listing_id: entry.listing_id,
            kind: entry.kind.clone(),
            title: entry.title.clone(),
            href: entry.href.clone(),
            photo: entry.photo.clone(),
            created_at: now,
        })
    }

    async fn remove(&self, user_id: i64, listing_id: i64) -> Result<bool> {
        let sql = "DELETE FROM wishlist_items WHERE user_id = ? AND listing_id = ?";
        let removed = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(user_id)
                .bind(listing_id)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to remove wishlist item")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(user_id)
                .bind(listing_id)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to remove wishlist item")?
                .rows_affected(),
        };
        Ok(removed > 0)
    }

    async fn clear(&self, user_id: i64) -> Result<u64> {
        let sql = "DELETE FROM wishlist_items WHERE user_id = ?";
        let removed = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(user_id)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to clear wishlist")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(user_id)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to clear wishlist")?
                .rows_affected(),
        };
        Ok(removed)
    }

    async fn count(&self, user_id: i64) -> Result<i64> {
        let sql = "SELECT COUNT(*) as count FROM wishlist_items WHERE user_id = ?";
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(user_id)
                .fetch_one(self.pool.sqlite()?)
                .await
                .context("Failed to count wishlist")?
                .get("count"),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(user_id)
                .fetch_one(self.pool.mysql()?)
                .await
                .context("Failed to count wishlist")?
                .get("count"),
        };
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxWishlistRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        for id in [1, 2] {
            sqlx::query(
                "INSERT INTO users (id, username, email, password_hash, preferences) VALUES (?, ?, ?, 'hash', '{}')",
            )
            .bind(id)
            .bind(format!("user{}", id))
            .bind(format!("user{}@example.in", id))
            .execute(pool.sqlite().unwrap())
            .await
            .expect("Failed to create test user");
        }
        let repo = SqlxWishlistRepository::new(pool.clone());
        (pool, repo)
    }

    fn entry(listing_id: i64) -> WishlistEntryInput {
        WishlistEntryInput {
            listing_id,
            kind: Some("rental-listings".to_string()),
            title: Some(format!("Flat {}", listing_id)),
            href: Some(format!("/rental-listings/{}", listing_id)),
            photo: None,
        }
    }

    #[tokio::test]
    async fn test_add_list_recent_first() {
        let (_pool, repo) = setup_test_repo().await;
        repo.add(1, &entry(10)).await.unwrap();
        repo.add(1, &entry(11)).await.unwrap();
        repo.add(2, &entry(10)).await.unwrap();

        let items = repo.list(1).await.unwrap();
        let ids: Vec<_> = items.iter().map(|i| i.listing_id).collect();
        assert_eq!(ids, vec![11, 10]);
        assert_eq!(repo.count(1).await.unwrap(), 2);
        assert_eq!(repo.count(2).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_entry_rejected() {
        let (_pool, repo) = setup_test_repo().await;
        repo.add(1, &entry(10)).await.unwrap();
        assert!(repo.add(1, &entry(10)).await.is_err());
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let (_pool, repo) = setup_test_repo().await;
        repo.add(1, &entry(10)).await.unwrap();
        repo.add(1, &entry(11)).await.unwrap();
        repo.add(1, &entry(12)).await.unwrap();

        assert!(repo.remove(1, 10).await.unwrap());
        assert!(!repo.remove(1, 10).await.unwrap());
        assert!(repo.get(1, 10).await.unwrap().is_none());
        assert!(repo.get(1, 11).await.unwrap().is_some());

        assert_eq!(repo.clear(1).await.unwrap(), 2);
        assert_eq!(repo.count(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_items_removed_with_user() {
        let (pool, repo) = setup_test_repo().await;
        repo.add(2, &entry(10)).await.unwrap();
        pool.execute("DELETE FROM users WHERE id = 2").await.unwrap();
        assert_eq!(repo.count(2).await.unwrap(), 0);
    }
}
