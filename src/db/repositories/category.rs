//! Category repository
//!
//! Database operations for categories and their subcategories.
//!
//! This module provides:
//! - `CategoryRepository` trait defining the interface for category data access
//! - `SqlxCategoryRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Category, Subcategory};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::delete_by_id;

/// Category repository trait
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a new category
    async fn create(&self, category: &Category) -> Result<Category>;

    /// Get category by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Category>>;

    /// Get category by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    /// List categories ordered by sort order, then name
    async fn list(&self, active_only: bool) -> Result<Vec<Category>>;

    /// Update a category
    async fn update(&self, category: &Category) -> Result<Category>;

    /// Delete a category and, through the foreign key, its subcategories
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Create a new subcategory
    async fn create_subcategory(&self, subcategory: &Subcategory) -> Result<Subcategory>;

    /// Get subcategory by ID
    async fn get_subcategory(&self, id: i64) -> Result<Option<Subcategory>>;

    /// Get subcategory by slug
    async fn get_subcategory_by_slug(&self, slug: &str) -> Result<Option<Subcategory>>;

    /// List subcategories ordered by sort order, then name
    async fn list_subcategories(&self, active_only: bool) -> Result<Vec<Subcategory>>;

    /// Update a subcategory
    async fn update_subcategory(&self, subcategory: &Subcategory) -> Result<Subcategory>;

    /// Delete a subcategory
    async fn delete_subcategory(&self, id: i64) -> Result<bool>;
}

/// SQLx-based category repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxCategoryRepository {
    /// Create a new SQLx category repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn create(&self, category: &Category) -> Result<Category> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_category_sqlite(self.pool.sqlite()?, category).await,
            DatabaseDriver::Mysql => create_category_mysql(self.pool.mysql()?, category).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Category>> {
        let sql = format!("{} WHERE id = ?", SELECT_CATEGORY);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.sqlite()?)
                    .await
                    .context("Failed to get category by ID")?;
                row.as_ref().map(row_to_category_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.mysql()?)
                    .await
                    .context("Failed to get category by ID")?;
                row.as_ref().map(row_to_category_mysql).transpose()
            }
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let sql = format!("{} WHERE slug = ?", SELECT_CATEGORY);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(slug)
                    .fetch_optional(self.pool.sqlite()?)
                    .await
                    .context("Failed to get category by slug")?;
                row.as_ref().map(row_to_category_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(slug)
                    .fetch_optional(self.pool.mysql()?)
                    .await
                    .context("Failed to get category by slug")?;
                row.as_ref().map(row_to_category_mysql).transpose()
            }
        }
    }

    async fn list(&self, active_only: bool) -> Result<Vec<Category>> {
        let sql = format!(
            "{} WHERE (? = 0 OR is_active = 1) ORDER BY sort_order, name",
            SELECT_CATEGORY
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .bind(active_only)
                    .fetch_all(self.pool.sqlite()?)
                    .await
                    .context("Failed to list categories")?;
                rows.iter().map(row_to_category_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .bind(active_only)
                    .fetch_all(self.pool.mysql()?)
                    .await
                    .context("Failed to list categories")?;
                rows.iter().map(row_to_category_mysql).collect()
            }
        }
    }

    async fn update(&self, category: &Category) -> Result<Category> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(UPDATE_CATEGORY)
                    .bind(&category.name)
                    .bind(&category.slug)
                    .bind(&category.description)
                    .bind(&category.icon)
                    .bind(&category.color)
                    .bind(category.is_active)
                    .bind(category.sort_order)
                    .bind(Utc::now())
                    .bind(category.id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to update category")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(UPDATE_CATEGORY)
                    .bind(&category.name)
                    .bind(&category.slug)
                    .bind(&category.description)
                    .bind(&category.icon)
                    .bind(&category.color)
                    .bind(category.is_active)
                    .bind(category.sort_order)
                    .bind(Utc::now())
                    .bind(category.id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to update category")?;
            }
        }

        self.get_by_id(category.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Category not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        delete_by_id(&self.pool, "categories", id)
            .await
            .context("Failed to delete category")
    }

    async fn create_subcategory(&self, subcategory: &Subcategory) -> Result<Subcategory> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_subcategory_sqlite(self.pool.sqlite()?, subcategory).await
            }
            DatabaseDriver::Mysql => create_subcategory_mysql(self.pool.mysql()?, subcategory).await,
        }
    }

    async fn get_subcategory(&self, id: i64) -> Result<Option<Subcategory>> {
        let sql = format!("{} WHERE id = ?", SELECT_SUBCATEGORY);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.sqlite()?)
                    .await
                    .context("Failed to get subcategory by ID")?;
                row.as_ref().map(row_to_subcategory_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.mysql()?)
                    .await
                    .context("Failed to get subcategory by ID")?;
                row.as_ref().map(row_to_subcategory_mysql).transpose()
            }
        }
    }

    async fn get_subcategory_by_slug(&self, slug: &str) -> Result<Option<Subcategory>> {
        let sql = format!("{} WHERE slug = ?", SELECT_SUBCATEGORY);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(slug)
                    .fetch_optional(self.pool.sqlite()?)
                    .await
                    .context("Failed to get subcategory by slug")?;
                row.as_ref().map(row_to_subcategory_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(slug)
                    .fetch_optional(self.pool.mysql()?)
                    .await
                    .context("Failed to get subcategory by slug")?;
                row.as_ref().map(row_to_subcategory_mysql).transpose()
            }
        }
    }

    async fn list_subcategories(&self, active_only: bool) -> Result<Vec<Subcategory>> {
        let sql = format!(
            "{} WHERE (? = 0 OR is_active = 1) ORDER BY sort_order, name",
            SELECT_SUBCATEGORY
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .bind(active_only)
                    .fetch_all(self.pool.sqlite()?)
                    .await
                    .context("Failed to list subcategories")?;
                rows.iter().map(row_to_subcategory_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .bind(active_only)
                    .fetch_all(self.pool.mysql()?)
                    .await
                    .context("Failed to list subcategories")?;
                rows.iter().map(row_to_subcategory_mysql).collect()
            }
        }
    }

    async fn update_subcategory(&self, subcategory: &Subcategory) -> Result<Subcategory> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(UPDATE_SUBCATEGORY)
                    .bind(&subcategory.name)
                    .bind(&subcategory.slug)
                    .bind(&subcategory.description)
                    .bind(&subcategory.icon)
                    .bind(&subcategory.color)
                    .bind(subcategory.is_active)
                    .bind(subcategory.sort_order)
                    .bind(subcategory.parent_category_id)
                    .bind(Utc::now())
                    .bind(subcategory.id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to update subcategory")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(UPDATE_SUBCATEGORY)
                    .bind(&subcategory.name)
                    .bind(&subcategory.slug)
                    .bind(&subcategory.description)
                    .bind(&subcategory.icon)
                    .bind(&subcategory.color)
                    .bind(subcategory.is_active)
                    .bind(subcategory.sort_order)
                    .bind(subcategory.parent_category_id)
                    .bind(Utc::now())
                    .bind(subcategory.id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to update subcategory")?;
            }
        }

        self.get_subcategory(subcategory.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Subcategory not found after update"))
    }

    async fn delete_subcategory(&self, id: i64) -> Result<bool> {
        delete_by_id(&self.pool, "subcategories", id)
            .await
            .context("Failed to delete subcategory")
    }
}

// ============================================================================
// Shared SQL
// ============================================================================

const SELECT_CATEGORY: &str = r#"
    SELECT id, name, slug, description, icon, color, is_active, sort_order, created_at, updated_at
    FROM categories
"#;

const SELECT_SUBCATEGORY: &str = r#"
    SELECT id, name, slug, description, icon, color, is_active, sort_order, parent_category_id,
           created_at, updated_at
    FROM subcategories
"#;

const INSERT_CATEGORY: &str = r#"
    INSERT INTO categories (name, slug, description, icon, color, is_active, sort_order, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const INSERT_SUBCATEGORY: &str = r#"
    INSERT INTO subcategories (
        name, slug, description, icon, color, is_active, sort_order, parent_category_id,
        created_at, updated_at
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const UPDATE_CATEGORY: &str = r#"
    UPDATE categories
    SET name = ?, slug = ?, description = ?, icon = ?, color = ?, is_active = ?, sort_order = ?,
        updated_at = ?
    WHERE id = ?
"#;

const UPDATE_SUBCATEGORY: &str = r#"
    UPDATE subcategories
    SET name = ?, slug = ?, description = ?, icon = ?, color = ?, is_active = ?, sort_order = ?,
        parent_category_id = ?, updated_at = ?
    WHERE id = ?
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_category_sqlite(pool: &SqlitePool, category: &Category) -> Result<Category> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_CATEGORY)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(&category.icon)
        .bind(&category.color)
        .bind(category.is_active)
        .bind(category.sort_order)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create category")?;

    Ok(Category {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..category.clone()
    })
}

async fn create_subcategory_sqlite(pool: &SqlitePool, sub: &Subcategory) -> Result<Subcategory> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_SUBCATEGORY)
        .bind(&sub.name)
        .bind(&sub.slug)
        .bind(&sub.description)
        .bind(&sub.icon)
        .bind(&sub.color)
        .bind(sub.is_active)
        .bind(sub.sort_order)
        .bind(sub.parent_category_id)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create subcategory")?;

    Ok(Subcategory {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..sub.clone()
    })
}

fn row_to_category_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Category> {
    Ok(Category {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        icon: row.get("icon"),
        color: row.get("color"),
        is_active: row.get("is_active"),
        sort_order: row.get("sort_order"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_subcategory_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Subcategory> {
    Ok(Subcategory {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        icon: row.get("icon"),
        color: row.get("color"),
        is_active: row.get("is_active"),
        sort_order: row.get("sort_order"),
        parent_category_id: row.get("parent_category_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_category_mysql(pool: &MySqlPool, category: &Category) -> Result<Category> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_CATEGORY)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(&category.icon)
        .bind(&category.color)
        .bind(category.is_active)
        .bind(category.sort_order)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create category")?;

    Ok(Category {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..category.clone()
    })
}

async fn create_subcategory_mysql(pool: &MySqlPool, sub: &Subcategory) -> Result<Subcategory> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_SUBCATEGORY)
        .bind(&sub.name)
        .bind(&sub.slug)
        .bind(&sub.description)
        .bind(&sub.icon)
        .bind(&sub.color)
        .bind(sub.is_active)
        .bind(sub.sort_order)
        .bind(sub.parent_category_id)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create subcategory")?;

    Ok(Subcategory {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..sub.clone()
    })
}

fn row_to_category_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Category> {
    Ok(Category {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        icon: row.get("icon"),
        color: row.get("color"),
        is_active: row.get("is_active"),
        sort_order: row.get("sort_order"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_subcategory_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Subcategory> {
    Ok(Subcategory {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        icon: row.get("icon"),
        color: row.get("color"),
        is_active: row.get("is_active"),
        sort_order: row.get("sort_order"),
        parent_category_id: row.get("parent_category_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxCategoryRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxCategoryRepository::new(pool)
    }

    fn test_category(slug: &str, sort_order: i32) -> Category {
        let now = Utc::now();
        Category {
            id: 0,
            name: slug.replace('-', " "),
            slug: slug.to_string(),
            description: Some(format!("About {}", slug)),
            icon: None,
            color: "#1e40af".to_string(),
            is_active: true,
            sort_order,
            created_at: now,
            updated_at: now,
        }
    }

    fn test_subcategory(slug: &str, parent: i64) -> Subcategory {
        let now = Utc::now();
        Subcategory {
            id: 0,
            name: slug.to_string(),
            slug: slug.to_string(),
            description: None,
            icon: None,
            color: None,
            is_active: true,
            sort_order: 0,
            parent_category_id: parent,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_category() {
        let repo = setup_test_repo().await;
        let created = repo
            .create(&test_category("real-estate", 1))
            .await
            .expect("Failed to create category");
        assert!(created.id > 0);

        let by_id = repo.get_by_id(created.id).await.unwrap().expect("Category not found");
        assert_eq!(by_id.slug, "real-estate");
        let by_slug = repo.get_by_slug("real-estate").await.unwrap().expect("Category not found");
        assert_eq!(by_slug.id, created.id);
        assert!(repo.get_by_slug("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let repo = setup_test_repo().await;
        repo.create(&test_category("education", 0)).await.unwrap();
        assert!(repo.create(&test_category("education", 0)).await.is_err());
    }

    #[tokio::test]
    async fn test_list_orders_and_filters_active() {
        let repo = setup_test_repo().await;
        repo.create(&test_category("vehicles", 2)).await.unwrap();
        repo.create(&test_category("education", 1)).await.unwrap();
        let mut hidden = test_category("hidden", 0);
        hidden.is_active = false;
        repo.create(&hidden).await.unwrap();

        let all = repo.list(false).await.unwrap();
        let slugs: Vec<_> = all.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["hidden", "education", "vehicles"]);

        let active = repo.list(true).await.unwrap();
        assert_eq!(active.len(), 2);
    }

    #[tokio::test]
    async fn test_update_category() {
        let repo = setup_test_repo().await;
        let mut created = repo.create(&test_category("services", 0)).await.unwrap();
        created.name = "Home Services".to_string();
        created.icon = Some("wrench".to_string());

        let updated = repo.update(&created).await.unwrap();
        assert_eq!(updated.name, "Home Services");
        assert_eq!(updated.icon.as_deref(), Some("wrench"));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_subcategories() {
        let repo = setup_test_repo().await;
        let parent = repo.create(&test_category("education", 0)).await.unwrap();
        let sub = repo
            .create_subcategory(&test_subcategory("tuition", parent.id))
            .await
            .unwrap();
        assert_eq!(
            repo.get_subcategory_by_slug("tuition").await.unwrap().map(|s| s.id),
            Some(sub.id)
        );

        assert!(repo.delete(parent.id).await.unwrap());
        assert!(repo.get_subcategory(sub.id).await.unwrap().is_none());
        assert!(!repo.delete(parent.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_subcategory_update_and_list() {
        let repo = setup_test_repo().await;
        let a = repo.create(&test_category("a", 0)).await.unwrap();
        let b = repo.create(&test_category("b", 1)).await.unwrap();
        let mut sub = repo.create_subcategory(&test_subcategory("yoga", a.id)).await.unwrap();

        sub.parent_category_id = b.id;
        sub.is_active = false;
        let updated = repo.update_subcategory(&sub).await.unwrap();
        assert_eq!(updated.parent_category_id, b.id);

        assert_eq!(repo.list_subcategories(false).await.unwrap().len(), 1);
        assert!(repo.list_subcategories(true).await.unwrap().is_empty());
        assert!(repo.delete_subcategory(sub.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_subcategory_requires_parent() {
        let repo = setup_test_repo().await;
        let result = repo.create_subcategory(&test_subcategory("orphan", 999)).await;
        assert!(result.is_err());
    }
}
