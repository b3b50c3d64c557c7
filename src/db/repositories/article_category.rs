//! Article category repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::ArticleCategory;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use super::delete_by_id;

/// Article category repository trait
#[async_trait]
pub trait ArticleCategoryRepository: Send + Sync {
    /// Create a new article category
    async fn create(&self, category: &ArticleCategory) -> Result<ArticleCategory>;

    /// Get article category by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<ArticleCategory>>;

    /// Get article category by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<ArticleCategory>>;

    /// List all article categories by name
    async fn list(&self) -> Result<Vec<ArticleCategory>>;

    /// Update an article category
    async fn update(&self, category: &ArticleCategory) -> Result<ArticleCategory>;

    /// Delete an article category; articles keep their rows with no category
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based article category repository implementation
pub struct SqlxArticleCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxArticleCategoryRepository {
    /// Create a new SQLx article category repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArticleCategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_ARTICLE_CATEGORY: &str =
    "SELECT id, name, slug, description, created_at, updated_at FROM article_categories";

macro_rules! row_to_article_category {
    ($row:expr) => {
        ArticleCategory {
            id: $row.get("id"),
            name: $row.get("name"),
            slug: $row.get("slug"),
            description: $row.get("description"),
            created_at: $row.get("created_at"),
            updated_at: $row.get("updated_at"),
        }
    };
}

#[async_trait]
impl ArticleCategoryRepository for SqlxArticleCategoryRepository {
    async fn create(&self, category: &ArticleCategory) -> Result<ArticleCategory> {
        let now = Utc::now();
        let sql = "INSERT INTO article_categories (name, slug, description, created_at, updated_at) \
                   VALUES (?, ?, ?, ?, ?)";
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(&category.name)
                .bind(&category.slug)
                .bind(&category.description)
                .bind(now)
                .bind(now)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to create article category")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(&category.name)
                .bind(&category.slug)
                .bind(&category.description)
                .bind(now)
                .bind(now)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to create article category")?
                .last_insert_id() as i64,
        };

        Ok(ArticleCategory {
            id,
            created_at: now,
            updated_at: now,
            ..category.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ArticleCategory>> {
        let sql = format!("{} WHERE id = ?", SELECT_ARTICLE_CATEGORY);
        let category = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .bind(id)
                .fetch_optional(self.pool.sqlite()?)
                .await
                .context("Failed to get article category by ID")?
                .map(|row| row_to_article_category!(row)),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .bind(id)
                .fetch_optional(self.pool.mysql()?)
                .await
                .context("Failed to get article category by ID")?
                .map(|row| row_to_article_category!(row)),
        };
        Ok(category)
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<ArticleCategory>> {
        let sql = format!("{} WHERE slug = ?", SELECT_ARTICLE_CATEGORY);
        let category = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .bind(slug)
                .fetch_optional(self.pool.sqlite()?)
                .await
                .context("Failed to get article category by slug")?
                .map(|row| row_to_article_category!(row)),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .bind(slug)
                .fetch_optional(self.pool.mysql()?)
                .await
                .context("Failed to get article category by slug")?
                .map(|row| row_to_article_category!(row)),
        };
        Ok(category)
    }

    async fn list(&self) -> Result<Vec<ArticleCategory>> {
        let sql = format!("{} ORDER BY name ASC, id ASC", SELECT_ARTICLE_CATEGORY);
        let categories = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .fetch_all(self.pool.sqlite()?)
                .await
                .context("Failed to list article categories")?
                .iter()
                .map(|row| row_to_article_category!(row))
                .collect(),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .fetch_all(self.pool.mysql()?)
                .await
                .context("Failed to list article categories")?
                .iter()
                .map(|row| row_to_article_category!(row))
                .collect(),
        };
        Ok(categories)
    }

    async fn update(&self, category: &ArticleCategory) -> Result<ArticleCategory> {
        let now = Utc::now();
        let sql = "UPDATE article_categories SET name = ?, slug = ?, description = ?, updated_at = ? \
                   WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(&category.name)
                    .bind(&category.slug)
                    .bind(&category.description)
                    .bind(now)
                    .bind(category.id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to update article category")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(&category.name)
                    .bind(&category.slug)
                    .bind(&category.description)
                    .bind(now)
                    .bind(category.id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to update article category")?;
            }
        }

        self.get_by_id(category.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Article category not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        delete_by_id(&self.pool, "article_categories", id)
            .await
            .context("Failed to delete article category")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::is_unique_violation;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxArticleCategoryRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxArticleCategoryRepository::new(pool)
    }

    fn test_category(name: &str, slug: &str) -> ArticleCategory {
        let now = Utc::now();
        ArticleCategory {
            id: 0,
            name: name.to_string(),
            slug: slug.to_string(),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_lookup_and_list_by_name() {
        let repo = setup_test_repo().await;
        repo.create(&test_category("Taxation", "taxation")).await.unwrap();
        let legal = repo.create(&test_category("Legal", "legal")).await.unwrap();

        assert_eq!(repo.get_by_slug("legal").await.unwrap().unwrap().id, legal.id);
        assert!(repo.get_by_slug("missing").await.unwrap().is_none());

        let names: Vec<_> = repo.list().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Legal", "Taxation"]);
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_unique_violation() {
        let repo = setup_test_repo().await;
        repo.create(&test_category("Legal", "legal")).await.unwrap();
        let err = repo.create(&test_category("Legal 2", "legal")).await.unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = setup_test_repo().await;
        let mut category = repo.create(&test_category("Legal", "legal")).await.unwrap();
        category.description = Some("Stamp duty and registration".to_string());
        let updated = repo.update(&category).await.unwrap();
        assert_eq!(updated.description.as_deref(), Some("Stamp duty and registration"));

        assert!(repo.delete(category.id).await.unwrap());
        assert!(repo.get_by_id(category.id).await.unwrap().is_none());
    }
}
