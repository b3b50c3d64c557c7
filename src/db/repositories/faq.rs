//! FAQ repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Faq;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

use super::delete_by_id;

/// FAQ repository trait
#[async_trait]
pub trait FaqRepository: Send + Sync {
    /// Create a new FAQ
    async fn create(&self, faq: &Faq) -> Result<Faq>;

    /// Get FAQ by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Faq>>;

    /// List FAQs by sort order, optionally one category and active ones only
    async fn list(&self, category: Option<&str>, active_only: bool) -> Result<Vec<Faq>>;

    /// Update a FAQ
    async fn update(&self, faq: &Faq) -> Result<Faq>;

    /// Delete a FAQ
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based FAQ repository implementation
pub struct SqlxFaqRepository {
    pool: DynDatabasePool,
}

impl SqlxFaqRepository {
    /// Create a new SQLx FAQ repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn FaqRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_FAQ: &str = "SELECT id, question, answer, category, sort_order, is_active FROM faqs";

macro_rules! row_to_faq {
    ($row:expr) => {
        Faq {
            id: $row.get("id"),
            question: $row.get("question"),
            answer: $row.get("answer"),
            category: $row.get("category"),
            sort_order: $row.get("sort_order"),
            is_active: $row.get("is_active"),
        }
    };
}

#[async_trait]
impl FaqRepository for SqlxFaqRepository {
    async fn create(&self, faq: &Faq) -> Result<Faq> {
        let sql = "INSERT INTO faqs (question, answer, category, sort_order, is_active) \
                   VALUES (?, ?, ?, ?, ?)";
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(&faq.question)
                .bind(&faq.answer)
                .bind(&faq.category)
                .bind(faq.sort_order)
                .bind(faq.is_active)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to create FAQ")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(&faq.question)
                .bind(&faq.answer)
                .bind(&faq.category)
                .bind(faq.sort_order)
                .bind(faq.is_active)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to create FAQ")?
                .last_insert_id() as i64,
        };
        Ok(Faq { id, ..faq.clone() })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Faq>> {
        let sql = format!("{} WHERE id = ?", SELECT_FAQ);
        let faq = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .bind(id)
                .fetch_optional(self.pool.sqlite()?)
                .await
                .context("Failed to get FAQ by ID")?
                .map(|row| row_to_faq!(row)),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .bind(id)
                .fetch_optional(self.pool.mysql()?)
                .await
                .context("Failed to get FAQ by ID")?
                .map(|row| row_to_faq!(row)),
        };
        Ok(faq)
    }

    async fn list(&self, category: Option<&str>, active_only: bool) -> Result<Vec<Faq>> {
        let sql = format!(
            "{} WHERE (? IS NULL OR category = ?) AND (? = 0 OR is_active = 1) \
             ORDER BY sort_order ASC, id ASC",
            SELECT_FAQ
        );
        let faqs = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .bind(category)
                .bind(category)
                .bind(active_only)
                .fetch_all(self.pool.sqlite()?)
                .await
                .context("Failed to list FAQs")?
                .iter()
                .map(|row| row_to_faq!(row))
                .collect(),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .bind(category)
                .bind(category)
                .bind(active_only)
                .fetch_all(self.pool.mysql()?)
                .await
                .context("Failed to list FAQs")?
                .iter()
                .map(|row| row_to_faq!(row))
                .collect(),
        };
        Ok(faqs)
    }

    async fn update(&self, faq: &Faq) -> Result<Faq> {
        let sql = "UPDATE faqs SET question = ?, answer = ?, category = ?, sort_order = ?, \
                   is_active = ? WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(&faq.question)
                    .bind(&faq.answer)
                    .bind(&faq.category)
                    .bind(faq.sort_order)
                    .bind(faq.is_active)
                    .bind(faq.id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to update FAQ")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(&faq.question)
                    .bind(&faq.answer)
                    .bind(&faq.category)
                    .bind(faq.sort_order)
                    .bind(faq.is_active)
                    .bind(faq.id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to update FAQ")?;
            }
        }

        self.get_by_id(faq.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("FAQ not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        delete_by_id(&self.pool, "faqs", id)
            .await
            .context("Failed to delete FAQ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxFaqRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxFaqRepository::new(pool)
    }

    fn test_faq(question: &str, category: &str, sort_order: i32, is_active: bool) -> Faq {
        Faq {
            id: 0,
            question: question.to_string(),
            answer: "Yes.".to_string(),
            category: category.to_string(),
            sort_order,
            is_active,
        }
    }

    #[tokio::test]
    async fn test_list_orders_and_filters() {
        let repo = setup_test_repo().await;
        repo.create(&test_faq("Second", "listing", 2, true)).await.unwrap();
        repo.create(&test_faq("First", "listing", 1, true)).await.unwrap();
        repo.create(&test_faq("Hidden", "listing", 0, false)).await.unwrap();
        repo.create(&test_faq("Agent", "agent", 0, true)).await.unwrap();

        let listing: Vec<_> = repo
            .list(Some("listing"), true)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.question)
            .collect();
        assert_eq!(listing, vec!["First", "Second"]);

        assert_eq!(repo.list(None, true).await.unwrap().len(), 3);
        assert_eq!(repo.list(None, false).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = setup_test_repo().await;
        let mut faq = repo.create(&test_faq("Q", "looking", 0, true)).await.unwrap();
        faq.answer = "Only verified owners can post.".to_string();
        faq.is_active = false;
        let updated = repo.update(&faq).await.unwrap();
        assert_eq!(updated.answer, "Only verified owners can post.");
        assert!(!updated.is_active);

        assert!(repo.delete(faq.id).await.unwrap());
        assert!(repo.get_by_id(faq.id).await.unwrap().is_none());
    }
}
