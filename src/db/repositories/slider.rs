//! Slider repository
//!
//! Database operations for homepage sliders.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Slider;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use super::delete_by_id;

/// Slider repository trait
#[async_trait]
pub trait SliderRepository: Send + Sync {
    /// Create a new slider
    async fn create(&self, slider: &Slider) -> Result<Slider>;

    /// Get slider by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Slider>>;

    /// List sliders by sort order, newest first within the same order
    async fn list(&self, active_only: bool) -> Result<Vec<Slider>>;

    /// Update a slider
    async fn update(&self, slider: &Slider) -> Result<Slider>;

    /// Delete a slider
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based slider repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxSliderRepository {
    pool: DynDatabasePool,
}

impl SqlxSliderRepository {
    /// Create a new SQLx slider repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SliderRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_SLIDER: &str = r#"
    SELECT id, title, description, image_url, link_url, button_text, sort_order, is_active,
           created_at, updated_at
    FROM sliders
"#;

const INSERT_SLIDER: &str = r#"
    INSERT INTO sliders (
        title, description, image_url, link_url, button_text, sort_order, is_active,
        created_at, updated_at
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const UPDATE_SLIDER: &str = r#"
    UPDATE sliders
    SET title = ?, description = ?, image_url = ?, link_url = ?, button_text = ?,
        sort_order = ?, is_active = ?, updated_at = ?
    WHERE id = ?
"#;

macro_rules! row_to_slider {
    ($row:expr) => {
        Slider {
            id: $row.get("id"),
            title: $row.get("title"),
            description: $row.get("description"),
            image_url: $row.get("image_url"),
            link_url: $row.get("link_url"),
            button_text: $row.get("button_text"),
            sort_order: $row.get("sort_order"),
            is_active: $row.get("is_active"),
            created_at: $row.get("created_at"),
            updated_at: $row.get("updated_at"),
        }
    };
}

#[async_trait]
impl SliderRepository for SqlxSliderRepository {
    async fn create(&self, slider: &Slider) -> Result<Slider> {
        let now = Utc::now();
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(INSERT_SLIDER)
                .bind(&slider.title)
                .bind(&slider.description)
                .bind(&slider.image_url)
                .bind(&slider.link_url)
                .bind(&slider.button_text)
                .bind(slider.sort_order)
                .bind(slider.is_active)
                .bind(now)
                .bind(now)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to create slider")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(INSERT_SLIDER)
                .bind(&slider.title)
                .bind(&slider.description)
                .bind(&slider.image_url)
                .bind(&slider.link_url)
                .bind(&slider.button_text)
                .bind(slider.sort_order)
                .bind(slider.is_active)
                .bind(now)
                .bind(now)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to create slider")?
                .last_insert_id() as i64,
        };

        Ok(Slider {
            id,
            created_at: now,
            updated_at: now,
            ..slider.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Slider>> {
        let sql = format!("{} WHERE id = ?", SELECT_SLIDER);
        let slider = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .bind(id)
                .fetch_optional(self.pool.sqlite()?)
                .await
                .context("Failed to get slider by ID")?
                .map(|row| row_to_slider!(row)),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .bind(id)
                .fetch_optional(self.pool.mysql()?)
                .await
                .context("Failed to get slider by ID")?
                .map(|row| row_to_slider!(row)),
        };
        Ok(slider)
    }

    async fn list(&self, active_only: bool) -> Result<Vec<Slider>> {
        let sql = format!(
            "{} WHERE (? = 0 OR is_active = 1) ORDER BY sort_order ASC, created_at DESC, id DESC",
            SELECT_SLIDER
        );
        let sliders: Vec<Slider> = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .bind(active_only)
                .fetch_all(self.pool.sqlite()?)
                .await
                .context("Failed to list sliders")?
                .iter()
                .map(|row| row_to_slider!(row))
                .collect(),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .bind(active_only)
                .fetch_all(self.pool.mysql()?)
                .await
                .context("Failed to list sliders")?
                .iter()
                .map(|row| row_to_slider!(row))
                .collect(),
        };
        Ok(sliders)
    }

    async fn update(&self, slider: &Slider) -> Result<Slider> {
        let now = Utc::now();
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(UPDATE_SLIDER)
                    .bind(&slider.title)
                    .bind(&slider.description)
                    .bind(&slider.image_url)
                    .bind(&slider.link_url)
                    .bind(&slider.button_text)
                    .bind(slider.sort_order)
                    .bind(slider.is_active)
                    .bind(now)
                    .bind(slider.id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to update slider")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(UPDATE_SLIDER)
                    .bind(&slider.title)
                    .bind(&slider.description)
                    .bind(&slider.image_url)
                    .bind(&slider.link_url)
                    .bind(&slider.button_text)
                    .bind(slider.sort_order)
                    .bind(slider.is_active)
                    .bind(now)
                    .bind(slider.id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to update slider")?;
            }
        }

        self.get_by_id(slider.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Slider not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        delete_by_id(&self.pool, "sliders", id)
            .await
            .context("Failed to delete slider")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxSliderRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxSliderRepository::new(pool)
    }

    fn test_slider(title: &str, sort_order: i32, is_active: bool) -> Slider {
        let now = Utc::now();
        Slider {
            id: 0,
            title: title.to_string(),
            description: None,
            image_url: format!("/uploads/{}.jpg", title),
            link_url: Some("/rental-listings".to_string()),
            button_text: Some("Explore".to_string()),
            sort_order,
            is_active,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_list_orders_by_sort_order() {
        let repo = setup_test_repo().await;
        repo.create(&test_slider("second", 2, true)).await.unwrap();
        repo.create(&test_slider("first", 1, true)).await.unwrap();
        repo.create(&test_slider("hidden", 0, false)).await.unwrap();

        let public: Vec<_> = repo
            .list(true)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(public, vec!["first", "second"]);
        assert_eq!(repo.list(false).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = setup_test_repo().await;
        let mut slider = repo.create(&test_slider("promo", 0, true)).await.unwrap();
        slider.button_text = None;
        slider.is_active = false;

        let updated = repo.update(&slider).await.unwrap();
        assert!(updated.button_text.is_none());
        assert!(!updated.is_active);

        assert!(repo.delete(slider.id).await.unwrap());
        assert!(repo.get_by_id(slider.id).await.unwrap().is_none());
    }
}
