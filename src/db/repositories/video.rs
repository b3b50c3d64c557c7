//! Video repository
//!
//! Database operations for the videos page.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Video;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use super::delete_by_id;

/// Video repository trait
#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// Create a new video
    async fn create(&self, video: &Video) -> Result<Video>;

    /// Get video by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Video>>;

    /// List videos, newest first
    async fn list(&self, active_only: bool) -> Result<Vec<Video>>;

    /// Update a video
    async fn update(&self, video: &Video) -> Result<Video>;

    /// Delete a video
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based video repository implementation
pub struct SqlxVideoRepository {
    pool: DynDatabasePool,
}

impl SqlxVideoRepository {
    /// Create a new SQLx video repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn VideoRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_VIDEO: &str = r#"
    SELECT id, title, description, video_url, thumbnail_url, duration, is_active,
           created_at, updated_at
    FROM videos
"#;

const INSERT_VIDEO: &str = r#"
    INSERT INTO videos (
        title, description, video_url, thumbnail_url, duration, is_active, created_at, updated_at
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
"#;

const UPDATE_VIDEO: &str = r#"
    UPDATE videos
    SET title = ?, description = ?, video_url = ?, thumbnail_url = ?, duration = ?,
        is_active = ?, updated_at = ?
    WHERE id = ?
"#;

macro_rules! row_to_video {
    ($row:expr) => {
        Video {
            id: $row.get("id"),
            title: $row.get("title"),
            description: $row.get("description"),
            video_url: $row.get("video_url"),
            thumbnail_url: $row.get("thumbnail_url"),
            duration: $row.get("duration"),
            is_active: $row.get("is_active"),
            created_at: $row.get("created_at"),
            updated_at: $row.get("updated_at"),
        }
    };
}

#[async_trait]
impl VideoRepository for SqlxVideoRepository {
    async fn create(&self, video: &Video) -> Result<Video> {
        let now = Utc::now();
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(INSERT_VIDEO)
                .bind(&video.title)
                .bind(&video.description)
                .bind(&video.video_url)
                .bind(&video.thumbnail_url)
                .bind(&video.duration)
                .bind(video.is_active)
                .bind(now)
                .bind(now)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to create video")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(INSERT_VIDEO)
                .bind(&video.title)
                .bind(&video.description)
                .bind(&video.video_url)
                .bind(&video.thumbnail_url)
                .bind(&video.duration)
                .bind(video.is_active)
                .bind(now)
                .bind(now)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to create video")?
                .last_insert_id() as i64,
        };

        Ok(Video {
            id,
            created_at: now,
            updated_at: now,
            ..video.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Video>> {
        let sql = format!("{} WHERE id = ?", SELECT_VIDEO);
        let video = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .bind(id)
                .fetch_optional(self.pool.sqlite()?)
                .await
                .context("Failed to get video by ID")?
                .map(|row| row_to_video!(row)),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .bind(id)
                .fetch_optional(self.pool.mysql()?)
                .await
                .context("Failed to get video by ID")?
                .map(|row| row_to_video!(row)),
        };
        Ok(video)
    }

    async fn list(&self, active_only: bool) -> Result<Vec<Video>> {
        let sql = format!(
            "{} WHERE (? = 0 OR is_active = 1) ORDER BY created_at DESC, id DESC",
            SELECT_VIDEO
        );
        let videos: Vec<Video> = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .bind(active_only)
                .fetch_all(self.pool.sqlite()?)
                .await
                .context("Failed to list videos")?
                .iter()
                .map(|row| row_to_video!(row))
                .collect(),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .bind(active_only)
                .fetch_all(self.pool.mysql()?)
                .await
                .context("Failed to list videos")?
                .iter()
                .map(|row| row_to_video!(row))
                .collect(),
        };
        Ok(videos)
    }

    async fn update(&self, video: &Video) -> Result<Video> {
        let now = Utc::now();
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(UPDATE_VIDEO)
                    .bind(&video.title)
                    .bind(&video.description)
                    .bind(&video.video_url)
                    .bind(&video.thumbnail_url)
                    .bind(&video.duration)
                    .bind(video.is_active)
                    .bind(now)
                    .bind(video.id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to update video")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(UPDATE_VIDEO)
                    .bind(&video.title)
                    .bind(&video.description)
                    .bind(&video.video_url)
                    .bind(&video.thumbnail_url)
                    .bind(&video.duration)
                    .bind(video.is_active)
                    .bind(now)
                    .bind(video.id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to update video")?;
            }
        }

        self.get_by_id(video.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Video not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        delete_by_id(&self.pool, "videos", id)
            .await
            .context("Failed to delete video")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxVideoRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxVideoRepository::new(pool)
    }

    fn test_video(title: &str, is_active: bool) -> Video {
        let now = Utc::now();
        Video {
            id: 0,
            title: title.to_string(),
            description: None,
            video_url: "https://www.youtube.com/watch?v=abc".to_string(),
            thumbnail_url: None,
            duration: Some("3:45".to_string()),
            is_active,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_list_newest_first() {
        let repo = setup_test_repo().await;
        repo.create(&test_video("older", true)).await.unwrap();
        let newer = repo.create(&test_video("newer", true)).await.unwrap();
        repo.create(&test_video("draft", false)).await.unwrap();

        let public = repo.list(true).await.unwrap();
        assert_eq!(public.len(), 2);
        assert_eq!(public[0].id, newer.id);
        assert_eq!(repo.list(false).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = setup_test_repo().await;
        let mut video = repo.create(&test_video("tour", true)).await.unwrap();
        video.duration = None;
        let updated = repo.update(&video).await.unwrap();
        assert!(updated.duration.is_none());

        assert!(repo.delete(video.id).await.unwrap());
        assert!(repo.get_by_id(video.id).await.unwrap().is_none());
    }
}
