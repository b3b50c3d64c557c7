//! Blog post repository
//!
//! Database operations for blog posts. Tags are stored as a JSON array.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::BlogPost;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::mysql::MySqlRow;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::sync::Arc;

use super::{decode_json, delete_by_id, encode_json};

/// Blog post repository trait
#[async_trait]
pub trait BlogPostRepository: Send + Sync {
    /// Create a new post
    async fn create(&self, post: &BlogPost) -> Result<BlogPost>;

    /// Get post by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<BlogPost>>;

    /// Get post by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>>;

    /// List posts, most recently published first
    async fn list(&self, published_only: bool, category: Option<&str>) -> Result<Vec<BlogPost>>;

    /// Update a post
    async fn update(&self, post: &BlogPost) -> Result<BlogPost>;

    /// Delete a post
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Increment view count
    async fn increment_views(&self, id: i64) -> Result<()>;
}

/// SQLx-based blog post repository implementation
pub struct SqlxBlogPostRepository {
    pool: DynDatabasePool,
}

impl SqlxBlogPostRepository {
    /// Create a new SQLx blog post repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BlogPostRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_POST: &str = r#"
    SELECT id, title, slug, category, excerpt, content, cover_image_url, tags, author_name,
           seo_title, seo_description, is_published, is_featured, published_at, view_count,
           created_at, updated_at
    FROM blog_posts
"#;

const INSERT_POST: &str = r#"
    INSERT INTO blog_posts (
        title, slug, category, excerpt, content, cover_image_url, tags, author_name,
        seo_title, seo_description, is_published, is_featured, published_at, view_count,
        created_at, updated_at
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
"#;

const UPDATE_POST: &str = r#"
    UPDATE blog_posts
    SET title = ?, slug = ?, category = ?, excerpt = ?, content = ?, cover_image_url = ?,
        tags = ?, author_name = ?, seo_title = ?, seo_description = ?, is_published = ?,
        is_featured = ?, published_at = ?, updated_at = ?
    WHERE id = ?
"#;

/// Binds the columns shared by insert and update, `title` through `published_at`
macro_rules! bind_post_body {
    ($query:expr, $post:expr, $tags:expr) => {
        $query
            .bind(&$post.title)
            .bind(&$post.slug)
            .bind(&$post.category)
            .bind(&$post.excerpt)
            .bind(&$post.content)
            .bind(&$post.cover_image_url)
            .bind($tags)
            .bind(&$post.author_name)
            .bind(&$post.seo_title)
            .bind(&$post.seo_description)
            .bind($post.is_published)
            .bind($post.is_featured)
            .bind($post.published_at)
    };
}

macro_rules! row_to_post {
    ($row:expr) => {{
        let tags: String = $row.get("tags");
        BlogPost {
            id: $row.get("id"),
            title: $row.get("title"),
            slug: $row.get("slug"),
            category: $row.get("category"),
            excerpt: $row.get("excerpt"),
            content: $row.get("content"),
            cover_image_url: $row.get("cover_image_url"),
            tags: decode_json(&tags, "tags")?,
            author_name: $row.get("author_name"),
            seo_title: $row.get("seo_title"),
            seo_description: $row.get("seo_description"),
            is_published: $row.get("is_published"),
            is_featured: $row.get("is_featured"),
            published_at: $row.get("published_at"),
            view_count: $row.get("view_count"),
            created_at: $row.get("created_at"),
            updated_at: $row.get("updated_at"),
        }
    }};
}

fn row_to_post_sqlite(row: &SqliteRow) -> Result<BlogPost> {
    Ok(row_to_post!(row))
}

fn row_to_post_mysql(row: &MySqlRow) -> Result<BlogPost> {
    Ok(row_to_post!(row))
}

impl SqlxBlogPostRepository {
    async fn get_where(&self, column: &str, value: &str) -> Result<Option<BlogPost>> {
        let sql = format!("{} WHERE {} = ?", SELECT_POST, column);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .bind(value)
                .fetch_optional(self.pool.sqlite()?)
                .await
                .with_context(|| format!("Failed to get blog post by {}", column))?
                .as_ref()
                .map(row_to_post_sqlite)
                .transpose(),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .bind(value)
                .fetch_optional(self.pool.mysql()?)
                .await
                .with_context(|| format!("Failed to get blog post by {}", column))?
                .as_ref()
                .map(row_to_post_mysql)
                .transpose(),
        }
    }
}

#[async_trait]
impl BlogPostRepository for SqlxBlogPostRepository {
    async fn create(&self, post: &BlogPost) -> Result<BlogPost> {
        let now = Utc::now();
        let tags = encode_json(&post.tags, "tags")?;
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => bind_post_body!(sqlx::query(INSERT_POST), post, &tags)
                .bind(now)
                .bind(now)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to create blog post")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => bind_post_body!(sqlx::query(INSERT_POST), post, &tags)
                .bind(now)
                .bind(now)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to create blog post")?
                .last_insert_id() as i64,
        };

        Ok(BlogPost {
            id,
            view_count: 0,
            created_at: now,
            updated_at: now,
            ..post.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogPost>> {
        let sql = format!("{} WHERE id = ?", SELECT_POST);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .bind(id)
                .fetch_optional(self.pool.sqlite()?)
                .await
                .context("Failed to get blog post by ID")?
                .as_ref()
                .map(row_to_post_sqlite)
                .transpose(),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .bind(id)
                .fetch_optional(self.pool.mysql()?)
                .await
                .context("Failed to get blog post by ID")?
                .as_ref()
                .map(row_to_post_mysql)
                .transpose(),
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        self.get_where("slug", slug).await
    }

    async fn list(&self, published_only: bool, category: Option<&str>) -> Result<Vec<BlogPost>> {
        let sql = format!(
            "{} WHERE (? = 0 OR is_published = 1) AND (? IS NULL OR category = ?) \
             ORDER BY published_at DESC, created_at DESC, id DESC",
            SELECT_POST
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .bind(published_only)
                .bind(category)
                .bind(category)
                .fetch_all(self.pool.sqlite()?)
                .await
                .context("Failed to list blog posts")?
                .iter()
                .map(row_to_post_sqlite)
                .collect(),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .bind(published_only)
                .bind(category)
                .bind(category)
                .fetch_all(self.pool.mysql()?)
                .await
                .context("Failed to list blog posts")?
                .iter()
                .map(row_to_post_mysql)
                .collect(),
        }
    }

    async fn update(&self, post: &BlogPost) -> Result<BlogPost> {
        let now = Utc::now();
        let tags = encode_json(&post.tags, "tags")?;
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                bind_post_body!(sqlx::query(UPDATE_POST), post, &tags)
                    .bind(now)
                    .bind(post.id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to update blog post")?;
            }
            DatabaseDriver::Mysql => {
                bind_post_body!(sqlx::query(UPDATE_POST), post, &tags)
                    .bind(now)
                    .bind(post.id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to update blog post")?;
            }
        }

        self.get_by_id(post.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Blog post not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        delete_by_id(&self.pool, "blog_posts", id)
            .await
            .context("Failed to delete blog post")
    }

    async fn increment_views(&self, id: i64) -> Result<()> {
        let sql = "UPDATE blog_posts SET view_count = view_count + 1 WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to increment blog post views")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to increment blog post views")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::{Duration, Utc};

    async fn setup_test_repo() -> SqlxBlogPostRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxBlogPostRepository::new(pool)
    }

    fn test_post(slug: &str, category: Option<&str>, published: bool) -> BlogPost {
        let now = Utc::now();
        BlogPost {
            id: 0,
            title: format!("Post {}", slug),
            slug: slug.to_string(),
            category: category.map(str::to_string),
            excerpt: None,
            content: "Finding a flat in Pune".to_string(),
            cover_image_url: None,
            tags: vec!["rent".to_string(), "pune".to_string()],
            author_name: Some("Team".to_string()),
            seo_title: None,
            seo_description: None,
            is_published: published,
            is_featured: false,
            published_at: published.then_some(now),
            view_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_with_tags() {
        let repo = setup_test_repo().await;
        let created = repo.create(&test_post("rent-guide", None, true)).await.unwrap();

        let by_id = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.tags, vec!["rent", "pune"]);
        let by_slug = repo.get_by_slug("rent-guide").await.unwrap().unwrap();
        assert_eq!(by_slug.id, created.id);
        assert!(repo.get_by_slug("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_slug_fails() {
        let repo = setup_test_repo().await;
        repo.create(&test_post("same", None, false)).await.unwrap();
        assert!(repo.create(&test_post("same", None, false)).await.is_err());
    }

    #[tokio::test]
    async fn test_list_published_and_category() {
        let repo = setup_test_repo().await;
        let mut older = test_post("older", Some("real-estate"), true);
        older.published_at = Some(Utc::now() - Duration::days(2));
        repo.create(&older).await.unwrap();
        repo.create(&test_post("newer", Some("real-estate"), true)).await.unwrap();
        repo.create(&test_post("jobs", Some("jobs"), true)).await.unwrap();
        repo.create(&test_post("draft", Some("real-estate"), false)).await.unwrap();

        let public = repo.list(true, Some("real-estate")).await.unwrap();
        let slugs: Vec<_> = public.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["newer", "older"]);

        assert_eq!(repo.list(true, None).await.unwrap().len(), 3);
        assert_eq!(repo.list(false, None).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_update_views_and_delete() {
        let repo = setup_test_repo().await;
        let mut post = repo.create(&test_post("edit-me", None, false)).await.unwrap();
        post.tags = vec!["updated".to_string()];
        post.is_published = true;
        let updated = repo.update(&post).await.unwrap();
        assert_eq!(updated.tags, vec!["updated"]);
        assert!(updated.is_published);

        repo.increment_views(post.id).await.unwrap();
        repo.increment_views(post.id).await.unwrap();
        assert_eq!(repo.get_by_id(post.id).await.unwrap().unwrap().view_count, 2);

        assert!(repo.delete(post.id).await.unwrap());
        assert!(!repo.delete(post.id).await.unwrap());
    }
}
