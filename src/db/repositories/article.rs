//! Article repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Article, ArticleFilter};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use super::delete_by_id;

/// Article repository trait
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Create a new article
    async fn create(&self, article: &Article) -> Result<Article>;

    /// Get article by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Article>>;

    /// List articles newest first, optionally only published ones
    async fn list(&self, published_only: bool, filter: &ArticleFilter) -> Result<Vec<Article>>;

    /// Update an article
    async fn update(&self, article: &Article) -> Result<Article>;

    /// Delete an article
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Increment view count
    async fn increment_views(&self, id: i64) -> Result<()>;
}

/// SQLx-based article repository implementation
pub struct SqlxArticleRepository {
    pool: DynDatabasePool,
}

impl SqlxArticleRepository {
    /// Create a new SQLx article repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_ARTICLE: &str = r#"
    SELECT id, title, description, content, article_type, category_id, category_name,
           author_id, author_name, thumbnail_url, file_url, pages, is_featured, is_published,
           is_premium, published_at, view_count, download_count, created_at, updated_at
    FROM articles
"#;

const INSERT_ARTICLE: &str = r#"
    INSERT INTO articles (
        title, description, content, article_type, category_id, category_name, author_id,
        author_name, thumbnail_url, file_url, pages, is_featured, is_published, is_premium,
        published_at, view_count, download_count, created_at, updated_at
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0, ?, ?)
"#;

const UPDATE_ARTICLE: &str = r#"
    UPDATE articles
    SET title = ?, description = ?, content = ?, article_type = ?, category_id = ?,
        category_name = ?, author_id = ?, author_name = ?, thumbnail_url = ?, file_url = ?,
        pages = ?, is_featured = ?, is_published = ?, is_premium = ?, published_at = ?,
        updated_at = ?
    WHERE id = ?
"#;

/// Binds `title` through `published_at`
macro_rules! bind_article_body {
    ($query:expr, $article:expr) => {
        $query
            .bind(&$article.title)
            .bind(&$article.description)
            .bind(&$article.content)
            .bind(&$article.article_type)
            .bind($article.category_id)
            .bind(&$article.category_name)
            .bind($article.author_id)
            .bind(&$article.author_name)
            .bind(&$article.thumbnail_url)
            .bind(&$article.file_url)
            .bind($article.pages)
            .bind($article.is_featured)
            .bind($article.is_published)
            .bind($article.is_premium)
            .bind($article.published_at)
    };
}

macro_rules! row_to_article {
    ($row:expr) => {
        Article {
            id: $row.get("id"),
            title: $row.get("title"),
            description: $row.get("description"),
            content: $row.get("content"),
            article_type: $row.get("article_type"),
            category_id: $row.get("category_id"),
            category_name: $row.get("category_name"),
            author_id: $row.get("author_id"),
            author_name: $row.get("author_name"),
            thumbnail_url: $row.get("thumbnail_url"),
            file_url: $row.get("file_url"),
            pages: $row.get("pages"),
            is_featured: $row.get("is_featured"),
            is_published: $row.get("is_published"),
            is_premium: $row.get("is_premium"),
            published_at: $row.get("published_at"),
            view_count: $row.get("view_count"),
            download_count: $row.get("download_count"),
            created_at: $row.get("created_at"),
            updated_at: $row.get("updated_at"),
        }
    };
}

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn create(&self, article: &Article) -> Result<Article> {
        let now = Utc::now();
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => bind_article_body!(sqlx::query(INSERT_ARTICLE), article)
                .bind(now)
                .bind(now)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to create article")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => bind_article_body!(sqlx::query(INSERT_ARTICLE), article)
                .bind(now)
                .bind(now)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to create article")?
                .last_insert_id() as i64,
        };

        Ok(Article {
            id,
            view_count: 0,
            download_count: 0,
            created_at: now,
            updated_at: now,
            ..article.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        let sql = format!("{} WHERE id = ?", SELECT_ARTICLE);
        let article = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .bind(id)
                .fetch_optional(self.pool.sqlite()?)
                .await
                .context("Failed to get article by ID")?
                .map(|row| row_to_article!(row)),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .bind(id)
                .fetch_optional(self.pool.mysql()?)
                .await
                .context("Failed to get article by ID")?
                .map(|row| row_to_article!(row)),
        };
        Ok(article)
    }

    async fn list(&self, published_only: bool, filter: &ArticleFilter) -> Result<Vec<Article>> {
        let sql = format!(
            "{} WHERE (? = 0 OR is_published = 1) \
             AND (? IS NULL OR article_type = ?) \
             AND (? IS NULL OR is_featured = ?) \
             ORDER BY created_at DESC, id DESC",
            SELECT_ARTICLE
        );
        let article_type = filter.article_type.as_deref();
        let articles = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .bind(published_only)
                .bind(article_type)
                .bind(article_type)
                .bind(filter.featured)
                .bind(filter.featured)
                .fetch_all(self.pool.sqlite()?)
                .await
                .context("Failed to list articles")?
                .iter()
                .map(|row| row_to_article!(row))
                .collect(),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .bind(published_only)
                .bind(article_type)
                .bind(article_type)
                .bind(filter.featured)
                .bind(filter.featured)
                .fetch_all(self.pool.mysql()?)
                .await
                .context("Failed to list articles")?
                .iter()
                .map(|row| row_to_article!(row))
                .collect(),
        };
        Ok(articles)
    }

    async fn update(&self, article: &Article) -> Result<Article> {
        let now = Utc::now();
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                bind_article_body!(sqlx::query(UPDATE_ARTICLE), article)
                    .bind(now)
                    .bind(article.id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to update article")?;
            }
            DatabaseDriver::Mysql => {
                bind_article_body!(sqlx::query(UPDATE_ARTICLE), article)
                    .bind(now)
                    .bind(article.id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to update article")?;
            }
        }

        self.get_by_id(article.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Article not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        delete_by_id(&self.pool, "articles", id)
            .await
            .context("Failed to delete article")
    }

    async fn increment_views(&self, id: i64) -> Result<()> {
        let sql = "UPDATE articles SET view_count = view_count + 1 WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to increment article views")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to increment article views")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxArticleRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxArticleRepository::new(pool)
    }

    fn test_article(title: &str, article_type: &str, featured: bool, published: bool) -> Article {
        let now = Utc::now();
        Article {
            id: 0,
            title: title.to_string(),
            description: Some("Quarterly figures".to_string()),
            content: None,
            article_type: article_type.to_string(),
            category_id: None,
            category_name: None,
            author_id: None,
            author_name: Some("Research desk".to_string()),
            thumbnail_url: None,
            file_url: None,
            pages: Some(12),
            is_featured: featured,
            is_published: published,
            is_premium: false,
            published_at: None,
            view_count: 0,
            download_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup_test_repo().await;
        let created = repo
            .create(&test_article("Pune rent index", "research", true, true))
            .await
            .unwrap();
        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Pune rent index");
        assert_eq!(fetched.pages, Some(12));
        assert!(repo.get_by_id(created.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let repo = setup_test_repo().await;
        repo.create(&test_article("A", "research", true, true)).await.unwrap();
        repo.create(&test_article("B", "guide", false, true)).await.unwrap();
        repo.create(&test_article("C", "guide", true, false)).await.unwrap();

        let all = repo.list(false, &ArticleFilter::default()).await.unwrap();
        let titles: Vec<_> = all.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "B", "A"]);

        assert_eq!(repo.list(true, &ArticleFilter::default()).await.unwrap().len(), 2);

        let guides = ArticleFilter {
            article_type: Some("guide".to_string()),
            ..ArticleFilter::default()
        };
        assert_eq!(repo.list(false, &guides).await.unwrap().len(), 2);

        let featured = ArticleFilter {
            featured: Some(true),
            ..ArticleFilter::default()
        };
        let published_featured = repo.list(true, &featured).await.unwrap();
        assert_eq!(published_featured.len(), 1);
        assert_eq!(published_featured[0].title, "A");
    }

    #[tokio::test]
    async fn test_update_views_and_delete() {
        let repo = setup_test_repo().await;
        let mut article = repo
            .create(&test_article("Draft", "guide", false, false))
            .await
            .unwrap();
        article.is_published = true;
        article.pages = None;
        let updated = repo.update(&article).await.unwrap();
        assert!(updated.is_published);
        assert_eq!(updated.pages, None);

        repo.increment_views(article.id).await.unwrap();
        assert_eq!(repo.get_by_id(article.id).await.unwrap().unwrap().view_count, 1);

        assert!(repo.delete(article.id).await.unwrap());
        assert!(!repo.delete(article.id).await.unwrap());
    }
}
