//! Article service
//!
//! Downloadable articles and the article categories they are filed under.
//! References to missing authors or categories are dropped rather than
//! rejected, so an admin form with a stale select box still saves.

use crate::db::repositories::{
    is_unique_violation, ArticleCategoryRepository, ArticleRepository, UserRepository,
};
use crate::models::{
    Article, ArticleCategory, ArticleFilter, CreateArticleCategoryInput, CreateArticleInput,
    UpdateArticleCategoryInput, UpdateArticleInput,
};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

use super::slug_or_fallback;

/// Article type used when none is given
pub const DEFAULT_ARTICLE_TYPE: &str = "article";

#[derive(Debug, thiserror::Error)]
pub enum ArticleServiceError {
    #[error("Article not found: {0}")]
    NotFound(String),

    #[error("Slug already exists: {0}")]
    DuplicateSlug(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct ArticleService {
    repo: Arc<dyn ArticleRepository>,
    category_repo: Arc<dyn ArticleCategoryRepository>,
    user_repo: Arc<dyn UserRepository>,
}

impl ArticleService {
    pub fn new(
        repo: Arc<dyn ArticleRepository>,
        category_repo: Arc<dyn ArticleCategoryRepository>,
        user_repo: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            repo,
            category_repo,
            user_repo,
        }
    }

    // ------------------------------------------------------------------
    // Articles
    // ------------------------------------------------------------------

    /// Published articles, newest first
    pub async fn list_published(&self, filter: &ArticleFilter) -> Result<Vec<Article>, ArticleServiceError> {
        Ok(self
            .repo
            .list(true, filter)
            .await
            .context("Failed to list articles")?)
    }

    /// Every article, newest first
    pub async fn list(&self) -> Result<Vec<Article>, ArticleServiceError> {
        Ok(self
            .repo
            .list(false, &ArticleFilter::default())
            .await
            .context("Failed to list articles")?)
    }

    pub async fn get(&self, id: i64) -> Result<Article, ArticleServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get article")?
            .ok_or_else(|| ArticleServiceError::NotFound(format!("article #{}", id)))
    }

    /// A published article for a reader; counts the view
    pub async fn view(&self, id: i64) -> Result<Article, ArticleServiceError> {
        let mut article = self.get(id).await?;
        if !article.is_published {
            return Err(ArticleServiceError::NotFound(format!("article #{}", id)));
        }
        self.repo
            .increment_views(id)
            .await
            .context("Failed to count article view")?;
        article.view_count += 1;
        Ok(article)
    }

    pub async fn create(&self, input: CreateArticleInput) -> Result<Article, ArticleServiceError> {
        let title = required(&input.title, "Title")?;
        let is_published = input.is_published.unwrap_or(false);
        let now = Utc::now();

        let mut article = Article {
            id: 0,
            title,
            description: input.description,
            content: input.content,
            article_type: article_type(input.article_type.as_deref()),
            category_id: input.category_id,
            category_name: input.category_name,
            author_id: input.author_id,
            author_name: input.author_name,
            thumbnail_url: input.thumbnail_url,
            file_url: input.file_url,
            pages: input.pages.and_then(|p| p.pages()),
            is_featured: input.is_featured.unwrap_or(false),
            is_published,
            is_premium: input.is_premium.unwrap_or(false),
            published_at: input.published_at.or(is_published.then_some(now)),
            view_count: 0,
            download_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.resolve_references(&mut article).await?;

        Ok(self
            .repo
            .create(&article)
            .await
            .context("Failed to create article")?)
    }

    pub async fn update(&self, id: i64, input: UpdateArticleInput) -> Result<Article, ArticleServiceError> {
        let mut article = self.get(id).await?;

        if let Some(title) = input.title {
            article.title = required(&title, "Title")?;
        }
        if let Some(description) = input.description {
            article.description = description;
        }
        if let Some(content) = input.content {
            article.content = content;
        }
        if let Some(kind) = input.article_type {
            article.article_type = article_type(Some(&kind));
        }
        if let Some(category_id) = input.category_id {
            article.category_id = category_id;
        }
        if let Some(category_name) = input.category_name {
            article.category_name = category_name;
        }
        if let Some(author_id) = input.author_id {
            article.author_id = author_id;
        }
        if let Some(author_name) = input.author_name {
            article.author_name = author_name;
        }
        if let Some(thumbnail_url) = input.thumbnail_url {
            article.thumbnail_url = thumbnail_url;
        }
        if let Some(file_url) = input.file_url {
            article.file_url = file_url;
        }
        if let Some(pages) = input.pages {
            if let Some(pages) = pages.pages() {
                article.pages = Some(pages);
            }
        }
        if let Some(is_featured) = input.is_featured {
            article.is_featured = is_featured;
        }
        if let Some(is_premium) = input.is_premium {
            article.is_premium = is_premium;
        }
        if let Some(published_at) = input.published_at {
            article.published_at = Some(published_at);
        }
        if let Some(is_published) = input.is_published {
            set_published(&mut article, is_published);
        }
        self.resolve_references(&mut article).await?;

        Ok(self
            .repo
            .update(&article)
            .await
            .context("Failed to update article")?)
    }

    pub async fn toggle_publish(&self, id: i64) -> Result<Article, ArticleServiceError> {
        let mut article = self.get(id).await?;
        let publish = !article.is_published;
        set_published(&mut article, publish);
        Ok(self
            .repo
            .update(&article)
            .await
            .context("Failed to toggle article")?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ArticleServiceError> {
        if !self.repo.delete(id).await.context("Failed to delete article")? {
            return Err(ArticleServiceError::NotFound(format!("article #{}", id)));
        }
        Ok(())
    }

    /// Drop dangling author and category ids. A known category fills in a
    /// missing category name.
    async fn resolve_references(&self, article: &mut Article) -> Result<(), ArticleServiceError> {
        if let Some(author_id) = article.author_id {
            let author = self
                .user_repo
                .get_by_id(author_id)
                .await
                .context("Failed to look up article author")?;
            if author.is_none() {
                tracing::debug!("Dropping unknown author #{} from article", author_id);
                article.author_id = None;
            }
        }

        if let Some(category_id) = article.category_id {
            let category = self
                .category_repo
                .get_by_id(category_id)
                .await
                .context("Failed to look up article category")?;
            match category {
                Some(category) => {
                    if article.category_name.is_none() {
                        article.category_name = Some(category.name);
                    }
                }
                None => {
                    tracing::debug!("Dropping unknown category #{} from article", category_id);
                    article.category_id = None;
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Article categories
    // ------------------------------------------------------------------

    /// Article categories by name
    pub async fn list_categories(&self) -> Result<Vec<ArticleCategory>, ArticleServiceError> {
        Ok(self
            .category_repo
            .list()
            .await
            .context("Failed to list article categories")?)
    }

    pub async fn get_category(&self, id: i64) -> Result<ArticleCategory, ArticleServiceError> {
        self.category_repo
            .get_by_id(id)
            .await
            .context("Failed to get article category")?
            .ok_or_else(|| ArticleServiceError::NotFound(format!("article category #{}", id)))
    }

    pub async fn create_category(
        &self,
        input: CreateArticleCategoryInput,
    ) -> Result<ArticleCategory, ArticleServiceError> {
        let name = required(&input.name, "Name")?;
        let slug = category_slug(input.slug.as_deref(), &name)?;

        let now = Utc::now();
        let category = ArticleCategory {
            id: 0,
            name,
            slug: slug.clone(),
            description: input.description,
            created_at: now,
            updated_at: now,
        };

        self.category_repo.create(&category).await.map_err(|e| {
            if is_unique_violation(&e) {
                ArticleServiceError::DuplicateSlug(slug)
            } else {
                ArticleServiceError::InternalError(e.context("Failed to create article category"))
            }
        })
    }

    pub async fn update_category(
        &self,
        id: i64,
        input: UpdateArticleCategoryInput,
    ) -> Result<ArticleCategory, ArticleServiceError> {
        let mut category = self.get_category(id).await?;

        if let Some(name) = input.name {
            category.name = required(&name, "Name")?;
        }
        if let Some(slug) = input.slug {
            category.slug = category_slug(Some(&slug), &category.name)?;
        }
        if let Some(description) = input.description {
            category.description = description;
        }

        let slug = category.slug.clone();
        self.category_repo.update(&category).await.map_err(|e| {
            if is_unique_violation(&e) {
                ArticleServiceError::DuplicateSlug(slug)
            } else {
                ArticleServiceError::InternalError(e.context("Failed to update article category"))
            }
        })
    }

    /// Articles filed under the category stay, uncategorized
    pub async fn delete_category(&self, id: i64) -> Result<(), ArticleServiceError> {
        if !self
            .category_repo
            .delete(id)
            .await
            .context("Failed to delete article category")?
        {
            return Err(ArticleServiceError::NotFound(format!("article category #{}", id)));
        }
        Ok(())
    }
}

fn required(value: &str, field: &str) -> Result<String, ArticleServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ArticleServiceError::ValidationError(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

fn article_type(kind: Option<&str>) -> String {
    kind.map(str::trim)
        .filter(|k| !k.is_empty())
        .unwrap_or(DEFAULT_ARTICLE_TYPE)
        .to_string()
}

/// Publishing stamps `published_at` once; unpublishing keeps it
fn set_published(article: &mut Article, publish: bool) {
    if publish && article.published_at.is_none() {
        article.published_at = Some(Utc::now());
    }
    article.is_published = publish;
}

fn category_slug(slug: Option<&str>, name: &str) -> Result<String, ArticleServiceError> {
    let source = slug.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(name);
    slug_or_fallback(source, "article-category").ok_or_else(|| {
        ArticleServiceError::ValidationError(format!("Cannot build a slug from '{}'", source))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxArticleCategoryRepository, SqlxArticleRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreateUserInput, PageCount, UserRole};

    async fn setup_test_service() -> (ArticleService, Arc<dyn UserRepository>) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let users = SqlxUserRepository::boxed(pool.clone());
        let service = ArticleService::new(
            SqlxArticleRepository::boxed(pool.clone()),
            SqlxArticleCategoryRepository::boxed(pool),
            users.clone(),
        );
        (service, users)
    }

    fn article(title: &str) -> CreateArticleInput {
        CreateArticleInput {
            title: title.to_string(),
            ..CreateArticleInput::default()
        }
    }

    #[tokio::test]
    async fn test_title_required_and_defaults() {
        let (service, _) = setup_test_service().await;
        let err = service.create(article("   ")).await.unwrap_err();
        assert!(matches!(err, ArticleServiceError::ValidationError(_)));

        let created = service
            .create(CreateArticleInput {
                pages: Some(PageCount::Text("18.6".to_string())),
                ..article("Home loan checklist")
            })
            .await
            .unwrap();
        assert_eq!(created.article_type, DEFAULT_ARTICLE_TYPE);
        assert_eq!(created.pages, Some(18));
        assert!(!created.is_published);
        assert!(created.published_at.is_none());
    }

    #[tokio::test]
    async fn test_unknown_references_are_dropped() {
        let (service, users) = setup_test_service().await;
        let category = service
            .create_category(CreateArticleCategoryInput {
                name: "Legal".to_string(),
                ..CreateArticleCategoryInput::default()
            })
            .await
            .unwrap();
        let author = users
            .create(&CreateUserInput {
                username: "meera".to_string(),
                email: "meera@example.in".to_string(),
                password_hash: "x".to_string(),
                first_name: None,
                last_name: None,
                phone: None,
                role: UserRole::Admin,
                preferences: serde_json::Map::new(),
            })
            .await
            .unwrap();

        let known = service
            .create(CreateArticleInput {
                author_id: Some(author.id),
                category_id: Some(category.id),
                ..article("Stamp duty explained")
            })
            .await
            .unwrap();
        assert_eq!(known.author_id, Some(author.id));
        assert_eq!(known.category_name.as_deref(), Some("Legal"));

        let dangling = service
            .create(CreateArticleInput {
                author_id: Some(9_999),
                category_id: Some(9_999),
                ..article("Orphan")
            })
            .await
            .unwrap();
        assert!(dangling.author_id.is_none());
        assert!(dangling.category_id.is_none());
    }

    #[tokio::test]
    async fn test_only_published_articles_are_viewable() {
        let (service, _) = setup_test_service().await;
        let draft = service.create(article("Draft")).await.unwrap();
        assert!(matches!(
            service.view(draft.id).await.unwrap_err(),
            ArticleServiceError::NotFound(_)
        ));
        assert!(service
            .list_published(&ArticleFilter::default())
            .await
            .unwrap()
            .is_empty());

        let published = service.toggle_publish(draft.id).await.unwrap();
        assert!(published.is_published);
        let stamped = published.published_at;
        assert!(stamped.is_some());

        assert_eq!(service.view(draft.id).await.unwrap().view_count, 1);
        assert_eq!(service.view(draft.id).await.unwrap().view_count, 2);

        let unpublished = service.toggle_publish(draft.id).await.unwrap();
        assert!(!unpublished.is_published);
        assert_eq!(unpublished.published_at, stamped);
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_keeps_unsent_fields() {
        let (service, _) = setup_test_service().await;
        let created = service
            .create(CreateArticleInput {
                description: Some("Rates by city".to_string()),
                pages: Some(PageCount::Number(10.0)),
                ..article("Rent report")
            })
            .await
            .unwrap();

        let updated = service
            .update(
                created.id,
                UpdateArticleInput {
                    article_type: Some("research".to_string()),
                    pages: Some(PageCount::Text("n/a".to_string())),
                    thumbnail_url: Some(Some("/uploads/cover.jpg".to_string())),
                    ..UpdateArticleInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.article_type, "research");
        assert_eq!(updated.pages, Some(10));
        assert_eq!(updated.description.as_deref(), Some("Rates by city"));
        assert_eq!(updated.thumbnail_url.as_deref(), Some("/uploads/cover.jpg"));

        service.delete(created.id).await.unwrap();
        assert!(matches!(
            service.delete(created.id).await.unwrap_err(),
            ArticleServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_category_slugs() {
        let (service, _) = setup_test_service().await;
        let legal = service
            .create_category(CreateArticleCategoryInput {
                name: "Legal & Tax".to_string(),
                ..CreateArticleCategoryInput::default()
            })
            .await
            .unwrap();
        assert_eq!(legal.slug, "legal-tax");

        let err = service
            .create_category(CreateArticleCategoryInput {
                name: "Another".to_string(),
                slug: Some("legal-tax".to_string()),
                ..CreateArticleCategoryInput::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ArticleServiceError::DuplicateSlug(_)));

        let hindi = service
            .create_category(CreateArticleCategoryInput {
                name: "कानूनी".to_string(),
                ..CreateArticleCategoryInput::default()
            })
            .await
            .unwrap();
        assert!(hindi.slug.starts_with("article-category-"));

        let renamed = service
            .update_category(
                legal.id,
                UpdateArticleCategoryInput {
                    name: Some("Legal".to_string()),
                    ..UpdateArticleCategoryInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.slug, "legal-tax");

        let names: Vec<_> = service
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Legal", "कानूनी"]);

        service.delete_category(legal.id).await.unwrap();
        assert!(matches!(
            service.get_category(legal.id).await.unwrap_err(),
            ArticleServiceError::NotFound(_)
        ));
    }
}
