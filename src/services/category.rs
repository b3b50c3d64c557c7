//! Category service
//!
//! Categories and their subcategories, the cached public tree, and slug
//! resolution for the services a user picks at signup.

use crate::cache::{keys, Cache, CacheLayer};
use crate::db::repositories::CategoryRepository;
use crate::models::{
    Category, CategoryWithSubcategories, CreateCategoryInput, CreateSubcategoryInput,
    Subcategory, UpdateCategoryInput,
};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Color given to categories created without one
pub const DEFAULT_CATEGORY_COLOR: &str = "#1e40af";

/// Error types for category service operations
#[derive(Debug, thiserror::Error)]
pub enum CategoryServiceError {
    #[error("Category not found: {0}")]
    NotFound(String),

    #[error("Slug already exists: {0}")]
    DuplicateSlug(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
    cache: Arc<Cache>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryRepository>, cache: Arc<Cache>) -> Self {
        Self { repo, cache }
    }

    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    pub async fn create(&self, input: CreateCategoryInput) -> Result<Category, CategoryServiceError> {
        let name = required_name(&input.name)?;
        let slug = resolve_slug(input.slug.as_deref(), &name)?;

        if self
            .repo
            .get_by_slug(&slug)
            .await
            .context("Failed to check slug uniqueness")?
            .is_some()
        {
            return Err(CategoryServiceError::DuplicateSlug(slug));
        }

        let now = Utc::now();
        let category = Category {
            id: 0,
            name,
            slug,
            description: input.description,
            icon: input.icon,
            color: input
                .color
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
            is_active: input.is_active.unwrap_or(true),
            sort_order: input.sort_order.unwrap_or(0),
            created_at: now,
            updated_at: now,
        };

        let created = self
            .repo
            .create(&category)
            .await
            .context("Failed to create category")?;
        self.invalidate_cache().await;
        Ok(created)
    }

    pub async fn get(&self, id: i64) -> Result<Category, CategoryServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get category")?
            .ok_or_else(|| CategoryServiceError::NotFound(format!("category #{}", id)))
    }

    /// All categories, by sort order then name
    pub async fn list(&self) -> Result<Vec<Category>, CategoryServiceError> {
        Ok(self.repo.list(false).await.context("Failed to list categories")?)
    }

    pub async fn update(
        &self,
        id: i64,
        input: UpdateCategoryInput,
    ) -> Result<Category, CategoryServiceError> {
        let mut category = self.get(id).await?;

        if let Some(name) = input.name {
            category.name = required_name(&name)?;
        }
        if let Some(slug) = input.slug {
            let slug = resolve_slug(Some(&slug), &category.name)?;
            if slug != category.slug {
                let taken = self
                    .repo
                    .get_by_slug(&slug)
                    .await
                    .context("Failed to check slug uniqueness")?;
                if taken.is_some_and(|other| other.id != id) {
                    return Err(CategoryServiceError::DuplicateSlug(slug));
                }
                category.slug = slug;
            }
        }
        if let Some(description) = input.description {
            category.description = description;
        }
        if let Some(icon) = input.icon {
            category.icon = icon;
        }
        if let Some(color) = input.color {
            category.color = color;
        }
        if let Some(is_active) = input.is_active {
            category.is_active = is_active;
        }
        if let Some(sort_order) = input.sort_order {
            category.sort_order = sort_order;
        }

        let updated = self
            .repo
            .update(&category)
            .await
            .context("Failed to update category")?;
        self.invalidate_cache().await;
        Ok(updated)
    }

    /// Delete a category and, through the foreign key, its subcategories
    pub async fn delete(&self, id: i64) -> Result<(), CategoryServiceError> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .context("Failed to delete category")?;
        if !deleted {
            return Err(CategoryServiceError::NotFound(format!("category #{}", id)));
        }
        self.invalidate_cache().await;
        tracing::info!(id, "category deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Subcategories
    // ------------------------------------------------------------------

    pub async fn create_subcategory(
        &self,
        input: CreateSubcategoryInput,
    ) -> Result<Subcategory, CategoryServiceError> {
        let base = input.base;
        let name = required_name(&base.name)?;
        let slug = resolve_slug(base.slug.as_deref(), &name)?;
        self.ensure_parent(input.parent_category_id).await?;

        if self
            .repo
            .get_subcategory_by_slug(&slug)
            .await
            .context("Failed to check slug uniqueness")?
            .is_some()
        {
            return Err(CategoryServiceError::DuplicateSlug(slug));
        }

        let now = Utc::now();
        let subcategory = Subcategory {
            id: 0,
            name,
            slug,
            description: base.description,
            icon: base.icon,
            color: base.color.filter(|c| !c.trim().is_empty()),
            is_active: base.is_active.unwrap_or(true),
            sort_order: base.sort_order.unwrap_or(0),
            parent_category_id: input.parent_category_id,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .repo
            .create_subcategory(&subcategory)
            .await
            .context("Failed to create subcategory")?;
        self.invalidate_cache().await;
        Ok(created)
    }

    pub async fn get_subcategory(&self, id: i64) -> Result<Subcategory, CategoryServiceError> {
        self.repo
            .get_subcategory(id)
            .await
            .context("Failed to get subcategory")?
            .ok_or_else(|| CategoryServiceError::NotFound(format!("subcategory #{}", id)))
    }

    pub async fn list_subcategories(&self) -> Result<Vec<Subcategory>, CategoryServiceError> {
        Ok(self
            .repo
            .list_subcategories(false)
            .await
            .context("Failed to list subcategories")?)
    }

    pub async fn update_subcategory(
        &self,
        id: i64,
        input: UpdateCategoryInput,
    ) -> Result<Subcategory, CategoryServiceError> {
        let mut sub = self.get_subcategory(id).await?;

        if let Some(name) = input.name {
            sub.name = required_name(&name)?;
        }
        if let Some(slug) = input.slug {
            let slug = resolve_slug(Some(&slug), &sub.name)?;
            if slug != sub.slug {
                let taken = self
                    .repo
                    .get_subcategory_by_slug(&slug)
                    .await
                    .context("Failed to check slug uniqueness")?;
                if taken.is_some_and(|other| other.id != id) {
                    return Err(CategoryServiceError::DuplicateSlug(slug));
                }
                sub.slug = slug;
            }
        }
        if let Some(parent_id) = input.parent_category_id {
            self.ensure_parent(parent_id).await?;
            sub.parent_category_id = parent_id;
        }
        if let Some(description) = input.description {
            sub.description = description;
        }
        if let Some(icon) = input.icon {
            sub.icon = icon;
        }
        if let Some(color) = input.color {
            sub.color = Some(color).filter(|c| !c.trim().is_empty());
        }
        if let Some(is_active) = input.is_active {
            sub.is_active = is_active;
        }
        if let Some(sort_order) = input.sort_order {
            sub.sort_order = sort_order;
        }

        let updated = self
            .repo
            .update_subcategory(&sub)
            .await
            .context("Failed to update subcategory")?;
        self.invalidate_cache().await;
        Ok(updated)
    }

    pub async fn delete_subcategory(&self, id: i64) -> Result<(), CategoryServiceError> {
        let deleted = self
            .repo
            .delete_subcategory(id)
            .await
            .context("Failed to delete subcategory")?;
        if !deleted {
            return Err(CategoryServiceError::NotFound(format!("subcategory #{}", id)));
        }
        self.invalidate_cache().await;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Public views
    // ------------------------------------------------------------------

    /// Active categories, each with its active subcategories
    pub async fn public_tree(&self) -> Result<Vec<CategoryWithSubcategories>, CategoryServiceError> {
        if let Some(tree) = self
            .cache
            .get::<Vec<CategoryWithSubcategories>>(keys::CATEGORY_TREE)
            .await
            .ok()
            .flatten()
        {
            return Ok(tree);
        }

        let categories = self
            .repo
            .list(true)
            .await
            .context("Failed to list active categories")?;
        let subcategories = self
            .repo
            .list_subcategories(true)
            .await
            .context("Failed to list active subcategories")?;
        let tree = CategoryWithSubcategories::assemble(categories, &subcategories);

        if let Err(e) = self.cache.set(keys::CATEGORY_TREE, &tree, self.cache.ttl()).await {
            tracing::warn!("Failed to cache category tree: {}", e);
        }
        Ok(tree)
    }

    pub async fn active_categories(&self) -> Result<Vec<Category>, CategoryServiceError> {
        if let Some(categories) = self
            .cache
            .get::<Vec<Category>>(keys::ACTIVE_CATEGORIES)
            .await
            .ok()
            .flatten()
        {
            return Ok(categories);
        }

        let categories = self
            .repo
            .list(true)
            .await
            .context("Failed to list active categories")?;
        if let Err(e) = self
            .cache
            .set(keys::ACTIVE_CATEGORIES, &categories, self.cache.ttl())
            .await
        {
            tracing::warn!("Failed to cache active categories: {}", e);
        }
        Ok(categories)
    }

    /// Names of the categories and subcategories behind the given slugs
    ///
    /// Unknown slugs are skipped. Duplicates are reported once.
    pub async fn resolve_selected_services(
        &self,
        category_slugs: &[String],
        subcategory_slugs: &[String],
    ) -> Result<Vec<String>, CategoryServiceError> {
        let mut names: Vec<String> = Vec::new();

        for slug in category_slugs {
            if let Some(category) = self
                .repo
                .get_by_slug(slug.trim())
                .await
                .context("Failed to resolve category slug")?
            {
                if !names.contains(&category.name) {
                    names.push(category.name);
                }
            }
        }
        for slug in subcategory_slugs {
            if let Some(sub) = self
                .repo
                .get_subcategory_by_slug(slug.trim())
                .await
                .context("Failed to resolve subcategory slug")?
            {
                if !names.contains(&sub.name) {
                    names.push(sub.name);
                }
            }
        }
        Ok(names)
    }

    async fn ensure_parent(&self, parent_id: i64) -> Result<(), CategoryServiceError> {
        let parent = self
            .repo
            .get_by_id(parent_id)
            .await
            .context("Failed to get parent category")?;
        if parent.is_none() {
            return Err(CategoryServiceError::ValidationError(format!(
                "Parent category {} does not exist",
                parent_id
            )));
        }
        Ok(())
    }

    async fn invalidate_cache(&self) {
        if let Err(e) = self.cache.delete_pattern(keys::CATEGORY_PATTERN).await {
            tracing::warn!("Failed to invalidate category cache: {}", e);
        }
    }
}

fn required_name(name: &str) -> Result<String, CategoryServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CategoryServiceError::ValidationError(
            "Name is required".to_string(),
        ));
    }
    Ok(name.to_string())
}

/// Normalize an explicit slug, or derive one from `name`
fn resolve_slug(slug: Option<&str>, name: &str) -> Result<String, CategoryServiceError> {
    let source = slug.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(name);
    slug_or_fallback(source, "category").ok_or_else(|| {
        CategoryServiceError::ValidationError(format!("Cannot build a slug from '{}'", source))
    })
}

/// Slug for `source`, or `<prefix>-<random>` when it is written entirely
/// outside ASCII (Devanagari names, for example).
///
/// `None` when `source` has no letters or digits at all.
pub fn slug_or_fallback(source: &str, prefix: &str) -> Option<String> {
    let slug = generate_slug(source);
    if !slug.is_empty() {
        return Some(slug);
    }
    if !source.chars().any(char::is_alphanumeric) {
        return None;
    }
    let token = Uuid::new_v4().simple().to_string();
    Some(format!("{}-{}", prefix, &token[..8]))
}

/// URL slug for a name
///
/// Lowercase ASCII letters and digits; every other run of characters
/// becomes a single `-`, with none at either end.
pub fn generate_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::CacheConfig;
    use crate::db::repositories::SqlxCategoryRepository;
    use crate::db::{create_test_pool, migrations};
    use proptest::prelude::*;

    async fn setup_test_service() -> CategoryService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let repo = SqlxCategoryRepository::boxed(pool);
        let cache = create_cache(&CacheConfig::default())
            .await
            .expect("Failed to create cache");
        CategoryService::new(repo, cache)
    }

    fn sub_input(name: &str, parent: i64) -> CreateSubcategoryInput {
        CreateSubcategoryInput {
            base: CreateCategoryInput::new(name),
            parent_category_id: parent,
        }
    }

    #[test]
    fn test_generate_slug() {
        assert_eq!(generate_slug("Hello World"), "hello-world");
        assert_eq!(generate_slug("  Tuition & Private Classes! "), "tuition-private-classes");
        assert_eq!(generate_slug("Cyber Café / Internet"), "cyber-caf-internet");
        assert_eq!(generate_slug("---"), "");
    }

    #[test]
    fn test_slug_fallback_for_non_latin_names() {
        assert_eq!(slug_or_fallback("Real Estate", "category").as_deref(), Some("real-estate"));

        let hindi = slug_or_fallback("किराया", "category").unwrap();
        assert!(hindi.starts_with("category-"));
        assert_eq!(hindi.len(), "category-".len() + 8);
        assert_eq!(generate_slug(&hindi), hindi);

        assert_eq!(slug_or_fallback("--- !!", "category"), None);
    }

    #[tokio::test]
    async fn test_create_category_with_devanagari_name() {
        let service = setup_test_service().await;
        let category = service.create(CreateCategoryInput::new("किराया")).await.unwrap();
        assert_eq!(category.name, "किराया");
        assert!(category.slug.starts_with("category-"));
    }

    #[tokio::test]
    async fn test_create_generates_slug_and_default_color() {
        let service = setup_test_service().await;
        let category = service
            .create(CreateCategoryInput::new("Real Estate & Property"))
            .await
            .unwrap();
        assert_eq!(category.slug, "real-estate-property");
        assert_eq!(category.color, DEFAULT_CATEGORY_COLOR);
        assert!(category.is_active);
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_conflict() {
        let service = setup_test_service().await;
        service.create(CreateCategoryInput::new("Vehicles")).await.unwrap();
        let err = service
            .create(CreateCategoryInput::new("Other").with_slug("vehicles"))
            .await
            .unwrap_err();
        assert!(matches!(err, CategoryServiceError::DuplicateSlug(_)));

        let err = service.create(CreateCategoryInput::new("  ")).await.unwrap_err();
        assert!(matches!(err, CategoryServiceError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_update_partial_and_slug_conflict() {
        let service = setup_test_service().await;
        let a = service.create(CreateCategoryInput::new("Alpha")).await.unwrap();
        service.create(CreateCategoryInput::new("Beta")).await.unwrap();

        let updated = service
            .update(
                a.id,
                UpdateCategoryInput {
                    description: Some(Some("First".to_string())),
                    sort_order: Some(3),
                    ..UpdateCategoryInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Alpha");
        assert_eq!(updated.description.as_deref(), Some("First"));
        assert_eq!(updated.sort_order, 3);

        let err = service
            .update(
                a.id,
                UpdateCategoryInput {
                    slug: Some("beta".to_string()),
                    ..UpdateCategoryInput::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CategoryServiceError::DuplicateSlug(_)));

        let err = service.update(999, UpdateCategoryInput::default()).await.unwrap_err();
        assert!(matches!(err, CategoryServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_subcategory_requires_parent() {
        let service = setup_test_service().await;
        let err = service.create_subcategory(sub_input("Maths", 42)).await.unwrap_err();
        assert!(matches!(err, CategoryServiceError::ValidationError(_)));

        let parent = service.create(CreateCategoryInput::new("Education")).await.unwrap();
        let sub = service.create_subcategory(sub_input("Maths", parent.id)).await.unwrap();
        assert_eq!(sub.parent_category_id, parent.id);
        assert_eq!(sub.color, None);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_subcategories() {
        let service = setup_test_service().await;
        let parent = service.create(CreateCategoryInput::new("Education")).await.unwrap();
        let sub = service.create_subcategory(sub_input("Maths", parent.id)).await.unwrap();

        service.delete(parent.id).await.unwrap();
        assert!(matches!(
            service.get_subcategory(sub.id).await.unwrap_err(),
            CategoryServiceError::NotFound(_)
        ));
        assert!(matches!(
            service.delete(parent.id).await.unwrap_err(),
            CategoryServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_public_tree_is_invalidated_on_write() {
        let service = setup_test_service().await;
        let education = service.create(CreateCategoryInput::new("Education")).await.unwrap();
        service
            .create(CreateCategoryInput::new("Hidden").inactive())
            .await
            .unwrap();
        service.create_subcategory(sub_input("Maths", education.id)).await.unwrap();

        let tree = service.public_tree().await.unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].subcategories.len(), 1);

        let extra = service.create_subcategory(sub_input("Science", education.id)).await.unwrap();
        let tree = service.public_tree().await.unwrap();
        assert_eq!(tree[0].subcategories.len(), 2);

        service
            .update_subcategory(
                extra.id,
                UpdateCategoryInput {
                    is_active: Some(false),
                    ..UpdateCategoryInput::default()
                },
            )
            .await
            .unwrap();
        let tree = service.public_tree().await.unwrap();
        assert_eq!(tree[0].subcategories.len(), 1);
        assert_eq!(service.active_categories().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_selected_services() {
        let service = setup_test_service().await;
        let parent = service.create(CreateCategoryInput::new("Education")).await.unwrap();
        service.create_subcategory(sub_input("Maths Tuition", parent.id)).await.unwrap();

        let names = service
            .resolve_selected_services(
                &["education".to_string(), "unknown".to_string()],
                &["maths-tuition".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(names, vec!["Education", "Maths Tuition"]);
    }

    proptest! {
        #[test]
        fn prop_slug_is_url_safe(name in "\\PC{0,40}") {
            let slug = generate_slug(&name);
            prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
        }

        #[test]
        fn prop_slug_is_idempotent(name in "[a-zA-Z0-9 _&-]{0,40}") {
            let slug = generate_slug(&name);
            prop_assert_eq!(generate_slug(&slug), slug);
        }
    }
}
