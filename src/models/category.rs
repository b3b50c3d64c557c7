//! Category model
//!
//! Admin-managed service categories (e.g. "Education & Learning") and their
//! subcategories. Deleting a category removes its subcategories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level service category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// URL-friendly slug (unique)
    pub slug: String,
    pub description: Option<String>,
    /// Icon name understood by the front end
    pub icon: Option<String>,
    /// Accent colour, `#1e40af` unless set
    pub color: String,
    pub is_active: bool,
    /// Ascending display order
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Subcategory belonging to exactly one category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub parent_category_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category with its subcategories, as served to the public menu
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithSubcategories {
    #[serde(flatten)]
    pub category: Category,
    pub subcategories: Vec<Subcategory>,
}

impl CategoryWithSubcategories {
    /// Attach the subcategories whose parent is `category`
    pub fn assemble(categories: Vec<Category>, subcategories: &[Subcategory]) -> Vec<Self> {
        categories
            .into_iter()
            .map(|category| {
                let children = subcategories
                    .iter()
                    .filter(|s| s.parent_category_id == category.id)
                    .cloned()
                    .collect();
                Self {
                    category,
                    subcategories: children,
                }
            })
            .collect()
    }
}

/// Input for creating a category
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryInput {
    #[serde(default)]
    pub name: String,
    /// Generated from the name when missing
    pub slug: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

impl CreateCategoryInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = Some(sort_order);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = Some(false);
        self
    }
}

/// Input for updating a category or subcategory
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub icon: Option<Option<String>>,
    pub color: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
    /// Only meaningful for subcategories
    pub parent_category_id: Option<i64>,
}

/// Input for creating a subcategory
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubcategoryInput {
    #[serde(flatten)]
    pub base: CreateCategoryInput,
    #[serde(default)]
    pub parent_category_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: i64, slug: &str) -> Category {
        let now = Utc::now();
        Category {
            id,
            name: slug.to_uppercase(),
            slug: slug.to_string(),
            description: None,
            icon: None,
            color: "#1e40af".to_string(),
            is_active: true,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn subcategory(id: i64, parent: i64) -> Subcategory {
        let now = Utc::now();
        Subcategory {
            id,
            name: format!("Sub {}", id),
            slug: format!("sub-{}", id),
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

    #[test]
    fn test_assemble_groups_by_parent() {
        let subs = vec![subcategory(10, 1), subcategory(11, 2), subcategory(12, 1)];
        let tree = CategoryWithSubcategories::assemble(
            vec![category(1, "education"), category(2, "vehicles"), category(3, "empty")],
            &subs,
        );

        assert_eq!(tree.len(), 3);
        let ids: Vec<i64> = tree[0].subcategories.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![10, 12]);
        assert_eq!(tree[1].subcategories.len(), 1);
        assert!(tree[2].subcategories.is_empty());
    }

    #[test]
    fn test_tree_serializes_flat() {
        let tree = CategoryWithSubcategories::assemble(vec![category(1, "education")], &[]);
        let json = serde_json::to_value(&tree[0]).unwrap();
        assert_eq!(json["slug"], "education");
        assert_eq!(json["sortOrder"], 0);
        assert!(json["subcategories"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_subcategory_input_flattens_base() {
        let input: CreateSubcategoryInput = serde_json::from_value(serde_json::json!({
            "name": "Tuition",
            "parentCategoryId": 4,
            "sortOrder": 2
        }))
        .unwrap();
        assert_eq!(input.base.name, "Tuition");
        assert_eq!(input.base.sort_order, Some(2));
        assert_eq!(input.parent_category_id, 4);
    }
}
