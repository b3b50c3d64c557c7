//! Articles (research papers, guides, reports) and their categories

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A downloadable article. `article_type` is a free label such as
/// "guide" or "research", serialized as `type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub article_type: String,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub author_id: Option<i64>,
    pub author_name: Option<String>,
    pub thumbnail_url: Option<String>,
    pub file_url: Option<String>,
    pub pages: Option<i32>,
    pub is_featured: bool,
    pub is_published: bool,
    pub is_premium: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub view_count: i64,
    pub download_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Page count as sent by the admin form: a number or a numeric string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PageCount {
    Number(f64),
    Text(String),
}

impl PageCount {
    /// Whole pages; anything unparsable or negative is `None`
    pub fn pages(&self) -> Option<i32> {
        let n = match self {
            PageCount::Number(n) => *n,
            PageCount::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        (n.is_finite() && n >= 0.0 && n <= i32::MAX as f64).then(|| n.floor() as i32)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleInput {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub article_type: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub author_id: Option<i64>,
    pub author_name: Option<String>,
    pub thumbnail_url: Option<String>,
    pub file_url: Option<String>,
    pub pages: Option<PageCount>,
    pub is_featured: Option<bool>,
    pub is_published: Option<bool>,
    pub is_premium: Option<bool>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticleInput {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub content: Option<Option<String>>,
    #[serde(rename = "type")]
    pub article_type: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub category_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub category_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub author_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub author_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub thumbnail_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub file_url: Option<Option<String>>,
    pub pages: Option<PageCount>,
    pub is_featured: Option<bool>,
    pub is_published: Option<bool>,
    pub is_premium: Option<bool>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Public article list filters (`?type=&featured=`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleFilter {
    #[serde(rename = "type")]
    pub article_type: Option<String>,
    pub featured: Option<bool>,
}

/// Category for articles, separate from the marketplace categories
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleCategory {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleCategoryInput {
    #[serde(default)]
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticleCategoryInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub description: Option<Option<String>>,
}
