//! Blog content models: posts and videos

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Blog post. Only published posts are visible publicly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    /// URL-friendly slug (unique)
    pub slug: String,
    /// Category slug the post is filed under
    pub category: Option<String>,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub tags: Vec<String>,
    pub author_name: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub is_published: bool,
    pub is_featured: bool,
    /// Set the first time the post is published
    pub published_at: Option<DateTime<Utc>>,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    /// Strings a keyword search looks at
    pub fn searchable_text(&self) -> Vec<(&str, String)> {
        let mut fields = vec![("title", self.title.clone()), ("content", self.content.clone())];
        if let Some(excerpt) = &self.excerpt {
            fields.push(("excerpt", excerpt.clone()));
        }
        if let Some(category) = &self.category {
            fields.push(("category", category.clone()));
        }
        fields.extend(self.tags.iter().map(|t| ("tags", t.clone())));
        fields
    }
}

/// Tags arrive either as a list or as the comma-separated string the admin form sends.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Csv(String),
}

impl TagsInput {
    pub fn into_vec(self) -> Vec<String> {
        let raw = match self {
            TagsInput::List(list) => list,
            TagsInput::Csv(csv) => csv.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogPostInput {
    #[serde(default)]
    pub title: String,
    pub slug: Option<String>,
    pub category: Option<String>,
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: String,
    pub cover_image_url: Option<String>,
    pub tags: Option<TagsInput>,
    pub author_name: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub is_published: Option<bool>,
    pub is_featured: Option<bool>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlogPostInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub excerpt: Option<Option<String>>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub cover_image_url: Option<Option<String>>,
    pub tags: Option<TagsInput>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub author_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub seo_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub seo_description: Option<Option<String>>,
    pub is_published: Option<bool>,
    pub is_featured: Option<bool>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Video shown on the videos page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    /// Display string such as "3:45"
    pub duration: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideoInput {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub duration: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVideoInput {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub description: Option<Option<String>>,
    pub video_url: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub thumbnail_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub duration: Option<Option<String>>,
    pub is_active: Option<bool>,
}
