//! Blog service
//!
//! Posts (public by slug once published) and videos.

use crate::db::repositories::{BlogPostRepository, VideoRepository};
use crate::models::{
    BlogPost, CreateBlogPostInput, CreateVideoInput, UpdateBlogPostInput, UpdateVideoInput, Video,
};
use crate::services::category::slug_or_fallback;
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum BlogServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Slug already exists: {0}")]
    DuplicateSlug(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct BlogService {
    posts: Arc<dyn BlogPostRepository>,
    videos: Arc<dyn VideoRepository>,
}

impl BlogService {
    pub fn new(posts: Arc<dyn BlogPostRepository>, videos: Arc<dyn VideoRepository>) -> Self {
        Self { posts, videos }
    }

    /// Published posts, latest publication first
    pub async fn list_published(&self, category: Option<&str>) -> Result<Vec<BlogPost>, BlogServiceError> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        Ok(self
            .posts
            .list(true, category)
            .await
            .context("Failed to list published posts")?)
    }

    /// Public post page; counts the view
    pub async fn view_by_slug(&self, slug: &str) -> Result<BlogPost, BlogServiceError> {
        let mut post = self
            .posts
            .get_by_slug(slug)
            .await
            .context("Failed to get post by slug")?
            .filter(|p| p.is_published)
            .ok_or_else(|| BlogServiceError::NotFound(format!("post '{}'", slug)))?;

        self.posts
            .increment_views(post.id)
            .await
            .context("Failed to count post view")?;
        post.view_count += 1;
        Ok(post)
    }

    /// Every post, newest first
    pub async fn list_posts(&self) -> Result<Vec<BlogPost>, BlogServiceError> {
        let mut posts = self.posts.list(false, None).await.context("Failed to list posts")?;
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(posts)
    }

    pub async fn get_post(&self, id: i64) -> Result<BlogPost, BlogServiceError> {
        self.posts
            .get_by_id(id)
            .await
            .context("Failed to get post")?
            .ok_or_else(|| BlogServiceError::NotFound(format!("post #{}", id)))
    }

    pub async fn create_post(&self, input: CreateBlogPostInput) -> Result<BlogPost, BlogServiceError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(BlogServiceError::ValidationError("Title is required".to_string()));
        }
        let slug = post_slug(input.slug.as_deref(), title)?;
        self.ensure_slug_free(&slug, None).await?;

        let now = Utc::now();
        let is_published = input.is_published.unwrap_or(false);
        let published_at = match input.published_at {
            Some(at) => Some(at),
            None if is_published => Some(now),
            None => None,
        };

        let post = BlogPost {
            id: 0,
            title: title.to_string(),
            slug,
            category: input.category,
            excerpt: input.excerpt,
            content: input.content,
            cover_image_url: input.cover_image_url,
            tags: input.tags.map(|t| t.into_vec()).unwrap_or_default(),
            author_name: input.author_name,
            seo_title: input.seo_title,
            seo_description: input.seo_description,
            is_published,
            is_featured: input.is_featured.unwrap_or(false),
            published_at,
            view_count: 0,
            created_at: now,
            updated_at: now,
        };

        let created = self.posts.create(&post).await.context("Failed to create post")?;
        tracing::info!(id = created.id, slug = %created.slug, "blog post created");
        Ok(created)
    }

    pub async fn update_post(
        &self,
        id: i64,
        input: UpdateBlogPostInput,
    ) -> Result<BlogPost, BlogServiceError> {
        let mut post = self.get_post(id).await?;

        if let Some(title) = input.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(BlogServiceError::ValidationError("Title cannot be empty".to_string()));
            }
            post.title = title.to_string();
        }
        if let Some(slug) = input.slug {
            let slug = post_slug(Some(&slug), &post.title)?;
            if slug != post.slug {
                self.ensure_slug_free(&slug, Some(id)).await?;
                post.slug = slug;
            }
        }
        if let Some(category) = input.category {
            post.category = category;
        }
        if let Some(excerpt) = input.excerpt {
            post.excerpt = excerpt;
        }
        if let Some(content) = input.content {
            post.content = content;
        }
        if let Some(cover) = input.cover_image_url {
            post.cover_image_url = cover;
        }
        if let Some(tags) = input.tags {
            post.tags = tags.into_vec();
        }
        if let Some(author) = input.author_name {
            post.author_name = author;
        }
        if let Some(seo_title) = input.seo_title {
            post.seo_title = seo_title;
        }
        if let Some(seo_description) = input.seo_description {
            post.seo_description = seo_description;
        }
        if let Some(is_featured) = input.is_featured {
            post.is_featured = is_featured;
        }
        if let Some(published_at) = input.published_at {
            post.published_at = Some(published_at);
        }
        if let Some(is_published) = input.is_published {
            if is_published && post.published_at.is_none() {
                post.published_at = Some(Utc::now());
            }
            post.is_published = is_published;
        }

        Ok(self.posts.update(&post).await.context("Failed to update post")?)
    }

    /// Flip `is_published`; publishing stamps `published_at`, unpublishing keeps it
    pub async fn toggle_publish(&self, id: i64) -> Result<BlogPost, BlogServiceError> {
        let mut post = self.get_post(id).await?;
        post.is_published = !post.is_published;
        if post.is_published {
            post.published_at = Some(Utc::now());
        }
        Ok(self.posts.update(&post).await.context("Failed to toggle post")?)
    }

    pub async fn delete_post(&self, id: i64) -> Result<(), BlogServiceError> {
        if !self.posts.delete(id).await.context("Failed to delete post")? {
            return Err(BlogServiceError::NotFound(format!("post #{}", id)));
        }
        Ok(())
    }

    async fn ensure_slug_free(&self, slug: &str, own_id: Option<i64>) -> Result<(), BlogServiceError> {
        let existing = self
            .posts
            .get_by_slug(slug)
            .await
            .context("Failed to check slug uniqueness")?;
        match existing {
            Some(post) if Some(post.id) != own_id => {
                Err(BlogServiceError::DuplicateSlug(slug.to_string()))
            }
            _ => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Videos
    // ------------------------------------------------------------------

    pub async fn list_active_videos(&self) -> Result<Vec<Video>, BlogServiceError> {
        Ok(self.videos.list(true).await.context("Failed to list videos")?)
    }

    pub async fn list_videos(&self) -> Result<Vec<Video>, BlogServiceError> {
        Ok(self.videos.list(false).await.context("Failed to list videos")?)
    }

    pub async fn get_video(&self, id: i64) -> Result<Video, BlogServiceError> {
        self.videos
            .get_by_id(id)
            .await
            .context("Failed to get video")?
            .ok_or_else(|| BlogServiceError::NotFound(format!("video #{}", id)))
    }

    pub async fn create_video(&self, input: CreateVideoInput) -> Result<Video, BlogServiceError> {
        let video_url = input.video_url.trim();
        if video_url.is_empty() {
            return Err(BlogServiceError::ValidationError("Video URL is required".to_string()));
        }
        let now = Utc::now();
        let video = Video {
            id: 0,
            title: input.title.trim().to_string(),
            description: input.description,
            video_url: video_url.to_string(),
            thumbnail_url: input.thumbnail_url,
            duration: input.duration,
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        Ok(self.videos.create(&video).await.context("Failed to create video")?)
    }

    pub async fn update_video(&self, id: i64, input: UpdateVideoInput) -> Result<Video, BlogServiceError> {
        let mut video = self.get_video(id).await?;

        if let Some(url) = input.video_url {
            let url = url.trim();
            if url.is_empty() {
                return Err(BlogServiceError::ValidationError("Video URL cannot be empty".to_string()));
            }
            video.video_url = url.to_string();
        }
        if let Some(title) = input.title {
            video.title = title.trim().to_string();
        }
        if let Some(description) = input.description {
            video.description = description;
        }
        if let Some(thumbnail) = input.thumbnail_url {
            video.thumbnail_url = thumbnail;
        }
        if let Some(duration) = input.duration {
            video.duration = duration;
        }
        if let Some(is_active) = input.is_active {
            video.is_active = is_active;
        }

        Ok(self.videos.update(&video).await.context("Failed to update video")?)
    }

    pub async fn toggle_video(&self, id: i64) -> Result<Video, BlogServiceError> {
        let mut video = self.get_video(id).await?;
        video.is_active = !video.is_active;
        Ok(self.videos.update(&video).await.context("Failed to toggle video")?)
    }

    pub async fn delete_video(&self, id: i64) -> Result<(), BlogServiceError> {
        if !self.videos.delete(id).await.context("Failed to delete video")? {
            return Err(BlogServiceError::NotFound(format!("video #{}", id)));
        }
        Ok(())
    }
}

fn post_slug(slug: Option<&str>, title: &str) -> Result<String, BlogServiceError> {
    let source = slug.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(title);
    slug_or_fallback(source, "post").ok_or_else(|| {
        BlogServiceError::ValidationError(format!("Cannot build a slug from '{}'", source))
    })
}
