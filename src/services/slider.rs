//! Homepage slider service

use crate::cache::{keys, Cache, CacheLayer};
use crate::db::repositories::SliderRepository;
use crate::models::{CreateSliderInput, Slider, UpdateSliderInput};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum SliderServiceError {
    #[error("Slider not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct SliderService {
    repo: Arc<dyn SliderRepository>,
    cache: Arc<Cache>,
}

impl SliderService {
    pub fn new(repo: Arc<dyn SliderRepository>, cache: Arc<Cache>) -> Self {
        Self { repo, cache }
    }

    /// Active sliders by sort order, newest first within a position
    pub async fn list_active(&self) -> Result<Vec<Slider>, SliderServiceError> {
        if let Some(sliders) = self
            .cache
            .get::<Vec<Slider>>(keys::ACTIVE_SLIDERS)
            .await
            .ok()
            .flatten()
        {
            return Ok(sliders);
        }

        let sliders = self.repo.list(true).await.context("Failed to list sliders")?;
        if let Err(e) = self
            .cache
            .set(keys::ACTIVE_SLIDERS, &sliders, self.cache.ttl())
            .await
        {
            tracing::warn!("Failed to cache sliders: {}", e);
        }
        Ok(sliders)
    }

    pub async fn list(&self) -> Result<Vec<Slider>, SliderServiceError> {
        Ok(self.repo.list(false).await.context("Failed to list sliders")?)
    }

    pub async fn get(&self, id: i64) -> Result<Slider, SliderServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get slider")?
            .ok_or(SliderServiceError::NotFound(id))
    }

    pub async fn create(&self, input: CreateSliderInput) -> Result<Slider, SliderServiceError> {
        let image_url = input.image_url.trim();
        if image_url.is_empty() {
            return Err(SliderServiceError::ValidationError(
                "Image URL is required".to_string(),
            ));
        }

        let now = Utc::now();
        let slider = Slider {
            id: 0,
            title: input.title.trim().to_string(),
            description: input.description,
            image_url: image_url.to_string(),
            link_url: input.link_url,
            button_text: input.button_text,
            sort_order: input.sort_order.unwrap_or(0),
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        let created = self.repo.create(&slider).await.context("Failed to create slider")?;
        self.invalidate_cache().await;
        Ok(created)
    }

    pub async fn update(&self, id: i64, input: UpdateSliderInput) -> Result<Slider, SliderServiceError> {
        let mut slider = self.get(id).await?;

        if let Some(image_url) = input.image_url {
            let image_url = image_url.trim();
            if image_url.is_empty() {
                return Err(SliderServiceError::ValidationError(
                    "Image URL cannot be empty".to_string(),
                ));
            }
            slider.image_url = image_url.to_string();
        }
        if let Some(title) = input.title {
            slider.title = title.trim().to_string();
        }
        if let Some(description) = input.description {
            slider.description = description;
        }
        if let Some(link_url) = input.link_url {
            slider.link_url = link_url;
        }
        if let Some(button_text) = input.button_text {
            slider.button_text = button_text;
        }
        if let Some(sort_order) = input.sort_order {
            slider.sort_order = sort_order;
        }
        if let Some(is_active) = input.is_active {
            slider.is_active = is_active;
        }

        let updated = self.repo.update(&slider).await.context("Failed to update slider")?;
        self.invalidate_cache().await;
        Ok(updated)
    }

    pub async fn toggle_active(&self, id: i64) -> Result<Slider, SliderServiceError> {
        let mut slider = self.get(id).await?;
        slider.is_active = !slider.is_active;
        let updated = self.repo.update(&slider).await.context("Failed to toggle slider")?;
        self.invalidate_cache().await;
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), SliderServiceError> {
        if !self.repo.delete(id).await.context("Failed to delete slider")? {
            return Err(SliderServiceError::NotFound(id));
        }
        self.invalidate_cache().await;
        Ok(())
    }

    async fn invalidate_cache(&self) {
        if let Err(e) = self.cache.delete(keys::ACTIVE_SLIDERS).await {
            tracing::warn!("Failed to invalidate slider cache: {}", e);
        }
    }
}
