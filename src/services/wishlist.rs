//! Per-user wishlist

use crate::db::repositories::{is_unique_violation, WishlistRepository};
use crate::models::{WishlistEntryInput, WishlistItem};
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum WishlistServiceError {
    #[error("Not in wishlist: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Outcome of a toggle
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResult {
    pub added: bool,
    pub listing_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<WishlistItem>,
}

pub struct WishlistService {
    repo: Arc<dyn WishlistRepository>,
}

impl WishlistService {
    pub fn new(repo: Arc<dyn WishlistRepository>) -> Self {
        Self { repo }
    }

    /// Most recently saved first
    pub async fn list(&self, user_id: i64) -> Result<Vec<WishlistItem>, WishlistServiceError> {
        Ok(self.repo.list(user_id).await.context("Failed to list wishlist")?)
    }

    /// Save the listing if absent, otherwise remove it
    pub async fn toggle(
        &self,
        user_id: i64,
        entry: WishlistEntryInput,
    ) -> Result<ToggleResult, WishlistServiceError> {
        if entry.listing_id <= 0 {
            return Err(WishlistServiceError::ValidationError(
                "listingId is required".to_string(),
            ));
        }

        let existing = self
            .repo
            .get(user_id, entry.listing_id)
            .await
            .context("Failed to check wishlist")?;
        if existing.is_some() {
            self.repo
                .remove(user_id, entry.listing_id)
                .await
                .context("Failed to remove from wishlist")?;
            return Ok(ToggleResult {
                added: false,
                listing_id: entry.listing_id,
                item: None,
            });
        }

        match self.repo.add(user_id, &entry).await {
            Ok(item) => Ok(ToggleResult {
                added: true,
                listing_id: entry.listing_id,
                item: Some(item),
            }),
            // A concurrent toggle saved it first; this toggle takes it back out
            Err(e) if is_unique_violation(&e) => {
                self.repo
                    .remove(user_id, entry.listing_id)
                    .await
                    .context("Failed to remove from wishlist")?;
                Ok(ToggleResult {
                    added: false,
                    listing_id: entry.listing_id,
                    item: None,
                })
            }
            Err(e) => Err(e.context("Failed to add to wishlist").into()),
        }
    }

    pub async fn remove(&self, user_id: i64, listing_id: i64) -> Result<(), WishlistServiceError> {
        if !self
            .repo
            .remove(user_id, listing_id)
            .await
            .context("Failed to remove from wishlist")?
        {
            return Err(WishlistServiceError::NotFound(listing_id));
        }
        Ok(())
    }

    /// Returns how many items were removed
    pub async fn clear(&self, user_id: i64) -> Result<u64, WishlistServiceError> {
        Ok(self.repo.clear(user_id).await.context("Failed to clear wishlist")?)
    }

    pub async fn count(&self, user_id: i64) -> Result<i64, WishlistServiceError> {
        Ok(self.repo.count(user_id).await.context("Failed to count wishlist")?)
    }

    pub async fn contains(&self, user_id: i64, listing_id: i64) -> Result<bool, WishlistServiceError> {
        Ok(self
            .repo
            .get(user_id, listing_id)
            .await
            .context("Failed to check wishlist")?
            .is_some())
    }
}
