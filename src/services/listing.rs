//! Listing service
//!
//! One engine for every listing kind: validation, partial updates with
//! attribute merging, the public/admin split, and the seller dashboard.

use crate::db::repositories::{KindCount, ListingRepository};
use crate::models::{
    CreateListingInput, Listing, ListingFilter, ListingKind, PriceInput, UpdateListingInput,
    RESERVED_LISTING_FIELDS,
};
use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

const DEFAULT_COUNTRY: &str = "India";
const DASHBOARD_TOP: usize = 5;
const DASHBOARD_RECENT: usize = 10;

/// Error types for listing service operations
#[derive(Debug, thiserror::Error)]
pub enum ListingServiceError {
    #[error("Listing not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Per-kind row of the seller dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindBreakdown {
    pub kind: ListingKind,
    pub label: &'static str,
    pub total: i64,
    pub active: i64,
    pub featured: i64,
    pub views: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardTotals {
    pub listings: i64,
    pub active: i64,
    pub inactive: i64,
    pub featured: i64,
    pub views: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOverview {
    pub active: i64,
    pub inactive: i64,
    pub featured: i64,
}

/// Everything a seller sees about their own listings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerDashboard {
    pub totals: DashboardTotals,
    pub by_category: Vec<KindBreakdown>,
    pub status_overview: StatusOverview,
    pub top_categories: Vec<KindBreakdown>,
    pub top_listings: Vec<Listing>,
    pub recent_listings: Vec<Listing>,
}

/// Listing service
pub struct ListingService {
    repo: Arc<dyn ListingRepository>,
}

impl ListingService {
    pub fn new(repo: Arc<dyn ListingRepository>) -> Self {
        Self { repo }
    }

    /// Create a listing of `kind`
    ///
    /// Unknown input keys become attributes, except ones that name a column.
    pub async fn create(
        &self,
        kind: ListingKind,
        input: CreateListingInput,
    ) -> Result<Listing, ListingServiceError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(ListingServiceError::ValidationError(
                "Title is required".to_string(),
            ));
        }
        let price = parse_price(input.price.as_ref())?;

        let mut attributes = Map::new();
        merge_attributes(&mut attributes, input.attributes.unwrap_or_default());
        merge_attributes(&mut attributes, input.extra);

        let now = Utc::now();
        let listing = Listing {
            id: 0,
            kind,
            title: title.to_string(),
            description: input.description,
            price,
            images: input.images,
            category: input.category,
            country: input
                .country
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            state: input.state,
            city: input.city,
            area: input.area,
            address: input.address,
            contact_name: input.contact_name,
            contact_phone: input.contact_phone,
            contact_email: input.contact_email,
            location_id: input.location_id,
            user_id: input.user_id,
            role: input.role,
            is_active: input.is_active.unwrap_or(true),
            is_featured: input.is_featured.unwrap_or(false),
            view_count: 0,
            attributes,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .repo
            .create(&listing)
            .await
            .context("Failed to create listing")?;
        tracing::info!(kind = %kind, id = created.id, "listing created");
        Ok(created)
    }

    /// Get a listing of `kind`; a listing of another kind is not found
    pub async fn get(&self, kind: ListingKind, id: i64) -> Result<Listing, ListingServiceError> {
        self.repo
            .get_by_id(kind, id)
            .await
            .context("Failed to get listing")?
            .ok_or_else(|| ListingServiceError::NotFound(format!("{} #{}", kind, id)))
    }

    /// List listings of `kind`, newest first
    pub async fn list(
        &self,
        kind: ListingKind,
        filter: &ListingFilter,
    ) -> Result<Vec<Listing>, ListingServiceError> {
        Ok(self
            .repo
            .list(Some(kind), filter)
            .await
            .context("Failed to list listings")?)
    }

    /// Like `list`, restricted to active listings
    pub async fn list_public(
        &self,
        kind: ListingKind,
        filter: &ListingFilter,
    ) -> Result<Vec<Listing>, ListingServiceError> {
        let filter = ListingFilter {
            is_active: Some(true),
            ..filter.clone()
        };
        self.list(kind, &filter).await
    }

    /// Public detail view: active listings only, counts the view
    pub async fn view(&self, kind: ListingKind, id: i64) -> Result<Listing, ListingServiceError> {
        let mut listing = self.get(kind, id).await?;
        if !listing.is_active {
            return Err(ListingServiceError::NotFound(format!("{} #{}", kind, id)));
        }
        self.repo
            .increment_views(id)
            .await
            .context("Failed to count listing view")?;
        listing.view_count += 1;
        Ok(listing)
    }

    /// Partial update; `attributes` merge key by key and `null` removes a key
    pub async fn update(
        &self,
        kind: ListingKind,
        id: i64,
        input: UpdateListingInput,
    ) -> Result<Listing, ListingServiceError> {
        let mut listing = self.get(kind, id).await?;

        if let Some(title) = input.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(ListingServiceError::ValidationError(
                    "Title cannot be empty".to_string(),
                ));
            }
            listing.title = title.to_string();
        }
        if let Some(price) = input.price {
            listing.price = parse_price(price.as_ref())?;
        }
        if let Some(description) = input.description {
            listing.description = description;
        }
        if let Some(images) = input.images {
            listing.images = images;
        }
        if let Some(category) = input.category {
            listing.category = category;
        }
        if let Some(country) = input.country {
            listing.country = country;
        }
        if let Some(state) = input.state {
            listing.state = state;
        }
        if let Some(city) = input.city {
            listing.city = city;
        }
        if let Some(area) = input.area {
            listing.area = area;
        }
        if let Some(address) = input.address {
            listing.address = address;
        }
        if let Some(contact_name) = input.contact_name {
            listing.contact_name = contact_name;
        }
        if let Some(contact_phone) = input.contact_phone {
            listing.contact_phone = contact_phone;
        }
        if let Some(contact_email) = input.contact_email {
            listing.contact_email = contact_email;
        }
        if let Some(location_id) = input.location_id {
            listing.location_id = location_id;
        }
        if let Some(is_active) = input.is_active {
            listing.is_active = is_active;
        }
        if let Some(is_featured) = input.is_featured {
            listing.is_featured = is_featured;
        }
        merge_attributes(&mut listing.attributes, input.attributes.unwrap_or_default());
        merge_attributes(&mut listing.attributes, input.extra);

        Ok(self
            .repo
            .update(&listing)
            .await
            .context("Failed to update listing")?)
    }

    pub async fn delete(&self, kind: ListingKind, id: i64) -> Result<(), ListingServiceError> {
        let deleted = self
            .repo
            .delete(kind, id)
            .await
            .context("Failed to delete listing")?;
        if !deleted {
            return Err(ListingServiceError::NotFound(format!("{} #{}", kind, id)));
        }
        tracing::info!(kind = %kind, id, "listing deleted");
        Ok(())
    }

    pub async fn toggle_active(&self, kind: ListingKind, id: i64) -> Result<Listing, ListingServiceError> {
        let mut listing = self.get(kind, id).await?;
        listing.is_active = !listing.is_active;
        Ok(self
            .repo
            .update(&listing)
            .await
            .context("Failed to toggle listing status")?)
    }

    pub async fn toggle_featured(&self, kind: ListingKind, id: i64) -> Result<Listing, ListingServiceError> {
        let mut listing = self.get(kind, id).await?;
        listing.is_featured = !listing.is_featured;
        Ok(self
            .repo
            .update(&listing)
            .await
            .context("Failed to toggle listing featured flag")?)
    }

    /// Aggregate every listing the user owns, across all kinds
    pub async fn seller_dashboard(&self, user_id: i64) -> Result<SellerDashboard, ListingServiceError> {
        let filter = ListingFilter {
            user_id: Some(user_id),
            ..ListingFilter::default()
        };
        let listings = self
            .repo
            .list(None, &filter)
            .await
            .context("Failed to load seller listings")?;
        Ok(build_dashboard(listings))
    }

    /// Per-kind totals for the public stats endpoint
    pub async fn counts(&self) -> Result<Vec<KindCount>, ListingServiceError> {
        Ok(self
            .repo
            .count_by_kind()
            .await
            .context("Failed to count listings")?)
    }
}

fn parse_price(price: Option<&PriceInput>) -> Result<Option<f64>, ListingServiceError> {
    match price {
        Some(price) => price.parse().map_err(ListingServiceError::ValidationError),
        None => Ok(None),
    }
}

fn merge_attributes(target: &mut Map<String, Value>, incoming: Map<String, Value>) {
    for (key, value) in incoming {
        if RESERVED_LISTING_FIELDS.contains(&key.as_str()) {
            continue;
        }
        if value.is_null() {
            target.remove(&key);
        } else {
            target.insert(key, value);
        }
    }
}

/// `listings` must already be newest first
fn build_dashboard(listings: Vec<Listing>) -> SellerDashboard {
    let mut totals = DashboardTotals::default();
    let mut by_kind: BTreeMap<ListingKind, KindBreakdown> = BTreeMap::new();

    for listing in &listings {
        totals.listings += 1;
        totals.views += listing.view_count;
        if listing.is_active {
            totals.active += 1;
        } else {
            totals.inactive += 1;
        }
        if listing.is_featured {
            totals.featured += 1;
        }

        let row = by_kind.entry(listing.kind).or_insert_with(|| KindBreakdown {
            kind: listing.kind,
            label: listing.kind.label(),
            total: 0,
            active: 0,
            featured: 0,
            views: 0,
        });
        row.total += 1;
        row.views += listing.view_count;
        row.active += listing.is_active as i64;
        row.featured += listing.is_featured as i64;
    }

    let by_category: Vec<KindBreakdown> = by_kind.into_values().collect();

    let mut top_categories = by_category.clone();
    top_categories.sort_by(|a, b| b.views.cmp(&a.views).then(b.total.cmp(&a.total)));
    top_categories.truncate(DASHBOARD_TOP);

    let mut top_listings = listings.clone();
    // Stable sort keeps newest first among equal view counts
    top_listings.sort_by(|a, b| b.view_count.cmp(&a.view_count));
    top_listings.truncate(DASHBOARD_TOP);

    let mut recent_listings = listings;
    recent_listings.truncate(DASHBOARD_RECENT);

    SellerDashboard {
        status_overview: StatusOverview {
            active: totals.active,
            inactive: totals.inactive,
            featured: totals.featured,
        },
        totals,
        by_category,
        top_categories,
        top_listings,
        recent_listings,
    }
}
