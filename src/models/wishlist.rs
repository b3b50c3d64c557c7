//! Wishlist model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A listing a user has saved. `(user_id, listing_id)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub id: i64,
    pub user_id: i64,
    pub listing_id: i64,
    /// Listing category slug, kept so the client can build links
    pub kind: Option<String>,
    pub title: Option<String>,
    pub href: Option<String>,
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// What the client sends when saving a listing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntryInput {
    #[serde(default)]
    pub listing_id: i64,
    pub kind: Option<String>,
    pub title: Option<String>,
    pub href: Option<String>,
    pub photo: Option<String>,
}
