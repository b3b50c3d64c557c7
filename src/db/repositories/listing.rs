//! Listing repository
//!
//! Database operations for marketplace listings. All listing kinds share the
//! `listings` table and are told apart by its `kind` column.
//!
//! This module provides:
//! - `ListingRepository` trait defining the interface for listing data access
//! - `SqlxListingRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Listing, ListingFilter, ListingKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::{decode_json, encode_json};

/// Listing totals for one kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindCount {
    pub kind: ListingKind,
    pub total: i64,
    pub active: i64,
}

/// Listing repository trait
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Insert a listing; `id`, `view_count` and timestamps are assigned here
    async fn create(&self, listing: &Listing) -> Result<Listing>;

    /// Get a listing by ID, only if it has the given kind
    async fn get_by_id(&self, kind: ListingKind, id: i64) -> Result<Option<Listing>>;

    /// List listings, newest first. `kind = None` spans every kind.
    async fn list(&self, kind: Option<ListingKind>, filter: &ListingFilter) -> Result<Vec<Listing>>;

    /// Write back every mutable column and bump `updated_at`
    async fn update(&self, listing: &Listing) -> Result<Listing>;

    /// Delete a listing. Returns false when nothing matched.
    async fn delete(&self, kind: ListingKind, id: i64) -> Result<bool>;

    /// Add one to the view counter
    async fn increment_views(&self, id: i64) -> Result<()>;

    /// Total and active counts for every kind that has listings
    async fn count_by_kind(&self) -> Result<Vec<KindCount>>;
}

/// SQLx-based listing repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxListingRepository {
    pool: DynDatabasePool,
}

impl SqlxListingRepository {
    /// Create a new SQLx listing repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ListingRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ListingRepository for SqlxListingRepository {
    async fn create(&self, listing: &Listing) -> Result<Listing> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_listing_sqlite(self.pool.sqlite()?, listing).await,
            DatabaseDriver::Mysql => create_listing_mysql(self.pool.mysql()?, listing).await,
        }
    }

    async fn get_by_id(&self, kind: ListingKind, id: i64) -> Result<Option<Listing>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_listing_sqlite(self.pool.sqlite()?, kind, id).await,
            DatabaseDriver::Mysql => get_listing_mysql(self.pool.mysql()?, kind, id).await,
        }
    }

    async fn list(&self, kind: Option<ListingKind>, filter: &ListingFilter) -> Result<Vec<Listing>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_listings_sqlite(self.pool.sqlite()?, kind, filter).await,
            DatabaseDriver::Mysql => list_listings_mysql(self.pool.mysql()?, kind, filter).await,
        }
    }

    async fn update(&self, listing: &Listing) -> Result<Listing> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_listing_sqlite(self.pool.sqlite()?, listing).await,
            DatabaseDriver::Mysql => update_listing_mysql(self.pool.mysql()?, listing).await,
        }
    }

    async fn delete(&self, kind: ListingKind, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_listing_sqlite(self.pool.sqlite()?, kind, id).await,
            DatabaseDriver::Mysql => delete_listing_mysql(self.pool.mysql()?, kind, id).await,
        }
    }

    async fn increment_views(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => increment_views_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => increment_views_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn count_by_kind(&self) -> Result<Vec<KindCount>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_by_kind_sqlite(self.pool.sqlite()?).await,
            DatabaseDriver::Mysql => count_by_kind_mysql(self.pool.mysql()?).await,
        }
    }
}

// ============================================================================
// Shared SQL
// ============================================================================

const SELECT_LISTING: &str = r#"
    SELECT id, kind, title, description, price, images, category, country, state, city,
           area, address, contact_name, contact_phone, contact_email, location_id, user_id,
           role, is_active, is_featured, view_count, attributes, created_at, updated_at
    FROM listings
"#;

const INSERT_LISTING: &str = r#"
    INSERT INTO listings (
        kind, title, description, price, images, category, country, state, city, area,
        address, contact_name, contact_phone, contact_email, location_id, user_id, role,
        is_active, is_featured, view_count, attributes, created_at, updated_at
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?)
"#;

const UPDATE_LISTING: &str = r#"
    UPDATE listings
    SET title = ?, description = ?, price = ?, images = ?, category = ?, country = ?,
        state = ?, city = ?, area = ?, address = ?, contact_name = ?, contact_phone = ?,
        contact_email = ?, location_id = ?, is_active = ?, is_featured = ?, attributes = ?,
        updated_at = ?
    WHERE id = ? AND kind = ?
"#;

/// Each optional filter is bound twice: once for the `IS NULL` escape, once for the test.
const FILTER_CLAUSE: &str = r#"
    WHERE (? IS NULL OR kind = ?)
      AND (? IS NULL OR is_active = ?)
      AND (? IS NULL OR is_featured = ?)
      AND (? IS NULL OR LOWER(category) = LOWER(?))
      AND (? IS NULL OR LOWER(city) = LOWER(?))
      AND (? IS NULL OR user_id = ?)
      AND (? IS NULL OR role = ?)
    ORDER BY created_at DESC, id DESC
    LIMIT ? OFFSET ?
"#;

const COUNT_BY_KIND: &str = r#"
    SELECT kind,
           COUNT(*) AS total,
           COUNT(CASE WHEN is_active THEN 1 END) AS active
    FROM listings
    GROUP BY kind
    ORDER BY kind
"#;

macro_rules! bind_listing_filter {
    ($query:expr, $kind:expr, $filter:expr) => {
        $query
            .bind($kind)
            .bind($kind)
            .bind($filter.is_active)
            .bind($filter.is_active)
            .bind($filter.is_featured)
            .bind($filter.is_featured)
            .bind($filter.category.as_deref())
            .bind($filter.category.as_deref())
            .bind($filter.city.as_deref())
            .bind($filter.city.as_deref())
            .bind($filter.user_id)
            .bind($filter.user_id)
            .bind($filter.role.as_deref())
            .bind($filter.role.as_deref())
            .bind($filter.limit.unwrap_or(i64::MAX).max(0))
            .bind($filter.offset.unwrap_or(0).max(0))
    };
}

macro_rules! bind_listing_body {
    ($query:expr, $listing:expr, $images:expr) => {
        $query
            .bind(&$listing.title)
            .bind(&$listing.description)
            .bind($listing.price)
            .bind($images)
            .bind(&$listing.category)
            .bind(&$listing.country)
            .bind(&$listing.state)
            .bind(&$listing.city)
            .bind(&$listing.area)
            .bind(&$listing.address)
            .bind(&$listing.contact_name)
            .bind(&$listing.contact_phone)
            .bind(&$listing.contact_email)
            .bind($listing.location_id)
    };
}

fn kind_from_column(raw: &str) -> Result<ListingKind> {
    raw.parse()
        .with_context(|| format!("Invalid listing kind in database: {}", raw))
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_listing_sqlite(pool: &SqlitePool, listing: &Listing) -> Result<Listing> {
    let now = Utc::now();
    let images = encode_json(&listing.images, "images")?;
    let attributes = encode_json(&listing.attributes, "attributes")?;

    let query = sqlx::query(INSERT_LISTING).bind(listing.kind.slug());
    let result = bind_listing_body!(query, listing, &images)
        .bind(listing.user_id)
        .bind(&listing.role)
        .bind(listing.is_active)
        .bind(listing.is_featured)
        .bind(&attributes)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create listing")?;

    Ok(Listing {
        id: result.last_insert_rowid(),
        view_count: 0,
        created_at: now,
        updated_at: now,
        ..listing.clone()
    })
}

async fn get_listing_sqlite(pool: &SqlitePool, kind: ListingKind, id: i64) -> Result<Option<Listing>> {
    let sql = format!("{} WHERE id = ? AND kind = ?", SELECT_LISTING);
    let row = sqlx::query(&sql)
        .bind(id)
        .bind(kind.slug())
        .fetch_optional(pool)
        .await
        .context("Failed to get listing by ID")?;

    row.as_ref().map(row_to_listing_sqlite).transpose()
}

async fn list_listings_sqlite(
    pool: &SqlitePool,
    kind: Option<ListingKind>,
    filter: &ListingFilter,
) -> Result<Vec<Listing>> {
    let sql = format!("{} {}", SELECT_LISTING, FILTER_CLAUSE);
    let kind = kind.map(|k| k.slug());
    let rows = bind_listing_filter!(sqlx::query(&sql), kind, filter)
        .fetch_all(pool)
        .await
        .context("Failed to list listings")?;

    rows.iter().map(row_to_listing_sqlite).collect()
}

async fn update_listing_sqlite(pool: &SqlitePool, listing: &Listing) -> Result<Listing> {
    let now = Utc::now();
    let images = encode_json(&listing.images, "images")?;
    let attributes = encode_json(&listing.attributes, "attributes")?;

    let query = sqlx::query(UPDATE_LISTING);
    bind_listing_body!(query, listing, &images)
        .bind(listing.is_active)
        .bind(listing.is_featured)
        .bind(&attributes)
        .bind(now)
        .bind(listing.id)
        .bind(listing.kind.slug())
        .execute(pool)
        .await
        .context("Failed to update listing")?;

    get_listing_sqlite(pool, listing.kind, listing.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Listing not found after update"))
}

async fn delete_listing_sqlite(pool: &SqlitePool, kind: ListingKind, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM listings WHERE id = ? AND kind = ?")
        .bind(id)
        .bind(kind.slug())
        .execute(pool)
        .await
        .context("Failed to delete listing")?;

    Ok(result.rows_affected() > 0)
}

async fn increment_views_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("UPDATE listings SET view_count = view_count + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to increment listing views")?;

    Ok(())
}

async fn count_by_kind_sqlite(pool: &SqlitePool) -> Result<Vec<KindCount>> {
    let rows = sqlx::query(COUNT_BY_KIND)
        .fetch_all(pool)
        .await
        .context("Failed to count listings")?;

    let mut counts = Vec::with_capacity(rows.len());
    for row in rows {
        let kind: String = row.get("kind");
        counts.push(KindCount {
            kind: kind_from_column(&kind)?,
            total: row.get("total"),
            active: row.get("active"),
        });
    }
    Ok(counts)
}

fn row_to_listing_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Listing> {
    let kind: String = row.get("kind");
    let images: String = row.get("images");
    let attributes: String = row.get("attributes");

    Ok(Listing {
        id: row.get("id"),
        kind: kind_from_column(&kind)?,
        title: row.get("title"),
        description: row.get("description"),
        price: row.get("price"),
        images: decode_json(&images, "images")?,
        category: row.get("category"),
        country: row.get("country"),
        state: row.get("state"),
        city: row.get("city"),
        area: row.get("area"),
        address: row.get("address"),
        contact_name: row.get("contact_name"),
        contact_phone: row.get("contact_phone"),
        contact_email: row.get("contact_email"),
        location_id: row.get("location_id"),
        user_id: row.get("user_id"),
        role: row.get("role"),
        is_active: row.get("is_active"),
        is_featured: row.get("is_featured"),
        view_count: row.get("view_count"),
        attributes: decode_json(&attributes, "attributes")?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_listing_mysql(pool: &MySqlPool, listing: &Listing) -> Result<Listing> {
    let now = Utc::now();
    let images = encode_json(&listing.images, "images")?;
    let attributes = encode_json(&listing.attributes, "attributes")?;

    let query = sqlx::query(INSERT_LISTING).bind(listing.kind.slug());
    let result = bind_listing_body!(query, listing, &images)
        .bind(listing.user_id)
        .bind(&listing.role)
        .bind(listing.is_active)
        .bind(listing.is_featured)
        .bind(&attributes)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create listing")?;

    Ok(Listing {
        id: result.last_insert_id() as i64,
        view_count: 0,
        created_at: now,
        updated_at: now,
        ..listing.clone()
    })
}

async fn get_listing_mysql(pool: &MySqlPool, kind: ListingKind, id: i64) -> Result<Option<Listing>> {
    let sql = format!("{} WHERE id = ? AND kind = ?", SELECT_LISTING);
    let row = sqlx::query(&sql)
        .bind(id)
        .bind(kind.slug())
        .fetch_optional(pool)
        .await
        .context("Failed to get listing by ID")?;

    row.as_ref().map(row_to_listing_mysql).transpose()
}

async fn list_listings_mysql(
    pool: &MySqlPool,
    kind: Option<ListingKind>,
    filter: &ListingFilter,
) -> Result<Vec<Listing>> {
    let sql = format!("{} {}", SELECT_LISTING, FILTER_CLAUSE);
    let kind = kind.map(|k| k.slug());
    let rows = bind_listing_filter!(sqlx::query(&sql), kind, filter)
        .fetch_all(pool)
        .await
        .context("Failed to list listings")?;

    rows.iter().map(row_to_listing_mysql).collect()
}

async fn update_listing_mysql(pool: &MySqlPool, listing: &Listing) -> Result<Listing> {
    let now = Utc::now();
    let images = encode_json(&listing.images, "images")?;
    let attributes = encode_json(&listing.attributes, "attributes")?;

    let query = sqlx::query(UPDATE_LISTING);
    bind_listing_body!(query, listing, &images)
        .bind(listing.is_active)
        .bind(listing.is_featured)
        .bind(&attributes)
        .bind(now)
        .bind(listing.id)
        .bind(listing.kind.slug())
        .execute(pool)
        .await
        .context("Failed to update listing")?;

    get_listing_mysql(pool, listing.kind, listing.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Listing not found after update"))
}

async fn delete_listing_mysql(pool: &MySqlPool, kind: ListingKind, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM listings WHERE id = ? AND kind = ?")
        .bind(id)
        .bind(kind.slug())
        .execute(pool)
        .await
        .context("Failed to delete listing")?;

    Ok(result.rows_affected() > 0)
}

async fn increment_views_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("UPDATE listings SET view_count = view_count + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to increment listing views")?;

    Ok(())
}

async fn count_by_kind_mysql(pool: &MySqlPool) -> Result<Vec<KindCount>> {
    let rows = sqlx::query(COUNT_BY_KIND)
        .fetch_all(pool)
        .await
        .context("Failed to count listings")?;

    let mut counts = Vec::with_capacity(rows.len());
    for row in rows {
        let kind: String = row.get("kind");
        counts.push(KindCount {
            kind: kind_from_column(&kind)?,
            total: row.get("total"),
            active: row.get("active"),
        });
    }
    Ok(counts)
}

fn row_to_listing_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Listing> {
    let kind: String = row.get("kind");
    let images: String = row.get("images");
    let attributes: String = row.get("attributes");

    Ok(Listing {
        id: row.get("id"),
        kind: kind_from_column(&kind)?,
        title: row.get("title"),
        description: row.get("description"),
        price: row.get("price"),
        images: decode_json(&images, "images")?,
        category: row.get("category"),
        country: row.get("country"),
        state: row.get("state"),
        city: row.get("city"),
        area: row.get("area"),
        address: row.get("address"),
        contact_name: row.get("contact_name"),
        contact_phone: row.get("contact_phone"),
        contact_email: row.get("contact_email"),
        location_id: row.get("location_id"),
        user_id: row.get("user_id"),
        role: row.get("role"),
        is_active: row.get("is_active"),
        is_featured: row.get("is_featured"),
        view_count: row.get("view_count"),
        attributes: decode_json(&attributes, "attributes")?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
