//! Location repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Location;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

use super::delete_by_id;

/// Location repository trait
#[async_trait]
pub trait LocationRepository: Send + Sync {
    /// Create a new location
    async fn create(&self, location: &Location) -> Result<Location>;

    /// Get location by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Location>>;

    /// List locations by name
    async fn list(&self) -> Result<Vec<Location>>;

    /// Update a location
    async fn update(&self, location: &Location) -> Result<Location>;

    /// Delete a location
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based location repository implementation
pub struct SqlxLocationRepository {
    pool: DynDatabasePool,
}

impl SqlxLocationRepository {
    /// Create a new SQLx location repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn LocationRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_LOCATION: &str =
    "SELECT id, name, country, city, area, property_count FROM locations";

macro_rules! row_to_location {
    ($row:expr) => {
        Location {
            id: $row.get("id"),
            name: $row.get("name"),
            country: $row.get("country"),
            city: $row.get("city"),
            area: $row.get("area"),
            property_count: $row.get("property_count"),
        }
    };
}

macro_rules! bind_location_body {
    ($query:expr, $location:expr) => {
        $query
            .bind(&$location.name)
            .bind(&$location.country)
            .bind(&$location.city)
            .bind(&$location.area)
            .bind($location.property_count)
    };
}

#[async_trait]
impl LocationRepository for SqlxLocationRepository {
    async fn create(&self, location: &Location) -> Result<Location> {
        let sql = "INSERT INTO locations (name, country, city, area, property_count) \
                   VALUES (?, ?, ?, ?, ?)";
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => bind_location_body!(sqlx::query(sql), location)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to create location")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => bind_location_body!(sqlx::query(sql), location)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to create location")?
                .last_insert_id() as i64,
        };
        Ok(Location {
            id,
            ..location.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Location>> {
        let sql = format!("{} WHERE id = ?", SELECT_LOCATION);
        let location = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .bind(id)
                .fetch_optional(self.pool.sqlite()?)
                .await
                .context("Failed to get location by ID")?
                .map(|row| row_to_location!(row)),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .bind(id)
                .fetch_optional(self.pool.mysql()?)
                .await
                .context("Failed to get location by ID")?
                .map(|row| row_to_location!(row)),
        };
        Ok(location)
    }

    async fn list(&self) -> Result<Vec<Location>> {
        let sql = format!("{} ORDER BY name ASC, id ASC", SELECT_LOCATION);
        let locations = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .fetch_all(self.pool.sqlite()?)
                .await
                .context("Failed to list locations")?
                .iter()
                .map(|row| row_to_location!(row))
                .collect(),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .fetch_all(self.pool.mysql()?)
                .await
                .context("Failed to list locations")?
                .iter()
                .map(|row| row_to_location!(row))
                .collect(),
        };
        Ok(locations)
    }

    async fn update(&self, location: &Location) -> Result<Location> {
        let sql = "UPDATE locations SET name = ?, country = ?, city = ?, area = ?, \
                   property_count = ? WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                bind_location_body!(sqlx::query(sql), location)
                    .bind(location.id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to update location")?;
            }
            DatabaseDriver::Mysql => {
                bind_location_body!(sqlx::query(sql), location)
                    .bind(location.id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to update location")?;
            }
        }

        self.get_by_id(location.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Location not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        delete_by_id(&self.pool, "locations", id)
            .await
            .context("Failed to delete location")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxLocationRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxLocationRepository::new(pool)
    }

    fn test_location(name: &str, city: &str) -> Location {
        Location {
            id: 0,
            name: name.to_string(),
            country: "India".to_string(),
            city: Some(city.to_string()),
            area: None,
            property_count: 0,
        }
    }

    #[tokio::test]
    async fn test_crud_sorted_by_name() {
        let repo = setup_test_repo().await;
        let mut whitefield = repo
            .create(&test_location("Whitefield", "Bengaluru"))
            .await
            .unwrap();
        repo.create(&test_location("Baner", "Pune")).await.unwrap();

        let names: Vec<_> = repo.list().await.unwrap().into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["Baner", "Whitefield"]);

        whitefield.area = Some("ITPL".to_string());
        whitefield.property_count = 42;
        let updated = repo.update(&whitefield).await.unwrap();
        assert_eq!(updated.area.as_deref(), Some("ITPL"));
        assert_eq!(updated.property_count, 42);

        assert!(repo.delete(whitefield.id).await.unwrap());
        assert!(repo.get_by_id(whitefield.id).await.unwrap().is_none());
    }
}
