//! Agency repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Agency;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use super::delete_by_id;

/// Agency repository trait
#[async_trait]
pub trait AgencyRepository: Send + Sync {
    /// Create a new agency
    async fn create(&self, agency: &Agency) -> Result<Agency>;

    /// Get agency by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Agency>>;

    /// List agencies, newest first
    async fn list(&self) -> Result<Vec<Agency>>;

    /// Update an agency
    async fn update(&self, agency: &Agency) -> Result<Agency>;

    /// Delete an agency
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based agency repository implementation
pub struct SqlxAgencyRepository {
    pool: DynDatabasePool,
}

impl SqlxAgencyRepository {
    /// Create a new SQLx agency repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AgencyRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_AGENCY: &str = r#"
    SELECT id, name, description, logo, phone, email, website, property_count, created_at
    FROM agencies
"#;

macro_rules! row_to_agency {
    ($row:expr) => {
        Agency {
            id: $row.get("id"),
            name: $row.get("name"),
            description: $row.get("description"),
            logo: $row.get("logo"),
            phone: $row.get("phone"),
            email: $row.get("email"),
            website: $row.get("website"),
            property_count: $row.get("property_count"),
            created_at: $row.get("created_at"),
        }
    };
}

macro_rules! bind_agency_body {
    ($query:expr, $agency:expr) => {
        $query
            .bind(&$agency.name)
            .bind(&$agency.description)
            .bind(&$agency.logo)
            .bind(&$agency.phone)
            .bind(&$agency.email)
            .bind(&$agency.website)
            .bind($agency.property_count)
    };
}

#[async_trait]
impl AgencyRepository for SqlxAgencyRepository {
    async fn create(&self, agency: &Agency) -> Result<Agency> {
        let now = Utc::now();
        let sql = "INSERT INTO agencies (name, description, logo, phone, email, website, \
                   property_count, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)";
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => bind_agency_body!(sqlx::query(sql), agency)
                .bind(now)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to create agency")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => bind_agency_body!(sqlx::query(sql), agency)
                .bind(now)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to create agency")?
                .last_insert_id() as i64,
        };
        Ok(Agency {
            id,
            created_at: now,
            ..agency.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Agency>> {
        let sql = format!("{} WHERE id = ?", SELECT_AGENCY);
        let agency = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .bind(id)
                .fetch_optional(self.pool.sqlite()?)
                .await
                .context("Failed to get agency by ID")?
                .map(|row| row_to_agency!(row)),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .bind(id)
                .fetch_optional(self.pool.mysql()?)
                .await
                .context("Failed to get agency by ID")?
                .map(|row| row_to_agency!(row)),
        };
        Ok(agency)
    }

    async fn list(&self) -> Result<Vec<Agency>> {
        let sql = format!("{} ORDER BY created_at DESC, id DESC", SELECT_AGENCY);
        let agencies = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .fetch_all(self.pool.sqlite()?)
                .await
                .context("Failed to list agencies")?
                .iter()
                .map(|row| row_to_agency!(row))
                .collect(),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .fetch_all(self.pool.mysql()?)
                .await
                .context("Failed to list agencies")?
                .iter()
                .map(|row| row_to_agency!(row))
                .collect(),
        };
        Ok(agencies)
    }

    async fn update(&self, agency: &Agency) -> Result<Agency> {
        let sql = "UPDATE agencies SET name = ?, description = ?, logo = ?, phone = ?, email = ?, \
                   website = ?, property_count = ? WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                bind_agency_body!(sqlx::query(sql), agency)
                    .bind(agency.id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to update agency")?;
            }
            DatabaseDriver::Mysql => {
                bind_agency_body!(sqlx::query(sql), agency)
                    .bind(agency.id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to update agency")?;
            }
        }

        self.get_by_id(agency.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Agency not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        delete_by_id(&self.pool, "agencies", id)
            .await
            .context("Failed to delete agency")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxAgencyRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxAgencyRepository::new(pool)
    }

    fn test_agency(name: &str) -> Agency {
        Agency {
            id: 0,
            name: name.to_string(),
            description: None,
            logo: None,
            phone: Some("+91 98450 00000".to_string()),
            email: None,
            website: None,
            property_count: 3,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_crud_newest_first() {
        let repo = setup_test_repo().await;
        repo.create(&test_agency("Kaveri Realty")).await.unwrap();
        let mut second = repo.create(&test_agency("Deccan Homes")).await.unwrap();

        let names: Vec<_> = repo.list().await.unwrap().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["Deccan Homes", "Kaveri Realty"]);

        second.website = Some("https://deccanhomes.in".to_string());
        second.phone = None;
        let updated = repo.update(&second).await.unwrap();
        assert_eq!(updated.website.as_deref(), Some("https://deccanhomes.in"));
        assert!(updated.phone.is_none());
        assert_eq!(updated.property_count, 3);

        assert!(repo.delete(second.id).await.unwrap());
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }
}
