//! Contact repository
//!
//! Contact form messages and newsletter subscriptions.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ContactMessage, CreateContactMessageInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use super::delete_by_id;

/// Contact repository trait
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Store a contact form submission
    async fn create_message(&self, input: &CreateContactMessageInput) -> Result<ContactMessage>;

    /// List messages, newest first
    async fn list_messages(&self) -> Result<Vec<ContactMessage>>;

    /// Get message by ID
    async fn get_message(&self, id: i64) -> Result<Option<ContactMessage>>;

    /// Mark a message as read
    async fn mark_read(&self, id: i64) -> Result<bool>;

    /// Delete a message
    async fn delete_message(&self, id: i64) -> Result<bool>;

    /// Add a newsletter subscriber. Returns false when the email was already subscribed.
    async fn subscribe(&self, email: &str) -> Result<bool>;
}

/// SQLx-based contact repository implementation
pub struct SqlxContactRepository {
    pool: DynDatabasePool,
}

impl SqlxContactRepository {
    /// Create a new SQLx contact repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ContactRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_MESSAGE: &str = r#"
    SELECT id, name, email, phone, subject, message, is_read, created_at
    FROM contact_messages
"#;

const INSERT_MESSAGE: &str = r#"
    INSERT INTO contact_messages (name, email, phone, subject, message, is_read, created_at)
    VALUES (?, ?, ?, ?, ?, 0, ?)
"#;

macro_rules! row_to_message {
    ($row:expr) => {
        ContactMessage {
            id: $row.get("id"),
            name: $row.get("name"),
            email: $row.get("email"),
            phone: $row.get("phone"),
            subject: $row.get("subject"),
            message: $row.get("message"),
            is_read: $row.get("is_read"),
            created_at: $row.get("created_at"),
        }
    };
}

#[async_trait]
impl ContactRepository for SqlxContactRepository {
    async fn create_message(&self, input: &CreateContactMessageInput) -> Result<ContactMessage> {
        let now = Utc::now();
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(INSERT_MESSAGE)
                .bind(&input.name)
                .bind(&input.email)
                .bind(&input.phone)
                .bind(&input.subject)
                .bind(&input.message)
                .bind(now)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to create contact message")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(INSERT_MESSAGE)
                .bind(&input.name)
                .bind(&input.email)
                .bind(&input.phone)
                .bind(&input.subject)
                .bind(&input.message)
                .bind(now)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to create contact message")?
                .last_insert_id() as i64,
        };

        Ok(ContactMessage {
            id,
            name: input.name.clone(),
            email: input.email.clone(),
            phone: input.phone.clone(),
            subject: input.subject.clone(),
            message: input.message.clone(),
            is_read: false,
            created_at: now,
        })
    }

    async fn list_messages(&self) -> Result<Vec<ContactMessage>> {
        let sql = format!("{} ORDER BY created_at DESC, id DESC", SELECT_MESSAGE);
        let messages: Vec<ContactMessage> = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .fetch_all(self.pool.sqlite()?)
                .await
                .context("Failed to list contact messages")?
                .iter()
                .map(|row| row_to_message!(row))
                .collect(),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .fetch_all(self.pool.mysql()?)
                .await
                .context("Failed to list contact messages")?
                .iter()
                .map(|row| row_to_message!(row))
                .collect(),
        };
        Ok(messages)
    }

    async fn get_message(&self, id: i64) -> Result<Option<ContactMessage>> {
        let sql = format!("{} WHERE id = ?", SELECT_MESSAGE);
        let message = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .bind(id)
                .fetch_optional(self.pool.sqlite()?)
                .await
                .context("Failed to get contact message")?
                .map(|row| row_to_message!(row)),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .bind(id)
                .fetch_optional(self.pool.mysql()?)
                .await
                .context("Failed to get contact message")?
                .map(|row| row_to_message!(row)),
        };
        Ok(message)
    }

    async fn mark_read(&self, id: i64) -> Result<bool> {
        let sql = "UPDATE contact_messages SET is_read = 1 WHERE id = ?";
        let updated = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(id)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to mark contact message read")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(id)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to mark contact message read")?
                .rows_affected(),
        };
        // MySQL reports zero affected rows when the value did not change
        if updated == 0 {
            return Ok(self.get_message(id).await?.is_some());
        }
        Ok(true)
    }

    async fn delete_message(&self, id: i64) -> Result<bool> {
        delete_by_id(&self.pool, "contact_messages", id)
            .await
            .context("Failed to delete contact message")
    }

    async fn subscribe(&self, email: &str) -> Result<bool> {
        let now = Utc::now();
        let inserted = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(
                "INSERT OR IGNORE INTO newsletter_subscribers (email, created_at) VALUES (?, ?)",
            )
            .bind(email)
            .bind(now)
            .execute(self.pool.sqlite()?)
            .await
            .context("Failed to subscribe to newsletter")?
            .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(
                "INSERT IGNORE INTO newsletter_subscribers (email, created_at) VALUES (?, ?)",
            )
            .bind(email)
            .bind(now)
            .execute(self.pool.mysql()?)
            .await
            .context("Failed to subscribe to newsletter")?
            .rows_affected(),
        };
        Ok(inserted > 0)
    }
}
