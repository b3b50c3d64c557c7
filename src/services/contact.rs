//! Contact form and newsletter service

use crate::db::repositories::ContactRepository;
use crate::models::{ContactMessage, CreateContactMessageInput};
use anyhow::Context;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ContactServiceError {
    #[error("Message not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct ContactService {
    repo: Arc<dyn ContactRepository>,
}

impl ContactService {
    pub fn new(repo: Arc<dyn ContactRepository>) -> Self {
        Self { repo }
    }

    /// Store a message from the public contact form
    pub async fn submit(
        &self,
        input: CreateContactMessageInput,
    ) -> Result<ContactMessage, ContactServiceError> {
        let input = CreateContactMessageInput {
            name: input.name.trim().to_string(),
            email: input.email.trim().to_string(),
            message: input.message.trim().to_string(),
            ..input
        };
        if input.name.is_empty() || input.message.is_empty() {
            return Err(ContactServiceError::ValidationError(
                "Name, email and message are required".to_string(),
            ));
        }
        check_email(&input.email)?;

        let message = self
            .repo
            .create_message(&input)
            .await
            .context("Failed to save contact message")?;
        tracing::info!(id = message.id, "contact message received");
        Ok(message)
    }

    /// Newest first
    pub async fn list(&self) -> Result<Vec<ContactMessage>, ContactServiceError> {
        Ok(self
            .repo
            .list_messages()
            .await
            .context("Failed to list contact messages")?)
    }

    pub async fn get(&self, id: i64) -> Result<ContactMessage, ContactServiceError> {
        self.repo
            .get_message(id)
            .await
            .context("Failed to get contact message")?
            .ok_or(ContactServiceError::NotFound(id))
    }

    pub async fn mark_read(&self, id: i64) -> Result<ContactMessage, ContactServiceError> {
        if !self
            .repo
            .mark_read(id)
            .await
            .context("Failed to mark message read")?
        {
            return Err(ContactServiceError::NotFound(id));
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ContactServiceError> {
        if !self
            .repo
            .delete_message(id)
            .await
            .context("Failed to delete contact message")?
        {
            return Err(ContactServiceError::NotFound(id));
        }
        Ok(())
    }

    /// Add an email to the newsletter; returns false if it was already there
    pub async fn subscribe(&self, email: &str) -> Result<bool, ContactServiceError> {
        let email = email.trim().to_lowercase();
        check_email(&email)?;
        let added = self
            .repo
            .subscribe(&email)
            .await
            .context("Failed to subscribe")?;
        if added {
            tracing::info!("newsletter subscription added");
        }
        Ok(added)
    }
}

fn check_email(email: &str) -> Result<(), ContactServiceError> {
    if !email.contains('@') {
        return Err(ContactServiceError::ValidationError(
            "A valid email is required".to_string(),
        ));
    }
    Ok(())
}
