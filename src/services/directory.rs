//! Directory service: FAQs, agencies and locations

use crate::db::repositories::{AgencyRepository, FaqRepository, LocationRepository};
use crate::models::{
    Agency, CreateAgencyInput, CreateFaqInput, CreateLocationInput, Faq, Location,
    UpdateAgencyInput, UpdateFaqInput, UpdateLocationInput,
};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Country given to locations created without one
pub const DEFAULT_COUNTRY: &str = "India";

#[derive(Debug, thiserror::Error)]
pub enum DirectoryServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct DirectoryService {
    faqs: Arc<dyn FaqRepository>,
    agencies: Arc<dyn AgencyRepository>,
    locations: Arc<dyn LocationRepository>,
}

impl DirectoryService {
    pub fn new(
        faqs: Arc<dyn FaqRepository>,
        agencies: Arc<dyn AgencyRepository>,
        locations: Arc<dyn LocationRepository>,
    ) -> Self {
        Self {
            faqs,
            agencies,
            locations,
        }
    }

    // ------------------------------------------------------------------
    // FAQs
    // ------------------------------------------------------------------

    /// Active FAQs by sort order, optionally one category
    pub async fn list_active_faqs(&self, category: Option<&str>) -> Result<Vec<Faq>, DirectoryServiceError> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        Ok(self
            .faqs
            .list(category, true)
            .await
            .context("Failed to list FAQs")?)
    }

    pub async fn list_faqs(&self) -> Result<Vec<Faq>, DirectoryServiceError> {
        Ok(self.faqs.list(None, false).await.context("Failed to list FAQs")?)
    }

    pub async fn get_faq(&self, id: i64) -> Result<Faq, DirectoryServiceError> {
        self.faqs
            .get_by_id(id)
            .await
            .context("Failed to get FAQ")?
            .ok_or_else(|| DirectoryServiceError::NotFound(format!("FAQ #{}", id)))
    }

    pub async fn create_faq(&self, input: CreateFaqInput) -> Result<Faq, DirectoryServiceError> {
        let faq = Faq {
            id: 0,
            question: required(&input.question, "Question")?,
            answer: required(&input.answer, "Answer")?,
            category: required(&input.category, "Category")?,
            sort_order: input.sort_order.unwrap_or(0),
            is_active: input.is_active.unwrap_or(true),
        };
        Ok(self.faqs.create(&faq).await.context("Failed to create FAQ")?)
    }

    pub async fn update_faq(&self, id: i64, input: UpdateFaqInput) -> Result<Faq, DirectoryServiceError> {
        let mut faq = self.get_faq(id).await?;
        if let Some(question) = input.question {
            faq.question = required(&question, "Question")?;
        }
        if let Some(answer) = input.answer {
            faq.answer = required(&answer, "Answer")?;
        }
        if let Some(category) = input.category {
            faq.category = required(&category, "Category")?;
        }
        if let Some(sort_order) = input.sort_order {
            faq.sort_order = sort_order;
        }
        if let Some(is_active) = input.is_active {
            faq.is_active = is_active;
        }
        Ok(self.faqs.update(&faq).await.context("Failed to update FAQ")?)
    }

    pub async fn delete_faq(&self, id: i64) -> Result<(), DirectoryServiceError> {
        if !self.faqs.delete(id).await.context("Failed to delete FAQ")? {
            return Err(DirectoryServiceError::NotFound(format!("FAQ #{}", id)));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Agencies
    // ------------------------------------------------------------------

    /// Agencies, newest first
    pub async fn list_agencies(&self) -> Result<Vec<Agency>, DirectoryServiceError> {
        Ok(self.agencies.list().await.context("Failed to list agencies")?)
    }

    pub async fn get_agency(&self, id: i64) -> Result<Agency, DirectoryServiceError> {
        self.agencies
            .get_by_id(id)
            .await
            .context("Failed to get agency")?
            .ok_or_else(|| DirectoryServiceError::NotFound(format!("agency #{}", id)))
    }

    pub async fn create_agency(&self, input: CreateAgencyInput) -> Result<Agency, DirectoryServiceError> {
        let agency = Agency {
            id: 0,
            name: required(&input.name, "Name")?,
            description: input.description,
            logo: input.logo,
            phone: input.phone,
            email: input.email,
            website: input.website,
            property_count: non_negative(input.property_count)?,
            created_at: Utc::now(),
        };
        Ok(self
            .agencies
            .create(&agency)
            .await
            .context("Failed to create agency")?)
    }

    pub async fn update_agency(&self, id: i64, input: UpdateAgencyInput) -> Result<Agency, DirectoryServiceError> {
        let mut agency = self.get_agency(id).await?;
        if let Some(name) = input.name {
            agency.name = required(&name, "Name")?;
        }
        if let Some(description) = input.description {
            agency.description = description;
        }
        if let Some(logo) = input.logo {
            agency.logo = logo;
        }
        if let Some(phone) = input.phone {
            agency.phone = phone;
        }
        if let Some(email) = input.email {
            agency.email = email;
        }
        if let Some(website) = input.website {
            agency.website = website;
        }
        if input.property_count.is_some() {
            agency.property_count = non_negative(input.property_count)?;
        }
        Ok(self
            .agencies
            .update(&agency)
            .await
            .context("Failed to update agency")?)
    }

    pub async fn delete_agency(&self, id: i64) -> Result<(), DirectoryServiceError> {
        if !self.agencies.delete(id).await.context("Failed to delete agency")? {
            return Err(DirectoryServiceError::NotFound(format!("agency #{}", id)));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Locations
    // ------------------------------------------------------------------

    /// Locations by name
    pub async fn list_locations(&self) -> Result<Vec<Location>, DirectoryServiceError> {
        Ok(self.locations.list().await.context("Failed to list locations")?)
    }

    pub async fn get_location(&self, id: i64) -> Result<Location, DirectoryServiceError> {
        self.locations
            .get_by_id(id)
            .await
            .context("Failed to get location")?
            .ok_or_else(|| DirectoryServiceError::NotFound(format!("location #{}", id)))
    }

    pub async fn create_location(&self, input: CreateLocationInput) -> Result<Location, DirectoryServiceError> {
        let location = Location {
            id: 0,
            name: required(&input.name, "Name")?,
            country: input
                .country
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            city: input.city,
            area: input.area,
            property_count: non_negative(input.property_count)?,
        };
        Ok(self
            .locations
            .create(&location)
            .await
            .context("Failed to create location")?)
    }

    pub async fn update_location(
        &self,
        id: i64,
        input: UpdateLocationInput,
    ) -> Result<Location, DirectoryServiceError> {
        let mut location = self.get_location(id).await?;
        if let Some(name) = input.name {
            location.name = required(&name, "Name")?;
        }
        if let Some(country) = input.country {
            location.country = required(&country, "Country")?;
        }
        if let Some(city) = input.city {
            location.city = city;
        }
        if let Some(area) = input.area {
            location.area = area;
        }
        if input.property_count.is_some() {
            location.property_count = non_negative(input.property_count)?;
        }
        Ok(self
            .locations
            .update(&location)
            .await
            .context("Failed to update location")?)
    }

    pub async fn delete_location(&self, id: i64) -> Result<(), DirectoryServiceError> {
        if !self.locations.delete(id).await.context("Failed to delete location")? {
            return Err(DirectoryServiceError::NotFound(format!("location #{}", id)));
        }
        Ok(())
    }
}

fn required(value: &str, field: &str) -> Result<String, DirectoryServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DirectoryServiceError::ValidationError(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

fn non_negative(count: Option<i32>) -> Result<i32, DirectoryServiceError> {
    match count {
        Some(n) if n < 0 => Err(DirectoryServiceError::ValidationError(
            "Property count cannot be negative".to_string(),
        )),
        Some(n) => Ok(n),
        None => Ok(0),
    }
}
