use crate::api::error::ApiError;
use crate::api::types::{Credentials, ListingFilters, NewCategory};
use crate::form::ListingSubmission;
use crate::models::{BusinessHours, Category, DashboardStats, Listing, Page};
use crate::session::Session;
use async_trait::async_trait;

/// Listing endpoints
#[async_trait]
pub trait ListingApi: Send + Sync {
    async fn list_listings(&self, filters: &ListingFilters, page: u32) -> Result<Page<Listing>, ApiError>;

    async fn get_listing(&self, id: &str) -> Result<Listing, ApiError>;

    async fn create_listing(&self, submission: ListingSubmission) -> Result<Listing, ApiError>;

    async fn update_listing(&self, id: &str, submission: ListingSubmission) -> Result<Listing, ApiError>;

    async fn delete_listing(&self, id: &str) -> Result<(), ApiError>;

    async fn listing_hours(&self, id: &str) -> Result<BusinessHours, ApiError>;
}

/// Category endpoints
#[async_trait]
pub trait CategoryApi: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError>;

    async fn create_category(&self, category: &NewCategory) -> Result<Category, ApiError>;

    async fn update_category(&self, id: &str, category: &NewCategory) -> Result<Category, ApiError>;

    /// Fails with `ReferentialConstraint` while listings still use the category
    async fn delete_category(&self, id: &str) -> Result<(), ApiError>;
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a session; the caller decides where it lives
    async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError>;
}

#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn stats(&self) -> Result<DashboardStats, ApiError>;
}
