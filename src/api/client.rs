use crate::api::error::{ApiError, RequestKind};
use crate::api::traits::{AdminApi, AuthApi, CategoryApi, ListingApi};
use crate::api::types::{Credentials, ListingFilters, NewCategory};
use crate::config::Config;
use crate::form::ListingSubmission;
use crate::models::{hours, BusinessHours, Category, DashboardStats, Listing, Page};
use crate::session::{Session, SessionContext};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// REST client for the directory backend
pub struct HttpDirectoryClient {
    client: Client,
    base_url: String,
    session: Arc<SessionContext>,
}

impl HttpDirectoryClient {
    /// Create a client for the configured backend, authenticating requests
    /// with whatever session `session` holds at the time they are sent
    pub fn new(config: &Config, session: Arc<SessionContext>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!("{} {}", method, url);
        let builder = self.client.request(method, url);
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_raw(&self, kind: RequestKind, builder: RequestBuilder) -> Result<String, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Backend returned status: {}", status);
            return Err(ApiError::from_response(kind, status, &body));
        }
        Ok(body)
    }

    async fn send_json<T>(&self, kind: RequestKind, builder: RequestBuilder, envelope: &[&str]) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let body = self.send_raw(kind, builder).await?;
        let value: Value = serde_json::from_str(&body)?;
        from_envelope(value, envelope)
    }
}

/// Responses sometimes wrap the payload, e.g. `{"listing": {...}}`
fn from_envelope<T>(value: Value, keys: &[&str]) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    let direct_err = match serde_json::from_value::<T>(value.clone()) {
        Ok(parsed) => return Ok(parsed),
        Err(e) => e,
    };
    for key in keys {
        if let Some(inner) = value.get(*key) {
            if let Ok(parsed) = serde_json::from_value::<T>(inner.clone()) {
                return Ok(parsed);
            }
        }
    }
    Err(ApiError::Decode(direct_err))
}

/// Hours come bare or under `hours`/`businessHours`
fn hours_from_body(value: &Value) -> BusinessHours {
    let days = ["hours", "businessHours"]
        .iter()
        .find_map(|key| value.get(*key))
        .unwrap_or(value);
    hours::from_value(days)
}

/// Login answers either `{token, role, name}` or `{token, user: {role, name}}`
fn session_from_login(value: Value) -> Result<Session, ApiError> {
    if let (Some(token), Some(Value::Object(user))) = (value.get("token").cloned(), value.get("user")) {
        let mut merged = user.clone();
        merged.insert("token".to_string(), token);
        return Ok(serde_json::from_value(Value::Object(merged))?);
    }
    Ok(serde_json::from_value(value)?)
}

/// Multipart body for a listing create/update
pub fn submission_form(submission: ListingSubmission) -> Result<Form, ApiError> {
    let mut form = Form::new();
    for (name, value) in submission.text_fields()? {
        form = form.text(name, value);
    }

    for attachment in submission.attachments {
        let part = match Part::bytes(attachment.bytes.clone())
            .file_name(attachment.file_name.clone())
            .mime_str(&attachment.mime)
        {
            Ok(part) => part,
            Err(e) => {
                warn!("Sending {} without a content type: {}", attachment.file_name, e);
                Part::bytes(attachment.bytes).file_name(attachment.file_name)
            }
        };
        form = form.part("images", part);
    }
    Ok(form)
}

#[async_trait]
impl ListingApi for HttpDirectoryClient {
    async fn list_listings(&self, filters: &ListingFilters, page: u32) -> Result<Page<Listing>, ApiError> {
        let builder = self.request(Method::GET, "listings").query(&filters.to_query(page));
        let body = self.send_raw(RequestKind::Read, builder).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_listing(&self, id: &str) -> Result<Listing, ApiError> {
        let builder = self.request(Method::GET, &format!("listings/{}", id));
        self.send_json(RequestKind::Read, builder, &["listing", "data"]).await
    }

    async fn create_listing(&self, submission: ListingSubmission) -> Result<Listing, ApiError> {
        let builder = self
            .request(Method::POST, "listings")
            .multipart(submission_form(submission)?);
        self.send_json(RequestKind::Write, builder, &["listing", "data"]).await
    }

    async fn update_listing(&self, id: &str, submission: ListingSubmission) -> Result<Listing, ApiError> {
        let builder = self
            .request(Method::PUT, &format!("listings/{}", id))
            .multipart(submission_form(submission)?);
        self.send_json(RequestKind::Write, builder, &["listing", "data"]).await
    }

    async fn delete_listing(&self, id: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &format!("listings/{}", id));
        self.send_raw(RequestKind::Delete, builder).await.map(|_| ())
    }

    async fn listing_hours(&self, id: &str) -> Result<BusinessHours, ApiError> {
        let builder = self.request(Method::GET, &format!("listings/{}/hours", id));
        let body = self.send_raw(RequestKind::Read, builder).await?;
        Ok(hours_from_body(&serde_json::from_str(&body)?))
    }
}

#[async_trait]
impl CategoryApi for HttpDirectoryClient {
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let builder = self.request(Method::GET, "categories");
        let page: Page<Category> = self.send_json(RequestKind::Read, builder, &[]).await?;
        Ok(page.items)
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category, ApiError> {
        let builder = self.request(Method::POST, "categories").json(category);
        self.send_json(RequestKind::Write, builder, &["category", "data"]).await
    }

    async fn update_category(&self, id: &str, category: &NewCategory) -> Result<Category, ApiError> {
        let builder = self
            .request(Method::PUT, &format!("categories/{}", id))
            .json(category);
        self.send_json(RequestKind::Write, builder, &["category", "data"]).await
    }

    async fn delete_category(&self, id: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &format!("categories/{}", id));
        self.send_raw(RequestKind::Delete, builder).await.map(|_| ())
    }
}

#[async_trait]
impl AuthApi for HttpDirectoryClient {
    async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        let builder = self.request(Method::POST, "auth/login").json(credentials);
        let body = self.send_raw(RequestKind::Write, builder).await?;
        session_from_login(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl AdminApi for HttpDirectoryClient {
    async fn stats(&self) -> Result<DashboardStats, ApiError> {
        let builder = self.request(Method::GET, "admin/stats");
        self.send_json(RequestKind::Read, builder, &["stats", "data"]).await
    }
}
