//! Turns a listing draft into the multipart submission the backend expects.
//!
//! Images that are already hosted go back as a JSON list of URLs; new images
//! become file attachments. One unreadable image is skipped, the rest of the
//! submission goes through.

use crate::api::error::ApiError;
use crate::api::traits::ListingApi;
use crate::form::{parse_time, DayDraft, ImageSource, ListingDraft};
use crate::models::{BusinessHours, Listing, OpeningHours, Owner, Weekday};
use crate::normalize::{
    attributes::{self, Attributes},
    normalize_labels,
};
use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// A new image to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Everything sent for one create or update
#[derive(Debug, Clone, PartialEq)]
pub struct ListingSubmission {
    pub name: String,
    pub category: String,
    pub price: f64,
    pub rating: Option<f64>,
    pub description: String,
    pub location: String,
    pub country: String,
    pub state: String,
    pub city: String,
    pub area: String,
    pub amenities: Vec<String>,
    pub attributes: Attributes,
    pub tags: Vec<String>,
    pub hours: BusinessHours,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub owner: Owner,
    pub is_featured: bool,
    pub existing_images: Vec<String>,
    pub attachments: Vec<Attachment>,
    /// Images that could not be turned into attachments
    pub skipped_images: Vec<String>,
}

impl ListingSubmission {
    /// Text fields of the multipart body, in send order
    pub fn text_fields(&self) -> Result<Vec<(&'static str, String)>, serde_json::Error> {
        let mut fields = vec![
            ("name", self.name.clone()),
            ("category", self.category.clone()),
            ("price", self.price.to_string()),
            ("description", self.description.clone()),
            ("location", self.location.clone()),
            ("country", self.country.clone()),
            ("state", self.state.clone()),
            ("city", self.city.clone()),
            ("area", self.area.clone()),
            ("amenities", serde_json::to_string(&self.amenities)?),
            ("attributes", self.attributes.as_str().to_string()),
            ("tags", serde_json::to_string(&self.tags)?),
            ("hours", serde_json::to_string(&self.hours)?),
            ("phone", self.phone.clone()),
            ("email", self.email.clone()),
            ("website", self.website.clone()),
            ("owner", serde_json::to_string(&self.owner)?),
            ("isFeatured", self.is_featured.to_string()),
            ("existingImages", serde_json::to_string(&self.existing_images)?),
        ];
        if let Some(rating) = self.rating {
            fields.push(("rating", rating.to_string()));
        }
        Ok(fields)
    }
}

/// Build the submission for a draft. Never fails; bad images are skipped.
pub async fn assemble(draft: &ListingDraft) -> ListingSubmission {
    let mut existing_images = Vec::new();
    let mut attachments = Vec::new();
    let mut skipped_images = Vec::new();

    for (index, image) in draft.images.iter().enumerate() {
        match image {
            ImageSource::Hosted(url) => existing_images.push(url.clone()),
            other => match load_attachment(index, other).await {
                Ok(attachment) => attachments.push(attachment),
                Err(e) => {
                    warn!("Skipping image {}: {:#}", index + 1, e);
                    skipped_images.push(String::from(other.clone()));
                }
            },
        }
    }

    ListingSubmission {
        name: draft.name.trim().to_string(),
        category: draft.category.clone(),
        price: draft.price,
        rating: draft.rating,
        description: draft.description.clone(),
        location: compose_location(&draft.city, &draft.area, &draft.state, &draft.country),
        country: draft.country.clone(),
        state: draft.state.clone(),
        city: draft.city.clone(),
        area: draft.area.clone(),
        amenities: normalize_labels(&draft.amenities),
        attributes: attributes::encode(&draft.attributes),
        tags: normalize_labels(&draft.tags),
        hours: opening_hours(&draft.hours),
        phone: draft.phone.clone(),
        email: draft.email.clone(),
        website: draft.website.clone(),
        owner: draft.owner.clone(),
        is_featured: draft.is_featured,
        existing_images,
        attachments,
        skipped_images,
    }
}

/// Validate, assemble and send a draft. With `existing_id` the listing is
/// updated in place, otherwise created.
pub async fn submit_draft<A>(api: &A, draft: &ListingDraft, existing_id: Option<&str>) -> Result<Listing, ApiError>
where
    A: ListingApi + ?Sized,
{
    let errors = draft.validate();
    if !errors.is_empty() {
        let fields: BTreeMap<String, String> = errors
            .into_iter()
            .map(|error| (error.field, error.message))
            .collect();
        return Err(ApiError::invalid(fields));
    }

    let submission = assemble(draft).await;
    if !submission.skipped_images.is_empty() {
        warn!("{} image(s) will not be uploaded", submission.skipped_images.len());
    }

    let listing = match existing_id {
        Some(id) => api.update_listing(id, submission).await?,
        None => api.create_listing(submission).await?,
    };
    info!("Saved listing {} ({})", listing.name, listing.id);
    Ok(listing)
}

/// City, area, state and country joined with ", ", skipping blanks
pub fn compose_location(city: &str, area: &str, state: &str, country: &str) -> String {
    [city, area, state, country]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Days with both an opening and a closing time, as `HH:mm`
pub fn opening_hours(days: &BTreeMap<Weekday, DayDraft>) -> BusinessHours {
    days.iter()
        .filter_map(|(day, draft)| {
            let open = parse_time(draft.open.as_deref()?)?;
            let close = parse_time(draft.close.as_deref()?)?;
            Some((
                *day,
                OpeningHours {
                    open: open.format("%H:%M").to_string(),
                    close: close.format("%H:%M").to_string(),
                },
            ))
        })
        .collect()
}

async fn load_attachment(index: usize, image: &ImageSource) -> Result<Attachment> {
    match image {
        ImageSource::Local(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("image-{}", index + 1));
            Ok(Attachment {
                mime: mime_for_path(path).to_string(),
                file_name,
                bytes,
            })
        }
        ImageSource::Inline(data) => decode_data_url(index, data),
        ImageSource::Hosted(url) => Err(anyhow!("{} is already hosted", url)),
    }
}

fn decode_data_url(index: usize, data: &str) -> Result<Attachment> {
    let rest = data
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| anyhow!("not a data URL"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| anyhow!("data URL has no payload"))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| anyhow!("only base64 data URLs are supported"))?;
    let mime = if mime.is_empty() { "application/octet-stream" } else { mime };

    let bytes = STANDARD
        .decode(payload.trim())
        .context("Invalid base64 image data")?;
    if bytes.is_empty() {
        anyhow::bail!("image data is empty");
    }

    Ok(Attachment {
        file_name: format!("image-{}.{}", index + 1, extension_for_mime(mime)),
        mime: mime.to_string(),
        bytes,
    })
}

fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}
