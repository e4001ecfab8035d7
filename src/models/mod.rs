pub mod hours;

use crate::normalize::{self, attributes::Attributes};
use serde::{Deserialize, Deserializer, Serialize};

pub use hours::{BusinessHours, OpeningHours, Weekday};

/// Taxonomy node that listings reference
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub icon: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// A listing's category, either as a bare id or populated by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CategoryRef {
    Id(String),
    Populated(Category),
}

impl CategoryRef {
    pub fn id(&self) -> &str {
        match self {
            CategoryRef::Id(id) => id,
            CategoryRef::Populated(category) => &category.id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            CategoryRef::Id(_) => None,
            CategoryRef::Populated(category) => Some(&category.name),
        }
    }
}

/// Listing owner as shown on the listing page
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_featured: bool,
}

/// Core listing data model, normalized at load time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub category: Option<CategoryRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: f64,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub area: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
    #[serde(default, deserialize_with = "labels_from_backend")]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default, alias = "businessHours", deserialize_with = "hours::lenient")]
    pub hours: BusinessHours,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub website: String,
    #[serde(default)]
    pub owner: Option<Owner>,
    #[serde(default, deserialize_with = "labels_from_backend")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_featured: bool,
}

/// Explicit `null` reads the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn labels_from_backend<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.map(|value| normalize::split_stored_labels(&value)).unwrap_or_default())
}

/// One page of results
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub total_pages: u32,
    pub total: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageBody<T> {
    Bare(Vec<T>),
    #[serde(rename_all = "camelCase")]
    Envelope {
        #[serde(alias = "listings", alias = "data", alias = "categories")]
        items: Vec<T>,
        #[serde(default)]
        page: Option<u32>,
        #[serde(default, alias = "totalPages")]
        pages: Option<u32>,
        #[serde(default)]
        total: Option<u64>,
    },
}

impl<'de, T> Deserialize<'de> for Page<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match PageBody::<T>::deserialize(deserializer)? {
            PageBody::Bare(items) => Page {
                total: items.len() as u64,
                items,
                page: 1,
                total_pages: 1,
            },
            PageBody::Envelope {
                items,
                page,
                pages,
                total,
            } => {
                let page = page.unwrap_or(1);
                Page {
                    total: total.unwrap_or(items.len() as u64),
                    items,
                    page,
                    total_pages: pages.unwrap_or(page),
                }
            }
        })
    }
}

/// Admin dashboard counters
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub total_listings: u64,
    pub total_categories: u64,
    pub featured_listings: u64,
    pub total_users: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_is_normalized_on_load() {
        let raw = r#"{
            "_id": "l1",
            "name": "Harbour Hotel",
            "category": {"_id": "c1", "name": "Hotels", "slug": "hotels"},
            "price": 120,
            "amenities": ["[\"WiFi\",\"Pool\"]", "  Parking "],
            "attributes": {"0": "S", "1": "e", "2": "a"},
            "tags": ["'family'"],
            "hours": {"Monday": {"open": "09:00", "close": "17:00"}},
            "isFeatured": true
        }"#;

        let listing: Listing = serde_json::from_str(raw).unwrap();
        assert_eq!(listing.amenities, vec!["WiFi", "Pool", "Parking"]);
        assert_eq!(listing.attributes.as_str(), "Sea");
        assert_eq!(listing.tags, vec!["family"]);
        assert_eq!(listing.category.as_ref().unwrap().name(), Some("Hotels"));
        assert!(listing.hours.contains_key(&Weekday::Monday));
        assert!(listing.is_featured);
    }

    #[test]
    fn test_listing_with_bare_category_and_missing_fields() {
        let raw = r#"{"_id": "l2", "name": "Corner Cafe", "category": "c9", "amenities": null}"#;

        let listing: Listing = serde_json::from_str(raw).unwrap();
        assert_eq!(listing.category.unwrap().id(), "c9");
        assert!(listing.amenities.is_empty());
        assert_eq!(listing.attributes.as_str(), "");
        assert!(listing.hours.is_empty());
    }

    #[test]
    fn test_page_decodes_envelope_and_bare_array() {
        let envelope = r#"{"listings": [{"_id": "a", "name": "A"}], "page": 1, "totalPages": 3, "total": 30}"#;
        let page: Page<Listing> = serde_json::from_str(envelope).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total_pages, 3);

        let bare = r#"[{"_id": "a", "name": "A"}, {"_id": "b", "name": "B"}]"#;
        let page: Page<Listing> = serde_json::from_str(bare).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!((page.page, page.total_pages), (1, 1));
    }

    #[test]
    fn test_null_fields_read_as_empty() {
        let raw = r#"{
            "_id": "l3",
            "name": "Night Market",
            "website": null,
            "city": null,
            "price": null,
            "images": null,
            "owner": {"name": "Ana", "phone": null}
        }"#;

        let listing: Listing = serde_json::from_str(raw).unwrap();
        assert_eq!(listing.website, "");
        assert_eq!(listing.city, "");
        assert_eq!(listing.price, 0.0);
        assert!(listing.images.is_empty());
        assert_eq!(listing.owner.unwrap().phone, "");

        let category: Category = serde_json::from_str(r#"{"_id": "c2", "name": "Bars", "icon": null}"#).unwrap();
        assert_eq!(category.icon, "");
    }

    #[test]
    fn test_incomplete_hours_do_not_break_the_listing() {
        let raw = r#"{
            "_id": "l4",
            "name": "Bakery",
            "hours": {
                "monday": {"open": "07:00"},
                "tuesday": {"open": "07:00", "close": "15:00"},
                "holiday": {"open": "10:00", "close": "12:00"}
            }
        }"#;

        let listing: Listing = serde_json::from_str(raw).unwrap();
        let days: Vec<_> = listing.hours.keys().copied().collect();
        assert_eq!(days, vec![Weekday::Tuesday]);

        let page: Page<Listing> =
            serde_json::from_str(r#"{"listings": [{"_id": "l5", "name": "Kiosk", "hours": {"friday": {}}}]}"#).unwrap();
        assert!(page.items[0].hours.is_empty());
    }

    #[test]
    fn test_category_defaults_to_active() {
        let category: Category = serde_json::from_str(r#"{"_id": "c1", "name": "Food"}"#).unwrap();
        assert!(category.active);
        assert!(category.slug.is_empty());
    }
}
