use serde::{Deserialize, Serialize};

/// Filters for the listings query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingFilters {
    /// Category id
    pub category: Option<String>,
    /// Free-text search
    pub search: Option<String>,
    pub city: Option<String>,
    /// Only featured listings
    pub featured: bool,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Listings per page
    pub limit: u32,
}

impl Default for ListingFilters {
    fn default() -> Self {
        Self {
            category: None,
            search: None,
            city: None,
            featured: false,
            min_price: None,
            max_price: None,
            limit: 12,
        }
    }
}

impl ListingFilters {
    /// Query string pairs for one page
    pub fn to_query(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut query = vec![("page", page.to_string()), ("limit", self.limit.to_string())];
        if let Some(category) = &self.category {
            query.push(("category", category.clone()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query.push(("search", search.to_string()));
        }
        if let Some(city) = &self.city {
            query.push(("city", city.clone()));
        }
        if self.featured {
            query.push(("isFeatured", "true".to_string()));
        }
        if let Some(min) = self.min_price {
            query.push(("minPrice", min.to_string()));
        }
        if let Some(max) = self.max_price {
            query.push(("maxPrice", max.to_string()));
        }
        query
    }
}

/// Body for creating or updating a category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default = "active_by_default")]
    pub active: bool,
}

fn active_by_default() -> bool {
    true
}

impl NewCategory {
    /// Category with a slug derived from its name
    pub fn named(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            slug: slugify(name),
            description: String::new(),
            icon: String::new(),
            active: true,
        }
    }
}

/// Lowercase, ASCII alphanumerics separated by single dashes
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Login form
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query_only_has_paging() {
        let query = ListingFilters::default().to_query(2);
        assert_eq!(query, vec![("page", "2".to_string()), ("limit", "12".to_string())]);
    }

    #[test]
    fn test_query_includes_set_filters() {
        let filters = ListingFilters {
            category: Some("c1".to_string()),
            search: Some("  ".to_string()),
            featured: true,
            max_price: Some(250.0),
            ..Default::default()
        };

        let query = filters.to_query(1);
        assert!(query.contains(&("category", "c1".to_string())));
        assert!(query.contains(&("isFeatured", "true".to_string())));
        assert!(query.contains(&("maxPrice", "250".to_string())));
        assert!(!query.iter().any(|(key, _)| *key == "search"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hotels & Resorts"), "hotels-resorts");
        assert_eq!(slugify("  Coffee Shops "), "coffee-shops");
        assert_eq!(NewCategory::named("Car Rental").slug, "car-rental");
    }
}
