pub mod client;
pub mod error;
pub mod feed;
pub mod generation;
pub mod traits;
pub mod types;

pub use client::HttpDirectoryClient;
pub use error::ApiError;
pub use feed::{FeedOutcome, ListingFeed};
pub use traits::{AdminApi, AuthApi, CategoryApi, ListingApi};
pub use types::{Credentials, ListingFilters, NewCategory};
