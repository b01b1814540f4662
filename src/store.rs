//! Listing store over libsql
//!
//! Holds discovered URLs, rendered pages and extracted listings. Every table
//! is unique on the listing URL and only ever appended to, so each pipeline
//! stage can find its remaining work by asking what is missing.

mod database;
pub mod error;
mod schema;

pub use database::Database;
pub use error::DbError;
pub use schema::initialize_schema;

/// A rendered listing page as stored in `raw_page_content`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub url: String,
    pub content: String,
}

impl RawPage {
    pub fn new(url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content: content.into(),
        }
    }
}

/// The store's tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    ListingUrls,
    RawPages,
    RawListings,
    Listings,
}

impl Table {
    pub const ALL: [Table; 4] = [
        Table::ListingUrls,
        Table::RawPages,
        Table::RawListings,
        Table::Listings,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::ListingUrls => "search_page_urls",
            Table::RawPages => "raw_page_content",
            Table::RawListings => "raw_property_listings",
            Table::Listings => "property_listings",
        }
    }
}
