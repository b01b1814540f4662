//! # Store Schema
//!
//! Four tables, each keyed by listing URL:
//! 1. `search_page_urls` - every listing URL discovered, with its discovery time
//! 2. `raw_page_content` - the rendered text of a listing page
//! 3. `raw_property_listings` - the parsed model response as JSON
//! 4. `property_listings` - the typed attributes, one column per attribute
//!
//! Rows are only ever inserted. The dashboard reads `property_listings`.

use std::sync::LazyLock;

use libsql::{params, Connection};
use tracing::debug;

use crate::extract::LISTING_FIELDS;
use crate::store::error::DbError;

const SEARCH_PAGE_URLS: &str = "CREATE TABLE IF NOT EXISTS search_page_urls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    url TEXT NOT NULL UNIQUE
)";

const RAW_PAGE_CONTENT: &str = "CREATE TABLE IF NOT EXISTS raw_page_content (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE REFERENCES search_page_urls(url),
    page_content TEXT NOT NULL
)";

const RAW_PROPERTY_LISTINGS: &str = "CREATE TABLE IF NOT EXISTS raw_property_listings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE REFERENCES search_page_urls(url),
    raw_data TEXT NOT NULL
)";

/// `property_listings` DDL, one column per listing attribute
pub static PROPERTY_LISTINGS: LazyLock<String> = LazyLock::new(|| {
    let columns: Vec<String> = LISTING_FIELDS
        .iter()
        .map(|(name, kind)| format!("    {} {}", name, kind.sql_type()))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS property_listings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE REFERENCES search_page_urls(url),
{}
)",
        columns.join(",\n")
    )
});

/// Insert statement for `property_listings`, parameters in `LISTING_FIELDS` order after the URL
pub static INSERT_PROPERTY_LISTING: LazyLock<String> = LazyLock::new(|| {
    let names: Vec<&str> = LISTING_FIELDS.iter().map(|(name, _)| *name).collect();
    let placeholders = vec!["?"; names.len() + 1].join(", ");
    format!(
        "INSERT INTO property_listings (url, {}) VALUES ({}) ON CONFLICT(url) DO NOTHING",
        names.join(", "),
        placeholders
    )
});

/// Create every table that does not exist yet
pub async fn initialize_schema(conn: &Connection) -> Result<(), DbError> {
    let tables: [(&str, &str); 4] = [
        ("search_page_urls", SEARCH_PAGE_URLS),
        ("raw_page_content", RAW_PAGE_CONTENT),
        ("raw_property_listings", RAW_PROPERTY_LISTINGS),
        ("property_listings", PROPERTY_LISTINGS.as_str()),
    ];

    for (name, ddl) in tables {
        conn.execute(ddl, params![])
            .await
            .map_err(|e| DbError::Schema(format!("Failed to create {} table: {}", name, e)))?;
        debug!("Ensured table {}", name);
    }

    Ok(())
}
