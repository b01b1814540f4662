//! Database operations for the listing store

use std::collections::BTreeSet;

use chrono::Utc;
use libsql::{params, params_from_iter, Connection, Rows, Value};
use tracing::{debug, info, instrument};

use crate::config::DatabaseConfig;
use crate::crawler::Filter;
use crate::extract::{ExtractedListing, FieldValue};
use crate::store::error::DbError;
use crate::store::schema::{self, INSERT_PROPERTY_LISTING};
use crate::store::{RawPage, Table};

/// Database manager for the listing store
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create a new database manager, creating missing tables
    #[instrument(skip(conn))]
    pub async fn new(conn: Connection) -> Result<Self, DbError> {
        schema::initialize_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Open (or create) a local database file
    pub async fn new_from_path(path: &str) -> Result<Self, DbError> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DbError::Connection(format!("Failed to open database: {}", e)))?;

        let conn = db
            .connect()
            .map_err(|e| DbError::Connection(format!("Failed to connect to database: {}", e)))?;

        Self::new(conn).await
    }

    /// Connect to a remote libsql server
    pub async fn new_remote(url: &str, auth_token: &str) -> Result<Self, DbError> {
        let db = libsql::Builder::new_remote(url.to_string(), auth_token.to_string())
            .build()
            .await
            .map_err(|e| DbError::Connection(format!("Failed to open remote database: {}", e)))?;

        let conn = db
            .connect()
            .map_err(|e| DbError::Connection(format!("Failed to connect to {}: {}", url, e)))?;

        Self::new(conn).await
    }

    pub async fn from_config(config: &DatabaseConfig) -> Result<Self, DbError> {
        match config {
            DatabaseConfig::Local { path } => Self::new_from_path(path).await,
            DatabaseConfig::Remote { url, auth_token } => Self::new_remote(url, auth_token).await,
        }
    }

    /// Create missing tables; safe to run repeatedly
    pub async fn initialize_schema(&self) -> Result<(), DbError> {
        schema::initialize_schema(&self.conn).await
    }

    /// Execute a statement, returning the number of changed rows
    pub async fn execute<P>(&self, sql: &str, params: P) -> Result<u64, DbError>
    where
        P: libsql::params::IntoParams,
    {
        self.conn
            .execute(sql, params)
            .await
            .map_err(|e| DbError::Query(format!("Failed to execute statement: {}", e)))
    }

    /// Run a query with parameters
    pub async fn query<P>(&self, sql: &str, params: P) -> Result<Rows, DbError>
    where
        P: libsql::params::IntoParams,
    {
        self.conn
            .query(sql, params)
            .await
            .map_err(|e| DbError::Query(format!("Failed to execute query: {}", e)))
    }

    /// Record newly discovered listing URLs; returns how many were new
    #[instrument(skip(self, urls), fields(count = urls.len()))]
    pub async fn insert_listing_urls(&self, urls: &[String]) -> Result<u64, DbError> {
        let date = Utc::now().to_rfc3339();
        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to start transaction: {}", e)))?;

        let mut inserted = 0;
        for url in urls {
            inserted += tx
                .execute(
                    "INSERT INTO search_page_urls (date, url) VALUES (?, ?)
                     ON CONFLICT(url) DO NOTHING",
                    params![date.clone(), url.clone()],
                )
                .await
                .map_err(|e| DbError::Query(format!("Failed to insert URL {}: {}", url, e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        info!("Stored {} new of {} listing URLs", inserted, urls.len());
        Ok(inserted)
    }

    /// Store rendered listing pages; returns how many were new
    #[instrument(skip(self, pages), fields(count = pages.len()))]
    pub async fn insert_raw_pages(&self, pages: &[RawPage]) -> Result<u64, DbError> {
        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to start transaction: {}", e)))?;

        let mut inserted = 0;
        for page in pages {
            inserted += tx
                .execute(
                    "INSERT INTO raw_page_content (url, page_content) VALUES (?, ?)
                     ON CONFLICT(url) DO NOTHING",
                    params![page.url.clone(), page.content.clone()],
                )
                .await
                .map_err(|e| DbError::Query(format!("Failed to insert page {}: {}", page.url, e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        info!("Stored {} new of {} pages", inserted, pages.len());
        Ok(inserted)
    }

    /// Store an extracted listing in both listing tables at once.
    ///
    /// Returns `false` when the URL already had a listing, in which case
    /// nothing is written.
    pub async fn insert_listing(&self, extracted: &ExtractedListing) -> Result<bool, DbError> {
        let raw_data = serde_json::to_string(&extracted.raw)
            .map_err(|e| DbError::Data(format!("Failed to serialize listing: {}", e)))?;

        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to start transaction: {}", e)))?;

        let inserted = tx
            .execute(
                "INSERT INTO raw_property_listings (url, raw_data) VALUES (?, ?)
                 ON CONFLICT(url) DO NOTHING",
                params![extracted.url.clone(), raw_data],
            )
            .await
            .map_err(|e| DbError::Query(format!("Failed to insert raw listing: {}", e)))?;

        if inserted == 0 {
            tx.rollback()
                .await
                .map_err(|e| DbError::Transaction(format!("Failed to roll back: {}", e)))?;
            debug!("Listing for {} already stored", extracted.url);
            return Ok(false);
        }

        let values = std::iter::once(Value::Text(extracted.url.clone()))
            .chain(extracted.listing.values().into_iter().map(to_sql_value));

        tx.execute(INSERT_PROPERTY_LISTING.as_str(), params_from_iter(values))
            .await
            .map_err(|e| DbError::Query(format!("Failed to insert listing: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        Ok(true)
    }

    /// Every stored listing URL belonging to the filter
    pub async fn listing_urls(&self, filter: &Filter) -> Result<BTreeSet<String>, DbError> {
        let mut rows = self
            .query(
                "SELECT url FROM search_page_urls WHERE url LIKE ?",
                params![filter.like_pattern()],
            )
            .await?;

        let mut urls = BTreeSet::new();
        while let Some(row) = rows.next().await? {
            urls.insert(row.get::<String>(0)?);
        }
        Ok(urls)
    }

    /// Listing URLs of the filter whose page has not been stored yet
    pub async fn urls_without_page(&self, filter: &Filter) -> Result<Vec<String>, DbError> {
        let mut rows = self
            .query(
                "SELECT u.url FROM search_page_urls u
                 LEFT JOIN raw_page_content p ON p.url = u.url
                 WHERE p.url IS NULL AND u.url LIKE ?
                 ORDER BY u.url",
                params![filter.like_pattern()],
            )
            .await?;

        let mut urls = Vec::new();
        while let Some(row) = rows.next().await? {
            urls.push(row.get::<String>(0)?);
        }
        Ok(urls)
    }

    /// Stored pages of the filter that have no extracted listing yet
    pub async fn pages_without_listing(&self, filter: &Filter) -> Result<Vec<RawPage>, DbError> {
        let mut rows = self
            .query(
                "SELECT p.url, p.page_content FROM raw_page_content p
                 LEFT JOIN raw_property_listings r ON r.url = p.url
                 WHERE r.url IS NULL AND p.url LIKE ?
                 ORDER BY p.url",
                params![filter.like_pattern()],
            )
            .await?;

        let mut pages = Vec::new();
        while let Some(row) = rows.next().await? {
            pages.push(RawPage {
                url: row.get::<String>(0)?,
                content: row.get::<String>(1)?,
            });
        }
        Ok(pages)
    }

    pub async fn count_rows(&self, table: Table) -> Result<u64, DbError> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name());
        let mut rows = self.query(&sql, params![]).await?;

        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>(0)?.max(0) as u64),
            None => Err(DbError::Data(format!("No count returned for {}", table.name()))),
        }
    }
}

fn to_sql_value(value: FieldValue) -> Value {
    match value {
        FieldValue::Text(s) => Value::Text(s),
        FieldValue::Integer(i) => Value::Integer(i),
        FieldValue::Decimal(f) => Value::Real(f),
        FieldValue::Boolean(b) => Value::Integer(i64::from(b)),
        FieldValue::Null => Value::Null,
    }
}
