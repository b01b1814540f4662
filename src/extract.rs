//! # Listing Extraction Module
//!
//! This module turns a rendered listing page into a typed record: the page is
//! cut down to its attribute section, sent to a completion provider under a
//! fixed instruction, and the answer is repaired, parsed and coerced.
//!
//! ## Key Components
//!
//! - `slice_listing`: cuts the section between two site-specific markers
//! - `SchemaExtractor`: requests, parses and validates one listing, resubmitting
//!   on failure
//! - `StructuredListing`: the 45 nullable attributes stored per listing
//! - `coerce`: reads numbers, booleans and text out of free-form values
//!
//! A listing that fails every attempt yields `ExtractError::ExtractionFailed`
//! and nothing is stored for it.

pub mod coerce;
mod error;
mod extractor;
mod listing;
mod prompt;
mod response;
mod slicer;

pub use error::{ExtractError, ResponseError};
pub use extractor::{ExtractedListing, ExtractorConfig, ExtractorConfigBuilder, SchemaExtractor};
pub use listing::{FieldKind, FieldValue, StructuredListing, LISTING_FIELDS};
pub use prompt::default_instruction;
pub use response::{parse_response, repair_json, strip_code_fences};
pub use slicer::slice_listing;
