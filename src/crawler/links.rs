//! Link and pagination parsing for rendered search results pages

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::PaginationMarkers;
use crate::crawler::error::CrawlError;
use crate::crawler::Filter;

/// Anything between parentheses; Markdown link targets are a subset
static PAREN_TARGET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((.*?)\)").expect("link pattern is valid"));

/// Extract listing URLs for a filter from a rendered search page
///
/// Every parenthesized substring is a candidate; it is kept when it contains
/// both `{home_type}/{area}` and `https`. Duplicates collapse.
pub fn extract_links(page: &str, filter: &Filter) -> BTreeSet<String> {
    let flattened = page.replace('\n', "");
    let segment = filter.path_segment();

    PAREN_TARGET
        .captures_iter(&flattened)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|target| target.contains(&segment) && target.contains("https"))
        .map(str::to_string)
        .collect()
}

/// Highest page number advertised by the pagination control
///
/// Looks at the text between the "previous" and the following "next" label and
/// returns the largest integer token in it.
pub fn get_max_page(page: &str, markers: &PaginationMarkers) -> Result<u32, CrawlError> {
    let not_found = || CrawlError::NoPaginationFound {
        previous: markers.previous.clone(),
        next: markers.next.clone(),
    };

    let start = page.find(&markers.previous).ok_or_else(not_found)?;
    let span_start = start + markers.previous.len();
    let span_len = page[span_start..].find(&markers.next).ok_or_else(not_found)?;

    page[span_start..span_start + span_len]
        .split_whitespace()
        .filter_map(page_number)
        .max()
        .ok_or_else(not_found)
}

/// A pagination token is a bare number, a list bullet or a Markdown link label
fn page_number(token: &str) -> Option<u32> {
    let label = token
        .strip_prefix('[')
        .and_then(|rest| rest.split(']').next())
        .unwrap_or(token);
    label.parse().ok()
}
