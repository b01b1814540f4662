use tracing::warn;

use crate::config::SliceMarkers;

/// Cut the attribute section out of a rendered listing page.
///
/// Returns the text from the start marker up to (not including) the end
/// marker, with newlines removed. When a marker is missing, or the end marker
/// only occurs before the start marker, the page is returned unchanged so the
/// extractor still sees everything.
pub fn slice_listing(page: &str, url: &str, markers: &SliceMarkers) -> String {
    let Some(start) = page.find(&markers.start) else {
        warn!("Start marker {:?} not found on {}, keeping the full page", markers.start, url);
        return page.to_string();
    };

    let Some(end) = page[start..].find(&markers.end).map(|offset| start + offset) else {
        warn!("End marker {:?} not found after the start marker on {}, keeping the full page", markers.end, url);
        return page.to_string();
    };

    page[start..end].replace('\n', "")
}
