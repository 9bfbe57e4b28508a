//! Commit discovery from the public activity feed
//!
//! The timeline is an Atom document whose entries embed HTML, so commit
//! links show up either as `href="/owner/repo/commit/sha"` or, escaped, as
//! `href=&quot;/owner/repo/commit/sha`. Both forms are recognised.

use crate::types::WorkItem;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static COMMIT_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"href=(?:"|&quot;|')/([A-Za-z0-9_-]+)/([A-Za-z0-9_.-]+)/commit/([^&/;"'\s<>?#]+)"#,
    )
    .expect("commit link pattern is valid")
});

/// Every commit link contains this, so documents without it skip the regex
const COMMIT_MARKER: &[u8] = b"/commit/";

/// Extract work items from a feed document.
///
/// Order follows first appearance; repeated links collapse to one item.
/// A document with no commit links yields an empty list.
pub fn discover(feed_document: &str) -> Vec<WorkItem> {
    if memchr::memmem::find(feed_document.as_bytes(), COMMIT_MARKER).is_none() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    COMMIT_LINK
        .captures_iter(feed_document)
        .map(|caps| WorkItem::new(&caps[1], &caps[2], &caps[3]))
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
