use crate::config::LINK_BLACKLIST;
use crate::models::PageLinks;
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;

/// `[[target]]` or `[[target|display]]`; targets containing a colon never match.
pub static LINK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^|:\]]+)(?:\|[^\]]+)?\]\]").unwrap());

/// Raw link targets in order of first appearance, exact repeats removed.
pub fn extract_raw_links(text: &str) -> Vec<&str> {
    let mut seen = FxHashSet::default();
    LINK_REGEX
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|target| seen.insert(*target))
        .collect()
}

/// Drops namespaced targets, self-references and administrative pages.
pub fn clean_links<'a>(links: impl IntoIterator<Item = &'a str>, current_title: &str) -> Vec<String> {
    links
        .into_iter()
        .filter(|link| memchr::memchr(b':', link.as_bytes()).is_none())
        .filter(|link| *link != current_title)
        .filter(|link| !LINK_BLACKLIST.contains(link))
        .map(str::to_string)
        .collect()
}

/// Deduplicated, filtered outbound link titles of one page.
pub fn extract_links(text: Option<&str>, current_title: &str) -> Vec<String> {
    match text {
        Some(text) => clean_links(extract_raw_links(text), current_title),
        None => Vec::new(),
    }
}

pub fn page_links(title: &str, text: Option<&str>) -> PageLinks {
    PageLinks::new(title.to_string(), extract_links(text, title))
}
