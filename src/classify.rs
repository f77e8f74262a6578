//! Page classification and the inclusion policy shared by every sink.

use crate::config::FilterConfig;
use crate::models::{PageClass, PageElement, XmlNode};

/// Namespace id of the main (article) namespace
pub const ARTICLE_NAMESPACE: &str = "0";

/// Reported when a page carries no `<ns>` element
pub const UNKNOWN_NAMESPACE: &str = "Unknown";

pub fn namespace_id(tree: &XmlNode) -> String {
    tree.find_descendant("ns")
        .map(|node| node.text.clone())
        .unwrap_or_else(|| UNKNOWN_NAMESPACE.to_string())
}

/// A redirect marker anywhere in the subtree counts, whatever its content.
pub fn is_redirect(tree: &XmlNode) -> bool {
    tree.find_descendant("redirect").is_some()
}

pub fn classify(page: &PageElement) -> PageClass {
    match (page.namespace_id.as_str(), page.is_redirect) {
        (ARTICLE_NAMESPACE, false) => PageClass::Article,
        (ARTICLE_NAMESPACE, true) => PageClass::ArticleRedirect,
        _ => PageClass::Other,
    }
}

impl PageClass {
    pub fn is_included(self, config: &FilterConfig) -> bool {
        match self {
            PageClass::Article => true,
            PageClass::ArticleRedirect => !config.exclude_redirects,
            PageClass::Other => !config.only_articles,
        }
    }
}
