use crate::models::PageClass;
use serde::Serialize;

/// Counters collected during one pass over a dump.
///
/// The pipeline is single-threaded, so plain integers are enough.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub pages_scanned: u64,
    pub pages_processed: u64,
    pub articles: u64,
    pub article_redirects: u64,
    pub other_pages: u64,
    pub pages_with_links: u64,
    pub edges_extracted: u64,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_scanned(&mut self) {
        self.pages_scanned += 1;
    }

    pub fn inc_processed(&mut self) {
        self.pages_processed += 1;
    }

    pub fn record_class(&mut self, class: PageClass) {
        match class {
            PageClass::Article => self.articles += 1,
            PageClass::ArticleRedirect => self.article_redirects += 1,
            PageClass::Other => self.other_pages += 1,
        }
    }

    pub fn add_edges(&mut self, count: u64) {
        if count > 0 {
            self.pages_with_links += 1;
        }
        self.edges_extracted += count;
    }

    pub fn scanned(&self) -> u64 {
        self.pages_scanned
    }

    /// Qualifying pages handed to the sinks
    pub fn pages_processed(&self) -> u64 {
        self.pages_processed
    }

    pub fn edges(&self) -> u64 {
        self.edges_extracted
    }
}
