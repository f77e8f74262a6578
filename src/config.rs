use crate::error::DumpError;

/// Progress update interval for the edge-list sink (every N processed pages)
pub const PROGRESS_INTERVAL: u64 = 100;

/// Default character budget for inspection leaf text
pub const DEFAULT_TRUNC_SIZE: usize = 300;

/// Number of link targets shown per page by the report sink
pub const REPORT_SAMPLE_SIZE: usize = 3;

/// Marker appended to truncated inspection text
pub const ELLIPSIS: &str = "...";

pub const DEFAULT_OUTPUT_DIR: &str = "data";
pub const DEFAULT_OUTPUT_FILENAME: &str = "wiki_edges.csv";

/// Buffer size between the file handle and the decompressor
pub const DECODE_BUFFER_SIZE: usize = 256 * 1024;

/// Buffer size for the edge-list CSV writer
pub const CSV_BUFFER_SIZE: usize = 128 * 1024;

/// Administrative link targets that never become edges
pub const LINK_BLACKLIST: [&str; 3] = ["Main Page", "Portal:Contents", "Portal:Featured content"];

/// Filter settings for one pipeline run. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterConfig {
    pub only_articles: bool,
    pub exclude_redirects: bool,
    pub trunc_size: usize,
    /// Qualifying pages to process before stopping; `None` reads the whole archive
    pub limit: Option<u64>,
}

impl FilterConfig {
    pub fn new(
        only_articles: bool,
        exclude_redirects: bool,
        trunc_size: usize,
        limit: Option<u64>,
    ) -> Result<Self, DumpError> {
        if trunc_size == 0 {
            return Err(DumpError::InvalidConfig {
                reason: "trunc_size must be greater than zero".to_string(),
            });
        }
        if limit == Some(0) {
            return Err(DumpError::InvalidConfig {
                reason: "limit must be greater than zero".to_string(),
            });
        }
        Ok(Self {
            only_articles,
            exclude_redirects,
            trunc_size,
            limit,
        })
    }

    /// True once `processed` qualifying pages satisfy the configured limit.
    pub fn limit_reached(&self, processed: u64) -> bool {
        self.limit.is_some_and(|limit| processed >= limit)
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            only_articles: true,
            exclude_redirects: true,
            trunc_size: DEFAULT_TRUNC_SIZE,
            limit: None,
        }
    }
}
