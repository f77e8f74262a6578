//! Error taxonomy for the extraction pipeline.
//!
//! Every variant is fatal to the current run. Conditions that can be resolved
//! locally (missing namespace, missing text body) never surface here.

use crate::stats::RunSummary;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DumpError {
    /// Archive unreadable or destination unwritable
    #[error("I/O error on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A compressed block failed to decode
    #[error("corrupt archive near decompressed byte {offset}: {message}")]
    CorruptArchive { offset: u64, message: String },

    /// The XML tokenizer cannot continue
    #[error("malformed XML at byte {position}: {message}")]
    MalformedXml { position: u64, message: String },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("failed to write output")]
    Output(#[from] csv::Error),

    #[error("failed to render inspection record")]
    Render(#[from] serde_json::Error),

    #[error("failed to write output")]
    Write(#[from] io::Error),
}

impl DumpError {
    /// Short kind name used in user-facing failure reports.
    pub fn kind(&self) -> &'static str {
        match self {
            DumpError::Io { .. } => "IOError",
            DumpError::CorruptArchive { .. } => "CorruptArchiveError",
            DumpError::MalformedXml { .. } => "MalformedXmlError",
            DumpError::InvalidConfig { .. } => "InvalidConfig",
            DumpError::Output(_) | DumpError::Render(_) | DumpError::Write(_) => "IOError",
        }
    }

    /// Best-effort byte offset into the decompressed stream, where known.
    pub fn offset(&self) -> Option<u64> {
        match self {
            DumpError::CorruptArchive { offset, .. } => Some(*offset),
            DumpError::MalformedXml { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// A fatal failure together with everything counted before it happened.
///
/// Pages emitted before the failure point stay valid; the summary says how
/// many there were.
#[derive(Debug, Error)]
#[error("{} after {} processed pages", .error.kind(), .summary.pages_processed())]
pub struct RunError {
    pub summary: RunSummary,
    #[source]
    pub error: DumpError,
}

impl RunError {
    pub fn new(summary: RunSummary, error: DumpError) -> Self {
        Self { summary, error }
    }
}
