//! Wikigraph: streaming link-graph extraction from Wikipedia dumps
//!
//! This crate reads a bzip2-compressed MediaWiki XML dump in a single forward
//! pass and turns it into a page-to-page link graph, without ever holding
//! more than one page in memory:
//!
//! 1. **Decompression** -- The archive is decoded block by block as bytes are pulled
//! 2. **Page reading** -- A pull-based XML tokenizer builds the subtree of one `<page>`
//!    at a time and hands it over once its closing tag is seen
//! 3. **Classification** -- Each page is an article, an article redirect, or something
//!    else; one inclusion policy decides which pages count for every consumer
//! 4. **Link extraction** -- `[[target|display]]` markup is reduced to a deduplicated set
//!    of targets, minus namespaced links, self-references and administrative pages
//! 5. **Sinks** -- Inspection records, a console link report, and a `source,target`
//!    edge list, any combination of which can share one pass
//!
//! # Key Modules
//!
//! - [`source`] -- Decompressing byte source over the archive
//! - [`parser`] -- Streaming `<page>` reader
//! - [`classify`] -- Namespace and redirect classification, inclusion policy
//! - [`links`] -- Link extraction and cleaning
//! - [`inspect`] -- Truncated nested-mapping view of a page
//! - [`report`] -- Per-page link count summary
//! - [`edges`] -- CSV edge-list writer
//! - [`pipeline`] -- Single-pass driver and the [`pipeline::PageSink`] trait
//! - [`models`] -- Core data types (PageElement, PageClass, PageLinks, LinkEdge)
//! - [`stats`] -- Run counters
//! - [`config`] -- Constants and the per-run filter configuration
//! - [`error`] -- Error taxonomy
//!
//! # Example Usage
//!
//! ```bash
//! # Look at the first article of a dump
//! wikigraph peek -i enwiki-latest-pages-articles.xml.bz2
//!
//! # Write the link graph of the first 1000 articles
//! wikigraph export -i enwiki-latest-pages-articles.xml.bz2 --limit 1000
//! ```

pub mod classify;
pub mod config;
pub mod edges;
pub mod error;
pub mod inspect;
pub mod links;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod stats;

pub use config::FilterConfig;
pub use error::{DumpError, RunError};
pub use models::{LinkEdge, PageClass, PageElement, PageLinks};
pub use parser::WikiReader;
pub use stats::RunSummary;
