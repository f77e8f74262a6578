//! Single-pass driver: pages are pulled one at a time, classified, and handed
//! to every active sink before the next page is read.

use crate::classify::classify;
use crate::config::{FilterConfig, PROGRESS_INTERVAL, REPORT_SAMPLE_SIZE};
use crate::edges::EdgeListSink;
use crate::error::{DumpError, RunError};
use crate::inspect::InspectionSink;
use crate::links;
use crate::models::{PageElement, PageLinks};
use crate::parser::WikiReader;
use crate::report::ReportSink;
use crate::source::ArchiveSource;
use crate::stats::RunSummary;
use indicatif::ProgressBar;
use std::io::{BufReader, Write};
use std::path::Path;
use tracing::{debug, info};

/// Consumer of included pages.
pub trait PageSink {
    /// Whether this sink needs the page's cleaned links.
    fn wants_links(&self) -> bool {
        false
    }

    fn accept(&mut self, page: &PageElement, links: Option<&PageLinks>) -> Result<(), DumpError>;

    fn finish(&mut self) -> Result<(), DumpError> {
        Ok(())
    }
}

/// Pages that pass the inclusion policy, stopping once `limit` of them
/// have been yielded. Non-qualifying pages are scanned past without
/// counting against the limit.
pub struct QualifyingPages<I> {
    pages: I,
    config: FilterConfig,
    summary: RunSummary,
    done: bool,
}

impl<I> QualifyingPages<I>
where
    I: Iterator<Item = Result<PageElement, DumpError>>,
{
    pub fn new(pages: I, config: FilterConfig) -> Self {
        Self {
            pages,
            config,
            summary: RunSummary::new(),
            done: false,
        }
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn into_summary(self) -> RunSummary {
        self.summary
    }
}

impl<I> Iterator for QualifyingPages<I>
where
    I: Iterator<Item = Result<PageElement, DumpError>>,
{
    type Item = Result<PageElement, DumpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.config.limit_reached(self.summary.pages_processed()) {
            return None;
        }
        for page in self.pages.by_ref() {
            let page = match page {
                Ok(page) => page,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            self.summary.inc_scanned();
            let class = classify(&page);
            self.summary.record_class(class);
            if class.is_included(&self.config) {
                self.summary.inc_processed();
                return Some(Ok(page));
            }
            debug!(title = %page.title, ?class, "Skipping page");
        }
        self.done = true;
        None
    }
}

/// Cleaned links for every qualifying page, lazily.
pub fn link_pages<I>(
    pages: I,
    config: FilterConfig,
) -> impl Iterator<Item = Result<PageLinks, DumpError>>
where
    I: Iterator<Item = Result<PageElement, DumpError>>,
{
    QualifyingPages::new(pages, config)
        .map(|page| page.map(|page| links::page_links(&page.title, page.raw_text.as_deref())))
}

/// Drives `sinks` over one pass of `pages`.
pub fn run<I>(
    pages: I,
    config: &FilterConfig,
    sinks: &mut [&mut dyn PageSink],
) -> Result<RunSummary, RunError>
where
    I: Iterator<Item = Result<PageElement, DumpError>>,
{
    let mut qualifying = QualifyingPages::new(pages, *config);
    let pb = ProgressBar::new_spinner();
    let result = drive(&mut qualifying, sinks, &pb);
    pb.finish_and_clear();

    let summary = qualifying.into_summary();
    match result {
        Ok(()) => {
            info!(
                scanned = summary.scanned(),
                processed = summary.pages_processed(),
                edges = summary.edges(),
                "Pass complete"
            );
            Ok(summary)
        }
        Err(e) => Err(RunError::new(summary, e)),
    }
}

fn drive<I>(
    qualifying: &mut QualifyingPages<I>,
    sinks: &mut [&mut dyn PageSink],
    pb: &ProgressBar,
) -> Result<(), DumpError>
where
    I: Iterator<Item = Result<PageElement, DumpError>>,
{
    let wants_links = sinks.iter().any(|sink| sink.wants_links());

    while let Some(page) = qualifying.next() {
        let page = page?;
        let links = wants_links
            .then(|| links::page_links(&page.title, page.raw_text.as_deref()));
        if let Some(links) = &links {
            qualifying.summary.add_edges(links.out_count as u64);
        }
        for sink in sinks.iter_mut() {
            sink.accept(&page, links.as_ref())?;
        }

        let processed = qualifying.summary.pages_processed();
        if processed % PROGRESS_INTERVAL == 0 {
            pb.set_message(format!("Processed {} pages...", processed));
            pb.tick();
        }
        // `page` is dropped here, before the next pull.
    }
    for sink in sinks.iter_mut() {
        sink.finish()?;
    }
    Ok(())
}

fn open(path: &Path) -> Result<WikiReader<BufReader<ArchiveSource>>, RunError> {
    WikiReader::open(path).map_err(|e| RunError::new(RunSummary::new(), e))
}

/// Prints an inspection record for each qualifying page.
pub fn inspect<W: Write>(path: &Path, config: &FilterConfig, out: W) -> Result<RunSummary, RunError> {
    let mut sink = InspectionSink::new(out, config.trunc_size);
    run(open(path)?, config, &mut [&mut sink])
}

/// Prints link counts and samples for each qualifying page with links.
pub fn report<W: Write>(path: &Path, config: &FilterConfig, out: W) -> Result<RunSummary, RunError> {
    let mut sink = ReportSink::new(out, REPORT_SAMPLE_SIZE);
    run(open(path)?, config, &mut [&mut sink])
}

/// Writes the edge list of every qualifying page to `output`.
pub fn export_edges(path: &Path, config: &FilterConfig, output: &Path) -> Result<RunSummary, RunError> {
    let reader = open(path)?;
    let mut sink = EdgeListSink::create(output).map_err(|e| RunError::new(RunSummary::new(), e))?;
    run(reader, config, &mut [&mut sink])
}
