use crate::config::{CSV_BUFFER_SIZE, PROGRESS_INTERVAL};
use crate::error::DumpError;
use crate::models::{PageElement, PageLinks};
use crate::pipeline::PageSink;
use csv::Writer;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

pub const EDGE_HEADER: [&str; 2] = ["source", "target"];

/// Writes one `source,target` row per link edge.
pub struct EdgeListSink<W: Write> {
    writer: Writer<W>,
    pages: u64,
    edges: u64,
    progress_reports: u64,
}

impl EdgeListSink<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, DumpError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| DumpError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Writing edge list");
        Self::new(BufWriter::with_capacity(CSV_BUFFER_SIZE, file))
    }
}

impl<W: Write> EdgeListSink<W> {
    /// Writes the header immediately, so even an empty run yields a valid file.
    pub fn new(out: W) -> Result<Self, DumpError> {
        let mut writer = Writer::from_writer(out);
        writer.write_record(EDGE_HEADER)?;
        Ok(Self {
            writer,
            pages: 0,
            edges: 0,
            progress_reports: 0,
        })
    }

    pub fn pages(&self) -> u64 {
        self.pages
    }

    pub fn edges(&self) -> u64 {
        self.edges
    }

    /// Progress lines logged so far, one per `PROGRESS_INTERVAL` pages.
    pub fn progress_reports(&self) -> u64 {
        self.progress_reports
    }

    pub fn write_page(&mut self, links: &PageLinks) -> Result<(), DumpError> {
        for edge in links.edges() {
            self.writer.write_record([edge.source, edge.target])?;
            self.edges += 1;
        }
        self.pages += 1;
        if self.pages % PROGRESS_INTERVAL == 0 {
            self.progress_reports += 1;
            info!(edges = self.edges, "Processed {} pages...", self.pages);
        }
        Ok(())
    }

    /// Flushes and hands back the destination.
    pub fn into_inner(self) -> Result<W, DumpError> {
        self.writer
            .into_inner()
            .map_err(|e| DumpError::Write(e.into_error()))
    }
}

impl<W: Write> PageSink for EdgeListSink<W> {
    fn wants_links(&self) -> bool {
        true
    }

    fn accept(&mut self, _page: &PageElement, links: Option<&PageLinks>) -> Result<(), DumpError> {
        match links {
            Some(links) => self.write_page(links),
            None => Ok(()),
        }
    }

    fn finish(&mut self) -> Result<(), DumpError> {
        self.writer.flush()?;
        info!(
            pages = self.pages,
            edges = self.edges,
            "Finished writing edge list"
        );
        Ok(())
    }
}
