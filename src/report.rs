use crate::error::DumpError;
use crate::models::{PageElement, PageLinks};
use crate::pipeline::PageSink;
use std::io::Write;

const SEPARATOR: &str = "--------------------";

/// Prints a link count and a few sample targets for each page that has links.
pub struct ReportSink<W: Write> {
    out: W,
    sample_size: usize,
    reported: u64,
}

impl<W: Write> ReportSink<W> {
    pub fn new(out: W, sample_size: usize) -> Self {
        Self {
            out,
            sample_size,
            reported: 0,
        }
    }

    pub fn reported(&self) -> u64 {
        self.reported
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn write_page(&mut self, links: &PageLinks) -> Result<(), DumpError> {
        if links.out_count == 0 {
            return Ok(());
        }
        let sample = &links.targets[..links.targets.len().min(self.sample_size)];
        writeln!(
            self.out,
            "Page: {} | Clean Links: {}",
            links.source, links.out_count
        )?;
        writeln!(self.out, "Sample: {:?}", sample)?;
        writeln!(self.out, "{}", SEPARATOR)?;
        self.reported += 1;
        Ok(())
    }
}

impl<W: Write> PageSink for ReportSink<W> {
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
        self.out.flush()?;
        Ok(())
    }
}
