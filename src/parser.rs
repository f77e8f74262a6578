//! Streaming `<page>` reader over a decompressed dump.
//!
//! Only the subtree of the page currently being read is ever materialised.
//! Everything outside `<page>` elements (site info, the root element) is
//! tokenised and dropped; only its nesting depth is tracked, so a document
//! that stops before its root closes is still reported as malformed. Each
//! finished page is moved out to the caller, so the reader keeps nothing
//! from it once it has been yielded.

use crate::error::DumpError;
use crate::models::{PageElement, XmlNode};
use crate::source::{classify_read_error, ArchiveSource};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

const PAGE_TAG: &[u8] = b"page";

/// Read buffer between the decompressor and the tokenizer
const XML_BUFFER_SIZE: usize = 64 * 1024;

/// Nesting outside any page: the root and elements such as `<siteinfo>`.
#[derive(Debug, Default)]
struct OuterElements {
    depth: usize,
    root_seen: bool,
}

impl OuterElements {
    /// Records an element opening outside any page. A second top-level
    /// element after the root has closed is junk.
    fn open(&mut self, position: u64) -> Result<(), DumpError> {
        if self.depth == 0 {
            if self.root_seen {
                return Err(DumpError::MalformedXml {
                    position,
                    message: "junk after document element".to_string(),
                });
            }
            self.root_seen = true;
        }
        Ok(())
    }
}

pub struct WikiReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    /// Open elements of the current page, outermost first
    stack: Vec<XmlNode>,
    outer: OuterElements,
    path: PathBuf,
    pages_read: u64,
    finished: bool,
}

impl WikiReader<BufReader<ArchiveSource>> {
    /// Opens a bzip2-compressed dump for streaming.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DumpError> {
        let path = path.as_ref();
        let source = ArchiveSource::open(path)?;
        Ok(Self::new(
            BufReader::with_capacity(XML_BUFFER_SIZE, source),
            path,
        ))
    }
}

impl<R: BufRead> WikiReader<R> {
    /// Reads pages from an already-decoded XML stream.
    pub fn new(input: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader: Reader::from_reader(input),
            buf: Vec::new(),
            stack: Vec::new(),
            outer: OuterElements::default(),
            path: path.into(),
            pages_read: 0,
            finished: false,
        }
    }

    pub fn pages_read(&self) -> u64 {
        self.pages_read
    }

    /// Bytes of the decompressed stream consumed by the tokenizer.
    pub fn position(&self) -> u64 {
        self.reader.buffer_position() as u64
    }

    /// Capacity of the event buffer; bounded by the largest single token.
    pub fn buffer_capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Elements currently held open; zero between pages.
    pub fn open_elements(&self) -> usize {
        self.stack.len()
    }

    fn next_page(&mut self) -> Result<Option<PageElement>, DumpError> {
        loop {
            self.buf.clear();
            let result = self.reader.read_event_into(&mut self.buf);
            let position = self.reader.buffer_position() as u64;
            let event = match result {
                Ok(event) => event,
                Err(e) => return Err(to_dump_error(e, position, &self.path)),
            };

            match event {
                Event::Start(e) => {
                    if self.stack.is_empty() {
                        self.outer.open(position)?;
                        if e.local_name().as_ref() != PAGE_TAG {
                            validate_attributes(&e)
                                .map_err(|err| to_dump_error(err, position, &self.path))?;
                            self.outer.depth += 1;
                            continue;
                        }
                    }
                    let node = build_node(&e)
                        .map_err(|err| to_dump_error(err, position, &self.path))?;
                    self.stack.push(node);
                }
                Event::Empty(e) => {
                    if self.stack.is_empty() {
                        self.outer.open(position)?;
                        if e.local_name().as_ref() != PAGE_TAG {
                            validate_attributes(&e)
                                .map_err(|err| to_dump_error(err, position, &self.path))?;
                            continue;
                        }
                    }
                    let node = build_node(&e)
                        .map_err(|err| to_dump_error(err, position, &self.path))?;
                    match self.stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => return Ok(Some(PageElement::from_tree(node))),
                    }
                }
                Event::Text(e) => match self.stack.last_mut() {
                    Some(node) => {
                        if node.children.is_empty() {
                            let text = e
                                .unescape()
                                .map_err(|err| to_dump_error(err, position, &self.path))?;
                            node.text.push_str(&text);
                        }
                    }
                    None => {
                        if self.outer.depth == 0 && !e.iter().all(u8::is_ascii_whitespace) {
                            return Err(DumpError::MalformedXml {
                                position,
                                message: "character data outside the root element".to_string(),
                            });
                        }
                    }
                },
                Event::CData(e) => match self.stack.last_mut() {
                    Some(node) => {
                        if node.children.is_empty() {
                            let text = std::str::from_utf8(&e).map_err(|err| {
                                DumpError::MalformedXml {
                                    position,
                                    message: format!("invalid UTF-8 in CDATA section: {err}"),
                                }
                            })?;
                            node.text.push_str(text);
                        }
                    }
                    None => {
                        if self.outer.depth == 0 {
                            return Err(DumpError::MalformedXml {
                                position,
                                message: "CDATA section outside the root element".to_string(),
                            });
                        }
                    }
                },
                Event::End(_) => {
                    let Some(node) = self.stack.pop() else {
                        self.outer.depth = self.outer.depth.saturating_sub(1);
                        continue;
                    };
                    match self.stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => {
                            trace!(position, "Closed page element");
                            return Ok(Some(PageElement::from_tree(node)));
                        }
                    }
                }
                Event::Eof => {
                    if let Some(open) = self.stack.last() {
                        return Err(DumpError::MalformedXml {
                            position,
                            message: format!(
                                "document ended with <{}> still open inside a page",
                                open.name
                            ),
                        });
                    }
                    if self.outer.depth > 0 {
                        return Err(DumpError::MalformedXml {
                            position,
                            message: format!(
                                "document ended with {} element(s) still open",
                                self.outer.depth
                            ),
                        });
                    }
                    if !self.outer.root_seen {
                        return Err(DumpError::MalformedXml {
                            position,
                            message: "no root element found".to_string(),
                        });
                    }
                    return Ok(None);
                }
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for WikiReader<R> {
    type Item = Result<PageElement, DumpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_page() {
            Ok(Some(page)) => {
                self.pages_read += 1;
                Some(Ok(page))
            }
            Ok(None) => {
                debug!(pages = self.pages_read, "Reached end of dump");
                self.finished = true;
                None
            }
            Err(e) => {
                // A malformed fragment ends the sequence; partial pages are dropped.
                self.finished = true;
                self.stack.clear();
                Some(Err(e))
            }
        }
    }
}

fn build_node(start: &BytesStart<'_>) -> Result<XmlNode, quick_xml::Error> {
    validate_attributes(start)?;
    Ok(XmlNode::new(String::from_utf8_lossy(
        start.local_name().as_ref(),
    )))
}

/// Attributes are not kept, but a malformed one still fails the document.
fn validate_attributes(start: &BytesStart<'_>) -> Result<(), quick_xml::Error> {
    for attr in start.attributes() {
        attr?.unescape_value()?;
    }
    Ok(())
}

fn to_dump_error(e: quick_xml::Error, position: u64, path: &Path) -> DumpError {
    match e {
        quick_xml::Error::Io(io) => classify_read_error(&io, path),
        other => DumpError::MalformedXml {
            position,
            message: other.to_string(),
        },
    }
}
