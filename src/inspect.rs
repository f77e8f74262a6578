//! Human-readable dump of page subtrees for manual exploration.

use crate::config::ELLIPSIS;
use crate::error::DumpError;
use crate::models::{PageElement, PageLinks, XmlNode};
use crate::pipeline::PageSink;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::Write;

/// Nested mapping mirroring a page subtree, leaf text truncated.
///
/// Repeated sibling names collapse onto one key holding the last value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct InspectionRecord(pub Value);

impl InspectionRecord {
    pub fn from_node(node: &XmlNode, trunc_size: usize) -> Self {
        let mut root = Map::new();
        root.insert(node.name.clone(), Value::Object(children_map(node, trunc_size)));
        Self(Value::Object(root))
    }

    pub fn from_page(page: &PageElement, trunc_size: usize) -> Self {
        Self::from_node(&page.tree, trunc_size)
    }

    /// Follows `path` through nested mappings to a leaf string.
    pub fn leaf(&self, path: &[&str]) -> Option<&str> {
        path.iter()
            .try_fold(&self.0, |value, key| value.get(*key))
            .and_then(Value::as_str)
    }
}

fn children_map(node: &XmlNode, trunc_size: usize) -> Map<String, Value> {
    let mut map = Map::new();
    for child in &node.children {
        let value = if child.is_leaf() {
            Value::String(truncate(&child.text, trunc_size))
        } else {
            Value::Object(children_map(child, trunc_size))
        };
        map.insert(child.name.clone(), value);
    }
    map
}

/// Cuts `text` to `limit` characters and appends the ellipsis marker.
pub fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => {
            let mut out = String::with_capacity(cut + ELLIPSIS.len());
            out.push_str(&text[..cut]);
            out.push_str(ELLIPSIS);
            out
        }
        None => text.to_string(),
    }
}

/// Pretty-prints one inspection record per included page.
pub struct InspectionSink<W: Write> {
    out: W,
    trunc_size: usize,
    printed: u64,
}

impl<W: Write> InspectionSink<W> {
    pub fn new(out: W, trunc_size: usize) -> Self {
        Self {
            out,
            trunc_size,
            printed: 0,
        }
    }

    pub fn printed(&self) -> u64 {
        self.printed
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> PageSink for InspectionSink<W> {
    fn accept(&mut self, page: &PageElement, _links: Option<&PageLinks>) -> Result<(), DumpError> {
        let record = InspectionRecord::from_page(page, self.trunc_size);
        serde_json::to_writer_pretty(&mut self.out, &record)?;
        writeln!(self.out)?;
        self.printed += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), DumpError> {
        self.out.flush()?;
        Ok(())
    }
}
