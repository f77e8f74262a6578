use crate::classify;
use serde::Serialize;
use tracing::debug;

/// One element of a page subtree, with namespace prefixes already stripped
/// from its name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    /// Character data that appears before the first child element
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// First descendant (self excluded) named `name`, in document order.
    pub fn find_descendant(&self, name: &str) -> Option<&XmlNode> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(name) {
                return Some(found);
            }
        }
        None
    }
}

/// A fully-built `<page>` unit.
///
/// Owns its whole subtree; dropping it releases the page's memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageElement {
    pub title: String,
    pub namespace_id: String,
    pub is_redirect: bool,
    pub raw_text: Option<String>,
    pub tree: XmlNode,
}

impl PageElement {
    pub fn from_tree(tree: XmlNode) -> Self {
        let title = match tree.find_descendant("title") {
            Some(node) => node.text.clone(),
            None => {
                debug!("Page without a title element");
                String::new()
            }
        };
        let raw_text = tree
            .find_descendant("text")
            .filter(|node| !node.text.is_empty())
            .map(|node| node.text.clone());

        Self {
            title,
            namespace_id: classify::namespace_id(&tree),
            is_redirect: classify::is_redirect(&tree),
            raw_text,
            tree,
        }
    }
}

/// Mutually exclusive classification of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PageClass {
    Article,
    ArticleRedirect,
    Other,
}

/// Cleaned outbound links of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLinks {
    pub source: String,
    pub targets: Vec<String>,
    pub out_count: usize,
}

impl PageLinks {
    pub fn new(source: String, targets: Vec<String>) -> Self {
        let out_count = targets.len();
        Self {
            source,
            targets,
            out_count,
        }
    }

    pub fn edges(&self) -> impl Iterator<Item = LinkEdge<'_>> {
        self.targets.iter().map(move |target| LinkEdge {
            source: &self.source,
            target,
        })
    }
}

/// One directed relation from a page title to a linked title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkEdge<'a> {
    pub source: &'a str,
    pub target: &'a str,
}
