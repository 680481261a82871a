//! Depth-first markup scanner
//!
//! Walks a parsed document in pre-order (node first, then its children left
//! to right) and hands every node to a visitor. The series and episode
//! parsers are both built on this walk with different visitors.

use scraper::{ElementRef, Html};

/// A node as seen by a scan visitor
#[derive(Debug, Clone, Copy)]
pub enum ScanNode<'a> {
    /// An element, with access to its tag name and attributes
    Element(ElementRef<'a>),
    /// A text node
    Text(&'a str),
    /// Comments, doctypes and processing instructions
    Other,
}

impl<'a> ScanNode<'a> {
    /// The element, if this node is one
    pub fn as_element(&self) -> Option<ElementRef<'a>> {
        match self {
            ScanNode::Element(element) => Some(*element),
            _ => None,
        }
    }
}

/// Scan a whole document, starting from its root element.
pub fn scan<'a, F>(document: &'a Html, visit: &mut F)
where
    F: FnMut(ScanNode<'a>),
{
    walk(document.root_element(), visit);
}

/// Visit `element` and then every node below it, depth first.
///
/// The traversal never stops early; visitors filter for the nodes they
/// care about.
pub fn walk<'a, F>(element: ElementRef<'a>, visit: &mut F)
where
    F: FnMut(ScanNode<'a>),
{
    visit(ScanNode::Element(element));

    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            walk(child_element, visit);
        } else if let Some(text) = child.value().as_text() {
            visit(ScanNode::Text(&**text));
        } else {
            visit(ScanNode::Other);
        }
    }
}

/// Whether the element's class attribute contains `marker` anywhere.
pub fn class_contains(element: &ElementRef<'_>, marker: &str) -> bool {
    element
        .value()
        .attr("class")
        .is_some_and(|class| class.contains(marker))
}

/// Visible text of an element, whitespace-trimmed.
pub fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
