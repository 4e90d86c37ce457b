//! Namespace-agnostic element lookup.
//!
//! The service is inconsistent with namespace prefixes across replies, so
//! elements are matched on their local name only. This leniency is
//! intentional: the namespace URI and prefix are ignored entirely.

use xmltree::{Element, XMLNode};

/// Parse `xml` into a tree; `None` when the document is malformed.
///
/// The text is already decoded, so the `encoding` named by an XML
/// declaration is ignored.
pub fn parse_document(xml: &str) -> Option<Element> {
    match Element::parse(without_declaration(xml).as_bytes()) {
        Ok(root) => Some(root),
        Err(err) => {
            log::debug!("reply is not well-formed XML: {err}");
            None
        }
    }
}

// The parser re-decodes bytes according to the declaration and rejects
// encodings it does not know, so the declaration is dropped before parsing.
fn without_declaration(xml: &str) -> &str {
    let trimmed = xml.trim_start_matches('\u{feff}').trim_start();
    let Some(rest) = trimmed.strip_prefix("<?xml") else {
        return trimmed;
    };
    if !rest.starts_with(|c: char| c.is_ascii_whitespace() || c == '?') {
        return trimmed;
    }
    match rest.find("?>") {
        Some(end) => &rest[end + 2..],
        None => trimmed,
    }
}

/// First element of the document rooted at `root`, in document order and
/// including the root itself, whose local name is `local_name`.
pub fn find_descendant<'a>(root: &'a Element, local_name: &str) -> Option<&'a Element> {
    if root.name == local_name {
        return Some(root);
    }
    root.children.iter().find_map(|node| match node {
        XMLNode::Element(child) => find_descendant(child, local_name),
        _ => None,
    })
}

/// First descendant matching any of `local_names`, tried in order of
/// preference: the second name is only considered when the first is absent
/// from the whole tree.
pub fn find_first_of<'a>(root: &'a Element, local_names: &[&str]) -> Option<&'a Element> {
    local_names
        .iter()
        .find_map(|name| find_descendant(root, name))
}

/// Concatenated text and CDATA content of `element` and all its descendants.
pub fn text_content(element: &Element) -> String {
    let mut out = String::new();
    collect_text(element, &mut out);
    out
}

fn collect_text(element: &Element, out: &mut String) {
    for node in &element.children {
        match node {
            XMLNode::Text(text) | XMLNode::CData(text) => out.push_str(text),
            XMLNode::Element(child) => collect_text(child, out),
            _ => {}
        }
    }
}
