//! Raw-source XML document handling.
//!
//! Reading parses the source with `roxmltree`; mutations splice the raw
//! string using byte-accurate node ranges, so whitespace, comments,
//! attribute ordering, and elements this system never inspects are
//! preserved across a load/save round-trip. Every mutation re-parses, so
//! ranges are always computed against the current source.

use std::path::Path;

use crate::error::{KeilError, Result};

/// A legacy XML document: raw source plus range-based mutation.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    source: String,
}

impl XmlDocument {
    /// Parse a document from its XML source, validating it up front.
    pub fn parse(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        roxmltree::Document::parse(&source)?;
        Ok(XmlDocument { source })
    }

    /// Load a document from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::parse(source)
    }

    /// The current raw XML source (reflects any mutations).
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Write the (potentially mutated) source back to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.source)?;
        Ok(())
    }

    /// Run a closure against a freshly parsed tree.
    pub fn read<R>(&self, f: impl FnOnce(&roxmltree::Document<'_>) -> R) -> Result<R> {
        let doc = roxmltree::Document::parse(&self.source)?;
        Ok(f(&doc))
    }

    /// Text content of the element at `path` (tag names below the root).
    pub fn read_text(&self, path: &[&str]) -> Option<String> {
        let doc = roxmltree::Document::parse(&self.source).ok()?;
        let node = find_element(&doc, path)?;
        Some(node.text().unwrap_or("").trim().to_string())
    }

    /// Replace the text content of the element at `path`.
    ///
    /// The value is XML-escaped. Fails with [`KeilError::MissingNode`]
    /// when the element does not exist.
    pub fn set_text(&mut self, path: &[&str], value: &str) -> Result<()> {
        let escaped = escape_xml(value);
        let doc = roxmltree::Document::parse(&self.source)?;
        let node = find_element(&doc, path).ok_or_else(|| KeilError::MissingNode {
            path: path.join("/"),
        })?;

        if let Some(text_node) = node.children().find(|n| n.is_text()) {
            let range = text_node.range();
            drop(doc);
            self.source.replace_range(range, &escaped);
        } else {
            // Self-closing or empty element: rewrite the whole element,
            // keeping its attributes.
            let range = node.range();
            let tag = node.tag_name().name().to_string();
            let attrs: String = node
                .attributes()
                .map(|a| format!(" {}=\"{}\"", a.name(), escape_xml(a.value())))
                .collect();
            drop(doc);
            self.source
                .replace_range(range, &format!("<{tag}{attrs}>{escaped}</{tag}>"));
        }
        Ok(())
    }

    /// Replace the whole element at `path` with pre-rendered XML.
    pub fn replace_element(&mut self, path: &[&str], rendered: &str) -> Result<()> {
        let doc = roxmltree::Document::parse(&self.source)?;
        let node = find_element(&doc, path).ok_or_else(|| KeilError::MissingNode {
            path: path.join("/"),
        })?;
        let range = node.range();
        drop(doc);
        self.source.replace_range(range, rendered);
        Ok(())
    }
}

/// Descend from the root element through the first matching child per
/// path step.
pub fn find_element<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
    path: &[&str],
) -> Option<roxmltree::Node<'a, 'input>> {
    let mut node = doc.root_element();
    for tag in path {
        node = node
            .children()
            .find(|n| n.is_element() && n.tag_name().name() == *tag)?;
    }
    Some(node)
}

/// Escape text for XML element content and attribute values.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Incremental renderer for rebuilt XML subtrees (two-space indent).
#[derive(Debug)]
pub struct XmlRender {
    buf: String,
    depth: usize,
}

impl XmlRender {
    /// Start rendering at the given indent depth.
    pub fn new(depth: usize) -> Self {
        XmlRender {
            buf: String::new(),
            depth,
        }
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.buf.push_str("  ");
        }
    }

    /// Open `<tag>` and increase the depth.
    pub fn open(&mut self, tag: &str) {
        self.indent();
        self.buf.push('<');
        self.buf.push_str(tag);
        self.buf.push_str(">\n");
        self.depth += 1;
    }

    /// Decrease the depth and close `</tag>`.
    pub fn close(&mut self, tag: &str) {
        self.depth -= 1;
        self.indent();
        self.buf.push_str("</");
        self.buf.push_str(tag);
        self.buf.push_str(">\n");
    }

    /// Emit `<tag>value</tag>` on one line.
    pub fn leaf(&mut self, tag: &str, value: &str) {
        self.indent();
        self.buf.push('<');
        self.buf.push_str(tag);
        self.buf.push('>');
        self.buf.push_str(&escape_xml(value));
        self.buf.push_str("</");
        self.buf.push_str(tag);
        self.buf.push_str(">\n");
    }

    /// The rendered subtree, without the trailing newline.
    pub fn finish(mut self) -> String {
        if self.buf.ends_with('\n') {
            self.buf.pop();
        }
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "<?xml version=\"1.0\"?>\n<Project>\n  <!-- vendor comment -->\n  <Targets>\n    <Target>\n      <TargetName>Old</TargetName>\n      <Device/>\n    </Target>\n  </Targets>\n  <Unknown keep=\"1\">opaque</Unknown>\n</Project>\n";

    #[test]
    fn read_text_walks_the_path() {
        let doc = XmlDocument::parse(SAMPLE).unwrap();
        assert_eq!(
            doc.read_text(&["Targets", "Target", "TargetName"]).as_deref(),
            Some("Old")
        );
        assert!(doc.read_text(&["Targets", "Nope"]).is_none());
    }

    #[test]
    fn set_text_preserves_surrounding_structure() {
        let mut doc = XmlDocument::parse(SAMPLE).unwrap();
        doc.set_text(&["Targets", "Target", "TargetName"], "New").unwrap();
        assert!(doc.source().contains("<TargetName>New</TargetName>"));
        // Comments and uninspected elements survive untouched.
        assert!(doc.source().contains("<!-- vendor comment -->"));
        assert!(doc.source().contains("<Unknown keep=\"1\">opaque</Unknown>"));
    }

    #[test]
    fn set_text_rewrites_self_closing_elements() {
        let mut doc = XmlDocument::parse(SAMPLE).unwrap();
        doc.set_text(&["Targets", "Target", "Device"], "STM32F103C8")
            .unwrap();
        assert!(doc.source().contains("<Device>STM32F103C8</Device>"));
    }

    #[test]
    fn set_text_escapes_values() {
        let mut doc = XmlDocument::parse(SAMPLE).unwrap();
        doc.set_text(&["Targets", "Target", "TargetName"], "a<b&c")
            .unwrap();
        assert!(doc.source().contains("<TargetName>a&lt;b&amp;c</TargetName>"));
        // Still parseable afterwards.
        XmlDocument::parse(doc.source()).unwrap();
    }

    #[test]
    fn missing_node_is_reported() {
        let mut doc = XmlDocument::parse(SAMPLE).unwrap();
        let err = doc.set_text(&["Targets", "Ghost"], "x").unwrap_err();
        assert!(matches!(err, KeilError::MissingNode { .. }));
    }

    #[test]
    fn replace_element_swaps_the_subtree() {
        let mut doc = XmlDocument::parse(SAMPLE).unwrap();
        let mut render = XmlRender::new(1);
        render.open("Targets");
        render.leaf("Stub", "1");
        render.close("Targets");
        doc.replace_element(&["Targets"], render.finish().trim_start())
            .unwrap();
        assert!(doc.source().contains("<Stub>1</Stub>"));
        assert!(!doc.source().contains("TargetName"));
        XmlDocument::parse(doc.source()).unwrap();
    }

    #[test]
    fn render_indents_by_depth() {
        let mut render = XmlRender::new(0);
        render.open("Groups");
        render.open("Group");
        render.leaf("GroupName", "src");
        render.close("Group");
        render.close("Groups");
        let text = render.finish();
        assert_eq!(
            text,
            "<Groups>\n  <Group>\n    <GroupName>src</GroupName>\n  </Group>\n</Groups>"
        );
    }
}
