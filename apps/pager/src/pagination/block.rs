//! Content blocks as measured by the external layout pass, plus their markup serialization.
//!
//! A block is immutable input to the engine. Whole blocks serialize with all descendants;
//! split blocks are re-emitted through a [`WrapperTemplate`] that carries only the block's
//! own tag and attributes.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Elements that never take inner content or a closing tag.
const VOID_TAGS: [&str; 6] = ["br", "hr", "img", "input", "link", "meta"];

/// Section-title kinds recognised for orphan avoidance.
const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

// ────────────────────────────────────────────────────────────────────────────
// Box metrics
// ────────────────────────────────────────────────────────────────────────────

/// Rendered geometry of one block, in CSS pixels.
///
/// Every field defaults to zero so a measurement payload may omit what it does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxMetrics {
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub padding_top: f32,
    pub padding_bottom: f32,
    pub border_top_width: f32,
    pub border_bottom_width: f32,
}

impl BoxMetrics {
    /// Metrics for a bare box with no margins, padding or borders.
    #[cfg(test)]
    pub fn with_height(height: f32) -> Self {
        Self {
            height,
            ..Self::default()
        }
    }

    /// Rendered height plus vertical margins: the space the block consumes on a page.
    pub fn outer_height(&self) -> f32 {
        self.height + self.margin_top + self.margin_bottom
    }

    /// Vertical padding and borders that every partial container of this block repeats.
    pub fn wrapper_overhead(&self) -> f32 {
        self.padding_top + self.padding_bottom + self.border_top_width + self.border_bottom_width
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Content block
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("<{tag}> is a void element and cannot hold content or children")]
    VoidWithContent { tag: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// One node of the content tree.
///
/// `content` is the block's own markup (excluding children) and is emitted verbatim.
/// Child order is significant and never altered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub tag: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub metrics: BoxMetrics,
    #[serde(default)]
    pub children: Vec<ContentBlock>,
}

impl ContentBlock {
    /// True for section titles (`h1`..`h6`, case-insensitive).
    pub fn is_heading(&self) -> bool {
        HEADING_TAGS
            .iter()
            .any(|tag| self.tag.eq_ignore_ascii_case(tag))
    }

    fn is_void_tag(&self) -> bool {
        VOID_TAGS.iter().any(|tag| self.tag.eq_ignore_ascii_case(tag))
    }

    /// Rejects void elements (`img`, `hr`, ...) that carry content or children anywhere
    /// in the tree; such blocks have no faithful markup form.
    pub fn validate(&self) -> Result<(), BlockError> {
        if self.is_void_tag() && (!self.content.is_empty() || !self.children.is_empty()) {
            return Err(BlockError::VoidWithContent {
                tag: self.tag.clone(),
            });
        }
        self.children.iter().try_for_each(ContentBlock::validate)
    }

    /// Serializes the block with all of its descendants.
    ///
    /// A void tag only self-closes when it is empty; otherwise it is written like any
    /// container, matching [`WrapperTemplate::render`], so nothing is dropped.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        write_open_tag(out, &self.tag, &self.attributes);
        if self.is_void_tag() && self.content.is_empty() && self.children.is_empty() {
            return;
        }
        out.push_str(&self.content);
        for child in &self.children {
            child.write_markup(out);
        }
        write_close_tag(out, &self.tag);
    }
}

#[cfg(test)]
impl ContentBlock {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            content: String::new(),
            metrics: BoxMetrics::default(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_metrics(mut self, metrics: BoxMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_children(mut self, children: Vec<ContentBlock>) -> Self {
        self.children = children;
        self
    }
}

fn write_open_tag(out: &mut String, tag: &str, attributes: &[Attribute]) {
    out.push('<');
    out.push_str(tag);
    for attr in attributes {
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(&attr.value));
        out.push('"');
    }
    out.push('>');
}

fn write_close_tag(out: &mut String, tag: &str) {
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

// ────────────────────────────────────────────────────────────────────────────
// Wrapper template
// ────────────────────────────────────────────────────────────────────────────

/// Structural copy of a split block: tag and attributes only, never its children.
///
/// Captured once per split block; each partial container re-injects a contiguous run of
/// the block's children. The block's own `content` belongs to the run that starts at the
/// first child, so it is emitted exactly once across all partial containers.
#[derive(Debug, Clone, PartialEq)]
pub struct WrapperTemplate {
    tag: String,
    attributes: Vec<Attribute>,
    leading_content: String,
}

impl WrapperTemplate {
    pub fn of(block: &ContentBlock) -> Self {
        Self {
            tag: block.tag.clone(),
            attributes: block.attributes.clone(),
            leading_content: block.content.clone(),
        }
    }

    /// Builds the partial container holding `children[run]`.
    pub fn render(&self, children: &[ContentBlock], run: Range<usize>) -> String {
        let mut out = String::new();
        write_open_tag(&mut out, &self.tag, &self.attributes);
        if run.start == 0 {
            out.push_str(&self.leading_content);
        }
        for child in &children[run] {
            child.write_markup(&mut out);
        }
        write_close_tag(&mut out, &self.tag);
        out
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
