//! Pagination output: fragments grouped into pages.

use std::ops::Range;

use serde::Serialize;

use crate::pagination::capacity::PageCapacity;

/// What part of a top-level block a fragment carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FragmentKind {
    /// The block with all of its descendants.
    Whole,
    /// A copy of the block's wrapper around `children` (a contiguous run of its children).
    Partial { children: Range<usize> },
}

/// One serialized unit of page content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    pub markup: String,
    /// Index of the source block among the root's children.
    pub block: usize,
    pub kind: FragmentKind,
    /// Height charged against the page for this fragment.
    pub height: f32,
}

#[cfg(test)]
impl Fragment {
    pub fn is_partial(&self) -> bool {
        matches!(self.kind, FragmentKind::Partial { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub fragments: Vec<Fragment>,
    pub used_height: f32,
    /// Set whenever the accounted height exceeds capacity: an oversized atomic block, a
    /// force-fitted child, or the trailing bottom margin of a split block's last part.
    pub overflowed: bool,
}

impl Page {
    pub fn markup(&self) -> Vec<String> {
        self.fragments.iter().map(|f| f.markup.clone()).collect()
    }
}

/// Ordered pages produced by a single pagination pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginationResult {
    pub pages: Vec<Page>,
    pub capacity: PageCapacity,
    /// Blocks that reported a zero outer height (likely not yet laid out).
    pub unmeasured_blocks: usize,
}

impl PaginationResult {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

#[cfg(test)]
impl PaginationResult {
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Pages as plain markup strings, ready to drop into per-page containers.
    pub fn into_markup(self) -> Vec<Vec<String>> {
        self.pages
            .into_iter()
            .map(|page| page.fragments.into_iter().map(|f| f.markup).collect())
            .collect()
    }

    /// Every fragment in document order.
    pub fn fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.pages.iter().flat_map(|page| page.fragments.iter())
    }
}
