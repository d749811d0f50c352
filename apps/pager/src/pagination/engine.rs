//! Pagination Engine — greedy page packing with one level of block splitting.
//!
//! # Algorithm
//! - Top-level blocks are placed whole while they fit.
//! - A childless block that does not fit starts a fresh page and is placed there regardless
//!   of its size (accepted overflow).
//! - A block with children is split: its children are walked with a cursor and grouped into
//!   partial containers, each a copy of the block's wrapper. Children are never split further.
//! - A partial container that would hold nothing, or only a heading, is never left at the
//!   bottom of a page: the page is closed and the run is reprocessed on a fresh one. At the
//!   very top of a page there is nowhere better to go, so the child is forced in instead.
//!
//! The pass is synchronous and holds no state between calls. It raises no errors; every
//! tree produces some [`PaginationResult`].

use tracing::{debug, trace};

use crate::pagination::block::{BoxMetrics, ContentBlock, WrapperTemplate};
use crate::pagination::capacity::PageCapacity;
use crate::pagination::fragment::{Fragment, FragmentKind, Page, PaginationResult};
use crate::pagination::metrics::{BoxMetricsProvider, EmbeddedMetrics};

// ────────────────────────────────────────────────────────────────────────────
// Public entry points
// ────────────────────────────────────────────────────────────────────────────

/// Paginates the children of `root` using the metrics embedded in the tree.
pub fn paginate(root: &ContentBlock, capacity: PageCapacity) -> PaginationResult {
    paginate_with(root, capacity, &EmbeddedMetrics)
}

/// Paginates the children of `root`, asking `provider` for every block's geometry.
pub fn paginate_with<P>(root: &ContentBlock, capacity: PageCapacity, provider: &P) -> PaginationResult
where
    P: BoxMetricsProvider + ?Sized,
{
    let mut pass = Pass::new(capacity, provider);

    for (index, block) in root.children.iter().enumerate() {
        let metrics = pass.measure(block);
        let height = metrics.outer_height();

        if pass.fits(height) {
            pass.place(whole_fragment(block, index, height));
            continue;
        }

        if block.children.is_empty() {
            trace!(block = index, height, "atomic block exceeds remaining space");
            pass.break_page();
            pass.place(whole_fragment(block, index, height));
            continue;
        }

        pass.split(block, index, &metrics);
    }

    let result = pass.finish();
    debug!(
        pages = result.page_count(),
        unmeasured = result.unmeasured_blocks,
        capacity = capacity.get(),
        "pagination pass complete"
    );
    result
}

// ────────────────────────────────────────────────────────────────────────────
// Pass state
// ────────────────────────────────────────────────────────────────────────────

struct Pass<'a, P: ?Sized> {
    capacity: PageCapacity,
    provider: &'a P,
    pages: Vec<Page>,
    current: Vec<Fragment>,
    used_height: f32,
    unmeasured_blocks: usize,
}

impl<'a, P> Pass<'a, P>
where
    P: BoxMetricsProvider + ?Sized,
{
    fn new(capacity: PageCapacity, provider: &'a P) -> Self {
        Self {
            capacity,
            provider,
            pages: Vec::new(),
            current: Vec::new(),
            used_height: 0.0,
            unmeasured_blocks: 0,
        }
    }

    fn limit(&self) -> f32 {
        self.capacity.get()
    }

    fn measure(&mut self, block: &ContentBlock) -> BoxMetrics {
        let metrics = self.provider.box_metrics(block);
        if metrics.outer_height() == 0.0 {
            self.unmeasured_blocks += 1;
            debug!(tag = %block.tag, "block reports zero height; using it as measured");
        }
        metrics
    }

    fn fits(&self, height: f32) -> bool {
        self.used_height + height <= self.limit()
    }

    fn place(&mut self, fragment: Fragment) {
        self.used_height += fragment.height;
        self.current.push(fragment);
    }

    /// Closes the current page (if it holds anything) and starts an empty one.
    fn break_page(&mut self) {
        if !self.current.is_empty() {
            let fragments = std::mem::take(&mut self.current);
            self.pages.push(Page {
                fragments,
                used_height: self.used_height,
                overflowed: self.used_height > self.limit(),
            });
        }
        self.used_height = 0.0;
    }

    /// Distributes the children of an oversized block over as many pages as needed.
    ///
    /// The in-progress partial container is always `children[part_start..cursor]`, so
    /// rewinding is just moving the cursor back to `part_start`.
    fn split(&mut self, block: &ContentBlock, index: usize, metrics: &BoxMetrics) {
        let template = WrapperTemplate::of(block);
        let children = &block.children;
        let heights: Vec<f32> = children
            .iter()
            .map(|child| self.measure(child).outer_height())
            .collect();
        let overhead = metrics.wrapper_overhead();

        let mut part_start = 0;
        let mut part_height = metrics.margin_top + overhead;
        let mut cursor = 0;

        while cursor < children.len() {
            let child_height = heights[cursor];
            if self.used_height + part_height + child_height <= self.limit() {
                part_height += child_height;
                cursor += 1;
                continue;
            }

            let part = &children[part_start..cursor];
            let start_of_page = self.used_height == 0.0;
            let orphan_title = part.len() == 1 && part[0].is_heading();

            if part.is_empty() || orphan_title {
                if start_of_page {
                    // Nothing better can follow at the top of a page.
                    trace!(block = index, child = cursor, "forcing child onto page");
                    part_height += child_height;
                    cursor += 1;
                    continue;
                }
                trace!(block = index, child = cursor, orphan_title, "deferring run to next page");
                self.break_page();
                cursor = part_start;
            } else {
                self.place(partial_fragment(
                    &template,
                    children,
                    index,
                    part_start..cursor,
                    part_height,
                ));
                self.break_page();
            }

            part_start = cursor;
            part_height = overhead;
        }

        if part_start < cursor {
            self.place(partial_fragment(
                &template,
                children,
                index,
                part_start..cursor,
                part_height + metrics.margin_bottom,
            ));
        }
    }

    fn finish(mut self) -> PaginationResult {
        self.break_page();
        PaginationResult {
            pages: self.pages,
            capacity: self.capacity,
            unmeasured_blocks: self.unmeasured_blocks,
        }
    }
}

fn whole_fragment(block: &ContentBlock, index: usize, height: f32) -> Fragment {
    Fragment {
        markup: block.to_markup(),
        block: index,
        kind: FragmentKind::Whole,
        height,
    }
}

fn partial_fragment(
    template: &WrapperTemplate,
    children: &[ContentBlock],
    index: usize,
    run: std::ops::Range<usize>,
    height: f32,
) -> Fragment {
    Fragment {
        markup: template.render(children, run.clone()),
        block: index,
        kind: FragmentKind::Partial { children: run },
        height,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn capacity(px: f32) -> PageCapacity {
        PageCapacity::new(px).unwrap()
    }

    fn leaf(tag: &str, name: &str, height: f32) -> ContentBlock {
        ContentBlock::new(tag)
            .with_content(name)
            .with_metrics(BoxMetrics::with_height(height))
    }

    fn para(name: &str, height: f32) -> ContentBlock {
        leaf("p", name, height)
    }

    fn heading(name: &str, height: f32) -> ContentBlock {
        leaf("h2", name, height)
    }

    /// A section whose rendered height is the sum of its children.
    fn section(children: Vec<ContentBlock>) -> ContentBlock {
        let height = children.iter().map(|c| c.metrics.outer_height()).sum();
        ContentBlock::new("section")
            .with_metrics(BoxMetrics::with_height(height))
            .with_children(children)
    }

    fn root(children: Vec<ContentBlock>) -> ContentBlock {
        ContentBlock::new("div").with_children(children)
    }

    fn markup(result: PaginationResult) -> Vec<Vec<String>> {
        result.into_markup()
    }

    /// Rebuilds the source children's markup from the fragments, unwrapping partials.
    fn reassemble(doc: &ContentBlock, result: &PaginationResult) -> Vec<String> {
        let mut out = Vec::new();
        for fragment in result.fragments() {
            let block = &doc.children[fragment.block];
            match &fragment.kind {
                FragmentKind::Whole => out.push(block.to_markup()),
                FragmentKind::Partial { children } => {
                    for child in &block.children[children.clone()] {
                        out.push(child.to_markup());
                    }
                }
            }
        }
        out
    }

    /// The source in the same granularity as `reassemble`: split blocks expand to children.
    fn expected_units(doc: &ContentBlock, result: &PaginationResult) -> Vec<String> {
        let split: Vec<usize> = result
            .fragments()
            .filter(|f| f.is_partial())
            .map(|f| f.block)
            .collect();
        doc.children
            .iter()
            .enumerate()
            .flat_map(|(i, block)| {
                if split.contains(&i) {
                    block.children.iter().map(|c| c.to_markup()).collect()
                } else {
                    vec![block.to_markup()]
                }
            })
            .collect()
    }

    // ── top-level placement ─────────────────────────────────────────────────

    #[test]
    fn test_empty_root_produces_no_pages() {
        let result = paginate(&root(vec![]), capacity(1000.0));
        assert!(result.is_empty());
        assert_eq!(result.unmeasured_blocks, 0);
    }

    #[test]
    fn test_whole_blocks_pack_greedily() {
        let doc = root(vec![
            para("B1", 400.0),
            para("B2", 400.0),
            para("B3", 400.0),
        ]);
        let result = paginate(&doc, capacity(1000.0));
        assert_eq!(
            markup(result),
            vec![
                vec!["<p>B1</p>".to_string(), "<p>B2</p>".to_string()],
                vec!["<p>B3</p>".to_string()],
            ]
        );
    }

    #[test]
    fn test_exact_fit_stays_on_page() {
        let doc = root(vec![para("a", 600.0), para("b", 400.0)]);
        let result = paginate(&doc, capacity(1000.0));
        assert_eq!(result.page_count(), 1);
        assert_eq!(result.pages[0].used_height, 1000.0);
        assert!(!result.pages[0].overflowed);
    }

    #[test]
    fn test_margins_count_towards_height() {
        let spaced = ContentBlock::new("p").with_metrics(BoxMetrics {
            height: 400.0,
            margin_top: 60.0,
            margin_bottom: 60.0,
            ..BoxMetrics::default()
        });
        let doc = root(vec![spaced.clone(), spaced]);
        // 520 + 520 > 1000
        assert_eq!(paginate(&doc, capacity(1000.0)).page_count(), 2);
    }

    #[test]
    fn test_oversized_atomic_block_is_placed_alone() {
        let doc = root(vec![para("small", 100.0), para("huge", 2500.0), para("after", 100.0)]);
        let result = paginate(&doc, capacity(1000.0));

        assert_eq!(result.page_count(), 3);
        assert_eq!(result.pages[1].markup(), vec!["<p>huge</p>".to_string()]);
        assert!(result.pages[1].overflowed);
        assert!(!result.pages[0].overflowed);
        assert_eq!(result.pages[2].markup(), vec!["<p>after</p>".to_string()]);
    }

    #[test]
    fn test_oversized_atomic_block_first_on_document() {
        let doc = root(vec![para("huge", 2500.0)]);
        let result = paginate(&doc, capacity(1000.0));
        assert_eq!(result.page_count(), 1);
        assert!(result.pages[0].overflowed);
    }

    // ── splitting ───────────────────────────────────────────────────────────

    #[test]
    fn test_split_without_orphan() {
        let doc = root(vec![section(vec![
            heading("Experience", 50.0),
            para("one", 500.0),
            para("two", 500.0),
        ])]);
        let result = paginate(&doc, capacity(600.0));

        assert_eq!(
            markup(result),
            vec![
                vec!["<section><h2>Experience</h2><p>one</p></section>".to_string()],
                vec!["<section><p>two</p></section>".to_string()],
            ]
        );
    }

    #[test]
    fn test_forced_fit_at_top_of_page() {
        let doc = root(vec![section(vec![heading("Skills", 5.0), para("body", 500.0)])]);
        let result = paginate(&doc, capacity(60.0));

        assert_eq!(result.page_count(), 1);
        assert_eq!(
            result.pages[0].markup(),
            vec!["<section><h2>Skills</h2><p>body</p></section>".to_string()]
        );
        assert!(result.pages[0].overflowed);
    }

    #[test]
    fn test_orphan_heading_carried_to_next_page() {
        let doc = root(vec![
            para("prior", 550.0),
            section(vec![heading("Projects", 5.0), para("body", 500.0)]),
        ]);
        let result = paginate(&doc, capacity(600.0));

        assert_eq!(
            markup(result),
            vec![
                vec!["<p>prior</p>".to_string()],
                vec!["<section><h2>Projects</h2><p>body</p></section>".to_string()],
            ]
        );
    }

    #[test]
    fn test_empty_part_defers_first_child_to_next_page() {
        let doc = root(vec![
            para("prior", 550.0),
            section(vec![para("a", 100.0), para("b", 100.0)]),
        ]);
        let result = paginate(&doc, capacity(600.0));

        assert_eq!(result.page_count(), 2);
        assert_eq!(result.pages[0].markup(), vec!["<p>prior</p>".to_string()]);
        assert_eq!(
            result.pages[1].markup(),
            vec!["<section><p>a</p><p>b</p></section>".to_string()]
        );
    }

    #[test]
    fn test_substantive_part_is_sealed_after_existing_content() {
        let doc = root(vec![
            para("prior", 300.0),
            section(vec![para("a", 200.0), para("b", 200.0), para("c", 200.0)]),
        ]);
        let result = paginate(&doc, capacity(600.0));

        assert_eq!(
            markup(result),
            vec![
                vec!["<p>prior</p>".to_string(), "<section><p>a</p></section>".to_string()],
                vec!["<section><p>b</p><p>c</p></section>".to_string()],
            ]
        );
    }

    #[test]
    fn test_heading_with_content_is_not_an_orphan() {
        // [heading, para] is substantive, so it closes the page normally.
        let doc = root(vec![section(vec![
            heading("Education", 20.0),
            para("a", 300.0),
            para("b", 400.0),
        ])]);
        let result = paginate(&doc, capacity(600.0));

        assert_eq!(result.page_count(), 2);
        assert_eq!(
            result.pages[0].markup(),
            vec!["<section><h2>Education</h2><p>a</p></section>".to_string()]
        );
    }

    #[test]
    fn test_split_is_single_level() {
        let nested = ContentBlock::new("div")
            .with_metrics(BoxMetrics::with_height(900.0))
            .with_children(vec![para("x", 450.0), para("y", 450.0)]);
        let doc = root(vec![section(vec![para("a", 100.0), nested, para("b", 100.0)])]);
        let result = paginate(&doc, capacity(500.0));

        // The nested div overflows on its own page but is never decomposed.
        let nested_pages: Vec<&Page> = result
            .pages
            .iter()
            .filter(|p| p.fragments.iter().any(|f| f.markup.contains("<div>")))
            .collect();
        assert_eq!(nested_pages.len(), 1);
        assert!(nested_pages[0].fragments[0]
            .markup
            .contains("<div><p>x</p><p>y</p></div>"));
        assert!(nested_pages[0].overflowed);
    }

    #[test]
    fn test_wrapper_overhead_repeats_on_every_part() {
        let block = ContentBlock::new("section")
            .with_metrics(BoxMetrics {
                height: 700.0,
                margin_top: 20.0,
                margin_bottom: 30.0,
                padding_top: 10.0,
                padding_bottom: 10.0,
                border_top_width: 0.0,
                border_bottom_width: 0.0,
            })
            .with_children(vec![para("a", 300.0), para("b", 300.0)]);
        let result = paginate(&root(vec![block]), capacity(600.0));

        assert_eq!(result.page_count(), 2);
        // margin_top + padding + a
        assert_eq!(result.pages[0].used_height, 340.0);
        // padding + b + margin_bottom
        assert_eq!(result.pages[1].used_height, 350.0);
    }

    #[test]
    fn test_trailing_margin_of_split_block_can_overflow() {
        let block = ContentBlock::new("section")
            .with_metrics(BoxMetrics {
                height: 600.0,
                margin_bottom: 50.0,
                ..BoxMetrics::default()
            })
            .with_children(vec![para("a", 300.0), para("b", 300.0)]);
        let result = paginate(&root(vec![block]), capacity(600.0));

        assert_eq!(result.page_count(), 1);
        assert_eq!(result.pages[0].used_height, 650.0);
        assert!(result.pages[0].overflowed);
    }

    #[test]
    fn test_split_void_tag_keeps_its_content_and_children() {
        let figure = ContentBlock::new("img")
            .with_content("caption")
            .with_metrics(BoxMetrics::with_height(200.0))
            .with_children(vec![para("child", 50.0)]);
        let doc = root(vec![figure]);
        let result = paginate(&doc, capacity(100.0));

        assert_eq!(
            markup(result),
            vec![vec!["<img>caption<p>child</p></img>".to_string()]]
        );
    }

    #[test]
    fn test_split_parts_keep_wrapper_attributes() {
        let block = ContentBlock::new("section")
            .with_attribute("class", "resume-section")
            .with_metrics(BoxMetrics::with_height(1200.0))
            .with_children(vec![para("a", 600.0), para("b", 600.0)]);
        let result = paginate(&root(vec![block]), capacity(600.0));

        for page in &result.pages {
            assert!(page.fragments[0]
                .markup
                .starts_with(r#"<section class="resume-section">"#));
        }
        assert_eq!(result.page_count(), 2);
    }

    #[test]
    fn test_content_after_split_continues_on_last_page() {
        let doc = root(vec![
            section(vec![para("a", 400.0), para("b", 400.0)]),
            para("tail", 100.0),
        ]);
        let result = paginate(&doc, capacity(600.0));

        assert_eq!(result.page_count(), 2);
        assert_eq!(
            result.pages[1].markup(),
            vec!["<section><p>b</p></section>".to_string(), "<p>tail</p>".to_string()]
        );
        assert_eq!(result.pages[1].used_height, 500.0);
    }

    #[test]
    fn test_every_child_oversized_terminates() {
        let doc = root(vec![section(vec![
            heading("Huge", 900.0),
            para("a", 900.0),
            para("b", 900.0),
        ])]);
        let result = paginate(&doc, capacity(100.0));

        assert!(result.page_count() >= 2);
        assert_eq!(reassemble(&doc, &result), expected_units(&doc, &result));
    }

    // ── properties over a mixed document ────────────────────────────────────

    fn resume_document() -> ContentBlock {
        root(vec![
            leaf("header", "Ada Lovelace", 120.0),
            section(vec![
                heading("Experience", 30.0),
                para("role-1", 220.0),
                para("role-2", 260.0),
                para("role-3", 240.0),
                para("role-4", 180.0),
            ]),
            section(vec![
                heading("Projects", 30.0),
                para("proj-1", 300.0),
                para("proj-2", 340.0),
            ]),
            leaf("hr", "", 2.0),
            section(vec![heading("Education", 30.0), para("degree", 120.0)]),
            section(vec![heading("Skills", 30.0), para("skills", 1400.0)]),
            para("footer", 40.0),
        ])
    }

    #[test]
    fn test_completeness_and_order_preserved() {
        let doc = resume_document();
        for px in [300.0, 450.0, 600.0, 971.0, 5000.0] {
            let result = paginate(&doc, capacity(px));
            assert_eq!(
                reassemble(&doc, &result),
                expected_units(&doc, &result),
                "content mismatch at capacity {px}"
            );
        }
    }

    #[test]
    fn test_only_oversized_content_overflows() {
        let doc = resume_document();
        // At these capacities every heading plus its first entry fits, so only the
        // 1400px skills paragraph can force a page past capacity.
        for px in [450.0, 600.0, 971.0] {
            let result = paginate(&doc, capacity(px));
            let overflowing: Vec<&Page> = result.pages.iter().filter(|p| p.overflowed).collect();
            assert_eq!(overflowing.len(), 1, "at capacity {px}");
            assert!(overflowing[0]
                .fragments
                .iter()
                .any(|f| f.markup.contains("<p>skills</p>")));
            for page in result.pages.iter().filter(|p| !p.overflowed) {
                assert!(page.used_height <= px);
            }
        }
    }

    #[test]
    fn test_no_page_ends_with_orphan_heading() {
        let doc = resume_document();
        for px in [300.0, 450.0, 600.0, 971.0] {
            let result = paginate(&doc, capacity(px));
            for page in &result.pages {
                let Some(last) = page.fragments.last() else {
                    continue;
                };
                if let FragmentKind::Partial { children } = &last.kind {
                    let block = &doc.children[last.block];
                    let lone_heading =
                        children.len() == 1 && block.children[children.start].is_heading();
                    assert!(
                        !lone_heading || page.fragments.len() == 1,
                        "orphan heading at capacity {px}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_pages_are_never_empty() {
        let result = paginate(&resume_document(), capacity(300.0));
        assert!(result.pages.iter().all(|p| !p.fragments.is_empty()));
    }

    #[test]
    fn test_zero_height_blocks_are_counted_and_packed() {
        let doc = root(vec![para("a", 0.0), para("b", 0.0), para("c", 10.0)]);
        let result = paginate(&doc, capacity(100.0));
        assert_eq!(result.page_count(), 1);
        assert_eq!(result.unmeasured_blocks, 2);
    }

    #[test]
    fn test_custom_provider_overrides_embedded_metrics() {
        let doc = root(vec![para("a", 10.0), para("b", 10.0)]);
        let inflated = |_: &ContentBlock| BoxMetrics::with_height(80.0);
        let result = paginate_with(&doc, capacity(100.0), &inflated);
        assert_eq!(result.page_count(), 2);
    }

    #[test]
    fn test_repeated_calls_are_independent() {
        let doc = resume_document();
        let first = paginate(&doc, capacity(600.0));
        let second = paginate(&doc, capacity(600.0));
        assert_eq!(first, second);
    }
}
