//! Page arithmetic shared by the table views and the CLI pager line.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Maximum number of page-number buttons shown at once.
pub const PAGE_WINDOW: usize = 5;

/// Default page size requested from list endpoints.
pub const DEFAULT_PER_PAGE: usize = 10;

/// One page of a server-side list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Rows on this page.
    pub items: Vec<T>,
    /// 1-based page number.
    pub page: usize,
    /// Requested page size.
    pub per_page: usize,
    /// Row count across all pages.
    pub total: usize,
    /// Page count as reported by the server, when it reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<usize>,
}

impl<T> Paginated<T> {
    /// Server page count, or `ceil(total / per_page)` when it was omitted.
    pub fn total_pages(&self) -> usize {
        self.total_pages
            .unwrap_or_else(|| total_pages(self.total, self.per_page))
    }

    /// Position and bounds of this page.
    pub fn page_info(&self) -> PageInfo {
        PageInfo {
            page: self.page.max(1),
            per_page: self.per_page,
            total: self.total,
            total_pages: self.total_pages(),
        }
    }
}

/// Position within a paginated list, detached from the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageInfo {
    /// 1-based current page.
    pub page: usize,
    /// Page size.
    pub per_page: usize,
    /// Row count.
    pub total: usize,
    /// Page count.
    pub total_pages: usize,
}

impl PageInfo {
    /// Page info computed from a row count.
    pub fn new(page: usize, per_page: usize, total: usize) -> Self {
        Self {
            page: page.max(1),
            per_page,
            total,
            total_pages: total_pages(total, per_page),
        }
    }

    /// Visible page-number buttons.
    pub fn window(&self) -> RangeInclusive<usize> {
        page_window(self.page, self.total_pages)
    }

    /// Enabled state of the boundary controls.
    pub fn controls(&self) -> PagerControls {
        PagerControls::new(self.page, self.total_pages)
    }
}

/// `ceil(total / per_page)`; a zero page size counts as one.
pub fn total_pages(total: usize, per_page: usize) -> usize {
    total.div_ceil(per_page.max(1))
}

/// Clamp a requested page into `[1, total_pages]` (an empty list still has
/// page 1).
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.max(1).min(total_pages.max(1))
}

/// At most [`PAGE_WINDOW`] page numbers centred on `current`, shifted so the
/// window never leaves `[1, total_pages]`.
pub fn page_window(current: usize, total_pages: usize) -> RangeInclusive<usize> {
    let total = total_pages.max(1);
    let current = clamp_page(current, total);
    let width = PAGE_WINDOW.min(total);
    let mut start = current.saturating_sub(PAGE_WINDOW / 2).max(1);
    if start + width - 1 > total {
        start = total + 1 - width;
    }
    start..=start + width - 1
}

/// Which pager buttons are clickable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagerControls {
    /// Jump to page 1.
    pub first: bool,
    /// Go back one page.
    pub prev: bool,
    /// Go forward one page.
    pub next: bool,
    /// Jump to the last page.
    pub last: bool,
}

impl PagerControls {
    /// Boundary buttons disable at `page <= 1` and `page >= total_pages`.
    pub fn new(page: usize, total_pages: usize) -> Self {
        let at_start = page <= 1;
        let at_end = page >= total_pages;
        Self {
            first: !at_start,
            prev: !at_start,
            next: !at_end,
            last: !at_end,
        }
    }
}

/// Rows of `page` when the whole list is already in memory.
pub fn page_slice<T>(items: &[T], page: usize, per_page: usize) -> &[T] {
    let per_page = per_page.max(1);
    let page = clamp_page(page, total_pages(items.len(), per_page));
    let start = per_page.saturating_mul(page - 1).min(items.len());
    let end = usize::min(start + per_page, items.len());
    &items[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_three_rows_make_three_pages() {
        let info = PageInfo::new(1, 10, 23);
        assert_eq!(info.total_pages, 3);
        assert_eq!(info.window().collect::<Vec<_>>(), vec![1, 2, 3]);

        for page in 1..=2 {
            assert!(PageInfo::new(page, 10, 23).controls().next);
        }
        let last = PageInfo::new(3, 10, 23).controls();
        assert!(!last.next);
        assert!(!last.last);
        assert!(last.prev);
    }

    #[test]
    fn boundary_controls_never_reach_out_of_range_pages() {
        for total in 1..8 {
            for page in 1..=total {
                let controls = PagerControls::new(page, total);
                assert_eq!(controls.prev, page > 1);
                assert_eq!(controls.first, page > 1);
                assert_eq!(controls.next, page < total);
                assert_eq!(controls.last, page < total);
            }
        }
    }

    #[test]
    fn window_is_centred_and_clamped() {
        assert_eq!(page_window(1, 20).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        assert_eq!(page_window(10, 20).collect::<Vec<_>>(), vec![8, 9, 10, 11, 12]);
        assert_eq!(page_window(20, 20).collect::<Vec<_>>(), vec![16, 17, 18, 19, 20]);
        assert_eq!(page_window(19, 20).collect::<Vec<_>>(), vec![16, 17, 18, 19, 20]);
        assert_eq!(page_window(99, 4).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(page_window(1, 0).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn recomputes_missing_total_pages_but_keeps_server_value() {
        let computed: Paginated<u8> =
            serde_json::from_str(r#"{"items":[],"page":1,"per_page":10,"total":23}"#)
                .expect("parse page");
        assert_eq!(computed.total_pages(), 3);

        let reported: Paginated<u8> = serde_json::from_str(
            r#"{"items":[],"page":1,"per_page":10,"total":23,"total_pages":4}"#,
        )
        .expect("parse page");
        assert_eq!(reported.total_pages(), 4);
    }

    #[test]
    fn zero_page_size_does_not_divide_by_zero() {
        assert_eq!(total_pages(5, 0), 5);
        assert_eq!(total_pages(0, 10), 0);
    }

    #[test]
    fn slices_in_memory_pages() {
        let rows: Vec<u32> = (1..=7).collect();
        assert_eq!(page_slice(&rows, 1, 3), &[1, 2, 3]);
        assert_eq!(page_slice(&rows, 3, 3), &[7]);
        assert_eq!(page_slice(&rows, 9, 3), &[7]);
        assert!(page_slice(&Vec::<u32>::new(), 1, 3).is_empty());
    }
}
