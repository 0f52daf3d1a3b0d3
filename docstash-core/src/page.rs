//! Pagination over materialized query results.

use serde::{Deserialize, Serialize};

/// A single page of results.
///
/// # Example
///
/// ```ignore
/// use docstash::page::PaginationParams;
///
/// let page = PaginationParams::new(2, 10).paginate((1..=25).collect::<Vec<_>>());
///
/// assert_eq!(page.items.first(), Some(&11));
/// assert_eq!(page.count, 25);
/// assert_eq!(page.next_page, Some(3));
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The items contained in this page.
    pub items: Vec<T>,
    /// Total count of items across all pages.
    pub count: usize,
    /// The next page number, if more pages exist.
    pub next_page: Option<usize>,
    /// The previous page number, if this is not the first page.
    pub previous_page: Option<usize>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            count: 0,
            next_page: None,
            previous_page: None,
        }
    }
}

/// Which page to retrieve and how many items it holds. Pages are 1-indexed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PaginationParams {
    /// The page number (1-indexed).
    pub page: usize,
    /// Number of items per page.
    pub per_page: usize,
}

impl PaginationParams {
    /// Creates new pagination parameters. A page number of zero is treated as page one.
    pub fn new(page: usize, per_page: usize) -> Self {
        Self { page: page.max(1), per_page }
    }

    /// Number of items to skip before this page starts.
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    /// Cuts this page out of `items`.
    ///
    /// `count` always reports the full length of `items`, even when the
    /// requested page lies beyond the end.
    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let count = items.len();
        let offset = self.offset();

        if offset >= count || self.per_page == 0 {
            return Page { count, ..Page::default() };
        }

        let end = offset.saturating_add(self.per_page).min(count);
        let items = items
            .into_iter()
            .skip(offset)
            .take(end - offset)
            .collect();

        Page {
            items,
            count,
            next_page: (end < count).then(|| self.page + 1),
            previous_page: (self.page > 1).then(|| self.page - 1),
        }
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 1, per_page: 10 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_page_links_both_ways() {
        let page = PaginationParams::new(2, 10).paginate((1..=100).collect::<Vec<_>>());

        assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.count, 100);
        assert_eq!(page.next_page, Some(3));
        assert_eq!(page.previous_page, Some(1));
    }

    #[test]
    fn last_partial_page_has_no_next() {
        let page = PaginationParams::new(3, 10).paginate((1..=25).collect::<Vec<_>>());

        assert_eq!(page.items, (21..=25).collect::<Vec<_>>());
        assert_eq!(page.next_page, None);
    }

    #[test]
    fn page_past_end_is_empty() {
        let page = PaginationParams::new(9, 10).paginate(vec![1, 2, 3]);

        assert!(page.items.is_empty());
        assert_eq!(page.count, 3);
    }
}
