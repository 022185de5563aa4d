use crate::Sort;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// One-based pagination window.
///
/// Both numbers are at least 1; the constructor clamps zero up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageSpec {
    page: u32,
    page_size: u32,
}

impl PageSpec {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Index of the first row in the window.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.page_size as usize
    }

    pub fn limit(&self) -> usize {
        self.page_size as usize
    }

    /// Inclusive row range `(from, to)` of the window.
    pub fn range(&self) -> (usize, usize) {
        let from = self.offset();
        (from, from + self.limit() - 1)
    }

    /// Number of pages needed for `total` rows.
    pub fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.limit())
    }

    /// Same page size, first page. Used after the filter changes.
    pub fn first(&self) -> Self {
        Self::new(1, self.page_size)
    }

    pub fn next(&self) -> Self {
        Self::new(self.page.saturating_add(1), self.page_size)
    }

    pub fn previous(&self) -> Self {
        Self::new(self.page.saturating_sub(1), self.page_size)
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// Snapshot of filter, sort and pagination driving one query execution.
///
/// Structural equality is the dedup key: equal descriptors are not re-executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor<F, S> {
    pub filter: F,
    pub sort: Sort<S>,
    pub page: PageSpec,
}

/// Result of a paginated query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult<T> {
    pub rows: Vec<T>,
    /// Matching rows across all pages.
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: usize,
}

impl<T> QueryResult<T> {
    pub fn new(rows: Vec<T>, total: usize, page: PageSpec) -> Self {
        Self {
            rows,
            total,
            page: page.page(),
            page_size: page.page_size(),
            total_pages: page.total_pages(total),
        }
    }

    pub fn empty(page: PageSpec) -> Self {
        Self::new(Vec::new(), 0, page)
    }

    pub fn has_next(&self) -> bool {
        (self.page as usize) < self.total_pages
    }
}
