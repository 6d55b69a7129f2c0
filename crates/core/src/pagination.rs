//! Offset pagination terminated by an empty page
//!
//! Pure state machine for walking a paginated collection: request page
//! `1, 2, 3, ...` with a fixed page size and stop at the first page that comes
//! back empty. The shell performs the requests; this module only decides what
//! to ask for next.
//!
//! There is no upper bound on the number of pages. A server that never
//! returns an empty page keeps the cursor going indefinitely.

/// Parameters for a single page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    /// 1-indexed page number.
    pub page: u32,
    pub per_page: u32,
}

/// What the cursor does after a page has been received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStep {
    /// The page had records; request the next one.
    Continue,
    /// The page was empty; the collection is complete.
    Done,
}

/// Cursor over an empty-page-terminated collection
#[derive(Debug, Clone)]
pub struct PageCursor {
    per_page: u32,
    next_page: u32,
    done: bool,
    received: usize,
}

impl PageCursor {
    pub fn new(per_page: u32) -> Self {
        Self {
            per_page,
            next_page: 1,
            done: false,
            received: 0,
        }
    }

    /// The next page to request, or `None` once an empty page was seen.
    pub fn next_query(&self) -> Option<PageQuery> {
        if self.done {
            return None;
        }

        Some(PageQuery {
            page: self.next_page,
            per_page: self.per_page,
        })
    }

    /// Record the size of the page just fetched.
    pub fn advance(&mut self, records: usize) -> PageStep {
        if self.done {
            return PageStep::Done;
        }

        if records == 0 {
            self.done = true;
            return PageStep::Done;
        }

        self.received += records;
        self.next_page += 1;
        PageStep::Continue
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Total records received across all non-empty pages.
    pub fn received(&self) -> usize {
        self.received
    }
}
