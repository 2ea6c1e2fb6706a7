use crate::error::RecapError;
use crate::models::{ReportPage, ReportRow};

pub const DEFAULT_PAGE_SIZE: u32 = 35;
pub const MAX_PAGE_SIZE: u32 = 200;

/// Validated paging parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    page_size: u32,
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Result<Self, RecapError> {
        if page < 1 {
            return Err(RecapError::InvalidPage(page));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(RecapError::InvalidPageSize {
                size: page_size,
                max: MAX_PAGE_SIZE,
            });
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Slices a fully built row set. Totals always describe the whole set,
    /// so a page past the end comes back empty rather than failing.
    pub fn apply(self, rows: Vec<ReportRow>) -> ReportPage {
        let total_rows = rows.len();
        let size = self.page_size as usize;
        let total_pages = u32::try_from(total_rows.div_ceil(size)).unwrap_or(u32::MAX);
        let offset = (self.page as usize - 1).saturating_mul(size);

        let rows = rows.into_iter().skip(offset).take(size).collect();

        ReportPage {
            rows,
            current_page: self.page,
            total_pages,
            total_rows,
            per_page: self.page_size,
        }
    }
}
