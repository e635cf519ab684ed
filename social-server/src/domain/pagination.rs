use super::error::DomainError;

pub(crate) const DEFAULT_PAGE: u32 = 1;
pub(crate) const DEFAULT_LIMIT: u32 = 10;
pub(crate) const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PageRequest {
    pub(crate) page: u32,
    pub(crate) limit: u32,
}

impl PageRequest {
    pub(crate) fn new(page: Option<u32>, limit: Option<u32>) -> Result<Self, DomainError> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);

        if page == 0 {
            return Err(DomainError::Validation {
                field: "page",
                message: "must be >= 1",
            });
        }
        if limit == 0 || limit > MAX_LIMIT {
            return Err(DomainError::Validation {
                field: "limit",
                message: "must be 1..100",
            });
        }
        Ok(Self { page, limit })
    }

    pub(crate) fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// A bounded slice of a listing plus the metadata needed to walk the rest.
#[derive(Debug, Clone)]
pub(crate) struct Page<T> {
    pub(crate) items: Vec<T>,
    pub(crate) total: u64,
    pub(crate) page: u32,
    pub(crate) limit: u32,
}

impl<T> Page<T> {
    pub(crate) fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            limit: request.limit,
        }
    }

    pub(crate) fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.limit))
    }

    pub(crate) fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DomainError, Page, PageRequest};

    #[test]
    fn defaults_are_first_page_of_ten() {
        let request = PageRequest::new(None, None).expect("defaults must be valid");
        assert_eq!(request.page, 1);
        assert_eq!(request.limit, 10);
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn offset_skips_previous_pages() {
        let request = PageRequest::new(Some(2), Some(10)).expect("must be valid");
        assert_eq!(request.offset(), 10);

        let request = PageRequest::new(Some(4), Some(25)).expect("must be valid");
        assert_eq!(request.offset(), 75);
    }

    #[test]
    fn rejects_zero_page_and_out_of_range_limit() {
        let err = PageRequest::new(Some(0), None).expect_err("page 0 must fail");
        assert!(matches!(err, DomainError::Validation { field: "page", .. }));

        let err = PageRequest::new(None, Some(0)).expect_err("limit 0 must fail");
        assert!(matches!(err, DomainError::Validation { field: "limit", .. }));

        let err = PageRequest::new(None, Some(101)).expect_err("limit 101 must fail");
        assert!(matches!(err, DomainError::Validation { field: "limit", .. }));
    }

    #[test]
    fn total_pages_rounds_up() {
        let request = PageRequest::new(Some(1), Some(10)).expect("must be valid");
        assert_eq!(Page::<u8>::new(vec![], 0, request).total_pages(), 0);
        assert_eq!(Page::<u8>::new(vec![], 10, request).total_pages(), 1);
        assert_eq!(Page::<u8>::new(vec![], 11, request).total_pages(), 2);
        assert_eq!(Page::<u8>::new(vec![], 25, request).total_pages(), 3);
    }
}
