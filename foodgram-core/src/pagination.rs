use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE_SIZE: usize = 6;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
pub struct PageParams {
    /// 1-based page number (default: 1)
    pub page: Option<usize>,
    /// Items per page (default: 6, max: 100)
    pub limit: Option<usize>,
}

impl PageParams {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Page<T> {
    /// Total number of matching items
    pub count: usize,
    /// Next page number, if any
    pub next: Option<usize>,
    /// Previous page number, if any
    pub previous: Option<usize>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Replace the results while keeping the page metadata.
    pub fn try_map<U, E>(self, f: impl FnOnce(Vec<T>) -> Result<Vec<U>, E>) -> Result<Page<U>, E> {
        Ok(Page {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: f(self.results)?,
        })
    }
}

/// Cut one page out of the full, already ordered result set. A page past the
/// end is empty.
pub fn paginate<T>(items: Vec<T>, params: &PageParams) -> Page<T> {
    let page = params.page();
    let limit = params.limit();
    let count = items.len();
    let start = (page - 1).saturating_mul(limit);

    let results: Vec<T> = items.into_iter().skip(start).take(limit).collect();
    let next = (start.saturating_add(limit) < count).then_some(page + 1);
    let previous = (page > 1).then(|| (page - 1).min(count.div_ceil(limit)).max(1));

    Page {
        count,
        next,
        previous,
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: usize, limit: usize) -> PageParams {
        PageParams {
            page: Some(page),
            limit: Some(limit),
        }
    }

    #[test]
    fn test_defaults() {
        let page = paginate((0..10).collect(), &PageParams::default());
        assert_eq!(page.count, 10);
        assert_eq!(page.results, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(page.next, Some(2));
        assert_eq!(page.previous, None);
    }

    #[test]
    fn test_last_page() {
        let page = paginate((0..10).collect(), &params(2, 6));
        assert_eq!(page.results, vec![6, 7, 8, 9]);
        assert_eq!(page.next, None);
        assert_eq!(page.previous, Some(1));
    }

    #[test]
    fn test_exact_fit_has_no_next() {
        let page = paginate((0..6).collect::<Vec<i32>>(), &params(1, 6));
        assert_eq!(page.next, None);
    }

    #[test]
    fn test_past_the_end_is_empty() {
        let page = paginate((0..3).collect::<Vec<i32>>(), &params(5, 2));
        assert!(page.results.is_empty());
        assert_eq!(page.next, None);
        assert_eq!(page.previous, Some(2));
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(params(1, 0).limit(), 1);
        assert_eq!(params(1, 1_000).limit(), MAX_PAGE_SIZE);
        assert_eq!(params(0, 6).page(), 1);
    }

    #[test]
    fn test_empty() {
        let page = paginate(Vec::<i32>::new(), &PageParams::default());
        assert_eq!(page.count, 0);
        assert_eq!(page.next, None);
        assert_eq!(page.previous, None);
    }
}
