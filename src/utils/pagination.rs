//! Page-number pagination over in-memory result lists

use serde::Serialize;

/// One page of results, with neighbouring page numbers when they exist
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Page<T> {
    pub current: usize,
    pub next: Option<usize>,
    pub previous: Option<usize>,
    pub results: Vec<T>,
}

/// Slice `items` into the requested page.
///
/// A limit below one is clamped to one. A page outside `1..=num_pages`
/// falls back to the first page.
pub fn paginate<T>(items: Vec<T>, limit: usize, page: usize) -> Page<T> {
    let limit = limit.max(1);
    let num_pages = items.len().div_ceil(limit).max(1);
    let page = if (1..=num_pages).contains(&page) { page } else { 1 };

    let results: Vec<T> = items
        .into_iter()
        .skip((page - 1) * limit)
        .take(limit)
        .collect();

    Page {
        current: page,
        next: (page < num_pages).then_some(page + 1),
        previous: (page > 1).then_some(page - 1),
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_middle_page() {
        let page = paginate((1..=25).collect(), 10, 2);
        assert_eq!(page.current, 2);
        assert_eq!(page.next, Some(3));
        assert_eq!(page.previous, Some(1));
        assert_eq!(page.results, (11..=20).collect::<Vec<_>>());
    }

    #[test]
    fn test_out_of_range_page_falls_back_to_first() {
        let page = paginate((1..=5).collect(), 2, 9);
        assert_eq!(page.current, 1);
        assert_eq!(page.results, vec![1, 2]);
        assert_eq!(page.previous, None);
    }

    #[test]
    fn test_zero_limit_is_clamped() {
        let page = paginate(vec!["a", "b"], 0, 2);
        assert_eq!(page.current, 2);
        assert_eq!(page.results, vec!["b"]);
        assert_eq!(page.next, None);
    }

    #[test]
    fn test_huge_limit_is_a_single_page() {
        let page = paginate(vec![1, 2, 3], usize::MAX, 1);
        assert_eq!(page.current, 1);
        assert_eq!(page.results, vec![1, 2, 3]);
        assert_eq!(page.next, None);
        assert_eq!(page.previous, None);

        let page = paginate(vec![1, 2, 3], usize::MAX, 2);
        assert_eq!(page.current, 1);
    }

    #[test]
    fn test_empty_results() {
        let page: Page<i32> = paginate(vec![], 10, 1);
        assert_eq!(page.current, 1);
        assert!(page.results.is_empty());
        assert_eq!(page.next, None);
    }
}
