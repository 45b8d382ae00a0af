//! Pagination utilities for service layer
//!
//! Page selection follows the classic paginator rules used by the listing
//! pages: a non-numeric page falls back to the first page, `last` and any
//! out-of-range number land on the last page, and an empty result set still
//! has one (empty) page.

use sea_orm::{ConnectionTrait, PaginatorTrait, SelectorTrait};
use serde::Serialize;

use crate::errors::ServiceError;

/// Resolved page parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page index
    pub page: u64,
    /// items per page
    pub per_page: u64,
}

impl Pagination {
    /// Pick the page for a raw `page` query value given the total item count.
    pub fn resolve(raw: Option<&str>, total: u64, per_page: u64) -> Self {
        let per_page = per_page.max(1);
        let num_pages = num_pages(total, per_page);
        let page = match raw.map(str::trim) {
            None | Some("") => 1,
            Some("last") => num_pages,
            Some(s) => match s.parse::<i64>() {
                Ok(n) if n >= 1 && (n as u64) <= num_pages => n as u64,
                Ok(_) => num_pages,
                Err(_) => 1,
            },
        };
        Self { page, per_page }
    }

    /// Zero-based page index and page size, as sea-orm's paginator wants them.
    pub fn normalize(self) -> (u64, u64) {
        (self.page.saturating_sub(1), self.per_page.max(1))
    }
}

pub fn num_pages(total: u64, per_page: u64) -> u64 {
    if total == 0 { 1 } else { total.div_ceil(per_page.max(1)) }
}

/// One page of a listing plus the navigation facts a page needs.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub per_page: u64,
    pub total: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, p: Pagination, total: u64) -> Self {
        let num_pages = num_pages(total, p.per_page);
        Self {
            items,
            number: p.page,
            num_pages,
            per_page: p.per_page,
            total,
            has_previous: p.page > 1,
            has_next: p.page < num_pages,
        }
    }

    /// Same navigation, different items.
    pub fn replace_items<U>(self, items: Vec<U>) -> Page<U> {
        Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
            per_page: self.per_page,
            total: self.total,
            has_previous: self.has_previous,
            has_next: self.has_next,
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            per_page: self.per_page,
            total: self.total,
            has_previous: self.has_previous,
            has_next: self.has_next,
        }
    }
}

/// Count, resolve the requested page and fetch it.
pub async fn fetch_page<'db, C, S>(
    db: &'db C,
    select: S,
    per_page: u64,
    raw_page: Option<&str>,
) -> Result<Page<<S::Selector as SelectorTrait>::Item>, ServiceError>
where
    C: ConnectionTrait,
    S: PaginatorTrait<'db, C>,
{
    let paginator = select.paginate(db, per_page.max(1));
    let total = paginator.num_items().await.map_err(|e| ServiceError::Db(e.to_string()))?;
    let p = Pagination::resolve(raw_page, total, per_page);
    let (page_idx, _) = p.normalize();
    let items = paginator.fetch_page(page_idx).await.map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(Page::new(items, p, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_items_five_per_page() {
        assert_eq!(num_pages(12, 5), 3);
        assert_eq!(Pagination::resolve(Some("1"), 12, 5).page, 1);
        assert_eq!(Pagination::resolve(Some("3"), 12, 5).page, 3);
        // out of range clamps to the last page
        assert_eq!(Pagination::resolve(Some("4"), 12, 5).page, 3);
        assert_eq!(Pagination::resolve(Some("0"), 12, 5).page, 3);
        assert_eq!(Pagination::resolve(Some("-2"), 12, 5).page, 3);
    }

    #[test]
    fn non_numeric_falls_back_to_first_page() {
        assert_eq!(Pagination::resolve(Some("abc"), 12, 5).page, 1);
        assert_eq!(Pagination::resolve(None, 12, 5).page, 1);
        assert_eq!(Pagination::resolve(Some(""), 12, 5).page, 1);
        assert_eq!(Pagination::resolve(Some("last"), 12, 5).page, 3);
    }

    #[test]
    fn empty_listing_has_one_page() {
        let p = Pagination::resolve(Some("7"), 0, 5);
        assert_eq!(p.page, 1);
        let page: Page<u8> = Page::new(Vec::new(), p, 0);
        assert_eq!(page.num_pages, 1);
        assert!(!page.has_next && !page.has_previous);
    }

    #[test]
    fn normalize_is_zero_based() {
        let (idx, per) = Pagination { page: 3, per_page: 5 }.normalize();
        assert_eq!(idx, 2);
        assert_eq!(per, 5);
    }

    #[test]
    fn page_flags_and_map() {
        let page = Page::new(vec![1, 2], Pagination { page: 3, per_page: 5 }, 12).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert!(page.has_previous);
        assert!(!page.has_next);
    }
}
