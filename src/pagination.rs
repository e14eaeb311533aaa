//! Page-number resolution for paginated listings.
//!
//! Out-of-range requests never fail: a page parameter that is not a number
//! falls back to the first page, and a number outside `1..=num_pages` falls
//! back to the last page.

pub const POSTS_PER_PAGE: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: i64,
    per_page: i64,
}

impl Paginator {
    pub fn new(count: i64, per_page: i64) -> Self {
        Self {
            count: count.max(0),
            per_page: per_page.max(1),
        }
    }

    /// Number of pages; an empty listing still has one (empty) page.
    pub fn num_pages(&self) -> i64 {
        if self.count == 0 {
            1
        } else {
            (self.count + self.per_page - 1) / self.per_page
        }
    }

    pub fn page(&self, raw: Option<&str>) -> PageInfo {
        let number = match raw.map(str::trim).unwrap_or("1").parse::<i64>() {
            Err(_) => 1,
            Ok(n) if n < 1 || n > self.num_pages() => self.num_pages(),
            Ok(n) => n,
        };

        PageInfo {
            number,
            num_pages: self.num_pages(),
            offset: (number - 1) * self.per_page,
            limit: self.per_page,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub number: i64,
    pub num_pages: i64,
    pub offset: i64,
    pub limit: i64,
}

impl PageInfo {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn previous_page_number(&self) -> i64 {
        self.number - 1
    }

    pub fn next_page_number(&self) -> i64 {
        self.number + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seven_items_make_three_pages() {
        let paginator = Paginator::new(7, POSTS_PER_PAGE);
        assert_eq!(paginator.num_pages(), 3);

        let last = paginator.page(Some("3"));
        assert_eq!(last.offset, 6);
        assert!(!last.has_next());
        assert!(last.has_previous());
    }

    #[test]
    fn non_numeric_page_is_first_page() {
        let paginator = Paginator::new(7, POSTS_PER_PAGE);
        assert_eq!(paginator.page(Some("abc")).number, 1);
        assert_eq!(paginator.page(Some("")).number, 1);
        assert_eq!(paginator.page(None).number, 1);
    }

    #[test]
    fn out_of_range_page_is_last_page() {
        let paginator = Paginator::new(7, POSTS_PER_PAGE);
        assert_eq!(paginator.page(Some("99")).number, 3);
        assert_eq!(paginator.page(Some("0")).number, 3);
        assert_eq!(paginator.page(Some("-2")).number, 3);
    }

    #[test]
    fn empty_listing_has_single_page() {
        let paginator = Paginator::new(0, POSTS_PER_PAGE);
        let page = paginator.page(Some("5"));
        assert_eq!(page.number, 1);
        assert_eq!(page.offset, 0);
        assert!(!page.has_next());
        assert!(!page.has_previous());
    }
}
