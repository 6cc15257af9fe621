use serde::Serialize;

/// Number of posts on every listing page.
pub const PAGE_SIZE: usize = 10;

/// Reads the `page` query value. Anything that is not an integer literal
/// falls back to the first page; numbers below 1 mean page 1 and numbers too
/// long for any integer type mean "past the end", which `PageWindow::resolve`
/// turns into the last page.
pub fn parse_page_number(raw: Option<&str>) -> usize {
    let Some(value) = raw.map(str::trim) else {
        return 1;
    };
    match value.parse::<i64>() {
        Ok(number) => usize::try_from(number.max(1)).unwrap_or(usize::MAX),
        Err(_) if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) => usize::MAX,
        Err(_) => 1,
    }
}

/// The slice of a listing that a page covers, resolved against the total
/// number of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub offset: usize,
    pub limit: usize,
}

impl PageWindow {
    /// Clamps `requested` into `1..=num_pages`. An empty listing still has
    /// one (empty) page.
    pub fn resolve(count: usize, page_size: usize, requested: usize) -> Self {
        let page_size = page_size.max(1);
        let num_pages = count.div_ceil(page_size).max(1);
        let number = requested.clamp(1, num_pages);
        Self {
            number,
            num_pages,
            count,
            offset: (number - 1) * page_size,
            limit: page_size,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page_number: Option<usize>,
    pub next_page_number: Option<usize>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Self {
            items,
            number: window.number,
            num_pages: window.num_pages,
            count: window.count,
            has_previous: window.has_previous(),
            has_next: window.has_next(),
            previous_page_number: window.has_previous().then(|| window.number - 1),
            next_page_number: window.has_next().then(|| window.number + 1),
        }
    }
}

/// Cuts an already ordered sequence into the requested page, keeping the
/// original order inside the page.
pub fn paginate<T>(sequence: Vec<T>, page_size: usize, requested: usize) -> Page<T> {
    let window = PageWindow::resolve(sequence.len(), page_size, requested);
    let items = sequence
        .into_iter()
        .skip(window.offset)
        .take(window.limit)
        .collect();
    Page::new(items, window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirteen_items_split_into_ten_and_three() {
        let items: Vec<usize> = (0..13).collect();

        let first = paginate(items.clone(), PAGE_SIZE, 1);
        assert_eq!(first.items.len(), 10);
        assert!(!first.has_previous);
        assert!(first.has_next);
        assert_eq!(first.next_page_number, Some(2));

        let second = paginate(items, PAGE_SIZE, 2);
        assert_eq!(second.items, vec![10, 11, 12]);
        assert!(second.has_previous);
        assert!(!second.has_next);
        assert_eq!(second.num_pages, 2);
    }

    #[test]
    fn page_count_and_last_page_size_follow_total() {
        for total in 1..=45usize {
            for size in [1usize, 3, 10] {
                let window = PageWindow::resolve(total, size, usize::MAX);
                assert_eq!(window.num_pages, total.div_ceil(size));
                let last = paginate((0..total).collect::<Vec<_>>(), size, window.num_pages);
                let expected = if total % size == 0 { size } else { total % size };
                assert_eq!(last.items.len(), expected, "total={total} size={size}");
            }
        }
    }

    #[test]
    fn out_of_range_pages_clamp() {
        let items: Vec<usize> = (0..25).collect();
        assert_eq!(paginate(items.clone(), 10, 0).number, 1);
        let past_end = paginate(items, 10, 99);
        assert_eq!(past_end.number, 3);
        assert_eq!(past_end.items, vec![20, 21, 22, 23, 24]);
    }

    #[test]
    fn empty_sequence_has_single_empty_page() {
        let page = paginate(Vec::<u8>::new(), PAGE_SIZE, 3);
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert!(page.items.is_empty());
        assert!(!page.has_next);
    }

    #[test]
    fn page_number_parsing_defaults_to_first() {
        assert_eq!(parse_page_number(None), 1);
        assert_eq!(parse_page_number(Some("abc")), 1);
        assert_eq!(parse_page_number(Some("")), 1);
        assert_eq!(parse_page_number(Some("-4")), 1);
        assert_eq!(parse_page_number(Some("0")), 1);
        assert_eq!(parse_page_number(Some("3")), 3);
    }

    #[test]
    fn oversized_page_number_lands_on_last_page() {
        let huge = parse_page_number(Some("99999999999999999999"));
        assert_eq!(huge, usize::MAX);
        assert_eq!(parse_page_number(Some("12x")), 1);

        let page = paginate((0..13).collect::<Vec<_>>(), PAGE_SIZE, huge);
        assert_eq!(page.number, 2);
        assert_eq!(page.items.len(), 3);
    }
}
