/// One page of a longer list.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based, always within `1..=total_pages`.
    pub number: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn previous(&self) -> usize {
        self.number.saturating_sub(1).max(1)
    }

    pub fn next(&self) -> usize {
        (self.number + 1).min(self.total_pages)
    }
}

/// Cut `items` into pages of `per_page` and return page `requested`.
/// Out-of-range page numbers are clamped; an empty list has one empty page.
pub fn paginate<T>(items: Vec<T>, requested: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page).max(1);
    let number = requested.clamp(1, total_pages);

    let items = items
        .into_iter()
        .skip((number - 1) * per_page)
        .take(per_page)
        .collect();

    Page {
        items,
        number,
        total_pages,
        total_items,
    }
}
