//! Fixed-size page windows over ordered listings.

use serde::Serialize;

/// Posts per listing page.
pub const PAGE_SIZE: u64 = 10;

/// A requested page, as sent by the client.
///
/// Resolution mirrors a lenient paginator: anything that is not an integer
/// means the first page, and any integer outside `1..=total_pages` means the
/// last page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    requested: Option<i64>,
    size: u64,
}

impl PageRequest {
    pub fn first() -> Self {
        Self {
            requested: None,
            size: PAGE_SIZE,
        }
    }

    pub fn number(number: i64) -> Self {
        Self {
            requested: Some(number),
            size: PAGE_SIZE,
        }
    }

    /// Parse the raw `?page=` query value.
    pub fn parse(raw: Option<&str>) -> Self {
        Self {
            requested: raw.and_then(parse_page_number),
            size: PAGE_SIZE,
        }
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of pages needed for `total_items`. Never zero.
    pub fn total_pages(&self, total_items: u64) -> u64 {
        total_items.div_ceil(self.size).max(1)
    }

    /// 1-based page number to serve, given the listing size.
    pub fn resolve(&self, total_items: u64) -> u64 {
        let last = self.total_pages(total_items);
        match self.requested {
            None => 1,
            Some(n) if n >= 1 && (n as u64) <= last => n as u64,
            Some(_) => last,
        }
    }

    /// Offset of the first item on the resolved page.
    pub fn offset(&self, total_items: u64) -> u64 {
        (self.resolve(total_items) - 1) * self.size
    }
}

/// Integers too wide for `i64` are still integers, just out of range.
fn parse_page_number(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n);
    }
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())).then_some(0)
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Build the page for `request` out of the already-sliced `items`.
    pub fn new(items: Vec<T>, request: &PageRequest, total_items: u64) -> Self {
        Self {
            items,
            number: request.resolve(total_items),
            per_page: request.size(),
            total_items,
            total_pages: request.total_pages(total_items),
        }
    }

    /// Slice an in-memory listing that is already filtered and ordered.
    pub fn from_vec(all: Vec<T>, request: &PageRequest) -> Self {
        let total = all.len() as u64;
        let offset = request.offset(total) as usize;
        let items = all
            .into_iter()
            .skip(offset)
            .take(request.size() as usize)
            .collect();
        Self::new(items, request, total)
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}
