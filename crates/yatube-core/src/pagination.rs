//! Page-number pagination shared by every post listing.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Posts shown per listing page unless configured otherwise.
pub const DEFAULT_PER_PAGE: u64 = 10;

/// A validated request for one page of a listing (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u64,
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(number: u64, per_page: u64) -> Self {
        Self {
            number,
            per_page: per_page.max(1),
        }
    }

    pub fn first(per_page: u64) -> Self {
        Self::new(1, per_page)
    }

    /// Parse the raw `?page=` value. Absent or empty means the first page;
    /// anything that is not a positive integer is an invalid page.
    pub fn parse(raw: Option<&str>, per_page: u64) -> Result<Self, DomainError> {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Ok(Self::first(per_page)),
            Some(raw) => raw,
        };

        match raw.parse::<u64>() {
            Ok(number) if number >= 1 => Ok(Self::new(number, per_page)),
            _ => Err(DomainError::InvalidPage(raw.to_string())),
        }
    }

    /// Zero-based index of this page, as used by query paginators.
    pub fn index(&self) -> u64 {
        self.number - 1
    }

    pub fn offset(&self) -> u64 {
        self.index() * self.per_page
    }

    /// Number of pages for `total` items. An empty listing still has one page.
    pub fn num_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.per_page).max(1)
    }

    pub fn is_within(&self, total: u64) -> bool {
        self.number <= self.num_pages(total)
    }
}

/// One page of results plus enough bookkeeping to render navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub per_page: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            number: request.number,
            per_page: request.per_page,
            total,
        }
    }

    pub fn num_pages(&self) -> u64 {
        self.total.div_ceil(self.per_page).max(1)
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}
