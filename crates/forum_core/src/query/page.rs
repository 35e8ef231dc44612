//! Page-number pagination.
//!
//! # Invariants
//! - Pages are 1-based; offset is `(num - 1) * size`.
//! - Missing or non-positive inputs fall back to defaults, oversized page
//!   sizes clamp to the configured maximum.
//! - A page past the end is empty, never an error.
//! - `count` always describes the whole filtered collection.

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_NUM: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Raw client paging input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page_num: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageRequest {
    pub fn new(page_num: i64, page_size: i64) -> Self {
        Self {
            page_num: Some(page_num),
            page_size: Some(page_size),
        }
    }
}

/// Configured paging bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLimits {
    pub default_size: u32,
    pub max_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_size: DEFAULT_PAGE_SIZE,
            max_size: MAX_PAGE_SIZE,
        }
    }
}

/// Normalized page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    num: u32,
    size: u32,
}

impl Page {
    /// Normalizes raw input against `limits`.
    pub fn resolve(request: PageRequest, limits: PageLimits) -> Self {
        let max_size = limits.max_size.max(1);
        let default_size = limits.default_size.clamp(1, max_size);
        let num = match request.page_num {
            Some(value) if value > 0 => u32::try_from(value).unwrap_or(u32::MAX),
            _ => DEFAULT_PAGE_NUM,
        };
        let size = match request.page_size {
            Some(value) if value > 0 => u32::try_from(value).unwrap_or(u32::MAX).min(max_size),
            _ => default_size,
        };
        Self { num, size }
    }

    pub fn num(&self) -> u32 {
        self.num
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.num - 1) * u64::from(self.size)
    }

    /// Slices an already ordered in-memory collection.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = usize::try_from(self.offset())
            .unwrap_or(usize::MAX)
            .min(items.len());
        let end = start.saturating_add(self.size as usize).min(items.len());
        &items[start..end]
    }

    /// Slices an in-memory collection and reports its full size.
    pub fn paginate<T: Clone>(&self, items: &[T]) -> Paginated<T> {
        Paginated {
            count: items.len() as u64,
            items: self.slice(items).to_vec(),
        }
    }

    /// Appends `LIMIT ? OFFSET ?` and its bind values to a query.
    pub fn push_sql(&self, sql: &mut String, bind_values: &mut Vec<Value>) {
        sql.push_str(" LIMIT ? OFFSET ?");
        bind_values.push(Value::Integer(i64::from(self.size)));
        bind_values.push(Value::Integer(
            i64::try_from(self.offset()).unwrap_or(i64::MAX),
        ));
    }
}

/// One page of items plus the total size of the filtered collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub count: u64,
    pub items: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            count: self.count,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}
