use serde::{Deserialize, Serialize};

/// Offset-based window over an unbounded result list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub offset: usize,
    pub items_per_page: usize,
}

impl Pagination {
    pub fn new(offset: usize, items_per_page: usize) -> Self {
        Self {
            offset,
            items_per_page,
        }
    }

    /// The slice of `all` covered by this window, clamped to its bounds
    pub fn splice<T: Clone>(&self, all: &[T]) -> Vec<T> {
        let start = self.offset.min(all.len());
        let end = self.offset.saturating_add(self.items_per_page).min(all.len());
        all[start..end].to_vec()
    }

    /// Wrap already-spliced `items` with the totals for presentation
    pub fn result<T>(&self, items: Vec<T>, total: usize, query: Option<&str>) -> Page<T> {
        Page {
            items,
            total,
            items_per_page: self.items_per_page,
            offset: self.offset,
            query: query.filter(|q| !q.is_empty()).map(str::to_string),
        }
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub items_per_page: usize,
    pub offset: usize,
    pub query: Option<String>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            items_per_page: self.items_per_page,
            offset: self.offset,
            query: self.query,
        }
    }
}
