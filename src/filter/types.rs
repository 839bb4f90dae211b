use serde::{Deserialize, Serialize};

use super::error::FilterError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOp {
    Eq,
    Like,
}

#[derive(Debug, Clone)]
pub struct FilterWhereInfo {
    pub column: &'static str,
    pub operator: FilterOp,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub column: &'static str,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<serde_json::Value>,
}

/// Zero-based page index plus a page size clamped to the configured bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn new(page: Option<i64>, size: Option<i64>, default_size: u32, max_size: u32) -> Result<Self, FilterError> {
        let page = match page {
            None => 0,
            Some(p) if p < 0 => {
                return Err(FilterError::InvalidPage(format!("Page must be non-negative, got {}", p)));
            }
            Some(p) => u32::try_from(p).map_err(|_| FilterError::InvalidPage(format!("Page {} is too large", p)))?,
        };

        let max_size = max_size.max(1);
        let size = match size {
            None => default_size.clamp(1, max_size),
            Some(s) if s < 1 => {
                return Err(FilterError::InvalidSize(format!("Size must be positive, got {}", s)));
            }
            Some(s) => s.min(max_size as i64) as u32,
        };

        Ok(Self { page, size })
    }

    /// Page request using the global pagination settings
    pub fn from_config(page: Option<i64>, size: Option<i64>) -> Result<Self, FilterError> {
        let pagination = &crate::config::CONFIG.pagination;
        Self::new(page, size, pagination.default_size, pagination.max_size)
    }

    pub fn offset(&self) -> i64 {
        self.page as i64 * self.size as i64
    }
}

/// One page of results with the metadata clients need to navigate
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: i64,
    pub total_pages: i64,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: i64) -> Self {
        let size = request.size.max(1) as i64;
        let total_pages = (total_elements + size - 1) / size;
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages,
            has_next: (request.page as i64 + 1) < total_pages,
        }
    }
}
