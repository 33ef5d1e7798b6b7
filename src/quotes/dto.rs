use serde::{Deserialize, Serialize};

use crate::quotes::repo_types::Quote;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct CreateQuoteRequest {
    pub content: String,
}

/// Raw paging parameters. Non-numeric values are treated as absent.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

impl PageQuery {
    /// `(page, limit)`, with anything below 1 replaced by the default and
    /// `limit` capped at `MAX_LIMIT`.
    pub fn resolve(&self) -> (i64, i64) {
        fn parse(v: &Option<String>, default: i64) -> i64 {
            v.as_deref()
                .and_then(|s| s.trim().parse::<i64>().ok())
                .filter(|n| *n >= 1)
                .unwrap_or(default)
        }
        (
            parse(&self.page, DEFAULT_PAGE),
            parse(&self.limit, DEFAULT_LIMIT).min(MAX_LIMIT),
        )
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Pagination {
    pub current_page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            current_page: page,
            limit,
            total,
            total_pages: total.saturating_add(limit - 1) / limit,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.current_page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Serialize)]
pub struct QuotePage {
    pub quotes: Vec<Quote>,
    pub pagination: Pagination,
}
