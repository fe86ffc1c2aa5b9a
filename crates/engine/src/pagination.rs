//! Offset pagination, sorting and search for list queries.
//!
//! Raw query values are normalized here so storage adapters only ever see a
//! known sort column and sane page bounds.

use std::{fmt, str::FromStr};

use crate::{EngineError, ResultEngine};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Columns a list may be sorted by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortField {
    Id,
    Title,
    Amount,
    Date,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Amount => "amount",
            Self::Date => "date",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "id" => Some(Self::Id),
            "title" => Some(Self::Title),
            "amount" => Some(Self::Amount),
            "date" => Some(Self::Date),
            "created_at" => Some(Self::CreatedAt),
            "updated_at" => Some(Self::UpdatedAt),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let order = match self.order {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        };
        write!(f, "{} {order}", self.field.as_str())
    }
}

impl FromStr for Sort {
    type Err = EngineError;

    /// Parses `"<column> [asc|desc]"`. The direction defaults to `asc`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            EngineError::validation(
                "sort",
                format!("unsupported sort '{value}', expected '<column> [asc|desc]'"),
            )
        };

        let mut parts = value.split_whitespace();
        let field = parts
            .next()
            .and_then(SortField::parse)
            .ok_or_else(invalid)?;
        let order = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") => SortOrder::Asc,
            Some("desc") => SortOrder::Desc,
            Some(_) => return Err(invalid()),
        };
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self { field, order })
    }
}

/// A normalized page request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub sort: Sort,
    /// Trimmed, never empty.
    pub search: Option<String>,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort: Sort::default(),
            search: None,
        }
    }
}

impl Pagination {
    /// Builds a request from raw query string values.
    ///
    /// Missing, unparsable or non-positive `page`/`limit` fall back to the
    /// defaults; `limit` is capped at [`MAX_LIMIT`]. An unknown `sort` is
    /// rejected rather than ignored.
    pub fn from_query(
        page: Option<&str>,
        limit: Option<&str>,
        sort: Option<&str>,
        search: Option<&str>,
    ) -> ResultEngine<Self> {
        let page = parse_positive(page).unwrap_or(DEFAULT_PAGE);
        let limit = parse_positive(limit)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);
        let sort = match sort.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw.parse()?,
            None => Sort::default(),
        };
        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);

        Ok(Self {
            page,
            limit,
            sort,
            search,
        })
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

fn parse_positive(value: Option<&str>) -> Option<u64> {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v >= 1)
}

/// One page of results.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of matches after search filtering, before paging.
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
        }
    }
}
