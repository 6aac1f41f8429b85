use serde::Deserialize;

use crate::error::CrmError;
use crate::wire::CUSTOMER_FIELDS;

// ============================================================================
// Customer List Query - pagination, sorting and search parameters
// ============================================================================

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;
pub const MAX_SEARCH_CHARS: usize = 100;

/// Raw query string of `GET /customers`. Everything is kept as text so that
/// malformed values produce our own error messages.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub search: Option<String>,
}

/// Customer columns a list may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    CreatedAt,
    Name,
    Email,
    Revenue,
    OrderCount,
    LastOrderDate,
}

impl SortColumn {
    pub const ALL: [SortColumn; 6] = [
        SortColumn::CreatedAt,
        SortColumn::Name,
        SortColumn::Email,
        SortColumn::Revenue,
        SortColumn::OrderCount,
        SortColumn::LastOrderDate,
    ];

    /// Store column backing this sort key.
    pub fn column(&self) -> &'static str {
        match self {
            SortColumn::CreatedAt => "created_at",
            SortColumn::Name => "name",
            SortColumn::Email => "email",
            SortColumn::Revenue => "revenue_cents",
            SortColumn::OrderCount => "order_count",
            SortColumn::LastOrderDate => "last_order_date",
        }
    }

    /// Accepts either the wire name (`orderCount`) or the column (`order_count`).
    pub fn parse(raw: &str) -> Result<Self, CrmError> {
        let raw = raw.trim();
        let column = CUSTOMER_FIELDS.to_column(raw).unwrap_or(raw);

        Self::ALL
            .into_iter()
            .find(|sort| sort.column() == column)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL
                    .iter()
                    .filter_map(|sort| CUSTOMER_FIELDS.to_wire(sort.column()))
                    .collect();
                CrmError::InvalidArgument(format!(
                    "Cannot sort by {raw:?}; expected one of {}",
                    allowed.join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Result<Self, CrmError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(CrmError::InvalidArgument(format!(
                "Invalid sort order {other:?}; expected asc or desc"
            ))),
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A validated customer list request.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerQuery {
    pub page: u32,
    pub limit: u32,
    pub sort: SortColumn,
    pub order: SortOrder,
    /// Trimmed, non-empty search term matched against name and email.
    pub search: Option<String>,
}

impl Default for CustomerQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort: SortColumn::CreatedAt,
            order: SortOrder::Desc,
            search: None,
        }
    }
}

fn parse_integer(name: &str, raw: Option<&str>, default: u32) -> Result<i64, CrmError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(i64::from(default)),
        Some(value) => value
            .parse::<i64>()
            .map_err(|_| CrmError::InvalidArgument(format!("{name} must be an integer, got {value:?}"))),
    }
}

impl CustomerQuery {
    pub fn from_params(params: &CustomerListParams) -> Result<Self, CrmError> {
        let page = parse_integer("page", params.page.as_deref(), DEFAULT_PAGE)?
            .clamp(1, i64::from(u32::MAX)) as u32;
        let limit = parse_integer("limit", params.limit.as_deref(), DEFAULT_LIMIT)?
            .clamp(1, i64::from(MAX_LIMIT)) as u32;

        let sort = match params.sort_by.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => SortColumn::parse(raw)?,
            None => SortColumn::CreatedAt,
        };

        let order = match params.order.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => SortOrder::parse(raw)?,
            None => SortOrder::Desc,
        };

        let search = match params.search.as_deref().map(str::trim) {
            Some(term) if term.chars().count() > MAX_SEARCH_CHARS => {
                return Err(CrmError::InvalidArgument(format!(
                    "search must be at most {MAX_SEARCH_CHARS} characters"
                )));
            }
            Some(term) if !term.is_empty() => Some(term.to_string()),
            _ => None,
        };

        Ok(Self { page, limit, sort, order, search })
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// Case-insensitive substring match used by backends that filter in memory.
    pub fn matches(&self, name: &str, email: &str) -> bool {
        match &self.search {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                name.to_lowercase().contains(&term) || email.to_lowercase().contains(&term)
            }
        }
    }
}

pub fn total_pages(total_items: u64, limit: u32) -> u64 {
    total_items.div_ceil(u64::from(limit.max(1)))
}
