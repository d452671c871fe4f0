//! Normalization of the raw `/tasks` list query string.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Page size used when `limit` is missing or unparsable.
pub const DEFAULT_LIMIT: u32 = 10;

/// Upper bound for `limit`.
pub const MAX_LIMIT: u32 = 100;

/// Raw list parameters exactly as they arrive in the query string.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListTasksParams {
    /// 1-based page number. Defaults to 1.
    pub page: Option<String>,
    /// Page size between 1 and 100. Defaults to 10.
    pub limit: Option<String>,
    /// `asc` or `desc` by creation time. Defaults to `desc`.
    pub sort: Option<String>,
    /// Case-insensitive substring matched against the task name.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Validated, clamped list controls. Always safe to hand to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListQuery {
    pub page: u32,
    pub limit: u32,
    pub offset: u64,
    pub search: Option<String>,
    pub sort: SortOrder,
}

impl Default for TaskListQuery {
    fn default() -> Self {
        ListTasksParams::default().normalize()
    }
}

impl ListTasksParams {
    /// Never fails: bad input is clamped or replaced by defaults.
    pub fn normalize(&self) -> TaskListQuery {
        let page = parse_int(self.page.as_deref())
            .map(|page| page.clamp(1, i64::from(u32::MAX)) as u32)
            .unwrap_or(1);

        let limit = parse_int(self.limit.as_deref())
            .map(|limit| limit.clamp(1, i64::from(MAX_LIMIT)) as u32)
            .unwrap_or(DEFAULT_LIMIT);

        let offset = u64::from(page - 1) * u64::from(limit);

        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);

        let sort = match self.sort.as_deref().map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        };

        TaskListQuery {
            page,
            limit,
            offset,
            search,
            sort,
        }
    }
}

fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
}
