//! Listing Engine
//!
//! Filter, sort and paginate an in-memory principal collection. The engine
//! is pure: callers fetch the collection from the store and pass it in.
//!
//! Ordering is always total. Without an explicit sort the identifier
//! orders the page; with one, ties on the sort field fall back to the
//! identifier (ascending) so adjacent pages never overlap.

use std::cmp::Ordering;
use std::str::FromStr;

use ic_config::ListingConfig;
use serde::Serialize;
use utoipa::ToSchema;

use crate::shared::error::{IdentityError, Result};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "ASC" => Ok(Self::Asc),
            "DESC" => Ok(Self::Desc),
            _ => Err(IdentityError::invalid_key("sort direction", s)),
        }
    }
}

/// Column and direction to order by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec<F> {
    pub field: F,
    pub direction: SortDirection,
}

impl<F> SortSpec<F>
where
    F: FromStr<Err = IdentityError>,
{
    /// Parse `"<column>"` or `"<column> <ASC|DESC>"`.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.split_whitespace();
        let column = parts
            .next()
            .ok_or_else(|| IdentityError::invalid_key("sort column", raw))?;
        let field = column.parse()?;
        let direction = match parts.next() {
            Some(dir) => dir.parse()?,
            None => SortDirection::Asc,
        };
        if parts.next().is_some() {
            return Err(IdentityError::validation(format!(
                "Sort must be '<column> [ASC|DESC]', got '{}'",
                raw
            )));
        }
        Ok(Self { field, direction })
    }
}

/// A record the engine can list.
pub trait Listable {
    /// Enumerated sortable columns.
    type Field: Copy;

    fn id(&self) -> &str;

    /// Text matched by the free-text search.
    fn search_text(&self) -> &str;

    fn compare_by(&self, other: &Self, field: Self::Field) -> Ordering;
}

/// Validated listing request.
#[derive(Debug, Clone)]
pub struct ListQuery<F> {
    pub search: Option<String>,
    pub sort: Option<SortSpec<F>>,
    pub skip: usize,
    pub limit: usize,
    pub case_sensitive: bool,
}

impl<F> ListQuery<F>
where
    F: FromStr<Err = IdentityError>,
{
    /// Build from raw request parameters, applying configured defaults.
    pub fn from_request(
        search: Option<String>,
        sort: Option<&str>,
        skip: Option<usize>,
        limit: Option<usize>,
        config: &ListingConfig,
    ) -> Result<Self> {
        let limit = limit.unwrap_or(config.default_limit);
        if limit == 0 {
            return Err(IdentityError::validation("Limit must be greater than zero"));
        }
        if limit > config.max_limit {
            return Err(IdentityError::validation(format!(
                "Limit {} exceeds the maximum of {}",
                limit, config.max_limit
            )));
        }

        let sort = match sort.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(SortSpec::parse(raw)?),
            None => None,
        };

        Ok(Self {
            search,
            sort,
            skip: skip.unwrap_or(0),
            limit,
            case_sensitive: config.case_sensitive_search,
        })
    }
}

impl<F> ListQuery<F> {
    /// Unfiltered, unsorted query for one page.
    pub fn page(skip: usize, limit: usize) -> Self {
        Self {
            search: None,
            sort: None,
            skip,
            limit,
            case_sensitive: false,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_sort(mut self, field: F, direction: SortDirection) -> Self {
        self.sort = Some(SortSpec { field, direction });
        self
    }
}

/// One page plus the filtered total.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Page<T> {
    pub total: usize,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    pub fn map<U, M: FnMut(T) -> U>(self, f: M) -> Page<U> {
        Page {
            total: self.total,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}

/// Filter, count, sort, then cut one page.
pub fn list<T: Listable>(items: Vec<T>, query: &ListQuery<T::Field>) -> Result<Page<T>> {
    if query.limit == 0 {
        return Err(IdentityError::validation("Limit must be greater than zero"));
    }

    let mut matched: Vec<T> = match normalized_search(query) {
        Some(needle) => items
            .into_iter()
            .filter(|item| matches_search(item.search_text(), &needle, query.case_sensitive))
            .collect(),
        None => items,
    };

    let total = matched.len();

    match query.sort {
        Some(SortSpec { field, direction }) => matched.sort_by(|a, b| {
            let ord = a.compare_by(b, field);
            let ord = match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            ord.then_with(|| a.id().cmp(b.id()))
        }),
        None => matched.sort_by(|a, b| a.id().cmp(b.id())),
    }

    let data = matched.into_iter().skip(query.skip).take(query.limit).collect();
    Ok(Page { total, data })
}

fn normalized_search<F>(query: &ListQuery<F>) -> Option<String> {
    let search = query.search.as_deref()?;
    if search.trim().is_empty() {
        return None;
    }
    Some(if query.case_sensitive {
        search.to_string()
    } else {
        search.to_lowercase()
    })
}

fn matches_search(text: &str, needle: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        text.contains(needle)
    } else {
        text.to_lowercase().contains(needle)
    }
}
