//! Paging, search and date-range helpers shared by the list operations.

use super::StoreError;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Common list parameters. Missing values fall back to page 1 of 10 with no
/// filtering.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub search: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl ListQuery {
    #[cfg(test)]
    pub fn page(page: usize, page_size: usize) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
            ..Default::default()
        }
    }

    #[cfg(test)]
    pub fn with_search(mut self, search: &str) -> Self {
        self.search = Some(search.to_string());
        self
    }

    #[cfg(test)]
    pub fn with_range(mut self, start: Option<&str>, end: Option<&str>) -> Self {
        self.start_time = start.map(str::to_string);
        self.end_time = end.map(str::to_string);
        self
    }

    /// 1-based page; 0 is treated as 1.
    pub fn page_number(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> usize {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// The search term, or `None` when blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }

    pub fn date_range(&self, today: NaiveDate) -> Result<Option<DateRange>, StoreError> {
        DateRange::from_bounds(self.start_time.as_deref(), self.end_time.as_deref(), today)
    }
}

/// Parameters of the multi-dimension metric views.
#[derive(Debug, Clone, Default)]
pub struct MetricsQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub search: Option<String>,
    /// Exact ips to keep. Empty keeps every host.
    pub host_ips: Vec<String>,
}

impl MetricsQuery {
    pub fn list(&self) -> ListQuery {
        ListQuery {
            page: self.page,
            page_size: self.page_size,
            search: self.search.clone(),
            ..Default::default()
        }
    }

    pub fn keeps(&self, ip: &str) -> bool {
        self.host_ips.is_empty() || self.host_ips.iter().any(|wanted| wanted == ip)
    }
}

/// One page of a filtered collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    /// Size of the filtered collection before paging.
    pub total: usize,
}

/// Slice `(page - 1) * page_size .. + page_size` out of `items`.
pub fn paginate<T>(items: Vec<T>, query: &ListQuery) -> Page<T> {
    let total = items.len();
    let size = query.page_size();
    let start = (query.page_number() - 1).saturating_mul(size);

    let data = items.into_iter().skip(start).take(size).collect();
    Page { data, total }
}

/// Case-sensitive substring match against any of `fields`.
pub fn matches_any(term: Option<&str>, fields: &[&str]) -> bool {
    match term {
        Some(term) => fields.iter().any(|f| f.contains(term)),
        None => true,
    }
}

/// Inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// `None` when neither bound is given. A missing start means the epoch, a
    /// missing end means today.
    pub fn from_bounds(
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
    ) -> Result<Option<Self>, StoreError> {
        let start = start.filter(|s| !s.is_empty());
        let end = end.filter(|s| !s.is_empty());
        if start.is_none() && end.is_none() {
            return Ok(None);
        }

        let start = match start {
            Some(s) => parse_date(s)
                .ok_or_else(|| StoreError::Validation(format!("invalid start time: {}", s)))?,
            None => NaiveDate::default(),
        };
        let end = match end {
            Some(s) => parse_date(s)
                .ok_or_else(|| StoreError::Validation(format!("invalid end time: {}", s)))?,
            None => today,
        };

        Ok(Some(Self { start, end }))
    }

    /// Rows whose sample time does not parse are outside every range.
    pub fn contains(&self, sample_time: &str) -> bool {
        parse_date(sample_time)
            .map(|d| d >= self.start && d <= self.end)
            .unwrap_or(false)
    }
}

/// Parse `YYYY/MM/DD`, also accepting `YYYY-MM-DD`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let formats = ["%Y/%m/%d", "%Y-%m-%d"];

    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s.trim(), fmt).ok())
}
