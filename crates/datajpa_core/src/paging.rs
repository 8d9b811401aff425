//! Paging and sorting value types for repository queries.
//!
//! # Responsibility
//! - Describe which page of a result set a caller wants, and in which order.
//! - Wrap query results with page metadata (`Page`) or a cheaper
//!   "is there more" marker (`Slice`).
//!
//! # Invariants
//! - Page numbers are 0-based.
//! - Sort properties are a closed enum and map to fixed column names.
//! - `Page::total_pages` is `ceil(total / size)`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Sort direction for one order clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Member attributes that queries may sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberProperty {
    Id,
    Name,
    Age,
}

impl MemberProperty {
    pub(crate) fn column(self) -> &'static str {
        match self {
            Self::Id => "m.member_id",
            Self::Name => "m.name",
            Self::Age => "m.age",
        }
    }
}

impl FromStr for MemberProperty {
    type Err = SortParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "name" => Ok(Self::Name),
            "age" => Ok(Self::Age),
            other => Err(SortParseError::UnknownProperty(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SortParseError {
    #[error("unknown sort property `{0}`; expected id|name|age")]
    UnknownProperty(String),
    #[error("unknown sort direction `{0}`; expected asc|desc")]
    UnknownDirection(String),
}

/// Ordered list of sort clauses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    orders: Vec<(MemberProperty, SortDirection)>,
}

impl Sort {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(direction: SortDirection, property: MemberProperty) -> Self {
        Self {
            orders: vec![(property, direction)],
        }
    }

    /// Appends another clause, applied after the existing ones.
    pub fn and(mut self, direction: SortDirection, property: MemberProperty) -> Self {
        self.orders.push((property, direction));
        self
    }

    /// Parses `property[,direction]` clauses separated by `;`,
    /// e.g. `name,desc;age`.
    pub fn parse(value: &str) -> Result<Self, SortParseError> {
        let mut sort = Self::unsorted();
        for clause in value.split(';').map(str::trim).filter(|c| !c.is_empty()) {
            let mut parts = clause.splitn(2, ',');
            let property: MemberProperty = parts.next().unwrap_or_default().parse()?;
            let direction = match parts.next().map(|d| d.trim().to_ascii_lowercase()) {
                None => SortDirection::Asc,
                Some(d) if d == "asc" => SortDirection::Asc,
                Some(d) if d == "desc" => SortDirection::Desc,
                Some(d) => return Err(SortParseError::UnknownDirection(d)),
            };
            sort.orders.push((property, direction));
        }
        Ok(sort)
    }

    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn orders(&self) -> &[(MemberProperty, SortDirection)] {
        &self.orders
    }

    /// Renders an `ORDER BY` clause.
    ///
    /// Member id is appended as a tie-breaker so paging is deterministic.
    pub(crate) fn to_order_by(&self) -> String {
        let mut clauses: Vec<String> = self
            .orders
            .iter()
            .map(|(property, direction)| format!("{} {}", property.column(), direction.as_sql()))
            .collect();
        if !self
            .orders
            .iter()
            .any(|(property, _)| *property == MemberProperty::Id)
        {
            clauses.push("m.member_id ASC".to_string());
        }
        format!(" ORDER BY {}", clauses.join(", "))
    }
}

/// Request for one 0-based page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    size: u32,
    sort: Sort,
}

impl PageRequest {
    pub fn of(page: u32, size: u32) -> Self {
        Self::of_sorted(page, size, Sort::unsorted())
    }

    pub fn of_sorted(page: u32, size: u32, sort: Sort) -> Self {
        Self { page, size, sort }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    /// Row offset of the first element on this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    /// Request for the following page with the same size and sort.
    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            size: self.size,
            sort: self.sort.clone(),
        }
    }
}

impl Display for PageRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "page={} size={}", self.page, self.size)
    }
}

/// Page of results plus the total element count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    content: Vec<T>,
    number: u32,
    size: u32,
    total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            number: request.page(),
            size: request.size(),
            total_elements,
        }
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    /// 0-based page number.
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total_elements.div_ceil(u64::from(self.size))
    }

    pub fn is_first(&self) -> bool {
        self.number == 0
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.number) + 1 < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
        }
    }
}

/// Page of results without a total count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice<T> {
    content: Vec<T>,
    number: u32,
    size: u32,
    has_next: bool,
}

impl<T> Slice<T> {
    /// Builds a slice from rows fetched with `limit = size + 1`.
    ///
    /// The extra row only signals that another slice exists and is dropped.
    pub fn from_lookahead(mut rows: Vec<T>, request: &PageRequest) -> Self {
        let size = request.size() as usize;
        let has_next = rows.len() > size;
        rows.truncate(size);
        Self {
            content: rows,
            number: request.page(),
            size: request.size(),
            has_next,
        }
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn is_first(&self) -> bool {
        self.number == 0
    }

    pub fn is_last(&self) -> bool {
        !self.has_next
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }

    pub fn map<U, F>(self, f: F) -> Slice<U>
    where
        F: FnMut(T) -> U,
    {
        Slice {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            has_next: self.has_next,
        }
    }
}
