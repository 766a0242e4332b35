//! Search, sort, and paging parameter builders.
//!
//! These helpers only produce [`Parameters`]; the repository adds the action
//! flag and sends the command.

use std::fmt;

use thiserror::Error;

use super::command::{Parameters, quote_string};

/// Most sort fields a single request may carry.
pub const MAX_SORT_FIELDS: usize = 9;

/// Direction of a sort field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SortOrder {
    /// `ascend`.
    Ascend,
    /// `descend`.
    Descend,
    /// Order by the named value list.
    Custom(String),
}

impl SortOrder {
    const fn as_str(&self) -> &str {
        match self {
            Self::Ascend => "ascend",
            Self::Descend => "descend",
            Self::Custom(value_list) => value_list.as_str(),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered list of sort fields, numbered from 1 on the wire.
///
/// # Examples
/// ```
/// use fmclient::domain::{Sort, SortOrder};
///
/// let sort = Sort::new().by("last_name", SortOrder::Ascend).by("age", SortOrder::Descend);
/// let parameters = sort.to_parameters()?;
/// let keys: Vec<_> = parameters.iter().map(|(key, _)| key).collect();
/// assert_eq!(keys, ["-sortfield.1", "-sortorder.1", "-sortfield.2", "-sortorder.2"]);
/// # Ok::<(), fmclient::domain::TooManySortFields>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sort {
    fields: Vec<(String, SortOrder)>,
}

/// More than [`MAX_SORT_FIELDS`] sort fields were supplied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("at most {limit} sort fields are allowed, got {sort}")]
pub struct TooManySortFields {
    /// Maximum accepted.
    pub limit: usize,
    /// Rendered offending sort specification.
    pub sort: String,
}

impl Sort {
    /// No sort fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sort field.
    #[must_use]
    pub fn by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.fields.push((field.into(), order));
        self
    }

    /// Number of sort fields.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no sort fields were supplied.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render `-sortfield.N` / `-sortorder.N` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`TooManySortFields`] when more than [`MAX_SORT_FIELDS`] fields
    /// are present.
    pub fn to_parameters(&self) -> Result<Parameters, TooManySortFields> {
        if self.fields.len() > MAX_SORT_FIELDS {
            return Err(TooManySortFields {
                limit: MAX_SORT_FIELDS,
                sort: self.to_string(),
            });
        }

        let mut parameters = Parameters::new();
        for (index, (field, order)) in (1_usize..).zip(&self.fields) {
            parameters.insert(format!("-sortfield.{index}"), field.as_str());
            parameters.insert(format!("-sortorder.{index}"), order.as_str());
        }
        Ok(parameters)
    }
}

impl<F: Into<String>> FromIterator<(F, SortOrder)> for Sort {
    fn from_iter<I: IntoIterator<Item = (F, SortOrder)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(field, order)| (field.into(), order))
                .collect(),
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (position, (field, order)) in self.fields.iter().enumerate() {
            if position > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{field}: {order}")?;
        }
        f.write_str("}")
    }
}

/// Field criteria for a `-find` request.
///
/// Values are escaped with [`quote_string`] unless quoting is disabled, in
/// which case they pass through as raw search syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Search {
    criteria: Vec<(String, String)>,
    auto_quote: bool,
}

impl Default for Search {
    fn default() -> Self {
        Self {
            criteria: Vec::new(),
            auto_quote: true,
        }
    }
}

impl Search {
    /// Empty search with quoting enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field criterion.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.criteria.push((name.into(), value.into()));
        self
    }

    /// Pass values through without escaping.
    #[must_use]
    pub fn raw(mut self) -> Self {
        self.auto_quote = false;
        self
    }

    /// Whether no criteria were supplied.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Render one parameter per criterion.
    #[must_use]
    pub fn to_parameters(&self) -> Parameters {
        self.criteria
            .iter()
            .map(|(name, value)| {
                let rendered = if self.auto_quote {
                    quote_string(value)
                } else {
                    value.clone()
                };
                (name.as_str(), rendered)
            })
            .collect()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Search {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |search, (name, value)| search.field(name, value))
    }
}

/// Optional `-max` / `-skip` paging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Range {
    /// Maximum number of records to return.
    pub limit: Option<u64>,
    /// Number of records to skip.
    pub offset: Option<u64>,
}

impl Range {
    /// Server defaults for both.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            limit: None,
            offset: None,
        }
    }

    /// Explicit limit and offset.
    #[must_use]
    pub const fn new(limit: Option<u64>, offset: Option<u64>) -> Self {
        Self { limit, offset }
    }

    /// Render only the values that are present.
    #[must_use]
    pub fn to_parameters(self) -> Parameters {
        let mut parameters = Parameters::new();
        if let Some(limit) = self.limit {
            parameters.insert("-max", limit);
        }
        if let Some(offset) = self.offset {
            parameters.insert("-skip", offset);
        }
        parameters
    }
}

/// One criterion of a compound find.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    field: String,
    value: String,
    exclude: bool,
}

impl Query {
    /// Criterion whose value is escaped with [`quote_string`].
    #[must_use]
    pub fn new(field: impl Into<String>, value: &str) -> Self {
        Self::raw(field, quote_string(value))
    }

    /// Criterion whose value is sent as raw search syntax.
    #[must_use]
    pub fn raw(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            exclude: false,
        }
    }

    /// Omit matching records instead of finding them.
    #[must_use]
    pub fn excluding(mut self) -> Self {
        self.exclude = true;
        self
    }

    /// Field searched.
    #[must_use]
    pub const fn field(&self) -> &str {
        self.field.as_str()
    }

    /// Search value as sent.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.value.as_str()
    }

    /// Whether the criterion omits matches.
    #[must_use]
    pub const fn is_excluded(&self) -> bool {
        self.exclude
    }
}

/// Compound `-findquery` request.
///
/// Each request is a group of criteria that must all match; records matching
/// any non-excluded request are found, then excluded requests are omitted.
///
/// # Examples
/// ```
/// use fmclient::domain::{FindQuery, Query};
///
/// let query = FindQuery::new()
///     .add_and_queries([Query::new("city", "Berlin"), Query::new("age", "30")])
///     .add_or_queries([Query::new("status", "closed").excluding()]);
/// let parameters = query.to_parameters();
/// let rendered: Vec<_> = parameters
///     .iter()
///     .map(|(key, value)| format!("{key}={value:?}"))
///     .collect();
/// assert_eq!(rendered[0], r#"-query=Text("(q1,q2);!(q3)")"#);
/// assert_eq!(rendered[1], r#"-q1=Text("city")"#);
/// assert_eq!(rendered[2], r#"-q1.value=Text("Berlin")"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindQuery {
    requests: Vec<Vec<Query>>,
}

impl FindQuery {
    /// No requests.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add each query as a separate request.
    #[must_use]
    pub fn add_or_queries(mut self, queries: impl IntoIterator<Item = Query>) -> Self {
        self.requests
            .extend(queries.into_iter().map(|query| vec![query]));
        self
    }

    /// Add all queries as one request.
    #[must_use]
    pub fn add_and_queries(mut self, queries: impl IntoIterator<Item = Query>) -> Self {
        let request: Vec<Query> = queries.into_iter().collect();
        if !request.is_empty() {
            self.requests.push(request);
        }
        self
    }

    /// Whether no requests were added.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Render `-query` plus numbered `-qN` / `-qN.value` parameters.
    #[must_use]
    pub fn to_parameters(&self) -> Parameters {
        let mut parameters = Parameters::new();
        if self.requests.is_empty() {
            return parameters;
        }

        let mut numbered = Vec::new();
        let mut rendered_requests = Vec::with_capacity(self.requests.len());
        let mut next = 1_usize;

        for request in &self.requests {
            let mut identifiers = Vec::with_capacity(request.len());
            for query in request {
                identifiers.push(format!("q{next}"));
                numbered.push((next, query));
                next += 1;
            }
            let excluded = request.iter().any(Query::is_excluded);
            let prefix = if excluded { "!" } else { "" };
            rendered_requests.push(format!("{prefix}({})", identifiers.join(",")));
        }

        parameters.insert("-query", rendered_requests.join(";"));
        for (number, query) in numbered {
            parameters.insert(format!("-q{number}"), query.field());
            parameters.insert(format!("-q{number}.value"), query.value());
        }
        parameters
    }
}
