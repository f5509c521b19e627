use crate::index::document::Document;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchOperator {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Query {
    MatchAll,
    MatchNone,
    /// Exact whole-value match on a keyword field (numeric fields compare by value).
    Term { field: String, value: String },
    Prefix { field: String, prefix: String },
    /// Anchored regular expression over a field's whole values.
    Regexp { field: String, pattern: String },
    /// Analyzed match with no fuzziness.
    Match {
        field: String,
        text: String,
        operator: MatchOperator,
    },
    MatchPhrase { field: String, text: String },
    NumericRange {
        field: String,
        min: Option<f64>,
        max: Option<f64>,
        inclusive_min: bool,
        inclusive_max: bool,
    },
    Conjunction(Vec<Query>),
    Disjunction(Vec<Query>),
}

impl Query {
    pub fn term(field: &str, value: impl Into<String>) -> Self {
        Query::Term {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn prefix(field: &str, prefix: impl Into<String>) -> Self {
        Query::Prefix {
            field: field.to_string(),
            prefix: prefix.into(),
        }
    }

    pub fn regexp(field: &str, pattern: impl Into<String>) -> Self {
        Query::Regexp {
            field: field.to_string(),
            pattern: pattern.into(),
        }
    }

    pub fn matching(field: &str, text: impl Into<String>) -> Self {
        Query::Match {
            field: field.to_string(),
            text: text.into(),
            operator: MatchOperator::And,
        }
    }

    pub fn phrase(field: &str, text: impl Into<String>) -> Self {
        Query::MatchPhrase {
            field: field.to_string(),
            text: text.into(),
        }
    }

    /// `[min, max]`
    pub fn range_inclusive(field: &str, min: f64, max: f64) -> Self {
        Query::NumericRange {
            field: field.to_string(),
            min: Some(min),
            max: Some(max),
            inclusive_min: true,
            inclusive_max: true,
        }
    }

    /// `[min, max)`
    pub fn range_half_open(field: &str, min: f64, max: f64) -> Self {
        Query::NumericRange {
            field: field.to_string(),
            min: Some(min),
            max: Some(max),
            inclusive_min: true,
            inclusive_max: false,
        }
    }

    /// Single sub-query stays as is; none becomes `MatchAll`.
    pub fn and(mut queries: Vec<Query>) -> Self {
        match queries.len() {
            0 => Query::MatchAll,
            1 => queries.remove(0),
            _ => Query::Conjunction(queries),
        }
    }

    /// Single sub-query stays as is; none becomes `MatchNone`.
    pub fn or(mut queries: Vec<Query>) -> Self {
        match queries.len() {
            0 => Query::MatchNone,
            1 => queries.remove(0),
            _ => Query::Disjunction(queries),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortField {
    pub field: String,
    pub descending: bool,
}

impl SortField {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: false,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: Query,
    /// Zero returns only the total.
    pub size: usize,
    pub from: usize,
    /// `None` keeps index order.
    pub sort: Option<SortField>,
    /// Stored fields to return. Empty returns all.
    pub fields: Vec<String>,
}

impl SearchRequest {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            size: 10,
            from: 0,
            sort: None,
            fields: Vec::new(),
        }
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn offset(mut self, from: usize) -> Self {
        self.from = from;
        self
    }

    pub fn sort(mut self, sort: SortField) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn fields<S: AsRef<str>>(mut self, fields: &[S]) -> Self {
        self.fields = fields.iter().map(|f| f.as_ref().to_string()).collect();
        self
    }

    /// Count-only request.
    pub fn count(query: Query) -> Self {
        Self::new(query).size(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: String,
    pub fields: Document,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    pub total: u64,
    pub hits: Vec<Hit>,
}
