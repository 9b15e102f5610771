//! Column projections and filter predicates for record queries.
//!
//! The same [`Filter`] value is rendered onto the wire by the HTTP adapter
//! and evaluated directly by the in-memory store, so both agree on what a
//! predicate selects.

use serde::Serialize;
use serde_json::Value;

use super::record::Record;

/// A predicate on one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Filter {
    /// Column equals value.
    Eq { column: String, value: Value },
    /// Column is present and differs from value.
    Neq { column: String, value: Value },
    /// Case-insensitive pattern; `%` matches any run, `_` one character.
    ILike { column: String, pattern: String },
    /// Case-sensitive pattern with the same wildcards as `ILike`.
    Like { column: String, pattern: String },
    /// Column value is one of the listed values.
    In { column: String, values: Vec<Value> },
    /// Column is missing or null.
    IsNull { column: String },
    /// Any of the nested predicates holds.
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn neq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Neq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn ilike(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::ILike {
            column: column.into(),
            pattern: pattern.into(),
        }
    }

    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Like {
            column: column.into(),
            pattern: pattern.into(),
        }
    }

    pub fn is_in<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self::IsNull {
            column: column.into(),
        }
    }

    pub fn any(filters: impl IntoIterator<Item = Self>) -> Self {
        Self::Or(filters.into_iter().collect())
    }

    /// Case-insensitive substring match on `column`.
    ///
    /// Wildcard characters inside `needle` are escaped so they match literally.
    pub fn contains_ci(column: impl Into<String>, needle: &str) -> Self {
        Self::ilike(column, format!("%{}%", escape_pattern(needle)))
    }

    /// Whether `record` satisfies this predicate.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Eq { column, value } => record
                .get(column)
                .is_some_and(|field| values_equal(field, value)),
            Self::Neq { column, value } => record
                .get(column)
                .is_some_and(|field| !field.is_null() && !values_equal(field, value)),
            Self::ILike { column, pattern } => text_field(record, column)
                .is_some_and(|text| like_match(pattern, &text, true)),
            Self::Like { column, pattern } => text_field(record, column)
                .is_some_and(|text| like_match(pattern, &text, false)),
            Self::In { column, values } => record
                .get(column)
                .is_some_and(|field| values.iter().any(|v| values_equal(field, v))),
            Self::IsNull { column } => record.get(column).is_none_or(Value::is_null),
            Self::Or(filters) => filters.iter().any(|f| f.matches(record)),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

/// Ordering on one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Desc,
        }
    }
}

/// Projection, predicates and modifiers for one request.
///
/// All filters must hold (logical AND); use [`Filter::Or`] for alternatives.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Query {
    /// Columns to return; `None` returns every column.
    pub columns: Option<Vec<String>>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query matching a single `id`.
    pub fn by_id(id: impl Into<Value>) -> Self {
        Self::new().filter(Filter::eq("id", id))
    }

    /// Restrict the returned columns. Accepts `"id, name_en"` style lists.
    #[must_use]
    pub fn columns(mut self, columns: &str) -> Self {
        let cols: Vec<String> = columns
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        self.columns = if cols.is_empty() || cols.iter().any(|c| c == "*") {
            None
        } else {
            Some(cols)
        };
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Projection in wire form.
    pub fn select_clause(&self) -> String {
        self.columns
            .as_ref()
            .map_or_else(|| "*".to_string(), |cols| cols.join(","))
    }

    /// Whether every filter holds for `record`.
    pub fn matches(&self, record: &Record) -> bool {
        self.filters.iter().all(|f| f.matches(record))
    }

    /// Copy of `record` restricted to the projected columns.
    pub fn project(&self, record: &Record) -> Record {
        match &self.columns {
            None => record.clone(),
            Some(cols) => cols
                .iter()
                .filter_map(|c| record.get(c).map(|v| (c.clone(), v.clone())))
                .collect(),
        }
    }
}

/// Escape `%`, `_` and `\` so they match literally inside a pattern.
pub fn escape_pattern(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// SQL `LIKE` matching with `%`, `_` and backslash escapes.
pub fn like_match(pattern: &str, text: &str, case_insensitive: bool) -> bool {
    let fold = |s: &str| -> Vec<char> {
        if case_insensitive {
            s.chars().flat_map(char::to_lowercase).collect()
        } else {
            s.chars().collect()
        }
    };

    #[derive(Clone, Copy)]
    enum Token {
        Any,
        One,
        Lit(char),
    }

    let pat = fold(pattern);
    let mut tokens = Vec::with_capacity(pat.len());
    let mut iter = pat.into_iter();
    while let Some(ch) = iter.next() {
        match ch {
            '%' => tokens.push(Token::Any),
            '_' => tokens.push(Token::One),
            '\\' => tokens.push(Token::Lit(iter.next().unwrap_or('\\'))),
            c => tokens.push(Token::Lit(c)),
        }
    }
    let text = fold(text);

    // Greedy match with single-star backtracking.
    let (mut t, mut p) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        match tokens.get(p) {
            Some(Token::Lit(c)) if *c == text[t] => {
                t += 1;
                p += 1;
            }
            Some(Token::One) => {
                t += 1;
                p += 1;
            }
            Some(Token::Any) => {
                star = Some((p, t));
                p += 1;
            }
            _ => match star {
                Some((sp, st)) => {
                    p = sp + 1;
                    t = st + 1;
                    star = Some((sp, st + 1));
                }
                None => return false,
            },
        }
    }
    tokens[p..].iter().all(|tok| matches!(tok, Token::Any))
}

/// Text form of a JSON scalar as the backend would compare it.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn values_equal(field: &Value, wanted: &Value) -> bool {
    if field.is_null() {
        return false;
    }
    field == wanted || value_text(field) == value_text(wanted)
}

fn text_field(record: &Record, column: &str) -> Option<String> {
    match record.get(column)? {
        Value::Null | Value::Array(_) | Value::Object(_) => None,
        scalar => Some(value_text(scalar)),
    }
}
