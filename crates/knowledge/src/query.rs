//! KNN query protocol.
//!
//! Text form: `[@field:{value} ]*=>[KNN k @vector_field $param AS alias]`.
//! Tag values escape every character that is not alphanumeric or `_`
//! with a backslash.

use crate::schema::{FIELD_CATEGORY, FIELD_EMBEDDING};
use docrag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PARAM: &str = "vec";
pub const DEFAULT_SCORE_ALIAS: &str = "score";

/// Exact-match pre-filter on a tag attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFilter {
    pub field: String,
    pub value: String,
}

impl TagFilter {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, value: Option<&str>) -> bool {
        value == Some(self.value.as_str())
    }
}

/// A k-nearest-neighbour query, optionally AND-ed with a tag filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnnQuery {
    pub k: usize,
    pub vector_field: String,
    pub param: String,
    pub score_alias: String,
    pub filter: Option<TagFilter>,
}

impl KnnQuery {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            vector_field: FIELD_EMBEDDING.to_string(),
            param: DEFAULT_PARAM.to_string(),
            score_alias: DEFAULT_SCORE_ALIAS.to_string(),
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: TagFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Scope to one `category` tag value.
    pub fn with_category(self, category: impl Into<String>) -> Self {
        self.with_filter(TagFilter::new(FIELD_CATEGORY, category))
    }
}

fn escape_tag(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if !(c.is_alphanumeric() || c == '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl fmt::Display for KnnQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref filter) = self.filter {
            write!(f, "@{}:{{{}}} ", filter.field, escape_tag(&filter.value))?;
        }
        write!(
            f,
            "*=>[KNN {} @{} ${} AS {}]",
            self.k, self.vector_field, self.param, self.score_alias
        )
    }
}

fn malformed(text: &str, reason: &str) -> AppError {
    AppError::Query(format!("Malformed KNN query '{}': {}", text, reason))
}

/// Parse `@field:{value}` and return the filter plus the remaining text.
fn parse_filter<'a>(text: &str, input: &'a str) -> AppResult<(TagFilter, &'a str)> {
    let (field, rest) = input
        .split_once(":{")
        .ok_or_else(|| malformed(text, "tag filter must look like @field:{value}"))?;
    if field.is_empty() || !field.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(malformed(text, "invalid filter field name"));
    }

    let mut value = String::new();
    let mut chars = rest.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, escaped)) => value.push(escaped),
                None => return Err(malformed(text, "dangling escape in tag value")),
            },
            '}' => return Ok((TagFilter::new(field, value), &rest[i + 1..])),
            _ => value.push(c),
        }
    }

    Err(malformed(text, "unterminated tag value"))
}

impl FromStr for KnnQuery {
    type Err = AppError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();

        let (filter, rest) = match trimmed.strip_prefix('@') {
            Some(after_at) => {
                let (filter, rest) = parse_filter(text, after_at)?;
                (Some(filter), rest.trim_start())
            }
            None => (None, trimmed),
        };

        let body = rest
            .strip_prefix("*=>[")
            .and_then(|b| b.strip_suffix(']'))
            .ok_or_else(|| malformed(text, "expected *=>[KNN ...]"))?;

        let tokens: Vec<&str> = body.split_whitespace().collect();
        let [knn, k, field, param, as_kw, alias] = tokens.as_slice() else {
            return Err(malformed(
                text,
                "expected KNN <k> @<field> $<param> AS <alias>",
            ));
        };

        if !knn.eq_ignore_ascii_case("KNN") || !as_kw.eq_ignore_ascii_case("AS") {
            return Err(malformed(text, "expected KNN ... AS ..."));
        }

        let k: usize = k
            .parse()
            .map_err(|_| malformed(text, "k must be a non-negative integer"))?;
        let vector_field = field
            .strip_prefix('@')
            .filter(|f| !f.is_empty())
            .ok_or_else(|| malformed(text, "vector field must start with @"))?;
        let param = param
            .strip_prefix('$')
            .filter(|p| !p.is_empty())
            .ok_or_else(|| malformed(text, "parameter must start with $"))?;

        Ok(Self {
            k,
            vector_field: vector_field.to_string(),
            param: param.to_string(),
            score_alias: alias.to_string(),
            filter,
        })
    }
}
