//! Query builder for collection requests

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::models::EntityKind;

/// Characters left untouched in query values
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Bool(bool),
    /// Matches entities where the attribute is unset
    Null,
}

impl FilterValue {
    fn render(&self) -> String {
        match self {
            FilterValue::Text(s) => s.clone(),
            FilterValue::Bool(b) => b.to_string(),
            FilterValue::Null => String::new(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Text(s)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Bool(b)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub kind: EntityKind,
    pub filters: Vec<(String, FilterValue)>,
    pub inexact: bool,
    pub sort: Option<String>,
    pub page_size: u32,
    pub page: u32,
}

impl Query {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            filters: Vec::new(),
            inexact: false,
            sort: None,
            page_size: 10_000,
            page: 1,
        }
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    pub fn null(mut self, key: impl Into<String>) -> Self {
        self.filters.push((key.into(), FilterValue::Null));
        self
    }

    /// Substring, case-insensitive matching for every filter
    pub fn inexact(mut self) -> Self {
        self.inexact = true;
        self
    }

    pub fn sort(mut self, key: impl Into<String>) -> Self {
        self.sort = Some(key.into());
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    pub fn to_query_string(&self) -> String {
        let mut pairs: Vec<String> = self
            .filters
            .iter()
            .map(|(key, value)| format!("{}={}", key, utf8_percent_encode(&value.render(), QUERY_VALUE)))
            .collect();

        pairs.push(format!("_pageSize={}", self.page_size));
        pairs.push(format!("_page={}", self.page));
        if let Some(sort) = &self.sort {
            pairs.push(format!("_sort={}", utf8_percent_encode(sort, QUERY_VALUE)));
        }
        if self.inexact {
            pairs.push("_inexact=1".to_string());
        }
        pairs.join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_paging_and_filters() {
        let query = Query::new(EntityKind::SchemaNode).filter("isBuiltinType", false).sort("name");
        assert_eq!(query.to_query_string(), "isBuiltinType=false&_pageSize=10000&_page=1&_sort=name");
    }

    #[test]
    fn test_null_filter_renders_empty_value() {
        let query = Query::new(EntityKind::SchemaMethod).null("schemaNode").page_size(50);
        assert_eq!(query.to_query_string(), "schemaNode=&_pageSize=50&_page=1");
    }

    #[test]
    fn test_inexact_and_escaping() {
        let query = Query::new(EntityKind::SchemaMethod).filter("source", "a b&c").inexact();
        assert_eq!(query.to_query_string(), "source=a%20b%26c&_pageSize=10000&_page=1&_inexact=1");
    }
}
