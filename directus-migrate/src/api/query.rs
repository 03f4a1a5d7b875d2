//! Record filters
//!
//! Filters render to the platform's JSON filter syntax and are sent as the
//! `filter` query parameter of list requests.

use serde_json::{Map, Value, json};

/// A filter on list requests
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Neq(String, Value),
    In(String, Vec<Value>),
    IsNull(String),
    NotNull(String),
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn neq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Neq(field.into(), value.into())
    }

    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Filter::In(field.into(), values)
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Filter::IsNull(field.into())
    }

    pub fn not_null(field: impl Into<String>) -> Self {
        Filter::NotNull(field.into())
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    /// Parse `field=value` or `field!=value`; `null` matches null fields
    pub fn parse(expr: &str) -> Option<Self> {
        if let Some((field, value)) = expr.split_once("!=") {
            let field = field.trim();
            return match value.trim() {
                "null" => Some(Filter::not_null(field)),
                value => Some(Filter::neq(field, value)),
            };
        }
        let (field, value) = expr.split_once('=')?;
        let field = field.trim();
        if field.is_empty() {
            return None;
        }
        match value.trim() {
            "null" => Some(Filter::is_null(field)),
            value => Some(Filter::eq(field, value)),
        }
    }

    /// JSON form of this filter
    pub fn to_json(&self) -> Value {
        match self {
            Filter::Eq(field, value) => operator(field, "_eq", value.clone()),
            Filter::Neq(field, value) => operator(field, "_neq", value.clone()),
            Filter::In(field, values) => operator(field, "_in", Value::Array(values.clone())),
            Filter::IsNull(field) => operator(field, "_null", Value::Bool(true)),
            Filter::NotNull(field) => operator(field, "_nnull", Value::Bool(true)),
            Filter::And(filters) => {
                json!({ "_and": filters.iter().map(Filter::to_json).collect::<Vec<_>>() })
            }
        }
    }

    /// URL-encoded `filter` query parameter
    pub fn to_query_param(&self) -> String {
        format!("filter={}", urlencoding::encode(&self.to_json().to_string()))
    }

    /// Evaluate against a record (used by in-process transports)
    pub fn matches(&self, record: &super::Record) -> bool {
        let field_value = |field: &str| record.get(field).cloned().unwrap_or(Value::Null);
        match self {
            Filter::Eq(field, value) => loosely_equal(&field_value(field), value),
            Filter::Neq(field, value) => !loosely_equal(&field_value(field), value),
            Filter::In(field, values) => {
                let actual = field_value(field);
                values.iter().any(|v| loosely_equal(&actual, v))
            }
            Filter::IsNull(field) => field_value(field).is_null(),
            Filter::NotNull(field) => !field_value(field).is_null(),
            Filter::And(filters) => filters.iter().all(|f| f.matches(record)),
        }
    }
}

/// `{ field: { op: value } }`
fn operator(field: &str, op: &str, value: Value) -> Value {
    let mut condition = Map::new();
    condition.insert(op.to_string(), value);
    let mut filter = Map::new();
    filter.insert(field.to_string(), Value::Object(condition));
    Value::Object(filter)
}

/// Compare values, treating `42` and `"42"` as equal
fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    match (actual, expected) {
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => n.to_string() == *s,
        (Value::Bool(b), Value::String(s)) | (Value::String(s), Value::Bool(b)) => b.to_string() == *s,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_json() {
        assert_eq!(Filter::eq("name", "Editor").to_json(), json!({"name": {"_eq": "Editor"}}));
        assert_eq!(
            Filter::and(vec![Filter::not_null("policy"), Filter::eq("action", "read")]).to_json(),
            json!({"_and": [{"policy": {"_nnull": true}}, {"action": {"_eq": "read"}}]})
        );
    }

    #[test]
    fn test_query_param_is_encoded() {
        let param = Filter::eq("name", "A B").to_query_param();
        assert!(param.starts_with("filter="));
        assert!(!param.contains(' '));
        assert!(param.contains("%7B"));
    }

    #[test]
    fn test_parse() {
        assert_eq!(Filter::parse("name=Editor"), Some(Filter::eq("name", "Editor")));
        assert_eq!(Filter::parse("parent=null"), Some(Filter::is_null("parent")));
        assert_eq!(Filter::parse("policy!=null"), Some(Filter::not_null("policy")));
        assert_eq!(Filter::parse("role != abc"), Some(Filter::neq("role", "abc")));
        assert_eq!(Filter::parse("nonsense"), None);
        assert_eq!(Filter::parse("=x"), None);
    }

    #[test]
    fn test_matches() {
        let record = match json!({"id": 7, "name": "Editor", "parent": null}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        assert!(Filter::eq("id", "7").matches(&record));
        assert!(Filter::is_null("parent").matches(&record));
        assert!(Filter::is_null("missing").matches(&record));
        assert!(!Filter::not_null("parent").matches(&record));
        assert!(Filter::is_in("name", vec![json!("Viewer"), json!("Editor")]).matches(&record));
    }
}
