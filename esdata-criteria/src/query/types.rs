//! Compiled query tree
//!
//! These types model the subset of the Elasticsearch query DSL the criteria
//! compiler emits.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// A node of the compiled query tree
#[derive(Debug, Clone, PartialEq)]
pub enum QueryExpression {
    /// Single-field text match, optionally with wildcards
    Field(FieldQuery),

    /// Query-string expression scoped to fields
    QueryString(QueryStringQuery),

    /// Range match with optional bounds
    Range(RangeQuery),

    /// Edit-distance match
    Fuzzy(FuzzyQuery),

    /// Boolean compound (should, must_not, must)
    Bool(BoolQuery),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldQuery {
    pub field: String,
    pub query: Value,
    /// Set for wildcard patterns
    pub analyze_wildcard: Option<bool>,
    pub boost: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryStringQuery {
    pub query: String,
    pub fields: Vec<String>,
    pub boost: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeQuery {
    pub field: String,
    pub from: Option<Value>,
    pub to: Option<Value>,
    pub boost: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyQuery {
    pub field: String,
    pub value: String,
    pub fuzziness: Option<String>,
    pub boost: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    pub should: Vec<QueryExpression>,
    pub must_not: Vec<QueryExpression>,
    pub must: Vec<QueryExpression>,
    pub boost: Option<f32>,
}

/// Tree-building API for `bool` queries.
///
/// The compiler feeds every clause through this trait, so alternative
/// builders can observe the exact insertion sequence.
pub trait BoolClauseSink {
    fn should(&mut self, query: QueryExpression);
    fn must_not(&mut self, query: QueryExpression);
    fn must(&mut self, query: QueryExpression);
}

impl BoolClauseSink for BoolQuery {
    fn should(&mut self, query: QueryExpression) {
        self.should.push(query);
    }

    fn must_not(&mut self, query: QueryExpression) {
        self.must_not.push(query);
    }

    fn must(&mut self, query: QueryExpression) {
        self.must.push(query);
    }
}

impl BoolQuery {
    pub fn is_empty(&self) -> bool {
        self.should.is_empty() && self.must_not.is_empty() && self.must.is_empty()
    }

    pub fn clause_count(&self) -> usize {
        self.should.len() + self.must_not.len() + self.must.len()
    }
}

/// Capability of a query node to carry a relevance boost
pub trait Boostable {
    fn boost(&self) -> Option<f32>;
    fn set_boost(&mut self, boost: f32);
}

macro_rules! impl_boostable {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Boostable for $ty {
                fn boost(&self) -> Option<f32> {
                    self.boost
                }

                fn set_boost(&mut self, boost: f32) {
                    self.boost = Some(boost);
                }
            }
        )+
    };
}

impl_boostable!(FieldQuery, QueryStringQuery, RangeQuery, FuzzyQuery, BoolQuery);

impl QueryExpression {
    /// Exact match of `value` on `field`
    pub fn field(field: impl Into<String>, value: Value) -> Self {
        QueryExpression::Field(FieldQuery {
            field: field.into(),
            query: value,
            analyze_wildcard: None,
            boost: None,
        })
    }

    /// Wildcard pattern on `field`
    pub fn wildcard(field: impl Into<String>, pattern: String, analyze_wildcard: bool) -> Self {
        QueryExpression::Field(FieldQuery {
            field: field.into(),
            query: Value::String(pattern),
            analyze_wildcard: Some(analyze_wildcard),
            boost: None,
        })
    }

    pub fn query_string(query: impl Into<String>, field: impl Into<String>) -> Self {
        QueryExpression::QueryString(QueryStringQuery {
            query: query.into(),
            fields: vec![field.into()],
            boost: None,
        })
    }

    pub fn range(field: impl Into<String>, from: Option<Value>, to: Option<Value>) -> Self {
        QueryExpression::Range(RangeQuery {
            field: field.into(),
            from,
            to,
            boost: None,
        })
    }

    pub fn fuzzy(
        field: impl Into<String>,
        value: impl Into<String>,
        fuzziness: Option<String>,
    ) -> Self {
        QueryExpression::Fuzzy(FuzzyQuery {
            field: field.into(),
            value: value.into(),
            fuzziness,
            boost: None,
        })
    }

    /// OR-compound: every clause goes to `should`
    pub fn any_of(clauses: Vec<QueryExpression>) -> Self {
        QueryExpression::Bool(BoolQuery {
            should: clauses,
            ..Default::default()
        })
    }

    /// AND-compound: every clause goes to `must`
    pub fn all_of(clauses: Vec<QueryExpression>) -> Self {
        QueryExpression::Bool(BoolQuery {
            must: clauses,
            ..Default::default()
        })
    }

    /// Boost capability of this node, if it has one
    pub fn as_boostable_mut(&mut self) -> Option<&mut dyn Boostable> {
        match self {
            QueryExpression::Field(q) => Some(q),
            QueryExpression::QueryString(q) => Some(q),
            QueryExpression::Range(q) => Some(q),
            QueryExpression::Fuzzy(q) => Some(q),
            QueryExpression::Bool(q) => Some(q),
        }
    }

    pub fn boost(&self) -> Option<f32> {
        match self {
            QueryExpression::Field(q) => q.boost,
            QueryExpression::QueryString(q) => q.boost,
            QueryExpression::Range(q) => q.boost,
            QueryExpression::Fuzzy(q) => q.boost,
            QueryExpression::Bool(q) => q.boost,
        }
    }

    pub fn query_type(&self) -> &'static str {
        match self {
            QueryExpression::Field(_) => "field",
            QueryExpression::QueryString(_) => "query_string",
            QueryExpression::Range(_) => "range",
            QueryExpression::Fuzzy(_) => "fuzzy",
            QueryExpression::Bool(_) => "bool",
        }
    }

    /// Render as Elasticsearch query DSL.
    ///
    /// Keys keep insertion order, so a `bool` renders `should`, `must_not`
    /// and `must` in that sequence. Empty clause lists and unset boosts are
    /// left out.
    pub fn to_dsl(&self) -> Value {
        let (kind, body) = match self {
            QueryExpression::Field(q) => {
                let mut params = Map::new();
                params.insert("query".to_string(), q.query.clone());
                if let Some(analyze) = q.analyze_wildcard {
                    params.insert("analyze_wildcard".to_string(), Value::Bool(analyze));
                }
                insert_boost(&mut params, q.boost);
                (self.query_type(), single_field(&q.field, params))
            }
            QueryExpression::QueryString(q) => {
                let mut params = Map::new();
                params.insert("query".to_string(), Value::String(q.query.clone()));
                params.insert(
                    "fields".to_string(),
                    Value::Array(q.fields.iter().cloned().map(Value::String).collect()),
                );
                insert_boost(&mut params, q.boost);
                (self.query_type(), params)
            }
            QueryExpression::Range(q) => {
                let mut params = Map::new();
                params.insert("from".to_string(), q.from.clone().unwrap_or(Value::Null));
                params.insert("to".to_string(), q.to.clone().unwrap_or(Value::Null));
                params.insert("include_lower".to_string(), Value::Bool(true));
                params.insert("include_upper".to_string(), Value::Bool(true));
                insert_boost(&mut params, q.boost);
                (self.query_type(), single_field(&q.field, params))
            }
            QueryExpression::Fuzzy(q) => {
                let mut params = Map::new();
                params.insert("value".to_string(), Value::String(q.value.clone()));
                if let Some(fuzziness) = &q.fuzziness {
                    params.insert("fuzziness".to_string(), Value::String(fuzziness.clone()));
                }
                insert_boost(&mut params, q.boost);
                (self.query_type(), single_field(&q.field, params))
            }
            QueryExpression::Bool(q) => {
                let mut params = Map::new();
                for (name, clauses) in [
                    ("should", &q.should),
                    ("must_not", &q.must_not),
                    ("must", &q.must),
                ] {
                    if !clauses.is_empty() {
                        params.insert(
                            name.to_string(),
                            Value::Array(clauses.iter().map(QueryExpression::to_dsl).collect()),
                        );
                    }
                }
                insert_boost(&mut params, q.boost);
                (self.query_type(), params)
            }
        };

        let mut root = Map::new();
        root.insert(kind.to_string(), Value::Object(body));
        Value::Object(root)
    }
}

impl Serialize for QueryExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_dsl().serialize(serializer)
    }
}

fn single_field(field: &str, params: Map<String, Value>) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert(field.to_string(), Value::Object(params));
    body
}

fn insert_boost(params: &mut Map<String, Value>, boost: Option<f32>) {
    if let Some(boost) = boost {
        params.insert("boost".to_string(), Value::from(boost));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_dsl() {
        let q = QueryExpression::field("type", json!("hotel"));
        assert_eq!(
            q.to_dsl(),
            json!({ "field": { "type": { "query": "hotel" } } })
        );
    }

    #[test]
    fn test_wildcard_dsl() {
        let q = QueryExpression::wildcard("name", "*otel*".to_string(), true);
        assert_eq!(
            q.to_dsl(),
            json!({ "field": { "name": { "query": "*otel*", "analyze_wildcard": true } } })
        );
    }

    #[test]
    fn test_query_string_dsl() {
        let q = QueryExpression::query_string("foo AND bar", "body");
        assert_eq!(
            q.to_dsl(),
            json!({ "query_string": { "query": "foo AND bar", "fields": ["body"] } })
        );
    }

    #[test]
    fn test_range_dsl_open_lower() {
        let q = QueryExpression::range("rate", None, Some(json!(100)));
        assert_eq!(
            q.to_dsl(),
            json!({
                "range": {
                    "rate": {
                        "from": null,
                        "to": 100,
                        "include_lower": true,
                        "include_upper": true
                    }
                }
            })
        );
    }

    #[test]
    fn test_fuzzy_dsl_with_fuzziness() {
        let q = QueryExpression::fuzzy("name", "hotl", Some("AUTO".to_string()));
        assert_eq!(
            q.to_dsl(),
            json!({ "fuzzy": { "name": { "value": "hotl", "fuzziness": "AUTO" } } })
        );
    }

    #[test]
    fn test_bool_dsl_omits_empty_clauses() {
        let q = QueryExpression::all_of(vec![QueryExpression::field("a", json!(1))]);
        assert_eq!(
            q.to_dsl(),
            json!({ "bool": { "must": [ { "field": { "a": { "query": 1 } } } ] } })
        );
        assert_eq!(QueryExpression::any_of(vec![]).to_dsl(), json!({ "bool": {} }));
    }

    #[test]
    fn test_bool_dsl_key_order() {
        let mut b = BoolQuery::default();
        b.must(QueryExpression::field("m", json!(1)));
        b.must_not(QueryExpression::field("n", json!(2)));
        b.should(QueryExpression::field("s", json!(3)));

        let rendered = serde_json::to_string(&QueryExpression::Bool(b)).unwrap();
        let should = rendered.find("\"should\"").unwrap();
        let must_not = rendered.find("\"must_not\"").unwrap();
        let must = rendered.find("\"must\":").unwrap();
        assert!(should < must_not && must_not < must);
    }

    #[test]
    fn test_boost_rendered_when_set() {
        let mut q = QueryExpression::field("a", json!("x"));
        q.as_boostable_mut().unwrap().set_boost(2.5);
        assert_eq!(q.boost(), Some(2.5));
        assert_eq!(
            q.to_dsl(),
            json!({ "field": { "a": { "query": "x", "boost": 2.5 } } })
        );
    }

    #[test]
    fn test_every_kind_is_boostable() {
        let mut kinds = vec![
            QueryExpression::field("a", json!(1)),
            QueryExpression::query_string("x", "a"),
            QueryExpression::range("a", None, None),
            QueryExpression::fuzzy("a", "x", None),
            QueryExpression::any_of(vec![]),
        ];
        for q in &mut kinds {
            assert!(q.as_boostable_mut().is_some(), "{} not boostable", q.query_type());
        }
    }

    #[test]
    fn test_clause_count() {
        let mut b = BoolQuery::default();
        assert!(b.is_empty());
        b.should(QueryExpression::field("a", json!(1)));
        b.must(QueryExpression::field("b", json!(2)));
        assert_eq!(b.clause_count(), 2);
        assert!(!b.is_empty());
    }
}
