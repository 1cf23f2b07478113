//! Compiled query tree and its Elasticsearch DSL rendering

pub mod types;

pub use types::{
    BoolClauseSink, BoolQuery, Boostable, FieldQuery, FuzzyQuery, QueryExpression,
    QueryStringQuery, RangeQuery,
};
