//! Criteria-to-query compiler for Elasticsearch-backed repositories
//!
//! A [`Criteria`] chain is an ordered list of links, each filtering one field
//! with one or more operators. [`CriteriaCompiler`] turns a chain into a
//! `bool` query tree:
//!
//! - OR-marked links land in `should`
//! - negating links land in `must_not`
//! - every other link lands in `must`
//!
//! ```
//! use esdata_criteria::{Criteria, CriteriaCompiler};
//!
//! let criteria = Criteria::where_field("type")
//!     .is("hotel")
//!     .and("rate")
//!     .less_than_equal(100);
//!
//! let query = CriteriaCompiler::default()
//!     .compile(Some(&criteria))
//!     .unwrap()
//!     .expect("two links with values");
//! assert_eq!(query.query_type(), "bool");
//! ```
//!
//! # Supported operators
//!
//! - `EQUALS` / `CONTAINS` / `STARTS_WITH` / `ENDS_WITH` → `field` query
//! - `EXPRESSION` → `query_string`
//! - `BETWEEN` → `range`
//! - `FUZZY` → `fuzzy`
//! - `IN` → `bool` of `should` equality clauses

pub mod compiler;
pub mod config;
pub mod criteria;
pub mod error;
pub mod query;

pub use compiler::{Clauses, CriteriaCompiler};
pub use config::CompilerConfig;
pub use criteria::{Bounds, Criteria, CriteriaEntry, Criterion, OperationKey};
pub use error::CriteriaError;
pub use query::{BoolClauseSink, BoolQuery, Boostable, QueryExpression};

/// Result type for criteria operations
pub type Result<T> = std::result::Result<T, CriteriaError>;
