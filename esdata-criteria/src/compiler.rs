//! Criteria chain to `bool` query compiler

use crate::config::CompilerConfig;
use crate::criteria::{non_null, Criteria, CriteriaEntry, Criterion};
use crate::error::CriteriaError;
use crate::query::{BoolClauseSink, BoolQuery, QueryExpression};
use crate::Result;
use serde_json::Value;
use tracing::{debug, trace};

/// Compiled fragments routed by how their link joins the chain
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clauses {
    pub should: Vec<QueryExpression>,
    pub must_not: Vec<QueryExpression>,
    pub must: Vec<QueryExpression>,
}

impl Clauses {
    pub fn is_empty(&self) -> bool {
        self.should.is_empty() && self.must_not.is_empty() && self.must.is_empty()
    }

    /// OR wins over negation; everything else is a `must`.
    fn route(mut self, link: &Criterion, fragment: QueryExpression) -> Self {
        if link.or {
            self.should.push(fragment);
        } else if link.negating {
            self.must_not.push(fragment);
        } else {
            self.must.push(fragment);
        }
        self
    }

    /// Feed `should`, then `must_not`, then `must` clauses into `sink`.
    pub fn drain_into<S: BoolClauseSink>(self, sink: &mut S) {
        for q in self.should {
            sink.should(q);
        }
        for q in self.must_not {
            sink.must_not(q);
        }
        for q in self.must {
            sink.must(q);
        }
    }
}

/// Translates a [`Criteria`] chain into a `bool` query tree
#[derive(Debug, Clone, Default)]
pub struct CriteriaCompiler {
    config: CompilerConfig,
}

impl CriteriaCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile `criteria` into a `bool` query.
    ///
    /// Returns `Ok(None)` when there is nothing to filter on: no chain, a
    /// current link without entries, or a chain whose links all compile to
    /// nothing. Callers must treat `None` as "no constraint".
    pub fn compile(&self, criteria: Option<&Criteria>) -> Result<Option<QueryExpression>> {
        Ok(self
            .compile_into::<BoolQuery>(criteria)?
            .map(QueryExpression::Bool))
    }

    /// Same as [`compile`](Self::compile), building the root with `S`.
    pub fn compile_into<S>(&self, criteria: Option<&Criteria>) -> Result<Option<S>>
    where
        S: BoolClauseSink + Default,
    {
        let Some(clauses) = self.collect_clauses(criteria)? else {
            return Ok(None);
        };
        let mut root = S::default();
        clauses.drain_into(&mut root);
        Ok(Some(root))
    }

    /// Walk the chain and route each link's fragment without building a root.
    pub fn collect_clauses(&self, criteria: Option<&Criteria>) -> Result<Option<Clauses>> {
        let Some(criteria) = criteria else {
            trace!("no criteria to compile");
            return Ok(None);
        };
        if !criteria
            .current()
            .is_some_and(|link| !link.entries.is_empty())
        {
            trace!(links = criteria.len(), "current criteria link has no entries");
            return Ok(None);
        }

        let clauses = criteria.chain().iter().enumerate().try_fold(
            Clauses::default(),
            |acc, (position, link)| -> Result<Clauses> {
                Ok(match self.compile_link(position, link)? {
                    Some(fragment) => acc.route(link, fragment),
                    None => acc,
                })
            },
        )?;

        if clauses.is_empty() {
            trace!(links = criteria.len(), "criteria chain compiled to no clauses");
            return Ok(None);
        }

        debug!(
            links = criteria.len(),
            should = clauses.should.len(),
            must_not = clauses.must_not.len(),
            must = clauses.must.len(),
            "compiled criteria chain"
        );
        Ok(Some(clauses))
    }

    fn compile_link(&self, position: usize, link: &Criterion) -> Result<Option<QueryExpression>> {
        if link.entries.is_empty() {
            trace!(position, "skipping criteria link without entries");
            return Ok(None);
        }

        let field = link
            .field
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .ok_or_else(|| {
                CriteriaError::InvalidField(format!(
                    "criteria link {} has {} entries but no field name",
                    position,
                    link.entries.len()
                ))
            })?;

        let fragment = match link.entries.as_slice() {
            [entry] => self.compile_entry(field, entry),
            entries => {
                let leaves: Vec<QueryExpression> = entries
                    .iter()
                    .filter_map(|entry| self.compile_entry(field, entry))
                    .collect();
                if leaves.is_empty() {
                    None
                } else {
                    Some(QueryExpression::all_of(leaves))
                }
            }
        };

        Ok(fragment.map(|mut query| {
            apply_boost(&mut query, link.effective_boost());
            query
        }))
    }

    fn compile_entry(&self, field: &str, entry: &CriteriaEntry) -> Option<QueryExpression> {
        let query = match entry {
            CriteriaEntry::Equals(value) => non_null(value)
                .map(|v| QueryExpression::field(field, v.clone())),
            CriteriaEntry::Contains(value) => non_null(value)
                .map(|v| self.wildcard(field, format!("*{}*", value_to_string(v)))),
            CriteriaEntry::StartsWith(value) => non_null(value)
                .map(|v| self.wildcard(field, format!("{}*", value_to_string(v)))),
            CriteriaEntry::EndsWith(value) => non_null(value)
                .map(|v| self.wildcard(field, format!("*{}", value_to_string(v)))),
            CriteriaEntry::Expression(expression) => expression
                .as_ref()
                .map(|e| QueryExpression::query_string(e.as_str(), field)),
            CriteriaEntry::Between(bounds) => bounds
                .as_ref()
                .map(|b| QueryExpression::range(field, b.from.clone(), b.to.clone())),
            CriteriaEntry::Fuzzy(value) => value.as_ref().map(|v| {
                QueryExpression::fuzzy(field, v.as_str(), self.config.fuzziness.clone())
            }),
            CriteriaEntry::In(items) => items.as_ref().map(|items| {
                QueryExpression::any_of(
                    items
                        .iter()
                        .map(|item| QueryExpression::field(field, item.clone()))
                        .collect(),
                )
            }),
        };

        if query.is_none() {
            trace!(field, key = entry.key().as_str(), "skipping null criteria entry");
        }
        query
    }

    fn wildcard(&self, field: &str, pattern: String) -> QueryExpression {
        QueryExpression::wildcard(field, pattern, self.config.analyze_wildcard)
    }
}

fn apply_boost(query: &mut QueryExpression, boost: Option<f32>) {
    let Some(boost) = boost else {
        return;
    };
    let query_type = query.query_type();
    match query.as_boostable_mut() {
        Some(target) => target.set_boost(boost),
        None => trace!(boost, query_type, "ignoring boost on non-boostable query"),
    }
}

fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => v.to_string(),
    }
}
