//! Criteria chain data model
//!
//! A [`Criteria`] is an ordered chain of [`Criterion`] links. Each link filters
//! one field with one or more [`CriteriaEntry`] operators and says how its
//! compiled fragment joins the rest of the query (AND, OR or NOT).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Filter operator of a single criteria entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKey {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
    Expression,
    Between,
    Fuzzy,
    In,
}

impl OperationKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKey::Equals => "EQUALS",
            OperationKey::Contains => "CONTAINS",
            OperationKey::StartsWith => "STARTS_WITH",
            OperationKey::EndsWith => "ENDS_WITH",
            OperationKey::Expression => "EXPRESSION",
            OperationKey::Between => "BETWEEN",
            OperationKey::Fuzzy => "FUZZY",
            OperationKey::In => "IN",
        }
    }
}

/// Lower and upper bound of a `BETWEEN` entry. `None` leaves that side open.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(default)]
    pub from: Option<Value>,
    #[serde(default)]
    pub to: Option<Value>,
}

/// One operator applied to the link's field.
///
/// The payload is `None` when the producer passed a null value; such entries
/// compile to nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CriteriaEntry {
    Equals(Option<Value>),
    Contains(Option<Value>),
    StartsWith(Option<Value>),
    EndsWith(Option<Value>),
    Expression(Option<String>),
    Between(Option<Bounds>),
    Fuzzy(Option<String>),
    In(Option<Vec<Value>>),
}

impl CriteriaEntry {
    pub fn key(&self) -> OperationKey {
        match self {
            CriteriaEntry::Equals(_) => OperationKey::Equals,
            CriteriaEntry::Contains(_) => OperationKey::Contains,
            CriteriaEntry::StartsWith(_) => OperationKey::StartsWith,
            CriteriaEntry::EndsWith(_) => OperationKey::EndsWith,
            CriteriaEntry::Expression(_) => OperationKey::Expression,
            CriteriaEntry::Between(_) => OperationKey::Between,
            CriteriaEntry::Fuzzy(_) => OperationKey::Fuzzy,
            CriteriaEntry::In(_) => OperationKey::In,
        }
    }

    /// True when the entry carries no value.
    pub fn is_null(&self) -> bool {
        match self {
            CriteriaEntry::Equals(v)
            | CriteriaEntry::Contains(v)
            | CriteriaEntry::StartsWith(v)
            | CriteriaEntry::EndsWith(v) => non_null(v).is_none(),
            CriteriaEntry::Expression(v) | CriteriaEntry::Fuzzy(v) => v.is_none(),
            CriteriaEntry::Between(v) => v.is_none(),
            CriteriaEntry::In(v) => v.is_none(),
        }
    }
}

/// A single link of a criteria chain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    /// Target field. Required once the link carries entries.
    #[serde(default)]
    pub field: Option<String>,

    /// Operators on `field`, AND-ed together in order
    #[serde(default)]
    pub entries: Vec<CriteriaEntry>,

    /// Relevance boost; unset when `None` or NaN
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f32>,

    /// Join with the rest of the chain as `should`
    #[serde(default)]
    pub or: bool,

    /// Join with the rest of the chain as `must_not`
    #[serde(default)]
    pub negating: bool,
}

impl Criterion {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            ..Default::default()
        }
    }

    /// Boost to apply, treating NaN as unset.
    pub fn effective_boost(&self) -> Option<f32> {
        self.boost.filter(|b| !b.is_nan())
    }

    pub fn set_boost(&mut self, boost: f32) {
        self.boost = if boost.is_nan() { None } else { Some(boost) };
    }
}

/// An ordered chain of criteria links forming one logical query.
///
/// Builder methods that add operators act on the newest link, so the value a
/// caller holds is always positioned on the last link appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Criteria {
    chain: Vec<Criterion>,
}

impl Criteria {
    /// Empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a chain on `field`
    pub fn where_field(field: impl Into<String>) -> Self {
        Self {
            chain: vec![Criterion::new(field)],
        }
    }

    /// Wrap links produced elsewhere, e.g. by a method-name parser.
    pub fn from_links(links: Vec<Criterion>) -> Self {
        Self { chain: links }
    }

    pub fn chain(&self) -> &[Criterion] {
        &self.chain
    }

    /// The newest link
    pub fn current(&self) -> Option<&Criterion> {
        self.chain.last()
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Append an AND link on `field`
    pub fn and(mut self, field: impl Into<String>) -> Self {
        self.chain.push(Criterion::new(field));
        self
    }

    /// Append an OR link on `field`
    pub fn or(mut self, field: impl Into<String>) -> Self {
        self.chain.push(Criterion {
            or: true,
            ..Criterion::new(field)
        });
        self
    }

    /// Append every link of `other`
    pub fn and_criteria(mut self, other: Criteria) -> Self {
        self.chain.extend(other.chain);
        self
    }

    /// Append every link of `other`, each marked OR
    pub fn or_criteria(mut self, other: Criteria) -> Self {
        self.chain.extend(other.chain.into_iter().map(|link| Criterion {
            or: true,
            ..link
        }));
        self
    }

    pub fn is(self, value: impl Into<Value>) -> Self {
        self.entry(CriteriaEntry::Equals(scalar(value)))
    }

    pub fn contains(self, value: impl Into<Value>) -> Self {
        self.entry(CriteriaEntry::Contains(scalar(value)))
    }

    pub fn starts_with(self, value: impl Into<Value>) -> Self {
        self.entry(CriteriaEntry::StartsWith(scalar(value)))
    }

    pub fn ends_with(self, value: impl Into<Value>) -> Self {
        self.entry(CriteriaEntry::EndsWith(scalar(value)))
    }

    /// Free-form query string scoped to the current field
    pub fn expression(self, expression: impl Into<String>) -> Self {
        self.entry(CriteriaEntry::Expression(Some(expression.into())))
    }

    /// Inclusive range. A null bound leaves that side open.
    pub fn between(self, from: impl Into<Value>, to: impl Into<Value>) -> Self {
        self.entry(CriteriaEntry::Between(Some(Bounds {
            from: scalar(from),
            to: scalar(to),
        })))
    }

    pub fn less_than_equal(self, upper: impl Into<Value>) -> Self {
        self.entry(CriteriaEntry::Between(Some(Bounds {
            from: None,
            to: scalar(upper),
        })))
    }

    pub fn greater_than_equal(self, lower: impl Into<Value>) -> Self {
        self.entry(CriteriaEntry::Between(Some(Bounds {
            from: scalar(lower),
            to: None,
        })))
    }

    pub fn fuzzy(self, value: impl Into<String>) -> Self {
        self.entry(CriteriaEntry::Fuzzy(Some(value.into())))
    }

    /// Match any of `values`, in iteration order
    pub fn in_values<I, T>(self, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.entry(CriteriaEntry::In(Some(values)))
    }

    /// Mark the current link as negating
    pub fn not(mut self) -> Self {
        self.current_mut().negating = true;
        self
    }

    /// Boost the current link. NaN clears it.
    pub fn boost(mut self, boost: f32) -> Self {
        self.current_mut().set_boost(boost);
        self
    }

    /// Add a raw entry to the current link
    pub fn entry(mut self, entry: CriteriaEntry) -> Self {
        self.current_mut().entries.push(entry);
        self
    }

    fn current_mut(&mut self) -> &mut Criterion {
        if self.chain.is_empty() {
            self.chain.push(Criterion::default());
        }
        let last = self.chain.len() - 1;
        &mut self.chain[last]
    }
}

/// Scalar payload, treating a JSON `null` like a missing value
pub(crate) fn non_null(value: &Option<Value>) -> Option<&Value> {
    value.as_ref().filter(|v| !v.is_null())
}

fn scalar(value: impl Into<Value>) -> Option<Value> {
    match value.into() {
        Value::Null => None,
        v => Some(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_where_field_starts_single_link() {
        let c = Criteria::where_field("title").is("rust");
        assert_eq!(c.len(), 1);
        let link = c.current().unwrap();
        assert_eq!(link.field.as_deref(), Some("title"));
        assert_eq!(link.entries, vec![CriteriaEntry::Equals(Some(json!("rust")))]);
        assert!(!link.or);
        assert!(!link.negating);
    }

    #[test]
    fn test_and_or_append_links() {
        let c = Criteria::where_field("a").is(1).and("b").is(2).or("c").is(3);
        let chain = c.chain();
        assert_eq!(chain.len(), 3);
        assert!(!chain[1].or);
        assert!(chain[2].or);
        assert_eq!(c.current().unwrap().field.as_deref(), Some("c"));
    }

    #[test]
    fn test_multiple_entries_on_one_link() {
        let c = Criteria::where_field("name").starts_with("ab").ends_with("yz");
        let link = c.current().unwrap();
        let keys: Vec<_> = link.entries.iter().map(CriteriaEntry::key).collect();
        assert_eq!(keys, vec![OperationKey::StartsWith, OperationKey::EndsWith]);
    }

    #[test]
    fn test_not_marks_current_link() {
        let c = Criteria::where_field("a").is(1).and("b").is(2).not();
        assert!(!c.chain()[0].negating);
        assert!(c.chain()[1].negating);
    }

    #[test]
    fn test_boost_nan_is_unset() {
        let c = Criteria::where_field("a").is(1).boost(f32::NAN);
        assert_eq!(c.current().unwrap().boost, None);

        let c = Criteria::where_field("a").is(1).boost(2.5);
        assert_eq!(c.current().unwrap().effective_boost(), Some(2.5));
    }

    #[test]
    fn test_effective_boost_filters_raw_nan() {
        let link = Criterion {
            boost: Some(f32::NAN),
            ..Criterion::new("a")
        };
        assert_eq!(link.effective_boost(), None);
    }

    #[test]
    fn test_null_scalar_normalised() {
        let c = Criteria::where_field("a").is(Value::Null);
        let entry = &c.current().unwrap().entries[0];
        assert_eq!(entry, &CriteriaEntry::Equals(None));
        assert!(entry.is_null());

        let c = Criteria::where_field("a").contains(None::<String>);
        assert!(c.current().unwrap().entries[0].is_null());

        assert!(CriteriaEntry::StartsWith(Some(Value::Null)).is_null());
    }

    #[test]
    fn test_range_helpers_leave_side_open() {
        let c = Criteria::where_field("rate")
            .less_than_equal(100)
            .greater_than_equal(10);
        let entries = &c.current().unwrap().entries;
        assert_eq!(
            entries[0],
            CriteriaEntry::Between(Some(Bounds {
                from: None,
                to: Some(json!(100))
            }))
        );
        assert_eq!(
            entries[1],
            CriteriaEntry::Between(Some(Bounds {
                from: Some(json!(10)),
                to: None
            }))
        );
    }

    #[test]
    fn test_in_values_keeps_order() {
        let c = Criteria::where_field("tag").in_values(["c", "a", "b"]);
        assert_eq!(
            c.current().unwrap().entries[0],
            CriteriaEntry::In(Some(vec![json!("c"), json!("a"), json!("b")]))
        );
    }

    #[test]
    fn test_or_criteria_marks_appended_links() {
        let other = Criteria::where_field("x").is(1).and("y").is(2);
        let c = Criteria::where_field("a").is(0).or_criteria(other);
        let flags: Vec<bool> = c.chain().iter().map(|l| l.or).collect();
        assert_eq!(flags, vec![false, true, true]);
    }

    #[test]
    fn test_and_criteria_keeps_flags() {
        let other = Criteria::where_field("x").is(1).not();
        let c = Criteria::where_field("a").is(0).and_criteria(other);
        assert_eq!(c.len(), 2);
        assert!(c.chain()[1].negating);
        assert!(!c.chain()[1].or);
    }

    #[test]
    fn test_entry_on_empty_chain_creates_unnamed_link() {
        let c = Criteria::new().is("orphan");
        assert_eq!(c.len(), 1);
        assert_eq!(c.current().unwrap().field, None);
    }

    #[test]
    fn test_operation_key_names() {
        assert_eq!(OperationKey::StartsWith.as_str(), "STARTS_WITH");
        assert_eq!(
            serde_json::to_value(OperationKey::EndsWith).unwrap(),
            json!("ENDS_WITH")
        );
    }

    #[test]
    fn test_chain_from_json() {
        let c: Criteria = serde_json::from_value(json!([
            {
                "field": "type",
                "entries": [{ "key": "EQUALS", "value": "hotel" }]
            },
            {
                "field": "rate",
                "entries": [{ "key": "BETWEEN", "value": { "from": null, "to": 100 } }],
                "boost": 2.0,
                "negating": true
            },
            {
                "field": "tag",
                "entries": [{ "key": "IN", "value": ["a", "b"] }],
                "or": true
            }
        ]))
        .unwrap();

        assert_eq!(c.len(), 3);
        assert_eq!(
            c.chain()[1].entries[0],
            CriteriaEntry::Between(Some(Bounds {
                from: None,
                to: Some(json!(100))
            }))
        );
        assert_eq!(c.chain()[1].boost, Some(2.0));
        assert!(c.chain()[1].negating);
        assert!(c.chain()[2].or);
    }
}
