//! Query descriptors and the translation contract for native query builders.
//!
//! A [`QueryOptions`] value describes a query without reference to any backend:
//! an ordered list of filter clauses, an ordered list of sort keys, an optional
//! pagination cursor and an optional row limit. Backends turn it into their
//! native query form by implementing [`QueryTranslator`].
//!
//! # Query Building
//!
//! ```ignore
//! use firelayer::query::{Direction, Field, QueryOptions};
//!
//! let options = QueryOptions::builder()
//!     .filter(Field::new("age").gte(18))
//!     .order_by("createdAt", Direction::Desc)
//!     .limit(10)
//!     .build();
//! ```
//!
//! The descriptor also deserializes from its language-agnostic JSON form:
//!
//! ```ignore
//! let options: QueryOptions = serde_json::from_value(json!({
//!     "where": [{ "field": "age", "operator": ">", "value": 28 }],
//!     "orderBy": [{ "field": "age", "direction": "asc" }],
//!     "limit": 2,
//!     "startAfter": 30
//! }))?;
//! ```

use std::{fmt, num::NonZeroU32, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::DatabaseError;

/// Comparison operators accepted in a [`WhereClause`].
///
/// The set is closed to the operators understood by both the client and the admin
/// access paths, so a query that is valid for one adapter is valid for the other.
/// Each variant (de)serializes as the operator token used by the Firestore SDKs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WhereOp {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = ">")]
    Gt,
    /// Array field contains the value.
    #[serde(rename = "array-contains")]
    ArrayContains,
    /// Field equals one of the values in an array.
    #[serde(rename = "in")]
    In,
    /// Field equals none of the values in an array.
    #[serde(rename = "not-in")]
    NotIn,
    /// Array field contains at least one of the values in an array.
    #[serde(rename = "array-contains-any")]
    ArrayContainsAny,
}

impl WhereOp {
    /// Every supported operator, in token order.
    pub const ALL: [WhereOp; 10] = [
        WhereOp::Lt,
        WhereOp::Lte,
        WhereOp::Eq,
        WhereOp::Ne,
        WhereOp::Gte,
        WhereOp::Gt,
        WhereOp::ArrayContains,
        WhereOp::In,
        WhereOp::NotIn,
        WhereOp::ArrayContainsAny,
    ];

    /// Returns the operator token, e.g. `">="` or `"array-contains"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            WhereOp::Lt => "<",
            WhereOp::Lte => "<=",
            WhereOp::Eq => "==",
            WhereOp::Ne => "!=",
            WhereOp::Gte => ">=",
            WhereOp::Gt => ">",
            WhereOp::ArrayContains => "array-contains",
            WhereOp::In => "in",
            WhereOp::NotIn => "not-in",
            WhereOp::ArrayContainsAny => "array-contains-any",
        }
    }
}

impl fmt::Display for WhereOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The operator token is not one of [`WhereOp::ALL`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported where operator: {0:?}")]
pub struct ParseWhereOpError(pub String);

impl FromStr for WhereOp {
    type Err = ParseWhereOpError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        WhereOp::ALL
            .into_iter()
            .find(|op| op.as_str() == token)
            .ok_or_else(|| ParseWhereOpError(token.to_string()))
    }
}

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    #[default]
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

/// A single predicate `field <operator> value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereClause {
    /// The field path to compare. Dots address nested fields.
    pub field: String,
    /// The comparison operator.
    pub operator: WhereOp,
    /// The value to compare against.
    pub value: Value,
}

impl WhereClause {
    pub fn new(field: impl Into<String>, operator: WhereOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// One sort key of a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderByClause {
    /// The field path to sort by.
    pub field: String,
    /// The sort direction.
    #[serde(default)]
    pub direction: Direction,
}

impl OrderByClause {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Helper for building [`WhereClause`] values on one field.
///
/// ```ignore
/// let adults = Field::new("age").gte(18);
/// let tagged = Field::new("tags").array_contains("rust");
/// ```
#[derive(Debug, Clone)]
pub struct Field(String);

impl Field {
    pub fn new(path: impl Into<String>) -> Self {
        Field(path.into())
    }

    fn clause(self, operator: WhereOp, value: impl Into<Value>) -> WhereClause {
        WhereClause::new(self.0, operator, value)
    }

    pub fn eq(self, value: impl Into<Value>) -> WhereClause {
        self.clause(WhereOp::Eq, value)
    }

    pub fn ne(self, value: impl Into<Value>) -> WhereClause {
        self.clause(WhereOp::Ne, value)
    }

    pub fn gt(self, value: impl Into<Value>) -> WhereClause {
        self.clause(WhereOp::Gt, value)
    }

    pub fn gte(self, value: impl Into<Value>) -> WhereClause {
        self.clause(WhereOp::Gte, value)
    }

    pub fn lt(self, value: impl Into<Value>) -> WhereClause {
        self.clause(WhereOp::Lt, value)
    }

    pub fn lte(self, value: impl Into<Value>) -> WhereClause {
        self.clause(WhereOp::Lte, value)
    }

    pub fn array_contains(self, value: impl Into<Value>) -> WhereClause {
        self.clause(WhereOp::ArrayContains, value)
    }

    pub fn array_contains_any(self, values: impl Into<Value>) -> WhereClause {
        self.clause(WhereOp::ArrayContainsAny, values)
    }

    pub fn is_in(self, values: impl Into<Value>) -> WhereClause {
        self.clause(WhereOp::In, values)
    }

    pub fn not_in(self, values: impl Into<Value>) -> WhereClause {
        self.clause(WhereOp::NotIn, values)
    }
}

/// A declarative query over one collection.
///
/// Empty `filters` / `order_by` lists mean the clause is absent. A limit of zero
/// is treated as no limit. The cursor is opaque: it must be compatible with the
/// last sort key (or the document id when no sort key is given), but that is
/// only checked by the database service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    /// Filter clauses, combined with logical AND in list order.
    #[serde(rename = "where", default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<WhereClause>,
    /// Sort keys, major to minor.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderByClause>,
    /// Maximum number of documents to return.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_limit"
    )]
    pub limit: Option<NonZeroU32>,
    /// Resume after this value of the last sort key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_after: Option<Value>,
}

fn deserialize_limit<'de, D>(deserializer: D) -> Result<Option<NonZeroU32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.and_then(NonZeroU32::new))
}

impl QueryOptions {
    /// Creates an empty query (an unfiltered collection scan).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new query builder for fluent construction.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    /// Returns `true` when no clause, cursor or limit is set.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
            && self.order_by.is_empty()
            && self.limit.is_none()
            && self.start_after.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    options: QueryOptions,
}

impl QueryBuilder {
    /// Creates a new query builder.
    pub fn new() -> Self {
        QueryBuilder {
            options: QueryOptions::default(),
        }
    }

    /// Appends a filter clause.
    pub fn filter(mut self, clause: WhereClause) -> Self {
        self.options.filters.push(clause);
        self
    }

    /// Appends a sort key after the ones already added.
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.options
            .order_by
            .push(OrderByClause::new(field, direction));
        self
    }

    /// Sets the maximum number of documents to return. Zero clears the limit.
    pub fn limit(mut self, limit: u32) -> Self {
        self.options.limit = NonZeroU32::new(limit);
        self
    }

    /// Sets the pagination cursor.
    pub fn start_after(mut self, cursor: impl Into<Value>) -> Self {
        self.options.start_after = Some(cursor.into());
        self
    }

    /// Builds and returns the final query.
    pub fn build(self) -> QueryOptions {
        self.options
    }
}

/// Folds a [`QueryOptions`] value into a backend's native query form.
///
/// Implementors describe how one clause of each kind is added to the native
/// builder; [`QueryTranslator::translate`] fixes the composition order: filters,
/// then sort keys, then the cursor, then the limit. The cursor is always applied
/// after the sort order it is anchored to has been established.
pub trait QueryTranslator {
    type Output;
    type Error: Into<DatabaseError>;

    fn apply_where(&mut self, clause: &WhereClause) -> Result<(), Self::Error>;
    fn apply_order_by(&mut self, clause: &OrderByClause) -> Result<(), Self::Error>;
    fn apply_start_after(&mut self, cursor: &Value) -> Result<(), Self::Error>;
    fn apply_limit(&mut self, limit: NonZeroU32) -> Result<(), Self::Error>;
    fn finish(self) -> Result<Self::Output, Self::Error>;

    fn translate(mut self, options: &QueryOptions) -> Result<Self::Output, Self::Error>
    where
        Self: Sized,
    {
        for clause in &options.filters {
            self.apply_where(clause)?;
        }
        for clause in &options.order_by {
            self.apply_order_by(clause)?;
        }
        if let Some(cursor) = &options.start_after {
            self.apply_start_after(cursor)?;
        }
        if let Some(limit) = options.limit {
            self.apply_limit(limit)?;
        }

        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        steps: Vec<String>,
    }

    impl QueryTranslator for Recorder {
        type Output = Vec<String>;
        type Error = DatabaseError;

        fn apply_where(&mut self, clause: &WhereClause) -> Result<(), Self::Error> {
            self.steps
                .push(format!("where {} {} {}", clause.field, clause.operator, clause.value));
            Ok(())
        }

        fn apply_order_by(&mut self, clause: &OrderByClause) -> Result<(), Self::Error> {
            self.steps
                .push(format!("order {} {:?}", clause.field, clause.direction));
            Ok(())
        }

        fn apply_start_after(&mut self, cursor: &Value) -> Result<(), Self::Error> {
            self.steps.push(format!("cursor {cursor}"));
            Ok(())
        }

        fn apply_limit(&mut self, limit: NonZeroU32) -> Result<(), Self::Error> {
            self.steps.push(format!("limit {limit}"));
            Ok(())
        }

        fn finish(self) -> Result<Self::Output, Self::Error> {
            Ok(self.steps)
        }
    }

    #[test]
    fn translate_composes_filters_order_cursor_limit() {
        // Built in a scrambled order on purpose.
        let options = QueryOptions::builder()
            .limit(2)
            .start_after(30)
            .order_by("age", Direction::Asc)
            .filter(Field::new("age").gt(28))
            .order_by("name", Direction::Desc)
            .filter(Field::new("age").lt(32))
            .build();

        let steps = Recorder::default().translate(&options).unwrap();

        assert_eq!(
            steps,
            vec![
                "where age > 28",
                "where age < 32",
                "order age Asc",
                "order name Desc",
                "cursor 30",
                "limit 2",
            ]
        );
    }

    #[test]
    fn translate_skips_absent_parts() {
        let steps = Recorder::default()
            .translate(&QueryOptions::new())
            .unwrap();

        assert!(steps.is_empty());
    }

    #[test]
    fn operator_tokens_round_trip() {
        for op in WhereOp::ALL {
            assert_eq!(op.as_str().parse::<WhereOp>(), Ok(op));
            assert_eq!(serde_json::to_value(op).unwrap(), json!(op.as_str()));
        }

        assert_eq!(
            "=~".parse::<WhereOp>(),
            Err(ParseWhereOpError("=~".to_string()))
        );
    }

    #[test]
    fn deserializes_language_agnostic_descriptor() {
        let options: QueryOptions = serde_json::from_value(json!({
            "where": [
                { "field": "age", "operator": ">", "value": 28 },
                { "field": "tags", "operator": "array-contains", "value": "admin" }
            ],
            "orderBy": [{ "field": "age", "direction": "desc" }, { "field": "name" }],
            "limit": 2,
            "startAfter": 30
        }))
        .unwrap();

        assert_eq!(
            options,
            QueryOptions::builder()
                .filter(Field::new("age").gt(28))
                .filter(Field::new("tags").array_contains("admin"))
                .order_by("age", Direction::Desc)
                .order_by("name", Direction::Asc)
                .limit(2)
                .start_after(30)
                .build()
        );
    }

    #[test]
    fn zero_limit_and_null_cursor_are_absent() {
        let options: QueryOptions =
            serde_json::from_value(json!({ "limit": 0, "startAfter": null })).unwrap();

        assert!(options.is_empty());
        assert_eq!(QueryOptions::builder().limit(0).build().limit, None);
    }

    #[test]
    fn unknown_operator_is_rejected_on_deserialize() {
        let result = serde_json::from_value::<WhereClause>(json!({
            "field": "age",
            "operator": "LIKE",
            "value": 1
        }));

        assert!(result.is_err());
    }

    #[test]
    fn serializes_without_absent_parts() {
        let options = QueryOptions::builder()
            .filter(Field::new("age").gte(18))
            .build();

        assert_eq!(
            serde_json::to_value(&options).unwrap(),
            json!({ "where": [{ "field": "age", "operator": ">=", "value": 18 }] })
        );
    }
}
