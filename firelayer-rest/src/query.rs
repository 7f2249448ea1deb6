//! Translation of query descriptors into Firestore structured queries.
//!
//! [`StructuredQueryBuilder`] implements [`QueryTranslator`] for the REST
//! `runQuery` method. Filters become one `fieldFilter` (or a `compositeFilter`
//! with `AND` when there are several), sort keys become `orderBy` entries, the
//! cursor becomes an exclusive `startAt` position and the limit passes through.
//!
//! Equality against `null` has no field-filter form and is sent as the unary
//! `IS_NULL` / `IS_NOT_NULL` filters instead.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use firelayer_core::{
    error::DatabaseError,
    query::{Direction, OrderByClause, QueryTranslator, WhereClause, WhereOp},
};

use crate::{document::WireDocument, path::canonical_field_path, value::WireValue};

const DOCUMENT_ID_FIELD: &str = "__name__";

/// Body of a `runQuery` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest {
    pub structured_query: StructuredQuery,
}

/// One element of the `runQuery` response stream.
///
/// Elements without a document carry only progress information, such as the
/// read time of an empty result.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunQueryResponse {
    pub document: Option<WireDocument>,
    pub read_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery {
    pub from: Vec<CollectionSelector>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<Order>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<Cursor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSelector {
    pub collection_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference {
    pub field_path: String,
}

impl FieldReference {
    fn new(path: &str) -> Self {
        Self {
            field_path: canonical_field_path(path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Filter {
    CompositeFilter(CompositeFilter),
    FieldFilter(FieldFilter),
    UnaryFilter(UnaryFilter),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeFilter {
    pub op: CompositeOp,
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompositeOp {
    And,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldFilter {
    pub field: FieldReference,
    pub op: FieldOp,
    pub value: WireValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldOp {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Equal,
    NotEqual,
    ArrayContains,
    In,
    ArrayContainsAny,
    NotIn,
}

impl From<WhereOp> for FieldOp {
    fn from(op: WhereOp) -> Self {
        match op {
            WhereOp::Lt => FieldOp::LessThan,
            WhereOp::Lte => FieldOp::LessThanOrEqual,
            WhereOp::Gt => FieldOp::GreaterThan,
            WhereOp::Gte => FieldOp::GreaterThanOrEqual,
            WhereOp::Eq => FieldOp::Equal,
            WhereOp::Ne => FieldOp::NotEqual,
            WhereOp::ArrayContains => FieldOp::ArrayContains,
            WhereOp::In => FieldOp::In,
            WhereOp::ArrayContainsAny => FieldOp::ArrayContainsAny,
            WhereOp::NotIn => FieldOp::NotIn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnaryFilter {
    pub field: FieldReference,
    pub op: UnaryOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnaryOp {
    IsNull,
    IsNotNull,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub field: FieldReference,
    pub direction: OrderDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderDirection {
    Ascending,
    Descending,
}

impl From<Direction> for OrderDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Asc => OrderDirection::Ascending,
            Direction::Desc => OrderDirection::Descending,
        }
    }
}

/// A position in the result order. `before: false` starts right after it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cursor {
    pub values: Vec<WireValue>,
    pub before: bool,
}

fn is_inequality(op: WhereOp) -> bool {
    matches!(
        op,
        WhereOp::Lt | WhereOp::Lte | WhereOp::Gt | WhereOp::Gte | WhereOp::Ne | WhereOp::NotIn
    )
}

/// Builds the structured query for one collection.
#[derive(Debug, Clone)]
pub struct StructuredQueryBuilder {
    parent: String,
    query: StructuredQuery,
    filters: Vec<Filter>,
    inequality_field: Option<String>,
}

impl StructuredQueryBuilder {
    /// `parent` is the resource name the collection lives under, `collection_id`
    /// the last segment of the collection path.
    pub fn new(parent: impl Into<String>, collection_id: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            query: StructuredQuery {
                from: vec![CollectionSelector {
                    collection_id: collection_id.into(),
                }],
                ..StructuredQuery::default()
            },
            filters: Vec::new(),
            inequality_field: None,
        }
    }

    /// The field the cursor value is compared against: the first sort key, else
    /// the implicit sort on the first inequality field, else the document id.
    fn cursor_field(&self) -> &str {
        self.query
            .order_by
            .first()
            .map(|order| order.field.field_path.as_str())
            .or(self.inequality_field.as_deref())
            .unwrap_or(DOCUMENT_ID_FIELD)
    }

    fn document_reference(&self, id: &str) -> String {
        if id.starts_with("projects/") {
            return id.to_string();
        }

        let collection_id = self
            .query
            .from
            .first()
            .map(|from| from.collection_id.as_str())
            .unwrap_or_default();

        format!("{}/{}/{}", self.parent, collection_id, id)
    }
}

impl QueryTranslator for StructuredQueryBuilder {
    type Output = RunQueryRequest;
    type Error = DatabaseError;

    fn apply_where(&mut self, clause: &WhereClause) -> Result<(), Self::Error> {
        let field = FieldReference::new(&clause.field);

        let filter = match (clause.operator, &clause.value) {
            (WhereOp::Eq, Value::Null) => Filter::UnaryFilter(UnaryFilter {
                field,
                op: UnaryOp::IsNull,
            }),
            (WhereOp::Ne, Value::Null) => Filter::UnaryFilter(UnaryFilter {
                field,
                op: UnaryOp::IsNotNull,
            }),
            (op, value) => {
                if is_inequality(op) && self.inequality_field.is_none() {
                    self.inequality_field = Some(field.field_path.clone());
                }

                Filter::FieldFilter(FieldFilter {
                    field,
                    op: op.into(),
                    value: WireValue::encode(value),
                })
            }
        };

        self.filters.push(filter);
        Ok(())
    }

    fn apply_order_by(&mut self, clause: &OrderByClause) -> Result<(), Self::Error> {
        self.query.order_by.push(Order {
            field: FieldReference::new(&clause.field),
            direction: clause.direction.into(),
        });
        Ok(())
    }

    fn apply_start_after(&mut self, cursor: &Value) -> Result<(), Self::Error> {
        let value = match cursor {
            Value::String(id) if self.cursor_field() == DOCUMENT_ID_FIELD => {
                WireValue::ReferenceValue(self.document_reference(id))
            }
            other => WireValue::encode(other),
        };

        self.query.start_at = Some(Cursor {
            values: vec![value],
            before: false,
        });
        Ok(())
    }

    fn apply_limit(&mut self, limit: NonZeroU32) -> Result<(), Self::Error> {
        self.query.limit = Some(i32::try_from(limit.get()).unwrap_or(i32::MAX));
        Ok(())
    }

    fn finish(mut self) -> Result<Self::Output, Self::Error> {
        self.query.filter = match self.filters.len() {
            0 => None,
            1 => self.filters.pop(),
            _ => Some(Filter::CompositeFilter(CompositeFilter {
                op: CompositeOp::And,
                filters: self.filters,
            })),
        };

        Ok(RunQueryRequest {
            structured_query: self.query,
        })
    }
}
