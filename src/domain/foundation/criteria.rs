//! Composable query criteria over event metadata.
//!
//! A `Criteria` is an immutable predicate tree. Leaves test one field for
//! equality; `And`, `Or` and `Not` combine any number of children.
//!
//! Empty composites have fixed meanings:
//! - `and([])` matches every event
//! - `or([])` matches no event
//! - `not(children)` is NOR: it matches when none of the children match,
//!   so `not([])` matches every event
//!
//! Two translations are provided, both pure:
//! - [`Criteria::matches`] evaluates the predicate against a stored record
//! - [`Criteria::to_sql`] renders a parameterised SQL `WHERE` fragment

use uuid::Uuid;

use super::{AggregateId, EventId, EventRecord};

/// Predicate tree used to select events from a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criteria {
    EventId(EventId),
    AggregateId(AggregateId),
    AggregateType(String),
    AggregateVersion(u64),
    EventType(String),
    And(Vec<Criteria>),
    Or(Vec<Criteria>),
    Not(Vec<Criteria>),
}

impl Criteria {
    pub fn event_id(id: EventId) -> Self {
        Criteria::EventId(id)
    }

    pub fn aggregate_id(id: AggregateId) -> Self {
        Criteria::AggregateId(id)
    }

    pub fn aggregate_type(aggregate_type: impl Into<String>) -> Self {
        Criteria::AggregateType(aggregate_type.into())
    }

    pub fn aggregate_version(version: u64) -> Self {
        Criteria::AggregateVersion(version)
    }

    pub fn event_type(event_type: impl Into<String>) -> Self {
        Criteria::EventType(event_type.into())
    }

    pub fn and(children: impl IntoIterator<Item = Criteria>) -> Self {
        Criteria::And(children.into_iter().collect())
    }

    pub fn or(children: impl IntoIterator<Item = Criteria>) -> Self {
        Criteria::Or(children.into_iter().collect())
    }

    /// Negation of the disjunction of `children` (NOR).
    pub fn not(children: impl IntoIterator<Item = Criteria>) -> Self {
        Criteria::Not(children.into_iter().collect())
    }

    /// Evaluates the predicate against a stored event.
    pub fn matches(&self, record: &EventRecord) -> bool {
        match self {
            Criteria::EventId(id) => record.id == *id,
            Criteria::AggregateId(id) => record.aggregate_id == *id,
            Criteria::AggregateType(t) => record.aggregate_type == *t,
            Criteria::AggregateVersion(v) => record.aggregate_version == *v,
            Criteria::EventType(t) => record.event_type == *t,
            Criteria::And(children) => children.iter().all(|c| c.matches(record)),
            Criteria::Or(children) => children.iter().any(|c| c.matches(record)),
            Criteria::Not(children) => !children.iter().any(|c| c.matches(record)),
        }
    }

    /// Returns the aggregate this criteria is confined to, if any.
    ///
    /// A criteria is confined to one aggregate when it is an aggregate-id leaf
    /// or a conjunction with such a leaf among its (transitive) `And` children.
    pub fn single_aggregate(&self) -> Option<AggregateId> {
        match self {
            Criteria::AggregateId(id) => Some(*id),
            Criteria::And(children) => children.iter().find_map(Criteria::single_aggregate),
            _ => None,
        }
    }

    /// Renders the criteria as a SQL boolean expression over the events table.
    ///
    /// Placeholders are numbered from `$1`.
    pub fn to_sql(&self) -> SqlFilter {
        let mut params = Vec::new();
        let clause = self.render_sql(&mut params);
        SqlFilter { clause, params }
    }

    fn render_sql(&self, params: &mut Vec<SqlParam>) -> String {
        match self {
            Criteria::EventId(id) => leaf(params, "id", SqlParam::Uuid(*id.as_uuid())),
            Criteria::AggregateId(id) => {
                leaf(params, "aggregate_id", SqlParam::Uuid(*id.as_uuid()))
            }
            Criteria::AggregateType(t) => leaf(params, "aggregate_type", SqlParam::Text(t.clone())),
            Criteria::AggregateVersion(v) => leaf(
                params,
                "aggregate_version",
                SqlParam::BigInt(i64::try_from(*v).unwrap_or(i64::MAX)),
            ),
            Criteria::EventType(t) => leaf(params, "type", SqlParam::Text(t.clone())),
            Criteria::And(children) => join(children, " AND ", "TRUE", params),
            Criteria::Or(children) => join(children, " OR ", "FALSE", params),
            Criteria::Not(children) => {
                format!("NOT ({})", join(children, " OR ", "FALSE", params))
            }
        }
    }
}

fn leaf(params: &mut Vec<SqlParam>, column: &str, value: SqlParam) -> String {
    params.push(value);
    format!("{} = ${}", column, params.len())
}

fn join(children: &[Criteria], op: &str, empty: &str, params: &mut Vec<SqlParam>) -> String {
    if children.is_empty() {
        return empty.to_string();
    }
    let parts: Vec<String> = children
        .iter()
        .map(|c| format!("({})", c.render_sql(params)))
        .collect();
    parts.join(op)
}

/// A bound SQL parameter produced by criteria translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Uuid(Uuid),
    Text(String),
    BigInt(i64),
}

/// SQL translation of a [`Criteria`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFilter {
    /// Boolean expression using `$n` placeholders.
    pub clause: String,

    /// Values for the placeholders, in order.
    pub params: Vec<SqlParam>,
}
