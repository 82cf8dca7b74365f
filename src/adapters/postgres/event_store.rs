//! PostgreSQL implementation of EventStore.
//!
//! Events live in a single `events` table (see `migrations/`). A batch is
//! written with one multi-row INSERT inside a transaction, so either every
//! event lands or none does. Dropping the future before commit rolls the
//! transaction back.
//!
//! Uniqueness is enforced by the database:
//! - `events_pkey` on `id` maps to `DuplicateEventId`
//! - `events_aggregate_id_version_key` on `(aggregate_id, aggregate_version)`
//!   maps to `DuplicateVersion`

use async_trait::async_trait;
use sqlx::postgres::{PgDatabaseError, PgPool, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::{
    AggregateId, Criteria, Event, EventId, EventRecord, EventStoreError, PayloadRegistry,
    SqlParam, Timestamp,
};
use crate::ports::EventStore;

const EVENT_ID_CONSTRAINT: &str = "events_pkey";
const VERSION_CONSTRAINT: &str = "events_aggregate_id_version_key";
const UNIQUE_VIOLATION: &str = "23505";

const INDEXES: [&str; 4] = [
    "CREATE INDEX IF NOT EXISTS events_aggregate_id_idx ON events (aggregate_id)",
    "CREATE UNIQUE INDEX IF NOT EXISTS events_aggregate_id_version_key ON events (aggregate_id, aggregate_version)",
    "CREATE INDEX IF NOT EXISTS events_type_idx ON events (type)",
    "CREATE INDEX IF NOT EXISTS events_timestamp_idx ON events (timestamp)",
];

/// PostgreSQL-backed event store.
#[derive(Debug, Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
    registry: Arc<PayloadRegistry>,
    timeout: Duration,
}

impl PostgresEventStore {
    /// Creates the store and ensures the supporting indexes exist.
    ///
    /// The `events` table itself must already exist.
    pub async fn new(
        pool: PgPool,
        registry: Arc<PayloadRegistry>,
        timeout: Duration,
    ) -> Result<Self, EventStoreError> {
        let store = Self {
            pool,
            registry,
            timeout,
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    #[tracing::instrument(skip(self))]
    async fn ensure_indexes(&self) -> Result<(), EventStoreError> {
        for ddl in INDEXES {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    EventStoreError::WriteFailure(format!("Failed to create index: {}", e))
                })?;
        }
        tracing::debug!("event indexes ensured");
        Ok(())
    }

    async fn with_timeout<T, F>(&self, operation: F) -> Result<T, EventStoreError>
    where
        F: Future<Output = Result<T, EventStoreError>>,
    {
        tokio::time::timeout(self.timeout, operation)
            .await
            .map_err(|_| EventStoreError::Timeout(self.timeout))?
    }

    async fn insert(&self, records: &[EventRecord]) -> Result<(), EventStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| EventStoreError::WriteFailure(format!("Failed to begin: {}", e)))?;

        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO events (id, type, aggregate_id, aggregate_type, aggregate_version, data, timestamp) ",
        );
        qb.push_values(records, |mut b, record| {
            b.push_bind(*record.id.as_uuid())
                .push_bind(record.event_type.clone())
                .push_bind(*record.aggregate_id.as_uuid())
                .push_bind(record.aggregate_type.clone())
                .push_bind(to_db_version(record.aggregate_version))
                .push_bind(record.data.clone())
                .push_bind(record.timestamp.into_datetime());
        });

        qb.build()
            .execute(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, records))?;

        tx.commit()
            .await
            .map_err(|e| map_write_error(e, records))?;
        Ok(())
    }

    async fn select(&self, criteria: &Criteria) -> Result<Vec<Event>, EventStoreError> {
        let filter = criteria.to_sql();
        let order = if criteria.single_aggregate().is_some() {
            "aggregate_id, aggregate_version"
        } else {
            "timestamp, aggregate_id, aggregate_version"
        };
        let sql = format!(
            "SELECT id, type, aggregate_id, aggregate_type, aggregate_version, data, timestamp \
             FROM events WHERE {} ORDER BY {}",
            filter.clause, order
        );

        let mut query = sqlx::query(&sql);
        for param in filter.params {
            query = match param {
                SqlParam::Uuid(value) => query.bind(value),
                SqlParam::Text(value) => query.bind(value),
                SqlParam::BigInt(value) => query.bind(value),
            };
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| EventStoreError::ReadFailure(format!("Failed to fetch events: {}", e)))?;

        rows.iter()
            .map(|row| row_to_record(row)?.decode(&self.registry))
            .collect()
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    #[tracing::instrument(skip(self, events), fields(count = events.len()))]
    async fn save(&self, events: &[Event]) -> Result<(), EventStoreError> {
        if events.is_empty() {
            return Ok(());
        }

        let records = events
            .iter()
            .map(EventRecord::encode)
            .collect::<Result<Vec<_>, _>>()?;

        self.with_timeout(self.insert(&records)).await?;
        tracing::debug!("events appended");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, criteria: &Criteria) -> Result<Vec<Event>, EventStoreError> {
        let events = self.with_timeout(self.select(criteria)).await?;
        tracing::debug!(matched = events.len(), "events loaded");
        Ok(events)
    }

    #[tracing::instrument(skip(self))]
    async fn exists_by_aggregate_id(&self, id: AggregateId) -> Result<bool, EventStoreError> {
        self.with_timeout(async {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (SELECT 1 FROM events WHERE aggregate_id = $1)",
            )
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                EventStoreError::ReadFailure(format!("Failed to check existence: {}", e))
            })
        })
        .await
    }
}

// Stored versions are always >= 1; saturate rather than wrap on the u64 -> i64 edge.
fn to_db_version(version: u64) -> i64 {
    i64::try_from(version).unwrap_or(i64::MAX)
}

fn map_write_error(err: sqlx::Error, records: &[EventRecord]) -> EventStoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let detail = db
                .try_downcast_ref::<PgDatabaseError>()
                .and_then(|pg| pg.detail())
                .unwrap_or_default();

            match db.constraint() {
                Some(EVENT_ID_CONSTRAINT) => {
                    let record = records
                        .iter()
                        .find(|r| detail.contains(&r.id.to_string()))
                        .or_else(|| records.first());
                    if let Some(record) = record {
                        return EventStoreError::DuplicateEventId(record.id);
                    }
                }
                Some(VERSION_CONSTRAINT) => {
                    let record = records
                        .iter()
                        .find(|r| {
                            detail.contains(&format!(
                                "({}, {})",
                                r.aggregate_id, r.aggregate_version
                            ))
                        })
                        .or_else(|| records.first());
                    if let Some(record) = record {
                        return EventStoreError::DuplicateVersion {
                            aggregate_id: record.aggregate_id,
                            version: record.aggregate_version,
                        };
                    }
                }
                _ => {}
            }
        }
    }
    EventStoreError::WriteFailure(format!("Failed to insert events: {}", err))
}

fn row_to_record(row: &PgRow) -> Result<EventRecord, EventStoreError> {
    let read = |column: &str, e: sqlx::Error| {
        EventStoreError::ReadFailure(format!("Failed to read column {}: {}", column, e))
    };

    let id: uuid::Uuid = row.try_get("id").map_err(|e| read("id", e))?;
    let event_type: String = row.try_get("type").map_err(|e| read("type", e))?;
    let aggregate_id: uuid::Uuid = row
        .try_get("aggregate_id")
        .map_err(|e| read("aggregate_id", e))?;
    let aggregate_type: String = row
        .try_get("aggregate_type")
        .map_err(|e| read("aggregate_type", e))?;
    let aggregate_version: i64 = row
        .try_get("aggregate_version")
        .map_err(|e| read("aggregate_version", e))?;
    let data: serde_json::Value = row.try_get("data").map_err(|e| read("data", e))?;
    let timestamp: chrono::DateTime<chrono::Utc> = row
        .try_get("timestamp")
        .map_err(|e| read("timestamp", e))?;

    let aggregate_version = u64::try_from(aggregate_version).map_err(|_| {
        EventStoreError::ReadFailure(format!(
            "Stored event {} has negative version {}",
            id, aggregate_version
        ))
    })?;

    Ok(EventRecord {
        id: EventId::from_uuid(id),
        event_type,
        aggregate_id: AggregateId::from_uuid(aggregate_id),
        aggregate_type,
        aggregate_version,
        data,
        timestamp: Timestamp::from_datetime(timestamp),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_conversion_saturates() {
        assert_eq!(to_db_version(3), 3);
        assert_eq!(to_db_version(u64::MAX), i64::MAX);
    }

    #[test]
    fn non_database_errors_are_write_failures() {
        let err = map_write_error(sqlx::Error::PoolTimedOut, &[]);
        assert!(matches!(err, EventStoreError::WriteFailure(_)));
    }

    #[test]
    fn index_ddl_is_idempotent() {
        assert!(INDEXES.iter().all(|ddl| ddl.contains("IF NOT EXISTS")));
        assert!(INDEXES.iter().any(|ddl| ddl.contains(VERSION_CONSTRAINT)));
    }
}
